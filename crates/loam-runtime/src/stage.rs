use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use loam_field::{ChunkCoord, ChunkDims};
use loam_geom::Vec3;

/// Lifecycle of a chunk's one-shot meshing pipeline.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChunkStage {
    Created = 0,
    FieldReady = 1,
    Extracted = 2,
    Published = 3,
    Applied = 4,
    Failed = 5,
    Cancelled = 6,
}

impl ChunkStage {
    pub const ALL: [ChunkStage; 7] = [
        ChunkStage::Created,
        ChunkStage::FieldReady,
        ChunkStage::Extracted,
        ChunkStage::Published,
        ChunkStage::Applied,
        ChunkStage::Failed,
        ChunkStage::Cancelled,
    ];

    #[inline]
    pub fn from_u8(v: u8) -> ChunkStage {
        match v {
            0 => ChunkStage::Created,
            1 => ChunkStage::FieldReady,
            2 => ChunkStage::Extracted,
            3 => ChunkStage::Published,
            4 => ChunkStage::Applied,
            5 => ChunkStage::Failed,
            _ => ChunkStage::Cancelled,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ChunkStage::Applied | ChunkStage::Failed | ChunkStage::Cancelled
        )
    }

    /// Forward one step at a time; any live stage may fail or be cancelled.
    pub fn can_advance_to(self, next: ChunkStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            ChunkStage::Failed | ChunkStage::Cancelled => true,
            _ => next as u8 == self as u8 + 1,
        }
    }
}

/// Shared, lock-free identity and progress of one chunk.
///
/// The pool, the chunk's worker and the presentation side all hold the same
/// slot; only `stage` and `generation` ever change.
#[derive(Debug)]
pub struct ChunkSlot {
    pub coord: ChunkCoord,
    pub origin: Vec3,
    pub dims: ChunkDims,
    generation: AtomicU64,
    stage: AtomicU8,
}

impl ChunkSlot {
    pub fn new(coord: ChunkCoord, dims: ChunkDims) -> Self {
        Self {
            coord,
            origin: coord.origin(dims.edge()),
            dims,
            generation: AtomicU64::new(0),
            stage: AtomicU8::new(ChunkStage::Created as u8),
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    #[inline]
    pub fn stage(&self) -> ChunkStage {
        ChunkStage::from_u8(self.stage.load(Ordering::Acquire))
    }

    /// Moves to `next` if the transition is legal; returns whether it happened.
    pub fn advance(&self, next: ChunkStage) -> bool {
        let mut cur = self.stage.load(Ordering::Acquire);
        loop {
            if !ChunkStage::from_u8(cur).can_advance_to(next) {
                return false;
            }
            match self.stage.compare_exchange_weak(
                cur,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Invalidates in-flight work for this chunk. Returns the new generation.
    pub fn cancel(&self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        // A chunk that already finished keeps its terminal stage.
        self.advance(ChunkStage::Cancelled);
        next
    }

    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation && self.stage() != ChunkStage::Cancelled
    }
}
