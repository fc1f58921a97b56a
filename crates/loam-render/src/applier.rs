use std::ops::AddAssign;

use hashbrown::HashMap;
use loam_field::ChunkCoord;
use loam_mesh::MeshPackage;
use loam_runtime::{ChunkPool, ChunkSlot, ChunkStage, MeshReceiver};

use crate::target::{ChunkRender, MeshTarget};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub applied: usize,
    pub stale: usize,
    /// Packages still queued after the tick.
    pub pending: usize,
}

impl AddAssign for TickStats {
    fn add_assign(&mut self, rhs: TickStats) {
        self.applied += rhs.applied;
        self.stale += rhs.stale;
        self.pending = rhs.pending;
    }
}

/// Drains the handoff channel once per tick and swaps packages into their
/// chunk's [`MeshTarget`]. Only ever called from the consuming thread.
pub struct PresentationApplier<T: MeshTarget = ChunkRender> {
    targets: HashMap<ChunkCoord, T>,
    budget: Option<usize>,
    totals: TickStats,
}

impl PresentationApplier<ChunkRender> {
    pub fn new(pool: &ChunkPool) -> Self {
        Self::with_targets(pool, |slot| ChunkRender::new(slot.coord, slot.origin))
    }
}

impl<T: MeshTarget> PresentationApplier<T> {
    pub fn with_targets(pool: &ChunkPool, mut make: impl FnMut(&ChunkSlot) -> T) -> Self {
        let targets = pool.slots().map(|slot| (slot.coord, make(slot))).collect();
        Self {
            targets,
            budget: None,
            totals: TickStats::default(),
        }
    }

    /// Caps how many packages a single tick applies. `None` takes all ready.
    pub fn with_budget(mut self, budget: Option<usize>) -> Self {
        self.budget = budget.filter(|&b| b > 0);
        self
    }

    pub fn target(&self, coord: ChunkCoord) -> Option<&T> {
        self.targets.get(&coord)
    }

    pub fn targets(&self) -> impl Iterator<Item = (&ChunkCoord, &T)> + '_ {
        self.targets.iter()
    }

    pub fn totals(&self) -> TickStats {
        self.totals
    }

    /// Never blocks.
    pub fn tick(&mut self, pool: &ChunkPool, rx: &MeshReceiver) -> TickStats {
        let mut stats = TickStats::default();
        for package in rx.drain(self.budget.unwrap_or(usize::MAX)) {
            if self.apply(pool, package) {
                stats.applied += 1;
            } else {
                stats.stale += 1;
            }
        }
        stats.pending = rx.pending();
        if stats.applied > 0 || stats.stale > 0 {
            log::debug!(
                target: "present",
                "tick applied={} stale={} pending={}",
                stats.applied,
                stats.stale,
                stats.pending
            );
        }
        self.totals += stats;
        stats
    }

    /// Swaps one package in; returns false if it was discarded as stale.
    pub fn apply(&mut self, pool: &ChunkPool, package: MeshPackage) -> bool {
        let coord = package.coord;
        let Some(slot) = pool.slot(coord) else {
            log::warn!(target: "present", "package for unknown chunk {coord}");
            return false;
        };
        if !slot.is_current(package.generation) {
            log::debug!(
                target: "present",
                "stale package for {} (gen {} vs {})",
                coord,
                package.generation,
                slot.generation()
            );
            return false;
        }
        let Some(target) = self.targets.get_mut(&coord) else {
            return false;
        };
        target.set_mesh(package);
        // Already Applied on a repeat; the swap above is still the same mesh.
        slot.advance(ChunkStage::Applied);
        true
    }
}
