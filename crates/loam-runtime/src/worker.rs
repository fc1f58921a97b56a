use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use loam_field::{ChunkCoord, DensityFieldGenerator};
use loam_mesh::{ChunkError, MeshPackage, SurfaceExtractor, extract_field};

use crate::handoff::MeshPublisher;
use crate::stage::{ChunkSlot, ChunkStage};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerTimings {
    pub t_gen_ms: u32,
    pub t_extract_ms: u32,
    pub t_total_ms: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorkerOutcome {
    Published { vertices: usize, triangles: usize },
    Cancelled,
    Failed(ChunkError),
}

/// Supervision record a worker sends back to the pool when it finishes.
#[derive(Clone, Debug)]
pub struct WorkerReport {
    pub coord: ChunkCoord,
    pub generation: u64,
    pub outcome: WorkerOutcome,
    pub timings: WorkerTimings,
}

impl WorkerReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, WorkerOutcome::Failed(_))
    }
}

/// Runs one chunk from density field to published mesh package.
///
/// Everything the worker touches is either owned by it or shared read-only,
/// so workers for different chunks never contend on anything but the
/// handoff channel.
pub struct ChunkWorker {
    slot: Arc<ChunkSlot>,
    generation: u64,
    generator: Arc<DensityFieldGenerator>,
    extractor: Arc<dyn SurfaceExtractor>,
    publisher: MeshPublisher,
}

#[inline]
fn elapsed_ms(t: Instant) -> u32 {
    t.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn panic_message(what: &str, payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("{what} panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("{what} panicked: {s}")
    } else {
        format!("{what} panicked")
    }
}

impl ChunkWorker {
    pub fn new(
        slot: Arc<ChunkSlot>,
        generator: Arc<DensityFieldGenerator>,
        extractor: Arc<dyn SurfaceExtractor>,
        publisher: MeshPublisher,
    ) -> Self {
        let generation = slot.generation();
        Self {
            slot,
            generation,
            generator,
            extractor,
            publisher,
        }
    }

    #[inline]
    fn live(&self) -> bool {
        self.slot.is_current(self.generation)
    }

    /// Never panics and never returns an error: every outcome, including a
    /// panicking generator or extractor, becomes a report.
    pub fn run(self) -> WorkerReport {
        let t0 = Instant::now();
        let mut timings = WorkerTimings::default();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.pipeline(&mut timings)))
            .unwrap_or_else(|payload| Err(ChunkError::fault(panic_message("worker", payload.as_ref()))));
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) if !self.live() => WorkerOutcome::Cancelled,
            Err(err) => {
                self.slot.advance(ChunkStage::Failed);
                log::warn!(target: "chunk", "chunk {} failed: {}", self.slot.coord, err);
                WorkerOutcome::Failed(err)
            }
        };
        if outcome == WorkerOutcome::Cancelled {
            log::debug!(target: "chunk", "chunk {} cancelled (gen {})", self.slot.coord, self.generation);
        }
        timings.t_total_ms = elapsed_ms(t0);
        WorkerReport {
            coord: self.slot.coord,
            generation: self.generation,
            outcome,
            timings,
        }
    }

    fn pipeline(&self, timings: &mut WorkerTimings) -> Result<WorkerOutcome, ChunkError> {
        if !self.live() {
            return Ok(WorkerOutcome::Cancelled);
        }
        let dims = self.slot.dims;

        let t_gen = Instant::now();
        let generator = self.generator.as_ref();
        let origin = self.slot.origin;
        let field = panic::catch_unwind(AssertUnwindSafe(|| generator.generate(origin, dims)))
            .map_err(|payload| ChunkError::GenerationFault {
                reason: panic_message("generator", payload.as_ref()),
            })?;
        timings.t_gen_ms = elapsed_ms(t_gen);
        if !self.slot.advance(ChunkStage::FieldReady) || !self.live() {
            return Ok(WorkerOutcome::Cancelled);
        }

        let t_extract = Instant::now();
        let extractor = self.extractor.as_ref();
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| extract_field(extractor, &field)))
            .map_err(|payload| ChunkError::fault(panic_message("extractor", payload.as_ref())))?;
        let (report, parts) = extracted?;
        timings.t_extract_ms = elapsed_ms(t_extract);
        log::trace!(
            target: "chunk",
            "chunk {} extracted by {} (status {})",
            self.slot.coord,
            extractor.name(),
            report.status
        );
        if !self.slot.advance(ChunkStage::Extracted) || !self.live() {
            return Ok(WorkerOutcome::Cancelled);
        }

        let package = MeshPackage::from_parts(self.slot.coord, self.generation, self.slot.origin, parts);
        let vertices = package.vertex_count();
        let triangles = package.triangle_count();
        // Published before the send so the consumer never sees an earlier stage.
        if !self.slot.advance(ChunkStage::Published) || !self.live() {
            return Ok(WorkerOutcome::Cancelled);
        }
        self.publisher.publish(package)?;
        log::debug!(
            target: "chunk",
            "chunk {} published: {} verts, {} tris (gen {}ms, extract {}ms)",
            self.slot.coord,
            vertices,
            triangles,
            timings.t_gen_ms,
            timings.t_extract_ms
        );
        Ok(WorkerOutcome::Published {
            vertices,
            triangles,
        })
    }
}
