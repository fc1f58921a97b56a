use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use loam_field::{ChunkCoord, DensityFieldGenerator, FieldShape, HeightField, HeightNoise};
use loam_geom::Vec3;
use loam_mesh::{ChunkError, ExtractReport, MeshBuffers, NaiveSurfaceNets, SurfaceExtractor};
use loam_runtime::{ChunkPool, ChunkStage, PoolConfig, WorkerOutcome};

const WAIT: Duration = Duration::from_secs(30);

fn plane() -> Arc<DensityFieldGenerator> {
    Arc::new(DensityFieldGenerator::new(FieldShape::Plane { height: 4.5 }))
}

fn config(w: usize, h: usize) -> PoolConfig {
    PoolConfig {
        grid_width: w,
        grid_height: h,
        chunk_edge: 8,
        threads: 4,
        channel_capacity: 0,
    }
}

/// Fails with a panic on the `nth` call, delegates otherwise.
struct PanicOnCall {
    nth: usize,
    calls: AtomicUsize,
}

impl SurfaceExtractor for PanicOnCall {
    fn name(&self) -> &'static str {
        "panic-on-call"
    }

    fn extract(&self, field: &[f32], size: usize, out: &mut MeshBuffers) -> Result<ExtractReport, ChunkError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.nth {
            panic!("injected extractor fault");
        }
        NaiveSurfaceNets.extract(field, size, out)
    }
}

/// Height source that panics past a given x, so only some chunks fault.
struct PanicPastX(f32);

impl HeightNoise for PanicPastX {
    fn sample(&self, x: f32, _z: f32) -> f32 {
        if x >= self.0 {
            panic!("noise source gave out at x={x}");
        }
        0.5
    }
}

/// Holds every extraction until released.
struct Gate {
    open: Arc<AtomicBool>,
    entered: Arc<AtomicUsize>,
}

impl SurfaceExtractor for Gate {
    fn name(&self) -> &'static str {
        "gate"
    }

    fn extract(&self, field: &[f32], size: usize, out: &mut MeshBuffers) -> Result<ExtractReport, ChunkError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        while !self.open.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        NaiveSurfaceNets.extract(field, size, out)
    }
}

#[test]
fn every_chunk_publishes_its_own_package() {
    let (pool, rx) = ChunkPool::spawn(&config(4, 4), plane(), Arc::new(NaiveSurfaceNets)).unwrap();
    assert_eq!(pool.len(), 16);
    assert!(pool.wait_idle(WAIT));

    let packages = rx.drain(usize::MAX);
    assert_eq!(packages.len(), 16);
    let coords: HashSet<ChunkCoord> = packages.iter().map(|p| p.coord).collect();
    assert_eq!(coords.len(), 16);
    let buffers: HashSet<*const Vec3> = packages.iter().map(|p| p.vertices.as_ptr()).collect();
    assert_eq!(buffers.len(), 16, "packages must not share vertex storage");
    for p in &packages {
        assert_eq!(p.origin, Vec3::new(p.coord.cx as f32 * 8.0, 0.0, p.coord.cz as f32 * 8.0));
        assert!(p.triangle_count() > 0);
    }

    let reports = pool.drain_reports();
    assert_eq!(reports.len(), 16);
    assert!(reports.iter().all(|r| !r.is_failure()));
    assert!(pool.slots().all(|s| s.stage() == ChunkStage::Published));
}

#[test]
fn a_faulting_extractor_only_fails_its_chunk() {
    let extractor = Arc::new(PanicOnCall {
        nth: 2,
        calls: AtomicUsize::new(0),
    });
    let (pool, rx) = ChunkPool::spawn(&config(3, 3), plane(), extractor).unwrap();
    assert!(pool.wait_idle(WAIT));

    let reports = pool.drain_reports();
    let failed: Vec<_> = reports.iter().filter(|r| r.is_failure()).collect();
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        &failed[0].outcome,
        WorkerOutcome::Failed(ChunkError::ExtractionFault { reason }) if reason.contains("injected")
    ));
    assert_eq!(pool.slot(failed[0].coord).unwrap().stage(), ChunkStage::Failed);
    assert_eq!(rx.drain(usize::MAX).len(), 8);

    let counts = pool.stage_counts();
    assert!(counts.contains(&(ChunkStage::Published, 8)));
    assert!(counts.contains(&(ChunkStage::Failed, 1)));
}

#[test]
fn a_panicking_generator_fails_and_reports_its_chunk() {
    // Chunk (1, 0) starts at x = 8; chunk (0, 0) samples x in [0, 9].
    let shape = FieldShape::HeightField(HeightField::new(Arc::new(PanicPastX(12.0)), 4.0, 2.0));
    let generator = Arc::new(DensityFieldGenerator::new(shape));
    let (pool, rx) = ChunkPool::spawn(&config(2, 1), generator, Arc::new(NaiveSurfaceNets)).unwrap();
    assert!(pool.wait_idle(WAIT));

    let reports = pool.drain_reports();
    assert_eq!(reports.len(), 2);
    let failed: Vec<_> = reports.iter().filter(|r| r.is_failure()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].coord, ChunkCoord::from_grid(1, 0));
    assert!(matches!(
        &failed[0].outcome,
        WorkerOutcome::Failed(ChunkError::GenerationFault { reason }) if reason.contains("gave out")
    ));
    assert_eq!(pool.slot(ChunkCoord::from_grid(1, 0)).unwrap().stage(), ChunkStage::Failed);
    assert_eq!(pool.slot(ChunkCoord::from_grid(0, 0)).unwrap().stage(), ChunkStage::Published);
    assert_eq!(rx.drain(usize::MAX).len(), 1);
}

#[test]
fn cancelled_chunk_never_publishes() {
    let open = Arc::new(AtomicBool::new(false));
    let entered = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Gate {
        open: Arc::clone(&open),
        entered: Arc::clone(&entered),
    });
    let (pool, rx) = ChunkPool::spawn(&config(1, 1), plane(), gate).unwrap();
    while entered.load(Ordering::SeqCst) == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    let coord = ChunkCoord::from_grid(0, 0);
    assert_eq!(pool.cancel(coord), Some(1));
    open.store(true, Ordering::SeqCst);
    assert!(pool.wait_idle(WAIT));

    assert!(rx.try_take().is_none());
    let reports = pool.drain_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, WorkerOutcome::Cancelled);
    assert_eq!(pool.slot(coord).unwrap().stage(), ChunkStage::Cancelled);
    assert_eq!(pool.cancel(ChunkCoord::from_grid(5, 5)), None);
}

#[test]
fn bounded_handoff_reports_overflow_per_chunk() {
    let cfg = PoolConfig {
        channel_capacity: 1,
        ..config(4, 1)
    };
    let (pool, rx) = ChunkPool::spawn(&cfg, plane(), Arc::new(NaiveSurfaceNets)).unwrap();
    assert!(pool.wait_idle(WAIT));

    assert_eq!(rx.pending(), 1);
    let reports = pool.drain_reports();
    let overflowed = reports
        .iter()
        .filter(|r| r.outcome == WorkerOutcome::Failed(ChunkError::ChannelOverflow))
        .count();
    assert_eq!(overflowed, 3);
    assert_eq!(pool.in_flight(), 0);
}
