use std::collections::VecDeque;
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use loam_field::DensityFieldGenerator;
use loam_mesh::{NaiveSurfaceNets, SurfaceExtractor};
use loam_render::PresentationApplier;
use loam_runtime::{ChunkPool, MeshReceiver, WorkerOutcome, WorkerReport};

use crate::config::AppConfig;

const PERF_WIN_CAP: usize = 256;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub chunks: usize,
    pub ticks: u32,
    pub applied: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Chunks still in flight when the tick budget ran out.
    pub unfinished: usize,
    pub stale: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub avg_gen_ms: f32,
    pub avg_extract_ms: f32,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.unfinished == 0
    }
}

pub struct App {
    max_ticks: u32,
    period: Option<Duration>,
    pool: ChunkPool,
    rx: MeshReceiver,
    applier: PresentationApplier,
    failed: usize,
    cancelled: usize,
    perf_gen_ms: VecDeque<u32>,
    perf_extract_ms: VecDeque<u32>,
}

impl App {
    pub fn new(cfg: AppConfig) -> Result<Self, Box<dyn Error>> {
        Self::with_extractor(cfg, Arc::new(NaiveSurfaceNets))
    }

    pub fn with_extractor(
        cfg: AppConfig,
        extractor: Arc<dyn SurfaceExtractor>,
    ) -> Result<Self, Box<dyn Error>> {
        let period = cfg.tick.period()?;
        let generator = Arc::new(DensityFieldGenerator::from_config(&cfg.field));
        log::info!(
            "field shape {} over {}x{} chunks of edge {}",
            generator.shape().name(),
            cfg.pool.grid_width,
            cfg.pool.grid_height,
            cfg.pool.chunk_edge
        );
        let (pool, rx) = ChunkPool::spawn(&cfg.pool, generator, extractor)?;
        let budget = Some(cfg.tick.budget);
        let applier = PresentationApplier::new(&pool).with_budget(budget);
        Ok(Self {
            max_ticks: cfg.tick.max_ticks,
            period,
            pool,
            rx,
            applier,
            failed: 0,
            cancelled: 0,
            perf_gen_ms: VecDeque::new(),
            perf_extract_ms: VecDeque::new(),
        })
    }

    fn perf_push(q: &mut VecDeque<u32>, v: u32) {
        q.push_back(v);
        if q.len() > PERF_WIN_CAP {
            q.pop_front();
        }
    }

    fn perf_avg(q: &VecDeque<u32>) -> f32 {
        if q.is_empty() {
            0.0
        } else {
            q.iter().map(|&v| v as f32).sum::<f32>() / q.len() as f32
        }
    }

    fn record(&mut self, report: WorkerReport) {
        match &report.outcome {
            WorkerOutcome::Published { .. } => {
                Self::perf_push(&mut self.perf_gen_ms, report.timings.t_gen_ms);
                Self::perf_push(&mut self.perf_extract_ms, report.timings.t_extract_ms);
            }
            WorkerOutcome::Failed(err) => {
                log::error!("chunk {} failed: {}", report.coord, err);
                self.failed += 1;
            }
            WorkerOutcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Every chunk has reached a stage no later tick can change.
    fn settled(&self) -> bool {
        self.pool.in_flight() == 0 && self.pool.slots().all(|s| s.stage().is_terminal())
    }

    /// One presentation tick: apply ready meshes, collect worker reports.
    pub fn step(&mut self) {
        self.applier.tick(&self.pool, &self.rx);
        for report in self.pool.drain_reports() {
            self.record(report);
        }
    }

    pub fn run(mut self) -> Summary {
        let mut ticks = 0u32;
        while ticks < self.max_ticks {
            let t0 = Instant::now();
            self.step();
            ticks += 1;
            if self.settled() {
                break;
            }
            match self.period {
                Some(p) => {
                    if let Some(rest) = p.checked_sub(t0.elapsed()) {
                        thread::sleep(rest);
                    }
                }
                None => thread::yield_now(),
            }
        }
        // Reports that landed after the last tick still count.
        for report in self.pool.drain_reports() {
            self.record(report);
        }
        self.summarize(ticks)
    }

    fn summarize(&self, ticks: u32) -> Summary {
        let mut summary = Summary {
            chunks: self.pool.len(),
            ticks,
            failed: self.failed,
            cancelled: self.cancelled,
            stale: self.applier.totals().stale,
            avg_gen_ms: Self::perf_avg(&self.perf_gen_ms),
            avg_extract_ms: Self::perf_avg(&self.perf_extract_ms),
            ..Summary::default()
        };
        for (_, render) in self.applier.targets() {
            if let Some(mesh) = render.mesh() {
                summary.applied += 1;
                summary.vertices += mesh.vertex_count();
                summary.triangles += mesh.triangle_count();
            }
        }
        summary.unfinished = self
            .pool
            .slots()
            .filter(|s| !s.stage().is_terminal())
            .count();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_field::config::ShapeKind;
    use loam_mesh::{ChunkError, ExtractReport, MeshBuffers};

    fn small(shape: ShapeKind) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.pool.grid_width = 3;
        cfg.pool.grid_height = 2;
        cfg.pool.chunk_edge = 8;
        cfg.pool.threads = 2;
        cfg.field.shape = shape;
        cfg.field.plane.height = 3.5;
        cfg.tick.hz = 0.0;
        cfg.tick.max_ticks = 100_000;
        cfg
    }

    struct AlwaysFails;

    impl SurfaceExtractor for AlwaysFails {
        fn name(&self) -> &'static str {
            "always-fails"
        }

        fn extract(&self, _: &[f32], _: usize, _: &mut MeshBuffers) -> Result<ExtractReport, ChunkError> {
            Err(ChunkError::fault("refused"))
        }
    }

    #[test]
    fn run_applies_every_chunk() {
        let summary = App::new(small(ShapeKind::Plane)).unwrap().run();
        assert!(summary.is_success(), "{summary:?}");
        assert_eq!(summary.chunks, 6);
        assert_eq!(summary.applied, 6);
        assert_eq!(summary.failed, 0);
        assert!(summary.triangles > 0);
    }

    #[test]
    fn failures_are_counted_and_fail_the_run() {
        let app = App::with_extractor(small(ShapeKind::Plane), Arc::new(AlwaysFails)).unwrap();
        let summary = app.run();
        assert_eq!(summary.failed, 6);
        assert_eq!(summary.applied, 0);
        assert!(!summary.is_success());
    }

    #[test]
    fn tiny_tick_rate_is_a_startup_error() {
        let mut cfg = small(ShapeKind::Plane);
        cfg.tick.hz = 1e-40;
        assert!(App::new(cfg).is_err());
    }

    #[test]
    fn zero_edge_is_a_startup_error() {
        let mut cfg = small(ShapeKind::Sphere);
        cfg.pool.chunk_edge = 0;
        assert!(App::new(cfg).is_err());
    }
}
