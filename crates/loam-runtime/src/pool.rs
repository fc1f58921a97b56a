use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, unbounded};
use hashbrown::HashMap;
use loam_field::{ChunkCoord, ChunkDims, DensityFieldGenerator, FieldError};
use loam_mesh::SurfaceExtractor;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handoff::{MeshHandoffChannel, MeshReceiver};
use crate::stage::{ChunkSlot, ChunkStage};
use crate::worker::{ChunkWorker, WorkerReport};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("chunk grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn d_grid() -> usize {
    8
}
fn d_edge() -> usize {
    16
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "d_grid")]
    pub grid_width: usize,
    #[serde(default = "d_grid")]
    pub grid_height: usize,
    /// Cells per chunk edge (N); sampled with one sample of padding per side.
    #[serde(default = "d_edge")]
    pub chunk_edge: usize,
    /// Worker threads; `0` lets rayon pick one per core.
    #[serde(default)]
    pub threads: usize,
    /// Handoff channel bound; `0` means unbounded.
    #[serde(default)]
    pub channel_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            grid_width: d_grid(),
            grid_height: d_grid(),
            chunk_edge: d_edge(),
            threads: 0,
            channel_capacity: 0,
        }
    }
}

impl PoolConfig {
    pub fn chunk_count(&self) -> usize {
        self.grid_width * self.grid_height
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Owns the chunk grid and the worker threads meshing it.
///
/// Every chunk gets exactly one job at spawn time. Results arrive on two
/// channels: mesh packages on the returned [`MeshReceiver`] and supervision
/// reports via [`ChunkPool::drain_reports`].
pub struct ChunkPool {
    dims: ChunkDims,
    order: Vec<ChunkCoord>,
    slots: HashMap<ChunkCoord, Arc<ChunkSlot>>,
    report_rx: Receiver<WorkerReport>,
    in_flight: Arc<AtomicUsize>,
    // Kept alive so queued jobs keep running.
    _workers: ThreadPool,
}

impl ChunkPool {
    pub fn spawn(
        config: &PoolConfig,
        generator: Arc<DensityFieldGenerator>,
        extractor: Arc<dyn SurfaceExtractor>,
    ) -> Result<(ChunkPool, MeshReceiver), PoolError> {
        if config.grid_width == 0 || config.grid_height == 0 {
            return Err(PoolError::EmptyGrid {
                width: config.grid_width,
                height: config.grid_height,
            });
        }
        let dims = ChunkDims::new(config.chunk_edge)?;
        let workers = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("loam-chunk-{i}"))
            .panic_handler(|_| log::error!(target: "chunk", "chunk worker panicked outside its supervised pipeline"))
            .build()?;

        let (publisher, receiver) = MeshHandoffChannel::with_capacity(config.channel_capacity);
        let (report_tx, report_rx) = unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let mut order = Vec::with_capacity(config.chunk_count());
        let mut slots = HashMap::with_capacity(config.chunk_count());

        for y in 0..config.grid_height {
            for x in 0..config.grid_width {
                let coord = ChunkCoord::from_grid(x as i32, y as i32);
                let slot = Arc::new(ChunkSlot::new(coord, dims));
                order.push(coord);
                slots.insert(coord, Arc::clone(&slot));

                let worker = ChunkWorker::new(
                    slot,
                    Arc::clone(&generator),
                    Arc::clone(&extractor),
                    publisher.clone(),
                );
                let report_tx = report_tx.clone();
                in_flight.fetch_add(1, Ordering::AcqRel);
                let guard = InFlightGuard(Arc::clone(&in_flight));
                workers.spawn(move || {
                    let _guard = guard;
                    // Pool may already be gone; nobody is left to read the report.
                    let _ = report_tx.send(worker.run());
                });
            }
        }
        log::info!(
            target: "chunk",
            "spawned {} chunk jobs ({}x{} grid, edge {}) on {} threads via {}",
            order.len(),
            config.grid_width,
            config.grid_height,
            dims.edge(),
            workers.current_num_threads(),
            extractor.name()
        );

        Ok((
            ChunkPool {
                dims,
                order,
                slots,
                report_rx,
                in_flight,
                _workers: workers,
            },
            receiver,
        ))
    }

    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    pub fn slot(&self, coord: ChunkCoord) -> Option<&Arc<ChunkSlot>> {
        self.slots.get(&coord)
    }

    /// Slots in row-major grid order.
    pub fn slots(&self) -> impl Iterator<Item = &Arc<ChunkSlot>> + '_ {
        self.order.iter().filter_map(|c| self.slots.get(c))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Invalidates the chunk's in-flight work; returns its new generation.
    pub fn cancel(&self, coord: ChunkCoord) -> Option<u64> {
        let slot = self.slots.get(&coord)?;
        let generation = slot.cancel();
        log::debug!(target: "chunk", "chunk {} cancelled -> gen {}", coord, generation);
        Some(generation)
    }

    pub fn drain_reports(&self) -> Vec<WorkerReport> {
        self.report_rx.try_iter().collect()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Blocks until every job has finished or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while self.in_flight() > 0 {
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Number of chunks in each stage, in [`ChunkStage::ALL`] order.
    pub fn stage_counts(&self) -> Vec<(ChunkStage, usize)> {
        let mut counts = [0usize; ChunkStage::ALL.len()];
        for slot in self.slots.values() {
            counts[slot.stage() as usize] += 1;
        }
        ChunkStage::ALL.iter().map(|&s| (s, counts[s as usize])).collect()
    }
}
