//! Chunk pool: per-chunk workers on a rayon pool, lock-free stage tracking,
//! and the worker-to-presentation mesh handoff.
#![forbid(unsafe_code)]

mod handoff;
mod pool;
mod stage;
mod worker;

pub use handoff::{MeshHandoffChannel, MeshPublisher, MeshReceiver};
pub use pool::{ChunkPool, PoolConfig, PoolError};
pub use stage::{ChunkSlot, ChunkStage};
pub use worker::{ChunkWorker, WorkerOutcome, WorkerReport, WorkerTimings};
