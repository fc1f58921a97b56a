//! Presentation side: per-chunk mesh holders and the per-tick applier that
//! swaps freshly published packages into them.
#![forbid(unsafe_code)]

mod applier;
mod target;

pub use applier::{PresentationApplier, TickStats};
pub use target::{ChunkRender, MeshTarget};
