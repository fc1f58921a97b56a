use crate::buffers::{ExtractReport, MeshBuffers};
use crate::error::ChunkError;

/// Field-to-mesh conversion with a fixed I/O contract.
///
/// `field` holds `size³` samples indexed `x + y·size + z·size²`. `out` must
/// already be allocated at `size³` vertices/normals/tangents and
/// `size³ × 18` indices; implementations write a prefix of each array plus
/// the bounds record and report the prefix lengths. Calls are synchronous
/// and deterministic for a given field.
pub trait SurfaceExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(
        &self,
        field: &[f32],
        size: usize,
        out: &mut MeshBuffers,
    ) -> Result<ExtractReport, ChunkError>;
}
