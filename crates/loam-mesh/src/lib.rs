//! CPU surface extraction: buffer contract, extractor seam, and the naive
//! surface nets implementation.
#![forbid(unsafe_code)]

mod buffers;
mod constants;
mod error;
mod extractor;
mod package;
mod surface_nets;

pub use buffers::{ExtractReport, MeshBuffers, MeshParts};
pub use error::ChunkError;
pub use extractor::SurfaceExtractor;
pub use package::MeshPackage;
pub use surface_nets::NaiveSurfaceNets;

use loam_field::DensityField;

/// Allocates contract-sized buffers, runs `extractor` on `field`, and keeps
/// only the reported prefix.
pub fn extract_field(
    extractor: &dyn SurfaceExtractor,
    field: &DensityField,
) -> Result<(ExtractReport, MeshParts), ChunkError> {
    let mut buffers = MeshBuffers::allocate(field.dims);
    buffers.check_capacity(field.dims)?;
    let report = extractor.extract(field.as_slice(), field.size(), &mut buffers)?;
    log::trace!(
        target: "mesh",
        "{} status={} verts={} indices={}",
        extractor.name(),
        report.status,
        report.vertex_count,
        report.index_count
    );
    let parts = buffers.into_parts(report)?;
    Ok((report, parts))
}
