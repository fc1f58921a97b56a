use loam_geom::Vec3;

use crate::config::FieldConfig;
use crate::coord::ChunkDims;
use crate::field::DensityField;
use crate::shape::FieldShape;

/// Produces a chunk's padded density field from a shape.
///
/// Stateless apart from the shape; safe to share across worker threads.
#[derive(Clone, Debug)]
pub struct DensityFieldGenerator {
    shape: FieldShape,
}

impl DensityFieldGenerator {
    pub fn new(shape: FieldShape) -> Self {
        Self { shape }
    }

    pub fn from_config(cfg: &FieldConfig) -> Self {
        Self::new(cfg.build_shape())
    }

    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    /// Samples `S³` points; sample `(x, y, z)` sits at `origin + (x, y, z)`.
    pub fn generate(&self, origin: Vec3, dims: ChunkDims) -> DensityField {
        let s = dims.padded();
        let mut samples = Vec::with_capacity(dims.samples());
        match &self.shape {
            FieldShape::HeightField(hf) => {
                // One noise lookup per column, not per sample.
                let mut heights = Vec::with_capacity(s * s);
                for z in 0..s {
                    for x in 0..s {
                        let wx = origin.x + x as f32;
                        let wz = origin.z + z as f32;
                        heights.push(hf.height(wx, wz));
                    }
                }
                for z in 0..s {
                    for y in 0..s {
                        let wy = origin.y + y as f32;
                        for x in 0..s {
                            samples.push(wy - heights[x + z * s]);
                        }
                    }
                }
            }
            shape => {
                for z in 0..s {
                    for y in 0..s {
                        for x in 0..s {
                            let p = origin + Vec3::new(x as f32, y as f32, z as f32);
                            samples.push(shape.sample(p));
                        }
                    }
                }
            }
        }
        debug_assert_eq!(samples.len(), dims.samples());
        log::trace!(
            target: "field",
            "generated {} field at ({:.1}, {:.1}, {:.1}) S={}",
            self.shape.name(),
            origin.x,
            origin.y,
            origin.z,
            s
        );
        DensityField {
            origin,
            dims,
            samples,
        }
    }
}
