use loam_geom::Vec3;

use crate::coord::{ChunkDims, FieldError};

/// Flat `S³` scalar samples of one chunk, indexed `x + y·S + z·S²`.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityField {
    pub origin: Vec3,
    pub dims: ChunkDims,
    pub samples: Vec<f32>,
}

impl DensityField {
    pub fn from_samples(
        origin: Vec3,
        dims: ChunkDims,
        samples: Vec<f32>,
    ) -> Result<Self, FieldError> {
        let expected = dims.samples();
        if samples.len() != expected {
            return Err(FieldError::FieldLength {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            origin,
            dims,
            samples,
        })
    }

    /// Field filled with a single value; handy for boundary cases.
    pub fn filled(origin: Vec3, dims: ChunkDims, value: f32) -> Self {
        Self {
            origin,
            dims,
            samples: vec![value; dims.samples()],
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.dims.padded()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        self.dims.idx(x, y, z)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.samples[self.idx(x, y, z)]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// True when both inside (< 0) and outside (>= 0) samples exist.
    pub fn has_sign_change(&self) -> bool {
        let mut inside = false;
        let mut outside = false;
        for &v in &self.samples {
            if v < 0.0 {
                inside = true;
            } else {
                outside = true;
            }
            if inside && outside {
                return true;
            }
        }
        false
    }
}
