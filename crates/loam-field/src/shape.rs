//! Closed-form and noise-driven field shapes.

use std::fmt;
use std::sync::Arc;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use loam_geom::Vec3;

/// Scalar height source over the XZ plane; values are expected in `[0, 1]`.
pub trait HeightNoise: Send + Sync {
    fn sample(&self, x: f32, z: f32) -> f32;
}

/// Seeded Perlin noise remapped from `[-1, 1]` into `[0, 1]`.
pub struct FastNoiseHeight {
    noise: FastNoiseLite,
    seed: i32,
    frequency: f32,
}

impl FastNoiseHeight {
    pub fn new(seed: i32, frequency: f32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(frequency));
        Self {
            noise,
            seed,
            frequency,
        }
    }
}

impl HeightNoise for FastNoiseHeight {
    #[inline]
    fn sample(&self, x: f32, z: f32) -> f32 {
        (self.noise.get_noise_2d(x, z) * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

impl fmt::Debug for FastNoiseHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastNoiseHeight")
            .field("seed", &self.seed)
            .field("frequency", &self.frequency)
            .finish()
    }
}

/// Returns the same value everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantHeight(pub f32);

impl HeightNoise for ConstantHeight {
    #[inline]
    fn sample(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}

/// `value = y - (noise(x, z) * amplitude + base)`.
#[derive(Clone)]
pub struct HeightField {
    pub noise: Arc<dyn HeightNoise>,
    pub amplitude: f32,
    pub base: f32,
}

impl HeightField {
    pub const DEFAULT_AMPLITUDE: f32 = 4.0;
    pub const DEFAULT_BASE: f32 = 8.0;
    pub const DEFAULT_FREQUENCY: f32 = 0.1;

    pub fn new(noise: Arc<dyn HeightNoise>, amplitude: f32, base: f32) -> Self {
        Self {
            noise,
            amplitude,
            base,
        }
    }

    #[inline]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.noise.sample(x, z) * self.amplitude + self.base
    }
}

impl fmt::Debug for HeightField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeightField")
            .field("amplitude", &self.amplitude)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum FieldShape {
    Sphere { center: Vec3, radius: f32 },
    Plane { height: f32 },
    HeightField(HeightField),
}

impl FieldShape {
    /// Signed value at a world position; negative is inside.
    #[inline]
    pub fn sample(&self, p: Vec3) -> f32 {
        match self {
            FieldShape::Sphere { center, radius } => (p - *center).length() - radius,
            FieldShape::Plane { height } => p.y - height,
            FieldShape::HeightField(hf) => p.y - hf.height(p.x, p.z),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldShape::Sphere { .. } => "sphere",
            FieldShape::Plane { .. } => "plane",
            FieldShape::HeightField(_) => "height",
        }
    }
}
