use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use loam_geom::Vec3;

use crate::shape::{ConstantHeight, FastNoiseHeight, FieldShape, HeightField, HeightNoise};

#[derive(Clone, Debug, Deserialize)]
pub struct FieldConfig {
    #[serde(default = "default_shape")]
    pub shape: ShapeKind,
    #[serde(default)]
    pub height: Height,
    #[serde(default)]
    pub sphere: Sphere,
    #[serde(default)]
    pub plane: Plane,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            shape: default_shape(),
            height: Height::default(),
            sphere: Sphere::default(),
            plane: Plane::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Height,
    Sphere,
    Plane,
}

fn default_shape() -> ShapeKind {
    ShapeKind::Height
}

impl std::str::FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "height" => Ok(ShapeKind::Height),
            "sphere" => Ok(ShapeKind::Sphere),
            "plane" => Ok(ShapeKind::Plane),
            other => Err(format!("unknown field shape '{other}' (height|sphere|plane)")),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Height {
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_base")]
    pub base: f32,
    #[serde(default = "default_frequency")]
    pub frequency: f32,
    #[serde(default = "default_seed")]
    pub seed: i32,
    /// Replaces the noise with a constant sample when set.
    #[serde(default)]
    pub constant: Option<f32>,
}
fn default_amplitude() -> f32 {
    HeightField::DEFAULT_AMPLITUDE
}
fn default_base() -> f32 {
    HeightField::DEFAULT_BASE
}
fn default_frequency() -> f32 {
    HeightField::DEFAULT_FREQUENCY
}
fn default_seed() -> i32 {
    1337
}
impl Default for Height {
    fn default() -> Self {
        Self {
            amplitude: default_amplitude(),
            base: default_base(),
            frequency: default_frequency(),
            seed: default_seed(),
            constant: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Sphere {
    #[serde(default = "default_sphere_center")]
    pub center: [f32; 3],
    #[serde(default = "default_sphere_radius")]
    pub radius: f32,
}
fn default_sphere_center() -> [f32; 3] {
    [8.0, 8.0, 8.0]
}
fn default_sphere_radius() -> f32 {
    6.0
}
impl Default for Sphere {
    fn default() -> Self {
        Self {
            center: default_sphere_center(),
            radius: default_sphere_radius(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Plane {
    #[serde(default = "default_plane_height")]
    pub height: f32,
}
fn default_plane_height() -> f32 {
    8.5
}
impl Default for Plane {
    fn default() -> Self {
        Self {
            height: default_plane_height(),
        }
    }
}

impl FieldConfig {
    pub fn build_shape(&self) -> FieldShape {
        match self.shape {
            ShapeKind::Height => {
                let h = &self.height;
                let noise: Arc<dyn HeightNoise> = match h.constant {
                    Some(c) => Arc::new(ConstantHeight(c)),
                    None => Arc::new(FastNoiseHeight::new(h.seed, h.frequency)),
                };
                FieldShape::HeightField(HeightField::new(noise, h.amplitude, h.base))
            }
            ShapeKind::Sphere => {
                let [x, y, z] = self.sphere.center;
                FieldShape::Sphere {
                    center: Vec3::new(x, y, z),
                    radius: self.sphere.radius,
                }
            }
            ShapeKind::Plane => FieldShape::Plane {
                height: self.plane.height,
            },
        }
    }
}

pub fn parse_field_config(s: &str) -> Result<FieldConfig, Box<dyn Error>> {
    Ok(toml::from_str(s)?)
}

pub fn load_field_config_from_path(path: &Path) -> Result<FieldConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    parse_field_config(&s)
}
