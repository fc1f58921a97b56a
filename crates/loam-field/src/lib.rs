//! Chunk sizing, density fields, and field generation parameters.
#![forbid(unsafe_code)]

pub mod config;
mod coord;
mod field;
mod generator;
pub mod shape;

pub use coord::{ChunkCoord, ChunkDims, FieldError};
pub use field::DensityField;
pub use generator::DensityFieldGenerator;
pub use shape::{ConstantHeight, FastNoiseHeight, FieldShape, HeightField, HeightNoise};
