use loam_geom::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("chunk edge length {0} is out of range")]
    InvalidDims(usize),
    #[error("density field has {actual} samples, expected {expected}")]
    FieldLength { expected: usize, actual: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Grid cell `(x, y)` of a flat pool, laid out on the XZ plane.
    #[inline]
    pub const fn from_grid(x: i32, y: i32) -> Self {
        Self::new(x, 0, y)
    }

    /// World-space origin of the chunk for a given edge length.
    #[inline]
    pub fn origin(self, edge: usize) -> Vec3 {
        let e = edge as f32;
        Vec3::new(self.cx as f32 * e, self.cy as f32 * e, self.cz as f32 * e)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.cx, self.cy, self.cz)
    }
}

/// Logical edge `N` and padded edge `S = N + 2` of a cubic chunk.
///
/// The two extra samples per axis give the extractor neighbor context at the
/// chunk border so surfaces and normals line up with adjacent chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkDims {
    edge: usize,
    padded: usize,
}

impl ChunkDims {
    pub const PADDING: usize = 2;
    /// Worst case index entries per grid cell: three quads of two triangles.
    pub const INDICES_PER_CELL: usize = 18;

    /// Rejects `0` and any edge whose index capacity does not fit in `usize`.
    pub fn new(edge: usize) -> Result<Self, FieldError> {
        if edge == 0 {
            return Err(FieldError::InvalidDims(edge));
        }
        let padded = edge
            .checked_add(Self::PADDING)
            .filter(|s| {
                s.checked_pow(3)
                    .and_then(|n| n.checked_mul(Self::INDICES_PER_CELL))
                    .is_some()
            })
            .ok_or(FieldError::InvalidDims(edge))?;
        Ok(Self { edge, padded })
    }

    /// Dimensions for an already padded edge `S` (must be at least 3).
    pub fn from_padded(padded: usize) -> Result<Self, FieldError> {
        if padded <= Self::PADDING {
            return Err(FieldError::InvalidDims(padded.saturating_sub(Self::PADDING)));
        }
        Self::new(padded - Self::PADDING)
    }

    #[inline]
    pub fn edge(&self) -> usize {
        self.edge
    }

    #[inline]
    pub fn padded(&self) -> usize {
        self.padded
    }

    /// `S³`: field length and vertex/normal/tangent capacity.
    #[inline]
    pub fn samples(&self) -> usize {
        self.padded * self.padded * self.padded
    }

    /// `S³ × 18`: triangle index capacity.
    #[inline]
    pub fn index_capacity(&self) -> usize {
        self.samples() * Self::INDICES_PER_CELL
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.padded + z * self.padded * self.padded
    }
}
