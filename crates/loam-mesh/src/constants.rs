//! Shared constants for loam-mesh. Cell corner/edge tables live here.

// Corner offsets of a unit cell; bit `i` of a cell mask refers to CORNERS[i].
pub(crate) const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 0, 1],
    [0, 0, 1],
    [0, 1, 0],
    [1, 1, 0],
    [1, 1, 1],
    [0, 1, 1],
];

// The 12 cell edges as pairs of corner indices.
pub(crate) const EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

pub(crate) const MASK_EMPTY: u8 = 0;
pub(crate) const MASK_FULL: u8 = 255;

// Central-difference step for gradient normals, in grid units.
pub(crate) const NORMAL_STEP: f32 = 0.01;
// Squared length below which `n × up` is treated as degenerate.
pub(crate) const TANGENT_DEGENERATE_SQ: f32 = 1e-6;

pub(crate) const INDICES_PER_QUAD: usize = 6;
