use loam_field::ChunkCoord;
use loam_geom::{Bounds, Vec3, Vec4};

use crate::buffers::MeshParts;

/// One chunk's extracted surface, moved whole from worker to renderer.
///
/// Positions and bounds are chunk-local; `origin` places them in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshPackage {
    pub coord: ChunkCoord,
    pub generation: u64,
    pub origin: Vec3,
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
}

impl MeshPackage {
    pub fn from_parts(coord: ChunkCoord, generation: u64, origin: Vec3, parts: MeshParts) -> Self {
        let MeshParts {
            vertices,
            normals,
            tangents,
            indices,
            bounds,
        } = parts;
        Self {
            coord,
            generation,
            origin,
            vertices,
            normals,
            tangents,
            indices,
            bounds,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Bounds translated into world space.
    pub fn world_bounds(&self) -> Bounds {
        Bounds::new(self.bounds.center + self.origin, self.bounds.extents)
    }
}
