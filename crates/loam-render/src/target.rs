use loam_field::ChunkCoord;
use loam_geom::{Bounds, Vec3};
use loam_mesh::MeshPackage;

/// A chunk's renderable mesh holder.
///
/// `set_mesh` replaces the whole mesh at once; a reader never observes a mix
/// of two packages.
pub trait MeshTarget {
    fn set_mesh(&mut self, package: MeshPackage);
}

/// CPU-side renderable for one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkRender {
    pub coord: ChunkCoord,
    pub origin: Vec3,
    mesh: Option<MeshPackage>,
}

impl ChunkRender {
    pub fn new(coord: ChunkCoord, origin: Vec3) -> Self {
        Self {
            coord,
            origin,
            mesh: None,
        }
    }

    pub fn mesh(&self) -> Option<&MeshPackage> {
        self.mesh.as_ref()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, MeshPackage::triangle_count)
    }

    /// World-space bounds, if a mesh with geometry is present.
    pub fn world_bounds(&self) -> Option<Bounds> {
        self.mesh
            .as_ref()
            .filter(|m| !m.is_empty())
            .map(MeshPackage::world_bounds)
    }
}

impl MeshTarget for ChunkRender {
    fn set_mesh(&mut self, package: MeshPackage) {
        if package.coord != self.coord {
            log::warn!(
                target: "present",
                "chunk {} handed a mesh for {}; ignoring",
                self.coord,
                package.coord
            );
            return;
        }
        self.mesh = Some(package);
    }
}
