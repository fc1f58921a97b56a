use loam_field::ChunkDims;
use loam_geom::{Bounds, Vec3, Vec4};

use crate::error::ChunkError;

/// What an extractor reports back after filling [`MeshBuffers`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Opaque implementation status; callers only log it.
    pub status: i32,
    pub vertex_count: usize,
    pub index_count: usize,
}

/// Caller-preallocated output storage handed to an extractor.
///
/// Every array is allocated at its full contract capacity up front; the
/// extractor writes a prefix and reports how long it is. Entries past the
/// reported counts are unspecified.
#[derive(Clone, Debug)]
pub struct MeshBuffers {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
}

/// Valid prefix of [`MeshBuffers`], trimmed to the reported counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshParts {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
}

impl MeshBuffers {
    pub fn allocate(dims: ChunkDims) -> Self {
        let n = dims.samples();
        Self {
            vertices: vec![Vec3::ZERO; n],
            normals: vec![Vec3::ZERO; n],
            tangents: vec![Vec4::ZERO; n],
            indices: vec![0; dims.index_capacity()],
            bounds: Bounds::EMPTY,
        }
    }

    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_capacity(&self) -> usize {
        self.indices.len()
    }

    /// Verifies every array matches the contract sizing for `dims` exactly.
    pub fn check_capacity(&self, dims: ChunkDims) -> Result<(), ChunkError> {
        let verts = dims.samples();
        let checks = [
            ("vertex", verts, self.vertices.len()),
            ("normal", verts, self.normals.len()),
            ("tangent", verts, self.tangents.len()),
            ("index", dims.index_capacity(), self.indices.len()),
        ];
        for (buffer, expected, actual) in checks {
            if expected != actual {
                return Err(ChunkError::CapacityMismatch {
                    buffer,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Validates `report` against the buffers and keeps only the valid prefix.
    pub fn into_parts(self, report: ExtractReport) -> Result<MeshParts, ChunkError> {
        let ExtractReport {
            vertex_count,
            index_count,
            ..
        } = report;
        if vertex_count > self.vertex_capacity() {
            return Err(ChunkError::fault(format!(
                "reported {vertex_count} vertices, capacity {}",
                self.vertex_capacity()
            )));
        }
        if index_count > self.index_capacity() {
            return Err(ChunkError::fault(format!(
                "reported {index_count} indices, capacity {}",
                self.index_capacity()
            )));
        }
        if index_count % 3 != 0 {
            return Err(ChunkError::fault(format!(
                "index count {index_count} is not a whole number of triangles"
            )));
        }
        let MeshBuffers {
            mut vertices,
            mut normals,
            mut tangents,
            mut indices,
            bounds,
        } = self;
        vertices.truncate(vertex_count);
        normals.truncate(vertex_count);
        tangents.truncate(vertex_count);
        indices.truncate(index_count);
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ChunkError::fault(format!(
                "index {bad} references past {vertex_count} vertices"
            )));
        }
        vertices.shrink_to_fit();
        normals.shrink_to_fit();
        tangents.shrink_to_fit();
        indices.shrink_to_fit();
        Ok(MeshParts {
            vertices,
            normals,
            tangents,
            indices,
            bounds,
        })
    }
}
