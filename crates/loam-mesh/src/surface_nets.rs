use loam_field::ChunkDims;
use loam_geom::{Aabb, Bounds, Vec3, Vec4};

use crate::buffers::{ExtractReport, MeshBuffers};
use crate::constants::{
    CORNERS, EDGES, INDICES_PER_QUAD, MASK_EMPTY, MASK_FULL, NORMAL_STEP, TANGENT_DEGENERATE_SQ,
};
use crate::error::ChunkError;
use crate::extractor::SurfaceExtractor;

/// Naive surface nets: one vertex per sign-changing cell, quads across
/// sign-changing grid edges.
///
/// Emits at most one vertex and 18 indices per cell over `(S-1)³` cells, so
/// the `S³` / `S³ × 18` buffer contract always has room.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaiveSurfaceNets;

impl NaiveSurfaceNets {
    pub const STATUS_OK: i32 = 0;
}

struct Grid<'a> {
    field: &'a [f32],
    size: usize,
}

impl Grid<'_> {
    #[inline]
    fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.size + z * self.size * self.size
    }

    #[inline]
    fn at(&self, x: usize, y: usize, z: usize) -> f32 {
        self.field[self.idx(x, y, z)]
    }

    /// Trilinear sample; coordinates are clamped inside the grid.
    fn sample(&self, p: Vec3) -> f32 {
        let hi = (self.size - 1) as f32;
        let base_max = self.size - 2;
        let axis = |v: f32| {
            let v = v.clamp(0.0, hi);
            let i0 = (v.floor() as usize).min(base_max);
            (i0, v - i0 as f32)
        };
        let (x0, tx) = axis(p.x);
        let (y0, ty) = axis(p.y);
        let (z0, tz) = axis(p.z);
        let (x1, y1, z1) = (x0 + 1, y0 + 1, z0 + 1);
        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
        let c00 = lerp(self.at(x0, y0, z0), self.at(x1, y0, z0), tx);
        let c01 = lerp(self.at(x0, y0, z1), self.at(x1, y0, z1), tx);
        let c10 = lerp(self.at(x0, y1, z0), self.at(x1, y1, z0), tx);
        let c11 = lerp(self.at(x0, y1, z1), self.at(x1, y1, z1), tx);
        let c0 = lerp(c00, c10, ty);
        let c1 = lerp(c01, c11, ty);
        lerp(c0, c1, tz)
    }

    fn normal(&self, p: Vec3) -> Vec3 {
        let h = NORMAL_STEP;
        let dx = self.sample(p + Vec3::new(h, 0.0, 0.0)) - self.sample(p - Vec3::new(h, 0.0, 0.0));
        let dy = self.sample(p + Vec3::new(0.0, h, 0.0)) - self.sample(p - Vec3::new(0.0, h, 0.0));
        let dz = self.sample(p + Vec3::new(0.0, 0.0, h)) - self.sample(p - Vec3::new(0.0, 0.0, h));
        Vec3::new(dx, dy, dz).normalized()
    }

    fn corner_mask(&self, x: usize, y: usize, z: usize) -> u8 {
        let mut mask = 0u8;
        for (bit, c) in CORNERS.iter().enumerate() {
            if self.at(x + c[0], y + c[1], z + c[2]) < 0.0 {
                mask |= 1 << bit;
            }
        }
        mask
    }

    /// Mean of the zero crossings on the cell edges whose corners differ.
    fn cell_vertex(&self, x: usize, y: usize, z: usize, mask: u8) -> Vec3 {
        let mut sum = Vec3::ZERO;
        let mut crossings = 0u32;
        for [a, b] in EDGES {
            if (mask >> a) & 1 == (mask >> b) & 1 {
                continue;
            }
            let (ca, cb) = (CORNERS[a], CORNERS[b]);
            let pa = Vec3::new((x + ca[0]) as f32, (y + ca[1]) as f32, (z + ca[2]) as f32);
            let pb = Vec3::new((x + cb[0]) as f32, (y + cb[1]) as f32, (z + cb[2]) as f32);
            let da = self.at(x + ca[0], y + ca[1], z + ca[2]);
            let db = self.at(x + cb[0], y + cb[1], z + cb[2]);
            sum += pa.lerp(pb, (0.0 - da) / (db - da));
            crossings += 1;
        }
        sum / crossings as f32
    }
}

fn tangent_for(n: Vec3) -> Vec4 {
    let mut t = n.cross(Vec3::UP);
    if t.length_squared() < TANGENT_DEGENERATE_SQ {
        t = n.cross(Vec3::FORWARD);
    }
    t.normalized().extend(0.0)
}

struct Emitter<'a> {
    out: &'a mut MeshBuffers,
    vertex_count: usize,
    index_count: usize,
    bbox: Option<Aabb>,
}

impl Emitter<'_> {
    fn push_vertex(&mut self, v: Vec3, n: Vec3, t: Vec4) -> Result<u32, ChunkError> {
        let slot = self.vertex_count;
        if slot >= self.out.vertex_capacity() {
            return Err(ChunkError::fault(format!(
                "vertex capacity {} exhausted",
                self.out.vertex_capacity()
            )));
        }
        self.out.vertices[slot] = v;
        self.out.normals[slot] = n;
        self.out.tangents[slot] = t;
        self.vertex_count += 1;
        self.bbox = Some(match self.bbox {
            Some(bb) => bb.expanded_to(v),
            None => Aabb::new(v, v),
        });
        Ok(slot as u32)
    }

    /// Two triangles over `q`; `flip` reverses the winding.
    fn push_quad(&mut self, q: [u32; 4], flip: bool) -> Result<(), ChunkError> {
        let start = self.index_count;
        let end = start + INDICES_PER_QUAD;
        if end > self.out.index_capacity() {
            return Err(ChunkError::fault(format!(
                "index capacity {} exhausted",
                self.out.index_capacity()
            )));
        }
        let tri = if flip {
            [q[0], q[3], q[2], q[2], q[1], q[0]]
        } else {
            [q[0], q[1], q[2], q[2], q[3], q[0]]
        };
        self.out.indices[start..end].copy_from_slice(&tri);
        self.index_count = end;
        Ok(())
    }
}

impl SurfaceExtractor for NaiveSurfaceNets {
    fn name(&self) -> &'static str {
        "naive-surface-nets"
    }

    fn extract(
        &self,
        field: &[f32],
        size: usize,
        out: &mut MeshBuffers,
    ) -> Result<ExtractReport, ChunkError> {
        let dims = ChunkDims::from_padded(size)?;
        if field.len() != dims.samples() {
            return Err(loam_field::FieldError::FieldLength {
                expected: dims.samples(),
                actual: field.len(),
            }
            .into());
        }
        out.check_capacity(dims)?;

        let grid = Grid { field, size };
        // Vertex slot of each cell, valid only for cells that emitted one.
        let mut cell_vertex = vec![u32::MAX; dims.samples()];
        let mut emit = Emitter {
            out,
            vertex_count: 0,
            index_count: 0,
            bbox: None,
        };

        let cells = size - 1;
        for z in 0..cells {
            for y in 0..cells {
                for x in 0..cells {
                    let mask = grid.corner_mask(x, y, z);
                    if mask == MASK_EMPTY || mask == MASK_FULL {
                        continue;
                    }
                    let v = grid.cell_vertex(x, y, z, mask);
                    let n = grid.normal(v);
                    let slot = emit.push_vertex(v, n, tangent_for(n))?;
                    cell_vertex[grid.idx(x, y, z)] = slot;

                    if x == 0 || y == 0 || z == 0 {
                        continue;
                    }
                    let inside0 = (mask & 1) != 0;
                    let id = |dx: usize, dy: usize, dz: usize| {
                        cell_vertex[grid.idx(x - dx, y - dy, z - dz)]
                    };
                    // Edge along +x from the cell's minimum corner.
                    if ((mask >> 1) & 1 != 0) != inside0 {
                        let q = [id(0, 0, 0), id(0, 0, 1), id(0, 1, 1), id(0, 1, 0)];
                        emit.push_quad(q, inside0)?;
                    }
                    // Edge along +z.
                    if ((mask >> 3) & 1 != 0) != inside0 {
                        let q = [id(0, 0, 0), id(0, 1, 0), id(1, 1, 0), id(1, 0, 0)];
                        emit.push_quad(q, inside0)?;
                    }
                    // Edge along +y.
                    if ((mask >> 4) & 1 != 0) != inside0 {
                        let q = [id(0, 0, 0), id(1, 0, 0), id(1, 0, 1), id(0, 0, 1)];
                        emit.push_quad(q, inside0)?;
                    }
                }
            }
        }

        let Emitter {
            out,
            vertex_count,
            index_count,
            bbox,
        } = emit;
        out.bounds = bbox.map(Bounds::from).unwrap_or(Bounds::EMPTY);
        Ok(ExtractReport {
            status: Self::STATUS_OK,
            vertex_count,
            index_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trilinear_sample_hits_grid_points_and_clamps() {
        let size = 3;
        let field: Vec<f32> = (0..27).map(|i| i as f32).collect();
        let grid = Grid {
            field: &field,
            size,
        };
        assert_eq!(grid.sample(Vec3::new(1.0, 1.0, 1.0)), grid.at(1, 1, 1));
        assert_eq!(grid.sample(Vec3::new(2.0, 2.0, 2.0)), grid.at(2, 2, 2));
        // Outside the grid reads the clamped border instead of going out of range.
        assert_eq!(grid.sample(Vec3::new(5.0, -3.0, 2.0)), grid.at(2, 0, 2));
    }

    #[test]
    fn tangent_is_orthogonal_to_normal() {
        for n in [Vec3::UP, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.3, 0.4, 0.866).normalized()] {
            let t = tangent_for(n);
            assert!(n.dot(t.xyz()).abs() < 1e-5);
            assert!((t.xyz().length() - 1.0).abs() < 1e-5);
            assert_eq!(t.w, 0.0);
        }
    }
}
