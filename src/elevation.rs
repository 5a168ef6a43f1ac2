use bevy::prelude::*;

use crate::{
    meshing::{heightmap_to_grid_mesh, TerrainLayout, TerrainMeshData},
    HeightMap, TerrainError,
};

/// Ground height and the slope angles that align "up" with the surface normal.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Elevation {
    pub height: f32,
    /// Rotation about y
    pub tilt_xz: f32,
    /// Rotation about x
    pub tilt_yz: f32,
}

/// Anything that can report the ground under a world-space point.
pub trait ElevationSource {
    fn elevation(&self, x: f32, y: f32) -> Elevation;
}

/// A built terrain: its layout plus the geometry queried for ground elevation.
#[derive(Resource, Clone, Debug)]
pub struct Terrain {
    layout: TerrainLayout,
    grid_size: Vec3,
    /// Cells per axis
    cells: (usize, usize),
    mesh: TerrainMeshData,
}

impl Terrain {
    pub fn new(heightmap: HeightMap, layout: TerrainLayout) -> Result<Self, TerrainError> {
        let mesh = heightmap_to_grid_mesh(&heightmap, &layout)?;
        let grid_size = layout.grid_size(&heightmap);

        Ok(Self {
            layout,
            grid_size,
            cells: (grid_size.x as usize, grid_size.y as usize),
            mesh,
        })
    }

    pub fn layout(&self) -> &TerrainLayout {
        &self.layout
    }

    pub fn grid_size(&self) -> Vec3 {
        self.grid_size
    }

    pub fn walkable_size(&self) -> Vec2 {
        self.layout.walkable_size()
    }

    pub fn mesh(&self) -> &TerrainMeshData {
        &self.mesh
    }

    pub fn render_mesh(&self) -> Mesh {
        self.mesh.clone().into_render_mesh()
    }

    /// Lower-left corner of the cell containing `(x, y)`, clamped to the grid.
    fn cell_at(&self, x: f32, y: f32) -> (usize, usize) {
        let p_grid = (Vec2::new(x, y) / self.layout.map_size.truncate() + 0.5)
            * self.grid_size.truncate();

        // Casts saturate, and NaN lands on 0
        let x0 = (p_grid.x.floor() as i64).clamp(0, self.cells.0 as i64 - 1);
        let y0 = (p_grid.y.floor() as i64).clamp(0, self.cells.1 as i64 - 1);
        (x0 as usize, y0 as usize)
    }
}

/// Clamps `v` into `lo..=hi`; NaN collapses onto `lo`.
fn clamp_into(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() {
        lo
    } else {
        v.clamp(lo, hi)
    }
}

/// Unsigned area of the triangle `abc`.
fn area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    0.5 * (b - a).perp_dot(c - a).abs()
}

/// Barycentric weights of `p` against `abc`. They sum to one only when `p` is
/// inside the triangle, and to more than one outside it.
fn weights(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Vec3 {
    let total = area(a, b, c);
    Vec3::new(area(p, b, c), area(a, p, c), area(a, b, p)) / total
}

impl ElevationSource for Terrain {
    /// Interpolates height and normal across the grid triangle under `(x, y)`.
    ///
    /// Points outside the map are clamped onto the nearest edge cell; callers
    /// wrap positions into the walkable area first.
    fn elevation(&self, x: f32, y: f32) -> Elevation {
        let (x0, y0) = self.cell_at(x, y);

        let corners = [
            self.mesh.vertex_index(x0, y0),
            self.mesh.vertex_index(x0 + 1, y0),
            self.mesh.vertex_index(x0 + 1, y0 + 1),
            self.mesh.vertex_index(x0, y0 + 1),
        ];
        let flat = corners.map(|i| self.mesh.positions[i].truncate());
        let p = Vec2::new(
            clamp_into(x, flat[0].x, flat[2].x),
            clamp_into(y, flat[0].y, flat[2].y),
        );

        // Both triangles of the cell, wound as in the mesh
        let tri0 = [corners[0], corners[1], corners[2]];
        let tri1 = [corners[0], corners[2], corners[3]];
        let w0 = weights(p, flat[0], flat[1], flat[2]);
        let w1 = weights(p, flat[0], flat[2], flat[3]);

        let (tri, w) = if w0.x + w0.y + w0.z < w1.x + w1.y + w1.z {
            (tri0, w0)
        } else {
            (tri1, w1)
        };

        let height = tri
            .iter()
            .zip(w.to_array())
            .map(|(&i, w)| self.mesh.positions[i].z * w)
            .sum();
        let n = tri
            .iter()
            .zip(w.to_array())
            .map(|(&i, w)| self.mesh.normals[i] * w)
            .sum::<Vec3>()
            .normalize_or_zero();

        // A vertical normal has no defined tilt
        let (tilt_xz, tilt_yz) = if n.z.abs() < f32::EPSILON {
            (0., 0.)
        } else {
            ((-n.x / n.z).atan(), (n.y / n.z).atan())
        };

        Elevation {
            height,
            tilt_xz,
            tilt_yz,
        }
    }
}
