use bevy::{
    log::{debug, info},
    prelude::*,
};

use super::{TerrainLayout, TerrainMeshData};
use crate::{HeightMap, TerrainError};

/// Builds a `(W + 1) x (H + 1)` vertex grid covering the height map repeated
/// `replication` times per axis, centered on the origin with z up.
///
/// Every sample lookup wraps around the source map, so heights and tangents are
/// continuous across the seams between copies.
pub fn heightmap_to_grid_mesh(
    terrain: &HeightMap,
    layout: &TerrainLayout,
) -> Result<TerrainMeshData, TerrainError> {
    let (source_width, source_height) = terrain.dim();
    if terrain.is_empty() {
        return Err(TerrainError::EmptyHeightMap {
            width: source_width,
            height: source_height,
        });
    }
    layout.validate()?;

    let map_size = layout.map_size;
    let grid_size = layout.grid_size(terrain);
    let width = source_width * layout.replication as usize;
    let height = source_height * layout.replication as usize;

    // Slope of world height per unit of raw sample difference
    let height_scale = 0.5 * map_size.z / grid_size.z;
    let step = map_size.truncate() / grid_size.truncate();
    let uv_scale = layout.replication as f32 / grid_size.truncate();

    let num_vertices = (width + 1) * (height + 1);
    let mut positions = Vec::with_capacity(num_vertices);
    let mut tangents_u = Vec::with_capacity(num_vertices);
    let mut tangents_v = Vec::with_capacity(num_vertices);
    let mut normals = Vec::with_capacity(num_vertices);
    let mut uvs = Vec::with_capacity(num_vertices);

    for y in 0..=height as i64 {
        for x in 0..=width as i64 {
            let h = terrain.wrapped(x, y);
            positions.push((Vec3::new(x as f32, y as f32, h) / grid_size - 0.5) * map_size);

            let du = (terrain.wrapped(x + 1, y) - terrain.wrapped(x - 1, y)) * height_scale;
            let dv = (terrain.wrapped(x, y + 1) - terrain.wrapped(x, y - 1)) * height_scale;

            let tangent_u = Vec3::new(step.x, 0., du).normalize();
            let tangent_v = Vec3::new(0., step.y, dv).normalize();
            tangents_u.push(tangent_u);
            tangents_v.push(tangent_v);
            normals.push(tangent_u.cross(tangent_v).normalize());

            // Surface texture repeats replication^2 times across the map
            uvs.push(Vec2::new(x as f32, y as f32) * uv_scale);
        }
    }

    let row_len = width + 1;
    let idx = |x: usize, y: usize| -> u32 { (x + y * row_len) as u32 };

    let mut triangles = Vec::with_capacity(2 * width * height);
    for y in 0..height {
        for x in 0..width {
            // Add quad split along the (x, y) - (x + 1, y + 1) diagonal
            triangles.push([idx(x, y), idx(x + 1, y), idx(x + 1, y + 1)]);
            triangles.push([idx(x, y), idx(x + 1, y + 1), idx(x, y + 1)]);
        }
    }

    info!(
        "Built terrain grid {}x{} ({} vertices, {} triangles)",
        width,
        height,
        positions.len(),
        triangles.len()
    );
    debug!("Terrain grid size {}, map size {}", grid_size, map_size);

    Ok(TerrainMeshData {
        row_len,
        positions,
        tangents_u,
        tangents_v,
        normals,
        uvs,
        triangles,
    })
}
