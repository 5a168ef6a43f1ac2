mod grid;

pub use grid::heightmap_to_grid_mesh;

use bevy::{
    prelude::*,
    render::{mesh::Indices, render_resource::PrimitiveTopology},
};

use crate::{HeightMap, TerrainError};

/// How a height map is laid out in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainLayout {
    /// Number of copies of the height map along each axis
    pub replication: u32,
    /// World-space extent of the whole replicated grid; z is the height range
    pub map_size: Vec3,
    /// Raw sample value that maps to the top of the height range
    pub max_height: f32,
}

impl Default for TerrainLayout {
    fn default() -> Self {
        Self {
            replication: 3,
            map_size: Vec3::new(1536., 1536., 50.),
            max_height: 255.,
        }
    }
}

impl TerrainLayout {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.replication == 0 {
            return Err(TerrainError::InvalidLayout(
                "replication must be at least 1".into(),
            ));
        }
        if !(self.map_size.cmpgt(Vec3::ZERO).all() && self.map_size.is_finite()) {
            return Err(TerrainError::InvalidLayout(format!(
                "map size must be positive, got {}",
                self.map_size
            )));
        }
        if !(self.max_height > 0. && self.max_height.is_finite()) {
            return Err(TerrainError::InvalidLayout(format!(
                "max height must be positive, got {}",
                self.max_height
            )));
        }
        Ok(())
    }

    /// Replicated sample counts in x and y, normalization value in z.
    pub fn grid_size(&self, terrain: &HeightMap) -> Vec3 {
        let (width, height) = terrain.dim();
        Vec3::new(
            (width * self.replication as usize) as f32,
            (height * self.replication as usize) as f32,
            self.max_height,
        )
    }

    /// World extent of a single copy of the height map.
    pub fn walkable_size(&self) -> Vec2 {
        self.map_size.truncate() / self.replication.max(1) as f32
    }
}

/// Struct-of-arrays terrain geometry, ready for bulk upload.
#[derive(Clone, Debug, Default)]
pub struct TerrainMeshData {
    /// Vertices per row, `W + 1`
    pub(crate) row_len: usize,
    pub positions: Vec<Vec3>,
    pub tangents_u: Vec<Vec3>,
    pub tangents_v: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Counter-clockwise when viewed from +z
    pub triangles: Vec<[u32; 3]>,
}

impl TerrainMeshData {
    pub fn vertex_index(&self, x: usize, y: usize) -> usize {
        y * self.row_len + x
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn flat_indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    pub fn into_render_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);

        let indices = self.flat_indices();

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_UV_0,
            self.uvs.iter().map(|uv| uv.to_array()).collect::<Vec<_>>(),
        );
        // Bitangent is rebuilt in the shader as normal x tangent
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_TANGENT,
            self.tangents_u
                .iter()
                .map(|t| t.extend(1.))
                .collect::<Vec<Vec4>>(),
        );

        mesh.set_indices(Some(Indices::U32(indices)));

        mesh
    }
}
