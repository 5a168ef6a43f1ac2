use bevy::{
    prelude::*,
    render::{mesh::Indices, render_resource::PrimitiveTopology},
};

/// Point at distance `r` along azimuth `theta` and elevation `phi`,
/// given as `(theta, phi, r)`.
pub fn light_position(spherical: Vec3) -> Vec3 {
    let (sx, cx) = spherical.x.sin_cos();
    let (sy, cy) = spherical.y.sin_cos();
    spherical.z * Vec3::new(cx * cy, sx * cy, sy)
}

/// Corners and outward-facing faces of an octahedron centered on the origin.
pub fn octahedron(radius: f32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let vertices = vec![
        Vec3::X * radius,
        Vec3::NEG_X * radius,
        Vec3::Y * radius,
        Vec3::NEG_Y * radius,
        Vec3::Z * radius,
        Vec3::NEG_Z * radius,
    ];

    let triangles = vec![
        [0, 2, 4],
        [0, 4, 3],
        [0, 3, 5],
        [0, 5, 2],
        [1, 4, 2],
        [1, 2, 5],
        [1, 5, 3],
        [1, 3, 4],
    ];

    (vertices, triangles)
}

pub fn marker_mesh(radius: f32) -> Mesh {
    let (vertices, triangles) = octahedron(radius);

    // Flat shading: one set of vertices per face
    let mut positions = Vec::with_capacity(triangles.len() * 3);
    let mut normals = Vec::with_capacity(triangles.len() * 3);
    for [a, b, c] in triangles {
        let (a, b, c) = (vertices[a as usize], vertices[b as usize], vertices[c as usize]);
        let normal = (b - a).cross(c - a).normalize();
        positions.extend([a, b, c]);
        normals.extend([normal; 3]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);
    let indices = (0..positions.len() as u32).collect();
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.set_indices(Some(Indices::U32(indices)));

    mesh
}
