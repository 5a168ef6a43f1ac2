use bevy::prelude::{Vec2, Vec3};
use ndarray::{array, Array2};
use terrain_walk::{
    generation::{perlin_terrain, NoiseSettings},
    meshing::{heightmap_to_grid_mesh, TerrainLayout},
    motion::{MotionSettings, MoveKey, ViewportMotion},
    ElevationSource, HeightMap, Terrain,
};

fn rolling_hills() -> HeightMap {
    let mut terrain = perlin_terrain((12, 9), 5, NoiseSettings::default());
    terrain.multiply(255.);
    terrain
}

fn layout(replication: u32) -> TerrainLayout {
    TerrainLayout {
        replication,
        map_size: Vec3::new(36. * replication as f32, 27. * replication as f32, 20.),
        max_height: 255.,
    }
}

#[test]
fn replicated_tiles_share_heights() {
    let terrain = rolling_hills();
    let (w, h) = terrain.dim();
    let mesh = heightmap_to_grid_mesh(&terrain, &layout(3)).unwrap();

    for y in 0..=3 * h {
        for x in 0..=2 * w {
            let here = mesh.positions[mesh.vertex_index(x, y)];
            let next_tile = mesh.positions[mesh.vertex_index(x + w, y)];
            assert_eq!(here.z, next_tile.z);
            assert_eq!(
                mesh.normals[mesh.vertex_index(x, y)],
                mesh.normals[mesh.vertex_index(x + w, y)]
            );
        }
    }
}

#[test]
fn tangent_frames_are_unit_and_orthogonal() {
    let mesh = heightmap_to_grid_mesh(&rolling_hills(), &layout(2)).unwrap();

    for ((n, tu), tv) in mesh.normals.iter().zip(&mesh.tangents_u).zip(&mesh.tangents_v) {
        assert!((n.length() - 1.).abs() < 1e-5);
        assert!((tu.length() - 1.).abs() < 1e-5);
        assert!((tv.length() - 1.).abs() < 1e-5);
        assert!(tu.dot(*n).abs() < 1e-5);
        assert!(tv.dot(*n).abs() < 1e-5);
    }
}

#[test]
fn triangle_count_and_index_bounds() {
    for (dims, replication) in [((1, 1), 1), ((3, 2), 2), ((5, 4), 3)] {
        let terrain = HeightMap(Array2::zeros(dims));
        let mesh = heightmap_to_grid_mesh(&terrain, &layout(replication)).unwrap();

        let w = dims.0 * replication as usize;
        let h = dims.1 * replication as usize;
        assert_eq!(mesh.vertex_count(), (w + 1) * (h + 1));
        assert_eq!(mesh.triangles.len(), 2 * w * h);
        assert!(mesh.flat_indices().iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }
}

#[test]
fn triangles_wind_counter_clockwise_from_above() {
    let mesh = heightmap_to_grid_mesh(&rolling_hills(), &layout(1)).unwrap();

    for [a, b, c] in &mesh.triangles {
        let (a, b, c) = (
            mesh.positions[*a as usize],
            mesh.positions[*b as usize],
            mesh.positions[*c as usize],
        );
        assert!((b - a).cross(c - a).z > 0.);
    }
}

#[test]
fn elevation_matches_vertices() {
    let terrain = Terrain::new(rolling_hills(), layout(2)).unwrap();
    let mesh = terrain.mesh();
    let (cells_x, cells_y) = (terrain.grid_size().x as usize, terrain.grid_size().y as usize);

    for y in 0..=cells_y {
        for x in 0..=cells_x {
            let vertex = mesh.positions[mesh.vertex_index(x, y)];
            let e = terrain.elevation(vertex.x, vertex.y);
            assert!(
                (e.height - vertex.z).abs() < 1e-3,
                "vertex ({x}, {y}): {} vs {}",
                e.height,
                vertex.z
            );
        }
    }
}

#[test]
fn elevation_stays_within_cell_corners() {
    let terrain = Terrain::new(rolling_hills(), layout(1)).unwrap();
    let mesh = terrain.mesh();
    let step = terrain.layout().map_size.truncate() / terrain.grid_size().truncate();

    for y in 0..9 {
        for x in 0..12 {
            let corners = [(x, y), (x + 1, y), (x + 1, y + 1), (x, y + 1)]
                .map(|(cx, cy)| mesh.positions[mesh.vertex_index(cx, cy)]);
            let low = corners.iter().map(|p| p.z).fold(f32::INFINITY, f32::min);
            let high = corners.iter().map(|p| p.z).fold(f32::NEG_INFINITY, f32::max);

            for (fx, fy) in [(0.3, 0.6), (0.8, 0.1), (0.5, 0.5), (0.05, 0.95)] {
                let p = corners[0].truncate() + Vec2::new(fx, fy) * step;
                let e = terrain.elevation(p.x, p.y);
                assert!(e.height >= low - 1e-4 && e.height <= high + 1e-4);
            }
        }
    }
}

#[test]
fn flat_terrain_is_level_everywhere() {
    let terrain = Terrain::new(HeightMap(Array2::from_elem((6, 6), 40.)), layout(2)).unwrap();

    for i in 0..50 {
        let x = -36. + i as f32 * 1.43;
        let y = 27. - i as f32 * 1.07;
        let e = terrain.elevation(x, y);
        assert!(e.tilt_xz.abs() < 1e-6);
        assert!(e.tilt_yz.abs() < 1e-6);
    }
}

#[test]
fn single_raised_corner() {
    let terrain = Terrain::new(
        HeightMap(array![[0., 0.], [0., 1.]]),
        TerrainLayout {
            replication: 1,
            map_size: Vec3::new(2., 2., 10.),
            max_height: 1.,
        },
    )
    .unwrap();
    assert_eq!(terrain.grid_size(), Vec3::new(2., 2., 1.));

    // Off the diagonal of cell (0, 0), which rises toward vertex (1, 1)
    let e = terrain.elevation(-1. + 0.25, -1. + 0.75);
    assert!(e.height > -5. && e.height < 5.);
    assert!((e.height - -2.5).abs() < 1e-5);

    // On the diagonal halfway between a low and the high corner
    let e = terrain.elevation(-0.5, -0.5);
    assert!(e.height.abs() < 1e-5);
}

#[test]
fn walking_over_real_terrain_follows_the_ground() {
    let terrain = Terrain::new(rolling_hills(), layout(3)).unwrap();
    let mut motion = ViewportMotion::new(MotionSettings::default(), terrain.walkable_size());
    motion.settle(&terrain);

    motion.press(MoveKey::Forward, 0.);
    motion.press(MoveKey::Right, 0.);
    for i in 1..=200 {
        let now = i as f64 * 0.02;
        motion.update(now, &terrain);

        let p = motion.pose.position;
        let walkable = terrain.walkable_size();
        assert!(p.x.abs() <= walkable.x / 2. && p.y.abs() <= walkable.y / 2.);
        assert!((p.z - terrain.elevation(p.x, p.y).height).abs() < 1e-4);
    }
}
