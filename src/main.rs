use std::{
    f32::consts::{FRAC_PI_2, FRAC_PI_4},
    path::PathBuf,
};

use terrain_walk::{
    config::ViewerConfig,
    generation::perlin_terrain,
    marker::{light_position, marker_mesh},
    motion::{MoveKey, ViewportMotion},
    HeightMap, Terrain, TerrainError,
};

use bevy::{
    app::AppExit,
    input::mouse::MouseMotion,
    pbr::{FogFalloff, FogSettings},
    prelude::*,
    window::{close_on_esc, CursorGrabMode, PrimaryWindow},
};
use bevy_atmosphere::prelude::*;

/// Config file given on the command line, if any
#[derive(Resource)]
struct ConfigPath(Option<PathBuf>);

#[derive(Resource)]
struct Walker(ViewportMotion);

#[derive(Component)]
struct PlayerCamera;

const MOVE_BINDINGS: [(KeyCode, MoveKey); 4] = [
    (KeyCode::W, MoveKey::Forward),
    (KeyCode::S, MoveKey::Back),
    (KeyCode::A, MoveKey::Left),
    (KeyCode::D, MoveKey::Right),
];

fn main() {
    App::new()
        .insert_resource(ConfigPath(std::env::args().nth(1).map(PathBuf::from)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Terrain Walk".into(),
                resolution: (843., 480.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugin(AtmospherePlugin)
        .add_startup_system(setup_terrain)
        .add_startup_system(grab_cursor)
        .add_systems((keyboard_input, mouse_look, update_motion, sync_camera).chain())
        .add_system(toggle_fog)
        .add_system(reload_textures)
        .add_system(close_on_esc)
        .run();
}

fn build_terrain(config: &ViewerConfig) -> Result<Terrain, TerrainError> {
    let heightmap = match &config.elevation_image {
        Some(path) => HeightMap::load(path)?,
        None => {
            info!("No elevation image configured, generating Perlin terrain");
            let size = config.noise.size;
            let mut terrain =
                perlin_terrain((size, size), config.noise.seed, config.noise.settings());
            terrain.multiply(config.max_height);
            terrain
        }
    };

    Terrain::new(heightmap, config.layout())
}

fn setup_terrain(
    mut commands: Commands,
    config_path: Res<ConfigPath>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut exit: EventWriter<AppExit>,
) {
    let loaded = match &config_path.0 {
        Some(path) => ViewerConfig::load(path),
        None => Ok(ViewerConfig::default()),
    }
    .and_then(|config| build_terrain(&config).map(|terrain| (config, terrain)));

    let (config, terrain) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            error!("Failed to set up terrain: {err}");
            exit.send(AppExit);
            return;
        }
    };

    let mut motion = ViewportMotion::new(config.motion, terrain.walkable_size());
    motion.settle(&terrain);

    let light = light_position(config.light_spherical());

    let terrain_material = StandardMaterial {
        base_color: if config.color_texture.is_some() {
            Color::WHITE
        } else {
            Color::rgb(1.0, 0.847, 0.569)
        },
        base_color_texture: config.color_texture.clone().map(|p| asset_server.load(p)),
        normal_map_texture: config.normal_texture.clone().map(|p| asset_server.load(p)),
        metallic_roughness_texture: config.gloss_texture.clone().map(|p| asset_server.load(p)),
        perceptual_roughness: 0.8,
        ..default()
    };

    add_lights(&mut commands);

    // Terrain space is z-up; roll it onto bevy's y-up world
    commands
        .spawn(SpatialBundle::from_transform(Transform::from_rotation(
            Quat::from_rotation_x(-FRAC_PI_2),
        )))
        .with_children(|world| {
            world.spawn(PbrBundle {
                mesh: meshes.add(terrain.render_mesh()),
                material: materials.add(terrain_material),
                ..default()
            });

            world.spawn(PbrBundle {
                mesh: meshes.add(marker_mesh(config.light.marker_radius)),
                material: materials.add(StandardMaterial {
                    base_color: Color::YELLOW,
                    unlit: true,
                    ..default()
                }),
                transform: Transform::from_translation(light),
                ..default()
            });

            world.spawn(DirectionalLightBundle {
                directional_light: DirectionalLight {
                    illuminance: 10000.,
                    shadows_enabled: false,
                    ..default()
                },
                transform: Transform::from_translation(light).looking_at(Vec3::ZERO, Vec3::Z),
                ..default()
            });

            let mut camera = world.spawn((
                Camera3dBundle {
                    transform: motion.pose.camera_transform(),
                    projection: PerspectiveProjection {
                        fov: FRAC_PI_4,
                        near: 1.,
                        far: 10000.,
                        ..default()
                    }
                    .into(),
                    ..default()
                },
                AtmosphereCamera::default(),
                PlayerCamera,
            ));
            if config.fog {
                camera.insert(fog_settings());
            }
        });

    info!(
        "Terrain ready, walkable area {} starting at {}",
        terrain.walkable_size(),
        motion.pose.position
    );

    commands.insert_resource(Walker(motion));
    commands.insert_resource(terrain);
    commands.insert_resource(config);
}

fn add_lights(commands: &mut Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::ORANGE_RED,
        brightness: 0.05,
    });
}

fn fog_settings() -> FogSettings {
    FogSettings {
        color: Color::rgba(0.85, 0.85, 0.9, 1.0),
        falloff: FogFalloff::Linear {
            start: 100.,
            end: 800.,
        },
        ..default()
    }
}

fn grab_cursor(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = windows.get_single_mut() {
        window.cursor.grab_mode = CursorGrabMode::Locked;
        window.cursor.visible = false;
    }
}

fn keyboard_input(keys: Res<Input<KeyCode>>, time: Res<Time>, walker: Option<ResMut<Walker>>) {
    let Some(mut walker) = walker else {
        return;
    };
    let now = time.elapsed_seconds_f64();

    for (code, key) in MOVE_BINDINGS {
        if keys.just_pressed(code) {
            walker.0.press(key, now);
        }
        if keys.just_released(code) {
            walker.0.release(key);
        }
    }

    if keys.just_pressed(KeyCode::Space) {
        walker.0.jump(now);
    }
}

fn mouse_look(
    mut mouse_motion: EventReader<MouseMotion>,
    windows: Query<&Window, With<PrimaryWindow>>,
    walker: Option<ResMut<Walker>>,
) {
    let (Some(mut walker), Ok(window)) = (walker, windows.get_single()) else {
        mouse_motion.clear();
        return;
    };

    for event in mouse_motion.iter() {
        walker
            .0
            .look(event.delta.x, event.delta.y, window.width(), window.height());
    }
}

fn update_motion(time: Res<Time>, terrain: Option<Res<Terrain>>, walker: Option<ResMut<Walker>>) {
    if let (Some(terrain), Some(mut walker)) = (terrain, walker) {
        walker.0.update(time.elapsed_seconds_f64(), &*terrain);
    }
}

fn sync_camera(
    walker: Option<Res<Walker>>,
    mut cameras: Query<&mut Transform, With<PlayerCamera>>,
) {
    let Some(walker) = walker else {
        return;
    };
    if !walker.is_changed() {
        return;
    }

    for mut transform in &mut cameras {
        *transform = walker.0.pose.camera_transform();
    }
}

fn toggle_fog(
    mut commands: Commands,
    keys: Res<Input<KeyCode>>,
    cameras: Query<(Entity, Option<&FogSettings>), With<PlayerCamera>>,
) {
    if !keys.just_pressed(KeyCode::F) {
        return;
    }

    for (camera, fog) in &cameras {
        if fog.is_some() {
            commands.entity(camera).remove::<FogSettings>();
        } else {
            commands.entity(camera).insert(fog_settings());
        }
    }
}

fn reload_textures(
    keys: Res<Input<KeyCode>>,
    config: Option<Res<ViewerConfig>>,
    asset_server: Res<AssetServer>,
) {
    let Some(config) = config else {
        return;
    };
    if !keys.just_pressed(KeyCode::R) {
        return;
    }

    for path in config.textures() {
        info!("Reloading texture {path}");
        asset_server.reload_asset(path);
    }
}
