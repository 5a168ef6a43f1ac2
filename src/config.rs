use std::{f32::consts::PI, path::Path, path::PathBuf};

use bevy::{
    log::info,
    prelude::{Resource, Vec2, Vec3},
};
use serde::Deserialize;

use crate::{
    generation::NoiseSettings, meshing::TerrainLayout, motion::MotionSettings, TerrainError,
};

/// Viewer settings, read from a JSON file. Missing fields take their defaults.
#[derive(Resource, Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Raster whose red channel holds raw heights; Perlin noise is used when unset
    pub elevation_image: Option<PathBuf>,
    /// Surface textures, as asset paths
    pub color_texture: Option<String>,
    pub normal_texture: Option<String>,
    /// Roughness is read from the green channel, metalness from blue
    pub gloss_texture: Option<String>,
    pub replication: u32,
    /// World extent of one copy of the height map
    pub walkable_size: [f32; 2],
    /// World height between the lowest and highest raw sample
    pub height_range: f32,
    /// Raw sample value at the top of the height range
    pub max_height: f32,
    pub noise: NoiseConfig,
    pub motion: MotionSettings,
    pub light: LightConfig,
    pub fog: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            elevation_image: None,
            color_texture: None,
            normal_texture: None,
            gloss_texture: None,
            replication: 3,
            walkable_size: [512., 512.],
            height_range: 50.,
            max_height: 255.,
            noise: NoiseConfig::default(),
            motion: MotionSettings::default(),
            light: LightConfig::default(),
            fog: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    pub size: usize,
    pub seed: u32,
    pub scale: f32,
    pub octaves: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        let settings = NoiseSettings::default();
        Self {
            size: 256,
            seed: 2,
            scale: settings.scale,
            octaves: settings.octaves,
        }
    }
}

impl NoiseConfig {
    pub fn settings(&self) -> NoiseSettings {
        NoiseSettings {
            scale: self.scale,
            octaves: self.octaves,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    /// Azimuth, elevation and distance from the origin
    pub spherical: [f32; 3],
    pub marker_radius: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            spherical: [0.5 * PI, 0.25 * PI, 300.],
            marker_radius: 10.,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TerrainError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        info!("Loading viewer config {}", path.display());

        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn layout(&self) -> TerrainLayout {
        let walkable = Vec2::from(self.walkable_size);
        let repl = self.replication;

        TerrainLayout {
            replication: repl,
            map_size: (walkable * repl as f32).extend(self.height_range),
            max_height: self.max_height,
        }
    }

    /// Asset paths of every configured surface texture.
    pub fn textures(&self) -> impl Iterator<Item = &str> {
        [
            &self.color_texture,
            &self.normal_texture,
            &self.gloss_texture,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
    }

    pub fn light_spherical(&self) -> Vec3 {
        Vec3::from(self.light.spherical)
    }
}
