use super::heightmap::HeightMap;

use std::f64::consts::TAU;

use ndarray::prelude::*;
use noise::{NoiseFn, Perlin};

pub struct NoiseSettings {
    /// Radius of the noise torus; larger values give more features per tile.
    pub scale: f32,
    pub octaves: usize,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 1.5,
            octaves: 6,
        }
    }
}

/// Perlin terrain in 0..1 that tiles seamlessly in both directions.
///
/// Each axis is mapped onto a circle, so the 2D grid samples a torus embedded in
/// 4D noise space and the last column/row lines up with the first.
pub fn perlin_terrain(
    (width, height): (usize, usize),
    seed: u32,
    noise_settings: NoiseSettings,
) -> HeightMap {
    let octaves = noise_settings.octaves.max(1);
    let radius = noise_settings.scale as f64;

    let perlin = Perlin::new(seed);

    let mut data = Array2::<f32>::zeros((width, height));

    for y in 0..height {
        let (sv, cv) = (TAU * y as f64 / height as f64).sin_cos();
        for x in 0..width {
            let (su, cu) = (TAU * x as f64 / width as f64).sin_cos();
            let mut scale = 1.0_f64;

            for i in 0..octaves {
                let freq = radius / scale;
                let sample = perlin.get([
                    i as f64 * 1000. + cu * freq,
                    su * freq,
                    cv * freq,
                    sv * freq,
                ]);
                data[[x, y]] += (scale * sample) as f32;
                scale /= 2.;
            }
        }
    }

    // Calculate the maximum magnitude of the terrain
    let (max_magnitude, _) = (0..octaves).fold((0.0_f32, 1.0_f32), |(max_magnitude, scale), _| {
        (max_magnitude + scale, scale / 2.0)
    });

    // Covert the values from -max_magnitude..max_magnitude to 0..1
    let mut terrain = HeightMap((data / max_magnitude + 1.) / 2.);
    terrain.clamp(0., 1.);
    terrain
}

impl HeightMap {
    pub fn multiply(&mut self, mult: f32) {
        self.0.mapv_inplace(|v| v * mult);
    }

    pub fn clamp(&mut self, min: f32, max: f32) {
        self.0.mapv_inplace(|v| v.clamp(min, max));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perlin_terrain_is_normalized() {
        let terrain = perlin_terrain((32, 24), 7, NoiseSettings::default());

        assert_eq!(terrain.dim(), (32, 24));
        assert!(terrain.0.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn perlin_terrain_wraps_smoothly() {
        let terrain = perlin_terrain((64, 64), 3, NoiseSettings::default());
        let step = |a: usize, b: usize, y: usize| {
            (terrain.height_at(a, y) - terrain.height_at(b, y)).abs()
        };

        // Stepping across the seam is no rougher than stepping anywhere else
        let seam = (0..64).map(|y| step(63, 0, y)).fold(0f32, f32::max);
        let interior = (0..63)
            .flat_map(|x| (0..64).map(move |y| (x, y)))
            .map(|(x, y)| step(x, x + 1, y))
            .fold(0f32, f32::max);

        assert!(seam <= 1.5 * interior, "seam step {seam} vs {interior}");
    }

    #[test]
    fn clamp_and_multiply() {
        let mut terrain = HeightMap(array![[0.125, 0.5], [0.875, 0.25]]);

        terrain.clamp(0.25, 0.75);
        terrain.multiply(4.);

        assert_eq!(terrain.0, array![[1., 2.], [3., 1.]]);
    }
}
