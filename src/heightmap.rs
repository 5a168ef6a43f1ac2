use std::path::Path;

use bevy::log::debug;
use image::DynamicImage;
use ndarray::Array2;

use crate::TerrainError;

/// Raw elevation samples, indexed `[[x, y]]`.
#[derive(Clone, Debug)]
pub struct HeightMap(pub Array2<f32>);

impl HeightMap {
    pub fn new(samples: Array2<f32>) -> Self {
        Self(samples)
    }

    /// Reads the red channel of an image as raw heights. Row 0 of the image is `y == 0`.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut data = Array2::zeros((width as usize, height as usize));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            data[[x as usize, y as usize]] = pixel[0] as f32;
        }

        Self(data)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        let image = image::open(path)?;
        let heightmap = Self::from_image(&image);

        debug!(
            "Loaded height map {} ({}x{})",
            path.display(),
            heightmap.dim().0,
            heightmap.dim().1
        );

        Ok(heightmap)
    }

    pub fn height_at(&self, x: usize, y: usize) -> f32 {
        self.0[[x, y]]
    }

    /// Sample with toroidal wraparound on both axes.
    pub fn wrapped(&self, x: i64, y: i64) -> f32 {
        let (width, height) = self.dim();
        let x = x.rem_euclid(width as i64) as usize;
        let y = y.rem_euclid(height as i64) as usize;
        self.0[[x, y]]
    }

    pub fn max_value(&self) -> f32 {
        self.0.fold(f32::NEG_INFINITY, |max, v| max.max(*v))
    }

    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use ndarray::array;

    #[test]
    fn wrapped_sampling_repeats_the_source() {
        let map = HeightMap::new(array![[1., 2.], [3., 4.], [5., 6.]]);

        assert_eq!(map.dim(), (3, 2));
        assert_eq!(map.wrapped(0, 0), map.height_at(0, 0));
        assert_eq!(map.wrapped(3, 0), map.height_at(0, 0));
        assert_eq!(map.wrapped(-1, 0), map.height_at(2, 0));
        assert_eq!(map.wrapped(4, -1), map.height_at(1, 1));
        assert_eq!(map.wrapped(-7, 5), map.height_at(2, 1));
    }

    #[test]
    fn image_red_channel_becomes_height() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 0, Rgb([200, 0, 0]));
        img.put_pixel(0, 1, Rgb([17, 255, 255]));

        let map = HeightMap::from_image(&DynamicImage::ImageRgb8(img));

        assert_eq!(map.dim(), (3, 2));
        assert_eq!(map.height_at(2, 0), 200.);
        assert_eq!(map.height_at(0, 1), 17.);
        assert_eq!(map.height_at(1, 1), 0.);
        assert_eq!(map.max_value(), 200.);
    }
}
