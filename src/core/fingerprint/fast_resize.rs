//! Fast SIMD-accelerated downsampling to the stamp grid.
//!
//! Uses fast_image_resize, which picks AVX2/NEON code paths when available.

use crate::error::DecodeError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::GrayImage;

/// Bilinear resizer for single-channel images
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize a grayscale image to `width` x `height` with linear interpolation.
    pub fn resize(
        &mut self,
        image: &GrayImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, DecodeError> {
        let (src_width, src_height) = image.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(DecodeError::Resize("Invalid source dimensions".to_string()));
        }

        if width == 0 || height == 0 {
            return Err(DecodeError::Resize(
                "Invalid destination dimensions".to_string(),
            ));
        }

        let src_image =
            Image::from_vec_u8(src_width, src_height, image.as_raw().clone(), PixelType::U8)
                .map_err(|e| {
                    DecodeError::Resize(format!("Failed to create source image: {}", e))
                })?;

        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| DecodeError::Resize(e.to_string()))?;

        GrayImage::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| DecodeError::Resize("Failed to create result buffer".to_string()))
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-off resizing
pub fn resize_to_grid(image: &GrayImage, width: u32, height: u32) -> Result<GrayImage, DecodeError> {
    FastResizer::new().resize(image, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / width.max(1)) as u8]))
    }

    #[test]
    fn resize_produces_correct_dimensions() {
        let resized = resize_to_grid(&gradient(100, 100), 8, 8).unwrap();
        assert_eq!(resized.dimensions(), (8, 8));
    }

    #[test]
    fn resize_non_square_image() {
        let resized = resize_to_grid(&gradient(200, 100), 8, 4).unwrap();
        assert_eq!(resized.dimensions(), (8, 4));
    }

    #[test]
    fn resize_keeps_uniform_images_uniform() {
        let image = GrayImage::from_pixel(64, 48, Luma([128]));
        let resized = resize_to_grid(&image, 8, 8).unwrap();
        assert!(resized.pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn resize_rejects_zero_destination() {
        assert!(resize_to_grid(&gradient(16, 16), 0, 8).is_err());
    }

    #[test]
    fn resizer_reuse() {
        let mut resizer = FastResizer::new();
        let image = gradient(100, 100);

        let first = resizer.resize(&image, 8, 8).unwrap();
        let second = resizer.resize(&image, 8, 8).unwrap();

        assert_eq!(first, second);
    }
}
