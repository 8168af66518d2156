//! Page image cleanup before recognition
//!
//! Grayscale, contrast stretch around the mean, binarization, a 3x3 median
//! filter against speckle, then upscaling of narrow pages. The result is a
//! PNG the recognizers accept.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat};
use imageproc::filter::median_filter;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Preprocessing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preprocessing {
    /// Contrast factor around the mean gray level
    pub contrast: f32,

    /// Gray level below which a pixel becomes black
    pub threshold: u8,

    /// Median filter radius (1 = 3x3)
    pub median_radius: u32,

    /// Pages narrower than this are upscaled to it (pixels)
    pub min_width: u32,
}

impl Default for Preprocessing {
    fn default() -> Self {
        Self {
            contrast: 2.0,
            threshold: 160,
            median_radius: 1,
            min_width: 1200,
        }
    }
}

impl Preprocessing {
    /// Clean up an encoded page image, returning PNG bytes
    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>, image::ImageError> {
        let gray = image::load_from_memory(data)?.to_luma8();
        let cleaned = self.clean(gray);

        let mut out = Vec::new();
        DynamicImage::ImageLuma8(cleaned).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        Ok(out)
    }

    fn clean(&self, mut gray: GrayImage) -> GrayImage {
        let pixels = (gray.width() as f32 * gray.height() as f32).max(1.0);
        let mean = gray.pixels().map(|p| p.0[0] as f32).sum::<f32>() / pixels;

        for pixel in gray.pixels_mut() {
            let stretched = (mean + self.contrast * (pixel.0[0] as f32 - mean)).clamp(0.0, 255.0);
            pixel.0[0] = if (stretched as u8) < self.threshold { 0 } else { 255 };
        }

        if self.median_radius > 0 {
            gray = median_filter(&gray, self.median_radius, self.median_radius);
        }

        let (width, height) = gray.dimensions();
        if width > 0 && width < self.min_width {
            let new_height = ((height as u64 * self.min_width as u64) / width as u64).max(1) as u32;
            gray = image::imageops::resize(&gray, self.min_width, new_height, FilterType::Lanczos3);
        }
        gray
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<(), String> {
        if !(self.contrast.is_finite() && self.contrast > 0.0) {
            return Err("preprocessing contrast must be positive".to_string());
        }
        if self.median_radius > 5 {
            return Err("preprocessing median_radius must be at most 5".to_string());
        }
        Ok(())
    }
}
