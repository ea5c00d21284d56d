//! Image decoding and tensor preparation
//!
//! Uploads are accepted as JPEG or PNG only, flattened to RGB, resized to the
//! network resolution and scaled to [0, 1] in CHW order. No mean/std
//! normalization is applied; the weights expect raw unit-range pixels.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, ImageFormat};

use crate::utils::error::{PlantDocError, Result};

/// Decode an in-memory upload, rejecting anything that is not JPEG or PNG
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let format = image::guess_format(bytes)?;

    match format {
        ImageFormat::Jpeg | ImageFormat::Png => {}
        other => return Err(PlantDocError::UnsupportedFormat(format!("{:?}", other))),
    }

    Ok(image::load_from_memory_with_format(bytes, format)?)
}

/// Read and decode an image file
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

/// Resize an image to `size`x`size` and flatten it to CHW `f32` values in [0, 1].
///
/// The result always holds `3 * size * size` values regardless of the source
/// dimensions or channel layout.
pub fn image_to_chw(image: &DynamicImage, size: u32, filter: FilterType) -> Vec<f32> {
    let rgb = if image.width() == size && image.height() == size {
        image.to_rgb8()
    } else {
        image.resize_exact(size, size, filter).to_rgb8()
    };

    let num_pixels = (size * size) as usize;
    let mut data = vec![0.0f32; 3 * num_pixels];

    for (i, pixel) in rgb.pixels().enumerate() {
        data[i] = pixel[0] as f32 / 255.0;
        data[num_pixels + i] = pixel[1] as f32 / 255.0;
        data[2 * num_pixels + i] = pixel[2] as f32 / 255.0;
    }

    data
}
