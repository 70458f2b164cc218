//! Pure image operations behind `/combine`: decode, flatten to RGB,
//! fit into cells, paste onto a white canvas and encode as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, Rgb, RgbImage};

use crate::config::CombinerConfig;
use crate::error::AppError;
use crate::utils::{cell_origin, fit_within, Layout};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Decodes downloaded bytes into 8-bit RGB. Transparent pixels are
/// composited over white, matching the canvas background.
pub fn decode_rgb(url: &str, body: &[u8]) -> Result<RgbImage, AppError> {
    let decoded = image::load_from_memory(body).map_err(|e| AppError::decode(url, e))?;
    Ok(flatten(decoded))
}

pub fn flatten(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let a = src[3] as u32;
        // c' = c * a + 255 * (1 - a)
        for channel in 0..3 {
            let c = src[channel] as u32;
            dst[channel] = ((c * a + 255 * (255 - a)) / 255) as u8;
        }
    }
    rgb
}

/// Scales to the largest aspect-preserving size inside the box.
pub fn resize_to_fit(img: &RgbImage, box_width: u32, box_height: u32) -> RgbImage {
    let (width, height) = fit_within(img.width(), img.height(), box_width, box_height);
    if (width, height) == img.dimensions() {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Arranges images row-major on a white canvas. A single image is only
/// resized and returned as-is.
pub fn compose(images: &[RgbImage], config: &CombinerConfig) -> Result<RgbImage, AppError> {
    let layout = Layout::for_count(images.len()).ok_or_else(|| {
        AppError::Processing(format!("no layout for {} images", images.len()))
    })?;
    let cell = (config.cell_width, config.cell_height);

    let cols = match layout {
        Layout::Single => return Ok(resize_to_fit(&images[0], cell.0, cell.1)),
        Layout::Grid { cols, .. } => cols,
    };

    let (width, height) = layout.canvas_size(cell.0, cell.1).ok_or_else(|| {
        AppError::Processing(format!("canvas for {}x{} cells is too large", cell.0, cell.1))
    })?;
    let mut canvas = RgbImage::from_pixel(width, height, WHITE);
    for (index, img) in images.iter().enumerate() {
        let resized = resize_to_fit(img, cell.0, cell.1);
        let (x, y) = cell_origin(index as u32, cols, cell, resized.dimensions());
        imageops::replace(&mut canvas, &resized, x as i64, y as i64);
    }
    Ok(canvas)
}

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, AppError> {
    let mut out = Vec::new();
    {
        let mut enc = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        enc.encode(img.as_raw(), img.width(), img.height(), ColorType::Rgb8.into())?;
    }
    Ok(out)
}

/// Full CPU-bound half of a combine: decode every body in order, lay
/// them out and encode. Runs on the blocking pool.
pub fn render(bodies: &[(String, bytes::Bytes)], config: &CombinerConfig) -> Result<Vec<u8>, AppError> {
    let images = bodies
        .iter()
        .map(|(url, body)| decode_rgb(url, body))
        .collect::<Result<Vec<_>, _>>()?;
    let combined = compose(&images, config)?;
    encode_jpeg(&combined, config.image_quality)
}
