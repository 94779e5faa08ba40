use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};

use super::error::IconError;

/// Centered square window of the source image that fills the icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverFit {
    pub side: u32,
    pub crop_x: u32,
    pub crop_y: u32,
}

/// Picks the largest centered square of the source, so scaling it to the
/// icon size fills the square without letterboxing.
pub fn cover_fit(width: u32, height: u32, size: u32) -> Option<CoverFit> {
    if width == 0 || height == 0 || size == 0 {
        return None;
    }
    let side = width.min(height);
    Some(CoverFit {
        side,
        crop_x: (width - side) / 2,
        crop_y: (height - side) / 2,
    })
}

/// Decodes an avatar and produces a `size`×`size` PNG whose pixels outside
/// the inscribed circle are transparent.
///
/// The source is cropped before it is scaled, so the working buffer never
/// exceeds the source or the icon.
pub fn render_circular_png(bytes: &[u8], size: u32) -> Result<Vec<u8>, IconError> {
    let source = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = source.dimensions();
    let fit = cover_fit(width, height, size).ok_or(IconError::EmptyImage)?;

    let square = imageops::crop_imm(&source, fit.crop_x, fit.crop_y, fit.side, fit.side).to_image();
    let mut icon: RgbaImage = imageops::resize(&square, size, size, FilterType::Triangle);
    clip_to_circle(&mut icon);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(icon).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

fn clip_to_circle(icon: &mut RgbaImage) {
    let (width, height) = icon.dimensions();
    let radius = width.min(height) as f64 / 2.0;
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);

    for (x, y, pixel) in icon.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        if dx * dx + dy * dy > radius * radius {
            pixel.0[3] = 0;
        }
    }
}
