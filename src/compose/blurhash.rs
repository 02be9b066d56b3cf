//! Client-side blur preview hashes.
//!
//! Images are decoded, downsampled so the longer side fits a small bound and
//! reduced to a compact BlurHash string: a DC colour plus a fixed grid of
//! cosine components, base83 encoded.

use std::f64::consts::PI;

use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};

use crate::config::MediaConfig;

const BASE83: &[u8; 83] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz#$%*+,-.:;=?@[]^_{|}~";

/// Blur preview encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurPreviewer {
    components_x: u32,
    components_y: u32,
    max_dimension: u32,
}

impl Default for BlurPreviewer {
    fn default() -> Self {
        Self::new(4, 3, 64)
    }
}

impl BlurPreviewer {
    /// Create an encoder; component counts are clamped to 1..=9
    pub fn new(components_x: u32, components_y: u32, max_dimension: u32) -> Self {
        Self {
            components_x: components_x.clamp(1, 9),
            components_y: components_y.clamp(1, 9),
            max_dimension: max_dimension.max(1),
        }
    }

    /// Build from media settings
    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(
            config.blur_components_x,
            config.blur_components_y,
            config.preview_max_dimension,
        )
    }

    /// Decode encoded image bytes and hash them
    pub fn encode_bytes(&self, bytes: &[u8]) -> Result<String> {
        let image = image::load_from_memory(bytes).context("Failed to decode image")?;
        Ok(self.encode_image(&image))
    }

    /// Hash an already decoded image
    pub fn encode_image(&self, image: &DynamicImage) -> String {
        let small = downsample(image, self.max_dimension).to_rgba8();
        encode(self.components_x, self.components_y, &small)
    }
}

/// Shrink so the longer side is at most `max_dimension`, keeping aspect ratio
fn downsample(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());

    if width <= max_dimension && height <= max_dimension {
        return image.clone();
    }

    // Calculate new dimensions maintaining aspect ratio
    let ratio = f64::from(width) / f64::from(height);
    let (new_width, new_height) = if width > height {
        (max_dimension, (f64::from(max_dimension) / ratio) as u32)
    } else {
        ((f64::from(max_dimension) * ratio) as u32, max_dimension)
    };

    image.resize_exact(
        new_width.max(1),
        new_height.max(1),
        image::imageops::FilterType::Triangle,
    )
}

/// Encode RGBA pixels into a BlurHash string
pub fn encode(components_x: u32, components_y: u32, pixels: &RgbaImage) -> String {
    let (width, height) = pixels.dimensions();
    let mut factors: Vec<[f64; 3]> = Vec::with_capacity((components_x * components_y) as usize);

    for j in 0..components_y {
        for i in 0..components_x {
            factors.push(basis_factor(i, j, width, height, pixels));
        }
    }

    let dc = factors[0];
    let ac = &factors[1..];

    let mut hash = String::with_capacity(4 + 2 * factors.len());
    let size_flag = (components_x - 1) + (components_y - 1) * 9;
    push_base83(&mut hash, size_flag, 1);

    let max_value = if ac.is_empty() {
        push_base83(&mut hash, 0, 1);
        1.0
    } else {
        let actual_max = ac
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let quantised = (actual_max * 166.0 - 0.5).floor().clamp(0.0, 82.0) as u32;
        push_base83(&mut hash, quantised, 1);
        (f64::from(quantised) + 1.0) / 166.0
    };

    push_base83(&mut hash, encode_dc(dc), 4);
    for component in ac {
        push_base83(&mut hash, encode_ac(*component, max_value), 2);
    }

    hash
}

fn basis_factor(i: u32, j: u32, width: u32, height: u32, pixels: &RgbaImage) -> [f64; 3] {
    let normalisation = if i == 0 && j == 0 { 1.0 } else { 2.0 };
    let mut sum = [0.0_f64; 3];

    for y in 0..height {
        let basis_y = (PI * f64::from(j) * f64::from(y) / f64::from(height)).cos();
        for x in 0..width {
            let basis =
                (PI * f64::from(i) * f64::from(x) / f64::from(width)).cos() * basis_y;
            let pixel = pixels.get_pixel(x, y);
            sum[0] += basis * srgb_to_linear(pixel[0]);
            sum[1] += basis * srgb_to_linear(pixel[1]);
            sum[2] += basis * srgb_to_linear(pixel[2]);
        }
    }

    let scale = normalisation / (f64::from(width) * f64::from(height));
    [sum[0] * scale, sum[1] * scale, sum[2] * scale]
}

fn encode_dc(value: [f64; 3]) -> u32 {
    let r = linear_to_srgb(value[0]);
    let g = linear_to_srgb(value[1]);
    let b = linear_to_srgb(value[2]);
    (r << 16) + (g << 8) + b
}

fn encode_ac(value: [f64; 3], max_value: f64) -> u32 {
    let quant = |v: f64| -> u32 {
        (sign_pow(v / max_value, 0.5) * 9.0 + 9.5)
            .floor()
            .clamp(0.0, 18.0) as u32
    };
    quant(value[0]) * 19 * 19 + quant(value[1]) * 19 + quant(value[2])
}

fn sign_pow(value: f64, exp: f64) -> f64 {
    value.abs().powf(exp).copysign(value)
}

fn srgb_to_linear(value: u8) -> f64 {
    let v = f64::from(value) / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(value: f64) -> u32 {
    let v = value.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        (v * 12.92 * 255.0 + 0.5) as u32
    } else {
        ((1.055 * v.powf(1.0 / 2.4) - 0.055) * 255.0 + 0.5) as u32
    }
}

fn push_base83(out: &mut String, value: u32, length: u32) {
    for i in 1..=length {
        let digit = (value / 83_u32.pow(length - i)) % 83;
        out.push(BASE83[digit as usize] as char);
    }
}
