//! Pure-Rust compressors built on the `image`, `png` and `color_quant` crates.

use super::Optimizer;
use crate::resize::encode_jpeg;
use crate::{GifOptions, ImageError, PngQuality, Result};
use color_quant::NeuQuant;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;

/// NeuQuant sampling factor: 1 is slowest and best, 30 fastest.
const PNG_SAMPLE_FACTOR: i32 = 10;

/// Compressors that need no external programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOptimizer;

impl NativeOptimizer {
    /// Create a native optimizer.
    pub fn new() -> Self {
        Self
    }
}

impl Optimizer for NativeOptimizer {
    fn name(&self) -> &'static str {
        "native"
    }

    fn optimize_jpeg(&self, data: &[u8], quality: u8) -> Result<Vec<u8>> {
        let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(ImageError::Decode)?;
        encode_jpeg(&img, quality.clamp(1, 100))
    }

    fn optimize_png(&self, data: &[u8], quality: PngQuality) -> Result<Vec<u8>> {
        let rgba = image::load_from_memory_with_format(data, image::ImageFormat::Png)
            .map_err(ImageError::Decode)?
            .to_rgba8();

        let quantized = quantize(&rgba, quality.palette_size());
        if quantized.quality < quality.min {
            return Err(ImageError::QualityTooLow {
                achieved: quantized.quality,
                minimum: quality.min,
            });
        }

        write_indexed_png(rgba.width(), rgba.height(), &quantized)
    }

    fn optimize_gif(&self, data: &[u8], options: GifOptions) -> Result<Vec<u8>> {
        let decoder = GifDecoder::new(Cursor::new(data)).map_err(ImageError::Decode)?;
        let frames = decoder.into_frames().collect_frames().map_err(ImageError::Decode)?;
        let animated = frames.len() > 1;

        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut out, gif_speed(options.lossy));
            if animated {
                encoder.set_repeat(Repeat::Infinite).map_err(ImageError::Encode)?;
            }
            encoder.encode_frames(frames).map_err(ImageError::Encode)?;
        }
        Ok(out)
    }
}

/// Map the 0-100 lossiness level onto the GIF quantizer speed (1-30).
///
/// Faster quantization samples fewer pixels and loses more detail.
fn gif_speed(lossy: u8) -> i32 {
    (1 + i32::from(lossy.min(100)) * 29 / 100).min(30)
}

/// An image reduced to a palette.
struct Quantized {
    /// RGBA palette entries
    palette: Vec<[u8; 4]>,
    /// One palette index per pixel
    indices: Vec<u8>,
    /// Estimated fidelity, 1.0 for a lossless palette
    quality: f32,
}

/// Reduce an image to at most `max_colors` colours.
///
/// Images that already fit get an exact palette; the rest go through NeuQuant.
fn quantize(rgba: &RgbaImage, max_colors: usize) -> Quantized {
    if let Some(exact) = exact_palette(rgba, max_colors) {
        return exact;
    }

    let raw = rgba.as_raw();
    let nq = NeuQuant::new(PNG_SAMPLE_FACTOR, max_colors, raw);
    let palette: Vec<[u8; 4]> = nq
        .color_map_rgba()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();

    let mut squared_error = 0u64;
    let indices: Vec<u8> = raw
        .chunks_exact(4)
        .map(|px| {
            let index = nq.index_of(px);
            let entry = palette[index];
            squared_error += px
                .iter()
                .zip(entry.iter())
                .map(|(&a, &b)| {
                    let d = i64::from(a) - i64::from(b);
                    (d * d) as u64
                })
                .sum::<u64>();
            index as u8
        })
        .collect();

    let samples = raw.len().max(1) as f64;
    let mse = squared_error as f64 / samples;
    let quality = (1.0 - mse.sqrt() / 255.0).clamp(0.0, 1.0) as f32;

    Quantized {
        palette,
        indices,
        quality,
    }
}

fn exact_palette(rgba: &RgbaImage, max_colors: usize) -> Option<Quantized> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity((rgba.width() * rgba.height()) as usize);

    for px in rgba.pixels() {
        let index = match lookup.get(&px.0) {
            Some(&index) => index,
            None => {
                if palette.len() == max_colors {
                    return None;
                }
                let index = palette.len() as u8;
                lookup.insert(px.0, index);
                palette.push(px.0);
                index
            }
        };
        indices.push(index);
    }

    Some(Quantized {
        palette,
        indices,
        quality: 1.0,
    })
}

fn write_indexed_png(width: u32, height: u32, quantized: &Quantized) -> Result<Vec<u8>> {
    let rgb: Vec<u8> = quantized.palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    let alpha: Vec<u8> = quantized.palette.iter().map(|c| c[3]).collect();
    let opaque = alpha.iter().all(|&a| a == 255);

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(rgb);
        if !opaque {
            encoder.set_trns(alpha);
        }
        encoder.set_compression(png::Compression::Best);
        encoder.set_filter(png::FilterType::NoFilter);

        let mut writer = encoder.write_header().map_err(png_error)?;
        writer.write_image_data(&quantized.indices).map_err(png_error)?;
        writer.finish().map_err(png_error)?;
    }
    Ok(out)
}

fn png_error(err: png::EncodingError) -> ImageError {
    ImageError::Optimize(format!("PNG encoding failed: {}", err))
}
