//! Format-dispatched lossy/lossless optimization.
//!
//! The [`Optimizer`] trait exposes one compressor per supported format.
//! [`optimize`] sniffs the buffer once and runs exactly one of them; buffers
//! in any other format come back unchanged.
//!
//! | Format | [`NativeOptimizer`] | [`ToolchainOptimizer`] |
//! |---|---|---|
//! | JPEG | re-encode at `jpeg_quality` | `cjpeg -quality Q` (mozjpeg) |
//! | PNG | palette quantization + max deflate | `pngquant --quality=MIN-MAX` |
//! | GIF | frame re-encode, quantizer speed from `lossy` | `gifsicle --optimize=N --lossy=L` |

mod native;
mod toolchain;

pub use native::NativeOptimizer;
pub use toolchain::{ToolchainOptimizer, ToolchainPrograms};

use crate::{detect_format, GifOptions, ImageFormat, OptimizeConfig, PngQuality, Result};
use notepix_core::config::OptimizerKind;
use std::sync::Arc;

/// A set of format-specific compressors.
///
/// Implementations must be `Send + Sync` so one instance can serve
/// concurrent uploads.
pub trait Optimizer: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &'static str;

    /// Compress a JPEG buffer.
    fn optimize_jpeg(&self, data: &[u8], quality: u8) -> Result<Vec<u8>>;

    /// Compress a PNG buffer.
    fn optimize_png(&self, data: &[u8], quality: PngQuality) -> Result<Vec<u8>>;

    /// Compress a GIF buffer.
    fn optimize_gif(&self, data: &[u8], options: GifOptions) -> Result<Vec<u8>>;
}

/// Run the one compressor matching the buffer's sniffed format.
///
/// Formats without a compressor, and unrecognized bytes, pass through
/// unchanged.
pub fn optimize(optimizer: &dyn Optimizer, data: &[u8], config: &OptimizeConfig) -> Result<Vec<u8>> {
    match detect_format(data) {
        Ok(ImageFormat::Jpeg) => optimizer.optimize_jpeg(data, config.jpeg_quality),
        Ok(ImageFormat::Png) => optimizer.optimize_png(data, config.png_quality),
        Ok(ImageFormat::Gif) => optimizer.optimize_gif(data, config.gif),
        _ => Ok(data.to_vec()),
    }
}

/// Build the optimizer selected in configuration.
pub fn optimizer_for(kind: OptimizerKind) -> Arc<dyn Optimizer> {
    match kind {
        OptimizerKind::Native => Arc::new(NativeOptimizer::new()),
        OptimizerKind::Toolchain => Arc::new(ToolchainOptimizer::default()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ImageError;
    use std::sync::Mutex;

    /// Records which compressor ran without touching the bytes.
    #[derive(Default)]
    pub struct RecordingOptimizer {
        pub calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingOptimizer {
        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Optimizer for RecordingOptimizer {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn optimize_jpeg(&self, data: &[u8], _quality: u8) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push("jpeg");
            Ok(data.to_vec())
        }

        fn optimize_png(&self, data: &[u8], _quality: PngQuality) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push("png");
            Ok(data.to_vec())
        }

        fn optimize_gif(&self, data: &[u8], _options: GifOptions) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push("gif");
            Ok(data.to_vec())
        }
    }

    /// Fails every compression.
    pub struct FailingOptimizer;

    impl Optimizer for FailingOptimizer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn optimize_jpeg(&self, _data: &[u8], _quality: u8) -> Result<Vec<u8>> {
            Err(ImageError::Optimize("jpeg compressor crashed".into()))
        }

        fn optimize_png(&self, _data: &[u8], _quality: PngQuality) -> Result<Vec<u8>> {
            Err(ImageError::Optimize("png compressor crashed".into()))
        }

        fn optimize_gif(&self, _data: &[u8], _options: GifOptions) -> Result<Vec<u8>> {
            Err(ImageError::Optimize("gif compressor crashed".into()))
        }
    }

    /// Returns the same bytes from every compressor, whatever the input.
    pub struct FixedOutputOptimizer(pub Vec<u8>);

    impl Optimizer for FixedOutputOptimizer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn optimize_jpeg(&self, _data: &[u8], _quality: u8) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn optimize_png(&self, _data: &[u8], _quality: PngQuality) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn optimize_gif(&self, _data: &[u8], _options: GifOptions) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_dispatch_is_format_exclusive() {
        let optimizer = RecordingOptimizer::default();
        let config = OptimizeConfig::default();

        optimize(&optimizer, &[0xFF, 0xD8, 0xFF, 0xE0], &config).unwrap();
        optimize(&optimizer, &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], &config).unwrap();
        optimize(&optimizer, b"GIF89a\x01\x00\x01\x00", &config).unwrap();

        assert_eq!(optimizer.calls(), vec!["jpeg", "png", "gif"]);
    }

    #[test]
    fn test_other_formats_pass_through() {
        let optimizer = RecordingOptimizer::default();
        let webp = b"RIFF\x00\x00\x00\x00WEBPVP8 ";
        let garbage = b"not an image at all";

        let config = OptimizeConfig::default();
        assert_eq!(optimize(&optimizer, webp, &config).unwrap(), webp.to_vec());
        assert_eq!(optimize(&optimizer, garbage, &config).unwrap(), garbage.to_vec());
        assert!(optimizer.calls().is_empty());
    }

    #[test]
    fn test_failure_is_returned_to_caller() {
        let result = optimize(&FailingOptimizer, &[0xFF, 0xD8, 0xFF, 0xE0], &OptimizeConfig::default());
        assert!(matches!(result, Err(ImageError::Optimize(_))));
    }

    #[test]
    fn test_optimizer_for_kind() {
        assert_eq!(optimizer_for(OptimizerKind::Native).name(), "native");
        assert_eq!(optimizer_for(OptimizerKind::Toolchain).name(), "toolchain");
    }
}
