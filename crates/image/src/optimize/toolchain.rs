//! Adapter for the classic external optimizer binaries.
//!
//! Each compressor is a stdin → stdout filter. Argument formatting lives here
//! and nowhere else: gifsicle takes its optimization level as a textual flag,
//! while the rest of the pipeline keeps it numeric.

use super::Optimizer;
use crate::{GifOptions, PngQuality, Result};
use notepix_core::process::run_filter;

/// Program names (or paths) for each compressor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainPrograms {
    /// mozjpeg encoder
    pub cjpeg: String,
    /// PNG palette quantizer
    pub pngquant: String,
    /// GIF optimizer with lossy support
    pub gifsicle: String,
}

impl Default for ToolchainPrograms {
    fn default() -> Self {
        Self {
            cjpeg: "cjpeg".to_string(),
            pngquant: "pngquant".to_string(),
            gifsicle: "gifsicle".to_string(),
        }
    }
}

/// Optimizer that shells out to mozjpeg, pngquant and gifsicle.
#[derive(Debug, Clone, Default)]
pub struct ToolchainOptimizer {
    programs: ToolchainPrograms,
}

impl ToolchainOptimizer {
    /// Use custom program locations.
    pub fn with_programs(programs: ToolchainPrograms) -> Self {
        Self { programs }
    }

    fn filter(&self, program: &str, args: &[String], data: &[u8]) -> Result<Vec<u8>> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::debug!(program, ?args, input_bytes = data.len(), "Running external optimizer");
        let output = run_filter(program, &args, data)?.into_stdout(program)?;
        Ok(output)
    }
}

fn cjpeg_args(quality: u8) -> Vec<String> {
    vec!["-quality".to_string(), quality.min(100).to_string()]
}

/// pngquant wants integer percentages and `-` for stdin/stdout.
fn pngquant_args(quality: PngQuality) -> Vec<String> {
    let min = (quality.min * 100.0).round() as u8;
    let max = (quality.max * 100.0).round() as u8;
    vec![format!("--quality={}-{}", min, max), "-".to_string()]
}

fn gifsicle_args(options: GifOptions) -> Vec<String> {
    vec![
        "--no-warnings".to_string(),
        "--no-app-extensions".to_string(),
        format!("--optimize={}", options.optimization_level),
        format!("--lossy={}", options.lossy),
    ]
}

impl Optimizer for ToolchainOptimizer {
    fn name(&self) -> &'static str {
        "toolchain"
    }

    fn optimize_jpeg(&self, data: &[u8], quality: u8) -> Result<Vec<u8>> {
        self.filter(&self.programs.cjpeg, &cjpeg_args(quality), data)
    }

    fn optimize_png(&self, data: &[u8], quality: PngQuality) -> Result<Vec<u8>> {
        self.filter(&self.programs.pngquant, &pngquant_args(quality), data)
    }

    fn optimize_gif(&self, data: &[u8], options: GifOptions) -> Result<Vec<u8>> {
        self.filter(&self.programs.gifsicle, &gifsicle_args(options), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageError;
    use notepix_core::ErrorCode;

    #[test]
    fn test_cjpeg_args() {
        assert_eq!(cjpeg_args(75), vec!["-quality", "75"]);
    }

    #[test]
    fn test_pngquant_args_use_percentages() {
        assert_eq!(pngquant_args(PngQuality::default()), vec!["--quality=0-70", "-"]);
    }

    #[test]
    fn test_gifsicle_args_render_level_as_text() {
        let args = gifsicle_args(GifOptions::default());
        assert!(args.contains(&"--optimize=3".to_string()));
        assert!(args.contains(&"--lossy=80".to_string()));
    }

    #[test]
    fn test_missing_binary_is_tool_error() {
        let optimizer = ToolchainOptimizer::with_programs(ToolchainPrograms {
            cjpeg: "nonexistent-cjpeg-12345".to_string(),
            ..ToolchainPrograms::default()
        });

        match optimizer.optimize_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0], 75) {
            Err(ImageError::Tool(err)) => assert_eq!(err.code, ErrorCode::CommandNotFound),
            other => panic!("expected tool error, got {:?}", other.map(|v| v.len())),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_stdout_is_passed_through() {
        let optimizer = ToolchainOptimizer::with_programs(ToolchainPrograms {
            gifsicle: "true".to_string(),
            ..ToolchainPrograms::default()
        });
        // `true` exits 0 with nothing on stdout; the adapter passes that
        // through and leaves validation to the shrink pipeline.
        let out = optimizer.optimize_gif(b"GIF89a", GifOptions::default()).unwrap();
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_command_failed() {
        let optimizer = ToolchainOptimizer::with_programs(ToolchainPrograms {
            pngquant: "false".to_string(),
            ..ToolchainPrograms::default()
        });
        match optimizer.optimize_png(b"\x89PNG\r\n\x1a\n", PngQuality::default()) {
            Err(ImageError::Tool(err)) => assert_eq!(err.code, ErrorCode::CommandFailed),
            other => panic!("expected tool error, got {:?}", other.map(|v| v.len())),
        }
    }
}
