//! notepix: shrink and inspect note image attachments.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use notepix_core::config::{Config, OptimizerKind};
use notepix_core::error::{exit_codes, ErrorReport};
use notepix_core::ErrorCode;
use notepix_image::ImageError;
use notepix_telemetry::TelemetryConfig;
use output::Status;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notepix")]
#[command(about = "Shrink and inspect image attachments before storing them")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to .notepix.toml / notepix.toml)
    #[arg(long, global = true, env = "NOTEPIX_CONFIG")]
    config: Option<String>,

    /// Log debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect image format from file contents
    Detect {
        /// Path to image file
        path: PathBuf,
    },
    /// Show format and dimensions
    Inspect {
        /// Path to image file
        path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one file through the shrink pipeline
    Shrink {
        /// Path to image file
        path: PathBuf,
        /// Output file (defaults to `<name>.shrunk.<ext>` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Store the upload unchanged
        #[arg(long)]
        no_shrink: bool,
        /// Override images.max_dimension
        #[arg(long)]
        max_dimension: Option<u32>,
        /// Override images.jpeg_quality
        #[arg(long)]
        jpeg_quality: Option<u8>,
        /// Override images.optimizer
        #[arg(long, value_enum)]
        optimizer: Option<OptimizerArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Shrink every image under a directory in parallel
    Batch {
        /// Directory to scan
        path: PathBuf,
        /// Directory to write results to
        #[arg(long)]
        out: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum OptimizerArg {
    Native,
    Toolchain,
}

impl From<OptimizerArg> for OptimizerKind {
    fn from(arg: OptimizerArg) -> Self {
        match arg {
            OptimizerArg::Native => OptimizerKind::Native,
            OptimizerArg::Toolchain => OptimizerKind::Toolchain,
        }
    }
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Inspect { json, .. } | Commands::Shrink { json, .. } | Commands::Batch { json, .. } => *json,
            Commands::Detect { .. } | Commands::Config => false,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let json = cli.command.json();

    if let Err(err) = run(cli) {
        if json {
            let report = serde_json::json!({ "error": error_report(&err) });
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
        } else {
            Status::error(&format!("{:#}", err));
        }
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    let mut telemetry = TelemetryConfig::from(&config.schema.logging);
    if cli.verbose {
        telemetry.log_level = "debug".to_string();
    }
    notepix_telemetry::init_with_config(telemetry)?;

    match cli.command {
        Commands::Detect { path } => commands::detect(&path),
        Commands::Inspect { path, json } => commands::inspect(&path, json),
        Commands::Shrink {
            path,
            output,
            no_shrink,
            max_dimension,
            jpeg_quality,
            optimizer,
            json,
        } => {
            let images = &mut config.schema.images;
            if let Some(max_dimension) = max_dimension {
                images.max_dimension = max_dimension;
            }
            if let Some(quality) = jpeg_quality {
                images.jpeg_quality = quality;
            }
            if let Some(optimizer) = optimizer {
                images.optimizer = optimizer.into();
            }
            config.validate()?;

            commands::shrink(&config.schema.images, &path, output.as_deref(), !no_shrink, json)
        }
        Commands::Batch { path, out, json } => commands::batch(&config.schema.images, &path, &out, json),
        Commands::Config => commands::show_config(&config),
    }
}

/// Structured form of a failure for `--json` output.
fn error_report(err: &anyhow::Error) -> ErrorReport {
    if let Some(core_err) = err.downcast_ref::<notepix_core::Error>() {
        return core_err.to_report();
    }
    let code = match err.downcast_ref::<ImageError>() {
        Some(ImageError::Tool(tool_err)) => return tool_err.to_report(),
        Some(ImageError::UnknownFormat) => ErrorCode::InvalidInput,
        Some(ImageError::InvalidConfig(_)) => ErrorCode::ConfigValidationError,
        Some(_) => ErrorCode::Internal,
        None if err.downcast_ref::<std::io::Error>().is_some() => ErrorCode::IoError,
        None => ErrorCode::Unknown,
    };
    notepix_core::Error::new(code, format!("{:#}", err)).to_report()
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(image_err) = err.downcast_ref::<ImageError>() {
        return match image_err {
            ImageError::UnknownFormat => exit_codes::UNKNOWN_FORMAT,
            ImageError::InvalidConfig(_) => exit_codes::CONFIG_ERROR,
            _ => exit_codes::FAILURE,
        };
    }
    if let Some(core_err) = err.downcast_ref::<notepix_core::Error>() {
        return match core_err.code.category() {
            "Configuration" => exit_codes::CONFIG_ERROR,
            "Validation" => exit_codes::VALIDATION_ERROR,
            _ if core_err.code == ErrorCode::CommandNotFound => exit_codes::COMMAND_NOT_FOUND,
            _ => exit_codes::FAILURE,
        };
    }
    exit_codes::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_unknown_format_report() {
        let err = anyhow::Error::new(ImageError::UnknownFormat);
        let report = error_report(&err);

        assert_eq!(report.code, ErrorCode::InvalidInput);
        assert_eq!(report.category, "Validation");
        assert_eq!(exit_code(&err), exit_codes::UNKNOWN_FORMAT);
    }

    #[test]
    fn test_tool_error_keeps_its_report() {
        let err = anyhow::Error::new(ImageError::Tool(notepix_core::Error::command_not_found("cjpeg")));
        let report = error_report(&err);

        assert_eq!(report.code, ErrorCode::CommandNotFound);
        assert!(report.suggestion.is_some());
    }

    #[test]
    fn test_core_error_report_and_exit_code() {
        let err = anyhow::Error::new(notepix_core::Error::config_invalid("max_dimension must be positive"));

        assert_eq!(error_report(&err).code_str, "E3003");
        assert_eq!(exit_code(&err), exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_report_includes_context() {
        let err = Err::<(), _>(std::io::Error::from(std::io::ErrorKind::NotFound))
            .context("Failed to read cat.png")
            .unwrap_err();
        let report = error_report(&err);

        assert_eq!(report.code, ErrorCode::IoError);
        assert!(report.message.starts_with("Failed to read cat.png"));
    }

    #[test]
    fn test_json_flag_per_command() {
        let cli = Cli::parse_from(["notepix", "inspect", "a.png", "--json"]);
        assert!(cli.command.json());
        let cli = Cli::parse_from(["notepix", "detect", "a.png"]);
        assert!(!cli.command.json());
    }
}
