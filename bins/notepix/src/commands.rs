//! Subcommand implementations.

use crate::output::{format_change, format_duration, format_size, Status};
use anyhow::Context;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use notepix_core::config::{Config, ImagesConfig};
use notepix_image::{detect_format, extract_metadata, ImageError, ImageProcessor, ProcessedImage};
use notepix_telemetry::{ShrinkMetrics, Timer};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn detect(path: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let format = detect_format(&data)?;

    println!("Format: {}", format);
    println!("MIME: {}", format.mime_type());
    println!("Extensions: {}", format.extensions().join(", "));
    Ok(())
}

pub fn inspect(path: &Path, json: bool) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let format = detect_format(&data)?;
    let meta = extract_metadata(&data);

    if json {
        let report = serde_json::json!({
            "path": path.to_string_lossy(),
            "format": format,
            "mime": format.mime_type(),
            "size_bytes": data.len(),
            "decodable": notepix_image::can_decode(format),
            "metadata": meta,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Status::header(&path.display().to_string());
    Status::field("Format", format);
    Status::field("MIME", format.mime_type());
    Status::field("Size", format_size(data.len() as u64));
    Status::field("Shrinkable", notepix_image::can_decode(format));
    match meta {
        Some(meta) => {
            let orientation = if meta.is_landscape() {
                "Landscape"
            } else if meta.is_portrait() {
                "Portrait"
            } else {
                "Square"
            };
            Status::field("Dimensions", format!("{}x{}", meta.width, meta.height));
            Status::field("Aspect ratio", format!("{:.2}", meta.aspect_ratio()));
            Status::field("Orientation", orientation);
        }
        None => Status::field("Dimensions", "unavailable"),
    }
    Ok(())
}

/// Per-file result, printed as JSON or summarized.
#[derive(Debug, Serialize)]
struct FileReport {
    input: PathBuf,
    output: PathBuf,
    input_bytes: usize,
    output_bytes: usize,
    format: String,
    mime: &'static str,
    outcome: &'static str,
    duration_ms: u64,
}

impl FileReport {
    fn new(input: &Path, output: PathBuf, processed: &ProcessedImage, duration: std::time::Duration) -> Self {
        Self {
            input: input.to_path_buf(),
            output,
            input_bytes: processed.original_size,
            output_bytes: processed.data.len(),
            format: processed.format.to_string(),
            mime: processed.mime_type(),
            outcome: processed.shrink.map_or("skipped", |o| o.as_str()),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// `photo.png` → `photo.shrunk.jpeg` when no output path was given.
fn default_output(input: &Path, processed: &ProcessedImage) -> PathBuf {
    let stem = input.file_stem().map_or_else(|| "image".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{}.shrunk.{}", stem, processed.format.extension()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

pub fn shrink(images: &ImagesConfig, path: &Path, output: Option<&Path>, shrink: bool, json: bool) -> anyhow::Result<()> {
    let processor = ImageProcessor::from_config(images)?;
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let timer = Timer::start("shrink");
    let processed = processor.process(data, &file_name(path), shrink)?;
    let duration = timer.stop();

    let output = output.map_or_else(|| default_output(path, &processed), Path::to_path_buf);
    std::fs::write(&output, &processed.data).with_context(|| format!("Failed to write {}", output.display()))?;

    let report = FileReport::new(path, output, &processed, duration);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        Status::success(&format!("Wrote {}", report.output.display()));
        Status::field("Format", &report.format);
        Status::field("Outcome", report.outcome);
        Status::field(
            "Size",
            format_change(report.input_bytes as u64, report.output_bytes as u64),
        );
        Status::field("Took", format_duration(duration));
    }
    Ok(())
}

/// Mirror `input` under `out_dir`, swapping the extension for the stored format.
fn batch_output(root: &Path, input: &Path, out_dir: &Path, processed: &ProcessedImage) -> PathBuf {
    let relative = input.strip_prefix(root).unwrap_or(input);
    out_dir.join(relative).with_extension(processed.format.extension())
}

fn process_one(
    processor: &ImageProcessor,
    root: &Path,
    input: &Path,
    out_dir: &Path,
) -> anyhow::Result<Option<(FileReport, ProcessedImage)>> {
    let data = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let timer = Timer::start("batch.file");
    let processed = match processor.process(data, &file_name(input), true) {
        Ok(processed) => processed,
        Err(ImageError::UnknownFormat) => {
            tracing::debug!(path = %input.display(), "Not an image, skipping");
            return Ok(None);
        }
        Err(err) => return Err(err).with_context(|| format!("Failed to process {}", input.display())),
    };
    let duration = timer.stop();

    let output = batch_output(root, input, out_dir, &processed);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, &processed.data).with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(Some((FileReport::new(input, output, &processed, duration), processed)))
}

/// `batch --json` document: per-file reports, totals and the raw metrics.
fn batch_json(reports: &[FileReport], metrics: &ShrinkMetrics) -> serde_json::Value {
    serde_json::json!({
        "files": reports,
        "summary": metrics.summary(),
        "metrics": metrics.registry().export_json(),
    })
}

pub fn batch(images: &ImagesConfig, root: &Path, out_dir: &Path, json: bool) -> anyhow::Result<()> {
    let processor = ImageProcessor::from_config(images)?;
    let metrics = ShrinkMetrics::new();
    let started = Timer::start("batch");

    let entries: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| !p.starts_with(out_dir))
        .collect();

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    if json {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut reports: Vec<FileReport> = entries
        .par_iter()
        .progress_with(pb.clone())
        .filter_map(|input| match process_one(&processor, root, input, out_dir) {
            Ok(Some((report, processed))) => {
                let duration = std::time::Duration::from_millis(report.duration_ms);
                metrics.record(processed.shrink, processed.original_size, processed.data.len(), duration);
                Some(report)
            }
            Ok(None) => None,
            Err(err) => {
                metrics.record_failure();
                pb.suspend(|| Status::warning(&format!("{:#}", err)));
                None
            }
        })
        .collect();
    pb.finish_and_clear();
    reports.sort_by(|a, b| a.input.cmp(&b.input));

    let summary = metrics.summary();
    let elapsed = started.stop();

    if json {
        println!("{}", serde_json::to_string_pretty(&batch_json(&reports, &metrics))?);
        return Ok(());
    }

    Status::header("Batch summary");
    Status::field("Processed", summary.processed);
    Status::field("Optimized", summary.optimized);
    Status::field("Resized", summary.resized);
    Status::field("Kept original", summary.original);
    Status::field("Not shrinkable", summary.skipped);
    Status::field("Failed", summary.failed);
    Status::field(
        "Size",
        format_change(summary.bytes_in, summary.bytes_out),
    );
    Status::field("p95 per file", format!("{:.0}ms", summary.duration_ms.p95));
    Status::field("Took", format_duration(elapsed));

    if summary.failed > 0 {
        anyhow::bail!("{} file(s) failed", summary.failed);
    }
    Ok(())
}

pub fn show_config(config: &Config) -> anyhow::Result<()> {
    match &config.path {
        Some(path) => Status::field("Loaded from", path),
        None => Status::field("Loaded from", "defaults"),
    }
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}
