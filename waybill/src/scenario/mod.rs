//! Scenario orchestration over the configured directories.
//!
//! Each scenario validates its configuration, loads the run-wide resources
//! (background, stamp index, template) and then processes items one after
//! another in sorted path order. Only a configuration problem aborts a
//! scenario; every other failure is confined to its item and recorded in the
//! [`RunReport`].

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::assemble::{DuplexTemplate, assemble_two_sided};
use crate::compose::{Compositor, Overlay, SourceDocument};
use crate::config::{Background, Config};
use crate::error::{Result, WaybillError};
use crate::io::{PdfReader, PdfWriter};
use crate::merge::{MergeChunk, MergePool, concatenate};
use crate::page::render::render_pages;
use crate::report::{ItemOutcome, RunReport, Scenario};
use crate::stamps::StampIndex;
use crate::utils;

/// Composite every railway document and write it to the ready directory.
///
/// # Errors
///
/// Returns an error only for configuration problems: an invalid config, a
/// missing railway directory or an unusable background.
pub async fn run_one_sided(config: &Config) -> Result<RunReport> {
    run_compositing(config, Scenario::OneSided).await
}

/// Composite every railway document, lay it out for duplex printing and
/// write it to the ready directory.
///
/// # Errors
///
/// As [`run_one_sided`], plus a missing or too short template.
pub async fn run_two_sided(config: &Config) -> Result<RunReport> {
    run_compositing(config, Scenario::TwoSided).await
}

/// Bundle the documents of the ready directory into the merged directory.
///
/// # Errors
///
/// Returns an error only if the configuration is invalid.
pub async fn run_merge(config: &Config) -> Result<RunReport> {
    let start = Instant::now();
    validate(config)?;

    let reader = PdfReader::new();
    let writer = PdfWriter::with_compression(config.compression);
    let mut report = RunReport::new(Scenario::Merge);

    let (mut pool, unkeyed) = MergePool::from_paths(utils::collect_pdf_paths(&config.ready_dir)?);
    for path in unkeyed {
        warn!(path = %path.display(), "not bundled: file name has no key");
        report.push(ItemOutcome::skipped(vec![path], "file name has no key"));
    }

    if pool.is_empty() {
        info!(dir = %config.ready_dir.display(), "nothing to bundle");
        report.elapsed = start.elapsed();
        return Ok(report);
    }

    if !config.dry_run {
        config.ensure_directories().await?;
    }

    for chunk in pool.plan(config.chunk_size) {
        let output = config
            .merged_dir
            .join(chunk.file_name(config.legacy_bundle_suffix));
        let outcome = match write_bundle(&chunk, &output, config, &reader, &writer).await {
            Ok(pages) => {
                if !config.dry_run {
                    pool.consume(&chunk);
                }
                info!(output = %output.display(), members = chunk.members.len(), pages, "bundle written");
                ItemOutcome::Written {
                    inputs: chunk.paths(),
                    output,
                    pages,
                    stamp: None,
                    faults: Vec::new(),
                    dry_run: config.dry_run,
                }
            }
            Err(err) => {
                warn!(output = %output.display(), "bundle skipped: {err}");
                ItemOutcome::failed(chunk.paths(), &err)
            }
        };
        report.push(outcome);
    }

    report.remaining = pool.members().iter().map(|m| m.path.clone()).collect();
    if !report.remaining.is_empty() {
        warn!(count = report.remaining.len(), "documents left unbundled");
    }
    report.elapsed = start.elapsed();
    Ok(report)
}

async fn write_bundle(
    chunk: &MergeChunk,
    output: &Path,
    config: &Config,
    reader: &PdfReader,
    writer: &PdfWriter,
) -> Result<usize> {
    let mut documents = Vec::with_capacity(chunk.members.len());
    for member in &chunk.members {
        documents.push(reader.load(&member.path).await?.document);
    }

    let merged = concatenate(documents)?;
    let pages = merged.get_pages().len();
    if config.dry_run {
        return Ok(pages);
    }

    let stats = writer.save_with_stats(merged, output).await?;
    Ok(stats.page_count)
}

fn validate(config: &Config) -> Result<()> {
    config
        .validate()
        .map_err(|e| WaybillError::invalid_config(e.to_string()))
}

async fn run_compositing(config: &Config, scenario: Scenario) -> Result<RunReport> {
    let start = Instant::now();
    validate(config)?;

    if !config.railway_dir.is_dir() {
        return Err(WaybillError::invalid_config(format!(
            "Railway directory does not exist: {}",
            config.railway_dir.display()
        )));
    }

    let reader = PdfReader::new();
    let writer = PdfWriter::with_compression(config.compression);

    let template = match scenario {
        Scenario::TwoSided => Some(load_template(&config.template_file, &reader).await?),
        _ => None,
    };
    let background = load_background(&config.background, &reader).await?;
    let stamps = StampIndex::build(&config.stamp_dir, &reader).await?;
    let mut report = RunReport::new(scenario);
    for stamp in stamps.skipped() {
        report.push(ItemOutcome::skipped(
            vec![stamp.path.clone()],
            format!("stamp not used: {}", stamp.reason),
        ));
    }
    let compositor = Compositor::new(background, stamps);

    let sources = utils::collect_pdf_paths(&config.railway_dir)?;
    if sources.is_empty() {
        info!(dir = %config.railway_dir.display(), "no PDF files to process");
        report.elapsed = start.elapsed();
        return Ok(report);
    }

    if !config.dry_run {
        config.ensure_directories().await?;
    }

    for path in sources {
        let outcome =
            process_document(&path, &compositor, template.as_ref(), config, &reader, &writer).await;
        report.push(outcome);
    }

    report.elapsed = start.elapsed();
    Ok(report)
}

async fn load_template(path: &Path, reader: &PdfReader) -> Result<DuplexTemplate> {
    let loaded = reader.load(path).await.map_err(|e| {
        WaybillError::invalid_config(format!("Template {} unusable: {e}", path.display()))
    })?;
    DuplexTemplate::new(loaded.path, loaded.document)
}

async fn load_background(background: &Background, reader: &PdfReader) -> Result<Option<Overlay>> {
    match background {
        Background::None => Ok(None),
        Background::Path(path) => Overlay::load(reader, path).await.map(Some).map_err(|e| {
            WaybillError::invalid_config(format!("Background {} unusable: {e}", path.display()))
        }),
    }
}

async fn process_document(
    path: &Path,
    compositor: &Compositor,
    template: Option<&DuplexTemplate>,
    config: &Config,
    reader: &PdfReader,
    writer: &PdfWriter,
) -> ItemOutcome {
    let inputs = vec![path.to_path_buf()];
    let output = config.ready_dir.join(utils::file_name_of(path));

    let loaded = match reader.load(path).await {
        Ok(loaded) => loaded,
        Err(err) => {
            warn!(path = %path.display(), "skipped: {err}");
            return ItemOutcome::failed(inputs, &err);
        }
    };

    let source = SourceDocument::new(loaded.path, loaded.document);
    let stamp: Option<PathBuf> = compositor
        .stamp_for(&source)
        .map(|stamp| stamp.path().to_path_buf());

    let composition = compositor.composite(&source);
    let pages = match template {
        Some(template) => assemble_two_sided(composition.pages, template),
        None => composition.pages,
    };

    let document = match render_pages(&pages) {
        Ok(document) => document,
        Err(err) => {
            warn!(path = %path.display(), "skipped: {err}");
            return ItemOutcome::failed(inputs, &err);
        }
    };

    let page_count = pages.len();
    if !config.dry_run
        && let Err(err) = writer.save_with_stats(document, &output).await
    {
        warn!(path = %path.display(), "skipped: {err}");
        return ItemOutcome::failed(inputs, &err);
    }

    info!(
        input = %path.display(),
        output = %output.display(),
        pages = page_count,
        stamped = stamp.is_some(),
        dropped = composition.pages_dropped,
        "document processed"
    );

    ItemOutcome::Written {
        inputs,
        output,
        pages: page_count,
        stamp,
        faults: composition.faults,
        dry_run: config.dry_run,
    }
}
