//! Export writers
//!
//! Writes the selected tracks as:
//! - CSV: header row, then one row per track
//! - JSON: a pretty-printed array of row objects

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use itunesdb_core::{ExportRow, Track};

use crate::config::OutputFormat;

/// Export tracks to `path` in the given format
pub fn export_tracks(tracks: &[&Track], path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        validate_output_target(parent)?;
    }

    let file = File::create(path).with_context(|| format!("Cannot create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    let rows = tracks.iter().map(|t| ExportRow::from(*t));

    match format {
        OutputFormat::Csv => write_csv(&mut writer, rows)?,
        OutputFormat::Json => write_json(&mut writer, rows)?,
    }
    writer.flush()?;

    info!("Exported {} tracks to {:?}", tracks.len(), path);
    Ok(())
}

/// Header row first, even when there are no tracks
pub fn write_csv<W: Write>(
    writer: W,
    rows: impl IntoIterator<Item = ExportRow>,
) -> anyhow::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(ExportRow::HEADERS)?;

    let mut count = 0usize;
    for row in rows {
        csv_writer.serialize(row)?;
        count += 1;
    }
    csv_writer.flush()?;
    debug!("Wrote {} CSV rows", count);
    Ok(())
}

pub fn write_json<W: Write>(
    writer: W,
    rows: impl IntoIterator<Item = ExportRow>,
) -> anyhow::Result<()> {
    let rows: Vec<ExportRow> = rows.into_iter().collect();
    serde_json::to_writer_pretty(writer, &rows)?;
    debug!("Wrote {} JSON rows", rows.len());
    Ok(())
}

/// Check that the output directory exists. Write errors surface from
/// `File::create`.
pub fn validate_output_target(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Output directory does not exist: {:?}", path);
    }

    if !path.is_dir() {
        anyhow::bail!("Output path is not a directory: {:?}", path);
    }

    Ok(())
}
