//! Records of rendered plots and JSON printing of series.
//!
//! Every rendered plot can be appended as a row to a CSV ledger next to the
//! images.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

use crate::plot::{Figure, PlotKind};

/// One rendered plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub year: u16,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: usize,
    pub path: String,
}

impl PlotRecord {
    pub fn new(kind: PlotKind, year: u16, figure: &Figure, path: &Path) -> Self {
        PlotRecord {
            timestamp: Utc::now(),
            kind: kind.as_str().to_string(),
            year,
            title: figure.title.clone(),
            x_label: figure.x_label.clone(),
            y_label: figure.y_label.clone(),
            points: figure.points.len(),
            path: path.display().to_string(),
        }
    }
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends a [`PlotRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, record: &PlotRecord) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending plot record");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only on the first write
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
