//! USDA Food Environment Atlas restaurant counts and rates, per county.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::csv_reader;
use super::fields::Fields;

const INPUT_COLUMNS: usize = 19;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsdaRestaurantRecord {
    pub fips: String,
    pub state: String,
    pub county: String,

    // fast-food restaurants
    pub ffr07: i64,
    pub ffr12: i64,
    pub pch_ffr_07_12: f64,
    pub ffrpth07: f64,
    pub ffrpth12: f64,
    pub pch_ffrpth_07_12: f64,

    // full-service restaurants
    pub fsr07: i64,
    pub fsr12: i64,
    pub pch_fsr_07_12: f64,
    pub fsrpth07: f64,
    pub fsrpth12: f64,
    pub pch_fsrpth_07_12: f64,

    // per-capita expenditures
    pub pc_ffrsales02: f64,
    pub pc_ffrsales07: f64,
    pub pc_fsrsales02: f64,
    pub pc_fsrsales07: f64,
}

impl UsdaRestaurantRecord {
    fn from_fields(f: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            fips: f.text(0),
            state: f.text(1),
            county: f.text(2),
            ffr07: f.int(3, "ffr07")?,
            ffr12: f.int(4, "ffr12")?,
            pch_ffr_07_12: f.float(5, "pch_ffr_07_12")?,
            ffrpth07: f.float(6, "ffrpth07")?,
            ffrpth12: f.float(7, "ffrpth12")?,
            pch_ffrpth_07_12: f.float(8, "pch_ffrpth_07_12")?,
            fsr07: f.int(9, "fsr07")?,
            fsr12: f.int(10, "fsr12")?,
            pch_fsr_07_12: f.float(11, "pch_fsr_07_12")?,
            fsrpth07: f.float(12, "fsrpth07")?,
            fsrpth12: f.float(13, "fsrpth12")?,
            pch_fsrpth_07_12: f.float(14, "pch_fsrpth_07_12")?,
            pc_ffrsales02: f.float(15, "pc_ffrsales02")?,
            pc_ffrsales07: f.float(16, "pc_ffrsales07")?,
            pc_fsrsales02: f.float(17, "pc_fsrsales02")?,
            pc_fsrsales07: f.float(18, "pc_fsrsales07")?,
        })
    }
}

/// Parses USDA restaurant rows from any reader.
///
/// Unlike IPPS, a row with an empty value in any column is dropped.
pub fn parse_usda<R: Read>(rdr: R) -> Result<Vec<UsdaRestaurantRecord>> {
    let mut reader = csv_reader(rdr);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.byte_records() {
        let record = result?;
        if record.is_empty() || record.iter().any(<[u8]>::is_empty) {
            skipped += 1;
            continue;
        }

        let fields = Fields::new(&record, INPUT_COLUMNS)?;
        rows.push(UsdaRestaurantRecord::from_fields(&fields)?);
    }

    debug!(rows = rows.len(), skipped, "USDA rows parsed");
    Ok(rows)
}

/// Reads and parses a USDA restaurants CSV file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn parse_usda_file<P: AsRef<Path>>(path: P) -> Result<Vec<UsdaRestaurantRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = parse_usda(file).with_context(|| format!("parsing {}", path.display()))?;
    info!(rows = rows.len(), "USDA file loaded");
    Ok(rows)
}
