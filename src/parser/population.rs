//! Census civilian population estimates by state, sex and single year of age.
//!
//! Columns: `SUMLEV, REGION, DIVISION, STATE, NAME, SEX, AGE,
//! ESTBASE2010_CIV, POPEST2010_CIV .. POPEST2014_CIV`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::csv_reader;
use super::fields::Fields;
use crate::states::state_code_for;

const INPUT_COLUMNS: usize = 13;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationEstimate {
    /// Two-letter state code.
    pub state: String,
    /// 0 total, 1 male, 2 female.
    pub sex: i64,
    /// Single year of age; 85 is "85 and over", 999 is all ages.
    pub age: i64,
    pub estimates_base_2010: i64,
    /// Civilian estimates for 2010 through 2014.
    pub estimates: [i64; 5],
}

impl PopulationEstimate {
    fn from_fields(state: &str, f: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            state: state.to_string(),
            sex: f.int(5, "SEX")?,
            age: f.int(6, "AGE")?,
            estimates_base_2010: f.int(7, "ESTBASE2010_CIV")?,
            estimates: [
                f.int(8, "POPEST2010_CIV")?,
                f.int(9, "POPEST2011_CIV")?,
                f.int(10, "POPEST2012_CIV")?,
                f.int(11, "POPEST2013_CIV")?,
                f.int(12, "POPEST2014_CIV")?,
            ],
        })
    }
}

/// Parses population rows from any reader, keeping only the 50 states and DC.
pub fn parse_population<R: Read>(rdr: R) -> Result<Vec<PopulationEstimate>> {
    let mut reader = csv_reader(rdr);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.byte_records() {
        let record = result?;
        let name = record.get(4).map(String::from_utf8_lossy);
        let Some(state) = name.as_deref().and_then(state_code_for) else {
            skipped += 1;
            continue;
        };

        let fields = Fields::new(&record, INPUT_COLUMNS)?;
        rows.push(PopulationEstimate::from_fields(state, &fields)?);
    }

    debug!(rows = rows.len(), skipped, "population rows parsed");
    Ok(rows)
}

/// Reads and parses a census population-estimate CSV file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn parse_population_file<P: AsRef<Path>>(path: P) -> Result<Vec<PopulationEstimate>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = parse_population(file).with_context(|| format!("parsing {}", path.display()))?;
    info!(rows = rows.len(), "population file loaded");
    Ok(rows)
}
