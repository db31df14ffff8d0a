//! Relational storage for parsed rows and the per-state aggregate queries.
//!
//! [`AggregateStore`] is the query seam the plots depend on.
//! [`SqliteStore`] implements it on top of a SQLite file or in-memory database.

mod sqlite;

pub use sqlite::SqliteStore;

use anyhow::{Result, bail};
use std::collections::HashMap;

/// Years with an IPPS table.
pub const IPPS_YEARS: [u16; 3] = [2011, 2012, 2013];

/// Years with a civilian population estimate column.
pub const POPULATION_YEARS: [u16; 5] = [2010, 2011, 2012, 2013, 2014];

/// Lower and upper ages (inclusive) counted as 65 and over; 85 means 85+.
pub const ELDER_AGE_BAND: (i64, i64) = (65, 85);

/// Sex filter for population estimates, stored as 0/1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Sex {
    Total,
    Male,
    Female,
}

impl Sex {
    pub fn code(self) -> i64 {
        match self {
            Sex::Total => 0,
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }
}

/// Table holding IPPS rows for `year`.
pub fn ipps_table(year: u16) -> Result<&'static str> {
    Ok(match year {
        2011 => "ipps2011",
        2012 => "ipps2012",
        2013 => "ipps2013",
        _ => bail!("no IPPS data for year {year}; expected one of {IPPS_YEARS:?}"),
    })
}

/// Column in `statePopEst` holding civilian estimates for `year`.
pub fn population_column(year: u16) -> Result<&'static str> {
    Ok(match year {
        2010 => "popEst2010Civ",
        2011 => "popEst2011Civ",
        2012 => "popEst2012Civ",
        2013 => "popEst2013Civ",
        2014 => "popEst2014Civ",
        _ => bail!("no population estimate for year {year}; expected one of {POPULATION_YEARS:?}"),
    })
}

/// Grouped sums keyed by two-letter state code.
///
/// States with no matching rows are absent from the returned maps; callers
/// decide whether absence means zero or an error.
pub trait AggregateStore {
    /// Sum of `totalDischarges` per provider state for rows whose DRG label
    /// contains `drg_substring`.
    fn discharges_by_state(&self, drg_substring: &str, year: u16) -> Result<HashMap<String, i64>>;

    /// Sum of the civilian estimate for `year` per state, over ages 65..=85.
    fn population_65_and_over_by_state(&self, sex: Sex, year: u16)
    -> Result<HashMap<String, i64>>;
}
