//! CSV parsers for the IPPS, USDA restaurant and census population files.
//!
//! Each parser discards the header row, applies its own row-skipping rule,
//! casts columns positionally and returns records in file order. A value that
//! fails to cast aborts the whole file.

mod fields;
pub mod ipps;
pub mod population;
pub mod usda;

pub use ipps::{IppsRecord, parse_ipps, parse_ipps_file};
pub use population::{PopulationEstimate, parse_population, parse_population_file};
pub use usda::{UsdaRestaurantRecord, parse_usda, parse_usda_file};

use csv::{Reader, ReaderBuilder};
use std::io::Read;

/// Comma-delimited, double-quoted, header first. Row lengths are checked by
/// the parsers themselves so that skipped rows may be ragged.
fn csv_reader<R: Read>(rdr: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .from_reader(rdr)
}
