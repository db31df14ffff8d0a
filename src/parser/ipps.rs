//! Inpatient Prospective Payment System charge data.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::csv_reader;
use super::fields::Fields;

const INPUT_COLUMNS: usize = 12;

/// One provider/DRG row, with the two derived payment columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IppsRecord {
    pub drg_definition: String,
    pub provider_id: i64,
    pub provider_name: String,
    pub provider_street_address: String,
    pub provider_city: String,
    pub provider_state: String,
    pub provider_zip_code: i64,
    pub hrr_description: String,
    pub total_discharges: i64,
    pub avg_covered_charges: f64,
    pub avg_total_payments: f64,
    pub avg_medicare_payments: f64,

    // derived
    pub avg_non_medicare_payments: f64,
    pub avg_covered_charges_minus_total_payments: f64,
}

impl IppsRecord {
    fn from_fields(f: &Fields<'_>) -> Result<Self> {
        let avg_covered_charges = f.float(9, "avgCoveredCharges")?;
        let avg_total_payments = f.float(10, "avgTotalPayments")?;
        let avg_medicare_payments = f.float(11, "avgMedicarePayments")?;

        Ok(Self {
            drg_definition: f.text(0),
            provider_id: f.int(1, "providerId")?,
            provider_name: f.text(2),
            provider_street_address: f.text(3),
            provider_city: f.text(4),
            provider_state: f.text(5),
            provider_zip_code: f.int(6, "providerZipCode")?,
            hrr_description: f.text(7),
            total_discharges: f.int(8, "totalDischarges")?,
            avg_covered_charges,
            avg_total_payments,
            avg_medicare_payments,
            avg_non_medicare_payments: avg_total_payments - avg_medicare_payments,
            avg_covered_charges_minus_total_payments: avg_covered_charges - avg_total_payments,
        })
    }
}

/// Parses IPPS rows from any reader.
///
/// Rows whose first field is empty are skipped; every other field may be
/// empty as long as it is a text column.
pub fn parse_ipps<R: Read>(rdr: R) -> Result<Vec<IppsRecord>> {
    let mut reader = csv_reader(rdr);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.byte_records() {
        let record = result?;
        if record.get(0).is_none_or(<[u8]>::is_empty) {
            skipped += 1;
            continue;
        }

        let fields = Fields::new(&record, INPUT_COLUMNS)?;
        rows.push(IppsRecord::from_fields(&fields)?);
    }

    debug!(rows = rows.len(), skipped, "IPPS rows parsed");
    Ok(rows)
}

/// Reads and parses an IPPS CSV file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn parse_ipps_file<P: AsRef<Path>>(path: P) -> Result<Vec<IppsRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = parse_ipps(file).with_context(|| format!("parsing {}", path.display()))?;
    info!(rows = rows.len(), "IPPS file loaded");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "a,b,c,d,e,f,g,h,i,j,k,l\n";

    fn parse(body: &str) -> Result<Vec<IppsRecord>> {
        parse_ipps(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn test_single_row_with_derived_fields() {
        let rows = parse(
            "\"DRG1\",100,\"Name\",\"Addr\",\"City\",\"CA\",90210,\"HRR\",5,1000.0,800.0,700.0\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.drg_definition, "DRG1");
        assert_eq!(r.provider_id, 100);
        assert_eq!(r.provider_state, "CA");
        assert_eq!(r.provider_zip_code, 90210);
        assert_eq!(r.total_discharges, 5);
        assert_eq!(r.avg_non_medicare_payments, 100.0);
        assert_eq!(r.avg_covered_charges_minus_total_payments, 200.0);
    }

    #[test]
    fn test_derived_fields_are_exact_subtractions() {
        let rows = parse("X,1,n,a,c,NY,10001,h,3,32963.07,5777.24,4763.73\n").unwrap();
        let r = &rows[0];
        assert_eq!(r.avg_non_medicare_payments, 5777.24 - 4763.73);
        assert_eq!(r.avg_covered_charges_minus_total_payments, 32963.07 - 5777.24);
    }

    #[test]
    fn test_header_only_yields_nothing() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_rows_with_empty_first_field_are_skipped() {
        let rows = parse(
            "A,1,n,a,c,AL,1,h,1,1,1,1\n\
             ,2,n,a,c,AL,1,h,1,1,1,1\n\
             ,,,\n\
             B,3,n,a,c,AL,1,h,1,1,1,1\n",
        )
        .unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r.provider_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_empty_text_fields_are_kept() {
        let rows = parse("A,1,,,,AL,1,,1,1,1,1\n").unwrap();
        assert_eq!(rows[0].provider_name, "");
        assert_eq!(rows[0].hrr_description, "");
    }

    #[test]
    fn test_malformed_number_aborts_file() {
        let err = parse(
            "A,1,n,a,c,AL,1,h,1,1,1,1\n\
             B,2,n,a,c,AL,1,h,many,1,1,1\n",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("totalDischarges"));
    }

    #[test]
    fn test_short_row_aborts_file() {
        assert!(parse("A,1,n,a,c,AL\n").is_err());
    }

    #[test]
    fn test_quoted_commas_stay_in_field() {
        let rows = parse("\"039 - EXTRACRANIAL PROCEDURES W/O CC/MCC\",10001,\"SOUTHEAST, INC\",a,c,AL,36301,h,91,32963.07,5777.24,4763.73\n").unwrap();
        assert_eq!(rows[0].provider_name, "SOUTHEAST, INC");
    }

    #[test]
    fn test_non_utf8_provider_name_is_kept() {
        let mut input = HEADER.as_bytes().to_vec();
        input.extend_from_slice(b"A,1,Caf\xe9 Hospital,a,c,NM,88001,h,4,10,8,6\n");

        let rows = parse_ipps(&input[..]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].provider_name, "Caf\u{FFFD} Hospital");
        assert_eq!(rows[0].total_discharges, 4);
    }

    #[test]
    fn test_parsing_is_repeatable() {
        let body = "A,1,n,a,c,AL,1,h,1,1.5,1,0.5\nB,2,n,a,c,AK,2,h,2,2,2,2\n";
        assert_eq!(parse(body).unwrap(), parse(body).unwrap());
    }

    #[test]
    fn test_missing_file() {
        assert!(parse_ipps_file("/nonexistent/ipps.csv").is_err());
    }
}
