use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::{AggregateStore, ELDER_AGE_BAND, IPPS_YEARS, Sex, ipps_table, population_column};
use crate::parser::{IppsRecord, PopulationEstimate, UsdaRestaurantRecord};

const IPPS_COLUMNS: &str = "
    drgDefinition TEXT NOT NULL,
    providerId INTEGER NOT NULL,
    providerName TEXT NOT NULL,
    providerStreetAddress TEXT NOT NULL,
    providerCity TEXT NOT NULL,
    providerState TEXT NOT NULL,
    providerZipCode INTEGER NOT NULL,
    hrrDescription TEXT NOT NULL,
    totalDischarges INTEGER NOT NULL,
    avgCoveredCharges REAL NOT NULL,
    avgTotalPayments REAL NOT NULL,
    avgMedicarePayments REAL NOT NULL,
    avgNonMedicarePayments REAL NOT NULL,
    avgCoveredChargesMinusTotalPayments REAL NOT NULL";

const USDA_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS usdaRestaurants (
    fips TEXT NOT NULL,
    state TEXT NOT NULL,
    county TEXT NOT NULL,
    ffr07 INTEGER NOT NULL,
    ffr12 INTEGER NOT NULL,
    pch_ffr_07_12 REAL NOT NULL,
    ffrpth07 REAL NOT NULL,
    ffrpth12 REAL NOT NULL,
    pch_ffrpth_07_12 REAL NOT NULL,
    fsr07 INTEGER NOT NULL,
    fsr12 INTEGER NOT NULL,
    pch_fsr_07_12 REAL NOT NULL,
    fsrpth07 REAL NOT NULL,
    fsrpth12 REAL NOT NULL,
    pch_fsrpth_07_12 REAL NOT NULL,
    pc_ffrsales02 REAL NOT NULL,
    pc_ffrsales07 REAL NOT NULL,
    pc_fsrsales02 REAL NOT NULL,
    pc_fsrsales07 REAL NOT NULL
);";

const POPULATION_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS statePopEst (
    name TEXT NOT NULL,
    sex INTEGER NOT NULL,
    age INTEGER NOT NULL,
    estBase2010Civ INTEGER NOT NULL,
    popEst2010Civ INTEGER NOT NULL,
    popEst2011Civ INTEGER NOT NULL,
    popEst2012Civ INTEGER NOT NULL,
    popEst2013Civ INTEGER NOT NULL,
    popEst2014Civ INTEGER NOT NULL
);";

/// SQLite-backed store holding one table per IPPS year, the USDA restaurant
/// table and the state population estimates.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path` and ensures the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let conn =
            Connection::open(path).with_context(|| format!("opening database {}", path.display()))?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// Opens a fresh in-memory database with the schema in place.
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.create_schema()?;
        Ok(store)
    }

    pub fn create_schema(&self) -> Result<()> {
        for year in IPPS_YEARS {
            let table = ipps_table(year)?;
            self.conn
                .execute_batch(&format!("CREATE TABLE IF NOT EXISTS {table} ({IPPS_COLUMNS});"))?;
        }
        self.conn.execute_batch(USDA_SCHEMA)?;
        self.conn.execute_batch(POPULATION_SCHEMA)?;
        Ok(())
    }

    /// Replaces the contents of the table for `year` with `rows`, in a single
    /// transaction. Loading the same file twice leaves one copy.
    #[tracing::instrument(skip(self, rows), fields(row_count = rows.len()))]
    pub fn load_ipps(&mut self, year: u16, rows: &[IppsRecord]) -> Result<usize> {
        let table = ipps_table(year)?;
        let tx = self.conn.transaction()?;
        let replaced = tx.execute(&format!("DELETE FROM {table}"), [])?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO {table} VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ))?;
            for r in rows {
                stmt.execute(params![
                    r.drg_definition,
                    r.provider_id,
                    r.provider_name,
                    r.provider_street_address,
                    r.provider_city,
                    r.provider_state,
                    r.provider_zip_code,
                    r.hrr_description,
                    r.total_discharges,
                    r.avg_covered_charges,
                    r.avg_total_payments,
                    r.avg_medicare_payments,
                    r.avg_non_medicare_payments,
                    r.avg_covered_charges_minus_total_payments,
                ])?;
            }
        }
        tx.commit()?;

        info!(table, rows = rows.len(), replaced, "IPPS rows stored");
        Ok(rows.len())
    }

    /// Replaces the contents of `usdaRestaurants` with `rows`.
    #[tracing::instrument(skip(self, rows), fields(row_count = rows.len()))]
    pub fn load_usda(&mut self, rows: &[UsdaRestaurantRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let replaced = tx.execute("DELETE FROM usdaRestaurants", [])?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO usdaRestaurants VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.fips,
                    r.state,
                    r.county,
                    r.ffr07,
                    r.ffr12,
                    r.pch_ffr_07_12,
                    r.ffrpth07,
                    r.ffrpth12,
                    r.pch_ffrpth_07_12,
                    r.fsr07,
                    r.fsr12,
                    r.pch_fsr_07_12,
                    r.fsrpth07,
                    r.fsrpth12,
                    r.pch_fsrpth_07_12,
                    r.pc_ffrsales02,
                    r.pc_ffrsales07,
                    r.pc_fsrsales02,
                    r.pc_fsrsales07,
                ])?;
            }
        }
        tx.commit()?;

        info!(rows = rows.len(), replaced, "USDA rows stored");
        Ok(rows.len())
    }

    /// Replaces the contents of `statePopEst` with `rows`.
    #[tracing::instrument(skip(self, rows), fields(row_count = rows.len()))]
    pub fn load_population(&mut self, rows: &[PopulationEstimate]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let replaced = tx.execute("DELETE FROM statePopEst", [])?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO statePopEst VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for r in rows {
                let [e10, e11, e12, e13, e14] = r.estimates;
                stmt.execute(params![
                    r.state,
                    r.sex,
                    r.age,
                    r.estimates_base_2010,
                    e10,
                    e11,
                    e12,
                    e13,
                    e14,
                ])?;
            }
        }
        tx.commit()?;

        info!(rows = rows.len(), replaced, "population rows stored");
        Ok(rows.len())
    }

    /// Runs a grouped `(state, SUM(..))` query and collects non-null sums.
    fn grouped_sums(&self, sql: &str, params: impl rusqlite::Params) -> Result<HashMap<String, i64>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?))
        })?;

        let mut sums = HashMap::new();
        for row in rows {
            if let (state, Some(sum)) = row? {
                sums.insert(state, sum);
            }
        }
        Ok(sums)
    }
}

/// Wraps `needle` as a LIKE pattern matching it anywhere, with `%`, `_` and
/// `\` taken literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl AggregateStore for SqliteStore {
    #[tracing::instrument(skip(self))]
    fn discharges_by_state(&self, drg_substring: &str, year: u16) -> Result<HashMap<String, i64>> {
        let table = ipps_table(year)?;
        let sql = format!(
            r"SELECT providerState, SUM(totalDischarges) FROM {table}
              WHERE drgDefinition LIKE ?1 ESCAPE '\'
              GROUP BY providerState"
        );

        let sums = self
            .grouped_sums(&sql, params![contains_pattern(drg_substring)])
            .with_context(|| format!("summing discharges in {table}"))?;
        debug!(states = sums.len(), "discharge sums fetched");
        Ok(sums)
    }

    #[tracing::instrument(skip(self))]
    fn population_65_and_over_by_state(
        &self,
        sex: Sex,
        year: u16,
    ) -> Result<HashMap<String, i64>> {
        let column = population_column(year)?;
        let sql = format!(
            "SELECT name, SUM({column}) FROM statePopEst
             WHERE sex = ?1 AND age BETWEEN ?2 AND ?3
             GROUP BY name"
        );

        let (lo, hi) = ELDER_AGE_BAND;
        let sums = self
            .grouped_sums(&sql, params![sex.code(), lo, hi])
            .with_context(|| format!("summing {column} in statePopEst"))?;
        debug!(states = sums.len(), "population sums fetched");
        Ok(sums)
    }
}
