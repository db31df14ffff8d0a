use anyhow::{Context, Result, bail};
use csv::ByteRecord;
use std::str::FromStr;

/// Positional, typed access to one CSV record with line-aware errors.
///
/// Records are kept as raw bytes. Text columns decode lossily, so a stray
/// Latin-1 byte in a name never fails the load; numeric columns must be
/// valid UTF-8 and parse.
pub(crate) struct Fields<'a> {
    record: &'a ByteRecord,
    line: u64,
}

impl<'a> Fields<'a> {
    /// Wraps `record`, failing if it has fewer than `expected` columns.
    pub(crate) fn new(record: &'a ByteRecord, expected: usize) -> Result<Self> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() < expected {
            bail!(
                "line {line}: expected {expected} fields, found {}",
                record.len()
            );
        }
        Ok(Self { record, line })
    }

    pub(crate) fn text(&self, idx: usize) -> String {
        String::from_utf8_lossy(&self.record[idx]).into_owned()
    }

    pub(crate) fn int(&self, idx: usize, name: &str) -> Result<i64> {
        self.cast(idx, name)
    }

    pub(crate) fn float(&self, idx: usize, name: &str) -> Result<f64> {
        self.cast(idx, name)
    }

    fn cast<T>(&self, idx: usize, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw = &self.record[idx];
        let context = || {
            format!(
                "line {}: column {idx} ({name}) has invalid value {:?}",
                self.line,
                String::from_utf8_lossy(raw)
            )
        };
        std::str::from_utf8(raw)
            .with_context(context)?
            .trim()
            .parse::<T>()
            .with_context(context)
    }
}
