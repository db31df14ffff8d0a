//! The fixed list of 50 states plus DC, and keyed per-state series.
//!
//! Every per-state aggregate is a [`StateSeries`] keyed by two-letter code.
//! Two series are combined with [`join`], which matches values by code rather
//! than by position.

use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use std::collections::BTreeMap;

/// Two-letter codes in plot order (alphabetical by code).
pub static STATE_CODES: [&str; 51] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL", "IN",
    "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH", "NJ",
    "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA", "VT", "WA",
    "WI", "WV", "WY",
];

static STATE_NAMES: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// Resolves a full state name or a two-letter code to the canonical code.
///
/// Matching is case-insensitive. Returns `None` for anything outside the 51
/// regions, such as "United States" or "Puerto Rico".
pub fn state_code_for(name: &str) -> Option<&'static str> {
    let name = name.trim();

    if let Some(code) = STATE_CODES.iter().find(|c| c.eq_ignore_ascii_case(name)) {
        return Some(*code);
    }

    STATE_NAMES
        .iter()
        .find(|(full, _)| full.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

/// A value for each of the 51 regions, keyed by code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StateSeries<T> {
    values: BTreeMap<&'static str, T>,
}

impl<T> StateSeries<T> {
    /// Builds a series by evaluating `f` for every code in list order.
    ///
    /// The first error aborts the build.
    pub fn try_from_fn<F>(mut f: F) -> Result<Self>
    where
        F: FnMut(&'static str) -> Result<T>,
    {
        let mut values = BTreeMap::new();
        for code in STATE_CODES {
            values.insert(code, f(code)?);
        }
        Ok(Self { values })
    }

    pub fn get(&self, code: &str) -> Option<&T> {
        self.values.get(code)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(code, value)` in [`STATE_CODES`] order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &T)> {
        STATE_CODES
            .iter()
            .filter_map(|code| self.values.get(code).map(|v| (*code, v)))
    }

    pub fn map<U, F>(&self, mut f: F) -> StateSeries<U>
    where
        F: FnMut(&T) -> U,
    {
        StateSeries {
            values: self.values.iter().map(|(k, v)| (*k, f(v))).collect(),
        }
    }
}

impl StateSeries<f64> {
    /// The series `code -> position in STATE_CODES`, used as an x axis.
    pub fn positions() -> Self {
        Self {
            values: STATE_CODES
                .iter()
                .enumerate()
                .map(|(i, code)| (*code, i as f64))
                .collect(),
        }
    }
}

/// A labelled scatter point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPoint {
    pub state: &'static str,
    pub x: f64,
    pub y: f64,
}

/// Joins two series on state code, in list order.
///
/// Fails if either series lacks a code the other has.
pub fn join(xs: &StateSeries<f64>, ys: &StateSeries<f64>) -> Result<Vec<PlotPoint>> {
    if let Some((code, _)) = ys.iter().find(|(code, _)| xs.get(code).is_none()) {
        bail!("state {code} present in y series but missing from x series");
    }

    xs.iter()
        .map(|(state, x)| {
            let y = ys
                .get(state)
                .ok_or_else(|| anyhow!("state {state} present in x series but missing from y series"))?;
            Ok(PlotPoint { state, x: *x, y: *y })
        })
        .collect()
}
