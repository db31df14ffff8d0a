//! Runtime settings and batch plot plans.
//!
//! Settings come from the environment (a `.env` file is loaded first by the
//! CLI). A plot plan is a JSON file listing plots to render in one run:
//! ```json
//! [
//!   { "kind": "total_discharges", "drg": "PNEUMONIA", "year": 2011, "file": "pneumonia_2011.png" },
//!   { "kind": "discharges_per_capita", "drg": "HEART FAILURE", "year": 2012, "file": "hf_pc_2012.png" }
//! ]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::plot::PlotKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub results_dir: PathBuf,
    pub log_file_path: PathBuf,
}

impl Settings {
    /// Reads `DATABASE_PATH`, `RESULTS_DIR` and `LOG_FILE_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()));

        Self {
            database_path: get("DATABASE_PATH", "data/health.db"),
            results_dir: get("RESULTS_DIR", "results"),
            log_file_path: get("LOG_FILE_PATH", "logs/health_plots.log"),
        }
    }

    /// CSV ledger of rendered plots, kept beside the images.
    pub fn plot_ledger(&self) -> PathBuf {
        self.results_dir.join("plots.csv")
    }
}

/// One plot in a batch plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlotJob {
    pub kind: PlotKind,
    pub drg: String,
    pub year: u16,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotPlan {
    pub jobs: Vec<PlotJob>,
}

impl PlotPlan {
    /// Loads a plan from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading plot plan {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing plot plan {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let jobs: Vec<PlotJob> = serde_json::from_str(content)?;
        Ok(Self { jobs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.database_path, PathBuf::from("data/health.db"));
        assert_eq!(settings.results_dir, PathBuf::from("results"));
        assert_eq!(settings.plot_ledger(), PathBuf::from("results/plots.csv"));
    }

    #[test]
    fn test_settings_overrides() {
        let env = HashMap::from([
            ("DATABASE_PATH", "/tmp/x.db"),
            ("RESULTS_DIR", "/tmp/out"),
        ]);
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(settings.results_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            settings.log_file_path,
            PathBuf::from("logs/health_plots.log")
        );
    }

    #[test]
    fn test_plan_from_json() {
        let plan = PlotPlan::from_json(
            r#"[
                {"kind": "total_discharges", "drg": "PNEUMONIA", "year": 2011, "file": "a.png"},
                {"kind": "discharges_vs_population", "drg": "HEART", "year": 2013, "file": "b"}
            ]"#,
        )
        .unwrap();

        assert_eq!(plan.jobs.len(), 2);
        assert_eq!(plan.jobs[0].kind, PlotKind::TotalDischarges);
        assert_eq!(plan.jobs[1].kind, PlotKind::DischargesVsPopulation);
        assert_eq!(plan.jobs[1].file, "b");
    }

    #[test]
    fn test_plan_rejects_unknown_kind() {
        assert!(
            PlotPlan::from_json(r#"[{"kind": "pie", "drg": "X", "year": 2011, "file": "a"}]"#)
                .is_err()
        );
    }
}
