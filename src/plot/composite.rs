//! The three per-state discharge plots.

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use super::{Figure, RenderContext};
use crate::output::PlotRecord;
use crate::query::{population_65_and_over_by_state, total_discharges_by_state};
use crate::states::{StateSeries, join};
use crate::store::{AggregateStore, Sex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    /// Total discharges against state.
    TotalDischarges,
    /// Total discharges per resident aged 65+ against state.
    DischargesPerCapita,
    /// Total discharges against population aged 65+ (millions).
    DischargesVsPopulation,
}

impl PlotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlotKind::TotalDischarges => "total_discharges",
            PlotKind::DischargesPerCapita => "discharges_per_capita",
            PlotKind::DischargesVsPopulation => "discharges_vs_population",
        }
    }

    /// Queries `store` and assembles the figure for this kind.
    pub fn figure<S>(self, store: &S, drg: &str, year: u16) -> Result<Figure>
    where
        S: AggregateStore + ?Sized,
    {
        match self {
            PlotKind::TotalDischarges => discharges_vs_state_figure(store, drg, year),
            PlotKind::DischargesPerCapita => discharges_per_capita_figure(store, drg, year),
            PlotKind::DischargesVsPopulation => discharges_vs_population_figure(store, drg, year),
        }
    }
}

/// Builds, renders and records one plot.
#[tracing::instrument(skip(store, ctx))]
pub fn plot<S>(
    kind: PlotKind,
    store: &S,
    ctx: &RenderContext,
    drg: &str,
    year: u16,
    file_name: &str,
) -> Result<PlotRecord>
where
    S: AggregateStore + ?Sized,
{
    let figure = kind.figure(store, drg, year)?;
    let path = ctx.render(&figure, file_name)?;
    Ok(PlotRecord::new(kind, year, &figure, &path))
}

pub fn plot_total_discharges_vs_state<S>(
    store: &S,
    ctx: &RenderContext,
    drg: &str,
    year: u16,
    file_name: &str,
) -> Result<PlotRecord>
where
    S: AggregateStore + ?Sized,
{
    plot(PlotKind::TotalDischarges, store, ctx, drg, year, file_name)
}

pub fn plot_total_discharges_per_state_pop_vs_state<S>(
    store: &S,
    ctx: &RenderContext,
    drg: &str,
    year: u16,
    file_name: &str,
) -> Result<PlotRecord>
where
    S: AggregateStore + ?Sized,
{
    plot(PlotKind::DischargesPerCapita, store, ctx, drg, year, file_name)
}

pub fn plot_total_discharges_vs_state_pop<S>(
    store: &S,
    ctx: &RenderContext,
    drg: &str,
    year: u16,
    file_name: &str,
) -> Result<PlotRecord>
where
    S: AggregateStore + ?Sized,
{
    plot(PlotKind::DischargesVsPopulation, store, ctx, drg, year, file_name)
}

fn discharges_vs_state_figure<S>(store: &S, drg: &str, year: u16) -> Result<Figure>
where
    S: AggregateStore + ?Sized,
{
    let discharges = total_discharges_by_state(store, drg, year)?.map(|d| *d as f64);

    Ok(Figure {
        title: drg.to_string(),
        x_label: "state".to_string(),
        y_label: format!("{year} total discharges"),
        points: join(&StateSeries::positions(), &discharges)?,
    })
}

fn discharges_per_capita_figure<S>(store: &S, drg: &str, year: u16) -> Result<Figure>
where
    S: AggregateStore + ?Sized,
{
    let discharges = total_discharges_by_state(store, drg, year)?;
    let population = population_65_and_over_by_state(store, Sex::Total, year)?;

    let per_capita = StateSeries::try_from_fn(|code| {
        let d = discharges
            .get(code)
            .ok_or_else(|| anyhow!("no discharge total for {code}"))?;
        let p = population
            .get(code)
            .ok_or_else(|| anyhow!("no population estimate for {code}"))?;
        if *p == 0 {
            bail!("population aged 65 and over is zero for {code} in {year}");
        }
        Ok(*d as f64 / *p as f64)
    })?;

    Ok(Figure {
        title: drg.to_string(),
        x_label: "state".to_string(),
        y_label: format!("{year} total discharges / state pop (age 65 and over)"),
        points: join(&StateSeries::positions(), &per_capita)?,
    })
}

fn discharges_vs_population_figure<S>(store: &S, drg: &str, year: u16) -> Result<Figure>
where
    S: AggregateStore + ?Sized,
{
    let population = population_65_and_over_by_state(store, Sex::Total, year)?
        .map(|p| *p as f64 / 1.0e6);
    let discharges = total_discharges_by_state(store, drg, year)?.map(|d| *d as f64);

    Ok(Figure {
        title: drg.to_string(),
        x_label: "state population (millions), age 65 and over".to_string(),
        y_label: format!("{year} total discharges"),
        points: join(&population, &discharges)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::STATE_CODES;
    use std::collections::HashMap;

    struct FixedStore {
        discharges: HashMap<String, i64>,
        population: HashMap<String, i64>,
    }

    impl AggregateStore for FixedStore {
        fn discharges_by_state(&self, _: &str, _: u16) -> Result<HashMap<String, i64>> {
            Ok(self.discharges.clone())
        }

        fn population_65_and_over_by_state(&self, _: Sex, _: u16) -> Result<HashMap<String, i64>> {
            Ok(self.population.clone())
        }
    }

    fn store() -> FixedStore {
        FixedStore {
            discharges: HashMap::from([("CA".to_string(), 500), ("AK".to_string(), 20)]),
            population: STATE_CODES
                .iter()
                .map(|c| (c.to_string(), 2_000_000))
                .collect(),
        }
    }

    #[test]
    fn test_plot_kind_names_match_serde() {
        for kind in [
            PlotKind::TotalDischarges,
            PlotKind::DischargesPerCapita,
            PlotKind::DischargesVsPopulation,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_discharges_vs_state_figure() {
        let fig = PlotKind::TotalDischarges.figure(&store(), "DRG", 2011).unwrap();

        assert_eq!(fig.title, "DRG");
        assert_eq!(fig.x_label, "state");
        assert_eq!(fig.y_label, "2011 total discharges");
        assert_eq!(fig.points.len(), 51);
        assert_eq!(fig.points[0].state, "AK");
        assert_eq!((fig.points[0].x, fig.points[0].y), (0.0, 20.0));
        let ca = fig.points.iter().find(|p| p.state == "CA").unwrap();
        assert_eq!((ca.x, ca.y), (4.0, 500.0));
    }

    #[test]
    fn test_per_capita_figure() {
        let fig = PlotKind::DischargesPerCapita.figure(&store(), "DRG", 2012).unwrap();

        assert_eq!(
            fig.y_label,
            "2012 total discharges / state pop (age 65 and over)"
        );
        let ca = fig.points.iter().find(|p| p.state == "CA").unwrap();
        assert_eq!(ca.y, 500.0 / 2_000_000.0);
        let wy = fig.points.iter().find(|p| p.state == "WY").unwrap();
        assert_eq!(wy.y, 0.0);
    }

    #[test]
    fn test_per_capita_zero_population_is_an_error() {
        let mut s = store();
        s.population.insert("CA".to_string(), 0);
        let err = PlotKind::DischargesPerCapita.figure(&s, "DRG", 2012).unwrap_err();
        assert!(err.to_string().contains("CA"));
    }

    #[test]
    fn test_vs_population_figure() {
        let fig = PlotKind::DischargesVsPopulation.figure(&store(), "DRG", 2013).unwrap();

        assert_eq!(fig.x_label, "state population (millions), age 65 and over");
        let ca = fig.points.iter().find(|p| p.state == "CA").unwrap();
        assert_eq!((ca.x, ca.y), (2.0, 500.0));
    }

    #[test]
    fn test_population_gap_fails_population_plots() {
        let mut s = store();
        s.population.remove("ME");
        assert!(PlotKind::DischargesVsPopulation.figure(&s, "DRG", 2013).is_err());
        assert!(PlotKind::DischargesPerCapita.figure(&s, "DRG", 2013).is_err());
        assert!(PlotKind::TotalDischarges.figure(&s, "DRG", 2013).is_ok());
    }
}
