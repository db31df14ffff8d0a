//! Per-state aggregate series over an [`AggregateStore`].

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::states::StateSeries;
use crate::store::{AggregateStore, Sex};

/// Total discharges for DRGs containing `drg_substring`, for every state.
///
/// A state with no matching rows counts as zero.
pub fn total_discharges_by_state<S>(
    store: &S,
    drg_substring: &str,
    year: u16,
) -> Result<StateSeries<i64>>
where
    S: AggregateStore + ?Sized,
{
    let sums = store.discharges_by_state(drg_substring, year)?;
    let series = StateSeries::try_from_fn(|code| Ok(sums.get(code).copied().unwrap_or(0)))?;

    debug!(
        drg_substring,
        year,
        states_with_data = sums.len(),
        "discharge series built"
    );
    Ok(series)
}

/// Population aged 65 and over for every state.
///
/// Every state must have estimates for `sex` and `year`; a missing state is
/// an error rather than a silent zero.
pub fn population_65_and_over_by_state<S>(
    store: &S,
    sex: Sex,
    year: u16,
) -> Result<StateSeries<i64>>
where
    S: AggregateStore + ?Sized,
{
    let sums = store.population_65_and_over_by_state(sex, year)?;
    StateSeries::try_from_fn(|code| {
        sums.get(code).copied().ok_or_else(|| {
            anyhow!("no population estimate for {code} (sex {sex:?}, year {year})")
        })
    })
}
