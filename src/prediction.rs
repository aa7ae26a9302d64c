use chrono::{Duration, NaiveDate};

use crate::cycles::{cycle_lengths, rounded_mean, segment};
use crate::models::{Cycle, CycleEntry, CyclePrediction, DEFAULT_CYCLE_LENGTH};
use crate::storage::{PredictionStore, StoreError};

/// Fewer period days than this and the stored prediction is left alone.
pub const MIN_PERIOD_DAYS: usize = 2;

const PREDICTED_PERIOD_DAYS: i64 = 5;
const LUTEAL_PHASE_DAYS: i64 = 14;
const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;
const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;

const BASE_CONFIDENCE: u32 = 60;
const CONFIDENCE_PER_CYCLE: u32 = 5;
const MAX_CONFIDENCE: u32 = 95;

/// Confidence grows with every observed cycle, capped at 95%.
pub fn confidence(cycle_count: usize) -> u32 {
    let count = u32::try_from(cycle_count).unwrap_or(u32::MAX);
    BASE_CONFIDENCE
        .saturating_add(CONFIDENCE_PER_CYCLE.saturating_mul(count))
        .min(MAX_CONFIDENCE)
}

/// Project the next cycle from the last period start and average cycle length.
///
/// Ovulation is estimated 14 days before the predicted period. The fertile
/// window runs from five days before ovulation to one day after. On very
/// short cycles ovulation can land before `last_period_start`; that is not
/// corrected here.
pub fn project(
    last_period_start: NaiveDate,
    avg_cycle_length: i64,
    cycle_count: usize,
) -> CyclePrediction {
    let predicted_period_start = last_period_start + Duration::days(avg_cycle_length);
    let ovulation_day = predicted_period_start - Duration::days(LUTEAL_PHASE_DAYS);

    CyclePrediction {
        predicted_period_start,
        predicted_period_end: predicted_period_start + Duration::days(PREDICTED_PERIOD_DAYS),
        ovulation_day,
        fertile_window_start: ovulation_day - Duration::days(FERTILE_DAYS_BEFORE_OVULATION),
        fertile_window_end: ovulation_day + Duration::days(FERTILE_DAYS_AFTER_OVULATION),
        confidence: confidence(cycle_count),
        based_on_cycles: cycle_count,
    }
}

/// Predict the next cycle from segmented cycles (ascending).
/// The most recent cycle anchors the projection.
pub fn predict(cycles: &[Cycle]) -> Option<CyclePrediction> {
    let last = cycles.last()?;
    let avg_cycle_length = rounded_mean(cycle_lengths(cycles)).unwrap_or(DEFAULT_CYCLE_LENGTH);
    Some(project(last.start_date(), avg_cycle_length, cycles.len()))
}

/// Recompute the prediction from the full entry history and store it.
///
/// With fewer than [`MIN_PERIOD_DAYS`] period days the stored prediction (if
/// any) is returned untouched and nothing is written. The result depends only
/// on logged dates, never on the current date.
pub fn recalculate<S>(
    store: &S,
    entries: &[CycleEntry],
) -> Result<Option<CyclePrediction>, StoreError>
where
    S: PredictionStore + ?Sized,
{
    let period_days = entries.iter().filter(|e| e.is_period()).count();
    if period_days < MIN_PERIOD_DAYS {
        return store.current();
    }

    match predict(&segment(entries)) {
        Some(prediction) => store.replace(prediction).map(Some),
        None => store.current(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycles::tests::{day, entry, period};
    use crate::memory::MemoryStore;
    use crate::models::FlowIntensity;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn confidence_scales_and_caps() {
        assert_eq!(confidence(1), 65);
        assert_eq!(confidence(3), 75);
        assert_eq!(confidence(7), 95);
        assert_eq!(confidence(8), 95);
        assert_eq!(confidence(usize::MAX), 95);
    }

    #[test]
    fn projects_dates() {
        let p = project(ymd(2024, 1, 1), 28, 2);
        assert_eq!(p.predicted_period_start, ymd(2024, 1, 29));
        assert_eq!(p.predicted_period_end, ymd(2024, 2, 3));
        assert_eq!(p.ovulation_day, ymd(2024, 1, 15));
        assert_eq!(p.fertile_window_start, ymd(2024, 1, 10));
        assert_eq!(p.fertile_window_end, ymd(2024, 1, 16));
        assert_eq!(p.based_on_cycles, 2);
    }

    #[test]
    fn short_cycles_put_ovulation_before_last_period() {
        let p = project(ymd(2024, 1, 1), 10, 2);
        assert!(p.ovulation_day < ymd(2024, 1, 1));
        assert!(p.fertile_window_end < p.predicted_period_start);
    }

    #[test]
    fn predicts_from_most_recent_cycle() {
        let cycles = segment(&period(&[0, 1, 2, 30, 31, 58, 59]));
        let p = predict(&cycles).unwrap();
        // lengths 30 and 28 average to 29, anchored on day 58
        assert_eq!(p.predicted_period_start, day(58 + 29));
        assert_eq!(p.confidence, 75);
        assert_eq!(p.based_on_cycles, 3);
    }

    #[test]
    fn single_cycle_uses_default_length() {
        let cycles = segment(&period(&[0, 1, 2]));
        let p = predict(&cycles).unwrap();
        assert_eq!(p.predicted_period_start, day(28));
        assert_eq!(p.confidence, 65);
    }

    #[test]
    fn empty_history_returns_stored_prediction() {
        let store = MemoryStore::new();
        assert_eq!(recalculate(&store, &[]).unwrap(), None);

        let existing = project(ymd(2023, 12, 1), 28, 4);
        store.replace(existing).unwrap();
        assert_eq!(recalculate(&store, &[]).unwrap(), Some(existing));
    }

    #[test]
    fn single_period_day_does_not_write() {
        let store = MemoryStore::new();
        let existing = project(ymd(2023, 12, 1), 28, 4);
        store.replace(existing).unwrap();

        let entries = vec![
            entry(0, FlowIntensity::Heavy),
            entry(1, FlowIntensity::None),
            entry(2, FlowIntensity::None),
        ];
        assert_eq!(recalculate(&store, &entries).unwrap(), Some(existing));
        assert_eq!(store.current().unwrap(), Some(existing));
    }

    #[test]
    fn recalculate_replaces_and_is_idempotent() {
        let store = MemoryStore::new();
        store.replace(project(ymd(2020, 1, 1), 35, 1)).unwrap();

        let mut entries = period(&[58, 0, 28, 1, 29]);
        entries.push(entry(10, FlowIntensity::None));

        let first = recalculate(&store, &entries).unwrap().unwrap();
        let second = recalculate(&store, &entries).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(store.current().unwrap(), Some(first));
        assert_eq!(first.predicted_period_start, day(58 + 29));
        assert_eq!(first.based_on_cycles, 3);
    }
}
