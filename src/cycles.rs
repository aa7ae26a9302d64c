use crate::models::{Cycle, CycleEntry};

/// Period days more than this many days apart belong to different cycles.
pub const MAX_GAP_DAYS: i64 = 10;

/// Group period days into cycles.
///
/// Entries may come in any order; they are sorted ascending by date (stable)
/// and non-period days are dropped before grouping. A gap of more than
/// [`MAX_GAP_DAYS`] between consecutive period days starts a new cycle.
pub fn segment(entries: &[CycleEntry]) -> Vec<Cycle> {
    let mut period_days: Vec<&CycleEntry> = entries.iter().filter(|e| e.is_period()).collect();
    period_days.sort_by_key(|e| e.date);

    let mut cycles: Vec<Cycle> = Vec::new();
    let mut current: Vec<CycleEntry> = Vec::new();

    for entry in period_days {
        if let Some(prev) = current.last() {
            if (entry.date - prev.date).num_days() > MAX_GAP_DAYS {
                cycles.extend(Cycle::from_days(std::mem::take(&mut current)));
            }
        }
        current.push(entry.clone());
    }
    cycles.extend(Cycle::from_days(current));

    cycles
}

/// Days between the starts of each pair of adjacent cycles.
pub fn cycle_lengths(cycles: &[Cycle]) -> Vec<i64> {
    cycles
        .windows(2)
        .map(|w| (w[1].start_date() - w[0].start_date()).num_days())
        .collect()
}

/// Rounded mean, halves away from zero.
pub(crate) fn rounded_mean(values: impl IntoIterator<Item = i64>) -> Option<i64> {
    let (sum, count) = values
        .into_iter()
        .fold((0i64, 0i64), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some((sum as f64 / count as f64).round() as i64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::FlowIntensity;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    pub(crate) fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    pub(crate) fn entry(offset: i64, flow: FlowIntensity) -> CycleEntry {
        CycleEntry {
            id: Uuid::new_v4(),
            date: day(offset),
            flow_intensity: flow,
            mood: Default::default(),
            symptoms: Vec::new(),
            notes: String::new(),
            logged_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    pub(crate) fn period(offsets: &[i64]) -> Vec<CycleEntry> {
        offsets
            .iter()
            .map(|&o| entry(o, FlowIntensity::Medium))
            .collect()
    }

    fn starts(cycles: &[Cycle]) -> Vec<NaiveDate> {
        cycles.iter().map(|c| c.start_date()).collect()
    }

    #[test]
    fn empty_input_yields_no_cycles() {
        assert!(segment(&[]).is_empty());
    }

    #[test]
    fn non_period_days_are_ignored() {
        let entries = vec![
            entry(0, FlowIntensity::None),
            entry(5, FlowIntensity::None),
        ];
        assert!(segment(&entries).is_empty());
    }

    #[test]
    fn splits_on_long_gap() {
        let cycles = segment(&period(&[1, 2, 3, 20]));
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].length(), 3);
        assert_eq!(cycles[1].length(), 1);
        assert_eq!(starts(&cycles), vec![day(1), day(20)]);
    }

    #[test]
    fn gap_threshold_is_inclusive() {
        assert_eq!(segment(&period(&[1, 9])).len(), 1);
        assert_eq!(segment(&period(&[1, 11])).len(), 1);
        assert_eq!(segment(&period(&[1, 12])).len(), 2);
    }

    #[test]
    fn sorts_before_grouping() {
        let mut entries = period(&[30, 0, 31, 1, 2]);
        entries.push(entry(15, FlowIntensity::None));
        let cycles = segment(&entries);
        assert_eq!(starts(&cycles), vec![day(0), day(30)]);
        assert_eq!(cycles[0].length(), 3);
        assert_eq!(cycles[1].length(), 2);
        assert!(cycles[0].days().windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn empty_run_is_not_a_cycle() {
        assert!(Cycle::from_days(Vec::new()).is_none());
        let cycle = Cycle::from_days(period(&[3, 4])).unwrap();
        assert_eq!(cycle.start_date(), day(3));
        assert_eq!(cycle.length(), 2);
    }

    #[test]
    fn cycle_lengths_between_starts() {
        let cycles = segment(&period(&[0, 1, 30, 58, 59]));
        assert_eq!(cycle_lengths(&cycles), vec![30, 28]);
    }

    #[test]
    fn rounded_mean_rounds_halves_up() {
        assert_eq!(rounded_mean([28, 29]), Some(29));
        assert_eq!(rounded_mean([30, 28]), Some(29));
        assert_eq!(rounded_mean(Vec::<i64>::new()), None);
    }
}
