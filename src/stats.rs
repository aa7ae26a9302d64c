use crate::cycles::{cycle_lengths, rounded_mean};
use crate::models::{Cycle, CycleStats, ProfileUpdate, UserProfile, DEFAULT_CYCLE_LENGTH};
use crate::storage::{ProfileStore, StoreError};

/// Compute cycle statistics from segmented cycles (ascending).
/// Returns `None` when there are no cycles at all.
pub fn compute_stats(cycles: &[Cycle]) -> Option<CycleStats> {
    let last = cycles.last()?;

    let lengths = cycle_lengths(cycles);
    let average_cycle_length =
        rounded_mean(lengths.iter().copied()).unwrap_or(DEFAULT_CYCLE_LENGTH);
    // `cycles` is non-empty here, so the mean always exists.
    let average_period_length =
        rounded_mean(cycles.iter().map(|c| c.length() as i64)).unwrap_or_default();

    Some(CycleStats {
        total_cycles: cycles.len(),
        average_cycle_length,
        average_period_length,
        shortest_cycle: lengths.iter().copied().min(),
        longest_cycle: lengths.iter().copied().max(),
        last_period_start: last.start_date(),
    })
}

/// Write the rolling averages and last period start to the profile.
/// With no cycles the stored profile is returned without a write.
pub fn apply_stats<S>(store: &S, cycles: &[Cycle]) -> Result<UserProfile, StoreError>
where
    S: ProfileStore + ?Sized,
{
    match compute_stats(cycles) {
        Some(stats) => store.apply_update(ProfileUpdate {
            average_cycle_length: Some(stats.average_cycle_length),
            average_period_length: Some(stats.average_period_length),
            last_period_start: Some(stats.last_period_start),
        }),
        None => store.profile(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycles::segment;
    use crate::cycles::tests::{day, period};
    use crate::memory::MemoryStore;
    use crate::models::{PreferencesUpdate, DEFAULT_PERIOD_LENGTH};

    #[test]
    fn no_cycles_no_stats() {
        assert!(compute_stats(&[]).is_none());
    }

    #[test]
    fn single_cycle_uses_default_cycle_length() {
        let cycles = segment(&period(&[0, 1, 2, 3]));
        let stats = compute_stats(&cycles).unwrap();
        assert_eq!(stats.total_cycles, 1);
        assert_eq!(stats.average_cycle_length, 28);
        assert_eq!(stats.average_period_length, 4);
        assert_eq!(stats.shortest_cycle, None);
        assert_eq!(stats.last_period_start, day(0));
    }

    #[test]
    fn averages_over_cycles() {
        // starts on 0, 30, 58; logged days 3, 4, 5
        let cycles = segment(&period(&[0, 1, 2, 30, 31, 32, 33, 58, 59, 60, 61, 62]));
        let stats = compute_stats(&cycles).unwrap();
        assert_eq!(stats.average_cycle_length, 29);
        assert_eq!(stats.average_period_length, 4);
        assert_eq!(stats.shortest_cycle, Some(28));
        assert_eq!(stats.longest_cycle, Some(30));
        assert_eq!(stats.last_period_start, day(58));
    }

    #[test]
    fn period_length_counts_logged_days() {
        // 1, 4 and 9 are within the gap tolerance: three logged days, nine day span
        let cycles = segment(&period(&[1, 4, 9]));
        assert_eq!(compute_stats(&cycles).unwrap().average_period_length, 3);
    }

    #[test]
    fn apply_stats_is_partial() {
        let store = MemoryStore::new();
        let before = store
            .update_preferences(PreferencesUpdate {
                privacy_mode: Some(true),
                ..Default::default()
            })
            .unwrap();

        let cycles = segment(&period(&[0, 1, 28, 29, 30]));
        let after = apply_stats(&store, &cycles).unwrap();

        assert_eq!(after.average_cycle_length, 28);
        assert_eq!(after.average_period_length, 3);
        assert_eq!(after.last_period_start, day(28));
        assert_eq!(after.tracking_since, before.tracking_since);
        assert_eq!(after.preferences, before.preferences);
        assert_eq!(store.profile().unwrap(), after);
    }

    #[test]
    fn apply_stats_without_cycles_keeps_profile() {
        let store = MemoryStore::new();
        let before = store.profile().unwrap();
        let after = apply_stats(&store, &[]).unwrap();
        assert_eq!(before, after);
        assert_eq!(after.average_period_length, DEFAULT_PERIOD_LENGTH);
    }
}
