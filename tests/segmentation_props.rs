use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use flowcast::cycles::{segment, MAX_GAP_DAYS};
use flowcast::models::{CycleEntry, FlowIntensity};
use flowcast::prediction::predict;

fn entry(offset: i64, flow: FlowIntensity) -> CycleEntry {
    CycleEntry {
        id: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(offset),
        flow_intensity: flow,
        mood: Default::default(),
        symptoms: Vec::new(),
        notes: String::new(),
        logged_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn flow() -> impl Strategy<Value = FlowIntensity> {
    prop_oneof![
        Just(FlowIntensity::None),
        Just(FlowIntensity::Light),
        Just(FlowIntensity::Medium),
        Just(FlowIntensity::Heavy),
    ]
}

fn history() -> impl Strategy<Value = Vec<CycleEntry>> {
    prop::collection::vec((0i64..400, flow()), 0..60)
        .prop_map(|days| days.into_iter().map(|(d, f)| entry(d, f)).collect())
}

proptest! {
    #[test]
    fn cycles_respect_gap_rule(entries in history()) {
        let cycles = segment(&entries);

        let period_days = entries.iter().filter(|e| e.is_period()).count();
        prop_assert_eq!(cycles.iter().map(|c| c.length()).sum::<usize>(), period_days);

        for cycle in &cycles {
            prop_assert!(!cycle.days().is_empty());
            for pair in cycle.days().windows(2) {
                let gap = (pair[1].date - pair[0].date).num_days();
                prop_assert!((0..=MAX_GAP_DAYS).contains(&gap));
            }
        }
        for pair in cycles.windows(2) {
            let last = pair[0].days().last().unwrap().date;
            prop_assert!((pair[1].start_date() - last).num_days() > MAX_GAP_DAYS);
        }
    }

    #[test]
    fn segmentation_ignores_input_order(entries in history()) {
        let mut reversed = entries.clone();
        reversed.reverse();
        let starts = |es: &[CycleEntry]| -> Vec<NaiveDate> {
            segment(es).iter().map(|c| c.start_date()).collect()
        };
        prop_assert_eq!(starts(&entries), starts(&reversed));
    }

    #[test]
    fn confidence_stays_in_bounds(entries in history()) {
        let cycles = segment(&entries);
        match predict(&cycles) {
            Some(p) => {
                prop_assert!((65..=95).contains(&p.confidence));
                prop_assert_eq!(p.based_on_cycles, cycles.len());
                prop_assert!(p.predicted_period_end > p.predicted_period_start);
                prop_assert!(p.fertile_window_start < p.ovulation_day);
            }
            None => prop_assert!(cycles.is_empty()),
        }
    }
}
