use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDate, TimeDelta};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::cycles::segment;
use crate::error::{Error, Result};
use crate::models::{
    CycleEntry, CyclePrediction, CycleStats, EntryUpdate, FlowIntensity, Insight, Mood, NewEntry,
    NewInsight, PreferencesUpdate, Symptom, UserProfile,
};
use crate::phase::{current_phase, predicted_phase, CurrentPhase, PhaseInfo, PredictedPhase};
use crate::prediction;
use crate::stats;
use crate::storage::{EntryStore, InsightStore, PredictionStore, ProfileStore};

/// Window used for the "most common symptom" on the overview.
pub const RECENT_SYMPTOM_DAYS: i64 = 30;

/// A daily check-in as submitted by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckIn {
    pub date: NaiveDate,
    pub flow_intensity: FlowIntensity,
    pub mood: Mood,
    pub symptoms: Vec<Symptom>,
    pub notes: String,
}

impl From<CheckIn> for NewEntry {
    fn from(c: CheckIn) -> Self {
        NewEntry {
            date: c.date,
            flow_intensity: c.flow_intensity,
            mood: c.mood,
            symptoms: c.symptoms,
            notes: c.notes,
        }
    }
}

/// Profile and prediction after a recomputation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Refreshed {
    pub profile: UserProfile,
    pub prediction: Option<CyclePrediction>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckInOutcome {
    pub entry: CycleEntry,
    pub created: bool,
    pub profile: UserProfile,
    pub prediction: Option<CyclePrediction>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub entry: Option<CycleEntry>,
    pub phase: Option<PredictedPhase>,
}

/// Data for a month view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub prediction: Option<CyclePrediction>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Overview {
    pub profile: UserProfile,
    pub tracking_days: i64,
    pub total_entries: usize,
    pub most_common_symptom: Option<Symptom>,
    pub most_common_mood: Option<Mood>,
    pub phase: Option<PhaseInfo>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SymptomSeries {
    pub symptom: Symptom,
    pub counts: Vec<usize>,
}

/// Per-day symptom counts over a window, one series per symptom seen.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SymptomTrends {
    pub dates: Vec<NaiveDate>,
    pub series: Vec<SymptomSeries>,
}

#[derive(Serialize)]
struct Export<'a> {
    entries: &'a [CycleEntry],
    profile: &'a UserProfile,
    prediction: &'a Option<CyclePrediction>,
    insights: &'a [Insight],
}

/// First day of a look-back window of `days` ending on `today`.
fn window_start(today: NaiveDate, days: i64) -> Result<NaiveDate> {
    if days < 0 {
        return Err(Error::InvalidInput(format!("window of {days} days is negative")));
    }
    TimeDelta::try_days(days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| Error::InvalidInput(format!("window of {days} days is out of range")))
}

/// Application service: saves check-ins and keeps the profile averages and
/// the current prediction in step with the entry history.
pub struct Tracker<S> {
    store: S,
}

impl<S> Tracker<S>
where
    S: EntryStore + ProfileStore + PredictionStore + InsightStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Save the check-in for its date (one entry per day), then recompute.
    #[instrument(skip(self, check_in), fields(date = %check_in.date))]
    pub fn check_in(&self, check_in: CheckIn) -> Result<CheckInOutcome> {
        let (entry, created) = match self.store.by_date(check_in.date)? {
            Some(existing) => {
                let update = EntryUpdate::from(NewEntry::from(check_in));
                (self.store.update(existing.id, update)?, false)
            }
            None => (self.store.create(check_in.into())?, true),
        };
        info!(id = %entry.id, created, flow = %entry.flow_intensity, "check-in saved");

        let Refreshed {
            profile,
            prediction,
        } = self.refresh()?;
        Ok(CheckInOutcome {
            entry,
            created,
            profile,
            prediction,
        })
    }

    /// Recompute profile averages and the prediction from all entries.
    pub fn refresh(&self) -> Result<Refreshed> {
        let entries = self.store.all()?;
        let cycles = segment(&entries);
        debug!(entries = entries.len(), cycles = cycles.len(), "recomputing");

        let profile = stats::apply_stats(&self.store, &cycles)?;
        let prediction = prediction::recalculate(&self.store, &entries)?;
        Ok(Refreshed {
            profile,
            prediction,
        })
    }

    pub fn remove_entry(&self, id: Uuid) -> Result<Refreshed> {
        if !self.store.delete(id)? {
            return Err(Error::InvalidInput(format!("no entry with id {id}")));
        }
        info!(%id, "entry removed");
        self.refresh()
    }

    pub fn entry_on(&self, date: NaiveDate) -> Result<Option<CycleEntry>> {
        Ok(self.store.by_date(date)?)
    }

    pub fn entries_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CycleEntry>> {
        if end < start {
            return Err(Error::InvalidInput(format!("{end} is before {start}")));
        }
        Ok(self.store.in_range(start, end)?)
    }

    pub fn prediction(&self) -> Result<Option<CyclePrediction>> {
        Ok(self.store.current()?)
    }

    pub fn profile(&self) -> Result<UserProfile> {
        Ok(self.store.profile()?)
    }

    pub fn cycle_stats(&self) -> Result<Option<CycleStats>> {
        Ok(stats::compute_stats(&segment(&self.store.all()?)))
    }

    pub fn month(&self, year: i32, month: u32) -> Result<MonthView> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidInput(format!("invalid month {year}-{month}")))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| Error::InvalidInput(format!("invalid month {year}-{month}")))?;
        let last = next - Duration::days(1);

        let mut by_date: HashMap<NaiveDate, CycleEntry> = self
            .store
            .in_range(first, last)?
            .into_iter()
            .map(|e| (e.date, e))
            .collect();
        let prediction = self.store.current()?;

        let days = first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(|date| CalendarDay {
                date,
                entry: by_date.remove(&date),
                phase: prediction.as_ref().and_then(|p| predicted_phase(p, date)),
            })
            .collect();

        Ok(MonthView {
            year,
            month,
            days,
            prediction,
        })
    }

    pub fn overview(&self, today: NaiveDate) -> Result<Overview> {
        let profile = self.store.profile()?;
        let entries = self.store.all()?;

        let symptoms = self.recent_symptoms(today, RECENT_SYMPTOM_DAYS)?;
        let most_common_symptom = most_common(symptoms.into_iter());

        let mut moods: BTreeMap<Mood, usize> = BTreeMap::new();
        for entry in &entries {
            *moods.entry(entry.mood).or_default() += 1;
        }

        let phase = self.store.current()?.map(|p| current_phase(&p, today));

        Ok(Overview {
            tracking_days: (today - profile.tracking_since).num_days(),
            total_entries: entries.len(),
            most_common_symptom,
            most_common_mood: most_common(moods.into_iter()),
            phase,
            profile,
        })
    }

    /// How often each symptom was logged on or after `today - days`.
    pub fn recent_symptoms(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> Result<BTreeMap<Symptom, usize>> {
        let cutoff = window_start(today, days)?;
        let mut counts = BTreeMap::new();
        for entry in self.store.all()?.iter().filter(|e| e.date >= cutoff) {
            for symptom in &entry.symptoms {
                *counts.entry(*symptom).or_default() += 1;
            }
        }
        Ok(counts)
    }

    pub fn symptom_trends(&self, today: NaiveDate, days: i64) -> Result<SymptomTrends> {
        let cutoff = window_start(today, days)?;
        let mut per_day: BTreeMap<NaiveDate, HashMap<Symptom, usize>> = BTreeMap::new();
        let mut seen: BTreeSet<Symptom> = BTreeSet::new();

        for entry in self.store.all()?.into_iter().filter(|e| e.date >= cutoff) {
            let day = per_day.entry(entry.date).or_default();
            for symptom in entry.symptoms {
                seen.insert(symptom);
                *day.entry(symptom).or_default() += 1;
            }
        }

        let series = seen
            .into_iter()
            .map(|symptom| SymptomSeries {
                symptom,
                counts: per_day
                    .values()
                    .map(|day| day.get(&symptom).copied().unwrap_or(0))
                    .collect(),
            })
            .collect();

        Ok(SymptomTrends {
            dates: per_day.into_keys().collect(),
            series,
        })
    }

    pub fn update_preferences(&self, update: PreferencesUpdate) -> Result<UserProfile> {
        Ok(self.store.update_preferences(update)?)
    }

    fn insights_enabled(&self) -> Result<bool> {
        Ok(self.store.profile()?.preferences.insights)
    }

    /// The insights feed, newest first. Empty while the insights preference is off.
    pub fn insight_feed(&self) -> Result<Vec<Insight>> {
        if !self.insights_enabled()? {
            return Ok(Vec::new());
        }
        Ok(self.store.all_insights()?)
    }

    pub fn phase_insights(&self, phase: CurrentPhase) -> Result<Vec<Insight>> {
        if !self.insights_enabled()? {
            return Ok(Vec::new());
        }
        Ok(self.store.insights_in_phase(phase)?)
    }

    /// The unviewed insight to surface today.
    ///
    /// Insights for the current phase (or for no phase) come first, highest
    /// priority then newest. Without a matching one the newest unviewed
    /// insight is used.
    pub fn todays_insight(&self, today: NaiveDate) -> Result<Option<Insight>> {
        if !self.insights_enabled()? {
            return Ok(None);
        }
        let unviewed = self.store.unviewed_insights()?;
        let phase = self.store.current()?.map(|p| current_phase(&p, today).phase);

        let matching = unviewed
            .iter()
            .filter(|i| match phase {
                Some(phase) => i.applies_to(phase),
                None => true,
            })
            .min_by_key(|i| Reverse(i.priority));
        Ok(matching.or(unviewed.first()).cloned())
    }

    pub fn mark_insight_viewed(&self, id: Uuid) -> Result<Insight> {
        let insight = self.store.mark_insight_viewed(id)?;
        debug!(%id, "insight viewed");
        Ok(insight)
    }

    pub fn add_insight(&self, insight: NewInsight) -> Result<Insight> {
        if insight.message.trim().is_empty() {
            return Err(Error::InvalidInput("insight message is empty".into()));
        }
        let insight = self.store.create_insight(insight)?;
        info!(id = %insight.id, kind = %insight.kind, "insight added");
        Ok(insight)
    }

    /// Pretty JSON of everything stored.
    pub fn export(&self) -> Result<String> {
        let mut entries = self.store.all()?;
        entries.sort_by_key(|e| e.date);
        let profile = self.store.profile()?;
        let prediction = self.store.current()?;
        let insights = self.store.all_insights()?;
        Ok(serde_json::to_string_pretty(&Export {
            entries: &entries,
            profile: &profile,
            prediction: &prediction,
            insights: &insights,
        })?)
    }
}

/// Highest count wins; ties go to the smallest key.
fn most_common<K: Ord + Copy>(counts: impl Iterator<Item = (K, usize)>) -> Option<K> {
    counts
        .fold(None, |best: Option<(K, usize)>, (k, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((k, n)),
        })
        .map(|(k, _)| k)
}
