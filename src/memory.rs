use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    CycleEntry, CyclePrediction, EntryUpdate, FlowIntensity, Insight, InsightCategory,
    InsightKind, Mood, NewEntry, NewInsight, PreferencesUpdate, Priority, ProfileUpdate, Symptom,
    UserProfile,
};
use crate::phase::CurrentPhase;
use crate::storage::{today, EntryStore, InsightStore, PredictionStore, ProfileStore, StoreError};

/// Everything one user has stored. Also the on-disk vault payload.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Records {
    pub entries: Vec<CycleEntry>,
    pub profile: Option<UserProfile>,
    pub prediction: Option<CyclePrediction>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

impl Records {
    pub(crate) fn profile_or_default(&mut self) -> &mut UserProfile {
        self.profile.get_or_insert_with(|| UserProfile::new(today()))
    }

    pub(crate) fn create_entry(&mut self, new: NewEntry) -> CycleEntry {
        let entry = new.into_entry(Uuid::new_v4(), Utc::now());
        self.entries.push(entry.clone());
        entry
    }

    pub(crate) fn update_entry(
        &mut self,
        id: Uuid,
        update: EntryUpdate,
    ) -> Result<CycleEntry, StoreError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::EntryNotFound(id))?;
        update.apply_to(entry, Utc::now());
        Ok(entry.clone())
    }

    pub(crate) fn delete_entry(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Newest first, the order the hosted backend returned them in.
    pub(crate) fn entries_newest_first(&self) -> Vec<CycleEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }

    pub(crate) fn create_insight(&mut self, new: NewInsight) -> Insight {
        let insight = new.into_insight(Uuid::new_v4(), Utc::now());
        self.insights.push(insight.clone());
        insight
    }

    pub(crate) fn mark_insight_viewed(&mut self, id: Uuid) -> Result<Insight, StoreError> {
        let insight = self
            .insights
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::InsightNotFound(id))?;
        insight.viewed = true;
        Ok(insight.clone())
    }

    /// Reverse insertion order.
    pub(crate) fn insights_newest_first(&self) -> Vec<Insight> {
        self.insights.iter().rev().cloned().collect()
    }
}

/// In-memory backend for tests and offline use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Records) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Three regular cycles of sample check-ins ending shortly before `today`,
    /// plus a handful of unviewed insights.
    pub fn with_demo_data(today: NaiveDate) -> Self {
        let mut records = Records {
            entries: demo_entries(today),
            profile: Some(UserProfile::new(today - Duration::days(90))),
            prediction: None,
            insights: Vec::new(),
        };
        for insight in demo_insights() {
            records.create_insight(insight);
        }
        debug!(
            entries = records.entries.len(),
            insights = records.insights.len(),
            "seeded demo data"
        );
        Self::from_records(records)
    }

    pub fn snapshot(&self) -> Result<Records, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

fn demo_entries(today: NaiveDate) -> Vec<CycleEntry> {
    const CYCLE_STARTS: [i64; 3] = [-75, -47, -19];
    const FLOWS: [FlowIntensity; 5] = [
        FlowIntensity::Medium,
        FlowIntensity::Heavy,
        FlowIntensity::Heavy,
        FlowIntensity::Medium,
        FlowIntensity::Light,
    ];

    let mut entries = Vec::new();
    for start in CYCLE_STARTS {
        for (offset, flow) in FLOWS.iter().enumerate() {
            let first = offset == 0;
            let new = NewEntry {
                date: today + Duration::days(start + offset as i64),
                flow_intensity: *flow,
                mood: if first { Mood::Tired } else { Mood::Neutral },
                symptoms: if first {
                    vec![Symptom::Cramps, Symptom::Fatigue]
                } else if *flow == FlowIntensity::Heavy {
                    vec![Symptom::Cramps]
                } else {
                    Vec::new()
                },
                notes: String::new(),
            };
            entries.push(new.into_entry(Uuid::new_v4(), Utc::now()));
        }
        // a mid-cycle check-in without flow
        entries.push(
            NewEntry {
                date: today + Duration::days(start + 14),
                flow_intensity: FlowIntensity::None,
                mood: Mood::Energetic,
                symptoms: vec![Symptom::Bloating],
                notes: String::new(),
            }
            .into_entry(Uuid::new_v4(), Utc::now()),
        );
    }
    entries
}

fn demo_insights() -> Vec<NewInsight> {
    let note = |kind, category, phase, priority, message: &str| NewInsight {
        kind,
        category,
        message: message.to_string(),
        phase,
        priority,
    };
    vec![
        note(
            InsightKind::Tip,
            InsightCategory::Nutrition,
            Some(CurrentPhase::Menstrual),
            Priority::Medium,
            "Iron-rich foods like spinach and lentils help replace what your period takes.",
        ),
        note(
            InsightKind::Tip,
            InsightCategory::Exercise,
            Some(CurrentPhase::Follicular),
            Priority::Low,
            "Energy tends to rise after your period, a good time for harder workouts.",
        ),
        note(
            InsightKind::Pattern,
            InsightCategory::Symptom,
            None,
            Priority::Medium,
            "Cramps show up on the first day of each of your logged cycles.",
        ),
        note(
            InsightKind::Alert,
            InsightCategory::Mood,
            Some(CurrentPhase::Luteal),
            Priority::High,
            "Your period is due within a week. Plan some rest if you can.",
        ),
    ]
}

impl EntryStore for MemoryStore {
    fn all(&self) -> Result<Vec<CycleEntry>, StoreError> {
        Ok(self.lock()?.entries_newest_first())
    }

    fn get(&self, id: Uuid) -> Result<Option<CycleEntry>, StoreError> {
        Ok(self.lock()?.entries.iter().find(|e| e.id == id).cloned())
    }

    fn by_date(&self, date: NaiveDate) -> Result<Option<CycleEntry>, StoreError> {
        Ok(self.lock()?.entries.iter().find(|e| e.date == date).cloned())
    }

    fn create(&self, entry: NewEntry) -> Result<CycleEntry, StoreError> {
        Ok(self.lock()?.create_entry(entry))
    }

    fn update(&self, id: Uuid, update: EntryUpdate) -> Result<CycleEntry, StoreError> {
        self.lock()?.update_entry(id, update)
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock()?.delete_entry(id))
    }
}

impl ProfileStore for MemoryStore {
    fn profile(&self) -> Result<UserProfile, StoreError> {
        Ok(*self.lock()?.profile_or_default())
    }

    fn apply_update(&self, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
        let mut records = self.lock()?;
        let profile = records.profile_or_default();
        update.apply_to(profile);
        Ok(*profile)
    }

    fn update_preferences(&self, update: PreferencesUpdate) -> Result<UserProfile, StoreError> {
        let mut records = self.lock()?;
        let profile = records.profile_or_default();
        update.apply_to(&mut profile.preferences);
        Ok(*profile)
    }
}

impl PredictionStore for MemoryStore {
    fn current(&self) -> Result<Option<CyclePrediction>, StoreError> {
        Ok(self.lock()?.prediction)
    }

    fn replace(&self, prediction: CyclePrediction) -> Result<CyclePrediction, StoreError> {
        self.lock()?.prediction = Some(prediction);
        Ok(prediction)
    }
}

impl InsightStore for MemoryStore {
    fn all_insights(&self) -> Result<Vec<Insight>, StoreError> {
        Ok(self.lock()?.insights_newest_first())
    }

    fn mark_insight_viewed(&self, id: Uuid) -> Result<Insight, StoreError> {
        self.lock()?.mark_insight_viewed(id)
    }

    fn create_insight(&self, insight: NewInsight) -> Result<Insight, StoreError> {
        Ok(self.lock()?.create_insight(insight))
    }
}
