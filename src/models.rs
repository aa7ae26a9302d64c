use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::phase::CurrentPhase;

/// Default cycle length used until at least two cycles have been observed.
pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
/// Default period length for a fresh profile.
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowIntensity {
    #[default]
    None,
    Light,
    Medium,
    Heavy,
}

impl FlowIntensity {
    /// Any logged flow marks the day as a period day.
    pub fn is_period(self) -> bool {
        self != FlowIntensity::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowIntensity::None => "none",
            FlowIntensity::Light => "light",
            FlowIntensity::Medium => "medium",
            FlowIntensity::Heavy => "heavy",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    #[default]
    Neutral,
    Sad,
    Anxious,
    Energetic,
    Tired,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Anxious => "anxious",
            Mood::Energetic => "energetic",
            Mood::Tired => "tired",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Cramps,
    Headache,
    Fatigue,
    Bloating,
    TenderBreasts,
    Acne,
    Backache,
    Nausea,
}

impl Symptom {
    pub fn as_str(self) -> &'static str {
        match self {
            Symptom::Cramps => "cramps",
            Symptom::Headache => "headache",
            Symptom::Fatigue => "fatigue",
            Symptom::Bloating => "bloating",
            Symptom::TenderBreasts => "tender_breasts",
            Symptom::Acne => "acne",
            Symptom::Backache => "backache",
            Symptom::Nausea => "nausea",
        }
    }

    /// Human readable label, e.g. "Tender Breasts".
    pub fn label(self) -> &'static str {
        match self {
            Symptom::Cramps => "Cramps",
            Symptom::Headache => "Headache",
            Symptom::Fatigue => "Fatigue",
            Symptom::Bloating => "Bloating",
            Symptom::TenderBreasts => "Tender Breasts",
            Symptom::Acne => "Acne",
            Symptom::Backache => "Backache",
            Symptom::Nausea => "Nausea",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    #[default]
    Tip,
    Alert,
    Pattern,
}

impl InsightKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InsightKind::Tip => "tip",
            InsightKind::Alert => "alert",
            InsightKind::Pattern => "pattern",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Nutrition,
    Exercise,
    Mood,
    Symptom,
    #[default]
    General,
}

impl InsightCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            InsightCategory::Nutrition => "nutrition",
            InsightCategory::Exercise => "exercise",
            InsightCategory::Mood => "mood",
            InsightCategory::Symptom => "symptom",
            InsightCategory::General => "general",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! impl_enum_str {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_enum_str!(
    FlowIntensity,
    "flow intensity",
    [
        FlowIntensity::None,
        FlowIntensity::Light,
        FlowIntensity::Medium,
        FlowIntensity::Heavy,
    ]
);

impl_enum_str!(
    Mood,
    "mood",
    [
        Mood::Happy,
        Mood::Neutral,
        Mood::Sad,
        Mood::Anxious,
        Mood::Energetic,
        Mood::Tired,
    ]
);

impl_enum_str!(
    Symptom,
    "symptom",
    [
        Symptom::Cramps,
        Symptom::Headache,
        Symptom::Fatigue,
        Symptom::Bloating,
        Symptom::TenderBreasts,
        Symptom::Acne,
        Symptom::Backache,
        Symptom::Nausea,
    ]
);

impl_enum_str!(
    InsightKind,
    "insight kind",
    [InsightKind::Tip, InsightKind::Alert, InsightKind::Pattern]
);

impl_enum_str!(
    InsightCategory,
    "insight category",
    [
        InsightCategory::Nutrition,
        InsightCategory::Exercise,
        InsightCategory::Mood,
        InsightCategory::Symptom,
        InsightCategory::General,
    ]
);

impl_enum_str!(
    Priority,
    "priority",
    [Priority::Low, Priority::Medium, Priority::High]
);

/// One logged day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub flow_intensity: FlowIntensity,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub notes: String,
    pub logged_at: DateTime<Utc>,
}

impl CycleEntry {
    pub fn is_period(&self) -> bool {
        self.flow_intensity.is_period()
    }
}

/// Payload for creating an entry; the store assigns id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub flow_intensity: FlowIntensity,
    pub mood: Mood,
    pub symptoms: Vec<Symptom>,
    pub notes: String,
}

impl NewEntry {
    pub fn into_entry(self, id: Uuid, logged_at: DateTime<Utc>) -> CycleEntry {
        CycleEntry {
            id,
            date: self.date,
            flow_intensity: self.flow_intensity,
            mood: self.mood,
            symptoms: self.symptoms,
            notes: self.notes,
            logged_at,
        }
    }
}

/// Partial entry update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntryUpdate {
    pub date: Option<NaiveDate>,
    pub flow_intensity: Option<FlowIntensity>,
    pub mood: Option<Mood>,
    pub symptoms: Option<Vec<Symptom>>,
    pub notes: Option<String>,
}

impl EntryUpdate {
    pub fn apply_to(self, entry: &mut CycleEntry, logged_at: DateTime<Utc>) {
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(flow) = self.flow_intensity {
            entry.flow_intensity = flow;
        }
        if let Some(mood) = self.mood {
            entry.mood = mood;
        }
        if let Some(symptoms) = self.symptoms {
            entry.symptoms = symptoms;
        }
        if let Some(notes) = self.notes {
            entry.notes = notes;
        }
        entry.logged_at = logged_at;
    }
}

impl From<NewEntry> for EntryUpdate {
    fn from(new: NewEntry) -> Self {
        Self {
            date: Some(new.date),
            flow_intensity: Some(new.flow_intensity),
            mood: Some(new.mood),
            symptoms: Some(new.symptoms),
            notes: Some(new.notes),
        }
    }
}

/// A maximal run of period days, ascending by date.
///
/// Only built by segmentation, which never produces an empty run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Cycle {
    start_date: NaiveDate,
    days: Vec<CycleEntry>,
}

impl Cycle {
    /// `None` for an empty run.
    pub(crate) fn from_days(days: Vec<CycleEntry>) -> Option<Self> {
        let start_date = days.first()?.date;
        Some(Self { start_date, days })
    }

    pub fn days(&self) -> &[CycleEntry] {
        &self.days
    }

    /// Number of logged period days, not the calendar span.
    pub fn length(&self) -> usize {
        self.days.len()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }
}

/// The single current prediction. Replaced wholesale on every recalculation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CyclePrediction {
    pub predicted_period_start: NaiveDate,
    pub predicted_period_end: NaiveDate,
    pub ovulation_day: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    /// Percentage, 0-100.
    pub confidence: u32,
    pub based_on_cycles: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    pub notifications: bool,
    pub reminders: bool,
    pub insights: bool,
    pub privacy_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: true,
            reminders: true,
            insights: true,
            privacy_mode: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferencesUpdate {
    pub notifications: Option<bool>,
    pub reminders: Option<bool>,
    pub insights: Option<bool>,
    pub privacy_mode: Option<bool>,
}

impl PreferencesUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(self, prefs: &mut Preferences) {
        if let Some(v) = self.notifications {
            prefs.notifications = v;
        }
        if let Some(v) = self.reminders {
            prefs.reminders = v;
        }
        if let Some(v) = self.insights {
            prefs.insights = v;
        }
        if let Some(v) = self.privacy_mode {
            prefs.privacy_mode = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub average_cycle_length: i64,
    pub average_period_length: i64,
    pub last_period_start: NaiveDate,
    pub tracking_since: NaiveDate,
    #[serde(default)]
    pub preferences: Preferences,
}

impl UserProfile {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            average_cycle_length: DEFAULT_CYCLE_LENGTH,
            average_period_length: DEFAULT_PERIOD_LENGTH,
            last_period_start: today,
            tracking_since: today,
            preferences: Preferences::default(),
        }
    }
}

/// Partial profile update. `tracking_since` and preferences are not reachable from here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub average_cycle_length: Option<i64>,
    pub average_period_length: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
}

impl ProfileUpdate {
    pub fn apply_to(self, profile: &mut UserProfile) {
        if let Some(v) = self.average_cycle_length {
            profile.average_cycle_length = v;
        }
        if let Some(v) = self.average_period_length {
            profile.average_period_length = v;
        }
        if let Some(v) = self.last_period_start {
            profile.last_period_start = v;
        }
    }
}

/// A short health note shown on the insights feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub id: Uuid,
    #[serde(default)]
    pub kind: InsightKind,
    #[serde(default)]
    pub category: InsightCategory,
    pub message: String,
    /// Phase the note applies to; `None` applies to every phase.
    #[serde(default)]
    pub phase: Option<CurrentPhase>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    pub fn applies_to(&self, phase: CurrentPhase) -> bool {
        self.phase.is_none() || self.phase == Some(phase)
    }
}

/// Payload for creating an insight. New insights start unviewed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInsight {
    pub kind: InsightKind,
    pub category: InsightCategory,
    pub message: String,
    pub phase: Option<CurrentPhase>,
    pub priority: Priority,
}

impl NewInsight {
    pub fn into_insight(self, id: Uuid, created_at: DateTime<Utc>) -> Insight {
        Insight {
            id,
            kind: self.kind,
            category: self.category,
            message: self.message,
            phase: self.phase,
            priority: self.priority,
            viewed: false,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleStats {
    pub total_cycles: usize,
    pub average_cycle_length: i64,
    pub average_period_length: i64,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_period_start: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enums_at_the_boundary() {
        assert_eq!("Heavy".parse::<FlowIntensity>(), Ok(FlowIntensity::Heavy));
        assert_eq!("tender breasts".parse::<Symptom>(), Ok(Symptom::TenderBreasts));
        assert_eq!(" tired ".parse::<Mood>(), Ok(Mood::Tired));
        let err = "spotting".parse::<FlowIntensity>().unwrap_err();
        assert_eq!(err.kind, "flow intensity");
    }

    #[test]
    fn missing_flow_deserializes_as_none() {
        let json = r#"{
            "id": "6f1c1f9e-8f57-4a43-9f0e-0e6d4f7f8a11",
            "date": "2024-01-01",
            "logged_at": "2024-01-01T08:00:00Z"
        }"#;
        let entry: CycleEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.flow_intensity, FlowIntensity::None);
        assert_eq!(entry.mood, Mood::Neutral);
        assert!(!entry.is_period());
    }

    #[test]
    fn profile_update_leaves_other_fields() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut profile = UserProfile::new(day);
        profile.preferences.privacy_mode = true;
        ProfileUpdate {
            average_cycle_length: Some(30),
            ..Default::default()
        }
        .apply_to(&mut profile);
        assert_eq!(profile.average_cycle_length, 30);
        assert_eq!(profile.average_period_length, DEFAULT_PERIOD_LENGTH);
        assert_eq!(profile.tracking_since, day);
        assert!(profile.preferences.privacy_mode);
    }

    #[test]
    fn new_insight_starts_unviewed() {
        let insight = NewInsight {
            kind: InsightKind::Alert,
            category: InsightCategory::Symptom,
            message: "Cramps logged three days running".into(),
            phase: Some(CurrentPhase::Menstrual),
            priority: Priority::High,
        }
        .into_insight(Uuid::new_v4(), Utc::now());
        assert!(!insight.viewed);
        assert!(insight.applies_to(CurrentPhase::Menstrual));
        assert!(!insight.applies_to(CurrentPhase::Luteal));
    }

    #[test]
    fn insight_fields_default_when_missing() {
        let json = r#"{
            "id": "6f1c1f9e-8f57-4a43-9f0e-0e6d4f7f8a11",
            "message": "Stay hydrated",
            "created_at": "2024-01-01T08:00:00Z"
        }"#;
        let insight: Insight = serde_json::from_str(json).unwrap();
        assert_eq!(insight.kind, InsightKind::Tip);
        assert_eq!(insight.category, InsightCategory::General);
        assert_eq!(insight.priority, Priority::Medium);
        assert_eq!(insight.phase, None);
        assert!(insight.applies_to(CurrentPhase::Follicular));
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(InsightCategory::Nutrition.to_string(), "nutrition");
    }
}
