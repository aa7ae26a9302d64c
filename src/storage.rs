use chrono::NaiveDate;
use uuid::Uuid;

use crate::crypto;
use crate::models::{
    CycleEntry, CyclePrediction, EntryUpdate, Insight, NewEntry, NewInsight, PreferencesUpdate,
    ProfileUpdate, UserProfile,
};
use crate::phase::CurrentPhase;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data directory not found")]
    NoDataDir,
    #[error("entry {0} not found")]
    EntryNotFound(Uuid),
    #[error("insight {0} not found")]
    InsightNotFound(Uuid),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Dated check-in records.
pub trait EntryStore {
    /// Every entry, in no guaranteed order.
    fn all(&self) -> Result<Vec<CycleEntry>, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<CycleEntry>, StoreError>;

    fn by_date(&self, date: NaiveDate) -> Result<Option<CycleEntry>, StoreError>;

    /// Entries dated within `start..=end`, ascending.
    fn in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CycleEntry>, StoreError> {
        let mut entries: Vec<CycleEntry> = self
            .all()?
            .into_iter()
            .filter(|e| e.date >= start && e.date <= end)
            .collect();
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }

    fn create(&self, entry: NewEntry) -> Result<CycleEntry, StoreError>;

    fn update(&self, id: Uuid, update: EntryUpdate) -> Result<CycleEntry, StoreError>;

    /// Returns false when no entry had that id.
    fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// The singleton user profile.
pub trait ProfileStore {
    /// Creates and stores a default profile on first access.
    fn profile(&self) -> Result<UserProfile, StoreError>;

    fn apply_update(&self, update: ProfileUpdate) -> Result<UserProfile, StoreError>;

    fn update_preferences(&self, update: PreferencesUpdate) -> Result<UserProfile, StoreError>;
}

/// The singleton current prediction.
pub trait PredictionStore {
    fn current(&self) -> Result<Option<CyclePrediction>, StoreError>;

    /// Create if absent, otherwise overwrite.
    fn replace(&self, prediction: CyclePrediction) -> Result<CyclePrediction, StoreError>;
}

/// Health notes for the insights feed.
pub trait InsightStore {
    /// Every insight, newest first.
    fn all_insights(&self) -> Result<Vec<Insight>, StoreError>;

    /// Insights tagged with `phase`, newest first. Untagged ones are not included.
    fn insights_in_phase(&self, phase: CurrentPhase) -> Result<Vec<Insight>, StoreError> {
        Ok(self
            .all_insights()?
            .into_iter()
            .filter(|i| i.phase == Some(phase))
            .collect())
    }

    /// Not yet viewed, newest first.
    fn unviewed_insights(&self) -> Result<Vec<Insight>, StoreError> {
        Ok(self
            .all_insights()?
            .into_iter()
            .filter(|i| !i.viewed)
            .collect())
    }

    fn mark_insight_viewed(&self, id: Uuid) -> Result<Insight, StoreError>;

    fn create_insight(&self, insight: NewInsight) -> Result<Insight, StoreError>;
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
