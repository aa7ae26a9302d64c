use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::crypto::{self, VaultKey};
use crate::memory::Records;
use crate::models::{
    CycleEntry, CyclePrediction, EntryUpdate, Insight, NewEntry, NewInsight, PreferencesUpdate,
    ProfileUpdate, UserProfile,
};
use crate::storage::{EntryStore, InsightStore, PredictionStore, ProfileStore, StoreError};

const VAULT_FILE: &str = "vault.flowcast";

/// Default vault location under the platform's local data directory.
pub fn default_path() -> Result<PathBuf, StoreError> {
    Ok(dirs::data_local_dir()
        .ok_or(StoreError::NoDataDir)?
        .join("flowcast")
        .join(VAULT_FILE))
}

/// Vault file inside a given data directory.
pub fn path_in(data_dir: &Path) -> PathBuf {
    data_dir.join(VAULT_FILE)
}

/// Encrypted single-file backend.
///
/// Every operation decrypts the whole vault, applies the change and writes it
/// back through a temp file and a rename, so a failed write leaves the old
/// vault in place.
#[derive(Debug)]
pub struct VaultStore {
    path: PathBuf,
    key: VaultKey,
    // serialises read-modify-write cycles
    guard: Mutex<()>,
}

impl VaultStore {
    /// Open an existing vault, or prepare a new one at `path`.
    /// A wrong passphrase fails here rather than on first use.
    pub fn open(path: impl Into<PathBuf>, passphrase: &str) -> Result<Self, StoreError> {
        let path = path.into();
        let key = if path.exists() {
            let sealed = fs::read(&path)?;
            let key = VaultKey::for_sealed(passphrase, &sealed)?;
            let mut plaintext = crypto::open(&key, &sealed)?;
            plaintext.zeroize();
            debug!(path = %path.display(), "unlocked vault");
            key
        } else {
            info!(path = %path.display(), "creating new vault");
            VaultKey::generate(passphrase)?
        };

        Ok(Self {
            path,
            key,
            guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the vault file permanently.
    pub fn wipe(self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "vault wiped");
        }
        Ok(())
    }

    fn load(&self) -> Result<Records, StoreError> {
        if !self.path.exists() {
            return Ok(Records::default());
        }
        let sealed = fs::read(&self.path)?;
        let mut plaintext = crypto::open(&self.key, &sealed)?;
        let records = serde_json::from_slice::<Records>(&plaintext);
        plaintext.zeroize();
        Ok(records?)
    }

    fn save(&self, records: &Records) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut json = serde_json::to_vec(records)?;
        let sealed = crypto::seal(&self.key, &json);
        json.zeroize();

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, sealed?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Records) -> T) -> Result<T, StoreError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(f(&self.load()?))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Records) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut records = self.load()?;
        let out = f(&mut records)?;
        self.save(&records)?;
        Ok(out)
    }
}

impl EntryStore for VaultStore {
    fn all(&self) -> Result<Vec<CycleEntry>, StoreError> {
        self.read(|r| r.entries_newest_first())
    }

    fn get(&self, id: Uuid) -> Result<Option<CycleEntry>, StoreError> {
        self.read(|r| r.entries.iter().find(|e| e.id == id).cloned())
    }

    fn by_date(&self, date: NaiveDate) -> Result<Option<CycleEntry>, StoreError> {
        self.read(|r| r.entries.iter().find(|e| e.date == date).cloned())
    }

    fn create(&self, entry: NewEntry) -> Result<CycleEntry, StoreError> {
        self.write(|r| Ok(r.create_entry(entry)))
    }

    fn update(&self, id: Uuid, update: EntryUpdate) -> Result<CycleEntry, StoreError> {
        self.write(|r| r.update_entry(id, update))
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.write(|r| Ok(r.delete_entry(id)))
    }
}

impl ProfileStore for VaultStore {
    fn profile(&self) -> Result<UserProfile, StoreError> {
        if let Some(profile) = self.read(|r| r.profile)? {
            return Ok(profile);
        }
        self.write(|r| Ok(*r.profile_or_default()))
    }

    fn apply_update(&self, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
        self.write(|r| {
            let profile = r.profile_or_default();
            update.apply_to(profile);
            Ok(*profile)
        })
    }

    fn update_preferences(&self, update: PreferencesUpdate) -> Result<UserProfile, StoreError> {
        self.write(|r| {
            let profile = r.profile_or_default();
            update.apply_to(&mut profile.preferences);
            Ok(*profile)
        })
    }
}

impl PredictionStore for VaultStore {
    fn current(&self) -> Result<Option<CyclePrediction>, StoreError> {
        self.read(|r| r.prediction)
    }

    fn replace(&self, prediction: CyclePrediction) -> Result<CyclePrediction, StoreError> {
        self.write(|r| {
            r.prediction = Some(prediction);
            Ok(prediction)
        })
    }
}

impl InsightStore for VaultStore {
    fn all_insights(&self) -> Result<Vec<Insight>, StoreError> {
        self.read(|r| r.insights_newest_first())
    }

    fn mark_insight_viewed(&self, id: Uuid) -> Result<Insight, StoreError> {
        self.write(|r| r.mark_insight_viewed(id))
    }

    fn create_insight(&self, insight: NewInsight) -> Result<Insight, StoreError> {
        self.write(|r| Ok(r.create_insight(insight)))
    }
}
