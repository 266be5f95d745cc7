use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sled::IVec;

use crate::econ::errors::EconError;
use crate::econ::types::{
    ActivityState, UserProfile, ACTIVITY_SCHEMA_VERSION, PROFILE_SCHEMA_VERSION,
};

const TREE_PROFILES: &str = "econ_profiles";
const TREE_ACTIVITY: &str = "econ_activity";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct ProfileStoreBuilder {
    path: PathBuf,
}

impl ProfileStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<ProfileStore, EconError> {
        ProfileStore::open(self.path)
    }
}

/// Sled-backed persistence for participant profiles and activity cooldowns.
///
/// Writes are flushed immediately; each record carries a schema version that
/// is checked on read. Per-participant write serialization is the caller's
/// responsibility (see [`crate::econ::locks::LockRegistry`]).
pub struct ProfileStore {
    _db: sled::Db,
    profiles: sled::Tree,
    activity: sled::Tree,
}

impl ProfileStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EconError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let profiles = db.open_tree(TREE_PROFILES)?;
        let activity = db.open_tree(TREE_ACTIVITY)?;
        Ok(Self {
            _db: db,
            profiles,
            activity,
        })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, EconError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, EconError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Insert or update a profile record.
    pub fn put_profile(&self, mut profile: UserProfile) -> Result<(), EconError> {
        profile.schema_version = PROFILE_SCHEMA_VERSION;
        profile.touch(Utc::now());
        let bytes = Self::serialize(&profile)?;
        self.profiles.insert(profile.id.as_bytes(), bytes)?;
        self.profiles.flush()?;
        Ok(())
    }

    /// Fetch a profile, or None when the participant has no record yet.
    pub fn try_get_profile(&self, id: &str) -> Result<Option<UserProfile>, EconError> {
        let Some(bytes) = self.profiles.get(id.as_bytes())? else {
            return Ok(None);
        };
        let record: UserProfile = Self::deserialize(bytes)?;
        if record.schema_version != PROFILE_SCHEMA_VERSION {
            return Err(EconError::SchemaMismatch {
                entity: "profile",
                expected: PROFILE_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(Some(record))
    }

    /// Fetch a profile, failing with `NotFound` when absent.
    pub fn get_profile(&self, id: &str) -> Result<UserProfile, EconError> {
        self.try_get_profile(id)?
            .ok_or_else(|| EconError::NotFound(format!("profile: {}", id)))
    }

    /// Get-or-create primitive: returns the stored profile with refreshed
    /// presentation strings, or persists and returns a fresh default record.
    /// Callers hold the participant's lock, making the upsert race-free.
    pub fn get_or_create_profile(
        &self,
        id: &str,
        display_name: &str,
        discriminator: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, EconError> {
        match self.try_get_profile(id)? {
            Some(mut profile) => {
                profile.refresh_identity(display_name, discriminator);
                Ok(profile)
            }
            None => {
                let profile = UserProfile::new(id, display_name, discriminator, now);
                self.put_profile(profile.clone())?;
                Ok(profile)
            }
        }
    }

    /// Insert or update an activity record.
    pub fn put_activity(&self, mut state: ActivityState) -> Result<(), EconError> {
        state.schema_version = ACTIVITY_SCHEMA_VERSION;
        let bytes = Self::serialize(&state)?;
        self.activity.insert(state.id.as_bytes(), bytes)?;
        self.activity.flush()?;
        Ok(())
    }

    /// Fetch the activity record for a participant, creating a default one
    /// (persisted) when absent.
    pub fn get_or_create_activity(&self, id: &str) -> Result<ActivityState, EconError> {
        let Some(bytes) = self.activity.get(id.as_bytes())? else {
            let state = ActivityState::new(id);
            self.put_activity(state.clone())?;
            return Ok(state);
        };
        let record: ActivityState = Self::deserialize(bytes)?;
        if record.schema_version != ACTIVITY_SCHEMA_VERSION {
            return Err(EconError::SchemaMismatch {
                entity: "activity",
                expected: ACTIVITY_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Full scan of all profiles, used by the leaderboard views.
    pub fn list_profiles(&self) -> Result<Vec<UserProfile>, EconError> {
        let mut records = Vec::new();
        for entry in self.profiles.iter() {
            let (_, bytes) = entry?;
            records.push(Self::deserialize::<UserProfile>(bytes)?);
        }
        Ok(records)
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::econ::types::ItemKind;
    use tempfile::TempDir;

    #[test]
    fn store_round_trip_profile() {
        let dir = TempDir::new().expect("tempdir");
        let store = ProfileStoreBuilder::new(dir.path()).open().expect("store");
        let mut profile = UserProfile::new("42", "Alice", "0001", Utc::now());
        profile.coins = 17;
        profile.add_item(ItemKind::Diamond, 2);
        store.put_profile(profile.clone()).expect("put");
        let fetched = store.get_profile("42").expect("get");
        assert_eq!(fetched.coins, 17);
        assert_eq!(fetched.item_count(ItemKind::Diamond), 2);
        assert_eq!(fetched.schema_version, PROFILE_SCHEMA_VERSION);
    }

    #[test]
    fn missing_profile_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = ProfileStoreBuilder::new(dir.path()).open().expect("store");
        assert!(store.try_get_profile("nobody").expect("try_get").is_none());
        assert!(matches!(
            store.get_profile("nobody"),
            Err(EconError::NotFound(_))
        ));
    }

    #[test]
    fn get_or_create_creates_exactly_one_record() {
        let dir = TempDir::new().expect("tempdir");
        let store = ProfileStoreBuilder::new(dir.path()).open().expect("store");
        let now = Utc::now();
        for _ in 0..3 {
            store
                .get_or_create_profile("42", "Alice", "0001", now)
                .expect("upsert");
        }
        assert_eq!(store.profile_count(), 1);
    }

    #[test]
    fn get_or_create_refreshes_presentation_strings() {
        let dir = TempDir::new().expect("tempdir");
        let store = ProfileStoreBuilder::new(dir.path()).open().expect("store");
        let now = Utc::now();
        let first = store
            .get_or_create_profile("42", "Alice", "0001", now)
            .expect("create");
        store.put_profile(first).expect("put");
        let renamed = store
            .get_or_create_profile("42", "Alicia", "0002", now)
            .expect("refresh");
        assert_eq!(renamed.tag(), "Alicia#0002");
    }

    #[test]
    fn activity_upserts_lazily() {
        let dir = TempDir::new().expect("tempdir");
        let store = ProfileStoreBuilder::new(dir.path()).open().expect("store");
        let state = store.get_or_create_activity("42").expect("create");
        assert_eq!(state.total_mined, 0);
        let mut state = store.get_or_create_activity("42").expect("fetch");
        state.stamp(crate::econ::types::GatherKind::Mine, Utc::now());
        store.put_activity(state).expect("put");
        let state = store.get_or_create_activity("42").expect("refetch");
        assert_eq!(state.total_mined, 1);
        assert!(state.last_mined.is_some());
    }
}
