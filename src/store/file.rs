//! Profile store persisted as a single JSON document on disk.
//!
//! The file maps profile ids to loosely typed profile documents, the same shape
//! the hosted store returns. It is read once on open and rewritten through a
//! temporary file on every merge.

use super::{rank_profiles, Profile, ProfileStore, ProfileUpdate, StoreError, StoreResult};
use crate::types::ProfileId;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonFileProfileStore {
    path: PathBuf,
    profiles: RwLock<BTreeMap<ProfileId, Profile>>,
}

impl JsonFileProfileStore {
    /// Load profiles from `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let profiles = match tokio::fs::read(&path).await {
            Ok(bytes) => parse_profiles(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No profile file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Loaded {} profiles from {}", profiles.len(), path.display());
        Ok(Self {
            path,
            profiles: RwLock::new(profiles),
        })
    }

    async fn persist(&self, profiles: &BTreeMap<ProfileId, Profile>) -> StoreResult<()> {
        let doc: Map<String, Value> = profiles
            .iter()
            .map(|(id, p)| (id.clone(), Value::Object(p.to_document())))
            .collect();
        let bytes = serde_json::to_vec_pretty(&doc)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn parse_profiles(bytes: &[u8]) -> StoreResult<BTreeMap<ProfileId, Profile>> {
    let doc: Map<String, Value> = serde_json::from_slice(bytes)?;
    let mut profiles = BTreeMap::new();
    for (id, value) in doc {
        match value {
            Value::Object(fields) => {
                profiles.insert(id.clone(), Profile::from_document(id, &fields));
            }
            _ => tracing::warn!("Skipping malformed profile document {}", id),
        }
    }
    Ok(profiles)
}

#[async_trait]
impl ProfileStore for JsonFileProfileStore {
    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn merge_profile(&self, id: &str, update: ProfileUpdate) -> StoreResult<Profile> {
        let mut profiles = self.profiles.write().await;

        let mut next = profiles.clone();
        let profile = next
            .entry(id.to_string())
            .or_insert_with(|| Profile::new(id));
        profile.apply(&update);
        let merged = profile.clone();

        // Only commit in memory once the file write went through
        self.persist(&next).await.map_err(|e| {
            tracing::warn!("Failed to persist profiles to {}: {}", self.path.display(), e);
            match e {
                StoreError::Io(io) => StoreError::Unavailable(io.to_string()),
                other => other,
            }
        })?;
        *profiles = next;

        Ok(merged)
    }

    async fn top_profiles(&self, field: &str, limit: usize) -> StoreResult<Vec<Profile>> {
        Ok(rank_profiles(
            self.profiles.read().await.values(),
            field,
            limit,
        ))
    }
}
