//! External collaborators: the profile/score store and the realtime session store
//!
//! Both are hosted services in production. The traits here describe only what
//! the game consumes from them, and the in-process implementations let the rest
//! of the crate run and be tested without a backend.

mod file;
mod memory;

use crate::types::{Participant, PlayerName, ProfileId, Session, SessionId, SessionStatus};
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

pub use file::JsonFileProfileStore;
pub use memory::{MemoryProfileStore, MemorySessionStore};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to an external store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document keys that hold profile metadata rather than score fields
pub const RESERVED_FIELDS: [&str; 2] = ["username", "updated_at"];

/// A player profile as read from the profile store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub username: Option<String>,
    /// Integer score fields by name
    #[serde(default)]
    pub fields: BTreeMap<String, i64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Profile {
    pub fn new(id: impl Into<ProfileId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<i64> {
        self.fields.get(name).copied()
    }

    /// Username if set, otherwise the profile id
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.id)
    }

    /// Write the fields present in `update`, keeping everything else
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(username) = &update.username {
            self.username = Some(username.clone());
        }
        for (name, value) in &update.fields {
            if RESERVED_FIELDS.contains(&name.as_str()) {
                tracing::warn!(profile = %self.id, field = %name, "Ignoring write to reserved field");
                continue;
            }
            self.fields.insert(name.clone(), *value);
        }
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Read a loosely typed document.
    ///
    /// `username` and `updated_at` are taken when they are strings. Every other
    /// key becomes a score field if it holds an integer, a float (truncated) or
    /// a numeric string; anything else is skipped.
    pub fn from_document(id: impl Into<ProfileId>, doc: &Map<String, Value>) -> Self {
        let mut profile = Profile::new(id);
        for (key, value) in doc {
            match key.as_str() {
                "username" => profile.username = value.as_str().map(str::to_string),
                "updated_at" => profile.updated_at = value.as_str().map(str::to_string),
                _ => match coerce_int(value) {
                    Some(n) => {
                        profile.fields.insert(key.clone(), n);
                    }
                    None => {
                        tracing::debug!(profile = %profile.id, field = %key, "Skipping non-integer field");
                    }
                },
            }
        }
        profile
    }

    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        if let Some(username) = &self.username {
            doc.insert("username".to_string(), Value::from(username.clone()));
        }
        for (name, value) in &self.fields {
            doc.insert(name.clone(), Value::from(*value));
        }
        if let Some(updated_at) = &self.updated_at {
            doc.insert("updated_at".to_string(), Value::from(updated_at.clone()));
        }
        doc
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Partial profile write. Only the fields set here are touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub fields: BTreeMap<String, i64>,
}

impl ProfileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: i64) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// Profiles holding `field`, highest first, at most `limit` of them
pub(crate) fn rank_profiles<'a>(
    profiles: impl Iterator<Item = &'a Profile>,
    field: &str,
    limit: usize,
) -> Vec<Profile> {
    let mut ranked: Vec<Profile> = profiles
        .filter(|p| p.fields.contains_key(field))
        .cloned()
        .collect();
    // Stable on id so equal scores list in a predictable order
    ranked.sort_by(|a, b| {
        b.field(field)
            .cmp(&a.field(field))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(limit);
    ranked
}

/// Key/value profile store
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>>;

    /// Merge fields into a profile, creating it if missing
    async fn merge_profile(&self, id: &str, update: ProfileUpdate) -> StoreResult<Profile>;

    /// Top `limit` profiles by an integer field, descending
    async fn top_profiles(&self, field: &str, limit: usize) -> StoreResult<Vec<Profile>>;
}

/// Nested participant write. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantUpdate {
    pub score: Option<i64>,
    pub ready: Option<bool>,
}

impl ParticipantUpdate {
    pub fn score(score: i64) -> Self {
        Self {
            score: Some(score),
            ready: None,
        }
    }

    pub fn ready(ready: bool) -> Self {
        Self {
            score: None,
            ready: Some(ready),
        }
    }

    pub fn apply(&self, participant: &mut Participant) {
        if let Some(score) = self.score {
            participant.score = score;
        }
        if let Some(ready) = self.ready {
            participant.ready = ready;
        }
    }
}

/// Realtime shared document store for online matches
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session in `Waiting` under a generated id
    async fn create_session(&self, participants: &[PlayerName]) -> StoreResult<Session>;

    async fn get_session(&self, id: &str) -> StoreResult<Session>;

    async fn set_status(&self, id: &str, status: SessionStatus) -> StoreResult<Session>;

    /// Last-write-wins update of `participants.<name>`; unknown names are added
    async fn update_participant(
        &self,
        id: &str,
        name: &str,
        update: ParticipantUpdate,
    ) -> StoreResult<Session>;

    /// Observe every mutation of a session
    async fn subscribe(&self, id: &str) -> StoreResult<Subscription>;
}

/// Cancellable feed of session documents, one per mutation
pub struct Subscription {
    session_id: SessionId,
    rx: Option<broadcast::Receiver<Session>>,
}

impl Subscription {
    pub fn new(session_id: SessionId, rx: broadcast::Receiver<Session>) -> Self {
        Self {
            session_id,
            rx: Some(rx),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.is_none()
    }

    /// Next document after a mutation, or `None` once cancelled or closed
    pub async fn next(&mut self) -> Option<Session> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(session) => return Some(session),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        session = %self.session_id,
                        skipped,
                        "Subscriber lagged, skipping to newer updates"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    pub fn cancel(&mut self) {
        if self.rx.take().is_some() {
            tracing::debug!(session = %self.session_id, "Subscription cancelled");
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Session> {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|session| (session, sub))
        })
    }
}
