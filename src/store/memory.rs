use super::{
    rank_profiles, ParticipantUpdate, Profile, ProfileStore, ProfileUpdate, SessionStore,
    StoreError, StoreResult, Subscription,
};
use crate::types::{Participant, PlayerName, ProfileId, Session, SessionId, SessionStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

const SESSION_CHANNEL_CAPACITY: usize = 64;

/// In-process profile store
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<ProfileId, Profile>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn merge_profile(&self, id: &str, update: ProfileUpdate) -> StoreResult<Profile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(id.to_string())
            .or_insert_with(|| Profile::new(id));
        profile.apply(&update);
        Ok(profile.clone())
    }

    async fn top_profiles(&self, field: &str, limit: usize) -> StoreResult<Vec<Profile>> {
        Ok(rank_profiles(
            self.profiles.read().await.values(),
            field,
            limit,
        ))
    }
}

struct SessionEntry {
    session: Session,
    changes: broadcast::Sender<Session>,
}

/// In-process session store. Every mutation is pushed to subscribers.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate<F>(&self, id: &str, f: F) -> StoreResult<Session>
    where
        F: FnOnce(&mut Session) + Send,
    {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", id)))?;

        f(&mut entry.session);

        // No subscribers is fine
        let _ = entry.changes.send(entry.session.clone());
        Ok(entry.session.clone())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, participants: &[PlayerName]) -> StoreResult<Session> {
        let session = Session::new(ulid::Ulid::new().to_string(), participants);
        let (tx, _rx) = broadcast::channel(SESSION_CHANNEL_CAPACITY);

        self.sessions.write().await.insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                changes: tx,
            },
        );

        tracing::info!(session = %session.id, "Created session");
        Ok(session)
    }

    async fn get_session(&self, id: &str) -> StoreResult<Session> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|entry| entry.session.clone())
            .ok_or_else(|| StoreError::NotFound(format!("session {}", id)))
    }

    async fn set_status(&self, id: &str, status: SessionStatus) -> StoreResult<Session> {
        self.mutate(id, |session| session.status = status).await
    }

    async fn update_participant(
        &self,
        id: &str,
        name: &str,
        update: ParticipantUpdate,
    ) -> StoreResult<Session> {
        self.mutate(id, |session| {
            let participant = session
                .participants
                .entry(name.to_string())
                .or_insert_with(Participant::default);
            update.apply(participant);
        })
        .await
    }

    async fn subscribe(&self, id: &str) -> StoreResult<Subscription> {
        let sessions = self.sessions.read().await;
        let entry = sessions
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", id)))?;
        Ok(Subscription::new(id.to_string(), entry.changes.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_merge_creates_and_merges() {
        let store = MemoryProfileStore::new();
        assert!(store.get_profile("u1").await.unwrap().is_none());

        store
            .merge_profile("u1", ProfileUpdate::new().username("alice"))
            .await
            .unwrap();
        store
            .merge_profile("u1", ProfileUpdate::new().field("high_score", 50))
            .await
            .unwrap();

        let profile = store.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.username.as_deref(), Some("alice"));
        assert_eq!(profile.field("high_score"), Some(50));
    }

    #[tokio::test]
    async fn test_top_profiles() {
        let store = MemoryProfileStore::new();
        for (id, score) in [("a", 5), ("b", 50), ("c", 20)] {
            store
                .merge_profile(id, ProfileUpdate::new().field("high_score", score))
                .await
                .unwrap();
        }

        let top = store.top_profiles("high_score", 2).await.unwrap();
        let ids: Vec<_> = top.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = MemorySessionStore::new();
        let session = store
            .create_session(&["Alice".to_string()])
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Waiting);

        store
            .update_participant(&session.id, "Bob", ParticipantUpdate::ready(true))
            .await
            .unwrap();
        let updated = store
            .set_status(&session.id, SessionStatus::InProgress)
            .await
            .unwrap();

        assert_eq!(updated.status, SessionStatus::InProgress);
        assert!(updated.participants["Bob"].ready);
        assert_eq!(updated.participants["Alice"], Participant::default());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = MemorySessionStore::new();
        let result = store.set_status("missing", SessionStatus::Finished).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.subscribe("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_subscription_fires_on_every_mutation() {
        let store = MemorySessionStore::new();
        let session = store
            .create_session(&["Alice".to_string(), "Bob".to_string()])
            .await
            .unwrap();
        let mut sub = store.subscribe(&session.id).await.unwrap();

        store
            .update_participant(&session.id, "Alice", ParticipantUpdate::score(10))
            .await
            .unwrap();
        store
            .update_participant(&session.id, "Bob", ParticipantUpdate::score(20))
            .await
            .unwrap();

        let first = sub.next().await.unwrap();
        assert_eq!(first.participants["Alice"].score, 10);
        assert_eq!(first.participants["Bob"].score, 0);

        let second = sub.next().await.unwrap();
        assert_eq!(second.participants["Bob"].score, 20);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_still_gets_newest() {
        let store = MemorySessionStore::new();
        let session = store
            .create_session(&["Alice".to_string()])
            .await
            .unwrap();
        let mut sub = store.subscribe(&session.id).await.unwrap();

        // More writes than the channel holds before the subscriber reads any
        let writes = SESSION_CHANNEL_CAPACITY as i64 + 6;
        for score in 1..=writes {
            store
                .update_participant(&session.id, "Alice", ParticipantUpdate::score(score))
                .await
                .unwrap();
        }

        // The oldest documents were dropped, reading resumes at the oldest retained one
        let first = sub.next().await.unwrap();
        assert_eq!(
            first.participants["Alice"].score,
            writes - SESSION_CHANNEL_CAPACITY as i64 + 1
        );

        let mut last = first;
        let mut received = 1;
        while last.participants["Alice"].score < writes {
            last = sub.next().await.unwrap();
            received += 1;
        }
        assert_eq!(last.participants["Alice"].score, writes);
        assert_eq!(received, SESSION_CHANNEL_CAPACITY);
        assert!(!sub.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_subscription_stops() {
        let store = MemorySessionStore::new();
        let session = store.create_session(&[]).await.unwrap();
        let mut sub = store.subscribe(&session.id).await.unwrap();

        sub.cancel();
        store
            .set_status(&session.id, SessionStatus::Finished)
            .await
            .unwrap();

        assert!(sub.is_cancelled());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_subscription_as_stream() {
        let store = MemorySessionStore::new();
        let session = store.create_session(&[]).await.unwrap();
        let sub = store.subscribe(&session.id).await.unwrap();

        store
            .set_status(&session.id, SessionStatus::InProgress)
            .await
            .unwrap();
        store
            .set_status(&session.id, SessionStatus::Finished)
            .await
            .unwrap();

        let statuses: Vec<_> = sub
            .into_stream()
            .take(2)
            .map(|s| s.status)
            .collect()
            .await;
        assert_eq!(
            statuses,
            vec![SessionStatus::InProgress, SessionStatus::Finished]
        );
    }
}
