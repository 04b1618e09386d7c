//! Online multiplayer match over a shared session document.
//!
//! Each participant writes only its own `participants.<name>` fields; the store
//! resolves concurrent writes last-write-wins and pushes the full document to
//! every subscriber. No ordering or retry is layered on top.

use crate::round::{AnswerOutcome, Round, RoundError};
use crate::scoring::{self, Winners};
use crate::store::{ParticipantUpdate, SessionStore, StoreError, Subscription};
use crate::types::{GameMode, Session, SessionId, SessionStatus};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Session {0} is not accepting players")]
    NotJoinable(SessionId),

    #[error("Name {0} is already taken in this session")]
    NameTaken(String),

    #[error(transparent)]
    Round(#[from] RoundError),

    #[error("Match is not in progress")]
    NotInProgress,

    #[error("Online matches need an online round, got {0:?}")]
    NotOnlineRound(GameMode),
}

pub type MatchResult<T> = Result<T, MatchError>;

/// One participant's handle on an online match
pub struct OnlineMatch {
    store: Arc<dyn SessionStore>,
    session_id: SessionId,
    player: String,
    score: i64,
}

impl OnlineMatch {
    /// Create a new session with `player` as the only participant
    pub async fn host(store: Arc<dyn SessionStore>, player: &str) -> MatchResult<Self> {
        let session = store.create_session(&[player.to_string()]).await?;
        tracing::info!(session = %session.id, player, "Hosting online match");
        Ok(Self::attach(store, session.id, player))
    }

    /// Join a session that is still waiting for players
    pub async fn join(
        store: Arc<dyn SessionStore>,
        session_id: &str,
        player: &str,
    ) -> MatchResult<Self> {
        let session = store.get_session(session_id).await?;
        if session.status != SessionStatus::Waiting {
            return Err(MatchError::NotJoinable(session.id));
        }
        if session.participants.contains_key(player) {
            return Err(MatchError::NameTaken(player.to_string()));
        }

        store
            .update_participant(
                session_id,
                player,
                ParticipantUpdate {
                    score: Some(0),
                    ready: Some(false),
                },
            )
            .await?;
        tracing::info!(session = session_id, player, "Joined online match");
        Ok(Self::attach(store, session.id, player))
    }

    fn attach(store: Arc<dyn SessionStore>, session_id: SessionId, player: &str) -> Self {
        Self {
            store,
            session_id,
            player: player.to_string(),
            score: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    /// Score as last published by this participant
    pub fn score(&self) -> i64 {
        self.score
    }

    pub async fn session(&self) -> MatchResult<Session> {
        Ok(self.store.get_session(&self.session_id).await?)
    }

    /// Flip this participant's readiness flag.
    ///
    /// When every participant is ready the match starts.
    pub async fn set_ready(&self, ready: bool) -> MatchResult<Session> {
        let session = self
            .store
            .update_participant(&self.session_id, &self.player, ParticipantUpdate::ready(ready))
            .await?;

        if session.status == SessionStatus::Waiting && session.all_ready() {
            tracing::info!(session = %self.session_id, "All players ready, starting match");
            return Ok(self
                .store
                .set_status(&self.session_id, SessionStatus::InProgress)
                .await?);
        }
        Ok(session)
    }

    /// Answer the round's current question and publish the round's score.
    ///
    /// Scoring is applied by the round alone, so the shared document always
    /// mirrors what the player's screen shows.
    pub async fn answer(&mut self, round: &mut Round, option: &str) -> MatchResult<AnswerOutcome> {
        if round.mode() != GameMode::Online {
            return Err(MatchError::NotOnlineRound(round.mode()));
        }
        let session = self.session().await?;
        if session.status != SessionStatus::InProgress {
            return Err(MatchError::NotInProgress);
        }

        let outcome = round.submit(option)?;
        self.store
            .update_participant(
                &self.session_id,
                &self.player,
                ParticipantUpdate::score(outcome.score),
            )
            .await?;
        self.score = outcome.score;
        Ok(outcome)
    }

    /// Close the match and report who won
    pub async fn finish(&self) -> MatchResult<Winners> {
        let session = self
            .store
            .set_status(&self.session_id, SessionStatus::Finished)
            .await?;
        let winners = scoring::winners(session.scores());
        tracing::info!(session = %self.session_id, winners = ?winners.names, "Match finished");
        Ok(winners)
    }

    pub async fn winners(&self) -> MatchResult<Winners> {
        let session = self.session().await?;
        Ok(scoring::winners(session.scores()))
    }

    /// Every change to the shared session, until cancelled
    pub async fn watch(&self) -> MatchResult<Subscription> {
        Ok(self.store.subscribe(&self.session_id).await?)
    }
}
