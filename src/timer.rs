use crate::round::{AnswerOutcome, Round, RoundError, RoundPhase, RoundSnapshot};
use crate::types::TrickQuestion;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Drives a [`Round`] countdown on a background task.
///
/// The owning screen holds the timer; dropping it stops the countdown.
/// Every tick and every answer publishes a fresh [`RoundSnapshot`].
pub struct RoundTimer {
    round: Arc<RwLock<Round>>,
    updates: Arc<watch::Sender<RoundSnapshot>>,
    task: JoinHandle<()>,
}

impl RoundTimer {
    pub fn spawn(round: Round) -> Self {
        Self::spawn_with_period(round, TICK_PERIOD)
    }

    pub fn spawn_with_period(round: Round, period: Duration) -> Self {
        let (tx, _rx) = watch::channel(round.snapshot());
        let updates = Arc::new(tx);
        let round = Arc::new(RwLock::new(round));

        let task = {
            let round = round.clone();
            let updates = updates.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                // First tick completes immediately
                interval.tick().await;

                loop {
                    interval.tick().await;

                    let snapshot = {
                        let mut round = round.write().await;
                        round.tick();
                        round.snapshot()
                    };
                    let over = snapshot.phase == RoundPhase::GameOver;

                    // No subscribers is fine
                    let _ = updates.send(snapshot);

                    if over {
                        tracing::debug!("Round timer finished");
                        break;
                    }
                }
            })
        };

        Self {
            round,
            updates,
            task,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RoundSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> RoundSnapshot {
        self.round.read().await.snapshot()
    }

    pub async fn question(&self) -> TrickQuestion {
        self.round.read().await.question().clone()
    }

    pub async fn submit(&self, option: &str) -> Result<AnswerOutcome, RoundError> {
        let (outcome, snapshot) = {
            let mut round = self.round.write().await;
            let outcome = round.submit(option)?;
            (outcome, round.snapshot())
        };
        let _ = self.updates.send(snapshot);
        Ok(outcome)
    }

    pub async fn skip(&self) -> Result<TrickQuestion, RoundError> {
        let (question, snapshot) = {
            let mut round = self.round.write().await;
            let question = round.skip()?.clone();
            (question, round.snapshot())
        };
        let _ = self.updates.send(snapshot);
        Ok(question)
    }

    pub async fn pause(&self) {
        self.update(Round::pause).await;
    }

    pub async fn resume(&self) {
        self.update(Round::resume).await;
    }

    /// Wait until the countdown reaches zero
    pub async fn finished(&self) -> RoundSnapshot {
        let mut rx = self.updates.subscribe();
        let over = rx
            .wait_for(|s| s.phase == RoundPhase::GameOver)
            .await
            .map(|s| (*s).clone());
        match over {
            Ok(snapshot) => snapshot,
            // Sender lives as long as self, so this only happens mid-teardown
            Err(_) => self.snapshot().await,
        }
    }

    async fn update(&self, f: impl FnOnce(&mut Round)) {
        let snapshot = {
            let mut round = self.round.write().await;
            f(&mut *round);
            round.snapshot()
        };
        let _ = self.updates.send(snapshot);
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
