use crate::question::QuestionEngine;
use crate::types::{GameMode, TrickQuestion};
use serde::Serialize;

/// Points awarded or taken per answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoringPolicy {
    pub correct: i64,
    pub incorrect: i64,
}

impl ScoringPolicy {
    pub fn delta(&self, correct: bool) -> i64 {
        if correct {
            self.correct
        } else {
            self.incorrect
        }
    }
}

impl GameMode {
    /// Online play penalizes wrong answers, the offline modes do not
    pub fn scoring(self) -> ScoringPolicy {
        match self {
            GameMode::SinglePlayer | GameMode::LocalMultiplayer => ScoringPolicy {
                correct: 10,
                incorrect: 0,
            },
            GameMode::Online => ScoringPolicy {
                correct: 10,
                incorrect: -5,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Running,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("Round is over")]
    Over,

    #[error("Round is paused")]
    Paused,

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("Player {0} is already in this match")]
    DuplicatePlayer(String),
}

/// Result of one submitted answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub delta: i64,
    pub score: i64,
    pub correct_answer: String,
}

/// Point-in-time view of a round for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSnapshot {
    pub mode: GameMode,
    pub phase: RoundPhase,
    pub remaining_secs: u32,
    pub score: i64,
    pub answered: u32,
    pub correct: u32,
    pub question: TrickQuestion,
}

/// Countdown, score and current question for one player on one screen
pub struct Round {
    mode: GameMode,
    policy: ScoringPolicy,
    engine: QuestionEngine,
    question: TrickQuestion,
    remaining_secs: u32,
    score: i64,
    answered: u32,
    correct: u32,
    paused: bool,
    over: bool,
}

impl Round {
    /// Start a round. A zero duration is over before the first answer.
    pub fn new(mode: GameMode, duration_secs: u32, mut engine: QuestionEngine) -> Self {
        let question = engine.generate();
        Self {
            mode,
            policy: mode.scoring(),
            engine,
            question,
            remaining_secs: duration_secs,
            score: 0,
            answered: 0,
            correct: 0,
            paused: false,
            over: duration_secs == 0,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn question(&self) -> &TrickQuestion {
        &self.question
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn phase(&self) -> RoundPhase {
        if self.over {
            RoundPhase::GameOver
        } else if self.paused {
            RoundPhase::Paused
        } else {
            RoundPhase::Running
        }
    }

    /// One elapsed second. No-op while paused or over.
    pub fn tick(&mut self) -> RoundPhase {
        if !self.paused && !self.over {
            self.remaining_secs = self.remaining_secs.saturating_sub(1);
            if self.remaining_secs == 0 {
                self.over = true;
                tracing::debug!(mode = ?self.mode, score = self.score, "Round over");
            }
        }
        self.phase()
    }

    pub fn pause(&mut self) {
        if !self.over {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Score an answer to the current question and move on to the next one
    pub fn submit(&mut self, option: &str) -> Result<AnswerOutcome, RoundError> {
        self.ensure_playable()?;

        let correct = self.question.is_correct(option);
        let delta = self.policy.delta(correct);
        let correct_answer = self.question.correct_answer().to_string();

        self.score += delta;
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        self.question = self.engine.generate();

        Ok(AnswerOutcome {
            correct,
            delta,
            score: self.score,
            correct_answer,
        })
    }

    /// Replace the current question without scoring it
    pub fn skip(&mut self) -> Result<&TrickQuestion, RoundError> {
        self.ensure_playable()?;
        self.question = self.engine.generate();
        Ok(&self.question)
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            mode: self.mode,
            phase: self.phase(),
            remaining_secs: self.remaining_secs,
            score: self.score,
            answered: self.answered,
            correct: self.correct,
            question: self.question.clone(),
        }
    }

    fn ensure_playable(&self) -> Result<(), RoundError> {
        if self.over {
            return Err(RoundError::Over);
        }
        if self.paused {
            return Err(RoundError::Paused);
        }
        Ok(())
    }
}
