use crate::question::QuestionEngine;
use crate::round::{AnswerOutcome, Round, RoundError, RoundPhase};
use crate::scoring::{self, Winners};
use crate::types::{GameMode, TrickQuestion};

/// Several players on one device, each with their own questions and score,
/// all running off the same clock.
pub struct LocalMatch {
    players: Vec<(String, Round)>,
}

impl LocalMatch {
    /// Every name must be unique so each player's answers reach their own round
    pub fn new(names: &[&str], duration_secs: u32) -> Result<Self, RoundError> {
        Self::with_engines(
            names
                .iter()
                .map(|name| (name.to_string(), QuestionEngine::new()))
                .collect(),
            duration_secs,
        )
    }

    /// Build from pre-made engines, e.g. seeded ones for replays
    pub fn with_engines(
        players: Vec<(String, QuestionEngine)>,
        duration_secs: u32,
    ) -> Result<Self, RoundError> {
        let mut rounds: Vec<(String, Round)> = Vec::with_capacity(players.len());
        for (name, engine) in players {
            if rounds.iter().any(|(existing, _)| *existing == name) {
                return Err(RoundError::DuplicatePlayer(name));
            }
            rounds.push((
                name,
                Round::new(GameMode::LocalMultiplayer, duration_secs, engine),
            ));
        }
        Ok(Self { players: rounds })
    }

    pub fn player_names(&self) -> impl Iterator<Item = &str> {
        self.players.iter().map(|(name, _)| name.as_str())
    }

    pub fn question(&self, player: &str) -> Result<&TrickQuestion, RoundError> {
        Ok(self.round(player)?.question())
    }

    pub fn score(&self, player: &str) -> Result<i64, RoundError> {
        Ok(self.round(player)?.score())
    }

    pub fn submit(&mut self, player: &str, option: &str) -> Result<AnswerOutcome, RoundError> {
        self.round_mut(player)?.submit(option)
    }

    pub fn skip(&mut self, player: &str) -> Result<&TrickQuestion, RoundError> {
        self.round_mut(player)?.skip()
    }

    /// Advance every player's clock by one second
    pub fn tick(&mut self) -> RoundPhase {
        for (_, round) in &mut self.players {
            round.tick();
        }
        self.phase()
    }

    pub fn pause(&mut self) {
        for (_, round) in &mut self.players {
            round.pause();
        }
    }

    pub fn resume(&mut self) {
        for (_, round) in &mut self.players {
            round.resume();
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.players
            .first()
            .map(|(_, round)| round.phase())
            .unwrap_or(RoundPhase::GameOver)
    }

    pub fn is_over(&self) -> bool {
        self.phase() == RoundPhase::GameOver
    }

    pub fn winners(&self) -> Winners {
        scoring::winners(
            self.players
                .iter()
                .map(|(name, round)| (name.as_str(), round.score())),
        )
    }

    fn round(&self, player: &str) -> Result<&Round, RoundError> {
        self.players
            .iter()
            .find(|(name, _)| name == player)
            .map(|(_, round)| round)
            .ok_or_else(|| RoundError::UnknownPlayer(player.to_string()))
    }

    fn round_mut(&mut self, player: &str) -> Result<&mut Round, RoundError> {
        self.players
            .iter_mut()
            .find(|(name, _)| name == player)
            .map(|(_, round)| round)
            .ok_or_else(|| RoundError::UnknownPlayer(player.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_match(secs: u32) -> LocalMatch {
        LocalMatch::with_engines(
            vec![
                ("Alice".to_string(), QuestionEngine::seeded(1)),
                ("Bob".to_string(), QuestionEngine::seeded(2)),
            ],
            secs,
        )
        .unwrap()
    }

    fn answer_correctly(m: &mut LocalMatch, player: &str) {
        let answer = m.question(player).unwrap().correct_answer().to_string();
        assert!(m.submit(player, &answer).unwrap().correct);
    }

    #[test]
    fn test_scores_are_independent() {
        let mut m = seeded_match(10);
        answer_correctly(&mut m, "Alice");
        answer_correctly(&mut m, "Alice");
        answer_correctly(&mut m, "Bob");

        assert_eq!(m.score("Alice").unwrap(), 20);
        assert_eq!(m.score("Bob").unwrap(), 10);
    }

    #[test]
    fn test_tied_players_share_the_win() {
        let mut m = seeded_match(5);
        for _ in 0..3 {
            answer_correctly(&mut m, "Alice");
            answer_correctly(&mut m, "Bob");
        }
        while m.tick() != RoundPhase::GameOver {}

        let winners = m.winners();
        assert_eq!(winners.names, vec!["Alice", "Bob"]);
        assert_eq!(winners.score, Some(30));
    }

    #[test]
    fn test_unknown_player() {
        let mut m = seeded_match(5);
        assert_eq!(
            m.submit("Mallory", "7"),
            Err(RoundError::UnknownPlayer("Mallory".to_string()))
        );
    }

    #[test]
    fn test_shared_clock() {
        let mut m = seeded_match(2);
        m.pause();
        assert_eq!(m.tick(), RoundPhase::Paused);
        m.resume();
        assert_eq!(m.tick(), RoundPhase::Running);
        assert_eq!(m.tick(), RoundPhase::GameOver);
        assert!(m.is_over());

        let answer = m.question("Bob").unwrap().correct_answer().to_string();
        assert_eq!(m.submit("Bob", &answer), Err(RoundError::Over));
    }

    #[test]
    fn test_player_names_in_order() {
        let m = LocalMatch::new(&["P1", "P2", "P3"], 30).unwrap();
        let names: Vec<_> = m.player_names().collect();
        assert_eq!(names, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = LocalMatch::new(&["Alice", "Bob", "Alice"], 5);
        assert_eq!(
            result.err(),
            Some(RoundError::DuplicatePlayer("Alice".to_string()))
        );

        let result = LocalMatch::with_engines(
            vec![
                ("Bob".to_string(), QuestionEngine::seeded(1)),
                ("Bob".to_string(), QuestionEngine::seeded(2)),
            ],
            5,
        );
        assert!(matches!(result, Err(RoundError::DuplicatePlayer(name)) if name == "Bob"));
    }
}
