use crate::store::{ProfileStore, ProfileUpdate, StoreResult};
use crate::types::GameMode;
use serde::Serialize;

/// Everyone sharing the top score. Ties are never broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Winners {
    pub names: Vec<String>,
    pub score: Option<i64>,
}

impl Winners {
    pub fn is_tie(&self) -> bool {
        self.names.len() > 1
    }
}

/// Determine the winner set from final scores
pub fn winners<'a>(scores: impl IntoIterator<Item = (&'a str, i64)>) -> Winners {
    let mut best: Option<i64> = None;
    let mut names = Vec::new();

    for (name, score) in scores {
        match best {
            Some(top) if score < top => {}
            Some(top) if score == top => names.push(name.to_string()),
            _ => {
                best = Some(score);
                names.clear();
                names.push(name.to_string());
            }
        }
    }

    Winners { names, score: best }
}

/// Profile field holding the high score for a mode
pub fn high_score_field(mode: GameMode) -> &'static str {
    match mode {
        GameMode::SinglePlayer => "high_score",
        GameMode::LocalMultiplayer => "local_high_score",
        GameMode::Online => "online_high_score",
    }
}

/// Persist `score` if it beats the stored high score.
///
/// Returns whether the stored value was raised.
pub async fn record_high_score(
    store: &dyn ProfileStore,
    profile_id: &str,
    mode: GameMode,
    score: i64,
) -> StoreResult<bool> {
    let field = high_score_field(mode);
    let previous = store
        .get_profile(profile_id)
        .await?
        .and_then(|p| p.field(field));

    if previous.is_some_and(|best| score <= best) {
        return Ok(false);
    }

    store
        .merge_profile(profile_id, ProfileUpdate::new().field(field, score))
        .await?;
    tracing::info!(
        profile = profile_id,
        ?mode,
        score,
        previous = ?previous,
        "New high score"
    );
    Ok(true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub score: i64,
}

/// Top `limit` high scores for a mode, ranked from 1
pub async fn leaderboard(
    store: &dyn ProfileStore,
    mode: GameMode,
    limit: usize,
) -> StoreResult<Vec<LeaderboardEntry>> {
    let field = high_score_field(mode);
    let profiles = store.top_profiles(field, limit).await?;

    Ok(profiles
        .iter()
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            rank: i + 1,
            name: p.display_name().to_string(),
            score: p.field(field).unwrap_or_default(),
        })
        .collect())
}
