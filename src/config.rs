use std::path::PathBuf;

pub const DEFAULT_ROUND_SECONDS: u32 = 30;
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;
pub const DEFAULT_PROFILE_PATH: &str = "profiles.json";

/// Runtime settings for a game client
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Countdown length for every round
    pub round_seconds: u32,
    /// How many entries the leaderboard shows
    pub leaderboard_size: usize,
    /// Where the local profile store lives
    pub profile_path: PathBuf,
    /// Name the player is known by, also used as the profile id
    pub player_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_seconds: DEFAULT_ROUND_SECONDS,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            profile_path: PathBuf::from(DEFAULT_PROFILE_PATH),
            player_name: guest_name(),
        }
    }
}

impl GameConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let round_seconds = env_trimmed("TRICKY_ROUND_SECONDS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|secs| *secs >= 1)
            .unwrap_or(DEFAULT_ROUND_SECONDS);

        let leaderboard_size = env_trimmed("TRICKY_LEADERBOARD_SIZE")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_LEADERBOARD_SIZE);

        let profile_path = env_trimmed("TRICKY_PROFILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILE_PATH));

        let player_name = env_trimmed("TRICKY_PLAYER").unwrap_or_else(guest_name);

        Self {
            round_seconds,
            leaderboard_size,
            profile_path,
            player_name,
        }
    }
}

fn env_trimmed(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Friendly generated name for players who haven't picked one
pub fn guest_name() -> String {
    petname::petname(2, "-").unwrap_or_else(|| "guest".to_string())
}
