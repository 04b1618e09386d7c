use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tricky_taps::{
    config::GameConfig,
    question::QuestionEngine,
    round::{Round, RoundError},
    scoring,
    store::{JsonFileProfileStore, ProfileStore, ProfileUpdate},
    timer::RoundTimer,
    types::{ColorName, GameMode, HighlightColor, TrickQuestion},
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tricky_taps=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = GameConfig::from_env();
    tracing::info!(
        player = %config.player_name,
        seconds = config.round_seconds,
        "Starting Tricky Taps"
    );

    // Profile store failures only cost the high score, never the game
    let store = match JsonFileProfileStore::open(&config.profile_path).await {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!("Profile store unavailable: {}", e);
            println!("(Scores won't be saved this time: {})", e);
            None
        }
    };

    let round = Round::new(
        GameMode::SinglePlayer,
        config.round_seconds,
        QuestionEngine::new(),
    );
    let timer = RoundTimer::spawn(round);

    println!(
        "{} seconds on the clock. Answer with 1-4, 's' to skip, 'p' to pause.",
        config.round_seconds
    );
    print_question(&timer.question().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut paused = false;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let input = match line {
                    Ok(Some(input)) => input,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Failed to read input: {}", e);
                        break;
                    }
                };
                let input = input.trim();

                if input.eq_ignore_ascii_case("p") {
                    if paused {
                        timer.resume().await;
                        println!("Resumed.");
                    } else {
                        timer.pause().await;
                        println!("Paused. 'p' again to continue.");
                    }
                    paused = !paused;
                    continue;
                }

                if input.eq_ignore_ascii_case("s") {
                    match timer.skip().await {
                        Ok(question) => print_question(&question),
                        Err(RoundError::Over) => break,
                        Err(e) => println!("{}", e),
                    }
                    continue;
                }

                let question = timer.question().await;
                let option = resolve_option(&question, input);
                match timer.submit(&option).await {
                    Ok(outcome) if outcome.correct => {
                        println!("Correct! +{} (score {})", outcome.delta, outcome.score);
                    }
                    Ok(outcome) => {
                        println!("Nope, it was {} (score {})", outcome.correct_answer, outcome.score);
                    }
                    Err(RoundError::Over) => break,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                }
                print_question(&timer.question().await);
            }
            _ = timer.finished() => break,
        }
    }

    let result = timer.snapshot().await;
    drop(timer);

    println!();
    println!(
        "Time's up! Final score: {} ({} of {} correct)",
        result.score, result.correct, result.answered
    );

    if let Some(store) = store {
        save_and_show(&store, &config, result.score).await;
    }
}

async fn save_and_show(store: &dyn ProfileStore, config: &GameConfig, score: i64) {
    let id = config.player_name.as_str();

    if let Err(e) = store
        .merge_profile(id, ProfileUpdate::new().username(id))
        .await
    {
        println!("(Couldn't update your profile: {})", e);
        return;
    }

    match scoring::record_high_score(store, id, GameMode::SinglePlayer, score).await {
        Ok(true) => println!("New high score!"),
        Ok(false) => {}
        Err(e) => println!("(Couldn't save your score: {})", e),
    }

    match scoring::leaderboard(store, GameMode::SinglePlayer, config.leaderboard_size).await {
        Ok(board) if !board.is_empty() => {
            println!("Leaderboard:");
            for entry in board {
                println!("{:>3}. {:<20} {}", entry.rank, entry.name, entry.score);
            }
        }
        Ok(_) => {}
        Err(e) => println!("(Couldn't load the leaderboard: {})", e),
    }
}

/// Accept either a 1-based option number or the option text
fn resolve_option(question: &TrickQuestion, input: &str) -> String {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| question.option_at(i))
        .unwrap_or(input)
        .to_string()
}

fn print_question(question: &TrickQuestion) {
    println!();
    let color = ansi_color(question.highlight_color());
    let prompt: String = question
        .prompt_segments()
        .into_iter()
        .map(|segment| {
            if segment.highlighted {
                format!("\x1b[1;{}m{}\x1b[0m", color, segment.text)
            } else {
                segment.text
            }
        })
        .collect();
    println!("{}", prompt);

    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }
}

fn ansi_color(color: HighlightColor) -> u8 {
    match color.color_name() {
        Some(ColorName::Red) => 31,
        Some(ColorName::Green) => 32,
        Some(ColorName::Yellow) => 33,
        Some(ColorName::Blue) => 34,
        None => 39,
    }
}
