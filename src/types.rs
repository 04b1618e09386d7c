use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque ID types for type safety
pub type SessionId = String;
pub type ProfileId = String;
pub type PlayerName = String;

/// Two-character marker delimiting the highlighted span of a prompt
pub const HIGHLIGHT_MARKER: &str = "**";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColorName {
    Red,
    Blue,
    Green,
    Yellow,
}

impl ColorName {
    pub const ALL: [ColorName; 4] = [
        ColorName::Red,
        ColorName::Blue,
        ColorName::Green,
        ColorName::Yellow,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ColorName::Red => "Red",
            ColorName::Blue => "Blue",
            ColorName::Green => "Green",
            ColorName::Yellow => "Yellow",
        }
    }
}

/// Color used to render the marked span of a prompt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HighlightColor {
    #[default]
    Neutral,
    Color(ColorName),
}

impl HighlightColor {
    pub fn color_name(self) -> Option<ColorName> {
        match self {
            HighlightColor::Neutral => None,
            HighlightColor::Color(c) => Some(c),
        }
    }
}

impl From<ColorName> for HighlightColor {
    fn from(color: ColorName) -> Self {
        HighlightColor::Color(color)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    ColorOfText,
    ColorNaming,
    OddNumberOut,
    LargestShape,
    CategoryOutlier,
    Misspelling,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        TemplateKind::ColorOfText,
        TemplateKind::ColorNaming,
        TemplateKind::OddNumberOut,
        TemplateKind::LargestShape,
        TemplateKind::CategoryOutlier,
        TemplateKind::Misspelling,
    ];

    /// Color templates pair a displayed word with a different rendering color
    pub fn is_color_trick(self) -> bool {
        matches!(self, TemplateKind::ColorOfText | TemplateKind::ColorNaming)
    }
}

/// A single piece of a prompt, either plain or rendered in the highlight color
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptSegment {
    pub text: String,
    pub highlighted: bool,
}

/// One generated question round. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrickQuestion {
    kind: TemplateKind,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
    highlight_color: HighlightColor,
}

impl TrickQuestion {
    pub(crate) fn new(
        kind: TemplateKind,
        prompt: String,
        options: Vec<String>,
        correct_answer: String,
        highlight_color: HighlightColor,
    ) -> Self {
        debug_assert!(options.contains(&correct_answer));
        Self {
            kind,
            prompt,
            options,
            correct_answer,
            highlight_color,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn highlight_color(&self) -> HighlightColor {
        self.highlight_color
    }

    /// Option at a zero-based position, as shown to the player
    pub fn option_at(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Exact string match against the correct answer
    pub fn is_correct(&self, submitted: &str) -> bool {
        submitted == self.correct_answer
    }

    /// Split the prompt on the highlight marker.
    ///
    /// Text between a pair of markers is highlighted. Empty pieces are dropped,
    /// and an unpaired trailing marker leaves the remainder highlighted.
    pub fn prompt_segments(&self) -> Vec<PromptSegment> {
        self.prompt
            .split(HIGHLIGHT_MARKER)
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .map(|(i, text)| PromptSegment {
                text: text.to_string(),
                highlighted: i % 2 == 1,
            })
            .collect()
    }

    /// The highlighted span, if the prompt has one
    pub fn highlighted_text(&self) -> Option<String> {
        self.prompt_segments()
            .into_iter()
            .find(|s| s.highlighted)
            .map(|s| s.text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    SinglePlayer,
    LocalMultiplayer,
    Online,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub score: i64,
    pub ready: bool,
}

/// Shared online match document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub status: SessionStatus,
    pub participants: BTreeMap<PlayerName, Participant>,
    pub created_at: String,
}

impl Session {
    pub fn new(id: SessionId, names: &[PlayerName]) -> Self {
        Self {
            id,
            status: SessionStatus::Waiting,
            participants: names
                .iter()
                .map(|n| (n.clone(), Participant::default()))
                .collect(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// At least two participants and every one of them ready
    pub fn all_ready(&self) -> bool {
        self.participants.len() >= 2 && self.participants.values().all(|p| p.ready)
    }

    pub fn scores(&self) -> impl Iterator<Item = (&str, i64)> {
        self.participants
            .iter()
            .map(|(name, p)| (name.as_str(), p.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(prompt: &str) -> TrickQuestion {
        TrickQuestion::new(
            TemplateKind::ColorOfText,
            prompt.to_string(),
            vec!["Red".to_string(), "Blue".to_string()],
            "Blue".to_string(),
            HighlightColor::Color(ColorName::Blue),
        )
    }

    #[test]
    fn test_prompt_segments_split_on_marker() {
        let q = question("Tap the color of **Red** now");
        let segments = q.prompt_segments();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "Tap the color of ");
        assert!(!segments[0].highlighted);
        assert_eq!(segments[1].text, "Red");
        assert!(segments[1].highlighted);
        assert!(!segments[2].highlighted);
        assert_eq!(q.highlighted_text().as_deref(), Some("Red"));
    }

    #[test]
    fn test_prompt_segments_without_marker() {
        let q = question("Which number is odd?");
        let segments = q.prompt_segments();

        assert_eq!(segments.len(), 1);
        assert!(!segments[0].highlighted);
        assert!(q.highlighted_text().is_none());
    }

    #[test]
    fn test_prompt_segments_marker_at_end() {
        let q = question("Read this: **Green**");
        let segments = q.prompt_segments();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "Green");
        assert!(segments[1].highlighted);
    }

    #[test]
    fn test_option_at_and_is_correct() {
        let q = question("**Red**");
        assert_eq!(q.option_at(1), Some("Blue"));
        assert_eq!(q.option_at(4), None);
        assert!(q.is_correct("Blue"));
        assert!(!q.is_correct("blue"));
    }

    #[test]
    fn test_session_all_ready_requires_two() {
        let mut session = Session::new("s1".to_string(), &["Alice".to_string()]);
        session.participants.get_mut("Alice").unwrap().ready = true;
        assert!(!session.all_ready());

        session
            .participants
            .insert("Bob".to_string(), Participant::default());
        assert!(!session.all_ready());

        session.participants.get_mut("Bob").unwrap().ready = true;
        assert!(session.all_ready());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
