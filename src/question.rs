//! Trick question generation
//!
//! Each question comes from one of six fixed templates. The two color templates
//! pair a displayed color word with a different rendering color and shuffle
//! their options; the other four present a fixed option list in declared order.

use crate::types::{
    ColorName, HighlightColor, TemplateKind, TrickQuestion, HIGHLIGHT_MARKER,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const ODD_NUMBER_OPTIONS: [&str; 4] = ["12", "7", "4", "8"];
const ODD_NUMBER_ANSWER: &str = "7";

const SHAPE_OPTIONS: [&str; 4] = ["Small Circle", "Medium Triangle", "Large Square", "Tiny Star"];
const SHAPE_ANSWER: &str = "Large Square";

const CATEGORY_OPTIONS: [&str; 4] = ["Apple", "Banana", "Tomato", "Carrot"];
const CATEGORY_ANSWER: &str = "Carrot";

const SPELLING_OPTIONS: [&str; 4] = ["Necessary", "NECESSARY", "Neccessary", "necessary"];
const SPELLING_ANSWER: &str = "Neccessary";

/// Generates trick questions from an owned random source
pub struct QuestionEngine {
    rng: StdRng,
}

impl QuestionEngine {
    /// Engine seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic engine for replays and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a template uniformly at random and fill it in
    pub fn generate(&mut self) -> TrickQuestion {
        let kind = TemplateKind::ALL[self.rng.random_range(0..TemplateKind::ALL.len())];
        self.generate_kind(kind)
    }

    pub fn generate_kind(&mut self, kind: TemplateKind) -> TrickQuestion {
        match kind {
            TemplateKind::ColorOfText => {
                let (word, color) = self.color_pair();
                TrickQuestion::new(
                    kind,
                    format!(
                        "Tap the color this word is written in: {m}{}{m}",
                        word.label(),
                        m = HIGHLIGHT_MARKER
                    ),
                    self.shuffled_colors(),
                    color.label().to_string(),
                    color.into(),
                )
            }
            TemplateKind::ColorNaming => {
                let (word, color) = self.color_pair();
                TrickQuestion::new(
                    kind,
                    format!(
                        "Tap the word you read, not its color: {m}{}{m}",
                        word.label(),
                        m = HIGHLIGHT_MARKER
                    ),
                    self.shuffled_colors(),
                    word.label().to_string(),
                    color.into(),
                )
            }
            TemplateKind::OddNumberOut => fixed(
                kind,
                "Which number is the odd one out?",
                &ODD_NUMBER_OPTIONS,
                ODD_NUMBER_ANSWER,
            ),
            TemplateKind::LargestShape => fixed(
                kind,
                "Which shape is the biggest?",
                &SHAPE_OPTIONS,
                SHAPE_ANSWER,
            ),
            TemplateKind::CategoryOutlier => fixed(
                kind,
                "Which one is not a fruit?",
                &CATEGORY_OPTIONS,
                CATEGORY_ANSWER,
            ),
            TemplateKind::Misspelling => fixed(
                kind,
                "Which one is spelled wrong?",
                &SPELLING_OPTIONS,
                SPELLING_ANSWER,
            ),
        }
    }

    fn random_color(&mut self) -> ColorName {
        ColorName::ALL[self.rng.random_range(0..ColorName::ALL.len())]
    }

    /// Displayed word and rendering color, resampled until they differ
    fn color_pair(&mut self) -> (ColorName, ColorName) {
        let word = self.random_color();
        let color = loop {
            let candidate = self.random_color();
            if candidate != word {
                break candidate;
            }
        };
        (word, color)
    }

    fn shuffled_colors(&mut self) -> Vec<String> {
        let mut options: Vec<String> = ColorName::ALL
            .iter()
            .map(|c| c.label().to_string())
            .collect();
        options.shuffle(&mut self.rng);
        options
    }
}

impl Default for QuestionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn fixed(kind: TemplateKind, prompt: &str, options: &[&str], answer: &str) -> TrickQuestion {
    TrickQuestion::new(
        kind,
        prompt.to_string(),
        options.iter().map(|o| o.to_string()).collect(),
        answer.to_string(),
        HighlightColor::Neutral,
    )
}

/// Exact string equality against the question's correct answer
pub fn is_correct(question: &TrickQuestion, submitted: &str) -> bool {
    question.is_correct(submitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    const SAMPLES: usize = 6000;

    #[test]
    fn test_correct_answer_in_options_without_duplicates() {
        let mut engine = QuestionEngine::seeded(7);
        for _ in 0..SAMPLES {
            let q = engine.generate();
            assert!(q.options().iter().any(|o| o == q.correct_answer()));

            let unique: HashSet<_> = q.options().iter().collect();
            assert_eq!(unique.len(), q.options().len(), "duplicate in {:?}", q);
        }
    }

    #[test]
    fn test_color_templates_never_match_word_and_color() {
        let mut engine = QuestionEngine::seeded(11);
        let color_kinds: Vec<_> = TemplateKind::ALL
            .into_iter()
            .filter(|k| k.is_color_trick())
            .collect();
        assert_eq!(color_kinds.len(), 2);

        for kind in color_kinds {
            for _ in 0..500 {
                let q = engine.generate_kind(kind);
                let word = q.highlighted_text().expect("color prompt has a marked word");
                let color = q
                    .highlight_color()
                    .color_name()
                    .expect("color prompt has a rendering color");
                assert_ne!(word, color.label());
            }
        }
    }

    #[test]
    fn test_color_of_text_answer_is_rendering_color() {
        let mut engine = QuestionEngine::seeded(3);
        for _ in 0..100 {
            let q = engine.generate_kind(TemplateKind::ColorOfText);
            let color = q.highlight_color().color_name().unwrap();
            assert_eq!(q.correct_answer(), color.label());
        }
    }

    #[test]
    fn test_color_naming_answer_is_displayed_word() {
        let mut engine = QuestionEngine::seeded(5);
        for _ in 0..100 {
            let q = engine.generate_kind(TemplateKind::ColorNaming);
            assert_eq!(Some(q.correct_answer().to_string()), q.highlighted_text());
        }
    }

    #[test]
    fn test_color_options_are_all_four_colors() {
        let mut engine = QuestionEngine::seeded(9);
        let q = engine.generate_kind(TemplateKind::ColorOfText);
        let mut options: Vec<_> = q.options().to_vec();
        options.sort();
        assert_eq!(options, vec!["Blue", "Green", "Red", "Yellow"]);
    }

    #[test]
    fn test_color_options_get_shuffled() {
        let mut engine = QuestionEngine::seeded(13);
        let orders: HashSet<Vec<String>> = (0..50)
            .map(|_| engine.generate_kind(TemplateKind::ColorNaming).options().to_vec())
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_odd_number_template() {
        let mut engine = QuestionEngine::seeded(1);
        for _ in 0..20 {
            let q = engine.generate_kind(TemplateKind::OddNumberOut);
            assert_eq!(q.options(), &["12", "7", "4", "8"]);
            assert_eq!(q.correct_answer(), "7");
            assert_eq!(q.highlight_color(), HighlightColor::Neutral);
        }
    }

    #[test]
    fn test_category_template() {
        let mut engine = QuestionEngine::seeded(1);
        let q = engine.generate_kind(TemplateKind::CategoryOutlier);
        assert_eq!(q.options(), &["Apple", "Banana", "Tomato", "Carrot"]);
        assert_eq!(q.correct_answer(), "Carrot");
    }

    #[test]
    fn test_shape_and_spelling_templates() {
        let mut engine = QuestionEngine::seeded(1);
        let shape = engine.generate_kind(TemplateKind::LargestShape);
        assert_eq!(shape.correct_answer(), "Large Square");
        assert_eq!(shape.options().len(), 4);

        let spelling = engine.generate_kind(TemplateKind::Misspelling);
        assert_eq!(spelling.correct_answer(), "Neccessary");
        assert_eq!(spelling.options(), &SPELLING_OPTIONS);
    }

    #[test]
    fn test_is_correct() {
        let mut engine = QuestionEngine::seeded(21);
        for _ in 0..200 {
            let q = engine.generate();
            assert!(is_correct(&q, q.correct_answer()));
            assert!(!is_correct(&q, "Purple"));
            assert!(!is_correct(&q, ""));
        }
    }

    #[test]
    fn test_generate_covers_all_kinds_roughly_uniformly() {
        let mut engine = QuestionEngine::seeded(42);
        let mut counts: HashMap<TemplateKind, usize> = HashMap::new();
        for _ in 0..SAMPLES {
            *counts.entry(engine.generate().kind()).or_default() += 1;
        }

        assert_eq!(counts.len(), TemplateKind::ALL.len());
        let expected = SAMPLES / TemplateKind::ALL.len();
        for (kind, count) in counts {
            // 1000 expected per kind; allow a wide statistical margin
            assert!(
                count > expected * 3 / 4 && count < expected * 5 / 4,
                "{:?} drawn {} times",
                kind,
                count
            );
        }
    }

    #[test]
    fn test_seeded_engines_are_deterministic() {
        let mut a = QuestionEngine::seeded(99);
        let mut b = QuestionEngine::seeded(99);
        for _ in 0..20 {
            assert_eq!(a.generate(), b.generate());
        }
    }
}
