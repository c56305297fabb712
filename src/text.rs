use cgisf_lib::cgisf;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TextMode {
    Words,
    Sentences,
    Custom,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    #[error("custom text cannot be empty")]
    EmptyCustomText,
}

/// Supplies the text a session is typed against.
pub trait TextProvider {
    fn target_text(&self) -> Result<String, TextError>;
}

/// Configuration for target text generation
#[derive(Debug, Clone)]
pub struct TextConfig {
    pub mode: TextMode,
    pub number_of_words: usize,
    pub number_of_sentences: usize,
    pub custom_text: Option<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            mode: TextMode::Words,
            number_of_words: 50,
            number_of_sentences: 3,
            custom_text: None,
        }
    }
}

/// Handles word, sentence and custom prompt generation
pub struct TextGenerator {
    config: TextConfig,
}

impl TextGenerator {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    fn generate_words(&self) -> String {
        let rng = &mut rand::thread_rng();
        (0..self.config.number_of_words)
            .filter_map(|_| COMMON_WORDS.choose(rng).copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn generate_sentences(&self) -> String {
        let rng = &mut rand::thread_rng();
        (0..self.config.number_of_sentences)
            .map(|_| {
                cgisf(
                    rng.gen_range(1..3),
                    rng.gen_range(1..3),
                    rng.gen_range(1..5),
                    rng.gen_bool(0.5),
                    rng.gen_range(1..3),
                    rng.gen_bool(0.5),
                )
                .trim()
                .to_string()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TextProvider for TextGenerator {
    fn target_text(&self) -> Result<String, TextError> {
        match self.config.mode {
            TextMode::Words => Ok(self.generate_words()),
            TextMode::Sentences => Ok(self.generate_sentences()),
            TextMode::Custom => {
                let text = self.config.custom_text.as_deref().unwrap_or("").trim();
                if text.is_empty() {
                    return Err(TextError::EmptyCustomText);
                }
                Ok(text.to_string())
            }
        }
    }
}

const COMMON_WORDS: &[&str] = &[
    "the", "be", "of", "and", "a", "to", "in", "he", "have", "it", "that", "for", "they", "with",
    "as", "not", "on", "she", "at", "by", "this", "we", "you", "do", "but", "from", "or",
    "which", "one", "would", "all", "will", "there", "say", "who", "make", "when", "can", "more",
    "if", "no", "man", "out", "other", "so", "what", "time", "up", "go", "about", "than", "into",
    "could", "state", "only", "new", "year", "some", "take", "come", "these", "know", "see",
    "use", "get", "like", "then", "first", "any", "work", "now", "may", "such", "give", "over",
    "think", "most", "even", "find", "day", "also", "after", "way", "many", "must", "look",
    "before", "great", "back", "through", "long", "where", "much", "should", "well", "people",
    "down", "own", "just", "because", "good", "each", "those", "feel", "seem", "how", "high",
    "too", "place", "little", "world", "very", "still", "nation", "hand", "old", "life", "tell",
    "write", "become", "here", "show", "house", "both", "between", "need", "mean", "call",
    "develop", "under", "last", "right", "move", "thing", "general", "school", "never", "same",
    "another", "begin", "while", "number", "part", "turn", "real", "leave", "might", "want",
    "point", "form", "off", "child", "few", "small", "since", "against", "ask", "late", "home",
    "interest", "large", "person", "end", "open", "public", "follow", "during", "present",
    "without", "again", "hold", "govern", "around", "possible", "head", "consider", "word",
    "program", "problem", "however", "lead", "system", "set", "order", "eye", "plan", "run",
    "keep", "face", "fact", "group", "play", "stand", "increase", "early", "course", "change",
    "help", "line",
];
