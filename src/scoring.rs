//! Live scoring of a typing attempt against its target text.
//!
//! Every figure is recomputed from the two full strings on each call. There is
//! no accumulator, so backspacing over a mistake removes it from the count.

use itertools::{EitherOrBoth, Itertools};
use serde::Serialize;

use crate::util::round_half_up;

/// Characters that make up one "word" for WPM purposes.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Result of scoring one input snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreCard {
    pub wpm: f64,
    pub accuracy: f64,
    pub errors: usize,
    pub correct_chars: usize,
    pub compared_chars: usize,
    pub current_word_index: usize,
}

impl Default for ScoreCard {
    fn default() -> Self {
        Self {
            wpm: 0.0,
            accuracy: 100.0,
            errors: 0,
            correct_chars: 0,
            compared_chars: 0,
            current_word_index: 0,
        }
    }
}

impl ScoreCard {
    pub fn rounded_wpm(&self) -> u32 {
        round_half_up(self.wpm) as u32
    }

    pub fn rounded_accuracy(&self) -> u32 {
        round_half_up(self.accuracy) as u32
    }
}

/// Splits on runs of whitespace. Leading and trailing whitespace never
/// produce empty words.
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Index of the word the typist is on, clamped to the last target word.
pub fn current_word_index(typed_words: usize, target_words: usize) -> usize {
    typed_words.min(target_words).saturating_sub(1)
}

/// Compares one typed word with its target, returning `(correct, errors)`.
///
/// Characters typed past the end of the target are errors, target characters
/// not typed yet are pending and count for nothing.
pub fn compare_word(typed: &str, target: &str) -> (usize, usize) {
    typed
        .chars()
        .zip_longest(target.chars())
        .fold((0, 0), |(correct, errors), pair| match pair {
            EitherOrBoth::Both(got, want) if got == want => (correct + 1, errors),
            EitherOrBoth::Both(_, _) | EitherOrBoth::Left(_) => (correct, errors + 1),
            EitherOrBoth::Right(_) => (correct, errors),
        })
}

/// Words per minute from correctly typed characters only.
pub fn words_per_minute(correct_chars: usize, elapsed_secs: f64) -> f64 {
    // also rejects NaN
    if !(elapsed_secs > 0.0) {
        return 0.0;
    }
    (correct_chars as f64 / CHARS_PER_WORD) / (elapsed_secs / 60.0)
}

pub fn compute_metrics(target: &str, input: &str, elapsed_secs: f64) -> ScoreCard {
    let target_words = split_words(target);
    let typed_words = split_words(input);

    let mut correct_chars = 0;
    let mut errors = 0;

    for (idx, (typed, expected)) in typed_words.iter().zip(target_words.iter()).enumerate() {
        // the separator in front of every word after the first has been typed
        if idx > 0 {
            correct_chars += 1;
        }
        let (correct, wrong) = compare_word(typed, expected);
        correct_chars += correct;
        errors += wrong;
    }

    let compared_chars = correct_chars + errors;
    let accuracy = if compared_chars == 0 {
        100.0
    } else {
        (correct_chars as f64 / compared_chars as f64) * 100.0
    };

    ScoreCard {
        wpm: words_per_minute(correct_chars, elapsed_secs),
        accuracy,
        errors,
        correct_chars,
        compared_chars,
        current_word_index: current_word_index(typed_words.len(), target_words.len()),
    }
}

/// True once the typist sits on the last target word and it matches exactly.
///
/// Earlier words are not checked: a session completes on the last word even
/// if words before it were mistyped.
pub fn is_final_word_complete(target: &str, input: &str) -> bool {
    let target_words = split_words(target);
    let typed_words = split_words(input);

    if target_words.is_empty() || typed_words.is_empty() {
        return false;
    }

    let idx = current_word_index(typed_words.len(), target_words.len());
    idx == target_words.len() - 1 && typed_words[idx] == target_words[idx]
}
