//! Per-word and per-character comparison used for visual feedback.

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::scoring::split_words;
use crate::session::Lifecycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WordStatus {
    CompletedCorrect,
    CompletedIncorrect,
    InProgress,
    Upcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CharStatus {
    Correct,
    Incorrect,
    Pending,
    Cursor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharCell {
    pub ch: char,
    pub status: CharStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordAlignment<'a> {
    pub index: usize,
    pub target: &'a str,
    pub typed: &'a str,
    pub status: WordStatus,
    pub chars: Vec<CharCell>,
    /// Typed characters past the end of the target word.
    pub overflow: String,
}

impl WordAlignment<'_> {
    /// Terminal columns needed to draw the word including its overflow.
    pub fn display_width(&self) -> usize {
        self.target.width() + self.overflow.width()
    }

    pub fn has_cursor(&self) -> bool {
        self.chars.iter().any(|c| c.status == CharStatus::Cursor)
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self.status,
            WordStatus::CompletedCorrect | WordStatus::CompletedIncorrect
        )
    }
}

/// Aligns `input` against `target` word by word.
///
/// While a session runs exactly one word is in progress. Once it is complete
/// the word under the cursor is reported as completed, and an idle session
/// with no input shows every word as upcoming.
///
/// Input ending in whitespace puts the cursor on the first character of the
/// next word, which stays upcoming until something is typed into it.
pub fn align<'a>(
    target: &'a str,
    input: &'a str,
    current_word_index: usize,
    lifecycle: Lifecycle,
) -> Vec<WordAlignment<'a>> {
    let typed_words = split_words(input);
    let nothing_typed = lifecycle == Lifecycle::Idle && typed_words.is_empty();
    let next_word_cursor = (lifecycle == Lifecycle::Active
        && !typed_words.is_empty()
        && input.ends_with(char::is_whitespace))
    .then_some(typed_words.len());

    split_words(target)
        .into_iter()
        .enumerate()
        .map(|(index, word)| {
            let typed = typed_words.get(index).copied().unwrap_or("");

            let status = if nothing_typed || index > current_word_index {
                WordStatus::Upcoming
            } else if index < current_word_index || lifecycle == Lifecycle::Complete {
                if typed == word {
                    WordStatus::CompletedCorrect
                } else {
                    WordStatus::CompletedIncorrect
                }
            } else {
                WordStatus::InProgress
            };

            let mut chars = char_cells(word, typed, status);
            if next_word_cursor == Some(index) {
                if let Some(first) = chars.first_mut() {
                    first.status = CharStatus::Cursor;
                }
            }

            WordAlignment {
                index,
                target: word,
                typed,
                status,
                chars,
                overflow: typed.chars().skip(word.chars().count()).collect(),
            }
        })
        .collect()
}

fn char_cells(word: &str, typed: &str, status: WordStatus) -> Vec<CharCell> {
    if status == WordStatus::Upcoming {
        return word
            .chars()
            .map(|ch| CharCell {
                ch,
                status: CharStatus::Pending,
            })
            .collect();
    }

    let typed: Vec<char> = typed.chars().collect();
    word.chars()
        .enumerate()
        .map(|(idx, ch)| {
            let status = match typed.get(idx) {
                Some(got) if *got == ch => CharStatus::Correct,
                Some(_) => CharStatus::Incorrect,
                None if idx == typed.len() && status == WordStatus::InProgress => {
                    CharStatus::Cursor
                }
                None => CharStatus::Pending,
            };
            CharCell { ch, status }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::compute_metrics;

    fn statuses(words: &[WordAlignment]) -> Vec<WordStatus> {
        words.iter().map(|w| w.status).collect()
    }

    fn aligned<'a>(target: &'a str, input: &'a str, lifecycle: Lifecycle) -> Vec<WordAlignment<'a>> {
        let idx = compute_metrics(target, input, 1.0).current_word_index;
        align(target, input, idx, lifecycle)
    }

    #[test]
    fn idle_without_input_is_all_upcoming() {
        let words = aligned("one two three", "", Lifecycle::Idle);

        assert_eq!(statuses(&words), vec![WordStatus::Upcoming; 3]);
        assert!(words[0].chars.iter().all(|c| c.status == CharStatus::Pending));
    }

    #[test]
    fn active_session_has_exactly_one_word_in_progress() {
        for input in ["", "o", "one", "one tw", "one two thr", "one two three four"] {
            let words = aligned("one two three", input, Lifecycle::Active);
            let in_progress = words
                .iter()
                .filter(|w| w.status == WordStatus::InProgress)
                .count();
            assert_eq!(in_progress, 1, "input {input:?}");
        }
    }

    #[test]
    fn completed_words_are_graded() {
        let words = aligned("cat dog bird", "cat dgo b", Lifecycle::Active);

        assert_eq!(
            statuses(&words),
            vec![
                WordStatus::CompletedCorrect,
                WordStatus::CompletedIncorrect,
                WordStatus::InProgress,
            ]
        );
        assert!(words[1].is_completed());
    }

    #[test]
    fn in_progress_chars_show_cursor() {
        let words = aligned("cat dog", "cat dx", Lifecycle::Active);
        let current = &words[1];

        let cells: Vec<CharStatus> = current.chars.iter().map(|c| c.status).collect();
        assert_eq!(
            cells,
            vec![CharStatus::Correct, CharStatus::Incorrect, CharStatus::Cursor]
        );
        assert_eq!(current.typed, "dx");
        assert!(current.overflow.is_empty());
    }

    #[test]
    fn trailing_space_moves_cursor_to_next_word() {
        let words = aligned("cat dog", "cat ", Lifecycle::Active);

        assert_eq!(
            statuses(&words),
            vec![WordStatus::InProgress, WordStatus::Upcoming]
        );
        assert!(!words[0].has_cursor());
        assert_eq!(words[1].chars[0].status, CharStatus::Cursor);
        assert_eq!(words[1].chars[1].status, CharStatus::Pending);

        let cursors = words
            .iter()
            .flat_map(|w| &w.chars)
            .filter(|c| c.status == CharStatus::Cursor)
            .count();
        assert_eq!(cursors, 1);
    }

    #[test]
    fn trailing_space_after_last_word_has_no_cursor() {
        let words = aligned("cat dog", "cat dig ", Lifecycle::Active);

        assert!(words.iter().all(|w| !w.has_cursor()));
    }

    #[test]
    fn overflow_is_reported() {
        let words = aligned("cat", "catty", Lifecycle::Active);

        assert_eq!(words[0].overflow, "ty");
        assert!(words[0].chars.iter().all(|c| c.status == CharStatus::Correct));
        assert_eq!(words[0].display_width(), 5);
    }

    #[test]
    fn complete_session_has_no_word_in_progress() {
        let words = aligned("cat dog", "cat dog", Lifecycle::Complete);

        assert_eq!(
            statuses(&words),
            vec![WordStatus::CompletedCorrect, WordStatus::CompletedCorrect]
        );
        assert!(words
            .iter()
            .flat_map(|w| &w.chars)
            .all(|c| c.status != CharStatus::Cursor));
    }

    #[test]
    fn complete_by_time_marks_unfinished_word_incorrect() {
        let words = aligned("cat dog bird", "cat do", Lifecycle::Complete);

        assert_eq!(
            statuses(&words),
            vec![
                WordStatus::CompletedCorrect,
                WordStatus::CompletedIncorrect,
                WordStatus::Upcoming,
            ]
        );
        assert_eq!(words[1].chars[2].status, CharStatus::Pending);
    }

    #[test]
    fn wide_chars_take_two_columns() {
        let words = aligned("日本 語", "", Lifecycle::Idle);

        assert_eq!(words[0].display_width(), 4);
        assert_eq!(words[0].chars.len(), 2);
    }
}
