//! Summaries over past results.

use std::io::Write;

use serde::Serialize;

use crate::scoring::split_words;
use crate::session::{Session, TestResult};
use crate::util::{mean, round_half_up, std_dev};

/// How many of the newest results the averages cover.
pub const RECENT_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum PerformanceBadge {
    Excellent,
    Good,
    Average,
    #[strum(serialize = "Needs Work")]
    NeedsWork,
}

impl PerformanceBadge {
    pub fn classify(wpm: u32, accuracy: u32) -> Self {
        match (wpm, accuracy) {
            (w, a) if w >= 60 && a >= 95 => PerformanceBadge::Excellent,
            (w, a) if w >= 40 && a >= 90 => PerformanceBadge::Good,
            (w, a) if w >= 25 && a >= 85 => PerformanceBadge::Average,
            _ => PerformanceBadge::NeedsWork,
        }
    }
}

/// Coarse label for a live speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum SpeedLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SpeedLevel {
    pub fn classify(wpm: f64) -> Self {
        if wpm > 60.0 {
            SpeedLevel::Advanced
        } else if wpm > 40.0 {
            SpeedLevel::Intermediate
        } else {
            SpeedLevel::Beginner
        }
    }
}

/// Level reached by a finished test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum ResultLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ResultLevel {
    pub fn classify(wpm: f64) -> Self {
        if wpm >= 70.0 {
            ResultLevel::Expert
        } else if wpm >= 50.0 {
            ResultLevel::Advanced
        } else if wpm >= 30.0 {
            ResultLevel::Intermediate
        } else {
            ResultLevel::Beginner
        }
    }
}

/// Figures shown next to a result that are not stored with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultBreakdown {
    /// Characters per minute over the whole time limit.
    pub cpm: u32,
    pub correct_words: usize,
    /// Typed words left different from their target word.
    pub word_errors: usize,
    pub level: ResultLevel,
}

impl ResultBreakdown {
    pub fn new(target: &str, input: &str, time_limit: u32, wpm: f64) -> Self {
        let cpm = if time_limit == 0 {
            0
        } else {
            round_half_up(input.chars().count() as f64 / time_limit as f64 * 60.0) as u32
        };

        let (correct_words, word_errors) = split_words(input)
            .iter()
            .zip(split_words(target))
            .fold((0, 0), |(correct, wrong), (typed, word)| {
                if *typed == word {
                    (correct + 1, wrong)
                } else {
                    (correct, wrong + 1)
                }
            });

        Self {
            cpm,
            correct_words,
            word_errors,
            level: ResultLevel::classify(wpm),
        }
    }

    /// Breakdown of a completed session; `None` until it completes.
    pub fn from_session(session: &Session) -> Option<Self> {
        let result = session.result()?;
        Some(Self::new(
            session.target(),
            session.input(),
            result.time_limit,
            session.score().wpm,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub avg_wpm: u32,
    pub avg_accuracy: u32,
    pub best_wpm: u32,
    pub total_tests: usize,
    /// Spread of WPM over the recent window; lower is steadier.
    pub wpm_std_dev: f64,
}

impl Analytics {
    /// `history` is expected newest first, as history queries return it.
    pub fn from_history(history: &[TestResult]) -> Self {
        let recent = &history[..history.len().min(RECENT_WINDOW)];
        let wpms: Vec<f64> = recent.iter().map(|r| r.wpm as f64).collect();
        let accuracies: Vec<f64> = recent.iter().map(|r| r.accuracy as f64).collect();

        Self {
            avg_wpm: mean(&wpms).map(round_half_up).unwrap_or(0.0) as u32,
            avg_accuracy: mean(&accuracies).map(round_half_up).unwrap_or(0.0) as u32,
            best_wpm: history.iter().map(|r| r.wpm).max().unwrap_or(0),
            total_tests: history.len(),
            wpm_std_dev: std_dev(&wpms).unwrap_or(0.0),
        }
    }
}

/// Writes results as CSV with a header row.
pub fn export_csv<W: Write>(history: &[TestResult], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for result in history {
        csv_writer.serialize(result)?;
    }
    csv_writer.flush()?;
    Ok(())
}
