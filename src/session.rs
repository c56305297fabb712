use std::time::Instant;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alignment::{align, WordAlignment};
use crate::scoring::{compute_metrics, is_final_word_complete, split_words, ScoreCard};
use crate::time_series::{push_sample, WpmSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Lifecycle {
    Idle,
    Active,
    Complete,
}

/// Live figures shown while typing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub wpm: f64,
    pub accuracy: f64,
    pub errors: usize,
    pub time_remaining: u32,
}

/// Snapshot frozen when a session completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
    pub time_limit: u32,
    pub words_typed: usize,
    pub characters_typed: usize,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCause {
    TimeUp,
    TextComplete,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Start,
    Input(String),
    Tick,
    Reset,
    SetTimeLimit(u32),
    SetTargetText(String),
}

/// What applying an event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Started,
    Updated,
    Ticked,
    Completed(CompletionCause),
    Reset,
    Configured,
}

/// One timed attempt at a target text.
///
/// All mutation goes through [`Session::apply`]; input updates and clock ticks
/// are both plain events, so applying them one at a time is all it takes to
/// keep completion at-most-once.
#[derive(Debug, Clone)]
pub struct Session {
    target: String,
    input: String,
    lifecycle: Lifecycle,
    started_at: Option<Instant>,
    time_limit: u32,
    time_remaining: u32,
    score: ScoreCard,
    wpm_samples: Vec<WpmSample>,
    result: Option<TestResult>,
    result_pending: bool,
}

impl Session {
    pub fn new(target: impl Into<String>, time_limit: u32) -> Self {
        Self {
            target: target.into(),
            input: String::new(),
            lifecycle: Lifecycle::Idle,
            started_at: None,
            time_limit,
            time_remaining: time_limit,
            score: ScoreCard::default(),
            wpm_samples: Vec::new(),
            result: None,
            result_pending: false,
        }
    }

    pub fn apply(&mut self, event: SessionEvent, now: Instant) -> Transition {
        match (self.lifecycle, event) {
            (Lifecycle::Idle, SessionEvent::Start) => {
                self.begin(now);
                Transition::Started
            }
            (Lifecycle::Idle, SessionEvent::Input(input)) => {
                // the first keystroke starts the test
                self.begin(now);
                match self.update_input(input, now) {
                    Transition::Updated => Transition::Started,
                    other => other,
                }
            }
            (Lifecycle::Active, SessionEvent::Input(input)) => self.update_input(input, now),
            (Lifecycle::Active, SessionEvent::Tick) => self.on_tick(now),
            (Lifecycle::Active | Lifecycle::Complete, SessionEvent::Reset) => {
                self.clear();
                debug!(target: "session", time_limit = self.time_limit, "session.reset");
                Transition::Reset
            }
            (Lifecycle::Idle, SessionEvent::SetTimeLimit(secs)) => {
                self.time_limit = secs;
                self.time_remaining = secs;
                Transition::Configured
            }
            (Lifecycle::Idle, SessionEvent::SetTargetText(text)) => {
                self.target = text;
                self.clear();
                Transition::Configured
            }
            (lifecycle, event) => {
                debug!(target: "session", %lifecycle, ?event, "event ignored");
                Transition::Ignored
            }
        }
    }

    pub fn start(&mut self) -> Transition {
        self.apply(SessionEvent::Start, Instant::now())
    }

    pub fn input_changed(&mut self, input: impl Into<String>) -> Transition {
        self.apply(SessionEvent::Input(input.into()), Instant::now())
    }

    pub fn tick(&mut self) -> Transition {
        self.apply(SessionEvent::Tick, Instant::now())
    }

    pub fn reset(&mut self) -> Transition {
        self.apply(SessionEvent::Reset, Instant::now())
    }

    pub fn set_time_limit(&mut self, secs: u32) -> Transition {
        self.apply(SessionEvent::SetTimeLimit(secs), Instant::now())
    }

    pub fn set_target_text(&mut self, text: impl Into<String>) -> Transition {
        self.apply(SessionEvent::SetTargetText(text.into()), Instant::now())
    }

    fn begin(&mut self, now: Instant) {
        self.clear();
        self.lifecycle = Lifecycle::Active;
        self.started_at = Some(now);
        info!(
            target: "session",
            time_limit = self.time_limit,
            words = split_words(&self.target).len(),
            "session.start"
        );
    }

    fn clear(&mut self) {
        self.input.clear();
        self.lifecycle = Lifecycle::Idle;
        self.started_at = None;
        self.time_remaining = self.time_limit;
        self.score = ScoreCard::default();
        self.wpm_samples.clear();
        self.result = None;
        self.result_pending = false;
    }

    fn update_input(&mut self, input: String, now: Instant) -> Transition {
        self.score = compute_metrics(&self.target, &input, self.elapsed_secs(now));
        self.input = input;

        if is_final_word_complete(&self.target, &self.input) {
            self.complete(CompletionCause::TextComplete);
            return Transition::Completed(CompletionCause::TextComplete);
        }
        Transition::Updated
    }

    fn on_tick(&mut self, now: Instant) -> Transition {
        self.time_remaining = self.time_remaining.saturating_sub(1);
        let sample = WpmSample::new(self.elapsed_secs(now), self.score.wpm);
        push_sample(&mut self.wpm_samples, sample);

        if self.time_remaining == 0 {
            self.complete(CompletionCause::TimeUp);
            return Transition::Completed(CompletionCause::TimeUp);
        }
        Transition::Ticked
    }

    fn complete(&mut self, cause: CompletionCause) {
        if self.lifecycle != Lifecycle::Active {
            return;
        }
        if cause == CompletionCause::TimeUp {
            self.time_remaining = 0;
        }
        self.lifecycle = Lifecycle::Complete;

        let result = TestResult {
            wpm: self.score.rounded_wpm(),
            accuracy: self.score.rounded_accuracy(),
            errors: self.score.errors,
            time_limit: self.time_limit,
            words_typed: split_words(&self.input).len(),
            characters_typed: self.input.chars().count(),
            timestamp: Local::now(),
        };
        info!(
            target: "session",
            ?cause,
            wpm = result.wpm,
            accuracy = result.accuracy,
            errors = result.errors,
            "session.complete"
        );
        self.result = Some(result);
        self.result_pending = true;
    }

    fn elapsed_secs(&self, now: Instant) -> f64 {
        self.started_at
            .map(|started| now.saturating_duration_since(started).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Hands out the completed result exactly once per completion.
    pub fn take_result(&mut self) -> Option<TestResult> {
        if !self.result_pending {
            return None;
        }
        self.result_pending = false;
        self.result.clone()
    }

    /// The frozen result of a completed session, readable any number of times.
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn is_complete(&self) -> bool {
        self.lifecycle == Lifecycle::Complete
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn score(&self) -> &ScoreCard {
        &self.score
    }

    pub fn current_word_index(&self) -> usize {
        self.score.current_word_index
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            wpm: self.score.wpm,
            accuracy: self.score.accuracy,
            errors: self.score.errors,
            time_remaining: self.time_remaining,
        }
    }

    pub fn wpm_samples(&self) -> &[WpmSample] {
        &self.wpm_samples
    }

    pub fn alignment(&self) -> Vec<WordAlignment<'_>> {
        align(
            &self.target,
            &self.input,
            self.score.current_word_index,
            self.lifecycle,
        )
    }
}
