mod ui;

use clackr::{
    app_dirs::AppDirs,
    clock::SessionClock,
    config::{snap_time_limit, Config, ConfigStore, FileConfigStore},
    driver::SessionDriver,
    history::{export_csv, Analytics, PerformanceBadge},
    recorder::{MemoryRecorder, ResultRecorder, SqliteRecorder, HISTORY_LIMIT},
    runtime::{ClackEvent, CrosstermEventSource, Runner},
    scoring::{compute_metrics, is_final_word_complete, ScoreCard},
    session::{Session, SessionEvent},
    text::{TextConfig, TextGenerator, TextMode, TextProvider},
};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use serde::Serialize;
use std::{
    error::Error,
    fs::{File, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// typing speed test with live wpm, accuracy and error tracking
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing speed test for the terminal. Type against generated or custom text while wpm, accuracy and errors update live; finished tests are saved to a local history."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// number of seconds to run test (snapped to 15, 30, 60 or 120)
    #[clap(short = 's', long = "secs")]
    number_of_secs: Option<u32>,

    /// number of words to use in test
    #[clap(short = 'w', long = "words")]
    number_of_words: Option<usize>,

    /// number of generated sentences to use instead of single words
    #[clap(short = 'f', long = "sentences")]
    number_of_sentences: Option<usize>,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// name shown with your results
    #[clap(short = 'u', long = "name")]
    username: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// score an input against a target once and print the metrics as json
    Score {
        #[clap(long)]
        target: String,
        #[clap(long)]
        input: String,
        /// seconds elapsed since the test started
        #[clap(long, default_value_t = 60.0)]
        elapsed: f64,
    },
    /// show recent results and aggregate statistics
    History {
        /// write the history to a csv file instead of printing it
        #[clap(long)]
        export: Option<PathBuf>,
        /// delete all saved results
        #[clap(long)]
        clear: bool,
    },
}

impl Cli {
    fn overrides_config(&self) -> bool {
        self.number_of_secs.is_some()
            || self.number_of_words.is_some()
            || self.number_of_sentences.is_some()
            || self.prompt.is_some()
            || self.username.is_some()
    }

    /// Layer command line flags over the stored configuration
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(secs) = self.number_of_secs {
            config.time_limit = snap_time_limit(secs);
        }
        if let Some(words) = self.number_of_words {
            config.word_count = words;
            config.text_mode = TextMode::Words;
        }
        if let Some(sentences) = self.number_of_sentences {
            config.sentence_count = sentences;
            config.text_mode = TextMode::Sentences;
        }
        if let Some(ref prompt) = self.prompt {
            config.custom_text = Some(prompt.clone());
            config.text_mode = TextMode::Custom;
        }
        if let Some(ref username) = self.username {
            config.username = username.trim().to_string();
        }
        config
    }
}

pub struct App {
    pub driver: SessionDriver<Box<dyn ResultRecorder>>,
    pub config: Config,
    pub status: Option<String>,
}

impl App {
    pub fn new(config: Config, recorder: Box<dyn ResultRecorder>) -> Self {
        let (text, status) = generate_text(&config.text_config());
        Self {
            driver: SessionDriver::new(
                Session::new(text, config.time_limit),
                SessionClock::default(),
                recorder,
            ),
            config,
            status,
        }
    }

    pub fn dispatch(&mut self, event: SessionEvent) {
        if let Err(err) = self.driver.dispatch(event) {
            self.status = Some(format!("result not saved: {err}"));
        }
    }

    /// Same text again
    fn restart(&mut self) {
        self.status = None;
        self.dispatch(SessionEvent::Reset);
    }

    fn new_text(&mut self) {
        self.restart();
        let (text, status) = generate_text(&self.config.text_config());
        self.status = status;
        self.dispatch(SessionEvent::SetTargetText(text));
    }

    fn edit_input(&mut self, edit: impl FnOnce(&mut String)) {
        let mut input = self.driver.session().input().to_owned();
        edit(&mut input);
        self.dispatch(SessionEvent::Input(input));
    }

    /// Returns false when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }
        let complete = self.driver.session().is_complete();

        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Left => self.restart(),
            KeyCode::Right => self.new_text(),
            KeyCode::Tab => self.dispatch(SessionEvent::Start),
            KeyCode::Char('r') if complete => self.restart(),
            KeyCode::Char('n') if complete => self.new_text(),
            KeyCode::Backspace if self.driver.session().is_active() => {
                self.edit_input(|input| {
                    input.pop();
                });
            }
            KeyCode::Char(c) if !complete => self.edit_input(|input| input.push(c)),
            _ => {}
        }
        true
    }
}

/// Falls back to random words when the configured source cannot produce text
fn generate_text(config: &TextConfig) -> (String, Option<String>) {
    match TextGenerator::new(config.clone()).target_text() {
        Ok(text) => (text, None),
        Err(err) => {
            warn!(target: "text", error = %err, "falling back to word mode");
            let fallback = TextGenerator::new(TextConfig {
                mode: TextMode::Words,
                ..config.clone()
            });
            (fallback.target_text().unwrap_or_default(), Some(err.to_string()))
        }
    }
}

fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_env("CLACKR_LOG") else {
        return;
    };
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

#[derive(Serialize)]
struct ScoreReport {
    #[serde(flatten)]
    card: ScoreCard,
    final_word_complete: bool,
}

fn run_score(target: &str, input: &str, elapsed: f64) -> Result<(), Box<dyn Error>> {
    let report = ScoreReport {
        card: compute_metrics(target, input, elapsed),
        final_word_complete: is_final_word_complete(target, input),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_history(export: Option<PathBuf>, clear: bool) -> Result<(), Box<dyn Error>> {
    let recorder = SqliteRecorder::new()?;

    if clear {
        recorder.clear_history()?;
        println!("history cleared");
        return Ok(());
    }

    let history = recorder.history(HISTORY_LIMIT)?;

    if let Some(path) = export {
        export_csv(&history, File::create(&path)?)?;
        println!("exported {} results to {}", history.len(), path.display());
        return Ok(());
    }

    if history.is_empty() {
        println!("no results yet");
        return Ok(());
    }

    let analytics = Analytics::from_history(&history);
    let profile = recorder.profile()?;
    let username = FileConfigStore::new().load().username;
    if !username.is_empty() {
        println!("{username}");
    }
    println!(
        "avg {} wpm / {}% acc over the last {} tests, best {} wpm, consistency ±{:.1} wpm",
        analytics.avg_wpm,
        analytics.avg_accuracy,
        history.len().min(clackr::history::RECENT_WINDOW),
        analytics.best_wpm,
        analytics.wpm_std_dev,
    );
    println!(
        "lifetime: {} tests, avg {} wpm, best {} wpm",
        profile.total_tests, profile.avg_wpm, profile.best_wpm
    );
    println!();
    println!(
        "{:<20} {:>5} {:>5} {:>6} {:>5} {:>6}  rating",
        "date", "wpm", "acc", "errors", "time", "words"
    );
    for result in &history {
        println!(
            "{:<20} {:>5} {:>4}% {:>6} {:>4}s {:>6}  {}",
            result.timestamp.format("%b %d, %Y %H:%M"),
            result.wpm,
            result.accuracy,
            result.errors,
            result.time_limit,
            result.words_typed,
            PerformanceBadge::classify(result.wpm, result.accuracy),
        );
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command.clone() {
        Some(Command::Score {
            target,
            input,
            elapsed,
        }) => return run_score(&target, &input, elapsed),
        Some(Command::History { export, clear }) => return run_history(export, clear),
        None => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    if cli.overrides_config() {
        if let Err(err) = store.save(&config) {
            warn!(target: "config", error = %err, "could not save config");
        }
    }

    let recorder: Box<dyn ResultRecorder> = match SqliteRecorder::new() {
        Ok(recorder) => Box::new(recorder),
        Err(err) => {
            warn!(target: "recorder", error = %err, "history unavailable, keeping results in memory");
            Box::new(MemoryRecorder::new())
        }
    };
    let mut app = App::new(config, recorder);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new());

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step(app.driver.clock_mut()) {
            ClackEvent::Tick => app.dispatch(SessionEvent::Tick),
            ClackEvent::Resize => {}
            ClackEvent::Closed => break,
            ClackEvent::Key(key) => {
                if !app.handle_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}
