mod ui;

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs::OpenOptions,
    io::{self, stdin},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

use typesprint::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, Overrides},
    countdown::Countdown,
    feedback::{BellQueue, BellSink, FeedbackSink},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    store::{LeaderboardEntry, ResultStore, ResultsSummary, SqliteResultStore, TestResult, DEFAULT_LIMIT},
    texts::{Difficulty, PassageBank, TextProvider},
    StatsSnapshot, TypingEngine,
};

/// typing speed test with live wpm, timed challenges and a local leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type a passage as fast and accurately as you can. Live wpm and accuracy are shown while you type; the clock starts with your first keystroke and each difficulty has its own time limit."
)]
pub struct Cli {
    /// passage difficulty, which also sets the time limit (60s / 90s / 120s)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// custom passage to type instead of a random one
    #[clap(short = 'p', long, conflicts_with = "seed")]
    prompt: Option<String>,

    /// room name; everyone using the same room and difficulty types the same passage
    #[clap(short = 's', long, value_name = "ROOM")]
    seed: Option<String>,

    /// render mistyped characters like untyped ones
    #[clap(long)]
    hide_errors: bool,

    /// disable the terminal bell on errors and completion
    #[clap(long)]
    mute: bool,

    /// name to record on the leaderboard
    #[clap(short = 'u', long)]
    username: Option<String>,

    /// print the leaderboard and exit
    #[clap(long, conflicts_with = "history")]
    leaderboard: bool,

    /// print the most recent results and exit
    #[clap(long)]
    history: bool,

    /// remember the given options as the new defaults
    #[clap(long)]
    save: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            difficulty: self.difficulty,
            hide_errors: self.hide_errors,
            mute: self.mute,
            username: self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyOutcome {
    Continue,
    TimerStarted,
    Quit,
}

pub struct App {
    pub config: Config,
    pub state: AppState,
    pub engine: TypingEngine,
    pub countdown: Countdown,
    pub snapshot: StatsSnapshot,
    pub final_stats: Option<StatsSnapshot>,
    pub timed_out: bool,
    pub summary: ResultsSummary,
    pub leaderboard: Vec<LeaderboardEntry>,
    custom_prompt: Option<String>,
    seed: Option<String>,
    provider: TextProvider,
    store: Option<Box<dyn ResultStore>>,
    buffer: String,
}

impl App {
    pub fn new(
        config: Config,
        custom_prompt: Option<String>,
        provider: TextProvider,
        store: Option<Box<dyn ResultStore>>,
        sink: impl FeedbackSink + 'static,
    ) -> Self {
        let mut app = Self {
            countdown: Countdown::new(config.difficulty.time_limit_secs()),
            engine: TypingEngine::new("").with_sink(sink),
            config,
            state: AppState::Typing,
            snapshot: StatsSnapshot::default(),
            final_stats: None,
            timed_out: false,
            summary: ResultsSummary::default(),
            leaderboard: Vec::new(),
            custom_prompt,
            seed: None,
            provider,
            store,
            buffer: String::new(),
        };
        app.refresh_results();
        app.new_test();
        app
    }

    /// Pick passages by room name instead of at random
    pub fn with_seed(mut self, seed: Option<String>) -> Self {
        if seed.is_some() {
            self.seed = seed;
            self.new_test();
        }
        self
    }

    /// Fresh session on a new passage at the current difficulty
    pub fn new_test(&mut self) {
        let text = match (&self.custom_prompt, &self.seed) {
            (Some(prompt), _) => prompt.clone(),
            (None, Some(seed)) => self
                .provider
                .bank()
                .seeded_text(self.config.difficulty, seed)
                .to_string(),
            (None, None) => self.provider.next_text(self.config.difficulty),
        };
        self.engine.reset_with_text(&text);
        self.countdown = Countdown::new(self.config.difficulty.time_limit_secs());
        self.snapshot = StatsSnapshot::default();
        self.final_stats = None;
        self.timed_out = false;
        self.buffer.clear();
        self.state = AppState::Typing;
    }

    pub fn cycle_difficulty(&mut self) {
        self.config.difficulty = self.config.difficulty.next();
        self.new_test();
    }

    fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Esc => return KeyOutcome::Quit,
                KeyCode::Tab => self.new_test(),
                KeyCode::Backspace => {
                    let mut candidate = self.buffer.clone();
                    candidate.pop();
                    self.apply_input(candidate);
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    let mut candidate = self.buffer.clone();
                    candidate.push(c);
                    if self.apply_input(candidate) {
                        return KeyOutcome::TimerStarted;
                    }
                }
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
                KeyCode::Char('r') => self.new_test(),
                KeyCode::Char('d') => self.cycle_difficulty(),
                _ => {}
            },
        }
        KeyOutcome::Continue
    }

    /// Hand the whole input to the engine; returns true when the session just started
    pub fn apply_input(&mut self, candidate: String) -> bool {
        let Some(update) = self.engine.on_input(&candidate) else {
            return false;
        };
        self.buffer = candidate;
        self.snapshot = update.snapshot;

        if update.timer_started {
            self.countdown.start();
        }
        if let Some(final_stats) = update.completion {
            self.finish(final_stats, false);
        }
        update.timer_started
    }

    pub fn on_tick(&mut self) {
        if let Some(snapshot) = self.engine.tick() {
            self.snapshot = snapshot;
        }
        if self.countdown.on_tick() {
            if let Some(final_stats) = self.engine.force_complete() {
                self.finish(final_stats, true);
            }
        }
    }

    fn finish(&mut self, final_stats: StatsSnapshot, timed_out: bool) {
        self.countdown.stop();
        self.snapshot = final_stats;
        self.final_stats = Some(final_stats);
        self.timed_out = timed_out;
        self.state = AppState::Results;
        self.persist(&final_stats);
        self.refresh_results();
    }

    fn persist(&self, final_stats: &StatsSnapshot) {
        let Some(store) = &self.store else {
            return;
        };

        let result = TestResult::from_snapshot(final_stats, self.config.difficulty);
        if let Err(err) = store.save_result(&result) {
            tracing::warn!(%err, "unable to save test result");
        }

        if let Some(username) = &self.config.username {
            let entry = LeaderboardEntry {
                username: username.clone(),
                wpm: result.wpm,
                accuracy: result.accuracy,
                created_at: result.timestamp,
            };
            if let Err(err) = store.add_leaderboard_entry(&entry) {
                tracing::warn!(%err, "unable to save leaderboard entry");
            }
        }
    }

    fn refresh_results(&mut self) {
        let Some(store) = &self.store else {
            return;
        };

        match store.recent_results(DEFAULT_LIMIT) {
            Ok(results) => self.summary = ResultsSummary::from_results(&results),
            Err(err) => tracing::warn!(%err, "unable to load recent results"),
        }
        match store.leaderboard(5) {
            Ok(entries) => self.leaderboard = entries,
            Err(err) => tracing::warn!(%err, "unable to load leaderboard"),
        }
    }
}

fn init_logging() {
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

    let filter = EnvFilter::try_from_env("TYPESPRINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn print_leaderboard(store: &dyn ResultStore) -> anyhow::Result<()> {
    let entries = store.leaderboard(DEFAULT_LIMIT).context("reading leaderboard")?;
    if entries.is_empty() {
        println!("leaderboard is empty");
        return Ok(());
    }

    println!("{:<5} {:<20} {:>5} {:>5}", "rank", "name", "wpm", "acc");
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:<5} {:<20} {:>5} {:>4}%",
            rank + 1,
            entry.username,
            entry.wpm,
            entry.accuracy
        );
    }
    Ok(())
}

fn print_history(store: &dyn ResultStore) -> anyhow::Result<()> {
    let results = store.recent_results(DEFAULT_LIMIT).context("reading results")?;
    if results.is_empty() {
        println!("no results yet");
        return Ok(());
    }

    println!("{:<17} {:<7} {:>5} {:>5}", "date", "level", "wpm", "acc");
    for result in &results {
        println!(
            "{:<17} {:<7} {:>5} {:>4}%",
            result.timestamp.format("%Y-%m-%d %H:%M"),
            result.difficulty,
            result.wpm,
            result.accuracy
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    if cli.prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
        Cli::command()
            .error(ErrorKind::InvalidValue, "prompt must not be empty")
            .exit();
    }

    let config_store = FileConfigStore::new();
    let config = config_store.load().apply(cli.overrides());
    if cli.save {
        config_store.save(&config).context("saving config")?;
    }

    if cli.leaderboard || cli.history {
        let store = SqliteResultStore::open_default().context("opening result store")?;
        return if cli.leaderboard {
            print_leaderboard(&store)
        } else {
            print_history(&store)
        };
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store: Option<Box<dyn ResultStore>> = match SqliteResultStore::open_default() {
        Ok(store) => Some(Box::new(store)),
        Err(err) => {
            tracing::warn!(%err, "results will not be saved");
            None
        }
    };
    let provider = TextProvider::new(PassageBank::embedded().context("loading passages")?);
    let bells = BellQueue::new();
    let sink = BellSink::new(bells.clone(), config.sound_enabled);
    let mut app = App::new(config, cli.prompt.clone(), provider, store, sink).with_seed(cli.seed.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app, &bells);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend + io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    bells: &BellQueue,
) -> anyhow::Result<()> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => match app.on_key(key) {
                KeyOutcome::Quit => break,
                // the countdown's first second starts at the first keystroke
                KeyOutcome::TimerStarted => runner.realign(),
                KeyOutcome::Continue => {}
            },
        }
        bells.drain_into(terminal.backend_mut())?;
    }

    Ok(())
}
