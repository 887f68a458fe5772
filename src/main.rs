pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use prepdrill::{
    app_dirs::AppDirs,
    celebration::CelebrationAnimation,
    config::{Config, ConfigStore, FileConfigStore, DEFAULT_MODULE},
    content::{ContentError, Module, ModuleCatalog},
    drill::{ActionMatch, Completion, DrillEngine, Phase, SequenceError},
    grading::{GradingError, InMemoryGrader},
    logging,
    progress::SessionProgress,
    quiz::{QuizSession, QuizStep},
    rewards::{Badge, BadgeBook},
    runtime::{CrosstermEventSource, DrillEvent, FixedTicker, Runner},
    timer::CountdownSignal,
    Activity,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::{mpsc, Arc},
};
use tracing::{debug, info, warn};

/// timed emergency-preparedness drills in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice emergency decisions under time pressure: briefed multiple-choice scenarios, a timed virtual drill and a knowledge quiz, with badges for strong runs."
)]
pub struct Cli {
    /// activity to run (defaults to the saved choice, then scenarios)
    #[clap(short = 'a', long, value_enum)]
    activity: Option<Activity>,

    /// id of the training module to load
    #[clap(short = 'm', long)]
    module: Option<String>,

    /// load a training module from a json file; it replaces a built-in module with the same id
    #[clap(long)]
    module_file: Option<PathBuf>,

    /// how a chosen drill action is compared to the expected one
    #[clap(long, value_enum)]
    action_match: Option<ActionMatch>,

    /// write logs here instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// remember the given activity, module and matching as defaults
    #[clap(long)]
    save_defaults: bool,
}

impl Cli {
    /// Flags win over saved defaults.
    fn settings(&self, saved: &Config) -> Config {
        Config {
            activity: self.activity.unwrap_or(saved.activity),
            module: self.module.clone().unwrap_or_else(|| saved.module.clone()),
            module_file: self.module_file.clone().or_else(|| saved.module_file.clone()),
            action_match: self.action_match.unwrap_or(saved.action_match),
        }
    }

    /// Built-in modules plus the module file, if any. A file named on the command line
    /// becomes the selected module unless `--module` names another. A saved file that no
    /// longer loads is dropped with a warning.
    fn catalog(&self, settings: &mut Config) -> Result<ModuleCatalog, ContentError> {
        let catalog = ModuleCatalog::builtin()?;
        let Some(path) = settings.module_file.clone() else {
            return Ok(catalog);
        };
        let module = match Module::from_path(&path) {
            Ok(module) => module,
            Err(err) if self.module_file.is_none() => {
                warn!(path = %path.display(), error = %err, "ignoring saved module file");
                settings.module_file = None;
                if catalog.get(&settings.module).is_err() {
                    settings.module = DEFAULT_MODULE.to_string();
                }
                return Ok(catalog);
            }
            Err(err) => return Err(err),
        };
        info!(path = %path.display(), module = %module.id, "loaded module file");

        if self.module_file.is_some() {
            // Saved defaults are read from any working directory.
            settings.module_file = Some(path.canonicalize().unwrap_or(path));
            if self.module.is_none() {
                settings.module = module.id.clone();
            }
        }
        Ok(catalog.with_module(module))
    }

    /// Merge flags with the saved defaults and load the modules, saving the merged
    /// settings when `--save-defaults` is given.
    fn prepare(&self, store: &impl ConfigStore) -> Result<(Config, ModuleCatalog), AppError> {
        let mut settings = self.settings(&store.load());
        let catalog = self.catalog(&mut settings)?;
        if self.save_defaults {
            store.save(&settings)?;
            info!(module = %settings.module, "saved defaults");
        }
        Ok((settings, catalog))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Grading(#[from] GradingError),

    #[error("cannot save defaults: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Scenarios or the virtual drill, driven by the engine phase
    Timed,
    Quiz,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub settings: Config,
    pub module: Module,
    pub state: AppState,
    pub engine: Option<DrillEngine>,
    pub quiz: Option<QuizSession>,
    pub quiz_cursor: usize,
    pub badges: BadgeBook,
    pub progress: SessionProgress,
    pub new_badge: Option<&'static Badge>,
    pub celebration: CelebrationAnimation,
    pub error: Option<String>,
    pub viewport: (u16, u16),
    grader: InMemoryGrader,
    completion_tx: mpsc::Sender<Completion>,
    completions: mpsc::Receiver<Completion>,
}

impl App {
    pub fn new(settings: Config, catalog: &ModuleCatalog) -> Result<Self, AppError> {
        let module = catalog.get(&settings.module)?.clone();
        let (completion_tx, completions) = mpsc::channel();

        let mut app = Self {
            settings,
            module,
            state: AppState::Timed,
            engine: None,
            quiz: None,
            quiz_cursor: 0,
            badges: BadgeBook::new(),
            progress: SessionProgress::new(),
            new_badge: None,
            celebration: CelebrationAnimation::default(),
            error: None,
            viewport: (80, 24),
            grader: InMemoryGrader::from_catalog(catalog),
            completion_tx,
            completions,
        };
        app.begin()?;
        Ok(app)
    }

    /// Build a fresh run of the configured activity, dropping whatever ran before.
    fn begin(&mut self) -> Result<(), AppError> {
        self.teardown();

        match self.settings.activity {
            Activity::Scenarios | Activity::Drill => {
                let sequence = if self.settings.activity == Activity::Drill {
                    self.module.drill_sequence(self.settings.action_match)?
                } else {
                    self.module.scenario_sequence()?
                };
                let mut engine = DrillEngine::new(Arc::new(sequence));
                let tx = self.completion_tx.clone();
                engine.on_complete(move |completion| {
                    // The receiver lives as long as the app.
                    let _ = tx.send(completion.clone());
                });
                self.engine = Some(engine);
                self.state = AppState::Timed;
            }
            Activity::Quiz => {
                self.quiz = Some(QuizSession::load(&self.grader, &self.module.id)?);
                self.quiz_cursor = 0;
                self.state = AppState::Quiz;
            }
        }

        info!(
            activity = %self.settings.activity,
            module = %self.module.id,
            "activity started"
        );
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(mut quiz) = self.quiz.take() {
            quiz.teardown();
        }
        if let Some(mut engine) = self.engine.take() {
            engine.restart();
        }
        while self.completions.try_recv().is_ok() {}
        self.celebration.stop();
        self.new_badge = None;
        self.error = None;
    }

    /// Start the current activity over.
    pub fn restart(&mut self) {
        self.celebration.stop();
        self.new_badge = None;
        self.error = None;
        if let Some(engine) = self.engine.as_mut() {
            engine.restart();
            self.state = AppState::Timed;
        }
        if let Some(quiz) = self.quiz.as_mut() {
            quiz.restart();
            self.quiz_cursor = 0;
            self.state = AppState::Quiz;
        }
    }

    /// Move on to the next activity of the module.
    pub fn switch_activity(&mut self, activity: Activity) {
        self.settings.activity = activity;
        if let Err(err) = self.begin() {
            warn!(error = %err, %activity, "cannot start activity");
            self.error = Some(err.to_string());
            self.state = AppState::Results;
        }
    }

    pub fn on_tick(&mut self, elapsed: std::time::Duration) {
        if let Some(engine) = self.engine.as_mut() {
            if engine.on_tick(elapsed) == CountdownSignal::Expired {
                debug!(index = engine.current_index(), "decision point timed out");
            }
        }
        self.collect_completions();
        self.celebration.update();
    }

    fn collect_completions(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            self.finish(completion.final_score);
        }
    }

    fn finish(&mut self, score: u8) {
        self.progress.record(self.settings.activity, score);
        self.new_badge = self.badges.record(self.settings.activity, score);
        if let Some(badge) = self.new_badge {
            self.celebration
                .start(self.viewport.0, self.viewport.1, badge.title);
        }
        self.state = AppState::Results;
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }

        match self.state {
            AppState::Timed => self.on_timed_key(key),
            AppState::Quiz => self.on_quiz_key(key),
            AppState::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Left => self.restart(),
                KeyCode::Char('n') | KeyCode::Right => {
                    self.switch_activity(next_activity(self.settings.activity))
                }
                KeyCode::Char('q') => return Flow::Quit,
                _ => {}
            },
        }

        self.collect_completions();
        Flow::Continue
    }

    fn on_timed_key(&mut self, key: KeyEvent) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match (engine.phase(), key.code) {
            (_, KeyCode::Left) => engine.restart(),
            (Phase::NotStarted, KeyCode::Enter | KeyCode::Char(' ')) => {
                engine.start();
            }
            (Phase::Counting, KeyCode::Char(c)) => {
                if let Some(response) = digit_index(c) {
                    engine.submit(response);
                }
            }
            (Phase::Resolved, KeyCode::Enter | KeyCode::Char(' ')) => {
                engine.advance();
            }
            _ => {}
        }
    }

    fn on_quiz_key(&mut self, key: KeyEvent) {
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };
        let options = quiz.current_question().map_or(0, |q| q.options.len());

        let mut finished = None;
        match key.code {
            KeyCode::Up => self.quiz_cursor = self.quiz_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.quiz_cursor + 1 < options {
                    self.quiz_cursor += 1;
                }
            }
            KeyCode::Left => {
                quiz.restart();
                self.quiz_cursor = 0;
            }
            KeyCode::Char(c) if digit_index(c).is_some_and(|i| i < options) => {
                if let Some(answer) = digit_index(c) {
                    if quiz.select(answer) {
                        self.quiz_cursor = answer;
                    }
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if quiz.validation().is_none() {
                    quiz.select(self.quiz_cursor);
                    quiz.validate_with(&self.grader);
                } else {
                    match quiz.next() {
                        QuizStep::Next { .. } => self.quiz_cursor = 0,
                        QuizStep::ReadyToSubmit => {
                            quiz.submit_with(&self.grader);
                            finished = quiz.result().map(|r| r.score);
                        }
                        QuizStep::Ignored => {}
                    }
                }
            }
            _ => {}
        }

        if let Some(score) = finished {
            self.finish(score);
        }
    }
}

/// '1' selects the first candidate.
fn digit_index(c: char) -> Option<usize> {
    c.to_digit(10).and_then(|d| (d as usize).checked_sub(1))
}

fn next_activity(activity: Activity) -> Activity {
    match activity {
        Activity::Scenarios => Activity::Drill,
        Activity::Drill => Activity::Quiz,
        Activity::Quiz => Activity::Scenarios,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = cli.log_file.clone().or_else(AppDirs::log_path);
    if let Err(err) = logging::init(log_path.as_deref()) {
        eprintln!("prepdrill: logging disabled: {err}");
    }

    let store = FileConfigStore::new();
    let (settings, catalog) = cli.prepare(&store)?;
    debug!(path = %store.path().display(), ?settings, "settings ready");

    let mut app = App::new(settings, &catalog)?;

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
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        let size = terminal.size().unwrap_or_default();
        app.viewport = (size.width, size.height);
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            DrillEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
            }
            DrillEvent::Tick(elapsed) => app.on_tick(elapsed),
            DrillEvent::Resize => {}
        }
    }

    if let Some(quiz) = app.quiz.as_mut() {
        quiz.teardown();
    }
    info!(points = app.badges.total_points(), "session closed");
    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
