pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use webbrowser::Browser;

use qwiz::{
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore},
    question::QuestionBank,
    quiz::{Quiz, ALL},
    runtime::{Countdown, CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    scores::HighScores,
    session::{GameStats, SessionConfig},
};

const TICK_RATE_MS: u64 = 100;

const TIMER_CHOICES: [Option<u64>; 5] = [None, Some(10), Some(15), Some(20), Some(30)];
const MIN_QUESTIONS: usize = 5;
const MAX_QUESTIONS: usize = 50;

/// terminal quiz game with timed questions and persistent high scores
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal quiz game that draws multiple-choice questions from a JSON bank, scores answers with speed bonuses, and keeps local high-score and player-statistics files."
)]
pub struct Cli {
    /// path to a custom question bank (JSON); defaults to the bundled bank
    #[clap(short = 'f', long)]
    questions_file: Option<PathBuf>,

    /// player name recorded with saved scores
    #[clap(short = 'p', long)]
    player: Option<String>,

    /// difficulty filter for new games
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<DifficultyArg>,

    /// category filter for new games ("all" plays every category)
    #[clap(short = 'c', long)]
    category: Option<String>,

    /// number of questions per game
    #[clap(short = 'n', long)]
    questions_per_game: Option<usize>,

    /// seconds allowed per question; 0 disables the countdown
    #[clap(short = 's', long)]
    seconds_per_question: Option<u64>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum DifficultyArg {
    All,
    Easy,
    Medium,
    Hard,
}

impl Cli {
    /// Layer CLI overrides on top of the persisted config.
    fn apply_to(&self, config: &mut Config) {
        if let Some(player) = &self.player {
            config.player_name = player.clone();
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty.to_string().to_lowercase();
        }
        if let Some(category) = &self.category {
            config.category = category.clone();
        }
        if let Some(n) = self.questions_per_game {
            config.questions_per_game = n.clamp(1, MAX_QUESTIONS);
        }
        if let Some(secs) = self.seconds_per_question {
            config.seconds_per_question = if secs == 0 { None } else { Some(secs) };
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Menu,
    Question,
    Reveal,
    Results,
    Scores,
    Players,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuField {
    Difficulty,
    Category,
    Count,
    Timer,
}

#[derive(Debug)]
pub struct MenuState {
    pub field: MenuField,
    pub difficulties: Vec<String>,
    pub difficulty_idx: usize,
    pub categories: Vec<String>,
    pub category_idx: usize,
    pub count: usize,
    pub timer_idx: usize,
    pub error: Option<String>,
}

impl MenuState {
    fn new(quiz: &Quiz, config: &Config) -> Self {
        let mut difficulties = vec![ALL.to_string()];
        difficulties.extend(quiz.available_difficulties());
        let mut categories = vec![ALL.to_string()];
        categories.extend(quiz.available_categories());

        let difficulty_idx = difficulties
            .iter()
            .position(|d| *d == config.difficulty)
            .unwrap_or(0);
        let category_idx = categories
            .iter()
            .position(|c| *c == config.category)
            .unwrap_or(0);
        let timer_idx = TIMER_CHOICES
            .iter()
            .position(|t| *t == config.seconds_per_question)
            .unwrap_or(2);

        Self {
            field: MenuField::Difficulty,
            difficulties,
            difficulty_idx,
            categories,
            category_idx,
            count: config.questions_per_game.clamp(1, MAX_QUESTIONS),
            timer_idx,
            error: None,
        }
    }

    pub fn timer_secs(&self) -> Option<u64> {
        TIMER_CHOICES[self.timer_idx]
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            MenuField::Difficulty => MenuField::Category,
            MenuField::Category => MenuField::Count,
            MenuField::Count => MenuField::Timer,
            MenuField::Timer => MenuField::Difficulty,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            MenuField::Difficulty => MenuField::Timer,
            MenuField::Category => MenuField::Difficulty,
            MenuField::Count => MenuField::Category,
            MenuField::Timer => MenuField::Count,
        };
    }

    fn adjust(&mut self, forward: bool) {
        match self.field {
            MenuField::Difficulty => {
                self.difficulty_idx =
                    cycle(self.difficulty_idx, self.difficulties.len(), forward);
            }
            MenuField::Category => {
                self.category_idx = cycle(self.category_idx, self.categories.len(), forward);
            }
            MenuField::Count => {
                self.count = if forward {
                    (self.count + MIN_QUESTIONS).min(MAX_QUESTIONS)
                } else {
                    self.count.saturating_sub(MIN_QUESTIONS).max(MIN_QUESTIONS)
                };
            }
            MenuField::Timer => {
                self.timer_idx = cycle(self.timer_idx, TIMER_CHOICES.len(), forward);
            }
        }
    }
}

fn cycle(idx: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    }
}

/// Outcome of the question just answered or skipped, for the reveal screen.
#[derive(Debug, Clone)]
pub struct Reveal {
    pub selected: Option<String>,
    pub was_correct: bool,
    pub correct_answer: String,
    pub points: u32,
    pub timed_out: bool,
}

#[derive(Debug)]
pub struct App {
    pub quiz: Quiz,
    pub high_scores: HighScores,
    pub config: Config,
    config_store: FileConfigStore,
    pub state: AppState,
    pub menu: MenuState,
    pub options: Vec<String>,
    pub selected: usize,
    pub hint: Option<String>,
    pub reveal: Option<Reveal>,
    pub name_input: String,
    pub score_saved: bool,
    pub final_stats: Option<GameStats>,
    pub got_high_score: bool,
    pub countdown: Countdown,
    timer_token: u64,
    pub celebration: Celebration,
}

impl App {
    pub fn new(
        quiz: Quiz,
        high_scores: HighScores,
        config: Config,
        config_store: FileConfigStore,
    ) -> Self {
        let menu = MenuState::new(&quiz, &config);
        let name_input = config.player_name.clone();
        Self {
            quiz,
            high_scores,
            config,
            config_store,
            state: AppState::Menu,
            menu,
            options: Vec::new(),
            selected: 0,
            hint: None,
            reveal: None,
            name_input,
            score_saved: false,
            final_stats: None,
            got_high_score: false,
            countdown: Countdown::new(),
            timer_token: 0,
            celebration: Celebration::new(),
        }
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            difficulty: self.menu.difficulties[self.menu.difficulty_idx].clone(),
            category: self.menu.categories[self.menu.category_idx].clone(),
            questions_per_game: self.menu.count,
            seconds_per_question: self.menu.timer_secs().map(|s| s as f64),
        }
    }

    pub fn start_game(&mut self) {
        if self.quiz.start_new_game(self.session_config()) {
            self.menu.error = None;
            self.final_stats = None;
            self.score_saved = false;
            self.got_high_score = false;
            self.present_question();
            self.state = AppState::Question;
        } else {
            self.menu.error = Some("No questions match those filters".to_string());
            self.state = AppState::Menu;
        }
    }

    /// Surface the question under the cursor: stamp its start time, deal
    /// fresh options, and arm the countdown.
    fn present_question(&mut self) {
        self.quiz.current_question();
        self.options = self.quiz.shuffled_options();
        self.selected = 0;
        self.hint = None;
        self.reveal = None;
        match self.quiz.session_config.seconds_per_question {
            Some(secs) => self.timer_token = self.countdown.start(secs),
            None => self.countdown.cancel(),
        }
    }

    pub fn submit_answer(&mut self) {
        self.countdown.cancel();
        let Some(selected) = self.options.get(self.selected).cloned() else {
            return;
        };
        let was_correct = self.quiz.check_answer(&selected);
        self.reveal = Some(Reveal {
            selected: Some(selected),
            was_correct,
            correct_answer: self.current_correct_answer(),
            points: self.quiz.last_points_awarded(),
            timed_out: false,
        });
        self.state = AppState::Reveal;
    }

    pub fn skip_current(&mut self, timed_out: bool) {
        self.countdown.cancel();
        self.quiz.skip_question();
        self.reveal = Some(Reveal {
            selected: None,
            was_correct: false,
            correct_answer: self.current_correct_answer(),
            points: 0,
            timed_out,
        });
        self.state = AppState::Reveal;
    }

    fn current_correct_answer(&self) -> String {
        self.quiz
            .peek_current()
            .map(|q| q.correct_answer.clone())
            .unwrap_or_default()
    }

    pub fn reveal_hint(&mut self) {
        self.hint = Some(self.quiz.use_hint());
    }

    /// Move on after a reveal; ends the session when the engine says so.
    pub fn advance_or_finish(&mut self, width: u16, height: u16) {
        if self.quiz.advance() {
            self.present_question();
            self.state = AppState::Question;
        } else {
            self.finish_game(width, height);
        }
    }

    fn finish_game(&mut self, width: u16, height: u16) {
        self.countdown.cancel();
        let stats = self.quiz.statistics();
        self.got_high_score = self.high_scores.is_high_score(stats.score, None, None);
        if self.got_high_score {
            self.celebration.start(width, height);
        }
        self.final_stats = Some(stats);
        self.state = AppState::Results;
    }

    pub fn save_final_score(&mut self) {
        if self.score_saved {
            return;
        }
        let Some(stats) = self.final_stats.clone() else {
            return;
        };
        self.high_scores
            .save_score(&self.name_input, stats.score, Some(&stats));
        self.score_saved = true;

        self.config.player_name = self.name_input.clone();
        self.config.difficulty = stats.difficulty;
        self.config.category = stats.category;
        self.config.questions_per_game = self.menu.count;
        self.config.seconds_per_question = self.menu.timer_secs();
        let _ = self.config_store.save(&self.config);
    }

    fn share_score(&self) {
        let Some(stats) = &self.final_stats else {
            return;
        };
        if Browser::is_available() {
            webbrowser::open(&format!(
                "https://twitter.com/intent/tweet?text=I%20scored%20{}%20points%20in%20qwiz%20({:.0}%25%20accuracy)",
                stats.score, stats.accuracy
            ))
            .unwrap_or_default();
        }
    }

    fn back_from_tables(&mut self) {
        self.state = if self.final_stats.is_some() {
            AppState::Results
        } else {
            AppState::Menu
        };
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply_to(&mut config);

    let bank = match &cli.questions_file {
        Some(path) => QuestionBank::from_path(path),
        None => QuestionBank::bundled(),
    };
    if bank.is_empty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, "question bank is empty").exit();
    }

    let quiz = Quiz::new(bank);
    let high_scores = HighScores::new();
    let mut app = App::new(quiz, high_scores, config, config_store);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            QuizEvent::Tick => {
                let dt = TICK_RATE_MS as f64 / 1000.0;
                if app.state == AppState::Question {
                    let token = app.timer_token;
                    if app.countdown.tick(token, dt) {
                        app.skip_current(true);
                    }
                }
                app.celebration.update(dt);
            }
            QuizEvent::Resize => {}
            QuizEvent::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break;
                }

                match app.state {
                    AppState::Menu => match key.code {
                        KeyCode::Esc => break,
                        KeyCode::Up => app.menu.prev_field(),
                        KeyCode::Down => app.menu.next_field(),
                        KeyCode::Left => app.menu.adjust(false),
                        KeyCode::Right => app.menu.adjust(true),
                        KeyCode::Enter => app.start_game(),
                        KeyCode::Char('v') => app.state = AppState::Scores,
                        _ => {}
                    },
                    AppState::Question => match key.code {
                        KeyCode::Esc => {
                            app.countdown.cancel();
                            app.state = AppState::Menu;
                        }
                        KeyCode::Up => {
                            if app.selected > 0 {
                                app.selected -= 1;
                            }
                        }
                        KeyCode::Down => {
                            if app.selected + 1 < app.options.len() {
                                app.selected += 1;
                            }
                        }
                        KeyCode::Enter => app.submit_answer(),
                        KeyCode::Char('h') => app.reveal_hint(),
                        KeyCode::Char('s') => app.skip_current(false),
                        KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                            let idx = (c as u8 - b'1') as usize;
                            if idx < app.options.len() {
                                app.selected = idx;
                                app.submit_answer();
                            }
                        }
                        _ => {}
                    },
                    AppState::Reveal => match key.code {
                        KeyCode::Esc => {
                            app.countdown.cancel();
                            app.state = AppState::Menu;
                        }
                        KeyCode::Enter | KeyCode::Char(' ') => {
                            let size = terminal.size().unwrap_or_default();
                            app.advance_or_finish(size.width, size.height);
                        }
                        _ => {}
                    },
                    AppState::Results => {
                        if !app.score_saved {
                            match key.code {
                                KeyCode::Esc => break,
                                KeyCode::Enter => app.save_final_score(),
                                KeyCode::Backspace => {
                                    app.name_input.pop();
                                }
                                KeyCode::Char(c) => {
                                    if app.name_input.len() < 24 {
                                        app.name_input.push(c);
                                    }
                                }
                                _ => {}
                            }
                        } else {
                            match key.code {
                                KeyCode::Esc => break,
                                KeyCode::Char('r') => app.start_game(),
                                KeyCode::Char('n') => app.state = AppState::Menu,
                                KeyCode::Char('h') => app.state = AppState::Scores,
                                KeyCode::Char('p') => app.state = AppState::Players,
                                KeyCode::Char('t') => app.share_score(),
                                _ => {}
                            }
                        }
                    }
                    AppState::Scores | AppState::Players => match key.code {
                        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                            app.back_from_tables()
                        }
                        _ => {}
                    },
                }
            }
        }
    }

    Ok(())
}
