//! App: terminal init, main loop, frame pacing, input and event dispatch.

use crate::audio::Chime;
use crate::game::{GameEvent, GameState};
use crate::input::{self, Action, PointerEvent};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    chime: Chime,
    frame_interval: Duration,
    last_frame: Instant,
    /// TachyonFX flash over the just-cleared cells (created when a clear lands).
    clear_effect: Option<Effect>,
    /// Last time we processed the clear flash (for delta).
    clear_effect_time: Option<Instant>,
    quit_selected: QuitOption,
}

impl App {
    pub fn new(args: &Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let state = GameState::new(theme.clone(), &config);
        let chime = Chime::new(config.mute);
        let frame_interval = Duration::from_secs_f64(1.0 / args.frame_rate.max(1.0));
        Ok(Self {
            config,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            chime,
            frame_interval,
            last_frame: Instant::now(),
            clear_effect: None,
            clear_effect_time: None,
            quit_selected: QuitOption::Resume,
        })
    }

    /// Fresh board; bump the seed so every restart deals a new layout while
    /// staying reproducible from --seed.
    fn reset_game(&mut self) {
        self.config.seed = self.config.seed.wrapping_add(1);
        self.state = GameState::new(self.theme.clone(), &self.config);
        self.clear_effect = None;
        self.clear_effect_time = None;
        self.paused = false;
        self.screen = Screen::Playing;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
                size,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        // Size the grid to fit the terminal; respect --size when it fits.
        let (term_cols, term_rows) = size()?;
        let fit = crate::ui::max_grid_for_terminal(term_cols, term_rows, &self.config);
        let clamped = self.config.grid_size.min(fit).max(2);
        if clamped != self.config.grid_size {
            self.config.grid_size = clamped;
            self.state = GameState::new(self.theme.clone(), &self.config);
        }

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    self.paused,
                    self.chime.is_muted(),
                    self.config.no_animation,
                    &mut self.clear_effect,
                    &mut self.clear_effect_time,
                    now,
                    (self.screen == Screen::QuitMenu).then_some(self.quit_selected),
                )
            })?;

            if self.clear_effect.as_ref().is_some_and(|e| e.done()) {
                self.state.last_clear.clear();
                self.clear_effect = None;
                self.clear_effect_time = None;
            }

            let next_frame = self.last_frame + self.frame_interval;
            let timeout = next_frame.saturating_duration_since(Instant::now());

            // Drain input in arrival order before the per-frame state update.
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.handle_key(key) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => {
                            if let Some(pointer) = input::mouse_to_pointer(mouse) {
                                self.handle_pointer(pointer);
                            }
                        }
                        _ => {}
                    }
                }
            }

            if self.last_frame.elapsed() >= self.frame_interval {
                self.last_frame = Instant::now();
                if self.screen == Screen::Playing && !self.paused {
                    self.state.tick();
                    for event in self.state.drain_events() {
                        if matches!(event, GameEvent::Cleared { .. }) {
                            // New clear: rebuild the flash over the fresh cell set.
                            self.clear_effect = None;
                            self.clear_effect_time = None;
                        }
                        self.chime.play(&event);
                    }
                }
            }
        }
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let action = input::key_to_action(key);
        match self.screen {
            Screen::Playing => {
                if self.paused {
                    match action {
                        Action::Pause => self.paused = false,
                        Action::Quit => {
                            self.paused = false;
                            self.screen = Screen::QuitMenu;
                            self.quit_selected = QuitOption::Resume;
                        }
                        _ => {}
                    }
                } else {
                    match action {
                        Action::Quit => {
                            self.screen = Screen::QuitMenu;
                            self.quit_selected = QuitOption::Resume;
                        }
                        Action::Pause => self.paused = true,
                        Action::Restart => self.reset_game(),
                        Action::Mute => self.chime.toggle_mute(),
                        Action::None => {}
                    }
                }
            }
            Screen::QuitMenu => match key.code {
                KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Restart,
                        QuitOption::Restart => QuitOption::Exit,
                        QuitOption::Exit => QuitOption::Resume,
                    };
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Exit,
                        QuitOption::Restart => QuitOption::Resume,
                        QuitOption::Exit => QuitOption::Restart,
                    };
                }
                KeyCode::Enter | KeyCode::Char(' ') => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Restart => self.reset_game(),
                    QuitOption::Exit => return true,
                },
                _ => {
                    if action == Action::Quit || action == Action::Pause {
                        self.screen = Screen::Playing;
                    }
                }
            },
        }
        false
    }

    /// Translate a pointer gesture from terminal cells to board pixels and
    /// feed it to the game. One terminal cell is one pixel wide and two tall.
    fn handle_pointer(&mut self, pointer: PointerEvent) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        let rect = crate::ui::board_rect(Rect::new(0, 0, cols, rows), &self.state);
        match pointer {
            PointerEvent::Down(col, row) => {
                if col >= rect.x
                    && col < rect.x + rect.width
                    && row >= rect.y
                    && row < rect.y + rect.height
                {
                    let (px, py) = to_board_pixels(rect, col, row);
                    self.state.pointer_down(px, py);
                }
            }
            PointerEvent::Moved(col, row) => {
                // Drags may wander off the board; the board clamps them.
                let (px, py) = to_board_pixels(rect, col, row);
                self.state.pointer_moved(px, py);
            }
            PointerEvent::Up => self.state.pointer_up(),
        }
    }
}

fn to_board_pixels(rect: Rect, col: u16, row: u16) -> (i32, i32) {
    let px = i32::from(col) - i32::from(rect.x);
    let py = (i32::from(row) - i32::from(rect.y)) * 2;
    (px, py)
}
