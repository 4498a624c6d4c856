use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::games::{Game, GameKind};
use crate::scores::BestScores;

/// Tiles per row on the home screen
pub const HOME_COLS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Home,
    Game(GameKind),
}

impl Tab {
    pub fn all() -> Vec<Tab> {
        std::iter::once(Tab::Home)
            .chain(GameKind::ALL.iter().map(|k| Tab::Game(*k)))
            .collect()
    }

    pub fn title(&self) -> String {
        match self {
            Tab::Home => " Home ".to_string(),
            Tab::Game(kind) => format!(" {} ", kind.title()),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Game(kind) => kind.index() + 1,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub current_tab: Tab,
    pub selected_game: usize,
    pub games: Vec<Box<dyn Game>>,
    pub best_scores: BestScores,
    pub show_high_scores: bool,
}

impl App {
    pub fn new(best_scores: BestScores, start: Option<GameKind>) -> Self {
        let mut games: Vec<Box<dyn Game>> = GameKind::ALL.iter().map(|k| k.create()).collect();
        for (kind, game) in GameKind::ALL.iter().zip(games.iter_mut()) {
            if let Some(key) = kind.best_key() {
                game.set_best(best_scores.get(key));
            }
        }
        Self {
            should_quit: false,
            current_tab: start.map(Tab::Game).unwrap_or(Tab::Home),
            selected_game: start.map(|k| k.index()).unwrap_or(0),
            games,
            best_scores,
            show_high_scores: false,
        }
    }

    pub fn active_game(&mut self) -> Option<&mut Box<dyn Game>> {
        match self.current_tab {
            Tab::Home => None,
            Tab::Game(kind) => self.games.get_mut(kind.index()),
        }
    }

    pub fn on_tick(&mut self, dt_ms: u64) {
        if let Some(game) = self.active_game() {
            game.update(dt_ms);
        }
        self.check_submit_scores();
    }

    fn check_submit_scores(&mut self) {
        let mut dirty = false;
        for (kind, game) in GameKind::ALL.iter().zip(self.games.iter_mut()) {
            let Some(key) = kind.best_key() else { continue };
            let game_over = game.is_game_over();
            if game_over && !self.best_scores.was_submitted(key) {
                self.best_scores.mark_submitted(key);
                let score = game.get_score();
                debug!(game = kind.key(), score, "run finished");
                if self.best_scores.record(key, score) {
                    info!(game = kind.key(), score, "new best score");
                    game.set_best(score);
                    dirty = true;
                }
            }
            if !game_over && self.best_scores.was_submitted(key) {
                self.best_scores.clear_submitted(key);
            }
        }
        if dirty {
            if let Err(e) = self.best_scores.save() {
                warn!(error = %e, "failed to save best scores");
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // Global keys
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                if matches!(self.current_tab, Tab::Home) {
                    self.should_quit = true;
                    return;
                }
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.prev_tab();
                } else {
                    self.next_tab();
                }
                return;
            }
            KeyCode::BackTab => {
                self.prev_tab();
                return;
            }
            KeyCode::Esc => {
                if !matches!(self.current_tab, Tab::Home) {
                    self.current_tab = Tab::Home;
                    return;
                }
            }
            _ => {}
        }

        if matches!(self.current_tab, Tab::Home) {
            self.on_home_key(key);
            return;
        }

        // Forward to active game
        if let Some(game) = self.active_game() {
            game.handle_input(key);
        }
    }

    fn on_home_key(&mut self, key: KeyEvent) {
        let count = GameKind::ALL.len();
        match key.code {
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.show_high_scores = !self.show_high_scores;
            }
            KeyCode::Right => self.selected_game = (self.selected_game + 1) % count,
            KeyCode::Left => self.selected_game = (self.selected_game + count - 1) % count,
            KeyCode::Down => self.selected_game = (self.selected_game + HOME_COLS) % count,
            KeyCode::Up => self.selected_game = (self.selected_game + count - HOME_COLS) % count,
            KeyCode::Enter | KeyCode::Char(' ') => {
                let kind = GameKind::ALL[self.selected_game];
                debug!(game = kind.key(), "launching");
                self.current_tab = Tab::Game(kind);
            }
            _ => {}
        }
    }

    fn next_tab(&mut self) {
        let tabs = Tab::all();
        let idx = self.current_tab.index();
        self.current_tab = tabs[(idx + 1) % tabs.len()];
        self.sync_selection();
    }

    fn prev_tab(&mut self) {
        let tabs = Tab::all();
        let idx = self.current_tab.index();
        self.current_tab = tabs[(idx + tabs.len() - 1) % tabs.len()];
        self.sync_selection();
    }

    fn sync_selection(&mut self) {
        if let Tab::Game(kind) = self.current_tab {
            self.selected_game = kind.index();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let scores = BestScores::load(&dir.path().join("best.json"));
        (dir, App::new(scores, None))
    }

    #[test]
    fn test_home_navigation_wraps() {
        let (_dir, mut app) = app();
        app.on_key(press(KeyCode::Left));
        assert_eq!(app.selected_game, GameKind::ALL.len() - 1);
        app.on_key(press(KeyCode::Right));
        assert_eq!(app.selected_game, 0);
        app.on_key(press(KeyCode::Down));
        assert_eq!(app.selected_game, HOME_COLS);
        app.on_key(press(KeyCode::Up));
        app.on_key(press(KeyCode::Up));
        assert_eq!(app.selected_game, GameKind::ALL.len() - HOME_COLS);
    }

    #[test]
    fn test_enter_launches_and_esc_returns() {
        let (_dir, mut app) = app();
        app.on_key(press(KeyCode::Right));
        app.on_key(press(KeyCode::Enter));
        assert_eq!(app.current_tab, Tab::Game(GameKind::ALL[1]));
        app.on_key(press(KeyCode::Char('q')));
        assert!(!app.should_quit);
        app.on_key(press(KeyCode::Esc));
        assert_eq!(app.current_tab, Tab::Home);
        app.on_key(press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_tab_cycles_through_every_game() {
        let (_dir, mut app) = app();
        for _ in 0..Tab::all().len() {
            app.on_key(press(KeyCode::Tab));
        }
        assert_eq!(app.current_tab, Tab::Home);
        app.on_key(press(KeyCode::BackTab));
        assert_eq!(app.current_tab, Tab::Game(GameKind::Whack));
        assert_eq!(app.selected_game, GameKind::Whack.index());
    }

    #[test]
    fn test_start_game_opens_directly() {
        let dir = tempfile::tempdir().unwrap();
        let scores = BestScores::load(&dir.path().join("best.json"));
        let app = App::new(scores, Some(GameKind::Tetris));
        assert_eq!(app.current_tab, Tab::Game(GameKind::Tetris));
        assert_eq!(app.selected_game, GameKind::Tetris.index());
    }

    #[test]
    fn test_finished_run_is_submitted_once() {
        let (_dir, mut app) = app();
        app.current_tab = Tab::Game(GameKind::Snake);
        // Snake heads right from column 10 and hits the wall
        for _ in 0..40 {
            app.on_tick(100);
        }
        assert!(app.games[GameKind::Snake.index()].is_game_over());
        assert!(app.best_scores.was_submitted("snakeBest"));
        let score = app.games[GameKind::Snake.index()].get_score();
        assert_eq!(app.best_scores.get("snakeBest"), score);

        app.on_key(press(KeyCode::Char('r')));
        app.on_tick(1);
        assert!(!app.best_scores.was_submitted("snakeBest"));
    }
}
