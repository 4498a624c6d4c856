use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas};
use crate::games::gems::{self, Grid, Picker};
use crate::games::Game;

const START_MOVES: u32 = 30;
/// Per three-gem window in a run, so a run of four counts twice
const WINDOW_POINTS: u32 = 50;

const GEM_COLORS: [Color; 6] = [
    Color::Rgb(239, 68, 68),
    Color::Rgb(250, 204, 21),
    Color::Rgb(34, 197, 94),
    Color::Rgb(59, 130, 246),
    Color::Rgb(168, 85, 247),
    Color::Rgb(249, 115, 22),
];

pub struct Match3 {
    grid: Grid,
    picker: Picker,
    score: u32,
    best: u32,
    moves: u32,
    cascades: u32,
    rng: StdRng,
}

impl Match3 {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        Self {
            grid: gems::random_grid(&mut rng),
            picker: Picker::default(),
            score: 0,
            best: 0,
            moves: START_MOVES,
            cascades: 0,
            rng,
        }
    }

    fn try_swap(&mut self, a: (usize, usize), b: (usize, usize)) -> bool {
        if self.moves == 0 {
            return false;
        }
        gems::swap(&mut self.grid, a, b);
        if gems::find_runs(&self.grid).is_empty() {
            gems::swap(&mut self.grid, a, b);
            return false;
        }
        self.moves -= 1;
        self.resolve();
        if self.moves == 0 {
            debug!(score = self.score, "match3 out of moves");
        }
        true
    }

    /// Clears runs until the board settles
    fn resolve(&mut self) {
        self.cascades = 0;
        loop {
            let runs = gems::find_runs(&self.grid);
            if runs.is_empty() {
                break;
            }
            let windows: usize = runs.iter().map(|r| r.len() - 2).sum();
            self.score += windows as u32 * WINDOW_POINTS;
            gems::clear_runs(&mut self.grid, &runs);
            gems::collapse(&mut self.grid);
            gems::refill(&mut self.grid, &mut self.rng);
            self.cascades += 1;
        }
    }
}

impl Game for Match3 {
    fn update(&mut self, _dt_ms: u64) {}

    fn handle_input(&mut self, key: KeyEvent) {
        let swap = match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.reset();
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.moves == 0 => {
                self.reset();
                None
            }
            _ if self.moves == 0 => None,
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.picker.toggle();
                None
            }
            KeyCode::Up => self.picker.arrow(-1, 0),
            KeyCode::Down => self.picker.arrow(1, 0),
            KeyCode::Left => self.picker.arrow(0, -1),
            KeyCode::Right => self.picker.arrow(0, 1),
            _ => None,
        };
        if let Some((a, b)) = swap {
            self.try_swap(a, b);
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "💎 Match 3", Color::Rgb(255, 120, 200));

        let mut parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Moves: {}", self.moves), Color::Cyan),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        if self.cascades > 1 {
            parts.push((format!("Cascade x{}", self.cascades), Color::Magenta));
        }
        canvas::render_lines(frame, status, canvas::status_line("💎", parts));

        let mut c = Canvas::new(field.width, field.height, Color::Rgb(17, 17, 17));
        gems::draw_grid(&mut c, &self.grid, &self.picker, &GEM_COLORS, '●');
        canvas::render_canvas(frame, field, c);

        let line = if self.moves == 0 {
            canvas::game_over_line(&format!("Out of moves! Final Score: {}", self.score))
        } else {
            canvas::help_line(&[("↑↓←→", "Cursor"), ("ENTER", "Pick, then arrow to swap"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Match3::with_rng(rng);
        self.best = best;
    }

    fn get_score(&self) -> u32 {
        self.score
    }

    fn is_game_over(&self) -> bool {
        self.moves == 0
    }

    fn set_best(&mut self, best: u32) {
        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A board with no runs where swapping (0,2)↔(1,2) lines up three 7s on row 0
    fn staged() -> Match3 {
        let mut m = Match3::with_seed(1);
        for (r, row) in m.grid.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = Some(((r + c) % 2 + 2 * (r % 2)) as u8);
            }
        }
        m.grid[0][0] = Some(7);
        m.grid[0][1] = Some(7);
        m.grid[1][2] = Some(7);
        m
    }

    #[test]
    fn test_swap_without_match_reverts() {
        let mut m = staged();
        let before = m.grid;
        assert!(!m.try_swap((5, 5), (5, 6)));
        assert_eq!(m.grid, before);
        assert_eq!(m.moves, START_MOVES);
    }

    #[test]
    fn test_matching_swap_scores_and_spends_move() {
        let mut m = staged();
        assert!(m.try_swap((0, 2), (1, 2)));
        assert_eq!(m.moves, START_MOVES - 1);
        assert!(m.score >= WINDOW_POINTS);
        assert!(gems::find_runs(&m.grid).is_empty());
        assert!(m.grid.iter().flatten().all(Option::is_some));
    }

    #[test]
    fn test_swap_through_picker() {
        let mut m = staged();
        m.picker.cursor = (0, 2);
        m.handle_input(KeyEvent::from(KeyCode::Enter));
        m.handle_input(KeyEvent::from(KeyCode::Down));
        assert_eq!(m.moves, START_MOVES - 1);
    }

    #[test]
    fn test_game_ends_at_zero_moves() {
        let mut m = staged();
        m.moves = 1;
        m.try_swap((0, 2), (1, 2));
        assert!(m.is_game_over());
        let score = m.score;
        m.handle_input(KeyEvent::from(KeyCode::Enter));
        assert_eq!(m.moves, START_MOVES);
        assert_eq!(m.best, score);
    }
}
