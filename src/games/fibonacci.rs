use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas};
use crate::games::tiles::{self, Board, Dir, Fibonacci as FibRule, FIB};
use crate::games::Game;

const TARGET: u32 = 2584;
const SPAWNS: [(u32, u32); 2] = [(1, 1), (2, 1)];

fn rank(v: u32) -> usize {
    FIB.iter().rposition(|&f| f == v).unwrap_or(0)
}

pub struct Fibonacci {
    board: Board,
    score: u32,
    best: u32,
    won: bool,
    lost: bool,
    rng: StdRng,
}

impl Fibonacci {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let mut board = Board::default();
        board.spawn(&mut rng, &SPAWNS);
        board.spawn(&mut rng, &SPAWNS);
        Self { board, score: 0, best: 0, won: false, lost: false, rng }
    }

    fn play(&mut self, dir: Dir) {
        if self.won || self.lost {
            return;
        }
        let out = self.board.slide(dir, &FibRule);
        if !out.moved {
            return;
        }
        self.score += out.gained;
        self.board.spawn(&mut self.rng, &SPAWNS);

        if self.board.contains(TARGET) {
            self.won = true;
            debug!(score = self.score, "fibonacci reached {}", TARGET);
        } else if !self.board.has_moves(&FibRule) {
            self.lost = true;
            debug!(score = self.score, max = self.board.max_tile(), "fibonacci board locked");
        }
    }
}

impl Game for Fibonacci {
    fn update(&mut self, _dt_ms: u64) {}

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Enter | KeyCode::Char(' ') if self.won || self.lost => self.reset(),
            KeyCode::Left => self.play(Dir::Left),
            KeyCode::Right => self.play(Dir::Right),
            KeyCode::Up => self.play(Dir::Up),
            KeyCode::Down => self.play(Dir::Down),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🌀 Fibonacci", Color::Rgb(237, 194, 46));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Max: {}", self.board.max_tile()), Color::Rgb(237, 194, 46)),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🌀", parts));

        let mut c = Canvas::new(field.width, field.height, Color::Rgb(187, 173, 160));
        tiles::draw_board(&mut c, &self.board, rank);
        canvas::render_canvas(frame, field, c);

        let line = if self.won {
            canvas::won_line(&format!("You reached {}! Score: {}", TARGET, self.score))
        } else if self.lost {
            canvas::game_over_line(&format!("No merges left. Score: {}", self.score))
        } else {
            canvas::help_line(&[("↑↓←→", "Slide"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Fibonacci::with_rng(rng);
        self.best = best;
    }

    fn get_score(&self) -> u32 {
        self.score
    }

    fn is_game_over(&self) -> bool {
        self.won || self.lost
    }

    fn set_best(&mut self, best: u32) {
        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_two_small_tiles() {
        let g = Fibonacci::with_seed(1);
        let tiles: Vec<u32> = g.board.cells.iter().flatten().copied().filter(|&v| v != 0).collect();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|&v| v == 1 || v == 2));
    }

    #[test]
    fn test_consecutive_terms_merge_and_score() {
        let mut g = Fibonacci::with_seed(2);
        g.board.cells = [[0; 4]; 4];
        g.board.cells[0] = [2, 3, 0, 0];
        g.play(Dir::Left);
        assert_eq!(g.board.cells[0][0], 5);
        assert_eq!(g.score, 5);
    }

    #[test]
    fn test_reaching_target_wins() {
        let mut g = Fibonacci::with_seed(3);
        g.board.cells = [[0; 4]; 4];
        g.board.cells[0] = [987, 1597, 0, 0];
        g.play(Dir::Left);
        assert!(g.won);
        assert!(g.is_game_over());
    }

    #[test]
    fn test_locked_board_loses() {
        let mut g = Fibonacci::with_seed(4);
        g.board.cells = [[5, 13, 5, 13], [13, 5, 13, 5], [34, 89, 34, 89], [89, 34, 89, 0]];
        g.play(Dir::Right);
        assert!(g.board.empty_cells().is_empty());
        assert!(g.lost);
        assert!(!g.won);
    }

    #[test]
    fn test_rank_follows_sequence() {
        assert_eq!(rank(1), 1);
        assert_eq!(rank(2), 2);
        assert_eq!(rank(2584), 17);
    }
}
