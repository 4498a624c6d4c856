use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas};
use crate::games::tiles::{self, Board, Dir, Doubling};
use crate::games::Game;

const TARGET: u32 = 2048;
/// 4 seven times in ten, otherwise 8
const SPAWNS: [(u32, u32); 2] = [(4, 7), (8, 3)];

pub struct Reverse2048 {
    board: Board,
    score: u32,
    best: u32,
    won: bool,
    lost: bool,
    rng: StdRng,
}

impl Reverse2048 {
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

    /// `pressed` is the arrow the player hit; tiles go the other way.
    fn play(&mut self, pressed: Dir) {
        if self.won || self.lost {
            return;
        }
        let out = self.board.slide(pressed.opposite(), &Doubling);
        if !out.moved {
            return;
        }
        self.score += out.gained;
        self.board.spawn(&mut self.rng, &SPAWNS);

        if self.board.contains(TARGET) {
            self.won = true;
            debug!(score = self.score, "reverse 2048 won");
        } else if !self.board.has_moves(&Doubling) {
            self.lost = true;
            debug!(score = self.score, max = self.board.max_tile(), "reverse 2048 board locked");
        }
    }
}

impl Game for Reverse2048 {
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
        let [status, field, help] = canvas::screen(frame, area, "🔄 2048 Reverse", Color::Rgb(237, 194, 46));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Max: {}", self.board.max_tile()), Color::Rgb(237, 194, 46)),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🔄", parts));

        let mut c = Canvas::new(field.width, field.height, Color::Rgb(187, 173, 160));
        tiles::draw_board(&mut c, &self.board, tiles::doubling_rank);
        canvas::render_canvas(frame, field, c);

        let line = if self.won {
            canvas::won_line(&format!("2048 the hard way! Score: {}", self.score))
        } else if self.lost {
            canvas::game_over_line(&format!("No moves left. Score: {}", self.score))
        } else {
            canvas::help_line(&[("↑↓←→", "Slide (reversed)"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Reverse2048::with_rng(rng);
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

    fn with_row(row: [u32; 4]) -> Reverse2048 {
        let mut g = Reverse2048::with_seed(1);
        g.board.cells = [[0; 4]; 4];
        g.board.cells[0] = row;
        g
    }

    #[test]
    fn test_spawns_fours_and_eights() {
        let g = Reverse2048::with_seed(5);
        let tiles: Vec<u32> = g.board.cells.iter().flatten().copied().filter(|&v| v != 0).collect();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|&v| v == 4 || v == 8));
    }

    #[test]
    fn test_left_arrow_slides_right() {
        let mut g = with_row([4, 0, 0, 0]);
        g.play(Dir::Left);
        assert_eq!(g.board.cells[0][3], 4);
    }

    #[test]
    fn test_up_arrow_slides_down() {
        let mut g = with_row([8, 0, 0, 0]);
        g.play(Dir::Up);
        assert_eq!(g.board.cells[3][0], 8);
    }

    #[test]
    fn test_merge_scores() {
        let mut g = with_row([4, 4, 0, 0]);
        g.play(Dir::Left);
        assert_eq!(g.board.cells[0][3], 8);
        assert_eq!(g.score, 8);
    }

    #[test]
    fn test_2048_wins() {
        let mut g = with_row([1024, 1024, 0, 0]);
        g.play(Dir::Right);
        assert!(g.won);
        assert!(g.is_game_over());
    }
}
