use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas};
use crate::games::tiles::{self, Board, Dir, Doubling};
use crate::games::Game;

const TARGET: u32 = 2048;
const SPAWNS: [(u32, u32); 2] = [(2, 9), (4, 1)];
const TIME_LIMIT_MS: u64 = 120_000;
const WARNING_MS: u64 = 30_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Clock waits for the first move
    Ready,
    Running,
    Won,
    Lost,
    TimeUp,
}

pub struct TimeAttack {
    board: Board,
    phase: Phase,
    remaining_ms: u64,
    score: u32,
    best: u32,
    rng: StdRng,
}

impl TimeAttack {
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
        Self {
            board,
            phase: Phase::Ready,
            remaining_ms: TIME_LIMIT_MS,
            score: 0,
            best: 0,
            rng,
        }
    }

    fn finished(&self) -> bool {
        matches!(self.phase, Phase::Won | Phase::Lost | Phase::TimeUp)
    }

    fn play(&mut self, dir: Dir) {
        if self.finished() {
            return;
        }
        let out = self.board.slide(dir, &Doubling);
        if !out.moved {
            return;
        }
        self.phase = Phase::Running;
        self.score += out.gained;
        self.board.spawn(&mut self.rng, &SPAWNS);

        if self.board.contains(TARGET) {
            self.phase = Phase::Won;
            debug!(score = self.score, elapsed_ms = TIME_LIMIT_MS - self.remaining_ms, "time attack won");
        } else if !self.board.has_moves(&Doubling) {
            self.phase = Phase::Lost;
            debug!(score = self.score, "time attack board locked");
        }
    }
}

impl Game for TimeAttack {
    fn update(&mut self, dt_ms: u64) {
        if self.phase != Phase::Running {
            return;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(dt_ms);
        if self.remaining_ms == 0 {
            self.phase = Phase::TimeUp;
            debug!(score = self.score, "time attack clock ran out");
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Enter | KeyCode::Char(' ') if self.finished() => self.reset(),
            KeyCode::Left => self.play(Dir::Left),
            KeyCode::Right => self.play(Dir::Right),
            KeyCode::Up => self.play(Dir::Up),
            KeyCode::Down => self.play(Dir::Down),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "⏱ Time Attack", Color::Rgb(237, 194, 46));

        let clock = if self.remaining_ms <= WARNING_MS && !self.finished() { Color::Red } else { Color::Cyan };
        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Time: {}", canvas::mmss(self.remaining_ms)), clock),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("⏱", parts));

        let mut c = Canvas::new(field.width, field.height, Color::Rgb(187, 173, 160));
        tiles::draw_board(&mut c, &self.board, tiles::doubling_rank);
        canvas::render_canvas(frame, field, c);

        let line = match self.phase {
            Phase::Won => canvas::won_line(&format!(
                "Amazing! Score: {} | Time: {}s",
                self.score,
                (TIME_LIMIT_MS - self.remaining_ms) / 1000
            )),
            Phase::Lost => canvas::game_over_line(&format!("Game over! Final score: {}", self.score)),
            Phase::TimeUp => canvas::game_over_line(&format!("Time's up! Final score: {}", self.score)),
            Phase::Ready => canvas::help_line(&[("↑↓←→", "Slide to start the clock"), ("R", "Restart")]),
            Phase::Running => canvas::help_line(&[("↑↓←→", "Slide"), ("R", "Restart")]),
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = TimeAttack::with_rng(rng);
        self.best = best;
    }

    fn get_score(&self) -> u32 {
        self.score
    }

    fn is_game_over(&self) -> bool {
        self.finished()
    }

    fn set_best(&mut self, best: u32) {
        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_row(row: [u32; 4]) -> TimeAttack {
        let mut g = TimeAttack::with_seed(1);
        g.board.cells = [[0; 4]; 4];
        g.board.cells[0] = row;
        g
    }

    #[test]
    fn test_clock_waits_for_first_move() {
        let mut g = with_row([2, 0, 0, 0]);
        g.update(5_000);
        assert_eq!(g.remaining_ms, TIME_LIMIT_MS);
        g.play(Dir::Right);
        assert_eq!(g.phase, Phase::Running);
        g.update(5_000);
        assert_eq!(g.remaining_ms, TIME_LIMIT_MS - 5_000);
    }

    #[test]
    fn test_blocked_move_does_not_start_clock() {
        let mut g = with_row([2, 0, 0, 0]);
        g.play(Dir::Left);
        assert_eq!(g.phase, Phase::Ready);
    }

    #[test]
    fn test_time_runs_out() {
        let mut g = with_row([2, 0, 0, 0]);
        g.play(Dir::Down);
        g.update(TIME_LIMIT_MS);
        assert_eq!(g.phase, Phase::TimeUp);
        assert!(g.is_game_over());
        g.play(Dir::Up);
        assert_eq!(g.phase, Phase::TimeUp);
    }

    #[test]
    fn test_2048_stops_the_clock() {
        let mut g = with_row([1024, 1024, 0, 0]);
        g.play(Dir::Left);
        assert_eq!(g.phase, Phase::Won);
        g.update(10_000);
        assert_eq!(g.remaining_ms, TIME_LIMIT_MS);
    }
}
