use std::collections::VecDeque;

use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const GRID: i32 = 20;
const START_INTERVAL_MS: u64 = 100;
const MIN_INTERVAL_MS: u64 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

pub struct Snake {
    body: VecDeque<(i32, i32)>,
    dir: Dir,
    next_dir: Dir,
    apple: (i32, i32),
    interval_ms: u64,
    elapsed_ms: u64,
    score: u32,
    best: u32,
    game_over: bool,
    paused: bool,
    rng: StdRng,
}

impl Snake {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut s = Self {
            body: VecDeque::from([(10, 10), (9, 10), (8, 10)]),
            dir: Dir::Right,
            next_dir: Dir::Right,
            apple: (0, 0),
            interval_ms: START_INTERVAL_MS,
            elapsed_ms: 0,
            score: 0,
            best: 0,
            game_over: false,
            paused: false,
            rng,
        };
        s.place_apple();
        s
    }

    fn place_apple(&mut self) {
        let free: Vec<(i32, i32)> = (0..GRID)
            .flat_map(|y| (0..GRID).map(move |x| (x, y)))
            .filter(|p| !self.body.contains(p))
            .collect();
        if free.is_empty() {
            return;
        }
        self.apple = free[self.rng.gen_range(0..free.len())];
    }

    fn turn(&mut self, dir: Dir) {
        // Compared against the direction of the last step so two quick
        // presses cannot fold the snake back on itself
        if dir != self.dir.opposite() {
            self.next_dir = dir;
        }
    }

    fn step(&mut self) {
        self.dir = self.next_dir;
        let (dx, dy) = self.dir.delta();
        let Some(&(hx, hy)) = self.body.front() else { return };
        let head = (hx + dx, hy + dy);

        if head.0 < 0 || head.0 >= GRID || head.1 < 0 || head.1 >= GRID || self.body.contains(&head) {
            self.game_over = true;
            debug!(score = self.score, length = self.body.len(), "snake crashed");
            return;
        }

        self.body.push_front(head);
        if head == self.apple {
            self.score += 10;
            self.interval_ms = self.interval_ms.saturating_sub(1).max(MIN_INTERVAL_MS);
            self.place_apple();
        } else {
            self.body.pop_back();
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let bg = Color::Rgb(26, 26, 26);
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(12, 12, 12));
        let fit = GridFit::new(GRID as usize, GRID as usize, width, height);

        for y in 0..GRID as usize {
            for x in 0..GRID as usize {
                let (cx, cy) = fit.origin(x, y);
                let shade = if (x + y) % 2 == 0 { bg } else { Color::Rgb(30, 30, 30) };
                c.block(cx, cy, fit.cw, fit.ch, shade);
            }
        }

        let (ax, ay) = fit.origin(self.apple.0 as usize, self.apple.1 as usize);
        c.fill(ax, ay, ax + fit.cw, ay + fit.ch, '●', Style::default().fg(Color::Rgb(255, 107, 107)).bg(bg));

        for (i, &(x, y)) in self.body.iter().enumerate() {
            let (cx, cy) = fit.origin(x as usize, y as usize);
            let color = if i == 0 {
                Color::Rgb(78, 205, 196)
            } else if i % 2 == 0 {
                Color::Rgb(61, 189, 180)
            } else {
                Color::Rgb(44, 168, 158)
            };
            c.block(cx, cy, fit.cw, fit.ch, color);
            if i == 0 {
                let eyes = match self.dir {
                    Dir::Left | Dir::Right => '⁚',
                    Dir::Up | Dir::Down => '¨',
                };
                c.put_styled(cx + fit.cw / 2, cy + fit.ch / 2, eyes, Style::default().fg(Color::Black).bg(color));
            }
        }
        c
    }
}

impl Game for Snake {
    fn update(&mut self, dt_ms: u64) {
        if self.game_over || self.paused { return; }
        self.elapsed_ms += dt_ms;
        if self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms = 0;
            self.step();
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('p') | KeyCode::Char('P') => {
                if !self.game_over {
                    self.paused = !self.paused;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.game_over => self.reset(),
            _ if self.paused || self.game_over => {}
            KeyCode::Up => self.turn(Dir::Up),
            KeyCode::Down => self.turn(Dir::Down),
            KeyCode::Left => self.turn(Dir::Left),
            KeyCode::Right => self.turn(Dir::Right),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🐍 Snake", Color::Rgb(80, 220, 80));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Length: {}", self.body.len()), Color::Green),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🐍", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("↑↓←→", "Turn"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Snake::with_rng(rng);
        self.best = best;
    }

    fn get_score(&self) -> u32 {
        self.score
    }

    fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn set_best(&mut self, best: u32) {
        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_once_per_interval() {
        let mut s = Snake::with_seed(1);
        s.apple = (0, 0);
        s.update(60);
        assert_eq!(s.body[0], (10, 10));
        s.update(40);
        assert_eq!(s.body[0], (11, 10));
        assert_eq!(s.body.len(), 3);
    }

    #[test]
    fn test_reverse_is_ignored() {
        let mut s = Snake::with_seed(2);
        s.apple = (0, 0);
        s.turn(Dir::Left);
        s.step();
        assert_eq!(s.body[0], (11, 10));
    }

    #[test]
    fn test_one_turn_per_step() {
        let mut s = Snake::with_seed(3);
        s.apple = (0, 0);
        // Up then Left before the step: Left is checked against Right and dropped
        s.turn(Dir::Up);
        s.turn(Dir::Left);
        s.step();
        assert_eq!(s.body[0], (10, 9));
    }

    #[test]
    fn test_apple_grows_and_speeds_up() {
        let mut s = Snake::with_seed(4);
        s.apple = (11, 10);
        s.step();
        assert_eq!(s.score, 10);
        assert_eq!(s.body.len(), 4);
        assert_eq!(s.interval_ms, 99);
        assert!(!s.body.contains(&s.apple));
    }

    #[test]
    fn test_interval_floor() {
        let mut s = Snake::with_seed(5);
        s.interval_ms = MIN_INTERVAL_MS;
        s.apple = (11, 10);
        s.step();
        assert_eq!(s.interval_ms, MIN_INTERVAL_MS);
    }

    #[test]
    fn test_wall_ends_game() {
        let mut s = Snake::with_seed(6);
        s.apple = (0, 0);
        for _ in 0..9 {
            s.step();
        }
        assert!(!s.is_game_over());
        s.step();
        assert!(s.is_game_over());
    }

    #[test]
    fn test_biting_body_ends_game() {
        let mut s = Snake::with_seed(7);
        s.body = VecDeque::from([(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)]);
        s.dir = Dir::Left;
        s.next_dir = Dir::Down;
        s.apple = (0, 0);
        s.step();
        assert!(s.is_game_over());
    }
}
