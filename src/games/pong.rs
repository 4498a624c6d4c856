use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 600.0;
const PADDLE_W: f32 = 10.0;
const PADDLE_H: f32 = 100.0;
/// Per key press: speed 6 held for four frames
const PADDLE_STEP: f32 = 24.0;
const BALL_R: f32 = 8.0;
const BALL_SPEED: f32 = 5.0;
const WIN_SCORE: u32 = 10;

#[derive(Clone, Copy, Debug)]
struct Paddle {
    x: f32,
    y: f32,
}

impl Paddle {
    fn center(&self) -> f32 {
        self.y + PADDLE_H / 2.0
    }

    fn nudge(&mut self, dy: f32) {
        self.y = (self.y + dy).clamp(0.0, FIELD_H - PADDLE_H);
    }
}

pub struct Pong {
    left: Paddle,
    right: Paddle,
    bx: f32,
    by: f32,
    dx: f32,
    dy: f32,
    score_left: u32,
    score_right: u32,
    paused: bool,
    rng: StdRng,
}

impl Pong {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let top = FIELD_H / 2.0 - PADDLE_H / 2.0;
        Self {
            left: Paddle { x: 20.0, y: top },
            right: Paddle { x: FIELD_W - 30.0, y: top },
            bx: FIELD_W / 2.0,
            by: FIELD_H / 2.0,
            dx: BALL_SPEED,
            dy: BALL_SPEED,
            score_left: 0,
            score_right: 0,
            paused: false,
            rng,
        }
    }

    fn winner(&self) -> Option<&'static str> {
        if self.score_left >= WIN_SCORE {
            Some("Left")
        } else if self.score_right >= WIN_SCORE {
            Some("Right")
        } else {
            None
        }
    }

    fn serve(&mut self) {
        self.bx = FIELD_W / 2.0;
        self.by = FIELD_H / 2.0;
        self.dx = if self.rng.gen_bool(0.5) { BALL_SPEED } else { -BALL_SPEED };
        self.dy = self.rng.gen_range(-4.0..4.0);
    }

    fn step(&mut self) {
        self.bx += self.dx;
        self.by += self.dy;

        if self.by - BALL_R < 0.0 || self.by + BALL_R > FIELD_H {
            self.dy = -self.dy;
        }

        let l = self.left;
        if self.bx - BALL_R < l.x + PADDLE_W && self.by > l.y && self.by < l.y + PADDLE_H {
            self.dx = self.dx.abs();
            self.dy += (self.by - l.center()) * 0.1;
        }
        let r = self.right;
        if self.bx + BALL_R > r.x && self.by > r.y && self.by < r.y + PADDLE_H {
            self.dx = -self.dx.abs();
            self.dy += (self.by - r.center()) * 0.1;
        }

        if self.bx < 0.0 {
            self.score_right += 1;
            self.serve();
        } else if self.bx > FIELD_W {
            self.score_left += 1;
            self.serve();
        }
        if let Some(side) = self.winner() {
            debug!(side, left = self.score_left, right = self.score_right, "pong match won");
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let green = Color::Rgb(0, 255, 0);
        let mut c = Canvas::new(width as u16, height as u16, Color::Black);
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        let (mid, _) = scale.cell(FIELD_W / 2.0, 0.0);
        for y in (0..height as i32).step_by(2) {
            c.put(mid, y, '┆', Color::Rgb(0, 120, 0));
        }
        for p in [self.left, self.right] {
            c.rect(&scale, p.x, p.y, PADDLE_W, PADDLE_H, '█', green);
        }
        c.dot(&scale, self.bx, self.by, '●', green);

        let tally = format!("{}   {}", self.score_left, self.score_right);
        c.text_centered(1, &tally, Style::default().fg(green).add_modifier(Modifier::BOLD));
        c
    }
}

impl Game for Pong {
    fn update(&mut self, _dt_ms: u64) {
        if self.paused || self.winner().is_some() {
            return;
        }
        self.step();
    }

    fn handle_input(&mut self, key: KeyEvent) {
        let over = self.winner().is_some();
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('p') | KeyCode::Char('P') => {
                if !over {
                    self.paused = !self.paused;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') if over => self.reset(),
            _ if self.paused || over => {}
            KeyCode::Char('w') | KeyCode::Char('W') => self.left.nudge(-PADDLE_STEP),
            KeyCode::Char('s') | KeyCode::Char('S') => self.left.nudge(PADDLE_STEP),
            KeyCode::Up => self.right.nudge(-PADDLE_STEP),
            KeyCode::Down => self.right.nudge(PADDLE_STEP),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "● Pong", Color::Rgb(200, 120, 255));

        let parts = vec![
            (format!("Left: {}", self.score_left), Color::Green),
            (format!("Right: {}", self.score_right), Color::Green),
            (format!("First to {}", WIN_SCORE), Color::Gray),
        ];
        canvas::render_lines(frame, status, canvas::status_line("●", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if let Some(side) = self.winner() {
            canvas::won_line(&format!("{} player wins {}-{}!", side, self.score_left, self.score_right))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("W/S", "Left"), ("↑/↓", "Right"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Pong::with_rng(rng);
    }

    fn get_score(&self) -> u32 {
        self.score_left.max(self.score_right)
    }

    fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_bounce() {
        let mut p = Pong::with_seed(1);
        p.by = 5.0;
        p.dy = -5.0;
        p.step();
        assert_eq!(p.dy, 5.0);
    }

    #[test]
    fn test_paddle_reflects_and_angles() {
        let mut p = Pong::with_seed(2);
        p.bx = 40.0;
        p.by = p.left.center() + 20.0;
        p.dx = -5.0;
        p.dy = 0.0;
        p.step();
        assert_eq!(p.dx, 5.0);
        assert!((p.dy - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_miss_scores_for_other_side() {
        let mut p = Pong::with_seed(3);
        p.left.y = 0.0;
        p.bx = 2.0;
        p.by = FIELD_H - 50.0;
        p.dx = -5.0;
        p.dy = 0.0;
        p.step();
        assert_eq!(p.score_right, 1);
        assert_eq!(p.bx, FIELD_W / 2.0);
        assert_eq!(p.dx.abs(), BALL_SPEED);
        assert!(p.dy.abs() <= 4.0);
    }

    #[test]
    fn test_first_to_ten() {
        let mut p = Pong::with_seed(4);
        p.score_left = WIN_SCORE - 1;
        p.right.y = 0.0;
        p.bx = FIELD_W - 2.0;
        p.by = FIELD_H - 50.0;
        p.dx = 5.0;
        p.dy = 0.0;
        p.step();
        assert!(p.is_game_over());
        let bx = p.bx;
        p.update(16);
        assert_eq!(p.bx, bx);
    }

    #[test]
    fn test_paddles_clamped() {
        let mut p = Pong::with_seed(5);
        for _ in 0..50 {
            p.handle_input(KeyEvent::from(KeyCode::Char('w')));
            p.handle_input(KeyEvent::from(KeyCode::Down));
        }
        assert_eq!(p.left.y, 0.0);
        assert_eq!(p.right.y, FIELD_H - PADDLE_H);
    }
}
