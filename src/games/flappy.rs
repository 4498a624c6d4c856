use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 600.0;
const GROUND_H: f32 = 20.0;
const BIRD_X: f32 = 100.0;
const BIRD_R: f32 = 20.0;
const GRAVITY: f32 = 0.5;
const FLAP: f32 = -9.0;
const PIPE_W: f32 = 80.0;
const PIPE_GAP: f32 = 180.0;
const PIPE_SPEED: f32 = 3.0;
const PIPE_EVERY: u32 = 90;
const PIPE_MIN_H: f32 = 100.0;

#[derive(Clone, Copy, Debug)]
struct Pipe {
    x: f32,
    top: f32,
    scored: bool,
}

impl Pipe {
    fn bottom(&self) -> f32 {
        self.top + PIPE_GAP
    }
}

fn medal(score: u32) -> Option<(&'static str, Color)> {
    match score {
        40.. => Some(("Platinum", Color::Rgb(229, 228, 226))),
        30.. => Some(("Gold", Color::Rgb(255, 215, 0))),
        20.. => Some(("Silver", Color::Rgb(192, 192, 192))),
        10.. => Some(("Bronze", Color::Rgb(205, 127, 50))),
        _ => None,
    }
}

pub struct Flappy {
    y: f32,
    vy: f32,
    pipes: Vec<Pipe>,
    frame: u32,
    score: u32,
    best: u32,
    started: bool,
    game_over: bool,
    rng: StdRng,
}

impl Flappy {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            y: FIELD_H / 2.0,
            vy: 0.0,
            pipes: Vec::new(),
            frame: 0,
            score: 0,
            best: 0,
            started: false,
            game_over: false,
            rng,
        }
    }

    fn flap(&mut self) {
        self.started = true;
        self.vy = FLAP;
    }

    fn spawn_pipe(&mut self) {
        let max = FIELD_H - PIPE_GAP - PIPE_MIN_H;
        let top = self.rng.gen_range(PIPE_MIN_H..max);
        self.pipes.push(Pipe { x: FIELD_W, top, scored: false });
    }

    fn crash(&mut self) {
        self.game_over = true;
        debug!(score = self.score, "flappy crashed");
    }

    fn step(&mut self) {
        self.frame += 1;
        self.vy += GRAVITY;
        self.y += self.vy;

        if self.y + BIRD_R > FIELD_H - GROUND_H {
            self.crash();
            return;
        }
        if self.y - BIRD_R < 0.0 {
            self.y = BIRD_R;
            self.vy = 0.0;
        }

        if self.frame % PIPE_EVERY == 0 {
            self.spawn_pipe();
        }

        let mut hit = false;
        for pipe in &mut self.pipes {
            pipe.x -= PIPE_SPEED;
            let overlaps_x = BIRD_X + BIRD_R > pipe.x && BIRD_X - BIRD_R < pipe.x + PIPE_W;
            if overlaps_x && (self.y - BIRD_R < pipe.top || self.y + BIRD_R > pipe.bottom()) {
                hit = true;
            }
            if !pipe.scored && BIRD_X > pipe.x + PIPE_W {
                pipe.scored = true;
                self.score += 1;
            }
        }
        self.pipes.retain(|p| p.x > -PIPE_W);
        if hit {
            self.crash();
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(74, 20, 140));
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        // Drifting stars
        for i in 0..50u32 {
            let x = (i as f32 * 137.0 + self.frame as f32 * 0.5) % FIELD_W;
            let y = (i as f32 * 211.0) % FIELD_H;
            c.dot(&scale, x, y, '·', Color::Rgb(200, 200, 255));
        }

        let green = Color::Rgb(0, 230, 118);
        for pipe in &self.pipes {
            c.rect(&scale, pipe.x, 0.0, PIPE_W, pipe.top, '█', green);
            c.rect(&scale, pipe.x, pipe.bottom(), PIPE_W, FIELD_H - GROUND_H - pipe.bottom(), '█', green);
        }
        c.rect(&scale, 0.0, FIELD_H - GROUND_H, FIELD_W, GROUND_H, '▀', Color::Rgb(141, 110, 99));

        let glyph = if self.vy < 0.0 { '▲' } else { '●' };
        c.dot(&scale, BIRD_X, self.y, glyph, Color::Rgb(233, 30, 99));
        c
    }
}

impl Game for Flappy {
    fn update(&mut self, _dt_ms: u64) {
        if !self.started || self.game_over {
            return;
        }
        self.step();
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Enter | KeyCode::Char(' ') if self.game_over => self.reset(),
            _ if self.game_over => {}
            KeyCode::Char(' ') | KeyCode::Up => self.flap(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🐤 Flappy", Color::Rgb(200, 120, 255));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🐤", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            let award = medal(self.score).map(|(m, _)| format!(" {} medal!", m)).unwrap_or_default();
            canvas::game_over_line(&format!("GAME OVER! Score: {}{}", self.score, award))
        } else if !self.started {
            canvas::help_line(&[("SPACE/↑", "Flap to start")])
        } else {
            canvas::help_line(&[("SPACE/↑", "Flap"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Flappy::with_rng(rng);
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
    fn test_waits_for_first_flap() {
        let mut f = Flappy::with_seed(1);
        f.update(16);
        assert_eq!(f.y, FIELD_H / 2.0);
        f.handle_input(KeyEvent::from(KeyCode::Char(' ')));
        f.update(16);
        assert_eq!(f.vy, FLAP + GRAVITY);
    }

    #[test]
    fn test_falling_hits_ground() {
        let mut f = Flappy::with_seed(2);
        f.started = true;
        for _ in 0..60 {
            f.update(16);
        }
        assert!(f.is_game_over());
    }

    #[test]
    fn test_ceiling_clamps() {
        let mut f = Flappy::with_seed(3);
        f.started = true;
        f.y = 25.0;
        f.vy = -10.0;
        f.step();
        assert_eq!(f.y, BIRD_R);
        assert_eq!(f.vy, 0.0);
        assert!(!f.game_over);
    }

    #[test]
    fn test_pipes_spawn_in_range() {
        let mut f = Flappy::with_seed(4);
        f.started = true;
        for _ in 0..PIPE_EVERY {
            f.vy = 0.0;
            f.y = FIELD_H / 2.0;
            f.step();
        }
        assert_eq!(f.pipes.len(), 1);
        let top = f.pipes[0].top;
        assert!((PIPE_MIN_H..FIELD_H - PIPE_GAP - PIPE_MIN_H).contains(&top));
    }

    #[test]
    fn test_passing_pipe_scores_and_hitting_ends() {
        let mut f = Flappy::with_seed(5);
        f.started = true;
        f.pipes.push(Pipe { x: 0.0, top: 100.0, scored: false });
        f.y = 300.0;
        f.vy = -GRAVITY;
        f.step();
        assert_eq!(f.score, 1);
        assert!(!f.game_over);

        f.pipes.push(Pipe { x: BIRD_X, top: 400.0, scored: false });
        f.step();
        assert!(f.game_over);
    }

    #[test]
    fn test_medals() {
        assert_eq!(medal(9), None);
        assert_eq!(medal(10).map(|m| m.0), Some("Bronze"));
        assert_eq!(medal(35).map(|m| m.0), Some("Gold"));
        assert_eq!(medal(99).map(|m| m.0), Some("Platinum"));
    }
}
