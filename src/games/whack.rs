use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::particles::Particles;
use crate::games::Game;

const FIELD_W: f32 = 600.0;
const FIELD_H: f32 = 600.0;
const ROUND_MS: u64 = 60_000;
const SPAWN_CHANCE: f64 = 0.03;
const MAX_HEIGHT: i32 = 60;
const RISE: i32 = 3;
const COMBO_FRAMES: u32 = 120;
const BOMB_PENALTY: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MoleKind {
    Normal,
    Fast,
    Bomb,
}

impl MoleKind {
    fn points(self) -> u32 {
        match self {
            MoleKind::Normal => 10,
            MoleKind::Fast => 20,
            MoleKind::Bomb => 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Hole {
    up: bool,
    height: i32,
    sinking: bool,
    kind: MoleKind,
    timer: u32,
}

impl Hole {
    fn empty() -> Self {
        Self { up: false, height: 0, sinking: false, kind: MoleKind::Normal, timer: 0 }
    }

    fn center(i: usize) -> (f32, f32) {
        (100.0 + (i % 3) as f32 * 200.0, 100.0 + (i / 3) as f32 * 200.0)
    }
}

/// Hole index for a number key, laid out like a numeric keypad
fn hole_for_key(d: char) -> Option<usize> {
    let n = d.to_digit(10)? as usize;
    if !(1..=9).contains(&n) {
        return None;
    }
    let row = 2 - (n - 1) / 3;
    Some(row * 3 + (n - 1) % 3)
}

pub struct Whack {
    holes: [Hole; 9],
    score: u32,
    best: u32,
    combo: u32,
    combo_timer: u32,
    left_ms: u64,
    started: bool,
    game_over: bool,
    particles: Particles,
    rng: StdRng,
}

impl Whack {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            holes: [Hole::empty(); 9],
            score: 0,
            best: 0,
            combo: 0,
            combo_timer: 0,
            left_ms: ROUND_MS,
            started: false,
            game_over: false,
            particles: Particles::default(),
            rng,
        }
    }

    fn spawn_mole(&mut self) {
        let free: Vec<usize> = (0..9).filter(|&i| !self.holes[i].up).collect();
        let Some(&i) = free.choose(&mut self.rng) else { return };
        let roll: f64 = self.rng.gen();
        let (kind, timer) = if roll < 0.1 {
            (MoleKind::Bomb, 60)
        } else if roll < 0.3 {
            (MoleKind::Fast, 40)
        } else {
            (MoleKind::Normal, 90)
        };
        self.holes[i] = Hole { up: true, height: 0, sinking: false, kind, timer };
    }

    fn whack(&mut self, i: usize) {
        let hole = self.holes[i];
        if !hole.up {
            if self.combo_timer == 0 {
                self.combo = 0;
            }
            return;
        }
        let (x, y) = Hole::center(i);
        let y = y - hole.height as f32;
        match hole.kind {
            MoleKind::Bomb => {
                self.score = self.score.saturating_sub(BOMB_PENALTY);
                self.combo = 0;
                self.particles.burst(&mut self.rng, x, y, Color::Red, 10, 4.0, 30);
            }
            kind => {
                self.combo += 1;
                self.combo_timer = COMBO_FRAMES;
                self.score += kind.points() * self.combo;
                self.particles.burst(&mut self.rng, x, y, Color::Yellow, 10, 4.0, 30);
            }
        }
        self.holes[i] = Hole::empty();
    }

    fn step(&mut self) {
        if self.rng.gen_bool(SPAWN_CHANCE) {
            self.spawn_mole();
        }
        for hole in self.holes.iter_mut().filter(|h| h.up) {
            if !hole.sinking && hole.height < MAX_HEIGHT {
                hole.height += RISE;
            }
            hole.timer = hole.timer.saturating_sub(1);
            if hole.timer == 0 {
                hole.sinking = true;
            }
            if hole.sinking {
                hole.height -= RISE;
                if hole.height <= 0 {
                    *hole = Hole::empty();
                }
            }
        }
        self.particles.update(0.3);
        if self.combo_timer > 0 {
            self.combo_timer -= 1;
            if self.combo_timer == 0 {
                self.combo = 0;
            }
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(135, 206, 235));
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);
        let (_, grass) = scale.cell(0.0, FIELD_H - 50.0);
        c.fill(0, grass, width as i32, height as i32, ' ', Style::default().bg(Color::Rgb(34, 139, 34)));

        let keys = ['7', '8', '9', '4', '5', '6', '1', '2', '3'];
        for (i, hole) in self.holes.iter().enumerate() {
            let (hx, hy) = Hole::center(i);
            c.rect(&scale, hx - 50.0, hy - 12.0, 100.0, 25.0, '▄', Color::Rgb(101, 67, 33));
            c.dot(&scale, hx, hy + 20.0, keys[i], Color::Black);
            if hole.up && hole.height > 0 {
                let top = hy - hole.height as f32;
                let (glyph, color) = match hole.kind {
                    MoleKind::Bomb => ('✹', Color::Rgb(40, 40, 40)),
                    MoleKind::Fast => ('◉', Color::Rgb(255, 140, 0)),
                    MoleKind::Normal => ('●', Color::Rgb(139, 69, 19)),
                };
                c.rect(&scale, hx - 30.0, top, 60.0, hole.height as f32, glyph, color);
            }
        }
        for p in &self.particles.list {
            c.dot(&scale, p.x, p.y, '*', p.color);
        }
        c
    }
}

impl Game for Whack {
    fn update(&mut self, dt_ms: u64) {
        if !self.started || self.game_over {
            return;
        }
        self.step();
        self.left_ms = self.left_ms.saturating_sub(dt_ms);
        if self.left_ms == 0 {
            self.game_over = true;
            debug!(score = self.score, "whack-a-mole time up");
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Enter | KeyCode::Char(' ') if self.game_over => {
                self.reset();
                self.started = true;
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.started = true,
            _ if self.game_over || !self.started => {}
            KeyCode::Char(d) => {
                if let Some(i) = hole_for_key(d) {
                    self.whack(i);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🔨 Whack-a-Mole", Color::Rgb(160, 200, 160));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Time: {}", self.left_ms.div_ceil(1000)), Color::Cyan),
            (format!("Combo: x{}", self.combo), Color::Magenta),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🔨", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("TIME UP! Score: {}", self.score))
        } else if !self.started {
            canvas::help_line(&[("SPACE", "Start"), ("1-9", "Whack (numpad layout)")])
        } else {
            canvas::help_line(&[("1-9", "Whack"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Whack::with_rng(rng);
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

    fn with_mole(i: usize, kind: MoleKind) -> Whack {
        let mut w = Whack::with_seed(1);
        w.started = true;
        w.holes[i] = Hole { up: true, height: 30, sinking: false, kind, timer: 50 };
        w
    }

    #[test]
    fn test_numpad_layout() {
        assert_eq!(hole_for_key('7'), Some(0));
        assert_eq!(hole_for_key('5'), Some(4));
        assert_eq!(hole_for_key('3'), Some(8));
        assert_eq!(hole_for_key('0'), None);
    }

    #[test]
    fn test_combo_multiplies() {
        let mut w = with_mole(0, MoleKind::Normal);
        w.whack(0);
        assert_eq!(w.score, 10);
        w.holes[1] = Hole { up: true, height: 30, sinking: false, kind: MoleKind::Fast, timer: 40 };
        w.whack(1);
        assert_eq!(w.combo, 2);
        assert_eq!(w.score, 10 + 40);
        assert!(!w.holes[1].up);
    }

    #[test]
    fn test_bomb_penalty_floors_and_resets_combo() {
        let mut w = with_mole(4, MoleKind::Bomb);
        w.score = 20;
        w.combo = 3;
        w.whack(4);
        assert_eq!(w.score, 0);
        assert_eq!(w.combo, 0);
    }

    #[test]
    fn test_combo_expires() {
        let mut w = with_mole(0, MoleKind::Normal);
        w.whack(0);
        for _ in 0..COMBO_FRAMES {
            w.step();
        }
        assert_eq!(w.combo, 0);
    }

    #[test]
    fn test_mole_rises_then_sinks() {
        let mut w = Whack::with_seed(2);
        w.holes[2] = Hole { up: true, height: 0, sinking: false, kind: MoleKind::Fast, timer: 40 };
        for _ in 0..20 {
            w.step();
        }
        assert_eq!(w.holes[2].height, MAX_HEIGHT);
        let mut frames = 0;
        while w.holes[2].up {
            w.step();
            frames += 1;
            assert!(frames < 100);
        }
        // Timer expires on frame 20 and sinks that frame, 19 more to reach 0
        assert_eq!(frames, 39);
    }

    #[test]
    fn test_waits_for_start_then_times_out() {
        let mut w = Whack::with_seed(3);
        w.update(16);
        assert_eq!(w.left_ms, ROUND_MS);
        w.handle_input(KeyEvent::from(KeyCode::Char(' ')));
        for _ in 0..60 {
            w.update(1000);
        }
        assert!(w.is_game_over());
    }
}
