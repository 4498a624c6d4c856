use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::particles::Particles;
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 600.0;
/// Per key press: speed 4 held for four frames
const PLAYER_STEP: f32 = 16.0;
const SCROLL: f32 = 1.0;
const SHOT_COOLDOWN_MS: u64 = 150;
const BULLET_VX: f32 = 12.0;
const SPAWN_CHANCE: f64 = 0.02;
const START_LIVES: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Jet,
    Bomber,
}

impl Kind {
    fn vx(self) -> f32 {
        match self {
            Kind::Jet => -4.0,
            Kind::Bomber => -2.0,
        }
    }

    fn hp(self) -> u32 {
        match self {
            Kind::Jet => 1,
            Kind::Bomber => 3,
        }
    }

    fn points(self) -> u32 {
        match self {
            Kind::Jet => 50,
            Kind::Bomber => 150,
        }
    }
}

/// Positions are screen space; the world scroll is folded into the velocity.
#[derive(Clone, Copy, Debug)]
struct Enemy {
    x: f32,
    y: f32,
    kind: Kind,
    hp: u32,
}

#[derive(Clone, Copy, Debug)]
struct Bullet {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug)]
struct Cloud {
    x: f32,
    y: f32,
    size: f32,
    speed: f32,
}

pub struct Defender {
    px: f32,
    py: f32,
    bullets: Vec<Bullet>,
    enemies: Vec<Enemy>,
    clouds: Vec<Cloud>,
    particles: Particles,
    scroll: f32,
    cooldown_ms: u64,
    clock_ms: u64,
    score: u32,
    best: u32,
    lives: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Defender {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let clouds = (0..20)
            .map(|_| Cloud {
                x: rng.gen_range(0.0..FIELD_W * 3.0),
                y: rng.gen_range(0.0..FIELD_H - 100.0),
                size: rng.gen_range(20.0..60.0),
                speed: rng.gen_range(0.2..0.7),
            })
            .collect();
        Self {
            px: 100.0,
            py: 300.0,
            bullets: Vec::new(),
            enemies: Vec::new(),
            clouds,
            particles: Particles::default(),
            scroll: 0.0,
            cooldown_ms: 0,
            clock_ms: 0,
            score: 0,
            best: 0,
            lives: START_LIVES,
            paused: false,
            game_over: false,
            rng,
        }
    }

    fn nudge(&mut self, dx: f32, dy: f32) {
        self.px = (self.px + dx).clamp(20.0, FIELD_W - 40.0);
        self.py = (self.py + dy).clamp(20.0, FIELD_H - 20.0);
    }

    fn fire(&mut self) {
        if self.cooldown_ms > 0 {
            return;
        }
        self.bullets.push(Bullet { x: self.px + 30.0, y: self.py });
        self.cooldown_ms = SHOT_COOLDOWN_MS;
    }

    fn spawn_enemy(&mut self) {
        let kind = if self.rng.gen_bool(0.5) { Kind::Jet } else { Kind::Bomber };
        self.enemies.push(Enemy {
            x: FIELD_W + 100.0,
            y: self.rng.gen_range(50.0..FIELD_H - 50.0),
            kind,
            hp: kind.hp(),
        });
    }

    fn step(&mut self, dt_ms: u64) {
        self.clock_ms += dt_ms;
        self.cooldown_ms = self.cooldown_ms.saturating_sub(dt_ms);
        self.scroll += SCROLL;

        for cloud in &mut self.clouds {
            cloud.x -= cloud.speed + SCROLL;
            if cloud.x < -cloud.size * 2.0 {
                cloud.x = FIELD_W + self.rng.gen_range(0.0..200.0);
            }
        }

        if self.rng.gen_bool(SPAWN_CHANCE) {
            self.spawn_enemy();
        }

        for b in &mut self.bullets {
            b.x += BULLET_VX;
        }
        self.bullets.retain(|b| b.x < FIELD_W);

        let t = self.clock_ms as f32 * 0.005;
        for (i, e) in self.enemies.iter_mut().enumerate() {
            e.x += e.kind.vx() - SCROLL;
            if e.kind == Kind::Jet {
                e.y += (t + i as f32).sin() * 2.0;
            }
        }
        self.enemies.retain(|e| e.x > -100.0);

        let (px, py) = (self.px, self.py);
        let before = self.enemies.len();
        self.enemies.retain(|e| !((e.x - px).abs() < 40.0 && (e.y - py).abs() < 25.0));
        for _ in 0..before - self.enemies.len() {
            self.lives = self.lives.saturating_sub(1);
            self.particles.burst(&mut self.rng, px, py, Color::Rgb(255, 102, 0), 15, 4.0, 40);
        }
        if self.lives == 0 {
            self.game_over = true;
            debug!(score = self.score, "defender game over");
            return;
        }

        let mut i = 0;
        while i < self.bullets.len() {
            let b = self.bullets[i];
            let hit = self.enemies.iter().position(|e| (b.x - e.x).abs() < 35.0 && (b.y - e.y).abs() < 20.0);
            let Some(j) = hit else {
                i += 1;
                continue;
            };
            self.bullets.remove(i);
            let e = &mut self.enemies[j];
            e.hp -= 1;
            if e.hp == 0 {
                let e = self.enemies.remove(j);
                self.score += e.kind.points();
                self.particles.burst(&mut self.rng, e.x, e.y, Color::Rgb(255, 102, 0), 15, 4.0, 40);
            }
        }

        self.particles.update(0.2);
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(30, 58, 138));
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        for cloud in &self.clouds {
            c.rect(&scale, cloud.x, cloud.y, cloud.size * 2.0, cloud.size * 0.6, '░', Color::Rgb(200, 210, 230));
        }

        // Scrolling hills along the bottom
        for col in 0..width as i32 {
            let wx = col as f32 * FIELD_W / width as f32 + self.scroll;
            let h = 1 + ((wx * 0.02).sin() * 1.5 + 1.5) as i32;
            for dy in 0..h {
                c.put(col, height as i32 - 1 - dy, '▓', Color::Rgb(22, 101, 52));
            }
        }

        for e in &self.enemies {
            let (glyph, color) = match e.kind {
                Kind::Jet => ('◄', Color::Rgb(239, 68, 68)),
                Kind::Bomber => ('◀', Color::Rgb(139, 92, 246)),
            };
            c.rect(&scale, e.x - 25.0, e.y - 8.0, 50.0, 16.0, glyph, color);
        }
        for b in &self.bullets {
            c.dot(&scale, b.x, b.y, '─', Color::Yellow);
        }
        for p in &self.particles.list {
            c.dot(&scale, p.x, p.y, '*', p.color);
        }
        c.rect(&scale, self.px - 20.0, self.py - 8.0, 50.0, 16.0, '═', Color::Rgb(34, 197, 94));
        c.dot(&scale, self.px + 35.0, self.py, '►', Color::Rgb(34, 197, 94));
        c
    }
}

impl Game for Defender {
    fn update(&mut self, dt_ms: u64) {
        if self.paused || self.game_over {
            return;
        }
        self.step(dt_ms);
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
            KeyCode::Left => self.nudge(-PLAYER_STEP, 0.0),
            KeyCode::Right => self.nudge(PLAYER_STEP, 0.0),
            KeyCode::Up => self.nudge(0.0, -PLAYER_STEP),
            KeyCode::Down => self.nudge(0.0, PLAYER_STEP),
            KeyCode::Char(' ') => self.fire(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "✈ Defender", Color::Rgb(59, 130, 246));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", self.lives), Color::Red),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("✈", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("↑↓←→", "Fly"), ("SPACE", "Fire"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Defender::with_rng(rng);
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

    fn bomber(x: f32, y: f32) -> Enemy {
        Enemy { x, y, kind: Kind::Bomber, hp: Kind::Bomber.hp() }
    }

    #[test]
    fn test_player_clamped() {
        let mut g = Defender::with_seed(1);
        for _ in 0..100 {
            g.handle_input(KeyEvent::from(KeyCode::Left));
            g.handle_input(KeyEvent::from(KeyCode::Up));
        }
        assert_eq!((g.px, g.py), (20.0, 20.0));
    }

    #[test]
    fn test_bomber_takes_three_hits() {
        let mut g = Defender::with_seed(2);
        g.enemies = vec![bomber(500.0, 300.0)];
        for n in 1..=3 {
            g.bullets.push(Bullet { x: 500.0 - BULLET_VX + 3.0 * n as f32, y: 300.0 });
            g.step(200);
        }
        assert!(g.enemies.iter().all(|e| e.kind != Kind::Bomber || e.x < 450.0));
        assert_eq!(g.score, 150);
    }

    #[test]
    fn test_contact_costs_life() {
        let mut g = Defender::with_seed(3);
        g.enemies = vec![bomber(g.px + 10.0, g.py)];
        g.step(16);
        assert_eq!(g.lives, START_LIVES - 1);
        assert!(g.enemies.iter().all(|e| e.x > FIELD_W));
    }

    #[test]
    fn test_out_of_lives_ends() {
        let mut g = Defender::with_seed(4);
        g.lives = 1;
        g.enemies = vec![bomber(g.px, g.py)];
        g.step(16);
        assert!(g.is_game_over());
    }

    #[test]
    fn test_scroll_and_fire_cooldown() {
        let mut g = Defender::with_seed(5);
        g.fire();
        g.fire();
        assert_eq!(g.bullets.len(), 1);
        g.step(SHOT_COOLDOWN_MS);
        assert_eq!(g.scroll, SCROLL);
        g.fire();
        assert_eq!(g.bullets.len(), 2);
    }
}
