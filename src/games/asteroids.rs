use std::f32::consts::{FRAC_PI_2, TAU};

use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom::{dist, wrap};
use crate::games::particles::Particles;
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 600.0;
const SHIP_SIZE: f32 = 15.0;
/// Rotation and thrust per key press, four frames' worth of a held key
const PRESS_FRAMES: f32 = 4.0;
const ROTATION: f32 = 0.1;
const THRUST: f32 = 0.2;
const FRICTION: f32 = 0.99;
const BULLET_SPEED: f32 = 8.0;
const BULLET_LIFE: u32 = 60;
const COOLDOWN: u32 = 15;
const RAPID_COOLDOWN: u32 = 5;
const SPREAD: f32 = 0.2;
const POWER_FRAMES: u32 = 600;
const POWERUP_LIFE: u32 = 300;
const POWERUP_CHANCE: f64 = 0.3;
const SHAPE_POINTS: usize = 8;
const LEVEL_DELAY_MS: u64 = 1000;
/// Respawn grace after losing a life
const INVULN_FRAMES: u32 = 60;
/// New rocks never appear this close to the ship
const SAFE_RADIUS: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PowerKind {
    Shield,
    RapidFire,
    ExtraLife,
}

#[derive(Clone, Debug)]
struct Rock {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    /// 3 large, 2 medium, 1 small
    size: u32,
    angle: f32,
    spin: f32,
    /// Outline offsets at angle 0
    shape: Vec<(f32, f32)>,
}

impl Rock {
    fn radius(&self) -> f32 {
        self.size as f32 * 10.0
    }

    fn points(&self) -> u32 {
        (4 - self.size) * 10
    }

    fn outline(&self) -> Vec<(f32, f32)> {
        let (s, c) = self.angle.sin_cos();
        self.shape.iter().map(|&(px, py)| (self.x + px * c - py * s, self.y + px * s + py * c)).collect()
    }
}

#[derive(Clone, Copy, Debug)]
struct Bullet {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    life: u32,
}

#[derive(Clone, Copy, Debug)]
struct PowerUp {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    kind: PowerKind,
    life: u32,
}

pub struct Asteroids {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    /// 0 points up
    angle: f32,
    thrust_frames: u32,
    rocks: Vec<Rock>,
    bullets: Vec<Bullet>,
    powerups: Vec<PowerUp>,
    particles: Particles,
    cooldown: u32,
    shield_frames: u32,
    rapid_frames: u32,
    invuln: u32,
    next_level_ms: Option<u64>,
    tick: u64,
    score: u32,
    best: u32,
    lives: u32,
    level: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Asteroids {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut a = Self {
            x: FIELD_W / 2.0,
            y: FIELD_H / 2.0,
            vx: 0.0,
            vy: 0.0,
            angle: 0.0,
            thrust_frames: 0,
            rocks: Vec::new(),
            bullets: Vec::new(),
            powerups: Vec::new(),
            particles: Particles::default(),
            cooldown: 0,
            shield_frames: 0,
            rapid_frames: 0,
            invuln: 0,
            next_level_ms: None,
            tick: 0,
            score: 0,
            best: 0,
            lives: 3,
            level: 1,
            paused: false,
            game_over: false,
            rng,
        };
        a.init_level();
        a
    }

    /// Direction of the nose in screen space
    fn heading(&self) -> f32 {
        self.angle - FRAC_PI_2
    }

    fn make_rock(&mut self, x: f32, y: f32, size: u32) -> Rock {
        let base = size as f32 * 10.0;
        let shape = (0..SHAPE_POINTS)
            .map(|i| {
                let a = i as f32 / SHAPE_POINTS as f32 * TAU;
                let r = base + self.rng.gen_range(-2.5..2.5);
                (a.cos() * r, a.sin() * r)
            })
            .collect();
        let speed = (4 - size) as f32;
        Rock {
            x,
            y,
            vx: self.rng.gen_range(-0.5..0.5) * speed,
            vy: self.rng.gen_range(-0.5..0.5) * speed,
            size,
            angle: self.rng.gen_range(0.0..TAU),
            spin: self.rng.gen_range(-0.05..0.05),
            shape,
        }
    }

    fn init_level(&mut self) {
        self.rocks.clear();
        for _ in 0..3 + self.level {
            let (mut x, mut y) = (0.0, 0.0);
            for _ in 0..20 {
                x = self.rng.gen_range(0.0..FIELD_W);
                y = self.rng.gen_range(0.0..FIELD_H);
                if dist(x, y, self.x, self.y) > SAFE_RADIUS {
                    break;
                }
            }
            let rock = self.make_rock(x, y, 3);
            self.rocks.push(rock);
        }
    }

    fn shoot(&mut self) {
        if self.cooldown > 0 {
            return;
        }
        let rapid = self.rapid_frames > 0;
        let offsets: &[f32] = if rapid { &[-SPREAD, 0.0, SPREAD] } else { &[0.0] };
        for &off in offsets {
            let a = self.heading() + off;
            self.bullets.push(Bullet {
                x: self.x + a.cos() * SHIP_SIZE,
                y: self.y + a.sin() * SHIP_SIZE,
                vx: a.cos() * BULLET_SPEED + self.vx,
                vy: a.sin() * BULLET_SPEED + self.vy,
                life: BULLET_LIFE,
            });
        }
        self.cooldown = if rapid { RAPID_COOLDOWN } else { COOLDOWN };
    }

    fn thrust(&mut self) {
        let a = self.heading();
        self.vx += a.cos() * THRUST * PRESS_FRAMES;
        self.vy += a.sin() * THRUST * PRESS_FRAMES;
        self.thrust_frames = PRESS_FRAMES as u32;
    }

    fn collect(&mut self, kind: PowerKind) {
        match kind {
            PowerKind::Shield => self.shield_frames = POWER_FRAMES,
            PowerKind::RapidFire => self.rapid_frames = POWER_FRAMES,
            PowerKind::ExtraLife => self.lives += 1,
        }
    }

    fn respawn_ship(&mut self) {
        self.x = FIELD_W / 2.0;
        self.y = FIELD_H / 2.0;
        self.vx = 0.0;
        self.vy = 0.0;
        self.angle = 0.0;
        self.invuln = INVULN_FRAMES;
    }

    fn tick_timers(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
        self.shield_frames = self.shield_frames.saturating_sub(1);
        self.rapid_frames = self.rapid_frames.saturating_sub(1);
        self.invuln = self.invuln.saturating_sub(1);
        self.thrust_frames = self.thrust_frames.saturating_sub(1);
    }

    fn move_things(&mut self) {
        if self.thrust_frames > 0 && self.rng.gen_bool(0.3) {
            let a = self.heading();
            let (tx, ty) = (self.x - a.cos() * SHIP_SIZE, self.y - a.sin() * SHIP_SIZE);
            self.particles.burst(&mut self.rng, tx, ty, Color::Rgb(255, 150, 40), 1, 1.0, 20);
        }
        self.vx *= FRICTION;
        self.vy *= FRICTION;
        self.x = wrap(self.x + self.vx, FIELD_W);
        self.y = wrap(self.y + self.vy, FIELD_H);

        for b in &mut self.bullets {
            b.x += b.vx;
            b.y += b.vy;
            b.life -= 1;
        }
        self.bullets
            .retain(|b| b.life > 0 && (0.0..=FIELD_W).contains(&b.x) && (0.0..=FIELD_H).contains(&b.y));

        for r in &mut self.rocks {
            r.x = wrap(r.x + r.vx, FIELD_W);
            r.y = wrap(r.y + r.vy, FIELD_H);
            r.angle += r.spin;
        }

        for p in &mut self.powerups {
            p.x = wrap(p.x + p.vx, FIELD_W);
            p.y = wrap(p.y + p.vy, FIELD_H);
            p.life = p.life.saturating_sub(1);
        }
        self.particles.update(0.0);
    }

    fn pick_up(&mut self) {
        let (sx, sy) = (self.x, self.y);
        let mut got = Vec::new();
        self.powerups.retain(|p| {
            if dist(sx, sy, p.x, p.y) < SHIP_SIZE + 10.0 {
                got.push(*p);
                return false;
            }
            p.life > 0
        });
        for p in got {
            self.collect(p.kind);
            self.particles.burst(&mut self.rng, p.x, p.y, Color::Green, 8, 2.0, 30);
        }
    }

    fn shoot_rocks(&mut self) {
        let mut i = 0;
        while i < self.bullets.len() {
            let b = self.bullets[i];
            let Some(j) = self.rocks.iter().position(|r| dist(b.x, b.y, r.x, r.y) < r.radius()) else {
                i += 1;
                continue;
            };
            self.bullets.remove(i);
            let rock = self.rocks.remove(j);
            self.score += rock.points();
            self.particles.burst(&mut self.rng, rock.x, rock.y, Color::Gray, 8, 2.0, 30);
            if rock.size == 3 && self.rng.gen_bool(POWERUP_CHANCE) {
                let kind = [PowerKind::Shield, PowerKind::RapidFire, PowerKind::ExtraLife][self.rng.gen_range(0..3)];
                self.powerups.push(PowerUp {
                    x: rock.x,
                    y: rock.y,
                    vx: self.rng.gen_range(-1.0..1.0),
                    vy: self.rng.gen_range(-1.0..1.0),
                    kind,
                    life: POWERUP_LIFE,
                });
            }
            if rock.size > 1 {
                for _ in 0..2 {
                    let child = self.make_rock(rock.x, rock.y, rock.size - 1);
                    self.rocks.push(child);
                }
            }
        }
    }

    fn ram_rocks(&mut self) {
        if self.invuln > 0 {
            return;
        }
        let (sx, sy) = (self.x, self.y);
        let Some(i) = self.rocks.iter().position(|r| dist(sx, sy, r.x, r.y) < SHIP_SIZE + r.radius()) else {
            return;
        };
        let rock = self.rocks.remove(i);
        if self.shield_frames > 0 {
            self.shield_frames = 0;
            self.particles.burst(&mut self.rng, rock.x, rock.y, Color::Cyan, 8, 2.0, 30);
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        self.particles.burst(&mut self.rng, sx, sy, Color::White, 8, 2.0, 30);
        if self.lives == 0 {
            self.game_over = true;
            debug!(score = self.score, level = self.level, "asteroids game over");
        } else {
            self.respawn_ship();
        }
    }

    fn step(&mut self, dt_ms: u64) {
        self.tick += 1;
        self.tick_timers();
        self.move_things();

        if let Some(left) = self.next_level_ms {
            if left > dt_ms {
                self.next_level_ms = Some(left - dt_ms);
            } else {
                self.next_level_ms = None;
                self.init_level();
            }
            return;
        }

        self.pick_up();
        self.shoot_rocks();
        self.ram_rocks();

        if self.rocks.is_empty() && !self.game_over {
            self.level += 1;
            self.next_level_ms = Some(LEVEL_DELAY_MS);
            debug!(level = self.level, score = self.score, "asteroids field cleared");
        }
    }

    fn ship_outline(&self) -> [(f32, f32); 4] {
        let (s, c) = self.angle.sin_cos();
        let at = |px: f32, py: f32| (self.x + px * c - py * s, self.y + px * s + py * c);
        [at(0.0, -20.0), at(-15.0, 15.0), at(0.0, 10.0), at(15.0, 15.0)]
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let bg = Color::Rgb(5, 5, 15);
        let mut c = Canvas::new(width as u16, height as u16, bg);
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        for yi in 0..height {
            for xi in 0..width {
                let hash = ((xi * 7 + yi * 13 + 37) * 31) % 250;
                if hash < 2 {
                    c.put(xi as i32, yi as i32, '.', Color::Rgb(60, 60, 70));
                }
            }
        }

        for r in &self.rocks {
            let shade = 120 + r.size as u8 * 20;
            c.braille_polygon(&scale, &r.outline(), Color::Rgb(shade, shade - 20, shade - 50));
        }
        for p in &self.powerups {
            let (glyph, color) = match p.kind {
                PowerKind::Shield => ('S', Color::Cyan),
                PowerKind::RapidFire => ('R', Color::Yellow),
                PowerKind::ExtraLife => ('♥', Color::Green),
            };
            c.dot(&scale, p.x, p.y, glyph, color);
        }
        for b in &self.bullets {
            c.dot(&scale, b.x, b.y, '•', Color::Rgb(255, 255, 80));
        }
        for p in &self.particles.list {
            c.dot(&scale, p.x, p.y, '·', p.color);
        }

        let visible = self.invuln == 0 || self.tick % 8 < 4;
        if !self.game_over && visible {
            let color = if self.thrust_frames > 0 { Color::Rgb(100, 230, 255) } else { Color::Rgb(80, 255, 140) };
            c.braille_polygon(&scale, &self.ship_outline(), color);
            if self.shield_frames > 0 {
                let ring: Vec<(f32, f32)> = (0..16)
                    .map(|i| {
                        let a = i as f32 / 16.0 * TAU;
                        (self.x + a.cos() * (SHIP_SIZE + 10.0), self.y + a.sin() * (SHIP_SIZE + 10.0))
                    })
                    .collect();
                c.braille_polygon(&scale, &ring, Color::Cyan);
            }
        }
        c
    }
}

impl Game for Asteroids {
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
            KeyCode::Left => self.angle -= ROTATION * PRESS_FRAMES,
            KeyCode::Right => self.angle += ROTATION * PRESS_FRAMES,
            KeyCode::Up => self.thrust(),
            KeyCode::Char(' ') => self.shoot(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "☄ Asteroids", Color::Rgb(100, 200, 255));

        let mut parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", "♦ ".repeat(self.lives as usize)), Color::Red),
            (format!("Level: {}", self.level), Color::Green),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        if self.shield_frames > 0 {
            parts.push(("Shield".to_string(), Color::Cyan));
        }
        if self.rapid_frames > 0 {
            parts.push(("Rapid".to_string(), Color::Yellow));
        }
        canvas::render_lines(frame, status, canvas::status_line("☄", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("←→", "Rotate"), ("↑", "Thrust"), ("SPACE", "Shoot"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Asteroids::with_rng(rng);
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

    fn lone_rock(a: &mut Asteroids, x: f32, y: f32, size: u32) {
        let mut rock = a.make_rock(x, y, size);
        rock.vx = 0.0;
        rock.vy = 0.0;
        a.rocks = vec![rock];
    }

    #[test]
    fn test_level_rock_count_and_safe_spawn() {
        let a = Asteroids::with_seed(1);
        assert_eq!(a.rocks.len(), 4);
        assert!(a.rocks.iter().all(|r| r.size == 3));
        assert!(a.rocks.iter().all(|r| dist(r.x, r.y, a.x, a.y) > SAFE_RADIUS));
    }

    #[test]
    fn test_bullet_splits_rock() {
        let mut a = Asteroids::with_seed(2);
        lone_rock(&mut a, 100.0, 100.0, 3);
        a.bullets.push(Bullet { x: 100.0, y: 100.0, vx: 0.0, vy: 0.0, life: 10 });
        a.shoot_rocks();
        assert_eq!(a.score, 10);
        assert_eq!(a.rocks.len(), 2);
        assert!(a.rocks.iter().all(|r| r.size == 2));
        assert!(a.bullets.is_empty());
    }

    #[test]
    fn test_small_rock_vanishes() {
        let mut a = Asteroids::with_seed(3);
        lone_rock(&mut a, 100.0, 100.0, 1);
        a.bullets.push(Bullet { x: 102.0, y: 100.0, vx: 0.0, vy: 0.0, life: 10 });
        a.shoot_rocks();
        assert_eq!(a.score, 30);
        assert!(a.rocks.is_empty());
    }

    #[test]
    fn test_spread_shot_with_rapid_fire() {
        let mut a = Asteroids::with_seed(4);
        a.shoot();
        assert_eq!(a.bullets.len(), 1);
        assert_eq!(a.cooldown, COOLDOWN);
        a.cooldown = 0;
        a.collect(PowerKind::RapidFire);
        a.shoot();
        assert_eq!(a.bullets.len(), 4);
        assert_eq!(a.cooldown, RAPID_COOLDOWN);
    }

    #[test]
    fn test_bullet_inherits_ship_velocity() {
        let mut a = Asteroids::with_seed(5);
        a.vx = 2.0;
        a.shoot();
        let b = a.bullets[0];
        assert!((b.vx - 2.0).abs() < 1e-4);
        assert!((b.vy + BULLET_SPEED).abs() < 1e-4);
    }

    #[test]
    fn test_shield_absorbs_one_hit() {
        let mut a = Asteroids::with_seed(6);
        a.collect(PowerKind::Shield);
        let (x, y) = (a.x, a.y);
        lone_rock(&mut a, x, y, 2);
        a.ram_rocks();
        assert_eq!(a.lives, 3);
        assert_eq!(a.shield_frames, 0);
        assert!(a.rocks.is_empty());
    }

    #[test]
    fn test_collision_costs_life_and_respawns() {
        let mut a = Asteroids::with_seed(7);
        a.x = 100.0;
        let y = a.y;
        lone_rock(&mut a, 100.0, y, 2);
        a.ram_rocks();
        assert_eq!(a.lives, 2);
        assert_eq!(a.x, FIELD_W / 2.0);
        assert_eq!(a.invuln, INVULN_FRAMES);
    }

    #[test]
    fn test_clear_advances_level_after_delay() {
        let mut a = Asteroids::with_seed(8);
        a.rocks.clear();
        a.step(16);
        assert_eq!(a.level, 2);
        a.step(500);
        assert!(a.rocks.is_empty());
        a.step(500);
        assert_eq!(a.rocks.len(), 5);
    }

    #[test]
    fn test_ship_wraps() {
        let mut a = Asteroids::with_seed(9);
        a.rocks.clear();
        a.next_level_ms = Some(10_000);
        a.x = FIELD_W - 1.0;
        a.vx = 5.0;
        a.step(16);
        assert!(a.x < 10.0);
    }
}
