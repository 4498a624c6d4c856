use std::f32::consts::{FRAC_PI_2, PI};

use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom::{self, dist};
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 600.0;
const HALF: f32 = 20.0;
/// Per key press: speed 3 held for four frames
const PLAYER_STEP: f32 = 12.0;
const BULLET_SPEED: f32 = 8.0;
const ENEMY_BULLET_SPEED: f32 = 5.0;
const SHOT_COOLDOWN_MS: u64 = 300;
const SPAWN_EVERY_MS: u64 = 2000;
const LEVEL_DELAY_MS: u64 = 1000;
const ENEMY_SPEED: f32 = 1.5;
const ENEMY_KEEP_AWAY: f32 = 200.0;
const ENEMY_RANGE: f32 = 400.0;
const ENEMY_RELOAD: u32 = 120;
const HIT_RADIUS: f32 = 20.0;
const TANK_POINTS: u32 = 100;
const OBSTACLE: f32 = 60.0;
const OBSTACLES: [(f32, f32); 7] = [
    (200.0, 150.0),
    (600.0, 150.0),
    (400.0, 300.0),
    (150.0, 400.0),
    (650.0, 400.0),
    (300.0, 200.0),
    (500.0, 200.0),
];

#[derive(Clone, Copy, Debug)]
struct Block {
    x: f32,
    y: f32,
    hp: u32,
}

impl Block {
    fn bounds(&self) -> geom::Rect {
        geom::Rect::new(self.x, self.y, OBSTACLE, OBSTACLE)
    }
}

#[derive(Clone, Copy, Debug)]
struct Enemy {
    x: f32,
    y: f32,
    angle: f32,
    hp: u32,
    reload: u32,
}

#[derive(Clone, Copy, Debug)]
struct Shell {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
}

#[derive(Clone, Copy, Debug)]
struct Blast {
    x: f32,
    y: f32,
    radius: f32,
    life: u32,
}

fn obstacles() -> Vec<Block> {
    OBSTACLES.iter().map(|&(x, y)| Block { x, y, hp: 3 }).collect()
}

fn in_field(x: f32, y: f32) -> bool {
    (0.0..=FIELD_W).contains(&x) && (0.0..=FIELD_H).contains(&y)
}

/// Moves shells and lets the first obstacle each one enters absorb it
fn fly(shells: &mut Vec<Shell>, blocks: &mut Vec<Block>) {
    shells.retain_mut(|s| {
        s.x += s.vx;
        s.y += s.vy;
        if !in_field(s.x, s.y) {
            return false;
        }
        let Some(i) = blocks.iter().position(|b| b.bounds().contains(s.x, s.y)) else {
            return true;
        };
        blocks[i].hp -= 1;
        if blocks[i].hp == 0 {
            blocks.remove(i);
        }
        false
    });
}

pub struct Tanks {
    x: f32,
    y: f32,
    angle: f32,
    enemies: Vec<Enemy>,
    shells: Vec<Shell>,
    enemy_shells: Vec<Shell>,
    blocks: Vec<Block>,
    blasts: Vec<Blast>,
    pending: u32,
    spawn_ms: u64,
    cooldown_ms: u64,
    next_level_ms: Option<u64>,
    score: u32,
    best: u32,
    lives: u32,
    level: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Tanks {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut t = Self {
            x: 400.0,
            y: 500.0,
            angle: -FRAC_PI_2,
            enemies: Vec::new(),
            shells: Vec::new(),
            enemy_shells: Vec::new(),
            blocks: Vec::new(),
            blasts: Vec::new(),
            pending: 0,
            spawn_ms: 0,
            cooldown_ms: 0,
            next_level_ms: None,
            score: 0,
            best: 0,
            lives: 3,
            level: 1,
            paused: false,
            game_over: false,
            rng,
        };
        t.init_level();
        t
    }

    fn init_level(&mut self) {
        self.enemies.clear();
        self.blocks = obstacles();
        self.pending = 3 + self.level;
        self.spawn_ms = 0;
    }

    fn drive(&mut self, dx: f32, dy: f32, angle: f32) {
        self.angle = angle;
        let nx = (self.x + dx).clamp(HALF, FIELD_W - HALF);
        let ny = (self.y + dy).clamp(HALF, FIELD_H - HALF);
        let body = geom::Rect::around(nx, ny, HALF);
        if self.blocks.iter().any(|b| b.bounds().intersects(&body)) {
            return;
        }
        self.x = nx;
        self.y = ny;
    }

    fn fire(&mut self) {
        if self.cooldown_ms > 0 {
            return;
        }
        let (s, c) = self.angle.sin_cos();
        self.shells.push(Shell {
            x: self.x + c * 25.0,
            y: self.y + s * 25.0,
            vx: c * BULLET_SPEED,
            vy: s * BULLET_SPEED,
        });
        self.cooldown_ms = SHOT_COOLDOWN_MS;
    }

    fn spawn_enemy(&mut self) {
        let (x, y) = match self.rng.gen_range(0..4) {
            0 => (self.rng.gen_range(0.0..FIELD_W), 0.0),
            1 => (FIELD_W, self.rng.gen_range(0.0..FIELD_H)),
            2 => (self.rng.gen_range(0.0..FIELD_W), FIELD_H),
            _ => (0.0, self.rng.gen_range(0.0..FIELD_H)),
        };
        self.enemies.push(Enemy { x, y, angle: 0.0, hp: 2, reload: 0 });
    }

    fn boom(&mut self, x: f32, y: f32) {
        self.blasts.push(Blast { x, y, radius: 5.0, life: 30 });
    }

    fn step(&mut self, dt_ms: u64) {
        self.cooldown_ms = self.cooldown_ms.saturating_sub(dt_ms);
        for b in &mut self.blasts {
            b.radius += 2.0;
            b.life -= 1;
        }
        self.blasts.retain(|b| b.life > 0);

        if let Some(left) = self.next_level_ms {
            if left > dt_ms {
                self.next_level_ms = Some(left - dt_ms);
            } else {
                self.next_level_ms = None;
                self.init_level();
            }
            return;
        }

        if self.pending > 0 {
            if self.spawn_ms == 0 {
                self.spawn_enemy();
                self.pending -= 1;
                self.spawn_ms = SPAWN_EVERY_MS;
            } else {
                self.spawn_ms = self.spawn_ms.saturating_sub(dt_ms);
            }
        }

        fly(&mut self.shells, &mut self.blocks);

        let (px, py) = (self.x, self.y);
        for e in &mut self.enemies {
            let (dx, dy) = (px - e.x, py - e.y);
            let d = dist(px, py, e.x, e.y);
            if d > ENEMY_KEEP_AWAY {
                e.x += dx / d * ENEMY_SPEED;
                e.y += dy / d * ENEMY_SPEED;
            }
            e.angle = dy.atan2(dx);
            e.reload += 1;
            if e.reload > ENEMY_RELOAD && d < ENEMY_RANGE {
                let (s, c) = e.angle.sin_cos();
                self.enemy_shells.push(Shell { x: e.x, y: e.y, vx: c * ENEMY_BULLET_SPEED, vy: s * ENEMY_BULLET_SPEED });
                e.reload = 0;
            }
        }

        fly(&mut self.enemy_shells, &mut self.blocks);
        let before = self.enemy_shells.len();
        self.enemy_shells.retain(|s| dist(s.x, s.y, px, py) >= HIT_RADIUS);
        for _ in 0..before - self.enemy_shells.len() {
            self.lives = self.lives.saturating_sub(1);
            self.boom(px, py);
        }
        if self.lives == 0 {
            self.game_over = true;
            debug!(score = self.score, level = self.level, "tanks game over");
            return;
        }

        let mut i = 0;
        while i < self.shells.len() {
            let s = self.shells[i];
            let Some(j) = self.enemies.iter().position(|e| dist(s.x, s.y, e.x, e.y) < HIT_RADIUS) else {
                i += 1;
                continue;
            };
            self.shells.remove(i);
            self.enemies[j].hp -= 1;
            if self.enemies[j].hp == 0 {
                let e = self.enemies.remove(j);
                self.boom(e.x, e.y);
                self.score += TANK_POINTS;
            }
        }

        if self.enemies.is_empty() && self.pending == 0 && self.shells.is_empty() {
            self.level += 1;
            self.next_level_ms = Some(LEVEL_DELAY_MS);
            debug!(level = self.level, score = self.score, "tanks level cleared");
        }
    }

    fn draw_tank(c: &mut Canvas, scale: &Scale, x: f32, y: f32, angle: f32, color: Color) {
        c.rect(scale, x - 17.0, y - 13.0, 34.0, 26.0, '█', color);
        let barrel = match angle {
            a if a.abs() <= PI / 4.0 => '━',
            a if a.abs() >= PI * 3.0 / 4.0 => '━',
            _ => '┃',
        };
        let (s, co) = angle.sin_cos();
        c.dot(scale, x + co * 25.0, y + s * 25.0, barrel, color);
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(61, 92, 61));
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        for b in &self.blocks {
            let shade = match b.hp {
                3 => '█',
                2 => '▓',
                _ => '▒',
            };
            c.rect(&scale, b.x, b.y, OBSTACLE, OBSTACLE, shade, Color::Rgb(139, 69, 19));
        }
        for b in &self.blasts {
            let color = if b.life > 15 { Color::Rgb(255, 152, 0) } else { Color::Rgb(255, 87, 34) };
            let r = b.radius * 0.5;
            c.rect(&scale, b.x - r, b.y - r, r * 2.0, r * 2.0, '░', color);
        }
        for e in &self.enemies {
            Self::draw_tank(&mut c, &scale, e.x, e.y, e.angle, Color::Rgb(244, 67, 54));
        }
        if !self.game_over {
            Self::draw_tank(&mut c, &scale, self.x, self.y, self.angle, Color::Rgb(76, 175, 80));
        }
        for s in &self.shells {
            c.dot(&scale, s.x, s.y, '•', Color::Rgb(255, 235, 59));
        }
        for s in &self.enemy_shells {
            c.dot(&scale, s.x, s.y, '•', Color::Rgb(255, 87, 34));
        }
        c
    }
}

impl Game for Tanks {
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
            KeyCode::Up | KeyCode::Char('w') => self.drive(0.0, -PLAYER_STEP, -FRAC_PI_2),
            KeyCode::Down | KeyCode::Char('s') => self.drive(0.0, PLAYER_STEP, FRAC_PI_2),
            KeyCode::Left | KeyCode::Char('a') => self.drive(-PLAYER_STEP, 0.0, PI),
            KeyCode::Right | KeyCode::Char('d') => self.drive(PLAYER_STEP, 0.0, 0.0),
            KeyCode::Char(' ') => self.fire(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🪖 Tanks", Color::Rgb(255, 160, 60));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", self.lives), Color::Red),
            (format!("Level: {}", self.level), Color::Green),
            (format!("Enemies: {}", self.enemies.len() as u32 + self.pending), Color::Rgb(244, 67, 54)),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🪖", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else if self.next_level_ms.is_some() {
            canvas::won_line(&format!("Level {} next!", self.level))
        } else {
            canvas::help_line(&[("↑↓←→", "Drive"), ("SPACE", "Fire"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Tanks::with_rng(rng);
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

    fn enemy(x: f32, y: f32) -> Enemy {
        Enemy { x, y, angle: 0.0, hp: 2, reload: 0 }
    }

    #[test]
    fn test_spawns_one_every_two_seconds() {
        let mut t = Tanks::with_seed(1);
        assert_eq!(t.pending, 4);
        t.step(16);
        assert_eq!(t.enemies.len(), 1);
        t.step(1000);
        assert_eq!(t.enemies.len(), 1);
        t.step(1000);
        t.step(16);
        assert_eq!(t.enemies.len(), 2);
        assert_eq!(t.pending, 2);
    }

    #[test]
    fn test_obstacle_blocks_driving() {
        let mut t = Tanks::with_seed(2);
        // Just below the centre block at (400, 300)
        t.x = 430.0;
        t.y = 360.0 + HALF + 5.0;
        t.drive(0.0, -PLAYER_STEP, -FRAC_PI_2);
        assert_eq!(t.y, 385.0);
        assert_eq!(t.angle, -FRAC_PI_2);
    }

    #[test]
    fn test_shells_wear_down_obstacles() {
        let mut t = Tanks::with_seed(3);
        let mut shells = Vec::new();
        for _ in 0..3 {
            shells.push(Shell { x: 430.0, y: 295.0, vx: 0.0, vy: 8.0 });
        }
        fly(&mut shells, &mut t.blocks);
        assert!(shells.is_empty());
        assert_eq!(t.blocks.len(), 6);
    }

    #[test]
    fn test_enemy_takes_two_hits() {
        let mut t = Tanks::with_seed(4);
        t.pending = 0;
        t.enemies = vec![enemy(100.0, 100.0)];
        t.shells.push(Shell { x: 100.0, y: 100.0, vx: 0.0, vy: 0.0 });
        t.step(16);
        assert_eq!(t.enemies[0].hp, 1);
        let (ex, ey) = (t.enemies[0].x, t.enemies[0].y);
        t.shells.push(Shell { x: ex, y: ey, vx: 0.0, vy: 0.0 });
        t.step(16);
        assert!(t.enemies.is_empty());
        assert_eq!(t.score, TANK_POINTS);
    }

    #[test]
    fn test_enemy_approaches_then_holds() {
        let mut t = Tanks::with_seed(5);
        t.pending = 0;
        t.enemies = vec![enemy(400.0, 100.0)];
        t.blocks.clear();
        t.step(16);
        assert!((t.enemies[0].y - 101.5).abs() < 1e-3);
        t.enemies[0].y = t.y - 150.0;
        let y = t.enemies[0].y;
        t.step(16);
        assert_eq!(t.enemies[0].y, y);
    }

    #[test]
    fn test_level_waits_for_pending_spawns() {
        let mut t = Tanks::with_seed(6);
        t.step(16);
        t.enemies.clear();
        t.step(16);
        assert_eq!(t.level, 1);
        t.pending = 0;
        t.step(16);
        assert_eq!(t.level, 2);
        t.step(LEVEL_DELAY_MS);
        assert_eq!(t.pending, 5);
    }

    #[test]
    fn test_enemy_shell_costs_life() {
        let mut t = Tanks::with_seed(7);
        t.pending = 0;
        t.enemies = vec![enemy(0.0, 0.0)];
        t.enemy_shells.push(Shell { x: t.x, y: t.y - 5.0, vx: 0.0, vy: 5.0 });
        t.step(16);
        assert_eq!(t.lives, 2);
    }
}
