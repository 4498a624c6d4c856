use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom;
use crate::games::particles::Particles;
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 600.0;
const PLAYER_SIZE: f32 = 40.0;
/// Per key press: speed 5 held for four frames
const PLAYER_STEP: f32 = 20.0;
const FIRE_COOLDOWN: u32 = 10;
const BULLET_SPEED: f32 = 7.0;
const BULLET_W: f32 = 4.0;
const BULLET_H: f32 = 15.0;
const WEAPON_FRAMES: u32 = 600;
const POWERUP_SIZE: f32 = 20.0;
const POWERUP_SPEED: f32 = 2.0;
const DROP_CHANCE: f64 = 0.15;
const MAX_LIVES: u32 = 5;
const LEVEL_POINTS: u32 = 200;
const SPEED_STEP: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Weapon {
    Single,
    Double,
    Triple,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EnemyKind {
    Normal,
    Fast,
    Tank,
}

impl EnemyKind {
    fn color(self) -> Color {
        match self {
            EnemyKind::Normal => Color::Rgb(255, 107, 107),
            EnemyKind::Fast => Color::Rgb(255, 217, 61),
            EnemyKind::Tank => Color::Rgb(157, 78, 221),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PowerKind {
    DoubleShot,
    TripleShot,
    Health,
}

#[derive(Clone, Copy, Debug)]
struct Bullet {
    x: f32,
    y: f32,
    vx: f32,
}

#[derive(Clone, Copy, Debug)]
struct Enemy {
    x: f32,
    y: f32,
    size: f32,
    speed: f32,
    hp: u32,
    points: u32,
    kind: EnemyKind,
}

impl Enemy {
    fn bounds(&self) -> geom::Rect {
        geom::Rect::new(self.x, self.y, self.size, self.size)
    }
}

#[derive(Clone, Copy, Debug)]
struct PowerUp {
    x: f32,
    y: f32,
    kind: PowerKind,
}

pub struct Shooter {
    px: f32,
    py: f32,
    bullets: Vec<Bullet>,
    enemies: Vec<Enemy>,
    powerups: Vec<PowerUp>,
    particles: Particles,
    weapon: Weapon,
    weapon_frames: u32,
    cooldown: u32,
    enemy_speed: f32,
    frame: u32,
    score: u32,
    best: u32,
    lives: u32,
    level: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Shooter {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            px: FIELD_W / 2.0 - PLAYER_SIZE / 2.0,
            py: FIELD_H - 80.0,
            bullets: Vec::new(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            particles: Particles::default(),
            weapon: Weapon::Single,
            weapon_frames: 0,
            cooldown: 0,
            enemy_speed: 1.0,
            frame: 0,
            score: 0,
            best: 0,
            lives: 3,
            level: 1,
            paused: false,
            game_over: false,
            rng,
        }
    }

    fn player_bounds(&self) -> geom::Rect {
        geom::Rect::new(self.px, self.py, PLAYER_SIZE, PLAYER_SIZE)
    }

    fn nudge(&mut self, dx: f32, dy: f32) {
        self.px = (self.px + dx).clamp(0.0, FIELD_W - PLAYER_SIZE);
        self.py = (self.py + dy).clamp(0.0, FIELD_H - PLAYER_SIZE);
    }

    fn spawn_interval(&self) -> u32 {
        100u32.saturating_sub(self.level * 5).max(30)
    }

    fn shoot(&mut self) {
        if self.cooldown > 0 {
            return;
        }
        self.cooldown = FIRE_COOLDOWN;
        let mid = self.px + PLAYER_SIZE / 2.0 - BULLET_W / 2.0;
        let left = self.px + 5.0;
        let right = self.px + PLAYER_SIZE - 9.0;
        let y = self.py;
        let shots = match self.weapon {
            Weapon::Single => vec![Bullet { x: mid, y, vx: 0.0 }],
            Weapon::Double => vec![Bullet { x: left, y, vx: 0.0 }, Bullet { x: right, y, vx: 0.0 }],
            Weapon::Triple => vec![
                Bullet { x: mid, y, vx: 0.0 },
                Bullet { x: left, y: y + 5.0, vx: -1.0 },
                Bullet { x: right, y: y + 5.0, vx: 1.0 },
            ],
        };
        self.bullets.extend(shots);
    }

    fn spawn_enemy(&mut self) {
        // Tanks and fast movers unlock as the level climbs
        let unlocked = (self.level.div_ceil(3) + 1).min(3) as usize;
        let kind = [EnemyKind::Normal, EnemyKind::Fast, EnemyKind::Tank][self.rng.gen_range(0..unlocked)];
        let base = self.enemy_speed + self.rng.gen::<f32>();
        let tough = self.level.div_ceil(2);
        let (size, speed, hp, points) = match kind {
            EnemyKind::Normal => (35.0, base, tough, 10),
            EnemyKind::Fast => (25.0, base * 2.0, 1, 20),
            EnemyKind::Tank => (50.0, base * 0.6, tough + 3, 30),
        };
        self.enemies.push(Enemy {
            x: self.rng.gen_range(0.0..FIELD_W - 40.0),
            y: -40.0,
            size,
            speed,
            hp,
            points,
            kind,
        });
    }

    fn collect(&mut self, kind: PowerKind) {
        match kind {
            PowerKind::DoubleShot => {
                self.weapon = Weapon::Double;
                self.weapon_frames = WEAPON_FRAMES;
            }
            PowerKind::TripleShot => {
                self.weapon = Weapon::Triple;
                self.weapon_frames = WEAPON_FRAMES;
            }
            PowerKind::Health => self.lives = (self.lives + 1).min(MAX_LIVES),
        }
    }

    fn add_score(&mut self, points: u32) {
        let before = self.score;
        self.score += points * self.level;
        let crossed = self.score / LEVEL_POINTS - before / LEVEL_POINTS;
        if crossed > 0 {
            self.level += crossed;
            self.enemy_speed += SPEED_STEP * crossed as f32;
            debug!(level = self.level, score = self.score, "shooter level up");
        }
    }

    fn step(&mut self) {
        self.frame += 1;
        self.cooldown = self.cooldown.saturating_sub(1);
        if self.weapon_frames > 0 {
            self.weapon_frames -= 1;
            if self.weapon_frames == 0 {
                self.weapon = Weapon::Single;
            }
        }

        for b in &mut self.bullets {
            b.y -= BULLET_SPEED;
            b.x += b.vx;
        }
        self.bullets.retain(|b| b.y > -BULLET_H && b.x > -10.0 && b.x < FIELD_W + 10.0);

        if self.frame % self.spawn_interval() == 0 {
            self.spawn_enemy();
        }

        let player = self.player_bounds();
        let mut rammed = Vec::new();
        self.enemies.retain_mut(|e| {
            e.y += e.speed;
            if e.bounds().intersects(&player) {
                rammed.push(*e);
                return false;
            }
            e.y < FIELD_H + e.size
        });
        for e in rammed {
            let (cx, cy) = e.bounds().center();
            self.particles.burst(&mut self.rng, cx, cy, e.kind.color(), 15, 3.0, 30);
            self.lives = self.lives.saturating_sub(1);
        }
        if self.lives == 0 {
            self.game_over = true;
            debug!(score = self.score, level = self.level, "shooter game over");
            return;
        }

        let mut picked = Vec::new();
        self.powerups.retain_mut(|p| {
            p.y += POWERUP_SPEED;
            if geom::Rect::new(p.x, p.y, POWERUP_SIZE, POWERUP_SIZE).intersects(&player) {
                picked.push(*p);
                return false;
            }
            p.y < FIELD_H + POWERUP_SIZE
        });
        for p in picked {
            self.collect(p.kind);
            self.particles.burst(&mut self.rng, p.x, p.y, Color::Rgb(16, 185, 129), 15, 3.0, 30);
        }

        let mut i = 0;
        while i < self.bullets.len() {
            let b = geom::Rect::new(self.bullets[i].x, self.bullets[i].y, BULLET_W, BULLET_H);
            let Some(j) = self.enemies.iter().position(|e| e.bounds().intersects(&b)) else {
                i += 1;
                continue;
            };
            self.bullets.remove(i);
            self.enemies[j].hp = self.enemies[j].hp.saturating_sub(1);
            if self.enemies[j].hp == 0 {
                let e = self.enemies.remove(j);
                let (cx, cy) = e.bounds().center();
                self.particles.burst(&mut self.rng, cx, cy, e.kind.color(), 15, 3.0, 30);
                if self.rng.gen_bool(DROP_CHANCE) {
                    let kind = [PowerKind::DoubleShot, PowerKind::TripleShot, PowerKind::Health][self.rng.gen_range(0..3)];
                    self.powerups.push(PowerUp { x: cx - POWERUP_SIZE / 2.0, y: e.y, kind });
                }
                self.add_score(e.points);
            }
        }

        self.particles.update(0.0);
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Black);
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        for i in 0..50u32 {
            let x = (i * 73) as f32 % FIELD_W;
            let y = (i as f32 * 97.0 + self.frame as f32 * 0.5) % FIELD_H;
            c.dot(&scale, x, y, '.', Color::DarkGray);
        }
        for e in &self.enemies {
            c.rect(&scale, e.x, e.y, e.size, e.size, '▓', e.kind.color());
        }
        for p in &self.powerups {
            let (glyph, color) = match p.kind {
                PowerKind::DoubleShot => ('2', Color::Rgb(59, 130, 246)),
                PowerKind::TripleShot => ('3', Color::Rgb(139, 92, 246)),
                PowerKind::Health => ('♥', Color::Rgb(16, 185, 129)),
            };
            c.dot(&scale, p.x + POWERUP_SIZE / 2.0, p.y + POWERUP_SIZE / 2.0, glyph, color);
        }
        for b in &self.bullets {
            c.dot(&scale, b.x, b.y, '|', Color::Cyan);
        }
        for p in &self.particles.list {
            c.dot(&scale, p.x, p.y, '*', p.color);
        }
        let (cx, cy) = self.player_bounds().center();
        c.dot(&scale, cx, cy, '▲', Color::Rgb(0, 255, 136));
        c
    }
}

impl Game for Shooter {
    fn update(&mut self, _dt_ms: u64) {
        if self.paused || self.game_over {
            return;
        }
        self.step();
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
            KeyCode::Char(' ') => self.shoot(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🔫 Shooter", Color::Rgb(0, 255, 136));

        let weapon = match self.weapon {
            Weapon::Single => "Single".to_string(),
            Weapon::Double => format!("Double {}s", self.weapon_frames / 60),
            Weapon::Triple => format!("Triple {}s", self.weapon_frames / 60),
        };
        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", self.lives), Color::Red),
            (format!("Level: {}", self.level), Color::Cyan),
            (weapon, Color::Magenta),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🔫", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("↑↓←→", "Move"), ("SPACE", "Fire"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Shooter::with_rng(rng);
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

    fn enemy(x: f32, y: f32, hp: u32) -> Enemy {
        Enemy { x, y, size: 35.0, speed: 0.0, hp, points: 10, kind: EnemyKind::Normal }
    }

    #[test]
    fn test_weapon_patterns() {
        let mut g = Shooter::with_seed(1);
        g.shoot();
        assert_eq!(g.bullets.len(), 1);
        g.cooldown = 0;
        g.collect(PowerKind::DoubleShot);
        g.shoot();
        assert_eq!(g.bullets.len(), 3);
        g.cooldown = 0;
        g.collect(PowerKind::TripleShot);
        g.shoot();
        assert_eq!(g.bullets.len(), 6);
        assert_eq!(g.bullets.iter().filter(|b| b.vx != 0.0).count(), 2);
    }

    #[test]
    fn test_cooldown_in_frames() {
        let mut g = Shooter::with_seed(2);
        g.shoot();
        g.shoot();
        assert_eq!(g.bullets.len(), 1);
        for _ in 0..FIRE_COOLDOWN {
            g.step();
        }
        g.shoot();
        assert_eq!(g.bullets.len(), 2);
    }

    #[test]
    fn test_weapon_expires() {
        let mut g = Shooter::with_seed(3);
        g.collect(PowerKind::TripleShot);
        for _ in 0..WEAPON_FRAMES {
            g.step();
            if g.game_over {
                return;
            }
        }
        assert_eq!(g.weapon, Weapon::Single);
    }

    #[test]
    fn test_health_caps_at_five() {
        let mut g = Shooter::with_seed(4);
        for _ in 0..5 {
            g.collect(PowerKind::Health);
        }
        assert_eq!(g.lives, MAX_LIVES);
    }

    #[test]
    fn test_kill_scores_times_level() {
        let mut g = Shooter::with_seed(5);
        g.level = 3;
        g.enemies = vec![enemy(400.0, 200.0, 1)];
        g.bullets.push(Bullet { x: 410.0, y: 240.0, vx: 0.0 });
        g.step();
        assert_eq!(g.score, 30);
    }

    #[test]
    fn test_crossing_boundary_levels_up() {
        let mut g = Shooter::with_seed(6);
        g.score = 195;
        g.add_score(10);
        assert_eq!(g.level, 2);
        assert!((g.enemy_speed - 1.3).abs() < 1e-5);
        g.add_score(10);
        assert_eq!(g.level, 2);
    }

    #[test]
    fn test_ramming_costs_life() {
        let mut g = Shooter::with_seed(7);
        g.enemies = vec![enemy(g.px, g.py, 1)];
        g.step();
        assert_eq!(g.lives, 2);
        assert!(g.enemies.is_empty() || g.enemies.iter().all(|e| e.y < 0.0));
    }

    #[test]
    fn test_spawn_interval_floor() {
        let mut g = Shooter::with_seed(8);
        assert_eq!(g.spawn_interval(), 95);
        g.level = 30;
        assert_eq!(g.spawn_interval(), 30);
    }
}
