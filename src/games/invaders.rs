use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom;
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 600.0;
const PLAYER_W: f32 = 40.0;
const PLAYER_H: f32 = 30.0;
/// Per key press: speed 5 held for four frames
const PLAYER_STEP: f32 = 20.0;
const SHOT_COOLDOWN_MS: u64 = 300;
const BULLET_W: f32 = 4.0;
const BULLET_H: f32 = 10.0;
const PLAYER_BULLET_SPEED: f32 = -8.0;
const ENEMY_BULLET_SPEED: f32 = 5.0;
const ENEMY_W: f32 = 40.0;
const ENEMY_H: f32 = 30.0;
const ENEMY_ROWS: usize = 4;
const ENEMY_COLS: usize = 10;
const DROP: f32 = 20.0;
const ENEMY_FIRE_CHANCE: f64 = 0.01;
const INVASION_Y: f32 = FIELD_H - 100.0;
const SHIELD_BLOCK: f32 = 8.0;
const SHIELD_ROWS: usize = 4;
const SHIELD_COLS: usize = 8;
const LEVEL_DELAY_MS: u64 = 1000;
const START_LIVES: u32 = 3;

#[derive(Clone, Copy, Debug)]
struct Enemy {
    x: f32,
    y: f32,
    /// 1 for the two back rows, worth more
    kind: u32,
}

impl Enemy {
    fn bounds(&self) -> geom::Rect {
        geom::Rect::new(self.x, self.y, ENEMY_W, ENEMY_H)
    }

    fn points(&self) -> u32 {
        (self.kind + 1) * 10
    }
}

#[derive(Clone, Copy, Debug)]
struct Bullet {
    x: f32,
    y: f32,
    vy: f32,
}

impl Bullet {
    fn bounds(&self) -> geom::Rect {
        geom::Rect::new(self.x, self.y, BULLET_W, BULLET_H)
    }
}

#[derive(Clone, Copy, Debug)]
struct ShieldBlock {
    x: f32,
    y: f32,
    hp: u8,
}

fn formation() -> Vec<Enemy> {
    let mut enemies = Vec::with_capacity(ENEMY_ROWS * ENEMY_COLS);
    for row in 0..ENEMY_ROWS {
        for col in 0..ENEMY_COLS {
            enemies.push(Enemy {
                x: 80.0 + col as f32 * 60.0,
                y: 50.0 + row as f32 * 50.0,
                kind: u32::from(row < 2),
            });
        }
    }
    enemies
}

fn shields() -> Vec<ShieldBlock> {
    let mut blocks = Vec::new();
    for i in 0..4 {
        let sx = 100.0 + i as f32 * 180.0;
        for r in 0..SHIELD_ROWS {
            for c in 0..SHIELD_COLS {
                blocks.push(ShieldBlock {
                    x: sx + c as f32 * SHIELD_BLOCK,
                    y: FIELD_H - 150.0 + r as f32 * SHIELD_BLOCK,
                    hp: 3,
                });
            }
        }
    }
    blocks
}

pub struct Invaders {
    player_x: f32,
    enemies: Vec<Enemy>,
    /// +1 right, -1 left
    dir: f32,
    bullets: Vec<Bullet>,
    enemy_bullets: Vec<Bullet>,
    shields: Vec<ShieldBlock>,
    cooldown_ms: u64,
    next_level_ms: Option<u64>,
    /// Flips each frame for the two-pose animation
    pose: bool,
    score: u32,
    best: u32,
    lives: u32,
    level: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Invaders {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            player_x: FIELD_W / 2.0 - PLAYER_W / 2.0,
            enemies: formation(),
            dir: 1.0,
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            shields: shields(),
            cooldown_ms: 0,
            next_level_ms: None,
            pose: false,
            score: 0,
            best: 0,
            lives: START_LIVES,
            level: 1,
            paused: false,
            game_over: false,
            rng,
        }
    }

    fn player_y() -> f32 {
        FIELD_H - 60.0
    }

    fn player_bounds(&self) -> geom::Rect {
        geom::Rect::new(self.player_x, Self::player_y(), PLAYER_W, PLAYER_H)
    }

    fn march_speed(&self) -> f32 {
        1.0 + self.level as f32 * 0.3
    }

    fn fire(&mut self) {
        if self.cooldown_ms > 0 {
            return;
        }
        self.bullets.push(Bullet {
            x: self.player_x + PLAYER_W / 2.0 - BULLET_W / 2.0,
            y: Self::player_y(),
            vy: PLAYER_BULLET_SPEED,
        });
        self.cooldown_ms = SHOT_COOLDOWN_MS;
    }

    fn end(&mut self, why: &str) {
        self.game_over = true;
        debug!(score = self.score, level = self.level, why, "invaders game over");
    }

    fn march(&mut self) {
        let dx = self.dir * self.march_speed();
        let mut edge = false;
        for e in &mut self.enemies {
            e.x += dx;
            if e.x <= 0.0 || e.x + ENEMY_W >= FIELD_W {
                edge = true;
            }
        }
        if edge {
            self.dir = -self.dir;
            for e in &mut self.enemies {
                e.y += DROP;
            }
        }
        if self.enemies.iter().any(|e| e.y + ENEMY_H >= INVASION_Y) {
            self.end("invaded");
        }
    }

    /// Damages the first shield block the bullet overlaps
    fn hit_shield(shields: &mut Vec<ShieldBlock>, b: &geom::Rect) -> bool {
        let Some(i) = shields
            .iter()
            .position(|s| b.intersects(&geom::Rect::new(s.x, s.y, SHIELD_BLOCK, SHIELD_BLOCK)))
        else {
            return false;
        };
        shields[i].hp -= 1;
        if shields[i].hp == 0 {
            shields.remove(i);
        }
        true
    }

    fn move_bullets(&mut self) {
        let mut kept = Vec::with_capacity(self.bullets.len());
        for mut b in std::mem::take(&mut self.bullets) {
            b.y += b.vy;
            if b.y + BULLET_H < 0.0 {
                continue;
            }
            let r = b.bounds();
            if let Some(i) = self.enemies.iter().position(|e| e.bounds().intersects(&r)) {
                let enemy = self.enemies.remove(i);
                self.score += enemy.points();
                continue;
            }
            if Self::hit_shield(&mut self.shields, &r) {
                continue;
            }
            kept.push(b);
        }
        self.bullets = kept;

        let player = self.player_bounds();
        let mut kept = Vec::with_capacity(self.enemy_bullets.len());
        for mut b in std::mem::take(&mut self.enemy_bullets) {
            b.y += b.vy;
            if b.y > FIELD_H {
                continue;
            }
            let r = b.bounds();
            if r.intersects(&player) {
                self.lives = self.lives.saturating_sub(1);
                if self.lives == 0 {
                    self.end("shot down");
                }
                continue;
            }
            if Self::hit_shield(&mut self.shields, &r) {
                continue;
            }
            kept.push(b);
        }
        self.enemy_bullets = kept;
    }

    fn enemy_fire(&mut self) {
        if self.enemies.is_empty() || !self.rng.gen_bool(ENEMY_FIRE_CHANCE) {
            return;
        }
        let e = self.enemies[self.rng.gen_range(0..self.enemies.len())];
        self.enemy_bullets.push(Bullet {
            x: e.x + ENEMY_W / 2.0 - BULLET_W / 2.0,
            y: e.y + ENEMY_H,
            vy: ENEMY_BULLET_SPEED,
        });
    }

    fn start_level(&mut self) {
        self.enemies = formation();
        self.shields = shields();
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.dir = 1.0;
    }

    fn step(&mut self, dt_ms: u64) {
        self.cooldown_ms = self.cooldown_ms.saturating_sub(dt_ms);
        self.pose = !self.pose;

        if let Some(left) = self.next_level_ms {
            if left > dt_ms {
                self.next_level_ms = Some(left - dt_ms);
            } else {
                self.next_level_ms = None;
                self.start_level();
            }
            return;
        }

        self.march();
        if self.game_over {
            return;
        }
        self.move_bullets();
        if self.game_over {
            return;
        }
        self.enemy_fire();

        if self.enemies.is_empty() {
            self.level += 1;
            self.next_level_ms = Some(LEVEL_DELAY_MS);
            debug!(level = self.level, score = self.score, "invaders wave cleared");
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Black);
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        for s in &self.shields {
            let color = match s.hp {
                3 => Color::Rgb(0, 200, 0),
                2 => Color::Rgb(200, 200, 0),
                _ => Color::Rgb(255, 140, 0),
            };
            c.rect(&scale, s.x, s.y, SHIELD_BLOCK, SHIELD_BLOCK, '▓', color);
        }

        for e in &self.enemies {
            let (glyph, color) = match (e.kind, self.pose) {
                (1, true) => ('Ѫ', Color::Rgb(255, 80, 255)),
                (1, false) => ('Ж', Color::Rgb(255, 80, 255)),
                (_, true) => ('ᗣ', Color::Rgb(0, 255, 255)),
                (_, false) => ('ᗢ', Color::Rgb(0, 255, 255)),
            };
            let (cx, cy) = e.bounds().center();
            c.dot(&scale, cx, cy, glyph, color);
        }

        for b in &self.bullets {
            c.dot(&scale, b.x, b.y, '│', Color::Yellow);
        }
        for b in &self.enemy_bullets {
            c.dot(&scale, b.x, b.y, '¦', Color::Red);
        }

        let (cx, cy) = self.player_bounds().center();
        c.dot(&scale, cx, cy, '▲', Color::Green);
        let (px0, py) = scale.cell(self.player_x, cy);
        let (px1, _) = scale.cell(self.player_x + PLAYER_W, cy);
        for x in px0..px1 {
            c.put_under(x, py + 1, '▀', Color::Green);
        }
        c
    }
}

impl Game for Invaders {
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
            KeyCode::Left => self.player_x = (self.player_x - PLAYER_STEP).max(0.0),
            KeyCode::Right => self.player_x = (self.player_x + PLAYER_STEP).min(FIELD_W - PLAYER_W),
            KeyCode::Char(' ') | KeyCode::Up => self.fire(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "👾 Space Invaders", Color::Rgb(0, 255, 128));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", "♥".repeat(self.lives as usize)), Color::Red),
            (format!("Level: {}", self.level), Color::Cyan),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("👾", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else if self.next_level_ms.is_some() {
            canvas::won_line(&format!("Wave cleared! Level {} incoming", self.level))
        } else {
            canvas::help_line(&[("←→", "Move"), ("SPACE", "Fire"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Invaders::with_rng(rng);
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
    fn test_formation_layout_and_points() {
        let g = Invaders::with_seed(1);
        assert_eq!(g.enemies.len(), 40);
        assert_eq!((g.enemies[0].x, g.enemies[0].y), (80.0, 50.0));
        assert_eq!(g.enemies[0].points(), 20);
        assert_eq!(g.enemies[39].points(), 10);
        assert_eq!(g.shields.len(), 4 * SHIELD_ROWS * SHIELD_COLS);
    }

    #[test]
    fn test_edge_reverses_and_drops() {
        let mut g = Invaders::with_seed(2);
        g.enemies = vec![Enemy { x: FIELD_W - ENEMY_W - 0.5, y: 100.0, kind: 0 }];
        g.march();
        assert_eq!(g.dir, -1.0);
        assert_eq!(g.enemies[0].y, 100.0 + DROP);
    }

    #[test]
    fn test_bullet_kills_enemy() {
        let mut g = Invaders::with_seed(3);
        g.enemies = vec![Enemy { x: 300.0, y: 200.0, kind: 1 }];
        g.bullets.push(Bullet { x: 310.0, y: 235.0, vy: PLAYER_BULLET_SPEED });
        g.move_bullets();
        assert!(g.enemies.is_empty());
        assert!(g.bullets.is_empty());
        assert_eq!(g.score, 20);
    }

    #[test]
    fn test_shield_absorbs_and_wears() {
        let mut g = Invaders::with_seed(4);
        let s = g.shields[0];
        for _ in 0..3 {
            g.enemy_bullets.push(Bullet { x: s.x, y: s.y - ENEMY_BULLET_SPEED, vy: ENEMY_BULLET_SPEED });
            g.move_bullets();
            assert!(g.enemy_bullets.is_empty());
        }
        assert!(!g.shields.iter().any(|b| b.x == s.x && b.y == s.y));
    }

    #[test]
    fn test_enemy_bullet_costs_lives() {
        let mut g = Invaders::with_seed(5);
        g.shields.clear();
        for lives in (0..START_LIVES).rev() {
            g.enemy_bullets.push(Bullet { x: g.player_x + 10.0, y: Invaders::player_y() - 4.0, vy: ENEMY_BULLET_SPEED });
            g.move_bullets();
            assert_eq!(g.lives, lives);
        }
        assert!(g.is_game_over());
    }

    #[test]
    fn test_reaching_invasion_line_ends() {
        let mut g = Invaders::with_seed(6);
        g.enemies = vec![Enemy { x: 300.0, y: INVASION_Y - ENEMY_H, kind: 0 }];
        g.march();
        assert!(g.is_game_over());
    }

    #[test]
    fn test_wave_clear_advances_once() {
        let mut g = Invaders::with_seed(7);
        g.enemies.clear();
        g.step(16);
        assert_eq!(g.level, 2);
        g.step(500);
        assert_eq!(g.level, 2);
        assert!(g.enemies.is_empty());
        g.step(500);
        assert_eq!(g.enemies.len(), 40);
        assert!(g.march_speed() > 1.3);
    }

    #[test]
    fn test_fire_cooldown() {
        let mut g = Invaders::with_seed(8);
        g.fire();
        g.fire();
        assert_eq!(g.bullets.len(), 1);
        g.step(SHOT_COOLDOWN_MS);
        g.fire();
        assert_eq!(g.bullets.len(), 2);
    }
}
