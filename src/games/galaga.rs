use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::particles::Particles;
use crate::games::Game;

const FIELD_W: f32 = 600.0;
const FIELD_H: f32 = 600.0;
const PLAYER_Y: f32 = FIELD_H - 60.0;
/// Per key press: speed 5 held for four frames
const PLAYER_STEP: f32 = 20.0;
const SHOT_COOLDOWN_MS: u64 = 200;
const BULLET_SPEED: f32 = -10.0;
const ENEMY_BULLET_SPEED: f32 = 5.0;
const ENTRY_SPEED: f32 = 3.0;
const DIVE_CHANCE: f64 = 0.002;
const DIVE_FALL: f32 = 4.0;
const DIVE_SWAY: f32 = 100.0;
const WOBBLE: f32 = 10.0;
const SHOOT_READY: u32 = 150;
const SHOOT_CHANCE: f64 = 0.01;
const HIT_RADIUS: f32 = 20.0;
const COLS: usize = 8;
const MAX_ROWS: u32 = 5;
const WAVE_DELAY_MS: u64 = 2000;
const START_LIVES: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Bee,
    Butterfly,
}

impl Kind {
    fn points(self) -> u32 {
        match self {
            Kind::Bee => 50,
            Kind::Butterfly => 100,
        }
    }

    fn color(self) -> Color {
        match self {
            Kind::Bee => Color::Yellow,
            Kind::Butterfly => Color::Magenta,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Enemy {
    x: f32,
    y: f32,
    slot_x: f32,
    slot_y: f32,
    kind: Kind,
    formed: bool,
    diving: bool,
    dive_phase: f32,
    shoot_timer: u32,
}

#[derive(Clone, Copy, Debug)]
struct Shot {
    x: f32,
    y: f32,
    vy: f32,
}

#[derive(Clone, Copy, Debug)]
struct Star {
    x: f32,
    y: f32,
    speed: f32,
}

pub struct Galaga {
    player_x: f32,
    enemies: Vec<Enemy>,
    shots: Vec<Shot>,
    enemy_shots: Vec<Shot>,
    stars: Vec<Star>,
    particles: Particles,
    cooldown_ms: u64,
    next_wave_ms: Option<u64>,
    /// Drives the formation wobble
    clock_ms: u64,
    score: u32,
    best: u32,
    lives: u32,
    wave: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Galaga {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let stars = (0..100)
            .map(|_| Star {
                x: rng.gen_range(0.0..FIELD_W),
                y: rng.gen_range(0.0..FIELD_H),
                speed: rng.gen_range(1.0..3.0),
            })
            .collect();
        let mut g = Self {
            player_x: FIELD_W / 2.0,
            enemies: Vec::new(),
            shots: Vec::new(),
            enemy_shots: Vec::new(),
            stars,
            particles: Particles::default(),
            cooldown_ms: 0,
            next_wave_ms: None,
            clock_ms: 0,
            score: 0,
            best: 0,
            lives: START_LIVES,
            wave: 1,
            paused: false,
            game_over: false,
            rng,
        };
        g.spawn_wave();
        g
    }

    fn rows(&self) -> u32 {
        (3 + self.wave / 3).min(MAX_ROWS)
    }

    fn spawn_wave(&mut self) {
        self.enemies.clear();
        for row in 0..self.rows() {
            for col in 0..COLS {
                let slot_y = 80.0 + row as f32 * 60.0;
                self.enemies.push(Enemy {
                    x: -100.0 - col as f32 * 70.0,
                    y: slot_y,
                    slot_x: 80.0 + col as f32 * 60.0,
                    slot_y,
                    kind: if row < 2 { Kind::Bee } else { Kind::Butterfly },
                    formed: false,
                    diving: false,
                    dive_phase: 0.0,
                    shoot_timer: self.rng.gen_range(0..200),
                });
            }
        }
    }

    fn fire(&mut self) {
        if self.cooldown_ms > 0 {
            return;
        }
        self.shots.push(Shot { x: self.player_x, y: PLAYER_Y - 20.0, vy: BULLET_SPEED });
        self.cooldown_ms = SHOT_COOLDOWN_MS;
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.particles.burst(&mut self.rng, self.player_x, PLAYER_Y, Color::Cyan, 10, 3.0, 30);
        if self.lives == 0 {
            self.game_over = true;
            debug!(score = self.score, wave = self.wave, "galaga game over");
        }
    }

    fn move_enemy(e: &mut Enemy, rng: &mut StdRng, t: f32) -> Option<Shot> {
        if !e.formed {
            let (dx, dy) = (e.slot_x - e.x, e.slot_y - e.y);
            let d = (dx * dx + dy * dy).sqrt();
            if d > 2.0 {
                e.x += dx / d * ENTRY_SPEED;
                e.y += dy / d * ENTRY_SPEED;
            } else {
                e.formed = true;
            }
            return None;
        }

        if !e.diving && rng.gen_bool(DIVE_CHANCE) {
            e.diving = true;
            e.dive_phase = 0.0;
        }
        if e.diving {
            e.dive_phase += 0.05;
            e.x = e.slot_x + e.dive_phase.sin() * DIVE_SWAY;
            e.y += DIVE_FALL;
            if e.y > FIELD_H {
                // Re-enter from above and fly back to the slot
                e.x = e.slot_x;
                e.y = -50.0;
                e.diving = false;
                e.formed = false;
            }
        } else {
            e.x = e.slot_x + (t + e.slot_x).sin() * WOBBLE;
        }

        e.shoot_timer += 1;
        if e.shoot_timer > SHOOT_READY && rng.gen_bool(SHOOT_CHANCE) {
            e.shoot_timer = 0;
            return Some(Shot { x: e.x, y: e.y + 20.0, vy: ENEMY_BULLET_SPEED });
        }
        None
    }

    fn step(&mut self, dt_ms: u64) {
        self.clock_ms += dt_ms;
        self.cooldown_ms = self.cooldown_ms.saturating_sub(dt_ms);
        for s in &mut self.stars {
            s.y += s.speed;
            if s.y > FIELD_H {
                s.y = 0.0;
                s.x = self.rng.gen_range(0.0..FIELD_W);
            }
        }
        self.particles.update(0.0);

        if let Some(left) = self.next_wave_ms {
            if left > dt_ms {
                self.next_wave_ms = Some(left - dt_ms);
            } else {
                self.next_wave_ms = None;
                self.spawn_wave();
            }
            return;
        }

        for s in &mut self.shots {
            s.y += s.vy;
        }
        self.shots.retain(|s| s.y >= 0.0);

        let mut hits = 0;
        for s in &mut self.enemy_shots {
            s.y += s.vy;
            if (s.x - self.player_x).hypot(s.y - PLAYER_Y) < HIT_RADIUS {
                s.y = f32::MAX;
                hits += 1;
            }
        }
        self.enemy_shots.retain(|s| s.y <= FIELD_H);

        let t = self.clock_ms as f32 * 0.001;
        for e in &mut self.enemies {
            if let Some(shot) = Self::move_enemy(e, &mut self.rng, t) {
                self.enemy_shots.push(shot);
            }
        }

        // Divers that ram the ship are destroyed with it
        let px = self.player_x;
        let before = self.enemies.len();
        self.enemies.retain(|e| !(e.diving && (e.x - px).abs() < HIT_RADIUS && (e.y - PLAYER_Y).abs() < HIT_RADIUS));
        hits += before - self.enemies.len();
        for _ in 0..hits {
            if !self.game_over {
                self.lose_life();
            }
        }
        if self.game_over {
            return;
        }

        let mut i = 0;
        while i < self.shots.len() {
            let s = self.shots[i];
            let hit = self.enemies.iter().position(|e| (s.x - e.x).abs() < HIT_RADIUS && (s.y - e.y).abs() < HIT_RADIUS);
            match hit {
                Some(j) => {
                    let e = self.enemies.remove(j);
                    self.shots.remove(i);
                    self.score += e.kind.points();
                    self.particles.burst(&mut self.rng, e.x, e.y, e.kind.color(), 10, 3.0, 30);
                }
                None => i += 1,
            }
        }

        if self.enemies.is_empty() {
            self.wave += 1;
            self.next_wave_ms = Some(WAVE_DELAY_MS);
            debug!(wave = self.wave, score = self.score, "galaga wave cleared");
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Black);
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        for s in &self.stars {
            let glyph = if s.speed > 2.0 { '·' } else { '.' };
            c.dot(&scale, s.x, s.y, glyph, Color::Gray);
        }
        for e in &self.enemies {
            let glyph = match e.kind {
                Kind::Bee => 'ж',
                Kind::Butterfly => '◆',
            };
            c.dot(&scale, e.x, e.y, glyph, e.kind.color());
        }
        for s in &self.shots {
            c.dot(&scale, s.x, s.y, '│', Color::White);
        }
        for s in &self.enemy_shots {
            c.dot(&scale, s.x, s.y, '•', Color::Red);
        }
        for p in &self.particles.list {
            c.dot(&scale, p.x, p.y, '*', p.color);
        }
        c.dot(&scale, self.player_x, PLAYER_Y, '▲', Color::Cyan);
        c
    }
}

impl Game for Galaga {
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
            KeyCode::Left => self.player_x = (self.player_x - PLAYER_STEP).max(20.0),
            KeyCode::Right => self.player_x = (self.player_x + PLAYER_STEP).min(FIELD_W - 20.0),
            KeyCode::Char(' ') | KeyCode::Up => self.fire(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🚀 Galaga", Color::Rgb(0, 200, 255));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", self.lives), Color::Red),
            (format!("Wave: {}", self.wave), Color::Cyan),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🚀", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else if self.next_wave_ms.is_some() {
            canvas::won_line(&format!("Wave {} incoming!", self.wave))
        } else {
            canvas::help_line(&[("←→", "Move"), ("SPACE", "Fire"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Galaga::with_rng(rng);
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

    fn formed(kind: Kind, x: f32, y: f32) -> Enemy {
        Enemy { x, y, slot_x: x, slot_y: y, kind, formed: true, diving: false, dive_phase: 0.0, shoot_timer: 0 }
    }

    #[test]
    fn test_wave_size_grows_and_caps() {
        let mut g = Galaga::with_seed(1);
        assert_eq!(g.enemies.len(), 24);
        g.wave = 3;
        g.spawn_wave();
        assert_eq!(g.enemies.len(), 32);
        g.wave = 12;
        g.spawn_wave();
        assert_eq!(g.enemies.len(), 40);
    }

    #[test]
    fn test_entry_flies_to_slot() {
        let mut g = Galaga::with_seed(2);
        let mut e = g.enemies[0];
        for _ in 0..100 {
            Galaga::move_enemy(&mut e, &mut g.rng, 0.0);
            if e.formed {
                break;
            }
        }
        assert!(e.formed);
        assert!((e.x - e.slot_x).abs() <= 2.0);
    }

    #[test]
    fn test_shot_scores_by_kind() {
        let mut g = Galaga::with_seed(3);
        g.enemies = vec![formed(Kind::Butterfly, 300.0, 200.0)];
        g.shots.push(Shot { x: 300.0, y: 215.0, vy: BULLET_SPEED });
        g.step(16);
        assert_eq!(g.score, 100);
        assert!(g.enemies.is_empty());
        assert_eq!(g.wave, 2);
    }

    #[test]
    fn test_next_wave_after_delay() {
        let mut g = Galaga::with_seed(4);
        g.enemies.clear();
        g.step(16);
        assert_eq!(g.wave, 2);
        g.step(1000);
        assert_eq!(g.wave, 2);
        g.step(1000);
        assert_eq!(g.enemies.len(), 24);
    }

    #[test]
    fn test_enemy_shot_costs_life() {
        let mut g = Galaga::with_seed(5);
        g.enemies = vec![formed(Kind::Bee, 100.0, 100.0)];
        g.enemy_shots.push(Shot { x: g.player_x, y: PLAYER_Y - 5.0, vy: ENEMY_BULLET_SPEED });
        g.step(16);
        assert_eq!(g.lives, START_LIVES - 1);
        assert!(g.enemy_shots.is_empty());
    }

    #[test]
    fn test_diver_returns_to_slot() {
        let mut g = Galaga::with_seed(6);
        let mut e = formed(Kind::Bee, 100.0, FIELD_H - 2.0);
        e.diving = true;
        Galaga::move_enemy(&mut e, &mut g.rng, 0.0);
        assert!(!e.diving);
        assert!(!e.formed);
        assert_eq!(e.y, -50.0);
    }

    #[test]
    fn test_last_life_ends() {
        let mut g = Galaga::with_seed(7);
        g.lives = 1;
        g.enemies = vec![formed(Kind::Bee, 100.0, 100.0)];
        g.enemy_shots.push(Shot { x: g.player_x, y: PLAYER_Y, vy: 0.0 });
        g.step(16);
        assert!(g.is_game_over());
    }
}
