use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom::{self, dist};
use crate::games::Game;

mod levels;

use levels::LEVELS;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 400.0;
const GRAVITY: f32 = 0.4;
const JUMP: f32 = -13.0;
const RUN_SPEED: f32 = 6.0;
/// Frames of running per key press
const RUN_FRAMES: u32 = 4;
const PLAYER_SIZE: f32 = 30.0;
const START: (f32, f32) = (50.0, 250.0);
/// Depth of a platform's top that catches a falling player
const LANDING_DEPTH: f32 = 20.0;
const PICKUP_REACH: f32 = 20.0;
const ENEMY_SIZE: f32 = 25.0;
const SPIKE_Y: f32 = 365.0;
const SPIKE_H: f32 = 15.0;
const GOAL_W: f32 = 40.0;
const GOAL_H: f32 = 50.0;
const STAR_FRAMES: u32 = 300;
const HIT_FRAMES: u32 = 180;
const START_LIVES: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Motion {
    Fixed,
    Horizontal { v: f32, min: f32, max: f32 },
    Vertical { v: f32, min: f32, max: f32 },
}

#[derive(Clone, Copy, Debug)]
struct PlatformDef {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    motion: Motion,
}

impl PlatformDef {
    /// Moves along its track, bouncing at either end; returns the offset.
    fn advance(&mut self) -> (f32, f32) {
        match &mut self.motion {
            Motion::Fixed => (0.0, 0.0),
            Motion::Horizontal { v, min, max } => {
                let dx = *v;
                self.x += dx;
                if self.x <= *min || self.x >= *max {
                    *v = -*v;
                }
                (dx, 0.0)
            }
            Motion::Vertical { v, min, max } => {
                let dy = *v;
                self.y += dy;
                if self.y <= *min || self.y >= *max {
                    *v = -*v;
                }
                (0.0, dy)
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct EnemyDef {
    x: f32,
    y: f32,
    vx: f32,
    min: f32,
    max: f32,
}

impl EnemyDef {
    fn bounds(&self) -> geom::Rect {
        geom::Rect::new(self.x, self.y, ENEMY_SIZE, ENEMY_SIZE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Power {
    /// Recharges the air jump
    DoubleJump,
    Invincible,
}

struct Level {
    name: &'static str,
    sky: (Color, Color),
    ground: Color,
    grass: Color,
    platforms: &'static [PlatformDef],
    coins: &'static [(f32, f32)],
    enemies: &'static [EnemyDef],
    /// (x, width) along the floor
    spikes: &'static [(f32, f32)],
    powerups: &'static [(f32, f32, Power)],
    goal: (f32, f32),
}

pub struct Platformer {
    level: usize,
    platforms: Vec<PlatformDef>,
    enemies: Vec<EnemyDef>,
    coins: Vec<bool>,
    powerups: Vec<bool>,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    airborne: bool,
    air_jump_used: bool,
    run_dir: f32,
    run_frames: u32,
    invincible: u32,
    lives: u32,
    collected: u32,
    best: u32,
    clock: u64,
    won: bool,
    paused: bool,
    game_over: bool,
}

impl Platformer {
    pub fn new() -> Self {
        let mut p = Self {
            level: 0,
            platforms: Vec::new(),
            enemies: Vec::new(),
            coins: Vec::new(),
            powerups: Vec::new(),
            x: START.0,
            y: START.1,
            vx: 0.0,
            vy: 0.0,
            airborne: true,
            air_jump_used: false,
            run_dir: 0.0,
            run_frames: 0,
            invincible: 0,
            lives: START_LIVES,
            collected: 0,
            best: 0,
            clock: 0,
            won: false,
            paused: false,
            game_over: false,
        };
        p.load(0);
        p
    }

    fn load(&mut self, level: usize) {
        let def = &LEVELS[level];
        self.level = level;
        self.platforms = def.platforms.to_vec();
        self.enemies = def.enemies.to_vec();
        self.coins = vec![false; def.coins.len()];
        self.powerups = vec![false; def.powerups.len()];
        self.respawn();
        self.invincible = 0;
        debug!(level = level + 1, name = def.name, "platformer entered dimension");
    }

    fn respawn(&mut self) {
        (self.x, self.y) = START;
        self.vx = 0.0;
        self.vy = 0.0;
        self.airborne = true;
        self.air_jump_used = false;
        self.run_frames = 0;
    }

    fn player(&self) -> geom::Rect {
        geom::Rect::new(self.x, self.y, PLAYER_SIZE, PLAYER_SIZE)
    }

    fn jump(&mut self) {
        if !self.airborne {
            self.vy = JUMP;
            self.airborne = true;
        } else if !self.air_jump_used {
            self.vy = JUMP;
            self.air_jump_used = true;
        }
    }

    fn run(&mut self, dir: f32) {
        self.run_dir = dir;
        self.run_frames = RUN_FRAMES;
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.game_over = true;
            debug!(level = self.level + 1, coins = self.collected, "platformer out of lives");
            return;
        }
        self.respawn();
        self.invincible = HIT_FRAMES;
    }

    fn next_level(&mut self) {
        if self.level + 1 == LEVELS.len() {
            self.won = true;
            debug!(coins = self.collected, "platformer cleared every dimension");
            return;
        }
        self.load(self.level + 1);
    }

    fn step(&mut self) {
        self.clock += 1;
        if self.run_frames > 0 {
            self.run_frames -= 1;
            self.vx = self.run_dir * RUN_SPEED;
        } else {
            self.vx = 0.0;
        }
        self.vy += GRAVITY;
        self.x = (self.x + self.vx).clamp(0.0, FIELD_W - PLAYER_SIZE);
        self.y += self.vy;

        if self.y > FIELD_H {
            self.lose_life();
            return;
        }

        self.airborne = true;
        let mut riding = None;
        for (i, p) in self.platforms.iter().enumerate() {
            let bottom = self.y + PLAYER_SIZE;
            let over = self.x + PLAYER_SIZE > p.x && self.x < p.x + p.w;
            if over && bottom > p.y && bottom < p.y + LANDING_DEPTH && self.vy > 0.0 {
                self.y = p.y - PLAYER_SIZE;
                self.vy = 0.0;
                self.airborne = false;
                self.air_jump_used = false;
                riding = Some(i);
            }
        }
        for (i, p) in self.platforms.iter_mut().enumerate() {
            let (dx, dy) = p.advance();
            if riding == Some(i) {
                self.x = (self.x + dx).clamp(0.0, FIELD_W - PLAYER_SIZE);
                self.y += dy;
            }
        }

        let def = &LEVELS[self.level];
        let (cx, cy) = self.player().center();
        for (taken, &(x, y)) in self.coins.iter_mut().zip(def.coins) {
            if !*taken && dist(cx, cy, x, y) < PICKUP_REACH {
                *taken = true;
                self.collected += 1;
            }
        }
        for (taken, &(x, y, power)) in self.powerups.iter_mut().zip(def.powerups) {
            if *taken || (cx - x).abs() >= PICKUP_REACH || (cy - y).abs() >= PICKUP_REACH {
                continue;
            }
            *taken = true;
            match power {
                Power::DoubleJump => self.air_jump_used = false,
                Power::Invincible => self.invincible = STAR_FRAMES,
            }
        }

        self.invincible = self.invincible.saturating_sub(1);

        let player = self.player();
        let mut hurt = false;
        for e in &mut self.enemies {
            e.x += e.vx;
            if e.x <= e.min || e.x >= e.max {
                e.vx = -e.vx;
            }
            hurt |= e.bounds().intersects(&player);
        }
        let bottom = self.y + PLAYER_SIZE;
        hurt |= def.spikes.iter().any(|&(x, w)| {
            self.x + PLAYER_SIZE > x && self.x < x + w && bottom > SPIKE_Y && bottom < SPIKE_Y + SPIKE_H
        });
        if hurt && self.invincible == 0 {
            self.lose_life();
            return;
        }

        let goal = geom::Rect::new(def.goal.0, def.goal.1, GOAL_W, GOAL_H);
        if goal.intersects(&player) {
            self.next_level();
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let def = &LEVELS[self.level];
        let mut c = Canvas::new(width as u16, height as u16, blend(def.sky.0, def.sky.1));
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        for p in &self.platforms {
            c.rect(&scale, p.x, p.y, p.w, p.h, '█', def.ground);
            c.rect(&scale, p.x, p.y, p.w, 5.0, '▀', def.grass);
            if p.motion != Motion::Fixed {
                c.rect(&scale, p.x, p.y + p.h - 5.0, p.w, 5.0, '▄', Color::Rgb(255, 215, 0));
            }
        }
        for &(x, w) in def.spikes {
            c.rect(&scale, x, SPIKE_Y, w, SPIKE_H, '▲', Color::Rgb(220, 20, 60));
        }
        for (&taken, &(x, y)) in self.coins.iter().zip(def.coins) {
            if !taken {
                c.dot(&scale, x, y, '●', Color::Rgb(255, 215, 0));
            }
        }
        for (&taken, &(x, y, power)) in self.powerups.iter().zip(def.powerups) {
            if !taken {
                let (glyph, color) = match power {
                    Power::DoubleJump => ('⇈', Color::Rgb(0, 191, 255)),
                    Power::Invincible => ('★', Color::Rgb(255, 215, 0)),
                };
                c.dot(&scale, x, y, glyph, color);
            }
        }
        for e in &self.enemies {
            c.rect(&scale, e.x, e.y, ENEMY_SIZE, ENEMY_SIZE, '█', Color::Rgb(139, 0, 139));
        }
        c.rect(&scale, def.goal.0, def.goal.1, GOAL_W, GOAL_H, '▓', Color::Rgb(255, 0, 0));
        c.dot(&scale, def.goal.0 + GOAL_W / 2.0, def.goal.1, '⚑', Color::White);

        if self.invincible == 0 || (self.clock / 6) % 2 == 0 {
            c.rect(&scale, self.x, self.y, PLAYER_SIZE, PLAYER_SIZE, '█', Color::Rgb(65, 105, 225));
            if self.airborne && !self.air_jump_used {
                c.dot(&scale, self.x + PLAYER_SIZE / 2.0, self.y - 5.0, '↑', Color::Rgb(0, 191, 255));
            }
        }

        let title = Style::default().fg(Color::Black).bg(blend(def.sky.0, def.sky.1)).add_modifier(Modifier::BOLD);
        c.text_centered(0, def.name, title);
        c
    }
}

fn blend(a: Color, b: Color) -> Color {
    match (a, b) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => Color::Rgb(
            ((r1 as u16 + r2 as u16) / 2) as u8,
            ((g1 as u16 + g2 as u16) / 2) as u8,
            ((b1 as u16 + b2 as u16) / 2) as u8,
        ),
        _ => a,
    }
}

impl Game for Platformer {
    fn update(&mut self, _dt_ms: u64) {
        if self.paused || self.game_over || self.won {
            return;
        }
        self.step();
    }

    fn handle_input(&mut self, key: KeyEvent) {
        let over = self.game_over || self.won;
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('p') | KeyCode::Char('P') => {
                if !over {
                    self.paused = !self.paused;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') if over => self.reset(),
            _ if self.paused || over => {}
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => self.run(-1.0),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => self.run(1.0),
            KeyCode::Up | KeyCode::Char(' ') | KeyCode::Char('w') | KeyCode::Char('W') => self.jump(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🌟 Dimensions", Color::Rgb(200, 120, 255));

        let mut parts = vec![
            (format!("Dimension: {}/{}", self.level + 1, LEVELS.len()), Color::Cyan),
            (format!("Coins: {}", self.collected), Color::Rgb(255, 215, 0)),
            (format!("Lives: {}", "♥".repeat(self.lives as usize)), Color::Red),
            (format!("🏆 Best: {}", self.best.max(self.collected)), Color::Rgb(255, 215, 0)),
        ];
        if self.invincible > 0 {
            parts.push((format!("★ {}s", self.invincible.div_ceil(60)), Color::Rgb(255, 215, 0)));
        }
        canvas::render_lines(frame, status, canvas::status_line("🌟", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.won {
            canvas::won_line(&format!("All {} dimensions crossed! Coins: {}", LEVELS.len(), self.collected))
        } else if self.game_over {
            canvas::game_over_line(&format!("Lost in dimension {}. Coins: {}", self.level + 1, self.collected))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("←→", "Run"), ("↑/SPACE", "Jump, again to double"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.collected);
        *self = Platformer::new();
        self.best = best;
    }

    fn get_score(&self) -> u32 {
        self.collected
    }

    fn is_game_over(&self) -> bool {
        self.game_over || self.won
    }

    fn set_best(&mut self, best: u32) {
        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(level: usize, x: f32, y: f32) -> Platformer {
        let mut p = Platformer::new();
        p.load(level);
        p.x = x;
        p.y = y;
        p
    }

    #[test]
    fn test_twenty_dimensions_fit_the_field() {
        assert_eq!(LEVELS.len(), 20);
        for level in &LEVELS {
            assert!(!level.platforms.is_empty());
            assert!(level.goal.0 <= FIELD_W && level.goal.1 + GOAL_H <= FIELD_H);
            assert!(level.platforms.iter().any(|p| p.x <= START.0 && START.0 < p.x + p.w));
        }
    }

    #[test]
    fn test_spawn_falls_onto_first_platform() {
        let mut p = Platformer::new();
        for _ in 0..60 {
            p.step();
        }
        assert!(!p.airborne);
        assert_eq!(p.y, 350.0 - PLAYER_SIZE);
    }

    #[test]
    fn test_double_jump_only_once() {
        let mut p = Platformer::new();
        for _ in 0..60 {
            p.step();
        }
        p.jump();
        p.step();
        p.jump();
        assert!(p.air_jump_used);
        assert_eq!(p.vy, JUMP);
        p.step();
        let vy = p.vy;
        p.jump();
        assert_eq!(p.vy, vy);
    }

    #[test]
    fn test_rising_player_passes_through_platform() {
        let mut p = at(0, 400.0, 300.0);
        p.vy = -8.0;
        p.step();
        assert!(p.airborne);
        assert!(p.y < 300.0);
    }

    #[test]
    fn test_press_runs_for_a_few_frames() {
        let mut p = Platformer::new();
        for _ in 0..60 {
            p.step();
        }
        let x = p.x;
        p.run(1.0);
        for _ in 0..10 {
            p.step();
        }
        assert_eq!(p.x, x + RUN_SPEED * RUN_FRAMES as f32);
    }

    #[test]
    fn test_falling_off_costs_a_life() {
        let mut p = at(0, 320.0, FIELD_H - 1.0);
        p.vy = 5.0;
        p.step();
        assert_eq!(p.lives, START_LIVES - 1);
        assert_eq!((p.x, p.y), START);
        assert_eq!(p.invincible, HIT_FRAMES);
    }

    #[test]
    fn test_enemy_contact_hurts_unless_invincible() {
        let mut p = at(5, 270.0, 250.0);
        p.invincible = 50;
        p.step();
        assert_eq!(p.lives, START_LIVES);

        let mut p = at(5, 270.0, 250.0);
        p.step();
        assert_eq!(p.lives, START_LIVES - 1);
    }

    #[test]
    fn test_spikes_hurt() {
        let mut p = at(4, 420.0, SPIKE_Y - PLAYER_SIZE + 5.0);
        p.step();
        assert_eq!(p.lives, START_LIVES - 1);
    }

    #[test]
    fn test_coins_and_star() {
        let mut p = at(2, 500.0 - PLAYER_SIZE / 2.0, 200.0 - PLAYER_SIZE / 2.0);
        p.vy = -GRAVITY;
        p.step();
        assert!(p.powerups[0]);
        assert_eq!(p.invincible, STAR_FRAMES - 1);

        let mut p = at(0, 420.0 - PLAYER_SIZE / 2.0, 230.0 - PLAYER_SIZE / 2.0);
        p.vy = -GRAVITY;
        p.step();
        assert_eq!(p.collected, 1);
        assert!(p.coins[0]);
    }

    #[test]
    fn test_moving_platform_carries_rider() {
        let mut p = at(2, 260.0, 250.0);
        p.step();
        assert!(!p.airborne);
        assert_eq!(p.platforms[1].x, 252.0);
        assert_eq!(p.x, 262.0);
    }

    #[test]
    fn test_platform_turns_at_range_end() {
        let mut p = at(2, 50.0, 250.0);
        p.platforms[1].x = 359.0;
        p.step();
        assert!(matches!(p.platforms[1].motion, Motion::Horizontal { v, .. } if v < 0.0));
    }

    #[test]
    fn test_goal_loads_next_dimension_keeping_coins() {
        let mut p = at(0, 750.0, 260.0);
        p.collected = 2;
        p.step();
        assert_eq!(p.level, 1);
        assert_eq!(p.collected, 2);
        assert_eq!((p.x, p.y), START);
    }

    #[test]
    fn test_last_goal_wins() {
        let mut p = at(19, 755.0, 135.0);
        p.step();
        assert!(p.won);
        assert!(p.is_game_over());
    }

    #[test]
    fn test_out_of_lives() {
        let mut p = Platformer::new();
        p.lives = 1;
        p.lose_life();
        assert!(p.is_game_over());
    }
}
