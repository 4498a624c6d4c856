use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom::{self, dist};
use crate::games::particles::Particles;
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 400.0;
const GROUND_Y: f32 = FIELD_H - 60.0;
const PLAYER_X: f32 = 100.0;
const PLAYER_SIZE: f32 = 40.0;
const GRAVITY: f32 = 0.6;
const JUMP: f32 = -12.0;
const MAX_JUMPS: u32 = 2;
const START_SPEED: f32 = 5.0;
const SPEED_STEP: f32 = 0.5;
const SPEED_EVERY: u32 = 500;
const OBSTACLE_GAP: u32 = 100;
const OBSTACLE_CHANCE: f64 = 0.02;
const COIN_GAP: u32 = 80;
const COIN_CHANCE: f64 = 0.03;
const COIN_RADIUS: f32 = 15.0;
const COIN_BONUS: u32 = 50;
const COIN_AMMO: u32 = 5;
const MAX_AMMO: u32 = 20;
const BULLET_W: f32 = 15.0;
const BULLET_H: f32 = 6.0;
const BULLET_SPEED: f32 = 12.0;
const SHOT_COOLDOWN: u32 = 15;
const WRECK_BONUS: u32 = 20;
const WRECK_AMMO: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ObstacleKind {
    Spike,
    Box,
    Strong,
}

impl ObstacleKind {
    fn hp(self) -> u32 {
        match self {
            ObstacleKind::Spike => 1,
            ObstacleKind::Box => 2,
            ObstacleKind::Strong => 3,
        }
    }

    fn width(self) -> f32 {
        match self {
            ObstacleKind::Spike => 30.0,
            _ => 40.0,
        }
    }

    fn color(self) -> Color {
        match self {
            ObstacleKind::Spike => Color::Rgb(255, 107, 107),
            ObstacleKind::Box => Color::Rgb(255, 159, 67),
            ObstacleKind::Strong => Color::Rgb(157, 78, 221),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Obstacle {
    x: f32,
    h: f32,
    kind: ObstacleKind,
    hp: u32,
}

impl Obstacle {
    fn new(x: f32, h: f32, kind: ObstacleKind) -> Self {
        Self { x, h, kind, hp: kind.hp() }
    }

    fn bounds(&self) -> geom::Rect {
        geom::Rect::new(self.x, GROUND_Y - self.h, self.kind.width(), self.h)
    }
}

pub struct Runner {
    y: f32,
    vy: f32,
    jumps_left: u32,
    obstacles: Vec<Obstacle>,
    coins: Vec<(f32, f32)>,
    bullets: Vec<(f32, f32)>,
    particles: Particles,
    /// One per frame plus bonuses; the score is a tenth of this
    distance: u32,
    frames: u32,
    speed: f32,
    obstacle_timer: u32,
    coin_timer: u32,
    ammo: u32,
    cooldown: u32,
    best: u32,
    started: bool,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Runner {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            y: GROUND_Y - PLAYER_SIZE,
            vy: 0.0,
            jumps_left: MAX_JUMPS,
            obstacles: Vec::new(),
            coins: Vec::new(),
            bullets: Vec::new(),
            particles: Particles::default(),
            distance: 0,
            frames: 0,
            speed: START_SPEED,
            obstacle_timer: 0,
            coin_timer: 0,
            ammo: MAX_AMMO,
            cooldown: 0,
            best: 0,
            started: false,
            paused: false,
            game_over: false,
            rng,
        }
    }

    fn score(&self) -> u32 {
        self.distance / 10
    }

    fn player(&self) -> geom::Rect {
        geom::Rect::new(PLAYER_X, self.y, PLAYER_SIZE, PLAYER_SIZE)
    }

    fn jump(&mut self) {
        self.started = true;
        if self.jumps_left == 0 {
            return;
        }
        self.vy = JUMP;
        self.jumps_left -= 1;
        let (x, y) = (PLAYER_X + PLAYER_SIZE / 2.0, self.y + PLAYER_SIZE);
        self.particles.burst(&mut self.rng, x, y, Color::Rgb(78, 205, 196), 8, 2.0, 30);
    }

    fn shoot(&mut self) {
        if !self.started || self.cooldown > 0 || self.ammo == 0 {
            return;
        }
        let y = self.y + PLAYER_SIZE / 2.0 - BULLET_H / 2.0;
        self.bullets.push((PLAYER_X + PLAYER_SIZE, y));
        self.ammo -= 1;
        self.cooldown = SHOT_COOLDOWN;
    }

    fn spawn_obstacle(&mut self) {
        let h = self.rng.gen_range(30.0..70.0);
        let roll: f64 = self.rng.gen();
        let kind = if roll > 0.7 {
            ObstacleKind::Spike
        } else if roll > 0.4 {
            ObstacleKind::Box
        } else {
            ObstacleKind::Strong
        };
        self.obstacles.push(Obstacle::new(FIELD_W, h, kind));
    }

    fn step(&mut self) {
        self.distance += 1;
        self.frames += 1;
        self.cooldown = self.cooldown.saturating_sub(1);
        if self.frames % SPEED_EVERY == 0 {
            self.speed += SPEED_STEP;
            debug!(speed = self.speed, "runner sped up");
        }

        self.vy += GRAVITY;
        self.y += self.vy;
        if self.y >= GROUND_Y - PLAYER_SIZE {
            self.y = GROUND_Y - PLAYER_SIZE;
            self.vy = 0.0;
            self.jumps_left = MAX_JUMPS;
        }

        for b in &mut self.bullets {
            b.0 += BULLET_SPEED;
        }
        self.bullets.retain(|b| b.0 < FIELD_W + BULLET_W);

        self.obstacle_timer += 1;
        if self.obstacle_timer > OBSTACLE_GAP && self.rng.gen_bool(OBSTACLE_CHANCE) {
            self.spawn_obstacle();
            self.obstacle_timer = 0;
        }
        self.coin_timer += 1;
        if self.coin_timer > COIN_GAP && self.rng.gen_bool(COIN_CHANCE) {
            let y = GROUND_Y - 100.0 - self.rng.gen_range(0.0..100.0);
            self.coins.push((FIELD_W, y));
            self.coin_timer = 0;
        }

        let player = self.player();
        let mut i = 0;
        while i < self.obstacles.len() {
            self.obstacles[i].x -= self.speed;
            let bounds = self.obstacles[i].bounds();
            let hit = self
                .bullets
                .iter()
                .position(|&(bx, by)| geom::Rect::new(bx, by, BULLET_W, BULLET_H).intersects(&bounds));
            if let Some(b) = hit {
                self.bullets.remove(b);
                let (cx, cy) = bounds.center();
                self.particles.burst(&mut self.rng, cx, cy, Color::Rgb(255, 107, 107), 15, 2.0, 30);
                let o = &mut self.obstacles[i];
                o.hp -= 1;
                if o.hp == 0 {
                    self.distance += WRECK_BONUS;
                    self.ammo = (self.ammo + WRECK_AMMO).min(MAX_AMMO);
                    self.particles.burst(&mut self.rng, cx, cy, Color::Rgb(255, 215, 0), 20, 2.0, 30);
                    self.obstacles.remove(i);
                    continue;
                }
            }
            if bounds.intersects(&player) {
                self.game_over = true;
                debug!(score = self.score(), "runner crashed");
                return;
            }
            i += 1;
        }
        self.obstacles.retain(|o| o.x > -o.kind.width());

        let (px, py) = player.center();
        let mut collected = 0;
        self.coins.retain_mut(|c| {
            c.0 -= self.speed;
            if dist(px, py, c.0, c.1) < PLAYER_SIZE / 2.0 + COIN_RADIUS {
                collected += 1;
                return false;
            }
            c.0 > -COIN_RADIUS * 2.0
        });
        for _ in 0..collected {
            self.distance += COIN_BONUS;
            self.ammo = (self.ammo + COIN_AMMO).min(MAX_AMMO);
        }

        self.particles.update(0.2);
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(26, 26, 46));
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        let drift = self.distance as f32 * 0.2;
        for i in 0..50 {
            let x = (i as f32 * 137.0 + drift) % FIELD_W;
            let y = (i as f32 * 211.0) % (FIELD_H - 100.0);
            c.dot(&scale, x, y, '·', Color::Rgb(200, 200, 200));
        }
        c.rect(&scale, 0.0, GROUND_Y, FIELD_W, FIELD_H - GROUND_Y, '▓', Color::Rgb(102, 126, 234));

        for o in &self.obstacles {
            let b = o.bounds();
            let glyph = if o.kind == ObstacleKind::Spike { '▲' } else { '█' };
            c.rect(&scale, b.x, b.y, b.w, b.h, glyph, o.kind.color());
            if o.hp < o.kind.hp() {
                let (tx, ty) = scale.cell(b.x, b.y - 8.0);
                c.text(tx, ty, &"♥".repeat(o.hp as usize), Style::default().fg(Color::Rgb(78, 205, 196)));
            }
        }
        for &(x, y) in &self.coins {
            c.dot(&scale, x, y, '●', Color::Rgb(255, 215, 0));
        }
        for &(x, y) in &self.bullets {
            c.rect(&scale, x, y, BULLET_W, BULLET_H, '━', Color::Rgb(255, 237, 78));
        }
        for p in &self.particles.list {
            c.dot(&scale, p.x, p.y, '•', p.color);
        }
        c.rect(&scale, PLAYER_X, self.y, PLAYER_SIZE, PLAYER_SIZE, '█', Color::Rgb(78, 205, 196));
        c
    }
}

impl Game for Runner {
    fn update(&mut self, _dt_ms: u64) {
        if !self.started || self.paused || self.game_over {
            return;
        }
        self.step();
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('p') | KeyCode::Char('P') => {
                if self.started && !self.game_over {
                    self.paused = !self.paused;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.game_over => self.reset(),
            _ if self.paused || self.game_over => {}
            KeyCode::Char(' ') | KeyCode::Up => self.jump(),
            KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Right => self.shoot(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🏃 Runner", Color::Rgb(200, 120, 255));

        let ammo_color = if self.ammo > 5 { Color::Rgb(78, 205, 196) } else { Color::Rgb(255, 107, 107) };
        let parts = vec![
            (format!("Distance: {}", self.score()), Color::Yellow),
            (format!("Ammo: {}/{}", self.ammo, MAX_AMMO), ammo_color),
            (format!("Speed: {:.1}", self.speed), Color::Cyan),
            (format!("🏆 Best: {}", self.best.max(self.score())), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🏃", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("Crashed! Distance: {}", self.score()))
        } else if self.paused {
            canvas::paused_line()
        } else if !self.started {
            canvas::help_line(&[("SPACE/↑", "Jump to start"), ("S", "Shoot")])
        } else {
            canvas::help_line(&[("SPACE/↑", "Jump (twice)"), ("S", "Shoot"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score());
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Runner::with_rng(rng);
        self.best = best;
    }

    fn get_score(&self) -> u32 {
        self.score()
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

    fn running() -> Runner {
        let mut r = Runner::with_seed(1);
        r.started = true;
        r
    }

    #[test]
    fn test_waits_for_first_jump() {
        let mut r = Runner::with_seed(2);
        r.update(16);
        assert_eq!(r.distance, 0);
        r.handle_input(KeyEvent::from(KeyCode::Char(' ')));
        assert!(r.started);
        assert_eq!(r.vy, JUMP);
        r.update(16);
        assert_eq!(r.distance, 1);
    }

    #[test]
    fn test_double_jump_then_land() {
        let mut r = running();
        r.jump();
        r.jump();
        assert_eq!(r.jumps_left, 0);
        r.step();
        let vy = r.vy;
        r.jump();
        assert_eq!(r.vy, vy);
        for _ in 0..120 {
            r.obstacles.clear();
            r.step();
        }
        assert_eq!(r.jumps_left, MAX_JUMPS);
        assert_eq!(r.y, GROUND_Y - PLAYER_SIZE);
    }

    #[test]
    fn test_shooting_costs_ammo_and_cools_down() {
        let mut r = running();
        r.shoot();
        r.shoot();
        assert_eq!(r.ammo, MAX_AMMO - 1);
        assert_eq!(r.bullets.len(), 1);
        for _ in 0..SHOT_COOLDOWN {
            r.step();
        }
        r.shoot();
        assert_eq!(r.ammo, MAX_AMMO - 2);
    }

    #[test]
    fn test_strong_obstacle_takes_three_hits() {
        let mut r = running();
        r.ammo = 10;
        r.obstacles.push(Obstacle::new(400.0, 60.0, ObstacleKind::Strong));
        let y = GROUND_Y - 30.0;
        for n in 1..=3 {
            r.bullets.push((r.obstacles[0].x - BULLET_W, y));
            r.step();
            if n < 3 {
                assert_eq!(r.obstacles[0].hp, 3 - n);
            }
        }
        assert!(r.obstacles.is_empty());
        assert_eq!(r.distance, 3 + WRECK_BONUS);
        assert_eq!(r.ammo, 10 + WRECK_AMMO);
    }

    #[test]
    fn test_obstacle_contact_ends_run() {
        let mut r = running();
        r.obstacles.push(Obstacle::new(PLAYER_X + 10.0, 50.0, ObstacleKind::Box));
        r.step();
        assert!(r.is_game_over());
    }

    #[test]
    fn test_coin_pays_distance_and_ammo() {
        let mut r = running();
        r.ammo = 18;
        let (cx, cy) = r.player().center();
        r.coins.push((cx + START_SPEED, cy));
        r.step();
        assert!(r.coins.is_empty());
        assert_eq!(r.distance, 1 + COIN_BONUS);
        assert_eq!(r.ammo, MAX_AMMO);
    }

    #[test]
    fn test_speed_ramps_every_500_frames() {
        let mut r = running();
        for _ in 0..SPEED_EVERY {
            r.obstacles.clear();
            r.step();
        }
        assert_eq!(r.speed, START_SPEED + SPEED_STEP);
        assert!(r.score() >= SPEED_EVERY / 10);
    }
}
