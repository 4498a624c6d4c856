use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom::{self, Rect as Box2, Side};
use crate::games::particles::Particles;
use crate::games::Game;

const FIELD_W: f32 = 600.0;
const FIELD_H: f32 = 600.0;

const COLS: usize = 10;
const BRICK_W: f32 = 55.0;
const BRICK_H: f32 = 20.0;
const BRICK_PAD: f32 = 5.0;

const PADDLE_W: f32 = 120.0;
const PADDLE_WIDE: f32 = 180.0;
const PADDLE_H: f32 = 15.0;
const PADDLE_STEP: f32 = 32.0;
const BALL_R: f32 = 8.0;

const POWER_MS: u64 = 10_000;
const LASER_COOLDOWN: u32 = 20;
const LASER_SPEED: f32 = 8.0;

/// Brick colour by its starting hit points
const HP_COLORS: [Color; 3] = [
    Color::Rgb(34, 197, 94),
    Color::Rgb(251, 191, 36),
    Color::Rgb(249, 115, 22),
];
/// Particle colour by hit points left
const SPARK_COLORS: [Color; 4] = [
    Color::Rgb(255, 0, 0),
    Color::Rgb(255, 102, 0),
    Color::Rgb(255, 255, 0),
    Color::Rgb(0, 255, 0),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Power {
    Expand,
    Multi,
    Slow,
    Laser,
}

impl Power {
    const ALL: [Power; 4] = [Power::Expand, Power::Multi, Power::Slow, Power::Laser];

    fn letter(self) -> char {
        match self {
            Power::Expand => 'E',
            Power::Multi => 'M',
            Power::Slow => 'S',
            Power::Laser => 'L',
        }
    }

    fn color(self) -> Color {
        match self {
            Power::Expand => Color::Rgb(0, 255, 0),
            Power::Multi => Color::Rgb(255, 0, 255),
            Power::Slow => Color::Rgb(0, 255, 255),
            Power::Laser => Color::Rgb(255, 0, 0),
        }
    }
}

#[derive(Clone, Debug)]
struct Brick {
    rect: Box2,
    hp: u32,
    max_hp: u32,
    power: Option<Power>,
}

#[derive(Clone, Debug)]
struct Ball {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    stuck: bool,
}

impl Ball {
    fn stuck() -> Self {
        Self { x: FIELD_W / 2.0, y: FIELD_H - 50.0, vx: 5.0, vy: -5.0, stuck: true }
    }

    fn bounds(&self) -> Box2 {
        Box2::around(self.x, self.y, BALL_R)
    }
}

#[derive(Clone, Debug)]
struct Drop {
    x: f32,
    y: f32,
    power: Power,
}

#[derive(Clone, Debug)]
struct Bolt {
    x: f32,
    y: f32,
}

pub struct Arkanoid {
    paddle_x: f32,
    paddle_w: f32,
    expand_ms: u64,
    laser_ms: u64,
    laser_cooldown: u32,
    balls: Vec<Ball>,
    bricks: Vec<Brick>,
    drops: Vec<Drop>,
    bolts: Vec<Bolt>,
    particles: Particles,
    score: u32,
    best: u32,
    lives: u32,
    level: u32,
    game_over: bool,
    paused: bool,
    rng: StdRng,
}

impl Arkanoid {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut a = Self {
            paddle_x: FIELD_W / 2.0 - PADDLE_W / 2.0,
            paddle_w: PADDLE_W,
            expand_ms: 0,
            laser_ms: 0,
            laser_cooldown: 0,
            balls: vec![Ball::stuck()],
            bricks: Vec::new(),
            drops: Vec::new(),
            bolts: Vec::new(),
            particles: Particles::default(),
            score: 0,
            best: 0,
            lives: 3,
            level: 1,
            game_over: false,
            paused: false,
            rng,
        };
        a.create_bricks();
        a
    }

    fn paddle_y() -> f32 {
        FIELD_H - 30.0
    }

    fn paddle(&self) -> Box2 {
        Box2::new(self.paddle_x, Self::paddle_y(), self.paddle_w, PADDLE_H)
    }

    fn create_bricks(&mut self) {
        self.bricks.clear();
        let rows = (5 + self.level as usize).min(10);
        for row in 0..rows {
            for col in 0..COLS {
                let hp = (row as u32 + 1).min(3);
                let power = if self.rng.gen_bool(0.15) {
                    Some(Power::ALL[self.rng.gen_range(0..Power::ALL.len())])
                } else {
                    None
                };
                self.bricks.push(Brick {
                    rect: Box2::new(
                        col as f32 * (BRICK_W + BRICK_PAD) + 5.0,
                        row as f32 * (BRICK_H + BRICK_PAD) + 50.0,
                        BRICK_W,
                        BRICK_H,
                    ),
                    hp,
                    max_hp: hp,
                    power,
                });
            }
        }
    }

    fn launch(&mut self) {
        for ball in self.balls.iter_mut().filter(|b| b.stuck) {
            ball.stuck = false;
            ball.vy = -5.0;
            ball.vx = self.rng.gen_range(-4.0..4.0);
        }
    }

    fn fire_laser(&mut self) {
        if self.laser_ms == 0 || self.laser_cooldown > 0 {
            return;
        }
        let y = Self::paddle_y();
        self.bolts.push(Bolt { x: self.paddle_x + 4.0, y });
        self.bolts.push(Bolt { x: self.paddle_x + self.paddle_w - 4.0, y });
        self.laser_cooldown = LASER_COOLDOWN;
    }

    fn activate(&mut self, power: Power) {
        debug!(?power, "arkanoid powerup");
        match power {
            Power::Expand => {
                self.paddle_w = PADDLE_WIDE;
                self.expand_ms = POWER_MS;
                self.paddle_x = self.paddle_x.min(FIELD_W - self.paddle_w);
            }
            Power::Multi => {
                if let Some(src) = self.balls.first().cloned() {
                    for _ in 0..2 {
                        let vx = self.rng.gen_range(-4.0..4.0);
                        self.balls.push(Ball { x: src.x, y: src.y, vx, vy: -5.0, stuck: false });
                    }
                }
            }
            Power::Slow => {
                for b in &mut self.balls {
                    b.vx *= 0.7;
                    b.vy *= 0.7;
                }
            }
            Power::Laser => self.laser_ms = POWER_MS,
        }
    }

    /// Damage brick `i`; returns true if it broke
    fn hit_brick(&mut self, i: usize) -> bool {
        let brick = &mut self.bricks[i];
        brick.hp = brick.hp.saturating_sub(1);
        self.score += 10;
        let (cx, cy) = brick.rect.center();
        let color = SPARK_COLORS[brick.hp as usize];
        self.particles.burst(&mut self.rng, cx, cy, color, 8, 3.0, 30);
        if self.bricks[i].hp > 0 {
            return false;
        }
        let brick = self.bricks.remove(i);
        if let Some(power) = brick.power {
            self.drops.push(Drop { x: cx, y: cy, power });
        }
        self.score += 50;
        true
    }

    fn update_balls(&mut self) {
        let paddle = self.paddle();
        for ball in &mut self.balls {
            if ball.stuck {
                ball.x = paddle.x + paddle.w / 2.0;
                ball.y = paddle.y - BALL_R - 5.0;
                continue;
            }
            ball.x += ball.vx;
            ball.y += ball.vy;

            if ball.x - BALL_R < 0.0 || ball.x + BALL_R > FIELD_W {
                ball.vx = -ball.vx;
                ball.x = ball.x.clamp(BALL_R, FIELD_W - BALL_R);
            }
            if ball.y - BALL_R < 0.0 {
                ball.vy = -ball.vy;
                ball.y = BALL_R;
            }

            if ball.y + BALL_R > paddle.y
                && ball.y - BALL_R < paddle.y + paddle.h
                && ball.x > paddle.x
                && ball.x < paddle.x + paddle.w
            {
                ball.vy = -ball.vy.abs();
                ball.vx += (ball.x - (paddle.x + paddle.w / 2.0)) * 0.1;
                ball.y = paddle.y - BALL_R;
            }
        }

        self.balls.retain(|b| b.y <= FIELD_H);
        if self.balls.is_empty() {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.game_over = true;
                debug!(score = self.score, level = self.level, "arkanoid game over");
            } else {
                self.balls.push(Ball::stuck());
            }
        }
    }

    fn collide_bricks(&mut self) {
        for b in 0..self.balls.len() {
            if self.balls[b].stuck {
                continue;
            }
            let bounds = self.balls[b].bounds();
            // Later bricks first, matching draw order on overlap
            let Some(i) = (0..self.bricks.len()).rev().find(|&i| bounds.intersects(&self.bricks[i].rect)) else {
                continue;
            };
            match geom::min_overlap_side(&bounds, &self.bricks[i].rect) {
                Side::Horizontal => self.balls[b].vx = -self.balls[b].vx,
                Side::Vertical => self.balls[b].vy = -self.balls[b].vy,
            }
            self.hit_brick(i);
        }
    }

    fn update_bolts(&mut self) {
        let mut k = 0;
        while k < self.bolts.len() {
            self.bolts[k].y -= LASER_SPEED;
            let (x, y) = (self.bolts[k].x, self.bolts[k].y);
            if y < 0.0 {
                self.bolts.remove(k);
                continue;
            }
            if let Some(i) = self.bricks.iter().position(|br| br.rect.contains(x, y)) {
                self.bolts.remove(k);
                self.hit_brick(i);
                continue;
            }
            k += 1;
        }
    }

    fn update_drops(&mut self) {
        let paddle = self.paddle();
        let mut caught = Vec::new();
        self.drops.retain_mut(|d| {
            d.y += 3.0;
            if Box2::new(d.x - 15.0, d.y, 30.0, 15.0).intersects(&paddle) {
                caught.push(d.power);
                return false;
            }
            d.y <= FIELD_H
        });
        for power in caught {
            self.score += 50;
            self.activate(power);
        }
    }

    fn step(&mut self, dt_ms: u64) {
        if self.expand_ms > 0 {
            self.expand_ms = self.expand_ms.saturating_sub(dt_ms);
            if self.expand_ms == 0 {
                self.paddle_w = PADDLE_W;
            }
        }
        self.laser_ms = self.laser_ms.saturating_sub(dt_ms);
        self.laser_cooldown = self.laser_cooldown.saturating_sub(1);

        self.update_balls();
        if self.game_over {
            return;
        }
        self.update_drops();
        self.collide_bricks();
        self.update_bolts();
        self.particles.update(0.0);

        if self.bricks.is_empty() {
            self.level += 1;
            debug!(level = self.level, "arkanoid level cleared");
            self.balls = vec![Ball::stuck()];
            self.bolts.clear();
            self.particles.clear();
            self.create_bricks();
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let bg = Color::Rgb(26, 26, 46);
        let mut c = Canvas::new(width as u16, height as u16, bg);
        let s = Scale::new(FIELD_W, FIELD_H, width, height);

        for brick in &self.bricks {
            let base = HP_COLORS[(brick.max_hp as usize).saturating_sub(1).min(2)];
            // Worn bricks lose their fill
            let ch = match brick.hp {
                3 => '█',
                2 => '▓',
                _ if brick.max_hp > 1 => '▒',
                _ => '█',
            };
            c.rect(&s, brick.rect.x, brick.rect.y, brick.rect.w - 2.0, brick.rect.h, ch, base);
            if brick.power.is_some() {
                let (x, y) = s.cell(brick.rect.x + brick.rect.w / 2.0, brick.rect.y);
                c.put_styled(x, y, '?', Style::default().fg(Color::Rgb(255, 255, 0)).bg(base));
            }
        }

        for p in &self.particles.list {
            c.dot(&s, p.x, p.y, '∙', p.color);
        }

        for d in &self.drops {
            let (x, y) = s.cell(d.x, d.y);
            c.put_styled(x, y, d.power.letter(), Style::default().fg(Color::Black).bg(d.power.color()).add_modifier(Modifier::BOLD));
        }

        for bolt in &self.bolts {
            c.dot(&s, bolt.x, bolt.y, '╎', Color::Rgb(255, 80, 80));
        }

        let paddle_color = if self.laser_ms > 0 { Color::Rgb(239, 68, 68) } else { Color::Rgb(167, 139, 250) };
        c.rect(&s, self.paddle_x, Self::paddle_y(), self.paddle_w, PADDLE_H, '▀', paddle_color);

        for ball in &self.balls {
            c.dot(&s, ball.x, ball.y, '●', Color::White);
        }
        c
    }
}

impl Game for Arkanoid {
    fn update(&mut self, dt_ms: u64) {
        if self.game_over || self.paused { return; }
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
            KeyCode::Left => {
                self.paddle_x = (self.paddle_x - PADDLE_STEP).max(0.0);
            }
            KeyCode::Right => {
                self.paddle_x = (self.paddle_x + PADDLE_STEP).min(FIELD_W - self.paddle_w);
            }
            KeyCode::Char(' ') | KeyCode::Up => {
                if self.balls.iter().any(|b| b.stuck) {
                    self.launch();
                } else {
                    self.fire_laser();
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🏓 Arkanoid", Color::Rgb(139, 92, 246));

        let mut parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", "♥ ".repeat(self.lives as usize)), Color::Red),
            (format!("Level: {}", self.level), Color::Cyan),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        if self.laser_ms > 0 {
            parts.push((format!("LASER {}s", self.laser_ms / 1000 + 1), Color::Rgb(255, 80, 80)));
        }
        canvas::render_lines(frame, status, canvas::status_line("🏓", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Final Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("←→", "Move"), ("SPACE", "Launch / Laser"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Arkanoid::with_rng(rng);
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

    fn arkanoid() -> Arkanoid {
        let mut a = Arkanoid::with_seed(11);
        for b in &mut a.bricks {
            b.power = None;
        }
        a
    }

    #[test]
    fn test_rows_and_hit_points_scale() {
        let a = arkanoid();
        assert_eq!(a.bricks.len(), 6 * COLS);
        assert_eq!(a.bricks[0].hp, 1);
        assert_eq!(a.bricks[COLS].hp, 2);
        assert!(a.bricks[2 * COLS..].iter().all(|b| b.hp == 3));

        let mut deep = Arkanoid::with_seed(1);
        deep.level = 9;
        deep.create_bricks();
        assert_eq!(deep.bricks.len(), 10 * COLS);
    }

    #[test]
    fn test_launch_frees_stuck_ball() {
        let mut a = arkanoid();
        a.update(16);
        assert!(a.balls[0].stuck);
        a.handle_input(KeyEvent::from(KeyCode::Char(' ')));
        assert!(!a.balls[0].stuck);
        assert_eq!(a.balls[0].vy, -5.0);
        assert!(a.balls[0].vx.abs() <= 4.0);
    }

    #[test]
    fn test_side_hit_flips_horizontal() {
        let mut a = arkanoid();
        let target = a.bricks[5 * COLS + 3].rect;
        a.balls = vec![Ball {
            x: target.x - BALL_R + 3.0,
            y: target.y + target.h / 2.0,
            vx: 0.0,
            vy: 0.0,
            stuck: false,
        }];
        a.collide_bricks();
        // Left face of a 3-hp brick: bounced back, brick survives
        assert_eq!(a.balls[0].vy, 0.0);
        assert_eq!(a.score, 10);
        assert_eq!(a.bricks[5 * COLS + 3].hp, 2);
        assert_eq!(a.particles.list.len(), 8);
    }

    #[test]
    fn test_bottom_hit_flips_vertical_and_breaks() {
        let mut a = arkanoid();
        let idx = 5 * COLS + 2;
        a.bricks[idx].hp = 1;
        let target = a.bricks[idx].rect;
        let before = a.bricks.len();
        a.balls = vec![Ball {
            x: target.x + target.w / 2.0,
            y: target.y + target.h + BALL_R - 2.0,
            vx: 1.0,
            vy: -5.0,
            stuck: false,
        }];
        a.collide_bricks();
        assert_eq!(a.balls[0].vy, 5.0);
        assert_eq!(a.balls[0].vx, 1.0);
        assert_eq!(a.bricks.len(), before - 1);
        assert_eq!(a.score, 60);
    }

    #[test]
    fn test_paddle_sends_ball_up() {
        let mut a = arkanoid();
        let py = Arkanoid::paddle_y();
        a.balls = vec![Ball { x: a.paddle_x + 100.0, y: py - 10.0, vx: 0.0, vy: 5.0, stuck: false }];
        a.update_balls();
        assert!(a.balls[0].vy < 0.0);
        assert!(a.balls[0].vx > 0.0);
    }

    #[test]
    fn test_expand_reverts_after_timeout() {
        let mut a = arkanoid();
        a.activate(Power::Expand);
        assert_eq!(a.paddle_w, PADDLE_WIDE);
        a.update(POWER_MS - 1);
        assert_eq!(a.paddle_w, PADDLE_WIDE);
        a.update(1);
        assert_eq!(a.paddle_w, PADDLE_W);
    }

    #[test]
    fn test_laser_fires_pairs_and_damages() {
        let mut a = arkanoid();
        a.paddle_x = 200.0;
        a.activate(Power::Laser);
        a.fire_laser();
        assert_eq!(a.bolts.len(), 2);
        a.fire_laser();
        assert_eq!(a.bolts.len(), 2);
        let before = a.score;
        for _ in 0..80 {
            a.update_bolts();
        }
        assert!(a.bolts.is_empty());
        assert_eq!(a.score, before + 20);
    }

    #[test]
    fn test_losing_every_ball_costs_life() {
        let mut a = arkanoid();
        a.balls = vec![Ball { x: 100.0, y: FIELD_H + 10.0, vx: 0.0, vy: 5.0, stuck: false }];
        a.update(16);
        assert_eq!(a.lives, 2);
        assert!(a.balls[0].stuck);
    }

    #[test]
    fn test_clear_advances_level() {
        let mut a = arkanoid();
        a.bricks.truncate(1);
        a.bricks[0].hp = 1;
        let target = a.bricks[0].rect;
        a.balls = vec![Ball { x: target.x + 20.0, y: target.y + target.h + 6.0, vx: 0.0, vy: -1.0, stuck: false }];
        a.update(16);
        assert_eq!(a.level, 2);
        assert_eq!(a.bricks.len(), 7 * COLS);
        assert!(a.balls[0].stuck);
        assert!(a.particles.list.is_empty());
    }
}
