use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom::Rect as Box2;
use crate::games::Game;

const FIELD_W: f32 = 610.0;
const FIELD_H: f32 = 600.0;

const BRICK_ROWS: usize = 5;
const BRICK_COLS: usize = 10;
const BRICK_W: f32 = 55.0;
const BRICK_H: f32 = 20.0;
const BRICK_PAD: f32 = 5.0;
const BRICK_TOP: f32 = 60.0;
const BRICK_LEFT: f32 = 10.0;

const PADDLE_W: f32 = 120.0;
const PADDLE_H: f32 = 15.0;
/// One key press moves the paddle as far as four frames of held input
const PADDLE_STEP: f32 = 8.0 * 4.0;
const BALL_R: f32 = 8.0;
const BALL_SPEED: f32 = 4.0;
const POWERUP_CHANCE: f64 = 0.15;
const STICKY_MS: u64 = 10_000;

const ROW_COLORS: [Color; BRICK_ROWS] = [
    Color::Rgb(231, 76, 60),
    Color::Rgb(230, 126, 34),
    Color::Rgb(243, 156, 18),
    Color::Rgb(46, 204, 113),
    Color::Rgb(52, 152, 219),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerKind {
    Expand,
    Shrink,
    MultiBall,
    Sticky,
    Slow,
    ExtraLife,
}

impl PowerKind {
    const ALL: [PowerKind; 6] = [
        PowerKind::Expand,
        PowerKind::Shrink,
        PowerKind::MultiBall,
        PowerKind::Sticky,
        PowerKind::Slow,
        PowerKind::ExtraLife,
    ];

    fn label(self) -> &'static str {
        match self {
            PowerKind::Expand => "EXPAND",
            PowerKind::Shrink => "SHRINK",
            PowerKind::MultiBall => "x3",
            PowerKind::Sticky => "STICKY",
            PowerKind::Slow => "SLOW",
            PowerKind::ExtraLife => "+1",
        }
    }

    fn color(self) -> Color {
        match self {
            PowerKind::Expand => Color::Rgb(46, 204, 113),
            PowerKind::Shrink => Color::Rgb(231, 76, 60),
            PowerKind::MultiBall => Color::Rgb(255, 215, 0),
            PowerKind::Sticky => Color::Rgb(155, 89, 182),
            PowerKind::Slow => Color::Rgb(52, 152, 219),
            PowerKind::ExtraLife => Color::Rgb(233, 30, 99),
        }
    }
}

#[derive(Clone, Debug)]
struct Brick {
    rect: Box2,
    color: Color,
    alive: bool,
    powerup: bool,
}

#[derive(Clone, Debug)]
struct Ball {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
}

#[derive(Clone, Debug)]
struct Powerup {
    x: f32,
    y: f32,
    kind: PowerKind,
}

pub struct Breakout {
    paddle_x: f32,
    paddle_w: f32,
    balls: Vec<Ball>,
    /// Ball rides the paddle until Space
    stuck: bool,
    ball_speed: f32,
    bricks: Vec<Brick>,
    powerups: Vec<Powerup>,
    sticky_ms: u64,
    score: u32,
    best: u32,
    lives: u32,
    level: u32,
    game_over: bool,
    paused: bool,
    rng: StdRng,
}

impl Breakout {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut b = Self {
            paddle_x: FIELD_W / 2.0 - PADDLE_W / 2.0,
            paddle_w: PADDLE_W,
            balls: Vec::new(),
            stuck: true,
            ball_speed: BALL_SPEED,
            bricks: Vec::new(),
            powerups: Vec::new(),
            sticky_ms: 0,
            score: 0,
            best: 0,
            lives: 3,
            level: 1,
            game_over: false,
            paused: false,
            rng,
        };
        b.init_bricks();
        b.serve();
        b
    }

    fn paddle_y(&self) -> f32 {
        FIELD_H - 30.0
    }

    fn init_bricks(&mut self) {
        self.bricks.clear();
        for row in 0..BRICK_ROWS {
            for col in 0..BRICK_COLS {
                self.bricks.push(Brick {
                    rect: Box2::new(
                        col as f32 * (BRICK_W + BRICK_PAD) + BRICK_LEFT,
                        row as f32 * (BRICK_H + BRICK_PAD) + BRICK_TOP,
                        BRICK_W,
                        BRICK_H,
                    ),
                    color: ROW_COLORS[row],
                    alive: true,
                    powerup: self.rng.gen_bool(POWERUP_CHANCE),
                });
            }
        }
    }

    /// Put a single ball back on the paddle
    fn serve(&mut self) {
        self.balls = vec![Ball {
            x: self.paddle_x + self.paddle_w / 2.0,
            y: self.paddle_y() - BALL_R,
            dx: self.ball_speed,
            dy: -self.ball_speed,
        }];
        self.stuck = true;
    }

    fn launch(&mut self) {
        if !self.stuck {
            return;
        }
        self.stuck = false;
        if let Some(ball) = self.balls.first_mut() {
            ball.dy = -ball.dy.abs().max(1.0);
        }
    }

    fn move_paddle(&mut self, delta: f32) {
        self.paddle_x = (self.paddle_x + delta).clamp(0.0, FIELD_W - self.paddle_w);
    }

    fn apply(&mut self, kind: PowerKind) {
        debug!(?kind, "breakout powerup");
        match kind {
            PowerKind::Expand => self.paddle_w = (self.paddle_w + 40.0).min(200.0),
            PowerKind::Shrink => self.paddle_w = (self.paddle_w - 30.0).max(60.0),
            PowerKind::MultiBall => {
                if let Some(src) = self.balls.first().cloned() {
                    for _ in 0..2 {
                        let dx = self.rng.gen_range(-4.0..4.0);
                        self.balls.push(Ball { x: src.x, y: src.y, dx, dy: -4.0 });
                    }
                }
            }
            PowerKind::Sticky => self.sticky_ms = STICKY_MS,
            PowerKind::Slow => {
                for b in &mut self.balls {
                    b.dx *= 0.7;
                    b.dy *= 0.7;
                }
            }
            PowerKind::ExtraLife => self.lives += 1,
        }
        self.paddle_x = self.paddle_x.clamp(0.0, FIELD_W - self.paddle_w);
    }

    fn update_powerups(&mut self) {
        let paddle = Box2::new(self.paddle_x, self.paddle_y(), self.paddle_w, PADDLE_H);
        let mut caught = Vec::new();
        self.powerups.retain_mut(|p| {
            p.y += 2.0;
            let rect = Box2::new(p.x - 15.0, p.y, 30.0, 15.0);
            if rect.intersects(&paddle) {
                caught.push(p.kind);
                return false;
            }
            p.y < FIELD_H
        });
        for kind in caught {
            self.apply(kind);
        }
    }

    fn update_balls(&mut self) {
        let paddle_y = self.paddle_y();
        let sticky = self.sticky_ms > 0;
        let mut stick = false;
        for (i, ball) in self.balls.iter_mut().enumerate() {
            if self.stuck && i == 0 {
                ball.x = self.paddle_x + self.paddle_w / 2.0;
                ball.y = paddle_y - BALL_R;
                continue;
            }
            ball.x += ball.dx;
            ball.y += ball.dy;

            if ball.x - BALL_R < 0.0 {
                ball.x = BALL_R;
                ball.dx = ball.dx.abs();
            } else if ball.x + BALL_R > FIELD_W {
                ball.x = FIELD_W - BALL_R;
                ball.dx = -ball.dx.abs();
            }
            if ball.y - BALL_R < 0.0 {
                ball.y = BALL_R;
                ball.dy = ball.dy.abs();
            }

            if ball.y + BALL_R > paddle_y
                && ball.y - BALL_R < paddle_y + PADDLE_H
                && ball.x > self.paddle_x
                && ball.x < self.paddle_x + self.paddle_w
            {
                let hit = (ball.x - self.paddle_x) / self.paddle_w;
                ball.dy = -ball.dy.abs();
                ball.dx = (hit - 0.5) * 10.0;
                if sticky && i == 0 {
                    stick = true;
                }
            }
        }
        if stick {
            self.stuck = true;
        }

        let mut spawned = Vec::new();
        for ball in &mut self.balls {
            for brick in self.bricks.iter_mut().filter(|b| b.alive) {
                if brick.rect.contains(ball.x, ball.y) {
                    ball.dy = -ball.dy;
                    brick.alive = false;
                    self.score += 10 * self.level;
                    if brick.powerup {
                        spawned.push((brick.rect.x + brick.rect.w / 2.0, brick.rect.y));
                    }
                    break;
                }
            }
        }
        for (x, y) in spawned {
            let kind = PowerKind::ALL[self.rng.gen_range(0..PowerKind::ALL.len())];
            self.powerups.push(Powerup { x, y, kind });
        }

        self.balls.retain(|b| b.y - BALL_R <= FIELD_H);
        if self.balls.is_empty() {
            self.lose_life();
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.game_over = true;
            debug!(score = self.score, level = self.level, "breakout game over");
        } else {
            self.powerups.clear();
            self.serve();
        }
    }

    fn check_level_clear(&mut self) {
        if self.bricks.iter().any(|b| b.alive) {
            return;
        }
        self.level += 1;
        debug!(level = self.level, "breakout level cleared");
        self.init_bricks();
        self.ball_speed *= 1.1;
        for b in &mut self.balls {
            b.dx *= 1.1;
            b.dy *= 1.1;
        }
    }

    fn bricks_left(&self) -> usize {
        self.bricks.iter().filter(|b| b.alive).count()
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let bg = Color::Rgb(10, 10, 20);
        let mut c = Canvas::new(width as u16, height as u16, bg);
        let s = Scale::new(FIELD_W, FIELD_H, width, height);
        c.border(Color::Rgb(60, 60, 80));

        for brick in self.bricks.iter().filter(|b| b.alive) {
            let (x0, y) = s.cell(brick.rect.x, brick.rect.y);
            let (x1, _) = s.cell(brick.rect.x + brick.rect.w, brick.rect.y);
            let x1 = x1.max(x0 + 1);
            for x in x0..x1 {
                let ch = if x == x0 { '▐' } else if x + 1 == x1 { '▌' } else { '█' };
                c.put(x, y, ch, brick.color);
            }
            if brick.powerup {
                c.put_styled((x0 + x1) / 2, y, '?', Style::default().fg(Color::Rgb(255, 215, 0)).bg(brick.color).add_modifier(Modifier::BOLD));
            }
        }

        for p in &self.powerups {
            let (x, y) = s.cell(p.x, p.y);
            let label = p.kind.label();
            c.text(x - label.len() as i32 / 2, y, label, Style::default().fg(Color::White).bg(p.kind.color()).add_modifier(Modifier::BOLD));
        }

        let (px0, py) = s.cell(self.paddle_x, self.paddle_y());
        let (px1, _) = s.cell(self.paddle_x + self.paddle_w, self.paddle_y());
        let paddle_bg = if self.sticky_ms > 0 { Color::Rgb(155, 89, 182) } else { Color::Rgb(30, 50, 120) };
        for x in px0..px1.max(px0 + 1) {
            let ch = if x == px0 { '╣' } else if x + 1 >= px1 { '╠' } else { '═' };
            c.put_styled(x, py, ch, Style::default().fg(Color::Rgb(180, 200, 255)).bg(paddle_bg).add_modifier(Modifier::BOLD));
        }

        for (i, ball) in self.balls.iter().enumerate() {
            let color = if i == 0 { Color::White } else { Color::Rgb(255, 215, 0) };
            let (tx, ty) = s.cell(ball.x - ball.dx * 2.0, ball.y - ball.dy * 2.0);
            c.put_under(tx, ty, '·', Color::Rgb(100, 100, 120));
            let (bx, by) = s.cell(ball.x, ball.y);
            c.put_styled(bx, by, '●', Style::default().fg(color).bg(bg).add_modifier(Modifier::BOLD));
        }

        if self.sticky_ms > 0 {
            c.text_centered(1, "STICKY PADDLE ACTIVE", Style::default().fg(Color::Rgb(155, 89, 182)).bg(bg));
        }
        c
    }
}

impl Game for Breakout {
    fn update(&mut self, dt_ms: u64) {
        if self.game_over || self.paused { return; }
        self.sticky_ms = self.sticky_ms.saturating_sub(dt_ms);
        self.update_powerups();
        self.update_balls();
        if !self.game_over {
            self.check_level_clear();
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('p') | KeyCode::Char('P') => {
                if !self.game_over {
                    self.paused = !self.paused;
                }
            }
            _ => {
                if self.game_over {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                        self.reset();
                    }
                    return;
                }
                if self.paused { return; }
                match key.code {
                    KeyCode::Left => self.move_paddle(-PADDLE_STEP),
                    KeyCode::Right => self.move_paddle(PADDLE_STEP),
                    KeyCode::Char(' ') | KeyCode::Up => self.launch(),
                    _ => {}
                }
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🧱 Breakout", Color::Rgb(220, 80, 80));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", "♥ ".repeat(self.lives as usize)), Color::Red),
            (format!("Level: {}", self.level), Color::Cyan),
            (format!("Bricks: {}/{}", self.bricks_left(), BRICK_ROWS * BRICK_COLS), Color::Green),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🧱", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else if self.stuck {
            canvas::help_line(&[("←→", "Move Paddle"), ("SPACE", "Launch"), ("P", "Pause"), ("R", "Restart")])
        } else {
            canvas::help_line(&[("←→", "Move Paddle"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Breakout::with_rng(rng);
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

    fn free_ball(b: &mut Breakout, x: f32, y: f32, dx: f32, dy: f32) {
        b.stuck = false;
        b.balls = vec![Ball { x, y, dx, dy }];
    }

    #[test]
    fn test_layout_matches_brick_grid() {
        let b = Breakout::with_seed(1);
        assert_eq!(b.bricks.len(), 50);
        let last = &b.bricks[49].rect;
        assert_eq!(last.x, 9.0 * 60.0 + 10.0);
        assert_eq!(last.y, 4.0 * 25.0 + 60.0);
        assert!(last.x + last.w <= FIELD_W);
    }

    #[test]
    fn test_ball_rides_paddle_until_launch() {
        let mut b = Breakout::with_seed(2);
        b.move_paddle(-PADDLE_STEP);
        b.update(16);
        assert!(b.stuck);
        assert_eq!(b.balls[0].x, b.paddle_x + b.paddle_w / 2.0);
        b.launch();
        b.update(16);
        assert!(!b.stuck);
        assert!(b.balls[0].dy < 0.0);
    }

    #[test]
    fn test_paddle_contact_sends_ball_up() {
        let mut b = Breakout::with_seed(3);
        let y = b.paddle_y() - BALL_R + 2.0;
        // Right edge of the paddle
        let x = b.paddle_x + b.paddle_w * 0.9;
        free_ball(&mut b, x, y - 4.0, 0.0, 4.0);
        b.update(16);
        assert!(b.balls[0].dy < 0.0);
        assert!(b.balls[0].dx > 0.0);
    }

    #[test]
    fn test_brick_hit_scores_and_flips() {
        let mut b = Breakout::with_seed(4);
        for brick in &mut b.bricks {
            brick.powerup = false;
        }
        let target = b.bricks[45].rect;
        free_ball(&mut b, target.x + 20.0, target.y + target.h + 2.0, 0.0, -4.0);
        b.update(16);
        assert!(!b.bricks[45].alive);
        assert_eq!(b.score, 10);
        assert!(b.balls[0].dy > 0.0);
    }

    #[test]
    fn test_losing_last_ball_costs_life() {
        let mut b = Breakout::with_seed(5);
        free_ball(&mut b, 300.0, FIELD_H + 5.0, 0.0, 4.0);
        b.update(16);
        assert_eq!(b.lives, 2);
        assert!(b.stuck);
        assert_eq!(b.balls.len(), 1);

        b.lives = 1;
        free_ball(&mut b, 300.0, FIELD_H + 5.0, 0.0, 4.0);
        b.update(16);
        assert!(b.is_game_over());
    }

    #[test]
    fn test_extra_ball_loss_is_free() {
        let mut b = Breakout::with_seed(6);
        free_ball(&mut b, 300.0, 300.0, 0.0, -4.0);
        b.balls.push(Ball { x: 100.0, y: FIELD_H + 5.0, dx: 0.0, dy: 4.0 });
        b.update(16);
        assert_eq!(b.lives, 3);
        assert_eq!(b.balls.len(), 1);
    }

    #[test]
    fn test_powerups_change_paddle_and_balls() {
        let mut b = Breakout::with_seed(7);
        b.apply(PowerKind::Expand);
        b.apply(PowerKind::Expand);
        assert_eq!(b.paddle_w, 200.0);
        for _ in 0..6 {
            b.apply(PowerKind::Shrink);
        }
        assert_eq!(b.paddle_w, 60.0);
        b.apply(PowerKind::MultiBall);
        assert_eq!(b.balls.len(), 3);
        b.apply(PowerKind::ExtraLife);
        assert_eq!(b.lives, 4);
    }

    #[test]
    fn test_sticky_expires() {
        let mut b = Breakout::with_seed(8);
        b.apply(PowerKind::Sticky);
        free_ball(&mut b, 300.0, 300.0, 0.0, -4.0);
        b.update(STICKY_MS - 16);
        assert!(b.sticky_ms > 0);
        b.update(16);
        assert_eq!(b.sticky_ms, 0);
    }

    #[test]
    fn test_level_clear_speeds_up() {
        let mut b = Breakout::with_seed(9);
        for brick in &mut b.bricks {
            brick.alive = false;
        }
        b.bricks[0].alive = true;
        b.bricks[0].powerup = false;
        let target = b.bricks[0].rect;
        free_ball(&mut b, target.x + 10.0, target.y + target.h + 2.0, 0.0, -4.0);
        b.update(16);
        assert_eq!(b.level, 2);
        assert_eq!(b.bricks_left(), 50);
        assert!((b.balls[0].dy - 4.4).abs() < 1e-4);
    }
}
