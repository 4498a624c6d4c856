use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::particles::Particles;
use crate::games::Game;

const FIELD_W: f32 = 400.0;
const FIELD_H: f32 = 600.0;
const GROUND_Y: f32 = FIELD_H - 10.0;
const DANGER_Y: f32 = 80.0;
const DROP_Y: f32 = 50.0;
const GRAVITY: f32 = 0.5;
const DAMPING: f32 = 0.7;
const GROUND_FRICTION: f32 = 0.95;
const PUSH: f32 = 0.1;
const MERGE_POP: f32 = -3.0;
const DROP_COOLDOWN: u32 = 30;
const DROPPER_STEP: f32 = 20.0;
const DROPPER_MARGIN: f32 = 40.0;
const COMBO_FRAMES: u32 = 120;
const MAX_COMBO: u32 = 5;
/// A fruit younger than this is still falling in from the dropper
const SETTLE_FRAMES: u32 = 60;
const POINTS_PER_LEVEL: u32 = 100;

struct FruitKind {
    name: &'static str,
    radius: f32,
    color: Color,
    points: u32,
}

const FRUITS: [FruitKind; 10] = [
    FruitKind { name: "Cherry", radius: 15.0, color: Color::Rgb(255, 107, 157), points: 1 },
    FruitKind { name: "Strawberry", radius: 20.0, color: Color::Rgb(255, 87, 87), points: 3 },
    FruitKind { name: "Grape", radius: 25.0, color: Color::Rgb(155, 89, 182), points: 6 },
    FruitKind { name: "Orange", radius: 30.0, color: Color::Rgb(255, 159, 67), points: 10 },
    FruitKind { name: "Lemon", radius: 33.0, color: Color::Rgb(255, 217, 61), points: 15 },
    FruitKind { name: "Apple", radius: 36.0, color: Color::Rgb(255, 71, 87), points: 21 },
    FruitKind { name: "Peach", radius: 38.0, color: Color::Rgb(255, 184, 184), points: 28 },
    FruitKind { name: "Pineapple", radius: 40.0, color: Color::Rgb(249, 202, 36), points: 36 },
    FruitKind { name: "Coconut", radius: 42.0, color: Color::Rgb(139, 69, 19), points: 45 },
    FruitKind { name: "Watermelon", radius: 50.0, color: Color::Rgb(29, 209, 161), points: 55 },
];

#[derive(Clone, Copy, Debug)]
struct Fruit {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    kind: usize,
    age: u32,
    merged: bool,
}

impl Fruit {
    fn new(x: f32, y: f32, kind: usize) -> Self {
        Self { x, y, vx: 0.0, vy: 0.0, kind, age: 0, merged: false }
    }

    fn radius(&self) -> f32 {
        FRUITS[self.kind].radius
    }

    fn integrate(&mut self) {
        let r = self.radius();
        self.age += 1;
        self.vy += GRAVITY;
        self.x += self.vx;
        self.y += self.vy;
        if self.x - r < 0.0 {
            self.x = r;
            self.vx *= -DAMPING;
        }
        if self.x + r > FIELD_W {
            self.x = FIELD_W - r;
            self.vx *= -DAMPING;
        }
        if self.y + r > GROUND_Y {
            self.y = GROUND_Y - r;
            self.vy *= -DAMPING;
            self.vx *= GROUND_FRICTION;
        }
    }

    fn over_the_line(&self) -> bool {
        self.age > SETTLE_FRAMES && self.y - self.radius() < DANGER_Y && self.vy.abs() < 0.5
    }
}

/// Resolves a touching pair: returns the merge point when both are the same
/// kind, otherwise pushes them apart.
fn collide(a: &mut Fruit, b: &mut Fruit) -> Option<(f32, f32)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let min_dist = a.radius() + b.radius();
    if (dx * dx + dy * dy).sqrt() >= min_dist {
        return None;
    }
    if a.kind == b.kind && a.kind < FRUITS.len() - 1 && !a.merged && !b.merged {
        a.merged = true;
        b.merged = true;
        return Some(((a.x + b.x) / 2.0, (a.y + b.y) / 2.0));
    }
    let angle = dy.atan2(dx);
    let ax = (a.x + angle.cos() * min_dist - b.x) * PUSH;
    let ay = (a.y + angle.sin() * min_dist - b.y) * PUSH;
    a.vx -= ax;
    a.vy -= ay;
    b.vx += ax;
    b.vy += ay;
    None
}

pub struct Merge {
    fruits: Vec<Fruit>,
    particles: Particles,
    next_kind: usize,
    drop_x: f32,
    cooldown: u32,
    combo: u32,
    combo_timer: u32,
    score: u32,
    best: u32,
    level: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Merge {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let next_kind = rng.gen_range(0..3);
        Self {
            fruits: Vec::new(),
            particles: Particles::default(),
            next_kind,
            drop_x: FIELD_W / 2.0,
            cooldown: 0,
            combo: 0,
            combo_timer: 0,
            score: 0,
            best: 0,
            level: 1,
            paused: false,
            game_over: false,
            rng,
        }
    }

    fn drop_fruit(&mut self) {
        if self.cooldown > 0 {
            return;
        }
        self.fruits.push(Fruit::new(self.drop_x, DROP_Y, self.next_kind));
        let pool = 3usize.min(self.level as usize + 2);
        self.next_kind = self.rng.gen_range(0..pool);
        self.cooldown = DROP_COOLDOWN;
    }

    fn move_dropper(&mut self, dx: f32) {
        self.drop_x = (self.drop_x + dx).clamp(DROPPER_MARGIN, FIELD_W - DROPPER_MARGIN);
    }

    fn merged_into(&mut self, x: f32, y: f32, kind: usize) {
        let mut born = Fruit::new(x, y, kind);
        born.vy = MERGE_POP;
        self.fruits.push(born);

        self.combo += 1;
        self.combo_timer = COMBO_FRAMES;
        self.score += FRUITS[kind].points * self.combo.min(MAX_COMBO);
        self.particles.burst(&mut self.rng, x, y, FRUITS[kind - 1].color, 20, 4.0, 40);

        let level = self.score / POINTS_PER_LEVEL + 1;
        if level > self.level {
            self.level = level;
            self.particles.burst(&mut self.rng, FIELD_W / 2.0, FIELD_H / 2.0, Color::Rgb(255, 215, 0), 50, 5.0, 60);
            debug!(level, score = self.score, "fruit merge level up");
        }
    }

    fn step(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
        if self.combo_timer > 0 {
            self.combo_timer -= 1;
            if self.combo_timer == 0 {
                self.combo = 0;
            }
        }
        self.particles.update(0.3);

        let mut merges = Vec::new();
        let n = self.fruits.len();
        for i in 0..n {
            self.fruits[i].integrate();
            for j in i + 1..n {
                let (head, tail) = self.fruits.split_at_mut(j);
                if let Some((x, y)) = collide(&mut head[i], &mut tail[0]) {
                    merges.push((x, y, head[i].kind + 1));
                }
            }
        }
        self.fruits.retain(|f| !f.merged);
        for (x, y, kind) in merges {
            self.merged_into(x, y, kind);
        }

        if self.fruits.iter().any(Fruit::over_the_line) {
            self.game_over = true;
            debug!(score = self.score, "fruit merge overflowed");
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(253, 203, 110));
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        c.braille_line(&scale, (0.0, DANGER_Y), (FIELD_W, DANGER_Y), Color::Rgb(231, 76, 60));
        if self.cooldown == 0 && !self.game_over {
            let r = FRUITS[self.next_kind].radius;
            c.rect(&scale, self.drop_x - r, DROP_Y - r, r * 2.0, r * 2.0, '░', FRUITS[self.next_kind].color);
        }

        for f in &self.fruits {
            let r = f.radius();
            c.rect(&scale, f.x - r, f.y - r, r * 2.0, r * 2.0, '█', FRUITS[f.kind].color);
        }
        for p in &self.particles.list {
            c.dot(&scale, p.x, p.y, '•', p.color);
        }
        c.rect(&scale, 0.0, GROUND_Y, FIELD_W, FIELD_H - GROUND_Y, '▀', Color::Rgb(139, 69, 19));

        if self.combo > 1 && self.combo_timer > 0 {
            let style = Style::default().fg(Color::Rgb(255, 107, 107)).add_modifier(Modifier::BOLD);
            c.text_centered(0, &format!("{}x COMBO!", self.combo), style);
        }
        c
    }
}

impl Game for Merge {
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
            KeyCode::Left => self.move_dropper(-DROPPER_STEP),
            KeyCode::Right => self.move_dropper(DROPPER_STEP),
            KeyCode::Char(' ') | KeyCode::Down => self.drop_fruit(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🍉 Fruit Merge", Color::Rgb(255, 120, 200));

        let next = &FRUITS[self.next_kind];
        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Level: {}", self.level), Color::Green),
            (format!("Next: {}", next.name), next.color),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🍉", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("The basket overflowed! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("←→", "Move"), ("SPACE", "Drop"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Merge::with_rng(rng);
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

    fn resting(x: f32, kind: usize) -> Fruit {
        let mut f = Fruit::new(x, GROUND_Y - FRUITS[kind].radius, kind);
        f.age = SETTLE_FRAMES + 1;
        f
    }

    #[test]
    fn test_drop_has_cooldown() {
        let mut m = Merge::with_seed(1);
        m.drop_fruit();
        assert_eq!(m.fruits.len(), 1);
        assert_eq!(m.fruits[0].y, DROP_Y);
        m.drop_fruit();
        assert_eq!(m.fruits.len(), 1);
        for _ in 0..DROP_COOLDOWN {
            m.step();
        }
        m.drop_fruit();
        assert_eq!(m.fruits.len(), 2);
    }

    #[test]
    fn test_dropper_stays_inside() {
        let mut m = Merge::with_seed(2);
        for _ in 0..50 {
            m.move_dropper(-DROPPER_STEP);
        }
        assert_eq!(m.drop_x, DROPPER_MARGIN);
    }

    #[test]
    fn test_same_kind_merges_upward() {
        let mut m = Merge::with_seed(3);
        m.fruits = vec![resting(100.0, 0), resting(120.0, 0)];
        m.step();
        assert_eq!(m.fruits.len(), 1);
        assert_eq!(m.fruits[0].kind, 1);
        assert_eq!(m.fruits[0].vy, MERGE_POP);
        assert_eq!(m.score, FRUITS[1].points);
        assert_eq!(m.combo, 1);
    }

    #[test]
    fn test_combo_multiplies_and_expires() {
        let mut m = Merge::with_seed(4);
        m.combo = 2;
        m.combo_timer = 10;
        m.fruits = vec![resting(100.0, 2), resting(130.0, 2)];
        m.step();
        assert_eq!(m.score, FRUITS[3].points * 3);
        m.fruits.clear();
        for _ in 0..COMBO_FRAMES {
            m.step();
        }
        assert_eq!(m.combo, 0);
    }

    #[test]
    fn test_different_kinds_push_apart() {
        let mut a = resting(100.0, 0);
        let mut b = resting(110.0, 1);
        assert!(collide(&mut a, &mut b).is_none());
        assert!(a.vx < 0.0);
        assert!(b.vx > 0.0);
    }

    #[test]
    fn test_watermelons_do_not_merge() {
        let mut a = resting(100.0, 9);
        let mut b = resting(150.0, 9);
        assert!(collide(&mut a, &mut b).is_none());
    }

    #[test]
    fn test_level_follows_score() {
        let mut m = Merge::with_seed(5);
        m.score = 95;
        m.merged_into(200.0, 300.0, 3);
        assert_eq!(m.level, 2);
    }

    #[test]
    fn test_fresh_drop_is_not_overflow() {
        let mut m = Merge::with_seed(6);
        m.drop_fruit();
        m.step();
        assert!(!m.is_game_over());
    }

    #[test]
    fn test_settled_fruit_over_line_ends_game() {
        let mut m = Merge::with_seed(7);
        let mut f = Fruit::new(200.0, DANGER_Y, 0);
        f.age = SETTLE_FRAMES + 5;
        f.vy = -GRAVITY;
        m.fruits.push(f);
        m.step();
        assert!(m.is_game_over());
    }
}
