use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom::dist;
use crate::games::Game;

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 600.0;
const GROUND_Y: f32 = FIELD_H - 40.0;
const START_AMMO: u32 = 50;
const WAVE_AMMO: u32 = 30;
const SHOT_SPEED: f32 = 8.0;
const DETONATE_WITHIN: f32 = 8.0;
const BLAST_RADIUS: f32 = 50.0;
const CHAIN_RADIUS: f32 = 30.0;
const IMPACT_RADIUS: f32 = 35.0;
const IMPACT_REACH: f32 = 40.0;
const GROW: f32 = 3.0;
const SHRINK: f32 = 2.0;
const KILL_POINTS: u32 = 25;
const CITY_BONUS: u32 = 50;
const BATTERY_BONUS: u32 = 25;
const CROSSHAIR_STEP: f32 = 20.0;
const INTERMISSION_MS: u64 = 2000;
const SHOT_TRAIL: usize = 10;
const ENEMY_TRAIL: usize = 20;
const CITY_XS: [f32; 6] = [150.0, 250.0, 350.0, 450.0, 550.0, 650.0];
const BATTERY_XS: [f32; 3] = [100.0, FIELD_W / 2.0, FIELD_W - 100.0];

#[derive(Clone, Copy, Debug)]
struct Site {
    x: f32,
    y: f32,
    alive: bool,
}

#[derive(Clone, Debug)]
struct Missile {
    x: f32,
    y: f32,
    tx: f32,
    ty: f32,
    vx: f32,
    vy: f32,
    trail: Vec<(f32, f32)>,
}

impl Missile {
    fn aimed(x: f32, y: f32, tx: f32, ty: f32, speed: f32) -> Self {
        let a = (ty - y).atan2(tx - x);
        Self { x, y, tx, ty, vx: a.cos() * speed, vy: a.sin() * speed, trail: Vec::new() }
    }

    fn advance(&mut self, keep: usize) {
        self.trail.push((self.x, self.y));
        if self.trail.len() > keep {
            self.trail.remove(0);
        }
        self.x += self.vx;
        self.y += self.vy;
    }
}

#[derive(Clone, Copy, Debug)]
struct Blast {
    x: f32,
    y: f32,
    radius: f32,
    max: f32,
    growing: bool,
}

impl Blast {
    fn new(x: f32, y: f32, max: f32) -> Self {
        Self { x, y, radius: 0.0, max, growing: true }
    }
}

pub struct MissileCommand {
    cities: Vec<Site>,
    batteries: Vec<Site>,
    enemies: Vec<Missile>,
    shots: Vec<Missile>,
    blasts: Vec<Blast>,
    cross_x: f32,
    cross_y: f32,
    ammo: u32,
    wave: u32,
    to_spawn: u32,
    spawn_timer: u32,
    /// Bonus banner between waves
    intermission: Option<(u64, u32)>,
    score: u32,
    best: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl MissileCommand {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut m = Self {
            cities: CITY_XS.iter().map(|&x| Site { x, y: GROUND_Y, alive: true }).collect(),
            batteries: BATTERY_XS.iter().map(|&x| Site { x, y: FIELD_H - 20.0, alive: true }).collect(),
            enemies: Vec::new(),
            shots: Vec::new(),
            blasts: Vec::new(),
            cross_x: FIELD_W / 2.0,
            cross_y: FIELD_H / 2.0,
            ammo: START_AMMO,
            wave: 1,
            to_spawn: 0,
            spawn_timer: 0,
            intermission: None,
            score: 0,
            best: 0,
            paused: false,
            game_over: false,
            rng,
        };
        m.start_wave();
        m
    }

    fn start_wave(&mut self) {
        self.to_spawn = 5 + self.wave * 2;
        self.spawn_timer = 0;
    }

    fn spawn_delay(&self) -> u32 {
        90u32.saturating_sub(self.wave * 5).max(30)
    }

    fn missile_speed(&self) -> f32 {
        1.0 + self.wave as f32 * 0.1
    }

    fn cities_left(&self) -> usize {
        self.cities.iter().filter(|c| c.alive).count()
    }

    fn random_ground(&mut self) -> (f32, f32) {
        (self.rng.gen_range(0.0..FIELD_W), FIELD_H - 20.0)
    }

    fn pick_target(&mut self) -> (f32, f32) {
        let roll: f64 = self.rng.gen();
        let pool = if roll < 0.6 {
            &self.cities
        } else if roll < 0.9 {
            &self.batteries
        } else {
            return self.random_ground();
        };
        let alive: Vec<Site> = pool.iter().filter(|s| s.alive).copied().collect();
        match alive.choose(&mut self.rng) {
            Some(s) => (s.x, s.y),
            None => self.random_ground(),
        }
    }

    fn spawn_enemy(&mut self) {
        let sx = self.rng.gen_range(0.0..FIELD_W);
        let (tx, ty) = self.pick_target();
        let speed = self.missile_speed();
        self.enemies.push(Missile::aimed(sx, 0.0, tx, ty, speed));
        self.to_spawn -= 1;
    }

    fn fire(&mut self) {
        if self.ammo == 0 || self.intermission.is_some() {
            return;
        }
        let (tx, ty) = (self.cross_x, self.cross_y);
        let Some(b) = self
            .batteries
            .iter()
            .filter(|b| b.alive)
            .min_by(|a, b| dist(a.x, a.y, tx, ty).total_cmp(&dist(b.x, b.y, tx, ty)))
            .copied()
        else {
            return;
        };
        self.shots.push(Missile::aimed(b.x, b.y, tx, ty, SHOT_SPEED));
        self.ammo -= 1;
    }

    fn impact(&mut self, x: f32, y: f32) {
        self.blasts.push(Blast::new(x, y, IMPACT_RADIUS));
        for site in self.cities.iter_mut().chain(self.batteries.iter_mut()) {
            if site.alive && (site.x - x).abs() < IMPACT_REACH {
                site.alive = false;
            }
        }
    }

    fn step(&mut self, dt_ms: u64) {
        if let Some((left, bonus)) = self.intermission {
            if left > dt_ms {
                self.intermission = Some((left - dt_ms, bonus));
            } else {
                self.intermission = None;
                self.start_wave();
            }
            return;
        }

        if self.to_spawn > 0 {
            self.spawn_timer += 1;
            if self.spawn_timer >= self.spawn_delay() {
                self.spawn_enemy();
                self.spawn_timer = 0;
            }
        }

        let mut detonated = Vec::new();
        self.shots.retain_mut(|m| {
            m.advance(SHOT_TRAIL);
            if dist(m.x, m.y, m.tx, m.ty) < DETONATE_WITHIN {
                detonated.push((m.x, m.y));
                return false;
            }
            true
        });
        for (x, y) in detonated {
            self.blasts.push(Blast::new(x, y, BLAST_RADIUS));
        }

        let mut landed = Vec::new();
        self.enemies.retain_mut(|m| {
            m.advance(ENEMY_TRAIL);
            if m.y >= GROUND_Y {
                landed.push((m.x, m.y));
                return false;
            }
            true
        });
        for (x, y) in landed {
            self.impact(x, y);
        }

        let mut i = 0;
        while i < self.blasts.len() {
            let b = &mut self.blasts[i];
            if b.growing {
                b.radius += GROW;
                if b.radius >= b.max {
                    b.growing = false;
                }
            } else {
                b.radius -= SHRINK;
                if b.radius <= 0.0 {
                    self.blasts.remove(i);
                    continue;
                }
            }
            let b = *b;
            let mut chained = Vec::new();
            self.enemies.retain(|m| {
                if dist(m.x, m.y, b.x, b.y) < b.radius {
                    chained.push((m.x, m.y));
                    return false;
                }
                true
            });
            for (x, y) in chained {
                self.score += KILL_POINTS;
                self.blasts.push(Blast::new(x, y, CHAIN_RADIUS));
            }
            i += 1;
        }

        if self.cities_left() == 0 {
            self.game_over = true;
            debug!(score = self.score, wave = self.wave, "missile command lost the last city");
            return;
        }

        if self.to_spawn == 0 && self.enemies.is_empty() && self.blasts.is_empty() {
            let batteries = self.batteries.iter().filter(|b| b.alive).count() as u32;
            let bonus = self.cities_left() as u32 * CITY_BONUS + batteries * BATTERY_BONUS;
            self.score += bonus;
            self.ammo += WAVE_AMMO;
            self.wave += 1;
            self.intermission = Some((INTERMISSION_MS, bonus));
            debug!(wave = self.wave, bonus, "missile command wave survived");
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Black);
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);

        c.rect(&scale, 0.0, FIELD_H - 20.0, FIELD_W, 20.0, '▀', Color::Rgb(139, 69, 19));
        for city in &self.cities {
            let (glyph, color) = if city.alive { ('▙', Color::Rgb(0, 170, 255)) } else { ('▁', Color::DarkGray) };
            c.rect(&scale, city.x - 15.0, city.y - 10.0, 30.0, 30.0, glyph, color);
        }
        for b in &self.batteries {
            let color = if b.alive { Color::Green } else { Color::DarkGray };
            c.dot(&scale, b.x, b.y, '▲', color);
        }

        for m in &self.enemies {
            let mut prev = m.trail.first().copied().unwrap_or((m.x, m.y));
            for &p in m.trail.iter().chain(std::iter::once(&(m.x, m.y))) {
                c.braille_line(&scale, prev, p, Color::Rgb(255, 60, 60));
                prev = p;
            }
        }
        for m in &self.shots {
            if let Some(&start) = m.trail.first() {
                c.braille_line(&scale, start, (m.x, m.y), Color::Rgb(0, 255, 255));
            }
            c.dot(&scale, m.tx, m.ty, '×', Color::Rgb(0, 150, 150));
        }
        for b in &self.blasts {
            let ring: Vec<(f32, f32)> = (0..16)
                .map(|i| {
                    let a = i as f32 / 16.0 * std::f32::consts::TAU;
                    (b.x + a.cos() * b.radius, b.y + a.sin() * b.radius)
                })
                .collect();
            let color = if b.growing { Color::Rgb(255, 200, 0) } else { Color::Rgb(255, 100, 0) };
            c.braille_polygon(&scale, &ring, color);
        }

        c.dot(&scale, self.cross_x, self.cross_y, '✛', Color::White);
        c
    }
}

impl Game for MissileCommand {
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
            KeyCode::Left => self.cross_x = (self.cross_x - CROSSHAIR_STEP).max(0.0),
            KeyCode::Right => self.cross_x = (self.cross_x + CROSSHAIR_STEP).min(FIELD_W),
            KeyCode::Up => self.cross_y = (self.cross_y - CROSSHAIR_STEP).max(0.0),
            KeyCode::Down => self.cross_y = (self.cross_y + CROSSHAIR_STEP).min(GROUND_Y),
            KeyCode::Char(' ') | KeyCode::Enter => self.fire(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🎯 Missile Command", Color::Rgb(255, 160, 60));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Ammo: {}", self.ammo), Color::Cyan),
            (format!("Cities: {}", self.cities_left()), Color::Rgb(0, 170, 255)),
            (format!("Wave: {}", self.wave), Color::Green),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🎯", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("All cities lost on wave {}! Score: {}", self.wave, self.score))
        } else if self.paused {
            canvas::paused_line()
        } else if let Some((_, bonus)) = self.intermission {
            canvas::won_line(&format!("Wave {} complete! Bonus: {}", self.wave - 1, bonus))
        } else {
            canvas::help_line(&[("↑↓←→", "Aim"), ("SPACE", "Fire"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = MissileCommand::with_rng(rng);
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
    fn test_wave_size_and_pacing() {
        let mut m = MissileCommand::with_seed(1);
        assert_eq!(m.to_spawn, 7);
        assert_eq!(m.spawn_delay(), 85);
        for _ in 0..84 {
            m.step(16);
        }
        assert!(m.enemies.is_empty());
        m.step(16);
        assert_eq!(m.enemies.len(), 1);
        assert_eq!(m.to_spawn, 6);
        m.wave = 20;
        assert_eq!(m.spawn_delay(), 30);
    }

    #[test]
    fn test_closest_battery_fires() {
        let mut m = MissileCommand::with_seed(2);
        m.cross_x = 120.0;
        m.cross_y = 300.0;
        m.fire();
        assert_eq!(m.shots[0].x, 100.0);
        assert_eq!(m.ammo, START_AMMO - 1);
        m.batteries[0].alive = false;
        m.fire();
        assert_eq!(m.shots[1].x, FIELD_W / 2.0);
    }

    #[test]
    fn test_no_ammo_no_shot() {
        let mut m = MissileCommand::with_seed(3);
        m.ammo = 0;
        m.fire();
        assert!(m.shots.is_empty());
    }

    #[test]
    fn test_shot_detonates_and_destroys_missile() {
        let mut m = MissileCommand::with_seed(4);
        m.to_spawn = 0;
        m.shots.push(Missile::aimed(400.0, 300.0, 400.0, 296.0, SHOT_SPEED));
        m.enemies.push(Missile::aimed(420.0, 300.0, 420.0, GROUND_Y, 0.0));
        m.step(16);
        assert_eq!(m.blasts.len(), 1);
        for _ in 0..10 {
            m.step(16);
        }
        assert!(m.enemies.is_empty());
        assert_eq!(m.score, KILL_POINTS);
        assert!(m.blasts.len() >= 2);
    }

    #[test]
    fn test_ground_impact_destroys_nearby_sites() {
        let mut m = MissileCommand::with_seed(5);
        m.impact(120.0, GROUND_Y);
        assert!(!m.cities[0].alive);
        assert!(!m.batteries[0].alive);
        assert!(m.cities[1].alive);
    }

    #[test]
    fn test_wave_end_bonus_and_reload() {
        let mut m = MissileCommand::with_seed(6);
        m.to_spawn = 0;
        m.cities[0].alive = false;
        m.step(16);
        assert_eq!(m.score, 5 * CITY_BONUS + 3 * BATTERY_BONUS);
        assert_eq!(m.ammo, START_AMMO + WAVE_AMMO);
        assert_eq!(m.wave, 2);
        m.step(INTERMISSION_MS);
        assert_eq!(m.to_spawn, 9);
    }

    #[test]
    fn test_losing_all_cities_ends() {
        let mut m = MissileCommand::with_seed(7);
        for c in &mut m.cities {
            c.alive = false;
        }
        m.step(16);
        assert!(m.is_game_over());
    }
}
