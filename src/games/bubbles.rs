use std::collections::VecDeque;
use std::f32::consts::PI;

use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, Scale};
use crate::games::geom::dist;
use crate::games::Game;

const RADIUS: f32 = 20.0;
const COLS: usize = 14;
const ROWS: usize = 14;
const START_ROWS: usize = 8;
const FILL_CHANCE: f64 = 0.8;
const ROW_HEIGHT: f32 = RADIUS * 1.75;
const FIELD_W: f32 = COLS as f32 * RADIUS * 2.0;
const FIELD_H: f32 = 600.0;
const SHOOTER_X: f32 = FIELD_W / 2.0;
const SHOOTER_Y: f32 = FIELD_H - 50.0;
const SHOT_SPEED: f32 = 10.0;
const AIM_STEP: f32 = 0.08;
const AIM_MIN: f32 = -PI + 0.15;
const AIM_MAX: f32 = -0.15;
const MIN_GROUP: usize = 3;
const POP_POINTS: u32 = 10;
const PALETTE: [Color; 6] = [
    Color::Rgb(255, 0, 0),
    Color::Rgb(0, 255, 0),
    Color::Rgb(0, 90, 255),
    Color::Rgb(255, 255, 0),
    Color::Rgb(255, 0, 255),
    Color::Rgb(0, 255, 255),
];

type Grid = Vec<Vec<Option<usize>>>;

fn row_cols(row: usize) -> usize {
    if row % 2 == 0 {
        COLS
    } else {
        COLS - 1
    }
}

/// Odd rows sit half a bubble to the right
fn slot_pos(row: usize, col: usize) -> (f32, f32) {
    let offset = if row % 2 == 0 { RADIUS } else { RADIUS * 2.0 };
    (offset + col as f32 * RADIUS * 2.0, RADIUS + row as f32 * ROW_HEIGHT)
}

fn adjacent(row: usize, col: usize) -> Vec<(usize, usize)> {
    let offsets: [(i32, i32); 6] = if row % 2 == 0 {
        [(-1, -1), (-1, 0), (0, -1), (0, 1), (1, -1), (1, 0)]
    } else {
        [(-1, 0), (-1, 1), (0, -1), (0, 1), (1, 0), (1, 1)]
    };
    offsets
        .iter()
        .filter_map(|&(dr, dc)| {
            let r = row as i32 + dr;
            let c = col as i32 + dc;
            if r < 0 || r >= ROWS as i32 || c < 0 || c >= row_cols(r as usize) as i32 {
                return None;
            }
            Some((r as usize, c as usize))
        })
        .collect()
}

#[derive(Clone, Copy, Debug)]
struct Shot {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    color: usize,
}

pub struct Bubbles {
    grid: Grid,
    shot: Option<Shot>,
    current: usize,
    next: usize,
    angle: f32,
    score: u32,
    best: u32,
    level: u32,
    paused: bool,
    game_over: bool,
    rng: StdRng,
}

impl Bubbles {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let grid = Self::fresh_grid(&mut rng);
        let current = rng.gen_range(0..PALETTE.len());
        let next = rng.gen_range(0..PALETTE.len());
        Self {
            grid,
            shot: None,
            current,
            next,
            angle: -PI / 2.0,
            score: 0,
            best: 0,
            level: 1,
            paused: false,
            game_over: false,
            rng,
        }
    }

    fn fresh_grid(rng: &mut StdRng) -> Grid {
        (0..ROWS)
            .map(|row| {
                (0..row_cols(row))
                    .map(|_| {
                        if row < START_ROWS && rng.gen_bool(FILL_CHANCE) {
                            Some(rng.gen_range(0..PALETTE.len()))
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn shoot(&mut self) {
        if self.shot.is_some() {
            return;
        }
        self.shot = Some(Shot {
            x: SHOOTER_X,
            y: SHOOTER_Y,
            vx: self.angle.cos() * SHOT_SPEED,
            vy: self.angle.sin() * SHOT_SPEED,
            color: self.current,
        });
        self.current = self.next;
        self.next = self.rng.gen_range(0..PALETTE.len());
    }

    fn aim(&mut self, delta: f32) {
        self.angle = (self.angle + delta).clamp(AIM_MIN, AIM_MAX);
    }

    fn closest_free_slot(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), f32)> = None;
        for (row, cells) in self.grid.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if cell.is_some() {
                    continue;
                }
                let (sx, sy) = slot_pos(row, col);
                let d = dist(x, y, sx, sy);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some(((row, col), d));
                }
            }
        }
        best.map(|(slot, _)| slot)
    }

    fn touches_grid(&self, x: f32, y: f32) -> bool {
        self.grid.iter().enumerate().any(|(row, cells)| {
            cells.iter().enumerate().any(|(col, cell)| {
                let (sx, sy) = slot_pos(row, col);
                cell.is_some() && dist(x, y, sx, sy) < RADIUS * 2.0
            })
        })
    }

    fn same_color_group(&self, row: usize, col: usize, color: usize) -> Vec<(usize, usize)> {
        let mut seen = vec![vec![false; COLS]; ROWS];
        let mut group = Vec::new();
        let mut queue = VecDeque::from([(row, col)]);
        while let Some((r, c)) = queue.pop_front() {
            if seen[r][c] {
                continue;
            }
            seen[r][c] = true;
            if self.grid[r][c] == Some(color) {
                group.push((r, c));
                queue.extend(adjacent(r, c));
            }
        }
        group
    }

    /// Clears every bubble with no path to the ceiling, returning how many fell
    fn drop_floating(&mut self) -> u32 {
        let mut anchored = vec![vec![false; COLS]; ROWS];
        let mut queue: VecDeque<(usize, usize)> =
            (0..row_cols(0)).filter(|&c| self.grid[0][c].is_some()).map(|c| (0, c)).collect();
        while let Some((r, c)) = queue.pop_front() {
            if anchored[r][c] {
                continue;
            }
            anchored[r][c] = true;
            queue.extend(adjacent(r, c).into_iter().filter(|&(nr, nc)| self.grid[nr][nc].is_some()));
        }
        let mut fell = 0;
        for (r, cells) in self.grid.iter_mut().enumerate() {
            for (c, cell) in cells.iter_mut().enumerate() {
                if cell.is_some() && !anchored[r][c] {
                    *cell = None;
                    fell += 1;
                }
            }
        }
        fell
    }

    fn settle(&mut self, row: usize, col: usize, color: usize) {
        self.grid[row][col] = Some(color);
        let group = self.same_color_group(row, col, color);
        if group.len() >= MIN_GROUP {
            for &(r, c) in &group {
                self.grid[r][c] = None;
            }
            let fell = self.drop_floating();
            self.score += (group.len() as u32 + fell) * POP_POINTS;
            debug!(popped = group.len(), fell, score = self.score, "bubbles popped");
        }

        if self.grid.iter().all(|cells| cells.iter().all(Option::is_none)) {
            self.level += 1;
            self.grid = Self::fresh_grid(&mut self.rng);
            debug!(level = self.level, "bubbles grid cleared");
        }

        if self.grid[ROWS - 1].iter().any(Option::is_some) {
            self.game_over = true;
            debug!(score = self.score, "bubbles reached the bottom row");
        }
    }

    fn place(&mut self, x: f32, y: f32, color: usize) {
        match self.closest_free_slot(x, y) {
            Some((row, col)) => self.settle(row, col, color),
            None => self.game_over = true,
        }
    }

    fn step(&mut self) {
        let Some(mut s) = self.shot else {
            return;
        };
        s.x += s.vx;
        s.y += s.vy;
        if s.x - RADIUS < 0.0 {
            s.x = RADIUS;
            s.vx = s.vx.abs();
        } else if s.x + RADIUS > FIELD_W {
            s.x = FIELD_W - RADIUS;
            s.vx = -s.vx.abs();
        }

        if s.y - RADIUS <= 0.0 || self.touches_grid(s.x, s.y) {
            self.shot = None;
            self.place(s.x, s.y, s.color);
        } else {
            self.shot = Some(s);
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(26, 26, 46));
        let scale = Scale::new(FIELD_W, FIELD_H, width, height);
        let half = RADIUS * 0.7;

        for (row, cells) in self.grid.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if let Some(color) = cell {
                    let (x, y) = slot_pos(row, col);
                    c.rect(&scale, x - half, y - half, half * 2.0, half * 2.0, '●', PALETTE[*color]);
                }
            }
        }
        let (_, deadline) = slot_pos(ROWS - 1, 0);
        c.braille_line(&scale, (0.0, deadline + RADIUS), (FIELD_W, deadline + RADIUS), Color::Rgb(90, 40, 40));

        if let Some(s) = &self.shot {
            c.rect(&scale, s.x - half, s.y - half, half * 2.0, half * 2.0, '●', PALETTE[s.color]);
        }

        let tip = (SHOOTER_X + self.angle.cos() * 100.0, SHOOTER_Y + self.angle.sin() * 100.0);
        c.braille_line(&scale, (SHOOTER_X, SHOOTER_Y), tip, Color::White);
        c.dot(&scale, SHOOTER_X, SHOOTER_Y, '●', PALETTE[self.current]);
        c
    }
}

impl Game for Bubbles {
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
            KeyCode::Left => self.aim(-AIM_STEP),
            KeyCode::Right => self.aim(AIM_STEP),
            KeyCode::Char(' ') | KeyCode::Up => self.shoot(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🫧 Bubbles", Color::Rgb(255, 120, 200));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Level: {}", self.level), Color::Green),
            ("Next: ●".to_string(), PALETTE[self.next]),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🫧", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("The bubbles reached you! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("←→", "Aim"), ("SPACE", "Shoot"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Bubbles::with_rng(rng);
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

    fn empty() -> Bubbles {
        let mut b = Bubbles::with_seed(1);
        for cells in &mut b.grid {
            cells.iter_mut().for_each(|c| *c = None);
        }
        b
    }

    #[test]
    fn test_starting_grid() {
        let b = Bubbles::with_seed(9);
        assert_eq!(b.grid.len(), ROWS);
        assert_eq!(b.grid[0].len(), 14);
        assert_eq!(b.grid[1].len(), 13);
        assert!(b.grid[..START_ROWS].iter().flatten().any(Option::is_some));
        assert!(b.grid[START_ROWS..].iter().flatten().all(Option::is_none));
    }

    #[test]
    fn test_odd_row_neighbors_lean_right() {
        let n = adjacent(1, 0);
        assert!(n.contains(&(0, 0)));
        assert!(n.contains(&(0, 1)));
        assert!(n.contains(&(2, 1)));
        let n = adjacent(0, 0);
        assert_eq!(n.len(), 2);
    }

    #[test]
    fn test_group_of_three_pops_and_orphans_fall() {
        let mut b = empty();
        b.grid[0][0] = Some(0);
        b.grid[0][1] = Some(0);
        b.grid[1][0] = Some(1);
        b.grid[0][5] = Some(2);
        b.settle(0, 2, 0);
        assert_eq!(b.score, 4 * POP_POINTS);
        assert!(b.grid[1][0].is_none());
        assert_eq!(b.grid[0][5], Some(2));
        assert_eq!(b.level, 1);
    }

    #[test]
    fn test_pair_does_not_pop() {
        let mut b = empty();
        b.grid[0][0] = Some(3);
        b.settle(0, 1, 3);
        assert_eq!(b.score, 0);
        assert_eq!(b.grid[0][1], Some(3));
    }

    #[test]
    fn test_snaps_to_free_slot() {
        let mut b = empty();
        b.grid[0][0] = Some(4);
        let (x, y) = slot_pos(0, 0);
        b.place(x, y, 1);
        assert_eq!(b.grid[0][0], Some(4));
        assert_eq!(b.grid.iter().flatten().filter(|c| c.is_some()).count(), 2);
    }

    #[test]
    fn test_clearing_grid_advances_level() {
        let mut b = empty();
        b.grid[0][0] = Some(0);
        b.grid[0][1] = Some(0);
        b.settle(0, 2, 0);
        assert_eq!(b.level, 2);
        assert!(b.grid[..START_ROWS].iter().flatten().any(Option::is_some));
    }

    #[test]
    fn test_shot_bounces_off_wall() {
        let mut b = empty();
        b.grid[0][7] = Some(0);
        b.shot = Some(Shot { x: RADIUS + 2.0, y: 400.0, vx: -5.0, vy: -5.0, color: 1 });
        b.step();
        assert!(b.shot.map_or(false, |s| s.vx > 0.0));
    }

    #[test]
    fn test_aim_is_clamped_upwards() {
        let mut b = Bubbles::with_seed(2);
        for _ in 0..100 {
            b.aim(-AIM_STEP);
        }
        assert_eq!(b.angle, AIM_MIN);
        b.shoot();
        assert!(b.shot.map_or(false, |s| s.vy < 0.0));
    }

    #[test]
    fn test_last_row_ends_game() {
        let mut b = empty();
        b.grid[0][0] = Some(2);
        b.settle(ROWS - 1, 3, 1);
        assert!(b.is_game_over());
    }
}
