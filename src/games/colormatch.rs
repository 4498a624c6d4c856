use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::gems::{self, Grid, Picker};
use crate::games::particles::Particles;
use crate::games::Game;

const START_MOVES: u32 = 30;
const CELL_POINTS: u32 = 10;
const LEVEL_POINTS: u32 = 500;
const LEVEL_BONUS_MOVES: u32 = 10;

const COLORS: [Color; 6] = [
    Color::Rgb(239, 68, 68),
    Color::Rgb(245, 158, 11),
    Color::Rgb(16, 185, 129),
    Color::Rgb(59, 130, 246),
    Color::Rgb(139, 92, 246),
    Color::Rgb(236, 72, 153),
];

pub struct ColorMatch {
    grid: Grid,
    picker: Picker,
    score: u32,
    best: u32,
    moves: u32,
    level: u32,
    /// Particles live in board cell units
    particles: Particles,
    rng: StdRng,
}

impl ColorMatch {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        Self {
            grid: gems::random_grid(&mut rng),
            picker: Picker::default(),
            score: 0,
            best: 0,
            moves: START_MOVES,
            level: 1,
            particles: Particles::default(),
            rng,
        }
    }

    fn try_swap(&mut self, a: (usize, usize), b: (usize, usize)) -> bool {
        if self.moves == 0 {
            return false;
        }
        gems::swap(&mut self.grid, a, b);
        if gems::find_runs(&self.grid).is_empty() {
            gems::swap(&mut self.grid, a, b);
            return false;
        }
        self.moves -= 1;
        self.cascade();

        if self.score >= self.level * LEVEL_POINTS {
            self.level += 1;
            self.moves += LEVEL_BONUS_MOVES;
            debug!(level = self.level, score = self.score, "color match level up");
        }
        true
    }

    fn cascade(&mut self) {
        loop {
            let runs = gems::find_runs(&self.grid);
            if runs.is_empty() {
                break;
            }
            for &(r, c) in runs.iter().flatten() {
                if let Some(g) = self.grid[r][c] {
                    let color = COLORS[g as usize];
                    self.particles.burst(&mut self.rng, c as f32 + 0.5, r as f32 + 0.5, color, 4, 0.15, 20);
                }
            }
            let cleared = gems::clear_runs(&mut self.grid, &runs);
            self.score += cleared as u32 * CELL_POINTS;
            gems::collapse(&mut self.grid);
            gems::refill(&mut self.grid, &mut self.rng);
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(31, 41, 55));
        gems::draw_grid(&mut c, &self.grid, &self.picker, &COLORS, '█');
        let fit = GridFit::new(gems::SIZE, gems::SIZE, width, height);
        for p in &self.particles.list {
            let x = fit.ox + (p.x * fit.cw as f32) as i32;
            let y = fit.oy + (p.y * fit.ch as f32) as i32;
            c.put(x, y, '•', p.color);
        }
        c
    }
}

impl Game for ColorMatch {
    fn update(&mut self, _dt_ms: u64) {
        self.particles.update(0.0);
    }

    fn handle_input(&mut self, key: KeyEvent) {
        let swap = match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.reset();
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.moves == 0 => {
                self.reset();
                None
            }
            _ if self.moves == 0 => None,
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.picker.toggle();
                None
            }
            KeyCode::Up => self.picker.arrow(-1, 0),
            KeyCode::Down => self.picker.arrow(1, 0),
            KeyCode::Left => self.picker.arrow(0, -1),
            KeyCode::Right => self.picker.arrow(0, 1),
            _ => None,
        };
        if let Some((a, b)) = swap {
            self.try_swap(a, b);
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🎨 Color Match", Color::Rgb(255, 120, 200));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Level: {}", self.level), Color::Green),
            (format!("Moves: {}", self.moves), Color::Cyan),
            (format!("Next: {}", self.level * LEVEL_POINTS), Color::Gray),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🎨", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.moves == 0 {
            canvas::game_over_line(&format!("GAME OVER! Final Score: {}", self.score))
        } else {
            canvas::help_line(&[("↑↓←→", "Cursor"), ("ENTER", "Pick, then arrow to swap"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = ColorMatch::with_rng(rng);
        self.best = best;
    }

    fn get_score(&self) -> u32 {
        self.score
    }

    fn is_game_over(&self) -> bool {
        self.moves == 0
    }

    fn set_best(&mut self, best: u32) {
        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged() -> ColorMatch {
        let mut g = ColorMatch::with_seed(1);
        for (r, row) in g.grid.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = Some(((r + c) % 2 + 2 * (r % 2)) as u8);
            }
        }
        g.grid[0][0] = Some(5);
        g.grid[0][1] = Some(5);
        g.grid[1][2] = Some(5);
        g
    }

    #[test]
    fn test_clear_scores_per_cell_and_bursts() {
        let mut g = staged();
        assert!(g.try_swap((0, 2), (1, 2)));
        assert!(g.score >= 3 * CELL_POINTS);
        assert_eq!(g.score % CELL_POINTS, 0);
        assert!(!g.particles.list.is_empty());
        assert_eq!(g.moves, START_MOVES - 1);
    }

    #[test]
    fn test_no_match_reverts() {
        let mut g = staged();
        assert!(!g.try_swap((5, 5), (5, 6)));
        assert_eq!(g.moves, START_MOVES);
    }

    #[test]
    fn test_level_up_grants_moves() {
        let mut g = staged();
        g.score = LEVEL_POINTS - 10;
        g.try_swap((0, 2), (1, 2));
        assert_eq!(g.level, 2);
        assert_eq!(g.moves, START_MOVES - 1 + LEVEL_BONUS_MOVES);
    }

    #[test]
    fn test_out_of_moves_ends() {
        let mut g = staged();
        g.moves = 1;
        g.try_swap((0, 2), (1, 2));
        assert!(g.is_game_over());
        assert!(!g.try_swap((3, 3), (3, 4)));
    }
}
