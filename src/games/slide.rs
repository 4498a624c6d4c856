use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const DEFAULT_SIZE: usize = 4;

/// Sliding puzzle. `tiles[y][x]` holds 1..size² − 1, with 0 for the blank.
pub struct Slide {
    size: usize,
    tiles: Vec<Vec<u32>>,
    blank: (usize, usize),
    moves: u32,
    elapsed_ms: u64,
    started: bool,
    solved: bool,
    rng: StdRng,
}

impl Slide {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy(), DEFAULT_SIZE)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), DEFAULT_SIZE)
    }

    fn with_rng(rng: StdRng, size: usize) -> Self {
        let mut s = Self {
            size,
            tiles: Self::ordered(size),
            blank: (size - 1, size - 1),
            moves: 0,
            elapsed_ms: 0,
            started: false,
            solved: false,
            rng,
        };
        s.shuffle();
        s
    }

    fn ordered(size: usize) -> Vec<Vec<u32>> {
        (0..size)
            .map(|y| (0..size).map(|x| ((y * size + x + 1) % (size * size)) as u32).collect())
            .collect()
    }

    /// Random walk of the blank from the solved state, so the result is
    /// always solvable
    fn shuffle(&mut self) {
        loop {
            for _ in 0..self.size * self.size * 50 {
                let options = self.neighbours_of_blank();
                if let Some(&(x, y)) = options.choose(&mut self.rng) {
                    self.swap_with_blank(x, y);
                }
            }
            if !self.is_ordered() {
                break;
            }
        }
    }

    fn neighbours_of_blank(&self) -> Vec<(usize, usize)> {
        let (bx, by) = self.blank;
        let mut out = Vec::with_capacity(4);
        if bx > 0 {
            out.push((bx - 1, by));
        }
        if bx + 1 < self.size {
            out.push((bx + 1, by));
        }
        if by > 0 {
            out.push((bx, by - 1));
        }
        if by + 1 < self.size {
            out.push((bx, by + 1));
        }
        out
    }

    fn swap_with_blank(&mut self, x: usize, y: usize) {
        let (bx, by) = self.blank;
        self.tiles[by][bx] = self.tiles[y][x];
        self.tiles[y][x] = 0;
        self.blank = (x, y);
    }

    fn is_ordered(&self) -> bool {
        self.tiles == Self::ordered(self.size)
    }

    /// Moves the tile that sits opposite `(dx, dy)` from the blank into it,
    /// so the tile travels in the pressed direction.
    fn slide(&mut self, dx: i32, dy: i32) -> bool {
        if self.solved {
            return false;
        }
        let x = self.blank.0 as i32 - dx;
        let y = self.blank.1 as i32 - dy;
        if x < 0 || y < 0 || x as usize >= self.size || y as usize >= self.size {
            return false;
        }
        self.swap_with_blank(x as usize, y as usize);
        self.started = true;
        self.moves += 1;
        if self.is_ordered() {
            self.solved = true;
            debug!(moves = self.moves, secs = self.elapsed_ms / 1000, size = self.size, "slide puzzle solved");
        }
        true
    }

    fn resize(&mut self, size: usize) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Slide::with_rng(rng, size);
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(26, 26, 26));
        let fit = GridFit::new(self.size, self.size, width, height);

        for y in 0..self.size {
            for x in 0..self.size {
                let tile = self.tiles[y][x];
                if tile == 0 {
                    continue;
                }
                let (cx, cy) = fit.origin(x, y);
                let home = (tile as usize - 1) == y * self.size + x;
                let bg = if home { Color::Rgb(74, 144, 226) } else { Color::Rgb(53, 122, 189) };
                c.block(cx, cy, fit.cw - 1, fit.ch, bg);
                let label = tile.to_string();
                let lx = cx + (fit.cw - 1 - label.len() as i32) / 2;
                let style = Style::default().fg(Color::White).bg(bg).add_modifier(Modifier::BOLD);
                c.text(lx, cy + fit.ch / 2, &label, style);
            }
        }
        c
    }
}

impl Game for Slide {
    fn update(&mut self, dt_ms: u64) {
        if self.started && !self.solved {
            self.elapsed_ms += dt_ms;
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('3') => self.resize(3),
            KeyCode::Char('4') => self.resize(4),
            KeyCode::Char('5') => self.resize(5),
            KeyCode::Enter | KeyCode::Char(' ') if self.solved => self.reset(),
            KeyCode::Up => {
                self.slide(0, -1);
            }
            KeyCode::Down => {
                self.slide(0, 1);
            }
            KeyCode::Left => {
                self.slide(-1, 0);
            }
            KeyCode::Right => {
                self.slide(1, 0);
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🧩 Slide Puzzle", Color::Rgb(160, 200, 160));

        let parts = vec![
            (format!("{0}×{0}", self.size), Color::Cyan),
            (format!("Moves: {}", self.moves), Color::Yellow),
            (format!("Time: {}s", self.elapsed_ms / 1000), Color::Green),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🧩", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.solved {
            canvas::won_line(&format!("Solved! Moves: {}, Time: {}s", self.moves, self.elapsed_ms / 1000))
        } else {
            canvas::help_line(&[("↑↓←→", "Slide"), ("3 4 5", "Size"), ("R", "Shuffle")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        self.resize(self.size);
    }

    fn get_score(&self) -> u32 {
        self.moves
    }

    fn is_game_over(&self) -> bool {
        self.solved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parity_solvable(s: &Slide) -> bool {
        let flat: Vec<u32> = s.tiles.iter().flatten().copied().filter(|&t| t != 0).collect();
        let inversions = (0..flat.len())
            .flat_map(|i| (i + 1..flat.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| flat[i] > flat[j])
            .count();
        if s.size % 2 == 1 {
            inversions % 2 == 0
        } else {
            let blank_row_from_bottom = s.size - s.blank.1;
            (inversions + blank_row_from_bottom) % 2 == 1
        }
    }

    #[test]
    fn test_shuffle_is_solvable_and_unsolved() {
        for size in 3..=5 {
            let s = Slide::with_rng(StdRng::seed_from_u64(size as u64), size);
            assert!(!s.is_ordered());
            assert!(parity_solvable(&s));
            assert_eq!(s.tiles[s.blank.1][s.blank.0], 0);
        }
    }

    #[test]
    fn test_slide_moves_tile_into_blank() {
        let mut s = Slide::with_seed(1);
        s.tiles = Slide::ordered(4);
        s.blank = (3, 3);
        // Right arrow: the tile left of the blank moves right
        assert!(s.slide(1, 0));
        assert_eq!(s.blank, (2, 3));
        assert_eq!(s.tiles[3][3], 15);
        assert_eq!(s.moves, 1);
        // Up needs a tile below the blank
        assert!(!s.slide(0, -1));
    }

    #[test]
    fn test_timer_starts_on_first_move() {
        let mut s = Slide::with_seed(2);
        s.update(500);
        assert_eq!(s.elapsed_ms, 0);
        let moved = [(1, 0), (-1, 0), (0, 1), (0, -1)].iter().any(|&(dx, dy)| s.slide(dx, dy));
        assert!(moved);
        s.update(500);
        assert_eq!(s.elapsed_ms, 500);
    }

    #[test]
    fn test_solving_wins() {
        let mut s = Slide::with_seed(3);
        s.tiles = Slide::ordered(4);
        s.blank = (3, 3);
        s.slide(1, 0);
        s.slide(-1, 0);
        assert!(s.is_game_over());
        assert_eq!(s.get_score(), 2);
        assert!(!s.slide(1, 0));
    }

    #[test]
    fn test_resize() {
        let mut s = Slide::with_seed(4);
        s.resize(3);
        assert_eq!(s.size, 3);
        assert_eq!(s.tiles.len(), 3);
        assert_eq!(s.moves, 0);
    }
}
