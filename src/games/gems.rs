//! 8×8 swap-to-match grid shared by Match 3 and Color Match.

use rand::Rng;
use ratatui::prelude::*;

use crate::games::canvas::{Canvas, GridFit};

pub const SIZE: usize = 8;
pub const KINDS: u8 = 6;

/// `grid[row][col]`, `None` while a cleared cell waits for refill
pub type Grid = [[Option<u8>; SIZE]; SIZE];

pub fn random_grid<R: Rng>(rng: &mut R) -> Grid {
    let mut grid = [[None; SIZE]; SIZE];
    loop {
        for cell in grid.iter_mut().flatten() {
            *cell = Some(rng.gen_range(0..KINDS));
        }
        if find_runs(&grid).is_empty() {
            return grid;
        }
    }
}

/// Maximal horizontal and vertical runs of three or more, as (row, col) lists
pub fn find_runs(grid: &Grid) -> Vec<Vec<(usize, usize)>> {
    let mut runs = Vec::new();
    let mut scan = |cells: Vec<(usize, usize)>| {
        let mut start = 0;
        for i in 1..=cells.len() {
            let same = i < cells.len() && {
                let (r0, c0) = cells[start];
                let (r1, c1) = cells[i];
                grid[r0][c0].is_some() && grid[r0][c0] == grid[r1][c1]
            };
            if !same {
                if i - start >= 3 {
                    runs.push(cells[start..i].to_vec());
                }
                start = i;
            }
        }
    };
    for r in 0..SIZE {
        scan((0..SIZE).map(|c| (r, c)).collect());
    }
    for c in 0..SIZE {
        scan((0..SIZE).map(|r| (r, c)).collect());
    }
    runs
}

/// Empties every cell of every run; returns how many distinct cells cleared
pub fn clear_runs(grid: &mut Grid, runs: &[Vec<(usize, usize)>]) -> usize {
    let mut cleared = 0;
    for &(r, c) in runs.iter().flatten() {
        if grid[r][c].take().is_some() {
            cleared += 1;
        }
    }
    cleared
}

/// Drops gems down into the gaps below them
pub fn collapse(grid: &mut Grid) {
    for c in 0..SIZE {
        let mut write = SIZE;
        for r in (0..SIZE).rev() {
            if let Some(g) = grid[r][c] {
                write -= 1;
                grid[r][c] = None;
                grid[write][c] = Some(g);
            }
        }
    }
}

pub fn refill<R: Rng>(grid: &mut Grid, rng: &mut R) {
    for cell in grid.iter_mut().flatten().filter(|c| c.is_none()) {
        *cell = Some(rng.gen_range(0..KINDS));
    }
}

pub fn swap(grid: &mut Grid, a: (usize, usize), b: (usize, usize)) {
    let tmp = grid[a.0][a.1];
    grid[a.0][a.1] = grid[b.0][b.1];
    grid[b.0][b.1] = tmp;
}

/// Keyboard selection: Enter picks the gem under the cursor, then an
/// arrow names the neighbour to swap with.
#[derive(Clone, Copy, Debug, Default)]
pub struct Picker {
    pub cursor: (usize, usize),
    pub picked: bool,
}

impl Picker {
    /// Moves the cursor, or returns the swap pair when a gem is picked.
    pub fn arrow(&mut self, dr: i32, dc: i32) -> Option<((usize, usize), (usize, usize))> {
        let r = self.cursor.0 as i32 + dr;
        let c = self.cursor.1 as i32 + dc;
        if r < 0 || c < 0 || r >= SIZE as i32 || c >= SIZE as i32 {
            self.picked = false;
            return None;
        }
        let target = (r as usize, c as usize);
        if self.picked {
            self.picked = false;
            Some((self.cursor, target))
        } else {
            self.cursor = target;
            None
        }
    }

    pub fn toggle(&mut self) {
        self.picked = !self.picked;
    }
}

pub fn draw_grid(c: &mut Canvas, grid: &Grid, picker: &Picker, colors: &[Color], glyph: char) {
    let fit = GridFit::new(SIZE, SIZE, c.width(), c.height());
    for r in 0..SIZE {
        for col in 0..SIZE {
            let (x, y) = fit.origin(col, r);
            let w = (fit.cw - 1).max(1);
            let bg = Color::Rgb(51, 51, 51);
            c.block(x, y, w, fit.ch, bg);
            if let Some(g) = grid[r][col] {
                let style = Style::default().fg(colors[g as usize % colors.len()]).bg(bg).add_modifier(Modifier::BOLD);
                c.fill(x + w / 4, y, x + w - w / 4, y + fit.ch, glyph, style);
            }
            if picker.cursor == (r, col) {
                let mark = if picker.picked { '◆' } else { '▸' };
                c.put_styled(x, y + fit.ch / 2, mark, Style::default().fg(Color::White).bg(bg));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn striped() -> Grid {
        let mut g = [[None; SIZE]; SIZE];
        for (r, row) in g.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = Some(((r + c) % 2 + 2 * (r % 2)) as u8);
            }
        }
        g
    }

    #[test]
    fn test_generated_grid_has_no_runs() {
        let mut rng = StdRng::seed_from_u64(1);
        let g = random_grid(&mut rng);
        assert!(find_runs(&g).is_empty());
        assert!(g.iter().flatten().all(Option::is_some));
    }

    #[test]
    fn test_finds_maximal_runs() {
        let mut g = striped();
        assert!(find_runs(&g).is_empty());
        for c in 2..6 {
            g[3][c] = Some(5);
        }
        g[4][2] = Some(5);
        g[5][2] = Some(5);
        let runs = find_runs(&g);
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().any(|r| r.len() == 4));
        // The shared corner clears once
        assert_eq!(clear_runs(&mut g, &runs), 6);
    }

    #[test]
    fn test_collapse_drops_gems() {
        let mut g = striped();
        let above = g[2][0];
        g[3][0] = None;
        g[4][0] = None;
        collapse(&mut g);
        assert_eq!(g[4][0], above);
        assert!(g[0][0].is_none() && g[1][0].is_none());
        let mut rng = StdRng::seed_from_u64(2);
        refill(&mut g, &mut rng);
        assert!(g.iter().flatten().all(Option::is_some));
    }

    #[test]
    fn test_picker_swaps_with_neighbour() {
        let mut p = Picker::default();
        assert_eq!(p.arrow(0, 1), None);
        assert_eq!(p.cursor, (0, 1));
        p.toggle();
        assert_eq!(p.arrow(1, 0), Some(((0, 1), (1, 1))));
        assert!(!p.picked);
        p.toggle();
        assert_eq!(p.arrow(-1, 0), None);
        assert!(!p.picked);
    }
}
