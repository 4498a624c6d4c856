//! Slide-and-merge board used by the 2048-style games.

use rand::Rng;
use ratatui::prelude::*;

use crate::games::canvas::{Canvas, GridFit};

pub const SIZE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Decides whether two neighbouring tiles combine, and into what.
pub trait MergeRule {
    fn merge(&self, a: u32, b: u32) -> Option<u32>;
}

/// Equal values combine into their sum.
pub struct Doubling;

impl MergeRule for Doubling {
    fn merge(&self, a: u32, b: u32) -> Option<u32> {
        (a == b).then_some(a + b)
    }
}

pub const FIB: [u32; 19] = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610, 987, 1597, 2584, 4181];

/// Consecutive Fibonacci numbers combine into the next one; 1+1 gives 2.
pub struct Fibonacci;

impl MergeRule for Fibonacci {
    fn merge(&self, a: u32, b: u32) -> Option<u32> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if lo == 1 && hi == 1 {
            return Some(2);
        }
        FIB.windows(2)
            .skip(1)
            .any(|w| w[0] == lo && w[1] == hi)
            .then_some(lo + hi)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlideOutcome {
    pub moved: bool,
    pub gained: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    pub cells: [[u32; SIZE]; SIZE],
}

impl Board {
    /// Cells of line `i` ordered from the edge tiles slide toward
    fn line(dir: Dir, i: usize) -> [(usize, usize); SIZE] {
        let mut out = [(0, 0); SIZE];
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = match dir {
                Dir::Left => (i, k),
                Dir::Right => (i, SIZE - 1 - k),
                Dir::Up => (k, i),
                Dir::Down => (SIZE - 1 - k, i),
            };
        }
        out
    }

    pub fn slide(&mut self, dir: Dir, rule: &dyn MergeRule) -> SlideOutcome {
        let mut outcome = SlideOutcome::default();
        for i in 0..SIZE {
            let coords = Self::line(dir, i);
            let values: Vec<u32> = coords
                .iter()
                .map(|&(r, c)| self.cells[r][c])
                .filter(|&v| v != 0)
                .collect();

            let mut packed = Vec::with_capacity(SIZE);
            let mut k = 0;
            while k < values.len() {
                if k + 1 < values.len() {
                    if let Some(merged) = rule.merge(values[k], values[k + 1]) {
                        packed.push(merged);
                        outcome.gained += merged;
                        k += 2;
                        continue;
                    }
                }
                packed.push(values[k]);
                k += 1;
            }
            packed.resize(SIZE, 0);

            for (&(r, c), &v) in coords.iter().zip(packed.iter()) {
                if self.cells[r][c] != v {
                    outcome.moved = true;
                    self.cells[r][c] = v;
                }
            }
        }
        outcome
    }

    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for r in 0..SIZE {
            for c in 0..SIZE {
                if self.cells[r][c] == 0 {
                    out.push((r, c));
                }
            }
        }
        out
    }

    /// Place a value in a random empty cell. `choices` is (value, weight).
    pub fn spawn<R: Rng>(&mut self, rng: &mut R, choices: &[(u32, u32)]) -> bool {
        let empty = self.empty_cells();
        if empty.is_empty() || choices.is_empty() {
            return false;
        }
        let (r, c) = empty[rng.gen_range(0..empty.len())];
        let total: u32 = choices.iter().map(|(_, w)| w).sum();
        let mut pick = rng.gen_range(0..total.max(1));
        let mut value = choices[0].0;
        for &(v, w) in choices {
            if pick < w {
                value = v;
                break;
            }
            pick -= w;
        }
        self.cells[r][c] = value;
        true
    }

    pub fn has_moves(&self, rule: &dyn MergeRule) -> bool {
        for r in 0..SIZE {
            for c in 0..SIZE {
                let v = self.cells[r][c];
                if v == 0 {
                    return true;
                }
                if c + 1 < SIZE && rule.merge(v, self.cells[r][c + 1]).is_some() && self.cells[r][c + 1] != 0 {
                    return true;
                }
                if r + 1 < SIZE && rule.merge(v, self.cells[r + 1][c]).is_some() && self.cells[r + 1][c] != 0 {
                    return true;
                }
            }
        }
        false
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn contains(&self, value: u32) -> bool {
        self.cells.iter().flatten().any(|&v| v == value)
    }
}

/// Tile colour by rank (position in the value ladder)
pub fn tile_color(rank: usize) -> (Color, Color) {
    const PALETTE: [(u8, u8, u8); 12] = [
        (238, 228, 218),
        (237, 224, 200),
        (242, 177, 121),
        (245, 149, 99),
        (246, 124, 95),
        (246, 94, 59),
        (237, 207, 114),
        (237, 204, 97),
        (237, 200, 80),
        (237, 197, 63),
        (237, 194, 46),
        (60, 58, 50),
    ];
    let (r, g, b) = PALETTE[rank.min(PALETTE.len() - 1)];
    let fg = if rank < 2 { Color::Rgb(119, 110, 101) } else { Color::Rgb(249, 246, 242) };
    (Color::Rgb(r, g, b), fg)
}

/// Palette slot for powers of two: 2 is the first
pub fn doubling_rank(v: u32) -> usize {
    v.max(2).trailing_zeros() as usize - 1
}

/// Draws the board; `rank` maps a value to its palette slot.
pub fn draw_board(canvas: &mut Canvas, board: &Board, rank: impl Fn(u32) -> usize) {
    let fit = GridFit::new(SIZE, SIZE, canvas.width(), canvas.height());
    for r in 0..SIZE {
        for c in 0..SIZE {
            let (x, y) = fit.origin(c, r);
            let v = board.cells[r][c];
            if v == 0 {
                canvas.block(x, y, fit.cw - 1, fit.ch.max(2) - 1, Color::Rgb(205, 193, 180));
                continue;
            }
            let (bg, fg) = tile_color(rank(v));
            canvas.block(x, y, fit.cw - 1, fit.ch.max(2) - 1, bg);
            let label = v.to_string();
            let lx = x + (fit.cw - 1 - label.len() as i32).max(0) / 2;
            let ly = y + (fit.ch.max(2) - 1) / 2;
            canvas.text(lx, ly, &label, Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board(rows: [[u32; 4]; 4]) -> Board {
        Board { cells: rows }
    }

    #[test]
    fn test_slide_left_merges_once_per_pair() {
        let mut b = board([[2, 2, 2, 2], [4, 0, 4, 8], [0, 0, 0, 2], [2, 4, 8, 16]]);
        let out = b.slide(Dir::Left, &Doubling);
        assert!(out.moved);
        assert_eq!(b.cells[0], [4, 4, 0, 0]);
        assert_eq!(b.cells[1], [8, 8, 0, 0]);
        assert_eq!(b.cells[2], [2, 0, 0, 0]);
        assert_eq!(b.cells[3], [2, 4, 8, 16]);
        assert_eq!(out.gained, 4 + 4 + 8);
    }

    #[test]
    fn test_slide_right_and_down() {
        let mut b = board([[2, 0, 0, 2], [0; 4], [0; 4], [0; 4]]);
        b.slide(Dir::Right, &Doubling);
        assert_eq!(b.cells[0], [0, 0, 0, 4]);
        b.slide(Dir::Down, &Doubling);
        assert_eq!(b.cells[3][3], 4);
        assert_eq!(b.cells[0][3], 0);
    }

    #[test]
    fn test_blocked_slide_reports_no_move() {
        let mut b = board([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let out = b.slide(Dir::Left, &Doubling);
        assert!(!out.moved);
        assert_eq!(out.gained, 0);
    }

    #[test]
    fn test_fibonacci_rule() {
        let rule = Fibonacci;
        assert_eq!(rule.merge(1, 1), Some(2));
        assert_eq!(rule.merge(1, 2), Some(3));
        assert_eq!(rule.merge(3, 2), Some(5));
        assert_eq!(rule.merge(987, 1597), Some(2584));
        assert_eq!(rule.merge(2, 2), None);
        assert_eq!(rule.merge(1, 3), None);
        assert_eq!(rule.merge(4, 4), None);
    }

    #[test]
    fn test_fibonacci_slide() {
        let mut b = board([[1, 1, 2, 3], [0; 4], [0; 4], [0; 4]]);
        let out = b.slide(Dir::Left, &Fibonacci);
        assert_eq!(b.cells[0], [2, 5, 0, 0]);
        assert_eq!(out.gained, 7);
    }

    #[test]
    fn test_doubling_rank() {
        assert_eq!(doubling_rank(2), 0);
        assert_eq!(doubling_rank(8), 2);
        assert_eq!(doubling_rank(2048), 10);
    }

    #[test]
    fn test_has_moves() {
        let full = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(!full.has_moves(&Doubling));
        let mut mergeable = full.clone();
        mergeable.cells[0][1] = 2;
        assert!(mergeable.has_moves(&Doubling));
    }

    #[test]
    fn test_spawn_fills_empty_cell() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = Board::default();
        for _ in 0..16 {
            assert!(b.spawn(&mut rng, &[(2, 9), (4, 1)]));
        }
        assert!(!b.spawn(&mut rng, &[(2, 9), (4, 1)]));
        assert!(b.cells.iter().flatten().all(|&v| v == 2 || v == 4));
    }
}
