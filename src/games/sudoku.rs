use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

type Grid = [[u8; 9]; 9];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    fn holes(self) -> usize {
        match self {
            Difficulty::Easy => 30,
            Difficulty::Medium => 45,
            Difficulty::Hard => 55,
        }
    }

    fn next(self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

fn is_valid(grid: &Grid, row: usize, col: usize, n: u8) -> bool {
    let (br, bc) = (row - row % 3, col - col % 3);
    (0..9).all(|i| grid[row][i] != n && grid[i][col] != n && grid[br + i / 3][bc + i % 3] != n)
}

/// Backtracking fill of every empty cell, lowest digit first
fn solve(grid: &mut Grid) -> bool {
    let Some(pos) = (0..81).find(|&i| grid[i / 9][i % 9] == 0) else { return true };
    let (row, col) = (pos / 9, pos % 9);
    for n in 1..=9 {
        if is_valid(grid, row, col, n) {
            grid[row][col] = n;
            if solve(grid) {
                return true;
            }
            grid[row][col] = 0;
        }
    }
    false
}

fn generate(rng: &mut StdRng) -> Grid {
    let mut grid = [[0u8; 9]; 9];
    // Diagonal boxes never constrain each other
    for b in [0, 3, 6] {
        let mut digits: Vec<u8> = (1..=9).collect();
        digits.shuffle(rng);
        for (i, d) in digits.into_iter().enumerate() {
            grid[b + i / 3][b + i % 3] = d;
        }
    }
    solve(&mut grid);
    grid
}

pub struct Sudoku {
    grid: Grid,
    solution: Grid,
    locked: [[bool; 9]; 9],
    cursor: (usize, usize),
    difficulty: Difficulty,
    checking: bool,
    elapsed_ms: u64,
    solved: bool,
    rng: StdRng,
}

impl Sudoku {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy(), Difficulty::Medium)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), Difficulty::Medium)
    }

    fn with_rng(mut rng: StdRng, difficulty: Difficulty) -> Self {
        let solution = generate(&mut rng);
        let mut grid = solution;
        let mut removed = 0;
        while removed < difficulty.holes() {
            let (r, c) = (rng.gen_range(0..9), rng.gen_range(0..9));
            if grid[r][c] != 0 {
                grid[r][c] = 0;
                removed += 1;
            }
        }
        let locked = grid.map(|row| row.map(|n| n != 0));
        Self {
            grid,
            solution,
            locked,
            cursor: (4, 4),
            difficulty,
            checking: false,
            elapsed_ms: 0,
            solved: false,
            rng,
        }
    }

    fn new_puzzle(&mut self, difficulty: Difficulty) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Sudoku::with_rng(rng, difficulty);
        debug!(?difficulty, "new sudoku");
    }

    fn enter(&mut self, n: u8) {
        let (r, c) = (self.cursor.1, self.cursor.0);
        if self.solved || self.locked[r][c] {
            return;
        }
        self.grid[r][c] = n;
        if n != 0 && self.grid == self.solution {
            self.solved = true;
            debug!(secs = self.elapsed_ms / 1000, "sudoku solved");
        }
    }

    fn empty_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|&&n| n == 0).count()
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        self.cursor.0 = (self.cursor.0 as i32 + dx).clamp(0, 8) as usize;
        self.cursor.1 = (self.cursor.1 as i32 + dy).clamp(0, 8) as usize;
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(40, 40, 40));
        let fit = GridFit::new(9, 9, width, height);
        let (cx, cy) = self.cursor;
        let selected = self.grid[cy][cx];

        for r in 0..9 {
            for col in 0..9 {
                let n = self.grid[r][col];
                let (x, y) = fit.origin(col, r);
                let shaded_box = ((r / 3) + (col / 3)) % 2 == 1;
                let mut bg = if shaded_box { Color::Rgb(235, 235, 235) } else { Color::White };
                if n != 0 && n == selected {
                    bg = Color::Rgb(227, 242, 253);
                }
                if self.checking && n != 0 && n != self.solution[r][col] {
                    bg = Color::Rgb(255, 205, 210);
                }
                if (col, r) == self.cursor {
                    bg = Color::Rgb(187, 222, 251);
                }
                c.block(x, y, fit.cw, fit.ch, bg);
                if n != 0 {
                    let style = if self.locked[r][col] {
                        Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Rgb(33, 150, 243)).bg(bg)
                    };
                    c.put_styled(x + fit.cw / 2, y + fit.ch / 2, char::from(b'0' + n), style);
                }
            }
        }
        c
    }
}

impl Game for Sudoku {
    fn update(&mut self, dt_ms: u64) {
        if !self.solved {
            self.elapsed_ms += dt_ms;
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('n') | KeyCode::Char('N') => self.new_puzzle(self.difficulty.next()),
            KeyCode::Enter | KeyCode::Char(' ') if self.solved => self.reset(),
            _ if self.solved => {}
            KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Down => self.move_cursor(0, 1),
            KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Char(d @ '1'..='9') => self.enter(d as u8 - b'0'),
            KeyCode::Char('0') | KeyCode::Delete | KeyCode::Backspace => self.enter(0),
            KeyCode::Char('c') | KeyCode::Char('C') => self.checking = !self.checking,
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🔢 Sudoku", Color::Rgb(160, 200, 160));

        let parts = vec![
            (format!("Difficulty: {:?}", self.difficulty), Color::Cyan),
            (format!("Empty: {}", self.empty_cells()), Color::Yellow),
            (format!("Time: {}s", self.elapsed_ms / 1000), Color::Green),
            (if self.checking { "Check: on" } else { "Check: off" }.to_string(), Color::Gray),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🔢", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.solved {
            canvas::won_line(&format!("Solved in {}s!", self.elapsed_ms / 1000))
        } else {
            canvas::help_line(&[("1-9", "Enter"), ("0/Del", "Clear"), ("C", "Check"), ("N", "Difficulty"), ("R", "New")])
        };
        canvas::render_lines(frame, help, line);
    }

    /// New puzzle at the current difficulty
    fn reset(&mut self) {
        self.new_puzzle(self.difficulty);
    }

    fn get_score(&self) -> u32 {
        (self.elapsed_ms / 1000) as u32
    }

    fn is_game_over(&self) -> bool {
        self.solved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(grid: &Grid) -> bool {
        let ok = |cells: Vec<u8>| {
            let mut seen = [false; 10];
            cells.into_iter().all(|n| n != 0 && !std::mem::replace(&mut seen[n as usize], true))
        };
        (0..9).all(|i| {
            ok(grid[i].to_vec())
                && ok((0..9).map(|r| grid[r][i]).collect())
                && ok((0..9).map(|k| grid[i / 3 * 3 + k / 3][i % 3 * 3 + k % 3]).collect())
        })
    }

    #[test]
    fn test_generated_solution_is_valid() {
        for seed in 0..5 {
            let s = Sudoku::with_seed(seed);
            assert!(complete(&s.solution));
        }
    }

    #[test]
    fn test_holes_per_difficulty() {
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let s = Sudoku::with_rng(StdRng::seed_from_u64(9), d);
            assert_eq!(s.empty_cells(), d.holes());
            let locked = s.locked.iter().flatten().filter(|&&l| l).count();
            assert_eq!(locked, 81 - d.holes());
        }
    }

    #[test]
    fn test_givens_are_locked() {
        let mut s = Sudoku::with_seed(1);
        let (r, c) = (0..81).map(|i| (i / 9, i % 9)).find(|&(r, c)| s.locked[r][c]).unwrap();
        let before = s.grid[r][c];
        s.cursor = (c, r);
        s.enter(0);
        assert_eq!(s.grid[r][c], before);
    }

    #[test]
    fn test_filling_solution_wins() {
        let mut s = Sudoku::with_seed(2);
        for r in 0..9 {
            for c in 0..9 {
                if !s.locked[r][c] {
                    s.cursor = (c, r);
                    s.enter(s.solution[r][c]);
                }
            }
        }
        assert!(s.is_game_over());
        s.update(1000);
        assert_eq!(s.elapsed_ms, 0);
    }

    #[test]
    fn test_wrong_entry_does_not_win_and_clears() {
        let mut s = Sudoku::with_seed(3);
        let (r, c) = (0..81).map(|i| (i / 9, i % 9)).find(|&(r, c)| !s.locked[r][c]).unwrap();
        let wrong = s.solution[r][c] % 9 + 1;
        s.cursor = (c, r);
        s.enter(wrong);
        assert_eq!(s.grid[r][c], wrong);
        s.enter(0);
        assert_eq!(s.grid[r][c], 0);
        assert!(!s.solved);
    }

    #[test]
    fn test_next_difficulty_cycles() {
        let mut s = Sudoku::with_seed(4);
        s.new_puzzle(s.difficulty.next());
        assert_eq!(s.difficulty, Difficulty::Hard);
        assert_eq!(s.empty_cells(), 55);
    }
}
