use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const SIZE: usize = 15;
const MINES: usize = 30;

const NUMBER_COLORS: [Color; 9] = [
    Color::Reset,
    Color::Rgb(0, 0, 255),
    Color::Rgb(0, 128, 0),
    Color::Rgb(255, 0, 0),
    Color::Rgb(0, 0, 128),
    Color::Rgb(128, 0, 0),
    Color::Rgb(0, 128, 128),
    Color::Rgb(0, 0, 0),
    Color::Rgb(128, 128, 128),
];

#[derive(Clone, Copy, Debug, Default)]
struct Cell {
    mine: bool,
    revealed: bool,
    flagged: bool,
    adjacent: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Board not generated yet
    Fresh,
    Playing,
    Lost,
    Won,
}

pub struct Minesweeper {
    grid: [[Cell; SIZE]; SIZE],
    cursor: (usize, usize),
    state: State,
    elapsed_ms: u64,
    flags: usize,
    rng: StdRng,
}

fn neighbours(x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
    (-1i32..=1)
        .flat_map(|dy| (-1i32..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            (nx >= 0 && ny >= 0 && (nx as usize) < SIZE && (ny as usize) < SIZE).then_some((nx as usize, ny as usize))
        })
}

impl Minesweeper {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            grid: [[Cell::default(); SIZE]; SIZE],
            cursor: (SIZE / 2, SIZE / 2),
            state: State::Fresh,
            elapsed_ms: 0,
            flags: 0,
            rng,
        }
    }

    /// Lay mines anywhere except the 3×3 block around the first reveal
    fn generate(&mut self, safe_x: usize, safe_y: usize) {
        self.grid = [[Cell::default(); SIZE]; SIZE];
        let mut placed = 0;
        while placed < MINES {
            let x = self.rng.gen_range(0..SIZE);
            let y = self.rng.gen_range(0..SIZE);
            let near = x.abs_diff(safe_x) <= 1 && y.abs_diff(safe_y) <= 1;
            if !near && !self.grid[y][x].mine {
                self.grid[y][x].mine = true;
                placed += 1;
            }
        }
        for y in 0..SIZE {
            for x in 0..SIZE {
                let count = neighbours(x, y).filter(|&(nx, ny)| self.grid[ny][nx].mine).count();
                self.grid[y][x].adjacent = count as u8;
            }
        }
        self.state = State::Playing;
        debug!(safe_x, safe_y, "minesweeper board generated");
    }

    fn reveal(&mut self, x: usize, y: usize) {
        match self.state {
            State::Fresh => self.generate(x, y),
            State::Playing => {}
            State::Lost | State::Won => return,
        }
        if self.grid[y][x].flagged || self.grid[y][x].revealed {
            return;
        }
        if self.grid[y][x].mine {
            self.state = State::Lost;
            for row in self.grid.iter_mut() {
                for cell in row.iter_mut().filter(|c| c.mine) {
                    cell.revealed = true;
                }
            }
            return;
        }

        // Flood fill through zero cells
        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            let cell = &mut self.grid[cy][cx];
            if cell.revealed || cell.flagged || cell.mine {
                continue;
            }
            cell.revealed = true;
            if cell.adjacent == 0 {
                stack.extend(neighbours(cx, cy));
            }
        }

        if self.hidden_safe() == 0 {
            self.state = State::Won;
            debug!(secs = self.elapsed_ms / 1000, "minesweeper cleared");
        }
    }

    fn toggle_flag(&mut self, x: usize, y: usize) {
        if self.state != State::Playing {
            return;
        }
        let cell = &mut self.grid[y][x];
        if cell.revealed {
            return;
        }
        cell.flagged = !cell.flagged;
        if cell.flagged {
            self.flags += 1;
        } else {
            self.flags -= 1;
        }
    }

    fn hidden_safe(&self) -> usize {
        self.grid.iter().flatten().filter(|c| !c.mine && !c.revealed).count()
    }

    fn revealed(&self) -> usize {
        self.grid.iter().flatten().filter(|c| !c.mine && c.revealed).count()
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let x = (self.cursor.0 as i32 + dx).clamp(0, SIZE as i32 - 1);
        let y = (self.cursor.1 as i32 + dy).clamp(0, SIZE as i32 - 1);
        self.cursor = (x as usize, y as usize);
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(20, 20, 28));
        let fit = GridFit::new(SIZE, SIZE, width, height);

        for y in 0..SIZE {
            for x in 0..SIZE {
                let cell = self.grid[y][x];
                let (cx, cy) = fit.origin(x, y);
                let selected = self.cursor == (x, y);
                let (bg, ch, fg) = if cell.revealed && cell.mine {
                    (Color::Rgb(224, 224, 224), '✹', Color::Rgb(255, 0, 0))
                } else if cell.revealed {
                    let ch = if cell.adjacent > 0 { (b'0' + cell.adjacent) as char } else { ' ' };
                    (Color::Rgb(224, 224, 224), ch, NUMBER_COLORS[cell.adjacent as usize])
                } else if cell.flagged {
                    (Color::Rgb(192, 192, 192), '⚑', Color::Rgb(255, 0, 0))
                } else {
                    (Color::Rgb(192, 192, 192), ' ', Color::Black)
                };
                let bg = if selected { Color::Rgb(255, 220, 80) } else { bg };
                c.block(cx, cy, fit.cw - 1, fit.ch, bg);
                c.fill(cx + fit.cw - 1, cy, cx + fit.cw, cy + fit.ch, '▕', Style::default().fg(Color::Rgb(128, 128, 128)).bg(bg));
                let style = Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD);
                c.put_styled(cx + (fit.cw - 1) / 2, cy + fit.ch / 2, ch, style);
            }
        }
        c
    }
}

impl Game for Minesweeper {
    fn update(&mut self, dt_ms: u64) {
        if self.state == State::Playing {
            self.elapsed_ms += dt_ms;
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        let over = matches!(self.state, State::Lost | State::Won);
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Enter | KeyCode::Char(' ') if over => self.reset(),
            _ if over => {}
            KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Down => self.move_cursor(0, 1),
            KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Enter | KeyCode::Char(' ') => self.reveal(self.cursor.0, self.cursor.1),
            KeyCode::Char('f') | KeyCode::Char('F') => self.toggle_flag(self.cursor.0, self.cursor.1),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "💣 Minesweeper", Color::Rgb(160, 200, 160));

        let parts = vec![
            (format!("Mines: {}", MINES), Color::Red),
            (format!("Flags: {}", self.flags), Color::Yellow),
            (format!("Time: {}s", self.elapsed_ms / 1000), Color::Cyan),
        ];
        canvas::render_lines(frame, status, canvas::status_line("💣", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = match self.state {
            State::Lost => canvas::game_over_line("BOOM! You hit a mine!"),
            State::Won => canvas::won_line(&format!("CLEARED! Time: {}s", self.elapsed_ms / 1000)),
            _ => canvas::help_line(&[("↑↓←→", "Cursor"), ("SPACE", "Reveal"), ("F", "Flag"), ("R", "Restart")]),
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Minesweeper::with_rng(rng);
    }

    fn get_score(&self) -> u32 {
        self.revealed() as u32
    }

    fn is_game_over(&self) -> bool {
        matches!(self.state, State::Lost | State::Won)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reveal_is_safe_with_clear_neighbourhood() {
        for seed in 0..20 {
            let mut m = Minesweeper::with_seed(seed);
            m.reveal(0, 0);
            assert_eq!(m.state, State::Playing);
            assert_eq!(m.grid.iter().flatten().filter(|c| c.mine).count(), MINES);
            assert!(!m.grid[0][0].mine && !m.grid[1][1].mine && !m.grid[0][1].mine);
            // A zero cell floods at least its neighbours
            assert!(m.revealed() >= 4);
        }
    }

    #[test]
    fn test_adjacent_counts() {
        let mut m = Minesweeper::with_seed(3);
        m.reveal(7, 7);
        for y in 0..SIZE {
            for x in 0..SIZE {
                let expected = neighbours(x, y).filter(|&(nx, ny)| m.grid[ny][nx].mine).count();
                assert_eq!(m.grid[y][x].adjacent as usize, expected);
            }
        }
    }

    #[test]
    fn test_flags_block_reveal_and_count() {
        let mut m = Minesweeper::with_seed(4);
        m.toggle_flag(3, 3);
        assert_eq!(m.flags, 0);
        m.reveal(7, 7);
        let (x, y) = (0..SIZE * SIZE)
            .map(|i| (i % SIZE, i / SIZE))
            .find(|&(x, y)| !m.grid[y][x].revealed)
            .unwrap();
        m.toggle_flag(x, y);
        assert_eq!(m.flags, 1);
        m.reveal(x, y);
        assert!(!m.grid[y][x].revealed);
        m.toggle_flag(x, y);
        assert_eq!(m.flags, 0);
    }

    #[test]
    fn test_mine_loses_and_shows_all() {
        let mut m = Minesweeper::with_seed(5);
        m.reveal(7, 7);
        let (x, y) = (0..SIZE * SIZE).map(|i| (i % SIZE, i / SIZE)).find(|&(x, y)| m.grid[y][x].mine).unwrap();
        m.reveal(x, y);
        assert!(m.is_game_over());
        assert!(m.grid.iter().flatten().filter(|c| c.mine).all(|c| c.revealed));
    }

    #[test]
    fn test_revealing_all_safe_cells_wins() {
        let mut m = Minesweeper::with_seed(6);
        m.reveal(7, 7);
        for y in 0..SIZE {
            for x in 0..SIZE {
                if !m.grid[y][x].mine {
                    m.reveal(x, y);
                }
            }
        }
        assert_eq!(m.state, State::Won);
        assert_eq!(m.get_score() as usize, SIZE * SIZE - MINES);
    }

    #[test]
    fn test_timer_runs_only_while_playing() {
        let mut m = Minesweeper::with_seed(7);
        m.update(1000);
        assert_eq!(m.elapsed_ms, 0);
        m.reveal(7, 7);
        m.update(1500);
        assert_eq!(m.elapsed_ms, 1500);
    }
}
