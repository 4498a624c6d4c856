use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

pub const COLS: usize = 10;
pub const ROWS: usize = 20;

const LINE_POINTS: [u32; 5] = [0, 100, 300, 500, 800];

const SHAPES: [&[&[u8]]; 7] = [
    &[&[1, 1, 1, 1]],
    &[&[1, 1], &[1, 1]],
    &[&[1, 1, 1], &[0, 1, 0]],
    &[&[1, 1, 1], &[1, 0, 0]],
    &[&[1, 1, 1], &[0, 0, 1]],
    &[&[1, 1, 0], &[0, 1, 1]],
    &[&[0, 1, 1], &[1, 1, 0]],
];

const COLORS: [Color; 7] = [
    Color::Rgb(0, 240, 240),
    Color::Rgb(240, 240, 0),
    Color::Rgb(160, 0, 240),
    Color::Rgb(240, 160, 0),
    Color::Rgb(0, 0, 240),
    Color::Rgb(0, 240, 0),
    Color::Rgb(240, 0, 0),
];

type Board = [[Option<usize>; COLS]; ROWS];

#[derive(Clone, Debug, PartialEq)]
struct Piece {
    kind: usize,
    shape: Vec<Vec<bool>>,
    x: i32,
    y: i32,
}

impl Piece {
    fn new(kind: usize) -> Self {
        let shape: Vec<Vec<bool>> = SHAPES[kind]
            .iter()
            .map(|row| row.iter().map(|&v| v == 1).collect())
            .collect();
        let width = shape[0].len() as i32;
        Self { kind, shape, x: COLS as i32 / 2 - width / 2, y: 0 }
    }

    /// Occupied board cells
    fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.iter().enumerate().flat_map(move |(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, on)| **on)
                .map(move |(dx, _)| (self.x + dx as i32, self.y + dy as i32))
        })
    }

    /// Clockwise: transpose, then reverse each row
    fn rotated(&self) -> Piece {
        let h = self.shape.len();
        let w = self.shape[0].len();
        let shape = (0..w)
            .map(|c| (0..h).rev().map(|r| self.shape[r][c]).collect())
            .collect();
        Piece { shape, ..self.clone() }
    }

    fn shifted(&self, dx: i32, dy: i32) -> Piece {
        Piece { x: self.x + dx, y: self.y + dy, ..self.clone() }
    }
}

fn collides(board: &Board, piece: &Piece) -> bool {
    piece.cells().any(|(x, y)| {
        if x < 0 || x >= COLS as i32 || y >= ROWS as i32 {
            return true;
        }
        y >= 0 && board[y as usize][x as usize].is_some()
    })
}

pub struct Tetris {
    board: Board,
    current: Piece,
    next: Piece,
    score: u32,
    best: u32,
    lines: u32,
    level: u32,
    drop_ms: u64,
    game_over: bool,
    paused: bool,
    rng: StdRng,
}

impl Tetris {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let current = Piece::new(rng.gen_range(0..SHAPES.len()));
        let next = Piece::new(rng.gen_range(0..SHAPES.len()));
        Self {
            board: [[None; COLS]; ROWS],
            current,
            next,
            score: 0,
            best: 0,
            lines: 0,
            level: 1,
            drop_ms: 0,
            game_over: false,
            paused: false,
            rng,
        }
    }

    fn drop_interval(&self) -> u64 {
        1000u64.saturating_sub((self.level as u64 - 1) * 100).max(100)
    }

    fn move_piece(&mut self, dx: i32) {
        let moved = self.current.shifted(dx, 0);
        if !collides(&self.board, &moved) {
            self.current = moved;
        }
    }

    fn rotate(&mut self) -> bool {
        let turned = self.current.rotated();
        if collides(&self.board, &turned) {
            return false;
        }
        self.current = turned;
        true
    }

    /// One row down, locking the piece if it cannot fall
    fn drop_piece(&mut self) {
        self.drop_ms = 0;
        let lower = self.current.shifted(0, 1);
        if !collides(&self.board, &lower) {
            self.current = lower;
            return;
        }
        self.lock();
    }

    fn hard_drop(&mut self) {
        while !collides(&self.board, &self.current.shifted(0, 1)) {
            self.current.y += 1;
        }
        self.drop_piece();
    }

    fn lock(&mut self) {
        let kind = self.current.kind;
        let cells: Vec<_> = self.current.cells().collect();
        for (x, y) in cells {
            if y >= 0 {
                self.board[y as usize][x as usize] = Some(kind);
            }
        }
        self.clear_lines();

        let next = Piece::new(self.rng.gen_range(0..SHAPES.len()));
        self.current = std::mem::replace(&mut self.next, next);
        if collides(&self.board, &self.current) {
            self.game_over = true;
            debug!(score = self.score, lines = self.lines, "tetris game over");
        }
    }

    fn clear_lines(&mut self) -> u32 {
        let kept: Vec<[Option<usize>; COLS]> = self
            .board
            .iter()
            .filter(|row| row.iter().any(|c| c.is_none()))
            .copied()
            .collect();
        let cleared = (ROWS - kept.len()) as u32;
        if cleared == 0 {
            return 0;
        }
        let mut board = [[None; COLS]; ROWS];
        board[cleared as usize..].copy_from_slice(&kept);
        self.board = board;

        self.lines += cleared;
        self.score += LINE_POINTS[cleared as usize] * self.level;
        self.level = self.lines / 10 + 1;
        debug!(cleared, level = self.level, "tetris lines");
        cleared
    }

    fn ghost_y(&self) -> i32 {
        let mut ghost = self.current.clone();
        while !collides(&self.board, &ghost.shifted(0, 1)) {
            ghost.y += 1;
        }
        ghost.y
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let bg = Color::Rgb(0, 0, 0);
        let mut c = Canvas::new(width as u16, height as u16, bg);
        // Board plus a 6-column side panel for the next piece
        let fit = GridFit::new(COLS + 6, ROWS, width, height);
        let grid = Color::Rgb(34, 34, 34);

        let cell = |c: &mut Canvas, col: i32, row: i32, color: Color, ch: char| {
            if col < 0 || row < 0 {
                return;
            }
            let (x, y) = fit.origin(col as usize, row as usize);
            c.fill(x, y, x + fit.cw, y + fit.ch, ch, Style::default().fg(color).bg(bg));
        };

        for row in 0..ROWS as i32 {
            for col in 0..COLS as i32 {
                match self.board[row as usize][col as usize] {
                    Some(kind) => cell(&mut c, col, row, COLORS[kind], '█'),
                    None => {
                        let (x, y) = fit.origin(col as usize, row as usize);
                        c.put(x + fit.cw / 2, y + fit.ch / 2, '·', grid);
                    }
                }
            }
        }

        if !self.game_over {
            let ghost = Piece { y: self.ghost_y(), ..self.current.clone() };
            for (x, y) in ghost.cells() {
                cell(&mut c, x, y, Color::Rgb(70, 70, 70), '░');
            }
            for (x, y) in self.current.cells() {
                cell(&mut c, x, y, COLORS[self.current.kind], '█');
            }
        }

        // Frame the well
        let (x0, y0) = fit.origin(0, 0);
        let (x1, y1) = fit.origin(COLS, ROWS);
        for y in y0..y1 {
            c.put(x0 - 1, y, '│', Color::Rgb(80, 80, 100));
            c.put(x1, y, '│', Color::Rgb(80, 80, 100));
        }

        let (nx, ny) = fit.origin(COLS + 1, 1);
        c.text(nx, ny, "NEXT", Style::default().fg(Color::Gray).bg(bg).add_modifier(Modifier::BOLD));
        let preview = Piece { x: COLS as i32 + 1, y: 3, ..self.next.clone() };
        for (x, y) in preview.cells() {
            cell(&mut c, x, y, COLORS[self.next.kind], '█');
        }
        c
    }
}

impl Game for Tetris {
    fn update(&mut self, dt_ms: u64) {
        if self.game_over || self.paused { return; }
        self.drop_ms += dt_ms;
        if self.drop_ms > self.drop_interval() {
            self.drop_piece();
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
            KeyCode::Enter | KeyCode::Char(' ') if self.game_over => self.reset(),
            _ if self.paused || self.game_over => {}
            KeyCode::Left => self.move_piece(-1),
            KeyCode::Right => self.move_piece(1),
            KeyCode::Down => self.drop_piece(),
            KeyCode::Up => {
                self.rotate();
            }
            KeyCode::Char(' ') => self.hard_drop(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "▦ Tetris", Color::Rgb(120, 200, 255));

        let parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lines: {}", self.lines), Color::Green),
            (format!("Level: {}", self.level), Color::Cyan),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        canvas::render_lines(frame, status, canvas::status_line("▦", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {} Lines: {}", self.score, self.lines))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("←→", "Move"), ("↑", "Rotate"), ("↓", "Soft Drop"), ("SPACE", "Hard Drop"), ("P", "Pause")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Tetris::with_rng(rng);
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

    fn tetris_with(kind: usize) -> Tetris {
        let mut t = Tetris::with_seed(3);
        t.current = Piece::new(kind);
        t
    }

    #[test]
    fn test_spawn_position_is_centred() {
        assert_eq!(Piece::new(0).x, 3);
        assert_eq!(Piece::new(1).x, 4);
        assert_eq!(Piece::new(2).x, 4);
    }

    #[test]
    fn test_rotation_is_clockwise() {
        // L: [1,1,1],[1,0,0] turns into [1,1],[0,1],[0,1]
        let turned = Piece::new(3).rotated();
        assert_eq!(turned.shape, vec![vec![true, true], vec![false, true], vec![false, true]]);
        let i = Piece::new(0).rotated();
        assert_eq!(i.shape.len(), 4);
        assert_eq!(i.shape[0].len(), 1);
    }

    #[test]
    fn test_rotation_rejected_against_wall() {
        let mut t = tetris_with(0);
        // Vertical I against the right wall cannot turn flat
        t.current = t.current.rotated();
        t.current.x = COLS as i32 - 1;
        t.current.y = 5;
        let before = t.current.clone();
        assert!(!t.rotate());
        assert_eq!(t.current, before);
    }

    #[test]
    fn test_rotation_rejected_against_blocks() {
        let mut t = tetris_with(0);
        t.current.y = 5;
        t.board[6][3] = Some(1);
        let before = t.current.clone();
        assert!(!t.rotate());
        assert_eq!(t.current, before);
    }

    #[test]
    fn test_moves_stop_at_walls() {
        let mut t = tetris_with(1);
        for _ in 0..10 {
            t.move_piece(-1);
        }
        assert_eq!(t.current.x, 0);
        for _ in 0..10 {
            t.move_piece(1);
        }
        assert_eq!(t.current.x, COLS as i32 - 2);
    }

    #[test]
    fn test_full_row_clears_and_scores() {
        let mut t = tetris_with(1);
        for col in 0..COLS {
            if col != 4 && col != 5 {
                t.board[ROWS - 1][col] = Some(6);
                t.board[ROWS - 2][col] = Some(6);
            }
        }
        t.board[ROWS - 3][0] = Some(2);
        t.hard_drop();
        assert_eq!(t.lines, 2);
        assert_eq!(t.score, 300);
        assert!(t.board[ROWS - 2].iter().all(|c| c.is_none()));
        // The block above the cleared rows shifted down by two
        assert_eq!(t.board[ROWS - 1][0], Some(2));
    }

    #[test]
    fn test_partial_row_stays() {
        let mut t = tetris_with(1);
        for col in 0..COLS - 3 {
            t.board[ROWS - 1][col] = Some(0);
        }
        t.clear_lines();
        assert_eq!(t.lines, 0);
        assert!(t.board[ROWS - 1][0].is_some());
    }

    #[test]
    fn test_level_and_gravity_interval() {
        let mut t = tetris_with(1);
        assert_eq!(t.drop_interval(), 1000);
        t.lines = 9;
        for col in 0..COLS {
            t.board[ROWS - 1][col] = Some(0);
        }
        t.clear_lines();
        assert_eq!(t.level, 2);
        assert_eq!(t.drop_interval(), 900);
        t.level = 15;
        assert_eq!(t.drop_interval(), 100);
    }

    #[test]
    fn test_gravity_follows_elapsed_time() {
        let mut t = tetris_with(1);
        t.update(600);
        assert_eq!(t.current.y, 0);
        t.update(600);
        assert_eq!(t.current.y, 1);
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let mut t = tetris_with(1);
        for row in 1..ROWS {
            for col in 0..COLS - 1 {
                t.board[row][col] = Some(0);
            }
        }
        t.drop_piece();
        assert!(t.is_game_over());
    }
}
