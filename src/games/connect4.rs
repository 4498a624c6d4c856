use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const ROWS: usize = 6;
const COLS: usize = 7;
const CELL: f32 = 90.0;
const MARGIN: f32 = 25.0;
const AI_DELAY_MS: u64 = 500;

const RED: Color = Color::Rgb(239, 68, 68);
const YELLOW: Color = Color::Rgb(251, 191, 36);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Player {
    Red,
    Yellow,
}

impl Player {
    fn other(self) -> Player {
        match self {
            Player::Red => Player::Yellow,
            Player::Yellow => Player::Red,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Player::Red => "Red",
            Player::Yellow => "Yellow",
        }
    }

    fn color(self) -> Color {
        match self {
            Player::Red => RED,
            Player::Yellow => YELLOW,
        }
    }
}

type Board = [[Option<Player>; COLS]; ROWS];

/// Disc in flight. `y` is in the same pixel units as the board layout.
#[derive(Clone, Copy, Debug)]
struct Falling {
    col: usize,
    row: usize,
    y: f32,
    speed: f32,
    player: Player,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Winner(Player),
    Draw,
}

fn lowest_empty(board: &Board, col: usize) -> Option<usize> {
    (0..ROWS).rev().find(|&r| board[r][col].is_none())
}

/// Four or more in a line through (row, col)
fn wins_at(board: &Board, row: usize, col: usize) -> bool {
    let Some(player) = board[row][col] else { return false };
    let run = |dr: i32, dc: i32| {
        let mut n = 0;
        let (mut r, mut c) = (row as i32 + dr, col as i32 + dc);
        while r >= 0 && c >= 0 && (r as usize) < ROWS && (c as usize) < COLS && board[r as usize][c as usize] == Some(player) {
            n += 1;
            r += dr;
            c += dc;
        }
        n
    };
    [(0, 1), (1, 0), (1, 1), (1, -1)]
        .iter()
        .any(|&(dr, dc)| 1 + run(dr, dc) + run(-dr, -dc) >= 4)
}

pub struct ConnectFour {
    board: Board,
    current: Player,
    cursor: usize,
    falling: Option<Falling>,
    outcome: Option<Outcome>,
    vs_ai: bool,
    ai_wait_ms: Option<u64>,
    moves: u32,
    rng: StdRng,
}

impl ConnectFour {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            board: [[None; COLS]; ROWS],
            current: Player::Red,
            cursor: COLS / 2,
            falling: None,
            outcome: None,
            vs_ai: false,
            ai_wait_ms: None,
            moves: 0,
            rng,
        }
    }

    fn ai_turn(&self) -> bool {
        self.vs_ai && self.current == Player::Yellow
    }

    fn drop_disc(&mut self, col: usize) -> bool {
        if self.outcome.is_some() || self.falling.is_some() {
            return false;
        }
        let Some(row) = lowest_empty(&self.board, col) else { return false };
        self.falling = Some(Falling { col, row, y: 0.0, speed: 0.0, player: self.current });
        true
    }

    fn update_falling(&mut self) {
        let Some(mut disc) = self.falling else { return };
        disc.speed += 1.0;
        disc.y += disc.speed;
        let target = MARGIN + disc.row as f32 * CELL + CELL / 2.0;
        if disc.y < target {
            self.falling = Some(disc);
            return;
        }

        self.falling = None;
        self.board[disc.row][disc.col] = Some(disc.player);
        self.moves += 1;

        if wins_at(&self.board, disc.row, disc.col) {
            self.outcome = Some(Outcome::Winner(disc.player));
            debug!(winner = disc.player.name(), moves = self.moves, "connect four won");
        } else if (0..COLS).all(|c| self.board[0][c].is_some()) {
            self.outcome = Some(Outcome::Draw);
        } else {
            self.current = self.current.other();
            if self.ai_turn() {
                self.ai_wait_ms = Some(AI_DELAY_MS);
            }
        }
    }

    /// A column that completes four for `player`, if any
    fn winning_column(&mut self, player: Player) -> Option<usize> {
        (0..COLS).find(|&col| {
            let Some(row) = lowest_empty(&self.board, col) else { return false };
            self.board[row][col] = Some(player);
            let wins = wins_at(&self.board, row, col);
            self.board[row][col] = None;
            wins
        })
    }

    fn choose_ai_column(&mut self) -> Option<usize> {
        if let Some(col) = self.winning_column(Player::Yellow) {
            return Some(col);
        }
        if let Some(col) = self.winning_column(Player::Red) {
            return Some(col);
        }
        let open: Vec<usize> = (0..COLS).filter(|&c| self.board[0][c].is_none()).collect();
        open.choose(&mut self.rng).copied()
    }

    fn toggle_ai(&mut self) {
        let vs_ai = !self.vs_ai;
        self.reset();
        self.vs_ai = vs_ai;
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(30, 58, 138));
        // One spare row above the board for the cursor and the falling disc
        let fit = GridFit::new(COLS, ROWS + 1, width, height);
        let board_bg = Color::Rgb(37, 99, 235);
        let slot = Color::Rgb(30, 58, 138);

        let (bx, by) = fit.origin(0, 1);
        c.block(bx, by, fit.cw * COLS as i32, fit.ch * ROWS as i32, board_bg);

        for row in 0..ROWS {
            for col in 0..COLS {
                let (x, y) = fit.origin(col, row + 1);
                let (ch, fg) = match self.board[row][col] {
                    Some(p) => ('●', p.color()),
                    None => ('○', slot),
                };
                let style = Style::default().fg(fg).bg(board_bg).add_modifier(Modifier::BOLD);
                c.fill(x + fit.cw / 4, y, x + fit.cw - fit.cw / 4, y + fit.ch, ch, style);
            }
        }

        if let Some(disc) = self.falling {
            // Pixel y → board row, shifted down one for the cursor row
            let row = ((disc.y - MARGIN) / CELL).floor().max(-1.0) as i32 + 1;
            let (x, _) = fit.origin(disc.col, 0);
            let y = fit.oy + row * fit.ch;
            let style = Style::default().fg(disc.player.color()).bg(board_bg);
            c.fill(x + fit.cw / 4, y, x + fit.cw - fit.cw / 4, y + fit.ch, '●', style);
        } else if self.outcome.is_none() && !self.ai_turn() {
            let (x, y) = fit.origin(self.cursor, 0);
            c.put(x + fit.cw / 2, y + fit.ch / 2, '▼', self.current.color());
        }
        c
    }
}

impl Game for ConnectFour {
    fn update(&mut self, dt_ms: u64) {
        if let Some(wait) = self.ai_wait_ms {
            let left = wait.saturating_sub(dt_ms);
            if left > 0 {
                self.ai_wait_ms = Some(left);
            } else {
                self.ai_wait_ms = None;
                if let Some(col) = self.choose_ai_column() {
                    self.drop_disc(col);
                }
            }
        }
        self.update_falling();
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let vs_ai = self.vs_ai;
                self.reset();
                self.vs_ai = vs_ai;
            }
            KeyCode::Char('m') | KeyCode::Char('M') => self.toggle_ai(),
            KeyCode::Enter | KeyCode::Char(' ') if self.outcome.is_some() => {
                let vs_ai = self.vs_ai;
                self.reset();
                self.vs_ai = vs_ai;
            }
            _ if self.outcome.is_some() || self.ai_turn() => {}
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(COLS - 1),
            KeyCode::Char(d @ '1'..='7') => {
                self.cursor = d as usize - '1' as usize;
                self.drop_disc(self.cursor);
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Down => {
                self.drop_disc(self.cursor);
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🔴 Connect 4", Color::Rgb(160, 200, 160));

        let mode = if self.vs_ai { "vs AI" } else { "2 Players" };
        let parts = vec![
            (format!("Turn: {}", self.current.name()), self.current.color()),
            (format!("Mode: {}", mode), Color::Cyan),
            (format!("Moves: {}", self.moves), Color::Gray),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🔴", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = match self.outcome {
            Some(Outcome::Winner(p)) => canvas::won_line(&format!("{} wins!", p.name())),
            Some(Outcome::Draw) => canvas::won_line("It's a draw!"),
            None => canvas::help_line(&[("← →", "Column"), ("SPACE", "Drop"), ("M", "Toggle AI"), ("R", "Restart")]),
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = ConnectFour::with_rng(rng);
    }

    fn get_score(&self) -> u32 {
        self.moves
    }

    fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(g: &mut ConnectFour) {
        while g.falling.is_some() {
            g.update(16);
        }
    }

    fn play(g: &mut ConnectFour, col: usize) {
        assert!(g.drop_disc(col));
        settle(g);
    }

    #[test]
    fn test_disc_falls_to_lowest_row() {
        let mut g = ConnectFour::with_seed(1);
        play(&mut g, 3);
        assert_eq!(g.board[ROWS - 1][3], Some(Player::Red));
        play(&mut g, 3);
        assert_eq!(g.board[ROWS - 2][3], Some(Player::Yellow));
        assert_eq!(g.current, Player::Red);
    }

    #[test]
    fn test_falling_accelerates() {
        let mut g = ConnectFour::with_seed(2);
        g.drop_disc(0);
        g.update(16);
        g.update(16);
        g.update(16);
        let disc = g.falling.unwrap();
        assert_eq!(disc.speed, 3.0);
        assert_eq!(disc.y, 6.0);
    }

    #[test]
    fn test_full_column_rejected() {
        let mut g = ConnectFour::with_seed(3);
        for _ in 0..ROWS {
            play(&mut g, 0);
        }
        assert!(!g.drop_disc(0));
    }

    #[test]
    fn test_horizontal_and_diagonal_wins() {
        let mut g = ConnectFour::with_seed(4);
        for col in 0..3 {
            play(&mut g, col);
            play(&mut g, col);
        }
        play(&mut g, 3);
        assert_eq!(g.outcome, Some(Outcome::Winner(Player::Red)));
        assert!(g.is_game_over());

        let mut b: Board = [[None; COLS]; ROWS];
        for i in 0..4 {
            b[ROWS - 1 - i][i] = Some(Player::Yellow);
        }
        assert!(wins_at(&b, ROWS - 3, 2));
        b[ROWS - 3][2] = Some(Player::Red);
        assert!(!wins_at(&b, ROWS - 1, 0));
    }

    #[test]
    fn test_full_board_is_draw() {
        let mut g = ConnectFour::with_seed(5);
        // Pairs of columns alternating by row never line up four
        let color = |r: usize, c: usize| if (c / 2 + r) % 2 == 0 { Player::Red } else { Player::Yellow };
        for row in 0..ROWS {
            for col in 0..COLS {
                g.board[row][col] = Some(color(row, col));
            }
        }
        for row in 0..ROWS {
            for col in 0..COLS {
                assert!(!wins_at(&g.board, row, col), "unexpected four at {row},{col}");
            }
        }
        g.board[0][6] = None;
        g.current = color(0, 6);
        play(&mut g, 6);
        assert_eq!(g.outcome, Some(Outcome::Draw));
    }

    #[test]
    fn test_ai_takes_win_then_blocks() {
        let mut g = ConnectFour::with_seed(6);
        for col in 0..3 {
            g.board[ROWS - 1][col] = Some(Player::Yellow);
        }
        assert_eq!(g.choose_ai_column(), Some(3));

        let mut g = ConnectFour::with_seed(7);
        for row in 3..ROWS {
            g.board[row][5] = Some(Player::Red);
        }
        assert_eq!(g.choose_ai_column(), Some(5));
    }

    #[test]
    fn test_ai_moves_after_delay() {
        let mut g = ConnectFour::with_seed(8);
        g.toggle_ai();
        assert!(g.vs_ai);
        play(&mut g, 0);
        assert_eq!(g.current, Player::Yellow);
        assert_eq!(g.ai_wait_ms, Some(AI_DELAY_MS));
        for _ in 0..40 {
            g.update(16);
        }
        settle(&mut g);
        assert_eq!(g.moves, 2);
        assert_eq!(g.current, Player::Red);
    }
}
