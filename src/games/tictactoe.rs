use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const AI_DELAY_MS: u64 = 500;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    fn glyph(self) -> char {
        match self {
            Mark::X => '✕',
            Mark::O => '◯',
        }
    }

    fn color(self) -> Color {
        match self {
            Mark::X => Color::Rgb(96, 165, 250),
            Mark::O => Color::Rgb(248, 113, 113),
        }
    }
}

type Board = [Option<Mark>; 9];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Win(Mark, [usize; 3]),
    Draw,
}

fn winner(board: &Board) -> Option<(Mark, [usize; 3])> {
    LINES.iter().find_map(|&[a, b, c]| match board[a] {
        Some(m) if board[b] == Some(m) && board[c] == Some(m) => Some((m, [a, b, c])),
        _ => None,
    })
}

fn outcome(board: &Board) -> Option<Outcome> {
    if let Some((m, line)) = winner(board) {
        Some(Outcome::Win(m, line))
    } else if board.iter().all(Option::is_some) {
        Some(Outcome::Draw)
    } else {
        None
    }
}

/// Score from O's point of view: +10 O wins, -10 X wins, 0 draw.
/// Returns the first best cell for `to_move`, scanning cells in order.
fn minimax(board: &mut Board, to_move: Mark) -> (i32, Option<usize>) {
    match winner(board) {
        Some((Mark::X, _)) => return (-10, None),
        Some((Mark::O, _)) => return (10, None),
        None => {}
    }
    let mut best: (i32, Option<usize>) = match to_move {
        Mark::O => (i32::MIN, None),
        Mark::X => (i32::MAX, None),
    };
    for i in 0..9 {
        if board[i].is_some() {
            continue;
        }
        board[i] = Some(to_move);
        let (score, _) = minimax(board, to_move.other());
        board[i] = None;
        let better = match to_move {
            Mark::O => score > best.0,
            Mark::X => score < best.0,
        };
        if better {
            best = (score, Some(i));
        }
    }
    if best.1.is_none() {
        return (0, None);
    }
    best
}

pub struct TicTacToe {
    board: Board,
    current: Mark,
    cursor: usize,
    outcome: Option<Outcome>,
    vs_ai: bool,
    ai_wait_ms: Option<u64>,
    x_wins: u32,
    o_wins: u32,
    draws: u32,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            current: Mark::X,
            cursor: 4,
            outcome: None,
            vs_ai: false,
            ai_wait_ms: None,
            x_wins: 0,
            o_wins: 0,
            draws: 0,
        }
    }

    fn ai_turn(&self) -> bool {
        self.vs_ai && self.current == Mark::O
    }

    fn place(&mut self, index: usize) -> bool {
        if self.outcome.is_some() || index >= 9 || self.board[index].is_some() {
            return false;
        }
        self.board[index] = Some(self.current);
        self.outcome = outcome(&self.board);
        match self.outcome {
            Some(Outcome::Win(Mark::X, _)) => self.x_wins += 1,
            Some(Outcome::Win(Mark::O, _)) => self.o_wins += 1,
            Some(Outcome::Draw) => self.draws += 1,
            None => {
                self.current = self.current.other();
                if self.ai_turn() {
                    self.ai_wait_ms = Some(AI_DELAY_MS);
                }
            }
        }
        if let Some(result) = self.outcome {
            debug!(?result, "tic-tac-toe round finished");
        }
        true
    }

    fn new_round(&mut self) {
        self.board = [None; 9];
        self.current = Mark::X;
        self.outcome = None;
        self.ai_wait_ms = None;
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(31, 41, 55));
        let fit = GridFit::new(3, 3, width, height);
        let grid = Color::Rgb(139, 92, 246);
        let win_line = match self.outcome {
            Some(Outcome::Win(_, line)) => Some(line),
            _ => None,
        };

        for i in 0..9 {
            let (x, y) = fit.origin(i % 3, i / 3);
            let highlight = win_line.is_some_and(|l| l.contains(&i));
            let bg = if highlight {
                Color::Rgb(120, 90, 20)
            } else if i == self.cursor && self.outcome.is_none() {
                Color::Rgb(55, 65, 81)
            } else {
                Color::Rgb(31, 41, 55)
            };
            c.block(x, y, fit.cw, fit.ch, bg);
            // Grid lines on the right and bottom edges
            if i % 3 < 2 {
                c.fill(x + fit.cw - 1, y, x + fit.cw, y + fit.ch, '┃', Style::default().fg(grid).bg(bg));
            }
            if i / 3 < 2 {
                c.fill(x, y + fit.ch - 1, x + fit.cw - 1, y + fit.ch, '━', Style::default().fg(grid).bg(bg));
            }
            match self.board[i] {
                Some(m) => {
                    let style = Style::default().fg(m.color()).bg(bg).add_modifier(Modifier::BOLD);
                    c.put_styled(x + fit.cw / 2, y + fit.ch / 2, m.glyph(), style);
                }
                None => {
                    let style = Style::default().fg(Color::Rgb(75, 85, 99)).bg(bg);
                    c.put_styled(x + fit.cw / 2, y + fit.ch / 2, char::from(b'1' + i as u8), style);
                }
            }
        }
        c
    }
}

impl Game for TicTacToe {
    fn update(&mut self, dt_ms: u64) {
        let Some(wait) = self.ai_wait_ms else { return };
        let left = wait.saturating_sub(dt_ms);
        if left > 0 {
            self.ai_wait_ms = Some(left);
            return;
        }
        self.ai_wait_ms = None;
        if let (_, Some(i)) = minimax(&mut self.board, Mark::O) {
            self.place(i);
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.new_round(),
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.vs_ai = !self.vs_ai;
                self.new_round();
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.outcome.is_some() => self.new_round(),
            _ if self.outcome.is_some() || self.ai_turn() => {}
            KeyCode::Char(d @ '1'..='9') => {
                self.cursor = d as usize - '1' as usize;
                self.place(self.cursor);
            }
            KeyCode::Up if self.cursor >= 3 => self.cursor -= 3,
            KeyCode::Down if self.cursor < 6 => self.cursor += 3,
            KeyCode::Left if self.cursor % 3 > 0 => self.cursor -= 1,
            KeyCode::Right if self.cursor % 3 < 2 => self.cursor += 1,
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.place(self.cursor);
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "❌ Tic-Tac-Toe", Color::Rgb(160, 200, 160));

        let mode = if self.vs_ai { "vs AI" } else { "2 Players" };
        let parts = vec![
            (format!("Turn: {:?}", self.current), self.current.color()),
            (format!("X: {}", self.x_wins), Mark::X.color()),
            (format!("O: {}", self.o_wins), Mark::O.color()),
            (format!("Draws: {}", self.draws), Color::Gray),
            (mode.to_string(), Color::Cyan),
        ];
        canvas::render_lines(frame, status, canvas::status_line("❌", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = match self.outcome {
            Some(Outcome::Win(m, _)) => canvas::won_line(&format!("{:?} wins!", m)),
            Some(Outcome::Draw) => canvas::won_line("It's a draw!"),
            None => canvas::help_line(&[("1-9", "Place"), ("↑↓←→ SPACE", "Cursor"), ("M", "Toggle AI"), ("R", "New round")]),
        };
        canvas::render_lines(frame, help, line);
    }

    /// Clears the board and the tallies
    fn reset(&mut self) {
        let vs_ai = self.vs_ai;
        *self = TicTacToe::new();
        self.vs_ai = vs_ai;
    }

    fn get_score(&self) -> u32 {
        self.x_wins
    }

    fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        let mut b = [None; 9];
        for (i, ch) in s.chars().enumerate() {
            b[i] = match ch {
                'X' => Some(Mark::X),
                'O' => Some(Mark::O),
                _ => None,
            };
        }
        b
    }

    #[test]
    fn test_row_win_and_tally() {
        let mut t = TicTacToe::new();
        for i in [0, 3, 1, 4, 2] {
            assert!(t.place(i));
        }
        assert_eq!(t.outcome, Some(Outcome::Win(Mark::X, [0, 1, 2])));
        assert_eq!(t.x_wins, 1);
        assert!(!t.place(8));
        t.new_round();
        assert_eq!(t.x_wins, 1);
        assert!(!t.is_game_over());
    }

    #[test]
    fn test_occupied_cell_rejected() {
        let mut t = TicTacToe::new();
        t.place(4);
        assert!(!t.place(4));
        assert_eq!(t.current, Mark::O);
    }

    #[test]
    fn test_draw_counted() {
        let mut t = TicTacToe::new();
        // X O X / X O O / O X X
        for i in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
            t.place(i);
        }
        assert_eq!(t.outcome, Some(Outcome::Draw));
        assert_eq!(t.draws, 1);
    }

    #[test]
    fn test_minimax_wins_and_blocks() {
        let mut b = board("OO.XX....");
        assert_eq!(minimax(&mut b, Mark::O).1, Some(2));
        let mut b = board("XX..O....");
        assert_eq!(minimax(&mut b, Mark::O).1, Some(2));
    }

    #[test]
    fn test_ai_never_loses() {
        // X opens in every cell; the AI must hold at least a draw
        for open in 0..9 {
            let mut t = TicTacToe::new();
            t.vs_ai = true;
            t.place(open);
            while t.outcome.is_none() {
                t.update(AI_DELAY_MS);
                if t.outcome.is_some() {
                    break;
                }
                let (_, reply) = minimax(&mut t.board.clone(), Mark::X);
                t.place(reply.unwrap());
            }
            assert!(!matches!(t.outcome, Some(Outcome::Win(Mark::X, _))), "lost after opening {open}");
        }
    }

    #[test]
    fn test_ai_waits_before_moving() {
        let mut t = TicTacToe::new();
        t.vs_ai = true;
        t.place(0);
        t.update(200);
        assert_eq!(t.board.iter().flatten().count(), 1);
        t.update(300);
        assert_eq!(t.board.iter().flatten().count(), 2);
        assert_eq!(t.current, Mark::X);
    }
}
