use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const PAIRS: usize = 8;
const SIDE: usize = 4;
const MISMATCH_MS: u64 = 1000;

/// Card faces, one per pair
const FACES: [(char, Color); PAIRS] = [
    ('♥', Color::Rgb(239, 68, 68)),
    ('★', Color::Rgb(250, 204, 21)),
    ('♣', Color::Rgb(34, 197, 94)),
    ('◆', Color::Rgb(249, 115, 22)),
    ('♠', Color::Rgb(148, 163, 184)),
    ('●', Color::Rgb(168, 85, 247)),
    ('▲', Color::Rgb(59, 130, 246)),
    ('✿', Color::Rgb(236, 72, 153)),
];

#[derive(Clone, Copy, Debug)]
struct Card {
    face: usize,
    up: bool,
    matched: bool,
}

pub struct Memory {
    cards: Vec<Card>,
    cursor: usize,
    first: Option<usize>,
    /// Mismatched pair waiting to flip back, with time left
    mismatch: Option<(usize, usize, u64)>,
    moves: u32,
    matches: usize,
    rng: StdRng,
}

impl Memory {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let mut faces: Vec<usize> = (0..PAIRS).chain(0..PAIRS).collect();
        faces.shuffle(&mut rng);
        Self {
            cards: faces.into_iter().map(|face| Card { face, up: false, matched: false }).collect(),
            cursor: 0,
            first: None,
            mismatch: None,
            moves: 0,
            matches: 0,
            rng,
        }
    }

    fn won(&self) -> bool {
        self.matches == PAIRS
    }

    fn flip(&mut self, i: usize) {
        if self.mismatch.is_some() || self.won() {
            return;
        }
        let card = self.cards[i];
        if card.up || card.matched {
            return;
        }
        self.cards[i].up = true;

        let Some(first) = self.first.take() else {
            self.first = Some(i);
            return;
        };
        self.moves += 1;
        if self.cards[first].face == card.face {
            self.cards[first].matched = true;
            self.cards[i].matched = true;
            self.matches += 1;
            if self.won() {
                debug!(moves = self.moves, "memory cleared");
            }
        } else {
            self.mismatch = Some((first, i, MISMATCH_MS));
        }
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let x = (self.cursor % SIDE) as i32 + dx;
        let y = (self.cursor / SIDE) as i32 + dy;
        if (0..SIDE as i32).contains(&x) && (0..SIDE as i32).contains(&y) {
            self.cursor = y as usize * SIDE + x as usize;
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Rgb(30, 27, 75));
        let fit = GridFit::new(SIDE, SIDE, width, height);

        for (i, card) in self.cards.iter().enumerate() {
            let (x, y) = fit.origin(i % SIDE, i / SIDE);
            let bg = if card.matched {
                Color::Rgb(22, 101, 52)
            } else if card.up {
                Color::Rgb(241, 245, 249)
            } else {
                Color::Rgb(79, 70, 229)
            };
            let (w, h) = (fit.cw - 1, (fit.ch - 1).max(1));
            c.block(x, y, w, h, bg);
            let (ch, fg) = if card.up || card.matched { FACES[card.face] } else { ('?', Color::White) };
            let style = Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD);
            c.put_styled(x + w / 2, y + h / 2, ch, style);
            if i == self.cursor {
                let mark = Style::default().fg(Color::Yellow).bg(Color::Rgb(30, 27, 75));
                c.put_styled(x + w, y + h / 2, '◀', mark);
            }
        }
        c
    }
}

impl Game for Memory {
    fn update(&mut self, dt_ms: u64) {
        let Some((a, b, left)) = self.mismatch else { return };
        let left = left.saturating_sub(dt_ms);
        if left == 0 {
            self.cards[a].up = false;
            self.cards[b].up = false;
            self.mismatch = None;
        } else {
            self.mismatch = Some((a, b, left));
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Enter | KeyCode::Char(' ') if self.won() => self.reset(),
            KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Down => self.move_cursor(0, 1),
            KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Enter | KeyCode::Char(' ') => self.flip(self.cursor),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🃏 Memory", Color::Rgb(160, 200, 160));

        let parts = vec![
            (format!("Moves: {}", self.moves), Color::Yellow),
            (format!("Matches: {}/{}", self.matches, PAIRS), Color::Green),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🃏", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.won() {
            canvas::won_line(&format!("You won in {} moves!", self.moves))
        } else {
            canvas::help_line(&[("↑↓←→", "Cursor"), ("SPACE", "Flip"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Memory::with_rng(rng);
    }

    fn get_score(&self) -> u32 {
        self.moves
    }

    fn is_game_over(&self) -> bool {
        self.won()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_of(m: &Memory, i: usize) -> usize {
        (0..m.cards.len()).find(|&j| j != i && m.cards[j].face == m.cards[i].face).unwrap()
    }

    #[test]
    fn test_deck_has_eight_pairs() {
        let m = Memory::with_seed(1);
        assert_eq!(m.cards.len(), 16);
        for face in 0..PAIRS {
            assert_eq!(m.cards.iter().filter(|c| c.face == face).count(), 2);
        }
    }

    #[test]
    fn test_match_stays_up() {
        let mut m = Memory::with_seed(2);
        let other = pair_of(&m, 0);
        m.flip(0);
        m.flip(other);
        assert_eq!(m.moves, 1);
        assert_eq!(m.matches, 1);
        assert!(m.cards[0].matched && m.cards[other].matched);
    }

    #[test]
    fn test_same_card_twice_is_ignored() {
        let mut m = Memory::with_seed(3);
        m.flip(5);
        m.flip(5);
        assert_eq!(m.moves, 0);
        assert_eq!(m.first, Some(5));
    }

    #[test]
    fn test_mismatch_blocks_then_flips_back() {
        let mut m = Memory::with_seed(4);
        let wrong = (1..16).find(|&j| m.cards[j].face != m.cards[0].face).unwrap();
        let third = (1..16).find(|&j| j != wrong).unwrap();
        m.flip(0);
        m.flip(wrong);
        assert_eq!(m.moves, 1);
        m.flip(third);
        assert!(!m.cards[third].up);
        m.update(999);
        assert!(m.cards[0].up);
        m.update(1);
        assert!(!m.cards[0].up && !m.cards[wrong].up);
        m.flip(third);
        assert!(m.cards[third].up);
    }

    #[test]
    fn test_all_pairs_wins() {
        let mut m = Memory::with_seed(5);
        for i in 0..16 {
            if !m.cards[i].matched {
                let j = pair_of(&m, i);
                m.flip(i);
                m.flip(j);
            }
        }
        assert!(m.is_game_over());
        assert_eq!(m.moves, 8);
    }
}
