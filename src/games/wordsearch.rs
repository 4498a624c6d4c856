use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const SIZE: usize = 12;
const PLACE_ATTEMPTS: usize = 100;
const MIN_SELECTION: usize = 3;
const LIST_WIDTH: usize = 14;

const THEMES: [(&str, [&str; 8]); 4] = [
    ("Programming", ["JAVASCRIPT", "PYTHON", "RUBY", "JAVA", "SWIFT", "RUST", "GOLANG", "PHP"]),
    ("Food", ["PIZZA", "BURGER", "PASTA", "SUSHI", "TACOS", "CURRY", "SALAD", "STEAK"]),
    ("Sports", ["SOCCER", "TENNIS", "HOCKEY", "BOXING", "RACING", "GOLF", "RUGBY", "BASEBALL"]),
    ("Music", ["GUITAR", "PIANO", "DRUMS", "VIOLIN", "FLUTE", "SAXOPHONE", "TRUMPET", "CELLO"]),
];

const DIRS: [(i32, i32); 8] = [(0, 1), (1, 0), (1, 1), (-1, 1), (0, -1), (-1, 0), (-1, -1), (1, -1)];

type Cell = (usize, usize);

#[derive(Clone, Debug)]
struct Word {
    text: &'static str,
    found: bool,
    /// Where the word was hidden, first letter first
    cells: Vec<Cell>,
}

/// Cells along `dir` from `(row, col)`, or None if the word would leave the
/// grid or clash with a different letter already there.
fn fit_word(grid: &[[Option<char>; SIZE]; SIZE], word: &str, (row, col): Cell, (dr, dc): (i32, i32)) -> Option<Vec<Cell>> {
    word.chars()
        .enumerate()
        .map(|(i, ch)| {
            let r = row as i32 + i as i32 * dr;
            let c = col as i32 + i as i32 * dc;
            if !(0..SIZE as i32).contains(&r) || !(0..SIZE as i32).contains(&c) {
                return None;
            }
            let (r, c) = (r as usize, c as usize);
            match grid[r][c] {
                Some(existing) if existing != ch => None,
                _ => Some((r, c)),
            }
        })
        .collect()
}

/// Straight run from `start` to `end` inclusive: a row, column or 45° diagonal.
fn line_between(start: Cell, end: Cell) -> Vec<Cell> {
    let dr = end.0 as i32 - start.0 as i32;
    let dc = end.1 as i32 - start.1 as i32;
    let steps = dr.abs().max(dc.abs());
    if steps == 0 || (dr != 0 && dc != 0 && dr.abs() != dc.abs()) {
        return Vec::new();
    }
    (0..=steps)
        .map(|i| {
            (
                (start.0 as i32 + i * dr.signum()) as usize,
                (start.1 as i32 + i * dc.signum()) as usize,
            )
        })
        .collect()
}

pub struct WordSearch {
    grid: [[char; SIZE]; SIZE],
    words: Vec<Word>,
    theme: usize,
    cursor: Cell,
    anchor: Option<Cell>,
    rng: StdRng,
}

impl WordSearch {
    pub fn new() -> Self {
        let mut rng = StdRng::from_entropy();
        let theme = rng.gen_range(0..THEMES.len());
        Self::build(rng, theme)
    }

    pub fn with_seed(seed: u64, theme: usize) -> Self {
        Self::build(StdRng::seed_from_u64(seed), theme % THEMES.len())
    }

    fn build(mut rng: StdRng, theme: usize) -> Self {
        let mut grid = [[None; SIZE]; SIZE];
        let mut words = Vec::new();
        for text in THEMES[theme].1 {
            let cells = (0..PLACE_ATTEMPTS).find_map(|_| {
                let dir = DIRS[rng.gen_range(0..DIRS.len())];
                let at = (rng.gen_range(0..SIZE), rng.gen_range(0..SIZE));
                fit_word(&grid, text, at, dir)
            });
            let Some(cells) = cells else {
                debug!(word = text, "word search could not place word");
                continue;
            };
            for (&(r, c), ch) in cells.iter().zip(text.chars()) {
                grid[r][c] = Some(ch);
            }
            words.push(Word { text, found: false, cells });
        }

        let mut letters = [[' '; SIZE]; SIZE];
        for (r, row) in grid.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                letters[r][c] = cell.unwrap_or_else(|| char::from(b'A' + rng.gen_range(0..26u8)));
            }
        }
        Self { grid: letters, words, theme, cursor: (0, 0), anchor: None, rng }
    }

    fn found(&self) -> usize {
        self.words.iter().filter(|w| w.found).count()
    }

    fn won(&self) -> bool {
        self.found() == self.words.len()
    }

    fn read(&self, cells: &[Cell]) -> String {
        cells.iter().map(|&(r, c)| self.grid[r][c]).collect()
    }

    /// Checks a finished selection against the remaining words.
    fn select(&mut self, start: Cell, end: Cell) -> bool {
        let cells = line_between(start, end);
        if cells.len() < MIN_SELECTION {
            return false;
        }
        let forward = self.read(&cells);
        let backward: String = forward.chars().rev().collect();
        let Some(word) = self
            .words
            .iter_mut()
            .find(|w| !w.found && (w.text == forward || w.text == backward))
        else {
            return false;
        };
        word.found = true;
        word.cells = cells;
        debug!(word = word.text, "word search found word");
        if self.won() {
            debug!(theme = THEMES[self.theme].0, "word search complete");
        }
        true
    }

    fn mark(&mut self) {
        if self.won() {
            return;
        }
        match self.anchor.take() {
            None => self.anchor = Some(self.cursor),
            Some(start) => {
                self.select(start, self.cursor);
            }
        }
    }

    fn move_cursor(&mut self, dr: i32, dc: i32) {
        let r = self.cursor.0 as i32 + dr;
        let c = self.cursor.1 as i32 + dc;
        if (0..SIZE as i32).contains(&r) && (0..SIZE as i32).contains(&c) {
            self.cursor = (r as usize, c as usize);
        }
    }

    fn next_theme(&mut self) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = WordSearch::build(rng, (self.theme + 1) % THEMES.len());
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let bg = Color::Rgb(31, 41, 55);
        let mut c = Canvas::new(width as u16, height as u16, bg);
        let fit = GridFit::new(SIZE, SIZE, width.saturating_sub(LIST_WIDTH), height);

        let found: Vec<Cell> = self.words.iter().filter(|w| w.found).flat_map(|w| w.cells.iter().copied()).collect();
        let selecting = self.anchor.map(|a| line_between(a, self.cursor)).unwrap_or_default();

        for r in 0..SIZE {
            for col in 0..SIZE {
                let (x, y) = fit.origin(col, r);
                let cell_bg = if (r, col) == self.cursor {
                    Color::Rgb(202, 138, 4)
                } else if selecting.contains(&(r, col)) || self.anchor == Some((r, col)) {
                    Color::Rgb(37, 99, 235)
                } else if found.contains(&(r, col)) {
                    Color::Rgb(6, 95, 70)
                } else {
                    Color::Rgb(55, 65, 81)
                };
                let fg = if found.contains(&(r, col)) { Color::Rgb(16, 185, 129) } else { Color::White };
                let (w, h) = ((fit.cw - 1).max(1), (fit.ch - 1).max(1));
                c.block(x, y, w, h, cell_bg);
                let style = Style::default().fg(fg).bg(cell_bg).add_modifier(Modifier::BOLD);
                c.put_styled(x + w / 2, y + h / 2, self.grid[r][col], style);
            }
        }

        let list_x = width.saturating_sub(LIST_WIDTH) as i32 + 1;
        let title = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        c.text(list_x, 0, THEMES[self.theme].0, title);
        for (i, w) in self.words.iter().enumerate() {
            let style = if w.found {
                Style::default().fg(Color::Rgb(16, 185, 129)).add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };
            c.text(list_x, i as i32 + 2, w.text, style);
        }
        c
    }
}

impl Game for WordSearch {
    fn update(&mut self, _dt_ms: u64) {}

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('t') | KeyCode::Char('T') => self.next_theme(),
            KeyCode::Enter | KeyCode::Char(' ') if self.won() => self.reset(),
            KeyCode::Esc if self.anchor.is_some() => self.anchor = None,
            KeyCode::Up => self.move_cursor(-1, 0),
            KeyCode::Down => self.move_cursor(1, 0),
            KeyCode::Left => self.move_cursor(0, -1),
            KeyCode::Right => self.move_cursor(0, 1),
            KeyCode::Enter | KeyCode::Char(' ') => self.mark(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🔤 Word Search", Color::Rgb(160, 200, 160));

        let parts = vec![
            (format!("Theme: {}", THEMES[self.theme].0), Color::Cyan),
            (format!("Found: {}/{}", self.found(), self.words.len()), Color::Green),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🔤", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.won() {
            canvas::won_line("You found all the words!")
        } else if self.anchor.is_some() {
            canvas::help_line(&[("↑↓←→", "Extend"), ("SPACE", "Mark end"), ("ESC", "Cancel")])
        } else {
            canvas::help_line(&[("↑↓←→", "Cursor"), ("SPACE", "Mark start"), ("T", "Next theme"), ("R", "New grid")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = WordSearch::build(rng, self.theme);
    }

    fn get_score(&self) -> u32 {
        self.found() as u32
    }

    fn is_game_over(&self) -> bool {
        self.won()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_words_read_back() {
        for theme in 0..THEMES.len() {
            let ws = WordSearch::with_seed(11, theme);
            assert!(!ws.words.is_empty());
            for w in &ws.words {
                assert_eq!(ws.read(&w.cells), w.text);
            }
            assert!(ws.grid.iter().flatten().all(|ch| ch.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_line_between_rejects_bends() {
        assert_eq!(line_between((0, 0), (0, 3)).len(), 4);
        assert_eq!(line_between((5, 5), (2, 2)), vec![(5, 5), (4, 4), (3, 3), (2, 2)]);
        assert!(line_between((0, 0), (1, 2)).is_empty());
        assert!(line_between((3, 3), (3, 3)).is_empty());
    }

    #[test]
    fn test_selecting_a_word_either_way() {
        let mut ws = WordSearch::with_seed(3, 1);
        let first = ws.words[0].cells.clone();
        let (start, end) = (first[0], first[first.len() - 1]);
        assert!(ws.select(start, end));
        assert!(ws.words[0].found);
        assert!(!ws.select(start, end));

        let second = ws.words[1].cells.clone();
        assert!(ws.select(second[second.len() - 1], second[0]));
        assert_eq!(ws.found(), 2);
    }

    #[test]
    fn test_short_selection_ignored() {
        let mut ws = WordSearch::with_seed(4, 0);
        assert!(!ws.select((0, 0), (0, 1)));
        assert_eq!(ws.found(), 0);
    }

    #[test]
    fn test_mark_uses_cursor_as_endpoints() {
        let mut ws = WordSearch::with_seed(5, 2);
        let cells = ws.words[0].cells.clone();
        ws.cursor = cells[0];
        ws.mark();
        assert_eq!(ws.anchor, Some(cells[0]));
        ws.cursor = cells[cells.len() - 1];
        ws.mark();
        assert!(ws.anchor.is_none());
        assert!(ws.words[0].found);
    }

    #[test]
    fn test_finding_everything_wins() {
        let mut ws = WordSearch::with_seed(6, 3);
        let spans: Vec<(Cell, Cell)> = ws
            .words
            .iter()
            .map(|w| (w.cells[0], w.cells[w.cells.len() - 1]))
            .collect();
        for (a, b) in spans {
            ws.select(a, b);
        }
        assert!(ws.is_game_over());
        assert_eq!(ws.get_score() as usize, ws.words.len());
    }

    #[test]
    fn test_next_theme_rotates() {
        let mut ws = WordSearch::with_seed(7, 3);
        ws.next_theme();
        assert_eq!(ws.theme, 0);
        assert_eq!(ws.found(), 0);
    }
}
