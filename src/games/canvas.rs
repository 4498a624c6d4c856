//! Character-grid drawing shared by the game screens.
//!
//! Games simulate in their own logical units and project onto a grid of
//! styled cells at render time, one `Line` per row.

use ratatui::prelude::*;
use ratatui::widgets::*;

pub const SEP: &str = " │ ";

const BRAILLE_BASE: u32 = 0x2800;
/// Dot bit for [row][column] within a braille cell
const BRAILLE_BITS: [[u32; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

pub struct Canvas {
    cells: Vec<Vec<(char, Style)>>,
    width: usize,
    height: usize,
    bg: Color,
}

impl Canvas {
    pub fn new(width: u16, height: u16, bg: Color) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self {
            cells: vec![vec![(' ', Style::default().bg(bg)); w]; h],
            width: w,
            height: h,
            bg,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn put(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        let style = Style::default().fg(fg).bg(self.bg);
        self.put_styled(x, y, ch, style);
    }

    pub fn put_styled(&mut self, x: i32, y: i32, ch: char, style: Style) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.cells[y][x] = (ch, style);
        }
    }

    /// Only writes where the cell is still blank
    pub fn put_under(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        if x >= 0 && y >= 0 && (y as usize) < self.height && (x as usize) < self.width && self.cells[y as usize][x as usize].0 == ' ' {
            self.put(x, y, ch, fg);
        }
    }

    pub fn text(&mut self, x: i32, y: i32, s: &str, style: Style) {
        for (i, ch) in s.chars().enumerate() {
            self.put_styled(x + i as i32, y, ch, style);
        }
    }

    /// Text centred on row `y`
    pub fn text_centered(&mut self, y: i32, s: &str, style: Style) {
        let len = s.chars().count() as i32;
        let x = (self.width as i32 - len) / 2;
        self.text(x, y, s, style);
    }

    pub fn fill(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, ch: char, style: Style) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.put_styled(x, y, ch, style);
            }
        }
    }

    /// Fill a rectangle given in logical units, at least one cell in size
    pub fn rect(&mut self, scale: &Scale, x: f32, y: f32, w: f32, h: f32, ch: char, fg: Color) {
        let (x0, y0) = scale.cell(x, y);
        let (x1, y1) = scale.cell(x + w, y + h);
        let style = Style::default().fg(fg).bg(self.bg);
        self.fill(x0, y0, x1.max(x0 + 1), y1.max(y0 + 1), ch, style);
    }

    pub fn dot(&mut self, scale: &Scale, x: f32, y: f32, ch: char, fg: Color) {
        let (cx, cy) = scale.cell(x, y);
        self.put(cx, cy, ch, fg);
    }

    /// Solid block with a background colour, used for tiles and cards
    pub fn block(&mut self, x: i32, y: i32, w: i32, h: i32, bg: Color) {
        let style = Style::default().bg(bg);
        self.fill(x, y, x + w, y + h, ' ', style);
    }

    pub fn border(&mut self, fg: Color) {
        let (w, h) = (self.width as i32, self.height as i32);
        if w < 2 || h < 2 {
            return;
        }
        for x in 1..w - 1 {
            self.put(x, 0, '─', fg);
            self.put(x, h - 1, '─', fg);
        }
        for y in 1..h - 1 {
            self.put(0, y, '│', fg);
            self.put(w - 1, y, '│', fg);
        }
        self.put(0, 0, '╭', fg);
        self.put(w - 1, 0, '╮', fg);
        self.put(0, h - 1, '╰', fg);
        self.put(w - 1, h - 1, '╯', fg);
    }

    /// Sets one braille sub-dot. Each cell holds a 2×4 dot matrix, so
    /// `bx`/`by` address a grid twice as wide and four times as tall.
    pub fn braille_dot(&mut self, bx: i32, by: i32, fg: Color) {
        if bx < 0 || by < 0 {
            return;
        }
        let (cx, cy) = ((bx / 2) as usize, (by / 4) as usize);
        if cx >= self.width || cy >= self.height {
            return;
        }
        let bit = BRAILLE_BITS[(by % 4) as usize][(bx % 2) as usize];
        let cur = self.cells[cy][cx].0 as u32;
        let old = if (BRAILLE_BASE..BRAILLE_BASE + 0x100).contains(&cur) { cur - BRAILLE_BASE } else { 0 };
        let ch = char::from_u32(BRAILLE_BASE + (old | bit)).unwrap_or('⣿');
        self.cells[cy][cx] = (ch, Style::default().fg(fg).bg(self.bg));
    }

    /// Line between two logical points at braille resolution
    pub fn braille_line(&mut self, scale: &Scale, from: (f32, f32), to: (f32, f32), fg: Color) {
        let sub = |(x, y): (f32, f32)| ((x * scale.sx * 2.0).floor() as i32, (y * scale.sy * 4.0).floor() as i32);
        let ((mut x, mut y), (x1, y1)) = (sub(from), sub(to));
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.braille_dot(x, y, fg);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Closed outline through `points`
    pub fn braille_polygon(&mut self, scale: &Scale, points: &[(f32, f32)], fg: Color) {
        for (i, &a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            self.braille_line(scale, a, b, fg);
        }
    }

    pub fn into_lines(self) -> Vec<Line<'static>> {
        self.cells
            .into_iter()
            .map(|row| {
                let spans: Vec<Span<'static>> = row
                    .into_iter()
                    .map(|(ch, style)| Span::styled(String::from(ch), style))
                    .collect();
                Line::from(spans)
            })
            .collect()
    }
}

/// Projection from logical field units to canvas cells.
#[derive(Clone, Copy, Debug)]
pub struct Scale {
    pub sx: f32,
    pub sy: f32,
}

impl Scale {
    pub fn new(field_w: f32, field_h: f32, cols: usize, rows: usize) -> Self {
        Self {
            sx: cols as f32 / field_w,
            sy: rows as f32 / field_h,
        }
    }

    pub fn cell(&self, x: f32, y: f32) -> (i32, i32) {
        ((x * self.sx).floor() as i32, (y * self.sy).floor() as i32)
    }
}

/// Board layout for cell-based games: each board cell becomes
/// `cw`×`ch` characters, centred in the available area.
#[derive(Clone, Copy, Debug)]
pub struct GridFit {
    pub cw: i32,
    pub ch: i32,
    pub ox: i32,
    pub oy: i32,
}

impl GridFit {
    pub fn new(cols: usize, rows: usize, width: usize, height: usize) -> Self {
        let (cols, rows) = (cols.max(1) as i32, rows.max(1) as i32);
        let (w, h) = (width as i32, height as i32);
        // Terminal cells are roughly twice as tall as wide
        let ch = (h / rows).min(w / (cols * 2)).max(1);
        let cw = (ch * 2).min((w / cols).max(1));
        Self {
            cw,
            ch,
            ox: ((w - cw * cols) / 2).max(0),
            oy: ((h - ch * rows) / 2).max(0),
        }
    }

    pub fn origin(&self, col: usize, row: usize) -> (i32, i32) {
        (self.ox + col as i32 * self.cw, self.oy + row as i32 * self.ch)
    }
}

pub fn game_block(title: &str, accent: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(format!(" {} ", title))
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
}

/// Draws the frame block and returns the status, field and help rows.
pub fn screen(frame: &mut Frame, area: Rect, title: &str, accent: Color) -> [Rect; 3] {
    let block = game_block(title, accent);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(inner);
    [chunks[0], chunks[1], chunks[2]]
}

pub fn status_line(icon: &str, parts: Vec<(String, Color)>) -> Line<'static> {
    let mut spans = vec![Span::raw(format!(" {} ", icon))];
    for (i, (text, color)) in parts.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(SEP, Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)));
    }
    Line::from(spans)
}

pub fn help_line(keys: &[(&str, &str)]) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (key, what) in keys {
        spans.push(Span::styled(format!("{} ", key), Style::default().fg(Color::Rgb(80, 200, 255))));
        spans.push(Span::styled(format!("{} ", what), Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))));
    }
    spans.push(Span::styled("Esc Menu", Style::default().fg(Color::DarkGray)));
    Line::from(spans)
}

pub fn game_over_line(msg: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" 💀 {} ", msg), Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::styled("Press ENTER to restart, Esc for menu", Style::default().fg(Color::Gray)),
    ])
}

pub fn won_line(msg: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" 🎉 {} ", msg), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::styled("Press ENTER to play again", Style::default().fg(Color::Gray)),
    ])
}

pub fn paused_line() -> Line<'static> {
    Line::from(Span::styled(
        " ⏸ PAUSED - Press P to resume ",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

pub fn render_lines(frame: &mut Frame, area: Rect, line: Line<'static>) {
    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_canvas(frame: &mut Frame, area: Rect, canvas: Canvas) {
    frame.render_widget(Paragraph::new(canvas.into_lines()), area);
}

pub fn mmss(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_ignores_out_of_bounds() {
        let mut c = Canvas::new(4, 2, Color::Black);
        c.put(-1, 0, 'x', Color::White);
        c.put(4, 1, 'x', Color::White);
        c.put(3, 1, 'o', Color::White);
        let lines = c.into_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].spans[3].content, "o");
    }

    #[test]
    fn test_braille_dots_merge_in_a_cell() {
        let mut c = Canvas::new(2, 1, Color::Black);
        c.braille_dot(0, 0, Color::White);
        c.braille_dot(1, 3, Color::White);
        c.braille_dot(9, 9, Color::White);
        let lines = c.into_lines();
        assert_eq!(lines[0].spans[0].content, "\u{2881}");
        assert_eq!(lines[0].spans[1].content, " ");
    }

    #[test]
    fn test_braille_line_spans_cells() {
        let mut c = Canvas::new(4, 1, Color::Black);
        let scale = Scale::new(4.0, 1.0, 4, 1);
        c.braille_line(&scale, (0.0, 0.5), (3.9, 0.5), Color::White);
        let lines = c.into_lines();
        assert!(lines[0].spans.iter().all(|s| s.content != " "));
    }

    #[test]
    fn test_scale_maps_field_corners() {
        let s = Scale::new(800.0, 600.0, 80, 30);
        assert_eq!(s.cell(0.0, 0.0), (0, 0));
        assert_eq!(s.cell(799.0, 599.0), (79, 29));
        assert_eq!(s.cell(400.0, 300.0), (40, 15));
    }

    #[test]
    fn test_grid_fit_keeps_board_inside() {
        let fit = GridFit::new(10, 20, 60, 22);
        assert_eq!(fit.ch, 1);
        assert_eq!(fit.cw, 2);
        let (x, y) = fit.origin(9, 19);
        assert!(x + fit.cw <= 60 && y + fit.ch <= 22);
    }

    #[test]
    fn test_mmss() {
        assert_eq!(mmss(0), "00:00");
        assert_eq!(mmss(125_400), "02:05");
    }
}
