use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const LEAD_IN_MS: u64 = 500;
const SHOW_MS: u64 = 500;
const GAP_MS: u64 = 200;
const STEP_MS: u64 = LEAD_IN_MS + SHOW_MS + GAP_MS;
const PRESS_MS: u64 = 300;
const NEXT_ROUND_MS: u64 = 1000;

/// (idle, lit)
const BUTTONS: [(Color, Color); 4] = [
    (Color::Rgb(170, 0, 0), Color::Rgb(255, 102, 102)),
    (Color::Rgb(0, 170, 0), Color::Rgb(102, 255, 102)),
    (Color::Rgb(0, 0, 170), Color::Rgb(102, 102, 255)),
    (Color::Rgb(170, 170, 0), Color::Rgb(255, 255, 102)),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Waiting for Space before the first round
    Ready,
    /// Playing the sequence back; `t_ms` since playback began
    Showing { t_ms: u64 },
    Input,
    /// Sequence repeated, next round pending
    Advancing { left_ms: u64 },
    Over,
}

pub struct Simon {
    sequence: Vec<usize>,
    entered: usize,
    level: u32,
    best: u32,
    phase: Phase,
    /// Button lit by a press, with time left
    pressed: Option<(usize, u64)>,
    rng: StdRng,
}

impl Simon {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            sequence: Vec::new(),
            entered: 0,
            level: 1,
            best: 0,
            phase: Phase::Ready,
            pressed: None,
            rng,
        }
    }

    fn next_round(&mut self) {
        self.sequence.push(self.rng.gen_range(0..4));
        self.entered = 0;
        self.phase = Phase::Showing { t_ms: 0 };
    }

    /// Button lit by playback at this moment, if any
    fn showing(&self) -> Option<usize> {
        let Phase::Showing { t_ms } = self.phase else { return None };
        let step = (t_ms / STEP_MS) as usize;
        let within = t_ms % STEP_MS;
        let lit = (LEAD_IN_MS..LEAD_IN_MS + SHOW_MS).contains(&within);
        lit.then(|| self.sequence.get(step).copied()).flatten()
    }

    fn press(&mut self, button: usize) {
        if self.phase != Phase::Input {
            return;
        }
        self.pressed = Some((button, PRESS_MS));
        if self.sequence[self.entered] != button {
            self.phase = Phase::Over;
            debug!(level = self.level, "simon wrong button");
            return;
        }
        self.entered += 1;
        if self.entered == self.sequence.len() {
            self.phase = Phase::Advancing { left_ms: NEXT_ROUND_MS };
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width as u16, height as u16, Color::Black);
        let fit = GridFit::new(2, 2, width, height);
        let lit = self.showing().or(self.pressed.map(|(b, _)| b));

        for (i, &(idle, bright)) in BUTTONS.iter().enumerate() {
            let (x, y) = fit.origin(i % 2, i / 2);
            let bg = if lit == Some(i) { bright } else { idle };
            c.block(x + 1, y, fit.cw - 2, (fit.ch - 1).max(1), bg);
            let label = char::from(b'1' + i as u8);
            c.put_styled(x + fit.cw / 2, y + fit.ch / 2, label, Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD));
        }
        c
    }
}

impl Game for Simon {
    fn update(&mut self, dt_ms: u64) {
        if let Some((b, left)) = self.pressed {
            self.pressed = (left > dt_ms).then(|| (b, left - dt_ms));
        }
        match self.phase {
            Phase::Showing { t_ms } => {
                let t_ms = t_ms + dt_ms;
                if t_ms >= STEP_MS * self.sequence.len() as u64 {
                    self.phase = Phase::Input;
                } else {
                    self.phase = Phase::Showing { t_ms };
                }
            }
            Phase::Advancing { left_ms } => {
                if left_ms > dt_ms {
                    self.phase = Phase::Advancing { left_ms: left_ms - dt_ms };
                } else {
                    self.level += 1;
                    self.next_round();
                }
            }
            _ => {}
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Enter | KeyCode::Char(' ') if self.phase == Phase::Over => {
                self.reset();
                self.next_round();
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.phase == Phase::Ready => self.next_round(),
            KeyCode::Char(d @ '1'..='4') => self.press(d as usize - '1' as usize),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "🔵 Simon", Color::Rgb(160, 200, 160));

        let turn = match self.phase {
            Phase::Showing { .. } | Phase::Advancing { .. } => "Watch...",
            Phase::Input => "Your turn",
            _ => "",
        };
        let parts = vec![
            (format!("Level: {}", self.level), Color::Yellow),
            (format!("🏆 Best: {}", self.best.max(self.level)), Color::Rgb(255, 215, 0)),
            (turn.to_string(), Color::Cyan),
        ];
        canvas::render_lines(frame, status, canvas::status_line("🔵", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = match self.phase {
            Phase::Over => canvas::game_over_line(&format!("You reached level {}!", self.level)),
            Phase::Ready => canvas::help_line(&[("SPACE", "Start"), ("1-4", "Buttons")]),
            _ => canvas::help_line(&[("1-4", "Press button"), ("R", "Restart")]),
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.level);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Simon::with_rng(rng);
        self.best = best;
    }

    fn get_score(&self) -> u32 {
        self.level
    }

    fn is_game_over(&self) -> bool {
        self.phase == Phase::Over
    }

    fn set_best(&mut self, best: u32) {
        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(seed: u64) -> Simon {
        let mut s = Simon::with_seed(seed);
        s.handle_input(KeyEvent::from(KeyCode::Char(' ')));
        s
    }

    fn finish_playback(s: &mut Simon) {
        while matches!(s.phase, Phase::Showing { .. }) {
            s.update(16);
        }
    }

    #[test]
    fn test_playback_timing() {
        let mut s = started(1);
        assert_eq!(s.sequence.len(), 1);
        s.update(400);
        assert_eq!(s.showing(), None);
        s.update(200);
        assert_eq!(s.showing(), Some(s.sequence[0]));
        s.update(500);
        assert_eq!(s.showing(), None);
        assert!(matches!(s.phase, Phase::Showing { .. }));
        s.update(100);
        assert_eq!(s.phase, Phase::Input);
    }

    #[test]
    fn test_input_ignored_during_playback() {
        let mut s = started(2);
        let b = s.sequence[0];
        s.press((b + 1) % 4);
        assert!(!s.is_game_over());
    }

    #[test]
    fn test_correct_sequence_advances() {
        let mut s = started(3);
        finish_playback(&mut s);
        s.press(s.sequence[0]);
        assert!(matches!(s.phase, Phase::Advancing { .. }));
        s.update(999);
        assert_eq!(s.level, 1);
        s.update(1);
        assert_eq!(s.level, 2);
        assert_eq!(s.sequence.len(), 2);
        finish_playback(&mut s);
        s.press(s.sequence[0]);
        assert_eq!(s.phase, Phase::Input);
    }

    #[test]
    fn test_wrong_press_ends() {
        let mut s = started(4);
        finish_playback(&mut s);
        s.press((s.sequence[0] + 1) % 4);
        assert!(s.is_game_over());
        assert_eq!(s.get_score(), 1);
        assert!(s.pressed.is_some());
    }
}
