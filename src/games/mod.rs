pub mod canvas;
pub mod gems;
pub mod geom;
pub mod particles;
pub mod tiles;

pub mod arkanoid;
pub mod asteroids;
pub mod breakout;
pub mod bubbles;
pub mod colormatch;
pub mod connect4;
pub mod defender;
pub mod fibonacci;
pub mod flappy;
pub mod galaga;
pub mod invaders;
pub mod match3;
pub mod memory;
pub mod merge;
pub mod minesweeper;
pub mod missile;
pub mod pacman;
pub mod platformer;
pub mod pong;
pub mod reverse;
pub mod runner;
pub mod shooter;
pub mod simon;
pub mod slide;
pub mod snake;
pub mod sudoku;
pub mod tanks;
pub mod tetris;
pub mod tictactoe;
pub mod timeattack;
pub mod whack;
pub mod wordsearch;

use crossterm::event::KeyEvent;
use ratatui::prelude::*;

pub trait Game {
    /// Advance one frame. `dt_ms` is the wall time since the last frame.
    fn update(&mut self, dt_ms: u64);
    fn handle_input(&mut self, key: KeyEvent);
    fn render(&mut self, frame: &mut Frame, area: Rect);
    fn reset(&mut self);
    fn get_score(&self) -> u32;
    /// True once the current run has ended, whether lost or completed.
    fn is_game_over(&self) -> bool;
    /// Receives the persisted best score for display.
    fn set_best(&mut self, _best: u32) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameKind {
    PacMan,
    Breakout,
    Arkanoid,
    Tetris,
    Snake,
    Asteroids,
    Invaders,
    Galaga,
    Defender,
    Shooter,
    Tanks,
    Missile,
    Pong,
    Flappy,
    Runner,
    Platformer,
    Bubbles,
    Merge,
    Match3,
    ColorMatch,
    Reverse,
    TimeAttack,
    Fibonacci,
    Minesweeper,
    Sudoku,
    Slide,
    Memory,
    WordSearch,
    Connect4,
    TicTacToe,
    Simon,
    Whack,
}

impl GameKind {
    pub const ALL: [GameKind; 32] = [
        GameKind::PacMan,
        GameKind::Breakout,
        GameKind::Arkanoid,
        GameKind::Tetris,
        GameKind::Snake,
        GameKind::Asteroids,
        GameKind::Invaders,
        GameKind::Galaga,
        GameKind::Defender,
        GameKind::Shooter,
        GameKind::Tanks,
        GameKind::Missile,
        GameKind::Pong,
        GameKind::Flappy,
        GameKind::Runner,
        GameKind::Platformer,
        GameKind::Bubbles,
        GameKind::Merge,
        GameKind::Match3,
        GameKind::ColorMatch,
        GameKind::Reverse,
        GameKind::TimeAttack,
        GameKind::Fibonacci,
        GameKind::Minesweeper,
        GameKind::Sudoku,
        GameKind::Slide,
        GameKind::Memory,
        GameKind::WordSearch,
        GameKind::Connect4,
        GameKind::TicTacToe,
        GameKind::Simon,
        GameKind::Whack,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }

    /// Command-line name
    pub fn key(self) -> &'static str {
        match self {
            GameKind::PacMan => "pacman",
            GameKind::Breakout => "breakout",
            GameKind::Arkanoid => "arkanoid",
            GameKind::Tetris => "tetris",
            GameKind::Snake => "snake",
            GameKind::Asteroids => "asteroids",
            GameKind::Invaders => "invaders",
            GameKind::Galaga => "galaga",
            GameKind::Defender => "defender",
            GameKind::Shooter => "shooter",
            GameKind::Tanks => "tanks",
            GameKind::Missile => "missile",
            GameKind::Pong => "pong",
            GameKind::Flappy => "flappy",
            GameKind::Runner => "runner",
            GameKind::Platformer => "platformer",
            GameKind::Bubbles => "bubbles",
            GameKind::Merge => "merge",
            GameKind::Match3 => "match3",
            GameKind::ColorMatch => "colormatch",
            GameKind::Reverse => "reverse",
            GameKind::TimeAttack => "timeattack",
            GameKind::Fibonacci => "fibonacci",
            GameKind::Minesweeper => "minesweeper",
            GameKind::Sudoku => "sudoku",
            GameKind::Slide => "slide",
            GameKind::Memory => "memory",
            GameKind::WordSearch => "wordsearch",
            GameKind::Connect4 => "connect4",
            GameKind::TicTacToe => "tictactoe",
            GameKind::Simon => "simon",
            GameKind::Whack => "whack",
        }
    }

    pub fn from_key(key: &str) -> Option<GameKind> {
        let key = key.to_ascii_lowercase();
        Self::ALL.iter().copied().find(|k| k.key() == key)
    }

    pub fn title(self) -> &'static str {
        match self {
            GameKind::PacMan => "Pac-Man",
            GameKind::Breakout => "Breakout",
            GameKind::Arkanoid => "Arkanoid",
            GameKind::Tetris => "Tetris",
            GameKind::Snake => "Snake",
            GameKind::Asteroids => "Asteroids",
            GameKind::Invaders => "Invaders",
            GameKind::Galaga => "Galaga",
            GameKind::Defender => "Defender",
            GameKind::Shooter => "Shooter",
            GameKind::Tanks => "Tanks",
            GameKind::Missile => "Missile Cmd",
            GameKind::Pong => "Pong",
            GameKind::Flappy => "Flappy",
            GameKind::Runner => "Runner",
            GameKind::Platformer => "Dimensions",
            GameKind::Bubbles => "Bubbles",
            GameKind::Merge => "Fruit Merge",
            GameKind::Match3 => "Match 3",
            GameKind::ColorMatch => "Color Match",
            GameKind::Reverse => "2048 Reverse",
            GameKind::TimeAttack => "Time Attack",
            GameKind::Fibonacci => "Fibonacci",
            GameKind::Minesweeper => "Minesweeper",
            GameKind::Sudoku => "Sudoku",
            GameKind::Slide => "Slide Puzzle",
            GameKind::Memory => "Memory",
            GameKind::WordSearch => "Word Search",
            GameKind::Connect4 => "Connect 4",
            GameKind::TicTacToe => "Tic-Tac-Toe",
            GameKind::Simon => "Simon",
            GameKind::Whack => "Whack-a-Mole",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            GameKind::PacMan => "ᗧ",
            GameKind::Breakout => "🧱",
            GameKind::Arkanoid => "🏓",
            GameKind::Tetris => "▦",
            GameKind::Snake => "🐍",
            GameKind::Asteroids => "☄",
            GameKind::Invaders => "👾",
            GameKind::Galaga => "🐝",
            GameKind::Defender => "🚀",
            GameKind::Shooter => "🔫",
            GameKind::Tanks => "🪖",
            GameKind::Missile => "🎯",
            GameKind::Pong => "●",
            GameKind::Flappy => "🐤",
            GameKind::Runner => "🏃",
            GameKind::Platformer => "🌟",
            GameKind::Bubbles => "🫧",
            GameKind::Merge => "🍉",
            GameKind::Match3 => "💎",
            GameKind::ColorMatch => "🎨",
            GameKind::Reverse => "🔄",
            GameKind::TimeAttack => "⏱",
            GameKind::Fibonacci => "🌀",
            GameKind::Minesweeper => "💣",
            GameKind::Sudoku => "🔢",
            GameKind::Slide => "🧩",
            GameKind::Memory => "🃏",
            GameKind::WordSearch => "🔤",
            GameKind::Connect4 => "🔴",
            GameKind::TicTacToe => "❌",
            GameKind::Simon => "🔵",
            GameKind::Whack => "🔨",
        }
    }

    pub fn desc(self) -> &'static str {
        match self {
            GameKind::PacMan => "Eat dots, dodge ghosts",
            GameKind::Breakout => "Smash bricks, grab powerups",
            GameKind::Arkanoid => "Tough bricks and lasers",
            GameKind::Tetris => "Stack and clear lines",
            GameKind::Snake => "Grow without biting",
            GameKind::Asteroids => "Split rocks in deep space",
            GameKind::Invaders => "Hold the line",
            GameKind::Galaga => "Diving insect waves",
            GameKind::Defender => "Scrolling dogfight",
            GameKind::Shooter => "Top-down arena",
            GameKind::Tanks => "Armored duel",
            GameKind::Missile => "Protect the cities",
            GameKind::Pong => "Two-player paddles",
            GameKind::Flappy => "Squeeze through pipes",
            GameKind::Runner => "Jump, shoot, run",
            GameKind::Platformer => "Twenty worlds to cross",
            GameKind::Bubbles => "Pop groups of three",
            GameKind::Merge => "Merge into watermelon",
            GameKind::Match3 => "Swap gems in a row",
            GameKind::ColorMatch => "Cascading colors",
            GameKind::Reverse => "2048, arrows flipped",
            GameKind::TimeAttack => "2048 in two minutes",
            GameKind::Fibonacci => "Merge the sequence",
            GameKind::Minesweeper => "Clear the field",
            GameKind::Sudoku => "Fill every box",
            GameKind::Slide => "Order the tiles",
            GameKind::Memory => "Find the pairs",
            GameKind::WordSearch => "Find hidden words",
            GameKind::Connect4 => "Four in a row",
            GameKind::TicTacToe => "Beat the minimax",
            GameKind::Simon => "Repeat the pattern",
            GameKind::Whack => "Bop moles, not bombs",
        }
    }

    pub fn color(self) -> Color {
        match self {
            GameKind::PacMan => Color::Rgb(255, 220, 0),
            GameKind::Breakout | GameKind::Arkanoid => Color::Rgb(220, 80, 80),
            GameKind::Tetris => Color::Rgb(120, 200, 255),
            GameKind::Snake => Color::Rgb(80, 220, 80),
            GameKind::Asteroids | GameKind::Galaga | GameKind::Defender => Color::Rgb(100, 200, 255),
            GameKind::Invaders => Color::Rgb(80, 255, 80),
            GameKind::Shooter | GameKind::Tanks | GameKind::Missile => Color::Rgb(255, 160, 60),
            GameKind::Pong | GameKind::Flappy | GameKind::Runner | GameKind::Platformer => Color::Rgb(200, 120, 255),
            GameKind::Bubbles | GameKind::Merge | GameKind::Match3 | GameKind::ColorMatch => Color::Rgb(255, 120, 200),
            GameKind::Reverse | GameKind::TimeAttack | GameKind::Fibonacci => Color::Rgb(237, 194, 46),
            _ => Color::Rgb(160, 200, 160),
        }
    }

    /// Key under which the best score is persisted. Games where a lower
    /// count is better have none.
    pub fn best_key(self) -> Option<&'static str> {
        match self {
            GameKind::Breakout => Some("breakoutBest"),
            GameKind::Tetris => Some("tetrisBest"),
            GameKind::Snake => Some("snakeBest"),
            GameKind::Simon => Some("simonBest"),
            GameKind::Flappy => Some("flappyBest"),
            GameKind::Merge => Some("mergeBest"),
            GameKind::Fibonacci => Some("bestScoreFib"),
            GameKind::Reverse => Some("bestScoreReverse"),
            GameKind::TimeAttack => Some("bestScoreTime"),
            GameKind::Runner => Some("runnerBest"),
            GameKind::PacMan => Some("pacmanBest"),
            GameKind::Arkanoid => Some("arkanoidBest"),
            GameKind::Asteroids => Some("asteroidsBest"),
            GameKind::Invaders => Some("invadersBest"),
            GameKind::Galaga => Some("galagaBest"),
            GameKind::Defender => Some("defenderBest"),
            GameKind::Shooter => Some("shooterBest"),
            GameKind::Tanks => Some("tanksBest"),
            GameKind::Missile => Some("missileBest"),
            GameKind::Platformer => Some("platformerBest"),
            GameKind::Bubbles => Some("bubblesBest"),
            GameKind::Match3 => Some("match3Best"),
            GameKind::ColorMatch => Some("colormatchBest"),
            GameKind::Whack => Some("whackBest"),
            GameKind::Pong
            | GameKind::Minesweeper
            | GameKind::Sudoku
            | GameKind::Slide
            | GameKind::Memory
            | GameKind::WordSearch
            | GameKind::Connect4
            | GameKind::TicTacToe => None,
        }
    }

    /// Key bindings shown on the home screen
    pub fn controls(self) -> &'static [(&'static str, &'static str)] {
        match self {
            GameKind::PacMan => &[("↑ ↓ ← →", "Steer"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Breakout => &[("← →", "Move paddle"), ("Space", "Launch"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Arkanoid => &[("← →", "Move paddle"), ("Space", "Launch / laser"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Tetris => &[("← →", "Move"), ("↑", "Rotate"), ("↓", "Soft drop"), ("Space", "Hard drop"), ("P", "Pause")],
            GameKind::Snake => &[("↑ ↓ ← →", "Turn"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Asteroids => &[("← →", "Rotate"), ("↑", "Thrust"), ("Space", "Fire"), ("P", "Pause")],
            GameKind::Invaders => &[("← →", "Move"), ("Space", "Fire"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Galaga => &[("← →", "Move"), ("Space", "Fire"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Defender => &[("↑ ↓ ← →", "Fly"), ("Space", "Fire"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Shooter => &[("↑ ↓ ← →", "Move"), ("Space", "Fire"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Tanks => &[("↑ ↓ ← →", "Drive"), ("Space", "Fire"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Missile => &[("↑ ↓ ← →", "Aim"), ("Space", "Fire"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Pong => &[("W / S", "Left paddle"), ("↑ / ↓", "Right paddle"), ("P", "Pause"), ("R", "Restart")],
            GameKind::Flappy => &[("Space / ↑", "Flap"), ("R", "Restart")],
            GameKind::Runner => &[("Space / ↑", "Jump (twice)"), ("S", "Shoot"), ("R", "Restart")],
            GameKind::Platformer => &[("← →", "Run"), ("↑ / Space", "Jump, again for double"), ("R", "Restart")],
            GameKind::Bubbles => &[("← →", "Aim"), ("Space", "Shoot"), ("R", "Restart")],
            GameKind::Merge => &[("← →", "Move dropper"), ("Space", "Drop"), ("R", "Restart")],
            GameKind::Match3 | GameKind::ColorMatch => &[("↑ ↓ ← →", "Cursor"), ("Enter", "Pick, then arrow to swap"), ("R", "Restart")],
            GameKind::Reverse => &[("↑ ↓ ← →", "Slide (reversed)"), ("R", "Restart")],
            GameKind::TimeAttack | GameKind::Fibonacci => &[("↑ ↓ ← →", "Slide tiles"), ("R", "Restart")],
            GameKind::Minesweeper => &[("↑ ↓ ← →", "Cursor"), ("Space", "Reveal"), ("F", "Flag"), ("R", "Restart")],
            GameKind::Sudoku => &[("↑ ↓ ← →", "Cursor"), ("1-9", "Enter"), ("0 / Del", "Clear"), ("C", "Check"), ("N", "New (difficulty)")],
            GameKind::Slide => &[("↑ ↓ ← →", "Slide tile"), ("3 4 5", "Board size"), ("R", "Shuffle")],
            GameKind::Memory => &[("↑ ↓ ← →", "Cursor"), ("Space", "Flip"), ("R", "Restart")],
            GameKind::WordSearch => &[("↑ ↓ ← →", "Cursor"), ("Space", "Mark start / end"), ("T", "Next theme")],
            GameKind::Connect4 => &[("← →", "Column"), ("Space", "Drop"), ("M", "Toggle AI"), ("R", "Restart")],
            GameKind::TicTacToe => &[("1-9", "Place"), ("M", "Toggle AI"), ("R", "Next round")],
            GameKind::Simon => &[("1-4", "Press button"), ("Space", "Start"), ("R", "Restart")],
            GameKind::Whack => &[("1-9", "Whack hole (numpad)"), ("Space", "Start"), ("R", "Restart")],
        }
    }

    pub fn create(self) -> Box<dyn Game> {
        match self {
            GameKind::PacMan => Box::new(pacman::PacMan::new()),
            GameKind::Breakout => Box::new(breakout::Breakout::new()),
            GameKind::Arkanoid => Box::new(arkanoid::Arkanoid::new()),
            GameKind::Tetris => Box::new(tetris::Tetris::new()),
            GameKind::Snake => Box::new(snake::Snake::new()),
            GameKind::Asteroids => Box::new(asteroids::Asteroids::new()),
            GameKind::Invaders => Box::new(invaders::Invaders::new()),
            GameKind::Galaga => Box::new(galaga::Galaga::new()),
            GameKind::Defender => Box::new(defender::Defender::new()),
            GameKind::Shooter => Box::new(shooter::Shooter::new()),
            GameKind::Tanks => Box::new(tanks::Tanks::new()),
            GameKind::Missile => Box::new(missile::MissileCommand::new()),
            GameKind::Pong => Box::new(pong::Pong::new()),
            GameKind::Flappy => Box::new(flappy::Flappy::new()),
            GameKind::Runner => Box::new(runner::Runner::new()),
            GameKind::Platformer => Box::new(platformer::Platformer::new()),
            GameKind::Bubbles => Box::new(bubbles::Bubbles::new()),
            GameKind::Merge => Box::new(merge::Merge::new()),
            GameKind::Match3 => Box::new(match3::Match3::new()),
            GameKind::ColorMatch => Box::new(colormatch::ColorMatch::new()),
            GameKind::Reverse => Box::new(reverse::Reverse2048::new()),
            GameKind::TimeAttack => Box::new(timeattack::TimeAttack::new()),
            GameKind::Fibonacci => Box::new(fibonacci::Fibonacci::new()),
            GameKind::Minesweeper => Box::new(minesweeper::Minesweeper::new()),
            GameKind::Sudoku => Box::new(sudoku::Sudoku::new()),
            GameKind::Slide => Box::new(slide::Slide::new()),
            GameKind::Memory => Box::new(memory::Memory::new()),
            GameKind::WordSearch => Box::new(wordsearch::WordSearch::new()),
            GameKind::Connect4 => Box::new(connect4::ConnectFour::new()),
            GameKind::TicTacToe => Box::new(tictactoe::TicTacToe::new()),
            GameKind::Simon => Box::new(simon::Simon::new()),
            GameKind::Whack => Box::new(whack::Whack::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for kind in GameKind::ALL {
            assert!(seen.insert(kind.key()));
            assert_eq!(GameKind::from_key(kind.key()), Some(kind));
            assert_eq!(GameKind::ALL[kind.index()], kind);
        }
        assert_eq!(GameKind::from_key("TETRIS"), Some(GameKind::Tetris));
        assert_eq!(GameKind::from_key("frogger"), None);
    }

    #[test]
    fn test_best_keys_are_unique() {
        let keys: Vec<_> = GameKind::ALL.iter().filter_map(|k| k.best_key()).collect();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
    }

    #[test]
    fn test_every_game_starts_running() {
        for kind in GameKind::ALL {
            let mut game = kind.create();
            assert!(!game.is_game_over(), "{} starts over", kind.key());
            game.update(16);
            game.reset();
            assert!(!game.is_game_over(), "{} over after reset", kind.key());
        }
    }
}
