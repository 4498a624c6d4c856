use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use tracing::debug;

use crate::games::canvas::{self, Canvas, GridFit};
use crate::games::Game;

const COLS: usize = 28;
const ROWS: usize = 31;

const PLAYER_SPEED: f32 = 0.18;
const GHOST_SPEED: f32 = 0.12;
const POWER_FRAMES: u32 = 400;
const MODE_FRAMES: u32 = 400;
/// Frames between successive ghosts leaving the house
const RELEASE_GAP: u32 = 90;
const EXIT: (f32, f32) = (13.0, 11.0);
/// Top-left ghost slot inside the house; slots sit between cell centres
const HOUSE: (f32, f32) = (13.5, 14.5);

// `-` is the house door: ghosts pass, the player does not
const MAZE: [&str; ROWS] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#*####.#####.##.#####.####*#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "######.##### ## #####.######",
    "######.##          ##.######",
    "######.## ###--### ##.######",
    "######.## #GGGGGG# ##.######",
    "      .   #GGGGGG#   .      ",
    "######.## #GGGGGG# ##.######",
    "######.## ######## ##.######",
    "######.##          ##.######",
    "######.## ######## ##.######",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#*..##.......  .......##..*#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tile {
    Wall,
    Dot,
    Pellet,
    Empty,
    House,
    Door,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

impl Dir {
    const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    fn delta(self) -> (f32, f32) {
        match self {
            Dir::Up => (0.0, -1.0),
            Dir::Right => (1.0, 0.0),
            Dir::Down => (0.0, 1.0),
            Dir::Left => (-1.0, 0.0),
        }
    }

    fn reverse(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Right => Dir::Left,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Dir::Up | Dir::Down)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Scatter,
    Chase,
}

#[derive(Clone, Debug)]
struct Ghost {
    x: f32,
    y: f32,
    dir: Dir,
    speed: f32,
    scatter: (f32, f32),
    color: Color,
    in_house: bool,
    release: u32,
    /// Cell where the last steering decision was made
    decided: Option<(i32, i32)>,
}

type Maze = Vec<Vec<Tile>>;

fn house_slot(i: usize) -> (f32, f32) {
    (HOUSE.0 + (i % 2) as f32, HOUSE.1 + (i / 2) as f32)
}

fn build_maze() -> Maze {
    MAZE.iter()
        .map(|row| {
            row.chars()
                .map(|c| match c {
                    '#' => Tile::Wall,
                    '.' => Tile::Dot,
                    '*' => Tile::Pellet,
                    'G' => Tile::House,
                    '-' => Tile::Door,
                    _ => Tile::Empty,
                })
                .collect()
        })
        .collect()
}

fn tile_at(maze: &Maze, col: i32, row: i32) -> Option<Tile> {
    if row < 0 || col < 0 || row as usize >= ROWS || col as usize >= COLS {
        return None;
    }
    Some(maze[row as usize][col as usize])
}

/// Whether the cell containing (x, y) can be entered. Anything off the
/// grid is open, which is what lets the tunnel row wrap.
fn can_move(maze: &Maze, x: f32, y: f32, ghost_in_house: bool) -> bool {
    let col = (x + 0.5).floor() as i32;
    let row = (y + 0.5).floor() as i32;
    match tile_at(maze, col, row) {
        None => true,
        Some(Tile::Wall) => false,
        Some(Tile::House) | Some(Tile::Door) => ghost_in_house,
        Some(_) => true,
    }
}

/// Pick the direction whose next cell is closest to the target. The
/// reverse is only taken when nothing else is open.
fn choose_dir(maze: &Maze, x: f32, y: f32, current: Dir, target: (f32, f32), in_house: bool) -> Dir {
    let mut best = None;
    let mut best_dist = f32::INFINITY;
    for d in Dir::ALL {
        if d == current.reverse() {
            continue;
        }
        let (dx, dy) = d.delta();
        let (nx, ny) = (x + dx, y + dy);
        if !can_move(maze, nx, ny, in_house) {
            continue;
        }
        let dist = ((nx - target.0).powi(2) + (ny - target.1).powi(2)).sqrt();
        if dist < best_dist {
            best_dist = dist;
            best = Some(d);
        }
    }
    best.unwrap_or_else(|| current.reverse())
}

fn wrap_x(x: f32) -> f32 {
    if x < -1.0 {
        (COLS - 1) as f32
    } else if x >= COLS as f32 {
        0.0
    } else {
        x
    }
}

pub struct PacMan {
    maze: Maze,
    px: f32,
    py: f32,
    dir: Dir,
    next_dir: Dir,
    ghosts: Vec<Ghost>,
    dots_left: usize,
    score: u32,
    best: u32,
    lives: u32,
    level: u32,
    power_timer: u32,
    mode: Mode,
    mode_timer: u32,
    game_over: bool,
    paused: bool,
    tick: u64,
}

impl PacMan {
    pub fn new() -> Self {
        let maze = build_maze();
        let dots_left = count_food(&maze);
        let mut p = Self {
            maze,
            px: 14.0,
            py: 23.0,
            dir: Dir::Left,
            next_dir: Dir::Left,
            ghosts: Vec::new(),
            dots_left,
            score: 0,
            best: 0,
            lives: 3,
            level: 1,
            power_timer: 0,
            mode: Mode::Scatter,
            mode_timer: 0,
            game_over: false,
            paused: false,
            tick: 0,
        };
        p.reset_positions();
        p
    }

    fn ghost_speed(&self) -> f32 {
        if self.level <= 1 {
            GHOST_SPEED
        } else {
            (GHOST_SPEED + 0.01 * self.level as f32).min(0.18)
        }
    }

    fn reset_positions(&mut self) {
        self.px = 14.0;
        self.py = 23.0;
        self.dir = Dir::Left;
        self.next_dir = Dir::Left;
        self.power_timer = 0;
        let speed = self.ghost_speed();
        let corners = [(25.0, 0.0), (2.0, 0.0), (27.0, 30.0), (0.0, 30.0)];
        let colors = [
            Color::Rgb(255, 0, 0),
            Color::Rgb(255, 184, 255),
            Color::Rgb(0, 255, 255),
            Color::Rgb(255, 184, 82),
        ];
        self.ghosts = (0..4)
            .map(|i| Ghost {
                x: house_slot(i).0,
                y: house_slot(i).1,
                dir: Dir::Up,
                speed,
                scatter: corners[i],
                color: colors[i],
                in_house: true,
                release: i as u32 * RELEASE_GAP,
                decided: None,
            })
            .collect();
    }

    fn send_home(ghost: &mut Ghost, slot: usize) {
        (ghost.x, ghost.y) = house_slot(slot);
        ghost.dir = Dir::Up;
        ghost.in_house = true;
        ghost.release = 60;
        ghost.decided = None;
    }

    fn powered(&self) -> bool {
        self.power_timer > 0
    }

    fn move_player(&mut self) {
        let cx = self.px.round();
        let cy = self.py.round();

        if self.next_dir != self.dir {
            let (dx, dy) = self.next_dir.delta();
            let open = can_move(&self.maze, cx + dx, cy + dy, false);
            if open && self.next_dir == self.dir.reverse() {
                self.dir = self.next_dir;
            } else if open && (self.px - cx).abs() < 0.3 && (self.py - cy).abs() < 0.3 {
                // Line up with the corridor before turning
                if self.next_dir.is_vertical() {
                    self.px = cx;
                } else {
                    self.py = cy;
                }
                self.dir = self.next_dir;
            }
        }

        let (dx, dy) = self.dir.delta();
        let nx = self.px + dx * PLAYER_SPEED;
        let ny = self.py + dy * PLAYER_SPEED;
        // Probe the leading edge so the player stops on the cell centre
        if can_move(&self.maze, nx + dx * 0.5, ny + dy * 0.5, false) {
            self.px = nx;
            self.py = ny;
        } else {
            self.px = cx;
            self.py = cy;
        }
        self.px = wrap_x(self.px);
    }

    fn eat(&mut self) {
        let col = self.px.round() as i32;
        let row = self.py.round() as i32;
        match tile_at(&self.maze, col, row) {
            Some(Tile::Dot) => {
                self.maze[row as usize][col as usize] = Tile::Empty;
                self.dots_left -= 1;
                self.score += 10;
            }
            Some(Tile::Pellet) => {
                self.maze[row as usize][col as usize] = Tile::Empty;
                self.dots_left -= 1;
                self.score += 50;
                self.power_timer = POWER_FRAMES;
            }
            _ => {}
        }
    }

    fn move_ghost(&mut self, i: usize) {
        let powered = self.powered();
        let mode = self.mode;
        let (px, py) = (self.px, self.py);
        let maze = &self.maze;
        let g = &mut self.ghosts[i];

        if g.release > 0 {
            g.release -= 1;
            return;
        }

        // Settle from the slot onto a cell centre before steering
        if g.in_house && g.decided.is_none() {
            let (sx, sy) = house_slot(i);
            let (cx, cy) = (sx.floor(), sy.floor());
            if (g.x - cx).abs() > g.speed || (g.y - cy).abs() > g.speed {
                g.x += (cx - g.x).clamp(-g.speed, g.speed);
                g.y += (cy - g.y).clamp(-g.speed, g.speed);
                return;
            }
        }

        let cx = g.x.round();
        let cy = g.y.round();
        let cell = (cx as i32, cy as i32);
        let at_center = (g.x - cx).abs() < 0.15 && (g.y - cy).abs() < 0.15;
        if at_center && g.decided != Some(cell) {
            g.x = cx;
            g.y = cy;
            g.decided = Some(cell);
            if g.in_house && !matches!(tile_at(maze, cell.0, cell.1), Some(Tile::House) | Some(Tile::Door)) {
                g.in_house = false;
            }
            let target = if g.in_house {
                EXIT
            } else if powered {
                (g.x * 2.0 - px, g.y * 2.0 - py)
            } else if mode == Mode::Scatter {
                g.scatter
            } else {
                (px, py)
            };
            g.dir = choose_dir(maze, g.x, g.y, g.dir, target, g.in_house);
        }

        let (dx, dy) = g.dir.delta();
        let nx = g.x + dx * g.speed;
        let ny = g.y + dy * g.speed;
        if can_move(maze, nx, ny, g.in_house) {
            g.x = nx;
            g.y = ny;
        }
        g.x = wrap_x(g.x);
    }

    fn check_collisions(&mut self) {
        for i in 0..self.ghosts.len() {
            let g = &self.ghosts[i];
            if (self.px - g.x).abs() >= 0.6 || (self.py - g.y).abs() >= 0.6 {
                continue;
            }
            if self.powered() {
                self.score += 200;
                Self::send_home(&mut self.ghosts[i], i);
            } else {
                self.lives = self.lives.saturating_sub(1);
                if self.lives == 0 {
                    self.game_over = true;
                    debug!(score = self.score, level = self.level, "pacman game over");
                } else {
                    self.reset_positions();
                }
                return;
            }
        }
    }

    fn next_level(&mut self) {
        self.level += 1;
        debug!(level = self.level, "pacman level cleared");
        self.maze = build_maze();
        self.dots_left = count_food(&self.maze);
        self.reset_positions();
    }

    fn step(&mut self) {
        self.move_player();
        self.eat();

        if self.power_timer > 0 {
            self.power_timer -= 1;
        }

        self.mode_timer += 1;
        if self.mode_timer > MODE_FRAMES {
            self.mode = match self.mode {
                Mode::Scatter => Mode::Chase,
                Mode::Chase => Mode::Scatter,
            };
            self.mode_timer = 0;
        }

        for i in 0..self.ghosts.len() {
            self.move_ghost(i);
        }
        self.check_collisions();

        if !self.game_over && self.dots_left == 0 {
            self.next_level();
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Canvas {
        let bg = Color::Rgb(0, 0, 0);
        let mut c = Canvas::new(width as u16, height as u16, bg);
        let fit = GridFit::new(COLS, ROWS, width, height);
        let blink = (self.tick / 12) % 2 == 0;

        for (r, row) in self.maze.iter().enumerate() {
            for (col, tile) in row.iter().enumerate() {
                let (x, y) = fit.origin(col, r);
                let mid = x + fit.cw / 2;
                match tile {
                    Tile::Wall => c.fill(x, y, x + fit.cw, y + fit.ch, '█', Style::default().fg(Color::Rgb(33, 33, 222)).bg(bg)),
                    Tile::Door => c.fill(x, y, x + fit.cw, y + fit.ch, '─', Style::default().fg(Color::Rgb(255, 184, 255)).bg(bg)),
                    Tile::Dot => c.put(mid, y + fit.ch / 2, '·', Color::Rgb(255, 184, 151)),
                    Tile::Pellet if blink => c.put(mid, y + fit.ch / 2, '●', Color::Rgb(255, 184, 151)),
                    _ => {}
                }
            }
        }

        let to_cell = |fx: f32, fy: f32| -> (i32, i32) {
            (
                fit.ox + (fx * fit.cw as f32).round() as i32 + fit.cw / 2,
                fit.oy + (fy * fit.ch as f32).round() as i32 + fit.ch / 2,
            )
        };

        for g in &self.ghosts {
            let (gx, gy) = to_cell(g.x, g.y);
            let color = if self.powered() {
                if self.power_timer > 100 || blink { Color::Rgb(33, 33, 255) } else { Color::White }
            } else {
                g.color
            };
            c.put_styled(gx, gy, 'ᗣ', Style::default().fg(color).bg(bg).add_modifier(Modifier::BOLD));
        }

        let (px, py) = to_cell(self.px, self.py);
        let glyph = if (self.tick / 6) % 2 == 0 {
            match self.dir {
                Dir::Right => 'ᗧ',
                Dir::Left => 'ᗤ',
                Dir::Up => 'ᗢ',
                Dir::Down => 'ᗜ',
            }
        } else {
            '●'
        };
        c.put_styled(px, py, glyph, Style::default().fg(Color::Rgb(255, 255, 0)).bg(bg).add_modifier(Modifier::BOLD));
        c
    }
}

fn count_food(maze: &Maze) -> usize {
    maze.iter()
        .flatten()
        .filter(|t| matches!(t, Tile::Dot | Tile::Pellet))
        .count()
}

impl Game for PacMan {
    fn update(&mut self, _dt_ms: u64) {
        if self.game_over || self.paused { return; }
        self.tick += 1;
        self.step();
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
            KeyCode::Up => self.next_dir = Dir::Up,
            KeyCode::Right => self.next_dir = Dir::Right,
            KeyCode::Down => self.next_dir = Dir::Down,
            KeyCode::Left => self.next_dir = Dir::Left,
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [status, field, help] = canvas::screen(frame, area, "ᗧ Pac-Man", Color::Rgb(255, 220, 0));

        let mut parts = vec![
            (format!("Score: {}", self.score), Color::Yellow),
            (format!("Lives: {}", "ᗧ ".repeat(self.lives as usize)), Color::Rgb(255, 220, 0)),
            (format!("Level: {}", self.level), Color::Cyan),
            (format!("🏆 Best: {}", self.best.max(self.score)), Color::Rgb(255, 215, 0)),
        ];
        if self.powered() {
            parts.push((format!("POWER {}", self.power_timer / 60 + 1), Color::Rgb(80, 80, 255)));
        }
        canvas::render_lines(frame, status, canvas::status_line("ᗧ", parts));

        let c = self.render_field(field.width as usize, field.height as usize);
        canvas::render_canvas(frame, field, c);

        let line = if self.game_over {
            canvas::game_over_line(&format!("GAME OVER! Score: {}", self.score))
        } else if self.paused {
            canvas::paused_line()
        } else {
            canvas::help_line(&[("↑↓←→", "Steer"), ("P", "Pause"), ("R", "Restart")])
        };
        canvas::render_lines(frame, help, line);
    }

    fn reset(&mut self) {
        let best = self.best.max(self.score);
        *self = PacMan::new();
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

    fn run(p: &mut PacMan, frames: usize) {
        for _ in 0..frames {
            p.update(16);
        }
    }

    #[test]
    fn test_walls_block_and_tunnel_is_open() {
        let maze = build_maze();
        assert!(!can_move(&maze, 0.0, 0.0, false));
        assert!(can_move(&maze, 1.0, 1.0, false));
        // Off the left edge of the tunnel row
        assert!(can_move(&maze, -1.0, 14.0, false));
        // House and door only for ghosts on their way out
        assert!(!can_move(&maze, 13.0, 12.0, false));
        assert!(can_move(&maze, 13.0, 12.0, true));
    }

    #[test]
    fn test_player_eats_dots_moving_left() {
        let mut p = PacMan::new();
        let before = p.dots_left;
        run(&mut p, 20);
        assert!(p.px < 14.0);
        assert!(p.score >= 10);
        assert_eq!(before - p.dots_left, (p.score / 10) as usize);
    }

    #[test]
    fn test_player_stops_at_wall() {
        let mut p = PacMan::new();
        p.ghosts.clear();
        p.px = 1.0;
        p.py = 1.0;
        p.dir = Dir::Left;
        p.next_dir = Dir::Left;
        run(&mut p, 5);
        assert_eq!((p.px, p.py), (1.0, 1.0));
    }

    #[test]
    fn test_player_turns_at_junction() {
        let mut p = PacMan::new();
        p.ghosts.clear();
        p.next_dir = Dir::Up;
        // Column 12 opens upward two cells left of the start
        run(&mut p, 40);
        assert_eq!(p.px, 12.0);
        assert!(p.py < 23.0);
    }

    #[test]
    fn test_tunnel_wraps_player() {
        let mut p = PacMan::new();
        p.ghosts.clear();
        p.px = -0.9;
        p.py = 14.0;
        p.dir = Dir::Left;
        p.next_dir = Dir::Left;
        p.update(16);
        assert_eq!(p.px, (COLS - 1) as f32);
    }

    #[test]
    fn test_pellet_powers_up_and_ghost_is_eaten() {
        let mut p = PacMan::new();
        p.px = 1.0;
        p.py = 3.0;
        p.dir = Dir::Up;
        p.next_dir = Dir::Up;
        p.eat();
        assert_eq!(p.score, 50);
        assert!(p.powered());

        p.ghosts[0].x = 1.2;
        p.ghosts[0].y = 3.0;
        p.ghosts[0].in_house = false;
        p.check_collisions();
        assert_eq!(p.score, 250);
        assert!(p.ghosts[0].in_house);
        assert_eq!(p.lives, 3);
    }

    #[test]
    fn test_ghost_contact_costs_a_life() {
        let mut p = PacMan::new();
        p.px = 6.0;
        p.py = 5.0;
        p.ghosts[1].x = 6.3;
        p.ghosts[1].y = 5.0;
        p.check_collisions();
        assert_eq!(p.lives, 2);
        assert_eq!((p.px, p.py), (14.0, 23.0));

        p.lives = 1;
        p.ghosts[1].x = 14.0;
        p.ghosts[1].y = 23.0;
        p.check_collisions();
        assert!(p.is_game_over());
    }

    #[test]
    fn test_ghost_does_not_reverse_in_corridor() {
        let maze = build_maze();
        // Moving right along row 5 with the target directly behind
        let d = choose_dir(&maze, 3.0, 5.0, Dir::Right, (0.0, 5.0), false);
        assert_ne!(d, Dir::Left);
    }

    #[test]
    fn test_ghost_reverses_only_at_dead_end() {
        let mut maze = build_maze();
        // Row 5 walled off at column 2: heading left, only the way back is open
        maze[5][2] = Tile::Wall;
        let d = choose_dir(&maze, 3.0, 5.0, Dir::Left, (0.0, 0.0), false);
        assert_eq!(d, Dir::Right);
    }

    #[test]
    fn test_ghosts_start_and_return_to_house_slots() {
        let mut p = PacMan::new();
        let starts: Vec<_> = p.ghosts.iter().map(|g| (g.x, g.y)).collect();
        assert_eq!(starts, vec![(13.5, 14.5), (14.5, 14.5), (13.5, 15.5), (14.5, 15.5)]);

        p.power_timer = POWER_FRAMES;
        p.px = 6.0;
        p.py = 5.0;
        p.ghosts[3].x = 6.2;
        p.ghosts[3].y = 5.0;
        p.ghosts[3].in_house = false;
        p.check_collisions();
        assert_eq!((p.ghosts[3].x, p.ghosts[3].y), (14.5, 15.5));
        assert!(p.ghosts[3].in_house);
    }

    #[test]
    fn test_ghost_settles_on_a_cell_before_steering() {
        let mut p = PacMan::new();
        for _ in 0..4 {
            p.move_ghost(0);
        }
        assert!(p.ghosts[0].decided.is_none());
        p.move_ghost(0);
        assert_eq!(p.ghosts[0].decided, Some((13, 14)));
    }

    #[test]
    fn test_ghosts_leave_the_house() {
        let mut p = PacMan::new();
        p.px = 1.0;
        p.py = 29.0;
        p.dir = Dir::Right;
        run(&mut p, 200);
        assert!(!p.ghosts[0].in_house);
        assert!(p.ghosts[0].y < 12.0);
    }

    #[test]
    fn test_mode_toggles() {
        let mut p = PacMan::new();
        p.ghosts.clear();
        assert_eq!(p.mode, Mode::Scatter);
        run(&mut p, MODE_FRAMES as usize + 1);
        assert_eq!(p.mode, Mode::Chase);
    }

    #[test]
    fn test_level_clear_speeds_up_ghosts() {
        let mut p = PacMan::new();
        p.ghosts.clear();
        for row in p.maze.iter_mut() {
            for t in row.iter_mut() {
                if matches!(t, Tile::Dot | Tile::Pellet) {
                    *t = Tile::Empty;
                }
            }
        }
        p.maze[23][13] = Tile::Dot;
        p.dots_left = 1;
        for _ in 0..20 {
            p.update(16);
            if p.level == 2 {
                break;
            }
        }
        assert_eq!(p.level, 2);
        assert_eq!(p.dots_left, count_food(&build_maze()));
        assert!((p.ghosts[0].speed - 0.14).abs() < 1e-6);
    }
}
