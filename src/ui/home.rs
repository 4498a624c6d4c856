use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::HOME_COLS;
use crate::games::GameKind;
use crate::scores::BestScores;

const BANNER: &str = r#"
 █████╗ ██████╗  ██████╗ █████╗ ██████╗ ███████╗
██╔══██╗██╔══██╗██╔════╝██╔══██╗██╔══██╗██╔════╝
███████║██████╔╝██║     ███████║██║  ██║█████╗
██╔══██║██╔══██╗██║     ██╔══██║██║  ██║██╔══╝
██║  ██║██║  ██║╚██████╗██║  ██║██████╔╝███████╗
╚═╝  ╚═╝╚═╝  ╚═╝ ╚═════╝╚═╝  ╚═╝╚═════╝ ╚══════╝"#;

fn render_game_tile(frame: &mut Frame, area: Rect, kind: GameKind, selected: bool) {
    let border_color = if selected { Color::Rgb(255, 220, 80) } else { Color::Rgb(50, 60, 80) };
    let border_type = if selected { BorderType::Double } else { BorderType::Rounded };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 { return; }

    let name_color = if selected { Color::Rgb(255, 255, 255) } else { kind.color() };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{} ", kind.icon()), Style::default()),
        Span::styled(kind.title(), Style::default().fg(name_color).add_modifier(Modifier::BOLD)),
    ])];
    if inner.height > 1 {
        lines.push(Line::from(Span::styled(
            kind.desc(),
            Style::default().fg(if selected { Color::Rgb(180, 180, 200) } else { Color::Rgb(120, 120, 140) }),
        )));
    }

    let p = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(p, inner);
}

fn game_controls(kind: GameKind, best: Option<u32>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            format!("  {} {}", kind.icon(), kind.title()),
            Style::default().fg(kind.color()).add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![Span::styled(
            format!("  {}", kind.desc()),
            Style::default().fg(Color::Rgb(100, 100, 120)),
        )]),
        Line::from(""),
    ];
    for (key, what) in kind.controls() {
        lines.push(Line::from(vec![
            Span::styled(format!("    {:<17}", key), Style::default().fg(Color::Rgb(80, 200, 255))),
            Span::styled(*what, Style::default().fg(Color::Rgb(140, 140, 140))),
        ]));
    }
    if let Some(best) = best {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("    🏆 Best  ", Style::default().fg(Color::Rgb(255, 220, 80))),
            Span::styled(best.to_string(), Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD)),
        ]));
    }
    lines
}

fn nav_line(key: &'static str, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("    {:<17}", key), Style::default().fg(Color::Rgb(80, 200, 255))),
        Span::styled(what, Style::default().fg(Color::Rgb(140, 140, 140))),
    ])
}

pub fn render_home(frame: &mut Frame, area: Rect, selected_game: usize, show_high_scores: bool, best_scores: &BestScores) {
    let tile_rows = GameKind::ALL.len().div_ceil(HOME_COLS);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),                          // Banner
            Constraint::Length(1),                          // Subtitle
            Constraint::Length(tile_rows as u16 * 4 + 2),   // Game tiles
            Constraint::Min(8),                             // Controls area
            Constraint::Length(1),                          // Footer
        ])
        .split(area);

    let banner = Paragraph::new(BANNER)
        .style(Style::default().fg(Color::Rgb(80, 200, 255)))
        .alignment(Alignment::Center);
    frame.render_widget(banner, chunks[0]);

    let subtitle = Paragraph::new(Line::from(vec![Span::styled(
        format!("  ⚡ {} classics in your terminal ⚡  ", GameKind::ALL.len()),
        Style::default()
            .fg(Color::Rgb(255, 220, 80))
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    )]))
    .alignment(Alignment::Center);
    frame.render_widget(subtitle, chunks[1]);

    let games_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(" 🎮 Games: ↑↓←→ Select, Enter to Play ")
        .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD));
    let games_inner = games_block.inner(chunks[2]);
    frame.render_widget(games_block, chunks[2]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, tile_rows as u32); tile_rows])
        .split(games_inner);
    for (r, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, HOME_COLS as u32); HOME_COLS])
            .split(*row_area);
        for (c, tile_area) in cols.iter().enumerate() {
            let idx = r * HOME_COLS + c;
            if let Some(kind) = GameKind::ALL.get(idx) {
                render_game_tile(frame, *tile_area, *kind, idx == selected_game);
            }
        }
    }

    let ctrl_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);

    let controls = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  🔧 Navigation",
            Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD),
        )]),
        nav_line("Tab / Shift+Tab", "Switch tabs"),
        nav_line("↑ ↓ ← →", "Select game"),
        nav_line("Enter", "Play selected"),
        nav_line("Esc", "Return to Home"),
        nav_line("q / Ctrl+C", "Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  🎮 Common",
            Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD),
        )]),
        nav_line("R", "Restart game"),
        nav_line("P", "Pause / Unpause"),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
            .title(" ⌨ Navigation Control ")
            .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(controls, ctrl_cols[0]);

    let kind = GameKind::ALL[selected_game.min(GameKind::ALL.len() - 1)];
    let best = kind.best_key().map(|key| best_scores.get(key));
    let game_ctrl = Paragraph::new(game_controls(kind, best)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(50, 100, 140)))
            .title(format!(" 🎮 {} Control ", kind.title()))
            .title_style(Style::default().fg(kind.color()).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(game_ctrl, ctrl_cols[1]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("  🦀 ", Style::default().fg(Color::Rgb(255, 100, 50))),
        Span::styled(concat!("v", env!("CARGO_PKG_VERSION")), Style::default().fg(Color::Rgb(80, 80, 100))),
        Span::styled("  │  ", Style::default().fg(Color::Rgb(40, 40, 60))),
        Span::styled("H", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" Best Scores", Style::default().fg(Color::Rgb(100, 100, 130))),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[4]);

    if show_high_scores {
        render_best_scores_overlay(frame, area, best_scores);
    }
}

fn render_best_scores_overlay(frame: &mut Frame, area: Rect, best_scores: &BestScores) {
    let overlay_w = 64u16.min(area.width.saturating_sub(4));
    let overlay_h = 20u16.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(overlay_w)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_h)) / 2;
    let overlay_area = Rect::new(x, y, overlay_w, overlay_h);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 200, 80)))
        .title(" 🏆 Best Scores ")
        .title_style(Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Rgb(15, 15, 25)));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let entry = |kind: GameKind| -> Vec<Span<'static>> {
        let score = kind.best_key().map(|k| best_scores.get(k)).unwrap_or(0);
        let value = if score > 0 {
            Span::styled(format!("{:>7}", score), Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD))
        } else {
            Span::styled(format!("{:>7}", "-"), Style::default().fg(Color::Rgb(60, 60, 80)))
        };
        vec![
            Span::styled(format!("  {} ", kind.icon()), Style::default()),
            Span::styled(format!("{:<14}", kind.title()), Style::default().fg(kind.color())),
            value,
        ]
    };

    let scored: Vec<GameKind> = GameKind::ALL.iter().copied().filter(|k| k.best_key().is_some()).collect();
    let half = scored.len().div_ceil(2);
    let mut lines: Vec<Line> = vec![Line::from("")];
    for i in 0..half {
        let mut spans = entry(scored[i]);
        if let Some(right) = scored.get(i + half) {
            spans.push(Span::raw("   "));
            spans.extend(entry(*right));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Press ", Style::default().fg(Color::Rgb(80, 80, 100))),
        Span::styled("H", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" to close", Style::default().fg(Color::Rgb(80, 80, 100))),
    ]));

    let p = Paragraph::new(lines).style(Style::default().bg(Color::Rgb(15, 15, 25)));
    frame.render_widget(p, inner);
}
