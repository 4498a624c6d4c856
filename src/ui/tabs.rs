use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, Tab};

/// Tabs shown either side of the active one
const TAB_WINDOW: usize = 3;

/// Range of tab indices to show so the active tab stays visible.
pub fn visible_range(active: usize, total: usize) -> (usize, usize) {
    let span = TAB_WINDOW * 2 + 1;
    if total <= span {
        return (0, total);
    }
    let start = active.saturating_sub(TAB_WINDOW).min(total - span);
    (start, start + span)
}

pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = Tab::all();
    let active = app.current_tab.index();
    let (start, end) = visible_range(active, tabs.len());

    let mut titles: Vec<Line> = tabs[start..end]
        .iter()
        .map(|t| {
            let style = if *t == app.current_tab {
                Style::default()
                    .fg(Color::Rgb(255, 220, 80))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Rgb(120, 120, 140))
            };
            Line::from(Span::styled(t.title(), style))
        })
        .collect();
    if start > 0 {
        titles.insert(0, Line::from(Span::styled(" ◀ ", Style::default().fg(Color::Rgb(60, 60, 80)))));
    }
    if end < tabs.len() {
        titles.push(Line::from(Span::styled(" ▶ ", Style::default().fg(Color::Rgb(60, 60, 80)))));
    }
    let selected = active - start + usize::from(start > 0);

    let widget = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
                .border_type(BorderType::Rounded)
                .title(" 🕹 Retro Arcade ")
                .title_style(
                    Style::default()
                        .fg(Color::Rgb(200, 120, 255))
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Rgb(255, 220, 80))
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled(" │ ", Style::default().fg(Color::Rgb(60, 60, 80))));

    frame.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clamps_at_edges() {
        assert_eq!(visible_range(0, 33), (0, 7));
        assert_eq!(visible_range(10, 33), (7, 14));
        assert_eq!(visible_range(32, 33), (26, 33));
        assert_eq!(visible_range(2, 5), (0, 5));
    }
}
