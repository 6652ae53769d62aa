//! Run list pane: one row per input with its coverage or failure

use crate::ui::app::RunEntry;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the list of runs with `selected` highlighted
pub fn render_runs_pane(
    frame: &mut Frame,
    area: Rect,
    runs: &[RunEntry],
    selected: usize,
    is_focused: bool,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" Runs ({}) ", runs.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let items: Vec<ListItem> = runs
        .iter()
        .map(|run| {
            let (badge, badge_style) = match run.percentage {
                Some(pct) => (
                    format!("{:>7.2}% ", pct),
                    Style::default().fg(DEFAULT_THEME.covered),
                ),
                None => (
                    "  FAILED ".to_string(),
                    Style::default()
                        .fg(DEFAULT_THEME.failed)
                        .add_modifier(Modifier::BOLD),
                ),
            };
            ListItem::new(Line::from(vec![
                Span::styled(badge, badge_style),
                Span::styled(run.label.clone(), Style::default().fg(DEFAULT_THEME.text)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(DEFAULT_THEME.panel_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !runs.is_empty() {
        state.select(Some(selected.min(runs.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
