//! Shared UI components (status bar, notices, help, modal helpers).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{KeyAction, Keymap};
use crate::app::{AppState, InputMode, Notice};

/// Render the bottom status bar with mode, counts and last load time.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let loaded = app
        .last_loaded
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let mut msg = format!(
        "mode: {mode}  rows:{}/{}  in-flight:{}  loaded:{loaded}",
        app.table.rows().len(),
        app.users_all.len(),
        app.dispatcher.in_flight(),
    );
    if app.notices.len() > 1 {
        msg.push_str(&format!("  notices:{}", app.notices.len()));
    }
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Rows needed for `message` wrapped at `width`, plus frame and hint, capped to the screen.
fn notice_height(message: &str, width: u16, screen_height: u16) -> u16 {
    let chars = u16::try_from(message.chars().count()).unwrap_or(u16::MAX);
    let approx_lines = (chars / width.saturating_sub(4).max(10)).max(1);
    approx_lines
        .saturating_add(4)
        .min(screen_height.saturating_sub(4).max(5))
}

/// Render the oldest pending failure notice; any key dismisses it.
pub fn render_notice_modal(f: &mut Frame, area: Rect, app: &AppState, notice: &Notice) {
    let max_w = area.width.saturating_sub(6).max(30);
    let width = 60u16.min(max_w);
    let height = notice_height(&notice.message, width, area.height);
    let rect = centered_rect(width, height, area);
    let p = Paragraph::new(vec![
        Line::from(Span::styled(
            notice.message.clone(),
            Style::default().fg(app.theme.error_fg),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "press any key",
            Style::default().fg(app.theme.muted),
        )),
    ])
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .title("Error")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.error_fg)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

fn action_label(a: KeyAction) -> Option<&'static str> {
    Some(match a {
        KeyAction::Quit => "Quit",
        KeyAction::Refresh => "Reload list",
        KeyAction::NewUser => "New user",
        KeyAction::EditSelection => "Edit user",
        KeyAction::DeleteSelection => "Delete user",
        KeyAction::EnterAction => "Row actions",
        KeyAction::StartSearch => "Search",
        KeyAction::OpenHelp => "Help",
        KeyAction::MoveUp => "Move up",
        KeyAction::MoveDown => "Move down",
        KeyAction::PageUp => "Page up",
        KeyAction::PageDown => "Page down",
        KeyAction::Ignore => return None,
    })
}

/// Help lines: general usage followed by the live key bindings.
pub fn help_lines(keymap: &Keymap) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled("Help", Style::default().add_modifier(Modifier::BOLD))),
        Line::raw(""),
        Line::raw("The list always shows the server's state: every change reloads it."),
        Line::raw("Forms: Tab/Up/Down move between fields, Enter saves, Esc cancels."),
        Line::raw("Delete asks for confirmation: y / n, or Left/Right and Enter."),
        Line::raw(""),
        Line::from(Span::styled(
            "Key bindings:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    let actions = [
        KeyAction::NewUser,
        KeyAction::EnterAction,
        KeyAction::EditSelection,
        KeyAction::DeleteSelection,
        KeyAction::Refresh,
        KeyAction::StartSearch,
        KeyAction::MoveUp,
        KeyAction::MoveDown,
        KeyAction::PageUp,
        KeyAction::PageDown,
        KeyAction::OpenHelp,
        KeyAction::Quit,
    ];
    for a in actions {
        let Some(label) = action_label(a) else { continue };
        let keys = keymap.keys_for(a);
        if keys.is_empty() {
            continue;
        }
        lines.push(Line::from(vec![
            Span::raw(format!("  {label:>12} │ ")),
            Span::styled(keys.join(", "), Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines
}

/// Render the help modal with usage notes and key bindings.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 76u16.min(area.width.saturating_sub(4)).max(40);
    let height = 22u16.min(area.height.saturating_sub(4)).max(10);
    let rect = centered_rect(width, height, area);
    let p = Paragraph::new(help_lines(&app.keymap))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help (Esc to close)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
