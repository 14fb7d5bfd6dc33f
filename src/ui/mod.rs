pub mod components;
pub mod table;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(root[1]);

    let prompt = match app.input_mode {
        InputMode::Search => format!("  Search: {}_", app.search_query),
        InputMode::Normal if !app.search_query.is_empty() => {
            format!("  filter: \"{}\"", app.search_query)
        }
        _ => String::new(),
    };
    let header = Paragraph::new(format!(
        "{}{}  | n: new; Enter: actions; e: edit; d: delete; r: reload; /: search; ?: help; q: quit",
        app.dispatcher.endpoint(),
        prompt
    ))
    .block(
        Block::default()
            .title("usrapi-manager")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(header, root[0]);

    users::render_users_table(f, body[0], app);
    users::render_user_details(f, body[1], app);
    components::render_status_bar(f, root[2], app);

    if let Some(state) = app.modal.clone() {
        match &state {
            ModalState::Help { scroll } => components::render_help_modal(f, f.area(), app, *scroll),
            _ => users::render_user_modal(f, f.area(), app, &state),
        }
    }
    if let Some(notice) = app.notices.front() {
        components::render_notice_modal(f, f.area(), app, notice);
    }
}
