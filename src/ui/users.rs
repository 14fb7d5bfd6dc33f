use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, FormField, ModalState, UserForm};
use crate::ui::components::centered_rect;
use crate::ui::table::{ActionKind, COLUMNS};

pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let block = Block::default()
        .title("Users")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let header = Row::new(COLUMNS.to_vec()).style(
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    );

    // A placeholder spans every column, so it gets a single full-width column.
    if let Some(text) = app.table.placeholder() {
        let table = Table::new(
            [Row::new(vec![Cell::from(text)]).style(Style::default().fg(app.theme.muted))],
            [Constraint::Percentage(100)],
        )
        .block(block);
        f.render_widget(table, area);
        return;
    }

    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }
    let rows_all = app.table.rows();
    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(rows_all.len());

    let rows = rows_all[start..end].iter().enumerate().map(|(i, r)| {
        let style = if start + i == app.selected_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        let actions = r
            .actions()
            .iter()
            .map(|a| format!("[{}]", a.kind.label()))
            .collect::<Vec<_>>()
            .join(" ");
        let mut cells: Vec<Cell> = r.cells.iter().map(|c| Cell::from(c.clone())).collect();
        cells.push(Cell::from(actions));
        Row::new(cells).style(style)
    });

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(25),
        Constraint::Percentage(35),
        Constraint::Length(19),
        Constraint::Length(17),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}

pub fn render_user_details(f: &mut Frame, area: Rect, app: &AppState) {
    let text = match app.selected_user() {
        Some(u) => format!(
            "ID: {}\nName: {}\nEmail: {}\nCreated: {}\nCreated (raw): {}",
            u.id,
            u.name,
            u.email,
            u.created_display(),
            u.created_at.as_deref().unwrap_or("-"),
        ),
        None => String::from("No user selected"),
    };
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

fn form_body(form: &UserForm) -> String {
    let marker = |field: FormField| if form.focus == field { "▶" } else { " " };
    let mut body = format!(
        "{} Name:  {}\n{} Email: {}\n\n{} [Save]",
        marker(FormField::Name),
        form.name,
        marker(FormField::Email),
        form.email,
        marker(FormField::Submit),
    );
    if form.pending.is_some() {
        body.push_str("  saving...");
    }
    if let Some(err) = &form.error {
        body.push_str(&format!("\n\n{err}"));
    }
    body
}

pub fn render_user_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let (title, body, width, height) = match state {
        ModalState::RowActions { selected, user_id } => {
            let mut text = String::new();
            for (idx, kind) in [ActionKind::Edit, ActionKind::Delete].iter().enumerate() {
                let marker = if idx == *selected { "▶" } else { " " };
                text.push_str(&format!("{} {}\n", marker, kind.label()));
            }
            (format!("User {user_id}"), text, 30u16, 6u16)
        }
        ModalState::NewUser(form) => ("New user".to_string(), form_body(form), 60, 10),
        ModalState::EditUser(form) => {
            let id = form.user_id.map(|i| i.to_string()).unwrap_or_default();
            (format!("Edit user {id}"), form_body(form), 60, 10)
        }
        ModalState::DeleteConfirm { user_id, selected } => {
            let name = app
                .users_all
                .iter()
                .find(|u| u.id == *user_id)
                .map(|u| u.name.clone())
                .unwrap_or_default();
            let yes = if *selected == 0 { "[Yes]" } else { " Yes " };
            let no = if *selected == 1 { "[No]" } else { " No " };
            (
                "Confirm delete".to_string(),
                format!(
                    "Are you sure you want to delete user {user_id} '{name}'?\n\n  {yes}    {no}"
                ),
                56,
                7,
            )
        }
        ModalState::Help { .. } => return,
    };
    let rect = centered_rect(width, height, area);
    let p = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
