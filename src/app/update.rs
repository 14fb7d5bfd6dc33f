use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;
use tracing::info;

use crate::app::actions;
use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState};
use crate::search::apply_search;
use crate::ui;
use crate::ui::table::ActionKind;

/// Whether the event loop should keep running after a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut app: AppState,
) -> Result<()> {
    actions::reload_users(&mut app);

    loop {
        actions::pump_completions(&mut app);
        terminal.draw(|f| ui::render(f, &mut app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(&mut app, key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    info!(
        in_flight = app.dispatcher.in_flight(),
        uptime_secs = app.started_at.elapsed().as_secs(),
        "leaving event loop"
    );
    Ok(())
}

pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Flow {
    // A notice blocks everything else until dismissed.
    if !app.notices.is_empty() {
        actions::dismiss_notice(app);
        return Flow::Continue;
    }
    match app.input_mode {
        InputMode::Normal => return handle_normal_key(app, key),
        InputMode::Search => handle_search_key(app, key.code),
        InputMode::Modal => handle_modal_key(app, key.code),
    }
    Flow::Continue
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) -> Flow {
    let Some(action) = app.keymap.resolve(&key) else {
        return Flow::Continue;
    };
    let rows = app.table.rows().len();
    let rpp = app.rows_per_page.max(1);
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::Refresh => {
            actions::reload_users(app);
        }
        KeyAction::NewUser => actions::open_new_user(app),
        KeyAction::EditSelection => actions::activate_selected(app, ActionKind::Edit),
        KeyAction::DeleteSelection => actions::activate_selected(app, ActionKind::Delete),
        KeyAction::EnterAction => {
            if let Some(row) = app.table.row(app.selected_index) {
                let user_id = row.user_id;
                app.open_modal(ModalState::RowActions {
                    selected: 0,
                    user_id,
                });
            }
        }
        KeyAction::StartSearch => {
            app.search_query.clear();
            apply_search(app);
            app.input_mode = InputMode::Search;
        }
        KeyAction::OpenHelp => app.open_modal(ModalState::Help { scroll: 0 }),
        KeyAction::MoveUp => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_index + 1 < rows {
                app.selected_index += 1;
            }
        }
        KeyAction::PageUp => app.selected_index = app.selected_index.saturating_sub(rpp),
        KeyAction::PageDown => {
            app.selected_index = app
                .selected_index
                .saturating_add(rpp)
                .min(rows.saturating_sub(1));
        }
        KeyAction::Ignore => {}
    }
    Flow::Continue
}

/// Search filters live while typing; Enter keeps the filter, Esc drops it.
fn handle_search_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.search_query.clear();
            app.input_mode = InputMode::Normal;
            apply_search(app);
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            apply_search(app);
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            apply_search(app);
        }
        _ => {}
    }
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) {
    let Some(modal) = app.modal.clone() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    match modal {
        ModalState::RowActions { selected, user_id } => match code {
            KeyCode::Esc => app.close_modal(),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Down | KeyCode::Char('j') => {
                app.modal = Some(ModalState::RowActions {
                    selected: 1 - selected.min(1),
                    user_id,
                });
            }
            KeyCode::Char('e') => {
                actions::open_edit(app, user_id);
            }
            KeyCode::Char('d') => actions::ask_delete(app, user_id),
            KeyCode::Enter => {
                if selected == 0 {
                    actions::open_edit(app, user_id);
                } else {
                    actions::ask_delete(app, user_id);
                }
            }
            _ => {}
        },
        ModalState::NewUser(_) | ModalState::EditUser(_) => handle_form_key(app, code),
        ModalState::DeleteConfirm { user_id, selected } => match code {
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Char('h')
            | KeyCode::Char('l')
            | KeyCode::Tab => {
                app.modal = Some(ModalState::DeleteConfirm {
                    user_id,
                    selected: 1 - selected.min(1),
                });
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                actions::resolve_delete(app, true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                actions::resolve_delete(app, false);
            }
            KeyCode::Enter => {
                actions::resolve_delete(app, selected == 0);
            }
            _ => {}
        },
        ModalState::Help { scroll } => match code {
            KeyCode::Up | KeyCode::Char('k') => {
                app.modal = Some(ModalState::Help {
                    scroll: scroll.saturating_sub(1),
                });
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.modal = Some(ModalState::Help {
                    scroll: scroll.saturating_add(1),
                });
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => {
                app.close_modal()
            }
            _ => {}
        },
    }
}

enum FormStep {
    Stay,
    Close,
    Submit,
}

fn handle_form_key(app: &mut AppState, code: KeyCode) {
    let step = match app.modal.as_mut() {
        Some(ModalState::NewUser(form) | ModalState::EditUser(form)) => match code {
            KeyCode::Esc => FormStep::Close,
            KeyCode::Tab | KeyCode::Down => {
                form.focus = form.focus.next();
                FormStep::Stay
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus = form.focus.prev();
                FormStep::Stay
            }
            KeyCode::Enter => match form.focus {
                crate::app::FormField::Name => {
                    form.focus = form.focus.next();
                    FormStep::Stay
                }
                _ => FormStep::Submit,
            },
            KeyCode::Backspace => {
                if let Some(text) = form.focused_text_mut() {
                    text.pop();
                }
                FormStep::Stay
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.focused_text_mut() {
                    text.push(c);
                }
                FormStep::Stay
            }
            _ => FormStep::Stay,
        },
        _ => FormStep::Stay,
    };
    match step {
        FormStep::Stay => {}
        FormStep::Close => app.close_modal(),
        FormStep::Submit => {
            actions::submit_form(app);
        }
    }
}
