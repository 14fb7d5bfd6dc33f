//! Handlers behind each user action and each finished operation.
//!
//! Mutations never touch `users_all` directly; success always triggers a
//! full list reload and only an accepted list result changes the display.
use std::collections::HashSet;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::app::ops::{Completion, OpOutput, OpPhase, OpRequest, Ticket};
use crate::app::{AppState, ModalState, Notice, UserForm};
use crate::error::OperationFailed;
use crate::model::User;
use crate::search::apply_search;
use crate::ui::table::{ActionKind, RowAction};

/// Fetch the full list; the result replaces the display when it arrives.
pub fn reload_users(app: &mut AppState) -> Ticket {
    app.dispatcher.submit(OpRequest::LoadUsers)
}

pub fn open_new_user(app: &mut AppState) {
    app.open_modal(ModalState::NewUser(UserForm::blank()));
}

/// Validate and send the open new-user or edit-user form.
///
/// Invalid input stays in the form with an error and issues no request.
pub fn submit_form(app: &mut AppState) -> Option<Ticket> {
    let form = match app.modal.as_mut() {
        Some(ModalState::NewUser(form)) | Some(ModalState::EditUser(form)) => form,
        _ => return None,
    };
    let draft = match form.draft().validate() {
        Ok(d) => d,
        Err(msg) => {
            form.error = Some(msg);
            return None;
        }
    };
    form.error = None;
    let request = match form.user_id {
        Some(id) => OpRequest::Update(id, draft),
        None => OpRequest::Create(draft),
    };
    let ticket = app.dispatcher.submit(request);
    if let Some(ModalState::NewUser(form)) | Some(ModalState::EditUser(form)) = app.modal.as_mut() {
        form.pending = Some(ticket);
    }
    Some(ticket)
}

/// Fetch one user; the edit dialog opens once it arrives.
pub fn open_edit(app: &mut AppState, user_id: u64) -> Ticket {
    app.close_modal();
    app.dispatcher.submit(OpRequest::LoadUser(user_id))
}

/// Ask for confirmation before deleting. No request is issued here.
pub fn ask_delete(app: &mut AppState, user_id: u64) {
    app.open_modal(ModalState::DeleteConfirm {
        user_id,
        selected: 1,
    });
}

/// Close the delete confirmation; only a confirmed one issues a request.
pub fn resolve_delete(app: &mut AppState, confirmed: bool) -> Option<Ticket> {
    let Some(ModalState::DeleteConfirm { user_id, .. }) = app.modal.clone() else {
        return None;
    };
    app.close_modal();
    if !confirmed {
        debug!(user_id, "delete declined");
        return None;
    }
    Some(app.dispatcher.submit(OpRequest::Delete(user_id)))
}

pub fn run_row_action(app: &mut AppState, action: RowAction) {
    match action.kind {
        ActionKind::Edit => {
            open_edit(app, action.user_id);
        }
        ActionKind::Delete => ask_delete(app, action.user_id),
    }
}

/// Activate `kind` on the selected row, if a record row is selected.
pub fn activate_selected(app: &mut AppState, kind: ActionKind) {
    if let Some(action) = app.table.activate(app.selected_index, kind) {
        run_row_action(app, action);
    }
}

pub fn dismiss_notice(app: &mut AppState) {
    app.notices.pop_front();
}

/// Apply every operation that finished since the last call.
pub fn pump_completions(app: &mut AppState) -> usize {
    let mut n = 0;
    while let Some((completion, phase)) = app.dispatcher.try_next() {
        apply_completion(app, completion, phase);
        n += 1;
    }
    n
}

pub fn apply_completion(app: &mut AppState, completion: Completion, phase: OpPhase) {
    let Completion {
        ticket,
        request,
        result,
    } = completion;
    debug!(%ticket, ?phase, op = %request.operation(), "applying completion");
    match result {
        Err(failure) => report_failure(app, ticket, &failure),
        Ok(OpOutput::Users(users)) => {
            if app.dispatcher.accept_list(ticket) {
                install_users(app, users);
            } else {
                debug!(%ticket, "discarding list older than the one on screen");
            }
        }
        Ok(OpOutput::User(user)) => match app.modal {
            None | Some(ModalState::Help { .. }) | Some(ModalState::RowActions { .. }) => {
                app.open_modal(ModalState::EditUser(UserForm::for_user(&user)));
            }
            // Typed input or a pending delete decision is never replaced.
            Some(_) => {
                info!(%ticket, user_id = user.id, "form or confirmation open; edit dropped");
            }
        },
        Ok(OpOutput::Done) => {
            info!(%ticket, op = %request.operation(), "operation succeeded");
            close_form_for(app, ticket);
            if request.operation().is_mutation() {
                reload_users(app);
            }
        }
    }
}

fn report_failure(app: &mut AppState, ticket: Ticket, failure: &OperationFailed) {
    warn!(%ticket, op = %failure.operation, reason = ?failure.reason, "operation failed");
    if let Some(ModalState::NewUser(form)) | Some(ModalState::EditUser(form)) = app.modal.as_mut() {
        if form.pending == Some(ticket) {
            form.pending = None;
        }
    }
    app.notices.push_back(Notice::from(failure));
}

fn close_form_for(app: &mut AppState, ticket: Ticket) {
    let owns_ticket = matches!(
        app.modal.as_ref(),
        Some(ModalState::NewUser(form)) | Some(ModalState::EditUser(form))
            if form.pending == Some(ticket)
    );
    if owns_ticket {
        app.close_modal();
    }
}

fn install_users(app: &mut AppState, users: Vec<User>) {
    let mut seen = HashSet::with_capacity(users.len());
    for u in &users {
        if !seen.insert(u.id) {
            warn!(user_id = u.id, "server returned duplicate user id");
        }
    }
    info!(count = users.len(), "user list loaded");
    app.users_all = users;
    app.last_loaded = Some(Local::now());
    apply_search(app);
}
