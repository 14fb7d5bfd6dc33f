// Integration tests for usrapi-manager

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use usrapi_manager::api::{ApiResult, UserApi};
use usrapi_manager::app::actions;
use usrapi_manager::app::keymap::Keymap;
use usrapi_manager::app::update::{Flow, handle_key};
use usrapi_manager::app::{AppState, ModalState, Theme};
use usrapi_manager::error::FailureReason;
use usrapi_manager::model::{User, UserDraft};

/// In-memory users collection that records every call.
#[derive(Default)]
struct MockApi {
    users: Mutex<Vec<User>>,
    next_id: AtomicU64,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MockApi {
    fn with_users(users: Vec<User>) -> Arc<Self> {
        let next = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Arc::new(Self {
            users: Mutex::new(users),
            next_id: AtomicU64::new(next),
            ..Default::default()
        })
    }

    fn fail(&self, call: &'static str) {
        self.failing.lock().unwrap().insert(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: &'static str, detail: String) -> ApiResult<()> {
        self.calls.lock().unwrap().push(format!("{call}{detail}"));
        if self.failing.lock().unwrap().contains(call) {
            return Err(FailureReason::Status {
                code: 400,
                message: Some(format!("{call} rejected")),
            });
        }
        Ok(())
    }
}

impl UserApi for MockApi {
    fn list_users(&self) -> ApiResult<Vec<User>> {
        self.record("list", String::new())?;
        Ok(self.users.lock().unwrap().clone())
    }

    fn get_user(&self, id: u64) -> ApiResult<User> {
        self.record("get", format!(" {id}"))?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(FailureReason::Status {
                code: 404,
                message: Some("User not found".into()),
            })
    }

    fn create_user(&self, draft: &UserDraft) -> ApiResult<()> {
        self.record("create", format!(" {}", draft.name))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.users.lock().unwrap().push(User {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            created_at: Some("2024-10-16 09:15:00".into()),
        });
        Ok(())
    }

    fn update_user(&self, id: u64, draft: &UserDraft) -> ApiResult<()> {
        self.record("update", format!(" {id}"))?;
        let mut users = self.users.lock().unwrap();
        let u = users.iter_mut().find(|u| u.id == id).ok_or(FailureReason::Status {
            code: 404,
            message: None,
        })?;
        u.name = draft.name.clone();
        u.email = draft.email.clone();
        Ok(())
    }

    fn delete_user(&self, id: u64) -> ApiResult<()> {
        self.record("delete", format!(" {id}"))?;
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

fn seed() -> Vec<User> {
    vec![
        User {
            id: 1,
            name: "Alice".into(),
            email: "alice@x.com".into(),
            created_at: Some("Wed, 16 Oct 2024 09:15:00 GMT".into()),
        },
        User {
            id: 2,
            name: "Bob".into(),
            email: "bob@x.com".into(),
            created_at: None,
        },
    ]
}

fn mk_app(api: Arc<MockApi>) -> AppState {
    AppState::new(api, Theme::dark(), Keymap::default())
}

/// Apply completions until nothing is in flight, including follow-up reloads.
fn settle(app: &mut AppState) {
    while app.dispatcher.in_flight() > 0 {
        let (completion, phase) = app
            .dispatcher
            .wait_next(Duration::from_secs(5))
            .expect("operation did not finish");
        actions::apply_completion(app, completion, phase);
    }
}

fn loaded_app(api: &Arc<MockApi>) -> AppState {
    let mut app = mk_app(Arc::clone(api));
    actions::reload_users(&mut app);
    settle(&mut app);
    api.clear_calls();
    app
}

fn press(app: &mut AppState, code: KeyCode) -> Flow {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(app: &mut AppState, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn displayed(app: &AppState) -> Vec<Vec<String>> {
    app.table.text_rows()
}

// 1) First load renders the server's list in order
#[test]
fn initial_load_renders_server_order() {
    let api = MockApi::with_users(seed());
    let mut app = mk_app(Arc::clone(&api));
    assert_eq!(app.table.placeholder(), Some("Loading users..."));
    actions::reload_users(&mut app);
    settle(&mut app);

    let ids: Vec<u64> = app.table.rows().iter().map(|r| r.user_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(app.last_loaded.is_some());
    assert_eq!(api.calls(), vec!["list"]);
}

// 2) Create through the form, then the list is reloaded
#[test]
fn create_success_reloads_and_closes_form() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);

    press(&mut app, KeyCode::Char('n'));
    assert!(matches!(app.modal, Some(ModalState::NewUser(_))));
    type_text(&mut app, "Carol");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "carol@x.com");
    press(&mut app, KeyCode::Enter);
    settle(&mut app);

    assert_eq!(api.calls(), vec!["create Carol", "list"]);
    assert!(app.modal.is_none());
    assert_eq!(app.table.rows().len(), 3);
    assert_eq!(app.table.rows()[2].cells[1], "Carol");
    assert!(app.notices.is_empty());
}

// 3) A rejected create leaves the table alone and yields one notice
#[test]
fn create_failure_keeps_rows_and_notifies_once() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);
    api.fail("create");
    let before = displayed(&app);

    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "Carol");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "carol@x.com");
    press(&mut app, KeyCode::Enter);
    settle(&mut app);

    assert_eq!(displayed(&app), before);
    assert_eq!(app.notices.len(), 1);
    assert!(app.notices[0].message.starts_with("Error adding user:"));
    assert_eq!(api.calls(), vec!["create Carol"]);
    match &app.modal {
        Some(ModalState::NewUser(form)) => {
            assert_eq!(form.name, "Carol");
            assert!(form.pending.is_none());
        }
        other => panic!("form should stay open, got {other:?}"),
    }
}

// 4) Declining the delete confirmation sends nothing
#[test]
fn declined_delete_issues_no_request() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);
    let before = displayed(&app);

    press(&mut app, KeyCode::Char('d'));
    assert!(matches!(
        app.modal,
        Some(ModalState::DeleteConfirm { user_id: 1, .. })
    ));
    press(&mut app, KeyCode::Char('n'));

    assert!(app.modal.is_none());
    assert_eq!(app.dispatcher.in_flight(), 0);
    assert!(api.calls().is_empty());
    assert_eq!(displayed(&app), before);

    // Enter on the default "No" declines as well
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char('d'));
    press(&mut app, KeyCode::Enter);
    assert!(api.calls().is_empty());
}

// 5) Confirmed delete removes the row after the reload
#[test]
fn confirmed_delete_reloads_without_row() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);

    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter); // row actions
    press(&mut app, KeyCode::Down); // "Delete"
    press(&mut app, KeyCode::Enter);
    assert!(matches!(
        app.modal,
        Some(ModalState::DeleteConfirm { user_id: 2, .. })
    ));
    press(&mut app, KeyCode::Char('y'));
    settle(&mut app);

    assert_eq!(api.calls(), vec!["delete 2", "list"]);
    let ids: Vec<u64> = app.table.rows().iter().map(|r| r.user_id).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(app.selected_index, 0);
}

// 6) Edit: fetch one, change the name, save, reload
#[test]
fn edit_round_trip() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);

    press(&mut app, KeyCode::Char('e'));
    settle(&mut app);
    match &app.modal {
        Some(ModalState::EditUser(form)) => {
            assert_eq!(form.user_id, Some(1));
            assert_eq!(form.name, "Alice");
            assert_eq!(form.email, "alice@x.com");
        }
        other => panic!("expected edit dialog, got {other:?}"),
    }
    for _ in 0.."Alice".len() {
        press(&mut app, KeyCode::Backspace);
    }
    type_text(&mut app, "Alicia");
    press(&mut app, KeyCode::Enter); // to email
    press(&mut app, KeyCode::Enter); // save
    settle(&mut app);

    assert_eq!(api.calls(), vec!["get 1", "update 1", "list"]);
    assert!(app.modal.is_none());
    assert_eq!(app.table.rows()[0].cells[1], "Alicia");
}

// 7) Failed single fetch shows a notice and opens nothing
#[test]
fn edit_of_vanished_user_notifies() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);
    api.users.lock().unwrap().retain(|u| u.id != 1);

    press(&mut app, KeyCode::Char('e'));
    settle(&mut app);

    assert!(app.modal.is_none());
    assert_eq!(app.notices.len(), 1);
    assert_eq!(
        app.notices[0].message,
        "Error loading user data: server responded with status 404 (User not found)"
    );
    // still showing the last good list
    assert_eq!(app.table.rows().len(), 2);
}

// 8) Invalid input never reaches the API
#[test]
fn invalid_form_issues_no_request() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);

    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "Dan");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "not-an-email");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.dispatcher.in_flight(), 0);
    assert!(api.calls().is_empty());
    match &app.modal {
        Some(ModalState::NewUser(form)) => assert!(form.error.is_some()),
        other => panic!("form should stay open, got {other:?}"),
    }
}

// 9) A notice swallows the next key, then normal handling resumes
#[test]
fn notice_is_dismissed_before_other_keys() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);
    api.fail("list");
    press(&mut app, KeyCode::Char('r'));
    settle(&mut app);
    assert_eq!(app.notices.len(), 1);
    assert!(app.notices[0].message.starts_with("Error loading users:"));
    assert_eq!(app.table.rows().len(), 2);

    assert_eq!(press(&mut app, KeyCode::Char('q')), Flow::Continue);
    assert!(app.notices.is_empty());
    assert_eq!(press(&mut app, KeyCode::Char('q')), Flow::Quit);
}

// 10) An older list result arriving late does not replace a newer one
#[test]
fn stale_list_result_is_discarded() {
    use usrapi_manager::app::ops::{Completion, OpOutput, OpPhase, OpRequest, Ticket};

    let api = MockApi::with_users(vec![]);
    let mut app = mk_app(api);
    let newer = seed();
    let older = vec![seed()[1].clone()];

    actions::apply_completion(
        &mut app,
        Completion {
            ticket: Ticket(10),
            request: OpRequest::LoadUsers,
            result: Ok(OpOutput::Users(newer)),
        },
        OpPhase::Success,
    );
    actions::apply_completion(
        &mut app,
        Completion {
            ticket: Ticket(4),
            request: OpRequest::LoadUsers,
            result: Ok(OpOutput::Users(older)),
        },
        OpPhase::Success,
    );

    let ids: Vec<u64> = app.table.rows().iter().map(|r| r.user_id).collect();
    assert_eq!(ids, vec![1, 2]);
}

// 11) Search narrows the display; Esc restores it
#[test]
fn search_filters_live_and_esc_restores() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "bob");
    assert_eq!(app.table.rows().len(), 1);
    assert_eq!(app.table.rows()[0].user_id, 2);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.table.rows().len(), 2);
    assert!(api.calls().is_empty());
}

// 12) Empty server list renders the placeholder
#[test]
fn empty_server_list_shows_placeholder() {
    let api = MockApi::with_users(vec![]);
    let mut app = mk_app(api);
    actions::reload_users(&mut app);
    settle(&mut app);
    assert_eq!(app.table.placeholder(), Some("No users found"));
    // row actions on the placeholder do nothing
    press(&mut app, KeyCode::Char('d'));
    assert!(app.modal.is_none());
}

// 13) Starting a new search shows the whole list again
#[test]
fn new_search_starts_from_full_list() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "bob");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.table.rows().len(), 1);

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.table.rows().len(), 2);
    press(&mut app, KeyCode::Enter);
    assert!(app.search_query.is_empty());
    assert_eq!(app.table.rows().len(), 2);
}

// 14) A fetched user replaces help or the row menu, but never a form
#[test]
fn edit_result_replaces_help_but_not_a_form() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);

    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Char('?'));
    assert!(matches!(app.modal, Some(ModalState::Help { .. })));
    settle(&mut app);
    match &app.modal {
        Some(ModalState::EditUser(form)) => assert_eq!(form.user_id, Some(1)),
        other => panic!("expected edit dialog, got {other:?}"),
    }

    press(&mut app, KeyCode::Esc);
    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "Dan");
    settle(&mut app);
    match &app.modal {
        Some(ModalState::NewUser(form)) => assert_eq!(form.name, "Dan"),
        other => panic!("new-user form should stay, got {other:?}"),
    }
}

// 15) Re-rendering never duplicates what a row action does
#[test]
fn delete_after_repeated_reloads_runs_once() {
    let api = MockApi::with_users(seed());
    let mut app = loaded_app(&api);
    press(&mut app, KeyCode::Char('r'));
    settle(&mut app);
    press(&mut app, KeyCode::Char('r'));
    settle(&mut app);
    api.clear_calls();

    press(&mut app, KeyCode::Char('d'));
    press(&mut app, KeyCode::Char('y'));
    settle(&mut app);

    assert_eq!(api.calls(), vec!["delete 1", "list"]);
    let ids: Vec<u64> = app.table.rows().iter().map(|r| r.user_id).collect();
    assert_eq!(ids, vec![2]);
}

mod http {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use usrapi_manager::api::{HttpUserApi, UserApi};
    use usrapi_manager::error::FailureReason;
    use usrapi_manager::model::UserDraft;

    /// Answer exactly one request with `status` and `body`; returns the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line.is_empty() || line == "\r\n" {
                    break;
                }
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                request.push_str(&line);
            }
            let mut payload = vec![0u8; content_length];
            reader.read_exact(&mut payload).unwrap();
            request.push_str(&String::from_utf8_lossy(&payload));
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            request
        });
        (format!("http://{addr}/users"), handle)
    }

    #[test]
    fn list_parses_records() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"id":1,"name":"A","email":"a@x.com","created_at":"Wed, 16 Oct 2024 09:15:00 GMT"},{"id":2,"name":"B","email":"b@x.com","created_at":null}]"#,
        );
        let users = HttpUserApi::new(&url).list_users().unwrap();
        let request = server.join().unwrap();
        assert!(request.starts_with("GET /users HTTP/1.1"));
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name, "B");
        assert!(users[1].created_at.is_none());
    }

    #[test]
    fn create_posts_json_body() {
        let (url, server) = serve_once("201 CREATED", r#"{"message":"User created successfully","id":3}"#);
        HttpUserApi::new(&url)
            .create_user(&UserDraft::new("Carol", "carol@x.com"))
            .unwrap();
        let request = server.join().unwrap();
        assert!(request.starts_with("POST /users HTTP/1.1"));
        assert!(request.contains(r#""name":"Carol""#));
        assert!(request.contains(r#""email":"carol@x.com""#));
    }

    #[test]
    fn error_status_carries_server_message() {
        let (url, server) = serve_once("404 NOT FOUND", r#"{"message":"User not found"}"#);
        let err = HttpUserApi::new(&url).get_user(9).unwrap_err();
        let request = server.join().unwrap();
        assert!(request.starts_with("GET /users/9 HTTP/1.1"));
        assert_eq!(
            err,
            FailureReason::Status {
                code: 404,
                message: Some("User not found".into())
            }
        );
    }

    #[test]
    fn malformed_body_is_a_decode_failure() {
        let (url, server) = serve_once("200 OK", r#"{"not":"a list"}"#);
        let err = HttpUserApi::new(&url).list_users().unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, FailureReason::Decode(_)));
    }

    #[test]
    fn refused_connection_is_a_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = HttpUserApi::new(&format!("http://{addr}/users"))
            .delete_user(1)
            .unwrap_err();
        assert!(matches!(err, FailureReason::Transport(_)));
    }
}
