//! Application state types and entry glue.
//!
//! Defines the enums and structs that model the TUI state. Everything the
//! handlers and renderers need is reachable from [`AppState`], which `main`
//! builds once and passes down by reference.
//!
pub mod actions;
pub mod keymap;
pub mod ops;
pub mod update;

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use ratatui::style::Color;

use crate::api::UserApi;
use crate::error::{Operation, OperationFailed};
use crate::model::{User, UserDraft};
use crate::ui::table::UserTable;

use self::keymap::Keymap;
use self::ops::{Dispatcher, Ticket};

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error_fg: Color,
}

const THEME_KEYS: [&str; 11] = [
    "text",
    "muted",
    "title",
    "border",
    "header_bg",
    "header_fg",
    "status_bg",
    "status_fg",
    "highlight_fg",
    "highlight_bg",
    "error_fg",
];

impl Theme {
    /// Plain terminal colors.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error_fg: Color::Red,
        }
    }

    /// Catppuccin Mocha palette.
    pub fn mocha() -> Self {
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            muted: Color::Rgb(0x7f, 0x84, 0x9c),
            title: Color::Rgb(0xcb, 0xa6, 0xf7),
            border: Color::Rgb(0x58, 0x5b, 0x70),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf),
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a),
            error_fg: Color::Rgb(0xf3, 0x8b, 0xa8), // red
        }
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Color> {
        Some(match key {
            "text" => &mut self.text,
            "muted" => &mut self.muted,
            "title" => &mut self.title,
            "border" => &mut self.border,
            "header_bg" => &mut self.header_bg,
            "header_fg" => &mut self.header_fg,
            "status_bg" => &mut self.status_bg,
            "status_fg" => &mut self.status_fg,
            "highlight_fg" => &mut self.highlight_fg,
            "highlight_bg" => &mut self.highlight_bg,
            "error_fg" => &mut self.error_fg,
            _ => return None,
        })
    }

    /// Parse `key = color` lines on top of `mocha`. Unknown keys and bad colors are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            if let (Some(slot), Some(color)) = (theme.slot_mut(key.trim()), parse_color(val)) {
                *slot = color;
            }
        }
        theme
    }

    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# usrapi-manager theme\n");
        buf.push_str("# Colors: #RRGGBB, RRGGBB or 'reset'\n\n");
        let mut copy = *self;
        for key in THEME_KEYS {
            if let Some(c) = copy.slot_mut(key) {
                let _ = writeln!(&mut buf, "{key} = {}", color_to_str(*c));
            }
        }
        std::fs::write(path, buf)
    }

    /// Load the theme at `path`, writing the default theme there if it is missing.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default theme");
        }
        t
    }
}

fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if lower == "reset" {
        return Some(Color::Reset);
    }
    let hex = lower.strip_prefix('#').unwrap_or(&lower);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn color_to_str(c: Color) -> String {
    match c {
        Color::Rgb(r, g, b) => format!("#{r:02X}{g:02X}{b:02X}"),
        Color::Black => "#000000".to_string(),
        Color::Red => "#FF0000".to_string(),
        Color::Yellow => "#FFFF00".to_string(),
        Color::Cyan => "#00FFFF".to_string(),
        Color::Gray => "#B3B3B3".to_string(),
        Color::DarkGray => "#4D4D4D".to_string(),
        Color::White => "#FFFFFF".to_string(),
        // Everything else falls back to the terminal default.
        _ => "reset".to_string(),
    }
}

/// Which field of a user form has focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Submit,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Email,
            FormField::Email => FormField::Submit,
            FormField::Submit => FormField::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::Submit,
            FormField::Email => FormField::Name,
            FormField::Submit => FormField::Email,
        }
    }
}

/// Contents of the new-user and edit-user dialogs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserForm {
    /// `None` for a new user.
    pub user_id: Option<u64>,
    pub name: String,
    pub email: String,
    pub focus: FormField,
    pub error: Option<String>,
    /// Ticket of the submitted request while it is in flight.
    pub pending: Option<Ticket>,
}

impl UserForm {
    pub fn blank() -> Self {
        Self {
            user_id: None,
            name: String::new(),
            email: String::new(),
            focus: FormField::Name,
            error: None,
            pending: None,
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: Some(user.id),
            name: user.name.clone(),
            email: user.email.clone(),
            ..Self::blank()
        }
    }

    pub fn draft(&self) -> UserDraft {
        UserDraft::new(self.name.clone(), self.email.clone())
    }

    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Email => Some(&mut self.email),
            FormField::Submit => None,
        }
    }
}

/// Modal dialog states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    /// Edit/Delete menu for the row the user was on when it opened.
    RowActions { selected: usize, user_id: u64 },
    NewUser(UserForm),
    EditUser(UserForm),
    DeleteConfirm { user_id: u64, selected: usize },
    Help { scroll: u16 },
}

/// A queued failure notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub operation: Operation,
    pub message: String,
}

impl From<&OperationFailed> for Notice {
    fn from(e: &OperationFailed) -> Self {
        Self {
            operation: e.operation,
            message: e.to_string(),
        }
    }
}

pub struct AppState {
    pub started_at: Instant,
    /// Result of the last accepted list fetch, in server order.
    pub users_all: Vec<User>,
    /// What is on screen: `users_all` after the search filter.
    pub table: UserTable,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub search_query: String,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub notices: VecDeque<Notice>,
    pub dispatcher: Dispatcher,
    pub last_loaded: Option<DateTime<Local>>,
}

impl AppState {
    pub fn new(api: Arc<dyn UserApi>, theme: Theme, keymap: Keymap) -> Self {
        Self {
            started_at: Instant::now(),
            users_all: Vec::new(),
            table: UserTable::loading(),
            selected_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            theme,
            keymap,
            modal: None,
            notices: VecDeque::new(),
            dispatcher: Dispatcher::new(api),
            last_loaded: None,
        }
    }

    pub fn selected_user(&self) -> Option<&User> {
        let row = self.table.row(self.selected_index)?;
        self.users_all.iter().find(|u| u.id == row.user_id)
    }

    pub fn open_modal(&mut self, modal: ModalState) {
        self.modal = Some(modal);
        self.input_mode = InputMode::Modal;
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
