//! The users table as data: one row per record, each owning its actions.
//!
//! Every call to [`UserTable::render`] builds a fresh table; nothing from a
//! previous render survives. Row actions are created together with their row
//! and carry that row's user id, so activation is a lookup, not a callback
//! registry that could pick up stale or duplicate entries.
use crate::model::User;

pub const COLUMNS: [&str; 5] = ["ID", "NAME", "EMAIL", "CREATED", "ACTIONS"];
pub const EMPTY_PLACEHOLDER: &str = "No users found";
pub const LOADING_PLACEHOLDER: &str = "Loading users...";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Edit,
    Delete,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Edit => "Edit",
            ActionKind::Delete => "Delete",
        }
    }
}

/// A row-scoped action bound to one user id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowAction {
    pub kind: ActionKind,
    pub user_id: u64,
}

#[derive(Clone, Debug)]
pub struct UserRow {
    pub user_id: u64,
    /// id, name, email, formatted creation time.
    pub cells: [String; 4],
    actions: [RowAction; 2],
}

impl UserRow {
    fn new(user: &User) -> Self {
        Self {
            user_id: user.id,
            cells: [
                user.id.to_string(),
                user.name.clone(),
                user.email.clone(),
                user.created_display(),
            ],
            actions: [
                RowAction {
                    kind: ActionKind::Edit,
                    user_id: user.id,
                },
                RowAction {
                    kind: ActionKind::Delete,
                    user_id: user.id,
                },
            ],
        }
    }

    pub fn actions(&self) -> &[RowAction] {
        &self.actions
    }

    pub fn action(&self, kind: ActionKind) -> RowAction {
        match kind {
            ActionKind::Edit => self.actions[0],
            ActionKind::Delete => self.actions[1],
        }
    }
}

#[derive(Clone, Debug)]
enum Body {
    Placeholder(&'static str),
    Rows(Vec<UserRow>),
}

#[derive(Clone, Debug)]
pub struct UserTable {
    body: Body,
}

impl UserTable {
    /// Table shown before the first list fetch completes.
    pub fn loading() -> Self {
        Self {
            body: Body::Placeholder(LOADING_PLACEHOLDER),
        }
    }

    /// Build the table for `users`, in the given order.
    pub fn render(users: &[User]) -> Self {
        if users.is_empty() {
            return Self {
                body: Body::Placeholder(EMPTY_PLACEHOLDER),
            };
        }
        Self {
            body: Body::Rows(users.iter().map(UserRow::new).collect()),
        }
    }

    /// Number of displayed rows, counting a placeholder as one.
    pub fn display_len(&self) -> usize {
        match &self.body {
            Body::Placeholder(_) => 1,
            Body::Rows(rows) => rows.len(),
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match &self.body {
            Body::Placeholder(text) => Some(*text),
            Body::Rows(_) => None,
        }
    }

    /// Record rows; empty when a placeholder is shown.
    pub fn rows(&self) -> &[UserRow] {
        match &self.body {
            Body::Placeholder(_) => &[],
            Body::Rows(rows) => rows,
        }
    }

    pub fn row(&self, index: usize) -> Option<&UserRow> {
        self.rows().get(index)
    }

    /// Dispatch an action on the row at `index`.
    pub fn activate(&self, index: usize, kind: ActionKind) -> Option<RowAction> {
        self.row(index).map(|r| r.action(kind))
    }

    /// Plain-text cells per displayed row, placeholder included.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        match &self.body {
            Body::Placeholder(text) => vec![vec![text.to_string()]],
            Body::Rows(rows) => rows
                .iter()
                .map(|r| {
                    let mut cells = r.cells.to_vec();
                    cells.push(
                        r.actions()
                            .iter()
                            .map(|a| a.kind.label())
                            .collect::<Vec<_>>()
                            .join(" "),
                    );
                    cells
                })
                .collect(),
        }
    }
}

impl Default for UserTable {
    fn default() -> Self {
        Self::loading()
    }
}
