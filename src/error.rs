//! Error types: startup plumbing plus the single operation failure kind.
use std::fmt::{Display, Formatter};

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type Result<T> = std::result::Result<T, DynError>;

/// Attach a lazily built context message to a fallible call.
pub trait Context<T> {
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

#[derive(Debug)]
pub struct WithContextError {
    pub context: String,
    pub source: DynError,
}

impl Display for WithContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl std::error::Error for WithContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            Box::new(WithContextError {
                context: f(),
                source: e.into(),
            }) as DynError
        })
    }
}

#[derive(Debug)]
pub struct SimpleError(pub String);

impl Display for SimpleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SimpleError {}

pub fn simple_error(msg: impl Into<String>) -> DynError {
    Box::new(SimpleError(msg.into()))
}

/// The remote operations a user can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadUsers,
    LoadUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl Operation {
    /// Verb phrase used in notifications ("Error adding user: ...").
    pub fn verb_phrase(self) -> &'static str {
        match self {
            Operation::LoadUsers => "loading users",
            Operation::LoadUser => "loading user data",
            Operation::CreateUser => "adding user",
            Operation::UpdateUser => "updating user",
            Operation::DeleteUser => "deleting user",
        }
    }

    /// Mutations are followed by a full list reload on success.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::CreateUser | Operation::UpdateUser | Operation::DeleteUser
        )
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb_phrase())
    }
}

/// Why a remote call did not succeed.
///
/// The variants exist for logging; the notification path treats them alike.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded with status {code}{}", detail_suffix(.message))]
    Status { code: u16, message: Option<String> },

    #[error("invalid response: {0}")]
    Decode(String),
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(" ({m})"),
        _ => String::new(),
    }
}

/// The one error kind surfaced to the user: which operation failed and why.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Error {operation}: {reason}")]
pub struct OperationFailed {
    pub operation: Operation,
    pub reason: FailureReason,
}

impl OperationFailed {
    pub fn new(operation: Operation, reason: FailureReason) -> Self {
        Self { operation, reason }
    }
}
