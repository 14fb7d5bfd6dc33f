//! User records as exchanged with the REST API.
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A user record owned by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// Server-assigned creation time, kept as the server formatted it.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// Creation time in the local time zone, or the raw value if unparseable.
    pub fn created_display(&self) -> String {
        format_created_in(self.created_at.as_deref(), &Local)
    }
}

/// Body of create and update requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
}

impl UserDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Trimmed copy, rejected when a field is missing or the email has no `local@domain` shape.
    pub fn validate(&self) -> Result<UserDraft, String> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        if email.is_empty() {
            return Err("Email is required".to_string());
        }
        match email.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => return Err(format!("'{email}' is not a valid email address")),
        }
        Ok(UserDraft::new(name, email))
    }
}

impl From<&User> for UserDraft {
    fn from(u: &User) -> Self {
        UserDraft::new(u.name.clone(), u.email.clone())
    }
}

/// Parse the timestamp shapes a users API commonly emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let t = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(t) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Format an optional raw timestamp in `tz`.
pub fn format_created_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match raw {
        None => "-".to_string(),
        Some(r) => match parse_timestamp(r) {
            Some(dt) => dt.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
            None => r.to_string(),
        },
    }
}
