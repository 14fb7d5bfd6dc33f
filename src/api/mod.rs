//! HTTP access to the users collection.
//!
//! [`UserApi`] is the seam the rest of the crate talks to. [`HttpUserApi`] is
//! the `ureq`-backed implementation used by the binary; tests substitute an
//! in-memory one.
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::FailureReason;
use crate::model::{User, UserDraft};

/// Default collection endpoint of the reference server.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/users";

pub type ApiResult<T> = std::result::Result<T, FailureReason>;

/// Operations against a users collection.
///
/// Implementations are shared with worker threads, hence `Send + Sync`.
pub trait UserApi: Send + Sync {
    fn list_users(&self) -> ApiResult<Vec<User>>;
    fn get_user(&self, id: u64) -> ApiResult<User>;
    fn create_user(&self, draft: &UserDraft) -> ApiResult<()>;
    fn update_user(&self, id: u64, draft: &UserDraft) -> ApiResult<()>;
    fn delete_user(&self, id: u64) -> ApiResult<()>;

    /// Human-readable location shown in the header.
    fn endpoint(&self) -> String {
        "in-memory".to_string()
    }
}

pub struct HttpUserApi {
    collection_url: String,
    agent: ureq::Agent,
}

impl HttpUserApi {
    pub fn new(collection_url: &str) -> Self {
        Self {
            collection_url: collection_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new(),
        }
    }

    pub fn member_url(&self, id: u64) -> String {
        format!("{}/{}", self.collection_url, id)
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        resp: std::result::Result<ureq::Response, ureq::Error>,
    ) -> ApiResult<T> {
        let resp = check_status(resp)?;
        resp.into_json::<T>()
            .map_err(|e| FailureReason::Decode(e.to_string()))
    }

    fn expect_success(
        &self,
        resp: std::result::Result<ureq::Response, ureq::Error>,
    ) -> ApiResult<()> {
        let resp = check_status(resp)?;
        debug!(status = resp.status(), url = resp.get_url(), "mutation accepted");
        Ok(())
    }
}

impl UserApi for HttpUserApi {
    fn list_users(&self) -> ApiResult<Vec<User>> {
        self.read_json(self.agent.get(&self.collection_url).call())
    }

    fn get_user(&self, id: u64) -> ApiResult<User> {
        self.read_json(self.agent.get(&self.member_url(id)).call())
    }

    fn create_user(&self, draft: &UserDraft) -> ApiResult<()> {
        self.expect_success(self.agent.post(&self.collection_url).send_json(draft))
    }

    fn update_user(&self, id: u64, draft: &UserDraft) -> ApiResult<()> {
        self.expect_success(self.agent.put(&self.member_url(id)).send_json(draft))
    }

    fn delete_user(&self, id: u64) -> ApiResult<()> {
        self.expect_success(self.agent.delete(&self.member_url(id)).call())
    }

    fn endpoint(&self) -> String {
        self.collection_url.clone()
    }
}

/// Collapse a `ureq` outcome into a 2xx response or a [`FailureReason`].
fn check_status(
    resp: std::result::Result<ureq::Response, ureq::Error>,
) -> ApiResult<ureq::Response> {
    match resp {
        Ok(r) if (200..300).contains(&r.status()) => Ok(r),
        Ok(r) => {
            let code = r.status();
            let body = r.into_string().unwrap_or_default();
            Err(FailureReason::Status {
                code,
                message: server_message(&body),
            })
        }
        Err(ureq::Error::Status(code, r)) => {
            let body = r.into_string().unwrap_or_default();
            Err(FailureReason::Status {
                code,
                message: server_message(&body),
            })
        }
        Err(e) => Err(FailureReason::Transport(e.to_string())),
    }
}

/// Extract `error` or `message` from a JSON error body, if there is one.
pub fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|k| value.get(*k).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}
