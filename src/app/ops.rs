//! Background execution of API operations.
//!
//! ```text
//!   UI thread                         worker thread (one per operation)
//!      │ submit(req) -> Ticket              │
//!      │──────────────────────────────────>│ UserApi call (blocking I/O)
//!      │                                    │
//!      │ try_next() -> Some(Completion)     │
//!      │<──────────────────────────────────│
//! ```
//!
//! Each operation moves Idle → Pending → Success | Failure → Idle. Nothing is
//! retried, timed out or cancelled; several operations may be in flight.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use crate::api::UserApi;
use crate::error::{FailureReason, Operation, OperationFailed};
use crate::model::{User, UserDraft};

/// Monotonically increasing operation id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request together with its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpRequest {
    LoadUsers,
    LoadUser(u64),
    Create(UserDraft),
    Update(u64, UserDraft),
    Delete(u64),
}

impl OpRequest {
    pub fn operation(&self) -> Operation {
        match self {
            OpRequest::LoadUsers => Operation::LoadUsers,
            OpRequest::LoadUser(_) => Operation::LoadUser,
            OpRequest::Create(_) => Operation::CreateUser,
            OpRequest::Update(..) => Operation::UpdateUser,
            OpRequest::Delete(_) => Operation::DeleteUser,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpOutput {
    Users(Vec<User>),
    User(User),
    Done,
}

/// The single result a worker reports back.
#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub request: OpRequest,
    pub result: std::result::Result<OpOutput, OperationFailed>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpPhase {
    Idle,
    Pending,
    Success,
    Failure,
}

/// Bookkeeping for in-flight operations.
#[derive(Debug, Default)]
pub struct OpTracker {
    next: u64,
    pending: BTreeMap<Ticket, Operation>,
}

impl OpTracker {
    /// Idle → Pending.
    pub fn begin(&mut self, op: Operation) -> Ticket {
        self.next += 1;
        let ticket = Ticket(self.next);
        self.pending.insert(ticket, op);
        debug!(%ticket, %op, "operation pending");
        ticket
    }

    /// Pending → Success | Failure. The ticket is Idle again afterwards.
    pub fn finish(&mut self, ticket: Ticket, succeeded: bool) -> OpPhase {
        match self.pending.remove(&ticket) {
            None => {
                warn!(%ticket, "completion for unknown operation");
                OpPhase::Idle
            }
            Some(op) => {
                let phase = if succeeded {
                    OpPhase::Success
                } else {
                    OpPhase::Failure
                };
                debug!(%ticket, %op, ?phase, "operation finished");
                phase
            }
        }
    }

    pub fn phase(&self, ticket: Ticket) -> OpPhase {
        if self.pending.contains_key(&ticket) {
            OpPhase::Pending
        } else {
            OpPhase::Idle
        }
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

/// Runs operations on worker threads and collects their completions.
pub struct Dispatcher {
    api: Arc<dyn UserApi>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    tracker: OpTracker,
    last_applied_list: Option<Ticket>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn UserApi>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            api,
            tx,
            rx,
            tracker: OpTracker::default(),
            last_applied_list: None,
        }
    }

    pub fn endpoint(&self) -> String {
        self.api.endpoint()
    }

    pub fn submit(&mut self, request: OpRequest) -> Ticket {
        let ticket = self.tracker.begin(request.operation());
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let job = request.clone();
        let spawned = thread::Builder::new()
            .name(format!("op-{}", ticket.0))
            .spawn(move || {
                let result = execute(api.as_ref(), &job);
                // The receiver only goes away on shutdown.
                let _ = tx.send(Completion {
                    ticket,
                    request: job,
                    result,
                });
            });
        if let Err(e) = spawned {
            warn!(%ticket, error = %e, "failed to start worker");
            let _ = self.tx.send(Completion {
                ticket,
                result: Err(OperationFailed::new(
                    request.operation(),
                    FailureReason::Transport(format!("could not start worker: {e}")),
                )),
                request,
            });
        }
        ticket
    }

    /// Next finished operation, if any, without blocking.
    pub fn try_next(&mut self) -> Option<(Completion, OpPhase)> {
        let c = self.rx.try_recv().ok()?;
        Some(self.settle(c))
    }

    /// Block up to `timeout` for the next finished operation.
    pub fn wait_next(&mut self, timeout: Duration) -> Option<(Completion, OpPhase)> {
        let c = self.rx.recv_timeout(timeout).ok()?;
        Some(self.settle(c))
    }

    fn settle(&mut self, c: Completion) -> (Completion, OpPhase) {
        let phase = self.tracker.finish(c.ticket, c.result.is_ok());
        (c, phase)
    }

    /// Whether a list result from `ticket` may replace the displayed list.
    ///
    /// Only results newer than the last applied one are accepted, so a slow
    /// older reload cannot overwrite a newer one.
    pub fn accept_list(&mut self, ticket: Ticket) -> bool {
        match self.last_applied_list {
            Some(last) if ticket <= last => false,
            _ => {
                self.last_applied_list = Some(ticket);
                true
            }
        }
    }

    pub fn phase(&self, ticket: Ticket) -> OpPhase {
        self.tracker.phase(ticket)
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight()
    }
}

fn execute(api: &dyn UserApi, request: &OpRequest) -> std::result::Result<OpOutput, OperationFailed> {
    let out = match request {
        OpRequest::LoadUsers => api.list_users().map(OpOutput::Users),
        OpRequest::LoadUser(id) => api.get_user(*id).map(OpOutput::User),
        OpRequest::Create(draft) => api.create_user(draft).map(|_| OpOutput::Done),
        OpRequest::Update(id, draft) => api.update_user(*id, draft).map(|_| OpOutput::Done),
        OpRequest::Delete(id) => api.delete_user(*id).map(|_| OpOutput::Done),
    };
    out.map_err(|reason| OperationFailed::new(request.operation(), reason))
}
