// src/request.rs
//! One in-flight upstream request per user action, as an explicit state machine.
//!
//! Transitions happen only on user action (`begin`, `cancel`, `reset`) or on
//! response arrival (`settle*`). Every `begin` issues a fresh ticket, so a late
//! response for an older request can never overwrite a newer state.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ContractError, RequestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Why a request failed, coarse enough to show to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Response arrived but did not match the declared shape.
    ContractViolation,
    /// Transport/provider failure before a usable response existed.
    Upstream,
    Cancelled,
}

impl ErrorKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::ContractViolation => {
                "The model returned an unexpected response. Please try again."
            }
            ErrorKind::Upstream => "Failed to generate content. Please try again.",
            ErrorKind::Cancelled => "Request cancelled.",
        }
    }
}

impl From<&ContractError> for ErrorKind {
    fn from(_: &ContractError) -> Self {
        ErrorKind::ContractViolation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Pending { ticket: Ticket },
    Success(T),
    Failed(ErrorKind),
}

#[derive(Debug)]
pub struct RequestTracker<T> {
    state: RequestState<T>,
    issued: u64,
}

impl<T> Default for RequestTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestTracker<T> {
    pub fn new() -> Self {
        Self {
            state: RequestState::Idle,
            issued: 0,
        }
    }

    pub fn state(&self) -> &RequestState<T> {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RequestState::Pending { .. })
    }

    pub fn result(&self) -> Option<&T> {
        match &self.state {
            RequestState::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match self.state {
            RequestState::Failed(k) => Some(k),
            _ => None,
        }
    }

    /// User triggers a request. Clears any previous result or error.
    pub fn begin(&mut self) -> Result<Ticket, RequestError> {
        if self.is_pending() {
            return Err(RequestError::AlreadyPending);
        }
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.state = RequestState::Pending { ticket };
        debug!(ticket = ticket.0, "request pending");
        Ok(ticket)
    }

    /// Response arrived. Returns `false` (and changes nothing) for a stale ticket.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<T, ErrorKind>) -> bool {
        match self.state {
            RequestState::Pending { ticket: current } if current == ticket => {}
            _ => {
                warn!(ticket = ticket.0, "ignoring response for stale request");
                return false;
            }
        }
        self.state = match outcome {
            Ok(v) => {
                debug!(ticket = ticket.0, "request succeeded");
                RequestState::Success(v)
            }
            Err(kind) => {
                debug!(ticket = ticket.0, ?kind, "request failed");
                RequestState::Failed(kind)
            }
        };
        true
    }

    /// Settle from raw upstream text through a contract parser.
    pub fn settle_raw<F>(&mut self, ticket: Ticket, raw: &str, parse: F) -> bool
    where
        F: FnOnce(&str) -> Result<T, ContractError>,
    {
        let outcome = parse(raw).map_err(|e| {
            warn!(ticket = ticket.0, error = %e, "upstream response rejected");
            ErrorKind::from(&e)
        });
        self.settle(ticket, outcome)
    }

    /// Pending → Failed(Cancelled). No-op otherwise.
    pub fn cancel(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state = RequestState::Failed(ErrorKind::Cancelled);
        true
    }

    /// Back to Idle from any state (user dismissed the result or error).
    pub fn reset(&mut self) {
        self.state = RequestState::Idle;
    }
}
