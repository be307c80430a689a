//! What-if simulation session: input state plus the request lifecycle.
//!
//! The session does no I/O. `submit` hands out a [`Ticket`] carrying a
//! monotonically increasing sequence number and the frozen request payload;
//! the caller performs the call and reports back through `complete`. Only the
//! response to the most recently issued ticket is ever applied, regardless of
//! the order in which responses arrive.
//!
//! ```text
//! Idle ──submit──▶ Pending ──ok──▶ Success ──edit/submit──▶ …
//!                     └────err──▶ Failed  ──edit/submit──▶ …
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::contract::{decode_response, SimulationInput, SimulationRequest, SimulationResult};
use crate::error::{ContractError, TransportError, ValidationError};
use crate::record::Scoring;

pub type RequestSeq = u64;

/// What to do with a submission while another request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPolicy {
    /// Refuse with [`SessionError::Busy`].
    #[default]
    Reject,
    /// Issue the new request; the older one's response will be discarded.
    Supersede,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Pending { seq: RequestSeq },
    Success,
    Failed(ContractError),
}

/// An issued request. The payload is a snapshot: later edits do not touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub seq: RequestSeq,
    pub request: SimulationRequest,
}

/// What `complete` did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// Not the latest request, or already completed. Ignored.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("simulation request #{0} is still in flight")]
    Busy(RequestSeq),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
pub struct SimulationSession {
    input: SimulationInput,
    policy: SubmitPolicy,
    state: SessionState,
    result: Option<SimulationResult>,
    stale: bool,
    issued: RequestSeq,
}

impl Default for SimulationSession {
    fn default() -> Self {
        Self::new(SubmitPolicy::default())
    }
}

impl SimulationSession {
    pub fn new(policy: SubmitPolicy) -> Self {
        Self::with_input(SimulationInput::default(), policy)
    }

    pub fn with_input(input: SimulationInput, policy: SubmitPolicy) -> Self {
        Self {
            input,
            policy,
            state: SessionState::Idle,
            result: None,
            stale: false,
            issued: 0,
        }
    }

    pub fn input(&self) -> &SimulationInput {
        &self.input
    }

    pub fn policy(&self) -> SubmitPolicy {
        self.policy
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// True while a request is in flight; the UI disables re-submission.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, SessionState::Pending { .. })
    }

    /// Latest applied result, possibly stale.
    pub fn result(&self) -> Option<&SimulationResult> {
        self.result.as_ref()
    }

    /// Set when the last request failed after an earlier one succeeded.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn error(&self) -> Option<&ContractError> {
        match &self.state {
            SessionState::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Scored fields for display; `Unscored` until the first result.
    pub fn scoring(&self) -> Scoring {
        self.result.map(|r| r.scoring()).unwrap_or_default()
    }

    /// Change the input. Leaves a finished state for `Idle`; an in-flight
    /// request keeps its own payload.
    pub fn edit(&mut self, f: impl FnOnce(&mut SimulationInput)) {
        f(&mut self.input);
        if matches!(self.state, SessionState::Success | SessionState::Failed(_)) {
            self.state = SessionState::Idle;
        }
    }

    /// Validate the current input and issue a request for it.
    pub fn submit(&mut self) -> Result<Ticket, SessionError> {
        if let SessionState::Pending { seq } = self.state {
            if self.policy == SubmitPolicy::Reject {
                debug!(seq, "submission rejected, request in flight");
                return Err(SessionError::Busy(seq));
            }
            debug!(seq, "superseding in-flight request");
        }

        let request = self.input.validate()?;
        self.issued += 1;
        let seq = self.issued;
        self.state = SessionState::Pending { seq };
        Ok(Ticket { seq, request })
    }

    /// Apply the outcome of ticket `seq`.
    pub fn complete(
        &mut self,
        seq: RequestSeq,
        outcome: Result<SimulationResult, ContractError>,
    ) -> Completion {
        match self.state {
            SessionState::Pending { seq: current } if current == seq => {}
            _ => {
                debug!(seq, latest = self.issued, "discarding response for superseded request");
                return Completion::Discarded;
            }
        }

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.stale = false;
                self.state = SessionState::Success;
                Completion::Applied
            }
            Err(e) => {
                warn!(seq, error = %e, "simulation request failed");
                self.stale = self.result.is_some();
                self.state = SessionState::Failed(e);
                Completion::Failed
            }
        }
    }

    /// Decode a raw response body (or transport failure) and apply it.
    pub fn complete_body(
        &mut self,
        seq: RequestSeq,
        body: Result<&str, TransportError>,
    ) -> Completion {
        let outcome = body
            .map_err(ContractError::from)
            .and_then(|b| decode_response(b).map_err(ContractError::from));
        self.complete(seq, outcome)
    }
}
