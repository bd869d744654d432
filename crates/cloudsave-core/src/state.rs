use std::fmt;

/// Per-backend operation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
    Storing,
    Restoring,
    CleaningUp,
    /// Releasing the backend; ends in `Uninitialized`.
    Disposing,
}

impl OperationState {
    /// An operation is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            OperationState::Initializing
                | OperationState::Storing
                | OperationState::Restoring
                | OperationState::CleaningUp
                | OperationState::Disposing
        )
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Uninitialized => write!(f, "uninitialized"),
            OperationState::Initializing => write!(f, "initializing"),
            OperationState::Ready => write!(f, "ready"),
            OperationState::Failed => write!(f, "failed"),
            OperationState::Storing => write!(f, "storing"),
            OperationState::Restoring => write!(f, "restoring"),
            OperationState::CleaningUp => write!(f, "cleaning_up"),
            OperationState::Disposing => write!(f, "disposing"),
        }
    }
}

/// Snapshot published on every phase transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStatus {
    pub state: OperationState,
    pub status: String,
    pub detail: Option<String>,
}

impl BackendStatus {
    pub fn new(state: OperationState, status: impl Into<String>) -> Self {
        Self {
            state,
            status: status.into(),
            detail: None,
        }
    }
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self::new(OperationState::Uninitialized, "Not initialized")
    }
}

/// Result of one orchestrator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The call was not allowed in the current state or role and did nothing.
    Skipped,
    Completed,
    /// Restore found no archives.
    NothingToRestore,
    Failed(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Completed => write!(f, "completed"),
            Outcome::NothingToRestore => write!(f, "no save data"),
            Outcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
