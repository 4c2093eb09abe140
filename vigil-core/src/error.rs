//! Error types for the Vigil core library.
//!
//! One unified error enum covers every caller-facing failure of the engine.
//! Handler-level failures are a different animal: they are captured into a
//! failed [`crate::models::ActionResult`] at the dispatcher boundary and never
//! surface here.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Validation | Bad playbook registration input |
//! | E2001-E2099 | Not found | Unknown playbook/workflow/approval id |
//! | E3001-E3099 | State | Illegal state transitions and stale references |
//! | E4001-E4099 | Expiry | Approval past its deadline |
//! | E5001-E5099 | Feature | Operation on a disabled feature |
//! | E9001-E9099 | General | Internal errors |

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ApprovalStatus, WorkflowStatus};

/// The main error type for Vigil engine operations.
#[derive(Debug, Error)]
pub enum VigilError {
    /// Playbook registration rejected (missing id, name, or actions).
    #[error("[E1001] Validation error: {0}")]
    Validation(String),

    /// No playbook registered under the given id.
    #[error("[E2001] Playbook not found: {0}")]
    PlaybookNotFound(String),

    /// No workflow recorded under the given id.
    #[error("[E2002] Workflow not found: {0}")]
    WorkflowNotFound(Uuid),

    /// No approval request under the given id.
    #[error("[E2003] Approval not found: {0}")]
    ApprovalNotFound(Uuid),

    /// Attempt to decide an approval that is no longer pending.
    #[error("[E3001] Approval {id} is {status}, not pending")]
    InvalidApprovalState { id: Uuid, status: ApprovalStatus },

    /// Attempt to roll back a workflow that is not in a terminal state.
    #[error("[E3002] Workflow {id} is {status}, cannot roll back")]
    InvalidWorkflowState { id: Uuid, status: WorkflowStatus },

    /// An approval references a playbook that has since been unregistered.
    #[error("[E3003] Approval {approval_id} references unregistered playbook '{playbook_id}'")]
    PlaybookUnregistered {
        approval_id: Uuid,
        playbook_id: String,
    },

    /// Approval decided after its deadline (enforced lazily, at decision time).
    #[error("[E4001] Approval {id} expired at {expired_at}")]
    ApprovalExpired {
        id: Uuid,
        expired_at: DateTime<Utc>,
    },

    /// Rollback requested while the feature is disabled.
    #[error("[E5001] Rollback is disabled")]
    RollbackDisabled,

    /// Internal error (catch-all for unexpected conditions).
    #[error("[E9001] Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Vigil operations.
pub type VigilResult<T> = Result<T, VigilError>;

impl VigilError {
    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            VigilError::Validation(_) => "E1001",
            VigilError::PlaybookNotFound(_) => "E2001",
            VigilError::WorkflowNotFound(_) => "E2002",
            VigilError::ApprovalNotFound(_) => "E2003",
            VigilError::InvalidApprovalState { .. } => "E3001",
            VigilError::InvalidWorkflowState { .. } => "E3002",
            VigilError::PlaybookUnregistered { .. } => "E3003",
            VigilError::ApprovalExpired { .. } => "E4001",
            VigilError::RollbackDisabled => "E5001",
            VigilError::Internal(_) => "E9001",
        }
    }

    /// Returns true if this error means the referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VigilError::PlaybookNotFound(_)
                | VigilError::WorkflowNotFound(_)
                | VigilError::ApprovalNotFound(_)
        )
    }

    /// Returns true if this error is an illegal-state rejection.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            VigilError::InvalidApprovalState { .. }
                | VigilError::InvalidWorkflowState { .. }
                | VigilError::PlaybookUnregistered { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_code() {
        let err = VigilError::Validation("playbook id is required".to_string());
        assert!(err.to_string().contains("E1001"));
        assert!(err.to_string().contains("playbook id is required"));

        let err = VigilError::PlaybookNotFound("pb-missing".to_string());
        assert!(err.to_string().contains("E2001"));
        assert!(err.to_string().contains("pb-missing"));
    }

    #[test]
    fn test_error_codes() {
        let id = Uuid::new_v4();
        assert_eq!(VigilError::WorkflowNotFound(id).error_code(), "E2002");
        assert_eq!(VigilError::ApprovalNotFound(id).error_code(), "E2003");
        assert_eq!(
            VigilError::ApprovalExpired {
                id,
                expired_at: Utc::now(),
            }
            .error_code(),
            "E4001"
        );
        assert_eq!(VigilError::RollbackDisabled.error_code(), "E5001");
    }

    #[test]
    fn test_error_categorization() {
        let id = Uuid::new_v4();
        assert!(VigilError::ApprovalNotFound(id).is_not_found());
        assert!(!VigilError::ApprovalNotFound(id).is_state_error());

        let state = VigilError::InvalidApprovalState {
            id,
            status: ApprovalStatus::Denied,
        };
        assert!(state.is_state_error());
        assert!(!state.is_not_found());

        assert!(!VigilError::RollbackDisabled.is_not_found());
        assert!(!VigilError::RollbackDisabled.is_state_error());
    }
}
