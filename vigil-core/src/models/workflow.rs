use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ActionSpec, EventContext};

/// Lifecycle of a workflow.
///
/// Legal transitions: `Running` to one of `Completed`/`Failed`/`Error`, and a
/// terminal workflow may later move to `RolledBack`. Nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Error,
    RolledBack,
}

impl WorkflowStatus {
    /// Terminal states eligible for rollback.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Error
        )
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStatus::Running => write!(f, "RUNNING"),
            WorkflowStatus::Completed => write!(f, "COMPLETED"),
            WorkflowStatus::Failed => write!(f, "FAILED"),
            WorkflowStatus::Error => write!(f, "ERROR"),
            WorkflowStatus::RolledBack => write!(f, "ROLLED_BACK"),
        }
    }
}

/// Normalized outcome of one dispatched action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Label of the action kind that produced this result.
    pub action: String,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub duration_ms: u64,
}

impl ActionResult {
    pub fn ok(action: &str, message: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            success: true,
            message: message.into(),
            data: None,
            duration_ms: 0,
        }
    }

    pub fn failed(action: &str, message: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            success: false,
            message: message.into(),
            data: None,
            duration_ms: 0,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// One executed step of a workflow: the spec that ran, what came back, when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedAction {
    pub spec: ActionSpec,
    pub result: ActionResult,
    pub executed_at: DateTime<Utc>,
}

/// One concrete execution of a playbook against an event context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub playbook_id: String,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub context: EventContext,
    pub actions: Vec<ExecutedAction>,
    pub results: Vec<ActionResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub rolled_back_at: Option<DateTime<Utc>>,
}

impl Workflow {
    pub fn new(playbook_id: impl Into<String>, context: EventContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            playbook_id: playbook_id.into(),
            status: WorkflowStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            context,
            actions: Vec::new(),
            results: Vec::new(),
            error: None,
            rolled_back_at: None,
        }
    }

    /// Append one executed step and its result, preserving declared order.
    pub fn record(&mut self, spec: ActionSpec, result: ActionResult) {
        self.results.push(result.clone());
        self.actions.push(ExecutedAction {
            spec,
            result,
            executed_at: Utc::now(),
        });
    }

    pub fn complete(&mut self) {
        self.status = WorkflowStatus::Completed;
        self.ended_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = WorkflowStatus::Failed;
        self.ended_at = Some(Utc::now());
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = WorkflowStatus::Error;
        self.error = Some(message.into());
        self.ended_at = Some(Utc::now());
    }

    pub fn mark_rolled_back(&mut self) {
        self.status = WorkflowStatus::RolledBack;
        self.rolled_back_at = Some(Utc::now());
    }

    /// Share of successful results, as a percentage in [0, 100].
    pub fn success_ratio(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let successful = self.results.iter().filter(|r| r.success).count();
        successful as f64 / self.results.len() as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionKind;

    #[test]
    fn test_status_display() {
        assert_eq!(WorkflowStatus::Running.to_string(), "RUNNING");
        assert_eq!(WorkflowStatus::RolledBack.to_string(), "ROLLED_BACK");
    }

    #[test]
    fn test_terminal_states() {
        assert!(WorkflowStatus::Completed.is_terminal());
        assert!(WorkflowStatus::Failed.is_terminal());
        assert!(WorkflowStatus::Error.is_terminal());
        assert!(!WorkflowStatus::Running.is_terminal());
        assert!(!WorkflowStatus::RolledBack.is_terminal());
    }

    #[test]
    fn test_record_keeps_actions_and_results_aligned() {
        let mut workflow = Workflow::new("pb-1", EventContext::default());
        workflow.record(
            ActionSpec::new(ActionKind::CheckIpReputation),
            ActionResult::ok("check_ip_reputation", "clean"),
        );
        workflow.record(
            ActionSpec::new(ActionKind::Alert { channel: None }),
            ActionResult::failed("alert", "channel unreachable"),
        );

        assert_eq!(workflow.actions.len(), 2);
        assert_eq!(workflow.results.len(), 2);
        assert_eq!(workflow.actions[1].result.action, "alert");
    }

    #[test]
    fn test_success_ratio() {
        let mut workflow = Workflow::new("pb-1", EventContext::default());
        assert_eq!(workflow.success_ratio(), 0.0);

        workflow.record(
            ActionSpec::new(ActionKind::CheckIpReputation),
            ActionResult::ok("check_ip_reputation", "ok"),
        );
        workflow.record(
            ActionSpec::new(ActionKind::Alert { channel: None }),
            ActionResult::failed("alert", "boom"),
        );
        assert_eq!(workflow.success_ratio(), 50.0);
    }

    #[test]
    fn test_lifecycle_stamps() {
        let mut workflow = Workflow::new("pb-1", EventContext::default());
        assert!(workflow.ended_at.is_none());

        workflow.complete();
        assert_eq!(workflow.status, WorkflowStatus::Completed);
        assert!(workflow.ended_at.is_some());

        workflow.mark_rolled_back();
        assert_eq!(workflow.status, WorkflowStatus::RolledBack);
        assert!(workflow.rolled_back_at.is_some());
    }
}
