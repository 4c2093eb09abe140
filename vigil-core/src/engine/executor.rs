//! Workflow execution.
//!
//! Actions run strictly in declared order, one dispatcher call at a time;
//! later actions may depend on side effects of earlier ones (an incident has
//! to exist before an alert references it), so there is no reordering and no
//! parallel dispatch.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{VigilError, VigilResult};
use crate::models::{EventContext, Playbook, Workflow, WorkflowStatus};

use super::SoarEngine;

/// What came out of an execution request: either a finished workflow or a
/// pending approval gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionOutcome {
    Executed { workflow: Workflow },
    ApprovalRequired { approval_id: Uuid },
}

impl ExecutionOutcome {
    pub fn workflow(&self) -> Option<&Workflow> {
        match self {
            ExecutionOutcome::Executed { workflow } => Some(workflow),
            ExecutionOutcome::ApprovalRequired { .. } => None,
        }
    }

    pub fn approval_id(&self) -> Option<Uuid> {
        match self {
            ExecutionOutcome::Executed { .. } => None,
            ExecutionOutcome::ApprovalRequired { approval_id } => Some(*approval_id),
        }
    }
}

impl SoarEngine {
    /// Execute a registered playbook against an event context, subject to the
    /// approval gate.
    pub async fn execute_playbook(
        &self,
        playbook_id: &str,
        context: EventContext,
    ) -> VigilResult<ExecutionOutcome> {
        let playbook = self
            .get_playbook(playbook_id)
            .ok_or_else(|| VigilError::PlaybookNotFound(playbook_id.to_string()))?;

        if self.gate_requires_approval(&playbook, &context) {
            let approval = self.request_approval(&playbook, context).await;
            return Ok(ExecutionOutcome::ApprovalRequired {
                approval_id: approval.id,
            });
        }

        let workflow = self.run_workflow(&playbook, context).await?;
        Ok(ExecutionOutcome::Executed { workflow })
    }

    /// Drive a playbook's actions to completion, recording a workflow.
    ///
    /// Only ever called past the approval gate.
    pub(crate) async fn run_workflow(
        &self,
        playbook: &Playbook,
        context: EventContext,
    ) -> VigilResult<Workflow> {
        let n = self.metrics.begin_workflow();
        if let Some(mut entry) = self.playbooks.get_mut(&playbook.id) {
            entry.execution_count += 1;
        }

        let mut workflow = Workflow::new(&playbook.id, context);
        let workflow_id = workflow.id;
        self.workflows.insert(workflow_id, workflow.clone());

        info!(
            workflow_id = %workflow_id,
            playbook_id = %playbook.id,
            actions = playbook.actions.len(),
            "workflow started"
        );

        for spec in &playbook.actions {
            match self.dispatcher.execute(&spec.kind, &workflow.context).await {
                Ok(result) => {
                    let failed = !result.success;
                    if failed {
                        warn!(
                            workflow_id = %workflow_id,
                            action = result.action.as_str(),
                            critical = spec.critical,
                            message = result.message.as_str(),
                            "action failed"
                        );
                    }
                    workflow.record(spec.clone(), result);
                    if failed && spec.critical {
                        workflow.fail();
                        break;
                    }
                }
                Err(e) => {
                    error!(
                        workflow_id = %workflow_id,
                        action = spec.kind.label(),
                        error = %e,
                        "dispatcher error, aborting workflow"
                    );
                    workflow.mark_error(e.to_string());
                    self.workflows.insert(workflow_id, workflow.clone());
                    self.metrics.fold_success_rate(n, workflow.success_ratio());
                    return Err(e);
                }
            }
        }

        if workflow.status == WorkflowStatus::Running {
            workflow.complete();
        }

        self.metrics.fold_success_rate(n, workflow.success_ratio());
        self.workflows.insert(workflow_id, workflow.clone());

        info!(
            workflow_id = %workflow_id,
            status = %workflow.status,
            results = workflow.results.len(),
            "workflow finished"
        );
        Ok(workflow)
    }
}
