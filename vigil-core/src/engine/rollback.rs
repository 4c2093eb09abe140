//! Best-effort rollback of a terminal workflow.
//!
//! Recorded actions are walked in reverse; only entries whose result
//! succeeded are considered, and only kinds with a defined reverse are
//! touched (partial-rollback policy). Concurrent rollback of the same
//! workflow is not guarded here; callers serialize.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{VigilError, VigilResult};
use crate::models::{ActionKind, Workflow};

use super::SoarEngine;

impl SoarEngine {
    pub async fn rollback(&self, workflow_id: Uuid) -> VigilResult<Workflow> {
        if !self.config.rollback.enabled {
            return Err(VigilError::RollbackDisabled);
        }

        let workflow = self
            .get_workflow(workflow_id)
            .ok_or(VigilError::WorkflowNotFound(workflow_id))?;
        if !workflow.status.is_terminal() {
            return Err(VigilError::InvalidWorkflowState {
                id: workflow_id,
                status: workflow.status,
            });
        }

        let mut reversed = 0usize;
        for executed in workflow.actions.iter().rev() {
            if !executed.result.success {
                continue;
            }
            match &executed.spec.kind {
                ActionKind::BlockIp { .. } => match workflow.context.ip.as_deref() {
                    Some(ip) => {
                        match self.connectors.blacklist.remove_from_blacklist(ip).await {
                            Ok(()) => {
                                reversed += 1;
                                info!(workflow_id = %workflow_id, ip, "block reversed");
                            }
                            // Best-effort: keep walking the remaining entries.
                            Err(e) => {
                                warn!(workflow_id = %workflow_id, ip, error = %e, "unblock failed")
                            }
                        }
                    }
                    None => {
                        warn!(workflow_id = %workflow_id, "no ip in context, cannot reverse block")
                    }
                },
                other => {
                    debug!(action = other.label(), "no reverse handler, skipping");
                }
            }
        }

        let updated = {
            let mut entry = self
                .workflows
                .get_mut(&workflow_id)
                .ok_or(VigilError::WorkflowNotFound(workflow_id))?;
            entry.mark_rolled_back();
            entry.clone()
        };
        self.metrics.record_rollback();

        info!(
            workflow_id = %workflow_id,
            reversed,
            total = workflow.actions.len(),
            "workflow rolled back"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::EngineConfig;
    use crate::connectors::{Connectors, MemoryBlacklist};
    use crate::models::{
        ActionSpec, EventContext, Playbook, WorkflowStatus,
    };

    fn engine_with_blacklist(rollback_enabled: bool) -> (SoarEngine, Arc<MemoryBlacklist>) {
        let blacklist = Arc::new(MemoryBlacklist::new());
        let engine = SoarEngine::new(
            EngineConfig::default()
                .with_rollback(rollback_enabled)
                .with_escalation_severities(vec![]),
            Connectors::default().with_blacklist(blacklist.clone()),
        );
        (engine, blacklist)
    }

    fn containment_playbook() -> Playbook {
        Playbook::new("pb-rb", "Containment")
            .with_trigger("X")
            .with_action(ActionSpec::new(ActionKind::BlockIp { duration_secs: 60 }))
            .with_action(ActionSpec::new(ActionKind::CollectEvidence { source: None }))
    }

    #[tokio::test]
    async fn test_rollback_reverses_only_blocklist_entries() {
        let (engine, blacklist) = engine_with_blacklist(true);
        engine.register_playbook(containment_playbook()).unwrap();

        let context = EventContext::default().with_ip("203.0.113.30");
        let outcome = engine.execute_playbook("pb-rb", context).await.unwrap();
        let workflow_id = outcome.workflow().unwrap().id;
        assert!(blacklist.contains("203.0.113.30"));

        let rolled = engine.rollback(workflow_id).await.unwrap();
        assert_eq!(rolled.status, WorkflowStatus::RolledBack);
        assert!(rolled.rolled_back_at.is_some());
        assert!(!blacklist.contains("203.0.113.30"));
        assert_eq!(engine.metrics().rollbacks, 1);
    }

    #[tokio::test]
    async fn test_rollback_skips_failed_entries() {
        let (engine, blacklist) = engine_with_blacklist(true);
        engine.register_playbook(containment_playbook()).unwrap();

        // No ip: block_ip fails, collect_evidence succeeds.
        let outcome = engine
            .execute_playbook("pb-rb", EventContext::default())
            .await
            .unwrap();
        let workflow = outcome.workflow().unwrap();
        assert!(!workflow.results[0].success);

        let rolled = engine.rollback(workflow.id).await.unwrap();
        assert_eq!(rolled.status, WorkflowStatus::RolledBack);
        assert!(blacklist.is_empty());
    }

    #[tokio::test]
    async fn test_rollback_disabled() {
        let (engine, _) = engine_with_blacklist(false);
        let err = engine.rollback(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.error_code(), "E5001");
    }

    #[tokio::test]
    async fn test_rollback_unknown_workflow() {
        let (engine, _) = engine_with_blacklist(true);
        let err = engine.rollback(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_double_rollback_is_state_error() {
        let (engine, _) = engine_with_blacklist(true);
        engine.register_playbook(containment_playbook()).unwrap();

        let context = EventContext::default().with_ip("203.0.113.31");
        let outcome = engine.execute_playbook("pb-rb", context).await.unwrap();
        let workflow_id = outcome.workflow().unwrap().id;

        engine.rollback(workflow_id).await.unwrap();
        let err = engine.rollback(workflow_id).await.unwrap_err();
        assert!(err.is_state_error());
    }
}
