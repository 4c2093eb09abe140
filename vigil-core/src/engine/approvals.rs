//! The approval gate.
//!
//! Gating never blocks: when a run needs sign-off the engine records a
//! pending approval, notifies, and returns immediately. Expiry is checked
//! lazily when someone tries to approve; `deny` deliberately skips the expiry
//! check (source behavior, kept as-is).

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{VigilError, VigilResult};
use crate::models::{Approval, ApprovalStatus, EventContext, Playbook, Workflow};

use super::SoarEngine;

impl SoarEngine {
    /// A run is gated when the playbook asks for approval or the context
    /// severity is in the configured escalation list.
    pub(crate) fn gate_requires_approval(
        &self,
        playbook: &Playbook,
        context: &EventContext,
    ) -> bool {
        if playbook.requires_approval {
            return true;
        }
        match context.severity {
            Some(severity) => self
                .config
                .approvals
                .escalation_severities
                .contains(&severity),
            None => false,
        }
    }

    pub(crate) async fn request_approval(
        &self,
        playbook: &Playbook,
        context: EventContext,
    ) -> Approval {
        let approval = Approval::new(&playbook.id, context, self.config.approvals.ttl_secs);
        self.approvals.insert(approval.id, approval.clone());

        info!(
            approval_id = %approval.id,
            playbook_id = %playbook.id,
            expires_at = %approval.expires_at,
            "approval requested"
        );

        // Notification is best-effort; a dead channel must not lose the
        // approval record.
        if let Err(e) = self.connectors.notifier.approval_required(&approval).await {
            warn!(approval_id = %approval.id, error = %e, "approval notification failed");
        }
        approval
    }

    /// Approve a pending request and synchronously run the gated playbook
    /// with its stored context.
    pub async fn approve(&self, id: Uuid, approver: &str) -> VigilResult<Workflow> {
        let (playbook_id, context) = {
            let mut entry = self
                .approvals
                .get_mut(&id)
                .ok_or(VigilError::ApprovalNotFound(id))?;
            if !entry.is_pending() {
                return Err(VigilError::InvalidApprovalState {
                    id,
                    status: entry.status,
                });
            }
            if entry.is_expired(Utc::now()) {
                return Err(VigilError::ApprovalExpired {
                    id,
                    expired_at: entry.expires_at,
                });
            }
            entry.approve(approver);
            (entry.playbook_id.clone(), entry.context.clone())
        };

        info!(approval_id = %id, approver, playbook_id = %playbook_id, "approval granted");
        self.metrics.record_manual_response();

        let playbook =
            self.get_playbook(&playbook_id)
                .ok_or_else(|| VigilError::PlaybookUnregistered {
                    approval_id: id,
                    playbook_id: playbook_id.clone(),
                })?;
        self.run_workflow(&playbook, context).await
    }

    /// Deny a pending request. No expiry check, and never any execution.
    pub async fn deny(&self, id: Uuid, approver: &str, reason: &str) -> VigilResult<Approval> {
        let mut entry = self
            .approvals
            .get_mut(&id)
            .ok_or(VigilError::ApprovalNotFound(id))?;
        if !entry.is_pending() {
            return Err(VigilError::InvalidApprovalState {
                id,
                status: entry.status,
            });
        }
        entry.deny(approver, reason);

        info!(approval_id = %id, approver, reason, "approval denied");
        Ok(entry.clone())
    }

    /// Pending requests, expired-but-undecided ones included (there is no
    /// background sweeper).
    pub fn pending_approvals(&self) -> Vec<Approval> {
        self.approvals
            .iter()
            .filter(|a| a.status == ApprovalStatus::Pending)
            .map(|a| a.clone())
            .collect()
    }
}
