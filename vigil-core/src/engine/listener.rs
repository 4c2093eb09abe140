//! The auto-response path.
//!
//! Event handling is fire-and-forget toward the producer: failures during
//! matching or execution are logged and swallowed, never returned. The
//! channel variant gives the detection layer an explicit queue with
//! backpressure instead of a direct callback.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{EventContext, Playbook, SecurityEvent};

use super::executor::ExecutionOutcome;
use super::SoarEngine;

impl SoarEngine {
    /// React to one classified event: select the first matching playbook in
    /// registration order and run it through the normal gated path.
    pub async fn handle_event(&self, event: SecurityEvent) {
        if !self.config.auto_response.enabled {
            debug!(event_id = %event.id, "auto-response disabled, ignoring event");
            return;
        }

        let Some(playbook) = self.select_playbook(&event) else {
            debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                "no playbook matches event"
            );
            return;
        };

        let context = EventContext::from(&event);
        match self.execute_playbook(&playbook.id, context).await {
            Ok(ExecutionOutcome::Executed { workflow }) => {
                info!(
                    event_id = %event.id,
                    playbook_id = %playbook.id,
                    workflow_id = %workflow.id,
                    status = %workflow.status,
                    "auto-response executed"
                );
            }
            Ok(ExecutionOutcome::ApprovalRequired { approval_id }) => {
                info!(
                    event_id = %event.id,
                    playbook_id = %playbook.id,
                    approval_id = %approval_id,
                    "auto-response awaiting approval"
                );
            }
            Err(e) => {
                warn!(
                    event_id = %event.id,
                    playbook_id = %playbook.id,
                    error = %e,
                    "auto-response failed"
                );
            }
        }
    }

    /// First registered playbook whose triggers and severity set match.
    /// Other equally-matching playbooks are ignored.
    fn select_playbook(&self, event: &SecurityEvent) -> Option<Playbook> {
        let order = self.playbook_order.read().unwrap_or_else(|e| e.into_inner());
        order.iter().find_map(|id| {
            self.playbooks
                .get(id)
                .filter(|p| p.matches(&event.event_type, event.severity))
                .map(|p| p.clone())
        })
    }

    /// A bounded queue of classified events feeding the auto-response path.
    ///
    /// Dropping the sender stops the consumer task.
    pub fn event_channel(
        &self,
        buffer: usize,
    ) -> (mpsc::Sender<SecurityEvent>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(buffer);
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                engine.handle_event(event).await;
            }
            debug!("event channel closed, listener stopped");
        });
        (tx, handle)
    }
}
