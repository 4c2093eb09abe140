//! Playbook registry operations.

use tracing::info;

use crate::error::VigilResult;
use crate::models::{ActionKind, ActionSpec, Playbook};

use super::SoarEngine;

impl SoarEngine {
    /// Register a playbook, validating id, name, and a non-empty action list.
    ///
    /// Re-registering an existing id overwrites it (last-write-wins) while
    /// keeping the original registration-order slot, so auto-response
    /// selection order stays stable.
    pub fn register_playbook(&self, mut playbook: Playbook) -> VigilResult<()> {
        playbook.validate()?;
        playbook.execution_count = 0;

        let id = playbook.id.clone();
        let replaced = self.playbooks.insert(id.clone(), playbook).is_some();
        if !replaced {
            self.playbook_order
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .push(id.clone());
        }

        info!(playbook_id = %id, replaced, "playbook registered");
        Ok(())
    }

    pub fn get_playbook(&self, id: &str) -> Option<Playbook> {
        self.playbooks.get(id).map(|p| p.clone())
    }

    /// All registered playbooks, in registration order.
    pub fn list_playbooks(&self) -> Vec<Playbook> {
        let order = self.playbook_order.read().unwrap_or_else(|e| e.into_inner());
        order
            .iter()
            .filter_map(|id| self.playbooks.get(id).map(|p| p.clone()))
            .collect()
    }

    /// Seed the stock response playbooks registered at process start.
    pub fn with_builtin_playbooks(self) -> Self {
        for playbook in builtin_playbooks() {
            // Builtins are statically valid; a failure here is a bug.
            if let Err(e) = self.register_playbook(playbook) {
                tracing::error!(error = %e, "builtin playbook rejected");
            }
        }
        self
    }
}

fn builtin_playbooks() -> Vec<Playbook> {
    vec![
        Playbook::new("sql-injection-response", "SQL injection response")
            .with_description("Block the source and open an incident with evidence")
            .with_trigger("SQL_INJECTION")
            .with_action(ActionSpec::critical(ActionKind::BlockIp {
                duration_secs: 3600,
            }))
            .with_action(ActionSpec::new(ActionKind::CreateIncident {
                title: None,
                priority: Some("high".to_string()),
            }))
            .with_action(ActionSpec::new(ActionKind::CollectEvidence { source: None }))
            .with_action(ActionSpec::new(ActionKind::Alert {
                channel: Some("soc".to_string()),
            })),
        Playbook::new("brute-force-lockout", "Brute force lockout")
            .with_description("Check reputation, block the source, notify")
            .with_trigger("BRUTE_FORCE")
            .with_action(ActionSpec::new(ActionKind::CheckIpReputation))
            .with_action(ActionSpec::new(ActionKind::BlockIp {
                duration_secs: 1800,
            }))
            .with_action(ActionSpec::new(ActionKind::Alert {
                channel: Some("soc".to_string()),
            })),
        Playbook::new("data-exfiltration-containment", "Data exfiltration containment")
            .with_description("Contain, investigate, and escalate a suspected exfiltration")
            .with_trigger("DATA_EXFILTRATION")
            .requiring_approval()
            .with_action(ActionSpec::critical(ActionKind::BlockIp {
                duration_secs: 86_400,
            }))
            .with_action(ActionSpec::new(ActionKind::CreateIncident {
                title: None,
                priority: Some("critical".to_string()),
            }))
            .with_action(ActionSpec::new(ActionKind::StartInvestigation {
                investigator: None,
                priority: Some("critical".to_string()),
            }))
            .with_action(ActionSpec::new(ActionKind::CollectEvidence { source: None }))
            .with_action(ActionSpec::new(ActionKind::Alert {
                channel: Some("incident-response".to_string()),
            })),
    ]
}
