use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VigilError, VigilResult};
use crate::models::Severity;

/// The closed set of remediation actions the dispatcher knows how to run.
///
/// Action specs arriving from outside the process (playbook files, console
/// payloads) may carry tags this build has never heard of; those land on the
/// explicit `Unknown` variant and dispatch to a failed result instead of
/// breaking deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    BlockIp {
        #[serde(default = "default_block_duration")]
        duration_secs: u64,
    },
    CreateIncident {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        priority: Option<String>,
    },
    CollectEvidence {
        #[serde(default)]
        source: Option<String>,
    },
    CheckIpReputation,
    StartInvestigation {
        #[serde(default)]
        investigator: Option<String>,
        #[serde(default)]
        priority: Option<String>,
    },
    Alert {
        #[serde(default)]
        channel: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

fn default_block_duration() -> u64 {
    3600
}

impl ActionKind {
    /// Stable label used in results, history entries, and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::BlockIp { .. } => "block_ip",
            ActionKind::CreateIncident { .. } => "create_incident",
            ActionKind::CollectEvidence { .. } => "collect_evidence",
            ActionKind::CheckIpReputation => "check_ip_reputation",
            ActionKind::StartInvestigation { .. } => "start_investigation",
            ActionKind::Alert { .. } => "alert",
            ActionKind::Unknown => "unknown",
        }
    }
}

/// One step of a playbook: an action plus its failure policy.
///
/// A failed result on a `critical` step halts the surrounding workflow;
/// non-critical failures are recorded and the run continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(default)]
    pub critical: bool,
}

impl ActionSpec {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            critical: false,
        }
    }

    pub fn critical(kind: ActionKind) -> Self {
        Self {
            kind,
            critical: true,
        }
    }
}

/// A named, ordered remediation sequence bound to trigger event types.
///
/// Immutable after registration except for `execution_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playbook {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Event types that select this playbook on the auto-response path.
    pub triggers: Vec<String>,
    /// When present, the event severity must be in this set to match.
    #[serde(default)]
    pub severities: Option<Vec<Severity>>,
    pub actions: Vec<ActionSpec>,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub execution_count: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Playbook {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            triggers: Vec::new(),
            severities: None,
            actions: Vec::new(),
            requires_approval: false,
            execution_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_trigger(mut self, event_type: impl Into<String>) -> Self {
        self.triggers.push(event_type.into());
        self
    }

    pub fn with_severities(mut self, severities: Vec<Severity>) -> Self {
        self.severities = Some(severities);
        self
    }

    pub fn with_action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    pub fn requiring_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }

    /// Registration-time validation: id, name, and at least one action.
    pub fn validate(&self) -> VigilResult<()> {
        if self.id.trim().is_empty() {
            return Err(VigilError::Validation("playbook id is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(VigilError::Validation("playbook name is required".into()));
        }
        if self.actions.is_empty() {
            return Err(VigilError::Validation(format!(
                "playbook '{}' must declare at least one action",
                self.id
            )));
        }
        Ok(())
    }

    /// Whether this playbook matches an event on the auto-response path.
    pub fn matches(&self, event_type: &str, severity: Severity) -> bool {
        if !self.triggers.iter().any(|t| t == event_type) {
            return false;
        }
        match &self.severities {
            Some(set) => set.contains(&severity),
            None => true,
        }
    }
}
