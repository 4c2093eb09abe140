use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::EventContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "PENDING"),
            ApprovalStatus::Approved => write!(f, "APPROVED"),
            ApprovalStatus::Denied => write!(f, "DENIED"),
        }
    }
}

/// A pending human sign-off for a gated playbook run.
///
/// Expiry is enforced lazily at decision time; an expired-but-undecided
/// approval stays visible in listings until someone acts on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    pub id: Uuid,
    pub playbook_id: String,
    pub context: EventContext,
    pub status: ApprovalStatus,
    pub requested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub decided_by: Option<String>,
    #[serde(default)]
    pub deny_reason: Option<String>,
}

impl Approval {
    pub fn new(playbook_id: impl Into<String>, context: EventContext, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            playbook_id: playbook_id.into(),
            context,
            status: ApprovalStatus::Pending,
            requested_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
            decided_at: None,
            decided_by: None,
            deny_reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn approve(&mut self, approver: impl Into<String>) {
        self.status = ApprovalStatus::Approved;
        self.decided_at = Some(Utc::now());
        self.decided_by = Some(approver.into());
    }

    pub fn deny(&mut self, approver: impl Into<String>, reason: impl Into<String>) {
        self.status = ApprovalStatus::Denied;
        self.decided_at = Some(Utc::now());
        self.decided_by = Some(approver.into());
        self.deny_reason = Some(reason.into());
    }
}
