use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Approval, EventContext, Severity};

/// Record returned by the incident tracker when a ticket is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub status: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Reputation data for a single address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpReputation {
    pub ip: String,
    pub malicious: bool,
    pub score: f64,
    pub sources: Vec<String>,
}

/// Firewall/blacklist enforcement point.
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    async fn add_to_blacklist(&self, ip: &str, reason: &str, duration_secs: u64) -> Result<()>;
    async fn remove_from_blacklist(&self, ip: &str) -> Result<()>;
}

/// Ticketing system the engine opens incidents in.
#[async_trait]
pub trait IncidentTracker: Send + Sync {
    async fn create_incident(
        &self,
        title: &str,
        severity: Severity,
        created_by: &str,
    ) -> Result<IncidentRecord>;
}

/// Evidence collection and investigation kickoff.
#[async_trait]
pub trait ForensicsService: Send + Sync {
    async fn collect_evidence(
        &self,
        source: &str,
        incident_id: Option<&str>,
    ) -> Result<HashMap<String, serde_json::Value>>;

    async fn start_investigation(
        &self,
        incident_id: &str,
        investigator: &str,
        priority: &str,
    ) -> Result<String>;
}

/// External reputation lookups.
#[async_trait]
pub trait ThreatIntelService: Send + Sync {
    async fn check_ip_reputation(&self, ip: &str) -> Result<IpReputation>;
}

/// Fire-and-forget operator notifications.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn alert(&self, context: &EventContext, channel: &str) -> Result<()>;
    async fn approval_required(&self, approval: &Approval) -> Result<()>;
}
