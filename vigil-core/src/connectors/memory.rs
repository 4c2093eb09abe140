//! In-memory connector implementations.
//!
//! These keep the engine runnable and testable with zero external wiring.
//! Production deployments swap real integrations into the [`super::Connectors`]
//! bundle instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use tracing::info;

use super::traits::{
    BlacklistStore, ForensicsService, IncidentRecord, IncidentTracker, IpReputation,
    NotificationChannel, ThreatIntelService,
};
use crate::models::{Approval, EventContext, Severity};

#[derive(Debug, Clone)]
pub struct BlacklistEntry {
    pub reason: String,
    pub duration_secs: u64,
    pub added_at: DateTime<Utc>,
}

/// Blacklist held in process memory.
#[derive(Default)]
pub struct MemoryBlacklist {
    entries: DashMap<String, BlacklistEntry>,
}

impl MemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.entries.contains_key(ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl BlacklistStore for MemoryBlacklist {
    async fn add_to_blacklist(&self, ip: &str, reason: &str, duration_secs: u64) -> Result<()> {
        self.entries.insert(
            ip.to_string(),
            BlacklistEntry {
                reason: reason.to_string(),
                duration_secs,
                added_at: Utc::now(),
            },
        );
        info!(ip, duration_secs, "address added to blacklist");
        Ok(())
    }

    async fn remove_from_blacklist(&self, ip: &str) -> Result<()> {
        self.entries.remove(ip);
        info!(ip, "address removed from blacklist");
        Ok(())
    }
}

/// Incident tracker backed by a concurrent map, issuing `INC-n` ids.
#[derive(Default)]
pub struct MemoryIncidentTracker {
    incidents: DashMap<String, IncidentRecord>,
    next_id: AtomicU64,
}

impl MemoryIncidentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<IncidentRecord> {
        self.incidents.get(id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

#[async_trait]
impl IncidentTracker for MemoryIncidentTracker {
    async fn create_incident(
        &self,
        title: &str,
        severity: Severity,
        created_by: &str,
    ) -> Result<IncidentRecord> {
        let id = format!("INC-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = IncidentRecord {
            id: id.clone(),
            title: title.to_string(),
            severity,
            status: "open".to_string(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        self.incidents.insert(id.clone(), record.clone());
        info!(incident_id = %id, %severity, "incident created");
        Ok(record)
    }
}

/// Forensics stub recording which sources were captured.
#[derive(Default)]
pub struct MemoryForensics {
    captures: DashSet<String>,
}

impl MemoryForensics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self, source: &str) -> bool {
        self.captures.contains(source)
    }
}

#[async_trait]
impl ForensicsService for MemoryForensics {
    async fn collect_evidence(
        &self,
        source: &str,
        incident_id: Option<&str>,
    ) -> Result<HashMap<String, serde_json::Value>> {
        self.captures.insert(source.to_string());
        let mut bundle = HashMap::new();
        bundle.insert("source".to_string(), serde_json::json!(source));
        bundle.insert(
            "captured_at".to_string(),
            serde_json::json!(Utc::now().to_rfc3339()),
        );
        if let Some(incident_id) = incident_id {
            bundle.insert("incident_id".to_string(), serde_json::json!(incident_id));
        }
        info!(source, ?incident_id, "evidence collected");
        Ok(bundle)
    }

    async fn start_investigation(
        &self,
        incident_id: &str,
        investigator: &str,
        priority: &str,
    ) -> Result<String> {
        let case_id = format!("CASE-{incident_id}");
        info!(incident_id, investigator, priority, "investigation started");
        Ok(case_id)
    }
}

/// Reputation lookups answered from a fixed known-bad set.
#[derive(Default)]
pub struct StaticThreatIntel {
    known_bad: DashSet<String>,
}

impl StaticThreatIntel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_bad(self, ip: impl Into<String>) -> Self {
        self.known_bad.insert(ip.into());
        self
    }
}

#[async_trait]
impl ThreatIntelService for StaticThreatIntel {
    async fn check_ip_reputation(&self, ip: &str) -> Result<IpReputation> {
        let malicious = self.known_bad.contains(ip);
        Ok(IpReputation {
            ip: ip.to_string(),
            malicious,
            score: if malicious { 0.9 } else { 0.1 },
            sources: vec!["static".to_string()],
        })
    }
}

/// Notification channel that only writes to the log.
#[derive(Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationChannel for LogNotifier {
    async fn alert(&self, context: &EventContext, channel: &str) -> Result<()> {
        info!(
            channel,
            event_type = ?context.event_type,
            severity = ?context.severity,
            "security alert"
        );
        Ok(())
    }

    async fn approval_required(&self, approval: &Approval) -> Result<()> {
        info!(
            approval_id = %approval.id,
            playbook_id = %approval.playbook_id,
            expires_at = %approval.expires_at,
            "playbook run awaiting approval"
        );
        Ok(())
    }
}
