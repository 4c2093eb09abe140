use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Severity assigned to an event by the detection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// A classified security event delivered by the detection layer.
///
/// The event type vocabulary is owned by the producer, so it stays an open
/// string set rather than an enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub severity: Severity,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub incident_id: Option<String>,
    #[serde(flatten)]
    pub details: HashMap<String, serde_json::Value>,
}

impl SecurityEvent {
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            severity,
            ip: None,
            incident_id: None,
            details: HashMap::new(),
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_incident_id(mut self, incident_id: impl Into<String>) -> Self {
        self.incident_id = Some(incident_id.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Snapshot of event data carried by workflows and approval requests.
///
/// Workflows and approvals outlive the event that produced them, so they hold
/// their own copy instead of borrowing from the producer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventContext {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub incident_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl EventContext {
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_incident_id(mut self, incident_id: impl Into<String>) -> Self {
        self.incident_id = Some(incident_id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl From<&SecurityEvent> for EventContext {
    fn from(event: &SecurityEvent) -> Self {
        Self {
            event_id: Some(event.id.clone()),
            event_type: Some(event.event_type.clone()),
            severity: Some(event.severity),
            ip: event.ip.clone(),
            incident_id: event.incident_id.clone(),
            source: None,
            extra: event.details.clone(),
        }
    }
}
