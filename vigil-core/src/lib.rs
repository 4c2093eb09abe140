//! Vigil core: an in-process security orchestration, automation and response
//! (SOAR) engine.
//!
//! Classified security events come in; predefined remediation playbooks run
//! action by action, gated by human approval where required, with a bounded
//! audit history, running metrics, and best-effort rollback of completed
//! workflows.

pub mod config;
pub mod connectors;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;

pub use config::{
    init_tracing, ApprovalConfig, AutoResponseConfig, EngineConfig, HistoryConfig, LoggingConfig,
    RollbackConfig,
};
pub use connectors::{
    BlacklistStore, Connectors, ForensicsService, IncidentRecord, IncidentTracker, IpReputation,
    LogNotifier, MemoryBlacklist, MemoryForensics, MemoryIncidentTracker, NotificationChannel,
    StaticThreatIntel, ThreatIntelService,
};
pub use engine::{ActionDispatcher, ExecutionOutcome, SoarEngine};
pub use error::{VigilError, VigilResult};
pub use metrics::{ActionHistory, ActionHistoryEntry, EngineMetrics, MetricsSnapshot};
pub use models::{
    ActionKind, ActionResult, ActionSpec, Approval, ApprovalStatus, EventContext, ExecutedAction,
    Playbook, SecurityEvent, Severity, Workflow, WorkflowStatus,
};
