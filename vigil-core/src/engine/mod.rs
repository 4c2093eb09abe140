//! The orchestrator.
//!
//! `SoarEngine` is the explicit context every operation threads through: the
//! playbook registry, workflow and approval stores, dispatcher, metrics, and
//! audit log. It clones cheaply (shared `Arc`s), so background tasks such as
//! the event listener hold the same state as the caller.

mod approvals;
mod dispatcher;
mod executor;
mod listener;
mod registry;
mod rollback;

pub use dispatcher::ActionDispatcher;
pub use executor::ExecutionOutcome;

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::connectors::Connectors;
use crate::metrics::{ActionHistory, ActionHistoryEntry, EngineMetrics, MetricsSnapshot};
use crate::models::{Approval, Playbook, Workflow};

#[derive(Clone)]
pub struct SoarEngine {
    config: Arc<EngineConfig>,
    connectors: Connectors,
    dispatcher: ActionDispatcher,
    playbooks: Arc<DashMap<String, Playbook>>,
    /// Registration order of playbook ids; auto-response selection is
    /// first-match-wins over this sequence.
    playbook_order: Arc<RwLock<Vec<String>>>,
    workflows: Arc<DashMap<Uuid, Workflow>>,
    approvals: Arc<DashMap<Uuid, Approval>>,
    metrics: Arc<EngineMetrics>,
    history: Arc<ActionHistory>,
}

impl SoarEngine {
    pub fn new(config: EngineConfig, connectors: Connectors) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let history = Arc::new(ActionHistory::new(config.history.max_entries));
        let dispatcher =
            ActionDispatcher::new(connectors.clone(), history.clone(), metrics.clone());

        Self {
            config: Arc::new(config),
            connectors,
            dispatcher,
            playbooks: Arc::new(DashMap::new()),
            playbook_order: Arc::new(RwLock::new(Vec::new())),
            workflows: Arc::new(DashMap::new()),
            approvals: Arc::new(DashMap::new()),
            metrics,
            history,
        }
    }

    /// Engine with default config and in-memory connectors.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default(), Connectors::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn get_workflow(&self, id: Uuid) -> Option<Workflow> {
        self.workflows.get(&id).map(|w| w.clone())
    }

    pub fn list_workflows(&self) -> Vec<Workflow> {
        self.workflows.iter().map(|w| w.clone()).collect()
    }

    pub fn get_approval(&self, id: Uuid) -> Option<Approval> {
        self.approvals.get(&id).map(|a| a.clone())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The most recent audit-log entries, oldest first, at most `limit`.
    pub fn action_history(&self, limit: usize) -> Vec<ActionHistoryEntry> {
        self.history.recent(limit)
    }
}
