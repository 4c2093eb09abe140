//! Running counters and the bounded action audit log.
//!
//! Counters are atomic; the weighted success rate sits behind a mutex because
//! the fold reads and writes in one step. Both structures are shared across
//! concurrently running workflows.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ActionResult;

/// Point-in-time view of the engine counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub playbooks_executed: u64,
    pub actions_executed: u64,
    pub auto_responses: u64,
    pub manual_responses: u64,
    pub rollbacks: u64,
    /// Weighted average of per-workflow success ratios, in [0, 100].
    pub success_rate: f64,
}

#[derive(Debug, Default)]
pub struct EngineMetrics {
    playbooks_executed: AtomicU64,
    actions_executed: AtomicU64,
    auto_responses: AtomicU64,
    manual_responses: AtomicU64,
    rollbacks: AtomicU64,
    success_rate: Mutex<f64>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the workflow counter and return the post-increment count, the
    /// `n` used when folding this workflow's ratio into the running average.
    pub fn begin_workflow(&self) -> u64 {
        self.playbooks_executed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_action(&self) {
        self.actions_executed.fetch_add(1, Ordering::SeqCst);
        self.auto_responses.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_manual_response(&self) {
        self.manual_responses.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_rollback(&self) {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
    }

    /// Fold one workflow's success ratio into the running weighted average:
    /// `new = (old * (n - 1) + rate) / n`, clamped to [0, 100].
    pub fn fold_success_rate(&self, n: u64, rate: f64) {
        if n == 0 {
            return;
        }
        let mut avg = self.success_rate.lock().unwrap_or_else(|e| e.into_inner());
        let folded = (*avg * (n - 1) as f64 + rate) / n as f64;
        *avg = folded.clamp(0.0, 100.0);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            playbooks_executed: self.playbooks_executed.load(Ordering::SeqCst),
            actions_executed: self.actions_executed.load(Ordering::SeqCst),
            auto_responses: self.auto_responses.load(Ordering::SeqCst),
            manual_responses: self.manual_responses.load(Ordering::SeqCst),
            rollbacks: self.rollbacks.load(Ordering::SeqCst),
            success_rate: *self.success_rate.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }
}

/// One line of the audit log: what ran, how it went, when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionHistoryEntry {
    pub action: String,
    pub success: bool,
    pub message: String,
    pub duration_ms: u64,
    pub recorded_at: DateTime<Utc>,
}

impl From<&ActionResult> for ActionHistoryEntry {
    fn from(result: &ActionResult) -> Self {
        Self {
            action: result.action.clone(),
            success: result.success,
            message: result.message.clone(),
            duration_ms: result.duration_ms,
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only ring buffer over every dispatched action.
#[derive(Debug)]
pub struct ActionHistory {
    entries: Mutex<VecDeque<ActionHistoryEntry>>,
    cap: usize,
}

impl ActionHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(cap.min(1024))),
            cap,
        }
    }

    pub fn push(&self, entry: ActionHistoryEntry) {
        // A zero cap means no audit log at all.
        if self.cap == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        while entries.len() >= self.cap {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The most recent entries, oldest first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<ActionHistoryEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
