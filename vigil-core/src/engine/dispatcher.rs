//! Action dispatch.
//!
//! One entry point routes on the action kind to exactly one handler. Handler
//! failures never cross this boundary: a connector error comes back as a
//! failed [`ActionResult`]. Every invocation, whatever the outcome, lands in
//! the bounded action history and bumps the dispatch counters.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::connectors::Connectors;
use crate::error::VigilResult;
use crate::metrics::{ActionHistory, ActionHistoryEntry, EngineMetrics};
use crate::models::{ActionKind, ActionResult, EventContext, Severity};

#[derive(Clone)]
pub struct ActionDispatcher {
    connectors: Connectors,
    history: Arc<ActionHistory>,
    metrics: Arc<EngineMetrics>,
}

impl ActionDispatcher {
    pub fn new(
        connectors: Connectors,
        history: Arc<ActionHistory>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            connectors,
            history,
            metrics,
        }
    }

    /// Run one action against the given context and normalize the outcome.
    ///
    /// An `Err` here means the dispatcher itself broke, not that the action
    /// failed; the executor treats that as a workflow-level error.
    pub async fn execute(
        &self,
        kind: &ActionKind,
        context: &EventContext,
    ) -> VigilResult<ActionResult> {
        let started = Instant::now();
        let mut result = self.route(kind, context).await;
        result.duration_ms = started.elapsed().as_millis() as u64;

        debug!(
            action = result.action.as_str(),
            success = result.success,
            duration_ms = result.duration_ms,
            "action dispatched"
        );

        self.history.push(ActionHistoryEntry::from(&result));
        self.metrics.record_action();
        Ok(result)
    }

    async fn route(&self, kind: &ActionKind, context: &EventContext) -> ActionResult {
        let label = kind.label();
        match kind {
            ActionKind::BlockIp { duration_secs } => {
                let Some(ip) = context.ip.as_deref() else {
                    return ActionResult::failed(label, "no ip in event context");
                };
                let reason = context
                    .event_type
                    .as_deref()
                    .map(|t| format!("automated response to {t}"))
                    .unwrap_or_else(|| "automated response".to_string());
                match self
                    .connectors
                    .blacklist
                    .add_to_blacklist(ip, &reason, *duration_secs)
                    .await
                {
                    Ok(()) => ActionResult::ok(label, format!("blocked {ip} for {duration_secs}s")),
                    Err(e) => ActionResult::failed(label, e.to_string()),
                }
            }
            ActionKind::CreateIncident { title, priority } => {
                let title = title.clone().unwrap_or_else(|| {
                    format!(
                        "Security incident: {}",
                        context.event_type.as_deref().unwrap_or("unclassified event")
                    )
                });
                let severity = context.severity.unwrap_or(Severity::Medium);
                match self
                    .connectors
                    .incidents
                    .create_incident(&title, severity, "vigil")
                    .await
                {
                    Ok(record) => {
                        let mut result =
                            ActionResult::ok(label, format!("incident {} created", record.id));
                        if let Ok(data) = serde_json::to_value(&record) {
                            result = result.with_data(data);
                        }
                        if let Some(priority) = priority {
                            debug!(incident_id = %record.id, %priority, "incident priority requested");
                        }
                        result
                    }
                    Err(e) => ActionResult::failed(label, e.to_string()),
                }
            }
            ActionKind::CollectEvidence { source } => {
                let source = source
                    .as_deref()
                    .or(context.source.as_deref())
                    .or(context.ip.as_deref())
                    .unwrap_or("unknown");
                match self
                    .connectors
                    .forensics
                    .collect_evidence(source, context.incident_id.as_deref())
                    .await
                {
                    Ok(bundle) => {
                        let mut result =
                            ActionResult::ok(label, format!("evidence collected from {source}"));
                        if let Ok(data) = serde_json::to_value(&bundle) {
                            result = result.with_data(data);
                        }
                        result
                    }
                    Err(e) => ActionResult::failed(label, e.to_string()),
                }
            }
            ActionKind::CheckIpReputation => {
                let Some(ip) = context.ip.as_deref() else {
                    return ActionResult::failed(label, "no ip in event context");
                };
                match self.connectors.threat_intel.check_ip_reputation(ip).await {
                    Ok(reputation) => {
                        let verdict = if reputation.malicious { "malicious" } else { "clean" };
                        let mut result =
                            ActionResult::ok(label, format!("{ip} reputation: {verdict}"));
                        if let Ok(data) = serde_json::to_value(&reputation) {
                            result = result.with_data(data);
                        }
                        result
                    }
                    Err(e) => ActionResult::failed(label, e.to_string()),
                }
            }
            ActionKind::StartInvestigation {
                investigator,
                priority,
            } => {
                let Some(incident_id) = context.incident_id.as_deref() else {
                    return ActionResult::failed(label, "no incident id in event context");
                };
                let investigator = investigator.as_deref().unwrap_or("on-call");
                let priority = priority.as_deref().unwrap_or("high");
                match self
                    .connectors
                    .forensics
                    .start_investigation(incident_id, investigator, priority)
                    .await
                {
                    Ok(case_id) => {
                        ActionResult::ok(label, format!("investigation {case_id} started"))
                    }
                    Err(e) => ActionResult::failed(label, e.to_string()),
                }
            }
            ActionKind::Alert { channel } => {
                let channel = channel.as_deref().unwrap_or("soc");
                match self.connectors.notifier.alert(context, channel).await {
                    Ok(()) => ActionResult::ok(label, format!("alert sent to {channel}")),
                    Err(e) => ActionResult::failed(label, e.to_string()),
                }
            }
            ActionKind::Unknown => ActionResult::failed(label, "unknown action type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::MemoryBlacklist;

    fn dispatcher() -> (ActionDispatcher, Arc<MemoryBlacklist>, Arc<ActionHistory>) {
        let blacklist = Arc::new(MemoryBlacklist::new());
        let connectors = Connectors::new().with_blacklist(blacklist.clone());
        let history = Arc::new(ActionHistory::new(100));
        let metrics = Arc::new(EngineMetrics::new());
        (
            ActionDispatcher::new(connectors, history.clone(), metrics),
            blacklist,
            history,
        )
    }

    #[tokio::test]
    async fn test_block_ip_reaches_blacklist() {
        let (dispatcher, blacklist, _) = dispatcher();
        let context = EventContext::default().with_ip("203.0.113.9");

        let result = dispatcher
            .execute(&ActionKind::BlockIp { duration_secs: 300 }, &context)
            .await
            .unwrap();

        assert!(result.success);
        assert!(blacklist.contains("203.0.113.9"));
    }

    #[tokio::test]
    async fn test_block_ip_without_ip_fails_without_erroring() {
        let (dispatcher, blacklist, _) = dispatcher();

        let result = dispatcher
            .execute(
                &ActionKind::BlockIp { duration_secs: 300 },
                &EventContext::default(),
            )
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.message.contains("no ip"));
        assert!(blacklist.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_action_yields_failed_result() {
        let (dispatcher, _, _) = dispatcher();

        let result = dispatcher
            .execute(&ActionKind::Unknown, &EventContext::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "unknown action type");
    }

    #[tokio::test]
    async fn test_every_invocation_is_recorded() {
        let (dispatcher, _, history) = dispatcher();
        let context = EventContext::default().with_ip("192.0.2.5");

        dispatcher
            .execute(&ActionKind::CheckIpReputation, &context)
            .await
            .unwrap();
        dispatcher
            .execute(&ActionKind::Unknown, &context)
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        let entries = history.recent(10);
        assert_eq!(entries[0].action, "check_ip_reputation");
        assert_eq!(entries[1].action, "unknown");
        assert!(!entries[1].success);
    }

    #[tokio::test]
    async fn test_create_incident_carries_record_data() {
        let (dispatcher, _, _) = dispatcher();
        let context = EventContext::default().with_severity(Severity::High);

        let result = dispatcher
            .execute(
                &ActionKind::CreateIncident {
                    title: Some("Exfil attempt".to_string()),
                    priority: None,
                },
                &context,
            )
            .await
            .unwrap();

        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["title"], "Exfil attempt");
        assert_eq!(data["severity"], "HIGH");
    }
}
