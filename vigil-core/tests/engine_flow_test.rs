//! End-to-end flows through the engine: event intake, approval gating,
//! execution, rollback, and the audit/metrics bookkeeping around them.

use std::sync::Arc;

use vigil_core::{
    ActionKind, ActionSpec, ApprovalStatus, Connectors, EngineConfig, EventContext,
    MemoryBlacklist, Playbook, SecurityEvent, Severity, SoarEngine, WorkflowStatus,
};

fn five_step_sqli_playbook() -> Playbook {
    Playbook::new("sqli-response", "SQL injection response")
        .with_trigger("SQL_INJECTION")
        .with_action(ActionSpec::new(ActionKind::CheckIpReputation))
        .with_action(ActionSpec::new(ActionKind::BlockIp { duration_secs: 600 }))
        .with_action(ActionSpec::new(ActionKind::CreateIncident {
            title: None,
            priority: None,
        }))
        .with_action(ActionSpec::new(ActionKind::CollectEvidence { source: None }))
        .with_action(ActionSpec::new(ActionKind::Alert { channel: None }))
}

#[tokio::test]
async fn high_severity_event_gates_then_completes_after_approval() {
    let engine = SoarEngine::with_defaults();
    engine.register_playbook(five_step_sqli_playbook()).unwrap();

    // HIGH is in the default escalation list, so the unflagged playbook is
    // still gated on the auto-response path.
    let event = SecurityEvent::new("evt-100", "SQL_INJECTION", Severity::High)
        .with_ip("203.0.113.50");
    engine.handle_event(event).await;

    assert!(engine.list_workflows().is_empty());
    let pending = engine.pending_approvals();
    assert_eq!(pending.len(), 1);
    let approval = &pending[0];
    assert_eq!(approval.playbook_id, "sqli-response");
    assert_eq!(approval.context.ip.as_deref(), Some("203.0.113.50"));

    let workflow = engine.approve(approval.id, "analyst-9").await.unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Completed);
    assert_eq!(workflow.results.len(), 5);
    assert!(workflow.results.iter().all(|r| r.success));

    let decided = engine.get_approval(approval.id).unwrap();
    assert_eq!(decided.status, ApprovalStatus::Approved);
    assert!(engine.pending_approvals().is_empty());
}

#[tokio::test]
async fn flagged_playbook_always_requires_approval() {
    let engine = SoarEngine::with_defaults();
    engine
        .register_playbook(
            Playbook::new("gated", "Always gated")
                .with_trigger("ANY")
                .requiring_approval()
                .with_action(ActionSpec::new(ActionKind::Alert { channel: None })),
        )
        .unwrap();

    for severity in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        let outcome = engine
            .execute_playbook("gated", EventContext::default().with_severity(severity))
            .await
            .unwrap();
        assert!(
            outcome.approval_id().is_some(),
            "severity {severity} bypassed the gate"
        );
    }
    assert!(engine.list_workflows().is_empty());
}

#[tokio::test]
async fn ungated_low_severity_never_requires_approval() {
    let engine = SoarEngine::with_defaults();
    engine.register_playbook(five_step_sqli_playbook()).unwrap();

    for severity in [Severity::Medium, Severity::Low, Severity::Info] {
        let outcome = engine
            .execute_playbook(
                "sqli-response",
                EventContext::default()
                    .with_severity(severity)
                    .with_ip("192.0.2.10"),
            )
            .await
            .unwrap();
        assert!(outcome.workflow().is_some());
    }
    assert_eq!(engine.metrics().playbooks_executed, 3);
}

#[tokio::test]
async fn rollback_reverses_block_but_not_evidence() {
    let blacklist = Arc::new(MemoryBlacklist::new());
    let engine = SoarEngine::new(
        EngineConfig::default().with_escalation_severities(vec![]),
        Connectors::default().with_blacklist(blacklist.clone()),
    );
    engine
        .register_playbook(
            Playbook::new("containment", "Containment")
                .with_trigger("INTRUSION")
                .with_action(ActionSpec::new(ActionKind::BlockIp { duration_secs: 900 }))
                .with_action(ActionSpec::new(ActionKind::CollectEvidence { source: None })),
        )
        .unwrap();

    let outcome = engine
        .execute_playbook(
            "containment",
            EventContext::default().with_ip("198.51.100.77"),
        )
        .await
        .unwrap();
    let workflow = outcome.workflow().unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Completed);
    assert!(blacklist.contains("198.51.100.77"));

    let rolled = engine.rollback(workflow.id).await.unwrap();
    assert_eq!(rolled.status, WorkflowStatus::RolledBack);
    assert!(!blacklist.contains("198.51.100.77"));
    assert_eq!(engine.metrics().rollbacks, 1);
}

#[tokio::test]
async fn action_history_keeps_only_the_most_recent_entries() {
    // Cap comes from config; a small cap exercises the same eviction path as
    // the production default of 10,000.
    let engine = SoarEngine::new(
        EngineConfig::default()
            .with_history_cap(50)
            .with_escalation_severities(vec![]),
        Connectors::default(),
    );
    engine
        .register_playbook(
            Playbook::new("noisy", "Noisy")
                .with_trigger("NOISE")
                .with_action(ActionSpec::new(ActionKind::Alert { channel: None })),
        )
        .unwrap();

    for _ in 0..75 {
        engine
            .execute_playbook("noisy", EventContext::default())
            .await
            .unwrap();
    }

    let history = engine.action_history(1000);
    assert_eq!(history.len(), 50);
    assert!(history.iter().all(|e| e.action == "alert"));
    assert_eq!(engine.metrics().actions_executed, 75);
}

#[tokio::test]
async fn zero_history_cap_disables_the_audit_log() {
    let engine = SoarEngine::new(
        EngineConfig::default()
            .with_history_cap(0)
            .with_escalation_severities(vec![]),
        Connectors::default(),
    );
    engine
        .register_playbook(
            Playbook::new("quiet", "Quiet")
                .with_trigger("NOISE")
                .with_action(ActionSpec::new(ActionKind::Alert { channel: None })),
        )
        .unwrap();

    for _ in 0..5 {
        engine
            .execute_playbook("quiet", EventContext::default())
            .await
            .unwrap();
    }

    assert!(engine.action_history(1000).is_empty());
    // Counters still run; only the log is off.
    assert_eq!(engine.metrics().actions_executed, 5);
}

#[tokio::test]
async fn success_rate_stays_bounded_across_mixed_outcomes() {
    let engine = SoarEngine::new(
        EngineConfig::default().with_escalation_severities(vec![]),
        Connectors::default(),
    );
    engine
        .register_playbook(
            Playbook::new("mixed", "Mixed outcome")
                .with_trigger("X")
                // block_ip fails when the context has no ip.
                .with_action(ActionSpec::new(ActionKind::BlockIp { duration_secs: 60 }))
                .with_action(ActionSpec::new(ActionKind::Alert { channel: None })),
        )
        .unwrap();

    for i in 0..10 {
        let context = if i % 2 == 0 {
            EventContext::default().with_ip("192.0.2.40")
        } else {
            EventContext::default()
        };
        engine.execute_playbook("mixed", context).await.unwrap();

        let rate = engine.metrics().success_rate;
        assert!((0.0..=100.0).contains(&rate), "rate out of bounds: {rate}");
    }

    // Half the runs succeed fully, half succeed 1 of 2: average 75.
    let rate = engine.metrics().success_rate;
    assert!((rate - 75.0).abs() < 1e-9, "unexpected rate: {rate}");
}

#[tokio::test]
async fn builtin_playbooks_answer_their_trigger_events() {
    let engine = SoarEngine::with_defaults().with_builtin_playbooks();

    // Low severity keeps the run clear of the escalation gate.
    let event = SecurityEvent::new("evt-bf", "BRUTE_FORCE", Severity::Low)
        .with_ip("203.0.113.80");
    engine.handle_event(event).await;

    let workflows = engine.list_workflows();
    assert_eq!(workflows.len(), 1);
    assert_eq!(workflows[0].playbook_id, "brute-force-lockout");
    assert_eq!(workflows[0].status, WorkflowStatus::Completed);

    // Exfiltration playbook is approval-flagged even at low severity.
    let event = SecurityEvent::new("evt-ex", "DATA_EXFILTRATION", Severity::Low)
        .with_ip("203.0.113.81");
    engine.handle_event(event).await;
    assert_eq!(engine.pending_approvals().len(), 1);
}
