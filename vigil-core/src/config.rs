use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::models::Severity;

/// Engine configuration, loadable from a file layered under `VIGIL_*`
/// environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub auto_response: AutoResponseConfig,
    #[serde(default)]
    pub approvals: ApprovalConfig,
    #[serde(default)]
    pub rollback: RollbackConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoResponseConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AutoResponseConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// How long an approval request stays decidable.
    #[serde(default = "default_approval_ttl")]
    pub ttl_secs: i64,

    /// Severities that force approval even when the playbook does not ask
    /// for it.
    #[serde(default = "default_escalation_severities")]
    pub escalation_severities: Vec<Severity>,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_approval_ttl(),
            escalation_severities: default_escalation_severities(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Ring-buffer cap on the action audit log; oldest entries evicted first.
    #[serde(default = "default_history_max_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_history_max_entries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_approval_ttl() -> i64 {
    3600
}

fn default_escalation_severities() -> Vec<Severity> {
    vec![Severity::Critical, Severity::High]
}

fn default_history_max_entries() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration from an optional file with `VIGIL_*` environment
    /// variables layered on top (`VIGIL_ROLLBACK__ENABLED=false` and so on).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(Environment::with_prefix("VIGIL").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn with_auto_response(mut self, enabled: bool) -> Self {
        self.auto_response.enabled = enabled;
        self
    }

    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.rollback.enabled = enabled;
        self
    }

    pub fn with_approval_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.approvals.ttl_secs = ttl_secs;
        self
    }

    pub fn with_escalation_severities(mut self, severities: Vec<Severity>) -> Self {
        self.approvals.escalation_severities = severities;
        self
    }

    pub fn with_history_cap(mut self, max_entries: usize) -> Self {
        self.history.max_entries = max_entries;
        self
    }
}

/// Initialize the global tracing subscriber from the logging section.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
