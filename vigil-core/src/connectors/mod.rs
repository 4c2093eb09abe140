mod memory;
mod traits;

pub use memory::{
    BlacklistEntry, LogNotifier, MemoryBlacklist, MemoryForensics, MemoryIncidentTracker,
    StaticThreatIntel,
};
pub use traits::{
    BlacklistStore, ForensicsService, IncidentRecord, IncidentTracker, IpReputation,
    NotificationChannel, ThreatIntelService,
};

use std::sync::Arc;

/// The bundle of external collaborators the dispatcher adapts over.
///
/// Defaults to the in-memory implementations; override individual seams with
/// the `with_*` builders when wiring real integrations.
#[derive(Clone)]
pub struct Connectors {
    pub blacklist: Arc<dyn BlacklistStore>,
    pub incidents: Arc<dyn IncidentTracker>,
    pub forensics: Arc<dyn ForensicsService>,
    pub threat_intel: Arc<dyn ThreatIntelService>,
    pub notifier: Arc<dyn NotificationChannel>,
}

impl Default for Connectors {
    fn default() -> Self {
        Self {
            blacklist: Arc::new(MemoryBlacklist::new()),
            incidents: Arc::new(MemoryIncidentTracker::new()),
            forensics: Arc::new(MemoryForensics::new()),
            threat_intel: Arc::new(StaticThreatIntel::new()),
            notifier: Arc::new(LogNotifier::new()),
        }
    }
}

impl Connectors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blacklist(mut self, blacklist: Arc<dyn BlacklistStore>) -> Self {
        self.blacklist = blacklist;
        self
    }

    pub fn with_incidents(mut self, incidents: Arc<dyn IncidentTracker>) -> Self {
        self.incidents = incidents;
        self
    }

    pub fn with_forensics(mut self, forensics: Arc<dyn ForensicsService>) -> Self {
        self.forensics = forensics;
        self
    }

    pub fn with_threat_intel(mut self, threat_intel: Arc<dyn ThreatIntelService>) -> Self {
        self.threat_intel = threat_intel;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationChannel>) -> Self {
        self.notifier = notifier;
        self
    }
}
