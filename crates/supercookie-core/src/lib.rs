pub mod config;
pub mod error;
pub mod registry;
pub mod session;

pub use config::ServerConfig;
pub use error::SupercookieError;
pub use registry::{generate_identifier, mask_identifier, MaskedRecord, StatsSnapshot, TrackingRegistry, PROBE_WIDTH};
pub use session::{ProbeOutcome, ProbeTally, SessionState, TrackingRecord};

use std::path::PathBuf;
use std::sync::Arc;

/// Collects everything a server instance shares across requests.
///
/// The registry is created here, once, and handed to every handler by
/// reference; nothing in the process holds it as a global.
pub struct ServerBuilder {
    pub registry: Arc<TrackingRegistry>,
    pub config: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(TrackingRegistry::new()),
            config: ServerConfig::default(),
        }
    }

    /// Overrides the default server configuration.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares an existing registry instead of starting from an empty one.
    pub fn with_registry(mut self, registry: Arc<TrackingRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.assets_dir = dir.into();
        self
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
