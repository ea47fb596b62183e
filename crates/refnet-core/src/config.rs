// Traversal configuration.
//
// Sources, lowest precedence first: built-in defaults, an optional TOML/JSON file,
// then `REFNET_*` environment variables.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;
use crate::types::NodeId;

/// Hard ceiling on traversal depth for both the placement tree and the sponsor graph.
pub const MAX_DEPTH: u32 = 12;

/// Sponsor id that marks operator-owned filler slots on the reference deployment.
pub const DEFAULT_TECHNICAL_SPONSOR: NodeId = match NodeId::new(7_777_777) {
    Some(id) => id,
    None => panic!("technical sponsor sentinel must be non-zero"),
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Depth bound for both structures, at most `MAX_DEPTH`.
    pub max_depth: u32,
    /// Concurrent referral-list lookups per batch.
    pub referral_batch_size: usize,
    /// Concurrent activity checks per batch.
    pub activity_batch_size: usize,
    /// Concurrent node lookups per batch while expanding the placement tree.
    pub node_batch_size: usize,
    /// Sponsor id identifying technical accounts on this deployment.
    pub technical_sponsor_id: NodeId,
    /// Fetch `maxLevel`/`rank` for every placed node.
    pub fetch_standing: bool,
    /// When set, a bounded LRU cache is kept for the whole session.
    pub session_cache_capacity: Option<usize>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            referral_batch_size: 5,
            activity_batch_size: 10,
            node_batch_size: 10,
            technical_sponsor_id: DEFAULT_TECHNICAL_SPONSOR,
            fetch_standing: false,
            session_cache_capacity: None,
        }
    }
}

impl TraversalConfig {
    /// Loads configuration from an optional file plus the environment, then validates it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Loading traversal config from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix("REFNET").try_parsing(true));

        let config: TraversalConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be within 1..={}, got {}",
                MAX_DEPTH, self.max_depth
            )));
        }
        for (name, size) in [
            ("referral_batch_size", self.referral_batch_size),
            ("activity_batch_size", self.activity_batch_size),
            ("node_batch_size", self.node_batch_size),
        ] {
            if size == 0 {
                return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
            }
        }
        if self.session_cache_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "session_cache_capacity must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}
