//! Deployment configuration of an engine instance.

use delegatable_typed_data::{DomainContext, Identity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DEFAULT_MAX_CHAIN_DEPTH;

/// How a batch reacts to one of its invocations failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// A failed invocation is reported and undone; its siblings keep their
    /// effects.
    #[default]
    Independent,
    /// A failed invocation undoes every invocation of its batch.
    Atomic,
}

/// Configuration of a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Domain every accepted message must be signed in.
    pub domain: DomainContext,

    /// Identity caveats use to subject a link to the revocation registry.
    pub revocation_registry: Identity,

    /// Longest authority chain accepted.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,

    /// Failure handling inside a batch.
    #[serde(default)]
    pub batch_policy: BatchPolicy,
}

fn default_max_chain_depth() -> usize {
    DEFAULT_MAX_CHAIN_DEPTH
}

impl EngineConfig {
    /// Configuration for `domain` with default limits.
    pub fn new(domain: DomainContext, revocation_registry: Identity) -> Self {
        Self {
            domain,
            revocation_registry,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            batch_policy: BatchPolicy::default(),
        }
    }

    /// Replace the batch policy.
    pub fn with_batch_policy(mut self, batch_policy: BatchPolicy) -> Self {
        self.batch_policy = batch_policy;
        self
    }

    /// Replace the maximum chain depth.
    pub fn with_max_chain_depth(mut self, max_chain_depth: usize) -> Self {
        self.max_chain_depth = max_chain_depth;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.name.is_empty() {
            return Err(ConfigError::Invalid("domain name must not be empty".into()));
        }
        if self.max_chain_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_chain_depth must be at least 1".into(),
            ));
        }
        if self.revocation_registry == self.domain.verifying_resource {
            return Err(ConfigError::Invalid(
                "revocation registry must not share the resource's identity".into(),
            ));
        }
        Ok(())
    }
}

/// Errors produced while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The resource does not match the configured domain.
    #[error("Domain verifies {expected}, but the resource is {found}")]
    ResourceMismatch {
        /// Verifying resource of the configured domain
        expected: Identity,
        /// Identity of the supplied resource
        found: Identity,
    },
}
