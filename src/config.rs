//! Builder configuration.
//!
//! ## Configuration
//!
//! Settings can be overridden via environment variables:
//! - `PROVENANCE_MAX_FANOUT`: Concurrent resolves per action (default: 16)
//! - `PROVENANCE_BUILD_TIMEOUT_SECS`: Deadline for a whole build (default: 60)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of sibling inputs resolved concurrently.
pub const DEFAULT_MAX_FANOUT: usize = 16;

/// Default deadline for a whole build, in seconds.
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 60;

/// Configuration for a provenance build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Maximum sibling inputs of one action resolved concurrently (default: 16).
    /// Zero is treated as one.
    pub max_fanout: usize,
    /// Deadline applied by callers around a whole build (default: 60).
    pub build_timeout_secs: u64,
}

impl BuilderConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_fanout: std::env::var("PROVENANCE_MAX_FANOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_fanout),
            build_timeout_secs: std::env::var("PROVENANCE_BUILD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.build_timeout_secs),
        }
    }

    /// Set the fan-out bound.
    pub fn with_max_fanout(mut self, max_fanout: usize) -> Self {
        self.max_fanout = max_fanout;
        self
    }

    /// Set the build deadline.
    pub fn with_build_timeout_secs(mut self, secs: u64) -> Self {
        self.build_timeout_secs = secs;
        self
    }

    /// Effective fan-out (never zero).
    pub fn fanout(&self) -> usize {
        self.max_fanout.max(1)
    }

    /// Build deadline as a duration.
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_fanout: DEFAULT_MAX_FANOUT,
            build_timeout_secs: DEFAULT_BUILD_TIMEOUT_SECS,
        }
    }
}
