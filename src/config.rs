//! Adapter configuration

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8009";

/// Upper bound on the availability probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// What a remote operation returns when the backend cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RemoteUnavailablePolicy {
    /// Return a synthesized payload with `code: 0`
    Placeholder,
    /// Return `AdapterError::RemoteUnavailable`
    #[default]
    Propagate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    pub base_url: String,
    pub on_unavailable: RemoteUnavailablePolicy,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
    /// Per-request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            on_unavailable: RemoteUnavailablePolicy::default(),
            cache_dir: None,
            request_timeout: None,
        }
    }
}
