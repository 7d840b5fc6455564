//! # Configuration
//!
//! Layered configuration: built-in defaults, overridden by environment
//! variables. Command-line flags are a collaborator's concern and are not
//! modeled here (see spec §6).

use serde::{Deserialize, Serialize};
use std::env;

use crate::serialization::SerializationFormat;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string_or(key: &str, default: impl Into<String>) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

/// Configuration shared by every role: discovery address and wire format.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommonConfig {
    #[serde(default = "CommonConfig::default_discovery_address")]
    pub discovery_address: String,
    #[serde(default)]
    pub serialization_format: String,
}

impl CommonConfig {
    fn default_discovery_address() -> String {
        "tcp://127.0.0.1:6000".to_string()
    }

    pub fn from_env() -> Self {
        Self {
            discovery_address: env_string_or(
                "FASTWORKER_DISCOVERY_ADDRESS",
                Self::default_discovery_address(),
            ),
            serialization_format: env_string_or("FASTWORKER_SERIALIZATION_FORMAT", "json"),
        }
    }

    pub fn format(&self) -> SerializationFormat {
        SerializationFormat::from_env_str(&self.serialization_format)
    }
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            discovery_address: Self::default_discovery_address(),
            serialization_format: "json".to_string(),
        }
    }
}

/// Control-plane configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlPlaneConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default = "ControlPlaneConfig::default_worker_id")]
    pub worker_id: String,
    #[serde(default = "ControlPlaneConfig::default_base_address")]
    pub base_address: String,
    #[serde(default = "ControlPlaneConfig::default_cache_max_size")]
    pub cache_max_size: usize,
    #[serde(default = "ControlPlaneConfig::default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

impl ControlPlaneConfig {
    fn default_worker_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn default_base_address() -> String {
        "tcp://127.0.0.1:5555".to_string()
    }

    fn default_cache_max_size() -> usize {
        10_000
    }

    fn default_cache_ttl_seconds() -> u64 {
        3_600
    }

    pub fn from_env() -> Self {
        Self {
            common: CommonConfig::from_env(),
            worker_id: env_string_or("FASTWORKER_WORKER_ID", Self::default_worker_id()),
            base_address: env_string_or(
                "FASTWORKER_CONTROL_PLANE_ADDRESS",
                Self::default_base_address(),
            ),
            cache_max_size: env_or(
                "FASTWORKER_CACHE_MAX_SIZE",
                Self::default_cache_max_size(),
            ),
            cache_ttl_seconds: env_or(
                "FASTWORKER_CACHE_TTL_SECONDS",
                Self::default_cache_ttl_seconds(),
            ),
        }
    }
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            worker_id: Self::default_worker_id(),
            base_address: Self::default_base_address(),
            cache_max_size: Self::default_cache_max_size(),
            cache_ttl_seconds: Self::default_cache_ttl_seconds(),
        }
    }
}

/// Subworker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubworkerConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default = "SubworkerConfig::default_worker_id")]
    pub worker_id: String,
    #[serde(default = "SubworkerConfig::default_base_address")]
    pub base_address: String,
    pub control_plane_address: String,
    #[serde(default = "SubworkerConfig::default_management_port_offset")]
    pub management_port_offset: u16,
}

impl SubworkerConfig {
    fn default_worker_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn default_base_address() -> String {
        "tcp://127.0.0.1:5655".to_string()
    }

    fn default_management_port_offset() -> u16 {
        5
    }

    pub fn from_env() -> Self {
        Self {
            common: CommonConfig::from_env(),
            worker_id: env_string_or("FASTWORKER_WORKER_ID", Self::default_worker_id()),
            base_address: env_string_or(
                "FASTWORKER_SUBWORKER_ADDRESS",
                Self::default_base_address(),
            ),
            control_plane_address: env_string_or(
                "FASTWORKER_CONTROL_PLANE_ADDRESS",
                "tcp://127.0.0.1:5555".to_string(),
            ),
            management_port_offset: env_or(
                "FASTWORKER_SUBWORKER_MANAGEMENT_PORT_OFFSET",
                Self::default_management_port_offset(),
            ),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default = "ClientConfig::default_submission_timeout_seconds")]
    pub submission_timeout_seconds: f64,
    #[serde(default = "ClientConfig::default_retries")]
    pub retries: u32,
}

impl ClientConfig {
    fn default_submission_timeout_seconds() -> f64 {
        30.0
    }

    fn default_retries() -> u32 {
        3
    }

    pub fn from_env() -> Self {
        Self {
            common: CommonConfig::from_env(),
            submission_timeout_seconds: env_or(
                "FASTWORKER_SUBMISSION_TIMEOUT_SECONDS",
                Self::default_submission_timeout_seconds(),
            ),
            retries: env_or("FASTWORKER_RETRIES", Self::default_retries()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            submission_timeout_seconds: Self::default_submission_timeout_seconds(),
            retries: Self::default_retries(),
        }
    }
}
