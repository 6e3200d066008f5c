//! # Platform Configuration
//!
//! Consensus parameters and system contract bindings, read from
//! `QC_PLATFORM_*` environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `QC_PLATFORM_LATEST_PROTOCOL_VERSION` | 1 |
//! | `QC_PLATFORM_MIN_PROTOCOL_VERSION` | 1 |
//! | `QC_PLATFORM_BLOCK_TIME_WINDOW_MS` | 300000 (5 min) |
//! | `QC_PLATFORM_MAX_DOCUMENT_TRANSITIONS` | 10 |
//! | `QC_PLATFORM_MAX_UNIQUE_INDICES` | 3 |
//! | `QC_PLATFORM_REGEX_SIZE_LIMIT` | 1048576 |
//! | `QC_PLATFORM_ALLOW_UNLOCKED_CONFIRMED_ASSET_LOCKS` | false |
//! | `QC_PLATFORM_DPNS_CONTRACT_ID` / `QC_PLATFORM_DPNS_TOP_LEVEL_IDENTITY` | unset |
//! | `QC_PLATFORM_FEATURE_FLAGS_CONTRACT_ID` / `QC_PLATFORM_FEATURE_FLAGS_IDENTITY` | unset |
//!
//! Identifiers are base58.

use serde::{Deserialize, Serialize};
use shared_types::Identifier;
use std::env;
use std::str::FromStr;

/// Highest protocol version this node understands.
pub const LATEST_PROTOCOL_VERSION: u32 = 1;

/// Allowed drift of document timestamps around block time (5 minutes).
pub const DEFAULT_BLOCK_TIME_WINDOW_MS: u64 = 5 * 60 * 1000;

/// Maximum sub-transitions per documents batch.
pub const DEFAULT_MAX_DOCUMENT_TRANSITIONS: usize = 10;

/// Maximum unique indices per document type.
pub const DEFAULT_MAX_UNIQUE_INDICES: usize = 3;

/// Compiled-program size limit for contract `pattern`s.
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// A system contract and the identity allowed to act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemContractBinding {
    pub contract_id: Identifier,
    pub system_identity_id: Identifier,
}

/// Platform consensus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub latest_protocol_version: u32,
    pub minimum_protocol_version: u32,
    /// Allowed timestamp drift, milliseconds on either side of block time.
    pub block_time_window_ms: u64,
    pub max_document_transitions: usize,
    pub max_unique_indices: usize,
    pub regex_size_limit: usize,
    /// Accept chain asset locks with one confirmation but no chain lock.
    pub allow_unlocked_confirmed_asset_locks: bool,
    /// Name service contract.
    pub dpns: Option<SystemContractBinding>,
    pub feature_flags: Option<SystemContractBinding>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            latest_protocol_version: LATEST_PROTOCOL_VERSION,
            minimum_protocol_version: LATEST_PROTOCOL_VERSION,
            block_time_window_ms: DEFAULT_BLOCK_TIME_WINDOW_MS,
            max_document_transitions: DEFAULT_MAX_DOCUMENT_TRANSITIONS,
            max_unique_indices: DEFAULT_MAX_UNIQUE_INDICES,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
            allow_unlocked_confirmed_asset_locks: false,
            dpns: None,
            feature_flags: None,
        }
    }
}

impl PlatformConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let binding = |contract: &str, identity: &str| {
            let contract_id = lookup(contract)?.parse().ok()?;
            let system_identity_id = lookup(identity)?.parse().ok()?;
            Some(SystemContractBinding {
                contract_id,
                system_identity_id,
            })
        };

        Self {
            latest_protocol_version: parse_var(&lookup, "QC_PLATFORM_LATEST_PROTOCOL_VERSION")
                .unwrap_or(defaults.latest_protocol_version),
            minimum_protocol_version: parse_var(&lookup, "QC_PLATFORM_MIN_PROTOCOL_VERSION")
                .unwrap_or(defaults.minimum_protocol_version),
            block_time_window_ms: parse_var(&lookup, "QC_PLATFORM_BLOCK_TIME_WINDOW_MS")
                .unwrap_or(defaults.block_time_window_ms),
            max_document_transitions: parse_var(&lookup, "QC_PLATFORM_MAX_DOCUMENT_TRANSITIONS")
                .unwrap_or(defaults.max_document_transitions),
            max_unique_indices: parse_var(&lookup, "QC_PLATFORM_MAX_UNIQUE_INDICES")
                .unwrap_or(defaults.max_unique_indices),
            regex_size_limit: parse_var(&lookup, "QC_PLATFORM_REGEX_SIZE_LIMIT")
                .unwrap_or(defaults.regex_size_limit),
            allow_unlocked_confirmed_asset_locks: lookup(
                "QC_PLATFORM_ALLOW_UNLOCKED_CONFIRMED_ASSET_LOCKS",
            )
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(defaults.allow_unlocked_confirmed_asset_locks),
            dpns: binding(
                "QC_PLATFORM_DPNS_CONTRACT_ID",
                "QC_PLATFORM_DPNS_TOP_LEVEL_IDENTITY",
            ),
            feature_flags: binding(
                "QC_PLATFORM_FEATURE_FLAGS_CONTRACT_ID",
                "QC_PLATFORM_FEATURE_FLAGS_IDENTITY",
            ),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PlatformConfig::default();
        assert_eq!(config.block_time_window_ms, 300_000);
        assert_eq!(config.max_document_transitions, 10);
        assert_eq!(config.max_unique_indices, 3);
        assert!(!config.allow_unlocked_confirmed_asset_locks);
        assert!(config.dpns.is_none());
    }

    #[test]
    fn test_lookup_overrides_and_bindings() {
        let contract = Identifier::new([1; 32]);
        let identity = Identifier::new([2; 32]);
        let vars: HashMap<&str, String> = [
            ("QC_PLATFORM_MAX_DOCUMENT_TRANSITIONS", "4".to_string()),
            ("QC_PLATFORM_ALLOW_UNLOCKED_CONFIRMED_ASSET_LOCKS", "TRUE".to_string()),
            ("QC_PLATFORM_DPNS_CONTRACT_ID", contract.to_base58()),
            ("QC_PLATFORM_DPNS_TOP_LEVEL_IDENTITY", identity.to_base58()),
            ("QC_PLATFORM_FEATURE_FLAGS_CONTRACT_ID", contract.to_base58()),
        ]
        .into_iter()
        .collect();

        let config = PlatformConfig::from_lookup(|name| vars.get(name).cloned());
        assert_eq!(config.max_document_transitions, 4);
        assert!(config.allow_unlocked_confirmed_asset_locks);
        assert_eq!(
            config.dpns,
            Some(SystemContractBinding {
                contract_id: contract,
                system_identity_id: identity
            })
        );
        // Half a binding is no binding.
        assert!(config.feature_flags.is_none());
    }

    #[test]
    fn test_unparsable_values_fall_back_to_defaults() {
        let config = PlatformConfig::from_lookup(|name| {
            (name == "QC_PLATFORM_MAX_UNIQUE_INDICES").then(|| "many".to_string())
        });
        assert_eq!(config.max_unique_indices, DEFAULT_MAX_UNIQUE_INDICES);
    }
}
