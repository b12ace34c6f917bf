//! Engine configuration with TOML file support.

use coffer_types::{Address, Wei};
use coffer_utils::LogFormat;
use serde::{Deserialize, Serialize};

use crate::GovernanceError;

/// Configuration for a treasury engine.
///
/// Can be loaded from a TOML file via [`GovernanceConfig::from_toml_file`] or
/// built programmatically with [`GovernanceConfig::new`] (e.g. for tests).
/// The thresholds are fixed for the lifetime of an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// The administrator allowed to disburse funds.
    pub deployer: Address,

    /// Address reported as the target of contribution events.
    #[serde(default)]
    pub treasury_address: Address,

    /// Minimum cumulative contribution (wei) for the stakeholder role.
    #[serde(default = "default_min_stake_wei")]
    pub min_stake_wei: u64,

    /// Length of a proposal's voting window.
    #[serde(default = "default_voting_period_secs")]
    pub voting_period_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_min_stake_wei() -> u64 {
    100_000_000_000_000_000
}

fn default_voting_period_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GovernanceConfig {
    /// Defaults for everything except the deployer.
    pub fn new(deployer: Address) -> Self {
        Self {
            deployer,
            treasury_address: Address::ZERO,
            min_stake_wei: default_min_stake_wei(),
            voting_period_secs: default_voting_period_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, GovernanceError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| GovernanceError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        let config: Self = toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.min_stake_wei == 0 {
            return Err(GovernanceError::Config(
                "min_stake_wei must be greater than zero".into(),
            ));
        }
        if self.voting_period_secs == 0 {
            return Err(GovernanceError::Config(
                "voting_period_secs must be greater than zero".into(),
            ));
        }
        if LogFormat::parse(&self.log_format).is_none() {
            return Err(GovernanceError::Config(format!(
                "unknown log_format {:?}",
                self.log_format
            )));
        }
        Ok(())
    }

    pub fn min_stake(&self) -> Wei {
        Wei::new(self.min_stake_wei as u128)
    }

    pub fn with_min_stake(mut self, min_stake_wei: u64) -> Self {
        self.min_stake_wei = min_stake_wei;
        self
    }

    pub fn with_voting_period(mut self, secs: u64) -> Self {
        self.voting_period_secs = secs;
        self
    }

    /// Install the global tracing subscriber described by this config.
    ///
    /// Returns `false` if a subscriber was already installed.
    pub fn init_logging(&self) -> bool {
        let format = LogFormat::parse(&self.log_format).unwrap_or(LogFormat::Human);
        coffer_utils::init_logging(format, &self.log_level)
    }
}
