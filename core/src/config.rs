//! Configuration for the ticket ledger.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::types::{Amount, FeeSchedule};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unrecognised settlement order name
    #[error("unknown settlement order '{0}' (expected 'commit-first' or 'transfer-first')")]
    UnknownSettlementOrder(String),
}

/// When a purchase moves money relative to recording the sale.
///
/// The capacity check always runs first. The two orders differ in whether a
/// payout recipient that calls back into the ledger during its transfer sees
/// the sale already counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettlementOrder {
    /// Mint and record every unit, then pay the creator and the owner.
    #[default]
    CommitFirst,
    /// Pay the creator and the owner, then mint and record every unit in a
    /// separate settlement step that does not re-check capacity. A reentrant
    /// purchase made from inside the payout can oversell the inventory.
    TransferFirst,
}

impl FromStr for SettlementOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commit-first" | "commit_first" => Ok(Self::CommitFirst),
            "transfer-first" | "transfer_first" => Ok(Self::TransferFirst),
            other => Err(ConfigError::UnknownSettlementOrder(other.to_string())),
        }
    }
}

impl fmt::Display for SettlementOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommitFirst => write!(f, "commit-first"),
            Self::TransferFirst => write!(f, "transfer-first"),
        }
    }
}

/// Initial fee parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Value that must be attached to `createTicket`
    pub creation_fee: u64,
    /// Flat fee added to every purchase
    pub purchase_fee: u64,
    /// Multiplier on the unit price paid out by `reBuyTicket`
    pub reselling_fee_percentage: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            creation_fee: 10,
            purchase_fee: 5,
            reselling_fee_percentage: 1,
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Initial fees
    pub fees: FeeConfig,
    /// Purchase settlement order
    pub settlement: SettlementOrder,
    /// `tracing` filter directive (trace, debug, info, warn, error, or a full `EnvFilter` string)
    pub log_filter: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fees: FeeConfig::default(),
            settlement: SettlementOrder::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable numeric values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSettlementOrder`] if
    /// `LEDGER_SETTLEMENT_ORDER` is set to an unrecognised value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = FeeConfig::default();
        let settlement = match env::var("LEDGER_SETTLEMENT_ORDER") {
            Ok(value) => value.parse()?,
            Err(_) => SettlementOrder::default(),
        };

        Ok(Self {
            fees: FeeConfig {
                creation_fee: env::var("LEDGER_CREATION_FEE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.creation_fee),
                purchase_fee: env::var("LEDGER_PURCHASE_FEE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.purchase_fee),
                reselling_fee_percentage: env::var("LEDGER_RESELLING_FEE_PERCENTAGE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.reselling_fee_percentage),
            },
            settlement,
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Fee schedule the ledger starts with
    #[must_use]
    pub const fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule::new(
            Amount::new(self.fees.creation_fee),
            Amount::new(self.fees.purchase_fee),
            self.fees.reselling_fee_percentage,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_order_parse() {
        assert_eq!("commit-first".parse::<SettlementOrder>(), Ok(SettlementOrder::CommitFirst));
        assert_eq!(" Transfer_First ".parse::<SettlementOrder>(), Ok(SettlementOrder::TransferFirst));
        assert_eq!(
            "eventually".parse::<SettlementOrder>(),
            Err(ConfigError::UnknownSettlementOrder("eventually".to_string()))
        );
        assert_eq!(SettlementOrder::TransferFirst.to_string(), "transfer-first");
    }

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.settlement, SettlementOrder::CommitFirst);
        assert_eq!(
            config.fee_schedule(),
            FeeSchedule::new(Amount::new(10), Amount::new(5), 1)
        );
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_config_from_json() {
        let json = r#"{
            "fees": { "creation_fee": 25, "purchase_fee": 0, "reselling_fee_percentage": 3 },
            "settlement": "transfer-first",
            "log_filter": "ticket_ledger=debug"
        }"#;

        let config: LedgerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.settlement, SettlementOrder::TransferFirst);
        assert_eq!(config.fee_schedule(), FeeSchedule::new(Amount::new(25), Amount::ZERO, 3));
        assert_eq!(config.log_filter, "ticket_ledger=debug");
    }
}
