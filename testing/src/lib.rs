//! # Ticket Ledger Testing
//!
//! Testing utilities and helpers for the ticket ledger.
//!
//! This crate provides:
//! - Mock implementations of the environment traits (clocks, token registry, bank)
//! - A Given-When-Then harness for the reducer
//! - Fixtures for common ledger setups
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```
//! use ticket_ledger_core::environment::{PaymentGateway, TokenRegistry};
//! use ticket_ledger_core::{AccountId, Amount, TicketId};
//! use ticket_ledger_testing::{InMemoryBank, InMemoryTokenRegistry};
//!
//! let contract = AccountId::new();
//! let buyer = AccountId::new();
//! let mut bank = InMemoryBank::new(contract).with_balance(buyer, Amount::new(105));
//! let mut registry = InMemoryTokenRegistry::new();
//!
//! bank.receive_value(&buyer, Amount::new(105)).unwrap();
//! registry.mint(&buyer, TicketId::new(1)).unwrap();
//!
//! assert_eq!(bank.balance_of(&contract), Amount::new(105));
//! assert_eq!(registry.owner_of(TicketId::new(1)), Some(buyer));
//! ```

use chrono::{DateTime, Utc};
use ticket_ledger_core::environment::Clock;

mod ledger_mocks;

pub use ledger_mocks::{InMemoryBank, InMemoryTokenRegistry};
pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_ledger_testing::mocks::FixedClock;
    /// use ticket_ledger_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Clock that only moves when a test advances it.
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the ledger.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock stopped at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward by `by`
        ///
        /// # Panics
        ///
        /// Panics if the clock's lock was poisoned by a panicking test thread.
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap();
            *time += by;
        }
    }

    impl Clock for ManualClock {
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap()
        }
    }
}

/// Fixtures for common ledger setups
pub mod fixtures {
    use super::mocks::test_clock;
    use chrono::Duration;
    use std::sync::Arc;
    use ticket_ledger_core::environment::Clock;
    use ticket_ledger_core::{
        AccountId, Amount, Call, FeeSchedule, LedgerAction, LedgerEnvironment, LedgerState, SettlementOrder,
        TicketId,
    };

    /// Creation fee used by [`fee_schedule`]
    pub const CREATION_FEE: Amount = Amount::new(10);
    /// Purchase fee used by [`fee_schedule`]
    pub const PURCHASE_FEE: Amount = Amount::new(5);

    /// The default schedule: creation 10, purchase 5, reselling multiplier 1
    #[must_use]
    pub const fn fee_schedule() -> FeeSchedule {
        FeeSchedule::new(CREATION_FEE, PURCHASE_FEE, 1)
    }

    /// Empty state owned by `owner` with [`fee_schedule`]
    #[must_use]
    pub fn empty_ledger(owner: AccountId) -> LedgerState {
        LedgerState::new(owner, fee_schedule())
    }

    /// Environment on [`test_clock`]
    #[must_use]
    pub fn environment(settlement: SettlementOrder) -> LedgerEnvironment {
        LedgerEnvironment::new(Arc::new(test_clock()), settlement)
    }

    /// A `createTicket` call paying [`CREATION_FEE`], ending a week after [`test_clock`]
    #[must_use]
    pub fn create_call(creator: AccountId, total_units: u32, unit_price: u64) -> Call {
        Call::new(
            creator,
            CREATION_FEE,
            LedgerAction::CreateTicket {
                metadata_uri: "ipfs://event-metadata".to_string(),
                total_units,
                unit_price: Amount::new(unit_price),
                end_time: test_clock().now() + Duration::days(7),
            },
        )
    }

    /// A `purchaseTicket` call attaching `value`
    #[must_use]
    pub const fn purchase_call(buyer: AccountId, inventory_id: TicketId, units: u32, value: Amount) -> Call {
        Call::new(
            buyer,
            value,
            LedgerAction::PurchaseTicket {
                inventory_id,
                units,
            },
        )
    }

    /// Exact value a purchase of `units` at `unit_price` must attach
    #[must_use]
    pub fn purchase_price(unit_price: u64, units: u32) -> Amount {
        Amount::new(unit_price * u64::from(units) + PURCHASE_FEE.units())
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};
