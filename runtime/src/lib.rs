//! # Ticket Ledger Runtime
//!
//! Execution environment for the ticket ledger.
//!
//! The core crate's reducer only describes what a call should do. This crate
//! carries it out against a token registry and a payment gateway, one call at
//! a time and all-or-nothing.
//!
//! ## Core Components
//!
//! - **Ledger**: owns contract state and the collaborators, executes calls atomically
//! - **Receipt**: the records a committed call emitted
//! - **Value receivers**: code that runs when an account is paid, and may call back in
//! - **`SharedLedger`**: async handle that serializes calls from many tasks
//!
//! ## Example
//!
//! ```ignore
//! use ticket_ledger_runtime::{Ledger, SharedLedger};
//!
//! let ledger = Ledger::from_config(owner, &config, Arc::new(SystemClock), registry, bank);
//! let shared = SharedLedger::new(ledger);
//!
//! let receipt = shared.submit(create_call).await?;
//! let inventory = receipt.created_inventory();
//! ```

/// Atomic call execution
pub mod ledger;

/// Prometheus metrics for observability
pub mod metrics;

/// Tracing subscriber setup
pub mod telemetry;

mod shared;

/// Code that runs when the ledger pays an account
pub mod hooks {
    use crate::ledger::Receipt;
    use ticket_ledger_core::{AccountId, Amount, Call, LedgerError, LedgerState};

    /// What a [`ValueReceiver`] can do with the ledger while it is being paid
    pub trait Contract {
        /// Submit a nested call.
        ///
        /// The nested call is atomic on its own. Whether its failure aborts
        /// the payout that triggered it is up to the receiver.
        ///
        /// # Errors
        ///
        /// Returns the [`LedgerError`] that aborted the nested call.
        fn call(&mut self, call: Call) -> Result<Receipt, LedgerError>;

        /// Contract state as of this point in the enclosing call
        fn state(&self) -> &LedgerState;

        /// Balance of `account` as of this point in the enclosing call
        fn balance_of(&self, account: &AccountId) -> Amount;
    }

    /// Runs synchronously after the ledger pays the account it is registered for.
    pub trait ValueReceiver: Send {
        /// Called once the payout has been credited.
        ///
        /// # Errors
        ///
        /// Returning an error aborts the call that made the payout.
        fn on_value_received(&mut self, ledger: &mut dyn Contract, amount: Amount) -> Result<(), LedgerError>;
    }
}

pub use hooks::{Contract, ValueReceiver};
pub use ledger::{Ledger, Receipt};
pub use shared::SharedLedger;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ticket_ledger_core::environment::PaymentGateway;
    use ticket_ledger_core::{AccountId, Amount, LedgerConfig, LedgerError, PaymentError};
    use ticket_ledger_testing::fixtures::{create_call, purchase_call, purchase_price};
    use ticket_ledger_testing::{test_clock, InMemoryBank, InMemoryTokenRegistry};

    fn ledger(owner: AccountId) -> Ledger<InMemoryTokenRegistry, InMemoryBank> {
        Ledger::from_config(
            owner,
            &LedgerConfig::default(),
            Arc::new(test_clock()),
            InMemoryTokenRegistry::new(),
            InMemoryBank::new(AccountId::new()),
        )
    }

    /// Refuses every payout
    struct Refuse;

    impl ValueReceiver for Refuse {
        fn on_value_received(&mut self, _ledger: &mut dyn Contract, _amount: Amount) -> Result<(), LedgerError> {
            Err(LedgerError::Payment(PaymentError::Rejected {
                account: AccountId::default(),
                reason: "not accepting payments".to_string(),
            }))
        }
    }

    #[test]
    fn test_receiver_failure_aborts_payout() {
        let owner = AccountId::new();
        let creator = AccountId::new();
        let mut ledger = ledger(owner);
        ledger.bank_mut().credit(creator, Amount::new(10));
        ledger.register_receiver(owner, Refuse);

        let result = ledger.submit(create_call(creator, 2, 100));

        assert!(matches!(result, Err(LedgerError::Payment(PaymentError::Rejected { .. }))));
        assert!(ledger.state().tickets.is_empty());
        assert!(ledger.registry().is_empty());
        assert!(ledger.events().is_empty());
        assert_eq!(ledger.bank().balance_of(&creator), Amount::new(10));
    }

    #[test]
    fn test_removed_receiver_no_longer_runs() {
        let owner = AccountId::new();
        let creator = AccountId::new();
        let buyer = AccountId::new();
        let mut ledger = ledger(owner);
        ledger.bank_mut().credit(creator, Amount::new(10));
        ledger.bank_mut().credit(buyer, purchase_price(100, 1));
        ledger.register_receiver(creator, Refuse);
        assert!(ledger.remove_receiver(&creator));
        assert!(!ledger.remove_receiver(&creator));

        let created = ledger.submit(create_call(creator, 2, 100));
        let inventory = created.ok().and_then(|receipt| receipt.created_inventory());
        assert!(inventory.is_some());

        let bought = inventory.map(|id| ledger.submit(purchase_call(buyer, id, 1, purchase_price(100, 1))));
        assert!(matches!(bought, Some(Ok(_))));
    }

    #[test]
    fn test_rejected_internal_action_counts_as_a_call() {
        use metrics_exporter_prometheus::PrometheusBuilder;
        use ticket_ledger_core::{Call, LedgerAction, TicketId};

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let mut ledger = ledger(AccountId::new());
        let settle = Call::unpaid(
            AccountId::new(),
            LedgerAction::SettlePurchase {
                inventory_id: TicketId::new(0),
                units: 1,
            },
        );

        let result = ::metrics::with_local_recorder(&recorder, || ledger.submit(settle));
        let rendered = handle.render();

        assert_eq!(result, Err(LedgerError::InternalAction));
        assert!(rendered.contains(r#"ledger_calls_total{action="settle_purchase"} 1"#));
        assert!(rendered.contains(
            r#"ledger_calls_reverted_total{action="settle_purchase",reason="internal_action"} 1"#
        ));
    }
}
