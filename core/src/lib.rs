//! # Ticket Ledger Core
//!
//! Domain model and business logic for issuing, selling and reselling event
//! tickets on a shared, append-only ledger.
//!
//! The crate follows the reducer architecture:
//!
//! - **State**: [`LedgerState`], the persisted contract state
//! - **Action**: [`Call`], a [`LedgerAction`] plus its sender and attached value
//! - **Reducer**: [`LedgerReducer`], `(State, Call, Environment) → (State, Effects)`
//! - **Effect**: [`Effect`], descriptions of token and value movements
//! - **Environment**: [`LedgerEnvironment`], the clock and settlement order
//!
//! Token ownership and native-currency transfers are external collaborators
//! described by the [`TokenRegistry`](environment::TokenRegistry) and
//! [`PaymentGateway`](environment::PaymentGateway) traits. The reducer never
//! touches them; it returns effects that an execution environment interprets.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use ticket_ledger_core::{
//!     environment::SystemClock, reducer::Reducer, AccountId, Amount, Call, FeeSchedule,
//!     LedgerAction, LedgerEnvironment, LedgerReducer, LedgerState, SettlementOrder, TicketId,
//! };
//!
//! let owner = AccountId::new();
//! let issuer = AccountId::new();
//! let mut state = LedgerState::new(owner, FeeSchedule::new(Amount::new(10), Amount::new(5), 1));
//! let env = LedgerEnvironment::new(Arc::new(SystemClock), SettlementOrder::CommitFirst);
//!
//! let effects = LedgerReducer::new().reduce(
//!     &mut state,
//!     Call::new(issuer, Amount::new(10), LedgerAction::CreateTicket {
//!         metadata_uri: "ipfs://concert".to_string(),
//!         total_units: 2,
//!         unit_price: Amount::new(100),
//!         end_time: Utc::now() + Duration::days(30),
//!     }),
//!     &env,
//! )?;
//!
//! assert_eq!(state.ticket_info(TicketId::new(0)).map(|t| t.tickets_sold), Some(0));
//! assert!(!effects.is_empty());
//! # Ok::<(), ticket_ledger_core::LedgerError>(())
//! ```

pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

pub mod action;
pub mod config;
pub mod error;
pub mod ledger;
pub mod state;
pub mod types;

pub use action::{Call, LedgerAction, LedgerEvent};
pub use config::{ConfigError, FeeConfig, LedgerConfig, SettlementOrder};
pub use effect::Effect;
pub use error::{LedgerError, PaymentError, RegistryError};
pub use ledger::{LedgerEnvironment, LedgerReducer, MAX_UNITS_PER_PURCHASE};
pub use state::{Holding, LedgerState};
pub use types::{AccountId, Amount, FeeSchedule, PurchaseInfo, TicketId, TicketInfo};

/// Reducer module - The core trait for business logic
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// Reducers validate an action, update state in place and return effect
    /// descriptions for the runtime to execute.
    ///
    /// A reducer that returns `Err` must leave `state` untouched: validation
    /// happens before any mutation.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// The rejection type
        type Error;

        /// Reduce an action into state changes and effects
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when the action violates a precondition.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<SmallVec<[Effect<Self::Action>; 4]>, Self::Error>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are NOT executed by the reducer. They describe token and value
/// movements, emitted records and follow-up actions, in the order the
/// execution environment must perform them.
pub mod effect {
    use crate::action::LedgerEvent;
    use crate::types::{AccountId, Amount, TicketId};

    /// A side effect to be executed by the runtime
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Mint a token to `owner`
        MintToken {
            /// Receiving account
            owner: AccountId,
            /// Token id
            id: TicketId,
        },

        /// Record a metadata URI on a token
        SetTokenMetadata {
            /// Token id
            id: TicketId,
            /// Metadata URI
            uri: String,
        },

        /// Copy the metadata URI of `source` onto `target`
        CopyTokenMetadata {
            /// Token whose URI is read
            source: TicketId,
            /// Token whose URI is written
            target: TicketId,
        },

        /// Move a token between accounts
        TransferToken {
            /// Current holder
            from: AccountId,
            /// New holder
            to: AccountId,
            /// Token id
            id: TicketId,
        },

        /// Pay `amount` out of the contract's balance
        TransferValue {
            /// Recipient
            to: AccountId,
            /// Amount paid
            amount: Amount,
        },

        /// Append a record to the ledger's event log
        Emit(LedgerEvent),

        /// Feed an action back into the reducer within the same call
        Dispatch(Box<Action>),
    }

    impl<Action> Effect<Action> {
        /// Whether this effect moves native currency
        #[must_use]
        pub const fn is_value_transfer(&self) -> bool {
            matches!(self, Self::TransferValue { .. })
        }
    }
}

/// Environment module - Dependency injection traits
///
/// External collaborators are abstracted behind traits and injected into the
/// execution environment. Only the clock is visible to the reducer.
pub mod environment {
    use crate::error::{PaymentError, RegistryError};
    use crate::types::{AccountId, Amount, TicketId};
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts ledger time for testability
    pub trait Clock: Send + Sync {
        /// Get the current ledger time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Token-ownership ledger: identity, transfer and metadata of ticket tokens
    pub trait TokenRegistry: Send {
        /// Mint token `id` to `owner`
        ///
        /// # Errors
        ///
        /// Returns [`RegistryError::AlreadyMinted`] if the id is taken.
        fn mint(&mut self, owner: &AccountId, id: TicketId) -> Result<(), RegistryError>;

        /// Move token `id` from `from` to `to`
        ///
        /// # Errors
        ///
        /// Returns [`RegistryError::UnknownToken`] or [`RegistryError::NotHolder`].
        fn transfer(&mut self, from: &AccountId, to: &AccountId, id: TicketId) -> Result<(), RegistryError>;

        /// Record the metadata URI of token `id`
        ///
        /// # Errors
        ///
        /// Returns [`RegistryError::UnknownToken`] if the token was never minted.
        fn set_metadata(&mut self, id: TicketId, uri: String) -> Result<(), RegistryError>;

        /// Metadata URI of token `id`
        fn metadata(&self, id: TicketId) -> Option<String>;

        /// Current holder of token `id`
        fn owner_of(&self, id: TicketId) -> Option<AccountId>;
    }

    /// Native-currency movement on behalf of the contract account
    pub trait PaymentGateway: Send {
        /// Escrow value attached to a call into the contract's balance
        ///
        /// # Errors
        ///
        /// Returns [`PaymentError::InsufficientFunds`] if `from` cannot cover it.
        fn receive_value(&mut self, from: &AccountId, amount: Amount) -> Result<(), PaymentError>;

        /// Pay `amount` from the contract's balance to `to`
        ///
        /// # Errors
        ///
        /// Returns [`PaymentError::InsufficientFunds`] if the contract cannot cover it.
        fn transfer_value(&mut self, to: &AccountId, amount: Amount) -> Result<(), PaymentError>;

        /// Balance of `account`
        fn balance_of(&self, account: &AccountId) -> Amount;
    }
}
