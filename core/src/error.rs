//! Error types for the ticket ledger.
//!
//! Every error aborts the call that raised it. The execution environment
//! restores contract state, token ownership and balances to what they were
//! before the call, so no variant ever describes a partially applied change.

use crate::types::{AccountId, Amount, TicketId};
use thiserror::Error;

/// Failures reported by a [`TokenRegistry`](crate::environment::TokenRegistry)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A token with this id already exists
    #[error("token {0} already minted")]
    AlreadyMinted(TicketId),

    /// No token with this id exists
    #[error("token {0} does not exist")]
    UnknownToken(TicketId),

    /// The transfer source does not hold the token
    #[error("token {id} is held by {holder}, not {claimed}")]
    NotHolder {
        /// Token being transferred
        id: TicketId,
        /// Account that actually holds it
        holder: AccountId,
        /// Account named as the source of the transfer
        claimed: AccountId,
    },
}

/// Failures reported by a [`PaymentGateway`](crate::environment::PaymentGateway)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The paying account cannot cover the amount
    #[error("insufficient funds in {account}: balance {balance}, required {required}")]
    InsufficientFunds {
        /// Paying account
        account: AccountId,
        /// Its balance at the time of the transfer
        balance: Amount,
        /// Amount requested
        required: Amount,
    },

    /// Receiving balance would overflow
    #[error("balance overflow crediting {0}")]
    Overflow(AccountId),

    /// The recipient's code rejected the transfer
    #[error("transfer to {account} rejected: {reason}")]
    Rejected {
        /// Recipient
        account: AccountId,
        /// Why the recipient refused
        reason: String,
    },
}

/// Reasons a ledger call is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Zero units requested where at least one is required
    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    /// Zero unit price on a new inventory
    #[error("unit price must be greater than zero")]
    InvalidPrice,

    /// Event end time is not in the future
    #[error("event end time must be after the current ledger time")]
    InvalidSchedule,

    /// Attached value differs from what the operation requires
    #[error("attached value {attached} does not match required {expected}")]
    FeeMismatch {
        /// Required value
        expected: Amount,
        /// Value sent with the call
        attached: Amount,
    },

    /// Every ticket of the inventory has been sold
    #[error("inventory {0} is sold out")]
    AlreadySoldOut(TicketId),

    /// Purchase size outside `1..=2` or above what remains
    #[error("cannot buy {requested} units ({remaining} remaining, at most 2 per purchase)")]
    QuantityOutOfRange {
        /// Units requested
        requested: u32,
        /// Units still available
        remaining: u32,
    },

    /// Fewer units exist to release than requested.
    ///
    /// Raised against two bounds in turn: the inventory's sold count, then
    /// the caller's own holding. `available` is whichever bound failed.
    #[error("cannot release {requested} units, only {available} available")]
    InsufficientHolding {
        /// Units the caller tried to release
        requested: u32,
        /// Units sold from the inventory, or held by the caller
        available: u32,
    },

    /// Release would exceed the caller's holding
    #[error("releasing {requested} more units exceeds holding of {held} ({released} already released)")]
    ReleaseExceedsHolding {
        /// Units the caller tried to release
        requested: u32,
        /// Units already released
        released: u32,
        /// Units held
        held: u32,
    },

    /// The hold date has not reached the event end
    #[error("resale window for inventory {0} is closed")]
    ResaleWindowClosed(TicketId),

    /// No ticket of the inventory has been sold yet
    #[error("inventory {0} has no tickets sold")]
    InsufficientSupply(TicketId),

    /// Caller lacks the capability the operation requires
    #[error("account {0} is not authorized for this operation")]
    Unauthorized(AccountId),

    /// No inventory with this id exists
    #[error("inventory {0} not found")]
    InventoryNotFound(TicketId),

    /// A price, fee or counter computation overflowed
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// An internal settlement step was submitted as a public call
    #[error("internal action cannot be submitted directly")]
    InternalAction,

    /// The token registry refused an operation
    #[error("token registry: {0}")]
    Registry(#[from] RegistryError),

    /// The payment gateway refused a transfer
    #[error("payment gateway: {0}")]
    Payment(#[from] PaymentError),
}

impl LedgerError {
    /// Stable, low-cardinality name used as a metrics label
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidQuantity => "invalid_quantity",
            Self::InvalidPrice => "invalid_price",
            Self::InvalidSchedule => "invalid_schedule",
            Self::FeeMismatch { .. } => "fee_mismatch",
            Self::AlreadySoldOut(_) => "already_sold_out",
            Self::QuantityOutOfRange { .. } => "quantity_out_of_range",
            Self::InsufficientHolding { .. } => "insufficient_holding",
            Self::ReleaseExceedsHolding { .. } => "release_exceeds_holding",
            Self::ResaleWindowClosed(_) => "resale_window_closed",
            Self::InsufficientSupply(_) => "insufficient_supply",
            Self::Unauthorized(_) => "unauthorized",
            Self::InventoryNotFound(_) => "inventory_not_found",
            Self::ArithmeticOverflow => "arithmetic_overflow",
            Self::InternalAction => "internal_action",
            Self::Registry(_) => "registry",
            Self::Payment(_) => "payment",
        }
    }
}
