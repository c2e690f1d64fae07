//! Domain types for the ticket ledger.
//!
//! Identifiers, native-currency amounts and the two record types the ledger
//! keeps: one [`TicketInfo`] per event inventory and one [`PurchaseInfo`] per
//! individual ticket sold against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// An account on the ledger (ticket issuer, buyer, contract owner, ...)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random `AccountId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an `AccountId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token id on the ledger.
///
/// Inventory ids and individual ticket ids are drawn from the same sequence,
/// so a `TicketId` never names both an inventory and a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(u64);

impl TicketId {
    /// Creates a `TicketId` from its raw sequence number
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one, or `None` if the sequence is exhausted
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Native-currency amount in the ledger's smallest unit
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u64);

impl Amount {
    /// The zero amount
    pub const ZERO: Self = Self(0);

    /// Creates an `Amount` from base units
    #[must_use]
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Returns the amount in base units
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.0
    }

    /// Checks if this amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, returning `None` on overflow
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Subtracts `other`, returning `None` if it is larger than `self`
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Multiplies by a scalar, returning `None` on overflow
    #[must_use]
    pub const fn checked_mul(self, factor: u64) -> Option<Self> {
        match self.0.checked_mul(factor) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three fee parameters held by fee administration.
///
/// Despite their historical names, `creation_fee` and `purchase_fee` are
/// absolute amounts. `reselling_fee_percentage` is a plain multiplier applied
/// to the unit price when a ticket is bought back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat amount attached to `createTicket`
    pub creation_fee: Amount,
    /// Flat amount added on top of the unit price total in `purchaseTicket`
    pub purchase_fee: Amount,
    /// Multiplier on the unit price paid out by `reBuyTicket`
    pub reselling_fee_percentage: u64,
}

impl FeeSchedule {
    /// Creates a fee schedule
    #[must_use]
    pub const fn new(creation_fee: Amount, purchase_fee: Amount, reselling_fee_percentage: u64) -> Self {
        Self {
            creation_fee,
            purchase_fee,
            reselling_fee_percentage,
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// One event's ticket-issuance record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInfo {
    /// Inventory id (also the id of the token minted to the creator)
    pub id: TicketId,
    /// Number of tickets issued
    pub total_tickets: u32,
    /// Number of tickets purchased so far
    pub tickets_sold: u32,
    /// Price of one ticket
    pub unit_price: Amount,
    /// When the inventory was created
    pub start_time: DateTime<Utc>,
    /// When the event ends
    pub end_time: DateTime<Utc>,
    /// Resale gate; resale requires `hold_until >= end_time`
    pub hold_until: DateTime<Utc>,
    /// Issuing account, receives the unit price of every sale
    pub creator: AccountId,
    /// Set once `tickets_sold == total_tickets`
    pub sold_out: bool,
    /// Never set by any operation
    pub resellable: bool,
}

impl TicketInfo {
    /// Tickets still available for purchase.
    ///
    /// Saturates at zero when the counters have been driven past the total
    /// by a reentrant purchase under transfer-first settlement.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.total_tickets.saturating_sub(self.tickets_sold)
    }

    /// Whether the resale gate is open
    #[must_use]
    pub fn resale_open(&self) -> bool {
        self.hold_until >= self.end_time
    }
}

/// One individual ticket sold against an inventory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseInfo {
    /// Units covered by this record (always 1)
    pub units_bought: u32,
    /// Units the buyer has released for resale; only ever increases
    pub units_released_for_resale: u32,
    /// Unit price at the time of purchase
    pub price_paid: Amount,
    /// Inventory this ticket belongs to
    pub inventory_id: TicketId,
    /// Id of the individual ticket token
    pub individual_ticket_id: TicketId,
    /// When the ticket was bought
    pub timestamp: DateTime<Utc>,
    /// Original purchaser; not updated on resale
    pub buyer: AccountId,
}
