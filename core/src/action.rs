//! Commands accepted by the ledger and the records it emits.

use crate::types::{AccountId, Amount, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A command together with the account that sent it and the value attached.
///
/// This is the reducer's action type: every state transition is driven by a
/// `Call`, including the internal settlement step dispatched by a purchase
/// under [`SettlementOrder::TransferFirst`](crate::config::SettlementOrder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Account submitting the call
    pub sender: AccountId,
    /// Native currency attached to the call
    pub value: Amount,
    /// What the sender asks for
    pub action: LedgerAction,
}

impl Call {
    /// Creates a call with attached value
    #[must_use]
    pub const fn new(sender: AccountId, value: Amount, action: LedgerAction) -> Self {
        Self {
            sender,
            value,
            action,
        }
    }

    /// Creates a call with no value attached
    #[must_use]
    pub const fn unpaid(sender: AccountId, action: LedgerAction) -> Self {
        Self::new(sender, Amount::ZERO, action)
    }
}

/// Commands for the ticket ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerAction {
    /// Issue a new inventory of tickets (`createTicket`)
    CreateTicket {
        /// Metadata URI recorded on the inventory token and copied to every ticket
        metadata_uri: String,
        /// Number of tickets issued
        total_units: u32,
        /// Price of one ticket
        unit_price: Amount,
        /// When the event ends; must be in the future
        end_time: DateTime<Utc>,
    },

    /// Buy one or two tickets of an inventory (`purchaseTicket`)
    PurchaseTicket {
        /// Inventory to buy from
        inventory_id: TicketId,
        /// Units to buy
        units: u32,
    },

    /// Release held units for resale (`resellTicket`)
    ResellTicket {
        /// Inventory the units belong to
        inventory_id: TicketId,
        /// Units to release
        units: u32,
    },

    /// Acquire a previously purchased ticket (`reBuyTicket`)
    ReBuyTicket {
        /// Inventory the ticket belongs to
        inventory_id: TicketId,
        /// Individual ticket to acquire
        ticket_id: TicketId,
    },

    /// Owner-only: change the creation fee (`updateCreationFeePercentage`)
    UpdateCreationFee {
        /// New fee
        fee: Amount,
    },

    /// Owner-only: change the purchase fee (`updatePurchaseFeePercentage`)
    UpdatePurchaseFee {
        /// New fee
        fee: Amount,
    },

    /// Internal: mint and record purchased units after the payout transfers.
    ///
    /// Dispatched by `PurchaseTicket` under transfer-first settlement. Carries
    /// no capacity check of its own. Rejected when submitted from outside.
    SettlePurchase {
        /// Inventory being bought from
        inventory_id: TicketId,
        /// Units paid for
        units: u32,
    },
}

impl LedgerAction {
    /// Whether this action may only be dispatched by the ledger itself
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::SettlePurchase { .. })
    }

    /// Operation name used in logs and metrics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateTicket { .. } => "create_ticket",
            Self::PurchaseTicket { .. } => "purchase_ticket",
            Self::ResellTicket { .. } => "resell_ticket",
            Self::ReBuyTicket { .. } => "rebuy_ticket",
            Self::UpdateCreationFee { .. } => "update_creation_fee",
            Self::UpdatePurchaseFee { .. } => "update_purchase_fee",
            Self::SettlePurchase { .. } => "settle_purchase",
        }
    }
}

/// Records emitted by the ledger.
///
/// Every change to contract state is described by exactly one of these, so
/// applying the emitted log in order to a fresh state rebuilds it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A new inventory was issued
    TicketCreated {
        /// Inventory id
        id: TicketId,
        /// Tickets issued
        total_units: u32,
        /// Price of one ticket
        unit_price: Amount,
        /// Creation time
        start_time: DateTime<Utc>,
        /// Event end
        end_time: DateTime<Utc>,
        /// Issuing account
        creator: AccountId,
        /// Metadata URI of the inventory token
        metadata_uri: String,
    },

    /// One ticket was sold
    TicketPurchased {
        /// Inventory the ticket belongs to
        inventory_id: TicketId,
        /// Id of the minted ticket
        ticket_id: TicketId,
        /// Buyer
        buyer: AccountId,
        /// Unit price paid
        price: Amount,
        /// Purchase time
        purchased_at: DateTime<Utc>,
    },

    /// Units were released for resale
    TicketResellAuthorized {
        /// Inventory the units belong to
        inventory_id: TicketId,
        /// Releasing account
        holder: AccountId,
        /// Units released
        units: u32,
    },

    /// A ticket changed hands through `reBuyTicket`
    TicketResold {
        /// Inventory the ticket belongs to
        inventory_id: TicketId,
        /// The ticket
        ticket_id: TicketId,
        /// Original purchaser the token was taken from
        previous_holder: AccountId,
        /// Caller that now holds the token
        new_holder: AccountId,
    },

    /// The creation fee changed
    CreationFeeUpdated {
        /// Fee before the update
        previous: Amount,
        /// Fee after the update
        current: Amount,
    },

    /// The purchase fee changed
    PurchaseFeeUpdated {
        /// Fee before the update
        previous: Amount,
        /// Fee after the update
        current: Amount,
    },
}

impl LedgerEvent {
    /// Stable event type name, versioned for schema evolution
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "TicketCreated.v1",
            Self::TicketPurchased { .. } => "TicketPurchased.v1",
            Self::TicketResellAuthorized { .. } => "TicketResellAuthorized.v1",
            Self::TicketResold { .. } => "TicketResold.v1",
            Self::CreationFeeUpdated { .. } => "CreationFeeUpdated.v1",
            Self::PurchaseFeeUpdated { .. } => "PurchaseFeeUpdated.v1",
        }
    }
}
