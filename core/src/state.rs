//! Persisted contract state and its read-only queries.

use crate::types::{AccountId, Amount, FeeSchedule, PurchaseInfo, TicketId, TicketInfo};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Units an account bought against one inventory and how many it released
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Holding {
    /// Sum of `units_bought` over the account's records
    pub owned: u32,
    /// Sum of `units_released_for_resale` over the account's records
    pub released: u32,
}

/// Complete contract state.
///
/// Layout mirrors what the ledger persists: the inventory table, the
/// per-inventory purchase log, the per-account ownership log, the fee
/// parameters, the shared id counter and the owner account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Account allowed to change fees; receives creation and purchase fees
    pub owner: AccountId,
    /// Current fee parameters
    pub fees: FeeSchedule,
    /// Next id handed out to an inventory or an individual ticket
    pub next_id: TicketId,
    /// Inventory records by inventory id
    pub tickets: BTreeMap<TicketId, TicketInfo>,
    /// Purchase records by inventory id, in purchase order
    pub purchases: BTreeMap<TicketId, Vec<PurchaseInfo>>,
    /// Individual ticket ids each account has purchased, in purchase order
    pub user_tickets: HashMap<AccountId, Vec<TicketId>>,
}

impl LedgerState {
    /// Creates an empty ledger owned by `owner`
    #[must_use]
    pub fn new(owner: AccountId, fees: FeeSchedule) -> Self {
        Self {
            owner,
            fees,
            next_id: TicketId::new(0),
            tickets: BTreeMap::new(),
            purchases: BTreeMap::new(),
            user_tickets: HashMap::new(),
        }
    }

    /// `getTicketInfo`
    #[must_use]
    pub fn ticket_info(&self, inventory_id: TicketId) -> Option<&TicketInfo> {
        self.tickets.get(&inventory_id)
    }

    /// `getPurchaseInfo`; empty when nothing was sold or the inventory is unknown
    #[must_use]
    pub fn purchase_info(&self, inventory_id: TicketId) -> &[PurchaseInfo] {
        self.purchases
            .get(&inventory_id)
            .map_or(&[], Vec::as_slice)
    }

    /// `getUserTickets`: purchase history of `account`, not its current holdings
    #[must_use]
    pub fn user_tickets(&self, account: &AccountId) -> &[TicketId] {
        self.user_tickets
            .get(account)
            .map_or(&[], Vec::as_slice)
    }

    /// `getCreationFeePercentage`
    #[must_use]
    pub const fn creation_fee(&self) -> Amount {
        self.fees.creation_fee
    }

    /// `getPurchaseFeePercentage`
    #[must_use]
    pub const fn purchase_fee(&self) -> Amount {
        self.fees.purchase_fee
    }

    /// Multiplier applied by `reBuyTicket`
    #[must_use]
    pub const fn reselling_fee_percentage(&self) -> u64 {
        self.fees.reselling_fee_percentage
    }

    /// Whether `account` is the contract owner
    #[must_use]
    pub fn is_owner(&self, account: &AccountId) -> bool {
        self.owner == *account
    }

    /// Sums `account`'s purchase records for one inventory
    #[must_use]
    pub fn holding(&self, inventory_id: TicketId, account: &AccountId) -> Holding {
        self.purchase_info(inventory_id)
            .iter()
            .filter(|record| record.buyer == *account)
            .fold(Holding::default(), |acc, record| Holding {
                owned: acc.owned.saturating_add(record.units_bought),
                released: acc.released.saturating_add(record.units_released_for_resale),
            })
    }

    /// The purchase record of an individual ticket within an inventory
    #[must_use]
    pub fn find_purchase(&self, inventory_id: TicketId, ticket_id: TicketId) -> Option<&PurchaseInfo> {
        self.purchase_info(inventory_id)
            .iter()
            .find(|record| record.individual_ticket_id == ticket_id)
    }
}
