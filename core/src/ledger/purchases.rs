//! Purchase accounting.
//!
//! A purchase is validated against the inventory, then settled unit by unit:
//! every unit gets its own ticket id, token and purchase record. How the
//! settlement is ordered against the payouts depends on
//! [`SettlementOrder`].

use super::catalog::{advance_allocator, reserve_ids};
use super::{apply_event, LedgerEffects, LedgerEnvironment, MAX_UNITS_PER_PURCHASE};
use crate::action::{Call, LedgerAction, LedgerEvent};
use crate::config::SettlementOrder;
use crate::effect::Effect;
use crate::error::LedgerError;
use crate::state::LedgerState;
use crate::types::{AccountId, Amount, PurchaseInfo, TicketId};
use smallvec::SmallVec;

/// Who gets paid, and how much, for an accepted purchase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Payout {
    creator: AccountId,
    price_total: Amount,
    owner: AccountId,
    fee: Amount,
}

impl Payout {
    fn effects(self) -> [Effect<Call>; 2] {
        [
            Effect::TransferValue {
                to: self.creator,
                amount: self.price_total,
            },
            Effect::TransferValue {
                to: self.owner,
                amount: self.fee,
            },
        ]
    }
}

fn validate_purchase(
    state: &LedgerState,
    inventory_id: TicketId,
    units: u32,
    attached: Amount,
) -> Result<Payout, LedgerError> {
    let info = state
        .ticket_info(inventory_id)
        .ok_or(LedgerError::InventoryNotFound(inventory_id))?;

    if info.sold_out {
        return Err(LedgerError::AlreadySoldOut(inventory_id));
    }

    let remaining = info.remaining();
    if units == 0 || units > MAX_UNITS_PER_PURCHASE || units > remaining {
        return Err(LedgerError::QuantityOutOfRange {
            requested: units,
            remaining,
        });
    }

    let price_total = info
        .unit_price
        .checked_mul(u64::from(units))
        .ok_or(LedgerError::ArithmeticOverflow)?;
    let expected = price_total
        .checked_add(state.purchase_fee())
        .ok_or(LedgerError::ArithmeticOverflow)?;
    if attached != expected {
        return Err(LedgerError::FeeMismatch { expected, attached });
    }

    Ok(Payout {
        creator: info.creator,
        price_total,
        owner: state.owner,
        fee: state.purchase_fee(),
    })
}

/// `purchaseTicket`
pub(crate) fn purchase_ticket(
    state: &mut LedgerState,
    env: &LedgerEnvironment,
    buyer: AccountId,
    value: Amount,
    inventory_id: TicketId,
    units: u32,
) -> Result<LedgerEffects, LedgerError> {
    let payout = validate_purchase(state, inventory_id, units, value)?;

    match env.settlement {
        SettlementOrder::CommitFirst => {
            let mut effects = record_units(state, env, buyer, inventory_id, units)?;
            effects.extend(payout.effects());
            Ok(effects)
        }
        SettlementOrder::TransferFirst => {
            let mut effects: LedgerEffects = SmallVec::new();
            effects.extend(payout.effects());
            effects.push(Effect::Dispatch(Box::new(Call::unpaid(
                buyer,
                LedgerAction::SettlePurchase {
                    inventory_id,
                    units,
                },
            ))));
            Ok(effects)
        }
    }
}

/// Internal settlement step of a transfer-first purchase.
///
/// Capacity was checked when the purchase was accepted and is not checked
/// again here, so purchases accepted in between can push `tickets_sold`
/// past `total_tickets`.
pub(crate) fn settle_purchase(
    state: &mut LedgerState,
    env: &LedgerEnvironment,
    buyer: AccountId,
    inventory_id: TicketId,
    units: u32,
) -> Result<LedgerEffects, LedgerError> {
    if state.ticket_info(inventory_id).is_none() {
        return Err(LedgerError::InventoryNotFound(inventory_id));
    }
    record_units(state, env, buyer, inventory_id, units)
}

fn record_units(
    state: &mut LedgerState,
    env: &LedgerEnvironment,
    buyer: AccountId,
    inventory_id: TicketId,
    units: u32,
) -> Result<LedgerEffects, LedgerError> {
    let price = state
        .ticket_info(inventory_id)
        .map(|info| info.unit_price)
        .ok_or(LedgerError::InventoryNotFound(inventory_id))?;
    reserve_ids(state, units)?;

    let now = env.clock.now();
    let mut effects: LedgerEffects = SmallVec::new();
    for _ in 0..units {
        let ticket_id = state.next_id;
        let event = LedgerEvent::TicketPurchased {
            inventory_id,
            ticket_id,
            buyer,
            price,
            purchased_at: now,
        };
        apply_event(state, &event);

        effects.push(Effect::MintToken {
            owner: buyer,
            id: ticket_id,
        });
        effects.push(Effect::CopyTokenMetadata {
            source: inventory_id,
            target: ticket_id,
        });
        effects.push(Effect::Emit(event));
    }
    Ok(effects)
}

pub(super) fn apply_ticket_purchased(state: &mut LedgerState, event: &LedgerEvent) {
    let LedgerEvent::TicketPurchased {
        inventory_id,
        ticket_id,
        buyer,
        price,
        purchased_at,
    } = event
    else {
        return;
    };

    state
        .purchases
        .entry(*inventory_id)
        .or_default()
        .push(PurchaseInfo {
            units_bought: 1,
            // Every purchased unit starts out released
            units_released_for_resale: 1,
            price_paid: *price,
            inventory_id: *inventory_id,
            individual_ticket_id: *ticket_id,
            timestamp: *purchased_at,
            buyer: *buyer,
        });
    state.user_tickets.entry(*buyer).or_default().push(*ticket_id);

    if let Some(info) = state.tickets.get_mut(inventory_id) {
        info.tickets_sold = info.tickets_sold.saturating_add(1);
        if info.tickets_sold == info.total_tickets {
            info.sold_out = true;
        }
    }
    advance_allocator(state, *ticket_id);
}
