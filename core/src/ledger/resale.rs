//! Resale authorization and resale execution.

use super::{apply_event, LedgerEffects, LedgerEnvironment};
use crate::action::LedgerEvent;
use crate::config::SettlementOrder;
use crate::effect::Effect;
use crate::error::LedgerError;
use crate::state::LedgerState;
use crate::types::{AccountId, TicketId};
use smallvec::{smallvec, SmallVec};

/// `resellTicket`: release `units` of the caller's holding for resale.
///
/// The window check compares `hold_until` against `end_time`. Nothing ever
/// moves `hold_until` off its initial value, so on a ledger built only from
/// public calls the window stays closed.
pub(crate) fn resell_ticket(
    state: &mut LedgerState,
    holder: AccountId,
    inventory_id: TicketId,
    units: u32,
) -> Result<LedgerEffects, LedgerError> {
    let info = state
        .ticket_info(inventory_id)
        .ok_or(LedgerError::InventoryNotFound(inventory_id))?;

    if units == 0 {
        return Err(LedgerError::InvalidQuantity);
    }
    if units > info.tickets_sold {
        return Err(LedgerError::InsufficientHolding {
            requested: units,
            available: info.tickets_sold,
        });
    }
    if !info.resale_open() {
        return Err(LedgerError::ResaleWindowClosed(inventory_id));
    }

    let holding = state.holding(inventory_id, &holder);
    if holding.owned < units {
        return Err(LedgerError::InsufficientHolding {
            requested: units,
            available: holding.owned,
        });
    }
    let after_release = holding
        .released
        .checked_add(units)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    if after_release > holding.owned {
        return Err(LedgerError::ReleaseExceedsHolding {
            requested: units,
            released: holding.released,
            held: holding.owned,
        });
    }

    let event = LedgerEvent::TicketResellAuthorized {
        inventory_id,
        holder,
        units,
    };
    apply_event(state, &event);

    Ok(smallvec![Effect::Emit(event)])
}

/// `reBuyTicket`: take an individual ticket from its original purchaser.
///
/// The refund goes to the caller. An unknown ticket id is not an error: the
/// call succeeds without moving anything.
pub(crate) fn rebuy_ticket(
    state: &mut LedgerState,
    env: &LedgerEnvironment,
    caller: AccountId,
    inventory_id: TicketId,
    ticket_id: TicketId,
) -> Result<LedgerEffects, LedgerError> {
    let info = state
        .ticket_info(inventory_id)
        .ok_or(LedgerError::InventoryNotFound(inventory_id))?;

    if info.tickets_sold < 1 {
        return Err(LedgerError::InsufficientSupply(inventory_id));
    }

    let markup = info
        .unit_price
        .checked_mul(state.reselling_fee_percentage())
        .ok_or(LedgerError::ArithmeticOverflow)?;
    let refund = info
        .unit_price
        .checked_add(markup)
        .ok_or(LedgerError::ArithmeticOverflow)?;

    let Some(record) = state.find_purchase(inventory_id, ticket_id) else {
        tracing::debug!(%inventory_id, %ticket_id, "no purchase record for ticket, nothing to rebuy");
        return Ok(SmallVec::new());
    };

    let previous_holder = record.buyer;
    let event = LedgerEvent::TicketResold {
        inventory_id,
        ticket_id,
        previous_holder,
        new_holder: caller,
    };
    apply_event(state, &event);

    let token = Effect::TransferToken {
        from: previous_holder,
        to: caller,
        id: ticket_id,
    };
    let payment = Effect::TransferValue {
        to: caller,
        amount: refund,
    };

    Ok(match env.settlement {
        SettlementOrder::CommitFirst => smallvec![token, payment, Effect::Emit(event)],
        SettlementOrder::TransferFirst => smallvec![payment, token, Effect::Emit(event)],
    })
}

pub(super) fn apply_resell_authorized(state: &mut LedgerState, event: &LedgerEvent) {
    let LedgerEvent::TicketResellAuthorized {
        inventory_id,
        holder,
        units,
    } = event
    else {
        return;
    };

    // Only the first of the holder's records absorbs the release
    if let Some(record) = state
        .purchases
        .get_mut(inventory_id)
        .and_then(|records| records.iter_mut().find(|record| record.buyer == *holder))
    {
        record.units_released_for_resale = record.units_released_for_resale.saturating_add(*units);
    }
}
