//! Owner-gated fee administration.

use super::{apply_event, LedgerEffects};
use crate::action::LedgerEvent;
use crate::effect::Effect;
use crate::error::LedgerError;
use crate::state::LedgerState;
use crate::types::{AccountId, Amount};
use smallvec::smallvec;

fn require_owner(state: &LedgerState, sender: &AccountId) -> Result<(), LedgerError> {
    if state.is_owner(sender) {
        Ok(())
    } else {
        Err(LedgerError::Unauthorized(*sender))
    }
}

/// `updateCreationFeePercentage`
pub(crate) fn update_creation_fee(
    state: &mut LedgerState,
    sender: AccountId,
    fee: Amount,
) -> Result<LedgerEffects, LedgerError> {
    require_owner(state, &sender)?;

    let event = LedgerEvent::CreationFeeUpdated {
        previous: state.creation_fee(),
        current: fee,
    };
    apply_event(state, &event);
    Ok(smallvec![Effect::Emit(event)])
}

/// `updatePurchaseFeePercentage`
pub(crate) fn update_purchase_fee(
    state: &mut LedgerState,
    sender: AccountId,
    fee: Amount,
) -> Result<LedgerEffects, LedgerError> {
    require_owner(state, &sender)?;

    let event = LedgerEvent::PurchaseFeeUpdated {
        previous: state.purchase_fee(),
        current: fee,
    };
    apply_event(state, &event);
    Ok(smallvec![Effect::Emit(event)])
}

pub(super) fn apply_fee_updated(state: &mut LedgerState, event: &LedgerEvent) {
    match event {
        LedgerEvent::CreationFeeUpdated { current, .. } => state.fees.creation_fee = *current,
        LedgerEvent::PurchaseFeeUpdated { current, .. } => state.fees.purchase_fee = *current,
        _ => {}
    }
}
