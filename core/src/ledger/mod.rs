//! The ticket ledger reducer.
//!
//! One reducer handles every command; the logic is split by component:
//!
//! - [`catalog`]: inventory creation and the shared id allocator
//! - [`purchases`]: purchase accounting and settlement
//! - [`resale`]: resale authorization and resale execution
//! - [`fees`]: owner-gated fee administration
//!
//! Each command is validated completely before state is touched. Accepted
//! commands are turned into [`LedgerEvent`]s, applied to state through
//! [`apply_event`], and returned as [`Effect::Emit`] alongside the token and
//! value movements the runtime must perform.

use crate::action::{Call, LedgerAction, LedgerEvent};
use crate::config::SettlementOrder;
use crate::effect::Effect;
use crate::environment::Clock;
use crate::error::LedgerError;
use crate::reducer::Reducer;
use crate::state::LedgerState;
use crate::types::{AccountId, Amount, FeeSchedule};
use smallvec::SmallVec;
use std::sync::Arc;

pub mod catalog;
pub mod fees;
pub mod purchases;
pub mod resale;

/// Hard cap on units bought in a single purchase
pub const MAX_UNITS_PER_PURCHASE: u32 = 2;

/// Effects returned by the ledger reducer
pub type LedgerEffects = SmallVec<[Effect<Call>; 4]>;

/// Environment dependencies for the ledger reducer
#[derive(Clone)]
pub struct LedgerEnvironment {
    /// Ledger time
    pub clock: Arc<dyn Clock>,
    /// Order of payouts relative to recording a purchase
    pub settlement: SettlementOrder,
}

impl LedgerEnvironment {
    /// Creates a new `LedgerEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, settlement: SettlementOrder) -> Self {
        Self { clock, settlement }
    }
}

impl std::fmt::Debug for LedgerEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEnvironment")
            .field("settlement", &self.settlement)
            .finish_non_exhaustive()
    }
}

/// Reducer for the ticket ledger
#[derive(Clone, Copy, Debug, Default)]
pub struct LedgerReducer;

impl LedgerReducer {
    /// Creates a new `LedgerReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Rebuilds contract state from an emitted event log
    #[must_use]
    pub fn replay<'a>(
        owner: AccountId,
        fees: FeeSchedule,
        events: impl IntoIterator<Item = &'a LedgerEvent>,
    ) -> LedgerState {
        let mut state = LedgerState::new(owner, fees);
        for event in events {
            apply_event(&mut state, event);
        }
        state
    }
}

impl Reducer for LedgerReducer {
    type State = LedgerState;
    type Action = Call;
    type Environment = LedgerEnvironment;
    type Error = LedgerError;

    fn reduce(
        &self,
        state: &mut Self::State,
        call: Self::Action,
        env: &Self::Environment,
    ) -> Result<LedgerEffects, Self::Error> {
        let Call {
            sender,
            value,
            action,
        } = call;

        match action {
            LedgerAction::CreateTicket {
                metadata_uri,
                total_units,
                unit_price,
                end_time,
            } => catalog::create_ticket(
                state,
                env,
                sender,
                value,
                catalog::NewInventory {
                    metadata_uri,
                    total_units,
                    unit_price,
                    end_time,
                },
            ),

            LedgerAction::PurchaseTicket {
                inventory_id,
                units,
            } => purchases::purchase_ticket(state, env, sender, value, inventory_id, units),

            LedgerAction::SettlePurchase {
                inventory_id,
                units,
            } => purchases::settle_purchase(state, env, sender, inventory_id, units),

            LedgerAction::ResellTicket {
                inventory_id,
                units,
            } => {
                require_no_value(value)?;
                resale::resell_ticket(state, sender, inventory_id, units)
            }

            LedgerAction::ReBuyTicket {
                inventory_id,
                ticket_id,
            } => {
                require_no_value(value)?;
                resale::rebuy_ticket(state, env, sender, inventory_id, ticket_id)
            }

            LedgerAction::UpdateCreationFee { fee } => {
                require_no_value(value)?;
                fees::update_creation_fee(state, sender, fee)
            }

            LedgerAction::UpdatePurchaseFee { fee } => {
                require_no_value(value)?;
                fees::update_purchase_fee(state, sender, fee)
            }
        }
    }
}

/// Applies an accepted event to state.
///
/// Used both by the reducer after validation and to replay an event log.
pub fn apply_event(state: &mut LedgerState, event: &LedgerEvent) {
    match event {
        LedgerEvent::TicketCreated { .. } => catalog::apply_ticket_created(state, event),
        LedgerEvent::TicketPurchased { .. } => purchases::apply_ticket_purchased(state, event),
        LedgerEvent::TicketResellAuthorized { .. } => resale::apply_resell_authorized(state, event),
        LedgerEvent::CreationFeeUpdated { .. } | LedgerEvent::PurchaseFeeUpdated { .. } => {
            fees::apply_fee_updated(state, event);
        }
        // Ownership lives in the token registry
        LedgerEvent::TicketResold { .. } => {}
    }
}

/// Operations that take no payment reject attached value
const fn require_no_value(value: Amount) -> Result<(), LedgerError> {
    if value.is_zero() {
        Ok(())
    } else {
        Err(LedgerError::FeeMismatch {
            expected: Amount::ZERO,
            attached: value,
        })
    }
}
