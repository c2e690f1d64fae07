//! Ticket catalog: inventory records and the shared id allocator.

use super::{apply_event, LedgerEffects, LedgerEnvironment};
use crate::action::LedgerEvent;
use crate::effect::Effect;
use crate::error::LedgerError;
use crate::state::LedgerState;
use crate::types::{AccountId, Amount, TicketId, TicketInfo};
use chrono::{DateTime, Utc};
use smallvec::smallvec;

/// Parameters of a `createTicket` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInventory {
    /// Metadata URI of the inventory token
    pub metadata_uri: String,
    /// Tickets to issue
    pub total_units: u32,
    /// Price of one ticket
    pub unit_price: Amount,
    /// Event end
    pub end_time: DateTime<Utc>,
}

/// Reserves `count` consecutive ids starting at the allocator's position.
///
/// Only checks that the sequence has room; the counter itself advances as the
/// resulting events are applied.
pub(crate) fn reserve_ids(state: &LedgerState, count: u32) -> Result<TicketId, LedgerError> {
    let first = state.next_id;
    first
        .value()
        .checked_add(u64::from(count))
        .ok_or(LedgerError::ArithmeticOverflow)?;
    Ok(first)
}

fn validate_create(
    now: DateTime<Utc>,
    required_fee: Amount,
    attached: Amount,
    request: &NewInventory,
) -> Result<(), LedgerError> {
    if request.total_units == 0 {
        return Err(LedgerError::InvalidQuantity);
    }
    if request.unit_price.is_zero() {
        return Err(LedgerError::InvalidPrice);
    }
    if request.end_time <= now {
        return Err(LedgerError::InvalidSchedule);
    }
    if attached != required_fee {
        return Err(LedgerError::FeeMismatch {
            expected: required_fee,
            attached,
        });
    }
    Ok(())
}

/// `createTicket`: issue a new inventory and mint its token to the creator
pub(crate) fn create_ticket(
    state: &mut LedgerState,
    env: &LedgerEnvironment,
    creator: AccountId,
    value: Amount,
    request: NewInventory,
) -> Result<LedgerEffects, LedgerError> {
    let now = env.clock.now();
    validate_create(now, state.creation_fee(), value, &request)?;
    let id = reserve_ids(state, 1)?;

    let event = LedgerEvent::TicketCreated {
        id,
        total_units: request.total_units,
        unit_price: request.unit_price,
        start_time: now,
        end_time: request.end_time,
        creator,
        metadata_uri: request.metadata_uri.clone(),
    };
    apply_event(state, &event);

    Ok(smallvec![
        Effect::MintToken { owner: creator, id },
        Effect::SetTokenMetadata {
            id,
            uri: request.metadata_uri,
        },
        Effect::Emit(event),
        Effect::TransferValue {
            to: state.owner,
            amount: value,
        },
    ])
}

pub(super) fn apply_ticket_created(state: &mut LedgerState, event: &LedgerEvent) {
    let LedgerEvent::TicketCreated {
        id,
        total_units,
        unit_price,
        start_time,
        end_time,
        creator,
        ..
    } = event
    else {
        return;
    };

    state.tickets.insert(
        *id,
        TicketInfo {
            id: *id,
            total_tickets: *total_units,
            tickets_sold: 0,
            unit_price: *unit_price,
            start_time: *start_time,
            end_time: *end_time,
            hold_until: DateTime::<Utc>::UNIX_EPOCH,
            creator: *creator,
            sold_out: false,
            resellable: false,
        },
    );
    advance_allocator(state, *id);
}

/// Moves the allocator past `used`
pub(super) fn advance_allocator(state: &mut LedgerState, used: TicketId) {
    if let Some(next) = used.next() {
        state.next_id = state.next_id.max(next);
    }
}

#[cfg(test)]
#[allow(clippy::panic)] // Tests fail loudly on an unexpected rejection
mod tests {
    use super::*;
    use crate::config::SettlementOrder;
    use crate::environment::Clock;
    use crate::reducer::Reducer;
    use crate::types::FeeSchedule;
    use crate::{Call, LedgerAction, LedgerReducer};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    struct StoppedClock(DateTime<Utc>);

    impl Clock for StoppedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_735_689_600, 0).single().unwrap_or_default()
    }

    fn env() -> LedgerEnvironment {
        LedgerEnvironment::new(Arc::new(StoppedClock(now())), SettlementOrder::CommitFirst)
    }

    fn state() -> LedgerState {
        LedgerState::new(AccountId::new(), FeeSchedule::new(Amount::new(10), Amount::new(5), 1))
    }

    fn create(total_units: u32, unit_price: u64, end_time: DateTime<Utc>, fee: u64) -> Call {
        Call::new(
            AccountId::new(),
            Amount::new(fee),
            LedgerAction::CreateTicket {
                metadata_uri: "ipfs://show".to_string(),
                total_units,
                unit_price: Amount::new(unit_price),
                end_time,
            },
        )
    }

    #[test]
    fn test_create_ticket_records_inventory() {
        let mut state = state();
        let call = create(2, 100, now() + Duration::days(1), 10);
        let creator = call.sender;

        let effects = LedgerReducer::new().reduce(&mut state, call, &env());

        assert!(effects.is_ok());
        let info = state.ticket_info(TicketId::new(0)).cloned();
        assert_eq!(
            info,
            Some(TicketInfo {
                id: TicketId::new(0),
                total_tickets: 2,
                tickets_sold: 0,
                unit_price: Amount::new(100),
                start_time: now(),
                end_time: now() + Duration::days(1),
                hold_until: DateTime::<Utc>::UNIX_EPOCH,
                creator,
                sold_out: false,
                resellable: false,
            })
        );
        assert_eq!(state.next_id, TicketId::new(1));
    }

    #[test]
    fn test_create_ticket_effects_pay_owner_last() {
        let mut state = state();
        let owner = state.owner;
        let call = create(3, 50, now() + Duration::hours(2), 10);
        let creator = call.sender;

        let Ok(effects) = LedgerReducer::new().reduce(&mut state, call, &env()) else {
            panic!("create should succeed");
        };

        assert_eq!(effects.len(), 4);
        assert_eq!(
            effects[0],
            Effect::MintToken {
                owner: creator,
                id: TicketId::new(0)
            }
        );
        assert_eq!(
            effects[1],
            Effect::SetTokenMetadata {
                id: TicketId::new(0),
                uri: "ipfs://show".to_string()
            }
        );
        assert!(matches!(effects[2], Effect::Emit(LedgerEvent::TicketCreated { .. })));
        assert_eq!(
            effects[3],
            Effect::TransferValue {
                to: owner,
                amount: Amount::new(10)
            }
        );
    }

    #[test]
    fn test_create_ticket_rejections_leave_state_untouched() {
        let cases = [
            (create(0, 100, now() + Duration::days(1), 10), LedgerError::InvalidQuantity),
            (create(2, 0, now() + Duration::days(1), 10), LedgerError::InvalidPrice),
            (create(2, 100, now(), 10), LedgerError::InvalidSchedule),
            (create(2, 100, now() - Duration::seconds(1), 10), LedgerError::InvalidSchedule),
            (
                create(2, 100, now() + Duration::days(1), 9),
                LedgerError::FeeMismatch {
                    expected: Amount::new(10),
                    attached: Amount::new(9),
                },
            ),
        ];

        for (call, expected) in cases {
            let mut state = state();
            let before = state.clone();
            let result = LedgerReducer::new().reduce(&mut state, call, &env());
            assert_eq!(result.err(), Some(expected));
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_ids_are_sequential_across_inventories() {
        let mut state = state();
        for _ in 0..3 {
            let call = create(1, 1, now() + Duration::days(1), 10);
            assert!(LedgerReducer::new().reduce(&mut state, call, &env()).is_ok());
        }

        let ids: Vec<TicketId> = state.tickets.keys().copied().collect();
        assert_eq!(ids, vec![TicketId::new(0), TicketId::new(1), TicketId::new(2)]);
        assert_eq!(state.next_id, TicketId::new(3));
    }

    #[test]
    fn test_exhausted_allocator_rejects() {
        let mut state = state();
        state.next_id = TicketId::new(u64::MAX);

        let call = create(1, 1, now() + Duration::days(1), 10);
        let result = LedgerReducer::new().reduce(&mut state, call, &env());

        assert_eq!(result.err(), Some(LedgerError::ArithmeticOverflow));
        assert!(state.tickets.is_empty());
    }
}
