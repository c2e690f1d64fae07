//! Given-When-Then tests for the ledger reducer.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use ticket_ledger_core::reducer::Reducer;
use ticket_ledger_core::{
    AccountId, Amount, Call, Effect, LedgerAction, LedgerError, LedgerEvent, LedgerReducer, LedgerState,
    SettlementOrder, TicketId,
};
use ticket_ledger_testing::assertions::{
    assert_effects_count, assert_has_dispatch_effect, assert_no_effects, assert_no_value_transfer, emitted,
    value_transfers,
};
use ticket_ledger_testing::fixtures::{
    create_call, empty_ledger, environment, purchase_call, purchase_price, CREATION_FEE, PURCHASE_FEE,
};
use ticket_ledger_testing::{test_clock, ReducerTest};

const INVENTORY: TicketId = TicketId::new(0);

/// State after `creator` issued `total` tickets at 100 as inventory 0
fn with_inventory(owner: AccountId, creator: AccountId, total: u32) -> LedgerState {
    let mut state = empty_ledger(owner);
    LedgerReducer::new()
        .reduce(&mut state, create_call(creator, total, 100), &environment(SettlementOrder::CommitFirst))
        .expect("inventory creation");
    state
}

#[test]
fn create_ticket_allocates_first_id_and_pays_owner() {
    let owner = AccountId::new();
    let creator = AccountId::new();

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(empty_ledger(owner))
        .when_action(create_call(creator, 2, 100))
        .then_state(move |state| {
            let info = state.ticket_info(INVENTORY).expect("inventory 0");
            assert_eq!(info.total_tickets, 2);
            assert_eq!(info.tickets_sold, 0);
            assert_eq!(info.unit_price, Amount::new(100));
            assert_eq!(info.creator, creator);
            assert_eq!(info.start_time, test_clock_now());
            assert!(!info.sold_out);
            assert!(!info.resellable);
            assert_eq!(state.next_id, TicketId::new(1));
        })
        .then_effects(move |effects| {
            assert_eq!(value_transfers(effects), vec![(owner, CREATION_FEE)]);
            let events = emitted(effects);
            assert_eq!(events.len(), 1);
            assert!(matches!(
                events[0],
                LedgerEvent::TicketCreated { id, metadata_uri, .. }
                    if *id == INVENTORY && metadata_uri == "ipfs://event-metadata"
            ));
        })
        .run();
}

fn test_clock_now() -> chrono::DateTime<chrono::Utc> {
    use ticket_ledger_core::environment::Clock;
    test_clock().now()
}

#[test]
fn purchase_sells_out_inventory() {
    let owner = AccountId::new();
    let creator = AccountId::new();
    let buyer = AccountId::new();

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(with_inventory(owner, creator, 2))
        .when_action(purchase_call(buyer, INVENTORY, 2, purchase_price(100, 2)))
        .then_state(move |state| {
            let info = state.ticket_info(INVENTORY).expect("inventory 0");
            assert_eq!(info.tickets_sold, 2);
            assert!(info.sold_out);
            assert_eq!(state.user_tickets(&buyer), &[TicketId::new(1), TicketId::new(2)]);
            assert_eq!(state.purchase_info(INVENTORY).len(), 2);
        })
        .then_effects(move |effects| {
            assert_effects_count(effects, 8);
            assert_eq!(
                value_transfers(effects),
                vec![(creator, Amount::new(200)), (owner, PURCHASE_FEE)]
            );
            assert_eq!(emitted(effects).len(), 2);
        })
        .run();
}

#[test]
fn purchase_after_sell_out_is_rejected() {
    let owner = AccountId::new();
    let creator = AccountId::new();
    let mut state = with_inventory(owner, creator, 2);
    LedgerReducer::new()
        .reduce(
            &mut state,
            purchase_call(AccountId::new(), INVENTORY, 2, purchase_price(100, 2)),
            &environment(SettlementOrder::CommitFirst),
        )
        .expect("first purchase");
    let sold_out = state.clone();

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(state)
        .when_action(purchase_call(AccountId::new(), INVENTORY, 1, purchase_price(100, 1)))
        .then_state(move |state| assert_eq!(*state, sold_out))
        .then_error(|error| assert_eq!(*error, LedgerError::AlreadySoldOut(INVENTORY)))
        .run();
}

#[test]
fn transfer_first_purchase_dispatches_settlement() {
    let owner = AccountId::new();
    let creator = AccountId::new();
    let buyer = AccountId::new();
    let before = with_inventory(owner, creator, 2);
    let unchanged = before.clone();

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::TransferFirst))
        .given_state(before)
        .when_action(purchase_call(buyer, INVENTORY, 1, purchase_price(100, 1)))
        .then_state(move |state| assert_eq!(*state, unchanged))
        .then_effects(move |effects| {
            assert_eq!(
                value_transfers(effects),
                vec![(creator, Amount::new(100)), (owner, PURCHASE_FEE)]
            );
            assert_has_dispatch_effect(effects);
            assert!(emitted(effects).is_empty());
        })
        .run();
}

#[test]
fn resell_with_closed_window_is_rejected() {
    let owner = AccountId::new();
    let creator = AccountId::new();
    let buyer = AccountId::new();
    let mut state = with_inventory(owner, creator, 3);
    LedgerReducer::new()
        .reduce(
            &mut state,
            purchase_call(buyer, INVENTORY, 2, purchase_price(100, 2)),
            &environment(SettlementOrder::CommitFirst),
        )
        .expect("purchase");

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(state)
        .when_action(Call::unpaid(
            buyer,
            LedgerAction::ResellTicket {
                inventory_id: INVENTORY,
                units: 1,
            },
        ))
        .then_error(|error| assert_eq!(*error, LedgerError::ResaleWindowClosed(INVENTORY)))
        .run();
}

#[test]
fn resell_with_open_window_still_exceeds_holding() {
    // Purchases start fully released, so opening the window is not enough
    let owner = AccountId::new();
    let creator = AccountId::new();
    let buyer = AccountId::new();
    let mut state = with_inventory(owner, creator, 3);
    LedgerReducer::new()
        .reduce(
            &mut state,
            purchase_call(buyer, INVENTORY, 2, purchase_price(100, 2)),
            &environment(SettlementOrder::CommitFirst),
        )
        .expect("purchase");
    let info = state.tickets.get_mut(&INVENTORY).expect("inventory 0");
    info.hold_until = info.end_time;

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(state)
        .when_action(Call::unpaid(
            buyer,
            LedgerAction::ResellTicket {
                inventory_id: INVENTORY,
                units: 1,
            },
        ))
        .then_error(|error| {
            assert_eq!(
                *error,
                LedgerError::ReleaseExceedsHolding {
                    requested: 1,
                    released: 2,
                    held: 2
                }
            );
        })
        .run();
}

#[test]
fn rebuy_of_unknown_ticket_moves_nothing() {
    let owner = AccountId::new();
    let creator = AccountId::new();
    let mut state = with_inventory(owner, creator, 3);
    LedgerReducer::new()
        .reduce(
            &mut state,
            purchase_call(AccountId::new(), INVENTORY, 1, purchase_price(100, 1)),
            &environment(SettlementOrder::CommitFirst),
        )
        .expect("purchase");
    let unchanged = state.clone();

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(state)
        .when_action(Call::unpaid(
            AccountId::new(),
            LedgerAction::ReBuyTicket {
                inventory_id: INVENTORY,
                ticket_id: TicketId::new(42),
            },
        ))
        .then_state(move |state| assert_eq!(*state, unchanged))
        .then_effects(|effects| {
            assert_no_effects(effects);
            assert_no_value_transfer(effects);
        })
        .run();
}

#[test]
fn rebuy_before_any_sale_is_rejected() {
    let owner = AccountId::new();

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(with_inventory(owner, AccountId::new(), 3))
        .when_action(Call::unpaid(
            AccountId::new(),
            LedgerAction::ReBuyTicket {
                inventory_id: INVENTORY,
                ticket_id: TicketId::new(1),
            },
        ))
        .then_error(|error| assert_eq!(*error, LedgerError::InsufficientSupply(INVENTORY)))
        .run();
}

#[test]
fn only_owner_updates_fees() {
    let owner = AccountId::new();
    let intruder = AccountId::new();

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(empty_ledger(owner))
        .when_action(Call::unpaid(intruder, LedgerAction::UpdatePurchaseFee { fee: Amount::new(1) }))
        .then_state(|state| assert_eq!(state.purchase_fee(), PURCHASE_FEE))
        .then_error(move |error| assert_eq!(*error, LedgerError::Unauthorized(intruder)))
        .run();

    ReducerTest::new(LedgerReducer::new())
        .with_env(environment(SettlementOrder::CommitFirst))
        .given_state(empty_ledger(owner))
        .when_action(Call::unpaid(owner, LedgerAction::UpdateCreationFee { fee: Amount::new(50) }))
        .then_state(|state| assert_eq!(state.creation_fee(), Amount::new(50)))
        .then_effects(|effects| {
            assert_eq!(
                effects,
                &[Effect::Emit(LedgerEvent::CreationFeeUpdated {
                    previous: CREATION_FEE,
                    current: Amount::new(50),
                })]
            );
        })
        .run();
}

#[test]
fn new_creation_fee_applies_to_next_inventory() {
    let owner = AccountId::new();
    let mut state = empty_ledger(owner);
    let env = environment(SettlementOrder::CommitFirst);
    LedgerReducer::new()
        .reduce(
            &mut state,
            Call::unpaid(owner, LedgerAction::UpdateCreationFee { fee: Amount::new(50) }),
            &env,
        )
        .expect("fee update");

    let stale = LedgerReducer::new().reduce(&mut state, create_call(AccountId::new(), 1, 1), &env);
    assert_eq!(
        stale.err(),
        Some(LedgerError::FeeMismatch {
            expected: Amount::new(50),
            attached: CREATION_FEE,
        })
    );
}
