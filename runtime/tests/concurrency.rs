//! Many tasks buying from one shared ledger.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use ticket_ledger_core::environment::PaymentGateway;
use ticket_ledger_core::{AccountId, Amount, LedgerConfig, LedgerError, TicketId};
use ticket_ledger_runtime::{Ledger, SharedLedger};
use ticket_ledger_testing::fixtures::{create_call, purchase_call, purchase_price};
use ticket_ledger_testing::{test_clock, InMemoryBank, InMemoryTokenRegistry};

const INVENTORY: TicketId = TicketId::new(0);

fn shared_with_buyers(total: u32, buyers: usize) -> (SharedLedger<InMemoryTokenRegistry, InMemoryBank>, Vec<AccountId>) {
    let creator = AccountId::new();
    let accounts: Vec<AccountId> = (0..buyers).map(|_| AccountId::new()).collect();
    let mut bank = InMemoryBank::new(AccountId::new()).with_balance(creator, Amount::new(10));
    for account in &accounts {
        bank.credit(*account, Amount::new(1_000));
    }
    let mut ledger = Ledger::from_config(
        AccountId::new(),
        &LedgerConfig::default(),
        Arc::new(test_clock()),
        InMemoryTokenRegistry::new(),
        bank,
    );
    ledger.submit(create_call(creator, total, 100)).unwrap();
    (SharedLedger::new(ledger), accounts)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_buyers_never_oversell() {
    let (ledger, buyers) = shared_with_buyers(10, 20);

    let handles: Vec<_> = buyers
        .iter()
        .copied()
        .map(|buyer| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .submit(purchase_call(buyer, INVENTORY, 1, purchase_price(100, 1)))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => {
                assert_eq!(receipt.purchased_tickets().len(), 1);
                accepted += 1;
            }
            Err(error) => {
                assert_eq!(error, LedgerError::AlreadySoldOut(INVENTORY));
                rejected += 1;
            }
        }
    }

    assert_eq!(accepted, 10);
    assert_eq!(rejected, 10);
    let (sold, sold_out) = ledger
        .state(|s| {
            let info = s.ticket_info(INVENTORY).unwrap();
            (info.tickets_sold, info.sold_out)
        })
        .await;
    assert_eq!(sold, 10);
    assert!(sold_out);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ticket_ids_stay_unique_under_contention() {
    let (ledger, buyers) = shared_with_buyers(40, 16);

    let handles: Vec<_> = buyers
        .iter()
        .copied()
        .map(|buyer| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .submit(purchase_call(buyer, INVENTORY, 2, purchase_price(100, 2)))
                    .await
            })
        })
        .collect();

    let mut tickets = Vec::new();
    for handle in handles {
        tickets.extend(handle.await.unwrap().unwrap().purchased_tickets());
    }
    tickets.sort();
    let expected: Vec<TicketId> = (1..=32).map(TicketId::new).collect();
    assert_eq!(tickets, expected);

    let ledger = ledger.try_unwrap().unwrap();
    for buyer in &buyers {
        assert_eq!(ledger.user_tickets(buyer).len(), 2);
        assert_eq!(ledger.bank().balance_of(buyer), Amount::new(795));
    }
}

#[tokio::test]
async fn try_unwrap_waits_for_last_handle() {
    let (ledger, _) = shared_with_buyers(1, 0);
    let other = ledger.clone();

    let ledger = ledger.try_unwrap().unwrap_err();
    drop(other);

    let inner = ledger.try_unwrap().unwrap();
    assert_eq!(inner.state().tickets.len(), 1);
}
