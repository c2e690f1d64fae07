//! Command-line walkthrough of the ticket ledger.
//!
//! Issues an inventory, sells it out to concurrent buyers, shows the
//! rejected follow-up calls and prints the resulting metrics.
//!
//! Configuration comes from `LEDGER_*` environment variables and `RUST_LOG`.

use chrono::Duration;
use std::sync::Arc;
use ticket_ledger_core::environment::{Clock, PaymentGateway, SystemClock};
use ticket_ledger_core::{AccountId, Amount, Call, LedgerAction, LedgerConfig, TicketId};
use ticket_ledger_runtime::metrics::MetricsExporter;
use ticket_ledger_runtime::{Ledger, SharedLedger, telemetry};
use ticket_ledger_testing::{InMemoryBank, InMemoryTokenRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LedgerConfig::from_env()?;
    telemetry::init_tracing(&config.log_filter);
    let mut exporter = MetricsExporter::new();
    exporter.install()?;

    println!("=== Ticket Ledger ===\n");
    println!("Settlement order: {}", config.settlement);

    let owner = AccountId::new();
    let creator = AccountId::new();
    let buyers: Vec<AccountId> = (0..4).map(|_| AccountId::new()).collect();

    let fees = config.fee_schedule();
    let mut bank = InMemoryBank::new(AccountId::new()).with_balance(creator, fees.creation_fee);
    for buyer in &buyers {
        bank.credit(*buyer, Amount::new(1_000));
    }

    let clock = Arc::new(SystemClock);
    let end_time = clock.now() + Duration::days(30);
    let ledger = SharedLedger::new(Ledger::from_config(
        owner,
        &config,
        clock,
        InMemoryTokenRegistry::new(),
        bank,
    ));

    // 1. Issue an inventory of three tickets
    let receipt = ledger
        .submit(Call::new(
            creator,
            fees.creation_fee,
            LedgerAction::CreateTicket {
                metadata_uri: "ipfs://open-air-festival".to_string(),
                total_units: 3,
                unit_price: Amount::new(100),
                end_time,
            },
        ))
        .await?;
    let inventory = receipt.created_inventory().ok_or("createTicket emitted no TicketCreated")?;
    println!("Created inventory {inventory} (3 tickets at 100)");

    // 2. Four buyers race for two tickets each
    let price = Amount::new(200)
        .checked_add(fees.purchase_fee)
        .ok_or("purchase price overflow")?;
    let mut tasks = Vec::new();
    for buyer in buyers.iter().copied() {
        let ledger = ledger.clone();
        tasks.push(tokio::spawn(async move {
            let outcome = ledger
                .submit(Call::new(
                    buyer,
                    price,
                    LedgerAction::PurchaseTicket {
                        inventory_id: inventory,
                        units: 2,
                    },
                ))
                .await;
            (buyer, outcome)
        }));
    }
    for task in tasks {
        let (buyer, outcome) = task.await?;
        match outcome {
            Ok(receipt) => println!("  {buyer} bought {:?}", receipt.purchased_tickets()),
            Err(error) => println!("  {buyer} rejected: {error}"),
        }
    }

    // 3. One more ticket, then the inventory is gone
    let last = ledger
        .submit(Call::new(
            buyers[0],
            Amount::new(100).checked_add(fees.purchase_fee).ok_or("overflow")?,
            LedgerAction::PurchaseTicket {
                inventory_id: inventory,
                units: 1,
            },
        ))
        .await;
    println!("Single-ticket purchase: {}", describe(&last));

    let again = ledger
        .submit(Call::new(
            buyers[1],
            Amount::new(100).checked_add(fees.purchase_fee).ok_or("overflow")?,
            LedgerAction::PurchaseTicket {
                inventory_id: inventory,
                units: 1,
            },
        ))
        .await;
    println!("After sell-out:         {}", describe(&again));

    // 4. Resale stays closed for inventories issued through createTicket
    let resale = ledger
        .submit(Call::unpaid(
            buyers[0],
            LedgerAction::ResellTicket {
                inventory_id: inventory,
                units: 1,
            },
        ))
        .await;
    println!("Resale authorization:   {}", describe(&resale));

    // 5. Final state
    let (sold, total) = ledger
        .state(|s| {
            s.ticket_info(inventory)
                .map_or((0, 0), |info| (info.tickets_sold, info.total_tickets))
        })
        .await;
    println!("\nSold {sold} of {total}");
    ledger
        .inspect(|l| {
            println!("Owner balance:   {}", l.bank().balance_of(&owner));
            println!("Creator balance: {}", l.bank().balance_of(&creator));
            for buyer in &buyers {
                let tickets: Vec<TicketId> = l.user_tickets(buyer).to_vec();
                println!("  {buyer} holds purchase history {tickets:?}");
            }
        })
        .await;

    if let Some(rendered) = exporter.render() {
        println!("\n--- metrics ---\n{rendered}");
    }

    tracing::info!("demo finished");
    Ok(())
}

fn describe<T>(outcome: &Result<T, ticket_ledger_core::LedgerError>) -> String {
    match outcome {
        Ok(_) => "accepted".to_string(),
        Err(error) => format!("rejected ({error})"),
    }
}
