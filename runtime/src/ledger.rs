//! The ledger runtime: executes calls atomically against the collaborators.

use crate::hooks::{Contract, ValueReceiver};
use crate::metrics::LedgerMetrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use ticket_ledger_core::environment::{Clock, PaymentGateway, TokenRegistry};
use ticket_ledger_core::reducer::Reducer;
use ticket_ledger_core::{
    effect::Effect, AccountId, Amount, Call, LedgerConfig, LedgerEnvironment, LedgerError, LedgerEvent,
    LedgerReducer, LedgerState, PurchaseInfo, TicketId, TicketInfo,
};

/// Records emitted by one call, nested calls included, in emission order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    /// Emitted records
    pub events: Vec<LedgerEvent>,
}

impl Receipt {
    /// Id of the inventory a `createTicket` call issued
    #[must_use]
    pub fn created_inventory(&self) -> Option<TicketId> {
        self.events.iter().find_map(|event| match event {
            LedgerEvent::TicketCreated { id, .. } => Some(*id),
            _ => None,
        })
    }

    /// Ids of the individual tickets sold during the call
    #[must_use]
    pub fn purchased_tickets(&self) -> Vec<TicketId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                LedgerEvent::TicketPurchased { ticket_id, .. } => Some(*ticket_id),
                _ => None,
            })
            .collect()
    }

    /// Whether the call emitted nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Everything a failed call must roll back
struct Snapshot<T, P> {
    state: LedgerState,
    registry: T,
    bank: P,
    log_len: usize,
    paid_out: u64,
}

/// The ticket ledger: contract state plus the token registry and payment
/// gateway it drives.
///
/// Every [`submit`](Self::submit) runs to completion as one atomic step. State,
/// token ownership and balances are snapshotted first and restored if the
/// call, or anything it triggers, fails.
///
/// A snapshot is a full clone, taken again for every nested call, so each
/// call costs O(state + registry + bank) on top of its own work.
///
/// Payouts invoke the [`ValueReceiver`] registered for the recipient, if any.
/// The receiver may call back into the ledger while the payout is in
/// progress; it is not invoked again for payouts made during its own
/// callback.
pub struct Ledger<T, P> {
    state: LedgerState,
    reducer: LedgerReducer,
    environment: LedgerEnvironment,
    registry: T,
    bank: P,
    receivers: HashMap<AccountId, Box<dyn ValueReceiver>>,
    log: Vec<LedgerEvent>,
    depth: usize,
    paid_out: u64,
}

impl<T, P> Ledger<T, P>
where
    T: TokenRegistry + Clone,
    P: PaymentGateway + Clone,
{
    /// Create a ledger over existing contract state
    #[must_use]
    pub fn new(state: LedgerState, environment: LedgerEnvironment, registry: T, bank: P) -> Self {
        Self {
            state,
            reducer: LedgerReducer::new(),
            environment,
            registry,
            bank,
            receivers: HashMap::new(),
            log: Vec::new(),
            depth: 0,
            paid_out: 0,
        }
    }

    /// Create an empty ledger from configuration
    #[must_use]
    pub fn from_config(
        owner: AccountId,
        config: &LedgerConfig,
        clock: Arc<dyn Clock>,
        registry: T,
        bank: P,
    ) -> Self {
        Self::new(
            LedgerState::new(owner, config.fee_schedule()),
            LedgerEnvironment::new(clock, config.settlement),
            registry,
            bank,
        )
    }

    /// Register the code that runs when `account` is paid
    pub fn register_receiver(&mut self, account: AccountId, receiver: impl ValueReceiver + 'static) {
        self.receivers.insert(account, Box::new(receiver));
    }

    /// Remove `account`'s receiver; returns whether one was registered
    pub fn remove_receiver(&mut self, account: &AccountId) -> bool {
        self.receivers.remove(account).is_some()
    }

    /// Execute one call atomically.
    ///
    /// # Errors
    ///
    /// Returns the [`LedgerError`] that aborted the call. Nothing the call did
    /// survives: contract state, token ownership, balances and the event log
    /// are exactly as they were before it.
    #[tracing::instrument(
        skip(self, call),
        fields(action = call.action.name(), sender = %call.sender, value = %call.value, depth = self.depth)
    )]
    pub fn submit(&mut self, call: Call) -> Result<Receipt, LedgerError> {
        let action = call.action.name();
        let started = Instant::now();
        if call.action.is_internal() {
            tracing::warn!("rejected internal action submitted from outside");
            LedgerMetrics::record_call(action, started.elapsed());
            LedgerMetrics::record_revert(action, &LedgerError::InternalAction);
            return Err(LedgerError::InternalAction);
        }

        let snapshot = self.snapshot();
        self.depth += 1;
        let outcome = self.execute(call);
        self.depth -= 1;

        match outcome {
            Ok(()) => {
                let receipt = Receipt {
                    events: self.log[snapshot.log_len..].to_vec(),
                };
                if self.depth == 0 {
                    LedgerMetrics::record_commit(&receipt.events, self.paid_out);
                    self.paid_out = 0;
                }
                LedgerMetrics::record_call(action, started.elapsed());
                tracing::info!(events = receipt.events.len(), "call committed");
                Ok(receipt)
            }
            Err(error) => {
                self.restore(snapshot);
                LedgerMetrics::record_call(action, started.elapsed());
                LedgerMetrics::record_revert(action, &error);
                tracing::warn!(%error, "call reverted");
                Err(error)
            }
        }
    }

    // TODO: replace the clone with an undo journal once `TokenRegistry` can
    // burn and `PaymentGateway` can refund, so nested calls stop copying history.
    fn snapshot(&self) -> Snapshot<T, P> {
        Snapshot {
            state: self.state.clone(),
            registry: self.registry.clone(),
            bank: self.bank.clone(),
            log_len: self.log.len(),
            paid_out: self.paid_out,
        }
    }

    fn restore(&mut self, snapshot: Snapshot<T, P>) {
        self.state = snapshot.state;
        self.registry = snapshot.registry;
        self.bank = snapshot.bank;
        self.log.truncate(snapshot.log_len);
        self.paid_out = snapshot.paid_out;
    }

    fn execute(&mut self, call: Call) -> Result<(), LedgerError> {
        self.bank.receive_value(&call.sender, call.value)?;
        self.run(call)
    }

    fn run(&mut self, call: Call) -> Result<(), LedgerError> {
        let effects = self.reducer.reduce(&mut self.state, call, &self.environment)?;
        for effect in effects {
            self.perform(effect)?;
        }
        Ok(())
    }

    fn perform(&mut self, effect: Effect<Call>) -> Result<(), LedgerError> {
        match effect {
            Effect::None => {}
            Effect::MintToken { owner, id } => {
                tracing::debug!(%owner, %id, "minting token");
                self.registry.mint(&owner, id)?;
            }
            Effect::SetTokenMetadata { id, uri } => {
                self.registry.set_metadata(id, uri)?;
            }
            Effect::CopyTokenMetadata { source, target } => {
                let uri = self.registry.metadata(source).unwrap_or_default();
                self.registry.set_metadata(target, uri)?;
            }
            Effect::TransferToken { from, to, id } => {
                tracing::debug!(%from, %to, %id, "transferring token");
                self.registry.transfer(&from, &to, id)?;
            }
            Effect::TransferValue { to, amount } => self.pay(to, amount)?,
            Effect::Emit(event) => {
                tracing::debug!(event_type = event.event_type(), "emitting record");
                self.log.push(event);
            }
            Effect::Dispatch(call) => {
                tracing::debug!(action = call.action.name(), "dispatching follow-up action");
                self.run(*call)?;
            }
        }
        Ok(())
    }

    fn pay(&mut self, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        tracing::debug!(%to, %amount, "paying out");
        self.bank.transfer_value(&to, amount)?;
        self.paid_out = self.paid_out.saturating_add(amount.units());

        // Taken out of the map for the duration of the callback
        if let Some(mut receiver) = self.receivers.remove(&to) {
            let outcome = receiver.on_value_received(self, amount);
            self.receivers.entry(to).or_insert(receiver);
            outcome?;
        }
        Ok(())
    }

    /// Contract state
    #[must_use]
    pub const fn state(&self) -> &LedgerState {
        &self.state
    }

    /// `getTicketInfo`
    #[must_use]
    pub fn ticket_info(&self, inventory_id: TicketId) -> Option<&TicketInfo> {
        self.state.ticket_info(inventory_id)
    }

    /// `getPurchaseInfo`
    #[must_use]
    pub fn purchase_info(&self, inventory_id: TicketId) -> &[PurchaseInfo] {
        self.state.purchase_info(inventory_id)
    }

    /// `getUserTickets`
    #[must_use]
    pub fn user_tickets(&self, account: &AccountId) -> &[TicketId] {
        self.state.user_tickets(account)
    }

    /// `getCreationFeePercentage`
    #[must_use]
    pub const fn creation_fee(&self) -> Amount {
        self.state.creation_fee()
    }

    /// `getPurchaseFeePercentage`
    #[must_use]
    pub const fn purchase_fee(&self) -> Amount {
        self.state.purchase_fee()
    }

    /// Reselling multiplier
    #[must_use]
    pub const fn reselling_fee_percentage(&self) -> u64 {
        self.state.reselling_fee_percentage()
    }

    /// Token registry
    #[must_use]
    pub const fn registry(&self) -> &T {
        &self.registry
    }

    /// Payment gateway
    #[must_use]
    pub const fn bank(&self) -> &P {
        &self.bank
    }

    /// Mutable access to the payment gateway, for funding accounts
    pub fn bank_mut(&mut self) -> &mut P {
        &mut self.bank
    }

    /// Every record committed so far, in emission order
    #[must_use]
    pub fn events(&self) -> &[LedgerEvent] {
        &self.log
    }
}

impl<T, P> Contract for Ledger<T, P>
where
    T: TokenRegistry + Clone,
    P: PaymentGateway + Clone,
{
    fn call(&mut self, call: Call) -> Result<Receipt, LedgerError> {
        self.submit(call)
    }

    fn state(&self) -> &LedgerState {
        &self.state
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.bank.balance_of(account)
    }
}

impl<T, P> std::fmt::Debug for Ledger<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("owner", &self.state.owner)
            .field("inventories", &self.state.tickets.len())
            .field("events", &self.log.len())
            .field("receivers", &self.receivers.len())
            .finish_non_exhaustive()
    }
}
