//! Thread-safe handle for submitting calls from many tasks.

use crate::hooks::ValueReceiver;
use crate::ledger::{Ledger, Receipt};
use std::sync::Arc;
use ticket_ledger_core::environment::{PaymentGateway, TokenRegistry};
use ticket_ledger_core::{AccountId, Call, LedgerError, LedgerState};
use tokio::sync::Mutex;

/// A [`Ledger`] shared between tasks.
///
/// Calls are serialized: each runs to completion before the next starts, so
/// concurrent buyers observe each other's purchases.
///
/// # Example
///
/// ```ignore
/// let shared = SharedLedger::new(ledger);
///
/// let receipt = shared.submit(call).await?;
/// let sold = shared.state(|s| s.ticket_info(inventory).map(|t| t.tickets_sold)).await;
/// ```
pub struct SharedLedger<T, P> {
    inner: Arc<Mutex<Ledger<T, P>>>,
}

impl<T, P> SharedLedger<T, P>
where
    T: TokenRegistry + Clone,
    P: PaymentGateway + Clone,
{
    /// Wrap `ledger` for shared use
    #[must_use]
    pub fn new(ledger: Ledger<T, P>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Submit a call once every earlier call has finished
    ///
    /// # Errors
    ///
    /// Returns the [`LedgerError`] that aborted the call; see [`Ledger::submit`].
    #[tracing::instrument(skip(self, call), name = "shared_ledger_submit")]
    pub async fn submit(&self, call: Call) -> Result<Receipt, LedgerError> {
        let mut ledger = self.inner.lock().await;
        ledger.submit(call)
    }

    /// Read contract state
    ///
    /// # Arguments
    ///
    /// - `f`: Closure that receives a reference to state and returns a value
    pub async fn state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&LedgerState) -> R,
    {
        let ledger = self.inner.lock().await;
        f(ledger.state())
    }

    /// Read anything the ledger exposes: state, registry, balances, event log
    pub async fn inspect<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Ledger<T, P>) -> R,
    {
        let ledger = self.inner.lock().await;
        f(&ledger)
    }

    /// Register the code that runs when `account` is paid
    pub async fn register_receiver(&self, account: AccountId, receiver: impl ValueReceiver + 'static) {
        self.inner.lock().await.register_receiver(account, receiver);
    }

    /// Give back the ledger once every other handle is gone
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged while other clones are still alive.
    pub fn try_unwrap(self) -> Result<Ledger<T, P>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<T, P> Clone for SharedLedger<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, P> std::fmt::Debug for SharedLedger<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLedger")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}
