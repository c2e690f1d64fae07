//! In-memory collaborators for ledger tests
//!
//! - [`InMemoryTokenRegistry`]: `HashMap`-backed token ownership and metadata
//! - [`InMemoryBank`]: `HashMap`-backed balances with a designated contract account
//!
//! Both are plain values: cloning one yields an independent copy, which is
//! what the runtime's per-call snapshots rely on.

use std::collections::{BTreeMap, HashMap};
use ticket_ledger_core::environment::{PaymentGateway, TokenRegistry};
use ticket_ledger_core::{AccountId, Amount, PaymentError, RegistryError, TicketId};

/// In-memory token registry for fast, deterministic testing.
///
/// # Example
///
/// ```
/// use ticket_ledger_testing::InMemoryTokenRegistry;
/// use ticket_ledger_core::environment::TokenRegistry;
/// use ticket_ledger_core::{AccountId, TicketId};
///
/// let alice = AccountId::new();
/// let mut registry = InMemoryTokenRegistry::new();
/// registry.mint(&alice, TicketId::new(0))?;
/// registry.set_metadata(TicketId::new(0), "ipfs://show".to_string())?;
///
/// assert_eq!(registry.owner_of(TicketId::new(0)), Some(alice));
/// assert_eq!(registry.metadata(TicketId::new(0)).as_deref(), Some("ipfs://show"));
/// # Ok::<(), ticket_ledger_core::RegistryError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryTokenRegistry {
    owners: BTreeMap<TicketId, AccountId>,
    metadata: HashMap<TicketId, String>,
}

impl InMemoryTokenRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of minted tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether nothing has been minted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Tokens currently held by `account`, in id order
    #[must_use]
    pub fn tokens_of(&self, account: &AccountId) -> Vec<TicketId> {
        self.owners
            .iter()
            .filter(|(_, owner)| *owner == account)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl TokenRegistry for InMemoryTokenRegistry {
    fn mint(&mut self, owner: &AccountId, id: TicketId) -> Result<(), RegistryError> {
        if self.owners.contains_key(&id) {
            return Err(RegistryError::AlreadyMinted(id));
        }
        self.owners.insert(id, *owner);
        Ok(())
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, id: TicketId) -> Result<(), RegistryError> {
        let holder = self.owners.get_mut(&id).ok_or(RegistryError::UnknownToken(id))?;
        if holder != from {
            return Err(RegistryError::NotHolder {
                id,
                holder: *holder,
                claimed: *from,
            });
        }
        *holder = *to;
        Ok(())
    }

    fn set_metadata(&mut self, id: TicketId, uri: String) -> Result<(), RegistryError> {
        if !self.owners.contains_key(&id) {
            return Err(RegistryError::UnknownToken(id));
        }
        self.metadata.insert(id, uri);
        Ok(())
    }

    fn metadata(&self, id: TicketId) -> Option<String> {
        self.metadata.get(&id).cloned()
    }

    fn owner_of(&self, id: TicketId) -> Option<AccountId> {
        self.owners.get(&id).copied()
    }
}

/// In-memory balances for the contract account and everyone it deals with.
///
/// Accounts without an entry have a zero balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InMemoryBank {
    contract: AccountId,
    balances: HashMap<AccountId, Amount>,
    refusing: HashMap<AccountId, String>,
}

impl InMemoryBank {
    /// Create a bank in which `contract` is the ledger's own account
    #[must_use]
    pub fn new(contract: AccountId) -> Self {
        Self {
            contract,
            balances: HashMap::new(),
            refusing: HashMap::new(),
        }
    }

    /// Builder form of [`credit`](Self::credit)
    #[must_use]
    pub fn with_balance(mut self, account: AccountId, amount: Amount) -> Self {
        self.credit(account, amount);
        self
    }

    /// Add `amount` to `account`, saturating at the maximum balance
    pub fn credit(&mut self, account: AccountId, amount: Amount) {
        let balance = self.balances.entry(account).or_insert(Amount::ZERO);
        *balance = balance.checked_add(amount).unwrap_or(Amount::new(u64::MAX));
    }

    /// Make every payout to `account` fail with [`PaymentError::Rejected`]
    pub fn refuse_payments_to(&mut self, account: AccountId, reason: impl Into<String>) {
        self.refusing.insert(account, reason.into());
    }

    /// The ledger's own account
    #[must_use]
    pub const fn contract_account(&self) -> AccountId {
        self.contract
    }

    /// Sum of every balance; unchanged by any transfer
    #[must_use]
    pub fn total(&self) -> u128 {
        self.balances.values().map(|amount| u128::from(amount.units())).sum()
    }

    fn move_value(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), PaymentError> {
        let balance = self.balance_of(&from);
        let debited = balance
            .checked_sub(amount)
            .ok_or(PaymentError::InsufficientFunds {
                account: from,
                balance,
                required: amount,
            })?;
        let credited = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(PaymentError::Overflow(to))?;

        self.balances.insert(from, debited);
        // `from == to` nets out to the original balance
        let credited = if from == to { balance } else { credited };
        self.balances.insert(to, credited);
        Ok(())
    }
}

impl PaymentGateway for InMemoryBank {
    fn receive_value(&mut self, from: &AccountId, amount: Amount) -> Result<(), PaymentError> {
        self.move_value(*from, self.contract, amount)
    }

    fn transfer_value(&mut self, to: &AccountId, amount: Amount) -> Result<(), PaymentError> {
        if let Some(reason) = self.refusing.get(to) {
            return Err(PaymentError::Rejected {
                account: *to,
                reason: reason.clone(),
            });
        }
        self.move_value(self.contract, *to, amount)
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }
}
