//! Request-scoped lookups.
//!
//! A [`ReportContext`] wraps a [`LedgerSource`] and memoizes the reference
//! data every component asks for (accounts, currencies, collections,
//! modifiers and their atoms). One context serves one report or one
//! validation, then is dropped; it is never shared between threads.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use num_rational::BigRational;
use uuid::Uuid;

use crate::{
    Account, AccountKind, Currency, EngineError, EngineSettings, LedgerSource, Modifier,
    ModifierAtom, ResultEngine,
};

pub struct ReportContext<'s> {
    source: &'s dyn LedgerSource,
    settings: EngineSettings,
    accounts: RefCell<HashMap<Uuid, Account>>,
    currencies: RefCell<HashMap<Uuid, Currency>>,
    collections: RefCell<HashMap<Uuid, Option<Vec<Uuid>>>>,
    modifiers: RefCell<HashMap<Uuid, Modifier>>,
    modifier_atoms: RefCell<HashMap<Uuid, Vec<ModifierAtom>>>,
}

impl<'s> ReportContext<'s> {
    pub fn new(source: &'s dyn LedgerSource, settings: EngineSettings) -> Self {
        Self {
            source,
            settings,
            accounts: RefCell::new(HashMap::new()),
            currencies: RefCell::new(HashMap::new()),
            collections: RefCell::new(HashMap::new()),
            modifiers: RefCell::new(HashMap::new()),
            modifier_atoms: RefCell::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &'s dyn LedgerSource {
        self.source
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Accounts among `ids` that exist, loading the uncached ones in one call.
    pub fn accounts(&self, ids: &[Uuid]) -> ResultEngine<Vec<Account>> {
        let missing = missing_ids(ids, |id| self.accounts.borrow().contains_key(id));
        if !missing.is_empty() {
            let loaded = self.source.accounts(&missing)?;
            tracing::debug!("loaded {} of {} accounts", loaded.len(), missing.len());
            self.prime_accounts(loaded);
        }
        let cache = self.accounts.borrow();
        Ok(ids.iter().filter_map(|id| cache.get(id).cloned()).collect())
    }

    pub fn account(&self, id: Uuid) -> ResultEngine<Account> {
        self.accounts(&[id])?
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound(format!("account {id}")))
    }

    /// Adds accounts obtained elsewhere (e.g. with raw period data).
    pub fn prime_accounts(&self, accounts: Vec<Account>) {
        let mut cache = self.accounts.borrow_mut();
        for account in accounts {
            cache.insert(account.id, account);
        }
    }

    /// Ids of every account of the given kinds. Not memoized: the answer
    /// depends on the kind set, and the accounts themselves are cached.
    pub fn account_ids_by_kinds(&self, kinds: &[AccountKind]) -> ResultEngine<Vec<Uuid>> {
        let accounts = self.source.accounts_by_kinds(kinds)?;
        let ids = accounts.iter().map(|account| account.id).collect();
        self.prime_accounts(accounts);
        Ok(ids)
    }

    pub fn currencies(&self, ids: &[Uuid]) -> ResultEngine<Vec<Currency>> {
        let missing = missing_ids(ids, |id| self.currencies.borrow().contains_key(id));
        if !missing.is_empty() {
            let loaded = self.source.currencies(&missing)?;
            let mut cache = self.currencies.borrow_mut();
            for currency in loaded {
                cache.insert(currency.id, currency);
            }
        }
        let cache = self.currencies.borrow();
        Ok(ids.iter().filter_map(|id| cache.get(id).cloned()).collect())
    }

    pub fn currency(&self, id: Uuid) -> ResultEngine<Currency> {
        self.currencies(&[id])?
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound(format!("currency {id}")))
    }

    /// Presentational text of `value` in the currency `currency_id`. Currencies
    /// without precision settings use the configured default scale.
    pub fn format(&self, currency_id: Uuid, value: &BigRational) -> ResultEngine<String> {
        Ok(self
            .currency(currency_id)?
            .format(value, self.settings.default_scale))
    }

    /// Account ids of a collection, `None` when the collection is unknown.
    pub fn collection_account_ids(&self, collection_id: Uuid) -> ResultEngine<Option<Vec<Uuid>>> {
        if let Some(cached) = self.collections.borrow().get(&collection_id) {
            return Ok(cached.clone());
        }
        let resolved = if self.source.collections(&[collection_id])?.is_empty() {
            None
        } else {
            Some(self.source.collection_account_ids(collection_id)?)
        };
        self.collections
            .borrow_mut()
            .insert(collection_id, resolved.clone());
        Ok(resolved)
    }

    pub fn modifier(&self, id: Uuid) -> ResultEngine<Modifier> {
        if let Some(cached) = self.modifiers.borrow().get(&id) {
            return Ok(cached.clone());
        }
        let modifier = self
            .source
            .modifiers(&[id])?
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound(format!("modifier {id}")))?;
        self.modifiers.borrow_mut().insert(id, modifier.clone());
        Ok(modifier)
    }

    pub fn modifier_atoms(&self, modifier_id: Uuid) -> ResultEngine<Vec<ModifierAtom>> {
        if let Some(cached) = self.modifier_atoms.borrow().get(&modifier_id) {
            return Ok(cached.clone());
        }
        let atoms = self.source.modifier_atoms(modifier_id)?;
        self.modifier_atoms
            .borrow_mut()
            .insert(modifier_id, atoms.clone());
        Ok(atoms)
    }
}

fn missing_ids(ids: &[Uuid], cached: impl Fn(&Uuid) -> bool) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| !cached(id) && seen.insert(**id))
        .copied()
        .collect()
}
