#![allow(dead_code)]

use std::cell::Cell;

use chrono::{DateTime, TimeZone, Utc};
use num_bigint::BigInt;
use num_rational::BigRational;
use uuid::Uuid;

use engine::{
    Account, AccountKind, Collection, Currency, EntryAtomValueKind, FinancialEntry,
    FinancialEntryAtom, FlowCalculation, LedgerSnapshot, LedgerSource, Modifier, ModifierAction,
    ModifierAtom, ModifierAtomKind, ModifierKind, RawPeriodData, ResultEngine, SummaryCalculation,
};

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn value(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

pub fn ratio(numerator: i64, denominator: i64) -> BigRational {
    BigRational::new(BigInt::from(numerator), BigInt::from(denominator))
}

/// A two-legged modifier: `debit` is debited, `credit` credited.
pub fn two_legged(
    ledger: &mut LedgerSnapshot,
    name: &str,
    action: ModifierAction,
    debit: &Account,
    credit: &Account,
) -> (Modifier, Vec<ModifierAtom>) {
    let modifier = Modifier::new(name, action, ModifierKind::Manual);
    let atoms = vec![
        ModifierAtom::new(modifier.id, debit.id, ModifierAtomKind::RealDebit),
        ModifierAtom::new(modifier.id, credit.id, ModifierAtomKind::RealCredit),
    ];
    ledger.add_modifier(modifier.clone(), atoms.clone());
    (modifier, atoms)
}

/// Records an entry giving each atom the matching total.
pub fn post(
    ledger: &mut LedgerSnapshot,
    modifier: &Modifier,
    atoms: &[ModifierAtom],
    transacted_at: DateTime<Utc>,
    totals: &[i64],
) -> FinancialEntry {
    let entry = FinancialEntry::new(modifier.id, transacted_at, None);
    let values = atoms
        .iter()
        .zip(totals)
        .map(|(atom, total)| {
            FinancialEntryAtom::new(entry.id, atom.id, EntryAtomValueKind::Total, value(*total))
        })
        .collect();
    ledger.add_financial_entry(entry.clone(), values).unwrap();
    entry
}

/// Single-currency household ledger.
pub struct Household {
    pub ledger: LedgerSnapshot,
    pub eur: Currency,
    pub cash: Account,
    pub salary: Account,
    pub food: Account,
    pub equity: Account,
    pub assets: Collection,
    pub earn: (Modifier, Vec<ModifierAtom>),
    pub spend: (Modifier, Vec<ModifierAtom>),
    pub close_income: (Modifier, Vec<ModifierAtom>),
    pub close_expense: (Modifier, Vec<ModifierAtom>),
}

impl Household {
    pub fn new() -> Self {
        let mut ledger = LedgerSnapshot::new();
        let eur = Currency::new("EUR").with_precision(2, 2);
        let cash = Account::new("Cash", eur.id, AccountKind::LiquidAsset);
        let salary = Account::new("Salary", eur.id, AccountKind::Income);
        let food = Account::new("Food", eur.id, AccountKind::Expense);
        let equity = Account::new("Retained earnings", eur.id, AccountKind::Equity);
        let assets = Collection::new("Assets", "alice");

        ledger.add_currency(eur.clone());
        for account in [&cash, &salary, &food, &equity] {
            ledger.add_account(account.clone());
        }
        ledger.add_collection(assets.clone(), &[cash.id]);

        let earn = two_legged(&mut ledger, "Salary", ModifierAction::Record, &cash, &salary);
        let spend = two_legged(&mut ledger, "Groceries", ModifierAction::Record, &food, &cash);
        let close_income =
            two_legged(&mut ledger, "Close income", ModifierAction::Close, &salary, &equity);
        let close_expense =
            two_legged(&mut ledger, "Close expenses", ModifierAction::Close, &equity, &food);

        Self {
            ledger,
            eur,
            cash,
            salary,
            food,
            equity,
            assets,
            earn,
            spend,
            close_income,
            close_expense,
        }
    }

    pub fn earn(&mut self, at: DateTime<Utc>, amount: i64) {
        let (modifier, atoms) = self.earn.clone();
        post(&mut self.ledger, &modifier, &atoms, at, &[amount, amount]);
    }

    pub fn spend(&mut self, at: DateTime<Utc>, amount: i64) {
        let (modifier, atoms) = self.spend.clone();
        post(&mut self.ledger, &modifier, &atoms, at, &[amount, amount]);
    }

    /// Closes income and expenses into equity.
    pub fn close(&mut self, at: DateTime<Utc>, income: i64, expenses: i64) {
        let (modifier, atoms) = self.close_income.clone();
        post(&mut self.ledger, &modifier, &atoms, at, &[income, income]);
        let (modifier, atoms) = self.close_expense.clone();
        post(&mut self.ledger, &modifier, &atoms, at, &[expenses, expenses]);
    }
}

/// Source counting the calls that reach the aggregated rows.
pub struct CountingSource<'l> {
    pub inner: &'l LedgerSnapshot,
    pub raw_period_calls: Cell<usize>,
    pub summary_calls: Cell<usize>,
}

impl<'l> CountingSource<'l> {
    pub fn new(inner: &'l LedgerSnapshot) -> Self {
        Self {
            inner,
            raw_period_calls: Cell::new(0),
            summary_calls: Cell::new(0),
        }
    }
}

impl LedgerSource for CountingSource<'_> {
    fn currencies(&self, ids: &[Uuid]) -> ResultEngine<Vec<Currency>> {
        self.inner.currencies(ids)
    }

    fn accounts(&self, ids: &[Uuid]) -> ResultEngine<Vec<Account>> {
        self.inner.accounts(ids)
    }

    fn accounts_by_kinds(&self, kinds: &[AccountKind]) -> ResultEngine<Vec<Account>> {
        self.inner.accounts_by_kinds(kinds)
    }

    fn collections(&self, ids: &[Uuid]) -> ResultEngine<Vec<Collection>> {
        self.inner.collections(ids)
    }

    fn collection_account_ids(&self, collection_id: Uuid) -> ResultEngine<Vec<Uuid>> {
        self.inner.collection_account_ids(collection_id)
    }

    fn modifiers(&self, ids: &[Uuid]) -> ResultEngine<Vec<Modifier>> {
        self.inner.modifiers(ids)
    }

    fn modifiers_by_action(&self, action: ModifierAction) -> ResultEngine<Vec<Modifier>> {
        self.inner.modifiers_by_action(action)
    }

    fn modifier_atoms(&self, modifier_id: Uuid) -> ResultEngine<Vec<ModifierAtom>> {
        self.inner.modifier_atoms(modifier_id)
    }

    fn financial_entries(
        &self,
        modifier_ids: &[Uuid],
        until: DateTime<Utc>,
    ) -> ResultEngine<Vec<FinancialEntry>> {
        self.inner.financial_entries(modifier_ids, until)
    }

    fn financial_entry_atoms(&self, entry_ids: &[Uuid]) -> ResultEngine<Vec<FinancialEntryAtom>> {
        self.inner.financial_entry_atoms(entry_ids)
    }

    fn summary_calculations(
        &self,
        period_ids: &[Uuid],
        account_ids: &[Uuid],
    ) -> ResultEngine<Vec<SummaryCalculation>> {
        self.summary_calls.set(self.summary_calls.get() + 1);
        self.inner.summary_calculations(period_ids, account_ids)
    }

    fn flow_calculations(
        &self,
        period_ids: &[Uuid],
        account_ids: &[Uuid],
    ) -> ResultEngine<Vec<FlowCalculation>> {
        self.inner.flow_calculations(period_ids, account_ids)
    }

    fn compute_raw_period_data(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ResultEngine<RawPeriodData> {
        self.raw_period_calls.set(self.raw_period_calls.get() + 1);
        self.inner.compute_raw_period_data(start, end)
    }
}
