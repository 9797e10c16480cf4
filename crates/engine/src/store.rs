//! Persistence adapter.
//!
//! [`LedgerStore`] writes ledger rows through sea-orm and loads them back as
//! a [`LedgerSnapshot`], the synchronous [`LedgerSource`] the calculation
//! core works on. Freezing a period is the only write the engine computes
//! itself. Writes that depend on the frozen periods read them inside their
//! own transaction.
//!
//! [`LedgerSource`]: crate::LedgerSource

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountCollection, CashFlowActivity, Collection, Currency, EngineError,
    FinancialEntry, FinancialEntryAtom, FrozenPeriod, LedgerSnapshot, Modifier, ModifierAtom,
    ResultEngine, TimeGroup, account_collections, accounts, cash_flow_activities, collections,
    currencies, financial_entries, financial_entry_atoms, flow_calculations, frozen_periods,
    modifier_atoms, modifiers, summary_calculations,
};

fn convert<M, T>(models: Vec<M>) -> ResultEngine<Vec<T>>
where
    T: TryFrom<M, Error = EngineError>,
{
    models.into_iter().map(T::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct LedgerStore {
    database: DatabaseConnection,
}

impl LedgerStore {
    /// Return a builder for `LedgerStore`.
    pub fn builder() -> LedgerStoreBuilder {
        LedgerStoreBuilder::default()
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    pub async fn create_currency(&self, currency: &Currency) -> ResultEngine<()> {
        currencies::Entity::insert(currencies::ActiveModel::from(currency))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn create_account(&self, account: &Account) -> ResultEngine<()> {
        accounts::Entity::insert(accounts::ActiveModel::from(account))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn create_cash_flow_activity(&self, activity: &CashFlowActivity) -> ResultEngine<()> {
        cash_flow_activities::Entity::insert(cash_flow_activities::ActiveModel::from(activity))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn create_collection(
        &self,
        collection: &Collection,
        account_ids: &[Uuid],
    ) -> ResultEngine<()> {
        let db_tx = self.database.begin().await?;
        collections::Entity::insert(collections::ActiveModel::from(collection))
            .exec(&db_tx)
            .await?;
        for account_id in account_ids {
            let link = AccountCollection {
                collection_id: collection.id,
                account_id: *account_id,
            };
            account_collections::Entity::insert(account_collections::ActiveModel::from(&link))
                .exec(&db_tx)
                .await?;
        }
        db_tx.commit().await?;
        Ok(())
    }

    pub async fn create_modifier(
        &self,
        modifier: &Modifier,
        atoms: &[ModifierAtom],
    ) -> ResultEngine<()> {
        let db_tx = self.database.begin().await?;
        modifiers::Entity::insert(modifiers::ActiveModel::from(modifier))
            .exec(&db_tx)
            .await?;
        for atom in atoms {
            modifier_atoms::Entity::insert(modifier_atoms::ActiveModel::from(atom))
                .exec(&db_tx)
                .await?;
        }
        db_tx.commit().await?;
        Ok(())
    }

    /// Records an entry with its values. Entries dated inside a frozen period
    /// are rejected with `InvalidPeriod`.
    pub async fn record_financial_entry(
        &self,
        entry: &FinancialEntry,
        atoms: &[FinancialEntryAtom],
    ) -> ResultEngine<()> {
        let db_tx = self.database.begin().await?;
        let latest = latest_frozen_period(&db_tx).await?;
        FrozenPeriod::ensure_unfrozen(latest.as_ref(), entry.transacted_at)?;
        financial_entries::Entity::insert(financial_entries::ActiveModel::from(entry))
            .exec(&db_tx)
            .await?;
        for atom in atoms {
            financial_entry_atoms::Entity::insert(financial_entry_atoms::ActiveModel::from(atom))
                .exec(&db_tx)
                .await?;
        }
        db_tx.commit().await?;
        Ok(())
    }

    /// Loads every ledger table into memory.
    pub async fn snapshot(&self) -> ResultEngine<LedgerSnapshot> {
        load_snapshot(&self.database).await
    }

    /// Frozen periods in chronological order.
    pub async fn frozen_periods(&self) -> ResultEngine<Vec<FrozenPeriod>> {
        load_frozen_periods(&self.database).await
    }

    /// Time groups of a report running at `now`.
    pub async fn time_groups(&self, now: DateTime<Utc>) -> ResultEngine<Vec<TimeGroup>> {
        Ok(TimeGroup::layout(self.frozen_periods().await?, now))
    }

    /// Freezes `[started_at, finished_at)`: the period must follow the latest
    /// frozen one without a gap. The ledger is read, and the period's summary
    /// and flow rows are written, inside one database transaction.
    pub async fn freeze_period(
        &self,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> ResultEngine<FrozenPeriod> {
        let db_tx = self.database.begin().await?;
        let snapshot = load_snapshot(&db_tx).await?;
        let (period, summaries, flows) = snapshot.prepare_freeze(started_at, finished_at)?;

        frozen_periods::Entity::insert(frozen_periods::ActiveModel::from(&period))
            .exec(&db_tx)
            .await?;
        for row in &summaries {
            summary_calculations::Entity::insert(row.to_active_model(period.id))
                .exec(&db_tx)
                .await?;
        }
        for row in &flows {
            flow_calculations::Entity::insert(row.to_active_model(period.id))
                .exec(&db_tx)
                .await?;
        }
        db_tx.commit().await?;

        tracing::info!(
            "froze period {} - {} ({} summaries, {} flows)",
            period.started_at,
            period.finished_at,
            summaries.len(),
            flows.len()
        );
        Ok(period)
    }
}

async fn load_frozen_periods<C: ConnectionTrait>(db: &C) -> ResultEngine<Vec<FrozenPeriod>> {
    convert(
        frozen_periods::Entity::find()
            .order_by_asc(frozen_periods::Column::StartedAt)
            .all(db)
            .await?,
    )
}

async fn latest_frozen_period<C: ConnectionTrait>(db: &C) -> ResultEngine<Option<FrozenPeriod>> {
    frozen_periods::Entity::find()
        .order_by_desc(frozen_periods::Column::FinishedAt)
        .one(db)
        .await?
        .map(FrozenPeriod::try_from)
        .transpose()
}

async fn load_snapshot<C: ConnectionTrait>(db: &C) -> ResultEngine<LedgerSnapshot> {
    let mut snapshot = LedgerSnapshot::new();

    let loaded: Vec<Currency> = convert(currencies::Entity::find().all(db).await?)?;
    for currency in loaded {
        snapshot.add_currency(currency);
    }
    let loaded: Vec<Account> = convert(accounts::Entity::find().all(db).await?)?;
    for account in loaded {
        snapshot.add_account(account);
    }
    let loaded: Vec<CashFlowActivity> =
        convert(cash_flow_activities::Entity::find().all(db).await?)?;
    for activity in loaded {
        snapshot.add_cash_flow_activity(activity);
    }

    let loaded: Vec<Collection> = convert(collections::Entity::find().all(db).await?)?;
    for collection in loaded {
        snapshot.collections.insert(collection.id, collection);
    }
    snapshot.account_collections = convert(account_collections::Entity::find().all(db).await?)?;

    let loaded: Vec<Modifier> = convert(modifiers::Entity::find().all(db).await?)?;
    for modifier in loaded {
        snapshot.modifiers.insert(modifier.id, modifier);
    }
    snapshot.modifier_atoms = convert(modifier_atoms::Entity::find().all(db).await?)?;
    snapshot.financial_entries = convert(
        financial_entries::Entity::find()
            .order_by_asc(financial_entries::Column::TransactedAt)
            .all(db)
            .await?,
    )?;
    snapshot.financial_entry_atoms = convert(financial_entry_atoms::Entity::find().all(db).await?)?;

    snapshot.frozen_periods = load_frozen_periods(db).await?;
    snapshot.summaries = convert(summary_calculations::Entity::find().all(db).await?)?;
    snapshot.flows = convert(flow_calculations::Entity::find().all(db).await?)?;

    tracing::debug!(
        "loaded snapshot: {} accounts, {} entries, {} frozen periods",
        snapshot.accounts.len(),
        snapshot.financial_entries.len(),
        snapshot.frozen_periods.len()
    );
    Ok(snapshot)
}

/// The builder for `LedgerStore`
#[derive(Default)]
pub struct LedgerStoreBuilder {
    database: DatabaseConnection,
}

impl LedgerStoreBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerStoreBuilder {
        self.database = db;
        self
    }

    /// Construct `LedgerStore`
    pub fn build(self) -> LedgerStore {
        LedgerStore {
            database: self.database,
        }
    }
}
