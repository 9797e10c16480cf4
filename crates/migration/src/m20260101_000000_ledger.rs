//! Ledger schema.
//!
//! - `currencies`: currency codes and presentational precision
//! - `accounts`: ledger accounts, one currency and kind each
//! - `collections` / `account_collections`: named account groups for reports
//! - `cash_flow_activities`: classification of cash flows
//! - `modifiers` / `modifier_atoms`: transaction templates and their legs
//! - `financial_entries` / `financial_entry_atoms`: dated occurrences of a
//!   modifier and their submitted values
//! - `frozen_periods`: closed accounting periods
//! - `summary_calculations` / `flow_calculations`: rows stored when a period
//!   is frozen
//!
//! Ids are UUID text, amounts exact rational text (`"n"` or `"n/d"`).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Currencies {
    Table,
    Id,
    Code,
    MinimumScale,
    MaximumScale,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    CurrencyId,
    Kind,
    DeletedAt,
}

#[derive(Iden)]
enum Collections {
    Table,
    Id,
    Name,
    UserId,
}

#[derive(Iden)]
enum AccountCollections {
    Table,
    CollectionId,
    AccountId,
}

#[derive(Iden)]
enum CashFlowActivities {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Modifiers {
    Table,
    Id,
    Name,
    Action,
    Kind,
    DeletedAt,
}

#[derive(Iden)]
enum ModifierAtoms {
    Table,
    Id,
    ModifierId,
    AccountId,
    Kind,
    CashFlowActivityId,
}

#[derive(Iden)]
enum FinancialEntries {
    Table,
    Id,
    ModifierId,
    TransactedAt,
    Remarks,
}

#[derive(Iden)]
enum FinancialEntryAtoms {
    Table,
    Id,
    FinancialEntryId,
    ModifierAtomId,
    Kind,
    NumericalValue,
}

#[derive(Iden)]
enum FrozenPeriods {
    Table,
    Id,
    StartedAt,
    FinishedAt,
}

#[derive(Iden)]
enum SummaryCalculations {
    Table,
    FrozenPeriodId,
    AccountId,
    OpenedDebitAmount,
    OpenedCreditAmount,
    UnadjustedDebitAmount,
    UnadjustedCreditAmount,
    ClosedDebitAmount,
    ClosedCreditAmount,
}

#[derive(Iden)]
enum FlowCalculations {
    Table,
    FrozenPeriodId,
    CashFlowActivityId,
    AccountId,
    NetAmount,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Reference data
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Currencies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Currencies::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Currencies::Code).string().not_null())
                    .col(ColumnDef::new(Currencies::MinimumScale).integer())
                    .col(ColumnDef::new(Currencies::MaximumScale).integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::CurrencyId).string().not_null())
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(ColumnDef::new(Accounts::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-currency_id")
                            .from(Accounts::Table, Accounts::CurrencyId)
                            .to(Currencies::Table, Currencies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-kind")
                    .table(Accounts::Table)
                    .col(Accounts::Kind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Collections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collections::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collections::Name).string().not_null())
                    .col(ColumnDef::new(Collections::UserId).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountCollections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountCollections::CollectionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountCollections::AccountId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(AccountCollections::CollectionId)
                            .col(AccountCollections::AccountId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_collections-collection_id")
                            .from(AccountCollections::Table, AccountCollections::CollectionId)
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_collections-account_id")
                            .from(AccountCollections::Table, AccountCollections::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CashFlowActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashFlowActivities::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashFlowActivities::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Modifiers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Modifiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Modifiers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Modifiers::Name).string().not_null())
                    .col(ColumnDef::new(Modifiers::Action).string().not_null())
                    .col(ColumnDef::new(Modifiers::Kind).string().not_null())
                    .col(ColumnDef::new(Modifiers::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ModifierAtoms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ModifierAtoms::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ModifierAtoms::ModifierId).string().not_null())
                    .col(ColumnDef::new(ModifierAtoms::AccountId).string().not_null())
                    .col(ColumnDef::new(ModifierAtoms::Kind).string().not_null())
                    .col(ColumnDef::new(ModifierAtoms::CashFlowActivityId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-modifier_atoms-modifier_id")
                            .from(ModifierAtoms::Table, ModifierAtoms::ModifierId)
                            .to(Modifiers::Table, Modifiers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-modifier_atoms-account_id")
                            .from(ModifierAtoms::Table, ModifierAtoms::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-modifier_atoms-cash_flow_activity_id")
                            .from(ModifierAtoms::Table, ModifierAtoms::CashFlowActivityId)
                            .to(CashFlowActivities::Table, CashFlowActivities::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-modifier_atoms-modifier_id")
                    .table(ModifierAtoms::Table)
                    .col(ModifierAtoms::ModifierId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Financial entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FinancialEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FinancialEntries::ModifierId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialEntries::TransactedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinancialEntries::Remarks).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-financial_entries-modifier_id")
                            .from(FinancialEntries::Table, FinancialEntries::ModifierId)
                            .to(Modifiers::Table, Modifiers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-financial_entries-modifier_id-transacted_at")
                    .table(FinancialEntries::Table)
                    .col(FinancialEntries::ModifierId)
                    .col(FinancialEntries::TransactedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FinancialEntryAtoms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialEntryAtoms::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FinancialEntryAtoms::FinancialEntryId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialEntryAtoms::ModifierAtomId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinancialEntryAtoms::Kind).string().not_null())
                    .col(
                        ColumnDef::new(FinancialEntryAtoms::NumericalValue)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-financial_entry_atoms-financial_entry_id")
                            .from(
                                FinancialEntryAtoms::Table,
                                FinancialEntryAtoms::FinancialEntryId,
                            )
                            .to(FinancialEntries::Table, FinancialEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-financial_entry_atoms-modifier_atom_id")
                            .from(FinancialEntryAtoms::Table, FinancialEntryAtoms::ModifierAtomId)
                            .to(ModifierAtoms::Table, ModifierAtoms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-financial_entry_atoms-entry-atom-kind-unique")
                    .table(FinancialEntryAtoms::Table)
                    .col(FinancialEntryAtoms::FinancialEntryId)
                    .col(FinancialEntryAtoms::ModifierAtomId)
                    .col(FinancialEntryAtoms::Kind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Frozen periods and their rows
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FrozenPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FrozenPeriods::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FrozenPeriods::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FrozenPeriods::FinishedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-frozen_periods-started_at-unique")
                    .table(FrozenPeriods::Table)
                    .col(FrozenPeriods::StartedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-frozen_periods-finished_at-unique")
                    .table(FrozenPeriods::Table)
                    .col(FrozenPeriods::FinishedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SummaryCalculations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SummaryCalculations::FrozenPeriodId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SummaryCalculations::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SummaryCalculations::OpenedDebitAmount)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SummaryCalculations::OpenedCreditAmount)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SummaryCalculations::UnadjustedDebitAmount)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SummaryCalculations::UnadjustedCreditAmount)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SummaryCalculations::ClosedDebitAmount)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SummaryCalculations::ClosedCreditAmount)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(SummaryCalculations::FrozenPeriodId)
                            .col(SummaryCalculations::AccountId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-summary_calculations-frozen_period_id")
                            .from(SummaryCalculations::Table, SummaryCalculations::FrozenPeriodId)
                            .to(FrozenPeriods::Table, FrozenPeriods::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-summary_calculations-account_id")
                            .from(SummaryCalculations::Table, SummaryCalculations::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FlowCalculations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FlowCalculations::FrozenPeriodId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FlowCalculations::CashFlowActivityId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FlowCalculations::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FlowCalculations::NetAmount)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(FlowCalculations::FrozenPeriodId)
                            .col(FlowCalculations::CashFlowActivityId)
                            .col(FlowCalculations::AccountId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-flow_calculations-frozen_period_id")
                            .from(FlowCalculations::Table, FlowCalculations::FrozenPeriodId)
                            .to(FrozenPeriods::Table, FrozenPeriods::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-flow_calculations-cash_flow_activity_id")
                            .from(FlowCalculations::Table, FlowCalculations::CashFlowActivityId)
                            .to(CashFlowActivities::Table, CashFlowActivities::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(FlowCalculations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SummaryCalculations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FrozenPeriods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FinancialEntryAtoms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FinancialEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ModifierAtoms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Modifiers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashFlowActivities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountCollections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Collections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Currencies::Table).to_owned())
            .await?;
        Ok(())
    }
}
