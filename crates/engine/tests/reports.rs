mod common;

use common::{CountingSource, Household, at, post, ratio, two_legged, value};
use engine::{
    Account, AccountKind, Collection, Currency, EngineError, EngineSettings, EntryAtomValueKind,
    ExchangeRateCache, ExpressionErrorKind, FinancialEntry, FinancialEntryAtom, LedgerSnapshot, MathExpression, ModifierAction, ReportContext, TimeGroup,
    TimeGroupManager, UnreachableCurrencyPolicy,
};
use uuid::Uuid;

/// Household with January and February frozen and March left unfrozen.
fn three_months() -> Household {
    let mut household = Household::new();
    household.earn(at(2024, 1, 10), 3000);
    household.spend(at(2024, 1, 15), 400);
    household.close(at(2024, 1, 31), 3000, 400);
    household.earn(at(2024, 2, 10), 3000);
    household.spend(at(2024, 2, 20), 600);
    household.close(at(2024, 2, 28), 3000, 600);
    household.spend(at(2024, 3, 5), 100);

    household
        .ledger
        .freeze(at(2024, 1, 1), at(2024, 2, 1))
        .unwrap();
    household
        .ledger
        .freeze(at(2024, 2, 1), at(2024, 3, 1))
        .unwrap();
    household
}

#[test]
fn closed_amounts_carry_forward_into_next_opened() {
    let household = three_months();
    let groups = household.ledger.time_groups(at(2024, 4, 1));
    assert_eq!(groups.len(), 3);

    let context = ReportContext::new(&household.ledger, EngineSettings::default());
    let mut manager = TimeGroupManager::new(&context, groups, household.eur.id);

    for account in [
        &household.cash,
        &household.salary,
        &household.food,
        &household.equity,
    ] {
        let ids = [account.id];
        let closed_debit = manager.total_closed_debit_amount(&ids).unwrap();
        let opened_debit = manager.total_opened_debit_amount(&ids).unwrap();
        let closed_credit = manager.total_closed_credit_amount(&ids).unwrap();
        let opened_credit = manager.total_opened_credit_amount(&ids).unwrap();
        assert_eq!(closed_debit[..2], opened_debit[1..], "{}", account.name);
        assert_eq!(closed_credit[..2], opened_credit[1..], "{}", account.name);
    }

    let cash = [household.cash.id];
    assert_eq!(
        manager.total_closed_debit_amount(&cash).unwrap(),
        vec![value(2600), value(5000), value(4900)]
    );
    assert_eq!(
        manager
            .total_unadjusted_debit_amount(&[household.food.id])
            .unwrap(),
        vec![value(400), value(600), value(100)]
    );
    assert_eq!(
        manager
            .total_unadjusted_credit_amount(&[household.salary.id])
            .unwrap(),
        vec![value(3000), value(3000), value(0)]
    );
    assert_eq!(
        manager.total_closed_credit_amount(&[household.equity.id]).unwrap(),
        vec![value(2600), value(5000), value(5000)]
    );
}

#[test]
fn account_order_does_not_change_totals() {
    let household = three_months();
    let context = ReportContext::new(&household.ledger, EngineSettings::default());
    let mut manager = TimeGroupManager::new(
        &context,
        household.ledger.time_groups(at(2024, 4, 1)),
        household.eur.id,
    );

    let forward = [household.cash.id, household.food.id, household.salary.id];
    let backward = [household.salary.id, household.food.id, household.cash.id];
    assert_eq!(
        manager.total_unadjusted_debit_amount(&forward).unwrap(),
        manager.total_unadjusted_debit_amount(&backward).unwrap()
    );
}

#[test]
fn scalar_formula_broadcasts_to_every_time_group() {
    let household = three_months();
    let context = ReportContext::new(&household.ledger, EngineSettings::default());
    let mut manager = TimeGroupManager::new(
        &context,
        household.ledger.time_groups(at(2024, 4, 1)),
        household.eur.id,
    );

    let result = MathExpression::new(&mut manager).evaluate("2 + 2").unwrap();
    assert_eq!(result, vec![value(4), value(4), value(4)]);

    let result = MathExpression::new(&mut manager)
        .evaluate("-(1 / 4) * 2")
        .unwrap();
    assert_eq!(result, vec![ratio(-1, 2); 3]);
}

#[test]
fn unknown_selectors_fail_before_any_aggregation() {
    let household = three_months();
    let source = CountingSource::new(&household.ledger);
    let context = ReportContext::new(&source, EngineSettings::default());
    let mut manager = TimeGroupManager::new(
        &context,
        household.ledger.time_groups(at(2024, 4, 1)),
        household.eur.id,
    );

    let err = MathExpression::new(&mut manager)
        .evaluate("TOTAL_CLOSED_CREDIT_AMOUNT(#123)")
        .unwrap_err();
    assert!(matches!(err, EngineError::Expression(_)));

    let formula = format!("TOTAL_CLOSED_CREDIT_AMOUNT(COLLECTION[{}])", Uuid::new_v4());
    let err = MathExpression::new(&mut manager)
        .evaluate(&formula)
        .unwrap_err();
    assert!(
        matches!(err, EngineError::Expression(ref inner) if inner.kind == ExpressionErrorKind::UnknownSelector)
    );

    let formula = format!(
        "TOTAL_CLOSED_DEBIT_AMOUNT(COLLECTION[{}]) + TOTAL_CLOSED_DEBIT_AMOUNT(MISSING_ACCOUNTS)",
        household.assets.id
    );
    let err = MathExpression::new(&mut manager)
        .evaluate(&formula)
        .unwrap_err();
    assert!(
        matches!(err, EngineError::Expression(ref inner) if inner.kind == ExpressionErrorKind::UnknownSelector)
    );

    assert_eq!(source.raw_period_calls.get(), 0);
    assert_eq!(source.summary_calls.get(), 0);
}

#[test]
fn expense_macro_yields_exact_period_amounts() {
    let mut household = Household::new();
    household.spend(at(2024, 1, 12), 500);
    household.close(at(2024, 1, 31), 0, 500);
    household.spend(at(2024, 2, 12), 500);
    household.close(at(2024, 2, 28), 0, 500);
    household
        .ledger
        .freeze(at(2024, 1, 1), at(2024, 2, 1))
        .unwrap();
    household
        .ledger
        .freeze(at(2024, 2, 1), at(2024, 3, 1))
        .unwrap();

    let groups = household.ledger.time_groups(at(2024, 3, 1));
    assert_eq!(groups.len(), 2);
    let context = ReportContext::new(&household.ledger, EngineSettings::default());
    let mut manager = TimeGroupManager::new(&context, groups, household.eur.id);

    let result = MathExpression::new(&mut manager)
        .evaluate("TOTAL_UNADJUSTED_DEBIT_AMOUNT(EXPENSE_ACCOUNTS)")
        .unwrap();
    assert_eq!(result, vec![value(500), value(500)]);
}

#[test]
fn formulas_combine_aggregates_exactly() {
    let mut household = Household::new();
    household.earn(at(2024, 1, 5), 2000);
    household.close(at(2024, 1, 31), 2000, 0);
    household.earn(at(2024, 2, 5), 1500);
    household.close(at(2024, 2, 28), 1500, 0);
    household
        .ledger
        .freeze(at(2024, 1, 1), at(2024, 2, 1))
        .unwrap();
    household
        .ledger
        .freeze(at(2024, 2, 1), at(2024, 3, 1))
        .unwrap();

    let context = ReportContext::new(&household.ledger, EngineSettings::default());
    let mut manager = TimeGroupManager::new(
        &context,
        household.ledger.time_groups(at(2024, 3, 1)),
        household.eur.id,
    );
    let call = format!("TOTAL_CLOSED_DEBIT_AMOUNT(COLLECTION[{}])", household.assets.id);

    let mut expression = MathExpression::new(&mut manager);
    assert_eq!(
        expression.evaluate(&call).unwrap(),
        vec![value(2000), value(3500)]
    );
    assert_eq!(
        expression.evaluate(&format!("{call} * 2")).unwrap(),
        vec![value(4000), value(7000)]
    );
    assert_eq!(
        expression.evaluate(&format!("{call} / 2")).unwrap(),
        vec![value(1000), value(1750)]
    );
    assert_eq!(
        expression.evaluate(&format!("2 / {call}")).unwrap(),
        vec![ratio(1, 1000), ratio(1, 1750)]
    );
    assert_eq!(
        expression
            .evaluate(&format!("{call} - TOTAL_CLOSED_CREDIT_AMOUNT(EQUITY_ACCOUNTS)"))
            .unwrap(),
        vec![value(0), value(0)]
    );

    let err = expression
        .evaluate(&format!("{call} / TOTAL_CLOSED_DEBIT_AMOUNT(EXPENSE_ACCOUNTS)"))
        .unwrap_err();
    assert!(
        matches!(err, EngineError::Expression(ref inner) if inner.kind == ExpressionErrorKind::Arithmetic)
    );
}

#[test]
fn unfrozen_period_is_computed_once_per_report() {
    let household = three_months();
    let source = CountingSource::new(&household.ledger);
    let context = ReportContext::new(&source, EngineSettings::default());
    let mut manager = TimeGroupManager::new(
        &context,
        household.ledger.time_groups(at(2024, 4, 1)),
        household.eur.id,
    );

    let unfrozen_computed = |manager: &TimeGroupManager<'_>| match manager.time_groups().last() {
        Some(TimeGroup::Unfrozen(group)) => group.is_computed(),
        _ => false,
    };
    assert!(!unfrozen_computed(&manager));

    let formula = "TOTAL_UNADJUSTED_DEBIT_AMOUNT(EXPENSE_ACCOUNTS)";
    let first = MathExpression::new(&mut manager).evaluate(formula).unwrap();
    let second = MathExpression::new(&mut manager).evaluate(formula).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, vec![value(400), value(600), value(100)]);
    assert!(unfrozen_computed(&manager));

    MathExpression::new(&mut manager)
        .evaluate("TOTAL_CLOSED_DEBIT_AMOUNT(ASSET_ACCOUNTS)")
        .unwrap();
    assert_eq!(source.raw_period_calls.get(), 1);
}

struct Travel {
    ledger: LedgerSnapshot,
    jpy: Currency,
    usd: Currency,
    gbp: Currency,
    wallets: Collection,
    everything: Collection,
}

/// 1100 JPY and 4 USD funded, then 100 JPY exchanged for 1 USD on January
/// 5th; February is frozen. A GBP account has no observed rate.
fn travel() -> Travel {
    let mut ledger = LedgerSnapshot::new();
    let jpy = Currency::new("JPY").with_precision(0, 0);
    let usd = Currency::new("USD").with_precision(2, 2);
    let gbp = Currency::new("GBP").with_precision(2, 2);
    for currency in [&jpy, &usd, &gbp] {
        ledger.add_currency(currency.clone());
    }

    let jpy_cash = Account::new("Yen wallet", jpy.id, AccountKind::LiquidAsset);
    let usd_cash = Account::new("Dollar wallet", usd.id, AccountKind::LiquidAsset);
    let gbp_cash = Account::new("Pound wallet", gbp.id, AccountKind::LiquidAsset);
    let jpy_equity = Account::new("Yen equity", jpy.id, AccountKind::Equity);
    let usd_equity = Account::new("Dollar equity", usd.id, AccountKind::Equity);
    let gbp_equity = Account::new("Pound equity", gbp.id, AccountKind::Equity);
    for account in [
        &jpy_cash,
        &usd_cash,
        &gbp_cash,
        &jpy_equity,
        &usd_equity,
        &gbp_equity,
    ] {
        ledger.add_account(account.clone());
    }
    let wallets = Collection::new("Wallets", "alice");
    ledger.add_collection(wallets.clone(), &[jpy_cash.id, usd_cash.id]);
    let everything = Collection::new("Everything", "alice");
    ledger.add_collection(everything.clone(), &[jpy_cash.id, usd_cash.id, gbp_cash.id]);

    let (modifier, atoms) =
        two_legged(&mut ledger, "Fund yen", ModifierAction::Record, &jpy_cash, &jpy_equity);
    post(&mut ledger, &modifier, &atoms, at(2024, 1, 2), &[1100, 1100]);
    let (modifier, atoms) =
        two_legged(&mut ledger, "Fund dollars", ModifierAction::Record, &usd_cash, &usd_equity);
    post(&mut ledger, &modifier, &atoms, at(2024, 1, 3), &[4, 4]);
    let (modifier, atoms) =
        two_legged(&mut ledger, "Fund pounds", ModifierAction::Record, &gbp_cash, &gbp_equity);
    post(&mut ledger, &modifier, &atoms, at(2024, 1, 3), &[7, 7]);
    let (modifier, atoms) =
        two_legged(&mut ledger, "Buy dollars", ModifierAction::Exchange, &usd_cash, &jpy_cash);
    post(&mut ledger, &modifier, &atoms, at(2024, 1, 5), &[1, 100]);

    ledger.freeze(at(2024, 2, 1), at(2024, 3, 1)).unwrap();
    Travel {
        ledger,
        jpy,
        usd,
        gbp,
        wallets,
        everything,
    }
}

fn closed_debit(
    travel: &Travel,
    settings: EngineSettings,
    collection: &Collection,
    destination: &Currency,
) -> Result<Vec<num_rational::BigRational>, EngineError> {
    let context = ReportContext::new(&travel.ledger, settings);
    let mut manager = TimeGroupManager::new(
        &context,
        travel.ledger.time_groups(at(2024, 3, 1)),
        destination.id,
    );
    MathExpression::new(&mut manager).evaluate(&format!(
        "TOTAL_CLOSED_DEBIT_AMOUNT(COLLECTION[{}])",
        collection.id
    ))
}

#[test]
fn totals_are_normalized_with_observed_rates() {
    let travel = travel();
    assert_eq!(
        closed_debit(&travel, EngineSettings::default(), &travel.wallets, &travel.usd).unwrap(),
        vec![value(15)]
    );
    assert_eq!(
        closed_debit(&travel, EngineSettings::default(), &travel.wallets, &travel.jpy).unwrap(),
        vec![value(1500)]
    );
}

#[test]
fn unreachable_currency_follows_policy() {
    let travel = travel();
    let err = closed_debit(&travel, EngineSettings::default(), &travel.everything, &travel.usd)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::MissingExchangeRate { from, to, .. } if from == travel.gbp.id && to == travel.usd.id
    ));

    let skip = EngineSettings {
        unreachable_currency: UnreachableCurrencyPolicy::Skip,
        ..EngineSettings::default()
    };
    assert_eq!(
        closed_debit(&travel, skip, &travel.everything, &travel.usd).unwrap(),
        vec![value(15)]
    );
}

#[test]
fn rates_observed_after_cutoff_are_ignored() {
    let travel = travel();
    let settings = EngineSettings {
        exchange_rate_cutoff: Some(at(2024, 1, 4)),
        unreachable_currency: UnreachableCurrencyPolicy::Skip,
        ..EngineSettings::default()
    };
    let context = ReportContext::new(&travel.ledger, settings.clone());
    let manager = TimeGroupManager::new(
        &context,
        travel.ledger.time_groups(at(2024, 3, 1)),
        travel.usd.id,
    );
    assert_eq!(manager.cutoff(), at(2024, 1, 4));
    assert_eq!(manager.destination_currency_id(), travel.usd.id);

    assert_eq!(
        closed_debit(&travel, settings, &travel.wallets, &travel.usd).unwrap(),
        vec![value(5)]
    );
}

#[test]
fn exchange_entries_without_totals_fail_rate_loading() {
    let mut travel = travel();
    let yen = Account::new("Second yen wallet", travel.jpy.id, AccountKind::LiquidAsset);
    let dollars = Account::new("Second dollar wallet", travel.usd.id, AccountKind::LiquidAsset);
    travel.ledger.add_account(yen.clone());
    travel.ledger.add_account(dollars.clone());
    let (modifier, atoms) = two_legged(
        &mut travel.ledger,
        "Half-recorded exchange",
        ModifierAction::Exchange,
        &dollars,
        &yen,
    );
    let entry = FinancialEntry::new(modifier.id, at(2024, 3, 2), None);
    let bought = FinancialEntryAtom::new(entry.id, atoms[0].id, EntryAtomValueKind::Total, value(2));
    travel
        .ledger
        .add_financial_entry(entry, vec![bought])
        .unwrap();

    let context = ReportContext::new(&travel.ledger, EngineSettings::default());
    let mut cache = ExchangeRateCache::new();
    let err = cache
        .load_rates_for_currencies(&context, &[travel.jpy.id, travel.usd.id], at(2024, 4, 1))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let mut manager = TimeGroupManager::new(
        &context,
        travel.ledger.time_groups(at(2024, 4, 1)),
        travel.usd.id,
    );
    let err = MathExpression::new(&mut manager)
        .evaluate(&format!(
            "TOTAL_CLOSED_DEBIT_AMOUNT(COLLECTION[{}])",
            travel.wallets.id
        ))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[test]
fn formatting_rounds_half_to_even_once() {
    let travel = travel();
    let third = closed_debit(&travel, EngineSettings::default(), &travel.wallets, &travel.usd)
        .unwrap()
        .remove(0)
        / value(3);
    let context = ReportContext::new(&travel.ledger, EngineSettings::default());
    assert_eq!(context.format(travel.usd.id, &third).unwrap(), "5.00");
    assert_eq!(context.format(travel.jpy.id, &value(1500)).unwrap(), "1500");
    assert_eq!(context.format(travel.usd.id, &ratio(1, 8)).unwrap(), "0.12");
    assert_eq!(context.format(travel.usd.id, &ratio(3, 8)).unwrap(), "0.38");
    assert!(matches!(
        context.format(Uuid::new_v4(), &value(1)),
        Err(EngineError::KeyNotFound(_))
    ));
}

#[test]
fn currencies_without_precision_use_the_default_scale() {
    let mut ledger = LedgerSnapshot::new();
    let gold = Currency::new("XAU");
    ledger.add_currency(gold.clone());

    let context = ReportContext::new(&ledger, EngineSettings::default());
    assert_eq!(context.format(gold.id, &ratio(1, 3)).unwrap(), "0.333333333333");

    let settings = EngineSettings {
        default_scale: 4,
        ..EngineSettings::default()
    };
    let context = ReportContext::new(&ledger, settings);
    assert_eq!(context.format(gold.id, &ratio(1, 3)).unwrap(), "0.3333");
    assert_eq!(context.format(gold.id, &ratio(5, 2)).unwrap(), "2.5000");
}

#[test]
fn entries_cannot_be_added_to_frozen_periods() {
    let household = three_months();
    let mut ledger = household.ledger.clone();
    let (modifier, _) = &household.spend;

    let late = FinancialEntry::new(modifier.id, at(2024, 2, 15), None);
    assert!(matches!(
        ledger.add_financial_entry(late, Vec::new()),
        Err(EngineError::InvalidPeriod(_))
    ));

    let on_time = FinancialEntry::new(modifier.id, at(2024, 3, 1), None);
    assert!(ledger.add_financial_entry(on_time, Vec::new()).is_ok());
}
