use anyhow::{bail, Result};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::planner::PlannerRecord;
use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Month {
    planner: Planner,
    budget: BudgetId,
    ledger: LedgerId,
    rent: EntryId,
    food: EntryId,
    salary: EntryId,
}

fn april() -> Result<Month> {
    let mut planner = Planner::new();
    let budget = planner.create_budget("april", date(2024, 4, 1), date(2024, 4, 30))?;
    let ledger = planner.create_ledger("checking", date(2024, 4, 1), date(2024, 4, 30))?;
    let salary = planner.plan(budget, SectionKind::Income, "salary", dec!(4000))?;
    let rent = planner.plan(budget, SectionKind::Expense, "rent", dec!(1200))?;
    let food = planner.plan(budget, SectionKind::Expense, "food", dec!(300))?;
    planner.associate(budget, ledger)?;

    Ok(Month {
        planner,
        budget,
        ledger,
        rent,
        food,
        salary,
    })
}

#[test]
fn test_plan_and_enter() -> Result<()> {
    let Month {
        mut planner,
        budget,
        ledger,
        ..
    } = april()?;

    assert_eq!(planner.budget(budget)?.balance(), dec!(2500));

    planner.enter(ledger, "landlord", dec!(1200), date(2024, 4, 1))?;
    planner.enter(ledger, "market", dec!(54.20), date(2024, 4, 6))?;
    assert_eq!(planner.ledger(ledger)?.total(), dec!(1254.20));

    Ok(())
}

#[test]
fn test_failed_creation_burns_no_id() -> Result<()> {
    let mut planner = Planner::new();

    if planner.create_budget("backwards", date(2024, 5, 1), date(2024, 4, 1)).is_ok() {
        bail!("a budget must start before it ends");
    }
    let budget = planner.create_budget("april", date(2024, 4, 1), date(2024, 4, 30))?;

    assert_eq!(budget, BudgetId::from_raw(0));

    Ok(())
}

#[test]
fn test_actual_follows_links() -> Result<()> {
    let Month {
        mut planner,
        ledger,
        rent,
        food,
        ..
    } = april()?;

    let landlord = planner.enter(ledger, "landlord", dec!(1200), date(2024, 4, 1))?;
    let market = planner.enter(ledger, "market", dec!(54.20), date(2024, 4, 6))?;
    let bakery = planner.enter(ledger, "bakery", dec!(8.80), date(2024, 4, 7))?;

    planner.link(rent, landlord)?;
    planner.link(food, market)?;
    planner.link(food, bakery)?;
    assert_eq!(planner.actual(rent), dec!(1200));
    assert_eq!(planner.actual(food), dec!(63.00));

    assert_eq!(planner.link(rent, bakery)?, Some(food));
    assert_eq!(planner.actual(food), dec!(54.20));
    assert_eq!(planner.actual(rent), dec!(1208.80));

    assert!(planner.unlink(rent, bakery));
    assert_eq!(planner.unlinked(ledger)?, vec![bakery]);
    planner.entry_links().check()?;

    Ok(())
}

#[test]
fn test_link_requires_known_ids() -> Result<()> {
    let Month {
        mut planner,
        ledger,
        rent,
        ..
    } = april()?;
    let landlord = planner.enter(ledger, "landlord", dec!(1200), date(2024, 4, 1))?;

    if let Err(err) = planner.link(EntryId::from_raw(77), landlord) {
        assert_eq!(err, PlanningError::EntryNotFound(EntryId::from_raw(77)));
    } else {
        bail!("linking an unknown entry should fail");
    }

    if let Err(err) = planner.link(rent, TransactionId::from_raw(77)) {
        assert_eq!(err, PlanningError::TransactionNotFound(TransactionId::from_raw(77)));
    } else {
        bail!("linking an unknown transaction should fail");
    }

    assert!(planner.entry_links().is_empty());

    Ok(())
}

#[test]
fn test_removing_transaction_unlinks_first() -> Result<()> {
    let Month {
        mut planner,
        ledger,
        rent,
        ..
    } = april()?;
    let landlord = planner.enter(ledger, "landlord", dec!(1200), date(2024, 4, 1))?;
    planner.link(rent, landlord)?;

    planner.remove_transaction(ledger, landlord)?;

    assert_eq!(planner.entry_links().owner(landlord), None);
    assert_eq!(planner.actual(rent), Decimal::ZERO);
    assert_eq!(planner.ledger(ledger)?.total(), Decimal::ZERO);

    if let Err(err) = planner.remove_transaction(ledger, landlord) {
        assert_eq!(err, PlanningError::TransactionNotFound(landlord));
    } else {
        bail!("a removed transaction cannot be removed again");
    }

    Ok(())
}

#[test]
fn test_removing_entry_unlinks_first() -> Result<()> {
    let Month {
        mut planner,
        budget,
        ledger,
        food,
        ..
    } = april()?;
    let market = planner.enter(ledger, "market", dec!(54.20), date(2024, 4, 6))?;
    planner.link(food, market)?;

    let removed = planner.remove_entry(budget, food)?;

    assert_eq!(removed.name(), "food");
    assert!(planner.entry_links().members(food).is_empty());
    assert_eq!(planner.unlinked(ledger)?, vec![market]);
    assert_eq!(planner.budget(budget)?.expense().total(), dec!(1200));

    Ok(())
}

#[test]
fn test_remove_budget_and_ledger() -> Result<()> {
    let Month {
        mut planner,
        budget,
        ledger,
        rent,
        ..
    } = april()?;
    let landlord = planner.enter(ledger, "landlord", dec!(1200), date(2024, 4, 1))?;
    planner.link(rent, landlord)?;

    planner.remove_ledger(ledger)?;
    assert!(planner.entry_links().is_empty());
    assert_eq!(planner.ledger_for(budget), None);

    planner.remove_budget(budget)?;
    if let Err(err) = planner.budget(budget) {
        assert_eq!(err, PlanningError::BudgetNotFound(budget));
    } else {
        bail!("budget should be gone");
    }

    Ok(())
}

#[test]
fn test_associate() -> Result<()> {
    let Month {
        mut planner,
        budget,
        ledger,
        ..
    } = april()?;
    let savings = planner.create_ledger("savings", date(2024, 4, 1), date(2024, 4, 30))?;
    let other = planner.create_budget("april, frugal", date(2024, 4, 1), date(2024, 4, 30))?;
    planner.associate(other, ledger)?;

    assert_eq!(planner.ledger_for(budget), Some(ledger));
    assert_eq!(planner.budgets_for(ledger).len(), 2);

    assert_eq!(planner.associate(budget, savings)?, Some(ledger));
    assert_eq!(planner.ledger_for(budget), Some(savings));
    assert_eq!(planner.budgets_for(ledger).into_iter().collect::<Vec<_>>(), vec![other]);

    if planner.associate(budget, LedgerId::from_raw(99)).is_ok() {
        bail!("associating an unknown ledger should fail");
    }

    Ok(())
}

#[test]
fn test_status() -> Result<()> {
    let Month {
        mut planner,
        budget,
        ledger,
        rent,
        food,
        salary,
    } = april()?;
    let pay = planner.enter(ledger, "employer", dec!(4100), date(2024, 4, 25))?;
    let market = planner.enter(ledger, "market", dec!(120.50), date(2024, 4, 6))?;
    planner.link(salary, pay)?;
    planner.link(food, market)?;

    let status = planner.status(budget)?;
    assert_eq!(
        status,
        vec![
            EntryStatus {
                kind: SectionKind::Income,
                id: salary,
                name: "salary".to_string(),
                expected: dec!(4000),
                actual: dec!(4100),
            },
            EntryStatus {
                kind: SectionKind::Expense,
                id: rent,
                name: "rent".to_string(),
                expected: dec!(1200),
                actual: Decimal::ZERO,
            },
            EntryStatus {
                kind: SectionKind::Expense,
                id: food,
                name: "food".to_string(),
                expected: dec!(300),
                actual: dec!(120.50),
            },
        ]
    );
    assert_eq!(status[2].remaining(), dec!(179.50));

    Ok(())
}

#[test]
fn test_clone_budget() -> Result<()> {
    let Month {
        mut planner,
        budget,
        rent,
        ..
    } = april()?;

    let may = planner.clone_budget(budget, "may", date(2024, 5, 1), date(2024, 5, 31))?;
    let cloned = planner.budget(may)?;

    assert_eq!(cloned.name(), "may");
    assert_eq!(cloned.balance(), dec!(2500));
    assert_eq!(cloned.expense().len(), 2);
    assert!(!cloned.contains(rent));

    Ok(())
}

#[test]
fn test_export_round_trip() -> Result<()> {
    let Month {
        mut planner,
        budget,
        ledger,
        rent,
        food,
        ..
    } = april()?;
    let landlord = planner.enter(ledger, "landlord", dec!(1200), date(2024, 4, 1))?;
    let market = planner.enter(ledger, "market", dec!(54.20), date(2024, 4, 6))?;
    planner.link(rent, landlord)?;
    planner.link(food, market)?;

    let json = serde_json::to_string(&planner.export())?;
    let record: PlannerRecord = serde_json::from_str(&json)?;
    let restored = Planner::from_record(record)?;

    assert_eq!(restored.export(), planner.export());
    assert_eq!(restored.ledger(ledger)?.total(), dec!(1254.20));
    assert_eq!(restored.budget(budget)?.balance(), dec!(2500));
    assert_eq!(restored.actual(food), dec!(54.20));

    Ok(())
}

#[test]
fn test_restore_reserves_used_ids() -> Result<()> {
    let Month { mut planner, ledger, .. } = april()?;
    let landlord = planner.enter(ledger, "landlord", dec!(1200), date(2024, 4, 1))?;

    let mut record = planner.export();
    record.ids.namespaces.clear();

    let mut restored = Planner::from_record(record)?;
    let next = restored.enter(ledger, "market", dec!(54.20), date(2024, 4, 6))?;
    assert!(next > landlord);

    let budget = restored.create_budget("may", date(2024, 5, 1), date(2024, 5, 31))?;
    assert_eq!(budget, BudgetId::from_raw(1));

    Ok(())
}

#[test]
fn test_restore_rejects_last_possible_id() -> Result<()> {
    let Month { planner, .. } = april()?;

    let mut json = serde_json::to_value(planner.export())?;
    json["budgets"][0]["id"] = serde_json::json!(u32::MAX);
    let record: PlannerRecord = serde_json::from_value(json)?;

    if let Err(err) = Planner::from_record(record) {
        assert_eq!(err, PlanningError::NamespaceExhausted("budget".to_string()));
    } else {
        bail!("a budget id that leaves no successor should be rejected");
    }

    Ok(())
}

#[test]
fn test_restore_rejects_transaction_in_two_ledgers() -> Result<()> {
    let Month {
        mut planner,
        ledger,
        rent,
        ..
    } = april()?;
    let savings = planner.create_ledger("savings", date(2024, 4, 1), date(2024, 4, 30))?;
    let landlord = planner.enter(ledger, "landlord", dec!(10), date(2024, 4, 1))?;
    planner.link(rent, landlord)?;

    let mut record = planner.export();
    let mut copy = record.ledgers[0].ledger.transactions[0].clone();
    copy.amount = dec!(999);
    let target = record.ledgers.iter_mut().find(|entry| entry.id == savings).unwrap();
    target.ledger.transactions.push(copy);

    if let Err(err) = Planner::from_record(record) {
        assert_eq!(
            err,
            PlanningError::DuplicateId {
                namespace: "transaction",
                id: landlord.raw()
            }
        );
    } else {
        bail!("a transaction id may only live in one ledger");
    }

    Ok(())
}

#[test]
fn test_restore_rejects_entry_in_two_budgets() -> Result<()> {
    let Month { mut planner, rent, .. } = april()?;
    let other = planner.create_budget("april, frugal", date(2024, 4, 1), date(2024, 4, 30))?;

    let mut record = planner.export();
    let copy = record.budgets[0]
        .budget
        .expense
        .entries
        .iter()
        .find(|entry| entry.id == rent)
        .cloned()
        .unwrap();
    let target = record.budgets.iter_mut().find(|entry| entry.id == other).unwrap();
    target.budget.expense.entries.push(copy);

    if let Err(err) = Planner::from_record(record) {
        assert_eq!(
            err,
            PlanningError::DuplicateId {
                namespace: "planned-entry",
                id: rent.raw()
            }
        );
    } else {
        bail!("an entry id may only live in one budget");
    }

    Ok(())
}

#[test]
fn test_restore_rejects_repeated_budget() -> Result<()> {
    let Month { planner, budget, .. } = april()?;

    let mut record = planner.export();
    let mut copy = record.budgets[0].clone();
    copy.budget.income.entries.clear();
    copy.budget.expense.entries.clear();
    record.budgets.push(copy);

    if let Err(err) = Planner::from_record(record) {
        assert_eq!(
            err,
            PlanningError::DuplicateId {
                namespace: "budget",
                id: budget.raw()
            }
        );
    } else {
        bail!("a budget id may only appear once");
    }

    Ok(())
}

#[test]
fn test_edit_transaction_keeps_links() -> Result<()> {
    let Month {
        mut planner,
        ledger,
        food,
        ..
    } = april()?;
    let market = planner.enter(ledger, "market", dec!(54.20), date(2024, 4, 6))?;
    let bakery = planner.enter(ledger, "bakery", dec!(8.80), date(2024, 4, 7))?;
    planner.link(food, market)?;
    planner.link(food, bakery)?;

    planner.edit_transaction(
        ledger,
        market,
        TransactionPatch {
            amount: Some(dec!(61.00)),
            date: Some(date(2024, 4, 8)),
            ..Default::default()
        },
    )?;

    assert_eq!(planner.ledger(ledger)?.total(), dec!(69.80));
    assert_eq!(planner.ledger(ledger)?.get(market).unwrap().date(), date(2024, 4, 8));
    assert_eq!(planner.entry_links().owner(market), Some(food));
    assert_eq!(planner.actual(food), dec!(69.80));
    planner.entry_links().check()?;

    Ok(())
}

#[test]
fn test_edit_transaction_in_wrong_ledger() -> Result<()> {
    let Month {
        mut planner,
        ledger,
        ..
    } = april()?;
    let savings = planner.create_ledger("savings", date(2024, 4, 1), date(2024, 4, 30))?;
    let market = planner.enter(ledger, "market", dec!(54.20), date(2024, 4, 6))?;

    let patch = TransactionPatch {
        amount: Some(dec!(1)),
        ..Default::default()
    };
    if let Err(err) = planner.edit_transaction(savings, market, patch) {
        assert_eq!(err, PlanningError::TransactionNotFound(market));
    } else {
        bail!("a transaction can only be edited through its own ledger");
    }

    assert_eq!(planner.ledger(ledger)?.total(), dec!(54.20));
    assert_eq!(planner.ledger(savings)?.total(), Decimal::ZERO);

    if let Err(err) = planner.edit_transaction(LedgerId::from_raw(42), market, TransactionPatch::default()) {
        assert_eq!(err, PlanningError::LedgerNotFound(LedgerId::from_raw(42)));
    } else {
        bail!("editing through an unknown ledger should fail");
    }

    Ok(())
}

#[test]
fn test_edit_entry_keeps_links() -> Result<()> {
    let Month {
        mut planner,
        budget,
        ledger,
        rent,
        ..
    } = april()?;
    let landlord = planner.enter(ledger, "landlord", dec!(1200), date(2024, 4, 1))?;
    planner.link(rent, landlord)?;

    planner.edit_entry(
        budget,
        rent,
        EntryPatch {
            name: Some("rent and parking".to_string()),
            expected: Some(dec!(1275)),
        },
    )?;

    let edited = planner.budget(budget)?;
    assert_eq!(edited.expense().total(), dec!(1575));
    assert_eq!(edited.balance(), dec!(2425));
    assert_eq!(edited.get(rent).unwrap().1.name(), "rent and parking");
    assert_eq!(planner.entry_links().members(rent).into_iter().collect::<Vec<_>>(), vec![landlord]);
    assert_eq!(planner.actual(rent), dec!(1200));

    Ok(())
}

#[test]
fn test_edit_entry_in_wrong_budget() -> Result<()> {
    let Month {
        mut planner,
        budget,
        rent,
        ..
    } = april()?;
    let other = planner.create_budget("april, frugal", date(2024, 4, 1), date(2024, 4, 30))?;

    let patch = EntryPatch {
        expected: Some(dec!(1)),
        ..Default::default()
    };
    if let Err(err) = planner.edit_entry(other, rent, patch) {
        assert_eq!(err, PlanningError::EntryNotFound(rent));
    } else {
        bail!("an entry can only be edited through its own budget");
    }

    assert_eq!(planner.budget(budget)?.expense().total(), dec!(1500));
    assert_eq!(planner.budget(other)?.expense().total(), Decimal::ZERO);

    if let Err(err) = planner.remove_entry(other, rent) {
        assert_eq!(err, PlanningError::EntryNotFound(rent));
    } else {
        bail!("an entry can only be removed through its own budget");
    }

    Ok(())
}

#[test]
fn test_rename() -> Result<()> {
    let Month {
        mut planner,
        budget,
        ledger,
        ..
    } = april()?;

    planner.budget_mut(budget)?.rename("april, revised");
    planner.ledger_mut(ledger)?.rename("joint checking");

    assert_eq!(planner.budget(budget)?.name(), "april, revised");
    assert_eq!(planner.ledger(ledger)?.name(), "joint checking");

    let restored = Planner::from_record(planner.export())?;
    assert_eq!(restored.budget(budget)?.name(), "april, revised");
    assert_eq!(restored.ledger(ledger)?.name(), "joint checking");

    Ok(())
}
