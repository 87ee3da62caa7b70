use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::planning::planner::PlannerRecord;
use crate::planning::{BudgetId, EntryStatus, Identity, LedgerId, Planner, SectionKind};

#[derive(Debug, Deserialize)]
pub struct TransactionRow {
    pub name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct StatusRow {
    pub budget: BudgetId,
    pub section: SectionKind,
    #[serde(rename = "entry")]
    pub id: u32,
    pub name: String,
    pub expected: Decimal,
    pub actual: Decimal,
    pub remaining: Decimal,
}

impl StatusRow {
    fn new(budget: BudgetId, status: &EntryStatus) -> StatusRow {
        StatusRow {
            budget,
            section: status.kind,
            id: status.id.raw(),
            name: status.name.clone(),
            expected: status.expected,
            actual: status.actual,
            remaining: status.remaining(),
        }
    }
}

/// Loads planner state, starting empty when the file does not exist yet.
pub fn load_state(path: &Path) -> Result<Planner> {
    if !path.exists() {
        info!("no state at {}, starting empty", path.display());
        return Ok(Planner::new());
    }

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let record: PlannerRecord =
        serde_json::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(Planner::from_record(record)?)
}

pub fn save_state(path: &Path, planner: &Planner) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &planner.export())?;
    writer.flush()?;

    Ok(())
}

/// Enters every valid `name,amount,date` row into `ledger`. Invalid rows are
/// skipped. Returns how many transactions were entered.
pub fn import_transactions_csv(file_path: &Path, planner: &mut Planner, ledger: LedgerId) -> Result<usize> {
    let range = planner.ledger(ledger)?.range();
    let file = File::open(file_path).with_context(|| format!("failed to open {}", file_path.display()))?;
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut entered = 0;
    for record in csv_reader.deserialize::<TransactionRow>() {
        match record {
            Ok(row) => {
                if !range.contains(row.date) {
                    debug!("transaction {} dated {} falls outside ledger {}", row.name, row.date, ledger);
                }
                let id = planner.enter(ledger, row.name, row.amount, row.date)?;
                debug!("imported transaction {}", id);
                entered += 1;
            },
            Err(err) => debug!("failed to deserialize record, err={}", err),
        }
    }

    Ok(entered)
}

/// Writes one row per planned entry of every budget.
pub fn export_status_csv<W: Write>(planner: &Planner, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    for (budget, _) in planner.budgets() {
        for status in planner.status(budget)? {
            csv_writer.serialize(StatusRow::new(budget, &status))?;
        }
    }

    csv_writer.flush()?;

    Ok(())
}
