use std::collections::hash_map::Iter;

use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::range::DateRange;
use super::tally::{Amounted, Tally};
use super::{PlanningError, TransactionId};

/// An actual, dated amount recorded in a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Transaction {
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    amount: Decimal,
    #[getset(get_copy = "pub")]
    date: NaiveDate,
}

impl Transaction {
    pub fn new(name: impl Into<String>, amount: Decimal, date: NaiveDate) -> Transaction {
        Transaction {
            name: name.into(),
            amount,
            date,
        }
    }
}

impl Amounted for Transaction {
    fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Fields to change on an existing transaction. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

impl TransactionPatch {
    fn apply(self, transaction: &mut Transaction) {
        if let Some(name) = self.name {
            transaction.name = name;
        }
        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }
        if let Some(date) = self.date {
            transaction.date = date;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Informational only, recomputed on restore.
    #[serde(default)]
    pub total: Decimal,
    pub transactions: Vec<TransactionRecord>,
}

/// Dated transactions over a date range, with a running total.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    name: String,
    range: DateRange,
    transactions: Tally<TransactionId, Transaction>,
}

impl Ledger {
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Result<Ledger, PlanningError> {
        Ok(Ledger {
            name: name.into(),
            range: DateRange::new(start, end)?,
            transactions: Tally::new(),
        })
    }

    /// Records a transaction. An existing transaction with the same id is
    /// replaced and returned.
    pub fn enter(
        &mut self,
        id: TransactionId,
        name: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
    ) -> Option<Transaction> {
        let replaced = self.transactions.upsert(id, Transaction::new(name, amount, date));
        debug!(
            "ledger {}: entered transaction {}, amount={}, replaced={}",
            self.name,
            id,
            amount,
            replaced.is_some()
        );
        replaced
    }

    pub fn edit(&mut self, id: TransactionId, patch: TransactionPatch) -> Result<(), PlanningError> {
        self.transactions
            .update(id, |transaction| patch.apply(transaction))
            .ok_or(PlanningError::TransactionNotFound(id))?;
        debug!("ledger {}: edited transaction {}", self.name, id);

        Ok(())
    }

    pub fn remove(&mut self, id: TransactionId) -> Result<Transaction, PlanningError> {
        let removed = self
            .transactions
            .remove(id)
            .ok_or(PlanningError::TransactionNotFound(id))?;
        debug!("ledger {}: removed transaction {}", self.name, id);

        Ok(removed)
    }

    pub fn total(&self) -> Decimal {
        self.transactions.total()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn start(&self) -> NaiveDate {
        self.range.start()
    }

    pub fn end(&self) -> NaiveDate {
        self.range.end()
    }

    pub fn set_start(&mut self, start: NaiveDate) -> Result<(), PlanningError> {
        self.range.set_start(start)
    }

    pub fn set_end(&mut self, end: NaiveDate) -> Result<(), PlanningError> {
        self.range.set_end(end)
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(id)
    }

    pub fn contains(&self, id: TransactionId) -> bool {
        self.transactions.contains(id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> Iter<TransactionId, Transaction> {
        self.transactions.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.transactions.keys()
    }

    pub fn export(&self) -> LedgerRecord {
        LedgerRecord {
            name: self.name.clone(),
            start: self.start(),
            end: self.end(),
            total: self.total(),
            transactions: self
                .transactions
                .sorted()
                .into_iter()
                .map(|(id, transaction)| TransactionRecord {
                    id,
                    name: transaction.name.clone(),
                    amount: transaction.amount,
                    date: transaction.date,
                })
                .collect(),
        }
    }

    pub fn from_record(record: LedgerRecord) -> Result<Ledger, PlanningError> {
        let range = DateRange::new(record.start, record.end)?;
        let transactions: Tally<TransactionId, Transaction> = record
            .transactions
            .into_iter()
            .map(|tx| (tx.id, Transaction::new(tx.name, tx.amount, tx.date)))
            .collect();

        if transactions.total() != record.total {
            warn!(
                "ledger {}: stored total {} does not match recomputed total {}, using recomputed",
                record.name,
                record.total,
                transactions.total()
            );
        }

        Ok(Ledger {
            name: record.name,
            range,
            transactions,
        })
    }
}
