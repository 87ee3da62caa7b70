use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::budget::BudgetRecord;
use super::identity::IdentityRecord;
use super::ledger::LedgerRecord;
use super::links::LinkRecord;
use super::{
    Budget, BudgetId, BudgetLinks, Entry, EntryId, EntryLinks, EntryPatch, IdentitySpace, Identity, Ledger, LedgerId,
    PlanningError, SectionKind, Transaction, TransactionId, TransactionPatch,
};

/// Planned versus actual amounts for one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryStatus {
    pub kind: SectionKind,
    pub id: EntryId,
    pub name: String,
    pub expected: Decimal,
    pub actual: Decimal,
}

impl EntryStatus {
    pub fn remaining(&self) -> Decimal {
        self.expected - self.actual
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerRecord {
    pub ids: IdentityRecord,
    pub budgets: Vec<BudgetRecordEntry>,
    pub ledgers: Vec<LedgerRecordEntry>,
    pub entry_links: Vec<LinkRecord<EntryId, TransactionId>>,
    pub budget_links: Vec<LinkRecord<LedgerId, BudgetId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecordEntry {
    pub id: BudgetId,
    pub budget: BudgetRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecordEntry {
    pub id: LedgerId,
    pub ledger: LedgerRecord,
}

/// Owns every budget and ledger along with the links between them, and keeps
/// them consistent: ids are validated before linking and links are dropped
/// before the records they point at are removed.
#[derive(Debug, Clone)]
pub struct Planner {
    ids: IdentitySpace,
    budgets: BTreeMap<BudgetId, Budget>,
    ledgers: BTreeMap<LedgerId, Ledger>,
    entry_links: EntryLinks,
    budget_links: BudgetLinks,
}

impl Default for Planner {
    fn default() -> Self {
        Planner::new()
    }
}

impl Planner {
    pub fn new() -> Planner {
        Planner {
            ids: IdentitySpace::standard(),
            budgets: BTreeMap::new(),
            ledgers: BTreeMap::new(),
            entry_links: EntryLinks::new(),
            budget_links: BudgetLinks::new(),
        }
    }

    pub fn create_budget(
        &mut self,
        name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BudgetId, PlanningError> {
        let budget = Budget::new(name, start, end)?;
        let id = self.ids.next::<BudgetId>()?;
        debug!("created budget {} ({})", id, budget.name());
        self.budgets.insert(id, budget);

        Ok(id)
    }

    /// New budget carrying copies of the source's entries under fresh ids.
    pub fn clone_budget(
        &mut self,
        source: BudgetId,
        name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BudgetId, PlanningError> {
        let mut budget = Budget::new(name, start, end)?;
        let mut planned: Vec<(SectionKind, Entry)> = Vec::new();
        let source_budget = self.budget(source)?;
        for kind in [SectionKind::Income, SectionKind::Expense] {
            for (_, entry) in source_budget.section(kind).sorted() {
                planned.push((kind, entry.clone()));
            }
        }

        let id = self.ids.next::<BudgetId>()?;
        for (kind, entry) in planned {
            let entry_id = self.ids.next::<EntryId>()?;
            budget.plan(kind, entry_id, entry.name().clone(), entry.expected());
        }
        debug!("cloned budget {} into {} ({})", source, id, budget.name());
        self.budgets.insert(id, budget);

        Ok(id)
    }

    pub fn create_ledger(
        &mut self,
        name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<LedgerId, PlanningError> {
        let ledger = Ledger::new(name, start, end)?;
        let id = self.ids.next::<LedgerId>()?;
        debug!("created ledger {} ({})", id, ledger.name());
        self.ledgers.insert(id, ledger);

        Ok(id)
    }

    pub fn budget(&self, id: BudgetId) -> Result<&Budget, PlanningError> {
        self.budgets.get(&id).ok_or(PlanningError::BudgetNotFound(id))
    }

    pub fn ledger(&self, id: LedgerId) -> Result<&Ledger, PlanningError> {
        self.ledgers.get(&id).ok_or(PlanningError::LedgerNotFound(id))
    }

    /// Mutable access for renaming and date range changes.
    pub fn budget_mut(&mut self, id: BudgetId) -> Result<&mut Budget, PlanningError> {
        self.budgets.get_mut(&id).ok_or(PlanningError::BudgetNotFound(id))
    }

    pub fn ledger_mut(&mut self, id: LedgerId) -> Result<&mut Ledger, PlanningError> {
        self.ledgers.get_mut(&id).ok_or(PlanningError::LedgerNotFound(id))
    }

    pub fn budgets(&self) -> impl Iterator<Item = (BudgetId, &Budget)> {
        self.budgets.iter().map(|(id, budget)| (*id, budget))
    }

    pub fn ledgers(&self) -> impl Iterator<Item = (LedgerId, &Ledger)> {
        self.ledgers.iter().map(|(id, ledger)| (*id, ledger))
    }

    pub fn remove_budget(&mut self, id: BudgetId) -> Result<Budget, PlanningError> {
        let entry_ids: Vec<EntryId> = self.budget(id)?.ids().collect();
        for entry_id in entry_ids {
            self.entry_links.release_owner(entry_id);
        }
        self.budget_links.release_member(id);

        self.budgets.remove(&id).ok_or(PlanningError::BudgetNotFound(id))
    }

    pub fn remove_ledger(&mut self, id: LedgerId) -> Result<Ledger, PlanningError> {
        let transaction_ids: Vec<TransactionId> = self.ledger(id)?.ids().collect();
        for transaction_id in transaction_ids {
            self.entry_links.release_member(transaction_id);
        }
        self.budget_links.release_owner(id);

        self.ledgers.remove(&id).ok_or(PlanningError::LedgerNotFound(id))
    }

    pub fn plan(
        &mut self,
        budget: BudgetId,
        kind: SectionKind,
        name: impl Into<String>,
        expected: Decimal,
    ) -> Result<EntryId, PlanningError> {
        self.budget(budget)?;
        let id = self.ids.next::<EntryId>()?;
        self.budget_mut(budget)?.plan(kind, id, name, expected);

        Ok(id)
    }

    pub fn edit_entry(&mut self, budget: BudgetId, entry: EntryId, patch: EntryPatch) -> Result<(), PlanningError> {
        self.budget_mut(budget)?.edit(entry, patch)
    }

    pub fn remove_entry(&mut self, budget: BudgetId, entry: EntryId) -> Result<Entry, PlanningError> {
        if !self.budget(budget)?.contains(entry) {
            return Err(PlanningError::EntryNotFound(entry));
        }

        self.entry_links.release_owner(entry);
        self.budget_mut(budget)?.remove(entry)
    }

    pub fn enter(
        &mut self,
        ledger: LedgerId,
        name: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<TransactionId, PlanningError> {
        self.ledger(ledger)?;
        let id = self.ids.next::<TransactionId>()?;
        self.ledger_mut(ledger)?.enter(id, name, amount, date);

        Ok(id)
    }

    pub fn edit_transaction(
        &mut self,
        ledger: LedgerId,
        transaction: TransactionId,
        patch: TransactionPatch,
    ) -> Result<(), PlanningError> {
        self.ledger_mut(ledger)?.edit(transaction, patch)
    }

    pub fn remove_transaction(
        &mut self,
        ledger: LedgerId,
        transaction: TransactionId,
    ) -> Result<Transaction, PlanningError> {
        if !self.ledger(ledger)?.contains(transaction) {
            return Err(PlanningError::TransactionNotFound(transaction));
        }

        self.entry_links.release_member(transaction);
        self.ledger_mut(ledger)?.remove(transaction)
    }

    /// Counts `transaction` against `entry`, moving it off any other entry.
    pub fn link(&mut self, entry: EntryId, transaction: TransactionId) -> Result<Option<EntryId>, PlanningError> {
        self.find_entry(entry)?;
        self.find_transaction(transaction)?;

        Ok(self.entry_links.link(entry, transaction))
    }

    pub fn unlink(&mut self, entry: EntryId, transaction: TransactionId) -> bool {
        self.entry_links.unlink(entry, transaction)
    }

    pub fn entry_links(&self) -> &EntryLinks {
        &self.entry_links
    }

    /// Compares `budget` against `ledger`, replacing any ledger it had.
    pub fn associate(&mut self, budget: BudgetId, ledger: LedgerId) -> Result<Option<LedgerId>, PlanningError> {
        self.budget(budget)?;
        self.ledger(ledger)?;

        Ok(self.budget_links.link(ledger, budget))
    }

    pub fn ledger_for(&self, budget: BudgetId) -> Option<LedgerId> {
        self.budget_links.owner(budget)
    }

    pub fn budgets_for(&self, ledger: LedgerId) -> BTreeSet<BudgetId> {
        self.budget_links.members(ledger)
    }

    /// Sum of the transactions linked to `entry`. Links to transactions that
    /// no longer exist contribute nothing.
    pub fn actual(&self, entry: EntryId) -> Decimal {
        self.entry_links
            .members(entry)
            .into_iter()
            .filter_map(|transaction| self.find_transaction(transaction).ok())
            .map(|(_, transaction)| transaction.amount())
            .sum()
    }

    pub fn status(&self, budget: BudgetId) -> Result<Vec<EntryStatus>, PlanningError> {
        let budget = self.budget(budget)?;
        let mut status = Vec::with_capacity(budget.income().len() + budget.expense().len());
        for kind in [SectionKind::Income, SectionKind::Expense] {
            for (id, entry) in budget.section(kind).sorted() {
                status.push(EntryStatus {
                    kind,
                    id,
                    name: entry.name().clone(),
                    expected: entry.expected(),
                    actual: self.actual(id),
                });
            }
        }
        status.sort_by_key(|entry| entry.id);

        Ok(status)
    }

    /// Transactions in `ledger` not counted against any entry, ordered by id.
    pub fn unlinked(&self, ledger: LedgerId) -> Result<Vec<TransactionId>, PlanningError> {
        let mut unlinked: Vec<TransactionId> = self
            .ledger(ledger)?
            .ids()
            .filter(|id| self.entry_links.owner(*id).is_none())
            .collect();
        unlinked.sort();

        Ok(unlinked)
    }

    fn find_entry(&self, entry: EntryId) -> Result<(BudgetId, &Entry), PlanningError> {
        self.budgets
            .iter()
            .find_map(|(id, budget)| budget.get(entry).map(|(_, found)| (*id, found)))
            .ok_or(PlanningError::EntryNotFound(entry))
    }

    fn find_transaction(&self, transaction: TransactionId) -> Result<(LedgerId, &Transaction), PlanningError> {
        self.ledgers
            .iter()
            .find_map(|(id, ledger)| ledger.get(transaction).map(|found| (*id, found)))
            .ok_or(PlanningError::TransactionNotFound(transaction))
    }

    pub fn export(&self) -> PlannerRecord {
        PlannerRecord {
            ids: self.ids.export(),
            budgets: self
                .budgets
                .iter()
                .map(|(id, budget)| BudgetRecordEntry {
                    id: *id,
                    budget: budget.export(),
                })
                .collect(),
            ledgers: self
                .ledgers
                .iter()
                .map(|(id, ledger)| LedgerRecordEntry {
                    id: *id,
                    ledger: ledger.export(),
                })
                .collect(),
            entry_links: self.entry_links.export(),
            budget_links: self.budget_links.export(),
        }
    }

    /// Restores a planner. Every id found in the records is reserved so it
    /// can never be allocated again.
    pub fn from_record(record: PlannerRecord) -> Result<Planner, PlanningError> {
        let mut ids = IdentitySpace::from_record(record.ids);
        for namespace in [
            BudgetId::NAMESPACE,
            LedgerId::NAMESPACE,
            EntryId::NAMESPACE,
            TransactionId::NAMESPACE,
        ] {
            ids.ensure(namespace);
        }

        let mut budgets: BTreeMap<BudgetId, Budget> = BTreeMap::new();
        let mut seen_entries = BTreeSet::new();
        for entry in record.budgets {
            let budget = Budget::from_record(entry.budget)?;
            ids.reserve(BudgetId::NAMESPACE, entry.id.raw())?;
            if budgets.contains_key(&entry.id) {
                return Err(duplicate(entry.id));
            }
            for entry_id in budget.ids() {
                if !seen_entries.insert(entry_id) {
                    return Err(duplicate(entry_id));
                }
                ids.reserve(EntryId::NAMESPACE, entry_id.raw())?;
            }
            budgets.insert(entry.id, budget);
        }

        let mut ledgers: BTreeMap<LedgerId, Ledger> = BTreeMap::new();
        let mut seen_transactions = BTreeSet::new();
        for entry in record.ledgers {
            let ledger = Ledger::from_record(entry.ledger)?;
            ids.reserve(LedgerId::NAMESPACE, entry.id.raw())?;
            if ledgers.contains_key(&entry.id) {
                return Err(duplicate(entry.id));
            }
            for transaction_id in ledger.ids() {
                if !seen_transactions.insert(transaction_id) {
                    return Err(duplicate(transaction_id));
                }
                ids.reserve(TransactionId::NAMESPACE, transaction_id.raw())?;
            }
            ledgers.insert(entry.id, ledger);
        }

        Ok(Planner {
            ids,
            budgets,
            ledgers,
            entry_links: EntryLinks::from_records(record.entry_links)?,
            budget_links: BudgetLinks::from_records(record.budget_links)?,
        })
    }
}

fn duplicate<T: Identity>(id: T) -> PlanningError {
    PlanningError::DuplicateId {
        namespace: T::NAMESPACE,
        id: id.raw(),
    }
}
