use std::fmt;

use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::range::DateRange;
use super::tally::{Amounted, Tally};
use super::{EntryId, PlanningError};

/// A planned line item: a name and the amount expected for it.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Entry {
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    expected: Decimal,
}

impl Entry {
    pub fn new(name: impl Into<String>, expected: Decimal) -> Entry {
        Entry {
            name: name.into(),
            expected,
        }
    }
}

impl Amounted for Entry {
    fn amount(&self) -> Decimal {
        self.expected
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub expected: Option<Decimal>,
}

impl EntryPatch {
    fn apply(self, entry: &mut Entry) {
        if let Some(name) = self.name {
            entry.name = name;
        }
        if let Some(expected) = self.expected {
            entry.expected = expected;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Income,
    Expense,
}

impl SectionKind {
    pub fn header(&self) -> &'static str {
        match self {
            SectionKind::Income => "income",
            SectionKind::Expense => "expense",
        }
    }

    pub fn other(&self) -> SectionKind {
        match self {
            SectionKind::Income => SectionKind::Expense,
            SectionKind::Expense => SectionKind::Income,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: EntryId,
    pub name: String,
    pub expected: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub header: SectionKind,
    #[serde(default)]
    pub total: Decimal,
    pub entries: Vec<EntryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub income: SectionRecord,
    pub expense: SectionRecord,
}

/// One half of a budget, holding planned entries and their running total.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    header: SectionKind,
    entries: Tally<EntryId, Entry>,
}

impl Section {
    pub fn new(header: SectionKind) -> Section {
        Section {
            header,
            entries: Tally::new(),
        }
    }

    pub fn header(&self) -> SectionKind {
        self.header
    }

    /// Plans an entry, replacing and returning any entry with the same id.
    pub fn plan(&mut self, id: EntryId, name: impl Into<String>, expected: Decimal) -> Option<Entry> {
        let replaced = self.entries.upsert(id, Entry::new(name, expected));
        debug!(
            "{} section: planned entry {}, expected={}, replaced={}",
            self.header,
            id,
            expected,
            replaced.is_some()
        );
        replaced
    }

    pub fn edit(&mut self, id: EntryId, patch: EntryPatch) -> Result<(), PlanningError> {
        self.entries
            .update(id, |entry| patch.apply(entry))
            .ok_or(PlanningError::EntryNotFound(id))?;
        debug!("{} section: edited entry {}", self.header, id);

        Ok(())
    }

    pub fn remove(&mut self, id: EntryId) -> Result<Entry, PlanningError> {
        let removed = self.entries.remove(id).ok_or(PlanningError::EntryNotFound(id))?;
        debug!("{} section: removed entry {}", self.header, id);

        Ok(removed)
    }

    pub fn total(&self) -> Decimal {
        self.entries.total()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.entries.keys()
    }

    /// Entries ordered by id.
    pub fn sorted(&self) -> Vec<(EntryId, &Entry)> {
        self.entries.sorted()
    }

    pub fn export(&self) -> SectionRecord {
        SectionRecord {
            header: self.header,
            total: self.total(),
            entries: self
                .entries
                .sorted()
                .into_iter()
                .map(|(id, entry)| EntryRecord {
                    id,
                    name: entry.name.clone(),
                    expected: entry.expected,
                })
                .collect(),
        }
    }

    pub fn from_record(record: SectionRecord) -> Section {
        let entries: Tally<EntryId, Entry> = record
            .entries
            .into_iter()
            .map(|entry| (entry.id, Entry::new(entry.name, entry.expected)))
            .collect();

        if entries.total() != record.total {
            warn!(
                "{} section: stored total {} does not match recomputed total {}, using recomputed",
                record.header,
                record.total,
                entries.total()
            );
        }

        Section {
            header: record.header,
            entries,
        }
    }
}

/// Planned cash flow over a date range, split into income and expense.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    name: String,
    range: DateRange,
    income: Section,
    expense: Section,
}

impl Budget {
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Result<Budget, PlanningError> {
        Ok(Budget {
            name: name.into(),
            range: DateRange::new(start, end)?,
            income: Section::new(SectionKind::Income),
            expense: Section::new(SectionKind::Expense),
        })
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

    pub fn income(&self) -> &Section {
        &self.income
    }

    pub fn expense(&self) -> &Section {
        &self.expense
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        match kind {
            SectionKind::Income => &self.income,
            SectionKind::Expense => &self.expense,
        }
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        match kind {
            SectionKind::Income => &mut self.income,
            SectionKind::Expense => &mut self.expense,
        }
    }

    /// Income total minus expense total.
    pub fn balance(&self) -> Decimal {
        self.income.total() - self.expense.total()
    }

    /// Plans an entry in `kind`. An entry with the same id in the other
    /// section is moved, so an id never lives in both sections.
    pub fn plan(
        &mut self,
        kind: SectionKind,
        id: EntryId,
        name: impl Into<String>,
        expected: Decimal,
    ) -> Option<Entry> {
        let moved = self.section_mut(kind.other()).remove(id).ok();
        let replaced = self.section_mut(kind).plan(id, name, expected);
        replaced.or(moved)
    }

    pub fn locate(&self, id: EntryId) -> Option<SectionKind> {
        [SectionKind::Income, SectionKind::Expense]
            .into_iter()
            .find(|kind| self.section(*kind).contains(id))
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.locate(id).is_some()
    }

    pub fn get(&self, id: EntryId) -> Option<(SectionKind, &Entry)> {
        let kind = self.locate(id)?;
        self.section(kind).get(id).map(|entry| (kind, entry))
    }

    pub fn edit(&mut self, id: EntryId, patch: EntryPatch) -> Result<(), PlanningError> {
        let kind = self.locate(id).ok_or(PlanningError::EntryNotFound(id))?;
        self.section_mut(kind).edit(id, patch)
    }

    pub fn remove(&mut self, id: EntryId) -> Result<Entry, PlanningError> {
        let kind = self.locate(id).ok_or(PlanningError::EntryNotFound(id))?;
        self.section_mut(kind).remove(id)
    }

    /// Ids of every entry in both sections.
    pub fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.income.ids().chain(self.expense.ids())
    }

    pub fn export(&self) -> BudgetRecord {
        BudgetRecord {
            name: self.name.clone(),
            start: self.start(),
            end: self.end(),
            income: self.income.export(),
            expense: self.expense.export(),
        }
    }

    pub fn from_record(record: BudgetRecord) -> Result<Budget, PlanningError> {
        let range = DateRange::new(record.start, record.end)?;
        let mut income = Section::from_record(record.income);
        let mut expense = Section::from_record(record.expense);
        income.header = SectionKind::Income;
        expense.header = SectionKind::Expense;

        let duplicated: Vec<EntryId> = income.ids().filter(|id| expense.contains(*id)).collect();
        for id in duplicated {
            warn!("budget {}: entry {} planned in both sections, keeping income", record.name, id);
            expense.entries.remove(id);
        }

        Ok(Budget {
            name: record.name,
            range,
            income,
            expense,
        })
    }
}
