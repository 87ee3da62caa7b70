use chrono::NaiveDate;
use thiserror::Error;

pub mod budget;
pub mod identity;
pub mod ledger;
pub mod links;
pub mod planner;
pub mod range;
pub mod tally;

pub use budget::{Budget, Entry, EntryPatch, Section, SectionKind};
pub use identity::{BudgetId, EntryId, IdentitySpace, Identity, LedgerId, TransactionId};
pub use ledger::{Ledger, Transaction, TransactionPatch};
pub use links::{BudgetLinks, EntryLinks, LinkGraph};
pub use planner::{EntryStatus, Planner};
pub use range::DateRange;

#[derive(Debug, PartialEq, Error)]
pub enum PlanningError {
    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),
    #[error("entry {0} not found")]
    EntryNotFound(EntryId),
    #[error("budget {0} not found")]
    BudgetNotFound(BudgetId),
    #[error("ledger {0} not found")]
    LedgerNotFound(LedgerId),
    #[error("invalid date range, {start} is not before {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown id namespace `{0}`")]
    UnknownNamespace(String),
    #[error("id namespace `{0}` has no ids left")]
    NamespaceExhausted(String),
    #[error("{namespace} id {id} is used more than once")]
    DuplicateId { namespace: &'static str, id: u32 },
    #[error("link graph is inconsistent: {0}")]
    LinkConsistencyViolation(String),
}

impl PlanningError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PlanningError::TransactionNotFound(_)
                | PlanningError::EntryNotFound(_)
                | PlanningError::BudgetNotFound(_)
                | PlanningError::LedgerNotFound(_)
        )
    }
}

#[cfg(test)]
mod planner_tests;
