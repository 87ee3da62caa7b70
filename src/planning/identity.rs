use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::PlanningError;

/// An id type bound to the namespace it is allocated from.
pub trait Identity: Copy + Ord + fmt::Debug {
    const NAMESPACE: &'static str;

    fn from_raw(raw: u32) -> Self;
    fn raw(self) -> u32;
}

macro_rules! identity {
    ($(#[$meta:meta])* $name:ident, $namespace:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl Identity for $name {
            const NAMESPACE: &'static str = $namespace;

            fn from_raw(raw: u32) -> Self {
                $name(raw)
            }

            fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identity!(
    /// Identifies a budget.
    BudgetId,
    "budget"
);
identity!(
    /// Identifies a ledger.
    LedgerId,
    "ledger"
);
identity!(
    /// Identifies a planned entry in any section of any budget.
    EntryId,
    "planned-entry"
);
identity!(
    /// Identifies a transaction in any ledger.
    TransactionId,
    "transaction"
);

/// Monotonic id generator. `current` is always the next id to hand out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    current: u32,
}

impl Counter {
    pub fn starting_at(current: u32) -> Counter {
        Counter { current }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Hands out the current id. `None` once the counter cannot move further,
    /// in which case it is left untouched.
    pub fn advance(&mut self) -> Option<u32> {
        let id = self.current;
        self.current = id.checked_add(1)?;
        Some(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub namespaces: BTreeMap<String, u32>,
}

/// Independent id counters keyed by namespace name. Ids are never reissued.
#[derive(Debug, Clone, Default)]
pub struct IdentitySpace {
    namespaces: HashMap<String, Counter>,
}

impl IdentitySpace {
    pub fn new() -> IdentitySpace {
        IdentitySpace {
            namespaces: HashMap::new(),
        }
    }

    /// Space with the budget, ledger, entry and transaction namespaces in place.
    pub fn standard() -> IdentitySpace {
        let mut space = IdentitySpace::new();
        space.ensure(BudgetId::NAMESPACE);
        space.ensure(LedgerId::NAMESPACE);
        space.ensure(EntryId::NAMESPACE);
        space.ensure(TransactionId::NAMESPACE);
        space
    }

    pub fn ensure(&mut self, namespace: &str) {
        if !self.namespaces.contains_key(namespace) {
            debug!("creating id namespace {}", namespace);
            self.namespaces.insert(namespace.to_owned(), Counter::default());
        }
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    pub fn peek(&self, namespace: &str) -> Result<u32, PlanningError> {
        self.namespaces
            .get(namespace)
            .map(Counter::current)
            .ok_or_else(|| PlanningError::UnknownNamespace(namespace.to_owned()))
    }

    pub fn allocate(&mut self, namespace: &str) -> Result<u32, PlanningError> {
        let counter = self
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| PlanningError::UnknownNamespace(namespace.to_owned()))?;

        counter
            .advance()
            .ok_or_else(|| PlanningError::NamespaceExhausted(namespace.to_owned()))
    }

    pub fn next<T: Identity>(&mut self) -> Result<T, PlanningError> {
        self.allocate(T::NAMESPACE).map(T::from_raw)
    }

    pub fn peek_as<T: Identity>(&self) -> Result<T, PlanningError> {
        self.peek(T::NAMESPACE).map(T::from_raw)
    }

    /// Makes sure `used` can never be allocated from `namespace`. Counters only move forward.
    pub fn reserve(&mut self, namespace: &str, used: u32) -> Result<(), PlanningError> {
        let counter = self
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| PlanningError::UnknownNamespace(namespace.to_owned()))?;

        if counter.current <= used {
            let next = used
                .checked_add(1)
                .ok_or_else(|| PlanningError::NamespaceExhausted(namespace.to_owned()))?;
            *counter = Counter::starting_at(next);
        }

        Ok(())
    }

    pub fn export(&self) -> IdentityRecord {
        IdentityRecord {
            namespaces: self
                .namespaces
                .iter()
                .map(|(name, counter)| (name.clone(), counter.current()))
                .collect(),
        }
    }

    pub fn from_record(record: IdentityRecord) -> IdentitySpace {
        IdentitySpace {
            namespaces: record
                .namespaces
                .into_iter()
                .map(|(name, current)| (name, Counter::starting_at(current)))
                .collect(),
        }
    }
}
