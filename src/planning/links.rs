use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{BudgetId, EntryId, LedgerId, PlanningError, TransactionId};

/// Transactions counted against the planned entry that owns them.
pub type EntryLinks = LinkGraph<EntryId, TransactionId>;

/// Budgets compared against the ledger that owns them. A budget has at most
/// one ledger, a ledger may serve many budgets.
pub type BudgetLinks = LinkGraph<LedgerId, BudgetId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord<O, M> {
    pub owner: O,
    pub member: M,
}

/// Many-to-one relation from members to owners, stored in both directions.
///
/// After every operation, `owner_of[m] == o` holds exactly when `m` is in
/// `members_of[o]`, and no member set is ever empty. The graph only knows ids,
/// it never checks that they exist anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkGraph<O, M> {
    owner_of: BTreeMap<M, O>,
    members_of: BTreeMap<O, BTreeSet<M>>,
}

impl<O, M> Default for LinkGraph<O, M> {
    fn default() -> Self {
        LinkGraph {
            owner_of: BTreeMap::new(),
            members_of: BTreeMap::new(),
        }
    }
}

impl<O: Copy + Ord + Debug, M: Copy + Ord + Debug> LinkGraph<O, M> {
    pub fn new() -> LinkGraph<O, M> {
        LinkGraph::default()
    }

    /// Links `member` to `owner`. A member already linked elsewhere is moved,
    /// and its previous owner is returned.
    pub fn link(&mut self, owner: O, member: M) -> Option<O> {
        let previous = match self.owner_of.get(&member) {
            Some(current) if *current == owner => return None,
            Some(current) => Some(*current),
            None => None,
        };

        if let Some(previous) = previous {
            self.detach(previous, member);
        }

        self.owner_of.insert(member, owner);
        self.members_of.entry(owner).or_default().insert(member);
        debug!("linked {:?} to {:?}, previous owner {:?}", member, owner, previous);

        previous
    }

    /// Removes the link only if `member` is currently owned by `owner`.
    pub fn unlink(&mut self, owner: O, member: M) -> bool {
        if !self.is_linked(owner, member) {
            return false;
        }

        self.detach(owner, member);
        debug!("unlinked {:?} from {:?}", member, owner);

        true
    }

    pub fn is_linked(&self, owner: O, member: M) -> bool {
        self.owner_of.get(&member) == Some(&owner)
            && self
                .members_of
                .get(&owner)
                .is_some_and(|members| members.contains(&member))
    }

    /// Members owned by `owner`, empty for an unknown owner.
    pub fn members(&self, owner: O) -> BTreeSet<M> {
        self.members_of.get(&owner).cloned().unwrap_or_default()
    }

    pub fn owner(&self, member: M) -> Option<O> {
        self.owner_of.get(&member).copied()
    }

    /// Drops the link of `member`, whatever its owner, returning that owner.
    pub fn release_member(&mut self, member: M) -> Option<O> {
        let owner = self.owner(member)?;
        self.unlink(owner, member);
        Some(owner)
    }

    /// Drops every link of `owner`, returning the members that were freed.
    pub fn release_owner(&mut self, owner: O) -> BTreeSet<M> {
        let members = self.members_of.remove(&owner).unwrap_or_default();
        for member in &members {
            self.owner_of.remove(member);
        }
        debug!("released {} members of {:?}", members.len(), owner);

        members
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.owner_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner_of.is_empty()
    }

    /// All `(owner, member)` pairs ordered by member.
    pub fn pairs(&self) -> impl Iterator<Item = (O, M)> + '_ {
        self.owner_of.iter().map(|(member, owner)| (*owner, *member))
    }

    /// Verifies that both directions of the relation agree.
    pub fn check(&self) -> Result<(), PlanningError> {
        for (member, owner) in &self.owner_of {
            if !self.members_of.get(owner).is_some_and(|members| members.contains(member)) {
                return Err(PlanningError::LinkConsistencyViolation(format!(
                    "{:?} points at {:?} but is not among its members",
                    member, owner
                )));
            }
        }

        for (owner, members) in &self.members_of {
            if members.is_empty() {
                return Err(PlanningError::LinkConsistencyViolation(format!(
                    "{:?} has an empty member set",
                    owner
                )));
            }
            for member in members {
                if self.owner_of.get(member) != Some(owner) {
                    return Err(PlanningError::LinkConsistencyViolation(format!(
                        "{:?} lists {:?} which points elsewhere",
                        owner, member
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn export(&self) -> Vec<LinkRecord<O, M>> {
        self.pairs().map(|(owner, member)| LinkRecord { owner, member }).collect()
    }

    /// Rebuilds a graph, rejecting a member listed under two different owners.
    pub fn from_records(records: Vec<LinkRecord<O, M>>) -> Result<LinkGraph<O, M>, PlanningError> {
        let mut graph = LinkGraph::new();
        for LinkRecord { owner, member } in records {
            match graph.owner(member) {
                Some(current) if current != owner => {
                    return Err(PlanningError::LinkConsistencyViolation(format!(
                        "{:?} is linked to both {:?} and {:?}",
                        member, current, owner
                    )));
                },
                _ => {
                    graph.link(owner, member);
                },
            }
        }

        graph.check()?;
        Ok(graph)
    }

    fn detach(&mut self, owner: O, member: M) {
        self.owner_of.remove(&member);
        if let Some(members) = self.members_of.get_mut(&owner) {
            members.remove(&member);
            if members.is_empty() {
                self.members_of.remove(&owner);
            }
        }
    }
}
