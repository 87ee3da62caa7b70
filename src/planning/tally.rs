use std::collections::hash_map::Iter;
use std::collections::HashMap;
use std::hash::Hash;

use rust_decimal::Decimal;

/// Anything that contributes an amount to a running total.
pub trait Amounted {
    fn amount(&self) -> Decimal;
}

/// Keyed items with a cached sum of their amounts.
///
/// Every mutation applies exactly one delta to `total`, so the sum is never
/// rescanned and always equals the amounts of the items currently held.
#[derive(Debug, Clone)]
pub struct Tally<K, V> {
    items: HashMap<K, V>,
    total: Decimal,
}

impl<K, V> Default for Tally<K, V> {
    fn default() -> Self {
        Tally {
            items: HashMap::new(),
            total: Decimal::ZERO,
        }
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for Tally<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.total == other.total && self.items == other.items
    }
}

impl<K: Copy + Eq + Hash + Ord, V: Amounted> Tally<K, V> {
    pub fn new() -> Tally<K, V> {
        Tally::default()
    }

    /// Inserts `value`, returning the item it replaced.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        let added = value.amount();
        let replaced = self.items.insert(key, value);

        let delta = match &replaced {
            Some(old) => added - old.amount(),
            None => added,
        };
        self.total += delta;

        replaced
    }

    /// Edits an item in place. Returns `None` if the key is absent.
    pub fn update<F>(&mut self, key: K, edit: F) -> Option<()>
    where
        F: FnOnce(&mut V),
    {
        let item = self.items.get_mut(&key)?;
        let before = item.amount();
        edit(item);
        self.total += item.amount() - before;

        Some(())
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let removed = self.items.remove(&key)?;
        self.total -= removed.amount();

        Some(removed)
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.items.get(&key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.items.contains_key(&key)
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> Iter<K, V> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.items.keys().copied()
    }

    /// Items ordered by key.
    pub fn sorted(&self) -> Vec<(K, &V)> {
        let mut items: Vec<(K, &V)> = self.items.iter().map(|(key, value)| (*key, value)).collect();
        items.sort_by_key(|(key, _)| *key);
        items
    }
}

impl<K: Copy + Eq + Hash + Ord, V: Amounted> FromIterator<(K, V)> for Tally<K, V> {
    /// The total is recomputed from the collected items.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for (key, value) in iter {
            tally.upsert(key, value);
        }
        tally
    }
}
