use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use keyward_core::Entity;

/// In-memory owner-isolated key/value table for tests/dev.
///
/// Records are partitioned by owning organization. `list` returns one
/// owner's records in first-insertion order, which stands in for a store's
/// retrieval order; replacing a record keeps its position.
#[derive(Debug)]
pub struct InMemoryOwnerStore<K, V> {
    inner: RwLock<Table<K, V>>,
}

#[derive(Debug)]
struct Table<K, V> {
    rows: HashMap<(String, K), (u64, V)>,
    next_seq: u64,
}

impl<K, V> InMemoryOwnerStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Table {
                rows: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl<K, V> Default for InMemoryOwnerStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> InMemoryOwnerStore<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn get(&self, owner: &str, key: &K) -> Option<V> {
        let table = self.inner.read().ok()?;
        table
            .rows
            .get(&(owner.to_string(), key.clone()))
            .map(|(_, v)| v.clone())
    }

    pub fn upsert(&self, owner: &str, key: K, value: V) {
        if let Ok(mut table) = self.inner.write() {
            let seq = table.next_seq;
            match table.rows.get_mut(&(owner.to_string(), key.clone())) {
                Some(row) => row.1 = value,
                None => {
                    table.rows.insert((owner.to_string(), key), (seq, value));
                    table.next_seq += 1;
                }
            }
        }
    }

    /// Upsert `value` under its own entity id.
    pub fn put(&self, owner: &str, value: V)
    where
        V: Entity<Id = K>,
    {
        self.upsert(owner, value.id(), value);
    }

    /// Apply `f` to the stored record, if any. Returns whether it existed.
    pub fn modify<F>(&self, owner: &str, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let Ok(mut table) = self.inner.write() else {
            return false;
        };
        match table.rows.get_mut(&(owner.to_string(), key.clone())) {
            Some((_, value)) => {
                f(value);
                true
            }
            None => false,
        }
    }

    pub fn list(&self, owner: &str) -> Vec<V> {
        let table = match self.inner.read() {
            Ok(t) => t,
            Err(_) => return vec![],
        };

        let mut rows: Vec<&(u64, V)> = table
            .rows
            .iter()
            .filter_map(|((o, _k), row)| if o == owner { Some(row) } else { None })
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn remove(&self, owner: &str, key: &K) -> Option<V> {
        let mut table = self.inner.write().ok()?;
        table
            .rows
            .remove(&(owner.to_string(), key.clone()))
            .map(|(_, v)| v)
    }

    /// Drop every record of `owner`.
    pub fn clear_owner(&self, owner: &str) {
        if let Ok(mut table) = self.inner.write() {
            table.rows.retain(|(o, _k), _v| o != owner);
        }
    }
}
