//! Stable-order traversal layered over an unordered keyed map.
//!
//! [`OrderedIndex`] records keys in insertion order and answers "in what
//! order do we enumerate". [`IndexedMapping`] pairs it with a `HashMap`
//! that answers "is this key present". The registry keeps one
//! `IndexedMapping` for datasets and one for observers.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::ControlFlow;

/// Keys in the order they were added.
///
/// Traversal is a lazy, finite, restartable sequence: every call to
/// [`iter`](Self::iter) starts a fresh pass over the keys added so far.
/// No duplicate detection is performed; callers guarantee uniqueness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedIndex<K> {
    keys: Vec<K>,
}

impl<K> OrderedIndex<K> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Create an empty index with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Append a key to the end of the traversal order.
    pub fn add(&mut self, key: K) {
        self.keys.push(key);
    }

    /// Start a new traversal in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keys.iter()
    }

    /// Number of keys added since creation or the last [`clear`](Self::clear).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Forget every key.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl<K> Default for OrderedIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'i, K> IntoIterator for &'i OrderedIndex<K> {
    type Item = &'i K;
    type IntoIter = std::slice::Iter<'i, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A `HashMap` with an [`OrderedIndex`] over its keys.
///
/// Lookups go through the map; every traversal goes through the index,
/// so enumeration order is insertion order regardless of hashing.
/// Entries are never removed individually.
#[derive(Clone, Debug)]
pub struct IndexedMapping<K, V> {
    mapping: HashMap<K, V>,
    index: OrderedIndex<K>,
}

impl<K, V> IndexedMapping<K, V>
where
    K: Copy + Eq + Hash,
{
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self {
            mapping: HashMap::new(),
            index: OrderedIndex::new(),
        }
    }

    /// Create an empty mapping with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mapping: HashMap::with_capacity(capacity),
            index: OrderedIndex::with_capacity(capacity),
        }
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.mapping.contains_key(key)
    }

    /// Insert a new entry at the end of the traversal order.
    ///
    /// If `key` is already present the mapping is left untouched and
    /// `value` is handed back.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), V> {
        if self.mapping.contains_key(&key) {
            return Err(value);
        }
        self.mapping.insert(key, value);
        self.index.add(key);
        Ok(())
    }

    /// Shared access to the value under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.mapping.get(key)
    }

    /// Exclusive access to the value under `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.mapping.get_mut(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> std::iter::Copied<std::slice::Iter<'_, K>> {
        self.index.iter().copied()
    }

    /// `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.index
            .iter()
            .filter_map(|key| self.mapping.get(key).map(|value| (*key, value)))
    }

    /// All values in unspecified order.
    ///
    /// For bulk updates where traversal order is irrelevant.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.mapping.values_mut()
    }

    /// Visit every entry mutably in insertion order, stopping early if
    /// `f` breaks.
    pub fn for_each_mut<B>(
        &mut self,
        mut f: impl FnMut(K, &mut V) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        for key in self.index.iter() {
            if let Some(value) = self.mapping.get_mut(key) {
                f(*key, value)?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Drop every entry and reset the traversal order.
    pub fn clear(&mut self) {
        self.mapping.clear();
        self.index.clear();
    }
}

impl<K, V> Default for IndexedMapping<K, V>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn index_iterates_in_insertion_order() {
        let mut index = OrderedIndex::new();
        for key in [3u32, 1, 2] {
            index.add(key);
        }
        assert_eq!(index.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn index_traversal_is_restartable() {
        let mut index = OrderedIndex::new();
        index.add('a');
        index.add('b');

        let mut first = index.iter();
        assert_eq!(first.next(), Some(&'a'));

        // A second traversal starts from the beginning regardless of the first.
        let second: Vec<_> = index.iter().collect();
        assert_eq!(second, vec![&'a', &'b']);
        assert_eq!(first.next(), Some(&'b'));
        assert_eq!(first.next(), None);
    }

    #[test]
    fn empty_index_yields_nothing() {
        let index: OrderedIndex<u32> = OrderedIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.iter().next(), None);
    }

    #[test]
    fn clear_resets_index() {
        let mut index = OrderedIndex::new();
        index.add(1u8);
        index.clear();
        assert_eq!(index.len(), 0);
        index.add(2);
        assert_eq!((&index).into_iter().collect::<Vec<_>>(), vec![&2]);
    }

    #[test]
    fn insert_rejects_duplicate_and_keeps_first() {
        let mut m = IndexedMapping::new();
        assert!(m.insert(5u32, "first").is_ok());
        assert_eq!(m.insert(5, "second"), Err("second"));
        assert_eq!(m.get(&5), Some(&"first"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn for_each_mut_stops_on_break() {
        let mut m = IndexedMapping::new();
        for k in [10u32, 20, 30] {
            m.insert(k, 0u32).unwrap();
        }
        let flow = m.for_each_mut(|k, v| {
            *v += 1;
            if k == 20 {
                ControlFlow::Break(k)
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(flow, ControlFlow::Break(20));
        assert_eq!(m.get(&10), Some(&1));
        assert_eq!(m.get(&20), Some(&1));
        assert_eq!(m.get(&30), Some(&0));
    }

    #[test]
    fn clear_empties_mapping_and_order() {
        let mut m = IndexedMapping::with_capacity(4);
        m.insert(1u32, ()).unwrap();
        m.clear();
        assert!(m.is_empty());
        assert!(!m.contains(&1));
        assert_eq!(m.keys().count(), 0);
        m.insert(1, ()).unwrap();
        assert!(m.contains(&1));
    }

    proptest! {
        #[test]
        fn traversal_order_is_insertion_order(keys in proptest::collection::hash_set(any::<u32>(), 0..64)) {
            let keys: Vec<u32> = keys.into_iter().collect();
            let mut m = IndexedMapping::new();
            for (i, k) in keys.iter().enumerate() {
                m.insert(*k, i).unwrap();
            }
            prop_assert_eq!(m.keys().collect::<Vec<_>>(), keys.clone());
            let values: Vec<usize> = m.iter().map(|(_, v)| *v).collect();
            prop_assert_eq!(values, (0..keys.len()).collect::<Vec<_>>());
        }

        #[test]
        fn repeated_traversals_agree(keys in proptest::collection::vec(any::<u16>(), 0..32)) {
            let mut index = OrderedIndex::new();
            for k in &keys {
                index.add(*k);
            }
            let a: Vec<_> = index.iter().collect();
            let b: Vec<_> = index.iter().collect();
            prop_assert_eq!(a, b);
            prop_assert_eq!(index.len(), keys.len());
        }
    }
}
