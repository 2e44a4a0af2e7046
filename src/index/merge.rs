//! Partial index store and the cooperative merge that folds it to one index.
//!
//! Map workers publish one fragment per file. After the phase barrier every
//! reduce worker runs [`FragmentStore::reduce`]: take two fragments under the
//! lock, merge them outside it, push the result back, until one is left.
//! The shape of the merge tree depends on scheduling; the result does not,
//! since [`GlobalIndex::merge`] is commutative and associative.

use crate::index::types::GlobalIndex;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Shared collection of index fragments
#[derive(Debug, Default)]
pub struct FragmentStore {
    fragments: Mutex<Vec<GlobalIndex>>,
}

impl FragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<GlobalIndex>> {
        self.fragments.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a fragment to the store
    pub fn publish(&self, fragment: GlobalIndex) {
        self.lock().push(fragment);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Merge fragments pairwise until at most one remains.
    ///
    /// Safe to run from any number of threads at once. A caller may return
    /// while another is still merging its last pair, so only trust the store
    /// once every caller has returned. Returns the merges this caller did.
    pub fn reduce(&self) -> usize {
        let mut merges = 0;

        loop {
            let pair = {
                let mut fragments = self.lock();
                if fragments.len() < 2 {
                    break;
                }
                let tail = fragments.len() - 2;
                fragments.split_off(tail)
            };

            let merged = merge_all(pair);
            debug!(words = merged.len(), "Merged fragment pair");
            self.lock().push(merged);
            merges += 1;
        }

        merges
    }

    /// Take the fully merged index, leaving the store empty.
    ///
    /// An empty store (no readable files) yields an empty index.
    pub fn take_global(&self) -> GlobalIndex {
        let mut fragments = self.lock();
        debug_assert!(fragments.len() <= 1, "store taken before reduction finished");
        merge_all(fragments.drain(..))
    }
}

/// Sequentially fold fragments into one index
pub fn merge_all(fragments: impl IntoIterator<Item = GlobalIndex>) -> GlobalIndex {
    fragments
        .into_iter()
        .reduce(GlobalIndex::merge)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::{FileIndex, PartialIndex};
    use std::thread;

    fn fragment(file_index: FileIndex, words: &[&str]) -> GlobalIndex {
        let mut partial = PartialIndex::new(file_index);
        for w in words {
            partial.insert(w.to_string());
        }
        partial.into()
    }

    #[test]
    fn test_reduce_single_thread() {
        let store = FragmentStore::new();
        store.publish(fragment(1, &["the", "cat"]));
        store.publish(fragment(2, &["the", "dog"]));
        store.publish(fragment(3, &["a"]));

        assert_eq!(store.reduce(), 2);
        assert_eq!(store.len(), 1);

        let global = store.take_global();
        assert_eq!(global.get("the"), Some(&[1, 2][..]));
        assert_eq!(global.get("a"), Some(&[3][..]));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reduce_empty_and_single() {
        let store = FragmentStore::new();
        assert_eq!(store.reduce(), 0);
        assert!(store.take_global().is_empty());

        store.publish(fragment(1, &["x"]));
        assert_eq!(store.reduce(), 0);
        assert_eq!(store.take_global().len(), 1);
    }

    #[test]
    fn test_concurrent_reduce_matches_sequential() {
        let fragments: Vec<_> = (1..=200)
            .map(|i| {
                let shared = format!("w{}", i % 7);
                let own = format!("only{}", i);
                fragment(i, &[shared.as_str(), own.as_str(), "common"])
            })
            .collect();
        let expected = merge_all(fragments.clone());

        let store = FragmentStore::new();
        for f in fragments {
            store.publish(f);
        }

        let merges: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..6).map(|_| s.spawn(|| store.reduce())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        // n fragments always take n - 1 merges, however they are split
        assert_eq!(merges, 199);
        let global = store.take_global();
        assert_eq!(global, expected);
        assert_eq!(global.get("common").map(|ids| ids.len()), Some(200));
    }

    #[test]
    fn test_merge_all_order_independent() {
        let a = fragment(1, &["x", "y"]);
        let b = fragment(2, &["y", "z"]);
        let c = fragment(3, &["x", "z"]);

        let forward = merge_all(vec![a.clone(), b.clone(), c.clone()]);
        let backward = merge_all(vec![c.clone(), b.clone(), a.clone()]);
        let nested = a.merge(c.merge(b));

        assert_eq!(forward, backward);
        assert_eq!(forward, nested);
        assert_eq!(forward.get("x"), Some(&[1, 3][..]));
    }
}
