use indexmap::IndexSet;

/// Insertion-ordered set with a fixed capacity.
///
/// Once full, inserting a new key evicts the key that has been resident the
/// longest. Lookups never refresh a key's position.
#[derive(Debug, Clone)]
pub struct FifoSet<K> {
    set: IndexSet<K>,
    capacity: usize,
}

impl<K: std::hash::Hash + Eq> FifoSet<K> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "FifoSet capacity must be positive");
        Self {
            set: IndexSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `false` if the key was already present, in which case the set
    /// is left untouched.
    pub fn insert(&mut self, key: K) -> bool {
        self.insert_evicting(key).0
    }

    /// Same as [`FifoSet::insert`] but also hands back the evicted key, if any.
    pub fn insert_evicting(&mut self, key: K) -> (bool, Option<K>) {
        if self.set.contains(&key) {
            return (false, None);
        }

        let evicted = if self.set.len() == self.capacity {
            self.set.shift_remove_index(0)
        } else {
            None
        };

        self.set.insert(key);
        (true, evicted)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.set.contains(key)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.set.iter()
    }
}

impl<K: std::hash::Hash + Eq + Clone> FifoSet<K> {
    pub fn to_vec(&self) -> Vec<K> {
        self.set.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut set = FifoSet::new(3);
        assert!(set.insert(1));
        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut set = FifoSet::new(3);
        set.insert(1);
        set.insert(2);
        set.insert(3);

        let (inserted, evicted) = set.insert_evicting(4);
        assert!(inserted);
        assert_eq!(evicted, Some(1));
        assert_eq!(set.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn test_lookup_does_not_refresh_position() {
        let mut set = FifoSet::new(2);
        set.insert("a");
        set.insert("b");
        assert!(set.contains(&"a"));
        // re-inserting an existing key is not an access that moves it
        set.insert("a");
        set.insert("c");
        assert_eq!(set.to_vec(), vec!["b", "c"]);
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn test_zero_capacity_panics() {
        let _ = FifoSet::<u8>::new(0);
    }
}
