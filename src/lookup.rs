/// Ordered multi-map: key → values in insertion order, groups in creation order
///
/// Groups live in an arena and are chained per bucket. The most recently
/// created group's `next` points at the oldest one, so the creation order is a
/// ring that needs no separate list. The bucket table grows to `2n + 1` when
/// the group count reaches its length and all groups are re-chained.
use std::fmt;
use std::hash::Hash;
use std::ops::Index;

const INITIAL_BUCKETS: usize = 7;

struct Group<K, V> {
    key: K,
    hash: u64,
    values: Vec<V>,
    /// Next group in the same bucket
    chain: Option<usize>,
    /// Next group in creation order (wraps to the oldest)
    next: usize,
}

pub struct Lookup<K, V> {
    groups: Vec<Group<K, V>>,
    buckets: Vec<Option<usize>>,
    /// Most recently created group
    last: Option<usize>,
}

impl<K: Eq + Hash, V> Default for Lookup<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> Lookup<K, V> {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            buckets: vec![None; INITIAL_BUCKETS],
            last: None,
        }
    }

    /// Append `value` to `key`'s group, creating the group if needed
    pub fn add(&mut self, key: K, value: V) {
        let hash = fxhash::hash64(&key);
        match self.find(&key, hash) {
            Some(index) => self.groups[index].values.push(value),
            None => {
                let index = self.create(key, hash);
                self.groups[index].values.push(value);
            }
        }
    }

    /// Number of groups
    pub fn count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key, fxhash::hash64(key)).is_some()
    }

    /// Values for `key` in insertion order; empty when the key is absent
    pub fn get(&self, key: &K) -> &[V] {
        match self.find(key, fxhash::hash64(key)) {
            Some(index) => &self.groups[index].values,
            None => &[],
        }
    }

    /// Groups in creation order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            lookup: self,
            cursor: self.last.map(|last| self.groups[last].next),
            remaining: self.groups.len(),
        }
    }

    /// Transform every group, keeping creation order
    pub fn map_groups<R>(&self, mut f: impl FnMut(&K, &[V]) -> R) -> Vec<R> {
        self.iter().map(|(key, values)| f(key, values)).collect()
    }

    /// Group `items` by `key_of`
    pub fn from_iter_keyed<I, F>(items: I, mut key_of: F) -> Self
    where
        I: IntoIterator<Item = V>,
        F: FnMut(&V) -> K,
    {
        let mut lookup = Self::new();
        for item in items {
            lookup.add(key_of(&item), item);
        }
        lookup
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    fn find(&self, key: &K, hash: u64) -> Option<usize> {
        let mut cursor = self.buckets[self.bucket_of(hash)];
        while let Some(index) = cursor {
            let group = &self.groups[index];
            if group.hash == hash && group.key == *key {
                return Some(index);
            }
            cursor = group.chain;
        }
        None
    }

    fn create(&mut self, key: K, hash: u64) -> usize {
        if self.groups.len() == self.buckets.len() {
            self.resize();
        }

        let index = self.groups.len();
        let bucket = self.bucket_of(hash);
        let next = match self.last {
            Some(last) => {
                let first = self.groups[last].next;
                self.groups[last].next = index;
                first
            }
            None => index,
        };
        self.groups.push(Group {
            key,
            hash,
            values: Vec::new(),
            chain: self.buckets[bucket],
            next,
        });
        self.buckets[bucket] = Some(index);
        self.last = Some(index);
        index
    }

    fn resize(&mut self) {
        let size = self.groups.len() * 2 + 1;
        self.buckets = vec![None; size];
        for index in 0..self.groups.len() {
            let bucket = (self.groups[index].hash % size as u64) as usize;
            self.groups[index].chain = self.buckets[bucket];
            self.buckets[bucket] = Some(index);
        }
    }
}

impl<K: Eq + Hash, V> Index<&K> for Lookup<K, V> {
    type Output = [V];

    fn index(&self, key: &K) -> &[V] {
        self.get(key)
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for Lookup<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for (key, value) in iter {
            lookup.add(key, value);
        }
        lookup
    }
}

impl<K: fmt::Debug + Eq + Hash, V: fmt::Debug> fmt::Debug for Lookup<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(key, values)` in group creation order
pub struct Iter<'a, K, V> {
    lookup: &'a Lookup<K, V>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a [V]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.cursor?;
        let group = &self.lookup.groups[index];
        self.cursor = Some(group.next);
        self.remaining -= 1;
        Some((&group.key, group.values.as_slice()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: Eq + Hash, V> IntoIterator for &'a Lookup<K, V> {
    type Item = (&'a K, &'a [V]);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
