//! Recency-ordered hash map, the slot substrate under both block caches.
//!
//! Keys are small `Copy` coordinate structs hashed by value. Entries live
//! in an index arena threaded with an intrusive doubly-linked recency
//! list, so `get`, `insert`, `remove`, and `shift` (evict-oldest) are all
//! O(1), including eviction under a cache full of entries.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Sentinel arena index for "no neighbor".
const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Hash map with exact least-recently-used ordering.
pub struct LruMap<K, V> {
    index: FxHashMap<K, usize>,
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    /// Most recently used.
    head: usize,
    /// Least recently used.
    tail: usize,
}

impl<K: Eq + Hash + Copy, V> LruMap<K, V> {
    pub fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or overwrite, marking `key` most recently used.
    /// Returns the previous value on overwrite.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&i) = self.index.get(&key) {
            let old = self.nodes[i]
                .as_mut()
                .map(|node| std::mem::replace(&mut node.value, value));
            self.promote(i);
            return old;
        }

        let i = match self.free.pop() {
            Some(i) => {
                self.nodes[i] = Some(Node { key, value, prev: NIL, next: NIL });
                i
            }
            None => {
                self.nodes.push(Some(Node { key, value, prev: NIL, next: NIL }));
                self.nodes.len() - 1
            }
        };
        self.push_front(i);
        self.index.insert(key, i);
        None
    }

    /// Look up and mark most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let i = *self.index.get(key)?;
        self.promote(i);
        self.nodes[i].as_ref().map(|node| &node.value)
    }

    /// Look up mutably and mark most recently used.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let i = *self.index.get(key)?;
        self.promote(i);
        self.nodes[i].as_mut().map(|node| &mut node.value)
    }

    /// Look up without touching recency.
    pub fn find(&self, key: &K) -> Option<&V> {
        let i = *self.index.get(key)?;
        self.nodes[i].as_ref().map(|node| &node.value)
    }

    /// Mutable lookup without touching recency.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let i = *self.index.get(key)?;
        self.nodes[i].as_mut().map(|node| &mut node.value)
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let i = self.index.remove(key)?;
        self.unlink(i);
        let node = self.nodes[i].take()?;
        self.free.push(i);
        Some(node.value)
    }

    /// Remove and return the least-recently-used pair.
    pub fn shift(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let i = self.tail;
        self.unlink(i);
        let node = self.nodes[i].take()?;
        self.index.remove(&node.key);
        self.free.push(i);
        Some((node.key, node.value))
    }

    /// Iterate over all pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.nodes
            .iter()
            .filter_map(|slot| slot.as_ref().map(|node| (&node.key, &node.value)))
    }

    fn promote(&mut self, i: usize) {
        if self.head == i {
            return;
        }
        self.unlink(i);
        self.push_front(i);
    }

    fn unlink(&mut self, i: usize) {
        let (prev, next) = match &self.nodes[i] {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            NIL => self.head = next,
            p => {
                if let Some(node) = self.nodes[p].as_mut() {
                    node.next = next;
                }
            }
        }
        match next {
            NIL => self.tail = prev,
            n => {
                if let Some(node) = self.nodes[n].as_mut() {
                    node.prev = prev;
                }
            }
        }
    }

    fn push_front(&mut self, i: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[i].as_mut() {
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            if let Some(node) = self.nodes[old_head].as_mut() {
                node.prev = i;
            }
        }
        self.head = i;
        if self.tail == NIL {
            self.tail = i;
        }
    }
}

impl<K: Eq + Hash + Copy, V> Default for LruMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
