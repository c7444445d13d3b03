//! Recency Index Module
//!
//! Tracks key recency for LRU eviction as an intrusive doubly-linked list
//! stored in a slot arena.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// == Node ==
#[derive(Debug, Clone)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency Index ==
/// Orders keys by recency of `touch`.
///
/// - Head = most recently used
/// - Tail = least recently used
///
/// Slots freed by removal are reused, so touch/remove/evict are O(1).
#[derive(Debug, Clone, Default)]
pub struct RecencyIndex {
    /// Slot arena, None = free slot
    slots: Vec<Option<Node>>,
    /// Free slot indices
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Key to slot lookup
    positions: HashMap<String, usize>,
    /// Number of linked nodes
    len: usize,
}

impl RecencyIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from keys ordered most-recent first.
    ///
    /// Duplicates are kept as separate nodes so that `has_duplicates` can
    /// report them.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut index = Self::new();
        for key in keys {
            let slot = index.alloc(key.clone());
            index.link_back(slot);
            index.positions.entry(key).or_insert(slot);
        }
        index
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unknown.
    pub fn touch(&mut self, key: &str) {
        if let Some(&slot) = self.positions.get(key) {
            if self.head != Some(slot) {
                self.unlink(slot);
                self.link_front(slot);
            }
            return;
        }

        let slot = self.alloc(key.to_string());
        self.link_front(slot);
        self.positions.insert(key.to_string(), slot);
    }

    // == Remove ==
    /// Removes a key. Returns false if it was not tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.positions.remove(key) {
            Some(slot) => {
                self.unlink(slot);
                self.release(slot);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let slot = self.tail?;
        self.unlink(slot);
        let node = self.release(slot)?;
        if self.positions.get(&node.key) == Some(&slot) {
            self.positions.remove(&node.key);
        }
        Some(node.key)
    }

    // == Peek ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.tail.and_then(|slot| self.node(slot)).map(|n| n.key.as_str())
    }

    /// Returns the most recently used key.
    pub fn peek_newest(&self) -> Option<&str> {
        self.head.and_then(|slot| self.node(slot)).map(|n| n.key.as_str())
    }

    // == Clear ==
    /// Drops every key, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.positions.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// True if some key is linked more than once.
    pub fn has_duplicates(&self) -> bool {
        self.positions.len() != self.len
    }

    // == Iteration ==
    /// Iterates keys from most to least recently used.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            index: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Snapshot of keys, head first.
    pub fn most_to_least_recent(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }

    /// Snapshot of keys, tail first.
    pub fn least_to_most_recent(&self) -> Vec<String> {
        let mut keys = self.most_to_least_recent();
        keys.reverse();
        keys
    }

    // == Well Formed ==
    /// Walks the list in both directions and checks the links agree with
    /// `len` and with the key lookup.
    pub fn is_well_formed(&self) -> bool {
        let mut count = 0;
        let mut prev = None;
        let mut cursor = self.head;

        while let Some(slot) = cursor {
            let Some(node) = self.node(slot) else {
                return false;
            };
            if node.prev != prev || count >= self.len {
                return false;
            }
            count += 1;
            prev = Some(slot);
            cursor = node.next;
        }

        if count != self.len || self.tail != prev {
            return false;
        }

        self.positions
            .iter()
            .all(|(key, &slot)| self.node(slot).is_some_and(|n| &n.key == key))
    }

    // == Slot Management ==
    fn node(&self, slot: usize) -> Option<&Node> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn alloc(&mut self, key: String) -> usize {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) -> Option<Node> {
        let node = self.slots.get_mut(slot)?.take();
        if node.is_some() {
            self.free.push(slot);
        }
        node
    }

    fn link_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head.and_then(|h| self.node_mut(h)) {
            Some(head) => head.prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        self.len += 1;
    }

    fn link_back(&mut self, slot: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(slot) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail.and_then(|t| self.node_mut(t)) {
            Some(tail) => tail.next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
    }

    fn unlink(&mut self, slot: usize) {
        let Some((prev, next)) = self.node(slot).map(|n| (n.prev, n.next)) else {
            return;
        };

        match prev.and_then(|p| self.node_mut(p)) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.node_mut(n)) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = None;
        }
        self.len -= 1;
    }
}

// == Iterator ==
/// Head-to-tail key iterator.
pub struct Iter<'a> {
    index: &'a RecencyIndex,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.index.node(self.cursor?)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(node.key.as_str())
    }
}

// == Serde ==
// Persisted as a plain array of keys, most recent first.
impl Serialize for RecencyIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RecencyIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(Self::from_keys)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recency_new() {
        let index = RecencyIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_touch_new_keys() {
        let mut index = RecencyIndex::new();

        index.touch("key1");
        index.touch("key2");
        index.touch("key3");

        assert_eq!(index.len(), 3);
        assert_eq!(index.peek_oldest(), Some("key1"));
        assert_eq!(index.peek_newest(), Some("key3"));
        assert_eq!(index.most_to_least_recent(), vec!["key3", "key2", "key1"]);
    }

    #[test]
    fn test_touch_existing_key_moves_to_front() {
        let mut index = RecencyIndex::new();

        index.touch("a");
        index.touch("b");
        index.touch("c");
        index.touch("b");

        assert_eq!(index.len(), 3);
        assert_eq!(index.most_to_least_recent(), vec!["b", "c", "a"]);
        assert_eq!(index.least_to_most_recent(), vec!["a", "c", "b"]);
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_evict_oldest() {
        let mut index = RecencyIndex::new();

        index.touch("key1");
        index.touch("key2");
        index.touch("key3");

        assert_eq!(index.evict_oldest(), Some("key1".to_string()));
        assert_eq!(index.len(), 2);
        assert!(!index.contains("key1"));

        assert_eq!(index.evict_oldest(), Some("key2".to_string()));
        assert_eq!(index.evict_oldest(), Some("key3".to_string()));
        assert_eq!(index.evict_oldest(), None);
        assert!(index.is_empty());
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_remove_middle_and_missing() {
        let mut index = RecencyIndex::new();

        index.touch("key1");
        index.touch("key2");
        index.touch("key3");

        assert!(index.remove("key2"));
        assert!(!index.remove("nonexistent"));

        assert_eq!(index.len(), 2);
        assert_eq!(index.most_to_least_recent(), vec!["key3", "key1"]);
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_slots_are_reused() {
        let mut index = RecencyIndex::new();

        index.touch("a");
        index.touch("b");
        index.remove("a");
        index.touch("c");

        assert_eq!(index.slots.len(), 2);
        assert_eq!(index.most_to_least_recent(), vec!["c", "b"]);
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_touch_same_key_multiple_times() {
        let mut index = RecencyIndex::new();

        index.touch("key1");
        index.touch("key1");
        index.touch("key1");

        assert_eq!(index.len(), 1);
        assert_eq!(index.evict_oldest(), Some("key1".to_string()));
        assert!(index.is_empty());
    }

    #[test]
    fn test_order_after_multiple_touches() {
        let mut index = RecencyIndex::new();

        index.touch("a");
        index.touch("b");
        index.touch("c");
        index.touch("a");
        index.touch("c");
        index.touch("b");

        assert_eq!(index.evict_oldest(), Some("a".to_string()));
        assert_eq!(index.evict_oldest(), Some("c".to_string()));
        assert_eq!(index.evict_oldest(), Some("b".to_string()));
    }

    #[test]
    fn test_clear() {
        let mut index = RecencyIndex::new();
        index.touch("a");
        index.touch("b");

        index.clear();

        assert!(index.is_empty());
        assert!(!index.contains("a"));
        assert_eq!(index.peek_oldest(), None);
        index.touch("c");
        assert_eq!(index.most_to_least_recent(), vec!["c"]);
    }

    #[test]
    fn test_snapshots_are_copies() {
        let mut index = RecencyIndex::new();
        index.touch("a");
        index.touch("b");

        let mut snapshot = index.most_to_least_recent();
        snapshot.push("z".to_string());

        assert_eq!(index.most_to_least_recent(), vec!["b", "a"]);
    }

    #[test]
    fn test_from_keys_keeps_order() {
        let index = RecencyIndex::from_keys(vec!["c".into(), "b".into(), "a".into()]);

        assert_eq!(index.most_to_least_recent(), vec!["c", "b", "a"]);
        assert_eq!(index.peek_oldest(), Some("a"));
        assert!(!index.has_duplicates());
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_from_keys_reports_duplicates() {
        let index = RecencyIndex::from_keys(vec!["a".into(), "b".into(), "a".into()]);

        assert_eq!(index.len(), 3);
        assert!(index.has_duplicates());
    }

    #[test]
    fn test_serde_as_key_array() {
        let mut index = RecencyIndex::new();
        index.touch("a");
        index.touch("b");

        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"["b","a"]"#);

        let back: RecencyIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back.most_to_least_recent(), vec!["b", "a"]);
    }

    #[test]
    fn test_deserialize_rejects_foreign_data() {
        assert!(serde_json::from_str::<RecencyIndex>(r#"{"a": 1}"#).is_err());
        assert!(serde_json::from_str::<RecencyIndex>(r#"[1, 2]"#).is_err());
    }
}
