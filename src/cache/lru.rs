//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

// == Node ==
#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys live in a doubly linked list threaded through a slab of nodes:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Every key is addressed by the slot returned from [`LruTracker::push_front`],
/// which the cache stores next to the entry, so touch, remove and eviction are O(1).
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Node storage, `None` marks a free slot
    slots: Vec<Option<Node>>,
    /// Free slot indices available for reuse
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Front ==
    /// Inserts a key as the most recently used and returns its slot.
    pub fn push_front(&mut self, key: &str) -> usize {
        let node = Node {
            key: key.to_string(),
            prev: None,
            next: self.head,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        if let Some(old_head) = self.head {
            if let Some(node) = self.slots[old_head].as_mut() {
                node.prev = Some(slot);
            }
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
        self.len += 1;
        slot
    }

    // == Touch ==
    /// Marks the key in `slot` as most recently used.
    pub fn touch(&mut self, slot: usize) {
        if self.head == Some(slot) || self.node(slot).is_none() {
            return;
        }
        self.unlink(slot);
        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = None;
            node.next = self.head;
        }
        if let Some(old_head) = self.head {
            if let Some(node) = self.slots[old_head].as_mut() {
                node.prev = Some(slot);
            }
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }

    // == Remove ==
    /// Removes the key in `slot` from the tracker, returning it.
    pub fn remove(&mut self, slot: usize) -> Option<String> {
        self.node(slot)?;
        self.unlink(slot);
        let node = self.slots[slot].take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(node.key)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            match self.node(slot) {
                Some(node) => {
                    keys.push(node.key.clone());
                    cursor = node.next;
                }
                None => break,
            }
        }
        keys
    }

    fn node(&self, slot: usize) -> Option<&Node> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Detaches `slot` from its neighbours, leaving the node itself in place.
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.node(slot) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }
}
