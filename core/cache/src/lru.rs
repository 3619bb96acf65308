//! Index-linked recency list.
//!
//! A doubly-linked list stored in a slab of slots, linked by indices
//! instead of pointers. Removed slots go on a free list and are reused by
//! later insertions, so a cache that has reached capacity stops
//! allocating slots entirely.

use bytes::Bytes;
use std::time::Instant;

/// Sentinel index marking the absence of a neighbor.
const NIL: usize = usize::MAX;

/// One cached buffer together with its list links.
#[derive(Debug)]
pub struct Entry {
    pub(crate) key: String,
    pub(crate) data: Bytes,
    pub(crate) inserted_at: Instant,
    prev: usize,
    next: usize,
}

/// Doubly-linked list ordered from most to least recently used.
#[derive(Debug, Default)]
pub struct RecencyList {
    slots: Vec<Option<Entry>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
}

impl RecencyList {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    /// Insert a new entry at the most-recent end, returning its slot index.
    pub fn push_front(&mut self, key: String, data: Bytes, inserted_at: Instant) -> usize {
        let entry = Entry {
            key,
            data,
            inserted_at,
            prev: NIL,
            next: self.head,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };

        if let Some(old_head) = self.slot_mut(self.head) {
            old_head.prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
        idx
    }

    /// Remove the entry at `idx`, returning it and recycling the slot.
    pub fn remove(&mut self, idx: usize) -> Option<Entry> {
        let entry = self.slots.get_mut(idx)?.take()?;
        self.unlink(entry.prev, entry.next);
        self.free.push(idx);
        Some(entry)
    }

    /// Promote the entry at `idx` to the most-recent end.
    pub fn move_to_front(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        let (prev, next) = match self.slot(idx) {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };
        self.unlink(prev, next);

        let head = self.head;
        if let Some(entry) = self.slot_mut(idx) {
            entry.prev = NIL;
            entry.next = head;
        }
        if let Some(old_head) = self.slot_mut(self.head) {
            old_head.prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    /// Index of the least recently used entry.
    pub fn tail_index(&self) -> Option<usize> {
        (self.tail != NIL).then_some(self.tail)
    }

    pub fn get(&self, idx: usize) -> Option<&Entry> {
        self.slot(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Entry> {
        self.slot_mut(idx)
    }

    /// Visit every occupied slot in slab order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Entry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|entry| (idx, entry)))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Splice the list around a removed or relocated entry.
    fn unlink(&mut self, prev: usize, next: usize) {
        if let Some(entry) = self.slot_mut(prev) {
            entry.next = next;
        } else {
            self.head = next;
        }
        if let Some(entry) = self.slot_mut(next) {
            entry.prev = prev;
        } else {
            self.tail = prev;
        }
    }

    fn slot(&self, idx: usize) -> Option<&Entry> {
        self.slots.get(idx)?.as_ref()
    }

    fn slot_mut(&mut self, idx: usize) -> Option<&mut Entry> {
        self.slots.get_mut(idx)?.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(list: &mut RecencyList, key: &str) -> usize {
        list.push_front(key.to_string(), Bytes::from_static(b"x"), Instant::now())
    }

    /// Keys from least to most recently used, following the links.
    fn order_from_tail(list: &RecencyList) -> Vec<String> {
        let mut order = Vec::new();
        let mut cursor = list.tail_index();
        while let Some(idx) = cursor {
            let entry = list.get(idx).unwrap();
            order.push(entry.key.clone());
            cursor = (entry.prev != NIL).then_some(entry.prev);
        }
        order
    }

    #[test]
    fn test_tail_is_least_recent() {
        let mut list = RecencyList::new();
        push(&mut list, "a");
        push(&mut list, "b");
        push(&mut list, "c");

        assert_eq!(order_from_tail(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_to_front_reorders() {
        let mut list = RecencyList::new();
        let a = push(&mut list, "a");
        push(&mut list, "b");
        push(&mut list, "c");

        list.move_to_front(a);

        assert_eq!(order_from_tail(&list), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_remove_middle_relinks_neighbors() {
        let mut list = RecencyList::new();
        push(&mut list, "a");
        let b = push(&mut list, "b");
        push(&mut list, "c");

        let removed = list.remove(b).unwrap();

        assert_eq!(removed.key, "b");
        assert_eq!(order_from_tail(&list), vec!["a", "c"]);
    }

    #[test]
    fn test_removed_slot_is_reused() {
        let mut list = RecencyList::new();
        let a = push(&mut list, "a");
        push(&mut list, "b");

        list.remove(a);
        let c = push(&mut list, "c");

        assert_eq!(c, a);
        assert_eq!(order_from_tail(&list), vec!["b", "c"]);
    }

    #[test]
    fn test_empty_list_has_no_tail() {
        let mut list = RecencyList::new();
        assert_eq!(list.tail_index(), None);

        let a = push(&mut list, "a");
        list.remove(a);
        assert_eq!(list.tail_index(), None);
    }

    #[test]
    fn test_remove_vacant_slot_is_none() {
        let mut list = RecencyList::new();
        let a = push(&mut list, "a");
        list.remove(a);

        assert!(list.remove(a).is_none());
        assert!(list.remove(99).is_none());
    }
}
