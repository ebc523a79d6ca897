use std::collections::HashMap;

use crate::models::TaskId;

/// Recency-ordered record of viewed items.
///
/// A doubly linked list threaded through an id-keyed map: every node stores
/// the ids of its neighbours, so recording, removing and looking up a view are
/// all O(1). Each id appears at most once. Viewing an id again moves it to the
/// tail (most recent) instead of adding a second entry.
///
/// The list is unbounded. Entries leave only through [`remove`](Self::remove).
#[derive(Debug, Clone, Default)]
pub struct HistoryTracker {
    nodes: HashMap<TaskId, Node>,
    head: Option<TaskId>,
    tail: Option<TaskId>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    prev: Option<TaskId>,
    next: Option<TaskId>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a view of `id`, making it the most recent entry.
    pub fn record_view(&mut self, id: TaskId) {
        self.unlink(id);
        self.link_last(id);
    }

    /// Drops `id` from the history. No-op when it isn't tracked.
    pub fn remove(&mut self, id: TaskId) {
        self.unlink(id);
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tracked ids, oldest view first and most recent view last.
    pub fn snapshot(&self) -> Vec<TaskId> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            ids.push(id);
            cursor = self.nodes.get(&id).and_then(|node| node.next);
        }
        ids
    }

    fn link_last(&mut self, id: TaskId) {
        let node = Node {
            prev: self.tail,
            next: None,
        };
        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.nodes.get_mut(&tail) {
                    tail_node.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.nodes.insert(id, node);
    }

    fn unlink(&mut self, id: TaskId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.nodes.get_mut(&prev) {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }

        match node.next {
            Some(next) => {
                if let Some(next_node) = self.nodes.get_mut(&next) {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }
    }
}
