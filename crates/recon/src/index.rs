//! Ordered index over the men registry.
//!
//! Unbalanced binary search tree keyed by [`PersonId`]. Nodes live in an
//! arena (`Vec<Node>`) and link to their children by [`NodeIndex`]; nothing
//! is ever removed, so indices stay valid for the life of the index.
//! Tree shape depends on insertion order: sorted input degenerates to a list.

use std::cmp::Ordering;

use crate::model::{InsertOutcome, MaritalStatus, PersonId, PersonRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeIndex(usize);

#[derive(Debug, Clone)]
struct Node {
    record: PersonRecord,
    left: Option<NodeIndex>,
    right: Option<NodeIndex>,
}

impl Node {
    fn leaf(record: PersonRecord) -> Self {
        Self {
            record,
            left: None,
            right: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderedIndex {
    nodes: Vec<Node>,
    root: Option<NodeIndex>,
}

impl OrderedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert as a new leaf. An existing node with the same id wins and the
    /// new record is dropped.
    pub fn insert(&mut self, record: PersonRecord) -> InsertOutcome {
        let new = NodeIndex(self.nodes.len());
        let Some(mut current) = self.root else {
            self.nodes.push(Node::leaf(record));
            self.root = Some(new);
            return InsertOutcome::Inserted;
        };

        loop {
            let node = &mut self.nodes[current.0];
            let slot = match record.id.cmp(&node.record.id) {
                Ordering::Less => &mut node.left,
                Ordering::Greater => &mut node.right,
                Ordering::Equal => return InsertOutcome::Duplicate,
            };
            match *slot {
                Some(child) => current = child,
                None => {
                    *slot = Some(new);
                    break;
                }
            }
        }

        self.nodes.push(Node::leaf(record));
        InsertOutcome::Inserted
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.locate(id).is_some()
    }

    pub fn find_by_id(&self, id: PersonId) -> Option<&PersonRecord> {
        self.locate(id).map(|i| &self.nodes[i.0].record)
    }

    pub fn find_by_id_mut(&mut self, id: PersonId) -> Option<&mut PersonRecord> {
        self.locate(id).map(|i| &mut self.nodes[i.0].record)
    }

    /// Set every node's status, visiting in ascending id order.
    pub fn reset_all_to(&mut self, status: &MaritalStatus) {
        self.for_each_in_order_mut(|record| record.status = status.clone());
    }

    /// In-order traversal with mutable access to each record. The key must
    /// not be changed by `f`.
    pub fn for_each_in_order_mut(&mut self, mut f: impl FnMut(&mut PersonRecord)) {
        let mut walk = Walk::new(self.root);
        while let Some(i) = walk.next(&self.nodes) {
            f(&mut self.nodes[i.0].record);
        }
    }

    /// Ascending-id iterator. Can be restarted any number of times.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            walk: Walk::new(self.root),
        }
    }

    /// Snapshot of every record, ascending by id.
    pub fn to_ordered_vec(&self) -> Vec<PersonRecord> {
        self.iter().cloned().collect()
    }

    /// Number of nodes on the longest root-to-leaf path; 0 when empty.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeIndex, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((i, d)) = stack.pop() {
            deepest = deepest.max(d);
            let node = &self.nodes[i.0];
            stack.extend(node.left.map(|c| (c, d + 1)));
            stack.extend(node.right.map(|c| (c, d + 1)));
        }
        deepest
    }

    fn locate(&self, id: PersonId) -> Option<NodeIndex> {
        let mut current = self.root;
        while let Some(i) = current {
            let node = &self.nodes[i.0];
            current = match id.cmp(&node.record.id) {
                Ordering::Equal => return Some(i),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }
}

impl Extend<PersonRecord> for OrderedIndex {
    fn extend<I: IntoIterator<Item = PersonRecord>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }
}

impl FromIterator<PersonRecord> for OrderedIndex {
    fn from_iter<I: IntoIterator<Item = PersonRecord>>(records: I) -> Self {
        let mut index = Self::new();
        index.extend(records);
        index
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// Explicit-stack in-order walk. Holds indices only, so the arena can be
/// borrowed mutably between steps.
struct Walk {
    stack: Vec<NodeIndex>,
    current: Option<NodeIndex>,
}

impl Walk {
    fn new(root: Option<NodeIndex>) -> Self {
        Self {
            stack: Vec::new(),
            current: root,
        }
    }

    fn next(&mut self, nodes: &[Node]) -> Option<NodeIndex> {
        while let Some(i) = self.current {
            self.stack.push(i);
            self.current = nodes[i.0].left;
        }
        let i = self.stack.pop()?;
        self.current = nodes[i.0].right;
        Some(i)
    }
}

pub struct Iter<'a> {
    nodes: &'a [Node],
    walk: Walk,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a PersonRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        self.walk.next(nodes).map(|i| &nodes[i.0].record)
    }
}

impl<'a> IntoIterator for &'a OrderedIndex {
    type Item = &'a PersonRecord;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
