use std::collections::HashMap;

use promise_lens_protocol::{Guid, PromiseRecord};

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    record: PromiseRecord,
    /// First-seen sequence number; orders roots and siblings.
    seq: u64,
}

/// Flat arena of promise records keyed by guid.
///
/// Parent/child edges are stored as guids and derived from each record's
/// `parent` field, never from the advisory `children` list. A parent that
/// is missing from the store, or a link that would close a cycle, leaves
/// the child at root level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromiseStore {
    slots: HashMap<Guid, Slot>,
    roots: Vec<Guid>,
    children: HashMap<Guid, Vec<Guid>>,
    parents: HashMap<Guid, Guid>,
}

impl PromiseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a linked store from `(seq, record)` pairs. Guids must be unique.
    pub(crate) fn build(entries: Vec<(u64, PromiseRecord)>) -> Self {
        let mut order: Vec<(u64, Guid)> = entries.iter().map(|(seq, r)| (*seq, r.guid)).collect();
        order.sort_unstable();

        let mut store = Self {
            slots: entries
                .into_iter()
                .map(|(seq, record)| (record.guid, Slot { record, seq }))
                .collect(),
            ..Self::default()
        };

        // Top of each linked component. Nodes are linked in sequence order,
        // so a node being linked is always the top of its own component and
        // a link closes a cycle exactly when the parent's top is the node.
        let mut tops: HashMap<Guid, Guid> = HashMap::new();
        for (_, guid) in order {
            let parent = store.slots.get(&guid).and_then(|slot| slot.record.parent);
            match parent {
                Some(parent)
                    if store.slots.contains_key(&parent) && find_top(&mut tops, parent) != guid =>
                {
                    tops.insert(guid, parent);
                    store.parents.insert(guid, parent);
                    store.children.entry(parent).or_default().push(guid);
                }
                _ => store.roots.push(guid),
            }
        }

        store
    }

    pub fn get(&self, guid: Guid) -> Option<&PromiseRecord> {
        self.slots.get(&guid).map(|slot| &slot.record)
    }

    pub fn contains(&self, guid: Guid) -> bool {
        self.slots.contains_key(&guid)
    }

    pub(crate) fn seq(&self, guid: Guid) -> Option<u64> {
        self.slots.get(&guid).map(|slot| slot.seq)
    }

    /// Nodes displayed at top level, in first-seen order.
    pub fn roots(&self) -> &[Guid] {
        &self.roots
    }

    /// Linked children of `guid`, in first-seen order.
    pub fn children(&self, guid: Guid) -> &[Guid] {
        self.children
            .get(&guid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The parent this node is actually linked under, if any.
    pub fn parent(&self, guid: Guid) -> Option<Guid> {
        self.parents.get(&guid).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &PromiseRecord> {
        self.slots.values().map(|slot| &slot.record)
    }
}

/// Follow `tops` to the component top, pointing every visited node
/// straight at it.
fn find_top(tops: &mut HashMap<Guid, Guid>, guid: Guid) -> Guid {
    let mut top = guid;
    while let Some(&next) = tops.get(&top) {
        top = next;
    }
    let mut current = guid;
    while current != top {
        current = tops.insert(current, top).unwrap_or(top);
    }
    top
}
