use std::collections::HashMap;

use promise_lens_protocol::Guid;

/// Per-guid expand/collapse flags, kept apart from the canonical records so
/// a full batch replace never loses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    collapsed: HashMap<Guid, bool>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carry flags over to the guids of a new batch: persisting guids keep
    /// their flag, new guids get `default`, everything else is dropped.
    pub(crate) fn carry_over(&self, guids: impl IntoIterator<Item = Guid>, default: bool) -> Self {
        Self {
            collapsed: guids
                .into_iter()
                .map(|guid| (guid, self.collapsed.get(&guid).copied().unwrap_or(default)))
                .collect(),
        }
    }

    /// Unknown guids read as collapsed.
    pub fn is_collapsed(&self, guid: Guid) -> bool {
        self.collapsed.get(&guid).copied().unwrap_or(true)
    }

    pub fn contains(&self, guid: Guid) -> bool {
        self.collapsed.contains_key(&guid)
    }

    /// Flip one guid's flag without touching its descendants. Returns
    /// `false` for guids that are not tracked.
    pub fn toggle(&mut self, guid: Guid) -> bool {
        match self.collapsed.get_mut(&guid) {
            Some(flag) => {
                *flag = !*flag;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn clear(&mut self) {
        self.collapsed.clear();
    }
}
