use promise_lens_protocol::{Guid, PromiseRecord};

use crate::model::PromiseTree;

/// One node of the forest as the view layer sees it: the canonical record
/// plus where it sits and whether it is folded.
#[derive(Debug, Clone, Copy)]
pub struct TreeNode<'a> {
    pub record: &'a PromiseRecord,
    /// 0 for roots.
    pub depth: usize,
    pub collapsed: bool,
    pub has_children: bool,
}

impl<'a> TreeNode<'a> {
    pub fn guid(&self) -> Guid {
        self.record.guid
    }

    pub(crate) fn new(tree: &'a PromiseTree, guid: Guid, depth: usize) -> Option<Self> {
        let record = tree.get(guid)?;
        Some(Self {
            record,
            depth,
            collapsed: tree.is_collapsed(guid),
            has_children: !tree.store().children(guid).is_empty(),
        })
    }
}

/// Depth-first walk over the nodes a reader can currently see: every root,
/// and below each node its children only while that node is expanded.
///
/// Built fresh from the tree on each call, so it always reflects the
/// current collapse state.
#[derive(Debug, Clone)]
pub struct VisibleRows<'a> {
    tree: &'a PromiseTree,
    stack: Vec<(Guid, usize)>,
}

impl<'a> VisibleRows<'a> {
    pub fn new(tree: &'a PromiseTree) -> Self {
        let stack = tree
            .store()
            .roots()
            .iter()
            .rev()
            .map(|&guid| (guid, 0))
            .collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for VisibleRows<'a> {
    type Item = TreeNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((guid, depth)) = self.stack.pop() {
            let Some(node) = TreeNode::new(self.tree, guid, depth) else {
                continue;
            };
            if !node.collapsed {
                self.stack.extend(
                    self.tree
                        .store()
                        .children(guid)
                        .iter()
                        .rev()
                        .map(|&child| (child, depth + 1)),
                );
            }
            return Some(node);
        }
        None
    }
}

pub fn visible_rows(tree: &PromiseTree) -> VisibleRows<'_> {
    VisibleRows::new(tree)
}
