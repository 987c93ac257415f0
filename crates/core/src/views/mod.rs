pub mod row;
pub mod visible;

pub use row::{ConsoleAction, Status, ViewRow, format_elapsed, project};
pub use visible::{TreeNode, VisibleRows, visible_rows};

use crate::model::PromiseTree;

/// Project every currently visible node, in document order.
pub fn project_visible(tree: &PromiseTree) -> Vec<ViewRow> {
    visible_rows(tree).map(|node| project(&node)).collect()
}
