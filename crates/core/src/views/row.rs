use promise_lens_protocol::{Guid, InspectedValue, PromiseState};
use serde::Serialize;

use super::visible::TreeNode;

/// Settlement status as shown to the reader. `created` and `pending`
/// collapse into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Pending,
    Fulfilled,
    Rejected,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Fulfilled => "Fulfilled",
            Self::Rejected => "Rejected",
        }
    }
}

impl From<PromiseState> for Status {
    fn from(state: PromiseState) -> Self {
        match state {
            PromiseState::Created | PromiseState::Pending => Self::Pending,
            PromiseState::Fulfilled => Self::Fulfilled,
            PromiseState::Rejected => Self::Rejected,
        }
    }
}

/// What the "send to console" button does for a settled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConsoleAction {
    /// The reason is an error: log its stack.
    StackTrace,
    /// Bind the value (or non-error reason) to a console variable.
    Value,
}

impl ConsoleAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::StackTrace => "Stack trace",
            Self::Value => "$E",
        }
    }
}

/// Display-ready attributes of one visible node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRow {
    pub guid: Guid,
    pub label: String,
    pub depth: usize,
    pub status: Status,
    pub status_text: &'static str,
    /// `"10.00ms"`-style settlement latency.
    pub elapsed_text: Option<String>,
    pub value_summary: Option<String>,
    pub can_trace: bool,
    pub is_object_like: bool,
    /// Object handle to pass to the inspector when `is_object_like`.
    pub object_ref: Option<u64>,
    pub console_action: Option<ConsoleAction>,
    pub has_children: bool,
    pub collapsed: bool,
}

/// Derive the display row for `node`. Reads only the node, never the store.
pub fn project(node: &TreeNode<'_>) -> ViewRow {
    let record = node.record;
    let status = Status::from(record.state);
    let outcome = record.outcome();
    let is_object_like = outcome.is_some_and(InspectedValue::is_object_like);

    ViewRow {
        guid: record.guid,
        label: record.label().to_string(),
        depth: node.depth,
        status,
        status_text: status.label(),
        elapsed_text: record.elapsed_ms().map(format_elapsed),
        value_summary: outcome.map(|value| value.summary.clone()),
        can_trace: record.has_stack,
        is_object_like,
        object_ref: if is_object_like {
            outcome.and_then(|value| value.object_ref)
        } else {
            None
        },
        console_action: outcome.map(|value| {
            if record.state == PromiseState::Rejected && value.is_error() {
                ConsoleAction::StackTrace
            } else {
                ConsoleAction::Value
            }
        }),
        has_children: node.has_children,
        collapsed: node.collapsed,
    }
}

/// Fixed two-decimal milliseconds, e.g. `10.00ms`.
pub fn format_elapsed(ms: f64) -> String {
    format!("{ms:.2}ms")
}
