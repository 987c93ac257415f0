use promise_lens_protocol::{Guid, Outbound};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::Channel;
use crate::model::PromiseTree;

/// A discrete user action on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    /// Expand or collapse one node.
    Toggle { promise_id: Guid },
    /// Ask the runtime to (stop) capture creation stacks. The runtime owns
    /// this setting; the panel keeps no copy.
    SetInstrumentWithStack { instrument_with_stack: bool },
    TracePromise { promise_id: Guid },
    SendValueToConsole { promise_id: Guid },
    /// Open the object a row's value or reason refers to.
    InspectObject { promise_id: Guid },
    /// Forget every promise seen so far. Never leaves the process.
    Clear,
    Refresh,
}

/// Why an intent had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The handshake has not confirmed promise support.
    Unsupported,
    UnknownPromise(Guid),
    NoCapturedStack(Guid),
    /// Nothing to send to the console yet.
    Unsettled(Guid),
    NotObjectLike(Guid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Sent(Outbound),
    /// Handled in-process, nothing sent.
    Local,
    Ignored(IgnoreReason),
}

/// Carry out `intent` against the tree, sending at most one message.
///
/// Intents that do not apply to the current state (a stale row, a trace
/// without a captured stack) come back as [`Dispatched::Ignored`].
pub fn dispatch<C: Channel>(intent: Intent, tree: &mut PromiseTree, channel: &mut C) -> Dispatched {
    let outcome = match intent {
        Intent::Toggle { promise_id } => {
            if tree.toggle(promise_id) {
                Dispatched::Local
            } else {
                Dispatched::Ignored(IgnoreReason::UnknownPromise(promise_id))
            }
        }
        Intent::Clear => {
            tree.clear();
            Dispatched::Local
        }
        Intent::SetInstrumentWithStack {
            instrument_with_stack,
        } => send(
            channel,
            Outbound::SetInstrumentWithStack {
                instrument_with_stack,
            },
        ),
        Intent::Refresh => send(channel, Outbound::Refresh),
        Intent::TracePromise { promise_id } => match tree.get(promise_id) {
            None => Dispatched::Ignored(IgnoreReason::UnknownPromise(promise_id)),
            Some(record) if !record.has_stack => {
                Dispatched::Ignored(IgnoreReason::NoCapturedStack(promise_id))
            }
            Some(_) => send(channel, Outbound::TracePromise { promise_id }),
        },
        Intent::SendValueToConsole { promise_id } => match tree.get(promise_id) {
            None => Dispatched::Ignored(IgnoreReason::UnknownPromise(promise_id)),
            Some(record) if record.outcome().is_none() => {
                Dispatched::Ignored(IgnoreReason::Unsettled(promise_id))
            }
            Some(_) => send(channel, Outbound::SendValueToConsole { promise_id }),
        },
        Intent::InspectObject { promise_id } => match tree.get(promise_id) {
            None => Dispatched::Ignored(IgnoreReason::UnknownPromise(promise_id)),
            Some(record) => match record
                .outcome()
                .filter(|value| value.is_object_like())
                .and_then(|value| value.object_ref)
            {
                Some(object_id) => send(channel, Outbound::InspectById { object_id }),
                None => Dispatched::Ignored(IgnoreReason::NotObjectLike(promise_id)),
            },
        },
    };
    debug!(?intent, ?outcome, "dispatched intent");
    outcome
}

fn send<C: Channel>(channel: &mut C, message: Outbound) -> Dispatched {
    channel.send(message);
    Dispatched::Sent(message)
}
