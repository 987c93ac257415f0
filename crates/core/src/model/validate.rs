use promise_lens_protocol::{Guid, PromiseRecord, PromiseState};
use thiserror::Error;

/// Why a single batch entry was left out of the tree.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("undecodable entry: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("promise {0} carries both a value and a reason")]
    ConflictingOutcome(Guid),
    #[error("promise {guid} is {state} but carries a {field}")]
    UnexpectedOutcome {
        guid: Guid,
        state: PromiseState,
        field: &'static str,
    },
    #[error("promise {0} is unsettled but has a settlement time")]
    SettledWhileUnsettled(Guid),
    #[error("promise {0} has a non-finite timestamp")]
    NonFiniteTimestamp(Guid),
    #[error("promise {guid} settled at {settled_at}ms, before it was created at {created_at}ms")]
    SettledBeforeCreated {
        guid: Guid,
        created_at: f64,
        settled_at: f64,
    },
}

/// Check the per-record invariants the tree relies on. Parent links are
/// not checked here; cycles of any length are broken when the store links.
pub fn validate(record: &PromiseRecord) -> Result<(), RecordError> {
    let guid = record.guid;

    if record.value.is_some() && record.reason.is_some() {
        return Err(RecordError::ConflictingOutcome(guid));
    }
    let stray = match record.state {
        PromiseState::Created | PromiseState::Pending => record
            .value
            .as_ref()
            .map(|_| "value")
            .or(record.reason.as_ref().map(|_| "reason")),
        PromiseState::Fulfilled => record.reason.as_ref().map(|_| "reason"),
        PromiseState::Rejected => record.value.as_ref().map(|_| "value"),
    };
    if let Some(field) = stray {
        return Err(RecordError::UnexpectedOutcome {
            guid,
            state: record.state,
            field,
        });
    }

    if !record.created_at.is_finite() {
        return Err(RecordError::NonFiniteTimestamp(guid));
    }
    if let Some(settled_at) = record.settled_at {
        if !settled_at.is_finite() {
            return Err(RecordError::NonFiniteTimestamp(guid));
        }
        if !record.state.is_settled() {
            return Err(RecordError::SettledWhileUnsettled(guid));
        }
        if settled_at < record.created_at {
            return Err(RecordError::SettledBeforeCreated {
                guid,
                created_at: record.created_at,
                settled_at,
            });
        }
    }

    Ok(())
}
