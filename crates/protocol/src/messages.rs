use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::record::Guid;

pub const PROMISE_SUPPORTED: &str = "promise:supported";
pub const CAPABILITY_SUPPORTED: &str = "capability:supported";
pub const PROMISES_UPDATED: &str = "promise:promisesUpdated";
pub const GET_AND_OBSERVE_PROMISES: &str = "promise:getAndObservePromises";
pub const SET_INSTRUMENT_WITH_STACK: &str = "promise:setInstrumentWithStack";
pub const TRACE_PROMISE: &str = "promise:tracePromise";
pub const SEND_VALUE_TO_CONSOLE: &str = "promise:sendValueToConsole";
pub const INSPECT_BY_ID: &str = "objectInspector:inspectById";
pub const REFRESH: &str = "general:refresh";

/// A named message with an optional JSON payload, exactly as it travels
/// over the port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Envelope {
    pub fn new(name: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown message: {0}")]
    UnknownMessage(String),
    #[error("{name}: missing payload")]
    MissingPayload { name: &'static str },
    #[error("{name}: malformed payload: {source}")]
    Malformed {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Messages sent by the observed runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Reply to the capability handshake.
    Supported { supported: bool },
    /// Full snapshot of every tracked promise. Entries are left undecoded
    /// so one malformed record cannot take the whole batch down.
    PromisesUpdated { promises: Vec<Value> },
}

#[derive(Deserialize)]
struct SupportedPayload {
    supported: bool,
}

#[derive(Deserialize)]
struct PromisesUpdatedPayload {
    promises: Vec<Value>,
}

impl Inbound {
    pub fn decode(envelope: &Envelope) -> Result<Self, DecodeError> {
        match envelope.name.as_str() {
            PROMISE_SUPPORTED => Self::supported(PROMISE_SUPPORTED, envelope),
            CAPABILITY_SUPPORTED => Self::supported(CAPABILITY_SUPPORTED, envelope),
            PROMISES_UPDATED => {
                let payload: PromisesUpdatedPayload = decode_payload(PROMISES_UPDATED, envelope)?;
                Ok(Self::PromisesUpdated {
                    promises: payload.promises,
                })
            }
            other => Err(DecodeError::UnknownMessage(other.to_string())),
        }
    }

    fn supported(name: &'static str, envelope: &Envelope) -> Result<Self, DecodeError> {
        let payload: SupportedPayload = decode_payload(name, envelope)?;
        Ok(Self::Supported {
            supported: payload.supported,
        })
    }
}

fn decode_payload<T: serde::de::DeserializeOwned>(
    name: &'static str,
    envelope: &Envelope,
) -> Result<T, DecodeError> {
    let payload = envelope
        .payload
        .as_ref()
        .ok_or(DecodeError::MissingPayload { name })?;
    T::deserialize(payload).map_err(|source| DecodeError::Malformed { name, source })
}

/// Which listener on the runtime side handles a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Promise,
    ObjectInspector,
    General,
}

/// Messages sent to the observed runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Capability handshake request.
    ProbeSupport,
    /// Start streaming `promise:promisesUpdated` batches.
    GetAndObservePromises,
    SetInstrumentWithStack { instrument_with_stack: bool },
    TracePromise { promise_id: Guid },
    SendValueToConsole { promise_id: Guid },
    /// Open a live object in the runtime's object inspector.
    InspectById { object_id: u64 },
    /// Reload the inspected page so instrumentation can attach.
    Refresh,
}

impl Outbound {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProbeSupport => PROMISE_SUPPORTED,
            Self::GetAndObservePromises => GET_AND_OBSERVE_PROMISES,
            Self::SetInstrumentWithStack { .. } => SET_INSTRUMENT_WITH_STACK,
            Self::TracePromise { .. } => TRACE_PROMISE,
            Self::SendValueToConsole { .. } => SEND_VALUE_TO_CONSOLE,
            Self::InspectById { .. } => INSPECT_BY_ID,
            Self::Refresh => REFRESH,
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            Self::InspectById { .. } => Namespace::ObjectInspector,
            Self::Refresh => Namespace::General,
            _ => Namespace::Promise,
        }
    }

    pub fn payload(&self) -> Option<Value> {
        match self {
            Self::ProbeSupport | Self::GetAndObservePromises | Self::Refresh => None,
            Self::SetInstrumentWithStack {
                instrument_with_stack,
            } => Some(json!({ "instrumentWithStack": instrument_with_stack })),
            Self::TracePromise { promise_id } | Self::SendValueToConsole { promise_id } => {
                Some(json!({ "promiseId": promise_id }))
            }
            Self::InspectById { object_id } => Some(json!({ "objectId": object_id })),
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(self.name(), self.payload())
    }
}
