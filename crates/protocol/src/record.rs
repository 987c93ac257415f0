use serde::{Deserialize, Serialize};

/// Process-unique identifier of one promise inside an observed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(pub u64);

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for Guid {
    #[inline]
    fn from(raw: u64) -> Self {
        Guid(raw)
    }
}

/// Lifecycle state reported by the observed runtime.
///
/// `Created` and `Pending` both mean "not yet settled"; the runtime uses
/// `Created` before the executor has run and `Pending` after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromiseState {
    Created,
    Pending,
    Fulfilled,
    Rejected,
}

impl PromiseState {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Rejected)
    }
}

impl std::fmt::Display for PromiseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Pending => write!(f, "pending"),
            Self::Fulfilled => write!(f, "fulfilled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Kinds the runtime uses for values that are plain data rather than
/// references to a live object.
const PRIMITIVE_KINDS: &[&str] = &[
    "type-string",
    "type-number",
    "type-boolean",
    "type-null",
    "type-undefined",
    "type-symbol",
    "type-bigint",
];

/// Kind tag the runtime attaches to error objects.
pub const ERROR_KIND: &str = "type-error";

/// A fulfillment value or rejection reason, already formatted by the
/// observed runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectedValue {
    /// Pre-rendered text (e.g. `"value"`, `"Error: boom"`).
    #[serde(rename = "inspect", alias = "summary")]
    pub summary: String,
    /// Type tag such as `type-string` or `type-ember-object`.
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    /// Handle of the live object in the runtime, when there is one.
    #[serde(
        rename = "objectId",
        alias = "objectRef",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub object_ref: Option<u64>,
}

impl InspectedValue {
    /// Whether this value points at a live object that the runtime's
    /// object inspector can open.
    pub fn is_object_like(&self) -> bool {
        self.object_ref.is_some() && !PRIMITIVE_KINDS.contains(&self.kind.as_str())
    }

    pub fn is_error(&self) -> bool {
        self.kind == ERROR_KIND
    }
}

/// Full snapshot of one promise at the time the batch was produced.
///
/// Each batch entry replaces the previous snapshot for its guid wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromiseRecord {
    pub guid: Guid,
    #[serde(default)]
    pub label: Option<String>,
    /// Parent promise (the one this was chained from), if any.
    #[serde(rename = "parent", alias = "parentGuid", default)]
    pub parent: Option<Guid>,
    /// Advisory child list. Linkage is always derived from `parent`.
    #[serde(rename = "children", alias = "childGuids", default)]
    pub children: Option<Vec<Guid>>,
    pub state: PromiseState,
    #[serde(alias = "settlementValue", default)]
    pub value: Option<InspectedValue>,
    #[serde(alias = "rejectionReason", default)]
    pub reason: Option<InspectedValue>,
    /// Creation time in milliseconds.
    pub created_at: f64,
    /// Settlement time in milliseconds.
    #[serde(default)]
    pub settled_at: Option<f64>,
    #[serde(rename = "hasStack", alias = "hasCapturedStack", default)]
    pub has_stack: bool,
}

impl PromiseRecord {
    /// A fresh, unsettled record with no relations.
    pub fn new(guid: impl Into<Guid>, label: impl Into<String>, created_at: f64) -> Self {
        Self {
            guid: guid.into(),
            label: Some(label.into()),
            parent: None,
            children: None,
            state: PromiseState::Created,
            value: None,
            reason: None,
            created_at,
            settled_at: None,
            has_stack: false,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    /// The value or reason, whichever the settled state carries.
    pub fn outcome(&self) -> Option<&InspectedValue> {
        self.value.as_ref().or(self.reason.as_ref())
    }

    /// Settlement latency in milliseconds, if the promise has settled.
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.settled_at.map(|settled| settled - self.created_at)
    }
}
