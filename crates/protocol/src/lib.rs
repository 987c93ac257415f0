pub mod messages;
pub mod record;

pub use messages::{DecodeError, Envelope, Inbound, Namespace, Outbound};
pub use record::{Guid, InspectedValue, PromiseRecord, PromiseState};
