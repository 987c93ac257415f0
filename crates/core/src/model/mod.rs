pub mod collapse;
pub mod store;
pub mod tree;
pub mod validate;

pub use collapse::CollapseState;
pub use store::PromiseStore;
pub use tree::{BatchReport, PromiseTree, RejectedEntry};
pub use validate::{RecordError, validate};
