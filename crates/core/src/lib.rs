pub mod capability;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod model;
pub mod panel;
pub mod views;

pub use capability::Capability;
pub use channel::{Channel, Outbox, SplitChannel};
pub use config::PanelConfig;
pub use dispatch::{Dispatched, IgnoreReason, Intent};
pub use model::{BatchReport, PromiseTree};
pub use panel::{DisplayState, Panel, PanelError, Received};
pub use views::{ConsoleAction, Status, TreeNode, ViewRow};
