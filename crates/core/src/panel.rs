use promise_lens_protocol::{DecodeError, Envelope, Inbound, Outbound};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::capability::{Capability, CapabilityGate};
use crate::channel::Channel;
use crate::config::PanelConfig;
use crate::dispatch::{self, Dispatched, IgnoreReason, Intent};
use crate::model::{BatchReport, PromiseTree};
use crate::views::{self, ViewRow, VisibleRows};

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("protocol: {0}")]
    Decode(#[from] DecodeError),
}

/// Which surface the consumer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayState {
    /// Handshake sent, no reply yet.
    Checking,
    /// The runtime cannot instrument promises.
    Unsupported,
    /// Supported, but no batch has ever contained a promise: show the
    /// "reload the page" hint.
    AwaitingPromises,
    /// Show the tree, even when it currently has no rows.
    Tree,
}

/// What an inbound message did.
#[derive(Debug)]
pub enum Received {
    Capability(Capability),
    Batch(BatchReport),
    /// A handshake reply after the first, or a batch before support was
    /// confirmed.
    Ignored,
}

/// The promise panel core: one port, one tree, one capability handshake.
///
/// All state changes happen synchronously inside `receive` or `dispatch`,
/// so each message is applied atomically with respect to readers.
#[derive(Debug)]
pub struct Panel<C> {
    config: PanelConfig,
    channel: C,
    capability: CapabilityGate,
    tree: PromiseTree,
    observing: bool,
    seen_promises: bool,
}

impl<C: Channel> Panel<C> {
    pub fn new(config: PanelConfig, channel: C) -> Self {
        Self {
            tree: PromiseTree::new(config.collapse_new_nodes),
            config,
            channel,
            capability: CapabilityGate::new(),
            observing: false,
            seen_promises: false,
        }
    }

    /// Send the capability handshake, once, if configured to.
    pub fn start(&mut self) {
        if self.config.probe_on_start {
            self.probe();
        }
    }

    /// Send the capability handshake unless it was already sent.
    pub fn probe(&mut self) -> bool {
        if !self.capability.begin_probe() {
            return false;
        }
        debug!("probing for promise support");
        self.channel.send(Outbound::ProbeSupport);
        true
    }

    /// Ask the runtime to start streaming batches. No-op until support is
    /// confirmed, and after the first request.
    pub fn observe(&mut self) -> bool {
        if !self.capability.is_supported() || self.observing {
            return false;
        }
        self.observing = true;
        self.channel.send(Outbound::GetAndObservePromises);
        true
    }

    /// Decode and apply one inbound envelope.
    pub fn receive(&mut self, envelope: &Envelope) -> Result<Received, PanelError> {
        let message = Inbound::decode(envelope).inspect_err(|err| {
            warn!(name = %envelope.name, error = %err, "dropped inbound message");
        })?;
        Ok(self.receive_message(message))
    }

    pub fn receive_message(&mut self, message: Inbound) -> Received {
        match message {
            Inbound::Supported { supported } => match self.capability.resolve(supported) {
                Some(capability) => {
                    info!(?capability, "promise support resolved");
                    if capability == Capability::Supported && self.config.observe_on_support {
                        self.observe();
                    }
                    Received::Capability(capability)
                }
                None => {
                    debug!(supported, "ignoring repeated handshake reply");
                    Received::Ignored
                }
            },
            Inbound::PromisesUpdated { promises } => {
                if !self.capability.is_supported() {
                    warn!(
                        capability = ?self.capability.state(),
                        "ignoring promise batch before support is confirmed"
                    );
                    return Received::Ignored;
                }
                let report = self.tree.apply_raw_batch(&promises);
                if !self.tree.is_empty() {
                    self.seen_promises = true;
                }
                Received::Batch(report)
            }
        }
    }

    /// Carry out a user intent. Everything is ignored until the runtime
    /// has confirmed promise support.
    pub fn dispatch(&mut self, intent: Intent) -> Dispatched {
        if !self.capability.is_supported() {
            debug!(?intent, "ignoring intent without promise support");
            return Dispatched::Ignored(IgnoreReason::Unsupported);
        }
        dispatch::dispatch(intent, &mut self.tree, &mut self.channel)
    }

    pub fn capability(&self) -> Capability {
        self.capability.state()
    }

    pub fn display_state(&self) -> DisplayState {
        match self.capability.state() {
            Capability::Checking => DisplayState::Checking,
            Capability::Unsupported => DisplayState::Unsupported,
            Capability::Supported if self.seen_promises => DisplayState::Tree,
            Capability::Supported => DisplayState::AwaitingPromises,
        }
    }

    pub fn tree(&self) -> &PromiseTree {
        &self.tree
    }

    pub fn visible_rows(&self) -> VisibleRows<'_> {
        views::visible_rows(&self.tree)
    }

    /// Display rows for every visible node, in document order.
    pub fn rows(&self) -> Vec<ViewRow> {
        views::project_visible(&self.tree)
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }
}
