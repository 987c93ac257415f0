use serde::Serialize;

/// Outcome of the one-time capability handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Capability {
    /// No reply yet. There is no timeout: without a reply the panel waits
    /// here indefinitely.
    Checking,
    Supported,
    Unsupported,
}

#[derive(Debug, Clone)]
pub(crate) struct CapabilityGate {
    state: Capability,
    probed: bool,
}

impl CapabilityGate {
    pub(crate) fn new() -> Self {
        Self {
            state: Capability::Checking,
            probed: false,
        }
    }

    pub(crate) fn state(&self) -> Capability {
        self.state
    }

    /// Returns `true` the first time only, when a probe should be sent.
    pub(crate) fn begin_probe(&mut self) -> bool {
        let first = !self.probed && self.state == Capability::Checking;
        self.probed = true;
        first
    }

    /// Record the reply. Only the first reply counts; later ones return `None`.
    pub(crate) fn resolve(&mut self, supported: bool) -> Option<Capability> {
        if self.state != Capability::Checking {
            return None;
        }
        self.state = if supported {
            Capability::Supported
        } else {
            Capability::Unsupported
        };
        Some(self.state)
    }

    pub(crate) fn is_supported(&self) -> bool {
        self.state == Capability::Supported
    }
}
