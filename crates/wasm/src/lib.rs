use promise_lens_core::{DisplayState, Dispatched, Intent, Outbox, Panel, PanelConfig, ViewRow};
use promise_lens_protocol::{Envelope, Outbound};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Everything the page needs to render the panel in one JSON object.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    display_state: DisplayState,
    rows: Vec<ViewRow>,
}

/// A panel instance owned by the page. The page forwards every message
/// from the inspected runtime to `receive` and, after each call, posts the
/// envelopes returned by `take_outbound` back to the runtime.
#[wasm_bindgen]
pub struct PanelHandle {
    panel: Panel<Outbox>,
}

#[wasm_bindgen]
impl PanelHandle {
    /// Create a panel from an optional JSON config and send the handshake.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<PanelHandle, JsError> {
        Self::create(config_json.as_deref()).map_err(|e| JsError::new(&e))
    }

    /// Apply one inbound message. `payload_json` may be empty.
    pub fn receive(&mut self, name: &str, payload_json: &str) -> Result<(), JsError> {
        self.receive_json(name, payload_json)
            .map_err(|e| JsError::new(&e))
    }

    /// Run a user intent such as `{"action":"toggle","promiseId":3}`.
    /// Returns `false` when the intent had no effect.
    pub fn dispatch(&mut self, intent_json: &str) -> Result<bool, JsError> {
        self.dispatch_json(intent_json)
            .map_err(|e| JsError::new(&e))
    }

    /// Send the capability handshake. Needed when the config sets
    /// `probeOnStart: false`. Returns `false` if it was already sent.
    pub fn probe(&mut self) -> bool {
        self.panel.probe()
    }

    /// Ask the runtime to start streaming batches. Needed when the config
    /// sets `observeOnSupport: false`. Returns `false` before support is
    /// confirmed and after the first request.
    pub fn observe(&mut self) -> bool {
        self.panel.observe()
    }

    /// Drain queued outbound envelopes as a JSON array.
    pub fn take_outbound(&mut self) -> Result<String, JsError> {
        self.outbound_json().map_err(|e| JsError::new(&e))
    }

    /// Display state plus visible rows, as JSON.
    pub fn snapshot(&self) -> Result<String, JsError> {
        self.snapshot_json().map_err(|e| JsError::new(&e))
    }
}

impl PanelHandle {
    fn create(config_json: Option<&str>) -> Result<Self, String> {
        let config = match config_json {
            Some(text) if !text.trim().is_empty() => {
                PanelConfig::from_json(text).map_err(|e| e.to_string())?
            }
            _ => PanelConfig::default(),
        };
        let mut panel = Panel::new(config, Outbox::new());
        panel.start();
        Ok(Self { panel })
    }

    fn receive_json(&mut self, name: &str, payload_json: &str) -> Result<(), String> {
        let payload = if payload_json.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(payload_json).map_err(|e| e.to_string())?)
        };
        self.panel
            .receive(&Envelope::new(name, payload))
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn dispatch_json(&mut self, intent_json: &str) -> Result<bool, String> {
        let intent: Intent = serde_json::from_str(intent_json).map_err(|e| e.to_string())?;
        Ok(!matches!(self.panel.dispatch(intent), Dispatched::Ignored(_)))
    }

    fn outbound_json(&mut self) -> Result<String, String> {
        let envelopes: Vec<Envelope> = self
            .panel
            .channel_mut()
            .drain()
            .iter()
            .map(Outbound::to_envelope)
            .collect();
        serde_json::to_string(&envelopes).map_err(|e| e.to_string())
    }

    fn snapshot_json(&self) -> Result<String, String> {
        let snapshot = Snapshot {
            display_state: self.panel.display_state(),
            rows: self.panel.rows(),
        };
        serde_json::to_string(&snapshot).map_err(|e| e.to_string())
    }
}
