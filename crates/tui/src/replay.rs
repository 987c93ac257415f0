use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use promise_lens_core::{Dispatched, Intent, Outbox, Panel, PanelConfig};
use promise_lens_protocol::{Envelope, Outbound};
use tracing::{info, warn};

/// Read a transcript: one JSON envelope per line. Blank lines and lines
/// starting with `#` are skipped.
pub fn load_transcript(path: &Path) -> Result<Vec<Envelope>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading transcript {}", path.display()))?;
    parse_transcript(&text).with_context(|| format!("parsing transcript {}", path.display()))
}

pub fn parse_transcript(text: &str) -> Result<Vec<Envelope>> {
    let mut envelopes = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let envelope: Envelope =
            serde_json::from_str(line).with_context(|| format!("line {}", number + 1))?;
        envelopes.push(envelope);
    }
    Ok(envelopes)
}

/// A panel fed from a recorded transcript instead of a live runtime.
///
/// Everything the panel sends is kept in `sent` so it can be shown.
pub struct Replay {
    panel: Panel<Outbox>,
    pending: VecDeque<Envelope>,
    sent: Vec<Outbound>,
    /// What the "instrument with stack" checkbox shows. The runtime owns
    /// the real setting.
    pub instrument_with_stack: bool,
}

impl Replay {
    pub fn new(config: PanelConfig, transcript: Vec<Envelope>) -> Self {
        let mut replay = Self {
            panel: Panel::new(config, Outbox::new()),
            pending: transcript.into(),
            sent: Vec::new(),
            instrument_with_stack: false,
        };
        replay.panel.start();
        replay.collect_sent();
        replay
    }

    /// Feed the next envelope. Returns `false` once the transcript is done.
    pub fn step(&mut self) -> bool {
        let Some(envelope) = self.pending.pop_front() else {
            return false;
        };
        match self.panel.receive(&envelope) {
            Ok(received) => info!(name = %envelope.name, ?received, "replayed message"),
            Err(err) => warn!(name = %envelope.name, error = %err, "skipped message"),
        }
        self.collect_sent();
        true
    }

    pub fn replay_all(&mut self) {
        while self.step() {}
    }

    pub fn dispatch(&mut self, intent: Intent) -> Dispatched {
        let outcome = self.panel.dispatch(intent);
        if let Intent::SetInstrumentWithStack {
            instrument_with_stack,
        } = intent
            && matches!(outcome, Dispatched::Sent(_))
        {
            self.instrument_with_stack = instrument_with_stack;
        }
        self.collect_sent();
        outcome
    }

    /// Send the capability handshake by hand, for configs that skip it on
    /// start.
    pub fn probe(&mut self) -> bool {
        let sent = self.panel.probe();
        self.collect_sent();
        sent
    }

    /// Request the promise stream by hand, for configs that do not observe
    /// on support.
    pub fn observe(&mut self) -> bool {
        let sent = self.panel.observe();
        self.collect_sent();
        sent
    }

    /// Expand every node so the whole forest is visible.
    pub fn expand_all(&mut self) {
        loop {
            let folded: Vec<_> = self
                .panel
                .visible_rows()
                .filter(|node| node.collapsed && node.has_children)
                .map(|node| node.guid())
                .collect();
            if folded.is_empty() {
                break;
            }
            for promise_id in folded {
                self.panel.dispatch(Intent::Toggle { promise_id });
            }
        }
    }

    pub fn panel(&self) -> &Panel<Outbox> {
        &self.panel
    }

    pub fn sent(&self) -> &[Outbound] {
        &self.sent
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn collect_sent(&mut self) {
        self.sent.extend(self.panel.channel_mut().drain());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promise_lens_core::DisplayState;

    const TRANSCRIPT: &str = r#"
# handshake
{"name":"promise:supported","payload":{"supported":true}}
{"name":"promise:promisesUpdated","payload":{"promises":[{"guid":1,"label":"Parent","state":"created","createdAt":0},{"guid":2,"label":"Child","parent":1,"state":"pending","createdAt":1}]}}
"#;

    #[test]
    fn replays_transcript() {
        let transcript = parse_transcript(TRANSCRIPT).unwrap();
        assert_eq!(transcript.len(), 2);

        let mut replay = Replay::new(PanelConfig::default(), transcript);
        assert_eq!(replay.panel().display_state(), DisplayState::Checking);
        replay.replay_all();
        assert_eq!(replay.remaining(), 0);
        assert_eq!(replay.panel().display_state(), DisplayState::Tree);
        assert_eq!(
            replay.sent(),
            &[Outbound::ProbeSupport, Outbound::GetAndObservePromises]
        );

        assert_eq!(replay.panel().rows().len(), 1);
        replay.expand_all();
        assert_eq!(replay.panel().rows().len(), 2);
    }

    #[test]
    fn instrument_checkbox_follows_sent_message() {
        let mut replay = Replay::new(PanelConfig::default(), parse_transcript(TRANSCRIPT).unwrap());
        replay.replay_all();
        replay.dispatch(Intent::SetInstrumentWithStack {
            instrument_with_stack: true,
        });
        assert!(replay.instrument_with_stack);
        assert_eq!(
            replay.sent().last(),
            Some(&Outbound::SetInstrumentWithStack {
                instrument_with_stack: true
            })
        );
    }

    #[test]
    fn manual_handshake_and_observe() {
        let config = PanelConfig {
            probe_on_start: false,
            observe_on_support: false,
            ..PanelConfig::default()
        };
        let mut replay = Replay::new(config, parse_transcript(TRANSCRIPT).unwrap());
        assert!(replay.sent().is_empty());
        assert!(!replay.observe());

        assert!(replay.probe());
        replay.step();
        assert_eq!(replay.sent(), &[Outbound::ProbeSupport]);

        assert!(replay.observe());
        assert!(!replay.observe());
        assert_eq!(
            replay.sent(),
            &[Outbound::ProbeSupport, Outbound::GetAndObservePromises]
        );
    }

    #[test]
    fn bad_line_is_reported_with_number() {
        let err = parse_transcript("\n{not json}\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
