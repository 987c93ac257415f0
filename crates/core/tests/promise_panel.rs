//! Integration tests: drive a `Panel` purely through envelopes, the way a
//! browser panel would, and check rows, display state, and outbound traffic.

use promise_lens_core::{
    Capability, ConsoleAction, DisplayState, Dispatched, IgnoreReason, Intent, Outbox, Panel,
    PanelConfig, Received, ViewRow,
};
use promise_lens_protocol::{Envelope, Guid, Outbound};
use serde_json::{Value, json};

const NOW: f64 = 1_700_000_000_000.0;

fn promise(overrides: Value) -> Value {
    let mut base = json!({
        "guid": 1,
        "label": "Generated Promise",
        "parent": null,
        "children": null,
        "state": "created",
        "value": null,
        "reason": null,
        "createdAt": NOW,
        "hasStack": false
    });
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}

fn batch(promises: Vec<Value>) -> Envelope {
    Envelope::new(
        "promise:promisesUpdated",
        Some(json!({ "promises": promises })),
    )
}

/// A started panel whose runtime answered the handshake with `supported`.
fn panel_with_support(supported: bool) -> Panel<Outbox> {
    let mut panel = Panel::new(PanelConfig::default(), Outbox::new());
    panel.start();
    panel
        .receive(&Envelope::new(
            "promise:supported",
            Some(json!({ "supported": supported })),
        ))
        .unwrap();
    panel
}

fn load(panel: &mut Panel<Outbox>, promises: Vec<Value>) {
    match panel.receive(&batch(promises)).unwrap() {
        Received::Batch(report) => assert!(report.rejected.is_empty(), "{report:?}"),
        other => panic!("batch was not applied: {other:?}"),
    }
}

fn labels(rows: &[ViewRow]) -> Vec<&str> {
    rows.iter().map(|row| row.label.as_str()).collect()
}

#[test]
fn unsupported_runtime_never_builds_a_tree() {
    let mut panel = panel_with_support(false);
    assert_eq!(panel.capability(), Capability::Unsupported);
    assert_eq!(panel.display_state(), DisplayState::Unsupported);
    assert_eq!(
        panel.channel().iter().copied().collect::<Vec<_>>(),
        vec![Outbound::ProbeSupport]
    );

    let received = panel
        .receive(&batch(vec![promise(json!({ "guid": 1 }))]))
        .unwrap();
    assert!(matches!(received, Received::Ignored));
    assert!(panel.rows().is_empty());
    assert_eq!(
        panel.dispatch(Intent::Refresh),
        Dispatched::Ignored(IgnoreReason::Unsupported)
    );
    assert_eq!(panel.display_state(), DisplayState::Unsupported);
}

#[test]
fn handshake_also_accepts_capability_namespace() {
    let mut panel = Panel::new(PanelConfig::default(), Outbox::new());
    panel.start();
    panel
        .receive(&Envelope::new(
            "capability:supported",
            Some(json!({ "supported": true })),
        ))
        .unwrap();
    assert_eq!(panel.capability(), Capability::Supported);
    assert_eq!(
        panel.channel().last(),
        Some(&Outbound::GetAndObservePromises)
    );
}

#[test]
fn refresh_hint_until_first_promise_and_not_after_clear() {
    let mut panel = panel_with_support(true);
    load(&mut panel, vec![]);
    assert_eq!(panel.display_state(), DisplayState::AwaitingPromises);

    assert_eq!(
        panel.dispatch(Intent::Refresh),
        Dispatched::Sent(Outbound::Refresh)
    );
    assert_eq!(panel.channel().last().map(Outbound::name), Some("general:refresh"));

    load(
        &mut panel,
        vec![promise(json!({ "guid": 1, "label": "Promise 1" }))],
    );
    assert_eq!(panel.display_state(), DisplayState::Tree);
    assert_eq!(panel.rows().len(), 1);

    let sent_before = panel.channel().len();
    assert_eq!(panel.dispatch(Intent::Clear), Dispatched::Local);
    assert_eq!(panel.channel().len(), sent_before);
    assert_eq!(panel.display_state(), DisplayState::Tree);
    assert!(panel.rows().is_empty());
    assert!(panel.tree().collapse_state().is_empty());
}

#[test]
fn pending_promise_row() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![promise(json!({ "guid": 1, "label": "Promise 1", "state": "created" }))],
    );
    let rows = panel.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "Promise 1");
    assert_eq!(rows[0].status_text, "Pending");
    assert_eq!(rows[0].elapsed_text, None);
}

#[test]
fn fulfilled_promise_row() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![promise(json!({
            "guid": 1,
            "label": "Promise 1",
            "state": "fulfilled",
            "value": { "inspect": "value", "type": "type-string" },
            "createdAt": NOW,
            "settledAt": NOW + 10.0
        }))],
    );
    let row = &panel.rows()[0];
    assert_eq!(row.status_text, "Fulfilled");
    assert_eq!(row.value_summary.as_deref(), Some("value"));
    assert_eq!(row.elapsed_text.as_deref(), Some("10.00ms"));
}

#[test]
fn rejected_promise_row() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![promise(json!({
            "guid": 1,
            "label": "Promise 1",
            "state": "rejected",
            "reason": { "inspect": "reason", "type": "type-string" },
            "createdAt": NOW,
            "settledAt": NOW + 20.0
        }))],
    );
    let row = &panel.rows()[0];
    assert_eq!(row.status_text, "Rejected");
    assert_eq!(row.value_summary.as_deref(), Some("reason"));
    assert_eq!(row.elapsed_text.as_deref(), Some("20.00ms"));
}

#[test]
fn chained_promises_start_collapsed() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![
            promise(json!({ "guid": 2, "parent": 1, "label": "Child" })),
            promise(json!({ "guid": 1, "children": [2], "label": "Parent" })),
        ],
    );
    let rows = panel.rows();
    assert_eq!(labels(&rows), vec!["Parent"]);
    assert!(rows[0].has_children);
    assert!(rows[0].collapsed);

    assert_eq!(
        panel.dispatch(Intent::Toggle {
            promise_id: Guid(1)
        }),
        Dispatched::Local
    );
    let rows = panel.rows();
    assert_eq!(labels(&rows), vec!["Parent", "Child"]);
    assert_eq!(rows[1].depth, 1);
}

#[test]
fn trace_only_with_captured_stack() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![
            promise(json!({ "guid": 1, "hasStack": true })),
            promise(json!({ "guid": 2, "hasStack": false })),
        ],
    );
    let rows = panel.rows();
    assert!(rows[0].can_trace);
    assert!(!rows[1].can_trace);

    let promise_id = Guid(1);
    assert_eq!(
        panel.dispatch(Intent::TracePromise { promise_id }),
        Dispatched::Sent(Outbound::TracePromise { promise_id })
    );
    let sent = panel.channel().last().map(Outbound::to_envelope);
    assert_eq!(
        sent,
        Some(Envelope::new(
            "promise:tracePromise",
            Some(json!({ "promiseId": 1 }))
        ))
    );

    let sent_before = panel.channel().len();
    panel.dispatch(Intent::TracePromise {
        promise_id: Guid(2),
    });
    assert_eq!(panel.channel().len(), sent_before);
}

#[test]
fn toggling_instrument_with_stack() {
    let mut panel = panel_with_support(true);
    panel.dispatch(Intent::SetInstrumentWithStack {
        instrument_with_stack: true,
    });
    let sent = panel.channel().last().map(Outbound::to_envelope);
    assert_eq!(
        sent,
        Some(Envelope::new(
            "promise:setInstrumentWithStack",
            Some(json!({ "instrumentWithStack": true }))
        ))
    );
}

#[test]
fn error_reason_logs_stack_trace() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![promise(json!({
            "guid": 1,
            "state": "rejected",
            "reason": { "inspect": "some error", "type": "type-error" }
        }))],
    );
    let row = &panel.rows()[0];
    assert_eq!(row.console_action.map(ConsoleAction::label), Some("Stack trace"));

    panel.dispatch(Intent::SendValueToConsole {
        promise_id: Guid(1),
    });
    let sent = panel.channel().last().map(Outbound::to_envelope);
    assert_eq!(
        sent,
        Some(Envelope::new(
            "promise:sendValueToConsole",
            Some(json!({ "promiseId": 1 }))
        ))
    );
}

#[test]
fn fulfillment_value_to_console() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![promise(json!({
            "guid": 1,
            "state": "fulfilled",
            "value": { "inspect": "some string", "type": "type-string" }
        }))],
    );
    assert_eq!(panel.rows()[0].console_action, Some(ConsoleAction::Value));
    let promise_id = Guid(1);
    assert_eq!(
        panel.dispatch(Intent::SendValueToConsole { promise_id }),
        Dispatched::Sent(Outbound::SendValueToConsole { promise_id })
    );
}

#[test]
fn objects_go_to_the_object_inspector() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![promise(json!({
            "guid": 1,
            "state": "fulfilled",
            "value": { "inspect": "Some Object", "type": "type-ember-object", "objectId": 100 }
        }))],
    );
    let row = &panel.rows()[0];
    assert!(row.is_object_like);
    assert_eq!(row.object_ref, Some(100));

    panel.dispatch(Intent::InspectObject {
        promise_id: Guid(1),
    });
    let sent = panel.channel().last().map(Outbound::to_envelope);
    assert_eq!(
        sent,
        Some(Envelope::new(
            "objectInspector:inspectById",
            Some(json!({ "objectId": 100 }))
        ))
    );
}

#[test]
fn reapplying_a_batch_is_idempotent() {
    let mut panel = panel_with_support(true);
    let promises = vec![
        promise(json!({ "guid": 3, "label": "c", "parent": 1 })),
        promise(json!({ "guid": 1, "label": "a" })),
        promise(json!({ "guid": 2, "label": "b" })),
    ];
    load(&mut panel, promises.clone());
    panel.dispatch(Intent::Toggle {
        promise_id: Guid(1),
    });
    let store_before = panel.tree().store().clone();
    let rows_before = panel.rows();

    load(&mut panel, promises);
    assert_eq!(panel.tree().store(), &store_before);
    assert_eq!(panel.rows(), rows_before);
    assert_eq!(labels(&rows_before), vec!["a", "c", "b"]);
}

#[test]
fn collapse_state_survives_updates() {
    let mut panel = panel_with_support(true);
    load(
        &mut panel,
        vec![
            promise(json!({ "guid": 1, "label": "Parent" })),
            promise(json!({ "guid": 2, "label": "Child", "parent": 1 })),
        ],
    );
    panel.dispatch(Intent::Toggle {
        promise_id: Guid(1),
    });
    load(
        &mut panel,
        vec![
            promise(json!({ "guid": 1, "label": "Parent", "state": "pending" })),
            promise(json!({ "guid": 2, "label": "Child", "parent": 1 })),
            promise(json!({ "guid": 3, "label": "Grandchild", "parent": 2 })),
        ],
    );
    let rows = panel.rows();
    assert_eq!(labels(&rows), vec!["Parent", "Child"]);
    assert!(!rows[0].collapsed);
    assert!(rows[1].collapsed);
}

#[test]
fn orphan_moves_under_parent_that_arrives_later() {
    let mut panel = panel_with_support(true);
    let child = promise(json!({ "guid": 2, "label": "Child", "parent": 1 }));
    load(&mut panel, vec![child.clone()]);
    assert_eq!(labels(&panel.rows()), vec!["Child"]);
    assert_eq!(panel.rows()[0].depth, 0);

    load(
        &mut panel,
        vec![promise(json!({ "guid": 1, "label": "Parent" })), child],
    );
    assert_eq!(panel.tree().store().parent(Guid(2)), Some(Guid(1)));
    assert_eq!(labels(&panel.rows()), vec!["Parent"]);

    panel.dispatch(Intent::Toggle {
        promise_id: Guid(1),
    });
    let rows = panel.rows();
    assert_eq!(labels(&rows), vec!["Parent", "Child"]);
    assert_eq!(rows[1].depth, 1);
}

#[test]
fn forest_invariant_holds_after_messy_batches() {
    let mut panel = panel_with_support(true);
    let received = panel
        .receive(&batch(vec![
            promise(json!({ "guid": 1, "parent": 2 })),
            promise(json!({ "guid": 2, "parent": 1 })),
            promise(json!({ "guid": 3, "parent": 99 })),
            promise(json!({ "guid": 4, "parent": 3, "children": [1, 2, 3] })),
            json!({ "guid": "five" }),
            promise(json!({ "guid": 6, "parent": 6 })),
        ]))
        .unwrap();
    let Received::Batch(report) = received else {
        panic!("batch was not applied");
    };
    assert_eq!(report.applied(), 5);
    assert_eq!(report.rejected.len(), 1);

    let store = panel.tree().store();
    for record in store.records() {
        for &child in store.children(record.guid) {
            assert_eq!(store.parent(child), Some(record.guid));
        }
        let mut seen = vec![record.guid];
        let mut current = store.parent(record.guid);
        while let Some(ancestor) = current {
            assert!(!seen.contains(&ancestor), "cycle through {ancestor}");
            seen.push(ancestor);
            current = store.parent(ancestor);
        }
    }
    assert_eq!(store.roots(), &[Guid(2), Guid(3), Guid(6)]);
}

#[test]
fn clear_then_same_batch_rebuilds_from_scratch() {
    let mut panel = panel_with_support(true);
    let promises = vec![
        promise(json!({ "guid": 1, "label": "Parent" })),
        promise(json!({ "guid": 2, "label": "Child", "parent": 1 })),
    ];
    load(&mut panel, promises.clone());
    let fresh = panel.rows();
    panel.dispatch(Intent::Toggle {
        promise_id: Guid(1),
    });
    panel.dispatch(Intent::Clear);
    assert!(panel.rows().is_empty());
    assert_eq!(panel.tree().collapse_state().len(), 0);

    load(&mut panel, promises);
    assert_eq!(panel.rows(), fresh);
}

#[test]
fn no_handshake_reply_stays_checking() {
    let mut panel = Panel::new(PanelConfig::default(), Outbox::new());
    panel.start();
    panel.start();
    assert_eq!(panel.display_state(), DisplayState::Checking);
    assert_eq!(panel.channel().len(), 1);
}
