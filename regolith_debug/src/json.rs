// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of recorded event streams.
//!
//! Produces an array of flat objects, one per record, suitable for external
//! analysis tooling. The mapping is intentionally lossless: every event
//! field lands in the object under a stable name.

use regolith_core::event::BackendEvent;
use serde_json::{json, Value};

use crate::recorder::EventRecord;

/// Converts one record to a JSON object.
#[must_use]
pub fn record_to_json(record: &EventRecord) -> Value {
    let mut value = event_to_json(&record.event);
    value["poll"] = json!(record.poll);
    value
}

/// Converts a slice of records to a JSON array.
#[must_use]
pub fn records_to_json(records: &[EventRecord]) -> Value {
    Value::Array(records.iter().map(record_to_json).collect())
}

fn event_to_json(event: &BackendEvent) -> Value {
    match event {
        BackendEvent::CloseRequested => json!({"kind": "close_requested"}),
        BackendEvent::Resized { width, height } => {
            json!({"kind": "resized", "width": width, "height": height})
        }
        BackendEvent::ScaleChanged { scale } => json!({"kind": "scale_changed", "scale": scale}),
        BackendEvent::FullscreenChanged { fullscreen } => {
            json!({"kind": "fullscreen_changed", "fullscreen": fullscreen})
        }
        BackendEvent::FocusGained => json!({"kind": "focus_gained"}),
        BackendEvent::FocusLost => json!({"kind": "focus_lost"}),
        BackendEvent::Key { key, pressed } => {
            json!({"kind": "key", "key": format!("{key:?}"), "pressed": pressed})
        }
        BackendEvent::PointerEntered { x, y } => {
            json!({"kind": "pointer_entered", "x": x, "y": y})
        }
        BackendEvent::PointerLeft => json!({"kind": "pointer_left"}),
        BackendEvent::PointerMoved { x, y } => json!({"kind": "pointer_moved", "x": x, "y": y}),
        BackendEvent::PointerButton { button, pressed } => {
            json!({"kind": "pointer_button", "button": format!("{button:?}"), "pressed": pressed})
        }
        BackendEvent::Scroll {
            horizontal,
            vertical,
        } => json!({"kind": "scroll", "horizontal": horizontal, "vertical": vertical}),
        BackendEvent::TouchDown { id, x, y } => {
            json!({"kind": "touch_down", "id": id, "x": x, "y": y})
        }
        BackendEvent::TouchUp { id } => json!({"kind": "touch_up", "id": id}),
        BackendEvent::TouchMoved { id, x, y } => {
            json!({"kind": "touch_moved", "id": id, "x": x, "y": y})
        }
        BackendEvent::TouchCancelled => json!({"kind": "touch_cancelled"}),
        BackendEvent::DeviceLost => json!({"kind": "device_lost"}),
    }
}

#[cfg(test)]
mod tests {
    use super::{record_to_json, records_to_json};
    use crate::recorder::EventRecorder;
    use regolith_core::event::BackendEvent;

    #[test]
    fn resize_record_exports_all_fields() {
        let mut recorder = EventRecorder::default();
        recorder.next_poll();
        recorder.record(BackendEvent::Resized {
            width: 640,
            height: 480,
        });

        let value = record_to_json(&recorder.records()[0]);
        assert_eq!(value["kind"], "resized");
        assert_eq!(value["width"], 640);
        assert_eq!(value["height"], 480);
        assert_eq!(value["poll"], 1);
    }

    #[test]
    fn array_export_preserves_order() {
        let mut recorder = EventRecorder::default();
        recorder.record(BackendEvent::FocusGained);
        recorder.record(BackendEvent::DeviceLost);

        let array = records_to_json(recorder.records());
        assert_eq!(array[0]["kind"], "focus_gained");
        assert_eq!(array[1]["kind"], "device_lost");
    }
}
