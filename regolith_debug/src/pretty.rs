// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable event dumps.
//!
//! One line per record, to any [`Write`](std::io::Write) destination
//! (default: stderr).

use std::io::Write;

use regolith_core::event::BackendEvent;

use crate::recorder::EventRecord;

/// Writes recorded events one line at a time.
pub struct PrettyPrinter<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrinter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrinter").finish_non_exhaustive()
    }
}

impl PrettyPrinter {
    /// Creates a printer that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }
}

impl<W: Write> PrettyPrinter<W> {
    /// Creates a printer that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one line for `record`.
    pub fn print(&mut self, record: &EventRecord) {
        let _ = writeln!(
            self.writer,
            "[poll {}] {}",
            record.poll,
            describe(&record.event)
        );
    }

    /// Writes every record in order.
    pub fn print_all(&mut self, records: &[EventRecord]) {
        for record in records {
            self.print(record);
        }
    }
}

/// Returns a one-line description of an event.
#[must_use]
pub fn describe(event: &BackendEvent) -> String {
    match event {
        BackendEvent::CloseRequested => "close requested".to_string(),
        BackendEvent::Resized { width, height } => format!("resized {width}x{height}"),
        BackendEvent::ScaleChanged { scale } => format!("scale {scale}"),
        BackendEvent::FullscreenChanged { fullscreen } => {
            format!("fullscreen {fullscreen}")
        }
        BackendEvent::FocusGained => "focus gained".to_string(),
        BackendEvent::FocusLost => "focus lost".to_string(),
        BackendEvent::Key { key, pressed } => {
            format!("key {key:?} {}", press_word(*pressed))
        }
        BackendEvent::PointerEntered { x, y } => format!("pointer enter {x},{y}"),
        BackendEvent::PointerLeft => "pointer leave".to_string(),
        BackendEvent::PointerMoved { x, y } => format!("pointer move {x},{y}"),
        BackendEvent::PointerButton { button, pressed } => {
            format!("button {button:?} {}", press_word(*pressed))
        }
        BackendEvent::Scroll {
            horizontal,
            vertical,
        } => format!("scroll {horizontal},{vertical}"),
        BackendEvent::TouchDown { id, x, y } => format!("touch {id} down {x},{y}"),
        BackendEvent::TouchUp { id } => format!("touch {id} up"),
        BackendEvent::TouchMoved { id, x, y } => format!("touch {id} move {x},{y}"),
        BackendEvent::TouchCancelled => "touch cancelled".to_string(),
        BackendEvent::DeviceLost => "device lost".to_string(),
    }
}

fn press_word(pressed: bool) -> &'static str {
    if pressed { "down" } else { "up" }
}

#[cfg(test)]
mod tests {
    use super::{describe, PrettyPrinter};
    use crate::recorder::EventRecorder;
    use regolith_core::event::BackendEvent;
    use regolith_core::input::key::Key;

    #[test]
    fn describe_covers_common_events() {
        assert_eq!(
            describe(&BackendEvent::Resized {
                width: 800,
                height: 600
            }),
            "resized 800x600"
        );
        assert_eq!(
            describe(&BackendEvent::Key {
                key: Key::Enter,
                pressed: true
            }),
            "key Enter down"
        );
        assert_eq!(describe(&BackendEvent::DeviceLost), "device lost");
    }

    #[test]
    fn print_all_writes_one_line_per_record() {
        let mut recorder = EventRecorder::default();
        recorder.record(BackendEvent::FocusGained);
        recorder.next_poll();
        recorder.record(BackendEvent::TouchUp { id: 3 });

        let mut out = Vec::new();
        PrettyPrinter::with_writer(&mut out).print_all(recorder.records());
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "[poll 0] focus gained\n[poll 1] touch 3 up\n");
    }
}
