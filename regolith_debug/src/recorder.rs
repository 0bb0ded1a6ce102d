// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.

use regolith_core::event::BackendEvent;

/// One recorded event, stamped with the poll it arrived in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventRecord {
    /// Poll counter at recording time.
    pub poll: u64,
    /// The recorded event.
    pub event: BackendEvent,
}

/// Bounded in-memory recording of a backend event stream.
///
/// The recorder is passive: hosts mirror each event they submit (or observe)
/// into it and bump the poll counter once per frame, keeping the recording
/// aligned with the poll loop. When the limit is reached the oldest records
/// are discarded first.
#[derive(Debug)]
pub struct EventRecorder {
    records: Vec<EventRecord>,
    poll: u64,
    limit: usize,
    dropped: u64,
}

impl EventRecorder {
    /// Default record limit used by [`Default`].
    pub const DEFAULT_LIMIT: usize = 4096;

    /// Creates a recorder holding at most `limit` records.
    ///
    /// `limit == 0` is promoted to `1`.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            poll: 0,
            limit: limit.max(1),
            dropped: 0,
        }
    }

    /// Records one event at the current poll.
    pub fn record(&mut self, event: BackendEvent) {
        if self.records.len() == self.limit {
            self.records.remove(0);
            self.dropped += 1;
        }
        self.records.push(EventRecord {
            poll: self.poll,
            event,
        });
    }

    /// Advances the poll counter; call once per `poll_events`.
    pub fn next_poll(&mut self) {
        self.poll += 1;
    }

    /// Current poll counter.
    #[must_use]
    pub const fn poll(&self) -> u64 {
        self.poll
    }

    /// The retained records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of records discarded due to the limit.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discards all records and resets the poll counter.
    pub fn clear(&mut self) {
        self.records.clear();
        self.poll = 0;
        self.dropped = 0;
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::EventRecorder;
    use regolith_core::event::BackendEvent;

    #[test]
    fn records_are_stamped_with_their_poll() {
        let mut recorder = EventRecorder::default();
        recorder.record(BackendEvent::FocusGained);
        recorder.next_poll();
        recorder.record(BackendEvent::CloseRequested);

        let records = recorder.records();
        assert_eq!(records[0].poll, 0);
        assert_eq!(records[1].poll, 1);
        assert_eq!(records[1].event, BackendEvent::CloseRequested);
    }

    #[test]
    fn limit_discards_oldest_records() {
        let mut recorder = EventRecorder::with_limit(2);
        recorder.record(BackendEvent::FocusGained);
        recorder.record(BackendEvent::FocusLost);
        recorder.record(BackendEvent::CloseRequested);

        assert_eq!(recorder.records().len(), 2);
        assert_eq!(recorder.records()[0].event, BackendEvent::FocusLost);
        assert_eq!(recorder.dropped(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut recorder = EventRecorder::with_limit(4);
        recorder.record(BackendEvent::FocusGained);
        recorder.next_poll();
        recorder.clear();

        assert!(recorder.records().is_empty());
        assert_eq!(recorder.poll(), 0);
    }
}
