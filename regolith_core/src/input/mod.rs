// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform-neutral input state.
//!
//! The core consumes input by point-in-time query, never by callback: native
//! events are translated by the backend, queued, and folded into an
//! [`InputState`] when the queue drains. The snapshot covers the three
//! device classes a seat can offer:
//!
//! - **[`keyboard`](InputState::keyboard)** — pressed-key bitmap over the
//!   neutral [`Key`](key::Key) space, plus keyboard focus.
//! - **[`pointer`](InputState::pointer)** — position, held buttons, per-poll
//!   wheel edges, pointer focus.
//! - **[`touch`](InputState::touch)** — fixed-capacity slot table of active
//!   contacts.
//!
//! All clearing is defensive: focus loss and cancellation wipe state rather
//! than waiting for release events the native system may never deliver.

pub mod key;
pub mod keymap;
pub mod pointer;
pub mod touch;

use key::KeyBitmap;
use pointer::PointerState;
use touch::TouchTable;

/// Point-in-time snapshot of every input device.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputState {
    keyboard: KeyBitmap,
    keyboard_focus: bool,
    pointer: PointerState,
    touch: TouchTable,
}

impl InputState {
    /// Creates an empty snapshot with no focus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The pressed-key bitmap.
    #[must_use]
    pub const fn keyboard(&self) -> &KeyBitmap {
        &self.keyboard
    }

    /// Whether our surface has keyboard focus.
    #[must_use]
    pub const fn keyboard_focus(&self) -> bool {
        self.keyboard_focus
    }

    /// The pointer snapshot.
    #[must_use]
    pub const fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// The touch slot table.
    #[must_use]
    pub const fn touch(&self) -> &TouchTable {
        &self.touch
    }

    // -- Mutation entry points used by the event pump --

    pub(crate) fn key_event(&mut self, key: key::Key, pressed: bool) {
        self.keyboard.set(key, pressed);
    }

    pub(crate) fn focus_gained(&mut self) {
        self.keyboard_focus = true;
    }

    /// Focus loss releases all keys: the native system swallows key-up
    /// events delivered to whichever surface takes focus next.
    pub(crate) fn focus_lost(&mut self) {
        self.keyboard_focus = false;
        self.keyboard.clear();
    }

    pub(crate) fn pointer_mut(&mut self) -> &mut PointerState {
        &mut self.pointer
    }

    pub(crate) fn touch_mut(&mut self) -> &mut TouchTable {
        &mut self.touch
    }

    /// Clears everything. Used at device teardown.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::InputState;
    use super::key::Key;

    #[test]
    fn focus_loss_releases_all_keys() {
        let mut input = InputState::new();
        input.focus_gained();
        input.key_event(Key::A, true);
        input.key_event(Key::LeftShift, true);
        assert_eq!(input.keyboard().count(), 2);

        input.focus_lost();
        assert!(!input.keyboard_focus());
        assert!(input.keyboard().is_empty());
    }

    #[test]
    fn reset_returns_to_default() {
        let mut input = InputState::new();
        input.focus_gained();
        input.touch_mut().down(1, 5, 5);
        input.pointer_mut().enter(3, 4);

        input.reset();
        assert!(!input.keyboard_focus());
        assert!(input.touch().is_empty());
        assert!(!input.pointer().focus);
    }
}
