// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer (mouse) state.

use bitflags::bitflags;

/// A single pointer button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Middle button / wheel click.
    Middle,
}

bitflags! {
    /// Currently held pointer buttons.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PointerButtons: u8 {
        /// Primary button.
        const LEFT = 1 << 0;
        /// Secondary button.
        const RIGHT = 1 << 1;
        /// Middle button / wheel click.
        const MIDDLE = 1 << 2;
    }
}

impl From<PointerButton> for PointerButtons {
    fn from(button: PointerButton) -> Self {
        match button {
            PointerButton::Left => Self::LEFT,
            PointerButton::Right => Self::RIGHT,
            PointerButton::Middle => Self::MIDDLE,
        }
    }
}

/// Scroll-wheel edges observed since the last poll.
///
/// Axis deltas are reduced to per-poll direction flags; the pump clears them
/// at the start of each drain so a flag means "scrolled this way since the
/// previous poll".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct WheelEdges {
    /// Scrolled up.
    pub up: bool,
    /// Scrolled down.
    pub down: bool,
    /// Scrolled left.
    pub left: bool,
    /// Scrolled right.
    pub right: bool,
}

/// Point-in-time pointer state.
///
/// Coordinates are surface-local physical pixels: backends multiply native
/// surface coordinates by the buffer scale before submitting motion events,
/// so the core never sees logical units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PointerState {
    /// Last reported X position.
    pub x: i32,
    /// Last reported Y position.
    pub y: i32,
    /// Held buttons.
    pub buttons: PointerButtons,
    /// Wheel movement since the last poll.
    pub wheel: WheelEdges,
    /// Whether the pointer is over our surface.
    pub focus: bool,
}

impl PointerState {
    /// Handles pointer entry at the given position.
    pub fn enter(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.focus = true;
    }

    /// Handles pointer departure.
    ///
    /// Buttons are cleared defensively: releases that happen while the
    /// pointer is over another surface are never delivered to us.
    pub fn leave(&mut self) {
        self.focus = false;
        self.buttons = PointerButtons::empty();
    }

    /// Applies a button press or release.
    ///
    /// Releases clear the bit even when the press was never observed.
    pub fn set_button(&mut self, button: PointerButton, pressed: bool) {
        self.buttons.set(button.into(), pressed);
    }

    /// Folds a scroll delta into the per-poll wheel edges.
    ///
    /// Positive values scroll down/right, matching native axis conventions.
    pub fn scroll(&mut self, horizontal: f64, vertical: f64) {
        if vertical < 0.0 {
            self.wheel.up = true;
        } else if vertical > 0.0 {
            self.wheel.down = true;
        }
        if horizontal < 0.0 {
            self.wheel.left = true;
        } else if horizontal > 0.0 {
            self.wheel.right = true;
        }
    }

    /// Clears wheel edges at the start of a poll drain.
    pub fn begin_poll(&mut self) {
        self.wheel = WheelEdges::default();
    }
}

#[cfg(test)]
mod tests {
    use super::{PointerButton, PointerButtons, PointerState};

    #[test]
    fn leave_clears_held_buttons() {
        let mut pointer = PointerState::default();
        pointer.enter(10, 20);
        pointer.set_button(PointerButton::Left, true);
        pointer.set_button(PointerButton::Middle, true);

        pointer.leave();
        assert!(!pointer.focus);
        assert_eq!(pointer.buttons, PointerButtons::empty());
    }

    #[test]
    fn release_without_press_is_harmless() {
        let mut pointer = PointerState::default();
        pointer.set_button(PointerButton::Right, false);
        assert_eq!(pointer.buttons, PointerButtons::empty());
    }

    #[test]
    fn scroll_edges_accumulate_until_begin_poll() {
        let mut pointer = PointerState::default();
        pointer.scroll(0.0, -1.5);
        pointer.scroll(2.0, 0.0);
        assert!(pointer.wheel.up);
        assert!(pointer.wheel.right);
        assert!(!pointer.wheel.down);

        pointer.begin_poll();
        assert!(!pointer.wheel.up);
        assert!(!pointer.wheel.right);
    }
}
