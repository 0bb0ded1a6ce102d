// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native key-code translation.
//!
//! The evdev table below serves every backend whose native codes are Linux
//! input event codes (Wayland delivers `wl_keyboard` keys in exactly this
//! space). Browser backends translate `KeyboardEvent.code` strings instead
//! and keep their table crate-local.
//!
//! Remote-control style codes (`KEY_OK`, `KEY_SELECT`, `KEY_EXIT`) alias
//! onto ordinary keys. Each native code maps to exactly one logical [`Key`];
//! aliased codes share a bitmap bit with their target, last writer wins.

use super::key::Key;

/// Translates a Linux evdev key code to the neutral [`Key`] space.
///
/// Returns `None` for codes the frontend has no use for; callers drop those
/// events.
#[must_use]
pub const fn key_from_evdev(code: u32) -> Option<Key> {
    Some(match code {
        1 => Key::Escape,
        2 => Key::Digit1,
        3 => Key::Digit2,
        4 => Key::Digit3,
        5 => Key::Digit4,
        6 => Key::Digit5,
        7 => Key::Digit6,
        8 => Key::Digit7,
        9 => Key::Digit8,
        10 => Key::Digit9,
        11 => Key::Digit0,
        12 => Key::Minus,
        13 => Key::Equals,
        14 => Key::Backspace,
        15 => Key::Tab,
        16 => Key::Q,
        17 => Key::W,
        18 => Key::E,
        19 => Key::R,
        20 => Key::T,
        21 => Key::Y,
        22 => Key::U,
        23 => Key::I,
        24 => Key::O,
        25 => Key::P,
        26 => Key::LeftBracket,
        27 => Key::RightBracket,
        28 => Key::Enter,
        29 => Key::LeftCtrl,
        30 => Key::A,
        31 => Key::S,
        32 => Key::D,
        33 => Key::F,
        34 => Key::G,
        35 => Key::H,
        36 => Key::J,
        37 => Key::K,
        38 => Key::L,
        39 => Key::Semicolon,
        40 => Key::Apostrophe,
        41 => Key::Grave,
        42 => Key::LeftShift,
        43 => Key::Backslash,
        44 => Key::Z,
        45 => Key::X,
        46 => Key::C,
        47 => Key::V,
        48 => Key::B,
        49 => Key::N,
        50 => Key::M,
        51 => Key::Comma,
        52 => Key::Period,
        53 => Key::Slash,
        54 => Key::RightShift,
        55 => Key::KpMultiply,
        56 => Key::LeftAlt,
        57 => Key::Space,
        58 => Key::CapsLock,
        59 => Key::F1,
        60 => Key::F2,
        61 => Key::F3,
        62 => Key::F4,
        63 => Key::F5,
        64 => Key::F6,
        65 => Key::F7,
        66 => Key::F8,
        67 => Key::F9,
        68 => Key::F10,
        69 => Key::NumLock,
        70 => Key::ScrollLock,
        71 => Key::Kp7,
        72 => Key::Kp8,
        73 => Key::Kp9,
        74 => Key::KpMinus,
        75 => Key::Kp4,
        76 => Key::Kp5,
        77 => Key::Kp6,
        78 => Key::KpPlus,
        79 => Key::Kp1,
        80 => Key::Kp2,
        81 => Key::Kp3,
        82 => Key::Kp0,
        83 => Key::KpPeriod,
        87 => Key::F11,
        88 => Key::F12,
        96 => Key::KpEnter,
        97 => Key::RightCtrl,
        98 => Key::KpDivide,
        100 => Key::RightAlt,
        102 => Key::Home,
        103 => Key::Up,
        104 => Key::PageUp,
        105 => Key::Left,
        106 => Key::Right,
        107 => Key::End,
        108 => Key::Down,
        109 => Key::PageDown,
        110 => Key::Insert,
        111 => Key::Delete,
        119 => Key::Pause,
        125 => Key::LeftMeta,
        126 => Key::RightMeta,
        127 => Key::Menu,
        // Remote-control aliases. KEY_OK and KEY_SELECT act as Enter,
        // KEY_EXIT acts as Escape.
        174 => Key::Escape,
        352 => Key::Enter,
        353 => Key::Enter,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::key_from_evdev;
    use crate::input::key::Key;

    #[test]
    fn letters_and_controls_translate() {
        assert_eq!(key_from_evdev(30), Some(Key::A));
        assert_eq!(key_from_evdev(28), Some(Key::Enter));
        assert_eq!(key_from_evdev(1), Some(Key::Escape));
        assert_eq!(key_from_evdev(103), Some(Key::Up));
    }

    #[test]
    fn remote_aliases_map_to_one_logical_key_each() {
        // KEY_OK and KEY_SELECT both act as Enter; KEY_EXIT acts as Escape.
        assert_eq!(key_from_evdev(352), Some(Key::Enter));
        assert_eq!(key_from_evdev(353), Some(Key::Enter));
        assert_eq!(key_from_evdev(174), Some(Key::Escape));
    }

    #[test]
    fn unknown_codes_are_dropped() {
        assert_eq!(key_from_evdev(0), None);
        assert_eq!(key_from_evdev(240), None);
        assert_eq!(key_from_evdev(0xFFFF), None);
    }
}
