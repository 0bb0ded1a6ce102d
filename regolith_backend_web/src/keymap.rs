// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `KeyboardEvent.code` translation.
//!
//! Browsers report physical key positions as strings. The table mirrors the
//! evdev table in `regolith_core`, covering the same neutral [`Key`] space.

use regolith_core::input::key::Key;

/// Translates a DOM `KeyboardEvent.code` value to the neutral [`Key`] space.
///
/// Returns `None` for codes the frontend has no use for.
#[must_use]
pub fn key_from_dom_code(code: &str) -> Option<Key> {
    Some(match code {
        "Backspace" => Key::Backspace,
        "Tab" => Key::Tab,
        "Enter" => Key::Enter,
        "Escape" => Key::Escape,
        "Space" => Key::Space,
        "Minus" => Key::Minus,
        "Equal" => Key::Equals,
        "BracketLeft" => Key::LeftBracket,
        "BracketRight" => Key::RightBracket,
        "Backslash" => Key::Backslash,
        "Semicolon" => Key::Semicolon,
        "Quote" => Key::Apostrophe,
        "Backquote" => Key::Grave,
        "Comma" => Key::Comma,
        "Period" => Key::Period,
        "Slash" => Key::Slash,
        "Digit0" => Key::Digit0,
        "Digit1" => Key::Digit1,
        "Digit2" => Key::Digit2,
        "Digit3" => Key::Digit3,
        "Digit4" => Key::Digit4,
        "Digit5" => Key::Digit5,
        "Digit6" => Key::Digit6,
        "Digit7" => Key::Digit7,
        "Digit8" => Key::Digit8,
        "Digit9" => Key::Digit9,
        "KeyA" => Key::A,
        "KeyB" => Key::B,
        "KeyC" => Key::C,
        "KeyD" => Key::D,
        "KeyE" => Key::E,
        "KeyF" => Key::F,
        "KeyG" => Key::G,
        "KeyH" => Key::H,
        "KeyI" => Key::I,
        "KeyJ" => Key::J,
        "KeyK" => Key::K,
        "KeyL" => Key::L,
        "KeyM" => Key::M,
        "KeyN" => Key::N,
        "KeyO" => Key::O,
        "KeyP" => Key::P,
        "KeyQ" => Key::Q,
        "KeyR" => Key::R,
        "KeyS" => Key::S,
        "KeyT" => Key::T,
        "KeyU" => Key::U,
        "KeyV" => Key::V,
        "KeyW" => Key::W,
        "KeyX" => Key::X,
        "KeyY" => Key::Y,
        "KeyZ" => Key::Z,
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        "Insert" => Key::Insert,
        "Delete" => Key::Delete,
        "Home" => Key::Home,
        "End" => Key::End,
        "PageUp" => Key::PageUp,
        "PageDown" => Key::PageDown,
        "ArrowUp" => Key::Up,
        "ArrowDown" => Key::Down,
        "ArrowLeft" => Key::Left,
        "ArrowRight" => Key::Right,
        "CapsLock" => Key::CapsLock,
        "NumLock" => Key::NumLock,
        "ScrollLock" => Key::ScrollLock,
        "Pause" => Key::Pause,
        "ContextMenu" => Key::Menu,
        "ShiftLeft" => Key::LeftShift,
        "ShiftRight" => Key::RightShift,
        "ControlLeft" => Key::LeftCtrl,
        "ControlRight" => Key::RightCtrl,
        "AltLeft" => Key::LeftAlt,
        "AltRight" => Key::RightAlt,
        "MetaLeft" => Key::LeftMeta,
        "MetaRight" => Key::RightMeta,
        "Numpad0" => Key::Kp0,
        "Numpad1" => Key::Kp1,
        "Numpad2" => Key::Kp2,
        "Numpad3" => Key::Kp3,
        "Numpad4" => Key::Kp4,
        "Numpad5" => Key::Kp5,
        "Numpad6" => Key::Kp6,
        "Numpad7" => Key::Kp7,
        "Numpad8" => Key::Kp8,
        "Numpad9" => Key::Kp9,
        "NumpadEnter" => Key::KpEnter,
        "NumpadAdd" => Key::KpPlus,
        "NumpadSubtract" => Key::KpMinus,
        "NumpadMultiply" => Key::KpMultiply,
        "NumpadDivide" => Key::KpDivide,
        "NumpadDecimal" => Key::KpPeriod,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::key_from_dom_code;
    use regolith_core::input::key::Key;

    #[test]
    fn common_codes_translate() {
        assert_eq!(key_from_dom_code("KeyA"), Some(Key::A));
        assert_eq!(key_from_dom_code("Enter"), Some(Key::Enter));
        assert_eq!(key_from_dom_code("ArrowLeft"), Some(Key::Left));
        assert_eq!(key_from_dom_code("NumpadEnter"), Some(Key::KpEnter));
    }

    #[test]
    fn unknown_codes_are_dropped() {
        assert_eq!(key_from_dom_code("MediaPlayPause"), None);
        assert_eq!(key_from_dom_code(""), None);
    }
}
