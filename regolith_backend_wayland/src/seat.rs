// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Seat input dispatch: keyboard, pointer, touch.
//!
//! Devices come and go with seat capability announcements; losing one
//! defensively clears its state, since the matching release events will
//! never arrive. Key codes are evdev codes and go through the shared
//! [`key_from_evdev`] table; pointer and touch coordinates are scaled to
//! physical pixels before they enter the queue.

use wayland_client::protocol::{wl_keyboard, wl_pointer, wl_seat, wl_touch};
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum};

use regolith_core::event::BackendEvent;
use regolith_core::input::keymap::key_from_evdev;
use regolith_core::input::pointer::PointerButton;

use crate::state::WaylandState;

// Linux input event codes for pointer buttons.
const BTN_LEFT: u32 = 0x110;
const BTN_RIGHT: u32 = 0x111;
const BTN_MIDDLE: u32 = 0x112;

pub(crate) fn handle_seat_event(
    state: &mut WaylandState,
    seat: &wl_seat::WlSeat,
    event: wl_seat::Event,
    qh: &QueueHandle<WaylandState>,
) {
    let wl_seat::Event::Capabilities {
        capabilities: WEnum::Value(caps),
    } = event
    else {
        return;
    };

    let has_keyboard = caps.contains(wl_seat::Capability::Keyboard);
    if has_keyboard && state.keyboard.is_none() {
        state.keyboard = Some(seat.get_keyboard(qh, ()));
    } else if !has_keyboard && state.keyboard.is_some() {
        if let Some(keyboard) = state.keyboard.take() {
            keyboard.release();
        }
        state.pump.submit(BackendEvent::FocusLost);
    }

    let has_pointer = caps.contains(wl_seat::Capability::Pointer);
    if has_pointer && state.pointer.is_none() {
        state.pointer = Some(seat.get_pointer(qh, ()));
    } else if !has_pointer && state.pointer.is_some() {
        if let Some(pointer) = state.pointer.take() {
            pointer.release();
        }
        state.pump.submit(BackendEvent::PointerLeft);
    }

    let has_touch = caps.contains(wl_seat::Capability::Touch);
    if has_touch && state.touch.is_none() {
        state.touch = Some(seat.get_touch(qh, ()));
    } else if !has_touch && state.touch.is_some() {
        if let Some(touch) = state.touch.take() {
            touch.release();
        }
        state.pump.submit(BackendEvent::TouchCancelled);
    }

    state.capabilities.keyboard = has_keyboard;
    state.capabilities.pointer = has_pointer;
    state.capabilities.touch = has_touch;
}

impl Dispatch<wl_keyboard::WlKeyboard, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_keyboard::WlKeyboard,
        event: wl_keyboard::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_keyboard::Event::Keymap { format, size, .. } => {
                // The descriptor closes on drop; raw evdev translation needs
                // no compiled keymap.
                log::debug!("keymap announced: format {format:?}, {size} bytes");
            }
            wl_keyboard::Event::Enter { .. } => {
                state.pump.submit(BackendEvent::FocusGained);
            }
            wl_keyboard::Event::Leave { .. } => {
                state.pump.submit(BackendEvent::FocusLost);
            }
            wl_keyboard::Event::Key {
                key,
                state: WEnum::Value(key_state),
                ..
            } => {
                if let Some(key) = key_from_evdev(key) {
                    state.pump.submit(BackendEvent::Key {
                        key,
                        pressed: key_state == wl_keyboard::KeyState::Pressed,
                    });
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_pointer::WlPointer, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_pointer::WlPointer,
        event: wl_pointer::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_pointer::Event::Enter {
                surface_x,
                surface_y,
                ..
            } => {
                let x = state.scale_coord(surface_x);
                let y = state.scale_coord(surface_y);
                state.pump.submit(BackendEvent::PointerEntered { x, y });
            }
            wl_pointer::Event::Leave { .. } => {
                state.pump.submit(BackendEvent::PointerLeft);
            }
            wl_pointer::Event::Motion {
                surface_x,
                surface_y,
                ..
            } => {
                let x = state.scale_coord(surface_x);
                let y = state.scale_coord(surface_y);
                state.pump.submit(BackendEvent::PointerMoved { x, y });
            }
            wl_pointer::Event::Button {
                button,
                state: WEnum::Value(button_state),
                ..
            } => {
                let button = match button {
                    BTN_LEFT => PointerButton::Left,
                    BTN_RIGHT => PointerButton::Right,
                    BTN_MIDDLE => PointerButton::Middle,
                    _ => return,
                };
                state.pump.submit(BackendEvent::PointerButton {
                    button,
                    pressed: button_state == wl_pointer::ButtonState::Pressed,
                });
            }
            wl_pointer::Event::Axis {
                axis: WEnum::Value(axis),
                value,
                ..
            } => {
                let (horizontal, vertical) = match axis {
                    wl_pointer::Axis::VerticalScroll => (0.0, value),
                    wl_pointer::Axis::HorizontalScroll => (value, 0.0),
                    _ => return,
                };
                state.pump.submit(BackendEvent::Scroll {
                    horizontal,
                    vertical,
                });
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_touch::WlTouch, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_touch::WlTouch,
        event: wl_touch::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_touch::Event::Down { id, x, y, .. } => {
                let x = state.scale_coord(x);
                let y = state.scale_coord(y);
                state.pump.submit(BackendEvent::TouchDown { id, x, y });
            }
            wl_touch::Event::Up { id, .. } => {
                state.pump.submit(BackendEvent::TouchUp { id });
            }
            wl_touch::Event::Motion { id, x, y, .. } => {
                let x = state.scale_coord(x);
                let y = state.scale_coord(y);
                state.pump.submit(BackendEvent::TouchMoved { id, x, y });
            }
            wl_touch::Event::Cancel => {
                state.pump.submit(BackendEvent::TouchCancelled);
            }
            _ => {}
        }
    }
}
