// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM listener wiring.
//!
//! Browser events arrive through JS callbacks at arbitrary times. The
//! listeners here do nothing but translate and drop the result into a
//! shared [`EventInbox`]; the backend empties the inbox into its event pump
//! during `poll_events`, which keeps every state mutation on the caller's
//! schedule.
//!
//! Listener closures are retained (and removed again on teardown) through
//! [`DomListeners`]; forgetting them would leak the JS-side functions.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast as _;
use web_sys::{Event, EventTarget, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent};

use regolith_core::event::BackendEvent;
use regolith_core::input::pointer::PointerButton;

use crate::keymap::key_from_dom_code;

/// Shared queue between DOM callbacks and the backend's poll.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventInbox {
    events: Rc<RefCell<Vec<BackendEvent>>>,
}

impl EventInbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, event: BackendEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Takes every queued event, oldest first.
    pub(crate) fn take(&self) -> Vec<BackendEvent> {
        core::mem::take(&mut *self.events.borrow_mut())
    }
}

type DomClosure = Closure<dyn FnMut(Event)>;

struct Registration {
    target: EventTarget,
    name: &'static str,
    closure: DomClosure,
}

/// Registered DOM listeners, removed again on drop.
pub(crate) struct DomListeners {
    registrations: Vec<Registration>,
    scale: Rc<RefCell<f64>>,
}

impl core::fmt::Debug for DomListeners {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomListeners")
            .field("registrations", &self.registrations.len())
            .finish_non_exhaustive()
    }
}

impl DomListeners {
    /// Hooks keyboard, pointer, touch, focus, and context-loss events.
    ///
    /// `scale` is read at event time so coordinates always use the current
    /// devicePixelRatio.
    pub(crate) fn install(
        window: &web_sys::Window,
        canvas: &web_sys::HtmlCanvasElement,
        inbox: &EventInbox,
    ) -> Self {
        let scale = Rc::new(RefCell::new(1.0));
        let mut listeners = Self {
            registrations: Vec::new(),
            scale: Rc::clone(&scale),
        };

        let window_target: &EventTarget = window.as_ref();
        let canvas_target: &EventTarget = canvas.as_ref();

        // Keyboard, on the window: canvases don't take key focus by default.
        listeners.add(window_target, "keydown", {
            let inbox = inbox.clone();
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                    if let Some(key) = key_from_dom_code(&event.code()) {
                        inbox.push(BackendEvent::Key { key, pressed: true });
                    }
                }
            }
        });
        listeners.add(window_target, "keyup", {
            let inbox = inbox.clone();
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                    if let Some(key) = key_from_dom_code(&event.code()) {
                        inbox.push(BackendEvent::Key {
                            key,
                            pressed: false,
                        });
                    }
                }
            }
        });
        listeners.add(window_target, "focus", {
            let inbox = inbox.clone();
            move |_| inbox.push(BackendEvent::FocusGained)
        });
        listeners.add(window_target, "blur", {
            let inbox = inbox.clone();
            move |_| inbox.push(BackendEvent::FocusLost)
        });

        // Pointer, on the canvas, scaled to physical pixels.
        listeners.add(canvas_target, "mouseenter", {
            let inbox = inbox.clone();
            let scale = Rc::clone(&scale);
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    let (x, y) = scaled_position(event, *scale.borrow());
                    inbox.push(BackendEvent::PointerEntered { x, y });
                }
            }
        });
        listeners.add(canvas_target, "mouseleave", {
            let inbox = inbox.clone();
            move |_| inbox.push(BackendEvent::PointerLeft)
        });
        listeners.add(canvas_target, "mousemove", {
            let inbox = inbox.clone();
            let scale = Rc::clone(&scale);
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    let (x, y) = scaled_position(event, *scale.borrow());
                    inbox.push(BackendEvent::PointerMoved { x, y });
                }
            }
        });
        listeners.add(canvas_target, "mousedown", {
            let inbox = inbox.clone();
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    if let Some(button) = dom_button(event.button()) {
                        inbox.push(BackendEvent::PointerButton {
                            button,
                            pressed: true,
                        });
                    }
                }
            }
        });
        listeners.add(canvas_target, "mouseup", {
            let inbox = inbox.clone();
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    if let Some(button) = dom_button(event.button()) {
                        inbox.push(BackendEvent::PointerButton {
                            button,
                            pressed: false,
                        });
                    }
                }
            }
        });
        listeners.add(canvas_target, "wheel", {
            let inbox = inbox.clone();
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<WheelEvent>() {
                    inbox.push(BackendEvent::Scroll {
                        horizontal: event.delta_x(),
                        vertical: event.delta_y(),
                    });
                }
            }
        });

        // Touch, on the canvas.
        listeners.add(canvas_target, "touchstart", {
            let inbox = inbox.clone();
            let scale = Rc::clone(&scale);
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<TouchEvent>() {
                    for_each_changed_touch(event, *scale.borrow(), |id, x, y| {
                        inbox.push(BackendEvent::TouchDown { id, x, y });
                    });
                }
            }
        });
        listeners.add(canvas_target, "touchend", {
            let inbox = inbox.clone();
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<TouchEvent>() {
                    for_each_changed_touch(event, 1.0, |id, _, _| {
                        inbox.push(BackendEvent::TouchUp { id });
                    });
                }
            }
        });
        listeners.add(canvas_target, "touchmove", {
            let inbox = inbox.clone();
            let scale = Rc::clone(&scale);
            move |event: Event| {
                if let Some(event) = event.dyn_ref::<TouchEvent>() {
                    for_each_changed_touch(event, *scale.borrow(), |id, x, y| {
                        inbox.push(BackendEvent::TouchMoved { id, x, y });
                    });
                }
            }
        });
        listeners.add(canvas_target, "touchcancel", {
            let inbox = inbox.clone();
            move |_| inbox.push(BackendEvent::TouchCancelled)
        });

        // Context loss is the web's device loss. Cancelling the default
        // keeps the browser willing to restore the context later.
        listeners.add(canvas_target, "webglcontextlost", {
            let inbox = inbox.clone();
            move |event: Event| {
                event.prevent_default();
                inbox.push(BackendEvent::DeviceLost);
            }
        });

        listeners
    }

    /// Publishes the scale factor used for event coordinates.
    pub(crate) fn set_scale(&self, scale: f64) {
        *self.scale.borrow_mut() = scale;
    }

    fn add(&mut self, target: &EventTarget, name: &'static str, handler: impl FnMut(Event) + 'static) {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        if target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::warn!("failed to register {name} listener");
        }
        self.registrations.push(Registration {
            target: target.clone(),
            name,
            closure,
        });
    }
}

impl Drop for DomListeners {
    fn drop(&mut self) {
        for registration in &self.registrations {
            let _ = registration.target.remove_event_listener_with_callback(
                registration.name,
                registration.closure.as_ref().unchecked_ref(),
            );
        }
    }
}

fn scaled_position(event: &MouseEvent, scale: f64) -> (i32, i32) {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "canvas coordinates fit i32 after scale multiply"
    )]
    let scaled = (
        (f64::from(event.offset_x()) * scale) as i32,
        (f64::from(event.offset_y()) * scale) as i32,
    );
    scaled
}

fn dom_button(button: i16) -> Option<PointerButton> {
    match button {
        0 => Some(PointerButton::Left),
        1 => Some(PointerButton::Middle),
        2 => Some(PointerButton::Right),
        _ => None,
    }
}

fn for_each_changed_touch(event: &TouchEvent, scale: f64, mut visit: impl FnMut(i32, i32, i32)) {
    let touches = event.changed_touches();
    for index in 0..touches.length() {
        if let Some(touch) = touches.item(index) {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "client coordinates fit i32 after scale multiply"
            )]
            let (x, y) = (
                (f64::from(touch.client_x()) * scale) as i32,
                (f64::from(touch.client_y()) * scale) as i32,
            );
            visit(touch.identifier(), x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::dom_button;
    use regolith_core::input::pointer::PointerButton;

    #[test]
    fn dom_button_order_is_left_middle_right() {
        assert_eq!(dom_button(0), Some(PointerButton::Left));
        assert_eq!(dom_button(1), Some(PointerButton::Middle));
        assert_eq!(dom_button(2), Some(PointerButton::Right));
        assert_eq!(dom_button(3), None);
    }
}
