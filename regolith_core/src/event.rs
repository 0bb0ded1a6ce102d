// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform-neutral backend events and the poll-time pump.
//!
//! Native systems deliver input and window state through listener callbacks.
//! Regolith backends do not let those callbacks touch shared state directly;
//! they translate each native event into a [`BackendEvent`] and push it onto
//! an [`EventQueue`]. Once per frame the core calls
//! [`Backend::poll_events`](crate::backend::Backend::poll_events), which
//! performs the native I/O and then drains the queue through an
//! [`EventPump`], applying events in arrival order to the input state and
//! viewport. Ordering is preserved and no handler ever re-enters the core.
//!
//! # Coordinate contract
//!
//! Pointer and touch positions are surface-local physical pixels: the
//! backend multiplies native coordinates by its buffer scale *before*
//! constructing the event.

use crate::error::BackendError;
use crate::input::key::Key;
use crate::input::pointer::PointerButton;
use crate::input::InputState;
use crate::queue::BoundedQueue;
use crate::viewport::Viewport;

/// A translated native event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BackendEvent {
    /// The user or window system asked the session to end.
    CloseRequested,
    /// The surface changed size (physical pixels).
    Resized {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
    /// The native scale factor changed.
    ScaleChanged {
        /// New scale factor.
        scale: f64,
    },
    /// The surface entered or left fullscreen.
    FullscreenChanged {
        /// New fullscreen state.
        fullscreen: bool,
    },
    /// Our surface gained keyboard focus.
    FocusGained,
    /// Our surface lost keyboard focus.
    FocusLost,
    /// A key changed state.
    Key {
        /// Logical key.
        key: Key,
        /// Pressed (`true`) or released (`false`).
        pressed: bool,
    },
    /// The pointer entered our surface.
    PointerEntered {
        /// Entry X position.
        x: i32,
        /// Entry Y position.
        y: i32,
    },
    /// The pointer left our surface.
    PointerLeft,
    /// The pointer moved.
    PointerMoved {
        /// New X position.
        x: i32,
        /// New Y position.
        y: i32,
    },
    /// A pointer button changed state.
    PointerButton {
        /// Which button.
        button: PointerButton,
        /// Pressed (`true`) or released (`false`).
        pressed: bool,
    },
    /// The scroll wheel moved. Positive values scroll down/right.
    Scroll {
        /// Horizontal delta.
        horizontal: f64,
        /// Vertical delta.
        vertical: f64,
    },
    /// A touch contact began.
    TouchDown {
        /// Native touch id.
        id: i32,
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
    },
    /// A touch contact ended.
    TouchUp {
        /// Native touch id.
        id: i32,
    },
    /// A touch contact moved.
    TouchMoved {
        /// Native touch id.
        id: i32,
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
    },
    /// The touch sequence was cancelled; all contacts are void.
    TouchCancelled,
    /// The native rendering context was invalidated.
    DeviceLost,
}

/// Bounded FIFO of [`BackendEvent`] values.
///
/// Overflow policy is `drop_oldest`: when full, pushing removes the oldest
/// queued event first. The pump reports drops on the next drain.
#[derive(Debug, Clone)]
pub struct EventQueue {
    inner: BoundedQueue<BackendEvent>,
}

impl EventQueue {
    /// Default queue capacity used by [`Default`].
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a queue with an explicit capacity.
    ///
    /// `capacity == 0` is promoted to `1`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BoundedQueue::with_capacity(capacity),
        }
    }

    /// Enqueues one event.
    pub fn push(&mut self, event: BackendEvent) {
        self.inner.push(event);
    }

    /// Pops the oldest queued event, if any.
    pub fn pop(&mut self) -> Option<BackendEvent> {
        self.inner.pop()
    }

    /// Returns the current queue length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` when no events are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of events dropped due to queue overflow.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped_count()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

/// Result of one [`Backend::poll_events`](crate::backend::Backend::poll_events).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PollStatus {
    /// The session should end. Sticky once set; the core observes it at the
    /// top of its loop.
    pub quit: bool,
    /// The surface was resized during this poll.
    pub resized: bool,
    /// Current surface width in physical pixels.
    pub width: u32,
    /// Current surface height in physical pixels.
    pub height: u32,
}

/// Owns the event queue and the state it drains into.
///
/// Every backend embeds one pump. Native handlers call
/// [`submit`](Self::submit); `poll_events` calls [`drain`](Self::drain) after
/// its native I/O. The pump applies events in order, folds input events into
/// the [`InputState`], window events into the [`Viewport`], and turns a
/// queued [`BackendEvent::DeviceLost`] into `Err(DeviceLost)` after all
/// state has been applied.
#[derive(Debug)]
pub struct EventPump {
    queue: EventQueue,
    input: InputState,
    viewport: Viewport,
    quit: bool,
    reported_drops: u64,
}

impl EventPump {
    /// Creates a pump with the given initial viewport and queue capacity.
    #[must_use]
    pub fn new(viewport: Viewport, queue_capacity: usize) -> Self {
        Self {
            queue: EventQueue::with_capacity(queue_capacity),
            input: InputState::new(),
            viewport,
            quit: false,
            reported_drops: 0,
        }
    }

    /// Enqueues a translated native event.
    pub fn submit(&mut self, event: BackendEvent) {
        self.queue.push(event);
    }

    /// Current input snapshot.
    #[must_use]
    pub const fn input(&self) -> &InputState {
        &self.input
    }

    /// Current viewport.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Whether a close request has been observed.
    #[must_use]
    pub const fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Clears input state, e.g. around device recreation.
    pub fn reset_input(&mut self) {
        self.input.reset();
    }

    /// Applies every queued event in order and reports the poll outcome.
    ///
    /// Device loss is applied last-wins like any other state, but surfaces
    /// as `Err(DeviceLost)` so the caller cannot miss it; the viewport and
    /// input state remain valid for the recreation path.
    pub fn drain(&mut self) -> Result<PollStatus, BackendError> {
        self.input.pointer_mut().begin_poll();

        let mut resized = false;
        let mut device_lost = false;

        while let Some(event) = self.queue.pop() {
            match event {
                BackendEvent::CloseRequested => self.quit = true,
                BackendEvent::Resized { width, height } => {
                    resized |= self.viewport.apply_resize(width, height);
                }
                BackendEvent::ScaleChanged { scale } => self.viewport.scale = scale,
                BackendEvent::FullscreenChanged { fullscreen } => {
                    self.viewport.fullscreen = fullscreen;
                }
                BackendEvent::FocusGained => self.input.focus_gained(),
                BackendEvent::FocusLost => {
                    self.input.focus_lost();
                    // Touches belong to the focused surface too.
                    self.input.touch_mut().cancel();
                }
                BackendEvent::Key { key, pressed } => self.input.key_event(key, pressed),
                BackendEvent::PointerEntered { x, y } => self.input.pointer_mut().enter(x, y),
                BackendEvent::PointerLeft => self.input.pointer_mut().leave(),
                BackendEvent::PointerMoved { x, y } => {
                    let pointer = self.input.pointer_mut();
                    pointer.x = x;
                    pointer.y = y;
                }
                BackendEvent::PointerButton { button, pressed } => {
                    self.input.pointer_mut().set_button(button, pressed);
                }
                BackendEvent::Scroll {
                    horizontal,
                    vertical,
                } => self.input.pointer_mut().scroll(horizontal, vertical),
                BackendEvent::TouchDown { id, x, y } => self.input.touch_mut().down(id, x, y),
                BackendEvent::TouchUp { id } => self.input.touch_mut().up(id),
                BackendEvent::TouchMoved { id, x, y } => self.input.touch_mut().motion(id, x, y),
                BackendEvent::TouchCancelled => self.input.touch_mut().cancel(),
                BackendEvent::DeviceLost => device_lost = true,
            }
        }

        let dropped = self.queue.dropped_count();
        if dropped > self.reported_drops {
            log::warn!(
                "event queue overflowed; dropped {} events",
                dropped - self.reported_drops
            );
            self.reported_drops = dropped;
        }

        if device_lost {
            return Err(BackendError::DeviceLost);
        }

        Ok(PollStatus {
            quit: self.quit,
            resized,
            width: self.viewport.width,
            height: self.viewport.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendEvent, EventPump, EventQueue};
    use crate::error::BackendError;
    use crate::input::key::Key;
    use crate::input::pointer::PointerButton;
    use crate::viewport::Viewport;

    fn pump() -> EventPump {
        EventPump::new(Viewport::new(640, 480), EventQueue::DEFAULT_CAPACITY)
    }

    #[test]
    fn last_resize_wins() {
        let mut pump = pump();
        pump.submit(BackendEvent::Resized {
            width: 100,
            height: 100,
        });
        pump.submit(BackendEvent::Resized {
            width: 800,
            height: 600,
        });
        pump.submit(BackendEvent::Resized {
            width: 1280,
            height: 720,
        });

        let status = pump.drain().unwrap();
        assert!(status.resized);
        assert_eq!((status.width, status.height), (1280, 720));
        assert_eq!(pump.viewport().width, 1280);
        assert_eq!(pump.viewport().height, 720);
    }

    #[test]
    fn resize_to_current_size_is_not_reported() {
        let mut pump = pump();
        pump.submit(BackendEvent::Resized {
            width: 640,
            height: 480,
        });
        let status = pump.drain().unwrap();
        assert!(!status.resized);
    }

    #[test]
    fn quit_flag_is_sticky() {
        let mut pump = pump();
        pump.submit(BackendEvent::CloseRequested);
        assert!(pump.drain().unwrap().quit);
        // Still set on the next, empty poll.
        assert!(pump.drain().unwrap().quit);
    }

    #[test]
    fn device_lost_surfaces_after_state_application() {
        let mut pump = pump();
        pump.submit(BackendEvent::Resized {
            width: 320,
            height: 240,
        });
        pump.submit(BackendEvent::DeviceLost);

        assert_eq!(pump.drain(), Err(BackendError::DeviceLost));
        // The resize was still applied.
        assert_eq!(pump.viewport().width, 320);
        // The loss does not repeat on the next poll.
        assert!(pump.drain().is_ok());
    }

    #[test]
    fn focus_loss_clears_keys_and_touches() {
        let mut pump = pump();
        pump.submit(BackendEvent::FocusGained);
        pump.submit(BackendEvent::Key {
            key: Key::A,
            pressed: true,
        });
        pump.submit(BackendEvent::TouchDown { id: 1, x: 0, y: 0 });
        pump.drain().unwrap();
        assert_eq!(pump.input().keyboard().count(), 1);
        assert_eq!(pump.input().touch().active_count(), 1);

        pump.submit(BackendEvent::FocusLost);
        pump.drain().unwrap();
        assert!(pump.input().keyboard().is_empty());
        assert!(pump.input().touch().is_empty());
    }

    #[test]
    fn wheel_edges_reset_each_poll() {
        let mut pump = pump();
        pump.submit(BackendEvent::Scroll {
            horizontal: 0.0,
            vertical: 3.0,
        });
        pump.drain().unwrap();
        assert!(pump.input().pointer().wheel.down);

        pump.drain().unwrap();
        assert!(!pump.input().pointer().wheel.down);
    }

    #[test]
    fn pointer_button_sequence() {
        let mut pump = pump();
        pump.submit(BackendEvent::PointerEntered { x: 10, y: 10 });
        pump.submit(BackendEvent::PointerButton {
            button: PointerButton::Left,
            pressed: true,
        });
        pump.submit(BackendEvent::PointerMoved { x: 42, y: 17 });
        pump.drain().unwrap();

        let pointer = pump.input().pointer();
        assert!(pointer.focus);
        assert_eq!((pointer.x, pointer.y), (42, 17));
        assert!(pointer
            .buttons
            .contains(crate::input::pointer::PointerButtons::LEFT));
    }

    #[test]
    fn events_apply_in_submission_order() {
        let mut pump = pump();
        pump.submit(BackendEvent::Key {
            key: Key::Enter,
            pressed: true,
        });
        pump.submit(BackendEvent::Key {
            key: Key::Enter,
            pressed: false,
        });
        pump.drain().unwrap();
        assert!(!pump.input().keyboard().pressed(Key::Enter));
    }
}
