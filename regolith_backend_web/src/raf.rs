// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-loop driver for browser hosts.
//!
//! Browsers own the outer loop, so a wasm host cannot block in
//! `swap_buffers` the way native loops do. [`FrameLoop`] inverts control:
//! the host's per-frame work runs inside a callback scheduled either by
//! `requestAnimationFrame` (vsync pacing) or `setTimeout(0)` (immediate,
//! uncapped). A swap interval above one skips callbacks, presenting every
//! Nth animation frame.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use regolith_core::config::SwapInterval;

// Direct global bindings instead of `web_sys::Window` methods — avoids
// fetching (and unwrapping) the Window object on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, millis: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pacing {
    Immediate,
    Vsync(u32),
}

type FrameClosure = Closure<dyn FnMut(f64)>;

struct LoopInner {
    /// The JS closure re-registered for every frame.
    ///
    /// Kept in its own `RefCell` so it can reference itself when
    /// rescheduling without conflicting with `callback`.
    closure: RefCell<Option<FrameClosure>>,
    /// The host's per-frame work. Receives the timestamp in milliseconds.
    callback: RefCell<Box<dyn FnMut(f64)>>,
    running: Cell<bool>,
    handle: Cell<i32>,
    pacing: Cell<Pacing>,
    frame_counter: Cell<u64>,
}

impl LoopInner {
    fn schedule(&self) {
        if let Some(ref closure) = *self.closure.borrow() {
            let id = match self.pacing.get() {
                Pacing::Immediate => set_timeout(closure.as_ref().unchecked_ref(), 0),
                Pacing::Vsync(_) => request_animation_frame(closure.as_ref().unchecked_ref()),
            };
            self.handle.set(id);
        }
    }

    fn cancel(&self) {
        match self.pacing.get() {
            Pacing::Immediate => clear_timeout(self.handle.get()),
            Pacing::Vsync(_) => cancel_animation_frame(self.handle.get()),
        }
    }
}

/// Browser frame loop with swap-interval pacing.
pub struct FrameLoop {
    inner: Rc<LoopInner>,
}

impl FrameLoop {
    /// Creates a loop that is **not yet running**.
    ///
    /// `callback` receives the frame timestamp in milliseconds once
    /// [`start`](Self::start) is called.
    pub fn new(callback: impl FnMut(f64) + 'static, interval: SwapInterval) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                running: Cell::new(false),
                handle: Cell::new(0),
                pacing: Cell::new(pacing_for(interval)),
                frame_counter: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. A no-op if already running.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        let inner = Rc::clone(&self.inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if !inner.running.get() {
                return;
            }

            // setTimeout invokes without a timestamp.
            let now_ms = if timestamp_ms.is_finite() {
                timestamp_ms
            } else {
                performance_now()
            };

            let frame = inner.frame_counter.get();
            inner.frame_counter.set(frame + 1);

            // An interval of N presents every Nth animation frame.
            let run = match inner.pacing.get() {
                Pacing::Immediate => true,
                Pacing::Vsync(interval) => frame % u64::from(interval.max(1)) == 0,
            };
            if run {
                inner.callback.borrow_mut()(now_ms);
            }

            if inner.running.get() {
                inner.schedule();
            }
        }) as Box<dyn FnMut(f64)>);

        *self.inner.closure.borrow_mut() = Some(closure);
        self.inner.schedule();
    }

    /// Stops the loop; the pending callback is cancelled.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        self.inner.cancel();
    }

    /// Switches between immediate and vsync-paced scheduling.
    ///
    /// Takes effect at the next scheduled callback.
    pub fn set_interval(&self, interval: SwapInterval) {
        self.inner.pacing.set(pacing_for(interval));
    }

    /// Returns `true` if the loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

const fn pacing_for(interval: SwapInterval) -> Pacing {
    match interval.intervals() {
        0 => Pacing::Immediate,
        n => Pacing::Vsync(n),
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("running", &self.inner.running.get())
            .field("frame_counter", &self.inner.frame_counter.get())
            .finish_non_exhaustive()
    }
}
