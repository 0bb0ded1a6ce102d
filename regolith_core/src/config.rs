// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend configuration and negotiated capabilities.
//!
//! Two structs flow into a backend and one flows out:
//!
//! - [`BackendConfig`] — what the core asks for at
//!   [`Backend::init`](crate::backend::Backend::init): initial surface size,
//!   context attributes, swap interval.
//! - [`DeviceConfig`] — what the core asks for at
//!   [`Backend::create_device`](crate::backend::Backend::create_device):
//!   backbuffer size and format, windowed/exclusive mode.
//! - [`Capabilities`] — what the platform turned out to support, resolved
//!   once during init (and updated when the native system adds or removes
//!   input devices). Code that would otherwise branch on the platform
//!   branches on this struct instead.

use crate::format::PixelFormat;

/// Number of vertical-sync intervals awaited before a frame is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapInterval {
    /// Present immediately, never waiting for vsync.
    Immediate,
    /// Wait for the given number of vsync intervals (at least one).
    Synchronized(SyncIntervals),
}

impl Default for SwapInterval {
    fn default() -> Self {
        Self::Synchronized(SyncIntervals::default())
    }
}

/// Non-zero vsync interval count for [`SwapInterval::Synchronized`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SyncIntervals(u32);

impl SyncIntervals {
    /// One vsync interval.
    pub const ONE: Self = Self(1);

    /// Returns the interval count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for SyncIntervals {
    fn default() -> Self {
        Self::ONE
    }
}

impl SwapInterval {
    /// Builds a swap interval from a raw count; `0` means immediate.
    #[must_use]
    pub const fn from_intervals(intervals: u32) -> Self {
        match intervals {
            0 => Self::Immediate,
            n => Self::Synchronized(SyncIntervals(n)),
        }
    }

    /// Returns the raw interval count; `0` means immediate.
    #[must_use]
    pub const fn intervals(self) -> u32 {
        match self {
            Self::Immediate => 0,
            Self::Synchronized(n) => n.0,
        }
    }
}

/// Rendering-context attributes requested at init.
///
/// Backends apply what their native context creation supports and ignore the
/// rest; the outcome is visible in [`Capabilities`], not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextAttributes {
    /// Request an alpha channel in the default framebuffer.
    pub alpha: bool,
    /// Request a depth buffer.
    pub depth: bool,
    /// Request a stencil buffer.
    pub stencil: bool,
    /// Request multisample antialiasing.
    pub antialias: bool,
    /// Prefer the high-performance GPU where the platform distinguishes.
    pub high_performance: bool,
    /// Major GL ES version to request where the native API is GL-shaped.
    pub gles_major_version: u8,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            alpha: false,
            depth: true,
            stencil: true,
            antialias: false,
            high_performance: true,
            gles_major_version: 2,
        }
    }
}

/// Configuration consumed by [`Backend::init`](crate::backend::Backend::init).
#[derive(Clone, Debug, PartialEq)]
pub struct BackendConfig {
    /// Initial surface size in physical pixels.
    pub width: u32,
    /// Initial surface size in physical pixels.
    pub height: u32,
    /// Start fullscreen when the platform allows it.
    pub fullscreen: bool,
    /// Initial swap interval; adjustable later via
    /// [`Backend::set_swap_interval`](crate::backend::Backend::set_swap_interval).
    pub swap_interval: SwapInterval,
    /// Rendering-context attributes.
    pub context: ContextAttributes,
    /// Capacity of the backend event queue.
    pub event_queue_capacity: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            fullscreen: false,
            swap_interval: SwapInterval::default(),
            context: ContextAttributes::default(),
            event_queue_capacity: crate::event::EventQueue::DEFAULT_CAPACITY,
        }
    }
}

/// Configuration consumed by
/// [`Backend::create_device`](crate::backend::Backend::create_device).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceConfig {
    /// Backbuffer width in pixels.
    pub width: u32,
    /// Backbuffer height in pixels.
    pub height: u32,
    /// Backbuffer pixel format.
    pub format: PixelFormat,
    /// Windowed (`true`) or exclusive/fullscreen (`false`) presentation.
    pub windowed: bool,
}

/// Shared-memory mechanism available for CPU-visible buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SharedMemoryKind {
    /// Anonymous `memfd` with a grow seal.
    Memfd,
    /// Named POSIX shared-memory object, unlinked after handoff.
    ShmObject,
}

/// What the platform supports, resolved once at backend selection time.
///
/// This replaces scattered platform conditionals: instead of branching on
/// the compile target or probing globals mid-frame, callers read the
/// capability struct the backend negotiated during init. Input-device
/// capabilities may still change at runtime (seats gain and lose devices);
/// backends update their copy and defensively clear the state of removed
/// devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Capabilities {
    /// A keyboard is attached and delivering events.
    pub keyboard: bool,
    /// A pointer device is attached and delivering events.
    pub pointer: bool,
    /// A touch device is attached and delivering events.
    pub touch: bool,
    /// Shared-memory mechanism for CPU-visible buffers, if any.
    pub shared_memory: Option<SharedMemoryKind>,
    /// Texture rows must be laid out linearly (no tiling/swizzling).
    pub linear_texture_layout: bool,
    /// `swap_buffers` can block on vsync for a configurable interval.
    pub swap_interval_control: bool,
}

#[cfg(test)]
mod tests {
    use super::{BackendConfig, SwapInterval};

    #[test]
    fn swap_interval_round_trips_raw_counts() {
        assert_eq!(SwapInterval::from_intervals(0), SwapInterval::Immediate);
        assert_eq!(SwapInterval::from_intervals(2).intervals(), 2);
        assert_eq!(SwapInterval::default().intervals(), 1);
    }

    #[test]
    fn default_config_requests_a_synchronized_context() {
        let config = BackendConfig::default();
        assert_eq!(config.swap_interval.intervals(), 1);
        assert!(config.context.depth);
        assert!(!config.context.antialias);
        assert_eq!((config.width, config.height), (800, 600));
    }
}
