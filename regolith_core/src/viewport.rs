// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentable surface geometry.

use core::fmt;

/// Geometry of the backend's presentable surface.
///
/// Width and height are in physical pixels. `scale` is the native
/// window-system scale factor applied between surface-local and physical
/// coordinates: an integer buffer scale on Wayland, `devicePixelRatio` on the
/// web, always `1.0` where the platform has no such concept.
///
/// The core reads the viewport each frame; it is mutated only by applying
/// resize/scale/fullscreen events from the event queue or by an explicit
/// [`Backend::resize`](crate::backend::Backend::resize) call.
#[derive(Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Surface width in physical pixels.
    pub width: u32,
    /// Surface height in physical pixels.
    pub height: u32,
    /// Native scale factor between surface-local and physical coordinates.
    pub scale: f64,
    /// Whether the surface currently covers the whole output.
    pub fullscreen: bool,
}

impl Viewport {
    /// Creates a windowed viewport with scale factor `1.0`.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            fullscreen: false,
        }
    }

    /// Applies a new size, returning `true` when the size actually changed.
    ///
    /// Resizing to the current size is a no-op, making resize application
    /// idempotent.
    pub const fn apply_resize(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Viewport({}x{}@{}{})",
            self.width,
            self.height,
            self.scale,
            if self.fullscreen { ", fullscreen" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Viewport;

    #[test]
    fn apply_resize_is_idempotent() {
        let mut vp = Viewport::new(640, 480);
        assert!(vp.apply_resize(800, 600));
        assert!(!vp.apply_resize(800, 600));
        assert_eq!((vp.width, vp.height), (800, 600));
    }

    #[test]
    fn default_is_empty_windowed() {
        let vp = Viewport::default();
        assert_eq!((vp.width, vp.height), (0, 0));
        assert!(!vp.fullscreen);
        assert_eq!(vp.scale, 1.0);
    }
}
