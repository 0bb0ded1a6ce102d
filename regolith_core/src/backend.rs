// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for platform integrations.
//!
//! Regolith splits platform-specific work into *backend* crates. Each
//! backend owns one native rendering context plus the window/input plumbing
//! around it, and exposes it to the frontend core through the [`Backend`]
//! trait. The core drives a single-threaded loop:
//!
//! ```rust,ignore
//! let mut backend = WaylandBackend::init(target, &config)?;
//! let device = backend.create_device(&device_config)?;
//!
//! loop {
//!     match backend.poll_events() {
//!         Ok(status) => {
//!             if status.quit {
//!                 break;
//!             }
//!             if status.resized {
//!                 renderer.set_viewport(status.width, status.height);
//!             }
//!         }
//!         Err(BackendError::DeviceLost) => {
//!             // Full recreation: every old handle is void.
//!             device = backend.create_device(&device_config)?;
//!             renderer.recreate_resources(&mut backend, device)?;
//!             continue;
//!         }
//!         Err(err) => return Err(err.into()),
//!     }
//!
//!     renderer.draw(&mut backend, device, backend.input())?;
//!     backend.swap_buffers()?;
//! }
//!
//! backend.destroy();
//! ```
//!
//! # Contract
//!
//! - All calls are made from one thread. Backends spawn no threads and take
//!   no locks; nothing suspends the caller except the vsync wait inside
//!   [`swap_buffers`](Backend::swap_buffers).
//! - Errors are returned synchronously, never raised as asynchronous
//!   faults. See [`BackendError`] for the recovery split.
//! - [`destroy`](Backend::destroy) consumes the backend, so "no call after
//!   destroy" and "destroy exactly once" hold by construction. It releases
//!   every live resource exactly once.
//! - Resource handles are only meaningful for the device that created them;
//!   device loss voids them all.
//!
//! # What is *not* abstracted
//!
//! Window-target acquisition differs fundamentally across platforms (a
//! Wayland connection, a canvas selector, an `HWND`), so
//! [`init`](Backend::init) takes an associated
//! [`InitTarget`](Backend::InitTarget) instead of a common type, and hosts
//! name the concrete backend they start.

use crate::config::{BackendConfig, Capabilities, DeviceConfig, SwapInterval};
use crate::error::BackendError;
use crate::event::PollStatus;
use crate::format::PixelSlice;
use crate::input::InputState;
use crate::resource::{BufferId, DeviceId, TextureDesc, TextureId};
use crate::viewport::Viewport;

/// Uniform contract between the frontend core and one platform backend.
///
/// Implemented once per native graphics/windowing stack; the
/// `HeadlessBackend` in the harness crate implements it as a test double.
pub trait Backend: Sized {
    /// Platform window/display target consumed by [`init`](Self::init).
    type InitTarget;

    /// Brings up the backend against a native window target.
    ///
    /// Failure is reported, never fatal to the process; the caller may fall
    /// back to another backend.
    fn init(target: Self::InitTarget, config: &BackendConfig) -> Result<Self, BackendError>;

    /// What the platform turned out to support.
    fn capabilities(&self) -> &Capabilities;

    /// Creates the rendering device.
    ///
    /// Called once after [`init`](Self::init), and again after a device
    /// loss. Each call yields a fresh [`DeviceId`]; ids of lost devices
    /// never become valid again.
    fn create_device(&mut self, config: &DeviceConfig) -> Result<DeviceId, BackendError>;

    /// Requests a new surface size. Idempotent; a no-op when unchanged.
    fn resize(&mut self, width: u32, height: u32);

    /// Changes the number of vsync intervals awaited by
    /// [`swap_buffers`](Self::swap_buffers).
    fn set_swap_interval(&mut self, interval: SwapInterval);

    /// Presents the current frame.
    ///
    /// May block for vsync per the configured swap interval. Surfaces
    /// [`BackendError::DeviceLost`] when presentation finds the context
    /// gone.
    fn swap_buffers(&mut self) -> Result<(), BackendError>;

    /// Drains pending native events without blocking.
    ///
    /// Translated events are applied in arrival order to the input state
    /// and viewport before this returns. Device loss surfaces as
    /// `Err(DeviceLost)` once, after state application.
    fn poll_events(&mut self) -> Result<PollStatus, BackendError>;

    /// Current surface geometry.
    fn viewport(&self) -> Viewport;

    /// Current input snapshot.
    fn input(&self) -> &InputState;

    /// Creates a texture owned by `device`.
    fn create_texture(
        &mut self,
        device: DeviceId,
        desc: &TextureDesc,
    ) -> Result<TextureId, BackendError>;

    /// Uploads pixels into a texture through the pitch-aware path.
    ///
    /// Implementations lock the native resource, [`blit`](crate::upload::blit)
    /// row by row, and unlock — never a flat copy.
    fn upload_texture(
        &mut self,
        texture: TextureId,
        src: &PixelSlice<'_>,
    ) -> Result<(), BackendError>;

    /// Releases a texture.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale (already released, or voided by device
    /// loss).
    fn destroy_texture(&mut self, texture: TextureId);

    /// Creates a vertex/index buffer of `len` bytes owned by `device`.
    fn create_buffer(&mut self, device: DeviceId, len: usize) -> Result<BufferId, BackendError>;

    /// Writes bytes into a buffer at `offset` through the locked path.
    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: usize,
        data: &[u8],
    ) -> Result<(), BackendError>;

    /// Releases a buffer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Tears the backend down, releasing every resource exactly once.
    ///
    /// Consumes the backend: further calls (and a second destroy) do not
    /// compile.
    fn destroy(self);
}
