// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for regolith.
//!
//! Integrates the core contract with a Wayland compositor:
//!
//! - Registry negotiation for `wl_compositor`, `wl_shm`, `wl_seat`,
//!   `wl_output`, and `xdg_wm_base`, with interface versions clamped to
//!   what we implement
//! - An `xdg_toplevel` surface; configure/close events feed the core event
//!   queue, output scale is adopted on surface enter
//! - Seat keyboard/pointer/touch translation (evdev codes through the
//!   shared keymap, coordinates scaled to physical pixels)
//! - `wl_shm` double-buffer-free presentation: textures are shared-memory
//!   buffers written through the pitch-aware upload path and attached on
//!   swap
//! - Non-blocking socket pumping; connection errors and hangups surface as
//!   device loss
//!
//! The event loop stays with the caller: [`WaylandBackend::poll_events`]
//! moves protocol traffic and drains the queue, nothing dispatches behind
//! the caller's back.

mod output;
mod seat;
mod shm;
mod state;

use std::io::ErrorKind;

use rustix::event::{PollFd, PollFlags};
use rustix::time::Timespec;
use wayland_client::backend::WaylandError;
use wayland_client::protocol::{wl_shm, wl_surface};
use wayland_client::{Connection, DispatchError, EventQueue, QueueHandle};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel};

use regolith_core::backend::Backend;
use regolith_core::config::{BackendConfig, Capabilities, DeviceConfig, SwapInterval};
use regolith_core::error::BackendError;
use regolith_core::event::{BackendEvent, EventPump, PollStatus};
use regolith_core::format::{PixelFormat, PixelSlice};
use regolith_core::input::InputState;
use regolith_core::resource::{
    BufferId, DeviceId, DeviceTracker, ResourceArena, TextureDesc, TextureId,
};
use regolith_core::viewport::Viewport;

use shm::ShmBuffer;
use state::WaylandState;

/// Splash checkerboard cell mask and colors.
const SPLASH_CHECK: u32 = 16;
const SPLASH_BG: u32 = 0xFFBC_BCBC;
const SPLASH_FG: u32 = 0xFF8E_8E8E;

/// Window attributes consumed by [`WaylandBackend::init`].
#[derive(Clone, Debug)]
pub struct WaylandWindowTarget {
    /// Toplevel title.
    pub title: String,
    /// Application id used for desktop integration.
    pub app_id: String,
}

impl Default for WaylandWindowTarget {
    fn default() -> Self {
        Self {
            title: "regolith".to_owned(),
            app_id: "org.forest-rs.regolith".to_owned(),
        }
    }
}

struct WaylandTexture {
    desc: TextureDesc,
    buffer: ShmBuffer,
}

/// Wayland implementation of the backend contract.
pub struct WaylandBackend {
    conn: Connection,
    event_queue: EventQueue<WaylandState>,
    qh: QueueHandle<WaylandState>,
    state: WaylandState,
    surface: wl_surface::WlSurface,
    xdg_surface: xdg_surface::XdgSurface,
    toplevel: xdg_toplevel::XdgToplevel,
    devices: DeviceTracker,
    textures: ResourceArena<WaylandTexture>,
    buffers: ResourceArena<Vec<u8>>,
    swap_interval: SwapInterval,
    pending_present: Option<TextureId>,
}

impl std::fmt::Debug for WaylandBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaylandBackend")
            .field("viewport", &self.state.pump.viewport())
            .field("device", &self.devices.current())
            .field("textures", &self.textures.live_count())
            .field("buffers", &self.buffers.live_count())
            .finish_non_exhaustive()
    }
}

fn map_wayland_error(err: &WaylandError) -> Option<BackendError> {
    match err {
        WaylandError::Io(io) if io.kind() == ErrorKind::WouldBlock => None,
        WaylandError::Io(_) => Some(BackendError::DeviceLost),
        WaylandError::Protocol(protocol) => {
            Some(BackendError::Protocol(protocol.to_string()))
        }
    }
}

fn map_dispatch_error(err: DispatchError) -> BackendError {
    match err {
        DispatchError::Backend(backend) => {
            map_wayland_error(&backend).unwrap_or(BackendError::DeviceLost)
        }
        other => BackendError::Protocol(other.to_string()),
    }
}

impl WaylandBackend {
    /// Moves protocol traffic without blocking: flush requests, read the
    /// socket if data is waiting, run pending handlers.
    ///
    /// A dead connection (error or hangup on the socket) is queued as a
    /// device loss rather than returned directly, so the state the events
    /// before the failure carried still gets applied.
    fn pump_wire(&mut self) -> Result<(), BackendError> {
        if let Err(err) = self.event_queue.flush() {
            if let Some(mapped) = map_wayland_error(&err) {
                if mapped == BackendError::DeviceLost {
                    self.state.pump.submit(BackendEvent::DeviceLost);
                } else {
                    return Err(mapped);
                }
            }
        }

        let backend = self.conn.backend();
        let poll_fd = backend.poll_fd();
        let mut fds = [PollFd::new(&poll_fd, PollFlags::IN)];
        let timeout = Timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        match rustix::event::poll(&mut fds, Some(&timeout)) {
            Ok(ready) if ready > 0 => {
                let revents = fds[0].revents();
                if revents.intersects(PollFlags::ERR | PollFlags::HUP) {
                    self.state.pump.submit(BackendEvent::DeviceLost);
                } else if revents.contains(PollFlags::IN) {
                    if let Some(guard) = self.event_queue.prepare_read() {
                        if let Err(err) = guard.read() {
                            match map_wayland_error(&err) {
                                Some(BackendError::DeviceLost) => {
                                    self.state.pump.submit(BackendEvent::DeviceLost);
                                }
                                Some(other) => return Err(other),
                                None => {}
                            }
                        }
                    }
                }
            }
            _ => {}
        }

        self.event_queue
            .dispatch_pending(&mut self.state)
            .map_err(map_dispatch_error)?;
        Ok(())
    }

    /// Device-loss teardown: void the device and release its resources.
    fn handle_device_loss(&mut self) {
        if let Some(lost) = self.devices.invalidate() {
            let _ = self.textures.release_device(lost);
            let _ = self.buffers.release_device(lost);
        }
        self.pending_present = None;
        self.state.pump.reset_input();
    }

    fn format_supported(&self, format: PixelFormat) -> bool {
        match format {
            // wl_shm guarantees the two 32-bit formats.
            PixelFormat::Xrgb8888 | PixelFormat::Argb8888 => true,
            PixelFormat::Rgb565 => self
                .state
                .shm_formats
                .contains(&wl_shm::Format::Rgb565),
        }
    }

    /// Paints and attaches the startup checkerboard. Best effort.
    fn present_splash(&mut self) {
        let Some(shm_global) = self.state.shm.clone() else {
            return;
        };
        let Some(kind) = self.state.capabilities.shared_memory else {
            return;
        };
        let viewport = self.state.pump.viewport();
        let scale = u32::try_from(self.state.buffer_scale.max(1)).unwrap_or(1);

        let mut splash = match ShmBuffer::allocate(
            &shm_global,
            kind,
            &self.qh,
            viewport.width,
            viewport.height,
            PixelFormat::Xrgb8888,
        ) {
            Ok(splash) => splash,
            Err(err) => {
                log::warn!("splash buffer allocation failed: {err}");
                return;
            }
        };
        if let Err(err) = splash.paint_checkerboard(scale, SPLASH_CHECK, SPLASH_BG, SPLASH_FG) {
            log::warn!("splash paint failed: {err}");
            return;
        }

        self.surface.attach(Some(&splash.buffer), 0, 0);
        self.surface.set_buffer_scale(self.state.buffer_scale);
        self.surface.damage_buffer(
            0,
            0,
            i32::try_from(viewport.width).unwrap_or(i32::MAX),
            i32::try_from(viewport.height).unwrap_or(i32::MAX),
        );
        self.surface.commit();
        self.state.splash = Some(splash);
    }
}

impl Backend for WaylandBackend {
    type InitTarget = WaylandWindowTarget;

    fn init(target: Self::InitTarget, config: &BackendConfig) -> Result<Self, BackendError> {
        let conn = Connection::connect_to_env()
            .map_err(|err| BackendError::Init(err.to_string()))?;
        let mut event_queue = conn.new_event_queue();
        let qh = event_queue.handle();
        let display = conn.display();
        let _registry = display.get_registry(&qh, ());

        let mut viewport = Viewport::new(config.width, config.height);
        viewport.fullscreen = config.fullscreen;
        let pump = EventPump::new(viewport, config.event_queue_capacity);
        let mut state = WaylandState::new(pump);

        // First roundtrip collects globals, second lets bound globals
        // (outputs, seat, shm formats) announce themselves.
        event_queue
            .roundtrip(&mut state)
            .map_err(map_dispatch_error)?;
        event_queue
            .roundtrip(&mut state)
            .map_err(map_dispatch_error)?;

        let compositor = state
            .compositor
            .clone()
            .ok_or_else(|| BackendError::Init("compositor lacks wl_compositor".to_owned()))?;
        let wm_base = state
            .wm_base
            .clone()
            .ok_or_else(|| BackendError::Init("compositor lacks xdg_wm_base".to_owned()))?;

        let surface = compositor.create_surface(&qh, ());
        let xdg_surface = wm_base.get_xdg_surface(&surface, &qh, ());
        let toplevel = xdg_surface.get_toplevel(&qh, ());
        toplevel.set_title(target.title);
        toplevel.set_app_id(target.app_id);
        if config.fullscreen {
            toplevel.set_fullscreen(None);
        }
        state.surface = Some(surface.clone());
        surface.commit();

        // The first buffer may only be attached after the initial configure.
        while !state.configured {
            event_queue
                .blocking_dispatch(&mut state)
                .map_err(map_dispatch_error)?;
        }

        state.capabilities.shared_memory = shm::negotiate_shared_memory();
        // Shared-memory rows are plain linear pixel rows.
        state.capabilities.linear_texture_layout = true;
        state.capabilities.swap_interval_control = true;

        log::info!(
            "wayland backend up: {}x{} scale {} ({} outputs)",
            config.width,
            config.height,
            state.buffer_scale,
            state.outputs.len(),
        );

        let mut backend = Self {
            conn,
            event_queue,
            qh,
            state,
            surface,
            xdg_surface,
            toplevel,
            devices: DeviceTracker::new(),
            textures: ResourceArena::new(),
            buffers: ResourceArena::new(),
            swap_interval: config.swap_interval,
            pending_present: None,
        };
        backend.present_splash();
        Ok(backend)
    }

    fn capabilities(&self) -> &Capabilities {
        &self.state.capabilities
    }

    fn create_device(&mut self, config: &DeviceConfig) -> Result<DeviceId, BackendError> {
        if self.state.shm.is_none() {
            return Err(BackendError::DeviceUnavailable(
                "compositor lacks wl_shm".to_owned(),
            ));
        }
        if self.state.capabilities.shared_memory.is_none() {
            return Err(BackendError::DeviceUnavailable(
                "no shared-memory mechanism".to_owned(),
            ));
        }
        if !self.format_supported(config.format) {
            return Err(BackendError::DeviceUnavailable(format!(
                "wl_shm does not support {:?}",
                config.format
            )));
        }
        Ok(self.devices.create())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let current = self.state.pump.viewport();
        if current.width == width && current.height == height {
            return;
        }
        self.state
            .pump
            .submit(BackendEvent::Resized { width, height });
    }

    fn set_swap_interval(&mut self, interval: SwapInterval) {
        self.swap_interval = interval;
    }

    fn swap_buffers(&mut self) -> Result<(), BackendError> {
        if self.devices.current().is_none() {
            return Err(BackendError::DeviceLost);
        }

        // Honor the previous commit's frame callback before submitting
        // another frame; this is where vsync blocking happens.
        if self.swap_interval != SwapInterval::Immediate {
            while !self.state.frame_done {
                self.event_queue
                    .blocking_dispatch(&mut self.state)
                    .map_err(map_dispatch_error)?;
            }
        }

        if let Some(texture) = self.pending_present.take() {
            if self.textures.is_alive(texture.0) {
                let viewport = self.state.pump.viewport();
                let tex = self.textures.get(texture.0);
                self.surface.attach(Some(&tex.buffer.buffer), 0, 0);
                self.surface.set_buffer_scale(self.state.buffer_scale);
                self.surface.damage_buffer(
                    0,
                    0,
                    i32::try_from(viewport.width).unwrap_or(i32::MAX),
                    i32::try_from(viewport.height).unwrap_or(i32::MAX),
                );
            }
        }

        if self.swap_interval != SwapInterval::Immediate {
            let _callback = self.surface.frame(&self.qh, ());
            self.state.frame_done = false;
        }
        self.surface.commit();
        if let Err(err) = self.event_queue.flush() {
            if let Some(mapped) = map_wayland_error(&err) {
                return Err(mapped);
            }
        }
        Ok(())
    }

    fn poll_events(&mut self) -> Result<PollStatus, BackendError> {
        self.pump_wire()?;
        match self.state.pump.drain() {
            Ok(status) => Ok(status),
            Err(BackendError::DeviceLost) => {
                self.handle_device_loss();
                Err(BackendError::DeviceLost)
            }
            Err(other) => Err(other),
        }
    }

    fn viewport(&self) -> Viewport {
        self.state.pump.viewport()
    }

    fn input(&self) -> &InputState {
        self.state.pump.input()
    }

    fn create_texture(
        &mut self,
        device: DeviceId,
        desc: &TextureDesc,
    ) -> Result<TextureId, BackendError> {
        if !self.devices.is_current(device) {
            return Err(BackendError::DeviceLost);
        }
        if !self.format_supported(desc.format) {
            return Err(BackendError::ResourceCreation(format!(
                "wl_shm does not support {:?}",
                desc.format
            )));
        }
        let shm_global = self
            .state
            .shm
            .clone()
            .ok_or_else(|| BackendError::ResourceCreation("wl_shm gone".to_owned()))?;
        let kind = self
            .state
            .capabilities
            .shared_memory
            .ok_or_else(|| BackendError::ResourceCreation("no shared memory".to_owned()))?;

        let buffer = ShmBuffer::allocate(
            &shm_global,
            kind,
            &self.qh,
            desc.width,
            desc.height,
            desc.format,
        )?;
        Ok(TextureId(self.textures.insert(
            device,
            WaylandTexture { desc: *desc, buffer },
        )))
    }

    fn upload_texture(
        &mut self,
        texture: TextureId,
        src: &PixelSlice<'_>,
    ) -> Result<(), BackendError> {
        self.textures.lock(texture.0);
        let tex = self.textures.get_mut(texture.0);
        assert!(
            src.width() == tex.desc.width && src.height() == tex.desc.height,
            "upload extent does not match texture extent"
        );
        let result = tex.buffer.write_pixels(src);
        self.textures.unlock(texture.0);
        result?;
        self.pending_present = Some(texture);
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.pending_present == Some(texture) {
            self.pending_present = None;
        }
        let _ = self.textures.release(texture.0);
    }

    fn create_buffer(&mut self, device: DeviceId, len: usize) -> Result<BufferId, BackendError> {
        if !self.devices.is_current(device) {
            return Err(BackendError::DeviceLost);
        }
        Ok(BufferId(self.buffers.insert(device, vec![0; len])))
    }

    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: usize,
        data: &[u8],
    ) -> Result<(), BackendError> {
        self.buffers.lock(buffer.0);
        let bytes = self.buffers.get_mut(buffer.0);
        assert!(
            offset + data.len() <= bytes.len(),
            "buffer write out of range"
        );
        bytes[offset..offset + data.len()].copy_from_slice(data);
        self.buffers.unlock(buffer.0);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        let _ = self.buffers.release(buffer.0);
    }

    fn destroy(mut self) {
        let _ = self.textures.release_all();
        let _ = self.buffers.release_all();
        self.devices.invalidate();
        self.state.splash = None;
        self.toplevel.destroy();
        self.xdg_surface.destroy();
        self.surface.destroy();
        let _ = self.event_queue.flush();
    }
}
