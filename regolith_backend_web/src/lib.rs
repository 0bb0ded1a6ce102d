// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for regolith.
//!
//! Integrates the core contract with browser APIs:
//!
//! - WebGL context creation from the requested
//!   [`ContextAttributes`](regolith_core::config::ContextAttributes)
//!   (`webgl2` for GL ES 3, `webgl` otherwise)
//! - Viewport polling from the canvas CSS size and `devicePixelRatio`;
//!   framebuffer size follows both
//! - DOM keyboard/pointer/touch translation through an inbox drained at
//!   poll time (no callback touches backend state directly)
//! - `webglcontextlost` surfaces as device loss; recreation re-acquires the
//!   context from the canvas
//! - [`FrameLoop`]: `requestAnimationFrame`/`setTimeout` frame driver with
//!   swap-interval pacing, since wasm hosts cannot block in `swap_buffers`
//!
//! Hosts that change the swap interval mid-session mirror it into their
//! [`FrameLoop`] — the loop owns pacing on this platform.

#![no_std]

extern crate alloc;

mod context;
mod events;
mod keymap;
mod raf;

pub use keymap::key_from_dom_code;
pub use raf::FrameLoop;
pub use regolith_core::backend::Backend;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use web_sys::{HtmlCanvasElement, WebGlBuffer, WebGlRenderingContext, WebGlTexture, Window};

use regolith_core::config::{BackendConfig, Capabilities, ContextAttributes, DeviceConfig, SwapInterval};
use regolith_core::error::BackendError;
use regolith_core::event::{BackendEvent, EventPump, PollStatus};
use regolith_core::format::{PixelFormat, PixelSlice};
use regolith_core::input::InputState;
use regolith_core::resource::{
    BufferId, DeviceId, DeviceTracker, ResourceArena, TextureDesc, TextureId,
};
use regolith_core::upload::{self, LockedRegion};
use regolith_core::viewport::Viewport;

use events::{DomListeners, EventInbox};

/// Canvas selection consumed by [`WebBackend::init`].
#[derive(Clone, Debug)]
pub struct CanvasTarget {
    /// CSS selector naming the canvas element.
    pub selector: String,
}

impl Default for CanvasTarget {
    fn default() -> Self {
        Self {
            selector: "canvas".to_string(),
        }
    }
}

struct WebTexture {
    desc: TextureDesc,
    staging: Vec<u8>,
    texture: WebGlTexture,
}

struct WebBuffer {
    buffer: WebGlBuffer,
    len: usize,
}

/// Browser implementation of the backend contract.
pub struct WebBackend {
    window: Window,
    canvas: HtmlCanvasElement,
    gl: Option<WebGlRenderingContext>,
    context_attributes: ContextAttributes,
    pump: EventPump,
    inbox: EventInbox,
    listeners: DomListeners,
    capabilities: Capabilities,
    devices: DeviceTracker,
    textures: ResourceArena<WebTexture>,
    buffers: ResourceArena<WebBuffer>,
    swap_interval: SwapInterval,
    scale: f64,
}

impl core::fmt::Debug for WebBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebBackend")
            .field("viewport", &self.pump.viewport())
            .field("device", &self.devices.current())
            .field("textures", &self.textures.live_count())
            .field("buffers", &self.buffers.live_count())
            .finish_non_exhaustive()
    }
}

const fn gl_format(format: PixelFormat) -> (i32, u32, u32) {
    match format {
        PixelFormat::Rgb565 => (
            WebGlRenderingContext::RGB as i32,
            WebGlRenderingContext::RGB,
            WebGlRenderingContext::UNSIGNED_SHORT_5_6_5,
        ),
        PixelFormat::Xrgb8888 | PixelFormat::Argb8888 => (
            WebGlRenderingContext::RGBA as i32,
            WebGlRenderingContext::RGBA,
            WebGlRenderingContext::UNSIGNED_BYTE,
        ),
    }
}

impl WebBackend {
    /// Currently requested swap interval, for mirroring into a
    /// [`FrameLoop`].
    #[must_use]
    pub const fn swap_interval(&self) -> SwapInterval {
        self.swap_interval
    }

    /// Applies the current canvas geometry, queueing resize/scale events.
    fn poll_geometry(&mut self) {
        let ratio = self.window.device_pixel_ratio();
        if (ratio - self.scale).abs() > f64::EPSILON {
            self.scale = ratio;
            self.listeners.set_scale(ratio);
            self.pump.submit(BackendEvent::ScaleChanged { scale: ratio });
        }

        let css = context::canvas_css_size(&self.canvas);
        let (width, height) = context::physical_size(css, ratio);
        let viewport = self.pump.viewport();
        if width != viewport.width || height != viewport.height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.pump.submit(BackendEvent::Resized { width, height });
        }
    }

    /// Device-loss teardown: void the device and release its resources.
    fn handle_device_loss(&mut self) {
        if let Some(lost) = self.devices.invalidate() {
            let _ = self.textures.release_device(lost);
            let _ = self.buffers.release_device(lost);
        }
        self.gl = None;
        self.pump.reset_input();
    }

    fn gl(&self) -> Result<&WebGlRenderingContext, BackendError> {
        self.gl.as_ref().ok_or(BackendError::DeviceLost)
    }
}

impl Backend for WebBackend {
    type InitTarget = CanvasTarget;

    fn init(target: Self::InitTarget, config: &BackendConfig) -> Result<Self, BackendError> {
        let window =
            web_sys::window().ok_or_else(|| BackendError::Init("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| BackendError::Init("no document".to_string()))?;
        let canvas = context::find_canvas(&document, &target.selector)?;
        let gl = context::create_context(&canvas, &config.context)?;

        let ratio = window.device_pixel_ratio();
        let css = context::canvas_css_size(&canvas);
        let (width, height) = context::physical_size(css, ratio);
        canvas.set_width(width);
        canvas.set_height(height);

        let mut viewport = Viewport::new(width, height);
        viewport.scale = ratio;
        viewport.fullscreen = config.fullscreen;

        let inbox = EventInbox::new();
        let listeners = DomListeners::install(&window, &canvas, &inbox);
        listeners.set_scale(ratio);

        log::info!("web backend up: {width}x{height} at ratio {ratio}");

        Ok(Self {
            window,
            canvas,
            gl: Some(gl),
            context_attributes: config.context,
            pump: EventPump::new(viewport, config.event_queue_capacity),
            inbox,
            listeners,
            capabilities: Capabilities {
                keyboard: true,
                pointer: true,
                touch: true,
                shared_memory: None,
                linear_texture_layout: false,
                swap_interval_control: true,
            },
            devices: DeviceTracker::new(),
            textures: ResourceArena::new(),
            buffers: ResourceArena::new(),
            swap_interval: config.swap_interval,
            scale: ratio,
        })
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn create_device(&mut self, _config: &DeviceConfig) -> Result<DeviceId, BackendError> {
        if self.gl.is_none() {
            // Recovery path: re-acquire the context from the canvas.
            let gl = context::create_context(&self.canvas, &self.context_attributes)?;
            if gl.is_context_lost() {
                return Err(BackendError::DeviceUnavailable(
                    "context not restored yet".to_string(),
                ));
            }
            self.gl = Some(gl);
        }
        Ok(self.devices.create())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let viewport = self.pump.viewport();
        if viewport.width == width && viewport.height == height {
            return;
        }
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.pump.submit(BackendEvent::Resized { width, height });
    }

    fn set_swap_interval(&mut self, interval: SwapInterval) {
        // Pacing happens in the host's FrameLoop on this platform.
        self.swap_interval = interval;
    }

    fn swap_buffers(&mut self) -> Result<(), BackendError> {
        if self.devices.current().is_none() {
            return Err(BackendError::DeviceLost);
        }
        let gl = self.gl()?;
        if gl.is_context_lost() {
            return Err(BackendError::DeviceLost);
        }
        // The browser presents when control returns to it; flushing bounds
        // queued work for this frame.
        gl.flush();
        Ok(())
    }

    fn poll_events(&mut self) -> Result<PollStatus, BackendError> {
        self.poll_geometry();
        if self.gl.as_ref().is_some_and(WebGlRenderingContext::is_context_lost) {
            self.pump.submit(BackendEvent::DeviceLost);
        }
        for event in self.inbox.take() {
            self.pump.submit(event);
        }
        match self.pump.drain() {
            Ok(status) => Ok(status),
            Err(BackendError::DeviceLost) => {
                self.handle_device_loss();
                Err(BackendError::DeviceLost)
            }
            Err(other) => Err(other),
        }
    }

    fn viewport(&self) -> Viewport {
        self.pump.viewport()
    }

    fn input(&self) -> &InputState {
        self.pump.input()
    }

    fn create_texture(
        &mut self,
        device: DeviceId,
        desc: &TextureDesc,
    ) -> Result<TextureId, BackendError> {
        if !self.devices.is_current(device) {
            return Err(BackendError::DeviceLost);
        }
        let gl = self.gl()?;
        let texture = gl
            .create_texture()
            .ok_or_else(|| BackendError::ResourceCreation("createTexture failed".to_string()))?;

        gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture));
        // Clamp + nearest keeps non-power-of-two sizes legal in WebGL1.
        gl.tex_parameteri(
            WebGlRenderingContext::TEXTURE_2D,
            WebGlRenderingContext::TEXTURE_WRAP_S,
            WebGlRenderingContext::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameteri(
            WebGlRenderingContext::TEXTURE_2D,
            WebGlRenderingContext::TEXTURE_WRAP_T,
            WebGlRenderingContext::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameteri(
            WebGlRenderingContext::TEXTURE_2D,
            WebGlRenderingContext::TEXTURE_MIN_FILTER,
            WebGlRenderingContext::NEAREST as i32,
        );
        gl.tex_parameteri(
            WebGlRenderingContext::TEXTURE_2D,
            WebGlRenderingContext::TEXTURE_MAG_FILTER,
            WebGlRenderingContext::NEAREST as i32,
        );

        let row_bytes = desc.width as usize * desc.format.bytes_per_pixel();
        let staging = vec![0; row_bytes * desc.height as usize];
        Ok(TextureId(self.textures.insert(
            device,
            WebTexture {
                desc: *desc,
                staging,
                texture,
            },
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

        // GL expects tightly packed rows; repack through the pitch-aware
        // path rather than assuming the source already is.
        let row_bytes = src.row_bytes();
        let mut dst = LockedRegion {
            data: &mut tex.staging,
            pitch: row_bytes,
        };
        upload::blit(&mut dst, src);

        let (internal, format, ty) = gl_format(tex.desc.format);
        let gl = self
            .gl
            .as_ref()
            .ok_or(BackendError::DeviceLost)?;
        gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&tex.texture));
        let result = gl
            .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                WebGlRenderingContext::TEXTURE_2D,
                0,
                internal,
                tex.desc.width as i32,
                tex.desc.height as i32,
                0,
                format,
                ty,
                Some(&tex.staging),
            )
            .map_err(|err| BackendError::ResourceCreation(format!("texImage2D: {err:?}")));
        self.textures.unlock(texture.0);
        result
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        let payload = self.textures.release(texture.0);
        if let Some(gl) = self.gl.as_ref() {
            gl.delete_texture(Some(&payload.texture));
        }
    }

    fn create_buffer(&mut self, device: DeviceId, len: usize) -> Result<BufferId, BackendError> {
        if !self.devices.is_current(device) {
            return Err(BackendError::DeviceLost);
        }
        let gl = self.gl()?;
        let buffer = gl
            .create_buffer()
            .ok_or_else(|| BackendError::ResourceCreation("createBuffer failed".to_string()))?;
        gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&buffer));
        gl.buffer_data_with_i32(
            WebGlRenderingContext::ARRAY_BUFFER,
            len as i32,
            WebGlRenderingContext::DYNAMIC_DRAW,
        );
        Ok(BufferId(self.buffers.insert(device, WebBuffer { buffer, len })))
    }

    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: usize,
        data: &[u8],
    ) -> Result<(), BackendError> {
        self.buffers.lock(buffer.0);
        let buf = self.buffers.get(buffer.0);
        assert!(
            offset + data.len() <= buf.len,
            "buffer write out of range"
        );
        let result = match self.gl.as_ref() {
            Some(gl) => {
                gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&buf.buffer));
                gl.buffer_sub_data_with_i32_and_u8_array(
                    WebGlRenderingContext::ARRAY_BUFFER,
                    offset as i32,
                    data,
                );
                Ok(())
            }
            None => Err(BackendError::DeviceLost),
        };
        self.buffers.unlock(buffer.0);
        result
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        let payload = self.buffers.release(buffer.0);
        if let Some(gl) = self.gl.as_ref() {
            gl.delete_buffer(Some(&payload.buffer));
        }
    }

    fn destroy(mut self) {
        let _ = self.textures.release_all();
        let _ = self.buffers.release_all();
        self.devices.invalidate();
        // Listener removal happens in DomListeners::drop.
    }
}
