// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Windows backend for regolith.
//!
//! Wraps a Direct3D 9 device behind the core contract:
//!
//! - Device creation from present parameters derived from
//!   [`DeviceConfig`], with `CheckDeviceType`-validated formats
//! - `Present` / `TestCooperativeLevel` / `Reset` loss handling: a
//!   resettable device recovers transparently, an unrecoverable one
//!   surfaces as [`BackendError::DeviceLost`]
//! - `LockRect` texture uploads through the core's pitch-aware blit —
//!   Direct3D reports its own pitch per lock, which rarely matches the
//!   source
//! - Managed-pool resources, so a successful `Reset` keeps them alive
//!
//! This backend is video-only: the Win32 message loop, and with it
//! keyboard/mouse delivery, belongs to the host window. The host forwards
//! geometry through [`Backend::resize`]; input capabilities are reported
//! as absent.

#![allow(
    unsafe_code,
    reason = "Direct3D COM interfaces are called through raw pointers"
)]

use core::ffi::c_void;
use core::ptr;

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D9::{
    Direct3DCreate9, IDirect3D9, IDirect3DDevice9, IDirect3DTexture9, IDirect3DVertexBuffer9,
    D3DADAPTER_DEFAULT, D3DCREATE_SOFTWARE_VERTEXPROCESSING, D3DDEVTYPE_HAL, D3DDISPLAYMODE,
    D3DERR_DEVICELOST, D3DERR_DEVICENOTRESET, D3DFMT_A8R8G8B8, D3DFMT_R5G6B5, D3DFMT_X8R8G8B8,
    D3DFORMAT, D3DLOCKED_RECT, D3DPOOL_MANAGED, D3DPRESENT_INTERVAL_IMMEDIATE,
    D3DPRESENT_INTERVAL_ONE, D3DPRESENT_PARAMETERS, D3DSWAPEFFECT_DISCARD, D3D_SDK_VERSION,
};

use regolith_core::backend::Backend;
use regolith_core::config::{BackendConfig, Capabilities, DeviceConfig, SwapInterval};
use regolith_core::error::BackendError;
use regolith_core::event::{BackendEvent, EventPump, PollStatus};
use regolith_core::format::{PixelFormat, PixelSlice};
use regolith_core::input::InputState;
use regolith_core::resource::{
    BufferId, DeviceId, DeviceTracker, ResourceArena, TextureDesc, TextureId,
};
use regolith_core::upload::{self, LockedRegion};
use regolith_core::viewport::Viewport;

/// Window handle consumed by [`D3d9Backend::init`].
#[derive(Clone, Copy, Debug)]
pub struct Win32WindowTarget {
    /// Raw `HWND` value of the host window.
    pub hwnd: isize,
}

const fn d3d_format(format: PixelFormat) -> D3DFORMAT {
    match format {
        PixelFormat::Rgb565 => D3DFMT_R5G6B5,
        PixelFormat::Xrgb8888 => D3DFMT_X8R8G8B8,
        PixelFormat::Argb8888 => D3DFMT_A8R8G8B8,
    }
}

const fn present_interval(interval: SwapInterval) -> u32 {
    match interval.intervals() {
        0 => D3DPRESENT_INTERVAL_IMMEDIATE,
        _ => D3DPRESENT_INTERVAL_ONE,
    }
}

struct D3dTexture {
    desc: TextureDesc,
    texture: IDirect3DTexture9,
}

struct D3dBuffer {
    buffer: IDirect3DVertexBuffer9,
    len: usize,
}

/// Direct3D 9 implementation of the backend contract.
pub struct D3d9Backend {
    d3d: IDirect3D9,
    device: Option<IDirect3DDevice9>,
    hwnd: HWND,
    display_format: D3DFORMAT,
    present_params: D3DPRESENT_PARAMETERS,
    pump: EventPump,
    capabilities: Capabilities,
    devices: DeviceTracker,
    textures: ResourceArena<D3dTexture>,
    buffers: ResourceArena<D3dBuffer>,
    swap_interval: SwapInterval,
}

impl core::fmt::Debug for D3d9Backend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("D3d9Backend")
            .field("viewport", &self.pump.viewport())
            .field("device", &self.devices.current())
            .field("textures", &self.textures.live_count())
            .field("buffers", &self.buffers.live_count())
            .finish_non_exhaustive()
    }
}

impl D3d9Backend {
    /// Device-loss teardown: void the device and release its resources.
    fn handle_device_loss(&mut self) {
        if let Some(lost) = self.devices.invalidate() {
            let _ = self.textures.release_device(lost);
            let _ = self.buffers.release_device(lost);
        }
        self.device = None;
        self.pump.reset_input();
    }

    fn live_device(&self) -> Result<&IDirect3DDevice9, BackendError> {
        self.device.as_ref().ok_or(BackendError::DeviceLost)
    }

    /// Checks the cooperative level, resetting when Direct3D allows it.
    ///
    /// Returns `true` when the device is (still) usable.
    fn check_cooperative_level(&mut self) -> bool {
        let Some(device) = self.device.as_ref() else {
            return false;
        };
        // SAFETY: `device` is a live COM interface owned by this backend.
        let status = unsafe { device.TestCooperativeLevel() };
        match status {
            Ok(()) => true,
            Err(err) if err.code() == D3DERR_DEVICENOTRESET => {
                let mut params = self.present_params;
                // SAFETY: reset with parameters this backend constructed.
                // Managed-pool resources survive a successful reset.
                match unsafe { device.Reset(&mut params) } {
                    Ok(()) => {
                        log::debug!("device reset after transient loss");
                        true
                    }
                    Err(err) => {
                        log::warn!("device reset failed: {err}");
                        false
                    }
                }
            }
            Err(err) if err.code() == D3DERR_DEVICELOST => false,
            Err(err) => {
                log::warn!("unexpected cooperative level: {err}");
                false
            }
        }
    }
}

impl Backend for D3d9Backend {
    type InitTarget = Win32WindowTarget;

    fn init(target: Self::InitTarget, config: &BackendConfig) -> Result<Self, BackendError> {
        // SAFETY: plain factory call; a null result means no runtime.
        let d3d = unsafe { Direct3DCreate9(D3D_SDK_VERSION) }
            .ok_or_else(|| BackendError::Init("Direct3D 9 runtime unavailable".to_owned()))?;

        let mut mode = D3DDISPLAYMODE::default();
        // SAFETY: out-pointer to a default-initialized display mode.
        unsafe { d3d.GetAdapterDisplayMode(D3DADAPTER_DEFAULT, &mut mode) }
            .map_err(|err| BackendError::Init(format!("adapter display mode: {err}")))?;

        let mut viewport = Viewport::new(config.width, config.height);
        viewport.fullscreen = config.fullscreen;

        Ok(Self {
            d3d,
            device: None,
            hwnd: HWND(target.hwnd as *mut c_void),
            display_format: mode.Format,
            present_params: D3DPRESENT_PARAMETERS::default(),
            pump: EventPump::new(viewport, config.event_queue_capacity),
            capabilities: Capabilities {
                // The host window's message loop owns input on Win32.
                keyboard: false,
                pointer: false,
                touch: false,
                shared_memory: None,
                linear_texture_layout: false,
                swap_interval_control: true,
            },
            devices: DeviceTracker::new(),
            textures: ResourceArena::new(),
            buffers: ResourceArena::new(),
            swap_interval: config.swap_interval,
        })
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn create_device(&mut self, config: &DeviceConfig) -> Result<DeviceId, BackendError> {
        let backbuffer_format = d3d_format(config.format);
        // SAFETY: queries against the factory this backend owns.
        unsafe {
            self.d3d.CheckDeviceType(
                D3DADAPTER_DEFAULT,
                D3DDEVTYPE_HAL,
                self.display_format,
                backbuffer_format,
                config.windowed.into(),
            )
        }
        .map_err(|err| {
            BackendError::DeviceUnavailable(format!(
                "no HAL device for {:?}: {err}",
                config.format
            ))
        })?;

        let mut params = D3DPRESENT_PARAMETERS {
            BackBufferWidth: config.width,
            BackBufferHeight: config.height,
            BackBufferFormat: backbuffer_format,
            BackBufferCount: 1,
            SwapEffect: D3DSWAPEFFECT_DISCARD,
            hDeviceWindow: self.hwnd,
            Windowed: config.windowed.into(),
            PresentationInterval: present_interval(self.swap_interval),
            ..D3DPRESENT_PARAMETERS::default()
        };

        let mut device = None;
        // SAFETY: out-pointer device creation with parameters built above.
        unsafe {
            self.d3d.CreateDevice(
                D3DADAPTER_DEFAULT,
                D3DDEVTYPE_HAL,
                self.hwnd,
                D3DCREATE_SOFTWARE_VERTEXPROCESSING,
                &mut params,
                &mut device,
            )
        }
        .map_err(|err| BackendError::DeviceUnavailable(format!("CreateDevice: {err}")))?;

        let device =
            device.ok_or_else(|| BackendError::DeviceUnavailable("no device".to_owned()))?;

        self.present_params = params;
        self.device = Some(device);
        Ok(self.devices.create())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let viewport = self.pump.viewport();
        if viewport.width == width && viewport.height == height {
            return;
        }
        self.present_params.BackBufferWidth = width;
        self.present_params.BackBufferHeight = height;
        if let Some(device) = self.device.as_ref() {
            let mut params = self.present_params;
            // SAFETY: reset with the updated backbuffer extent.
            if let Err(err) = unsafe { device.Reset(&mut params) } {
                log::warn!("reset for resize failed: {err}");
                self.pump.submit(BackendEvent::DeviceLost);
                return;
            }
        }
        self.pump.submit(BackendEvent::Resized { width, height });
    }

    fn set_swap_interval(&mut self, interval: SwapInterval) {
        self.swap_interval = interval;
        self.present_params.PresentationInterval = present_interval(interval);
        // Applied at the next reset or device recreation.
    }

    fn swap_buffers(&mut self) -> Result<(), BackendError> {
        if self.devices.current().is_none() {
            return Err(BackendError::DeviceLost);
        }
        let device = self.live_device()?;
        // SAFETY: plain present of the whole backbuffer.
        let presented = unsafe { device.Present(None, None, None, None) };
        match presented {
            Ok(()) => Ok(()),
            Err(err) if err.code() == D3DERR_DEVICELOST => {
                self.handle_device_loss();
                Err(BackendError::DeviceLost)
            }
            Err(err) => Err(BackendError::Protocol(format!("Present: {err}"))),
        }
    }

    fn poll_events(&mut self) -> Result<PollStatus, BackendError> {
        if self.devices.current().is_some() && !self.check_cooperative_level() {
            self.pump.submit(BackendEvent::DeviceLost);
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
        let d3d_device = self.live_device()?;
        let mut texture = None;
        // SAFETY: out-pointer texture creation; managed pool, one level.
        unsafe {
            d3d_device.CreateTexture(
                desc.width,
                desc.height,
                1,
                0,
                d3d_format(desc.format),
                D3DPOOL_MANAGED,
                &mut texture,
                ptr::null_mut(),
            )
        }
        .map_err(|err| BackendError::ResourceCreation(format!("CreateTexture: {err}")))?;
        let texture =
            texture.ok_or_else(|| BackendError::ResourceCreation("no texture".to_owned()))?;

        Ok(TextureId(self.textures.insert(
            device,
            D3dTexture {
                desc: *desc,
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
        let tex = self.textures.get(texture.0);
        assert!(
            src.width() == tex.desc.width && src.height() == tex.desc.height,
            "upload extent does not match texture extent"
        );

        let mut locked = D3DLOCKED_RECT::default();
        // SAFETY: lock level 0 of a live texture for writing.
        let lock_result = unsafe { tex.texture.LockRect(0, &mut locked, None, 0) };
        let result = match lock_result {
            Ok(()) => {
                let pitch = usize::try_from(locked.Pitch).unwrap_or(0);
                let rows = src.height() as usize;
                let len = if rows == 0 {
                    0
                } else {
                    (rows - 1) * pitch + src.row_bytes()
                };
                // SAFETY: Direct3D guarantees `pBits` addresses at least
                // `rows * Pitch` writable bytes while the lock is held.
                let data =
                    unsafe { core::slice::from_raw_parts_mut(locked.pBits.cast::<u8>(), len) };
                let mut dst = LockedRegion { data, pitch };
                upload::blit(&mut dst, src);
                // SAFETY: matching unlock for the lock above.
                unsafe { tex.texture.UnlockRect(0) }
                    .map_err(|err| BackendError::ResourceCreation(format!("UnlockRect: {err}")))
            }
            Err(err) => Err(BackendError::ResourceCreation(format!("LockRect: {err}"))),
        };
        self.textures.unlock(texture.0);
        result
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        // Dropping the interface releases the COM reference exactly once.
        let _ = self.textures.release(texture.0);
    }

    fn create_buffer(&mut self, device: DeviceId, len: usize) -> Result<BufferId, BackendError> {
        if !self.devices.is_current(device) {
            return Err(BackendError::DeviceLost);
        }
        let d3d_device = self.live_device()?;
        let byte_len = u32::try_from(len)
            .map_err(|_| BackendError::ResourceCreation("buffer too large".to_owned()))?;
        let mut buffer = None;
        // SAFETY: out-pointer buffer creation; managed pool.
        unsafe {
            d3d_device.CreateVertexBuffer(byte_len, 0, 0, D3DPOOL_MANAGED, &mut buffer, ptr::null_mut())
        }
        .map_err(|err| BackendError::ResourceCreation(format!("CreateVertexBuffer: {err}")))?;
        let buffer =
            buffer.ok_or_else(|| BackendError::ResourceCreation("no buffer".to_owned()))?;

        Ok(BufferId(self.buffers.insert(device, D3dBuffer { buffer, len })))
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

        let mut bits = ptr::null_mut();
        let offset_u32 = u32::try_from(offset).unwrap_or(u32::MAX);
        let len_u32 = u32::try_from(data.len()).unwrap_or(u32::MAX);
        // SAFETY: lock the written range of a live vertex buffer.
        let lock_result = unsafe { buf.buffer.Lock(offset_u32, len_u32, &mut bits, 0) };
        let result = match lock_result {
            Ok(()) => {
                // SAFETY: the lock grants `data.len()` writable bytes.
                let dst =
                    unsafe { core::slice::from_raw_parts_mut(bits.cast::<u8>(), data.len()) };
                dst.copy_from_slice(data);
                // SAFETY: matching unlock for the lock above.
                unsafe { buf.buffer.Unlock() }
                    .map_err(|err| BackendError::ResourceCreation(format!("Unlock: {err}")))
            }
            Err(err) => Err(BackendError::ResourceCreation(format!("Lock: {err}"))),
        };
        self.buffers.unlock(buffer.0);
        result
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        let _ = self.buffers.release(buffer.0);
    }

    fn destroy(mut self) {
        let _ = self.textures.release_all();
        let _ = self.buffers.release_all();
        self.devices.invalidate();
        self.device = None;
        // The factory releases when `self.d3d` drops.
    }
}
