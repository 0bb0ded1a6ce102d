// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic headless backend for exercising the adapter contract.
//!
//! [`HeadlessBackend`] implements the full
//! [`Backend`](regolith_core::backend::Backend) trait against in-memory
//! state: no window system, no GPU, no clock. Tests script the "native"
//! side by injecting events between polls and flipping device loss on
//! demand, then observe the same surface the frontend core would.
//!
//! Two details make it a sharp test double rather than a stub:
//!
//! - Texture storage uses a deliberately padded row pitch
//!   ([`PITCH_PADDING`] extra bytes per row), so any upload that ignores
//!   stride differences corrupts the readback visibly.
//! - Every texture and buffer holds a handle to a [`ResourceLedger`], which
//!   counts creations on allocation and releases on drop. A leak or a
//!   double free shows up as a ledger imbalance even after the backend
//!   itself is gone.

#![no_std]

extern crate alloc;

use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use regolith_core::backend::Backend;
use regolith_core::config::{BackendConfig, Capabilities, DeviceConfig, SwapInterval};
use regolith_core::error::BackendError;
use regolith_core::event::{BackendEvent, EventPump, PollStatus};
use regolith_core::format::PixelSlice;
use regolith_core::resource::{
    BufferId, DeviceId, DeviceTracker, ResourceArena, TextureDesc, TextureId,
};
use regolith_core::upload::{self, LockedRegion};
use regolith_core::viewport::Viewport;

/// Extra bytes appended to every texture row, so pitch never equals the
/// packed row width. Odd on purpose.
pub const PITCH_PADDING: usize = 7;

#[derive(Debug, Default)]
struct LedgerInner {
    created: Cell<u64>,
    released: Cell<u64>,
}

/// Shared creation/release counter surviving the backend it observes.
///
/// Clone one into a test, pass it to [`HeadlessBackend::with_ledger`], and
/// check [`live`](Self::live) after teardown: a leak keeps it positive, a
/// double free would have panicked in the arena first.
#[derive(Clone, Debug, Default)]
pub struct ResourceLedger {
    inner: Rc<LedgerInner>,
}

impl ResourceLedger {
    /// Creates a ledger with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn on_create(&self) {
        self.inner.created.set(self.inner.created.get() + 1);
    }

    fn on_release(&self) {
        self.inner.released.set(self.inner.released.get() + 1);
    }

    /// Total resources created so far.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.inner.created.get()
    }

    /// Total resources released so far.
    #[must_use]
    pub fn released(&self) -> u64 {
        self.inner.released.get()
    }

    /// Resources currently alive according to the ledger.
    #[must_use]
    pub fn live(&self) -> u64 {
        self.created() - self.released()
    }
}

/// Counts its own drop against the ledger.
#[derive(Debug)]
struct LedgerTicket {
    ledger: ResourceLedger,
}

impl LedgerTicket {
    fn issue(ledger: &ResourceLedger) -> Self {
        ledger.on_create();
        Self {
            ledger: ledger.clone(),
        }
    }
}

impl Drop for LedgerTicket {
    fn drop(&mut self) {
        self.ledger.on_release();
    }
}

struct HeadlessTexture {
    desc: TextureDesc,
    pitch: usize,
    pixels: Vec<u8>,
    _ticket: LedgerTicket,
}

impl fmt::Debug for HeadlessTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HeadlessTexture({}x{} {:?}, pitch {})",
            self.desc.width, self.desc.height, self.desc.format, self.pitch
        )
    }
}

#[derive(Debug)]
struct HeadlessBuffer {
    bytes: Vec<u8>,
    _ticket: LedgerTicket,
}

/// In-memory implementation of the backend contract.
#[derive(Debug)]
pub struct HeadlessBackend {
    pump: EventPump,
    capabilities: Capabilities,
    devices: DeviceTracker,
    textures: ResourceArena<HeadlessTexture>,
    buffers: ResourceArena<HeadlessBuffer>,
    ledger: ResourceLedger,
    swap_interval: SwapInterval,
    present_count: u64,
}

impl HeadlessBackend {
    /// Creates a backend observed by the given ledger.
    #[must_use]
    pub fn with_ledger(config: &BackendConfig, ledger: ResourceLedger) -> Self {
        let mut viewport = Viewport::new(config.width, config.height);
        viewport.fullscreen = config.fullscreen;
        Self {
            pump: EventPump::new(viewport, config.event_queue_capacity),
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
            ledger,
            swap_interval: config.swap_interval,
            present_count: 0,
        }
    }

    /// Injects a "native" event, as a platform listener would.
    pub fn inject(&mut self, event: BackendEvent) {
        self.pump.submit(event);
    }

    /// Injects a device loss, surfaced by the next `poll_events`.
    pub fn inject_device_loss(&mut self) {
        self.pump.submit(BackendEvent::DeviceLost);
    }

    /// Number of completed `swap_buffers` calls.
    #[must_use]
    pub const fn present_count(&self) -> u64 {
        self.present_count
    }

    /// Currently configured swap interval.
    #[must_use]
    pub const fn swap_interval(&self) -> SwapInterval {
        self.swap_interval
    }

    /// Live resources across both arenas.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.textures.live_count() + self.buffers.live_count()
    }

    /// Reads back a texture's pixels for verification.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn texture_pixels(&self, texture: TextureId) -> PixelSlice<'_> {
        let tex = self.textures.get(texture.0);
        PixelSlice::new(
            &tex.pixels,
            tex.desc.width,
            tex.desc.height,
            tex.pitch,
            tex.desc.format,
        )
        .expect("texture storage covers its own extent")
    }

    /// Reads back a buffer's bytes for verification.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn buffer_bytes(&self, buffer: BufferId) -> &[u8] {
        &self.buffers.get(buffer.0).bytes
    }

    /// Device-loss teardown: void the device and release its resources.
    /// The "native" handles are already gone; only bookkeeping remains.
    fn handle_device_loss(&mut self) {
        if let Some(lost) = self.devices.invalidate() {
            let _ = self.textures.release_device(lost);
            let _ = self.buffers.release_device(lost);
        }
        self.pump.reset_input();
    }

    fn require_device(&self, device: DeviceId) -> Result<(), BackendError> {
        if self.devices.is_current(device) {
            Ok(())
        } else {
            Err(BackendError::DeviceLost)
        }
    }
}

impl Backend for HeadlessBackend {
    type InitTarget = ();

    fn init((): Self::InitTarget, config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self::with_ledger(config, ResourceLedger::new()))
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn create_device(&mut self, config: &DeviceConfig) -> Result<DeviceId, BackendError> {
        if config.width == 0 || config.height == 0 {
            return Err(BackendError::DeviceUnavailable(
                "zero-sized backbuffer".to_string(),
            ));
        }
        Ok(self.devices.create())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let current = self.pump.viewport();
        if current.width == width && current.height == height {
            return;
        }
        // Takes effect at the next poll, like a native configure event.
        self.pump.submit(BackendEvent::Resized { width, height });
    }

    fn set_swap_interval(&mut self, interval: SwapInterval) {
        self.swap_interval = interval;
    }

    fn swap_buffers(&mut self) -> Result<(), BackendError> {
        if self.devices.current().is_none() {
            return Err(BackendError::DeviceLost);
        }
        self.present_count += 1;
        Ok(())
    }

    fn poll_events(&mut self) -> Result<PollStatus, BackendError> {
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

    fn input(&self) -> &regolith_core::input::InputState {
        self.pump.input()
    }

    fn create_texture(
        &mut self,
        device: DeviceId,
        desc: &TextureDesc,
    ) -> Result<TextureId, BackendError> {
        self.require_device(device)?;
        let row_bytes = desc.width as usize * desc.format.bytes_per_pixel();
        let pitch = row_bytes + PITCH_PADDING;
        let len = if desc.height == 0 {
            0
        } else {
            (desc.height as usize - 1) * pitch + row_bytes
        };
        let texture = HeadlessTexture {
            desc: *desc,
            pitch,
            pixels: vec![0; len],
            _ticket: LedgerTicket::issue(&self.ledger),
        };
        Ok(TextureId(self.textures.insert(device, texture)))
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
        let mut dst = LockedRegion {
            data: &mut tex.pixels,
            pitch: tex.pitch,
        };
        upload::blit(&mut dst, src);
        self.textures.unlock(texture.0);
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        let _ = self.textures.release(texture.0);
    }

    fn create_buffer(&mut self, device: DeviceId, len: usize) -> Result<BufferId, BackendError> {
        self.require_device(device)?;
        let buffer = HeadlessBuffer {
            bytes: vec![0; len],
            _ticket: LedgerTicket::issue(&self.ledger),
        };
        Ok(BufferId(self.buffers.insert(device, buffer)))
    }

    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: usize,
        data: &[u8],
    ) -> Result<(), BackendError> {
        self.buffers.lock(buffer.0);
        let buf = self.buffers.get_mut(buffer.0);
        assert!(
            offset + data.len() <= buf.bytes.len(),
            "buffer write out of range"
        );
        buf.bytes[offset..offset + data.len()].copy_from_slice(data);
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
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadlessBackend, ResourceLedger, PITCH_PADDING};
    use alloc::vec::Vec;
    use regolith_core::backend::Backend;
    use regolith_core::config::{BackendConfig, DeviceConfig, SwapInterval};
    use regolith_core::error::BackendError;
    use regolith_core::event::BackendEvent;
    use regolith_core::format::{PixelFormat, PixelSlice};
    use regolith_core::input::key::Key;
    use regolith_core::resource::TextureDesc;

    fn backend() -> HeadlessBackend {
        HeadlessBackend::init((), &BackendConfig::default()).unwrap()
    }

    fn device_config() -> DeviceConfig {
        DeviceConfig {
            width: 800,
            height: 600,
            format: PixelFormat::Xrgb8888,
            windowed: true,
        }
    }

    #[test]
    fn last_resize_wins_after_next_poll() {
        let mut backend = backend();
        backend.inject(BackendEvent::Resized {
            width: 320,
            height: 240,
        });
        backend.inject(BackendEvent::Resized {
            width: 1920,
            height: 1080,
        });

        let status = backend.poll_events().unwrap();
        assert!(status.resized);
        assert_eq!((status.width, status.height), (1920, 1080));
        assert_eq!(backend.viewport().width, 1920);
    }

    #[test]
    fn explicit_resize_is_idempotent() {
        let mut backend = backend();
        backend.resize(800, 600); // Matches the default config size.
        let status = backend.poll_events().unwrap();
        assert!(!status.resized);

        backend.resize(1024, 768);
        backend.resize(1024, 768);
        let status = backend.poll_events().unwrap();
        assert!(status.resized);
        assert_eq!((status.width, status.height), (1024, 768));
    }

    #[test]
    fn destroy_releases_every_resource_exactly_once() {
        let ledger = ResourceLedger::new();
        let mut backend =
            HeadlessBackend::with_ledger(&BackendConfig::default(), ledger.clone());
        let device = backend.create_device(&device_config()).unwrap();

        let desc = TextureDesc {
            width: 16,
            height: 16,
            format: PixelFormat::Rgb565,
        };
        for _ in 0..4 {
            let _ = backend.create_texture(device, &desc).unwrap();
        }
        let _ = backend.create_buffer(device, 256).unwrap();
        assert_eq!(ledger.created(), 5);
        assert_eq!(ledger.live(), 5);

        backend.destroy();
        assert_eq!(ledger.released(), 5);
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn touch_presses_and_releases_in_any_order_return_to_zero() {
        let mut backend = backend();
        for id in 0..6 {
            backend.inject(BackendEvent::TouchDown {
                id,
                x: id * 7,
                y: id * 11,
            });
        }
        backend.poll_events().unwrap();
        assert_eq!(backend.input().touch().active_count(), 6);

        for id in [5, 2, 0, 4, 1, 3] {
            backend.inject(BackendEvent::TouchUp { id });
        }
        backend.poll_events().unwrap();
        assert_eq!(backend.input().touch().active_count(), 0);
        assert!(backend.input().touch().is_empty());
    }

    #[test]
    fn key_release_without_press_clears_state() {
        let mut backend = backend();
        backend.inject(BackendEvent::Key {
            key: Key::Space,
            pressed: false,
        });
        backend.poll_events().unwrap();
        assert!(!backend.input().keyboard().pressed(Key::Space));
        assert!(backend.input().keyboard().is_empty());
    }

    #[test]
    fn upload_survives_stride_mismatch() {
        let mut backend = backend();
        let device = backend.create_device(&device_config()).unwrap();
        let desc = TextureDesc {
            width: 4,
            height: 3,
            format: PixelFormat::Rgb565,
        };
        let texture = backend.create_texture(device, &desc).unwrap();

        // Source rows padded differently from the texture's pitch.
        let src_pitch = 4 * 2 + 3;
        let mut src_data = Vec::new();
        for y in 0..3_u8 {
            for x in 0..8 {
                src_data.push(y * 16 + x);
            }
            src_data.extend_from_slice(&[0xEE; 3]);
        }
        let src = PixelSlice::new(&src_data, 4, 3, src_pitch, PixelFormat::Rgb565).unwrap();
        backend.upload_texture(texture, &src).unwrap();

        let stored = backend.texture_pixels(texture);
        assert_ne!(stored.pitch(), src_pitch);
        assert_eq!(stored.pitch(), 4 * 2 + PITCH_PADDING);
        for y in 0..3 {
            assert_eq!(stored.row(y), src.row(y), "row {y} must match");
        }
    }

    #[test]
    fn device_loss_recovery_produces_a_fresh_usable_device() {
        let ledger = ResourceLedger::new();
        let mut backend =
            HeadlessBackend::with_ledger(&BackendConfig::default(), ledger.clone());
        let device = backend.create_device(&device_config()).unwrap();
        let desc = TextureDesc {
            width: 8,
            height: 8,
            format: PixelFormat::Xrgb8888,
        };
        let old_texture = backend.create_texture(device, &desc).unwrap();

        backend.inject_device_loss();
        assert_eq!(backend.poll_events(), Err(BackendError::DeviceLost));

        // Old resources are gone, exactly once.
        assert_eq!(backend.live_resources(), 0);
        assert_eq!(ledger.live(), 0);

        // Recreation yields a distinct, usable device.
        let new_device = backend.create_device(&device_config()).unwrap();
        assert_ne!(device, new_device);
        let texture = backend.create_texture(new_device, &desc).unwrap();
        assert_ne!(old_texture, texture);
        backend.swap_buffers().unwrap();

        // Creating against the lost device is refused.
        assert_eq!(
            backend.create_texture(device, &desc),
            Err(BackendError::DeviceLost)
        );
    }

    #[test]
    fn swap_without_device_reports_loss() {
        let mut backend = backend();
        assert_eq!(backend.swap_buffers(), Err(BackendError::DeviceLost));

        let _ = backend.create_device(&device_config()).unwrap();
        backend.swap_buffers().unwrap();
        assert_eq!(backend.present_count(), 1);
    }

    #[test]
    fn swap_interval_is_instance_state() {
        let mut backend = backend();
        assert_eq!(backend.swap_interval().intervals(), 1);
        backend.set_swap_interval(SwapInterval::Immediate);
        assert_eq!(backend.swap_interval(), SwapInterval::Immediate);
    }

    #[test]
    fn quit_flag_survives_subsequent_polls() {
        let mut backend = backend();
        backend.inject(BackendEvent::CloseRequested);
        assert!(backend.poll_events().unwrap().quit);
        assert!(backend.poll_events().unwrap().quit);
    }

    #[test]
    fn buffer_write_round_trips() {
        let mut backend = backend();
        let device = backend.create_device(&device_config()).unwrap();
        let buffer = backend.create_buffer(device, 8).unwrap();

        backend.write_buffer(buffer, 2, &[9, 8, 7]).unwrap();
        assert_eq!(backend.buffer_bytes(buffer), &[0, 0, 9, 8, 7, 0, 0, 0]);
    }

    #[test]
    fn zero_sized_device_is_unavailable() {
        let mut backend = backend();
        let config = DeviceConfig {
            width: 0,
            height: 600,
            format: PixelFormat::Xrgb8888,
            windowed: true,
        };
        assert!(matches!(
            backend.create_device(&config),
            Err(BackendError::DeviceUnavailable(_))
        ));
    }
}
