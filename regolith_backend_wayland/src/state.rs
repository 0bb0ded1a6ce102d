// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Protocol state and window-system dispatch handlers.
//!
//! One [`WaylandState`] receives every event the compositor sends us. No
//! handler touches the frontend core directly: window-system events are
//! translated into [`BackendEvent`]s and queued on the embedded pump, which
//! the backend drains during `poll_events`. Input handlers live in
//! [`seat`](crate::seat).

use wayland_client::protocol::{
    wl_buffer, wl_callback, wl_compositor, wl_registry, wl_seat, wl_shm, wl_shm_pool, wl_surface,
};
use wayland_client::{delegate_noop, Connection, Dispatch, QueueHandle, WEnum};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

use regolith_core::config::Capabilities;
use regolith_core::event::{BackendEvent, EventPump};

use crate::output::OutputInfo;
use crate::shm::ShmBuffer;

/// Everything the compositor-facing dispatch handlers read and write.
pub(crate) struct WaylandState {
    pub(crate) pump: EventPump,
    pub(crate) capabilities: Capabilities,

    // Globals bound from the registry.
    pub(crate) compositor: Option<wl_compositor::WlCompositor>,
    pub(crate) shm: Option<wl_shm::WlShm>,
    pub(crate) seat: Option<wl_seat::WlSeat>,
    pub(crate) wm_base: Option<xdg_wm_base::XdgWmBase>,
    pub(crate) outputs: Vec<OutputInfo>,
    pub(crate) shm_formats: Vec<wl_shm::Format>,

    // Seat devices, added and removed with seat capabilities.
    pub(crate) keyboard: Option<wayland_client::protocol::wl_keyboard::WlKeyboard>,
    pub(crate) pointer: Option<wayland_client::protocol::wl_pointer::WlPointer>,
    pub(crate) touch: Option<wayland_client::protocol::wl_touch::WlTouch>,

    // Our surface.
    pub(crate) surface: Option<wl_surface::WlSurface>,
    pub(crate) buffer_scale: i32,
    pub(crate) configured: bool,
    pub(crate) frame_done: bool,
    pub(crate) splash: Option<ShmBuffer>,
}

impl WaylandState {
    pub(crate) fn new(pump: EventPump) -> Self {
        Self {
            pump,
            capabilities: Capabilities::default(),
            compositor: None,
            shm: None,
            seat: None,
            wm_base: None,
            outputs: Vec::new(),
            shm_formats: Vec::new(),
            keyboard: None,
            pointer: None,
            touch: None,
            surface: None,
            buffer_scale: 1,
            configured: false,
            frame_done: true,
            splash: None,
        }
    }

    /// Surface-local coordinate scaled into physical pixels.
    pub(crate) fn scale_coord(&self, value: f64) -> i32 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "surface coordinates fit i32 after integer-scale multiply"
        )]
        let scaled = (value * f64::from(self.buffer_scale)) as i32;
        scaled
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        (): &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                log::debug!("global {name}: {interface} v{version}");
                match interface.as_str() {
                    "wl_compositor" => {
                        state.compositor = Some(registry.bind(name, version.min(4), qh, ()));
                    }
                    "wl_shm" => {
                        state.shm = Some(registry.bind(name, version.min(1), qh, ()));
                    }
                    "wl_seat" => {
                        state.seat = Some(registry.bind(name, version.min(5), qh, ()));
                    }
                    "wl_output" => {
                        let output = registry.bind(name, version.min(2), qh, ());
                        state.outputs.push(OutputInfo::new(output, name));
                    }
                    "xdg_wm_base" => {
                        state.wm_base = Some(registry.bind(name, version.min(3), qh, ()));
                    }
                    _ => {}
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                state.outputs.retain(|info| info.global_name != name);
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_shm::WlShm, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_shm::WlShm,
        event: wl_shm::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_shm::Event::Format {
            format: WEnum::Value(format),
        } = event
        {
            state.shm_formats.push(format);
        }
    }
}

impl Dispatch<wl_surface::WlSurface, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_surface::WlSurface,
        event: wl_surface::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        // Adopt the scale of the output the surface lands on.
        if let wl_surface::Event::Enter { output } = event {
            let scale = state
                .outputs
                .iter()
                .find(|info| info.output == output)
                .map_or(1, |info| info.scale);
            if scale != state.buffer_scale {
                state.buffer_scale = scale;
                state.pump.submit(BackendEvent::ScaleChanged {
                    scale: f64::from(scale),
                });
            }
        }
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for WaylandState {
    fn event(
        _: &mut Self,
        wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, ()> for WaylandState {
    fn event(
        state: &mut Self,
        surface: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            surface.ack_configure(serial);
            state.configured = true;
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure {
                width,
                height,
                states,
            } => {
                // Sizes arrive in logical coordinates; zero means "up to us".
                if width > 0 && height > 0 {
                    let scale = state.buffer_scale.max(1);
                    if let (Ok(w), Ok(h)) =
                        (u32::try_from(width * scale), u32::try_from(height * scale))
                    {
                        state.pump.submit(BackendEvent::Resized {
                            width: w,
                            height: h,
                        });
                    }
                }
                let fullscreen = states
                    .chunks_exact(4)
                    .map(|raw| u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
                    .any(|value| value == xdg_toplevel::State::Fullscreen as u32);
                state
                    .pump
                    .submit(BackendEvent::FullscreenChanged { fullscreen });
            }
            xdg_toplevel::Event::Close => {
                state.pump.submit(BackendEvent::CloseRequested);
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for WaylandState {
    fn event(
        state: &mut Self,
        buffer: &wl_buffer::WlBuffer,
        event: wl_buffer::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            // The splash is single-use; texture buffers are reused.
            if state
                .splash
                .as_ref()
                .is_some_and(|splash| splash.buffer == *buffer)
            {
                state.splash = None;
            }
        }
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_callback::WlCallback,
        event: wl_callback::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { .. } = event {
            state.frame_done = true;
        }
    }
}

delegate_noop!(WaylandState: wl_compositor::WlCompositor);
delegate_noop!(WaylandState: wl_shm_pool::WlShmPool);

impl Dispatch<wl_seat::WlSeat, ()> for WaylandState {
    fn event(
        state: &mut Self,
        seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        (): &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        crate::seat::handle_seat_event(state, seat, event, qh);
    }
}
