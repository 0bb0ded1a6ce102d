// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `wl_output` tracking.
//!
//! Geometry, mode, and scale arrive as separate events per output; the info
//! struct accumulates them so the surface-enter handler can adopt the scale
//! of whichever output the surface lands on.

use wayland_client::protocol::wl_output;
use wayland_client::{Connection, Dispatch, QueueHandle};

use crate::state::WaylandState;

/// Accumulated description of one advertised output.
#[derive(Debug)]
pub(crate) struct OutputInfo {
    pub(crate) output: wl_output::WlOutput,
    pub(crate) global_name: u32,
    pub(crate) scale: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) refresh_mhz: i32,
    pub(crate) physical_width: i32,
    pub(crate) physical_height: i32,
    pub(crate) make: String,
    pub(crate) model: String,
}

impl OutputInfo {
    pub(crate) fn new(output: wl_output::WlOutput, global_name: u32) -> Self {
        Self {
            output,
            global_name,
            scale: 1,
            width: 0,
            height: 0,
            refresh_mhz: 0,
            physical_width: 0,
            physical_height: 0,
            make: String::new(),
            model: String::new(),
        }
    }
}

impl Dispatch<wl_output::WlOutput, ()> for WaylandState {
    fn event(
        state: &mut Self,
        output: &wl_output::WlOutput,
        event: wl_output::Event,
        (): &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let Some(info) = state.outputs.iter_mut().find(|info| info.output == *output) else {
            return;
        };
        match event {
            wl_output::Event::Geometry {
                physical_width,
                physical_height,
                make,
                model,
                ..
            } => {
                info.physical_width = physical_width;
                info.physical_height = physical_height;
                info.make = make;
                info.model = model;
            }
            wl_output::Event::Mode {
                width,
                height,
                refresh,
                ..
            } => {
                info.width = width;
                info.height = height;
                info.refresh_mhz = refresh;
            }
            wl_output::Event::Scale { factor } => {
                info.scale = factor;
            }
            wl_output::Event::Done => {
                log::debug!(
                    "output {} ({} {}): {}x{}@{}mHz scale {}",
                    info.global_name,
                    info.make,
                    info.model,
                    info.width,
                    info.height,
                    info.refresh_mhz,
                    info.scale,
                );
            }
            _ => {}
        }
    }
}
