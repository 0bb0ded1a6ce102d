// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! WebGL context acquisition and canvas geometry.

use alloc::format;
use alloc::string::ToString;

use wasm_bindgen::JsCast as _;
use web_sys::{HtmlCanvasElement, WebGlContextAttributes, WebGlPowerPreference, WebGlRenderingContext};

use regolith_core::config::ContextAttributes;
use regolith_core::error::BackendError;

/// Fallback canvas size when the CSS size cannot be read.
pub(crate) const FALLBACK_WIDTH: f64 = 800.0;
pub(crate) const FALLBACK_HEIGHT: f64 = 600.0;

/// Creates a rendering context from the requested attributes.
///
/// GL ES major version 3 maps to `webgl2`, everything below to `webgl`. A
/// WebGL2 context is used through the WebGL1 interface; the methods this
/// backend calls are common to both.
pub(crate) fn create_context(
    canvas: &HtmlCanvasElement,
    requested: &ContextAttributes,
) -> Result<WebGlRenderingContext, BackendError> {
    let attrs = WebGlContextAttributes::new();
    attrs.set_alpha(requested.alpha);
    attrs.set_depth(requested.depth);
    attrs.set_stencil(requested.stencil);
    attrs.set_antialias(requested.antialias);
    if requested.high_performance {
        attrs.set_power_preference(WebGlPowerPreference::HighPerformance);
    }

    let context_id = if requested.gles_major_version >= 3 {
        "webgl2"
    } else {
        "webgl"
    };

    let context = canvas
        .get_context_with_context_options(context_id, attrs.as_ref())
        .map_err(|err| BackendError::Init(format!("{context_id} unavailable: {err:?}")))?
        .ok_or_else(|| BackendError::Init(format!("{context_id} not supported")))?;

    // WebGL2 exposes every WebGL1 entry point; the cast is sound for the
    // subset this backend uses.
    Ok(context.unchecked_into::<WebGlRenderingContext>())
}

/// Reads the canvas CSS size, falling back to a default when unreadable.
pub(crate) fn canvas_css_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    let (width, height) = (rect.width(), rect.height());
    if width <= 0.0 || height <= 0.0 {
        log::error!("could not get canvas dimensions, assuming {FALLBACK_WIDTH}x{FALLBACK_HEIGHT}");
        return (FALLBACK_WIDTH, FALLBACK_HEIGHT);
    }
    (width, height)
}

/// Physical framebuffer size for a CSS size at the given pixel ratio.
pub(crate) fn physical_size(css: (f64, f64), device_pixel_ratio: f64) -> (u32, u32) {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "positive CSS sizes scaled by a small ratio fit u32"
    )]
    let size = (
        (css.0 * device_pixel_ratio) as u32,
        (css.1 * device_pixel_ratio) as u32,
    );
    size
}

/// Looks up the canvas for a selector.
pub(crate) fn find_canvas(
    document: &web_sys::Document,
    selector: &str,
) -> Result<HtmlCanvasElement, BackendError> {
    document
        .query_selector(selector)
        .map_err(|err| BackendError::Init(format!("bad canvas selector: {err:?}")))?
        .ok_or_else(|| BackendError::Init(format!("no element matches {selector}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| BackendError::Init("selector does not name a canvas".to_string()))
}

#[cfg(test)]
mod tests {
    use super::physical_size;

    #[test]
    fn physical_size_scales_by_pixel_ratio() {
        assert_eq!(physical_size((800.0, 600.0), 2.0), (1600, 1200));
        assert_eq!(physical_size((640.5, 480.5), 1.0), (640, 480));
    }
}
