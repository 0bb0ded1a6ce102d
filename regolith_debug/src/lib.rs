// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for regolith event
//! diagnostics.
//!
//! Hosts mirror the translated [`BackendEvent`] stream into an
//! [`recorder::EventRecorder`] while developing or reproducing a bug, then
//! either dump it as one line per event ([`pretty`]) or export it as JSON
//! for external tooling ([`json`]).
//!
//! [`BackendEvent`]: regolith_core::event::BackendEvent

pub mod json;
pub mod pretty;
pub mod recorder;
