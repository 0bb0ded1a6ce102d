// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core contract and state for pluggable video/input backends.
//!
//! `regolith_core` defines the platform-neutral surface between a frontend
//! core and the native graphics/windowing/input system it happens to run
//! on. Platform specifics live in backend crates; this crate owns the
//! contract, the event model, and every piece of state the core queries.
//! It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! Control flows downward from the core; events flow upward through an
//! explicit queue drained once per frame:
//!
//! ```text
//!   Frontend core
//!       │  draw / poll / query          ▲ PollStatus, InputState, Viewport
//!       ▼                               │
//!   Backend trait ──────────────► EventPump::drain()
//!       │                               ▲
//!       │  native calls                 │ BackendEvent (translated)
//!       ▼                               │
//!   Platform backend ◄────────── native listeners/callbacks
//! ```
//!
//! **[`backend`]** — The [`Backend`](backend::Backend) trait that platform
//! crates implement, with the threading, error, and lifetime contract.
//!
//! **[`event`]** — Platform-neutral [`BackendEvent`](event::BackendEvent)s,
//! the bounded [`EventQueue`](event::EventQueue), and the
//! [`EventPump`](event::EventPump) that folds drained events into state.
//! Replaces native callback delivery: ordering is preserved, reentrancy is
//! gone.
//!
//! **[`input`]** — Point-in-time input snapshot: key bitmap over a neutral
//! code space, pointer state, fixed-capacity touch slot table. All clearing
//! is defensive.
//!
//! **[`resource`]** — Generation-checked resource arena and device
//! tracking. Stale handles fail validation instead of aliasing recycled
//! slots; release accounting rules out leaks and double frees.
//!
//! **[`upload`]** — The pitch-aware acquire → write → release upload path.
//!
//! **[`config`]** — Requested configuration in, negotiated
//! [`Capabilities`](config::Capabilities) out. Platform conditionals become
//! capability branches resolved once at init.
//!
//! **[`format`]**, **[`viewport`]**, **[`error`]** — Pixel formats and
//! borrowed frame views, surface geometry, and the synchronous error model.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod input;
pub mod resource;
pub mod upload;
pub mod viewport;

mod queue;
