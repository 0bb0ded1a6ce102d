// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend error kinds and propagation policy.
//!
//! Every fallible backend operation returns [`BackendError`] synchronously to
//! the calling core; backends never raise asynchronous faults. The variants
//! split along recovery strategy:
//!
//! - [`Init`](BackendError::Init) and
//!   [`DeviceUnavailable`](BackendError::DeviceUnavailable) are fatal for the
//!   backend that reported them. The caller may fall back to another backend.
//! - [`DeviceLost`](BackendError::DeviceLost) is recoverable: tear down every
//!   resource, then call
//!   [`Backend::create_device`](crate::backend::Backend::create_device) again.
//!   Retrying the failed call in place is not.
//! - [`ResourceCreation`](BackendError::ResourceCreation) leaves the device
//!   usable; the caller decides between degraded rendering and aborting.
//! - [`Protocol`](BackendError::Protocol) marks a malformed native event
//!   sequence. Backends log and drop such events rather than returning this
//!   from the poll loop; the variant exists for operations where the
//!   malformation makes the result unusable.

use alloc::string::String;

/// Error returned by backend operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be brought up at all.
    #[error("backend initialization failed: {0}")]
    Init(String),
    /// No native device satisfying the requested configuration exists.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    /// The native rendering context was invalidated mid-session.
    ///
    /// All resource handles owned by the lost device are invalid. Recovery is
    /// a full device/resource recreation.
    #[error("device lost")]
    DeviceLost,
    /// A texture or buffer allocation failed.
    #[error("resource creation failed: {0}")]
    ResourceCreation(String),
    /// The native system delivered a malformed or unexpected event sequence.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Returns `true` when the error is recoverable by recreating the device.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::DeviceLost)
    }
}

#[cfg(test)]
mod tests {
    use super::BackendError;
    use alloc::string::ToString;

    #[test]
    fn device_lost_is_the_only_recoverable_kind() {
        assert!(BackendError::DeviceLost.is_recoverable());
        assert!(!BackendError::Init("no display".to_string()).is_recoverable());
        assert!(!BackendError::ResourceCreation("oom".to_string()).is_recoverable());
    }

    #[test]
    fn display_includes_context() {
        let err = BackendError::DeviceUnavailable("no HAL adapter".to_string());
        assert_eq!(err.to_string(), "device unavailable: no HAL adapter");
    }
}
