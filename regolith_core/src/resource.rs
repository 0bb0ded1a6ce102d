// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strongly-typed resource handles and arena storage.
//!
//! Backends never hand out native pointers. Resources live in a
//! [`ResourceArena`] and are addressed by generation-checked indices: a
//! released slot bumps its generation, so a stale handle fails validation
//! instead of aliasing whatever reuses the slot. Together with release
//! accounting this pins down the two lifetime defects the contract rules
//! out — use-after-release and double release.
//!
//! Device ownership is part of the handle story: every resource records the
//! [`DeviceId`] that created it, and [`ResourceArena::release_device`]
//! releases a lost device's resources in one sweep.

use alloc::vec::Vec;
use core::fmt;

/// Ownership token for a native rendering context.
///
/// Serial-numbered: recreating the device after a loss yields a new id, and
/// ids of lost devices never compare equal to the current one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Returns the raw serial (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn serial(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

/// Tracks the single live device of a backend instance.
///
/// A backend owns exactly one live rendering context at a time. The tracker
/// mints serial-numbered [`DeviceId`]s and remembers which one is current;
/// device loss invalidates the current id without reusing its serial.
#[derive(Debug, Default)]
pub struct DeviceTracker {
    current: Option<DeviceId>,
    next_serial: u32,
}

impl DeviceTracker {
    /// Creates a tracker with no live device.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: None,
            next_serial: 0,
        }
    }

    /// Mints a new device id and makes it current.
    ///
    /// # Panics
    ///
    /// Panics if a device is already live: the contract requires a full
    /// teardown (or a device-loss invalidation) before recreation.
    pub fn create(&mut self) -> DeviceId {
        assert!(
            self.current.is_none(),
            "create_device while a device is live"
        );
        let id = DeviceId(self.next_serial);
        self.next_serial += 1;
        self.current = Some(id);
        id
    }

    /// The current device, if one is live.
    #[must_use]
    pub const fn current(&self) -> Option<DeviceId> {
        self.current
    }

    /// Invalidates the current device, returning its id.
    pub fn invalidate(&mut self) -> Option<DeviceId> {
        self.current.take()
    }

    /// Returns whether `id` is the current live device.
    #[must_use]
    pub fn is_current(&self, id: DeviceId) -> bool {
        self.current == Some(id)
    }
}

/// A generation-checked handle into a [`ResourceArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    idx: u32,
    generation: u32,
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({}@gen{})", self.idx, self.generation)
    }
}

/// Handle to a backend-owned texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureId(pub ResourceId);

/// Handle to a backend-owned vertex/index buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferId(pub ResourceId);

/// Creation parameters for a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: crate::format::PixelFormat,
}

/// Arena of backend resources with generation-checked handles.
///
/// `P` is the backend's native payload (a mapped shm buffer, a COM texture,
/// an in-memory pixel store). Releasing a slot returns the payload so the
/// backend drops it exactly once; the slot's generation bump invalidates
/// every outstanding handle to it.
///
/// Handle misuse (stale id, double release, blit without lock) is a caller
/// bug and panics; environmental failures belong to the backend that
/// allocates the payload, not to the arena.
#[derive(Debug)]
pub struct ResourceArena<P> {
    payload: Vec<Option<P>>,
    device: Vec<DeviceId>,
    locked: Vec<bool>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    created_total: u64,
    released_total: u64,
}

impl<P> ResourceArena<P> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            payload: Vec::new(),
            device: Vec::new(),
            locked: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            created_total: 0,
            released_total: 0,
        }
    }

    /// Inserts a resource owned by `device` and returns its handle.
    pub fn insert(&mut self, device: DeviceId, payload: P) -> ResourceId {
        self.created_total += 1;
        if let Some(idx) = self.free_list.pop() {
            let slot = idx as usize;
            self.payload[slot] = Some(payload);
            self.device[slot] = device;
            self.locked[slot] = false;
            return ResourceId {
                idx,
                generation: self.generation[slot],
            };
        }
        let idx = u32::try_from(self.payload.len()).expect("arena index overflow");
        self.payload.push(Some(payload));
        self.device.push(device);
        self.locked.push(false);
        self.generation.push(0);
        ResourceId { idx, generation: 0 }
    }

    fn validate(&self, id: ResourceId) {
        let slot = id.idx as usize;
        assert!(
            slot < self.payload.len()
                && self.generation[slot] == id.generation
                && self.payload[slot].is_some(),
            "stale resource handle: {id:?}"
        );
    }

    /// Returns whether the handle refers to a live resource.
    #[must_use]
    pub fn is_alive(&self, id: ResourceId) -> bool {
        let slot = id.idx as usize;
        slot < self.payload.len()
            && self.generation[slot] == id.generation
            && self.payload[slot].is_some()
    }

    /// The owning device of a live resource.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn device_of(&self, id: ResourceId) -> DeviceId {
        self.validate(id);
        self.device[id.idx as usize]
    }

    /// Borrows a live resource's payload.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn get(&self, id: ResourceId) -> &P {
        self.validate(id);
        self.payload[id.idx as usize].as_ref().expect("validated")
    }

    /// Mutably borrows a live resource's payload.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn get_mut(&mut self, id: ResourceId) -> &mut P {
        self.validate(id);
        self.payload[id.idx as usize].as_mut().expect("validated")
    }

    /// Marks a resource as locked for CPU writes.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the resource is already locked.
    pub fn lock(&mut self, id: ResourceId) {
        self.validate(id);
        let slot = id.idx as usize;
        assert!(!self.locked[slot], "resource already locked: {id:?}");
        self.locked[slot] = true;
    }

    /// Ends a CPU write lock.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the resource is not locked.
    pub fn unlock(&mut self, id: ResourceId) {
        self.validate(id);
        let slot = id.idx as usize;
        assert!(self.locked[slot], "resource not locked: {id:?}");
        self.locked[slot] = false;
    }

    /// Returns whether the resource is currently locked.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn is_locked(&self, id: ResourceId) -> bool {
        self.validate(id);
        self.locked[id.idx as usize]
    }

    /// Releases a resource, returning its payload.
    ///
    /// The slot's generation is bumped so every outstanding handle to it
    /// (including `id` itself) immediately fails validation — a second
    /// release panics instead of freeing twice.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release(&mut self, id: ResourceId) -> P {
        self.validate(id);
        let slot = id.idx as usize;
        self.generation[slot] += 1;
        self.locked[slot] = false;
        self.free_list.push(id.idx);
        self.released_total += 1;
        self.payload[slot].take().expect("validated")
    }

    /// Releases every resource owned by `device`, dropping the payloads.
    ///
    /// Returns the number of resources released. Used for device-loss
    /// teardown, where the native handles are already gone and only the
    /// bookkeeping (and payload drop) remains.
    pub fn release_device(&mut self, device: DeviceId) -> usize {
        self.release_where(|owner| owner == device)
    }

    /// Releases every live resource, dropping the payloads.
    pub fn release_all(&mut self) -> usize {
        self.release_where(|_| true)
    }

    fn release_where(&mut self, mut owned: impl FnMut(DeviceId) -> bool) -> usize {
        let mut released = 0;
        for slot in 0..self.payload.len() {
            if self.payload[slot].is_some() && owned(self.device[slot]) {
                self.generation[slot] += 1;
                self.locked[slot] = false;
                self.payload[slot] = None;
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "slot indices fit u32 by insert-time check"
                )]
                self.free_list.push(slot as u32);
                self.released_total += 1;
                released += 1;
            }
        }
        released
    }

    /// Number of currently live resources.
    #[must_use]
    pub fn live_count(&self) -> usize {
        usize::try_from(self.created_total - self.released_total).unwrap_or(usize::MAX)
    }

    /// Total resources ever created.
    #[must_use]
    pub const fn created_total(&self) -> u64 {
        self.created_total
    }

    /// Total resources released so far.
    #[must_use]
    pub const fn released_total(&self) -> u64 {
        self.released_total
    }
}

impl<P> Default for ResourceArena<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceTracker, ResourceArena};

    #[test]
    fn insert_get_release_round_trip() {
        let mut devices = DeviceTracker::new();
        let device = devices.create();
        let mut arena = ResourceArena::new();

        let id = arena.insert(device, 42_u32);
        assert_eq!(*arena.get(id), 42);
        assert_eq!(arena.live_count(), 1);

        assert_eq!(arena.release(id), 42);
        assert_eq!(arena.live_count(), 0);
        assert!(!arena.is_alive(id));
    }

    #[test]
    #[should_panic(expected = "stale resource handle")]
    fn double_release_panics() {
        let mut devices = DeviceTracker::new();
        let device = devices.create();
        let mut arena = ResourceArena::new();

        let id = arena.insert(device, ());
        let _ = arena.release(id);
        let _ = arena.release(id);
    }

    #[test]
    #[should_panic(expected = "stale resource handle")]
    fn recycled_slot_rejects_old_handle() {
        let mut devices = DeviceTracker::new();
        let device = devices.create();
        let mut arena = ResourceArena::new();

        let old = arena.insert(device, 1_u8);
        let _ = arena.release(old);
        let new = arena.insert(device, 2_u8);
        // Same slot, new generation.
        assert_eq!(*arena.get(new), 2);
        let _ = arena.get(old);
    }

    #[test]
    fn release_device_sweeps_only_that_device() {
        let mut devices = DeviceTracker::new();
        let first = devices.create();
        let mut arena = ResourceArena::new();
        let a = arena.insert(first, "a");
        let b = arena.insert(first, "b");

        devices.invalidate();
        let second = devices.create();
        let c = arena.insert(second, "c");

        assert_eq!(arena.release_device(first), 2);
        assert!(!arena.is_alive(a));
        assert!(!arena.is_alive(b));
        assert!(arena.is_alive(c));
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn lock_unlock_cycle() {
        let mut devices = DeviceTracker::new();
        let device = devices.create();
        let mut arena = ResourceArena::new();
        let id = arena.insert(device, ());

        arena.lock(id);
        assert!(arena.is_locked(id));
        arena.unlock(id);
        assert!(!arena.is_locked(id));
    }

    #[test]
    #[should_panic(expected = "already locked")]
    fn double_lock_panics() {
        let mut devices = DeviceTracker::new();
        let device = devices.create();
        let mut arena = ResourceArena::new();
        let id = arena.insert(device, ());
        arena.lock(id);
        arena.lock(id);
    }

    #[test]
    #[should_panic(expected = "create_device while a device is live")]
    fn second_live_device_panics() {
        let mut devices = DeviceTracker::new();
        let _ = devices.create();
        let _ = devices.create();
    }

    #[test]
    fn device_serials_never_repeat() {
        let mut devices = DeviceTracker::new();
        let first = devices.create();
        devices.invalidate();
        let second = devices.create();
        assert_ne!(first, second);
        assert!(devices.is_current(second));
        assert!(!devices.is_current(first));
    }
}
