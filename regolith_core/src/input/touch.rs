// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity touch slot table.
//!
//! Touch points are tracked in a fixed array keyed by the native touch id.
//! Active slots are kept contiguous at the front of the table: releasing a
//! point compacts the remaining ones forward, so `points()` is always a
//! dense prefix. Cancellation (and focus loss) clears every slot at once —
//! cancelled sequences were never meant for us.

use core::fmt;

/// One active touch point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TouchPoint {
    /// Native touch id, stable for the lifetime of the contact.
    pub id: i32,
    /// Surface-local X position.
    pub x: i32,
    /// Surface-local Y position.
    pub y: i32,
}

#[derive(Clone, Copy, Default)]
struct Slot {
    active: bool,
    point: TouchPoint,
}

impl Default for TouchPoint {
    fn default() -> Self {
        Self { id: -1, x: 0, y: 0 }
    }
}

/// Fixed-capacity table of active touch points.
#[derive(Clone, Copy)]
pub struct TouchTable {
    slots: [Slot; Self::CAPACITY],
    active: usize,
}

impl TouchTable {
    /// Maximum number of simultaneously tracked touch points.
    pub const CAPACITY: usize = 16;

    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [Slot::default(); Self::CAPACITY],
            active: 0,
        }
    }

    /// Number of active touch points.
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.active
    }

    /// Returns the active touch points as a dense slice.
    #[must_use]
    pub fn points(&self) -> impl Iterator<Item = TouchPoint> + '_ {
        self.slots[..self.active].iter().map(|slot| slot.point)
    }

    /// Returns the point with the given native id, if tracked.
    #[must_use]
    pub fn get(&self, id: i32) -> Option<TouchPoint> {
        self.slots[..self.active]
            .iter()
            .find(|slot| slot.active && slot.point.id == id)
            .map(|slot| slot.point)
    }

    /// Starts tracking a new contact.
    ///
    /// Ignored when the table is full or the id is already tracked (a down
    /// for a live id is a malformed sequence; the existing slot wins).
    pub fn down(&mut self, id: i32, x: i32, y: i32) {
        if self.active >= Self::CAPACITY || self.get(id).is_some() {
            return;
        }
        self.slots[self.active] = Slot {
            active: true,
            point: TouchPoint { id, x, y },
        };
        self.active += 1;
    }

    /// Stops tracking a contact and compacts the table.
    ///
    /// Unknown ids are ignored, so a stray up (e.g. after a cancel already
    /// cleared the table) stays harmless.
    pub fn up(&mut self, id: i32) {
        let Some(idx) = self.slots[..self.active]
            .iter()
            .position(|slot| slot.active && slot.point.id == id)
        else {
            return;
        };
        // Shift the tail forward so active slots stay contiguous.
        for i in idx..self.active - 1 {
            self.slots[i] = self.slots[i + 1];
        }
        self.active -= 1;
        self.slots[self.active] = Slot::default();
    }

    /// Updates the position of a tracked contact. Unknown ids are ignored.
    pub fn motion(&mut self, id: i32, x: i32, y: i32) {
        if let Some(slot) = self.slots[..self.active]
            .iter_mut()
            .find(|slot| slot.active && slot.point.id == id)
        {
            slot.point.x = x;
            slot.point.y = y;
        }
    }

    /// Clears every slot and resets the active count to zero.
    pub fn cancel(&mut self) {
        self.slots = [Slot::default(); Self::CAPACITY];
        self.active = 0;
    }

    /// Returns whether every slot is inactive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active == 0 && self.slots.iter().all(|slot| !slot.active)
    }
}

impl Default for TouchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TouchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TouchTable({}/{} active)", self.active, Self::CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::TouchTable;
    use alloc::vec::Vec;

    #[test]
    fn down_then_up_in_any_order_returns_to_zero() {
        let mut table = TouchTable::new();
        for id in 0..5 {
            table.down(id, id * 10, id * 20);
        }
        assert_eq!(table.active_count(), 5);

        // Release out of order.
        for id in [3, 0, 4, 1, 2] {
            table.up(id);
        }
        assert_eq!(table.active_count(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn up_compacts_remaining_points() {
        let mut table = TouchTable::new();
        table.down(7, 1, 1);
        table.down(8, 2, 2);
        table.down(9, 3, 3);

        table.up(8);
        let ids: Vec<i32> = table.points().map(|p| p.id).collect();
        assert_eq!(ids, [7, 9]);
        assert_eq!(table.get(9).unwrap().x, 3);
    }

    #[test]
    fn motion_updates_only_known_ids() {
        let mut table = TouchTable::new();
        table.down(1, 0, 0);
        table.motion(1, 50, 60);
        table.motion(2, 99, 99);

        assert_eq!(table.get(1).unwrap().x, 50);
        assert_eq!(table.get(1).unwrap().y, 60);
        assert!(table.get(2).is_none());
    }

    #[test]
    fn cancel_clears_all_slots() {
        let mut table = TouchTable::new();
        for id in 0..4 {
            table.down(id, 0, 0);
        }
        table.cancel();
        assert!(table.is_empty());

        // A stray up after cancel stays harmless.
        table.up(2);
        assert!(table.is_empty());
    }

    #[test]
    fn table_full_ignores_new_contacts() {
        let mut table = TouchTable::new();
        for id in 0..20 {
            table.down(id, 0, 0);
        }
        assert_eq!(table.active_count(), TouchTable::CAPACITY);
        assert!(table.get(19).is_none());
    }

    #[test]
    fn duplicate_down_keeps_existing_slot() {
        let mut table = TouchTable::new();
        table.down(5, 10, 10);
        table.down(5, 70, 70);
        assert_eq!(table.active_count(), 1);
        assert_eq!(table.get(5).unwrap().x, 10);
    }
}
