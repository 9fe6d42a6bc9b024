//! Execution slots
//!
//! A slot is the right to run tasks. The runtime has a fixed number of them;
//! a machine takes one from the idle queue before polling any task and puts
//! it back before it parks. At any instant a slot is held by at most one
//! machine, so two tasks running at the same time never share a slot id.

use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use vtid_core::layout::{FieldKind, TypeDescriptor};
use vtid_core::describe_type;

/// Owner value of a slot no machine holds
pub const NO_OWNER: u32 = u32::MAX;

/// Slot control block
///
/// Layout:
/// ```text
/// 0x00: id     (i32) - Slot index, fixed for the runtime's lifetime
/// 0x04: owner  (u32) - Holding machine id, NO_OWNER when idle
/// 0x08: runs   (u64) - Tasks polled while holding this slot
/// ```
#[repr(C, align(64))]
pub struct Slot {
    pub id: i32,
    pub owner: AtomicU32,
    pub runs: AtomicU64,
}

/// Published layout of [`Slot`]
pub const SLOT_LAYOUT: TypeDescriptor = describe_type!(Slot {
    id: FieldKind::I32,
    owner: FieldKind::U32,
    runs: FieldKind::U64,
});

impl Slot {
    fn new(id: i32) -> Self {
        Self {
            id,
            owner: AtomicU32::new(NO_OWNER),
            runs: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn owner(&self) -> Option<u32> {
        match self.owner.load(Ordering::Acquire) {
            NO_OWNER => None,
            id => Some(id),
        }
    }

    #[inline]
    pub(crate) fn record_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }
}

/// Fixed set of slots plus the queue of idle ones
pub struct SlotTable {
    slots: Box<[Slot]>,
    idle: ArrayQueue<usize>,
}

impl SlotTable {
    pub fn new(count: usize) -> Self {
        let slots: Box<[Slot]> = (0..count).map(|i| Slot::new(i as i32)).collect();
        let idle = ArrayQueue::new(count);
        for i in 0..count {
            // Capacity equals count, cannot fail
            let _ = idle.push(i);
        }
        Self { slots, idle }
    }

    /// Take an idle slot for `machine`, if any
    pub fn acquire(&self, machine: u32) -> Option<&Slot> {
        let index = self.idle.pop()?;
        let slot = &self.slots[index];
        let prev = slot.owner.swap(machine, Ordering::AcqRel);
        debug_assert_eq!(prev, NO_OWNER, "slot {} handed out twice", index);
        Some(slot)
    }

    /// Return a slot to the idle queue
    pub fn release(&self, slot: &Slot) {
        slot.owner.store(NO_OWNER, Ordering::Release);
        let pushed = self.idle.push(slot.id as usize);
        debug_assert!(pushed.is_ok(), "slot {} released twice", slot.id);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots not held by any machine
    #[inline]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_layout() {
        assert_eq!(SLOT_LAYOUT.name, "vtid_runtime::slot::Slot");
        let id = SLOT_LAYOUT.field_by_name("id").unwrap();
        assert_eq!(id.offset, 0);
        assert_eq!(id.kind, FieldKind::I32);
        assert_eq!(SLOT_LAYOUT.field_by_name("runs").unwrap().offset, 8);
        assert_eq!(SLOT_LAYOUT.size, 64);
    }

    #[test]
    fn test_acquire_release() {
        let table = SlotTable::new(2);
        assert_eq!(table.idle_count(), 2);

        let a = table.acquire(7).unwrap();
        let b = table.acquire(8).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.owner(), Some(7));
        assert!(table.acquire(9).is_none());

        table.release(a);
        assert_eq!(table.get(a.id as usize).unwrap().owner(), None);
        let c = table.acquire(9).unwrap();
        assert_eq!(c.id, a.id);
        assert_eq!(c.owner(), Some(9));
    }
}
