//! Machines: the per-OS-thread control block
//!
//! A machine is created on its own thread's stack when the thread starts
//! and lives until the thread exits. The thread-local hook in `tls` points
//! at it for that whole time.

use crate::scheduler::Shared;
use crate::slot::Slot;
use crate::task::TaskHeader;

use std::cell::Cell;
use std::sync::Arc;
use vtid_core::layout::{FieldKind, TypeDescriptor};
use vtid_core::describe_type;

/// Machine control block
///
/// Only the owning thread writes these fields. `Cell<*const T>` has the
/// layout of `*const T`, so the pointer fields are published as `Ptr`.
///
/// Layout:
/// ```text
/// 0x00: id         (u32) - Machine index
/// 0x08: curtask    (ptr) - Task being polled, null between polls
/// 0x10: slot       (ptr) - Slot held, null while parked or slotless
/// 0x18: os_thread  (u64) - pthread_t of the owning thread (0 off-unix)
/// 0x20: ticks      (u64) - Polls performed by this machine
/// ```
#[repr(C)]
pub struct Machine {
    pub id: u32,
    pub curtask: Cell<*const TaskHeader>,
    pub slot: Cell<*const Slot>,
    pub os_thread: u64,
    pub ticks: Cell<u64>,
    shared: Arc<Shared>,
}

/// Published layout of [`Machine`]
pub const MACHINE_LAYOUT: TypeDescriptor = describe_type!(Machine {
    id: FieldKind::U32,
    curtask: FieldKind::Ptr,
    slot: FieldKind::Ptr,
    os_thread: FieldKind::U64,
    ticks: FieldKind::U64,
});

fn current_os_thread() -> u64 {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            nix::sys::pthread::pthread_self() as u64
        } else {
            0
        }
    }
}

impl Machine {
    pub(crate) fn new(id: u32, shared: Arc<Shared>) -> Self {
        Self {
            id,
            curtask: Cell::new(std::ptr::null()),
            slot: Cell::new(std::ptr::null()),
            os_thread: current_os_thread(),
            ticks: Cell::new(0),
            shared,
        }
    }

    #[inline]
    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    #[inline]
    pub(crate) fn enter_task(&self, header: &TaskHeader) {
        self.ticks.set(self.ticks.get() + 1);
        if let Some(slot) = self.held_slot() {
            slot.record_run();
        }
        self.curtask.set(header);
    }

    #[inline]
    pub(crate) fn leave_task(&self) {
        self.curtask.set(std::ptr::null());
    }

    /// Header of the task being polled on this machine, if any
    #[inline]
    pub(crate) fn current_task(&self) -> Option<&TaskHeader> {
        // Non-null only between enter_task and leave_task, while the
        // worker holds the task's Arc.
        unsafe { self.curtask.get().as_ref() }
    }

    #[inline]
    pub(crate) fn held_slot(&self) -> Option<&Slot> {
        // Slots live in the SlotTable owned by `shared`, which this
        // machine keeps alive.
        unsafe { self.slot.get().as_ref() }
    }

    pub(crate) fn bind_slot(&self, slot: &Slot) {
        debug_assert!(self.slot.get().is_null());
        self.slot.set(slot);
    }

    /// Give the held slot back to the table, if any
    pub(crate) fn unbind_slot(&self) {
        if let Some(slot) = self.held_slot() {
            self.shared.slots.release(slot);
        }
        self.slot.set(std::ptr::null());
    }
}
