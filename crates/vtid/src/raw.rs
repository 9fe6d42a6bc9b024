//! Raw control-block access through resolved offsets
//!
//! This is the only module in the crate that dereferences memory. Every
//! handle here is a borrowed, non-`Send` view that cannot outlive the call
//! that produced it; none of them owns anything.
//!
//! Reads are plain loads at `base + offset`. The resolver has already
//! checked that each offset is aligned for its kind and lies inside the
//! described structure, and the `HostRuntime` contract guarantees the base
//! pointers refer to live blocks of the described types.

use std::marker::PhantomData;
use std::ptr::NonNull;

use vtid_core::error::Precondition;

use crate::resolver::OffsetCache;

/// Ties a handle to the current call and keeps it off other threads
type CallScope<'a> = PhantomData<(&'a (), *const ())>;

/// Borrowed view of the calling thread's thread-control block
pub(crate) struct ThreadControlHandle<'a> {
    base: NonNull<u8>,
    _scope: CallScope<'a>,
}

/// Borrowed view of a task-control block
pub(crate) struct TaskControlHandle<'a> {
    base: NonNull<u8>,
    _scope: CallScope<'a>,
}

/// Borrowed view of a slot-control block
pub(crate) struct SlotControlHandle<'a> {
    base: NonNull<u8>,
    _scope: CallScope<'a>,
}

/// Load a `T` at `base + offset`
///
/// # Safety
///
/// `base + offset` must be inside a live block and aligned for `T`.
#[inline(always)]
unsafe fn load<T: Copy>(base: NonNull<u8>, offset: usize) -> T {
    base.as_ptr().add(offset).cast::<T>().read()
}

impl<'a> ThreadControlHandle<'a> {
    /// Wrap the host's raw handle
    ///
    /// # Safety
    ///
    /// `raw` must come from `HostRuntime::current_thread_handle` on the
    /// calling thread, and the handle must be dropped before the call that
    /// obtained it returns.
    #[inline]
    pub(crate) unsafe fn from_raw(raw: *const u8) -> Result<Self, Precondition> {
        match NonNull::new(raw.cast_mut()) {
            Some(base) => Ok(Self { base, _scope: PhantomData }),
            None => Err(Precondition::NotOnRuntimeThread),
        }
    }

    /// Follow the current-task link
    #[inline]
    pub(crate) fn current_task(&self, offsets: &OffsetCache) -> Result<TaskControlHandle<'a>, Precondition> {
        let ptr: *const u8 = unsafe { load(self.base, offsets.machine_curtask) };
        NonNull::new(ptr.cast_mut())
            .map(|base| TaskControlHandle { base, _scope: PhantomData })
            .ok_or(Precondition::NoCurrentTask)
    }

    /// Follow the held-slot link
    #[inline]
    pub(crate) fn current_slot(&self, offsets: &OffsetCache) -> Result<SlotControlHandle<'a>, Precondition> {
        let ptr: *const u8 = unsafe { load(self.base, offsets.machine_slot) };
        NonNull::new(ptr.cast_mut())
            .map(|base| SlotControlHandle { base, _scope: PhantomData })
            .ok_or(Precondition::NoSlotHeld)
    }
}

impl TaskControlHandle<'_> {
    #[inline]
    pub(crate) fn id(&self, offsets: &OffsetCache) -> i64 {
        unsafe { load(self.base, offsets.task_id) }
    }

    #[inline]
    pub(crate) fn parent_id(&self, offsets: &OffsetCache) -> i64 {
        unsafe { load(self.base, offsets.task_parent_id) }
    }
}

impl SlotControlHandle<'_> {
    #[inline]
    pub(crate) fn id(&self, offsets: &OffsetCache) -> i32 {
        unsafe { load(self.base, offsets.slot_id) }
    }
}
