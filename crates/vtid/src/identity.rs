//! Task and slot identity readers
//!
//! [`Identity`] is the capability object: construct it once for a host and
//! pass it (or a `&'static` to it) to whatever needs identity lookups. The
//! crate-level functions use a process-wide instance bound to
//! `vtid_runtime::RuntimeHost`.

use vtid_core::error::IdentityResult;
use vtid_core::id::{SlotId, TaskId};
use vtid_core::traits::HostRuntime;

use crate::locator::current_thread_handle;
use crate::resolver::{OffsetCache, OffsetResolver};

/// Ids read in a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub task: TaskId,
    pub parent: TaskId,
    /// Slot the task was running on at the moment of the read
    pub slot: SlotId,
}

/// Identity lookups against one host runtime
///
/// Offsets are resolved on first use and cached for the life of the
/// object. Every method after that is a few loads: no locks, no
/// allocation, no syscalls.
pub struct Identity<H> {
    resolver: OffsetResolver<H>,
}

impl<H: HostRuntime> Identity<H> {
    pub const fn new(host: H) -> Self {
        Self {
            resolver: OffsetResolver::new(host),
        }
    }

    #[inline]
    pub fn host(&self) -> &H {
        self.resolver.host()
    }

    /// Resolved offsets, resolving now if needed
    #[inline]
    pub fn offsets(&self) -> IdentityResult<&OffsetCache> {
        self.resolver.resolve()
    }

    /// Id of the task running on the calling thread
    ///
    /// Stable for the task's whole life, unique among live tasks.
    #[inline]
    pub fn current_task_id(&self) -> IdentityResult<TaskId> {
        let offsets = self.resolver.resolve()?;
        let thread = current_thread_handle(self.host())?;
        let task = thread.current_task(offsets)?;
        Ok(TaskId::new(task.id(offsets)))
    }

    /// Id of the task that spawned the calling task
    ///
    /// [`TaskId::NONE`] if it was spawned from outside the runtime.
    #[inline]
    pub fn current_parent_task_id(&self) -> IdentityResult<TaskId> {
        let offsets = self.resolver.resolve()?;
        let thread = current_thread_handle(self.host())?;
        let task = thread.current_task(offsets)?;
        Ok(TaskId::new(task.parent_id(offsets)))
    }

    /// Id of the execution slot the calling thread holds right now
    ///
    /// May differ between two calls from the same task if the task was
    /// moved across a suspension point.
    #[inline]
    pub fn current_slot_id(&self) -> IdentityResult<SlotId> {
        let offsets = self.resolver.resolve()?;
        let thread = current_thread_handle(self.host())?;
        let slot = thread.current_slot(offsets)?;
        Ok(SlotId::new(slot.id(offsets)))
    }

    /// Task, parent and slot ids from one thread-control lookup
    pub fn snapshot(&self) -> IdentityResult<Snapshot> {
        let offsets = self.resolver.resolve()?;
        let thread = current_thread_handle(self.host())?;
        let task = thread.current_task(offsets)?;
        let slot = thread.current_slot(offsets)?;
        Ok(Snapshot {
            task: TaskId::new(task.id(offsets)),
            parent: TaskId::new(task.parent_id(offsets)),
            slot: SlotId::new(slot.id(offsets)),
        })
    }
}
