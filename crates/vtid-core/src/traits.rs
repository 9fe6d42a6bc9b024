//! Host runtime capability trait
//!
//! This is the seam between the identity readers and whatever runtime
//! actually schedules tasks. The readers need exactly two things from it:
//! the layout of its private control blocks, and a raw handle to the
//! calling thread's own control block.

use crate::layout::TypeDescriptor;

/// A runtime whose private control blocks may be read through offsets
///
/// # Safety
///
/// Implementors guarantee that:
///
/// - every descriptor returned by `types()` matches the in-memory layout of
///   the structure it names, for the lifetime of the process;
/// - `current_thread_handle()` returns either null or a pointer to the
///   calling thread's live thread-control block, which stays valid for as
///   long as the calling thread is executing the current call;
/// - pointer fields in those blocks are either null or point to live blocks
///   of the described type while the owning thread is running a task.
pub unsafe trait HostRuntime: Send + Sync {
    /// All structure layouts this runtime publishes
    fn types(&self) -> &'static [TypeDescriptor];

    /// Raw handle to the calling thread's control block (null if none)
    ///
    /// Must not block, allocate, or suspend.
    fn current_thread_handle(&self) -> *const u8;

    /// Short name for diagnostics
    fn name(&self) -> &'static str {
        "unnamed"
    }
}
