//! CurrentThreadLocator: the calling thread's thread-control block

use vtid_core::error::Precondition;
use vtid_core::traits::HostRuntime;

use crate::raw::ThreadControlHandle;

/// Borrow the calling thread's control block from `host`
///
/// The handle borrows `host` and is `!Send`, so it cannot be kept past the
/// caller's frame or moved to another thread. Never blocks, allocates, or
/// suspends.
#[inline]
pub(crate) fn current_thread_handle<H: HostRuntime + ?Sized>(
    host: &H,
) -> Result<ThreadControlHandle<'_>, Precondition> {
    // The raw pointer comes straight from the host hook on this thread and
    // the handle's lifetime is bound to this borrow of the host.
    unsafe { ThreadControlHandle::from_raw(host.current_thread_handle()) }
}
