//! Idle machine parking
//!
//! A machine that finds no work parks until a task is injected or the
//! timeout expires. Parking is ticket based so a wake that lands between
//! "queue looked empty" and "go to sleep" is not lost:
//!
//! ```ignore
//! let ticket = parking.prepare();
//! if queue.is_empty() {
//!     parking.park(ticket, Some(timeout));
//! }
//! ```

use std::time::Duration;

/// Sleep/wake primitive for idle machines
pub trait IdleParking: Send + Sync {
    /// Snapshot the wake epoch before the final emptiness check
    fn prepare(&self) -> u32;

    /// Sleep unless a wake happened since `prepare` returned `ticket`
    ///
    /// Returns true if woken, false on timeout or spurious return.
    fn park(&self, ticket: u32, timeout: Option<Duration>) -> bool;

    /// Wake one parked machine
    fn wake_one(&self);

    /// Wake every parked machine (shutdown)
    fn wake_all(&self);

    /// Parked machines right now (hint, may be stale)
    fn parked_count(&self) -> usize;
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        pub use futex_linux::FutexParking as PlatformParking;
    } else {
        mod fallback;
        pub use fallback::CondvarParking as PlatformParking;
    }
}

/// Create the platform's parking primitive
pub fn new_parking() -> Box<dyn IdleParking> {
    Box::new(PlatformParking::new())
}
