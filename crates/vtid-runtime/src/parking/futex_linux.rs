//! Linux futex-based parking
//!
//! The futex word is a wake epoch. `prepare` reads it, `park` sleeps only
//! while it still equals the ticket, and every wake bumps it before
//! issuing FUTEX_WAKE. The kernel's compare-and-sleep closes the window
//! between the caller's last queue check and the sleep.

use super::IdleParking;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

pub struct FutexParking {
    /// Bumped by every wake
    epoch: AtomicU32,
    parked: AtomicUsize,
}

impl FutexParking {
    pub fn new() -> Self {
        Self {
            epoch: AtomicU32::new(0),
            parked: AtomicUsize::new(0),
        }
    }

    fn futex_wake(&self, count: i32) {
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.epoch.as_ptr(),
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                count,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }
    }

    fn bump(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for FutexParking {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleParking for FutexParking {
    #[inline]
    fn prepare(&self) -> u32 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn park(&self, ticket: u32, timeout: Option<Duration>) -> bool {
        self.parked.fetch_add(1, Ordering::SeqCst);
        if self.epoch.load(Ordering::SeqCst) != ticket {
            self.parked.fetch_sub(1, Ordering::SeqCst);
            return true;
        }

        let timespec = timeout.map(|d| libc::timespec {
            tv_sec: d.as_secs() as libc::time_t,
            tv_nsec: d.subsec_nanos() as libc::c_long,
        });
        let timespec_ptr = match &timespec {
            Some(ts) => ts as *const libc::timespec,
            None => std::ptr::null(),
        };

        // Sleeps only if epoch == ticket
        let result = unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.epoch.as_ptr(),
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                ticket,
                timespec_ptr,
                std::ptr::null::<u32>(),
                0u32,
            )
        };

        self.parked.fetch_sub(1, Ordering::SeqCst);

        // EAGAIN means the epoch moved before we slept: that is a wake too
        result == 0 || self.epoch.load(Ordering::Acquire) != ticket
    }

    fn wake_one(&self) {
        self.bump();
        if self.parked.load(Ordering::SeqCst) > 0 {
            self.futex_wake(1);
        }
    }

    fn wake_all(&self) {
        self.bump();
        if self.parked.load(Ordering::SeqCst) > 0 {
            self.futex_wake(i32::MAX);
        }
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}
