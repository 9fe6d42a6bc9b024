//! Condvar-based parking for platforms without futex

use super::IdleParking;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

pub struct CondvarParking {
    /// Wake epoch, guarded for the condvar
    epoch: Mutex<u32>,
    condvar: Condvar,
    parked: AtomicUsize,
}

impl CondvarParking {
    pub fn new() -> Self {
        Self {
            epoch: Mutex::new(0),
            condvar: Condvar::new(),
            parked: AtomicUsize::new(0),
        }
    }

    fn bump(&self) {
        let mut epoch = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        *epoch = epoch.wrapping_add(1);
    }
}

impl Default for CondvarParking {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleParking for CondvarParking {
    fn prepare(&self) -> u32 {
        *self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn park(&self, ticket: u32, timeout: Option<Duration>) -> bool {
        let guard = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        if *guard != ticket {
            return true;
        }

        self.parked.fetch_add(1, Ordering::SeqCst);
        let guard = match timeout {
            Some(t) => {
                self.condvar
                    .wait_timeout_while(guard, t, |e| *e == ticket)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .condvar
                .wait_while(guard, |e| *e == ticket)
                .unwrap_or_else(PoisonError::into_inner),
        };
        self.parked.fetch_sub(1, Ordering::SeqCst);

        *guard != ticket
    }

    fn wake_one(&self) {
        self.bump();
        self.condvar.notify_one();
    }

    fn wake_all(&self) {
        self.bump();
        self.condvar.notify_all();
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}
