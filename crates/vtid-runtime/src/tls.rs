//! Thread-local hook to the calling thread's machine
//!
//! The cell is const-initialized and holds a plain pointer, so reading it
//! never allocates, never registers a destructor, and never makes a
//! syscall.

use crate::machine::Machine;
use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static CURRENT_MACHINE: Cell<*const Machine> = const { Cell::new(std::ptr::null()) };
}

/// Raw pointer to the calling thread's machine, null off-runtime
#[inline]
pub fn current_machine() -> *const Machine {
    CURRENT_MACHINE.with(|cell| cell.get())
}

/// Run `f` with the calling thread's machine, if it has one
#[inline]
pub(crate) fn with_machine<R>(f: impl FnOnce(Option<&Machine>) -> R) -> R {
    // The pointer is set by MachineGuard for exactly as long as the
    // machine is alive on this thread's stack.
    let machine = unsafe { current_machine().as_ref() };
    f(machine)
}

/// Check if the calling thread is a runtime machine
#[inline]
pub fn is_machine_thread() -> bool {
    !current_machine().is_null()
}

/// Publishes a machine in TLS until dropped
pub(crate) struct MachineGuard<'a> {
    _machine: PhantomData<&'a Machine>,
}

impl<'a> MachineGuard<'a> {
    pub(crate) fn enter(machine: &'a Machine) -> Self {
        CURRENT_MACHINE.with(|cell| {
            debug_assert!(cell.get().is_null(), "thread already runs a machine");
            cell.set(machine);
        });
        vtid_core::kprint::set_machine_id(machine.id);
        Self { _machine: PhantomData }
    }
}

impl Drop for MachineGuard<'_> {
    fn drop(&mut self) {
        CURRENT_MACHINE.with(|cell| cell.set(std::ptr::null()));
        vtid_core::kprint::clear_machine_id();
    }
}
