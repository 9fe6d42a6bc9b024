//! Scheduler: run queue, machine threads, runtime lifecycle
//!
//! All runnable tasks go through one global injector queue. Machines pop
//! from it in FIFO order, so a task that yields is usually resumed by
//! whichever machine gets to it first, on whichever slot that machine
//! holds at the time.

use crate::config::RuntimeConfig;
use crate::machine::Machine;
use crate::parking::{new_parking, IdleParking};
use crate::slot::SlotTable;
use crate::task::{new_task, JoinHandle, Task};
use crate::tls::{self, MachineGuard};

use crossbeam_queue::SegQueue;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle as ThreadHandle};

use vtid_core::error::{RtError, RtResult};
use vtid_core::id::TaskId;
use vtid_core::{kdebug, kinfo, kwarn};

const NEW: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// State shared by the runtime handle, every machine and every task
pub(crate) struct Shared {
    config: RuntimeConfig,
    injector: SegQueue<Task>,
    parking: Box<dyn IdleParking>,
    pub(crate) slots: SlotTable,
    state: AtomicU8,
}

impl Shared {
    fn new(config: RuntimeConfig) -> Self {
        Self {
            injector: SegQueue::new(),
            parking: new_parking(),
            slots: SlotTable::new(config.num_slots),
            state: AtomicU8::new(NEW),
            config,
        }
    }

    #[inline]
    fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// Queue a runnable task and wake a machine for it
    pub(crate) fn inject(&self, task: Task) {
        if !self.is_running() {
            task.cancel();
            return;
        }
        self.injector.push(task);
        self.parking.wake_one();
    }

    fn spawn<F>(self: &Arc<Self>, parent: TaskId, future: F) -> RtResult<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self.state.load(Ordering::Acquire) {
            NEW => return Err(RtError::NotStarted),
            STOPPED => return Err(RtError::ShuttingDown),
            _ => {}
        }
        let (task, handle) = new_task(self, parent, future);
        self.inject(task);
        Ok(handle)
    }

    /// Drop everything still queued (shutdown)
    fn drain(&self) {
        let mut dropped = 0usize;
        while let Some(task) = self.injector.pop() {
            task.cancel();
            dropped += 1;
        }
        if dropped > 0 {
            kwarn!("dropped {} queued task(s) at shutdown", dropped);
        }
    }
}

/// Machine threads
struct MachinePool {
    handles: Vec<ThreadHandle<()>>,
}

impl MachinePool {
    fn start(shared: &Arc<Shared>) -> RtResult<Self> {
        let count = shared.config.num_workers;
        let mut pool = Self { handles: Vec::with_capacity(count) };

        for i in 0..count {
            let shared = Arc::clone(shared);
            let spawned = thread::Builder::new()
                .name(format!("vtid-m{}", i))
                .spawn(move || machine_main(shared, i as u32));

            match spawned {
                Ok(handle) => pool.handles.push(handle),
                Err(e) => {
                    kwarn!("failed to spawn machine {}: {}", i, e);
                    return Err(RtError::SpawnFailed);
                }
            }
        }
        Ok(pool)
    }

    fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

/// Main loop of one machine thread
fn machine_main(shared: Arc<Shared>, id: u32) {
    let machine = Machine::new(id, Arc::clone(&shared));
    let _guard = MachineGuard::enter(&machine);

    let debug = shared.config.debug_logging;
    let spin_limit = shared.config.idle_spins;
    let park_timeout = shared.config.park_timeout;

    if debug {
        kdebug!("started (os thread {:#x})", machine.os_thread);
    }

    let mut idle_spins: u32 = 0;

    while shared.is_running() {
        if machine.held_slot().is_none() {
            match shared.slots.acquire(id) {
                Some(slot) => {
                    machine.bind_slot(slot);
                    if debug {
                        kdebug!("acquired slot {}", slot.id);
                    }
                }
                None => {
                    // Every slot is busy; wait for one to be released
                    let ticket = shared.parking.prepare();
                    if shared.slots.idle_count() == 0 && shared.is_running() {
                        shared.parking.park(ticket, Some(park_timeout));
                    }
                    continue;
                }
            }
        }

        match shared.injector.pop() {
            Some(task) => {
                idle_spins = 0;
                task.run(&machine);
            }
            None if idle_spins < spin_limit => {
                idle_spins += 1;
                for _ in 0..32 {
                    std::hint::spin_loop();
                }
                thread::yield_now();
            }
            None => {
                // Release the slot before sleeping so a slotless machine
                // can pick up work injected meanwhile.
                machine.unbind_slot();
                if !shared.injector.is_empty() {
                    shared.parking.wake_one();
                }

                let ticket = shared.parking.prepare();
                if shared.injector.is_empty() && shared.is_running() {
                    shared.parking.park(ticket, Some(park_timeout));
                }
                idle_spins = 0;
            }
        }
    }

    machine.unbind_slot();
    if debug {
        kdebug!("exiting after {} polls", machine.ticks.get());
    }
}

/// Runtime handle
///
/// Owns the machine threads. Dropping it shuts the runtime down; tasks that
/// have not finished by then are dropped and their join handles report
/// `TaskAborted`.
pub struct Runtime {
    shared: Arc<Shared>,
    machines: Option<MachinePool>,
}

impl Runtime {
    /// Create a runtime; machines are not started until `start` or `block_on`
    pub fn new(config: RuntimeConfig) -> RtResult<Self> {
        config.validate().map_err(RtError::InvalidConfig)?;
        Ok(Self {
            shared: Arc::new(Shared::new(config)),
            machines: None,
        })
    }

    /// Start the machine threads
    pub fn start(&mut self) -> RtResult<()> {
        if self.shared
            .state
            .compare_exchange(NEW, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RtError::AlreadyStarted);
        }
        match MachinePool::start(&self.shared) {
            Ok(pool) => {
                kinfo!(
                    "runtime started: {} machine(s), {} slot(s)",
                    self.shared.config.num_workers,
                    self.shared.slots.len()
                );
                self.machines = Some(pool);
                Ok(())
            }
            Err(e) => {
                self.shared.state.store(STOPPED, Ordering::Release);
                self.shared.parking.wake_all();
                Err(e)
            }
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.machines.is_some() && self.shared.is_running()
    }

    /// Spawn a task from outside (or inside) the runtime
    ///
    /// The task's parent id is the calling task's id when called from a
    /// task of any runtime, otherwise none.
    pub fn spawn<F>(&self, future: F) -> RtResult<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.shared.spawn(calling_task(), future)
    }

    /// Run `future` as a task and block the calling thread until it finishes
    ///
    /// Starts the runtime if needed. Must not be called from inside a task.
    pub fn block_on<F>(&mut self, future: F) -> RtResult<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.machines.is_none() {
            self.start()?;
        }
        self.spawn(future)?.join()
    }

    /// Number of execution slots
    #[inline]
    pub fn num_slots(&self) -> usize {
        self.shared.slots.len()
    }

    /// Number of machine threads
    #[inline]
    pub fn num_workers(&self) -> usize {
        self.shared.config.num_workers
    }

    /// Stop all machines and drop unfinished tasks
    pub fn shutdown(&mut self) {
        if self.shared.state.swap(STOPPED, Ordering::SeqCst) != RUNNING {
            return;
        }
        self.shared.parking.wake_all();
        if let Some(pool) = self.machines.take() {
            pool.join();
        }
        self.shared.drain();
        kinfo!("runtime stopped");
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Id of the task running on this thread, or none
fn calling_task() -> TaskId {
    tls::with_machine(|m| {
        m.and_then(|m| m.current_task())
            .map(|t| t.task_id())
            .unwrap_or(TaskId::NONE)
    })
}

/// Spawn a task on the runtime the calling task runs on
///
/// Fails with `NotOnRuntime` when called from a thread that is not a
/// runtime machine.
pub fn spawn<F>(future: F) -> RtResult<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let (shared, parent) = tls::with_machine(|m| {
        m.map(|m| {
            let parent = m.current_task().map(|t| t.task_id()).unwrap_or(TaskId::NONE);
            (Arc::clone(m.shared()), parent)
        })
    })
    .ok_or(RtError::NotOnRuntime)?;
    shared.spawn(parent, future)
}
