//! Tasks, their control blocks, and join handles
//!
//! A task is a boxed future plus a [`TaskHeader`]. The header is the
//! task-control block that the identity readers reach through
//! `Machine::curtask`; it holds the task's id for the task's whole life.
//!
//! Scheduling state lives in the header:
//!
//! ```text
//!            spawn            pop              Pending
//!   ──────▶ SCHEDULED ──────▶ RUNNING ───────────────────▶ IDLE
//!              ▲                │  │ wake while running       │ wake
//!              │                │  ▼                          │
//!              │                │ NOTIFIED ──(after poll)──┐  │
//!              └────────────────┼──────────────────────────┴──┘
//!                               │ Ready / panic
//!                               ▼
//!                            COMPLETE
//! ```

use crate::scheduler::Shared;
use crate::machine::Machine;

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll, Wake, Waker};

use vtid_core::constants::FIRST_TASK_ID;
use vtid_core::error::{RtError, RtResult};
use vtid_core::id::TaskId;
use vtid_core::layout::{FieldKind, TypeDescriptor};
use vtid_core::describe_type;

const IDLE: u8 = 0;
const SCHEDULED: u8 = 1;
const RUNNING: u8 = 2;
const NOTIFIED: u8 = 3;
const COMPLETE: u8 = 4;

static NEXT_TASK_ID: AtomicI64 = AtomicI64::new(FIRST_TASK_ID);

/// Task control block
///
/// Layout:
/// ```text
/// 0x00: id         (i64) - Process-unique task id
/// 0x08: parent_id  (i64) - Spawning task's id, 0 if spawned off-runtime
/// 0x10: state      (u8)  - Scheduling state
/// 0x18: polls      (u64) - Times this task has been polled
/// ```
#[repr(C)]
pub struct TaskHeader {
    pub id: i64,
    pub parent_id: i64,
    pub state: AtomicU8,
    pub polls: AtomicU64,
}

/// Published layout of [`TaskHeader`]
pub const TASK_HEADER_LAYOUT: TypeDescriptor = describe_type!(TaskHeader {
    id: FieldKind::I64,
    parent_id: FieldKind::I64,
    state: FieldKind::U8,
    polls: FieldKind::U64,
});

impl TaskHeader {
    fn new(parent: TaskId) -> Self {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            parent_id: parent.as_i64(),
            state: AtomicU8::new(SCHEDULED),
            polls: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn task_id(&self) -> TaskId {
        TaskId::new(self.id)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state.load(Ordering::Acquire) == COMPLETE
    }
}

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Heap cell shared by the run queue and every waker of the task
pub(crate) struct TaskCell {
    pub(crate) header: TaskHeader,
    future: Mutex<Option<BoxFuture>>,
    shared: Weak<Shared>,
}

pub(crate) type Task = Arc<TaskCell>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a task and its join handle; the task starts SCHEDULED
pub(crate) fn new_task<F>(shared: &Arc<Shared>, parent: TaskId, future: F) -> (Task, JoinHandle<F::Output>)
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let join = Arc::new(JoinState::new());
    let completer = Completer { join: Arc::clone(&join), done: false };
    let wrapped = async move {
        let output = future.await;
        completer.complete(output);
    };

    let cell = Arc::new(TaskCell {
        header: TaskHeader::new(parent),
        future: Mutex::new(Some(Box::pin(wrapped))),
        shared: Arc::downgrade(shared),
    });
    let handle = JoinHandle { id: cell.header.task_id(), join };
    (cell, handle)
}

impl TaskCell {
    /// Make the task runnable again after a wake
    fn schedule(self: Arc<Self>) {
        let state = &self.header.state;
        let mut cur = state.load(Ordering::Acquire);
        loop {
            let next = match cur {
                IDLE => SCHEDULED,
                RUNNING => NOTIFIED,
                // Already queued, already notified, or done
                _ => return,
            };
            match state.compare_exchange_weak(cur, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => {
                    if next == SCHEDULED {
                        if let Some(shared) = self.shared.upgrade() {
                            shared.inject(self);
                        }
                    }
                    return;
                }
                Err(actual) => cur = actual,
            }
        }
    }

    /// Poll the task once on `machine`
    ///
    /// Returns true if the task completed (or panicked) during this poll.
    pub(crate) fn run(self: Arc<Self>, machine: &Machine) -> bool {
        self.header.state.store(RUNNING, Ordering::Release);
        self.header.polls.fetch_add(1, Ordering::Relaxed);

        let waker = Waker::from(Arc::clone(&self));
        let mut cx = Context::from_waker(&waker);

        let finished = {
            let mut slot = lock(&self.future);
            machine.enter_task(&self.header);
            let outcome = match slot.as_mut() {
                Some(fut) => catch_unwind(AssertUnwindSafe(|| fut.as_mut().poll(&mut cx))),
                None => Ok(Poll::Ready(())),
            };
            machine.leave_task();

            match outcome {
                Ok(Poll::Pending) => false,
                Ok(Poll::Ready(())) => {
                    *slot = None;
                    true
                }
                Err(_) => {
                    vtid_core::kwarn!("task {} panicked", self.header.id);
                    // Dropping the future drops its Completer, which
                    // reports TaskAborted to the join handle.
                    *slot = None;
                    true
                }
            }
        };

        if finished {
            self.header.state.store(COMPLETE, Ordering::Release);
            return true;
        }

        if self.header.state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Woken during the poll
            self.header.state.store(SCHEDULED, Ordering::Release);
            if let Some(shared) = self.shared.upgrade() {
                shared.inject(self);
            }
        }
        false
    }

    /// Drop the future without polling (shutdown)
    pub(crate) fn cancel(&self) {
        self.header.state.store(COMPLETE, Ordering::Release);
        lock(&self.future).take();
    }
}

impl Wake for TaskCell {
    fn wake(self: Arc<Self>) {
        self.schedule();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        Arc::clone(self).schedule();
    }
}

// ============================================================================
// Join handles
// ============================================================================

struct JoinInner<T> {
    result: Option<RtResult<T>>,
    waker: Option<Waker>,
}

struct JoinState<T> {
    inner: Mutex<JoinInner<T>>,
    cond: Condvar,
}

impl<T> JoinState<T> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(JoinInner { result: None, waker: None }),
            cond: Condvar::new(),
        }
    }

    fn finish(&self, result: RtResult<T>) {
        let waker = {
            let mut inner = lock(&self.inner);
            inner.result = Some(result);
            inner.waker.take()
        };
        self.cond.notify_all();
        if let Some(w) = waker {
            w.wake();
        }
    }
}

/// Reports the task's output, or TaskAborted if dropped unfinished
struct Completer<T> {
    join: Arc<JoinState<T>>,
    done: bool,
}

impl<T> Completer<T> {
    fn complete(mut self, output: T) {
        self.done = true;
        self.join.finish(Ok(output));
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.done {
            self.join.finish(Err(RtError::TaskAborted));
        }
    }
}

/// Handle to a spawned task's output
///
/// Await it from another task, or call [`join`](JoinHandle::join) from a
/// thread outside the runtime.
pub struct JoinHandle<T> {
    id: TaskId,
    join: Arc<JoinState<T>>,
}

impl<T> JoinHandle<T> {
    /// Id the runtime assigned to the task
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// True once the task has produced its output or aborted
    pub fn is_finished(&self) -> bool {
        lock(&self.join.inner).result.is_some()
    }

    /// Block the calling OS thread until the task finishes
    ///
    /// Do not call from inside a task: it blocks the machine.
    pub fn join(self) -> RtResult<T> {
        let mut inner = lock(&self.join.inner);
        loop {
            if let Some(result) = inner.result.take() {
                return result;
            }
            inner = self.join.cond.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = RtResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = lock(&self.join.inner);
        match inner.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                inner.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

// ============================================================================
// Yield
// ============================================================================

/// Suspension point: give the slot to other tasks once
///
/// The task goes to the back of the run queue and may resume on a
/// different machine and slot.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
