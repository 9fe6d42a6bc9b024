//! # vtid - who am I running as?
//!
//! Reports, from anywhere inside a task, the runtime-assigned id of the
//! current task and of the execution slot it is running on, without
//! passing any context through call arguments. Meant for tracing,
//! profiling and deadlock diagnostics that need to tag events with the
//! task that produced them.
//!
//! ## How it works
//!
//! 1. **Discovery** (once per process): the offsets of `Machine.curtask`,
//!    `Machine.slot`, `TaskHeader.id`, `TaskHeader.parent_id` and `Slot.id`
//!    are looked up by name in the runtime's type registry and cached. A
//!    missing or reshaped field makes every call fail with
//!    `UnsupportedRuntime` instead of reading through a guessed offset.
//! 2. **Reads** (every call): the calling thread's machine pointer comes
//!    from a thread-local hook; the cached offsets lead to the task or slot
//!    block and its id field. No locks, allocation, or syscalls.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vtid::{Runtime, RuntimeConfig, current_task_id, current_slot_id, yield_now};
//!
//! let mut rt = Runtime::new(RuntimeConfig::from_env())?;
//! rt.block_on(async {
//!     let me = current_task_id()?;
//!     yield_now().await;
//!     assert_eq!(current_task_id()?, me);   // stable
//!     let _slot = current_slot_id()?;       // may have changed
//!     Ok::<_, vtid::IdentityError>(())
//! })??;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  current_task_id() / current_slot_id() / Identity<H>     │
//! └──────────────────────────────────────────────────────────┘
//!        │ once                              │ every call
//!        ▼                                   ▼
//! ┌────────────────────┐        ┌──────────────────────────┐
//! │  OffsetResolver    │        │  locator -> raw handles  │
//! │  (type registry)   │        │  (pointer + offset loads)│
//! └────────────────────┘        └──────────────────────────┘
//!        │                                   │
//!        └────────────── HostRuntime ────────┘
//!                  (vtid-runtime: RuntimeHost)
//! ```

mod locator;
mod raw;
pub mod resolver;
pub mod identity;

pub use identity::{Identity, Snapshot};
pub use resolver::{OffsetCache, OffsetResolver, resolve_offsets};

// Re-export core types
pub use vtid_core::{
    TaskId,
    SlotId,
    HostRuntime,
    TypeDescriptor,
    FieldDescriptor,
    FieldKind,
    IdentityError,
    IdentityResult,
    LayoutError,
    Precondition,
    RtError,
    RtResult,
    describe_type,
};

// Re-export kprint macros
pub use vtid_core::{kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use vtid_core::kprint::{LogLevel, init as init_logging, set_log_level, set_flush_enabled};

// Re-export env utilities
pub use vtid_core::{env_get, env_get_bool, env_get_opt, env_get_ms};

// Re-export runtime types
pub use vtid_runtime::{
    Runtime,
    RuntimeConfig,
    RuntimeHost,
    JoinHandle,
    YieldNow,
    spawn,
    yield_now,
};

/// Process-wide identity instance for the vtid runtime
static RUNTIME_IDENTITY: Identity<RuntimeHost> = Identity::new(RuntimeHost);

/// The process-wide [`Identity`] bound to the vtid runtime
#[inline]
pub fn runtime_identity() -> &'static Identity<RuntimeHost> {
    &RUNTIME_IDENTITY
}

/// Id of the task running on the calling thread
#[inline]
pub fn current_task_id() -> IdentityResult<TaskId> {
    RUNTIME_IDENTITY.current_task_id()
}

/// Id of the execution slot the calling task is running on right now
#[inline]
pub fn current_slot_id() -> IdentityResult<SlotId> {
    RUNTIME_IDENTITY.current_slot_id()
}

/// Id of the task that spawned the calling task
#[inline]
pub fn current_parent_task_id() -> IdentityResult<TaskId> {
    RUNTIME_IDENTITY.current_parent_task_id()
}

/// Raw task id of the calling task
#[inline]
pub fn id() -> IdentityResult<i64> {
    current_task_id().map(TaskId::as_i64)
}

/// Raw slot id of the calling task
#[inline]
pub fn pid() -> IdentityResult<i32> {
    current_slot_id().map(SlotId::as_i32)
}
