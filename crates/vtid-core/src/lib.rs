//! # vtid-core
//!
//! Core types shared by the vtid runtime and the identity readers.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! The scheduler lives in `vtid-runtime`; the offset discovery and raw
//! readers live in `vtid`.
//!
//! ## Modules
//!
//! - `id` - Task and execution slot identifier types
//! - `layout` - Type descriptors published by a host runtime
//! - `traits` - The `HostRuntime` capability trait
//! - `error` - Error types
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod layout;
pub mod traits;
pub mod error;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::{TaskId, SlotId};
pub use layout::{TypeDescriptor, FieldDescriptor, FieldKind};
pub use traits::HostRuntime;
pub use error::{IdentityError, IdentityResult, LayoutError, Precondition, RtError, RtResult};
pub use env::{env_get, env_get_bool, env_get_opt, env_get_ms};

/// Constants shared between the runtime and the readers
pub mod constants {
    /// Maximum machines (worker OS threads)
    pub const MAX_MACHINES: usize = 64;

    /// Maximum execution slots
    pub const MAX_SLOTS: usize = 64;

    /// Id reported for tasks spawned from outside any task
    pub const NO_PARENT: i64 = 0;

    /// First task id handed out by the runtime
    pub const FIRST_TASK_ID: i64 = 1;

    /// Cache line size for alignment
    pub const CACHE_LINE_SIZE: usize = 64;
}
