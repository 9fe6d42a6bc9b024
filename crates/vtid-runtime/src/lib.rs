//! # vtid-runtime
//!
//! Host runtime for vtid: an M:N scheduler that runs lightweight tasks
//! (futures) on a pool of OS threads.
//!
//! Each OS thread is a *machine* with a private `#[repr(C)]` control block.
//! A machine must hold an execution *slot* to run tasks; there are
//! `num_slots` of them and they move between machines as machines park and
//! wake. While a task is being polled, the machine's control block points at
//! the task's control block and at the slot it holds.
//!
//! The layouts of these three blocks are published through a type registry
//! (`typeinfo`), and `RuntimeHost` exposes them plus the "current machine"
//! hook through the `HostRuntime` trait. Nothing in this crate reads its own
//! blocks through offsets; that is the job of the `vtid` crate.
//!
//! ```text
//!   machine 0 ──slot──▶ Slot{id:1}        machine 1 ──slot──▶ Slot{id:0}
//!      │                                     │
//!   curtask                               curtask
//!      ▼                                     ▼
//!   TaskHeader{id:17}                     TaskHeader{id:4}
//! ```

pub mod config;
pub mod machine;
pub mod slot;
pub mod task;
pub mod tls;
pub mod typeinfo;
pub mod host;
pub mod parking;
pub mod scheduler;

// Re-exports
pub use config::RuntimeConfig;
pub use host::RuntimeHost;
pub use scheduler::{Runtime, spawn};
pub use task::{JoinHandle, YieldNow, yield_now};
pub use parking::{IdleParking, new_parking};
