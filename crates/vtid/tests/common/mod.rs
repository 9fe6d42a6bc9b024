//! Shared fixtures for integration tests
//!
//! `FakeHost` publishes hand-built control blocks under the real runtime's
//! type names, so the readers can be driven without a scheduler.

#![allow(dead_code)]

use std::cell::Cell;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use vtid::{describe_type, FieldKind, HostRuntime, Runtime, RuntimeConfig, TypeDescriptor};

#[repr(C)]
pub struct FakeMachine {
    pub tag: u64,
    pub slot: *const FakeSlot,
    pub curtask: *const FakeTask,
}

#[repr(C)]
pub struct FakeTask {
    pub flags: u32,
    pub id: i64,
    pub parent_id: i64,
}

#[repr(C)]
pub struct FakeSlot {
    pub runs: u64,
    pub id: i32,
}

/// Same field shapes as the real runtime, at different offsets
pub static GOOD_TYPES: [TypeDescriptor; 3] = [
    describe_type!("vtid_runtime::slot::Slot" => FakeSlot {
        runs: FieldKind::U64,
        id: FieldKind::I32,
    }),
    describe_type!("vtid_runtime::machine::Machine" => FakeMachine {
        tag: FieldKind::U64,
        slot: FieldKind::Ptr,
        curtask: FieldKind::Ptr,
    }),
    describe_type!("vtid_runtime::task::TaskHeader" => FakeTask {
        flags: FieldKind::U32,
        id: FieldKind::I64,
        parent_id: FieldKind::I64,
    }),
];

/// Task block lacks `id`
pub static MISSING_FIELD_TYPES: [TypeDescriptor; 3] = [
    describe_type!("vtid_runtime::machine::Machine" => FakeMachine {
        slot: FieldKind::Ptr,
        curtask: FieldKind::Ptr,
    }),
    describe_type!("vtid_runtime::task::TaskHeader" => FakeTask {
        parent_id: FieldKind::I64,
    }),
    describe_type!("vtid_runtime::slot::Slot" => FakeSlot {
        id: FieldKind::I32,
    }),
];

/// Slot id published as a 64-bit field
pub static WRONG_KIND_TYPES: [TypeDescriptor; 3] = [
    describe_type!("vtid_runtime::machine::Machine" => FakeMachine {
        slot: FieldKind::Ptr,
        curtask: FieldKind::Ptr,
    }),
    describe_type!("vtid_runtime::task::TaskHeader" => FakeTask {
        id: FieldKind::I64,
        parent_id: FieldKind::I64,
    }),
    describe_type!("vtid_runtime::slot::Slot" => FakeSlot {
        runs: FieldKind::U64,
        id: FieldKind::I64,
    }),
];

/// Two task blocks under the same name
pub static AMBIGUOUS_TYPES: [TypeDescriptor; 4] = [
    describe_type!("vtid_runtime::machine::Machine" => FakeMachine {
        slot: FieldKind::Ptr,
        curtask: FieldKind::Ptr,
    }),
    describe_type!("vtid_runtime::task::TaskHeader" => FakeTask {
        id: FieldKind::I64,
        parent_id: FieldKind::I64,
    }),
    describe_type!("vtid_runtime::task::TaskHeader" => FakeTask {
        flags: FieldKind::U32,
        id: FieldKind::I64,
        parent_id: FieldKind::I64,
    }),
    describe_type!("vtid_runtime::slot::Slot" => FakeSlot {
        id: FieldKind::I32,
    }),
];

thread_local! {
    static FAKE_MACHINE: Cell<*const FakeMachine> = const { Cell::new(ptr::null()) };
}

/// Make `machine` the calling thread's control block
pub fn install_machine(machine: &'static FakeMachine) {
    FAKE_MACHINE.with(|m| m.set(machine));
}

pub fn clear_machine() {
    FAKE_MACHINE.with(|m| m.set(ptr::null()));
}

/// Leak a machine block wired to a task and a slot
///
/// `None` leaves the corresponding link null.
pub fn leak_machine(task: Option<(i64, i64)>, slot: Option<i32>) -> &'static FakeMachine {
    let curtask = match task {
        Some((id, parent_id)) => Box::leak(Box::new(FakeTask { flags: 0, id, parent_id })) as *const FakeTask,
        None => ptr::null(),
    };
    let slot = match slot {
        Some(id) => Box::leak(Box::new(FakeSlot { runs: 0, id })) as *const FakeSlot,
        None => ptr::null(),
    };
    Box::leak(Box::new(FakeMachine { tag: 0xfeed, slot, curtask }))
}

/// Host over a static registry and the thread-local fake machine
pub struct FakeHost {
    types: &'static [TypeDescriptor],
    type_queries: AtomicUsize,
}

impl FakeHost {
    pub const fn new(types: &'static [TypeDescriptor]) -> Self {
        Self {
            types,
            type_queries: AtomicUsize::new(0),
        }
    }

    /// Number of times the registry was consulted
    pub fn type_queries(&self) -> usize {
        self.type_queries.load(Ordering::SeqCst)
    }
}

// Safety: descriptors come from offset_of! on the fake blocks; machine
// blocks are leaked so they outlive every read.
unsafe impl HostRuntime for FakeHost {
    fn types(&self) -> &'static [TypeDescriptor] {
        self.type_queries.fetch_add(1, Ordering::SeqCst);
        self.types
    }

    fn current_thread_handle(&self) -> *const u8 {
        FAKE_MACHINE.with(|m| m.get()).cast()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// A started runtime sized for tests
pub fn test_runtime(workers: usize, slots: usize) -> Runtime {
    let config = RuntimeConfig::from_env()
        .num_workers(workers)
        .num_slots(slots)
        .park_timeout(Duration::from_millis(5));
    let mut rt = Runtime::new(config).expect("valid config");
    rt.start().expect("runtime starts");
    rt
}
