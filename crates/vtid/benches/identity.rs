//! Benchmarks for the identity readers.
//!
//! The hot path is one TLS read plus two dependent loads; resolution is
//! measured separately since it runs once per process.

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use vtid::{
    current_slot_id, current_task_id, describe_type, resolve_offsets, runtime_identity, FieldKind,
    HostRuntime, Runtime, RuntimeConfig, RuntimeHost, TypeDescriptor,
};

#[repr(C)]
struct BenchMachine {
    curtask: *const BenchTask,
    slot: *const BenchSlot,
}

#[repr(C)]
struct BenchTask {
    id: i64,
    parent_id: i64,
}

#[repr(C)]
struct BenchSlot {
    id: i32,
}

static BENCH_TYPES: [TypeDescriptor; 3] = [
    describe_type!("vtid_runtime::machine::Machine" => BenchMachine {
        curtask: FieldKind::Ptr,
        slot: FieldKind::Ptr,
    }),
    describe_type!("vtid_runtime::task::TaskHeader" => BenchTask {
        id: FieldKind::I64,
        parent_id: FieldKind::I64,
    }),
    describe_type!("vtid_runtime::slot::Slot" => BenchSlot {
        id: FieldKind::I32,
    }),
];

/// Host over one leaked machine block shared by every thread
struct BenchHost {
    machine: usize,
}

unsafe impl HostRuntime for BenchHost {
    fn types(&self) -> &'static [TypeDescriptor] {
        &BENCH_TYPES
    }

    fn current_thread_handle(&self) -> *const u8 {
        self.machine as *const u8
    }
}

fn bench_host() -> BenchHost {
    let task: &'static BenchTask = Box::leak(Box::new(BenchTask { id: 42, parent_id: 1 }));
    let slot: &'static BenchSlot = Box::leak(Box::new(BenchSlot { id: 0 }));
    let machine = Box::leak(Box::new(BenchMachine { curtask: task, slot }));
    BenchHost { machine: machine as *const BenchMachine as usize }
}

fn bench_reads(c: &mut Criterion) {
    let identity = vtid::Identity::new(bench_host());
    identity.offsets().unwrap();

    let mut group = c.benchmark_group("fake_host");
    group.bench_function("current_task_id", |b| {
        b.iter(|| black_box(identity.current_task_id().unwrap()))
    });
    group.bench_function("current_slot_id", |b| {
        b.iter(|| black_box(identity.current_slot_id().unwrap()))
    });
    group.bench_function("snapshot", |b| {
        b.iter(|| black_box(identity.snapshot().unwrap()))
    });
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    c.bench_function("resolve_offsets/runtime", |b| {
        b.iter(|| black_box(resolve_offsets(black_box(&RuntimeHost)).unwrap()))
    });
}

/// Time `iters` reads inside a task on a real machine thread
fn bench_on_runtime(c: &mut Criterion) {
    let config = RuntimeConfig::from_env().num_workers(1).num_slots(1);
    let mut rt = Runtime::new(config).unwrap();
    rt.start().unwrap();
    runtime_identity().offsets().unwrap();

    c.bench_function("runtime/current_task_id+slot", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async move {
                let start = Instant::now();
                for _ in 0..iters {
                    black_box(current_task_id().unwrap());
                    black_box(current_slot_id().unwrap());
                }
                start.elapsed()
            })
            .unwrap_or(Duration::ZERO)
        })
    });
}

criterion_group!(benches, bench_reads, bench_resolve, bench_on_runtime);
criterion_main!(benches);
