//! The readers must not allocate once offsets are resolved

mod common;

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use common::test_runtime;
use vtid::{current_parent_task_id, current_slot_id, current_task_id, runtime_identity};

struct CountingAlloc;

thread_local! {
    static ALLOCS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCS.try_with(|c| c.set(c.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let _ = ALLOCS.try_with(|c| c.set(c.get() + 1));
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn allocs_on_this_thread() -> usize {
    ALLOCS.with(|c| c.get())
}

#[test]
fn test_reads_do_not_allocate() {
    let mut rt = test_runtime(1, 1);
    let allocs = rt
        .block_on(async {
            // First call may resolve
            runtime_identity().offsets().unwrap();

            let before = allocs_on_this_thread();
            let mut acc = 0i64;
            for _ in 0..1000 {
                acc = acc.wrapping_add(current_task_id().unwrap().as_i64());
                acc = acc.wrapping_add(current_parent_task_id().unwrap().as_i64());
                acc = acc.wrapping_add(current_slot_id().unwrap().as_i32() as i64);
                acc = acc.wrapping_add(runtime_identity().snapshot().unwrap().task.as_i64());
            }
            std::hint::black_box(acc);
            allocs_on_this_thread() - before
        })
        .unwrap();
    assert_eq!(allocs, 0);
}

#[test]
fn test_failed_reads_do_not_allocate() {
    runtime_identity().offsets().unwrap();
    let before = allocs_on_this_thread();
    for _ in 0..1000 {
        assert!(current_task_id().is_err());
        assert!(current_slot_id().is_err());
    }
    assert_eq!(allocs_on_this_thread() - before, 0);
}
