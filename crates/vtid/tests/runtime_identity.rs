//! Identity readers against the real runtime

mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::test_runtime;
use vtid::{
    current_parent_task_id, current_slot_id, current_task_id, runtime_identity, yield_now,
    IdentityError, Precondition, TaskId,
};

#[test]
fn test_task_ids_unique_and_match_handles() {
    let rt = test_runtime(4, 4);
    let handles: Vec<_> = (0..1000)
        .map(|_| rt.spawn(async { current_task_id().unwrap() }).unwrap())
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        let expected = handle.id();
        let got = handle.join().unwrap();
        assert_eq!(got, expected);
        assert!(!got.is_none());
        assert!(seen.insert(got), "duplicate task id {}", got);
    }
    assert_eq!(seen.len(), 1000);
}

#[test]
fn test_task_id_stable_across_yields() {
    let rt = test_runtime(4, 2);
    let handles: Vec<_> = (0..32)
        .map(|_| {
            rt.spawn(async {
                let first = current_task_id().unwrap();
                for _ in 0..20 {
                    yield_now().await;
                    assert_eq!(current_task_id().unwrap(), first);
                }
                first
            })
            .unwrap()
        })
        .collect();
    for handle in handles {
        let id = handle.id();
        assert_eq!(handle.join().unwrap(), id);
    }
}

#[test]
fn test_slot_ids_in_range() {
    let rt = test_runtime(4, 3);
    let num_slots = rt.num_slots() as i32;
    let handles: Vec<_> = (0..64)
        .map(|_| {
            rt.spawn(async {
                let mut slots = Vec::new();
                for _ in 0..10 {
                    slots.push(current_slot_id().unwrap().as_i32());
                    yield_now().await;
                }
                slots
            })
            .unwrap()
        })
        .collect();
    for handle in handles {
        for slot in handle.join().unwrap() {
            assert!((0..num_slots).contains(&slot), "slot {} out of range", slot);
        }
    }
}

#[test]
fn test_concurrent_tasks_hold_distinct_slots() {
    let rt = test_runtime(2, 2);
    let arrived = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let arrived = Arc::clone(&arrived);
            rt.spawn(async move {
                let slot = current_slot_id().unwrap();
                arrived.fetch_add(1, Ordering::SeqCst);
                // No await here, so the slot stays held while spinning
                let deadline = Instant::now() + Duration::from_secs(10);
                while arrived.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
                    std::hint::spin_loop();
                }
                let overlapped = arrived.load(Ordering::SeqCst) == 2;
                assert_eq!(current_slot_id().unwrap(), slot);
                (slot, overlapped)
            })
            .unwrap()
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let (a, a_overlapped) = results[0];
    let (b, b_overlapped) = results[1];
    assert!(a_overlapped && b_overlapped, "tasks never ran at the same time");
    assert_ne!(a, b);
}

#[test]
fn test_parent_task_id() {
    let mut rt = test_runtime(2, 2);
    let (root, root_parent, child, child_parent) = rt
        .block_on(async {
            let root = current_task_id().unwrap();
            let root_parent = current_parent_task_id().unwrap();
            let handle = vtid::spawn(async {
                (current_task_id().unwrap(), current_parent_task_id().unwrap())
            })
            .unwrap();
            let (child, child_parent) = handle.await.unwrap();
            (root, root_parent, child, child_parent)
        })
        .unwrap();

    assert_eq!(root_parent, TaskId::NONE);
    assert_eq!(child_parent, root);
    assert_ne!(child, root);
}

#[test]
fn test_snapshot_agrees_with_single_readers() {
    let mut rt = test_runtime(1, 1);
    let (snap, task, slot) = rt
        .block_on(async {
            let snap = runtime_identity().snapshot().unwrap();
            (snap, current_task_id().unwrap(), current_slot_id().unwrap())
        })
        .unwrap();
    assert_eq!(snap.task, task);
    assert_eq!(snap.slot, slot);
    assert_eq!(snap.parent, TaskId::NONE);
}

#[test]
fn test_raw_aliases() {
    let mut rt = test_runtime(1, 1);
    let (raw_id, raw_pid, task, slot) = rt
        .block_on(async {
            (
                vtid::id().unwrap(),
                vtid::pid().unwrap(),
                current_task_id().unwrap(),
                current_slot_id().unwrap(),
            )
        })
        .unwrap();
    assert_eq!(raw_id, task.as_i64());
    assert_eq!(raw_pid, slot.as_i32());
}

#[test]
fn test_off_runtime_thread() {
    let expected = IdentityError::PreconditionViolation(Precondition::NotOnRuntimeThread);
    assert_eq!(current_task_id(), Err(expected.clone()));
    assert_eq!(current_slot_id(), Err(expected.clone()));
    assert_eq!(current_parent_task_id(), Err(expected));

    // Plain threads are not runtime threads either
    std::thread::spawn(|| {
        assert!(matches!(
            current_task_id(),
            Err(IdentityError::PreconditionViolation(Precondition::NotOnRuntimeThread))
        ));
    })
    .join()
    .unwrap();
}

#[test]
fn test_real_layout_resolves() {
    let offsets = runtime_identity().offsets().unwrap();
    assert_eq!(offsets.task_id, 0);
    assert_eq!(offsets.slot_id, 0);
    assert_ne!(offsets.machine_curtask, offsets.machine_slot);
}
