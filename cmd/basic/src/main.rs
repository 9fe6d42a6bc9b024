//! Basic vtid example
//!
//! Spawns a few tasks on a multi-machine runtime and has each one report
//! its task id, its parent, and the slot it runs on as it yields.
//!
//! # Environment Variables
//!
//! - `VTID_FLUSH_EPRINT=1` - Flush debug output immediately
//! - `VTID_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `VTID_NUM_WORKERS` / `VTID_NUM_SLOTS` - Override the sizes below

use std::process::ExitCode;

use vtid::{Runtime, RuntimeConfig, current_parent_task_id, current_slot_id, current_task_id, spawn, yield_now};
use vtid::{IdentityResult, kinfo, kerror, kdebug, runtime_identity};

/// Report this task's identity a few times across yields
async fn worker(n: u32) -> IdentityResult<()> {
    let me = current_task_id()?;
    let parent = current_parent_task_id()?;
    for step in 0..3 {
        let slot = current_slot_id()?;
        println!("[worker {}] task={} parent={} slot={} step={}", n, me, parent, slot, step);
        yield_now().await;
        kdebug!("[worker {}] resumed", n);
    }
    Ok(())
}

// VTID_LOG_LEVEL=debug cargo run -p vtid-basic
fn main() -> ExitCode {
    println!("=== vtid Basic Example ===\n");

    let config = RuntimeConfig::from_env()
        .num_workers(4)
        .num_slots(2)
        .debug_logging(true);

    let mut runtime = match Runtime::new(config) {
        Ok(rt) => rt,
        Err(e) => {
            kerror!("cannot create runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Not inside a task yet
    match current_task_id() {
        Ok(id) => println!("main thread unexpectedly reports task {}", id),
        Err(e) => println!("main thread: {}", e),
    }

    let result = runtime.block_on(async {
        let root = current_task_id()?;
        kinfo!("root task {} spawning workers", root);

        let mut handles = Vec::new();
        for n in 1..=4 {
            match spawn(worker(n)) {
                Ok(h) => {
                    println!("spawned worker {} as task {}", n, h.id());
                    handles.push(h);
                }
                Err(e) => kerror!("spawn failed: {}", e),
            }
        }
        for h in handles {
            match h.await {
                Ok(r) => r?,
                Err(e) => kerror!("worker failed: {}", e),
            }
        }
        Ok::<_, vtid::IdentityError>(root)
    });

    if let Ok(offsets) = runtime_identity().offsets() {
        println!("\nresolved offsets: {}", offsets);
    }

    match result {
        Ok(Ok(root)) => {
            println!("\n=== Example Complete (root task {}) ===", root);
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            kerror!("identity lookup failed: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            kerror!("runtime error: {}", e);
            ExitCode::FAILURE
        }
    }
}
