use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use riscv_core::threading::Thread;

#[test]
fn spawned_closure_runs_to_completion_before_join_returns() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let t = Thread::spawn(move || flag.store(true, Ordering::SeqCst));
    t.join();
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn kill_tears_down_a_long_running_thread_without_panicking() {
    let t = Thread::spawn(|| std::thread::sleep(Duration::from_secs(30)));
    // Give the thread a moment to actually start running before cancelling it.
    std::thread::sleep(Duration::from_millis(10));
    t.kill();
}
