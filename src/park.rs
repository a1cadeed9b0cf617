//! Thread-parking wait on one or two gates, used by the blocking fetch.

use std::sync::Arc as StdArc;
use std::task::{Wake, Waker};
use std::time::Instant;

use crate::cancel::Cancelled;
use crate::gate::Gate;
use crate::shim::atomic::{AtomicBool, Ordering};
use crate::shim::thread;

// Waker that unparks the thread which created it
struct ThreadParker {
    thread: thread::Thread,
    notified: AtomicBool,
}

impl Wake for ThreadParker {
    fn wake(self: StdArc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &StdArc<Self>) {
        self.notified.store(true, Ordering::Release);
        self.thread.unpark();
    }
}

/// Park the current thread until `gate` fires, `cancel` fires, or `deadline` passes.
///
/// `gate` is checked first on every round, so a gate that is already fired
/// wins over an already fired cancel gate or an elapsed deadline.
pub(crate) fn wait(
    gate: &Gate,
    cancel: Option<&Gate>,
    deadline: Option<Instant>,
) -> Result<(), Cancelled> {
    let parker = StdArc::new(ThreadParker {
        thread: thread::current(),
        notified: AtomicBool::new(false),
    });
    let waker = Waker::from(parker.clone());

    let mut key = None;
    let mut cancel_key = None;

    let outcome = loop {
        if gate.register(&mut key, &waker) {
            key = None;
            break Ok(());
        }

        if let Some(cancel) = cancel {
            if cancel.register(&mut cancel_key, &waker) {
                cancel_key = None;
                break Err(Cancelled::Requested);
            }
        }

        // Park if not notified
        match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break Err(Cancelled::DeadlineExceeded);
                }
                if !parker.notified.swap(false, Ordering::Acquire) {
                    thread::park_timeout(deadline - now);
                }
            }
            None => {
                if !parker.notified.swap(false, Ordering::Acquire) {
                    thread::park();
                }
            }
        }
    };

    if let Some(key) = key {
        gate.unregister(key);
    }
    if let (Some(cancel), Some(key)) = (cancel, cancel_key) {
        cancel.unregister(key);
    }

    outcome
}
