//! Single-fire broadcast gate.
//!
//! A gate starts closed and is fired at most once. Any number of tasks and
//! threads may wait on it; firing wakes all of them, and every wait that
//! starts afterwards completes immediately.
//!
//! 单次触发的广播门。
//!
//! 门初始为关闭状态，最多触发一次。任意数量的任务和线程都可以等待它；
//! 触发会唤醒所有等待者，此后开始的等待都会立即完成。

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::shim::atomic::{AtomicBool, Ordering};
use crate::shim::sync::{lock, Arc, Mutex};

/// Waker slab guarded by the gate mutex
#[derive(Default)]
struct Waiters {
    fired: bool,
    slots: Vec<Option<Waker>>,
    vacant: Vec<usize>,
}

/// Broadcast gate shared by the readiness signal and cancel tokens
///
/// 由就绪信号和取消令牌共享的广播门
pub(crate) struct Gate {
    // Mirrors `Waiters::fired` for lock-free reads
    fired: AtomicBool,
    waiters: Mutex<Waiters>,
}

impl Gate {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
            waiters: Mutex::new(Waiters::default()),
        }
    }

    #[inline]
    pub(crate) fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Fire the gate and wake every registered waiter
    ///
    /// Returns `false` if the gate had already been fired.
    ///
    /// 触发门并唤醒所有已注册的等待者
    ///
    /// 如果门已被触发则返回 `false`。
    pub(crate) fn fire(&self) -> bool {
        let slots = {
            let mut waiters = lock(&self.waiters);
            if waiters.fired {
                return false;
            }
            waiters.fired = true;
            self.fired.store(true, Ordering::Release);
            waiters.vacant.clear();
            mem::take(&mut waiters.slots)
        };

        // Wake outside the lock so woken tasks can re-register without contention
        for waker in slots.into_iter().flatten() {
            waker.wake();
        }
        true
    }

    /// Register `waker` under `key`, allocating a slot on first use.
    ///
    /// Returns `true` if the gate has already fired; nothing is stored then.
    pub(crate) fn register(&self, key: &mut Option<usize>, waker: &Waker) -> bool {
        if self.is_fired() {
            return true;
        }

        let mut waiters = lock(&self.waiters);
        // Re-check under the lock: a fire between the two checks must not be missed
        if waiters.fired {
            return true;
        }

        match *key {
            Some(index) => match &mut waiters.slots[index] {
                Some(existing) if existing.will_wake(waker) => {}
                slot => *slot = Some(waker.clone()),
            },
            None => {
                let index = match waiters.vacant.pop() {
                    Some(index) => {
                        waiters.slots[index] = Some(waker.clone());
                        index
                    }
                    None => {
                        waiters.slots.push(Some(waker.clone()));
                        waiters.slots.len() - 1
                    }
                };
                *key = Some(index);
            }
        }
        false
    }

    /// Release the slot behind `key`. No-op once fired, as firing drains every slot.
    pub(crate) fn unregister(&self, key: usize) {
        let mut waiters = lock(&self.waiters);
        if waiters.fired {
            return;
        }
        if let Some(slot) = waiters.slots.get_mut(key) {
            if slot.take().is_some() {
                waiters.vacant.push(key);
            }
        }
    }

    #[cfg(all(test, not(feature = "loom")))]
    fn registered(&self) -> usize {
        lock(&self.waiters).slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("fired", &self.is_fired())
            .finish_non_exhaustive()
    }
}

/// One waiter's registration on a gate. Unregisters on drop.
pub(crate) struct Wait {
    gate: Arc<Gate>,
    key: Option<usize>,
}

impl Wait {
    #[inline]
    pub(crate) fn new(gate: Arc<Gate>) -> Self {
        Self { gate, key: None }
    }

    #[inline]
    pub(crate) fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    pub(crate) fn poll_fired(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        if self.gate.register(&mut self.key, cx.waker()) {
            // Firing drained our slot along with every other
            self.key = None;
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl Drop for Wait {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.gate.unregister(key);
        }
    }
}

impl fmt::Debug for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("gate", &self.gate)
            .field("registered", &self.key.is_some())
            .finish()
    }
}

/// Readiness signal of a [`Future`](crate::Future)
///
/// Fires exactly once, when the future is resolved, and stays fired forever.
/// `Ready` is not generic over the result type, so signals of differently
/// typed futures can be awaited side by side, for example in `tokio::select!`.
///
/// [`Future`](crate::Future) 的就绪信号
///
/// 在 future 被解决时恰好触发一次，并永久保持触发状态。`Ready` 不依赖结果类型，
/// 因此可以同时等待不同类型 future 的信号，例如在 `tokio::select!` 中。
///
/// # Example
///
/// ```
/// use lite_future::Future;
///
/// # tokio_test::block_on(async {
/// let (fut, completer) = Future::<u32, ()>::new();
/// let ready = fut.ready();
/// assert!(!ready.is_fired());
///
/// completer.resolve(7);
/// ready.await;
/// assert!(fut.ready().is_fired());
/// # });
/// ```
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Ready {
    wait: Wait,
}

impl Ready {
    #[inline]
    pub(crate) fn new(gate: Arc<Gate>) -> Self {
        Self { wait: Wait::new(gate) }
    }

    /// Whether the future has been resolved
    ///
    /// future 是否已被解决
    #[inline]
    pub fn is_fired(&self) -> bool {
        self.wait.gate().is_fired()
    }
}

impl Clone for Ready {
    fn clone(&self) -> Self {
        Self::new(self.wait.gate().clone())
    }
}

impl Future for Ready {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.get_mut().wait.poll_fired(cx)
    }
}

impl fmt::Debug for Ready {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ready")
            .field("fired", &self.is_fired())
            .finish()
    }
}
