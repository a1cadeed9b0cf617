//! Single-shot future with a paired completer.
//!
//! A [`Future`] is a cloneable read handle on a `Result<T, E>` that does not
//! exist yet. The paired [`Completer`] resolves it; the first completion wins
//! and every later one is discarded. Consumers can:
//!
//! - await the result with a cancellation signal ([`Future::get`])
//! - block a thread until it arrives ([`Future::blocking_get`] and friends)
//! - poll without waiting ([`Future::try_get`])
//! - wait on the readiness signal ([`Future::ready`])
//! - register a callback ([`Future::listen`])
//!
//! 带有配对完成者的单次 future。
//!
//! [`Future`] 是对尚不存在的 `Result<T, E>` 的可克隆读取句柄。
//! 配对的 [`Completer`] 负责解决它；第一次完成生效，之后的完成均被丢弃。
//!
//! # Example
//!
//! ```
//! use lite_future::{cancel, Future};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let (fut, completer) = Future::<String, String>::new();
//!
//! tokio::spawn(async move {
//!     completer.resolve("Hello".to_string());
//! });
//!
//! let value = fut.get(cancel::timeout(Duration::from_secs(1))).await.unwrap();
//! assert_eq!(value, "Hello");
//! # });
//! ```

use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::gate::{Gate, Ready};
use crate::park;
use crate::shim::sync::{lock, Arc, Mutex};

mod cell;
pub mod error;
mod get;

use self::cell::ResultCell;
pub use self::error::GetError;
pub use self::get::Get;

type Listener<T, E> = Box<dyn FnOnce(Result<&T, &E>) + Send>;

/// State shared by every handle of one future
struct Shared<T, E> {
    result: ResultCell<T, E>,
    gate: Arc<Gate>,
    // Callbacks registered before resolution; emptied once by the resolver
    listeners: Mutex<Vec<Listener<T, E>>>,
}

impl<T, E> Shared<T, E> {
    fn new() -> Self {
        Self {
            result: ResultCell::new(),
            gate: Arc::new(Gate::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn complete(&self, result: Result<T, E>) -> bool {
        if self.result.store(result).is_err() {
            return false;
        }
        self.gate.fire();
        self.notify_listeners();
        true
    }

    /// Deliver the result to every listener queued before resolution
    ///
    /// The queue is taken in one go under the lock. Any `listen` that gets the
    /// lock afterwards sees the published result and runs its callback inline,
    /// so each callback runs exactly once. A panicking callback does not stop
    /// the rest of the batch; the first panic is resumed once all have run.
    fn notify_listeners(&self) {
        let Some(result) = self.result.get() else {
            return;
        };

        let batch = mem::take(&mut *lock(&self.listeners));

        let mut panicked = None;
        for listener in batch {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(result.as_ref()))) {
                panicked.get_or_insert(payload);
            }
        }
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
    }

    fn listen(&self, listener: Listener<T, E>) {
        if self.result.get().is_none() {
            let mut listeners = lock(&self.listeners);
            // Re-check under the lock: the resolver drains only after publishing
            if self.result.get().is_none() {
                listeners.push(listener);
                return;
            }
        }

        if let Some(result) = self.result.get() {
            listener(result.as_ref());
        }
    }
}

// ============================================================================
// Future
// ============================================================================

/// Read handle on a result that is resolved exactly once
///
/// Cloning is cheap and every clone observes the same result.
///
/// 对恰好解决一次的结果的读取句柄
///
/// 克隆开销很小，所有克隆观察到同一结果。
pub struct Future<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Future<T, E> {
    /// Create an unresolved future and the completer that resolves it
    ///
    /// 创建一个未解决的 future 及其完成者
    #[inline]
    pub fn new() -> (Self, Completer<T, E>) {
        let shared = Arc::new(Shared::new());
        let future = Future {
            shared: shared.clone(),
        };
        (future, Completer { shared })
    }

    /// Fetch the result, giving up when `cancel` fires
    ///
    /// If the future is already resolved the result is returned on the first
    /// poll and `cancel` is never polled, so even an already fired signal
    /// yields the result. Otherwise the fetch completes with whichever comes
    /// first. A resolution that is visible when the signal fires still wins.
    ///
    /// 获取结果，在 `cancel` 触发时放弃
    ///
    /// 如果 future 已解决，首次轮询即返回结果且从不轮询 `cancel`，
    /// 因此即使信号已触发也会得到结果。否则以先发生者为准。
    ///
    /// # Example
    ///
    /// ```
    /// use lite_future::{cancel, Cancelled, Future, GetError};
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let (fut, _completer) = Future::<u32, ()>::new();
    ///
    /// let result = fut.get(cancel::timeout(Duration::from_millis(10))).await;
    /// assert_eq!(result, Err(GetError::Cancelled(Cancelled::DeadlineExceeded)));
    /// # });
    /// ```
    #[inline]
    pub fn get<C>(&self, cancel: C) -> Get<'_, T, E, C> {
        Get::new(self, cancel)
    }

    /// Wait for the result with no cancellation
    ///
    /// 无取消地等待结果
    pub async fn wait(&self) -> Result<T, E>
    where
        T: Clone,
        E: Clone,
    {
        loop {
            if let Some(result) = self.shared.result.get() {
                return result.clone();
            }
            self.ready().await;
        }
    }

    /// Borrow the result if it is available, without waiting
    ///
    /// 若结果可用则借用它，不等待
    #[inline]
    pub fn try_get(&self) -> Option<Result<&T, &E>> {
        self.shared.result.get().map(Result::as_ref)
    }

    /// Whether the future has been resolved
    ///
    /// future 是否已被解决
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.shared.result.is_ready()
    }

    /// Readiness signal, fired once at resolution and fired forever after
    ///
    /// 就绪信号，在解决时触发一次并永久保持
    #[inline]
    pub fn ready(&self) -> Ready {
        Ready::new(self.shared.gate.clone())
    }

    /// Register a callback for the result
    ///
    /// If the future is already resolved, `f` runs right here before `listen`
    /// returns, even while the completing thread is still running earlier
    /// callbacks. Otherwise it is queued and run once by the completing
    /// thread, in registration order.
    ///
    /// 为结果注册回调
    ///
    /// 若 future 已解决，`f` 在 `listen` 返回前立即执行，即使完成线程仍在执行
    /// 先前的回调。否则入队，由完成线程按注册顺序执行一次。
    ///
    /// # Example
    ///
    /// ```
    /// use lite_future::Future;
    /// use std::sync::mpsc;
    ///
    /// let (fut, completer) = Future::<&str, ()>::new();
    /// let (tx, rx) = mpsc::channel();
    ///
    /// fut.listen(move |result| tx.send(result.copied().map_err(|e| *e)).unwrap());
    /// completer.resolve("Hello");
    ///
    /// assert_eq!(rx.recv().unwrap(), Ok("Hello"));
    /// ```
    pub fn listen<F>(&self, f: F)
    where
        F: FnOnce(Result<&T, &E>) + Send + 'static,
    {
        self.shared.listen(Box::new(f));
    }

    /// Block the current thread until the result is available
    ///
    /// This method is intended for use in synchronous code.
    ///
    /// 阻塞当前线程直到结果可用
    ///
    /// 此方法用于同步代码中。
    pub fn blocking_get(&self) -> Result<T, E>
    where
        T: Clone,
        E: Clone,
    {
        loop {
            if let Some(result) = self.shared.result.get() {
                return result.clone();
            }
            // Without a cancel gate or deadline the wait only ends on resolution
            let _ = park::wait(&self.shared.gate, None, None);
        }
    }

    /// Block the current thread for at most `timeout`
    ///
    /// 阻塞当前线程最多 `timeout` 时长
    pub fn blocking_get_timeout(&self, timeout: Duration) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        self.blocking_get_with(None, Some(Instant::now() + timeout))
    }

    /// Block the current thread until resolution, `token` cancellation, or `deadline`
    ///
    /// A resolution visible at the moment the wait ends always wins.
    ///
    /// 阻塞当前线程直到解决、`token` 取消或到达 `deadline`
    pub fn blocking_get_with(
        &self,
        token: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        loop {
            if let Some(result) = self.shared.result.get() {
                return get::owned(result);
            }

            let cancel = token.map(CancelToken::gate);
            if let Err(reason) = park::wait(&self.shared.gate, cancel, deadline) {
                // A resolution visible at this point still wins
                return match self.shared.result.get() {
                    Some(result) => get::owned(result),
                    None => Err(GetError::Cancelled(reason)),
                };
            }
        }
    }
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Completer
// ============================================================================

/// Capability to resolve a [`Future`]
///
/// Only the first completion across all clones takes effect; the rest are
/// silently discarded and report `false`. Dropping every completer without
/// completing leaves the future unresolved.
///
/// 解决 [`Future`] 的能力
///
/// 所有克隆中只有第一次完成生效；其余的被静默丢弃并返回 `false`。
/// 丢弃所有完成者而未完成，future 将保持未解决状态。
pub struct Completer<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Completer<T, E> {
    /// Resolve the future with `result`
    ///
    /// Fires the readiness signal, wakes every fetch, then runs the
    /// registered callbacks on this thread in registration order. Returns
    /// `false`, and drops `result`, if the future was already resolved.
    ///
    /// If a callback panics, the remaining callbacks still run and the first
    /// panic is resumed afterwards.
    ///
    /// 以 `result` 解决 future
    ///
    /// 触发就绪信号，唤醒所有获取，然后在当前线程按注册顺序执行已注册的回调。
    /// 如果 future 已被解决，则丢弃 `result` 并返回 `false`。
    /// 若回调发生 panic，其余回调仍会执行，之后再重新抛出第一个 panic。
    #[inline]
    pub fn complete(&self, result: Result<T, E>) -> bool {
        self.shared.complete(result)
    }

    /// Resolve with a value; shorthand for `complete(Ok(value))`
    ///
    /// 以值解决；等同于 `complete(Ok(value))`
    #[inline]
    pub fn resolve(&self, value: T) -> bool {
        self.complete(Ok(value))
    }

    /// Resolve with an error; shorthand for `complete(Err(err))`
    ///
    /// 以错误解决；等同于 `complete(Err(err))`
    #[inline]
    pub fn reject(&self, err: E) -> bool {
        self.complete(Err(err))
    }

    /// Whether some completion has already won
    ///
    /// 是否已有完成生效
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.shared.result.is_ready()
    }

    /// Another read handle on the future this completer resolves
    ///
    /// 获取此完成者所解决的 future 的另一个读取句柄
    #[inline]
    pub fn future(&self) -> Future<T, E> {
        Future {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> Clone for Completer<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Completer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("completed", &self.is_completed())
            .finish_non_exhaustive()
    }
}

/// Create an unresolved future and its completer
///
/// Same as [`Future::new`].
///
/// 创建一个未解决的 future 及其完成者，等同于 [`Future::new`]。
#[inline]
pub fn pair<T, E>() -> (Future<T, E>, Completer<T, E>) {
    Future::new()
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::cancel::{self, Cancelled};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn test_get_immediate() {
        let (fut, completer) = Future::<String, ()>::new();
        completer.resolve("Hello".to_string());

        let result = fut.get(cancel::never()).await;
        assert_eq!(result, Ok("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_get_ignores_fired_signal_when_resolved() {
        let (fut, completer) = Future::<&str, ()>::new();
        completer.resolve("Hello");

        let result = fut.get(std::future::ready(Cancelled::DeadlineExceeded)).await;
        assert_eq!(result, Ok("Hello"));
    }

    #[tokio::test]
    async fn test_get_async() {
        let (fut, completer) = Future::<&str, ()>::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            completer.resolve("Hello");
        });

        let result = fut.get(cancel::timeout(Duration::from_millis(500))).await;
        assert_eq!(result, Ok("Hello"));
    }

    #[tokio::test]
    async fn test_get_error() {
        let (fut, completer) = Future::<u32, String>::new();
        completer.reject("boom".to_string());

        let result = fut.get(cancel::never()).await;
        assert_eq!(result, Err(GetError::Failed("boom".to_string())));
    }

    #[tokio::test]
    async fn test_get_repeatedly() {
        let (fut, completer) = Future::<u32, ()>::new();
        completer.resolve(5);

        for _ in 0..3 {
            assert_eq!(fut.get(cancel::never()).await, Ok(5));
        }
        assert_eq!(fut.wait().await, Ok(5));
    }

    #[tokio::test]
    async fn test_get_token_cancelled() {
        let (fut, _completer) = Future::<u32, ()>::new();
        let token = CancelToken::new();
        let remote = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            remote.cancel();
        });

        let result = fut.get(token.cancelled()).await;
        assert_eq!(result, Err(GetError::Cancelled(Cancelled::Requested)));
        assert!(!fut.is_ready());
    }

    #[tokio::test]
    async fn test_cancelled_fetch_leaves_other_waiters() {
        let (fut, completer) = Future::<u32, ()>::new();
        let other = fut.clone();
        let waiter = tokio::spawn(async move { other.wait().await });

        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            fut.get(token.cancelled()).await,
            Err(GetError::Cancelled(Cancelled::Requested))
        );

        completer.resolve(9);
        assert_eq!(waiter.await.unwrap(), Ok(9));
    }

    #[test]
    fn test_try_get() {
        let (fut, completer) = Future::<u32, ()>::new();
        assert_eq!(fut.try_get(), None);
        assert!(!fut.is_ready());

        completer.resolve(1);
        assert_eq!(fut.try_get(), Some(Ok(&1)));
        assert!(fut.is_ready());
    }

    #[test]
    fn test_complete_first_wins() {
        let (fut, completer) = Future::<&str, &str>::new();
        let late = completer.clone();

        assert!(completer.resolve("first"));
        assert!(!late.resolve("second"));
        assert!(!late.reject("third"));

        assert_eq!(fut.try_get(), Some(Ok(&"first")));
        assert!(late.is_completed());
    }

    #[test]
    fn test_listen_before_resolve() {
        let (fut, completer) = Future::<u32, ()>::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));

        for i in 0..5 {
            let seen = seen.clone();
            fut.listen(move |result| seen.lock().unwrap().push((i, result.copied().map_err(|e| *e))));
        }
        assert!(seen.lock().unwrap().is_empty());

        completer.resolve(7);
        let seen = seen.lock().unwrap();
        assert_eq!(*seen, (0..5).map(|i| (i, Ok(7))).collect::<Vec<_>>());
    }

    #[test]
    fn test_listen_after_resolve_runs_inline() {
        let (fut, completer) = Future::<u32, String>::new();
        completer.reject("boom".to_string());

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        fut.listen(move |result| {
            assert_eq!(result, Err(&"boom".to_string()));
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listen_not_called_twice() {
        let (fut, completer) = Future::<u32, ()>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        fut.listen(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        completer.resolve(1);
        completer.resolve(2);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listen_reentrant() {
        let (fut, completer) = Future::<u32, ()>::new();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let inner_fut = fut.clone();
        let inner_order = order.clone();
        fut.listen(move |_| {
            inner_order.lock().unwrap().push("outer");
            let nested = inner_order.clone();
            inner_fut.listen(move |_| nested.lock().unwrap().push("nested"));
        });

        let tail = order.clone();
        fut.listen(move |_| tail.lock().unwrap().push("second"));

        completer.resolve(1);
        assert_eq!(*order.lock().unwrap(), vec!["outer", "nested", "second"]);
    }

    #[test]
    fn test_listen_panic_does_not_drop_others() {
        let (fut, completer) = Future::<u32, ()>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        fut.listen(|_| panic!("listener failed"));
        let counter = calls.clone();
        fut.listen(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let resolved = std::panic::catch_unwind(AssertUnwindSafe(|| completer.resolve(4)));
        assert!(resolved.is_err());
        assert!(fut.is_ready());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        let counter = calls.clone();
        fut.listen(move |result| {
            assert_eq!(result, Ok(&4));
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_blocking_get_immediate() {
        let (fut, completer) = Future::<u32, ()>::new();
        completer.resolve(42);
        assert_eq!(fut.blocking_get(), Ok(42));
    }

    #[test]
    fn test_blocking_get_with_thread() {
        let (fut, completer) = Future::<String, ()>::new();

        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            completer.resolve("hello".to_string());
        });

        assert_eq!(fut.blocking_get(), Ok("hello".to_string()));
    }

    #[test]
    fn test_blocking_get_timeout() {
        let (fut, _completer) = Future::<u32, ()>::new();
        let start = Instant::now();

        let result = fut.blocking_get_timeout(Duration::from_millis(50));
        assert_eq!(result, Err(GetError::Cancelled(Cancelled::DeadlineExceeded)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_blocking_get_resolved_beats_cancelled_token() {
        let (fut, completer) = Future::<u32, ()>::new();
        completer.resolve(3);

        let token = CancelToken::new();
        token.cancel();
        assert_eq!(fut.blocking_get_with(Some(&token), Some(Instant::now())), Ok(3));
    }

    #[test]
    fn test_blocking_get_token() {
        let (fut, _completer) = Future::<u32, ()>::new();
        let token = CancelToken::new();
        let remote = token.clone();

        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            remote.cancel();
        });

        assert_eq!(
            fut.blocking_get_with(Some(&token), None),
            Err(GetError::Cancelled(Cancelled::Requested))
        );
    }

    #[tokio::test]
    async fn test_ready_signal() {
        let (fut, completer) = pair::<u32, ()>();
        let ready = fut.ready();
        assert!(!ready.is_fired());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            completer.resolve(1);
        });

        ready.await;
        assert!(fut.ready().is_fired());
        assert!(fut.is_ready());
    }

    #[test]
    fn test_completer_future_handle() {
        let (_fut, completer) = Future::<u32, ()>::new();
        let other = completer.future();
        completer.resolve(8);
        assert_eq!(other.try_get(), Some(Ok(&8)));
    }
}
