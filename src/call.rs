//! Run a blocking function in the background and expose its result as a [`Future`].
//!
//! 在后台运行阻塞函数，并以 [`Future`] 的形式暴露其结果。

use crate::future::Future;

/// Unit of work handed to a spawner by [`call_with`]
///
/// 由 [`call_with`] 交给调度器的工作单元
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Run `f` on a new OS thread and resolve the returned future with its result
///
/// The function always runs to completion; cancelling a fetch on the future
/// only stops that waiter. If `f` panics the future is never resolved.
///
/// 在新的操作系统线程上运行 `f`，并以其结果解决返回的 future
///
/// 函数总会运行至完成；取消对 future 的获取只会停止该等待者。
/// 如果 `f` panic，future 将永远不会被解决。
///
/// # Example
///
/// ```
/// use lite_future::call;
///
/// let fut = call(|| Ok::<_, ()>("Hello World!"));
/// assert_eq!(fut.blocking_get(), Ok("Hello World!"));
/// ```
pub fn call<T, E, F>(f: F) -> Future<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    call_with(
        |job| {
            std::thread::spawn(job);
        },
        f,
    )
}

/// Like [`call`], but `spawn` decides where the work runs
///
/// `spawn` receives the job and must eventually run it, for example on a
/// thread pool or with `tokio::task::spawn_blocking`.
///
/// 与 [`call`] 相同，但由 `spawn` 决定工作在何处运行
///
/// # Example
///
/// ```
/// use lite_future::{call_with, cancel};
///
/// # tokio_test::block_on(async {
/// let fut = call_with(
///     |job| {
///         tokio::task::spawn_blocking(job);
///     },
///     || Ok::<_, ()>(6 * 7),
/// );
/// assert_eq!(fut.get(cancel::never()).await, Ok(42));
/// # });
/// ```
pub fn call_with<T, E, F, S>(spawn: S, f: F) -> Future<T, E>
where
    S: FnOnce(Job),
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let (future, completer) = Future::new();
    spawn(Box::new(move || {
        completer.complete(f());
    }));
    future
}
