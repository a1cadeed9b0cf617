//! Cancellation signals for [`Future::get`](crate::Future::get).
//!
//! A cancellation signal is any `std::future::Future<Output = Cancelled>`
//! owned by the caller. It fires at most once and yields the reason the wait
//! was abandoned. This module ships the common ones: a manual
//! [`CancelToken`], a timer-backed [`Deadline`], and [`never`].
//!
//! 用于 [`Future::get`](crate::Future::get) 的取消信号。
//!
//! 取消信号是调用方持有的任意 `std::future::Future<Output = Cancelled>`。
//! 它最多触发一次，并给出放弃等待的原因。

use std::fmt;
use std::future::{self, Future, Pending};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use pin_project_lite::pin_project;

use crate::gate::{Gate, Wait};
use crate::shim::sync::Arc;

/// Reason a fetch stopped waiting before the future was resolved
///
/// 在 future 被解决之前停止等待的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Cancelled {
    /// A [`CancelToken`] was cancelled
    ///
    /// [`CancelToken`] 被取消
    #[error("operation cancelled")]
    Requested,
    /// The deadline elapsed
    ///
    /// 截止时间已过
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// A signal that never fires
///
/// 永不触发的信号
pub type Never = Pending<Cancelled>;

/// Cancellation signal that never fires, for fetches that wait unconditionally
///
/// 永不触发的取消信号，用于无条件等待的获取
#[inline]
pub fn never() -> Never {
    future::pending()
}

// ============================================================================
// CancelToken
// ============================================================================

/// Manually triggered cancellation signal
///
/// Clones share the same state: cancelling any clone cancels them all.
///
/// 手动触发的取消信号
///
/// 克隆共享同一状态：取消任意一个克隆即取消全部。
///
/// # Example
///
/// ```
/// use lite_future::{CancelToken, Cancelled, Future, GetError};
///
/// # tokio_test::block_on(async {
/// let (fut, _completer) = Future::<u32, ()>::new();
/// let token = CancelToken::new();
/// token.cancel();
///
/// let result = fut.get(token.cancelled()).await;
/// assert_eq!(result, Err(GetError::Cancelled(Cancelled::Requested)));
/// # });
/// ```
#[derive(Clone)]
pub struct CancelToken {
    gate: Arc<Gate>,
}

impl CancelToken {
    /// Create a token that has not been cancelled
    ///
    /// 创建一个尚未取消的令牌
    #[inline]
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Gate::new()),
        }
    }

    /// Fire the token, waking every pending [`OnCancel`]
    ///
    /// Returns `false` if the token had already been cancelled.
    ///
    /// 触发令牌，唤醒所有等待中的 [`OnCancel`]
    ///
    /// 如果令牌已被取消则返回 `false`。
    #[inline]
    pub fn cancel(&self) -> bool {
        self.gate.fire()
    }

    /// Whether the token has been cancelled
    ///
    /// 令牌是否已被取消
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.gate.is_fired()
    }

    /// Signal that completes with [`Cancelled::Requested`] once cancelled
    ///
    /// 取消后以 [`Cancelled::Requested`] 完成的信号
    #[inline]
    pub fn cancelled(&self) -> OnCancel {
        OnCancel {
            wait: Wait::new(self.gate.clone()),
        }
    }

    #[inline]
    pub(crate) fn gate(&self) -> &Gate {
        &self.gate
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Future returned by [`CancelToken::cancelled`]
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct OnCancel {
    wait: Wait,
}

impl Future for OnCancel {
    type Output = Cancelled;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Cancelled> {
        self.get_mut()
            .wait
            .poll_fired(cx)
            .map(|()| Cancelled::Requested)
    }
}

// ============================================================================
// Deadline
// ============================================================================

pin_project! {
    /// Cancellation signal that fires at a fixed instant
    ///
    /// Backed by the Tokio timer.
    ///
    /// # Panics
    ///
    /// Creating a `Deadline` outside a Tokio runtime with the time driver
    /// enabled panics, exactly like `tokio::time::sleep`.
    ///
    /// 在固定时刻触发的取消信号
    ///
    /// 基于 Tokio 计时器。
    #[derive(Debug)]
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Deadline {
        #[pin]
        sleep: tokio::time::Sleep,
        at: Instant,
    }
}

impl Deadline {
    /// Signal that fires at `at`
    ///
    /// Must be called inside a Tokio runtime with the time driver enabled.
    ///
    /// 在 `at` 时刻触发的信号
    ///
    /// 必须在启用了时间驱动的 Tokio 运行时中调用。
    pub fn at(at: Instant) -> Self {
        Self {
            sleep: tokio::time::sleep_until(tokio::time::Instant::from_std(at)),
            at,
        }
    }

    /// Signal that fires once `timeout` has elapsed from now
    ///
    /// 从现在起经过 `timeout` 后触发的信号
    pub fn after(timeout: Duration) -> Self {
        let at = Instant::now() + timeout;
        Self::at(at)
    }

    /// The instant this signal fires at
    ///
    /// 此信号触发的时刻
    #[inline]
    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Whether the instant has passed
    ///
    /// 是否已到达该时刻
    #[inline]
    pub fn is_elapsed(&self) -> bool {
        self.sleep.is_elapsed() || Instant::now() >= self.at
    }
}

impl Future for Deadline {
    type Output = Cancelled;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Cancelled> {
        self.project()
            .sleep
            .poll(cx)
            .map(|()| Cancelled::DeadlineExceeded)
    }
}

/// Shorthand for [`Deadline::at`]
///
/// [`Deadline::at`] 的简写
#[inline]
pub fn deadline(at: Instant) -> Deadline {
    Deadline::at(at)
}

/// Shorthand for [`Deadline::after`]
///
/// [`Deadline::after`] 的简写
#[inline]
pub fn timeout(timeout: Duration) -> Deadline {
    Deadline::after(timeout)
}
