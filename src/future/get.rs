//! The cancellable fetch future.

use std::fmt;
use std::future::Future as StdFuture;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;

use super::error::GetError;
use super::Future;
use crate::cancel::Cancelled;
use crate::gate::Wait;

pin_project! {
    /// Future returned by [`Future::get`]
    ///
    /// Completes with the resolved result, or with the cancellation reason if
    /// the signal fires first. An already resolved future completes on the
    /// first poll without polling the signal at all.
    ///
    /// [`Future::get`] 返回的 future
    ///
    /// 以解决后的结果完成；若信号先触发，则以取消原因完成。
    /// 已解决的 future 在首次轮询时完成，完全不轮询信号。
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Get<'a, T, E, C> {
        future: &'a Future<T, E>,
        wait: Wait,
        #[pin]
        cancel: C,
    }
}

impl<'a, T, E, C> Get<'a, T, E, C> {
    #[inline]
    pub(super) fn new(future: &'a Future<T, E>, cancel: C) -> Self {
        Self {
            future,
            wait: Wait::new(future.shared.gate.clone()),
            cancel,
        }
    }
}

impl<T, E, C> StdFuture for Get<'_, T, E, C>
where
    T: Clone,
    E: Clone,
    C: StdFuture<Output = Cancelled>,
{
    type Output = Result<T, GetError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        // Fast path: already resolved, the signal is never consulted
        if let Some(result) = this.future.shared.result.get() {
            return Poll::Ready(owned(result));
        }

        // Slow path: register, then the gate re-checks under its lock
        if this.wait.poll_fired(cx).is_ready() {
            if let Some(result) = this.future.shared.result.get() {
                return Poll::Ready(owned(result));
            }
        }

        match this.cancel.poll(cx) {
            Poll::Ready(reason) => {
                // A resolution that became visible meanwhile still wins
                match this.future.shared.result.get() {
                    Some(result) => Poll::Ready(owned(result)),
                    None => Poll::Ready(Err(GetError::Cancelled(reason))),
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E, C> fmt::Debug for Get<'_, T, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Get").finish_non_exhaustive()
    }
}

#[inline]
pub(super) fn owned<T: Clone, E: Clone>(result: &Result<T, E>) -> Result<T, GetError<E>> {
    match result {
        Ok(value) => Ok(value.clone()),
        Err(err) => Err(GetError::Failed(err.clone())),
    }
}
