//! Fetch error type.

use crate::cancel::Cancelled;

/// Error returned by [`Future::get`](crate::Future::get) and the blocking fetches
///
/// `Failed` carries the producer's own error verbatim; `Cancelled` means the
/// caller's signal fired first and says nothing about the producer.
///
/// [`Future::get`](crate::Future::get) 及阻塞获取返回的错误
///
/// `Failed` 原样携带生产者的错误；`Cancelled` 表示调用方的信号先触发，与生产者无关。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum GetError<E> {
    /// The future resolved with an error
    ///
    /// future 以错误解决
    #[error("producer failed: {0}")]
    Failed(E),
    /// The cancellation signal fired before resolution
    ///
    /// 取消信号在解决之前触发
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl<E> GetError<E> {
    /// Whether the wait was abandoned rather than the producer failing
    ///
    /// 等待是否被放弃（而非生产者失败）
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GetError::Cancelled(_))
    }

    /// The cancellation reason, if the wait was abandoned
    ///
    /// 若等待被放弃，返回取消原因
    #[inline]
    pub fn cancelled(&self) -> Option<Cancelled> {
        match self {
            GetError::Cancelled(reason) => Some(*reason),
            GetError::Failed(_) => None,
        }
    }

    /// The producer's error, if the future resolved with one
    ///
    /// 若 future 以错误解决，返回生产者的错误
    #[inline]
    pub fn into_failed(self) -> Option<E> {
        match self {
            GetError::Failed(err) => Some(err),
            GetError::Cancelled(_) => None,
        }
    }
}
