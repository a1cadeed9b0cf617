//! Write-once result cell.
//!
//! 一次写入的结果单元。

use std::mem::MaybeUninit;

use crate::shim::atomic::{AtomicU8, Ordering};
use crate::shim::cell::UnsafeCell;

// States for the result cell
const EMPTY: u8 = 0; // No result stored
const WRITING: u8 = 1; // A completer won the race and is writing
const READY: u8 = 2; // Result is published and immutable

/// Storage for the resolved `Result<T, E>`
///
/// The atomic state is the resolution latch: the first completer moves it
/// from `EMPTY` to `WRITING`, every other completer loses. Once `READY`, the
/// value is never written again and shared borrows need no locking.
///
/// 解决后的 `Result<T, E>` 的存储
///
/// 原子状态即解决闩锁：第一个完成者将其从 `EMPTY` 转为 `WRITING`，
/// 其余完成者均失败。一旦变为 `READY`，值不再被写入，共享借用无需加锁。
pub(crate) struct ResultCell<T, E> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<Result<T, E>>>,
}

// SAFETY: the value is written once, by the single thread that won the
// EMPTY -> WRITING transition, and only read after READY is observed with
// Acquire ordering. Readers on any thread get `&Result<T, E>`, so sharing
// needs `T: Sync`; the last owner may drop it anywhere, so it needs `T: Send`.
unsafe impl<T: Send, E: Send> Send for ResultCell<T, E> {}
unsafe impl<T: Send + Sync, E: Send + Sync> Sync for ResultCell<T, E> {}

impl<T, E> ResultCell<T, E> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Store `result` if nothing has been stored yet
    ///
    /// Hands `result` back if another call got there first.
    pub(crate) fn store(&self, result: Result<T, E>) -> Result<(), Result<T, E>> {
        if self
            .state
            .compare_exchange(EMPTY, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(result);
        }

        // SAFETY: winning the CAS grants exclusive write access
        self.value.with_mut(|v| unsafe { (*v).write(result) });
        self.state.store(READY, Ordering::Release);
        Ok(())
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&Result<T, E>> {
        if self.state.load(Ordering::Acquire) == READY {
            // SAFETY: READY means initialized and never written again
            Some(self.value.with(|v| unsafe { (*v).assume_init_ref() }))
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }
}

impl<T, E> Drop for ResultCell<T, E> {
    fn drop(&mut self) {
        if self.state.load(Ordering::Acquire) == READY {
            self.value.with_mut(|v| unsafe {
                (*v).assume_init_drop();
            });
        }
    }
}
