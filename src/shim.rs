//! Shim module to abstract over std and loom primitives.
//!
//! Everything that takes part in cross-thread synchronization goes through
//! here, so the `loom` feature can model-check the whole crate.
//!
//! 在 std 与 loom 原语之间切换的垫片模块。

#[cfg(not(feature = "loom"))]
pub mod atomic {
    pub use core::sync::atomic::*;
}

#[cfg(feature = "loom")]
pub mod atomic {
    pub use loom::sync::atomic::*;
}

#[cfg(not(feature = "loom"))]
pub mod cell {
    #[derive(Debug)]
    #[repr(transparent)]
    pub struct UnsafeCell<T: ?Sized>(core::cell::UnsafeCell<T>);

    impl<T> UnsafeCell<T> {
        #[inline]
        pub const fn new(data: T) -> UnsafeCell<T> {
            UnsafeCell(core::cell::UnsafeCell::new(data))
        }
    }

    impl<T: ?Sized> UnsafeCell<T> {
        #[inline]
        pub fn with<F, R>(&self, f: F) -> R
        where
            F: FnOnce(*const T) -> R,
        {
            f(self.0.get())
        }

        #[inline]
        pub fn with_mut<F, R>(&self, f: F) -> R
        where
            F: FnOnce(*mut T) -> R,
        {
            f(self.0.get())
        }
    }
}

#[cfg(feature = "loom")]
pub mod cell {
    pub use loom::cell::UnsafeCell;
}

#[cfg(not(feature = "loom"))]
pub mod sync {
    pub use std::sync::{Arc, Mutex, MutexGuard};

    /// Lock ignoring poison. User code never runs while one of our locks is held.
    #[inline]
    pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(feature = "loom")]
pub mod sync {
    pub use loom::sync::{Arc, Mutex, MutexGuard};

    #[inline]
    pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(not(feature = "loom"))]
pub mod thread {
    pub use std::thread::{current, park, park_timeout, Thread};
}

#[cfg(feature = "loom")]
pub mod thread {
    pub use loom::thread::{current, park, Thread};

    /// loom has no timed park; a spurious return is allowed by the contract.
    #[inline]
    pub fn park_timeout(_dur: std::time::Duration) {
        loom::thread::yield_now();
    }
}
