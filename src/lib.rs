//! # lite-future
//!
//! Lightweight single-shot future/promise for Rust.
//!
//! 轻量级的 Rust 单次 future/promise。
//!
//! ## Overview / 概述
//!
//! A [`Future`] holds a `Result<T, E>` that a producer sets exactly once
//! through its paired [`Completer`]. Any number of consumers, on any number of
//! threads or tasks, can share the handle and observe the same result.
//!
//! [`Future`] 持有一个 `Result<T, E>`，由生产者通过配对的 [`Completer`]
//! 恰好设置一次。任意数量的消费者可以在任意线程或任务上共享该句柄并观察同一结果。
//!
//! ## Key Features / 主要特性
//!
//! - **First completion wins**: later completions are silently discarded
//! - **Cancellable fetch**: await the result against any cancellation signal
//! - **Blocking fetch**: park a plain thread, with optional token and deadline
//! - **Readiness signal**: an untyped, single-fire [`Ready`] for multiplexed waiting
//! - **Callbacks**: delivered exactly once, in registration order
//! - **Lock-free reads**: once resolved, reading the result takes no locks
//!
//! - **首次完成生效**：之后的完成被静默丢弃
//! - **可取消的获取**：针对任意取消信号等待结果
//! - **阻塞获取**：阻塞普通线程，可选令牌和截止时间
//! - **就绪信号**：无类型、单次触发的 [`Ready`]，用于多路等待
//! - **回调**：按注册顺序恰好投递一次
//! - **无锁读取**：解决后读取结果无需加锁
//!
//! ## Modules / 模块
//!
//! ### [`future`]
//!
//! [`Future`], [`Completer`] and the [`Get`] fetch future.
//!
//! ### [`cancel`]
//!
//! Cancellation signals: [`CancelToken`], [`Deadline`](cancel::Deadline) and
//! [`never`](cancel::never). Any `std::future::Future<Output = Cancelled>`
//! works as a signal.
//!
//! 取消信号。任何 `std::future::Future<Output = Cancelled>` 都可以作为信号。
//!
//! ### [`call`](call())
//!
//! Runs a blocking function in the background and resolves a future with its
//! result.
//!
//! ## Examples / 示例
//!
//! ### Fetch with a deadline
//!
//! ```
//! use lite_future::{cancel, Future};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let (fut, completer) = Future::<&str, ()>::new();
//!
//! tokio::spawn(async move {
//!     completer.resolve("Hello");
//! });
//!
//! let value = fut.get(cancel::timeout(Duration::from_millis(500))).await;
//! assert_eq!(value, Ok("Hello"));
//! # });
//! ```
//!
//! ### Callback
//!
//! ```
//! use lite_future::Future;
//! use std::sync::{Arc, Mutex};
//!
//! let (fut, completer) = Future::<u32, String>::new();
//! let seen = Arc::new(Mutex::new(None));
//!
//! let sink = seen.clone();
//! fut.listen(move |result| *sink.lock().unwrap() = Some(result.copied().map_err(|e| e.clone())));
//!
//! completer.resolve(42);
//! assert_eq!(*seen.lock().unwrap(), Some(Ok(42)));
//! ```
//!
//! ### Sync function as async
//!
//! ```
//! use lite_future::{call, cancel};
//!
//! # tokio_test::block_on(async {
//! let fut = call(|| Ok::<_, ()>("Hello World!"));
//! assert_eq!(fut.get(cancel::never()).await, Ok("Hello World!"));
//! # });
//! ```
//!
//! ## Safety / 安全性
//!
//! The result cell uses `unsafe` internally and exposes a safe API. The value
//! is written once by the completer that wins an atomic state transition and
//! only read after the published state is observed. The `loom` feature swaps
//! every synchronization primitive for its model-checked counterpart.
//!
//! 结果单元在内部使用 `unsafe`，但暴露安全的 API。值只由赢得原子状态转换的完成者
//! 写入一次，并且仅在观察到发布状态后才被读取。

pub mod call;
pub mod cancel;
pub mod future;
mod gate;
mod park;
mod shim;

pub use crate::call::{call, call_with, Job};
pub use crate::cancel::{CancelToken, Cancelled};
pub use crate::future::{pair, Completer, Future, Get, GetError};
pub use crate::gate::Ready;
