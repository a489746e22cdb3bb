// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Abstractions over tasks that can be used natively or on the Web.
 */

use std::future::Future;

use futures::{
    future::{AbortHandle, Abortable},
    Stream,
};

#[cfg(not(web))]
mod implementation {
    use futures::StreamExt as _;

    use super::*;

    /// Types that can be moved into a background task.
    /// On the Web, tasks run on the current thread and every type qualifies.
    pub trait MaybeSend: Send {}

    impl<T: Send + ?Sized> MaybeSend for T {}

    /// Types that can be shared with a background task.
    pub trait MaybeSync: Sync {}

    impl<T: Sync + ?Sized> MaybeSync for T {}

    /// A boxed stream that can be handed to a background task.
    pub type BoxStream<'a, T> = futures::stream::BoxStream<'a, T>;

    /// Boxes a stream into a [`BoxStream`].
    pub fn boxed<'a, S: Stream + Send + 'a>(stream: S) -> BoxStream<'a, S::Item> {
        stream.boxed()
    }

    /// Spawns a new task, potentially on the current thread.
    pub(super) fn spawn<F: Future<Output = ()> + Send + 'static>(future: F) {
        tokio::task::spawn(future);
    }
}

#[cfg(web)]
mod implementation {
    use futures::StreamExt as _;

    use super::*;

    /// Types that can be moved into a background task.
    /// On the Web, tasks run on the current thread and every type qualifies.
    pub trait MaybeSend {}

    impl<T: ?Sized> MaybeSend for T {}

    /// Types that can be shared with a background task.
    pub trait MaybeSync {}

    impl<T: ?Sized> MaybeSync for T {}

    /// A boxed stream that can be handed to a background task.
    pub type BoxStream<'a, T> = futures::stream::LocalBoxStream<'a, T>;

    /// Boxes a stream into a [`BoxStream`].
    pub fn boxed<'a, S: Stream + 'a>(stream: S) -> BoxStream<'a, S::Item> {
        stream.boxed_local()
    }

    /// Spawns a new task on the current thread.
    pub(super) fn spawn<F: Future<Output = ()> + 'static>(future: F) {
        wasm_bindgen_futures::spawn_local(future);
    }
}

pub use implementation::*;

/// A background task that is aborted as soon as its guard is dropped.
#[derive(Debug)]
pub struct TaskGuard(AbortHandle);

impl TaskGuard {
    /// Spawns `future` in the background, returning the guard that keeps it alive.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + MaybeSend + 'static,
    {
        let (handle, registration) = AbortHandle::new_pair();
        let task = Abortable::new(future, registration);
        implementation::spawn(async move {
            if task.await.is_err() {
                tracing::trace!("background task aborted");
            }
        });
        TaskGuard(handle)
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}
