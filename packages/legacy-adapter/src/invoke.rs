//! Running a driver operation under either calling convention.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use crate::args::Callback;
use crate::error::{Error, Result};

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// What a legacy operation hands back to its caller.
///
/// Awaiting a [`Reply::Deferred`] runs the operation. When a callback was
/// given the operation is already running and the reply is
/// [`Reply::Detached`]; awaiting it yields [`Error::Detached`].
///
/// Deferred operations start in the order their replies are awaited.
/// Callback operations start in the order the runtime schedules the spawned
/// tasks: on a current-thread runtime that is call order, on a multi-thread
/// runtime two back-to-back callback calls may start in either order. Issue
/// the second call from the first one's callback when order matters.
#[must_use = "a deferred reply does nothing unless awaited"]
pub enum Reply<T> {
    Deferred(BoxFuture<T>),
    Detached,
}

impl<T> Reply<T> {
    pub fn is_detached(&self) -> bool {
        matches!(self, Reply::Detached)
    }
}

impl<T> std::fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Deferred(_) => f.write_str("Reply::Deferred"),
            Reply::Detached => f.write_str("Reply::Detached"),
        }
    }
}

impl<T: Send + 'static> IntoFuture for Reply<T> {
    type Output = Result<T>;
    type IntoFuture = BoxFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Reply::Deferred(future) => future,
            Reply::Detached => Box::pin(async { Err(Error::Detached) }),
        }
    }
}

/// Run `operation`, translating its success value.
///
/// With a callback the operation is spawned and the callback receives the
/// outcome. Without one the returned reply resolves to it. Errors pass
/// through as [`Error::Driver`] in both cases.
pub fn invoke<R, T, F, M>(operation: F, callback: Option<Callback<T>>, translate: M) -> Reply<T>
where
    F: Future<Output = docstore_driver::Result<R>> + Send + 'static,
    M: FnOnce(R) -> T + Send + 'static,
    R: Send + 'static,
    T: Send + 'static,
{
    let future = async move { operation.await.map(translate).map_err(Error::from) };
    match callback {
        Some(callback) => {
            spawn(async move { callback(future.await) });
            Reply::Detached
        }
        None => Reply::Deferred(Box::pin(future)),
    }
}

/// [`invoke`] without translation.
pub fn invoke_identity<T, F>(operation: F, callback: Option<Callback<T>>) -> Reply<T>
where
    F: Future<Output = docstore_driver::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    invoke(operation, callback, |value| value)
}

/// Spawn on the current runtime, or on a private one when called outside
/// of any runtime.
fn spawn<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => {
            std::thread::spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(task),
                    Err(e) => tracing::error!("failed to start callback runtime: {}", e),
                }
            });
        }
    }
}
