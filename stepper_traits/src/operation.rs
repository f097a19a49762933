use futures::future::{FutureExt, LocalBoxFuture};
use std::future::Future;

/// Error type at the operation boundary; implementations may return anything.
pub type OperationFailure = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a [`ValueOperation`]. Not `Send`: the coordinator is
/// single-threaded and polls it on a `LocalSet`.
pub type OperationFuture = LocalBoxFuture<'static, Result<(), OperationFailure>>;

/// The fallible, latency-bearing unit of work that applies a value remotely
/// (a network call, a storage write, ...).
///
/// Resolution only reports success or failure. The authoritative value comes
/// back separately through the caller (`Stepper::set_committed`).
pub trait ValueOperation<T> {
    fn call(&self, target: T) -> OperationFuture;
}

impl<T, F, Fut> ValueOperation<T> for F
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<(), OperationFailure>> + 'static,
{
    fn call(&self, target: T) -> OperationFuture {
        (self)(target).boxed_local()
    }
}
