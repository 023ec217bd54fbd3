//! The invocation seam shared by targets and chain nodes.

use std::sync::Arc;

pub use serde_json::Value;

/// A type-erased error raised by a target operation or an advice callback.
///
/// The chain never inspects or wraps these; they unwind unchanged to the
/// caller of [`Handler::exec`](crate::Handler::exec).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of invoking any element of a chain.
pub type InvokeResult = Result<Value, BoxError>;

/// Anything that can be called with a positional argument list.
///
/// Implemented by [`Method`](crate::Method) (the innermost target) and by
/// [`Chain`](crate::Chain) / [`Executor`](crate::Executor) (the wrapping nodes),
/// so an around callback can continue the chain without knowing which one
/// sits underneath it.
pub trait Invoke: Send + Sync {
    /// Calls this element with `args`.
    fn invoke(&self, args: &[Value]) -> InvokeResult;
}

impl<T: Invoke + ?Sized> Invoke for Arc<T> {
    fn invoke(&self, args: &[Value]) -> InvokeResult {
        (**self).invoke(args)
    }
}

impl<T: Invoke + ?Sized> Invoke for Box<T> {
    fn invoke(&self, args: &[Value]) -> InvokeResult {
        (**self).invoke(args)
    }
}
