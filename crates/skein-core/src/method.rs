//! The innermost element of every chain: a named operation bound to its owner.

use std::fmt;
use std::sync::Arc;

use crate::error::{AdviceError, AdviceResult};
use crate::invoke::{Invoke, InvokeResult, Value};

/// An operation an owner exposes by name.
pub type Operation<O> = fn(&O, &[Value]) -> InvokeResult;

/// Name-based lookup of an owner's operations.
///
/// # Example
///
/// ```rust
/// use serde_json::{Value, json};
/// use skein_core::{InvokeResult, Method, Operation, Resolve};
/// use std::sync::Arc;
///
/// struct Counter;
///
/// impl Counter {
///     fn double(&self, args: &[Value]) -> InvokeResult {
///         let n = args.first().and_then(Value::as_i64).unwrap_or_default();
///         Ok(json!(n * 2))
///     }
/// }
///
/// impl Resolve for Counter {
///     fn resolve(&self, name: &str) -> Option<Operation<Self>> {
///         match name {
///             "double" => Some(Self::double as Operation<Self>),
///             _ => None,
///         }
///     }
/// }
///
/// let method = Method::new(Arc::new(Counter), "double").unwrap();
/// ```
pub trait Resolve: Sized + Send + Sync + 'static {
    /// Returns the operation registered under `name`, if any.
    fn resolve(&self, name: &str) -> Option<Operation<Self>>;
}

type BoundFn = Box<dyn Fn(&[Value]) -> InvokeResult + Send + Sync>;

/// A target operation bound to its owner.
///
/// The operation is looked up once in [`Method::new`]; later changes to what
/// the owner would resolve are never observed by this method.
pub struct Method {
    name: String,
    call: BoundFn,
}

impl Method {
    /// Resolves `name` on `owner` and binds the result.
    pub fn new<O: Resolve>(owner: Arc<O>, name: impl Into<String>) -> AdviceResult<Self> {
        let name = name.into();
        let Some(op) = owner.resolve(&name) else {
            return Err(AdviceError::UnknownOperation { name });
        };

        Ok(Self {
            name,
            call: Box::new(move |args| op(&owner, args)),
        })
    }

    /// Wraps a free-standing closure as a target.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> InvokeResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Box::new(f),
        }
    }

    /// Returns the operation name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Invoke for Method {
    fn invoke(&self, args: &[Value]) -> InvokeResult {
        (self.call)(args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Greeter {
        greeting: &'static str,
        calls: AtomicUsize,
    }

    impl Greeter {
        fn greet(&self, args: &[Value]) -> InvokeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let who = args.first().and_then(Value::as_str).unwrap_or("world");
            Ok(json!(format!("{} {who}", self.greeting)))
        }

        fn fail(&self, _args: &[Value]) -> InvokeResult {
            Err("greeter is out of words".into())
        }
    }

    impl Resolve for Greeter {
        fn resolve(&self, name: &str) -> Option<Operation<Self>> {
            match name {
                "greet" => Some(Self::greet as Operation<Self>),
                "fail" => Some(Self::fail as Operation<Self>),
                _ => None,
            }
        }
    }

    fn greeter() -> Arc<Greeter> {
        Arc::new(Greeter {
            greeting: "hello",
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_invoke_binds_owner() {
        let owner = greeter();
        let method = Method::new(Arc::clone(&owner), "greet").unwrap();

        assert_eq!(method.name(), "greet");
        assert_eq!(method.invoke(&[json!("skein")]).unwrap(), json!("hello skein"));
        assert_eq!(method.invoke(&[]).unwrap(), json!("hello world"));
        assert_eq!(owner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_operation() {
        let err = Method::new(greeter(), "wave").unwrap_err();
        assert_eq!(
            err,
            AdviceError::UnknownOperation {
                name: "wave".to_string()
            }
        );
    }

    #[test]
    fn test_error_passes_through() {
        let method = Method::new(greeter(), "fail").unwrap();
        let err = method.invoke(&[]).unwrap_err();
        assert_eq!(err.to_string(), "greeter is out of words");
    }

    #[test]
    fn test_from_fn() {
        let method = Method::from_fn("echo", |args| Ok(Value::Array(args.to_vec())));
        assert_eq!(method.invoke(&[json!(1), json!(2)]).unwrap(), json!([1, 2]));
    }
}
