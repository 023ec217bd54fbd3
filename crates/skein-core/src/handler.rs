//! The mutable front door of a chain.
//!
//! A [`Handler`] owns the current head of one chain. Registering advice
//! replaces the head with a new outer node; removing advice replaces it with a
//! rebuilt chain. Both are a single assignment of `head`, so a caller holding
//! a [`Chain`] snapshot never observes a partially rebuilt chain.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use skein_core::{Handler, Method, Signal};
//!
//! let mut handler = Handler::new(Method::from_fn("echo", |args| Ok(json!(args))));
//!
//! let swap = handler
//!     .before(|_, _| Ok(Some(Signal::alter_args("swap", vec![json!(4), json!(5), json!(6)]))), ())
//!     .unwrap();
//! assert_eq!(handler.exec(&[json!(1), json!(2), json!(3)]).unwrap(), json!([4, 5, 6]));
//!
//! let swap = swap.advice().cloned().unwrap();
//! handler.remove(&swap);
//! assert_eq!(handler.exec(&[json!(1)]).unwrap(), json!([1]));
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{Level, debug, span};

use crate::advice::{Advice, Callback, Joinpoint, Mode};
use crate::error::{AdviceError, AdviceResult};
use crate::executor::{Advices, Chain, Executor};
use crate::invoke::{Invoke, InvokeResult, Value};
use crate::method::{Method, Resolve};
use crate::signal::HookResult;

/// Options for a [`Handler`].
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    /// Name used in logs.
    pub name: Option<String>,
    /// Upper bound on the number of advice nodes; `None` means unbounded.
    pub max_depth: Option<usize>,
}

impl HandlerOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the depth limit.
    pub fn max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }
}

/// Wraps a target with a dynamically composable chain of advice.
pub struct Handler {
    head: Chain,
    options: HandlerOptions,
}

impl Handler {
    /// Creates a handler with no advice around `target`.
    pub fn new(target: impl Invoke + 'static) -> Self {
        Self::with_options(target, HandlerOptions::default())
    }

    /// Creates a handler with explicit options.
    pub fn with_options(target: impl Invoke + 'static, options: HandlerOptions) -> Self {
        Self {
            head: Chain::target(target),
            options,
        }
    }

    /// Creates a handler around the operation `name` of `owner`.
    pub fn for_method<O: Resolve>(owner: Arc<O>, name: impl Into<String>) -> AdviceResult<Self> {
        let method = Method::new(owner, name)?;
        let options = HandlerOptions::new().name(method.name());
        Ok(Self::with_options(method, options))
    }

    /// Returns the handler name, or `"unnamed"`.
    pub fn name(&self) -> &str {
        self.options.name.as_deref().unwrap_or("unnamed")
    }

    /// Returns the options this handler was built with.
    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// Wraps the current head in a new node carrying `advice` and returns the
    /// new head.
    ///
    /// Fails if `advice` is already installed here or if the depth limit
    /// would be exceeded.
    pub fn add(&mut self, advice: Advice) -> AdviceResult<Chain> {
        if self.head.contains(&advice) {
            return Err(AdviceError::AlreadyInstalled {
                advice: advice.id(),
            });
        }

        match self.options.max_depth {
            Some(limit) if self.head.depth() >= limit => {
                return Err(AdviceError::DepthExceeded { limit });
            }
            _ => {}
        }

        debug!(
            handler = self.name(),
            advice = %advice,
            mode = %advice.mode(),
            "Advice added"
        );

        self.head = Chain::node(Executor::new(self.head.clone(), Some(advice)));
        Ok(self.head.clone())
    }

    /// Excises the node carrying `advice` and returns the new head.
    ///
    /// The remaining advice keeps its relative order. Removing advice that is
    /// not installed leaves the chain untouched.
    pub fn remove(&mut self, advice: &Advice) -> Chain {
        match self.head.without(advice.id()) {
            Some(head) => {
                debug!(handler = self.name(), advice = %advice, "Advice removed");
                self.head = head;
            }
            None => {
                debug!(
                    handler = self.name(),
                    advice = %advice,
                    "Advice not installed, nothing to remove"
                );
            }
        }
        self.head.clone()
    }

    /// Executes the chain with `args`.
    pub fn exec(&self, args: &[Value]) -> InvokeResult {
        let span = span!(Level::TRACE, "exec", handler = self.name());
        let _enter = span.enter();

        self.head.exec(args)
    }

    /// Builds an advice from `mode`, `callback` and `context` and adds it.
    pub fn inject<C>(&mut self, mode: Mode, callback: Callback<C>, context: C) -> AdviceResult<Chain>
    where
        C: Send + Sync + 'static,
    {
        let advice = Advice::new(context, callback, mode)?;
        self.add(advice)
    }

    /// Adds a callback that runs before the inner invocation.
    pub fn before<C, F>(&mut self, f: F, context: C) -> AdviceResult<Chain>
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &Joinpoint<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.inject(Mode::BEFORE, Callback::hook(f), context)
    }

    /// Adds a callback that runs after the inner invocation.
    pub fn after<C, F>(&mut self, f: F, context: C) -> AdviceResult<Chain>
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &Joinpoint<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.inject(Mode::AFTER, Callback::hook(f), context)
    }

    /// Adds a callback that wraps the inner invocation.
    pub fn around<C, F>(&mut self, f: F, context: C) -> AdviceResult<Chain>
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &Joinpoint<'_>) -> InvokeResult + Send + Sync + 'static,
    {
        self.inject(Mode::AROUND, Callback::around(f), context)
    }

    /// Returns a snapshot of the current chain.
    pub fn chain(&self) -> Chain {
        self.head.clone()
    }

    /// Iterates over the installed advice, outermost first.
    pub fn advices(&self) -> Advices<'_> {
        self.head.advices()
    }

    /// Returns true if `advice` is installed.
    pub fn contains(&self, advice: &Advice) -> bool {
        self.head.contains(advice)
    }

    /// Returns the number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.head.depth()
    }

    /// Returns true if no advice was ever added, or all of it was removed.
    pub fn is_empty(&self) -> bool {
        self.head.head().is_none()
    }
}

impl Invoke for Handler {
    fn invoke(&self, args: &[Value]) -> InvokeResult {
        self.exec(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name())
            .field("chain", &self.head)
            .finish()
    }
}
