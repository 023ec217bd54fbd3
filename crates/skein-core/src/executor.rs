//! Chain nodes and the driver algorithm.
//!
//! A chain is a singly-linked list of [`Executor`] nodes ending at the target.
//! Nodes are immutable and shared through `Arc`: adding advice allocates one
//! new outer node, and removing advice rebuilds only the nodes outside the
//! removed one, sharing the untouched inner tail.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::advice::{Advice, AdviceId, Mode};
use crate::invoke::{Invoke, InvokeResult, Value};
use crate::signal::Signal;

#[derive(Clone)]
enum Link {
    Target(Arc<dyn Invoke>),
    Node(Arc<Executor>),
}

/// A snapshot of a chain, from its outermost node down to the target.
///
/// Cloning is cheap. A snapshot keeps executing the chain it was taken from,
/// even after the owning [`Handler`](crate::Handler) has moved on.
#[derive(Clone)]
pub struct Chain {
    link: Link,
}

impl Chain {
    /// Creates a chain that is only the target.
    pub fn target(target: impl Invoke + 'static) -> Self {
        Self {
            link: Link::Target(Arc::new(target)),
        }
    }

    /// Creates a chain whose head is `node`.
    pub fn node(node: Executor) -> Self {
        Self {
            link: Link::Node(Arc::new(node)),
        }
    }

    /// Executes the chain.
    pub fn exec(&self, args: &[Value]) -> InvokeResult {
        match &self.link {
            Link::Target(target) => target.invoke(args),
            Link::Node(node) => node.exec(args),
        }
    }

    /// Returns the head node, unless the chain is only the target.
    pub fn head(&self) -> Option<&Executor> {
        match &self.link {
            Link::Target(_) => None,
            Link::Node(node) => Some(node),
        }
    }

    /// Returns the advice of the head node.
    pub fn advice(&self) -> Option<&Advice> {
        self.head().and_then(Executor::advice)
    }

    /// Iterates over the advice of every node, outermost first.
    pub fn advices(&self) -> Advices<'_> {
        Advices { next: self.head() }
    }

    /// Returns the number of nodes between the head and the target.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.head();
        while let Some(n) = node {
            depth += 1;
            node = n.inner.head();
        }
        depth
    }

    /// Returns true if `advice` is installed anywhere in this chain.
    pub fn contains(&self, advice: &Advice) -> bool {
        self.advices().any(|a| a == advice)
    }

    /// Returns this chain with the node carrying `id` excised, or `None` when
    /// no node carries it.
    ///
    /// Nodes outside the removed one are rebuilt with their advice and
    /// relative order intact; nodes inside it are shared as-is.
    pub(crate) fn without(&self, id: AdviceId) -> Option<Self> {
        let node = self.head()?;

        if node.advice.as_ref().is_some_and(|a| a.id() == id) {
            return Some(node.inner.clone());
        }

        let inner = node.inner.without(id)?;
        Some(Self::node(Executor::new(inner, node.advice.clone())))
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.link, &other.link) {
            (Link::Target(a), Link::Target(b)) => Arc::ptr_eq(a, b),
            (Link::Node(a), Link::Node(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Invoke for Chain {
    fn invoke(&self, args: &[Value]) -> InvokeResult {
        self.exec(args)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.advices()).finish()
    }
}

/// Iterator over the advice of a chain, outermost first.
pub struct Advices<'a> {
    next: Option<&'a Executor>,
}

impl<'a> Iterator for Advices<'a> {
    type Item = &'a Advice;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.next {
            self.next = node.inner.head();
            if let Some(advice) = &node.advice {
                return Some(advice);
            }
        }
        None
    }
}

/// One layer of the onion: an inner chain plus the advice wrapping it.
pub struct Executor {
    inner: Chain,
    advice: Option<Advice>,
}

impl Executor {
    /// Creates a node wrapping `inner`.
    pub fn new(inner: Chain, advice: Option<Advice>) -> Self {
        Self { inner, advice }
    }

    /// Returns the advice of this node; `None` for a passthrough node.
    pub fn advice(&self) -> Option<&Advice> {
        self.advice.as_ref()
    }

    /// Returns the chain this node wraps.
    pub fn inner(&self) -> &Chain {
        &self.inner
    }

    /// Runs this node.
    ///
    /// 1. Without advice, the inner chain is invoked directly.
    /// 2. Around advice replaces the invocation entirely; its result is
    ///    returned as-is.
    /// 3. Otherwise the before callback may halt, alter the arguments or
    ///    prevent the inner invocation; then the inner chain runs unless
    ///    prevented (the result is `Null` if it was); then the after callback
    ///    may halt or alter the result.
    ///
    /// Errors from the inner chain or the callbacks propagate immediately;
    /// the after callback of this node does not run for an inner error.
    pub fn exec(&self, args: &[Value]) -> InvokeResult {
        let Some(advice) = &self.advice else {
            return self.inner.exec(args);
        };

        let mode = advice.mode();
        if mode.is_around() {
            trace!(advice = %advice, "Dispatching around advice");
            return advice.dispatch_around(&self.inner, args);
        }

        let mut altered = None;
        let mut prevented = false;

        if mode.contains(Mode::BEFORE) {
            trace!(advice = %advice, "Dispatching before advice");
            match advice.dispatch_before(&self.inner, args)? {
                Some(Signal::Halt { reason, value }) => {
                    debug!(advice = %advice, %reason, "Halted before invocation");
                    return Ok(value);
                }
                Some(Signal::AlterArgs { reason, args }) => {
                    debug!(advice = %advice, %reason, "Arguments altered");
                    altered = Some(args);
                }
                Some(Signal::Prevent { reason }) => {
                    debug!(advice = %advice, %reason, "Inner invocation prevented");
                    prevented = true;
                }
                Some(Signal::AlterReturn { .. }) | None => {}
            }
        }

        let args = altered.as_deref().unwrap_or(args);
        let mut result = if prevented {
            Value::Null
        } else {
            self.inner.exec(args)?
        };

        if mode.contains(Mode::AFTER) {
            trace!(advice = %advice, "Dispatching after advice");
            match advice.dispatch_after(&self.inner, args, &result)? {
                Some(Signal::Halt { reason, value }) => {
                    debug!(advice = %advice, %reason, "Halted after invocation");
                    return Ok(value);
                }
                Some(Signal::AlterReturn { reason, value }) => {
                    debug!(advice = %advice, %reason, "Return value altered");
                    result = value;
                }
                Some(Signal::Prevent { .. } | Signal::AlterArgs { .. }) | None => {}
            }
        }

        Ok(result)
    }
}

impl Invoke for Executor {
    fn invoke(&self, args: &[Value]) -> InvokeResult {
        self.exec(args)
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("advice", &self.advice)
            .field("depth", &(self.inner.depth() + 1))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::Callback;
    use crate::method::Method;
    use serde_json::json;

    fn echo() -> Chain {
        Chain::target(Method::from_fn("echo", |args| Ok(Value::Array(args.to_vec()))))
    }

    fn before(signal: Signal) -> Advice {
        Advice::new(
            signal,
            Callback::hook(|signal: &Signal, _| Ok(Some(signal.clone()))),
            Mode::BEFORE,
        )
        .unwrap()
    }

    #[test]
    fn test_passthrough_node() {
        let chain = Chain::node(Executor::new(echo(), None));
        assert_eq!(chain.exec(&[json!(1)]).unwrap(), json!([1]));
        assert_eq!(chain.depth(), 1);
        assert_eq!(chain.advices().count(), 0);
    }

    #[test]
    fn test_before_signals() {
        let halt = Chain::node(Executor::new(echo(), Some(before(Signal::halt("r", 7)))));
        assert_eq!(halt.exec(&[json!(1)]).unwrap(), json!(7));

        let alter = Chain::node(Executor::new(
            echo(),
            Some(before(Signal::alter_args("r", vec![json!(4), json!(5), json!(6)]))),
        ));
        assert_eq!(alter.exec(&[json!(1)]).unwrap(), json!([4, 5, 6]));

        let prevent = Chain::node(Executor::new(echo(), Some(before(Signal::prevent("stop")))));
        assert_eq!(prevent.exec(&[json!(1)]).unwrap(), Value::Null);

        let ignored = Chain::node(Executor::new(
            echo(),
            Some(before(Signal::alter_return("too early", "X"))),
        ));
        assert_eq!(ignored.exec(&[json!(1)]).unwrap(), json!([1]));
    }

    #[test]
    fn test_after_ignores_before_only_signals() {
        let advice = Advice::new(
            (),
            Callback::hook(|_, _| Ok(Some(Signal::alter_args("too late", vec![])))),
            Mode::AFTER,
        )
        .unwrap();
        let chain = Chain::node(Executor::new(echo(), Some(advice)));
        assert_eq!(chain.exec(&[json!(1)]).unwrap(), json!([1]));
    }

    #[test]
    fn test_without_shares_inner_tail() {
        let a = before(Signal::prevent("a"));
        let b = before(Signal::prevent("b"));
        let inner = Chain::node(Executor::new(echo(), Some(a.clone())));
        let outer = Chain::node(Executor::new(inner.clone(), Some(b.clone())));

        let removed = outer.without(b.id()).unwrap();
        assert!(removed.ptr_eq(&inner));

        let removed = outer.without(a.id()).unwrap();
        assert_eq!(removed.advices().collect::<Vec<_>>(), [&b]);

        assert!(echo().without(a.id()).is_none());
    }
}
