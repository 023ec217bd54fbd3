//! Advice: a callback bound to one or more dispatch points.
//!
//! An [`Advice`] pairs a [`Mode`] with a [`Callback`] and the context object
//! the callback receives. The mode contract is:
//!
//! - `BEFORE` (1) and `AFTER` (2) may be combined (3); the same hook callback
//!   then runs on both legs and can tell them apart via [`Joinpoint::phase`].
//! - `AROUND` (4) is exclusive. Any other bit pattern is rejected.
//!
//! ```rust
//! use skein_core::{Advice, Callback, Mode, Signal};
//!
//! struct Guard {
//!     allow: bool,
//! }
//!
//! let guard = Advice::new(
//!     Guard { allow: false },
//!     Callback::hook(|guard: &Guard, _jp| {
//!         Ok((!guard.allow).then(|| Signal::prevent("guard closed")))
//!     }),
//!     Mode::BEFORE,
//! )
//! .unwrap();
//!
//! assert!(Advice::new((), Callback::hook(|_, _| Ok(None)), Mode::AROUND).is_err());
//! # drop(guard);
//! ```

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{AdviceError, AdviceResult};
use crate::invoke::{Invoke, InvokeResult, Value};
use crate::signal::HookResult;

// ============================================================================
// Mode
// ============================================================================

/// The dispatch points an advice is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode(u8);

impl Mode {
    /// Run before the inner invocation.
    pub const BEFORE: Self = Self(1);
    /// Run after the inner invocation.
    pub const AFTER: Self = Self(2);
    /// Run on both legs.
    pub const BEFORE_AFTER: Self = Self(3);
    /// Wrap the inner invocation entirely.
    pub const AROUND: Self = Self(4);

    /// Decodes raw bits, rejecting patterns with no valid dispatch point.
    pub fn from_bits(bits: u8) -> AdviceResult<Self> {
        match bits {
            1..=4 => Ok(Self(bits)),
            _ => Err(AdviceError::InvalidMode { bits }),
        }
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true for around advice.
    pub const fn is_around(self) -> bool {
        self.contains(Self::AROUND)
    }
}

impl BitOr for Mode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl TryFrom<u8> for Mode {
    type Error = AdviceError;

    fn try_from(bits: u8) -> AdviceResult<Self> {
        Self::from_bits(bits)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => f.write_str("before"),
            2 => f.write_str("after"),
            3 => f.write_str("before after"),
            4 => f.write_str("around"),
            bits => write!(f, "invalid({bits:#05b})"),
        }
    }
}

// ============================================================================
// Joinpoint
// ============================================================================

/// Which leg of the chain a callback runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the inner invocation.
    Before,
    /// After the inner invocation.
    After,
    /// In place of the inner invocation.
    Around,
}

/// The view of the chain handed to a callback.
pub struct Joinpoint<'a> {
    phase: Phase,
    next: &'a dyn Invoke,
    args: &'a [Value],
    result: Option<&'a Value>,
}

impl<'a> Joinpoint<'a> {
    pub(crate) fn new(phase: Phase, next: &'a dyn Invoke, args: &'a [Value]) -> Self {
        Self {
            phase,
            next,
            args,
            result: None,
        }
    }

    pub(crate) fn with_result(mut self, result: &'a Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Returns the leg this callback runs on.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the arguments of the current call.
    ///
    /// On the after leg these are the arguments the inner chain actually
    /// received, i.e. after any `AlterArgs` at this layer.
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Returns the result flowing outward. Only set on the after leg;
    /// `Null` when the inner invocation was prevented.
    pub fn result(&self) -> Option<&'a Value> {
        self.result
    }

    /// Invokes the inner chain with the current arguments.
    pub fn proceed(&self) -> InvokeResult {
        self.next.invoke(self.args)
    }

    /// Invokes the inner chain with replacement arguments.
    pub fn proceed_with(&self, args: &[Value]) -> InvokeResult {
        self.next.invoke(args)
    }

    /// Returns the inner chain itself.
    pub fn next(&self) -> &'a dyn Invoke {
        self.next
    }
}

impl fmt::Debug for Joinpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Joinpoint")
            .field("phase", &self.phase)
            .field("args", &self.args)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Callback
// ============================================================================

type HookFn<C> = Box<dyn Fn(&C, &Joinpoint<'_>) -> HookResult + Send + Sync>;
type AroundFn<C> = Box<dyn Fn(&C, &Joinpoint<'_>) -> InvokeResult + Send + Sync>;

/// The user function behind an advice, receiving its context explicitly.
pub enum Callback<C> {
    /// A before/after callback that may return a [`Signal`](crate::Signal).
    Hook(HookFn<C>),
    /// An around callback that produces the result itself, typically by
    /// calling [`Joinpoint::proceed`].
    Around(AroundFn<C>),
}

impl<C> Callback<C> {
    /// Wraps a before/after callback.
    pub fn hook<F>(f: F) -> Self
    where
        F: Fn(&C, &Joinpoint<'_>) -> HookResult + Send + Sync + 'static,
    {
        Self::Hook(Box::new(f))
    }

    /// Wraps an around callback.
    pub fn around<F>(f: F) -> Self
    where
        F: Fn(&C, &Joinpoint<'_>) -> InvokeResult + Send + Sync + 'static,
    {
        Self::Around(Box::new(f))
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Hook(_) => "a hook",
            Self::Around(_) => "an around",
        }
    }
}

impl<C> fmt::Debug for Callback<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape())
    }
}

// ============================================================================
// Advice
// ============================================================================

/// Process-unique identity of an [`Advice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdviceId(u64);

impl AdviceId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AdviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "advice#{}", self.0)
    }
}

/// The context-bound, type-erased callback stored by an advice.
#[derive(Clone)]
enum Dispatch {
    Hook(Arc<dyn Fn(&Joinpoint<'_>) -> HookResult + Send + Sync>),
    Around(Arc<dyn Fn(&Joinpoint<'_>) -> InvokeResult + Send + Sync>),
}

#[derive(Clone)]
struct AdviceInner {
    id: AdviceId,
    mode: Mode,
    name: Option<String>,
    dispatch: Dispatch,
}

/// A named interception unit.
///
/// `Advice` is cheap to clone; clones share identity, so any clone can be
/// passed to [`Handler::remove`](crate::Handler::remove).
#[derive(Clone)]
pub struct Advice {
    inner: Arc<AdviceInner>,
}

impl Advice {
    /// Creates an advice for `mode`, binding `context` to `callback`.
    ///
    /// Fails with [`AdviceError::InvalidMode`] when `mode` is not one of
    /// before, after, before|after or around, and with
    /// [`AdviceError::CallbackMismatch`] when an around mode gets a hook
    /// callback or vice versa.
    pub fn new<C>(context: C, callback: Callback<C>, mode: Mode) -> AdviceResult<Self>
    where
        C: Send + Sync + 'static,
    {
        let mode = Mode::from_bits(mode.bits())?;

        let dispatch = match (callback, mode.is_around()) {
            (Callback::Hook(f), false) => {
                Dispatch::Hook(Arc::new(move |jp: &Joinpoint<'_>| f(&context, jp)))
            }
            (Callback::Around(f), true) => {
                Dispatch::Around(Arc::new(move |jp: &Joinpoint<'_>| f(&context, jp)))
            }
            (callback, _) => {
                return Err(AdviceError::CallbackMismatch {
                    mode,
                    callback: callback.shape(),
                });
            }
        };

        Ok(Self {
            inner: Arc::new(AdviceInner {
                id: AdviceId::next(),
                mode,
                name: None,
                dispatch,
            }),
        })
    }

    /// Sets a name for this advice (useful for debugging).
    ///
    /// Call this before the advice is added to a handler. Naming an advice
    /// that other clones already share detaches it, so the installed copy
    /// keeps its old name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).name = Some(name.into());
        self
    }

    /// Returns the identity of this advice.
    pub fn id(&self) -> AdviceId {
        self.inner.id
    }

    /// Returns the name of this advice, if set.
    pub fn get_name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns the registered mode.
    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    /// Runs the callback for the before leg. A no-op unless BEFORE is set.
    pub fn dispatch_before(&self, next: &dyn Invoke, args: &[Value]) -> HookResult {
        if !self.inner.mode.contains(Mode::BEFORE) {
            return Ok(None);
        }
        self.call_hook(&Joinpoint::new(Phase::Before, next, args))
    }

    /// Runs the callback for the after leg. A no-op unless AFTER is set.
    pub fn dispatch_after(&self, next: &dyn Invoke, args: &[Value], result: &Value) -> HookResult {
        if !self.inner.mode.contains(Mode::AFTER) {
            return Ok(None);
        }
        self.call_hook(&Joinpoint::new(Phase::After, next, args).with_result(result))
    }

    /// Runs the callback in place of `next`. A no-op returning `Null` unless
    /// AROUND is set.
    ///
    /// The driver never invokes `next` on behalf of around advice.
    pub fn dispatch_around(&self, next: &dyn Invoke, args: &[Value]) -> InvokeResult {
        match &self.inner.dispatch {
            Dispatch::Around(f) if self.inner.mode.is_around() => {
                f(&Joinpoint::new(Phase::Around, next, args))
            }
            _ => Ok(Value::Null),
        }
    }

    fn call_hook(&self, jp: &Joinpoint<'_>) -> HookResult {
        match &self.inner.dispatch {
            Dispatch::Hook(f) => f(jp),
            Dispatch::Around(_) => Ok(None),
        }
    }
}

impl PartialEq for Advice {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Advice {}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.name {
            Some(name) => write!(f, "{name} ({})", self.inner.id),
            None => write!(f, "{}", self.inner.id),
        }
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advice")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("mode", &self.inner.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::signal::Signal;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn echo() -> Method {
        Method::from_fn("echo", |args| Ok(Value::Array(args.to_vec())))
    }

    #[test]
    fn test_mode_decoding() {
        for bits in 1..=4 {
            assert_eq!(Mode::from_bits(bits).unwrap().bits(), bits);
        }
        for bits in [0, 5, 6, 7, 8, 255] {
            assert_eq!(
                Mode::try_from(bits).unwrap_err(),
                AdviceError::InvalidMode { bits }
            );
        }
        assert_eq!(Mode::BEFORE | Mode::AFTER, Mode::BEFORE_AFTER);
        assert_eq!(Mode::BEFORE_AFTER.to_string(), "before after");
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let err = Advice::new((), Callback::hook(|_, _| Ok(None)), Mode::AROUND | Mode::BEFORE)
            .unwrap_err();
        assert_eq!(err, AdviceError::InvalidMode { bits: 5 });
    }

    #[test]
    fn test_callback_shape_must_fit_mode() {
        let err = Advice::new((), Callback::around(|_, jp| jp.proceed()), Mode::BEFORE).unwrap_err();
        assert!(matches!(err, AdviceError::CallbackMismatch { mode, .. } if mode == Mode::BEFORE));

        let err = Advice::new((), Callback::hook(|_, _| Ok(None)), Mode::AROUND).unwrap_err();
        assert_eq!(
            err.to_string(),
            "advice mode 'around' cannot use a hook callback"
        );
    }

    #[test]
    fn test_dispatch_is_gated_by_mode() {
        let calls = Arc::new(AtomicUsize::new(0));
        let advice = Advice::new(
            Arc::clone(&calls),
            Callback::hook(|calls: &Arc<AtomicUsize>, jp| {
                calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(jp.phase(), Phase::After);
                Ok(Some(Signal::alter_return("seen", jp.result().cloned().unwrap_or_default())))
            }),
            Mode::AFTER,
        )
        .unwrap();

        let target = echo();
        assert_eq!(advice.dispatch_before(&target, &[]).unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let sig = advice.dispatch_after(&target, &[], &json!("r")).unwrap();
        assert_eq!(sig, Some(Signal::alter_return("seen", "r")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(advice.dispatch_around(&target, &[]).unwrap(), Value::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_around_proceeds_through_joinpoint() {
        let advice = Advice::new(
            "wrapped",
            Callback::around(|tag: &&str, jp| {
                assert_eq!(jp.phase(), Phase::Around);
                let inner = jp.proceed_with(&[json!(tag)])?;
                Ok(json!({ "inner": inner, "args": jp.args() }))
            }),
            Mode::AROUND,
        )
        .unwrap();

        let out = advice.dispatch_around(&echo(), &[json!(1)]).unwrap();
        assert_eq!(out, json!({ "inner": ["wrapped"], "args": [1] }));
        assert_eq!(advice.dispatch_before(&echo(), &[]).unwrap(), None);
    }

    #[test]
    fn test_identity_survives_clone_and_rename() {
        let a = Advice::new((), Callback::hook(|_, _| Ok(None)), Mode::BEFORE).unwrap();
        let b = Advice::new((), Callback::hook(|_, _| Ok(None)), Mode::BEFORE).unwrap();
        let named = a.clone().name("audit");

        assert_eq!(a, named);
        assert_ne!(a, b);
        assert_eq!(named.get_name(), Some("audit"));
        assert_eq!(named.to_string(), format!("audit ({})", a.id()));
    }
}
