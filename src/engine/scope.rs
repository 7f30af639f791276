//! Call-site scope handed to the engine by an interception point.
//!
//! Rust cannot reach into the caller's stack frame, so the call site captures
//! the locals it wants actions to see into a [`Scope`] (usually through the
//! [`scope!`](crate::scope) macro) together with an optional receiver standing
//! in for `self`.

use std::collections::BTreeMap;
use std::fmt;

use super::value::Value;
use crate::{Result, TripwireError};

/// The `self` of an interception point, as seen by action expressions.
///
/// Only `type_name` is required. Attribute reads, writes and method calls
/// fail with an evaluation error unless the implementor opts in. Methods take
/// `&self` so the guarded code can keep borrowing the receiver while the scope
/// holds it; mutation goes through interior mutability.
pub trait Receiver {
    /// Type name reported by `self.type_name`
    fn type_name(&self) -> &str;

    /// Read an attribute (`self.name`)
    fn get(&self, name: &str) -> Result<Value> {
        Err(TripwireError::Eval(format!(
            "{} has no readable attribute '{}'",
            self.type_name(),
            name
        )))
    }

    /// Write an attribute (`self.name = value`)
    fn set(&self, name: &str, _value: Value) -> Result<()> {
        Err(TripwireError::Eval(format!(
            "{} has no writable attribute '{}'",
            self.type_name(),
            name
        )))
    }

    /// Invoke a method (`self.name(args)`)
    fn call(&self, name: &str, _args: Vec<Value>) -> Result<Value> {
        Err(TripwireError::Eval(format!(
            "{} has no method '{}'",
            self.type_name(),
            name
        )))
    }
}

/// Variable bindings and receiver visible at an interception point
#[derive(Default)]
pub struct Scope<'a> {
    vars: BTreeMap<String, Value>,
    receiver: Option<&'a dyn Receiver>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the receiver that `self` resolves to
    pub fn with_receiver(mut self, receiver: &'a dyn Receiver) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Builder-style binding
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Set a binding, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn receiver(&self) -> Option<&'a dyn Receiver> {
        self.receiver
    }

    pub fn vars(&self) -> &BTreeMap<String, Value> {
        &self.vars
    }

    /// Bind `name` to `value` for the duration of `f`, then restore the
    /// previous binding (or remove it if there was none)
    pub fn with_binding<T>(
        &mut self,
        name: &str,
        value: Value,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = self.vars.insert(name.to_string(), value);
        let out = f(self);
        match previous {
            Some(prev) => {
                self.vars.insert(name.to_string(), prev);
            }
            None => {
                self.vars.remove(name);
            }
        }
        out
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("vars", &self.vars)
            .field("receiver", &self.receiver.map(|r| r.type_name().to_string()))
            .finish()
    }
}

/// Capture call-site locals into a [`Scope`].
///
/// ```
/// use tripwire::{scope, Receiver};
///
/// struct Reactor;
/// impl Receiver for Reactor {
///     fn type_name(&self) -> &str { "Reactor" }
/// }
///
/// let reactor = Reactor;
/// let amount = 80;
/// let divider = 100.0;
/// let s = scope!(&reactor; amount, divider);
/// assert_eq!(s.get("amount"), Some(&tripwire::Value::Int(80)));
///
/// let bare = scope!(amount);
/// assert!(bare.receiver().is_none());
/// ```
#[macro_export]
macro_rules! scope {
    () => {
        $crate::Scope::new()
    };
    ($receiver:expr; $($var:ident),* $(,)?) => {
        $crate::Scope::new()
            .with_receiver($receiver)
            $(.bind(stringify!($var), $crate::Value::from($var.clone())))*
    };
    ($($var:ident),+ $(,)?) => {
        $crate::Scope::new()
            $(.bind(stringify!($var), $crate::Value::from($var.clone())))+
    };
}
