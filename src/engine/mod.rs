//! The interception engine.
//!
//! An interception point names a tag, hands over its call-site [`Scope`] and
//! optionally the guarded computation. When the tag is armed the engine runs,
//! in order:
//!
//! 1. `pre_call` actions
//! 2. the guarded code, producing `retval`
//! 3. `return_call` actions, with `retval` bound
//! 4. `post_call` actions
//! 5. resolution: `return` (coerced), else `return_code`, else `retval`
//!
//! Any failure propagates immediately; side effects of earlier phases stay.

use std::sync::Arc;

use tracing::{debug, trace};

pub mod actions;
pub mod coerce;
pub mod expr;
pub mod functions;
pub mod global;
pub mod resolver;
pub mod scope;
pub mod value;

pub use actions::{ActionEvaluator, ParseCache};
pub use functions::FunctionRegistry;
pub use resolver::BreakpointResolver;
pub use scope::{Receiver, Scope};
pub use value::Value;

use crate::config::{BreakpointDefinition, ConfigProvider};
use crate::{Result, TripwireError};

/// Resolver plus evaluator, bound to one config provider
pub struct Engine {
    resolver: BreakpointResolver,
    evaluator: ActionEvaluator,
}

impl Engine {
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self::with_functions(provider, FunctionRegistry::new())
    }

    pub fn with_functions(provider: Arc<dyn ConfigProvider>, functions: FunctionRegistry) -> Self {
        Self::with_cache(provider, functions, ParseCache::new())
    }

    /// Engine whose parsed actions live in a cache shared with other engines
    pub fn with_cache(
        provider: Arc<dyn ConfigProvider>,
        functions: FunctionRegistry,
        parsed: ParseCache,
    ) -> Self {
        Self {
            resolver: BreakpointResolver::new(provider),
            evaluator: ActionEvaluator::with_cache(functions, parsed),
        }
    }

    /// Make a host function callable from this engine's actions
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.evaluator.functions_mut().register(name, f);
    }

    /// Intercept a guarded computation
    pub fn intercept<R, F>(&self, tag: &str, scope: &mut Scope<'_>, guarded: F) -> Result<Value>
    where
        R: Into<Value>,
        F: FnOnce() -> R,
    {
        self.run(tag, scope, Some(guarded))
    }

    /// Intercept a guarded computation and convert the result back to its type
    pub fn intercept_as<T, F>(&self, tag: &str, scope: &mut Scope<'_>, guarded: F) -> Result<T>
    where
        T: Into<Value> + TryFrom<Value, Error = TripwireError>,
        F: FnOnce() -> T,
    {
        T::try_from(self.intercept(tag, scope, guarded)?)
    }

    /// An interception point without guarded code, for side effects or
    /// injected values. Yields `nil` unless an override applies.
    pub fn checkpoint(&self, tag: &str, scope: &mut Scope<'_>) -> Result<Value> {
        self.run(tag, scope, None::<fn() -> Value>)
    }

    fn run<R, F>(&self, tag: &str, scope: &mut Scope<'_>, guarded: Option<F>) -> Result<Value>
    where
        R: Into<Value>,
        F: FnOnce() -> R,
    {
        let Some(def) = self.resolver.armed_definition(tag)? else {
            return Ok(guarded.map(|f| f().into()).unwrap_or_default());
        };
        debug!(tag, facets = ?def.facets(), "Breakpoint armed");

        trace!(tag, "pre_call");
        self.evaluator.run(def.pre_call_actions(), scope)?;

        let retval = guarded.map(|f| f().into()).unwrap_or_default();
        trace!(tag, %retval, "guarded code returned");

        if !def.return_call_actions().is_empty() {
            trace!(tag, "return_call");
            self.evaluator
                .run_with_retval(def.return_call_actions(), scope, &retval)?;
        }

        trace!(tag, "post_call");
        self.evaluator.run(def.post_call_actions(), scope)?;

        self.resolve(tag, &def, scope, retval)
    }

    fn resolve(
        &self,
        tag: &str,
        def: &BreakpointDefinition,
        scope: &mut Scope<'_>,
        retval: Value,
    ) -> Result<Value> {
        if let Some(raw) = def.return_override() {
            let value = coerce::coerce(raw);
            debug!(tag, %value, "Return overridden by value");
            return Ok(value);
        }
        if let Some(code) = def.return_code_override() {
            let value = self.evaluator.eval(code, scope)?;
            debug!(tag, %value, "Return overridden by code");
            return Ok(value);
        }
        Ok(retval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticConfigProvider;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::sync::Mutex;

    fn engine(yaml: &str) -> (Engine, Arc<Mutex<Vec<Value>>>) {
        let provider = Arc::new(StaticConfigProvider::from_yaml(yaml).unwrap());
        let history = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&history);
        let mut engine = Engine::new(provider);
        engine.register_function("inspect", move |args| {
            sink.lock().unwrap().extend(args.iter().cloned());
            Ok(Value::Nil)
        });
        (engine, history)
    }

    #[test]
    fn test_unarmed_tag_runs_guarded_code_once() {
        let (engine, history) = engine("breakpoints:\n  other: { pre_call: 'inspect(1)' }\n");
        let calls = Cell::new(0);
        let mut scope = Scope::new().bind("x", 1);
        let out = engine
            .intercept("fuel", &mut scope, || {
                calls.set(calls.get() + 1);
                1.0
            })
            .unwrap();
        assert_eq!(out, Value::Float(1.0));
        assert_eq!(calls.get(), 1);
        assert!(history.lock().unwrap().is_empty());
        assert_eq!(scope.vars().len(), 1);
    }

    #[test]
    fn test_phase_order() {
        let (engine, history) = engine(
            r#"
breakpoints:
  fuel:
    pre_call: "inspect('pre')"
    return_call: "inspect('return_call', retval)"
    post_call: "inspect('post')"
"#,
        );
        let log = Arc::clone(&history);
        let mut scope = Scope::new();
        let out = engine
            .intercept("fuel", &mut scope, || {
                log.lock().unwrap().push(Value::from("guarded"));
                7
            })
            .unwrap();

        assert_eq!(out, Value::Int(7));
        assert_eq!(
            *history.lock().unwrap(),
            vec![
                Value::from("pre"),
                Value::from("guarded"),
                Value::from("return_call"),
                Value::Int(7),
                Value::from("post"),
            ]
        );
    }

    #[test]
    fn test_return_beats_return_code() {
        let (engine, _) = engine(
            "breakpoints:\n  fuel: { return: '2', return_code: '3' }\n",
        );
        let out = engine.intercept("fuel", &mut Scope::new(), || 1).unwrap();
        assert_eq!(out, Value::Int(2));
    }

    #[test]
    fn test_return_call_sees_original_value() {
        let (engine, history) = engine(
            "breakpoints:\n  fuel: { return: 0.5, return_call: 'inspect(retval)' }\n",
        );
        let out = engine.intercept("fuel", &mut Scope::new(), || 1.0).unwrap();
        assert_eq!(out, Value::Float(0.5));
        assert_eq!(*history.lock().unwrap(), vec![Value::Float(1.0)]);
    }

    #[test]
    fn test_checkpoint_without_guarded_code() {
        let (engine, history) = engine(
            r#"
breakpoints:
  tick: { return_call: 'inspect(retval)' }
  seed: { return_code: 'base * 2' }
"#,
        );
        assert_eq!(engine.checkpoint("tick", &mut Scope::new()).unwrap(), Value::Nil);
        assert_eq!(*history.lock().unwrap(), vec![Value::Nil]);

        let mut scope = Scope::new().bind("base", 21);
        assert_eq!(engine.checkpoint("seed", &mut scope).unwrap(), Value::Int(42));
        assert_eq!(engine.checkpoint("absent", &mut scope).unwrap(), Value::Nil);
    }

    #[test]
    fn test_intercept_as_converts_overrides() {
        let (engine, _) = engine("breakpoints:\n  fuel: { return: '1' }\n");
        let out: f64 = engine
            .intercept_as("fuel", &mut Scope::new(), || 0.25_f64)
            .unwrap();
        assert_eq!(out, 1.0);
    }

    #[test]
    fn test_failing_phase_stops_later_phases() {
        let (engine, history) = engine(
            r#"
breakpoints:
  fuel:
    pre_call: "inspect('pre')"
    post_call: ["missing_var", "inspect('post')"]
"#,
        );
        let ran = Cell::new(false);
        let result = engine.intercept("fuel", &mut Scope::new(), || ran.set(true));
        assert!(matches!(result, Err(TripwireError::Eval(_))));
        assert!(ran.get());
        assert_eq!(*history.lock().unwrap(), vec![Value::from("pre")]);
    }

    #[test]
    fn test_pre_call_failure_skips_guarded_code() {
        let (engine, _) = engine("breakpoints:\n  fuel: { pre_call: 'assert(false, \"halt\")' }\n");
        let ran = Cell::new(false);
        let result = engine.intercept("fuel", &mut Scope::new(), || ran.set(true));
        assert!(matches!(result, Err(TripwireError::Assertion(msg)) if msg == "halt"));
        assert!(!ran.get());
    }
}
