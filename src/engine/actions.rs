//! Runs action strings against a call-site scope.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::trace;

use super::expr::{self, Statement};
use super::functions::FunctionRegistry;
use super::scope::Scope;
use super::value::Value;
use crate::Result;

/// Parsed statements keyed by source text. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ParseCache {
    entries: Arc<RwLock<HashMap<String, Arc<Statement>>>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached statement for `source`, parsing it on first use. Syntax
    /// errors are not cached.
    pub fn statement(&self, source: &str) -> Result<Arc<Statement>> {
        if let Some(cached) = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(source)
        {
            return Ok(Arc::clone(cached));
        }

        let statement = Arc::new(expr::parse(source)?);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(entries.entry(source.to_string()).or_insert(statement)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses (through a [`ParseCache`]) and executes actions
#[derive(Debug, Default)]
pub struct ActionEvaluator {
    functions: FunctionRegistry,
    parsed: ParseCache,
}

impl ActionEvaluator {
    pub fn new(functions: FunctionRegistry) -> Self {
        Self::with_cache(functions, ParseCache::new())
    }

    /// Evaluator that shares an existing parse cache
    pub fn with_cache(functions: FunctionRegistry, parsed: ParseCache) -> Self {
        Self { functions, parsed }
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    fn statement(&self, source: &str) -> Result<Arc<Statement>> {
        self.parsed.statement(source)
    }

    /// Evaluate one expression and return its value
    pub fn eval(&self, source: &str, scope: &mut Scope<'_>) -> Result<Value> {
        let statement = self.statement(source)?;
        expr::execute(&statement, scope, &self.functions)
    }

    /// Evaluate each action in order, discarding results. The first failure
    /// aborts the rest.
    pub fn run<S: AsRef<str>>(&self, actions: &[S], scope: &mut Scope<'_>) -> Result<()> {
        for action in actions {
            let action = action.as_ref();
            trace!(action, "Running action");
            self.eval(action, scope)?;
        }
        Ok(())
    }

    /// Like [`run`](Self::run) with `retval` bound for the duration of the actions
    pub fn run_with_retval<S: AsRef<str>>(
        &self,
        actions: &[S],
        scope: &mut Scope<'_>,
        retval: &Value,
    ) -> Result<()> {
        scope.with_binding("retval", retval.clone(), |scope| self.run(actions, scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TripwireError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn recording_evaluator() -> (ActionEvaluator, Arc<Mutex<Vec<Value>>>) {
        let history = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&history);
        let mut functions = FunctionRegistry::new();
        functions.register("inspect", move |args| {
            sink.lock().unwrap().extend(args.iter().cloned());
            Ok(Value::Nil)
        });
        (ActionEvaluator::new(functions), history)
    }

    #[test]
    fn test_actions_run_in_order() {
        let (evaluator, history) = recording_evaluator();
        let mut scope = Scope::new().bind("n", 1);
        evaluator
            .run(&["inspect(n)", "n = n + 1", "inspect(n)"], &mut scope)
            .unwrap();
        assert_eq!(*history.lock().unwrap(), vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(scope.get("n"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_failure_aborts_remaining_actions() {
        let (evaluator, history) = recording_evaluator();
        let mut scope = Scope::new();
        let result = evaluator.run(&["inspect(1)", "undefined_thing", "inspect(2)"], &mut scope);
        assert!(matches!(result, Err(TripwireError::Eval(_))));
        assert_eq!(*history.lock().unwrap(), vec![Value::Int(1)]);
    }

    #[test]
    fn test_retval_binding_is_scoped() {
        let (evaluator, history) = recording_evaluator();
        let mut scope = Scope::new();
        evaluator
            .run_with_retval(
                &["inspect(retval)", "inspect(retval * 0.5)"],
                &mut scope,
                &Value::Float(1.0),
            )
            .unwrap();
        assert_eq!(
            *history.lock().unwrap(),
            vec![Value::Float(1.0), Value::Float(0.5)]
        );
        assert!(!scope.contains("retval"));
    }

    #[test]
    fn test_parse_cache_reuses_statements() {
        let (evaluator, _) = recording_evaluator();
        let first = evaluator.statement("1 + 1").unwrap();
        let second = evaluator.statement("1 + 1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_parse_cache_is_shared_between_evaluators() {
        let cache = ParseCache::new();
        let a = ActionEvaluator::with_cache(FunctionRegistry::new(), cache.clone());
        let b = ActionEvaluator::with_cache(FunctionRegistry::new(), cache.clone());

        let mut scope = Scope::new().bind("n", 2);
        assert_eq!(a.eval("n * 3", &mut scope).unwrap(), Value::Int(6));
        assert_eq!(b.eval("n * 3", &mut scope).unwrap(), Value::Int(6));
        assert_eq!(cache.len(), 1);

        assert!(b.eval("n *", &mut scope).is_err());
        assert_eq!(cache.len(), 1);
    }
}
