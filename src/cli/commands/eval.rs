use tracing::debug;

use super::CommandHandler;
use crate::engine::{ActionEvaluator, FunctionRegistry, Scope, Value};
use crate::Result;

/// Handler for the `eval` command
pub struct EvalCommand {
    pub expression: String,
    pub vars: Vec<(String, Value)>,
}

impl CommandHandler for EvalCommand {
    fn execute(&self) -> Result<()> {
        let value = self.evaluate()?;
        println!("{}", value);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "eval"
    }
}

impl EvalCommand {
    pub fn new(expression: String, vars: Vec<(String, Value)>) -> Self {
        Self { expression, vars }
    }

    /// Evaluate with only builtins available
    pub fn evaluate(&self) -> Result<Value> {
        let mut scope = Scope::new();
        for (name, value) in &self.vars {
            scope.set(name.as_str(), value.clone());
        }
        debug!(expression = %self.expression, bindings = self.vars.len(), "Evaluating");
        ActionEvaluator::new(FunctionRegistry::new()).eval(&self.expression, &mut scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_with_bindings() {
        let command = EvalCommand::new(
            "amount / (divider * 2.0)".into(),
            vec![
                ("amount".into(), Value::Int(80)),
                ("divider".into(), Value::Float(100.0)),
            ],
        );
        assert_eq!(command.evaluate().unwrap(), Value::Float(0.4));
    }

    #[test]
    fn test_unknown_variable_fails() {
        let command = EvalCommand::new("missing * 2".into(), vec![]);
        assert!(command.evaluate().is_err());
    }
}
