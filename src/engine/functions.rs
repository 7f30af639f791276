//! Callable surface of the expression language: host functions registered
//! by the embedding program, builtins, and methods on values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::coerce::coerce;
use super::expr::eval::compare;
use super::value::Value;
use crate::{Result, TripwireError};

/// A host function callable from action expressions
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Functions reachable by name from expressions
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    host: HashMap<String, HostFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a host function
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.host.insert(name.into(), Arc::new(f));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.host.remove(name).is_some()
    }

    /// Call a host function, falling back to builtins
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        if let Some(f) = self.host.get(name) {
            return f(args);
        }
        call_builtin(name, args)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.host.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("host", &names)
            .finish()
    }
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(TripwireError::Eval(format!(
            "{}() takes {} argument(s), got {}",
            name,
            expected,
            args.len()
        )))
    }
}

fn call_builtin(name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "log" => {
            let message = args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            info!(target: "tripwire::action", "{}", message);
            Ok(Value::Nil)
        }
        "assert" => {
            let Some(condition) = args.first() else {
                return Err(TripwireError::Eval("assert() needs a condition".into()));
            };
            if condition.is_truthy() {
                Ok(Value::Nil)
            } else {
                let message = args
                    .get(1)
                    .map(ToString::to_string)
                    .unwrap_or_else(|| format!("expected truthy value, got {}", condition));
                Err(TripwireError::Assertion(message))
            }
        }
        // min(a, b, ...) or min(list)
        "min" | "max" => {
            let items = match args {
                [Value::List(items)] => items.as_slice(),
                _ => args,
            };
            extremum(items, name == "min")
        }
        "len" => {
            arity(name, args, 1)?;
            call_method(&args[0], "len", &[])
        }
        "str" => {
            arity(name, args, 1)?;
            Ok(Value::Str(args[0].to_string()))
        }
        "int" => {
            arity(name, args, 1)?;
            call_method(&args[0], "to_i", &[])
        }
        "float" => {
            arity(name, args, 1)?;
            call_method(&args[0], "to_f", &[])
        }
        "coerce" => {
            arity(name, args, 1)?;
            Ok(coerce(&args[0]))
        }
        _ => Err(TripwireError::UnknownFunction(name.to_string())),
    }
}

fn extremum(items: &[Value], want_min: bool) -> Result<Value> {
    let mut best: Option<&Value> = None;
    for item in items {
        best = match best {
            None => Some(item),
            Some(current) => {
                let ordering = compare(item, current).ok_or_else(|| {
                    TripwireError::Eval(format!(
                        "cannot compare {} with {}",
                        item.type_name(),
                        current.type_name()
                    ))
                })?;
                let better = if want_min {
                    ordering.is_lt()
                } else {
                    ordering.is_gt()
                };
                Some(if better { item } else { current })
            }
        };
    }
    Ok(best.cloned().unwrap_or(Value::Nil))
}

fn no_method(value: &Value, name: &str) -> TripwireError {
    TripwireError::Eval(format!(
        "undefined method '{}' for {}",
        name,
        value.type_name()
    ))
}

/// Methods on plain values (`[1, 2].max`, `'x'.upcase`, `1.5.round`)
pub fn call_method(value: &Value, name: &str, args: &[Value]) -> Result<Value> {
    match (value, name) {
        (_, "to_s") => return Ok(Value::Str(value.to_string())),
        (_, "is_nil" | "nil?") => return Ok(Value::Bool(value.is_nil())),
        _ => {}
    }

    match value {
        Value::List(items) => match name {
            "min" => extremum(items, true),
            "max" => extremum(items, false),
            "len" | "size" => Ok(Value::Int(items.len() as i64)),
            "first" => Ok(items.first().cloned().unwrap_or(Value::Nil)),
            "last" => Ok(items.last().cloned().unwrap_or(Value::Nil)),
            "reverse" => Ok(Value::List(items.iter().rev().cloned().collect())),
            "sum" => items.iter().try_fold(Value::Int(0), |acc, item| {
                super::expr::eval::binary(super::expr::BinOp::Add, acc, item.clone())
            }),
            "sort" => {
                let mut sorted = items.clone();
                let mut failed = false;
                sorted.sort_by(|a, b| {
                    compare(a, b).unwrap_or_else(|| {
                        failed = true;
                        std::cmp::Ordering::Equal
                    })
                });
                if failed {
                    return Err(TripwireError::Eval("list elements are not comparable".into()));
                }
                Ok(Value::List(sorted))
            }
            "include" | "include?" | "contains" => {
                arity(name, args, 1)?;
                Ok(Value::Bool(items.contains(&args[0])))
            }
            _ => Err(no_method(value, name)),
        },
        Value::Str(s) => match name {
            "len" | "size" => Ok(Value::Int(s.chars().count() as i64)),
            "upcase" => Ok(Value::Str(s.to_uppercase())),
            "downcase" => Ok(Value::Str(s.to_lowercase())),
            "trim" | "strip" => Ok(Value::Str(s.trim().to_string())),
            "to_i" => Ok(match coerce(value) {
                Value::Int(i) => Value::Int(i),
                Value::Float(x) => Value::Int(x.trunc() as i64),
                _ => Value::Int(0),
            }),
            "to_f" => Ok(Value::Float(coerce(value).as_f64().unwrap_or(0.0))),
            "include" | "include?" | "contains" => match args {
                [Value::Str(needle)] => Ok(Value::Bool(s.contains(needle.as_str()))),
                _ => Err(TripwireError::Eval(format!(
                    "{}() expects a string argument",
                    name
                ))),
            },
            _ => Err(no_method(value, name)),
        },
        Value::Int(i) => match name {
            "abs" => i
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| TripwireError::Eval("integer overflow".into())),
            "round" | "floor" | "ceil" | "to_i" => Ok(Value::Int(*i)),
            "to_f" => Ok(Value::Float(*i as f64)),
            _ => Err(no_method(value, name)),
        },
        Value::Float(x) => match name {
            "abs" => Ok(Value::Float(x.abs())),
            "round" => match args {
                [] => Ok(Value::Int(x.round() as i64)),
                [Value::Int(digits)] => {
                    let factor = 10f64.powi(*digits as i32);
                    Ok(Value::Float((x * factor).round() / factor))
                }
                _ => Err(TripwireError::Eval("round() takes an optional int".into())),
            },
            "floor" => Ok(Value::Int(x.floor() as i64)),
            "ceil" => Ok(Value::Int(x.ceil() as i64)),
            "to_i" => Ok(Value::Int(x.trunc() as i64)),
            "to_f" => Ok(Value::Float(*x)),
            _ => Err(no_method(value, name)),
        },
        Value::Bool(_) | Value::Nil => match name {
            "to_i" if value.is_nil() => Ok(Value::Int(0)),
            "to_f" if value.is_nil() => Ok(Value::Float(0.0)),
            _ => Err(no_method(value, name)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn test_list_methods() {
        let list = Value::from(vec![0.2, 0.1, 0.3]);
        assert_eq!(call_method(&list, "min", &[]).unwrap(), Value::Float(0.1));
        assert_eq!(call_method(&list, "max", &[]).unwrap(), Value::Float(0.3));
        assert_eq!(call_method(&list, "len", &[]).unwrap(), Value::Int(3));
        assert_eq!(
            call_method(&Value::from(vec![1, 2, 3]), "sum", &[]).unwrap(),
            Value::Int(6)
        );
        assert_eq!(
            call_method(&Value::from(vec![3, 1, 2]), "sort", &[]).unwrap(),
            Value::from(vec![1, 2, 3])
        );
        assert_eq!(call_method(&Value::List(vec![]), "min", &[]).unwrap(), Value::Nil);
    }

    #[test]
    fn test_scalar_methods() {
        assert_eq!(
            call_method(&Value::from("Fuel"), "upcase", &[]).unwrap(),
            Value::from("FUEL")
        );
        assert_eq!(call_method(&Value::from("5e-1"), "to_f", &[]).unwrap(), Value::Float(0.5));
        assert_eq!(call_method(&Value::Float(2.6), "round", &[]).unwrap(), Value::Int(3));
        assert_eq!(call_method(&Value::Int(-4), "abs", &[]).unwrap(), Value::Int(4));
        assert!(call_method(&Value::Bool(true), "abs", &[]).is_err());
    }

    #[test]
    fn test_host_functions_shadow_builtins() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut registry = FunctionRegistry::new();
        registry.register("log", move |args| {
            sink.lock().unwrap().extend_from_slice(args);
            Ok(Value::Nil)
        });

        registry.call("log", &[Value::Int(1)]).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Value::Int(1)]);

        assert!(registry.unregister("log"));
        assert_eq!(registry.call("log", &[Value::Int(2)]).unwrap(), Value::Nil);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_builtins() {
        let registry = FunctionRegistry::new();
        assert_eq!(
            registry.call("min", &[Value::Int(3), Value::Float(1.5)]).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            registry.call("coerce", &[Value::from("0.5")]).unwrap(),
            Value::Float(0.5)
        );
        assert!(matches!(
            registry.call("assert", &[Value::Bool(false), Value::from("boom")]),
            Err(TripwireError::Assertion(msg)) if msg == "boom"
        ));
        assert!(matches!(
            registry.call("nope", &[]),
            Err(TripwireError::UnknownFunction(_))
        ));
    }
}
