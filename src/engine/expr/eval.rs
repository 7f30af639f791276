//! Tree-walking evaluator.

use std::cmp::Ordering;

use super::parser::{BinOp, Expr, Statement, Target, UnaryOp};
use crate::engine::functions::{call_method, FunctionRegistry};
use crate::engine::scope::Scope;
use crate::engine::value::Value;
use crate::{Result, TripwireError};

/// Run a statement. Assignments yield the assigned value.
pub fn execute(
    statement: &Statement,
    scope: &mut Scope<'_>,
    functions: &FunctionRegistry,
) -> Result<Value> {
    match statement {
        Statement::Expr(expr) => evaluate(expr, scope, functions),
        Statement::Assign { target, value } => {
            let value = evaluate(value, scope, functions)?;
            match target {
                Target::Var(name) => {
                    scope.set(name.as_str(), value.clone());
                }
                Target::Attr(name) => {
                    let receiver = scope
                        .receiver()
                        .ok_or_else(|| TripwireError::Eval("no receiver bound to 'self'".into()))?;
                    receiver.set(name, value.clone())?;
                }
            }
            Ok(value)
        }
    }
}

/// Evaluate an expression. Only assignments mutate the scope, so reads take it shared.
pub fn evaluate(expr: &Expr, scope: &Scope<'_>, functions: &FunctionRegistry) -> Result<Value> {
    match expr {
        Expr::Nil => Ok(Value::Nil),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(x) => Ok(Value::Float(*x)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, scope, functions))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Expr::Var(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| TripwireError::Eval(format!("undefined variable '{}'", name))),
        Expr::SelfRef => {
            let receiver = scope
                .receiver()
                .ok_or_else(|| TripwireError::Eval("no receiver bound to 'self'".into()))?;
            Ok(Value::Str(receiver.type_name().to_string()))
        }
        Expr::Call { name, args } => {
            let args = evaluate_all(args, scope, functions)?;
            functions.call(name, &args)
        }
        Expr::Member { target, name, args } => {
            let args = match args {
                Some(args) => Some(evaluate_all(args, scope, functions)?),
                None => None,
            };
            if matches!(target.as_ref(), Expr::SelfRef) {
                return receiver_member(scope, name, args);
            }
            let target = evaluate(target, scope, functions)?;
            call_method(&target, name, &args.unwrap_or_default())
        }
        Expr::Index { target, index } => {
            let target = evaluate(target, scope, functions)?;
            let index = evaluate(index, scope, functions)?;
            index_value(&target, &index)
        }
        Expr::Unary { op, operand } => {
            let operand = evaluate(operand, scope, functions)?;
            unary(*op, operand)
        }
        Expr::Binary { op: BinOp::And, lhs, rhs } => {
            let lhs = evaluate(lhs, scope, functions)?;
            if lhs.is_truthy() {
                evaluate(rhs, scope, functions)
            } else {
                Ok(lhs)
            }
        }
        Expr::Binary { op: BinOp::Or, lhs, rhs } => {
            let lhs = evaluate(lhs, scope, functions)?;
            if lhs.is_truthy() {
                Ok(lhs)
            } else {
                evaluate(rhs, scope, functions)
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, scope, functions)?;
            let rhs = evaluate(rhs, scope, functions)?;
            binary(*op, lhs, rhs)
        }
    }
}

fn evaluate_all(
    exprs: &[Expr],
    scope: &Scope<'_>,
    functions: &FunctionRegistry,
) -> Result<Vec<Value>> {
    exprs
        .iter()
        .map(|e| evaluate(e, scope, functions))
        .collect()
}

fn receiver_member(scope: &Scope<'_>, name: &str, args: Option<Vec<Value>>) -> Result<Value> {
    let receiver = scope
        .receiver()
        .ok_or_else(|| TripwireError::Eval("no receiver bound to 'self'".into()))?;
    match (name, args) {
        ("type_name", None) => Ok(Value::Str(receiver.type_name().to_string())),
        (_, Some(args)) => receiver.call(name, args),
        (_, None) => receiver.get(name),
    }
}

fn index_value(target: &Value, index: &Value) -> Result<Value> {
    let Value::Int(i) = index else {
        return Err(TripwireError::Eval(format!(
            "index must be an int, got {}",
            index.type_name()
        )));
    };
    let at = |len: usize| -> Option<usize> {
        let len = i64::try_from(len).ok()?;
        let idx = if *i < 0 { len + i } else { *i };
        (0..len).contains(&idx).then_some(idx as usize)
    };
    match target {
        Value::List(items) => Ok(at(items.len())
            .map(|idx| items[idx].clone())
            .unwrap_or(Value::Nil)),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(at(chars.len())
                .map(|idx| Value::Str(chars[idx].to_string()))
                .unwrap_or(Value::Nil))
        }
        other => Err(TripwireError::Eval(format!(
            "cannot index into {}",
            other.type_name()
        ))),
    }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| TripwireError::Eval("integer overflow".into())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, other) => Err(TripwireError::Eval(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}

fn type_mismatch(op: BinOp, lhs: &Value, rhs: &Value) -> TripwireError {
    TripwireError::Eval(format!(
        "unsupported operand types for {:?}: {} and {}",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn overflow() -> TripwireError {
    TripwireError::Eval("integer overflow".into())
}

pub(crate) fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    match op {
        BinOp::Eq => return Ok(Value::Bool(lhs == rhs)),
        BinOp::Ne => return Ok(Value::Bool(lhs != rhs)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| type_mismatch(op, &lhs, &rhs))?;
            let result = match op {
                BinOp::Lt => ordering == Ordering::Less,
                BinOp::Le => ordering != Ordering::Greater,
                BinOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    match (op, &lhs, &rhs) {
        (BinOp::Add, Value::Int(a), Value::Int(b)) => {
            a.checked_add(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Sub, Value::Int(a), Value::Int(b)) => {
            a.checked_sub(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Mul, Value::Int(a), Value::Int(b)) => {
            a.checked_mul(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Div | BinOp::Rem, Value::Int(_), Value::Int(0)) => {
            Err(TripwireError::Eval("divided by 0".into()))
        }
        (BinOp::Div, Value::Int(a), Value::Int(b)) => {
            a.checked_div(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Rem, Value::Int(a), Value::Int(b)) => {
            a.checked_rem(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinOp::Mul, Value::Str(s), Value::Int(n)) => repeat(s, *n),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Rem => a % b,
                _ => return Err(type_mismatch(op, &lhs, &rhs)),
            })),
            _ => Err(type_mismatch(op, &lhs, &rhs)),
        },
    }
}

/// Upper bound on the byte length of a repeated string
const MAX_REPEAT_BYTES: usize = 1 << 20;

fn repeat(s: &str, count: i64) -> Result<Value> {
    let count = usize::try_from(count)
        .map_err(|_| TripwireError::Eval("negative repeat count".into()))?;
    match s.len().checked_mul(count) {
        Some(bytes) if bytes <= MAX_REPEAT_BYTES => Ok(Value::Str(s.repeat(count))),
        _ => Err(TripwireError::Eval("string repeat too large".into())),
    }
}

/// Ordering for numbers (across int/float) and strings
pub(crate) fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
    }
}
