use std::cmp::Ordering;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Small expression AST used for data-sourced validation rules.
///
/// Expressions are evaluated against `{"answer": <candidate>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Value,
    },
    Answer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    NonEmpty {
        expression: Box<Expr>,
    },
    Len {
        expression: Box<Expr>,
    },
    Matches {
        expression: Box<Expr>,
        pattern: String,
    },
    And {
        expressions: Vec<Expr>,
    },
    Or {
        expressions: Vec<Expr>,
    },
    Not {
        expression: Box<Expr>,
    },
    Eq {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ne {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Lt {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Lte {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Gt {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Gte {
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Checks every embedded pattern compiles. Returns the first failure.
    pub fn check(&self) -> Result<(), regex::Error> {
        match self {
            Expr::Literal { .. } | Expr::Answer { .. } => Ok(()),
            Expr::Matches {
                expression,
                pattern,
            } => {
                Regex::new(pattern)?;
                expression.check()
            }
            Expr::NonEmpty { expression } | Expr::Len { expression } | Expr::Not { expression } => {
                expression.check()
            }
            Expr::And { expressions } | Expr::Or { expressions } => {
                expressions.iter().try_for_each(Expr::check)
            }
            Expr::Eq { left, right }
            | Expr::Ne { left, right }
            | Expr::Lt { left, right }
            | Expr::Lte { left, right }
            | Expr::Gt { left, right }
            | Expr::Gte { left, right } => {
                left.check()?;
                right.check()
            }
        }
    }

    /// Evaluates against a candidate answer. Undecidable rules reject.
    pub fn accepts(&self, answer: &Value) -> bool {
        let ctx = json!({ "answer": answer });
        self.evaluate_bool(&ctx).unwrap_or(false)
    }

    /// Value of the expression in `ctx`, or `None` when it cannot be decided.
    pub fn evaluate_value(&self, ctx: &Value) -> Option<Value> {
        let value = match self {
            Expr::Literal { value } => value.clone(),
            Expr::Answer { path } => answer_at(ctx, path.as_deref())?.clone(),
            Expr::NonEmpty { expression } => {
                Value::Bool(is_present(&expression.evaluate_value(ctx)?))
            }
            Expr::Len { expression } => {
                Value::from(length_of(&expression.evaluate_value(ctx)?)?)
            }
            Expr::Matches {
                expression,
                pattern,
            } => {
                let candidate = expression.evaluate_value(ctx)?;
                let regex = Regex::new(pattern).ok()?;
                Value::Bool(regex.is_match(candidate.as_str()?))
            }
            Expr::And { expressions } => Value::Bool(all_of(expressions, ctx)?),
            Expr::Or { expressions } => Value::Bool(any_of(expressions, ctx)?),
            Expr::Not { expression } => Value::Bool(!expression.evaluate_bool(ctx)?),
            Expr::Eq { left, right } => {
                let (left, right) = operands(left, right, ctx)?;
                Value::Bool(left == right)
            }
            Expr::Ne { left, right } => {
                let (left, right) = operands(left, right, ctx)?;
                Value::Bool(left != right)
            }
            Expr::Lt { left, right } => Value::Bool(ordering(left, right, ctx)?.is_lt()),
            Expr::Lte { left, right } => Value::Bool(ordering(left, right, ctx)?.is_le()),
            Expr::Gt { left, right } => Value::Bool(ordering(left, right, ctx)?.is_gt()),
            Expr::Gte { left, right } => Value::Bool(ordering(left, right, ctx)?.is_ge()),
        };
        Some(value)
    }

    /// Truth of the expression in `ctx`. Strings such as `"yes"` and `"0"`
    /// count; other non-boolean results are undecidable.
    pub fn evaluate_bool(&self, ctx: &Value) -> Option<bool> {
        match self.evaluate_value(ctx)? {
            Value::Bool(flag) => Some(flag),
            Value::Null => Some(false),
            Value::Number(number) => Some(number.as_f64()? != 0.0),
            Value::String(text) => {
                let text = text.to_ascii_lowercase();
                if matches!(text.as_str(), "true" | "yes" | "y" | "1") {
                    Some(true)
                } else if matches!(text.as_str(), "false" | "no" | "n" | "0" | "") {
                    Some(false)
                } else {
                    None
                }
            }
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

fn operands(left: &Expr, right: &Expr, ctx: &Value) -> Option<(Value, Value)> {
    Some((left.evaluate_value(ctx)?, right.evaluate_value(ctx)?))
}

fn ordering(left: &Expr, right: &Expr, ctx: &Value) -> Option<Ordering> {
    match operands(left, right, ctx)? {
        (Value::Number(left), Value::Number(right)) => {
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }
        (Value::String(left), Value::String(right)) => Some(left.cmp(&right)),
        (left, right) => (left == right).then_some(Ordering::Equal),
    }
}

// A definite `false` short-circuits even past undecidable terms.
fn all_of(expressions: &[Expr], ctx: &Value) -> Option<bool> {
    let mut decided = true;
    for expression in expressions {
        match expression.evaluate_bool(ctx) {
            Some(false) => return Some(false),
            Some(true) => {}
            None => decided = false,
        }
    }
    decided.then_some(true)
}

fn any_of(expressions: &[Expr], ctx: &Value) -> Option<bool> {
    let mut decided = true;
    for expression in expressions {
        match expression.evaluate_bool(ctx) {
            Some(true) => return Some(true),
            Some(false) => {}
            None => decided = false,
        }
    }
    decided.then_some(false)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

/// Resolves `path` inside the candidate answer. Paths are JSON pointers when
/// they start with `/`, dotted keys and indices otherwise.
fn answer_at<'a>(ctx: &'a Value, path: Option<&str>) -> Option<&'a Value> {
    let answer = ctx.get("answer")?;
    match path {
        None => Some(answer),
        Some(pointer) if pointer.starts_with('/') => answer.pointer(pointer),
        Some(dotted) => dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(answer, |current, segment| match segment.parse::<usize>() {
                Ok(index) => current.get(index),
                Err(_) => current.get(segment),
            }),
    }
}
