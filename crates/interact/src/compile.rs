use std::sync::Arc;

use async_trait::async_trait;
use interact_spec::{Expr, Validator};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid expression: {0}")]
    Expr(#[from] serde_json::Error),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Turns a data-sourced predicate into something callable. The engine
/// calls this at most once per field.
pub trait PredicateCompiler: Send + Sync {
    fn compile(&self, source: &str) -> Result<Arc<dyn Validator>, CompileError>;
}

/// Compiles JSON expressions such as
/// `{"op": "eq", "left": {"op": "answer"}, "right": {"op": "literal", "value": "YES"}}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExprCompiler;

impl PredicateCompiler for ExprCompiler {
    fn compile(&self, source: &str) -> Result<Arc<dyn Validator>, CompileError> {
        let expr: Expr = serde_json::from_str(source)?;
        expr.check()?;
        Ok(Arc::new(ExprValidator(expr)))
    }
}

/// Compiles a regular expression matched against the answer's text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternCompiler;

impl PredicateCompiler for PatternCompiler {
    fn compile(&self, source: &str) -> Result<Arc<dyn Validator>, CompileError> {
        Ok(Arc::new(PatternValidator(Regex::new(source)?)))
    }
}

/// Expressions when the source looks like a JSON object, patterns otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCompiler;

impl PredicateCompiler for DefaultCompiler {
    fn compile(&self, source: &str) -> Result<Arc<dyn Validator>, CompileError> {
        if source.trim_start().starts_with('{') {
            ExprCompiler.compile(source)
        } else {
            PatternCompiler.compile(source)
        }
    }
}

struct ExprValidator(Expr);

#[async_trait]
impl Validator for ExprValidator {
    async fn validate(&self, answer: &Value) -> bool {
        self.0.accepts(answer)
    }
}

struct PatternValidator(Regex);

#[async_trait]
impl Validator for PatternValidator {
    async fn validate(&self, answer: &Value) -> bool {
        match answer {
            Value::String(text) => self.0.is_match(text),
            Value::Null => self.0.is_match(""),
            other => self.0.is_match(&other.to_string()),
        }
    }
}
