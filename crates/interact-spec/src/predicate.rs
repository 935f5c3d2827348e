use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept/reject check run on every candidate answer.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, answer: &Value) -> bool;
}

/// Adapter turning a synchronous closure into a [`Validator`].
pub struct FnValidator<F>(pub F);

#[async_trait]
impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    async fn validate(&self, answer: &Value) -> bool {
        (self.0)(answer)
    }
}

/// A field's validation rule.
///
/// `Source` holds untrusted text that must be compiled by an injected
/// compiler before first use; the engine swaps it for the compiled
/// `Native` predicate so it is never compiled twice.
#[derive(Clone)]
pub enum Predicate {
    Native(Arc<dyn Validator>),
    Source(String),
}

impl Predicate {
    pub fn native<F>(check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Predicate::Native(Arc::new(FnValidator(check)))
    }

    pub fn from_validator(validator: impl Validator + 'static) -> Self {
        Predicate::Native(Arc::new(validator))
    }

    pub fn source(source: impl Into<String>) -> Self {
        Predicate::Source(source.into())
    }

    pub fn as_source(&self) -> Option<&str> {
        match self {
            Predicate::Source(source) => Some(source),
            Predicate::Native(_) => None,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Native(_) => f.write_str("Predicate::Native(..)"),
            Predicate::Source(source) => f.debug_tuple("Predicate::Source").field(source).finish(),
        }
    }
}

// Only the source form can come from data.
impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Predicate::Source)
    }
}
