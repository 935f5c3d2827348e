use std::collections::BTreeMap;

use async_trait::async_trait;
use interact_spec::FieldSpec;

pub type LoaderError = Box<dyn std::error::Error + Send + Sync>;

/// Fetches the child field list a group token names.
#[async_trait]
pub trait FieldLoader: Send + Sync {
    async fn load(&self, token: &str) -> Result<Vec<FieldSpec>, LoaderError>;
}

/// Adapter for synchronous closures.
pub struct FnLoader<F>(pub F);

#[async_trait]
impl<F> FieldLoader for FnLoader<F>
where
    F: Fn(&str) -> Result<Vec<FieldSpec>, LoaderError> + Send + Sync,
{
    async fn load(&self, token: &str) -> Result<Vec<FieldSpec>, LoaderError> {
        (self.0)(token)
    }
}

// Each load hands out a fresh copy; the engine consumes what it receives.
#[async_trait]
impl FieldLoader for BTreeMap<String, Vec<FieldSpec>> {
    async fn load(&self, token: &str) -> Result<Vec<FieldSpec>, LoaderError> {
        self.get(token)
            .cloned()
            .ok_or_else(|| format!("no fields registered for group '{token}'").into())
    }
}
