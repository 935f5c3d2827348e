use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::predicate::Predicate;

/// Text written between a prompt and the input caret when none is declared.
pub const DEFAULT_DELIMITER: &str = ":";

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// Payload attached to a field or option once it resolves.
///
/// A plain string is a loader token: the owning field becomes a group whose
/// children are fetched on demand. Any other value is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Group(String),
    Static(Value),
}

impl Params {
    /// Maps a raw JSON value onto the group/static split.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(token) => Params::Group(token),
            other => Params::Static(other),
        }
    }

    pub fn group_token(&self) -> Option<&str> {
        match self {
            Params::Group(token) => Some(token),
            Params::Static(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Params::Group(token) => Value::String(token.clone()),
            Params::Static(value) => value.clone(),
        }
    }
}

/// One entry of a single-select field. Its position in the list is its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl SelectOption {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            name: None,
            desc: None,
            params: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(Params::from_value(params));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The option's prompt, else its name, else its index.
    pub fn label(&self, index: usize) -> String {
        [&self.prompt, &self.name]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }
}

/// Declarative shape of one question.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default = "default_delimiter", alias = "delim")]
    pub delimiter: String,
    #[serde(default)]
    pub boolean: bool,
    #[serde(default)]
    pub select: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub params: Option<Params>,
    #[serde(default)]
    pub validation: Option<Predicate>,
    #[serde(default)]
    pub msg: Option<String>,
    /// Answer positions flagged for downstream redaction. Carried untouched.
    #[serde(default)]
    pub shave: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: String::new(),
            description: None,
            hint: None,
            default: None,
            delimiter: default_delimiter(),
            boolean: false,
            select: None,
            params: None,
            validation: None,
            msg: None,
            shave: None,
        }
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn boolean(mut self) -> Self {
        self.boolean = true;
        self
    }

    pub fn select(mut self, options: Vec<SelectOption>) -> Self {
        self.select = Some(options);
        self
    }

    /// Marks the field as a group whose children load under `token`.
    pub fn group(mut self, token: impl Into<String>) -> Self {
        self.params = Some(Params::Group(token.into()));
        self
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(Params::from_value(params));
        self
    }

    pub fn validation(mut self, predicate: Predicate) -> Self {
        self.validation = Some(predicate);
        self
    }

    pub fn msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn shave(mut self, indices: Vec<u64>) -> Self {
        self.shave = Some(Value::from(indices));
        self
    }

    pub fn is_select(&self) -> bool {
        self.select.is_some()
    }

    pub fn group_token(&self) -> Option<&str> {
        self.params.as_ref().and_then(Params::group_token)
    }

    /// Returns the shave list when it is an array of non-negative integers.
    pub fn shave_indices(&self) -> Option<Vec<u64>> {
        self.shave.as_ref().and_then(shave_indices)
    }
}

/// Parses a raw shave value, rejecting anything that is not a list of
/// non-negative integers.
pub fn shave_indices(value: &Value) -> Option<Vec<u64>> {
    value.as_array()?.iter().map(Value::as_u64).collect()
}
