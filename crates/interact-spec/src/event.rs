use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload of `input`, `confirm` and `select` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldEvent {
    pub trail: Vec<String>,
    pub name: String,
    pub answer: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shave: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Payload of the `enter`/`exit` pair bracketing a group's children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupEvent {
    pub trail: Vec<String>,
    pub name: String,
    pub answer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinalEvent {
    pub success: bool,
}

/// Flat answers produced without reading input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AutosubmitResult {
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shave: BTreeMap<String, Vec<u64>>,
}

/// Unit emitted by one traversal run, serialized as `{ "tag", "data" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "tag", content = "data", rename_all = "snake_case")]
pub enum Event {
    Input(FieldEvent),
    Confirm(FieldEvent),
    Select(FieldEvent),
    Enter(GroupEvent),
    Exit(GroupEvent),
    Autosubmit(AutosubmitResult),
    Final(FinalEvent),
}

impl Event {
    pub fn tag(&self) -> &'static str {
        match self {
            Event::Input(_) => "input",
            Event::Confirm(_) => "confirm",
            Event::Select(_) => "select",
            Event::Enter(_) => "enter",
            Event::Exit(_) => "exit",
            Event::Autosubmit(_) => "autosubmit",
            Event::Final(_) => "final",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Event::Final(_))
    }

    pub fn trail(&self) -> Option<&[String]> {
        match self {
            Event::Input(data) | Event::Confirm(data) | Event::Select(data) => Some(&data.trail),
            Event::Enter(data) | Event::Exit(data) => Some(&data.trail),
            Event::Autosubmit(_) | Event::Final(_) => None,
        }
    }

    pub fn field(&self) -> Option<&FieldEvent> {
        match self {
            Event::Input(data) | Event::Confirm(data) | Event::Select(data) => Some(data),
            _ => None,
        }
    }
}
