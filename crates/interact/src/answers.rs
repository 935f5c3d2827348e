use std::collections::BTreeMap;

use interact_spec::Event;
use serde::Serialize;
use serde_json::{Map, Value};

/// Answers captured from a run, keyed by the dotted trail of each field.
///
/// A select is stored under the field that asked it, not under the chosen
/// label, so `template = <params of the chosen option>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, Value>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut answers = Self::new();
        for event in events {
            answers.record(event);
        }
        answers
    }

    pub fn record(&mut self, event: &Event) {
        match event {
            Event::Input(data) | Event::Confirm(data) => {
                self.0.insert(data.trail.join("."), data.answer.clone());
            }
            Event::Select(data) => {
                let owner = data.trail.len().saturating_sub(1);
                let key = data.trail[..owner].join(".");
                self.0.insert(key, data.answer.clone());
            }
            Event::Autosubmit(result) => {
                for (name, value) in &result.fields {
                    self.0.insert(name.clone(), value.clone());
                }
            }
            Event::Enter(_) | Event::Exit(_) | Event::Final(_) => {}
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect::<Map<_, _>>())
    }
}
