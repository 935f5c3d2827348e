#![allow(missing_docs)]

pub mod event;
pub mod expr;
pub mod field;
pub mod predicate;

pub use event::{AutosubmitResult, Event, FieldEvent, FinalEvent, GroupEvent};
pub use expr::Expr;
pub use field::{DEFAULT_DELIMITER, FieldSpec, Params, SelectOption, shave_indices};
pub use predicate::{FnValidator, Predicate, Validator};

/// JSON schema of the event stream, for consumers outside Rust.
pub fn event_schema() -> schemars::Schema {
    schemars::schema_for!(Event)
}
