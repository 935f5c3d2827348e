#![allow(missing_docs)]

//! Declarative terminal prompts driven as a stream of tagged events.
//!
//! An [`Interact`] session walks a list of [`FieldSpec`]s front to back,
//! asks each question through a [`LineReader`], and emits one [`Event`] per
//! resolved field (plus `enter`/`exit` around nested groups) on an
//! [`EventSink`]. The run ends with a `final` event or with the first fatal
//! [`InteractError`].

pub mod answers;
pub mod autosubmit;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compile;
pub mod document;
pub mod engine;
pub mod error;
pub mod loader;
pub mod options;
pub mod reader;
pub mod resolve;
pub mod sink;
pub mod theme;

pub use answers::Answers;
pub use autosubmit::autosubmit;
pub use compile::{CompileError, DefaultCompiler, ExprCompiler, PatternCompiler, PredicateCompiler};
pub use document::{DocumentError, FieldDocument, load_defaults};
pub use engine::{Fields, Interact};
pub use error::{INTERRUPT_EXIT_CODE, InteractError};
pub use loader::{FieldLoader, FnLoader, LoaderError};
pub use options::{InteractOptions, RunOptions};
pub use reader::{INTERRUPT_LINE, LineReader, ReadError, ScriptedReader, TerminalReader, Transcript};
pub use sink::{Completion, EventSink, SinkItem};
pub use theme::{PlaceholderStyle, Theme};

pub use interact_spec::{
    AutosubmitResult, Event, Expr, FieldEvent, FieldSpec, FinalEvent, FnValidator, GroupEvent,
    Params, Predicate, SelectOption, Validator,
};
