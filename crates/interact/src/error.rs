use std::io;

use thiserror::Error;

use crate::compile::CompileError;
use crate::loader::LoaderError;
use crate::reader::ReadError;

/// Exit status used when a session ends on the interrupt byte.
pub const INTERRUPT_EXIT_CODE: i32 = 130;

/// Fatal failures of a traversal run. Each one destroys the event sink in
/// place of the `final` event.
#[derive(Debug, Error)]
pub enum InteractError {
    #[error("group '{token}' needs a field loader but none is configured")]
    MissingGroupLoader { token: String },
    #[error("missing params for option '{option}' of field '{field}'")]
    MissingOptionParams { field: String, option: String },
    #[error("field '{field}' has an empty select list")]
    EmptySelect { field: String },
    #[error("interrupted")]
    Interrupted,
    #[error("failed to load fields for group '{token}': {source}")]
    Loader {
        token: String,
        #[source]
        source: LoaderError,
    },
    #[error("field '{field}' has a source predicate but no compiler is configured")]
    MissingPredicateCompiler { field: String },
    #[error("failed to compile predicate for field '{field}': {source}")]
    PredicateCompile {
        field: String,
        #[source]
        source: CompileError,
    },
    #[error("input closed while waiting for an answer")]
    InputClosed,
    #[error("terminal i/o failed: {0}")]
    Read(#[from] io::Error),
    #[error("event stream ended before the final event")]
    Incomplete,
}

impl InteractError {
    pub fn is_interrupt(&self) -> bool {
        matches!(self, InteractError::Interrupted)
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_interrupt() {
            INTERRUPT_EXIT_CODE
        } else {
            1
        }
    }
}

impl From<ReadError> for InteractError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Interrupted => InteractError::Interrupted,
            ReadError::Closed => InteractError::InputClosed,
            ReadError::Io(err) => InteractError::Read(err),
        }
    }
}
