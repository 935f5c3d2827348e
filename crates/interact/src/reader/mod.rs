//! Line input for the traversal engine.
//!
//! The engine only ever asks for one submitted line at a time and writes
//! plain text around it; everything terminal-specific stays behind
//! [`LineReader`].

mod scripted;
mod terminal;

use std::io;

use async_trait::async_trait;
use thiserror::Error;

pub use scripted::{INTERRUPT_LINE, ScriptedReader, Transcript};
pub use terminal::TerminalReader;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("interrupted")]
    Interrupted,
    #[error("input closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[async_trait]
pub trait LineReader: Send {
    /// Suspends until a full line is submitted. The result carries no
    /// trailing newline or surrounding whitespace.
    async fn read_line(
        &mut self,
        prompt: &str,
        placeholder: Option<&str>,
    ) -> Result<String, ReadError>;

    fn write(&mut self, text: &str) -> Result<(), ReadError>;
}

#[async_trait]
impl<R> LineReader for Box<R>
where
    R: LineReader + ?Sized,
{
    async fn read_line(
        &mut self,
        prompt: &str,
        placeholder: Option<&str>,
    ) -> Result<String, ReadError> {
        (**self).read_line(prompt, placeholder).await
    }

    fn write(&mut self, text: &str) -> Result<(), ReadError> {
        (**self).write(text)
    }
}
