use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{LineReader, ReadError};
use crate::theme::{PlaceholderStyle, Theme};

/// A scripted line holding the interrupt byte.
pub const INTERRUPT_LINE: &str = "\u{3}";

/// Shared view of everything a [`ScriptedReader`] wrote and how often it was
/// asked for input. Stays readable after the reader moved into a run.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    inner: Arc<Mutex<TranscriptState>>,
}

#[derive(Debug, Default)]
struct TranscriptState {
    output: String,
    reads: usize,
}

impl Transcript {
    pub fn output(&self) -> String {
        self.inner
            .lock()
            .map(|state| state.output.clone())
            .unwrap_or_default()
    }

    pub fn reads(&self) -> usize {
        self.inner.lock().map(|state| state.reads).unwrap_or_default()
    }

    fn push(&self, text: &str) {
        if let Ok(mut state) = self.inner.lock() {
            state.output.push_str(text);
        }
    }

    fn count_read(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.reads += 1;
        }
    }
}

/// Deterministic reader answering from a fixed list of lines.
///
/// Running out of lines reports closed input; a line containing the
/// interrupt byte rejects the read as an interrupt.
#[derive(Debug)]
pub struct ScriptedReader {
    lines: VecDeque<String>,
    masked: bool,
    theme: Theme,
    placeholder: PlaceholderStyle,
    transcript: Transcript,
}

impl ScriptedReader {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let theme = Theme::plain();
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            masked: false,
            theme,
            placeholder: PlaceholderStyle::for_theme(theme),
            transcript: Transcript::default(),
        }
    }

    pub fn masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self.placeholder = PlaceholderStyle::for_theme(theme);
        self
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

#[async_trait]
impl LineReader for ScriptedReader {
    async fn read_line(
        &mut self,
        prompt: &str,
        placeholder: Option<&str>,
    ) -> Result<String, ReadError> {
        self.transcript.count_read();
        self.transcript.push(prompt);
        let line = self.lines.pop_front().ok_or(ReadError::Closed)?;
        if line.contains(INTERRUPT_LINE) {
            self.transcript.push("\n");
            return Err(ReadError::Interrupted);
        }
        let line = line.trim().to_string();
        match placeholder {
            // The placeholder only survives when nothing was typed.
            Some(text) if line.is_empty() => {
                self.transcript.push(&self.placeholder.render(&self.theme, text))
            }
            _ if self.masked => self.transcript.push(&"*".repeat(line.chars().count())),
            _ => self.transcript.push(&line),
        }
        self.transcript.push("\n");
        Ok(line)
    }

    fn write(&mut self, text: &str) -> Result<(), ReadError> {
        self.transcript.push(text);
        Ok(())
    }
}
