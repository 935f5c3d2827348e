use std::io::{self, Write};

use async_trait::async_trait;
use crossterm::cursor::{RestorePosition, SavePosition};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use tracing::debug;

use super::{LineReader, ReadError};
use crate::theme::{PlaceholderStyle, Theme};

/// Holds the terminal in raw mode for as long as it lives.
struct RawModeGuard;

impl RawModeGuard {
    fn acquire() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            debug!(%err, "failed to leave raw mode");
        }
    }
}

/// Raw-mode line editor over the process terminal.
///
/// Raw mode is entered in [`TerminalReader::new`] and left when the reader
/// is dropped, so a run releases the terminal on every exit path. Ctrl-C
/// arrives as a key press rather than a signal and rejects the pending read.
pub struct TerminalReader {
    masked: bool,
    theme: Theme,
    placeholder: PlaceholderStyle,
    _raw: RawModeGuard,
}

impl TerminalReader {
    pub fn new(masked: bool, theme: Theme) -> io::Result<Self> {
        let raw = RawModeGuard::acquire()?;
        Ok(Self {
            masked,
            theme,
            placeholder: PlaceholderStyle::for_theme(theme),
            _raw: raw,
        })
    }
}

#[async_trait]
impl LineReader for TerminalReader {
    async fn read_line(
        &mut self,
        prompt: &str,
        placeholder: Option<&str>,
    ) -> Result<String, ReadError> {
        let prompt = prompt.to_string();
        let placeholder = placeholder.map(|text| self.placeholder.render(&self.theme, text));
        let masked = self.masked;
        tokio::task::spawn_blocking(move || edit_line(&prompt, placeholder.as_deref(), masked))
            .await
            .map_err(|err| ReadError::Io(io::Error::other(err)))?
    }

    fn write(&mut self, text: &str) -> Result<(), ReadError> {
        let mut out = io::stdout();
        queue!(out, Print(text.replace('\n', "\r\n")))?;
        out.flush()?;
        Ok(())
    }
}

fn edit_line(prompt: &str, placeholder: Option<&str>, masked: bool) -> Result<String, ReadError> {
    let mut out = io::stdout();
    queue!(out, Print(prompt))?;
    let mut placeholder_visible = false;
    if let Some(text) = placeholder {
        queue!(out, SavePosition, Print(text), RestorePosition)?;
        placeholder_visible = true;
    }
    out.flush()?;

    let mut line = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if control => {
                queue!(out, Print("\r\n"))?;
                out.flush()?;
                return Err(ReadError::Interrupted);
            }
            KeyCode::Char('d') if control && line.is_empty() => {
                queue!(out, Print("\r\n"))?;
                out.flush()?;
                return Err(ReadError::Closed);
            }
            KeyCode::Enter => {
                queue!(out, Clear(ClearType::UntilNewLine), Print("\r\n"))?;
                out.flush()?;
                return Ok(line.trim().to_string());
            }
            KeyCode::Backspace => {
                if line.pop().is_some() {
                    queue!(out, Print("\u{8} \u{8}"))?;
                }
            }
            KeyCode::Char(ch) if !control => {
                if placeholder_visible {
                    queue!(out, Clear(ClearType::UntilNewLine))?;
                    placeholder_visible = false;
                }
                line.push(ch);
                queue!(out, Print(if masked { '*' } else { ch }))?;
            }
            _ => {}
        }
        out.flush()?;
    }
}
