//! Hidden password entry on the controlling terminal

use super::Credential;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, IsTerminal, Write};
use zeroize::Zeroizing;

/// Asks the user for a secret
pub trait Prompter: Send + Sync {
    /// Show `message` and read a secret without echoing it
    fn prompt_secret(&self, message: &str) -> io::Result<Credential>;
}

/// Reads a password from the terminal with echo switched off
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn prompt_secret(&self, message: &str) -> io::Result<Credential> {
        if !io::stdin().is_terminal() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        write!(stderr, "{}", message)?;
        stderr.flush()?;

        terminal::enable_raw_mode()?;
        let line = read_hidden_line();
        // Always restore the terminal, even when reading failed
        terminal::disable_raw_mode()?;
        writeln!(stderr)?;

        line.map(|mut s| Credential::new(std::mem::take(&mut *s)))
    }
}

/// What a single key press did to the line being typed
#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Submit,
    Abort,
}

fn read_hidden_line() -> io::Result<Zeroizing<String>> {
    let mut input = Zeroizing::new(String::new());
    loop {
        if let Event::Key(key) = event::read()? {
            match apply_key(&mut input, key) {
                KeyOutcome::Continue => {}
                KeyOutcome::Submit => return Ok(input),
                KeyOutcome::Abort => {
                    return Err(io::Error::new(
                        io::ErrorKind::Interrupted,
                        "password entry cancelled",
                    ))
                }
            }
        }
    }
}

fn apply_key(input: &mut String, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Continue;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Enter, _) => KeyOutcome::Submit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL)
        | (KeyCode::Char('d'), KeyModifiers::CONTROL)
        | (KeyCode::Esc, _) => KeyOutcome::Abort,
        (KeyCode::Backspace, _) => {
            input.pop();
            KeyOutcome::Continue
        }
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
            input.push(c);
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}
