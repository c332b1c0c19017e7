/// Scoped terminal modes (raw mode, alternate screen, mouse capture)
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, stdout};

/// Raw mode, alternate screen, hidden cursor and mouse capture for as long as
/// the guard lives
///
/// Dropping the guard restores the terminal, on early returns and panics
/// alike.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // Built before the remaining modes so a failure below still unwinds
        // raw mode through Drop
        let guard = Self { _private: () };
        execute!(
            stdout(),
            EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = execute!(
            stdout(),
            DisableMouseCapture,
            cursor::Show,
            LeaveAlternateScreen
        ) {
            log::warn!("failed to restore terminal screen: {err}");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            log::warn!("failed to leave raw mode: {err}");
        }
    }
}
