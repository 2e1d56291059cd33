//! Owns the terminal while the profile view is on screen.

use std::io::{Stdout, stdout};

use color_eyre::eyre::Result;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

/// Alternate screen with raw mode and mouse capture. Restored on
/// [`TerminalSession::leave`] or drop, whichever comes first.
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl TerminalSession {
    pub fn enter() -> Result<Self> {
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        terminal::enable_raw_mode()?;
        // Raw mode is already on; undo it if the screen switch fails
        if let Err(e) = execute!(
            stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(e.into());
        }
        terminal.clear()?;
        debug!("terminal session started");
        Ok(Self {
            terminal,
            active: true,
        })
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Hand the terminal back to the shell. Later calls are no-ops.
    pub fn leave(&mut self) {
        if std::mem::take(&mut self.active) {
            restore();
            debug!("terminal session ended");
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.leave();
    }
}

fn restore() {
    if let Err(e) = execute!(
        stdout(),
        cursor::Show,
        DisableMouseCapture,
        LeaveAlternateScreen
    ) {
        warn!(error = %e, "failed to leave alternate screen");
    }
    if let Err(e) = terminal::disable_raw_mode() {
        warn!(error = %e, "failed to disable raw mode");
    }
}

/// Route panics and eyre reports through a terminal restore so they print
/// on the normal screen. Call before [`TerminalSession::enter`].
pub fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    let panic_hook = panic_hook.into_panic_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        panic_hook(info);
    }));
    Ok(())
}
