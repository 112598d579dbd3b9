//! Local terminal state: raw mode and dimension probing

use crossterm::terminal;
use tracing::debug;

use super::error::SshError;

/// Local terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    /// Fallback when the controlling terminal cannot be measured.
    pub const DEFAULT: Dimensions = Dimensions {
        width: 80,
        height: 24,
    };
}

/// Current terminal size, falling back to 80x24 when the probe fails
/// (not attached to a terminal, or the ioctl is unavailable).
pub fn dimensions() -> Dimensions {
    terminal::size()
        .map(|(width, height)| Dimensions { width, height })
        .unwrap_or(Dimensions::DEFAULT)
}

/// Puts the controlling terminal into raw mode and guarantees exactly
/// one restoration when dropped, on every exit path including errors
/// after raw mode was entered and panics.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn enter() -> Result<Self, SshError> {
        terminal::enable_raw_mode().map_err(|e| SshError::RawModeFailed(e.to_string()))?;
        debug!("entered raw terminal mode");
        Ok(Self { active: true })
    }

    fn restore(&mut self) {
        if self.active {
            self.active = false;
            // Best effort: there is nothing useful to do if the terminal
            // refuses restoration at teardown.
            let _ = terminal::disable_raw_mode();
            #[cfg(test)]
            tests::RESTORE_COUNT.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            debug!("restored terminal mode");
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
