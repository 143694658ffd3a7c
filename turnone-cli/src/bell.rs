//! Terminal Bell
//!
//! Notification sink that rings the terminal bell.

use console::Term;
use turnone_core::{NotificationError, NotificationSink};

const BEL: &str = "\x07";

/// Rings the bell on stderr so it does not interleave with the summary lines.
pub struct TerminalBell {
    term: Term,
}

impl TerminalBell {
    pub fn new() -> Self {
        TerminalBell {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalBell {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for TerminalBell {
    fn play(&self) -> Result<(), NotificationError> {
        self.term
            .write_str(BEL)
            .map_err(|e| NotificationError(e.to_string()))
    }
}
