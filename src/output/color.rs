use crossterm::tty::IsTty;
use std::io;
use tracing::debug;

/// How the user asked colors to be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    /// Color only when stdout is a terminal and `NO_COLOR` is unset.
    Auto,
    /// Never emit escape sequences.
    Never,
}

/// Scoped hold on terminal coloring for the duration of a run.
///
/// Creating the scope fixes whether `colored` emits escape sequences for every
/// message and diff line printed afterwards; dropping it restores the crate's
/// default environment-driven behavior. Keep it alive in `main` so it is released
/// on every exit path, including errors.
#[derive(Debug)]
pub struct ColorScope {
    /// Whether escape sequences are emitted while the scope is alive.
    enabled: bool,
}

impl ColorScope {
    /// Acquire the terminal for colored output according to `choice`.
    #[must_use]
    pub fn acquire(choice: ColorChoice) -> Self {
        let enabled = match choice {
            ColorChoice::Never => false,
            ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && io::stdout().is_tty(),
        };

        #[cfg(windows)]
        let enabled = enabled && colored::control::set_virtual_terminal(true).is_ok();

        colored::control::set_override(enabled);
        debug!(?choice, enabled, "Color scope acquired");
        Self { enabled }
    }

    /// Whether colored output is active for this run.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for ColorScope {
    fn drop(&mut self) {
        colored::control::unset_override();
        debug!("Color scope released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colored::Colorize;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_never_disables_escapes_until_dropped() {
        {
            let scope = ColorScope::acquire(ColorChoice::Never);
            assert!(!scope.enabled());
            assert_eq!("plain".red().to_string(), "plain");
        }
        colored::control::set_override(true);
        assert_ne!("plain".red().to_string(), "plain");
        colored::control::unset_override();
    }
}
