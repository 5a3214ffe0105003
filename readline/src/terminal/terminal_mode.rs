// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{RawModeGuard, ReadlineError, ReadlineResult, StdMutex};
use std::sync::Arc;

/// The platform side of a terminal session: raw mode transitions and process suspend.
/// The session only sequences these calls. [`SystemTerminalMode`] is the real thing,
/// and [`crate::MockTerminalMode`] records calls for tests.
///
/// Implementations should make both raw mode transitions idempotent.
pub trait TerminalModeControl: Send + Sync {
    /// # Errors
    ///
    /// If the terminal attributes can't be changed.
    fn enter_raw_mode(&self) -> ReadlineResult<()>;

    /// # Errors
    ///
    /// If the original terminal attributes can't be restored.
    fn exit_raw_mode(&self) -> ReadlineResult<()>;

    /// Stop the whole process, as if the user pressed `Ctrl+Z` in cooked mode. Returns
    /// once the process has been continued.
    ///
    /// # Errors
    ///
    /// If the stop signal can't be raised.
    fn suspend_process(&self) -> ReadlineResult<()>;
}

pub type SafeTerminalMode = Arc<dyn TerminalModeControl>;

/// Some platforms report a successful terminal restore as a failure with OS error
/// number `0`.
///
/// # Errors
///
/// Any other error is passed through.
pub fn ignore_errno_zero(result: ReadlineResult<()>) -> ReadlineResult<()> {
    match result {
        Err(ReadlineError::IO(ref error)) if error.raw_os_error() == Some(0) => Ok(()),
        other => other,
    }
}

/// Raw mode via termios (see [`mod@crate::core::ansi::terminal_raw_mode`]), and suspend
/// via `SIGTSTP`.
#[derive(Debug, Default)]
pub struct SystemTerminalMode {
    guard: StdMutex<Option<RawModeGuard>>,
}

impl SystemTerminalMode {
    #[must_use]
    pub fn new_safe() -> SafeTerminalMode { Arc::new(Self::default()) }

    fn lock_guard(
        &self,
    ) -> ReadlineResult<std::sync::MutexGuard<'_, Option<RawModeGuard>>> {
        self.guard
            .lock()
            .map_err(|e| ReadlineError::RawMode(format!("raw mode lock poisoned: {e}")))
    }
}

impl TerminalModeControl for SystemTerminalMode {
    fn enter_raw_mode(&self) -> ReadlineResult<()> {
        let mut guard = self.lock_guard()?;
        if guard.is_none() {
            *guard = Some(RawModeGuard::new()?);
        }
        Ok(())
    }

    fn exit_raw_mode(&self) -> ReadlineResult<()> {
        let taken = self.lock_guard()?.take();
        if let Some(raw_mode_guard) = taken {
            raw_mode_guard.release()?;
        }
        Ok(())
    }

    fn suspend_process(&self) -> ReadlineResult<()> {
        #[cfg(unix)]
        {
            signal_hook::low_level::raise(signal_hook::consts::SIGTSTP)?;
        }
        Ok(())
    }
}
