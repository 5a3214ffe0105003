// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

#[cfg(not(any(unix, windows)))]
use miette::miette;

// Import platform-specific implementations
#[cfg(unix)]
use super::raw_mode_unix;
#[cfg(windows)]
use super::raw_mode_windows;

/// Enable raw mode on the terminal.
///
/// # Errors
///
/// Returns miette diagnostic errors if:
/// - Terminal attributes cannot be retrieved or set
/// - Platform is not supported
/// - Lock is poisoned (internal state corruption)
pub fn enable_raw_mode() -> miette::Result<()> {
    #[cfg(unix)]
    {
        raw_mode_unix::enable_raw_mode()
    }

    #[cfg(windows)]
    {
        raw_mode_windows::enable_raw_mode()
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(miette!("Platform not supported"))
    }
}

/// Disable raw mode and restore original terminal settings.
///
/// Safe to call even if raw mode was never enabled (it will be a no-op). A failure
/// whose OS error number is `0` is reported as success, since some platforms return
/// that from a restore that actually worked.
///
/// # Errors
///
/// Returns miette diagnostic errors if:
/// - Terminal attributes cannot be set
/// - Platform is not supported
/// - Lock is poisoned (internal state corruption)
pub fn disable_raw_mode() -> miette::Result<()> {
    #[cfg(unix)]
    {
        raw_mode_unix::disable_raw_mode()
    }

    #[cfg(windows)]
    {
        raw_mode_windows::disable_raw_mode()
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(miette!("Platform not supported"))
    }
}

/// RAII guard that disables raw mode when dropped, unless it was already handed back
/// with [`RawModeGuard::release()`].
#[derive(Debug)]
pub struct RawModeGuard {
    released: bool,
}

impl RawModeGuard {
    /// Create a new guard and enable raw mode.
    ///
    /// # Errors
    ///
    /// See [`enable_raw_mode()`] for error conditions.
    pub fn new() -> miette::Result<Self> {
        enable_raw_mode()?;
        Ok(RawModeGuard { released: false })
    }

    /// Restore the terminal now and report the outcome, instead of swallowing it in
    /// [`Drop`].
    ///
    /// # Errors
    ///
    /// See [`disable_raw_mode()`] for error conditions.
    pub fn release(mut self) -> miette::Result<()> {
        self.released = true;
        disable_raw_mode()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if !self.released {
            drop(disable_raw_mode());
        }
    }
}
