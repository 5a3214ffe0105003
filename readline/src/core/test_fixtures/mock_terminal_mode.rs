// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ReadlineError, ReadlineResult, StdMutex, TerminalModeControl};
use std::{sync::Arc, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalModeCall {
    EnterRawMode,
    ExitRawMode,
    SuspendProcess,
}

/// Records every call made through [`TerminalModeControl`], and can be told to misbehave
/// the way a real terminal sometimes does.
#[derive(Debug, Default)]
pub struct MockTerminalMode {
    pub calls: StdMutex<Vec<TerminalModeCall>>,
    /// Block the calling thread for this long in `suspend_process`, which is what a
    /// `SIGTSTP` looks like to the rest of the process.
    pub suspend_freeze: Option<Duration>,
    /// Fail `exit_raw_mode` with an OS error whose errno is `0`.
    pub exit_fails_with_errno_zero: bool,
    /// Fail `exit_raw_mode` with a real OS error.
    pub exit_fails: bool,
    /// Fail `suspend_process`, like a `SIGTSTP` that can't be raised.
    pub suspend_fails: bool,
}

impl MockTerminalMode {
    #[must_use]
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    #[must_use]
    pub fn new_with_suspend_freeze(freeze: Duration) -> Arc<Self> {
        Arc::new(Self {
            suspend_freeze: Some(freeze),
            ..Default::default()
        })
    }

    #[must_use]
    pub fn new_with_errno_zero_on_exit() -> Arc<Self> {
        Arc::new(Self {
            exit_fails_with_errno_zero: true,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn new_with_failing_exit() -> Arc<Self> {
        Arc::new(Self {
            exit_fails: true,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn new_with_failing_suspend() -> Arc<Self> {
        Arc::new(Self {
            suspend_fails: true,
            ..Default::default()
        })
    }

    /// # Panics
    ///
    /// If the mutex is poisoned.
    #[must_use]
    pub fn get_calls(&self) -> Vec<TerminalModeCall> { self.calls.lock().unwrap().clone() }

    /// # Panics
    ///
    /// If the mutex is poisoned.
    #[must_use]
    pub fn count(&self, call: TerminalModeCall) -> usize {
        self.get_calls().iter().filter(|it| **it == call).count()
    }

    /// # Panics
    ///
    /// If the mutex is poisoned.
    fn record(&self, call: TerminalModeCall) { self.calls.lock().unwrap().push(call); }
}

impl TerminalModeControl for MockTerminalMode {
    fn enter_raw_mode(&self) -> ReadlineResult<()> {
        self.record(TerminalModeCall::EnterRawMode);
        Ok(())
    }

    fn exit_raw_mode(&self) -> ReadlineResult<()> {
        self.record(TerminalModeCall::ExitRawMode);
        if self.exit_fails_with_errno_zero {
            return Err(ReadlineError::IO(std::io::Error::from_raw_os_error(0)));
        }
        if self.exit_fails {
            return Err(ReadlineError::RawMode("tcsetattr: bad file descriptor".into()));
        }
        Ok(())
    }

    fn suspend_process(&self) -> ReadlineResult<()> {
        self.record(TerminalModeCall::SuspendProcess);
        if self.suspend_fails {
            return Err(ReadlineError::RawMode("raise SIGTSTP: operation not permitted".into()));
        }
        if let Some(freeze) = self.suspend_freeze {
            std::thread::sleep(freeze);
        }
        Ok(())
    }
}
