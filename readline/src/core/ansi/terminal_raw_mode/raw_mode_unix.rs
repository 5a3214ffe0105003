// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::miette;
use rustix::{fd::{AsFd, BorrowedFd},
             io::Errno,
             termios::{self, OptionalActions, Termios}};
use std::{fs::File,
          io,
          sync::{LazyLock, Mutex}};

/// Stores the original terminal settings to restore later.
static ORIGINAL_TERMIOS: LazyLock<Mutex<Option<Termios>>> =
    LazyLock::new(|| Mutex::new(None));

/// Either stdin (when it is a tty) or `/dev/tty` (when stdin is redirected).
enum TerminalFd {
    Stdin(io::Stdin),
    DevTty(File),
}

impl AsFd for TerminalFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            TerminalFd::Stdin(stdin) => stdin.as_fd(),
            TerminalFd::DevTty(file) => file.as_fd(),
        }
    }
}

fn get_terminal_fd() -> io::Result<TerminalFd> {
    let stdin = io::stdin();
    if termios::isatty(&stdin) {
        Ok(TerminalFd::Stdin(stdin))
    } else {
        let file = File::options().read(true).write(true).open("/dev/tty")?;
        Ok(TerminalFd::DevTty(file))
    }
}

/// Save the current termios (only the first time) and switch to `cfmakeraw` settings:
/// no canonical mode, no echo, no signal generation, `VMIN=1`, `VTIME=0`.
pub fn enable_raw_mode() -> miette::Result<()> {
    let fd = get_terminal_fd()
        .map_err(|e| miette!("failed to get terminal file descriptor: {e}"))?;

    let mut termios = termios::tcgetattr(&fd)
        .map_err(|e| miette!("failed to retrieve terminal attributes: {e}"))?;

    {
        let mut original = ORIGINAL_TERMIOS
            .lock()
            .map_err(|e| miette!("terminal settings lock poisoned: {e}"))?;
        if original.is_none() {
            *original = Some(termios.clone());
        }
    }

    termios.make_raw();

    termios::tcsetattr(&fd, OptionalActions::Now, &termios)
        .map_err(|e| miette!("failed to set terminal attributes: {e}"))?;

    Ok(())
}

/// Restore the termios saved by [`enable_raw_mode()`]. No-op if raw mode was never
/// enabled.
pub fn disable_raw_mode() -> miette::Result<()> {
    let original = ORIGINAL_TERMIOS
        .lock()
        .map_err(|e| miette!("terminal settings lock poisoned: {e}"))?;

    if let Some(ref termios) = *original {
        let fd = get_terminal_fd()
            .map_err(|e| miette!("failed to get terminal file descriptor: {e}"))?;

        match termios::tcsetattr(&fd, OptionalActions::Now, termios) {
            Ok(()) => {}
            Err(errno) if is_errno_zero(errno) => {}
            Err(errno) => {
                return Err(miette!("failed to set terminal attributes: {errno}"));
            }
        }
    }
    Ok(())
}

fn is_errno_zero(errno: Errno) -> bool { errno.raw_os_error() == 0 }
