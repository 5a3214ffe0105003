// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::IntoDiagnostic as _;

pub fn enable_raw_mode() -> miette::Result<()> {
    crossterm::terminal::enable_raw_mode().into_diagnostic()
}

pub fn disable_raw_mode() -> miette::Result<()> {
    crossterm::terminal::disable_raw_mode().into_diagnostic()
}
