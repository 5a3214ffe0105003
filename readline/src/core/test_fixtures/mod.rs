// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Mocks for the devices and capabilities that a [`crate::TerminalSession`] talks to,
//! so that the reader task, the completion grid, and suspend / resume can be exercised
//! without a real terminal.

// Attach sources.
pub mod input_device_ext_mock;
pub mod mock_terminal_mode;
pub mod output_device_ext;
pub mod stdout_mock;

// Re-export.
pub use input_device_ext_mock::*;
pub use mock_terminal_mode::*;
pub use output_device_ext::*;
pub use stdout_mock::*;
