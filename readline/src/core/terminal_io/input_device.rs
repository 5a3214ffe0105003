// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{PinnedInputReader, global_stdin_reader};

/// This struct represents the raw byte source that the session's reader task decodes.
/// In production it is the process' stdin, read through the process wide reader
/// thread (see [`crate::global_stdin_reader()`]) so that no byte is lost between
/// sessions. See [`crate::InputDeviceExtMock`] for testing features.
#[allow(missing_debug_implementations)]
pub struct InputDevice {
    pub resource: PinnedInputReader,
}

impl InputDevice {
    #[must_use]
    pub fn new_stdin() -> InputDevice {
        InputDevice {
            resource: Box::pin(global_stdin_reader()),
        }
    }
}

impl Default for InputDevice {
    fn default() -> Self { Self::new_stdin() }
}
