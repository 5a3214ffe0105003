// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::StdMutex;
use std::{pin::Pin, sync::Arc};
use tokio::io::AsyncRead;

/// Type alias for a `Send`-able output device (raw terminal, mock, etc).
pub type SendRawTerminal = dyn std::io::Write + Send;
/// Type alias for a `Send`-able raw terminal wrapped in an `Arc<StdMutex>`.
pub type SafeRawTerminal = Arc<StdMutex<SendRawTerminal>>;

/// Type alias for a pinned byte source that is async safe. This is what the reader task
/// pulls raw terminal bytes from.
pub type PinnedInputReader = Pin<Box<dyn AsyncRead + Send>>;
