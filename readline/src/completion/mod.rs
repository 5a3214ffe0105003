// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod auto_complete;
pub mod line_buffer;
pub mod op_completer;
pub mod prefix_completer;
pub mod runes;

// Re-export.
pub use auto_complete::*;
pub use line_buffer::*;
pub use op_completer::*;
pub use prefix_completer::*;
pub use runes::*;
