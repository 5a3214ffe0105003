// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{OutputDevice, SafeTerminalMode, SystemTerminalMode};
use strum_macros::{Display, EnumString};

/// What to do with a lone `ESC` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EscapePolicy {
    /// `ESC` only starts an escape sequence; it is never delivered as a key.
    #[default]
    Consume,
    /// Deliver [`crate::LogicalKey::Esc`] and also start an escape sequence. Modal
    /// (vi style) editors need this to see the key that leaves insert mode.
    Emit,
}

/// Everything about a session that the caller may swap while it runs. The input device
/// is not here: it is owned by the reader task for the session's whole life.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct TerminalConfig {
    pub output_device: OutputDevice,
    pub escape_policy: EscapePolicy,
    pub terminal_mode: SafeTerminalMode,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            output_device: OutputDevice::new_stdout(),
            escape_policy: EscapePolicy::default(),
            terminal_mode: SystemTerminalMode::new_safe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_escape_policy_from_str() {
        assert_eq!(EscapePolicy::from_str("emit").unwrap(), EscapePolicy::Emit);
        assert_eq!(EscapePolicy::from_str("consume").unwrap(), EscapePolicy::Consume);
        assert!(EscapePolicy::from_str("vim").is_err());
        assert_eq!(EscapePolicy::Emit.to_string(), "emit");
    }
}
