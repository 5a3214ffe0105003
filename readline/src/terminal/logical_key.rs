// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum_macros::EnumIter;

/// A decoded input action, delivered to the consumer of a [`crate::TerminalSession`]
/// one at a time.
///
/// Every value is either a printable [`LogicalKey::Char`] or a member of a closed set of
/// control keys. A partially received escape sequence is never represented here.
///
/// The numeric values returned by [`LogicalKey::code()`] are a stable contract shared
/// with key binding tables in the editing layer:
///
/// | Key             | Code | Key             | Code |
/// |-----------------|------|-----------------|------|
/// | `LineStart`     | 1    | `Next`          | 14   |
/// | `Backward`      | 2    | `Prev`          | 16   |
/// | `Interrupt`     | 3    | `BckSearch`     | 18   |
/// | `Delete`        | 4    | `FwdSearch`     | 19   |
/// | `LineEnd`       | 5    | `Transpose`     | 20   |
/// | `Forward`       | 6    | `CtrlU`         | 21   |
/// | `Bell`          | 7    | `CtrlW`         | 23   |
/// | `CtrlH`         | 8    | `CtrlY`         | 25   |
/// | `Tab`           | 9    | `CtrlZ`         | 26   |
/// | `CtrlJ`         | 10   | `Esc`           | 27   |
/// | `Kill`          | 11   | `Backspace`     | 127  |
/// | `CtrlL`         | 12   | `MetaBackward`  | -1   |
/// | `Enter`         | 13   | `MetaForward`   | -2   |
/// |                 |      | `MetaDelete`    | -3   |
/// |                 |      | `MetaBackspace` | -4   |
/// |                 |      | `MetaTranspose` | -5   |
///
/// C0 control bytes without a name are [`LogicalKey::Control`]. Everything else is a
/// [`LogicalKey::Char`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum LogicalKey {
    LineStart,
    Backward,
    Interrupt,
    Delete,
    LineEnd,
    Forward,
    Bell,
    CtrlH,
    Tab,
    CtrlJ,
    Kill,
    CtrlL,
    Enter,
    Next,
    Prev,
    BckSearch,
    FwdSearch,
    Transpose,
    CtrlU,
    CtrlW,
    CtrlY,
    CtrlZ,
    Esc,
    Backspace,
    MetaBackward,
    MetaForward,
    MetaDelete,
    MetaBackspace,
    MetaTranspose,
    /// A C0 control byte (`0..=31`) that has no name above. `NUL` lands here.
    Control(u8),
    /// Printable rune.
    Char(char),
}

impl LogicalKey {
    /// The numeric code of this key. Runes map to their scalar value.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            LogicalKey::LineStart => 1,
            LogicalKey::Backward => 2,
            LogicalKey::Interrupt => 3,
            LogicalKey::Delete => 4,
            LogicalKey::LineEnd => 5,
            LogicalKey::Forward => 6,
            LogicalKey::Bell => 7,
            LogicalKey::CtrlH => 8,
            LogicalKey::Tab => 9,
            LogicalKey::CtrlJ => 10,
            LogicalKey::Kill => 11,
            LogicalKey::CtrlL => 12,
            LogicalKey::Enter => 13,
            LogicalKey::Next => 14,
            LogicalKey::Prev => 16,
            LogicalKey::BckSearch => 18,
            LogicalKey::FwdSearch => 19,
            LogicalKey::Transpose => 20,
            LogicalKey::CtrlU => 21,
            LogicalKey::CtrlW => 23,
            LogicalKey::CtrlY => 25,
            LogicalKey::CtrlZ => 26,
            LogicalKey::Esc => 27,
            LogicalKey::Backspace => 127,
            LogicalKey::MetaBackward => -1,
            LogicalKey::MetaForward => -2,
            LogicalKey::MetaDelete => -3,
            LogicalKey::MetaBackspace => -4,
            LogicalKey::MetaTranspose => -5,
            LogicalKey::Control(byte) => i32::from(*byte),
            LogicalKey::Char(ch) => *ch as i32,
        }
    }

    /// Inverse of [`LogicalKey::code()`]. Returns [`None`] for negative codes outside
    /// the meta range and for values that are not Unicode scalar values.
    #[must_use]
    pub fn from_code(code: i32) -> Option<LogicalKey> {
        match code {
            -1 => Some(LogicalKey::MetaBackward),
            -2 => Some(LogicalKey::MetaForward),
            -3 => Some(LogicalKey::MetaDelete),
            -4 => Some(LogicalKey::MetaBackspace),
            -5 => Some(LogicalKey::MetaTranspose),
            _ => u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(LogicalKey::from_char),
        }
    }

    /// Classify a single rune read from the terminal, before any escape processing.
    #[must_use]
    pub fn from_char(ch: char) -> LogicalKey {
        match ch {
            '\x01' => LogicalKey::LineStart,
            '\x02' => LogicalKey::Backward,
            '\x03' => LogicalKey::Interrupt,
            '\x04' => LogicalKey::Delete,
            '\x05' => LogicalKey::LineEnd,
            '\x06' => LogicalKey::Forward,
            '\x07' => LogicalKey::Bell,
            '\x08' => LogicalKey::CtrlH,
            '\t' => LogicalKey::Tab,
            '\n' => LogicalKey::CtrlJ,
            '\x0b' => LogicalKey::Kill,
            '\x0c' => LogicalKey::CtrlL,
            '\r' => LogicalKey::Enter,
            '\x0e' => LogicalKey::Next,
            '\x10' => LogicalKey::Prev,
            '\x12' => LogicalKey::BckSearch,
            '\x13' => LogicalKey::FwdSearch,
            '\x14' => LogicalKey::Transpose,
            '\x15' => LogicalKey::CtrlU,
            '\x17' => LogicalKey::CtrlW,
            '\x19' => LogicalKey::CtrlY,
            '\x1a' => LogicalKey::CtrlZ,
            '\x1b' => LogicalKey::Esc,
            '\x7f' => LogicalKey::Backspace,
            it if (it as u32) < 0x20 => LogicalKey::Control(it as u8),
            it => LogicalKey::Char(it),
        }
    }

    #[must_use]
    pub fn is_printable(&self) -> bool { matches!(self, LogicalKey::Char(_)) }

    /// Keys after which the reader task goes back to waiting for a kick, instead of
    /// reading ahead. Everything else is read in a burst (pasted text, held keys).
    #[must_use]
    pub fn ends_read_burst(&self) -> bool {
        matches!(
            self,
            LogicalKey::Enter
                | LogicalKey::CtrlJ
                | LogicalKey::Interrupt
                | LogicalKey::Delete
        )
    }
}
