// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Byte and escape sequence constants for the raw terminal stream.
//!
//! The input side constants are the bytes the [`crate::EscapeDecoder`] looks for. The
//! output side constants are the literal ANSI sequences that the completion grid and the
//! terminal session write. Sequences that carry a numeric parameter are produced by the
//! `*_str` helper functions below.

// Input side.

/// `ESC` byte. Starts every escape sequence.
pub const ESC: char = '\x1b';
/// `ESC [` introduces a CSI (Control Sequence Introducer) sequence.
pub const CSI_INTRODUCER: char = '[';
/// `ESC O` introduces an SS3 (Single Shift Three) sequence.
pub const SS3_INTRODUCER: char = 'O';
/// Separator between numeric parameters in a CSI sequence.
pub const CSI_PARAM_SEPARATOR: char = ';';
/// Final byte of a Cursor Position Report: `ESC [ row ; col R`.
pub const DSR_CURSOR_POSITION_FINAL: char = 'R';
/// Final byte for "special keys" like `ESC [ 3 ~` (Delete).
pub const CSI_SPECIAL_KEY_FINAL: char = '~';
/// Parameter that accompanies [`CSI_SPECIAL_KEY_FINAL`] for the Delete key.
pub const CSI_DELETE_PARAM: &str = "3";
/// Longest parameter string kept for one CSI or SS3 sequence. Longer ones are
/// consumed to their final byte and then swallowed.
pub const MAX_ESCAPE_PARAMS_LEN: usize = 32;

// Output side.

/// BEL. Rings the terminal bell.
pub const BELL_STR: &str = "\x07";
/// Erase from the cursor to the end of the screen.
pub const CLEAR_TO_END_OF_SCREEN: &str = "\x1b[J";
/// Black text on a white background. Highlights the chosen candidate.
pub const REVERSE_VIDEO_ON: &str = "\x1b[30;47m";
/// Reset all SGR attributes.
pub const SGR_RESET: &str = "\x1b[0m";
/// Bright black (dim) foreground. Used for candidate comments.
pub const DIM_FG_ON: &str = "\x1b[90m";
/// Default foreground color.
pub const DEFAULT_FG: &str = "\x1b[39m";
/// Device Status Report: ask the terminal for the cursor position. The answer comes
/// back on the input stream as `ESC [ row ; col R`.
pub const DSR_REQUEST_CURSOR_POSITION: &str = "\x1b[6n";

/// Move the cursor up `n` rows, then to column 0. Terminals treat a count of 0 as 1,
/// so no up move is emitted for 0.
#[must_use]
pub fn cursor_up_and_home_str(n: usize) -> String {
    if n == 0 {
        "\r".to_string()
    } else {
        format!("\x1b[{n}A\r")
    }
}

/// Move the cursor right `n` columns. Empty for 0, for the same reason as
/// [`cursor_up_and_home_str()`].
#[must_use]
pub fn cursor_right_str(n: usize) -> String {
    if n == 0 {
        String::new()
    } else {
        format!("\x1b[{n}C")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameterized_sequences() {
        assert_eq!(cursor_up_and_home_str(2), "\x1b[2A\r");
        assert_eq!(cursor_right_str(14), "\x1b[14C");
    }

    #[test]
    fn test_zero_moves_emit_nothing() {
        assert_eq!(cursor_up_and_home_str(0), "\r");
        assert_eq!(cursor_right_str(0), "");
    }
}
