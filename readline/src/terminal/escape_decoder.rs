// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Turns the rune stream of a raw mode terminal into [`LogicalKey`]s.
//!
//! Terminals encode cursor keys and friends as multi-byte escape sequences. The decoder
//! is fed one rune at a time, and each rune resolves to exactly one [`DecodeOutcome`].
//! Anything that starts with `ESC` but isn't understood is swallowed, so that raw
//! escape bytes never show up downstream as if they were typed text.
//!
//! ```text
//!            ESC                '['                  digit | ';'
//! Normal ──────────▶ Escape ───────────▶ EscapeCsi ◀───────────┐
//!   ▲                 │  │    'O'                 │ ────────────┘
//!   │                 │  └───────────▶ EscapeSs3  │ final byte
//!   │    other rune   │               (same as    │
//!   └─────────────────┘                CSI)       ▼
//!   ◀──────────────────────────────────────────── Normal
//! ```

use crate::{CSI_DELETE_PARAM, CSI_INTRODUCER, CSI_PARAM_SEPARATOR, CSI_SPECIAL_KEY_FINAL,
            DSR_CURSOR_POSITION_FINAL, ESC, EscapePolicy, LogicalKey, MAX_ESCAPE_PARAMS_LEN,
            SS3_INTRODUCER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Normal,
    /// Saw `ESC`.
    Escape,
    /// Saw `ESC [`.
    EscapeCsi,
    /// Saw `ESC O`.
    EscapeSs3,
}

/// 1-based cursor position, as reported by the terminal in response to `ESC [ 6 n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub row: usize,
    pub col: usize,
}

impl CursorPosition {
    /// Parse the `row;col` parameter string of a cursor position report. Both numbers
    /// must be present; anything after the second one is ignored.
    #[must_use]
    pub fn parse(params: &str) -> Option<Self> {
        let mut it = params.split(CSI_PARAM_SEPARATOR);
        let row = it.next()?.parse::<usize>().ok()?;
        let col = it.next()?.parse::<usize>().ok()?;
        Some(Self { row, col })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A complete key.
    Key(LogicalKey),
    /// In the middle of an escape sequence. Feed the next rune.
    Pending,
    /// An escape sequence finished, but it doesn't map to a key.
    Swallowed,
    /// A cursor position report finished. This is out-of-band data, not a key.
    CursorPositionReport(CursorPosition),
}

/// Escape sequence state machine. One instance per reader task; the state never
/// outlives the session.
#[derive(Debug, Clone)]
pub struct EscapeDecoder {
    state: DecoderState,
    params: String,
    /// Set once `params` hit [`MAX_ESCAPE_PARAMS_LEN`]. The sequence is swallowed.
    is_overflowed: bool,
    policy: EscapePolicy,
}

impl Default for EscapeDecoder {
    fn default() -> Self { Self::new(EscapePolicy::default()) }
}

impl EscapeDecoder {
    #[must_use]
    pub fn new(policy: EscapePolicy) -> Self {
        Self {
            state: DecoderState::Normal,
            params: String::new(),
            is_overflowed: false,
            policy,
        }
    }

    #[must_use]
    pub fn state(&self) -> DecoderState { self.state }

    pub fn set_policy(&mut self, policy: EscapePolicy) { self.policy = policy; }

    /// Drop any partially decoded sequence.
    pub fn reset(&mut self) {
        self.state = DecoderState::Normal;
        self.params.clear();
        self.is_overflowed = false;
    }

    pub fn feed(&mut self, ch: char) -> DecodeOutcome {
        match self.state {
            DecoderState::Normal => {
                if ch == ESC {
                    self.enter_escape()
                } else {
                    DecodeOutcome::Key(LogicalKey::from_char(ch))
                }
            }
            DecoderState::Escape => match ch {
                CSI_INTRODUCER => {
                    self.state = DecoderState::EscapeCsi;
                    DecodeOutcome::Pending
                }
                SS3_INTRODUCER => {
                    self.state = DecoderState::EscapeSs3;
                    DecodeOutcome::Pending
                }
                // `ESC ESC`: the second one starts over.
                ESC => self.enter_escape(),
                _ => {
                    self.state = DecoderState::Normal;
                    DecodeOutcome::Key(meta_key(ch))
                }
            },
            DecoderState::EscapeCsi | DecoderState::EscapeSs3 => {
                if ch.is_ascii_digit() || ch == CSI_PARAM_SEPARATOR {
                    if self.params.len() < MAX_ESCAPE_PARAMS_LEN {
                        self.params.push(ch);
                    } else {
                        self.is_overflowed = true;
                    }
                    return DecodeOutcome::Pending;
                }
                let is_csi = self.state == DecoderState::EscapeCsi;
                let params = std::mem::take(&mut self.params);
                let is_overflowed = std::mem::take(&mut self.is_overflowed);
                self.state = DecoderState::Normal;
                if is_overflowed {
                    DecodeOutcome::Swallowed
                } else if is_csi {
                    csi_outcome(ch, &params)
                } else {
                    ss3_outcome(ch)
                }
            }
        }
    }

    fn enter_escape(&mut self) -> DecodeOutcome {
        self.state = DecoderState::Escape;
        match self.policy {
            EscapePolicy::Consume => DecodeOutcome::Pending,
            EscapePolicy::Emit => DecodeOutcome::Key(LogicalKey::Esc),
        }
    }
}

/// `ESC <rune>`. Unmapped runes pass through as themselves.
fn meta_key(ch: char) -> LogicalKey {
    match ch {
        'b' => LogicalKey::MetaBackward,
        'f' => LogicalKey::MetaForward,
        'd' => LogicalKey::MetaDelete,
        '\x14' => LogicalKey::MetaTranspose,
        '\x7f' => LogicalKey::MetaBackspace,
        _ => LogicalKey::from_char(ch),
    }
}

/// Final bytes shared by CSI and SS3.
fn cursor_key(final_byte: char) -> Option<LogicalKey> {
    match final_byte {
        'A' => Some(LogicalKey::Prev),
        'B' => Some(LogicalKey::Next),
        'C' => Some(LogicalKey::Forward),
        'D' => Some(LogicalKey::Backward),
        'H' => Some(LogicalKey::LineStart),
        'F' => Some(LogicalKey::LineEnd),
        _ => None,
    }
}

fn csi_outcome(final_byte: char, params: &str) -> DecodeOutcome {
    if final_byte == DSR_CURSOR_POSITION_FINAL {
        return match CursorPosition::parse(params) {
            Some(pos) => DecodeOutcome::CursorPositionReport(pos),
            None => DecodeOutcome::Swallowed,
        };
    }
    if final_byte == CSI_SPECIAL_KEY_FINAL {
        return if params == CSI_DELETE_PARAM {
            DecodeOutcome::Key(LogicalKey::Delete)
        } else {
            DecodeOutcome::Swallowed
        };
    }
    cursor_key(final_byte).map_or(DecodeOutcome::Swallowed, DecodeOutcome::Key)
}

fn ss3_outcome(final_byte: char) -> DecodeOutcome {
    cursor_key(final_byte).map_or(DecodeOutcome::Swallowed, DecodeOutcome::Key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    /// Feed every rune, and collect everything that isn't [`DecodeOutcome::Pending`].
    fn decode_all(decoder: &mut EscapeDecoder, input: &str) -> Vec<DecodeOutcome> {
        input
            .chars()
            .map(|ch| decoder.feed(ch))
            .filter(|it| *it != DecodeOutcome::Pending)
            .collect()
    }

    #[test_case("\x1b[A", LogicalKey::Prev ; "csi up")]
    #[test_case("\x1b[B", LogicalKey::Next ; "csi down")]
    #[test_case("\x1b[C", LogicalKey::Forward ; "csi right")]
    #[test_case("\x1b[D", LogicalKey::Backward ; "csi left")]
    #[test_case("\x1b[H", LogicalKey::LineStart ; "csi home")]
    #[test_case("\x1b[F", LogicalKey::LineEnd ; "csi end")]
    #[test_case("\x1b[3~", LogicalKey::Delete ; "csi delete")]
    #[test_case("\x1bOA", LogicalKey::Prev ; "ss3 up")]
    #[test_case("\x1bOD", LogicalKey::Backward ; "ss3 left")]
    #[test_case("\x1bOH", LogicalKey::LineStart ; "ss3 home")]
    #[test_case("\x1bOF", LogicalKey::LineEnd ; "ss3 end")]
    #[test_case("\x1bb", LogicalKey::MetaBackward ; "meta b")]
    #[test_case("\x1bf", LogicalKey::MetaForward ; "meta f")]
    #[test_case("\x1bd", LogicalKey::MetaDelete ; "meta d")]
    #[test_case("\x1b\x7f", LogicalKey::MetaBackspace ; "meta backspace")]
    #[test_case("\x1b\x14", LogicalKey::MetaTranspose ; "meta transpose")]
    #[test_case("\x1bx", LogicalKey::Char('x') ; "meta passthrough")]
    fn test_complete_sequence(input: &str, expected: LogicalKey) {
        let mut decoder = EscapeDecoder::default();
        assert_eq!(decode_all(&mut decoder, input), vec![DecodeOutcome::Key(expected)]);
        assert_eq!(decoder.state(), DecoderState::Normal);
    }

    #[test]
    fn test_sequence_state_does_not_bleed_into_next_key() {
        let mut decoder = EscapeDecoder::default();
        assert_eq!(
            decode_all(&mut decoder, "\x1b[1;5Da\x1b[3~b"),
            vec![
                DecodeOutcome::Key(LogicalKey::Backward),
                DecodeOutcome::Key(LogicalKey::Char('a')),
                DecodeOutcome::Key(LogicalKey::Delete),
                DecodeOutcome::Key(LogicalKey::Char('b')),
            ]
        );
    }

    #[test_case("\x1b[5~" ; "page up is not supported")]
    #[test_case("\x1b[Z" ; "unknown final byte")]
    #[test_case("\x1bO~" ; "tilde is csi only")]
    #[test_case("\x1bOR" ; "report is csi only")]
    #[test_case("\x1b[12R" ; "report needs two numbers")]
    fn test_unrecognized_sequence_is_swallowed(input: &str) {
        let mut decoder = EscapeDecoder::default();
        assert_eq!(decode_all(&mut decoder, input), vec![DecodeOutcome::Swallowed]);
        assert_eq!(decoder.state(), DecoderState::Normal);
    }

    #[test]
    fn test_incomplete_prefix_then_unrelated_byte_has_no_phantom_key() {
        let mut decoder = EscapeDecoder::default();
        // `ESC [ 1` is cut short by a printable rune, which closes the sequence.
        assert_eq!(
            decode_all(&mut decoder, "\x1b[1xy"),
            vec![
                DecodeOutcome::Swallowed,
                DecodeOutcome::Key(LogicalKey::Char('y'))
            ]
        );
    }

    #[test]
    fn test_cursor_position_report() {
        let mut decoder = EscapeDecoder::default();
        assert_eq!(
            decode_all(&mut decoder, "\x1b[24;80R"),
            vec![DecodeOutcome::CursorPositionReport(CursorPosition {
                row: 24,
                col: 80
            })]
        );
    }

    #[test]
    fn test_double_escape_stays_in_escape() {
        let mut decoder = EscapeDecoder::default();
        assert_eq!(decoder.feed(ESC), DecodeOutcome::Pending);
        assert_eq!(decoder.feed(ESC), DecodeOutcome::Pending);
        assert_eq!(decoder.state(), DecoderState::Escape);
        assert_eq!(decoder.feed('b'), DecodeOutcome::Key(LogicalKey::MetaBackward));
    }

    #[test]
    fn test_emit_policy_delivers_escape_and_still_decodes() {
        let mut decoder = EscapeDecoder::new(EscapePolicy::Emit);
        assert_eq!(
            decode_all(&mut decoder, "\x1b[A"),
            vec![
                DecodeOutcome::Key(LogicalKey::Esc),
                DecodeOutcome::Key(LogicalKey::Prev)
            ]
        );
    }

    #[test]
    fn test_nul_is_a_regular_key() {
        let mut decoder = EscapeDecoder::default();
        assert_eq!(decoder.feed('\0'), DecodeOutcome::Key(LogicalKey::Control(0)));
    }

    #[test]
    fn test_reset_drops_partial_sequence() {
        let mut decoder = EscapeDecoder::default();
        decoder.feed(ESC);
        decoder.feed('[');
        decoder.feed('3');
        decoder.reset();
        assert_eq!(decoder.feed('~'), DecodeOutcome::Key(LogicalKey::Char('~')));
    }

    #[test]
    fn test_oversized_params_are_swallowed() {
        let mut decoder = EscapeDecoder::default();
        assert_eq!(decoder.feed(ESC), DecodeOutcome::Pending);
        assert_eq!(decoder.feed('['), DecodeOutcome::Pending);
        for _ in 0..100 {
            assert_eq!(decoder.feed('1'), DecodeOutcome::Pending);
        }
        assert!(decoder.params.len() <= MAX_ESCAPE_PARAMS_LEN);
        assert_eq!(decoder.feed('A'), DecodeOutcome::Swallowed);
        assert_eq!(decoder.state(), DecoderState::Normal);
        assert_eq!(decoder.feed('x'), DecodeOutcome::Key(LogicalKey::Char('x')));

        // The next sequence starts clean.
        assert_eq!(
            decode_all(&mut decoder, "\x1b[A"),
            vec![DecodeOutcome::Key(LogicalKey::Prev)]
        );
    }

    #[test_case("3;7", Some(CursorPosition { row: 3, col: 7 }) ; "row and col")]
    #[test_case("3;7;9", Some(CursorPosition { row: 3, col: 7 }) ; "extra param ignored")]
    #[test_case("3;", None ; "missing col")]
    #[test_case(";7", None ; "missing row")]
    #[test_case("", None ; "empty")]
    fn test_cursor_position_parse(params: &str, expected: Option<CursorPosition>) {
        assert_eq!(CursorPosition::parse(params), expected);
    }
}
