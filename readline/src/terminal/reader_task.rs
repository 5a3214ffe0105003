// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The dedicated task that owns the raw input stream of a [`crate::TerminalSession`].
//!
//! It is gated by a "kick": after a key that ends a read burst (see
//! [`LogicalKey::ends_read_burst()`]) it parks until the consumer asks for more input.
//! Every decoded key is handed over through a rendezvous: the task waits until the
//! consumer has taken the key before it reads another rune. Shutdown is checked at
//! every point where the task can block.

use crate::{CursorPosition, DEBUG_READLINE, DecodeOutcome, EscapeDecoder, InputDevice,
            LogicalKey, StdMutex, TerminalConfig};
use std::{io::{self, ErrorKind},
          sync::{Arc,
                 atomic::{AtomicBool, Ordering}}};
use tokio::{io::{AsyncRead, AsyncReadExt},
            sync::{broadcast, mpsc, oneshot}};

/// One key in flight from the reader task to the consumer. The consumer must fire
/// `ack` once it has taken the key; only then does the reader continue.
#[derive(Debug)]
pub struct KeyDelivery {
    pub key: LogicalKey,
    pub ack: oneshot::Sender<()>,
}

/// Why the reader task stopped.
#[derive(Debug)]
pub enum ReaderExit {
    Shutdown,
    EndOfStream,
    ReadError(io::Error),
    /// The receiving end of the key channel, or the kick channel, went away.
    ConsumerGone,
}

/// Everything the reader task shares with the session that spawned it.
pub struct ReaderTaskArgs {
    pub input_device: InputDevice,
    pub config: Arc<StdMutex<TerminalConfig>>,
    pub kick_receiver: mpsc::Receiver<()>,
    pub key_sender: mpsc::Sender<KeyDelivery>,
    pub cursor_report_sender: mpsc::Sender<CursorPosition>,
    pub shutdown_receiver: broadcast::Receiver<()>,
    pub is_reading: Arc<AtomicBool>,
}

impl std::fmt::Debug for ReaderTaskArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderTaskArgs")
            .field("is_reading", &self.is_reading)
            .finish_non_exhaustive()
    }
}

/// Run the loop until shutdown, end of stream, or a read error. Dropping the key
/// sender on the way out is what tells the consumer that the stream has ended.
pub async fn run_reader_task(args: ReaderTaskArgs) -> ReaderExit {
    let ReaderTaskArgs {
        input_device,
        config,
        mut kick_receiver,
        key_sender,
        cursor_report_sender,
        mut shutdown_receiver,
        is_reading,
    } = args;

    let mut reader = RuneReader::new(input_device.resource);
    let mut decoder = EscapeDecoder::new(current_escape_policy(&config));
    let mut expect_next_char = false;

    let exit = loop {
        if !expect_next_char {
            is_reading.store(false, Ordering::SeqCst);
            tokio::select! {
                kick = kick_receiver.recv() => {
                    if kick.is_none() {
                        break ReaderExit::ConsumerGone;
                    }
                    is_reading.store(true, Ordering::SeqCst);
                    // Pick up a policy change made while parked. Never mid-read.
                    decoder.set_policy(current_escape_policy(&config));
                }
                _ = shutdown_receiver.recv() => break ReaderExit::Shutdown,
            }
        }
        expect_next_char = false;

        let read_result = tokio::select! {
            it = reader.read_rune() => it,
            _ = shutdown_receiver.recv() => break ReaderExit::Shutdown,
        };

        let ch = match read_result {
            Ok(Some(ch)) => ch,
            Ok(None) => break ReaderExit::EndOfStream,
            Err(error) if error.kind() == ErrorKind::Interrupted => {
                tracing::debug!(message = "interrupted read, retrying");
                expect_next_char = true;
                continue;
            }
            Err(error) => break ReaderExit::ReadError(error),
        };

        let key = match decoder.feed(ch) {
            DecodeOutcome::Key(key) => key,
            DecodeOutcome::Pending => {
                expect_next_char = true;
                continue;
            }
            DecodeOutcome::Swallowed => {
                tracing::debug!(message = "swallowed unrecognized escape sequence");
                expect_next_char = true;
                continue;
            }
            DecodeOutcome::CursorPositionReport(pos) => {
                tracing::debug!(message = "cursor position report", pos = ?pos);
                // Nobody waiting, or a report already queued: drop this one.
                drop(cursor_report_sender.try_send(pos));
                expect_next_char = true;
                continue;
            }
        };

        expect_next_char = !key.ends_read_burst();

        if DEBUG_READLINE {
            tracing::trace!(message = "delivering key", key = ?key);
        }

        let (ack_sender, ack_receiver) = oneshot::channel();
        let delivery = KeyDelivery {
            key,
            ack: ack_sender,
        };
        tokio::select! {
            sent = key_sender.send(delivery) => {
                if sent.is_err() {
                    break ReaderExit::ConsumerGone;
                }
            }
            _ = shutdown_receiver.recv() => break ReaderExit::Shutdown,
        }
        tokio::select! {
            // An error here means the consumer dropped the key without acking it.
            _ = ack_receiver => {}
            _ = shutdown_receiver.recv() => break ReaderExit::Shutdown,
        }
    };

    is_reading.store(false, Ordering::SeqCst);
    tracing::debug!(message = "reader task exited", exit = ?exit);
    exit
}

/// # Panics
///
/// If the config mutex is poisoned.
fn current_escape_policy(config: &StdMutex<TerminalConfig>) -> crate::EscapePolicy {
    config.lock().unwrap().escape_policy
}

/// Reads UTF-8 encoded runes one byte at a time, so that nothing is read from the
/// source before it is needed (bytes pulled ahead of time would be lost when the
/// session closes).
///
/// A malformed sequence becomes a single [`char::REPLACEMENT_CHARACTER`]. A byte that
/// can't continue the sequence is not swallowed with it; it starts the next rune. This
/// keeps an `ESC` that follows a stray lead byte intact for the decoder.
#[derive(Debug)]
pub struct RuneReader<R> {
    reader: R,
    pushed_back: Option<u8>,
}

impl<R: AsyncRead + Unpin> RuneReader<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pushed_back: None,
        }
    }

    /// Returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// If the underlying read fails.
    pub async fn read_rune(&mut self) -> io::Result<Option<char>> {
        let Some(lead) = self.read_byte().await? else {
            return Ok(None);
        };
        let Some(len) = utf8_sequence_len(lead) else {
            return Ok(Some(char::REPLACEMENT_CHARACTER));
        };

        let mut buf = [lead, 0, 0, 0];
        for slot in buf.iter_mut().take(len).skip(1) {
            match self.read_byte().await? {
                Some(byte) if is_continuation_byte(byte) => *slot = byte,
                Some(byte) => {
                    self.pushed_back = Some(byte);
                    return Ok(Some(char::REPLACEMENT_CHARACTER));
                }
                None => return Ok(Some(char::REPLACEMENT_CHARACTER)),
            }
        }

        Ok(Some(
            std::str::from_utf8(&buf[..len])
                .ok()
                .and_then(|it| it.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER),
        ))
    }

    async fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pushed_back.take() {
            return Ok(Some(byte));
        }
        let mut byte = [0_u8; 1];
        if self.reader.read(&mut byte).await? == 0 {
            return Ok(None);
        }
        Ok(Some(byte[0]))
    }
}

fn is_continuation_byte(byte: u8) -> bool { (0x80..=0xBF).contains(&byte) }

fn utf8_sequence_len(first_byte: u8) -> Option<usize> {
    match first_byte {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        // Continuation byte, or invalid.
        _ => None,
    }
}
