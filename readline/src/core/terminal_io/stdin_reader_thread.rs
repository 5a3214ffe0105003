// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Process wide owner of stdin.
//!
//! `tokio::io::stdin()` runs each read on a blocking pool thread that can't be
//! cancelled. If a [`crate::TerminalSession`] closes while such a read is in flight,
//! the read still completes later and the bytes it got belong to nobody. The next
//! session then never sees the first key typed at it.
//!
//! Here a single dedicated thread, started on first use and alive for the rest of the
//! process, is the only thing that ever reads stdin. It sends what it reads over a
//! channel. Every session reads from the receiving end, so bytes that arrive after one
//! session closes wait in the channel for the next one.

use crate::{DEBUG_READLINE, StdMutex};
use std::{collections::VecDeque,
          io::{self, ErrorKind, Read},
          pin::Pin,
          sync::{Arc, LazyLock},
          task::{Context, Poll}};
use tokio::{io::{AsyncRead, ReadBuf},
            sync::mpsc};

/// Max bytes taken from stdin by a single read on the reader thread.
pub const STDIN_READ_BUFFER_SIZE: usize = 256;

/// What the reader thread sends for each read it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinReadResult {
    Data(Vec<u8>),
    Eof,
    Error(ErrorKind),
}

/// Sender end of the stdin channel, held by the reader thread.
pub type StdinSender = mpsc::UnboundedSender<StdinReadResult>;

/// Receiver end of the stdin channel, read by [`ChannelInputReader`].
pub type StdinReceiver = mpsc::UnboundedReceiver<StdinReadResult>;

static GLOBAL_STDIN_READER: LazyLock<SharedInputReader> = LazyLock::new(|| {
    SharedInputReader::new(ChannelInputReader::new(spawn_stdin_reader_thread()))
});

/// Returns a handle to the process wide stdin reader, starting the thread on first
/// use.
#[must_use]
pub fn global_stdin_reader() -> SharedInputReader { GLOBAL_STDIN_READER.clone() }

fn spawn_stdin_reader_thread() -> StdinReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    let result = std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || stdin_reader_loop(tx));
    // On failure `tx` is dropped along with the closure, so readers see end of stream.
    if let Err(error) = result {
        tracing::error!(message = "Failed to spawn stdin reader thread", error = ?error);
    }
    rx
}

fn stdin_reader_loop(tx: StdinSender) {
    let mut stdin = io::stdin().lock();
    let mut buffer = [0_u8; STDIN_READ_BUFFER_SIZE];

    loop {
        match stdin.read(&mut buffer) {
            Ok(0) => {
                DEBUG_READLINE.then(|| {
                    tracing::debug!(message = "stdin-reader: EOF");
                });
                drop(tx.send(StdinReadResult::Eof));
                break;
            }
            Ok(n) => {
                if tx.send(StdinReadResult::Data(buffer[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(ref error) if error.kind() == ErrorKind::Interrupted => {}
            Err(error) => {
                DEBUG_READLINE.then(|| {
                    tracing::debug!(message = "stdin-reader: error", error = ?error);
                });
                drop(tx.send(StdinReadResult::Error(error.kind())));
                break;
            }
        }
    }
}

/// [`AsyncRead`] over the stdin channel. Bytes that don't fit in the caller's buffer
/// are kept for the next read.
#[derive(Debug)]
pub struct ChannelInputReader {
    receiver: StdinReceiver,
    pending: VecDeque<u8>,
}

impl ChannelInputReader {
    #[must_use]
    pub fn new(receiver: StdinReceiver) -> Self {
        Self {
            receiver,
            pending: VecDeque::new(),
        }
    }

    fn drain_pending_into(&mut self, buf: &mut ReadBuf<'_>) {
        let count = buf.remaining().min(self.pending.len());
        let bytes: Vec<u8> = self.pending.drain(..count).collect();
        buf.put_slice(&bytes);
    }
}

impl AsyncRead for ChannelInputReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if !this.pending.is_empty() {
                this.drain_pending_into(buf);
                return Poll::Ready(Ok(()));
            }
            match this.receiver.poll_recv(cx) {
                Poll::Ready(Some(StdinReadResult::Data(data))) => {
                    this.pending.extend(data);
                }
                // Nothing put in `buf` means end of stream.
                Poll::Ready(Some(StdinReadResult::Eof) | None) => {
                    return Poll::Ready(Ok(()));
                }
                Poll::Ready(Some(StdinReadResult::Error(kind))) => {
                    return Poll::Ready(Err(io::Error::from(kind)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Cloneable handle to one [`ChannelInputReader`]. Each session moves a clone into
/// its reader task. Only one task reads at a time, since a session's reader task has
/// stopped before the next session starts.
#[derive(Debug, Clone)]
pub struct SharedInputReader {
    inner: Arc<StdMutex<ChannelInputReader>>,
}

impl SharedInputReader {
    #[must_use]
    pub fn new(reader: ChannelInputReader) -> Self {
        Self {
            inner: Arc::new(StdMutex::new(reader)),
        }
    }
}

impl AsyncRead for SharedInputReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let Ok(mut reader) = self.inner.lock() else {
            return Poll::Ready(Err(io::Error::other("stdin reader lock poisoned")));
        };
        Pin::new(&mut *reader).poll_read(cx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_leftover_bytes_survive_short_reads() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut reader = ChannelInputReader::new(rx);
        tx.send(StdinReadResult::Data(b"abc".to_vec())).unwrap();

        let mut one = [0_u8; 1];
        assert_eq!(reader.read(&mut one).await.unwrap(), 1);
        assert_eq!(&one, b"a");

        let mut rest = [0_u8; 8];
        assert_eq!(reader.read(&mut rest).await.unwrap(), 2);
        assert_eq!(&rest[..2], b"bc");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_eof_and_closed_channel_end_the_stream() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut reader = ChannelInputReader::new(rx);
        tx.send(StdinReadResult::Eof).unwrap();
        let mut buf = [0_u8; 4];
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);

        drop(tx);
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_read_error_kind_is_passed_on() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut reader = ChannelInputReader::new(rx);
        tx.send(StdinReadResult::Error(ErrorKind::BrokenPipe))
            .unwrap();
        let mut buf = [0_u8; 4];
        let error = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_clones_share_one_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut first = SharedInputReader::new(ChannelInputReader::new(rx));
        let mut second = first.clone();
        tx.send(StdinReadResult::Data(b"xy".to_vec())).unwrap();

        let mut one = [0_u8; 1];
        first.read_exact(&mut one).await.unwrap();
        assert_eq!(&one, b"x");
        second.read_exact(&mut one).await.unwrap();
        assert_eq!(&one, b"y");
    }
}
