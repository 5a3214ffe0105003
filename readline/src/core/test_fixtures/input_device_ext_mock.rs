// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::InputDevice;
use std::{io::{Cursor, ErrorKind},
          pin::Pin,
          task::{Context, Poll}};
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};

/// Size of the in-memory pipe created by [`InputDeviceExtMock::new_mock_duplex()`].
pub const MOCK_DUPLEX_CAPACITY: usize = 1024;

pub trait InputDeviceExtMock {
    /// Yields `bytes`, then end of stream.
    fn new_mock(bytes: &[u8]) -> InputDevice;

    /// Never yields anything, like a terminal nobody is typing into.
    fn new_mock_pending() -> InputDevice;

    /// Returns the device and the write half of an in-memory pipe, so that a test can
    /// "type" bytes at the reader task whenever it likes. Dropping the write half ends
    /// the stream.
    fn new_mock_duplex() -> (InputDevice, DuplexStream);

    /// Fails the first read with [`ErrorKind::Interrupted`] (like a syscall cut short
    /// by a signal), then yields `bytes`.
    fn new_mock_interrupted_then(bytes: &[u8]) -> InputDevice;
}

impl InputDeviceExtMock for InputDevice {
    fn new_mock(bytes: &[u8]) -> InputDevice {
        InputDevice {
            resource: Box::pin(Cursor::new(bytes.to_vec())),
        }
    }

    fn new_mock_pending() -> InputDevice {
        InputDevice {
            resource: Box::pin(PendingReader),
        }
    }

    fn new_mock_duplex() -> (InputDevice, DuplexStream) {
        let (reader, writer) = tokio::io::duplex(MOCK_DUPLEX_CAPACITY);
        let device = InputDevice {
            resource: Box::pin(reader),
        };
        (device, writer)
    }

    fn new_mock_interrupted_then(bytes: &[u8]) -> InputDevice {
        InputDevice {
            resource: Box::pin(InterruptedOnceReader {
                interrupted: false,
                inner: Cursor::new(bytes.to_vec()),
            }),
        }
    }
}

struct PendingReader;

impl AsyncRead for PendingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Pending
    }
}

struct InterruptedOnceReader {
    interrupted: bool,
    inner: Cursor<Vec<u8>>,
}

impl AsyncRead for InterruptedOnceReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if !self.interrupted {
            self.interrupted = true;
            return Poll::Ready(Err(ErrorKind::Interrupted.into()));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_mock_yields_bytes_then_eof() {
        let mut device = InputDevice::new_mock(b"ab");
        let mut out = vec![];
        device.resource.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"ab");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_interrupted_then_bytes() {
        let mut device = InputDevice::new_mock_interrupted_then(b"x");
        let mut byte = [0_u8; 1];
        let err = device.resource.read(&mut byte).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Interrupted);
        assert_eq!(device.resource.read(&mut byte).await.unwrap(), 1);
        assert_eq!(byte[0], b'x');
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_duplex_feeds_reader() {
        let (mut device, mut writer) = InputDevice::new_mock_duplex();
        writer.write_all(b"z").await.unwrap();
        let mut byte = [0_u8; 1];
        device.resource.read_exact(&mut byte).await.unwrap();
        assert_eq!(byte[0], b'z');
    }
}
