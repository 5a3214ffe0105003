// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{BELL_STR, CursorPosition, DSR_REQUEST_CURSOR_POSITION, ExitSignalSubscription,
            InputDevice, KeyDelivery, LogicalKey, ReadlineError, ReadlineResult,
            ReaderExit, ReaderTaskArgs, ResumeDetector, SafeTerminalMode, StdMutex,
            TerminalConfig, ignore_errno_zero, lock_output_device_as_mut, run_reader_task};
use std::{io::Write,
          sync::{Arc,
                 atomic::{AtomicBool, Ordering}},
          time::Duration};
use tokio::{sync::{broadcast, mpsc},
            task::JoinHandle};

/// How long [`TerminalSession::query_cursor_position()`] waits for the terminal to
/// answer.
pub const CURSOR_REPORT_TIMEOUT: Duration = Duration::from_secs(1);

/// A kick that arrives while another one is pending is dropped.
const KICK_CHANNEL_CAPACITY: usize = 1;

/// Only the latest unclaimed cursor position report is kept.
const CURSOR_REPORT_CHANNEL_CAPACITY: usize = 1;

/// State shared by the [`TerminalSession`], its [`SessionHandle`]s, and the reader
/// task.
struct SessionShared {
    config: Arc<StdMutex<TerminalConfig>>,
    kick_sender: mpsc::Sender<()>,
    shutdown_sender: broadcast::Sender<()>,
    is_reading: Arc<AtomicBool>,
    is_closed: AtomicBool,
    is_sleeping: AtomicBool,
    reader_join_handle: StdMutex<Option<JoinHandle<ReaderExit>>>,
    exit_signal_subscription: StdMutex<Option<ExitSignalSubscription>>,
}

impl SessionShared {
    fn kick_read(&self) {
        // Full means a kick is already pending, which is just as good.
        drop(self.kick_sender.try_send(()));
    }

    /// # Panics
    ///
    /// If the config mutex is poisoned.
    fn terminal_mode(&self) -> SafeTerminalMode {
        self.config.lock().unwrap().terminal_mode.clone()
    }

    /// # Panics
    ///
    /// If the mutex is poisoned.
    async fn close(&self) -> ReadlineResult<()> {
        if self.is_closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Stop delivering exit signals before the terminal is handed back.
        drop(self.exit_signal_subscription.lock().unwrap().take());

        // No receivers (the reader already exited) is fine.
        drop(self.shutdown_sender.send(()));

        let maybe_join_handle = self.reader_join_handle.lock().unwrap().take();
        if let Some(join_handle) = maybe_join_handle {
            match join_handle.await {
                Ok(exit) => tracing::debug!(message = "reader task joined", exit = ?exit),
                Err(error) => {
                    tracing::warn!(message = "reader task did not finish cleanly", error = ?error);
                }
            }
        }

        let result = ignore_errno_zero(self.terminal_mode().exit_raw_mode());
        tracing::debug!(message = "terminal session closed", ok = result.is_ok());
        result
    }
}

/// A clone-able handle to a [`TerminalSession`], for other tasks that need to wake the
/// reader or shut the session down. It does not give access to the key stream.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    pub fn kick_read(&self) { self.shared.kick_read(); }

    #[must_use]
    pub fn is_reading(&self) -> bool { self.shared.is_reading.load(Ordering::SeqCst) }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.shared.is_closed.load(Ordering::SeqCst) }

    /// Same as [`TerminalSession::close()`].
    ///
    /// # Errors
    ///
    /// If the terminal can't be taken out of raw mode.
    pub async fn close(&self) -> ReadlineResult<()> { self.shared.close().await }
}

/// Raw mode terminal input, decoded into [`LogicalKey`]s by a dedicated reader task.
///
/// - [`Self::kick_read()`] lets the reader continue after a key that ended a read
///   burst. Kicks don't queue up: at most one is pending at a time.
/// - [`Self::read_key()`] takes the next key. The reader is blocked until a key is
///   taken, so nothing piles up between keystrokes.
/// - [`Self::close()`] is idempotent and can also be called through a
///   [`SessionHandle`] from another task.
///
/// # Example
///
/// ```no_run
/// use r3bl_readline::{InputDevice, LogicalKey, TerminalConfig, TerminalSession};
///
/// # async fn run() -> r3bl_readline::ReadlineResult<()> {
/// let mut session = TerminalSession::try_new(InputDevice::new_stdin(), TerminalConfig::default())?;
/// while let Some(key) = session.next_key().await {
///     if key == LogicalKey::Enter {
///         break;
///     }
/// }
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
#[allow(missing_debug_implementations)]
pub struct TerminalSession {
    shared: Arc<SessionShared>,
    key_receiver: mpsc::Receiver<KeyDelivery>,
    cursor_report_receiver: mpsc::Receiver<CursorPosition>,
}

impl TerminalSession {
    /// Enter raw mode and spawn the reader task. Must be called from within a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// If raw mode can't be entered.
    pub fn try_new(
        /* move */ input_device: InputDevice,
        config: TerminalConfig,
    ) -> ReadlineResult<Self> {
        config.terminal_mode.enter_raw_mode()?;

        let config = Arc::new(StdMutex::new(config));
        let (kick_sender, kick_receiver) = mpsc::channel(KICK_CHANNEL_CAPACITY);
        // Capacity 1 plus the ack makes this a rendezvous.
        let (key_sender, key_receiver) = mpsc::channel(1);
        let (cursor_report_sender, cursor_report_receiver) =
            mpsc::channel(CURSOR_REPORT_CHANNEL_CAPACITY);
        let (shutdown_sender, shutdown_receiver) = broadcast::channel(1);
        let is_reading = Arc::new(AtomicBool::new(false));

        let join_handle = tokio::spawn(run_reader_task(ReaderTaskArgs {
            input_device,
            config: config.clone(),
            kick_receiver,
            key_sender,
            cursor_report_sender,
            shutdown_receiver,
            is_reading: is_reading.clone(),
        }));

        tracing::debug!(message = "terminal session started");

        Ok(Self {
            shared: Arc::new(SessionShared {
                config,
                kick_sender,
                shutdown_sender,
                is_reading,
                is_closed: AtomicBool::new(false),
                is_sleeping: AtomicBool::new(false),
                reader_join_handle: StdMutex::new(Some(join_handle)),
                exit_signal_subscription: StdMutex::new(None),
            }),
            key_receiver,
            cursor_report_receiver,
        })
    }

    #[must_use]
    pub fn get_handle(&self) -> SessionHandle {
        SessionHandle {
            shared: self.shared.clone(),
        }
    }

    /// Let the reader task resume reading. Does nothing if a kick is already pending.
    pub fn kick_read(&self) { self.shared.kick_read(); }

    /// `true` between a kick and the next key that ends a read burst.
    #[must_use]
    pub fn is_reading(&self) -> bool { self.shared.is_reading.load(Ordering::SeqCst) }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.shared.is_closed.load(Ordering::SeqCst) }

    /// Wait for the next key. Returns [`None`] once the reader task has stopped
    /// (shutdown, end of input, or a read error).
    pub async fn read_key(&mut self) -> Option<LogicalKey> {
        let KeyDelivery { key, ack } = self.key_receiver.recv().await?;
        // The reader gave up on this hand-off (shutdown), so it was never delivered.
        ack.send(()).ok()?;
        Some(key)
    }

    /// [`Self::kick_read()`] followed by [`Self::read_key()`].
    pub async fn next_key(&mut self) -> Option<LogicalKey> {
        self.kick_read();
        self.read_key().await
    }

    /// # Panics
    ///
    /// If the config mutex is poisoned.
    #[must_use]
    pub fn get_config(&self) -> TerminalConfig { self.shared.config.lock().unwrap().clone() }

    /// Swap the configuration. A read already in progress finishes with the old one;
    /// a new escape policy takes effect the next time the reader is kicked.
    ///
    /// # Panics
    ///
    /// If the config mutex is poisoned.
    pub fn set_config(&self, config: TerminalConfig) {
        *self.shared.config.lock().unwrap() = config;
    }

    /// # Errors
    ///
    /// If writing to the output device fails.
    pub fn write(&self, bytes: &[u8]) -> ReadlineResult<()> {
        let output_device = self.get_config().output_device;
        let term = lock_output_device_as_mut!(output_device);
        term.write_all(bytes)?;
        term.flush()?;
        Ok(())
    }

    /// # Errors
    ///
    /// If writing to the output device fails.
    pub fn print(&self, text: &str) -> ReadlineResult<()> { self.write(text.as_bytes()) }

    /// # Errors
    ///
    /// If writing to the output device fails.
    pub fn bell(&self) -> ReadlineResult<()> { self.print(BELL_STR) }

    /// Ask the terminal where the cursor is. The reader task is kicked so that it reads
    /// the answer; the report is consumed out-of-band and never shows up as a key.
    /// Returns [`None`] if there is no answer within [`CURSOR_REPORT_TIMEOUT`].
    ///
    /// Keys typed before the answer arrives are still delivered in order, so a caller
    /// that isn't also calling [`Self::read_key()`] may time out.
    ///
    /// # Errors
    ///
    /// If writing the request fails.
    pub async fn query_cursor_position(
        &mut self,
    ) -> ReadlineResult<Option<CursorPosition>> {
        self.query_cursor_position_with_timeout(CURSOR_REPORT_TIMEOUT)
            .await
    }

    /// Same as [`Self::query_cursor_position()`] with a caller chosen timeout.
    ///
    /// # Errors
    ///
    /// If writing the request fails.
    pub async fn query_cursor_position_with_timeout(
        &mut self,
        timeout: Duration,
    ) -> ReadlineResult<Option<CursorPosition>> {
        // Drop a stale report that nobody claimed.
        while self.cursor_report_receiver.try_recv().is_ok() {}
        self.print(DSR_REQUEST_CURSOR_POSITION)?;
        self.kick_read();
        Ok(tokio::time::timeout(timeout, self.cursor_report_receiver.recv())
            .await
            .ok()
            .flatten())
    }

    /// Deliver `SIGINT` and `SIGTERM` to `on_signal` for as long as this session is
    /// open. Replaces a previous subscription.
    ///
    /// # Errors
    ///
    /// If the session is closed, or the signal handlers can't be installed.
    ///
    /// # Panics
    ///
    /// If the mutex is poisoned.
    pub fn capture_exit_signal(
        &self,
        on_signal: impl FnMut(i32) + Send + 'static,
    ) -> ReadlineResult<()> {
        if self.is_closed() {
            return Err(ReadlineError::SessionClosed);
        }
        let subscription = ExitSignalSubscription::subscribe(on_signal)?;
        *self.shared.exit_signal_subscription.lock().unwrap() = Some(subscription);
        Ok(())
    }

    /// Suspend the process (like `Ctrl+Z` in a cooked terminal) and return once it has
    /// been resumed. Raw mode is left before stopping and entered again after.
    ///
    /// A call that overlaps one already in progress returns immediately.
    ///
    /// # Errors
    ///
    /// If the session is closed, a raw mode transition fails, or the suspend fails. When
    /// the suspend itself fails, raw mode is entered again before the error is returned.
    pub async fn sleep_to_resume(&self) -> ReadlineResult<()> {
        if self.is_closed() {
            return Err(ReadlineError::SessionClosed);
        }
        if self
            .shared
            .is_sleeping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }
        let _reset = ResetOnDrop(&self.shared.is_sleeping);

        let terminal_mode = self.shared.terminal_mode();
        ignore_errno_zero(terminal_mode.exit_raw_mode())?;

        let detector = ResumeDetector::spawn();
        tracing::debug!(message = "suspending process");
        if let Err(error) = terminal_mode.suspend_process() {
            detector.abort();
            // The process never stopped, so the session is still live. Put raw mode back.
            if let Err(restore_error) = terminal_mode.enter_raw_mode() {
                tracing::warn!(
                    message = "Failed to re-enter raw mode after a failed suspend",
                    error = ?restore_error
                );
            }
            return Err(error);
        }
        let gap = detector.wait().await;
        tracing::debug!(message = "process resumed", gap = ?gap);

        terminal_mode.enter_raw_mode()
    }

    /// Stop the reader task, wait for it, and restore the terminal. Calling this again
    /// (from here or from any [`SessionHandle`]) returns `Ok(())` and does nothing.
    ///
    /// # Errors
    ///
    /// If the terminal can't be taken out of raw mode.
    pub async fn close(&self) -> ReadlineResult<()> { self.shared.close().await }
}

/// Best effort teardown for a session that was never closed: the reader is told to
/// stop, and the terminal is restored. Nothing waits for the reader task.
impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.shared.is_closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut it) = self.shared.exit_signal_subscription.lock() {
            drop(it.take());
        }
        drop(self.shared.shutdown_sender.send(()));
        if let Ok(config) = self.shared.config.lock() {
            // We don't care about the result of this operation.
            drop(config.terminal_mode.exit_raw_mode());
        }
    }
}

struct ResetOnDrop<'a>(&'a AtomicBool);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::SeqCst); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelInputReader, EscapePolicy, InputDeviceExtMock, MockTerminalMode,
                OutputDevice, OutputDeviceExt, SharedInputReader, StdinReadResult,
                StdoutMock, TerminalModeCall};
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncWriteExt;

    fn mock_config(mode: Arc<MockTerminalMode>) -> (TerminalConfig, StdoutMock) {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let config = TerminalConfig {
            output_device,
            escape_policy: EscapePolicy::Consume,
            terminal_mode: mode,
        };
        (config, stdout_mock)
    }

    async fn collect_keys(session: &mut TerminalSession) -> Vec<LogicalKey> {
        let mut keys = vec![];
        while let Some(key) = session.next_key().await {
            keys.push(key);
        }
        keys
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_decodes_stream_then_ends() {
        let mode = MockTerminalMode::new();
        let (config, _) = mock_config(mode.clone());
        let input = InputDevice::new_mock(b"ab\x1b[D\x1b[3~\x1b[Zc\r");
        let mut session = TerminalSession::try_new(input, config).unwrap();

        assert_eq!(
            collect_keys(&mut session).await,
            vec![
                LogicalKey::Char('a'),
                LogicalKey::Char('b'),
                LogicalKey::Backward,
                LogicalKey::Delete,
                LogicalKey::Char('c'),
                LogicalKey::Enter,
            ]
        );
        session.close().await.unwrap();
        assert_eq!(
            mode.get_calls(),
            vec![TerminalModeCall::EnterRawMode, TerminalModeCall::ExitRawMode]
        );
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_no_kick_no_read() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let (input, mut writer) = InputDevice::new_mock_duplex();
        let mut session = TerminalSession::try_new(input, config).unwrap();
        writer.write_all(b"x").await.unwrap();

        let unkicked =
            tokio::time::timeout(Duration::from_millis(50), session.read_key()).await;
        assert!(unkicked.is_err());
        assert!(!session.is_reading());

        assert_eq!(session.next_key().await, Some(LogicalKey::Char('x')));
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_burst_read_continues_until_enter() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let (input, mut writer) = InputDevice::new_mock_duplex();
        let mut session = TerminalSession::try_new(input, config).unwrap();
        writer.write_all(b"hi\rz").await.unwrap();

        // One kick reads the whole burst up to and including Enter.
        session.kick_read();
        assert_eq!(session.read_key().await, Some(LogicalKey::Char('h')));
        assert_eq!(session.read_key().await, Some(LogicalKey::Char('i')));
        assert_eq!(session.read_key().await, Some(LogicalKey::Enter));

        // After Enter the reader parks again.
        let parked =
            tokio::time::timeout(Duration::from_millis(50), session.read_key()).await;
        assert!(parked.is_err());
        assert_eq!(session.next_key().await, Some(LogicalKey::Char('z')));
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_interrupted_read_is_retried() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let input = InputDevice::new_mock_interrupted_then(b"q");
        let mut session = TerminalSession::try_new(input, config).unwrap();
        assert_eq!(session.next_key().await, Some(LogicalKey::Char('q')));
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_close_is_idempotent_and_ends_stream() {
        let mode = MockTerminalMode::new();
        let (config, _) = mock_config(mode.clone());
        let mut session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();
        session.kick_read();

        let handle = session.get_handle();
        handle.close().await.unwrap();
        session.close().await.unwrap();
        handle.close().await.unwrap();

        assert!(session.is_closed());
        assert_eq!(session.read_key().await, None);
        assert_eq!(mode.count(TerminalModeCall::ExitRawMode), 1);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_close_while_delivery_pending() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let input = InputDevice::new_mock(b"abc");
        let mut session = TerminalSession::try_new(input, config).unwrap();
        session.kick_read();
        // Let the reader block on handing over 'a'.
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.close().await.unwrap();
        assert_eq!(session.read_key().await, None);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_close_maps_errno_zero_to_success() {
        let (config, _) = mock_config(MockTerminalMode::new_with_errno_zero_on_exit());
        let session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();
        assert!(session.close().await.is_ok());
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_close_propagates_restore_failure() {
        let (config, _) = mock_config(MockTerminalMode::new_with_failing_exit());
        let session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();
        assert!(matches!(session.close().await, Err(ReadlineError::RawMode(_))));
        // Still only torn down once.
        assert!(session.close().await.is_ok());
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_cursor_position_report_is_out_of_band() {
        let (config, stdout_mock) = mock_config(MockTerminalMode::new());
        let (input, mut writer) = InputDevice::new_mock_duplex();
        let mut session = TerminalSession::try_new(input, config).unwrap();
        writer.write_all(b"\x1b[12;40Rk").await.unwrap();

        let pos = session.query_cursor_position().await.unwrap();
        assert_eq!(pos, Some(CursorPosition { row: 12, col: 40 }));
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "\x1b[6n");

        // The report was not delivered as keys; the next key is the one after it.
        assert_eq!(session.read_key().await, Some(LogicalKey::Char('k')));
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_emit_policy_delivers_escape() {
        let (mut config, _) = mock_config(MockTerminalMode::new());
        config.escape_policy = EscapePolicy::Emit;
        let input = InputDevice::new_mock(b"\x1bb");
        let mut session = TerminalSession::try_new(input, config).unwrap();
        assert_eq!(
            collect_keys(&mut session).await,
            vec![LogicalKey::Esc, LogicalKey::MetaBackward]
        );
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_nul_is_delivered() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let input = InputDevice::new_mock(b"\0");
        let mut session = TerminalSession::try_new(input, config).unwrap();
        assert_eq!(session.next_key().await, Some(LogicalKey::Control(0)));
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_bell_and_print_use_current_config() {
        let (config, first_mock) = mock_config(MockTerminalMode::new());
        let session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();
        session.bell().unwrap();

        let (second_config, second_mock) = mock_config(MockTerminalMode::new());
        session.set_config(second_config);
        session.print("swapped").unwrap();

        assert_eq!(first_mock.get_copy_of_buffer_as_string(), "\x07");
        assert_eq!(second_mock.get_copy_of_buffer_as_string(), "swapped");
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_sleep_to_resume_sequence() {
        let mode = MockTerminalMode::new_with_suspend_freeze(Duration::from_millis(150));
        let (config, _) = mock_config(mode.clone());
        let session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();

        session.sleep_to_resume().await.unwrap();

        assert_eq!(
            mode.get_calls(),
            vec![
                TerminalModeCall::EnterRawMode,
                TerminalModeCall::ExitRawMode,
                TerminalModeCall::SuspendProcess,
                TerminalModeCall::EnterRawMode,
            ]
        );
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_overlapping_suspends_collapse() {
        let mode = MockTerminalMode::new_with_suspend_freeze(Duration::from_millis(150));
        let (config, _) = mock_config(mode.clone());
        let session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();

        let (first, second) = tokio::join!(session.sleep_to_resume(), session.sleep_to_resume());
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(mode.count(TerminalModeCall::SuspendProcess), 1);

        // The guard is released once the first call is done.
        session.sleep_to_resume().await.unwrap();
        assert_eq!(mode.count(TerminalModeCall::SuspendProcess), 2);
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_closed_session_rejects_suspend() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();
        session.close().await.unwrap();
        assert!(matches!(
            session.sleep_to_resume().await,
            Err(ReadlineError::SessionClosed)
        ));
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_drop_restores_terminal() {
        let mode = MockTerminalMode::new();
        let (config, _) = mock_config(mode.clone());
        let session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();
        drop(session);
        assert_eq!(mode.count(TerminalModeCall::ExitRawMode), 1);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_failed_suspend_restores_raw_mode() {
        let mode = MockTerminalMode::new_with_failing_suspend();
        let (config, _) = mock_config(mode.clone());
        let session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();

        assert!(matches!(
            session.sleep_to_resume().await,
            Err(ReadlineError::RawMode(_))
        ));
        assert_eq!(
            mode.get_calls(),
            vec![
                TerminalModeCall::EnterRawMode,
                TerminalModeCall::ExitRawMode,
                TerminalModeCall::SuspendProcess,
                TerminalModeCall::EnterRawMode,
            ]
        );

        // The guard was released, so a later suspend is attempted again.
        assert!(session.sleep_to_resume().await.is_err());
        assert_eq!(mode.count(TerminalModeCall::SuspendProcess), 2);
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_kicks_while_one_is_pending_are_dropped() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let (input, mut writer) = InputDevice::new_mock_duplex();
        let mut session = TerminalSession::try_new(input, config).unwrap();
        writer.write_all(b"x\rb").await.unwrap();

        // The reader task hasn't run yet: the first kick fills the slot, the others
        // find it full.
        session.kick_read();
        session.kick_read();
        session.kick_read();

        assert_eq!(session.read_key().await, Some(LogicalKey::Char('x')));
        assert_eq!(session.read_key().await, Some(LogicalKey::Enter));

        // Only one burst was paid for.
        let parked =
            tokio::time::timeout(Duration::from_millis(50), session.read_key()).await;
        assert!(parked.is_err());
        assert_eq!(session.next_key().await, Some(LogicalKey::Char('b')));
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_cursor_query_times_out_without_answer() {
        let (config, stdout_mock) = mock_config(MockTerminalMode::new());
        let mut session =
            TerminalSession::try_new(InputDevice::new_mock_pending(), config).unwrap();

        let pos = session
            .query_cursor_position_with_timeout(Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(pos, None);
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "\x1b[6n");
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_cursor_query_skips_stale_report() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let (input, mut writer) = InputDevice::new_mock_duplex();
        let mut session = TerminalSession::try_new(input, config).unwrap();

        // An answer nobody asked for lands in the report slot.
        writer.write_all(b"\x1b[1;1R").await.unwrap();
        session.kick_read();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (pos, ()) = tokio::join!(
            session.query_cursor_position_with_timeout(Duration::from_millis(500)),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                writer.write_all(b"\x1b[5;7R").await.unwrap();
            }
        );
        assert_eq!(pos.unwrap(), Some(CursorPosition { row: 5, col: 7 }));
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_truncated_utf8_does_not_eat_escape_sequence() {
        let (config, _) = mock_config(MockTerminalMode::new());
        let input = InputDevice::new_mock(b"\xC3\x1b[A");
        let mut session = TerminalSession::try_new(input, config).unwrap();
        assert_eq!(
            collect_keys(&mut session).await,
            vec![
                LogicalKey::Char(char::REPLACEMENT_CHARACTER),
                LogicalKey::Prev
            ]
        );
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_bytes_after_close_go_to_next_session() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let shared = SharedInputReader::new(ChannelInputReader::new(rx));

        let (config, _) = mock_config(MockTerminalMode::new());
        let first = InputDevice {
            resource: Box::pin(shared.clone()),
        };
        let session = TerminalSession::try_new(first, config).unwrap();
        session.kick_read();
        // Let the reader block on the empty channel, then close under it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.close().await.unwrap();

        tx.send(StdinReadResult::Data(b"ab".to_vec())).unwrap();

        let (config, _) = mock_config(MockTerminalMode::new());
        let second = InputDevice {
            resource: Box::pin(shared),
        };
        let mut session = TerminalSession::try_new(second, config).unwrap();
        assert_eq!(session.next_key().await, Some(LogicalKey::Char('a')));
        assert_eq!(session.next_key().await, Some(LogicalKey::Char('b')));
        session.close().await.unwrap();
    }
}
