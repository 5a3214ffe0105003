// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! `SIGINT` / `SIGTERM` delivery to a callback, owned by whoever holds the
//! [`ExitSignalSubscription`]. Dropping the subscription stops the delivery thread.

use crate::ReadlineResult;

#[cfg(unix)]
pub use unix_impl::*;

#[cfg(unix)]
mod unix_impl {
    use super::ReadlineResult;
    use crate::ReadlineError;
    use signal_hook::{consts::{SIGINT, SIGTERM},
                      iterator::{Handle, Signals}};
    use std::thread::JoinHandle;

    #[derive(Debug)]
    pub struct ExitSignalSubscription {
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    }

    impl ExitSignalSubscription {
        /// Call `on_signal` with the signal number every time `SIGINT` or `SIGTERM` is
        /// delivered. The callback runs on a dedicated thread.
        ///
        /// # Errors
        ///
        /// If the signal handlers can't be registered, or the thread can't be spawned.
        pub fn subscribe(
            mut on_signal: impl FnMut(i32) + Send + 'static,
        ) -> ReadlineResult<Self> {
            let mut signals =
                Signals::new([SIGINT, SIGTERM]).map_err(ReadlineError::SignalSubscription)?;
            let handle = signals.handle();
            let thread = std::thread::Builder::new()
                .name("readline-exit-signal".into())
                .spawn(move || {
                    for signal in signals.forever() {
                        tracing::debug!(message = "exit signal received", signal = signal);
                        on_signal(signal);
                    }
                })
                .map_err(ReadlineError::SignalSubscription)?;
            Ok(Self {
                handle,
                thread: Some(thread),
            })
        }
    }

    impl Drop for ExitSignalSubscription {
        fn drop(&mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take() {
                drop(thread.join());
            }
        }
    }
}

#[cfg(not(unix))]
#[derive(Debug)]
pub struct ExitSignalSubscription;

#[cfg(not(unix))]
impl ExitSignalSubscription {
    /// Exit signals are not delivered on this platform; the callback is never called.
    ///
    /// # Errors
    ///
    /// Never.
    pub fn subscribe(_on_signal: impl FnMut(i32) + Send + 'static) -> ReadlineResult<Self> {
        Ok(Self)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use signal_hook::consts::SIGTERM;
    use std::{sync::mpsc, time::Duration};

    #[test]
    #[serial]
    fn test_sigterm_reaches_callback() {
        let (tx, rx) = mpsc::channel();
        let subscription = ExitSignalSubscription::subscribe(move |signal| {
            drop(tx.send(signal));
        })
        .unwrap();

        signal_hook::low_level::raise(SIGTERM).unwrap();

        let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received, SIGTERM);
        drop(subscription);
    }
}
