//! HID transport abstraction for device communication.
//!
//! Provides a trait-based transport layer so that real HID devices and
//! mock devices share the same interface.

use crate::error::Result;
use crate::protocol::Command;
use tracing::trace;

/// Abstraction over the outbound half of a raw HID handle.
pub trait HidTransport: Send {
    /// Write a raw HID report.
    fn write_report(&self, data: &[u8]) -> Result<()>;

    /// Release the handle. Called once from the session's close path.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Encode and send a command.
pub fn send_command(transport: &dyn HidTransport, command: &Command) -> Result<()> {
    let encoded = command.encode();
    trace!(
        command = command.name(),
        report_hex = format_args!("{:02X?}", encoded),
        "TX"
    );
    transport.write_report(&encoded)
}

/// A mock HID transport for testing.
///
/// Records every report written; can be switched into a failing mode.
#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock transport. Clones share the same write log.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_writes: Arc<AtomicBool>,
        fail_close: Arc<AtomicBool>,
        closes: Arc<AtomicUsize>,
        attempts: Arc<AtomicUsize>,
        fail_at: Arc<Mutex<Option<usize>>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every report written so far.
        pub fn writes(&self) -> Vec<Vec<u8>> {
            self.writes.lock().unwrap().clone()
        }

        /// Return and forget the reports written so far.
        pub fn take_writes(&self) -> Vec<Vec<u8>> {
            std::mem::take(&mut *self.writes.lock().unwrap())
        }

        /// Make subsequent writes fail (failed writes are still not recorded).
        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Reject only the write attempt `n` writes from now (0 = the next one).
        pub fn fail_nth_write(&self, n: usize) {
            let next = self.attempts.load(Ordering::SeqCst);
            *self.fail_at.lock().unwrap() = Some(next + n);
        }

        pub fn set_fail_close(&self, fail: bool) {
            self.fail_close.store(fail, Ordering::SeqCst);
        }

        pub fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    impl HidTransport for MockTransport {
        fn write_report(&self, data: &[u8]) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            let scheduled = *self.fail_at.lock().unwrap() == Some(attempt);
            if scheduled || self.fail_writes.load(Ordering::SeqCst) {
                return Err(Error::Hid(format!("mock: write rejected {:02X?}", data)));
            }
            self.writes.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close.load(Ordering::SeqCst) {
                return Err(Error::Hid("mock: close failed".into()));
            }
            Ok(())
        }
    }
}
