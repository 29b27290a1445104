use std::ops::ControlFlow;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Runs a check right away and then once per interval on a background
/// thread, until the check breaks or the watch is cancelled.
pub struct OverdueWatch {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl OverdueWatch {
    pub fn spawn<F>(interval: Duration, mut check: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            if check().is_break() {
                break;
            }
            match cancelled.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                // Cancelled, or the handle went away
                _ => break,
            }
        });
        Self { cancel, handle }
    }

    pub fn cancel(self) {
        let _ = self.cancel.send(());
        self.join();
    }

    /// Blocks until the check loop ends on its own.
    pub fn join(self) {
        if self.handle.join().is_err() {
            tracing::error!("overdue watch thread panicked");
        }
    }
}
