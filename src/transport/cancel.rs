//! Cancellation signal shared by the tasks of one serial session.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Why a session is being shut down.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Shutdown {
    /// The operator asked for it (`EXIT`, end of input, Ctrl+C).
    Requested,
    /// A task hit an unrecoverable error on the serial port.
    Failed,
}

/// A one-shot cancellation signal.
///
/// Clones share the same signal. The first call to [`request`](Self::request)
/// or [`fail`](Self::fail) decides the [`Shutdown`] reason; later calls are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<Option<Shutdown>>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.signal(Shutdown::Requested);
    }

    pub fn fail(&self) {
        self.signal(Shutdown::Failed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    pub fn reason(&self) -> Option<Shutdown> {
        *self.lock()
    }

    /// Block until the signal is raised.
    pub fn wait(&self) -> Shutdown {
        let (_, cvar) = &*self.inner;
        let mut guard = self.lock();
        loop {
            if let Some(reason) = *guard {
                return reason;
            }
            guard = cvar.wait(guard).unwrap_or_else(|e| e.into_inner());
        }
    }

    fn signal(&self, reason: Shutdown) {
        let (_, cvar) = &*self.inner;
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(reason);
            cvar.notify_all();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Shutdown>> {
        // The guarded value is a plain flag, a panicking holder cannot leave
        // it half-updated.
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}
