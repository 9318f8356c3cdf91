//! Outbound payload queue between submitters and the serial writer.
//!
//! Submitters hold an [`Outbox`], the writer task owns the matching [`Inbox`].
//! The queue is bounded: once it is full, submitting blocks until the writer
//! has consumed a payload, so nothing is ever overwritten or dropped. Payloads
//! from one submitter are delivered in the order they were submitted.

use std::{
    fmt,
    sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError},
    time::Duration,
};

use crate::{Error, Result};

/// One unit of outbound data.
#[derive(Clone, Eq, PartialEq)]
pub enum Payload {
    /// A text line, written followed by `\n`.
    Text(String),
    /// Raw bytes, written as they are.
    Bytes(Vec<u8>),
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(line) => f.debug_tuple("Text").field(line).finish(),
            // Images are large, the length is what matters when debugging.
            Payload::Bytes(buffer) => write!(f, "Bytes({} bytes)", buffer.len()),
        }
    }
}

/// Anything that can carry text lines and raw buffers to the device.
pub trait Transmit {
    /// Queue `line` to be sent with a line terminator.
    fn send_text(&self, line: &str) -> Result<()>;
    /// Queue `buffer` to be sent verbatim.
    fn send_bytes(&self, buffer: Vec<u8>) -> Result<()>;
}

/// Submitting side of the queue. Cheap to clone, one per task.
#[derive(Clone)]
pub struct Outbox {
    tx: SyncSender<Payload>,
}

impl Outbox {
    /// Queue a payload, blocking while the queue is full.
    ///
    /// Fails with [`Error::Disconnected`] once the writer is gone.
    pub fn submit(&self, payload: Payload) -> Result<()> {
        self.tx.send(payload).map_err(|_| Error::Disconnected)
    }
}

impl Transmit for Outbox {
    fn send_text(&self, line: &str) -> Result<()> {
        self.submit(Payload::Text(line.to_owned()))
    }

    fn send_bytes(&self, buffer: Vec<u8>) -> Result<()> {
        self.submit(Payload::Bytes(buffer))
    }
}

/// Consuming side of the queue.
pub struct Inbox {
    rx: Receiver<Payload>,
}

impl Inbox {
    /// Wait up to `timeout` for the next payload.
    ///
    /// `Err(Error::Disconnected)` means every [`Outbox`] was dropped and the
    /// queue is empty.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Payload>> {
        match self.rx.recv_timeout(timeout) {
            Ok(payload) => Ok(Some(payload)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Disconnected),
        }
    }

    /// Take every payload currently queued, without waiting.
    pub fn drain(&self) -> Vec<Payload> {
        let mut payloads = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(payload) => payloads.push(payload),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        payloads
    }
}

/// Create a queue holding at most `capacity` payloads (at least one).
pub fn channel(capacity: usize) -> (Outbox, Inbox) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (Outbox { tx }, Inbox { rx })
}
