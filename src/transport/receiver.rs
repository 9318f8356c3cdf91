//! The serial receiver task.
//!
//! Bytes coming from the device are cut into chunks by [`LineChunks`] and
//! copied to a display sink. A chunk ends at a line feed, when the line buffer
//! is full, or when the device goes quiet with a partial line pending (so that
//! prompts without a terminator still show up).

use std::{
    io::{self, prelude::*, BufReader},
    mem,
};

use hexplay::HexViewBuilder;
use log::{debug, error, log_enabled, Level::Debug};

use super::cancel::CancelToken;

/// Lazy sequence of line-delimited byte chunks read from a device.
///
/// Read timeouts and `WouldBlock` are treated as "nothing yet" rather than
/// errors, which lets the sequence notice cancellation between reads. After
/// returning `None` at end of stream, the sequence can be polled again and
/// resumes reading.
pub struct LineChunks<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    capacity: usize,
    cancel: CancelToken,
}

impl<R: Read> LineChunks<R> {
    pub fn new(reader: R, capacity: usize, cancel: CancelToken) -> Self {
        let capacity = capacity.max(1);
        LineChunks {
            reader: BufReader::with_capacity(capacity, reader),
            pending: Vec::with_capacity(capacity),
            capacity,
            cancel,
        }
    }

    fn take_pending(&mut self) -> Vec<u8> {
        mem::replace(&mut self.pending, Vec::with_capacity(self.capacity))
    }
}

impl<R: Read> Iterator for LineChunks<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            let room = (self.capacity - self.pending.len()) as u64;
            let read = (&mut self.reader)
                .take(room)
                .read_until(b'\n', &mut self.pending);
            match read {
                // End of stream.
                Ok(0) if self.pending.is_empty() => return None,
                // A full line, a full buffer, or what was left before the end
                // of stream.
                Ok(_) => return Some(Ok(self.take_pending())),
                Err(e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    if !self.pending.is_empty() {
                        return Some(Ok(self.take_pending()));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Copy every chunk to `display` until the session is cancelled.
///
/// A read error means the device is gone: it is reported and the whole session
/// is cancelled as failed.
pub(crate) fn run<R: Read, D: Write>(chunks: LineChunks<R>, mut display: D, cancel: &CancelToken) {
    debug!("serial receiver started");
    for chunk in chunks {
        match chunk {
            Ok(bytes) => {
                if let Err(e) = display.write_all(&bytes).and_then(|_| display.flush()) {
                    debug!("display error: {}", e);
                }

                // Dump the received data in a hex table for debugging
                if log_enabled!(Debug) {
                    let view = HexViewBuilder::new(&bytes)
                        .address_offset(0)
                        .row_width(16)
                        .finish();
                    debug!("received {} bytes\n{}", bytes.len(), view);
                }
            }
            Err(e) => {
                error!("serial read error: {}", e);
                cancel.fail();
                break;
            }
        }
    }
    debug!("serial receiver stopped");
}
