//! The serial writer task.

use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, trace};

use super::{
    cancel::CancelToken,
    outbox::{Inbox, Payload},
};
use crate::{Error, Result};

/// Raw payloads are pushed in chunks of this size so progress can be shown.
const CHUNK_SIZE: usize = 1024;

/// Timed out writes still retried once the session is cancelled.
const STALLED_RETRIES: usize = 10;

/// Consume payloads from `inbox` and write them to `out` until the session is
/// cancelled and the queue is empty, or every submitter is gone.
///
/// A failed write is reported and the payload is dropped; the writer keeps
/// serving the next ones.
pub(crate) fn run<W: Write>(inbox: Inbox, mut out: W, cancel: &CancelToken, poll: Duration) {
    debug!("serial writer started");
    loop {
        match inbox.recv_timeout(poll) {
            Ok(Some(payload)) => {
                trace!("writing {:?}", payload);
                if let Err(e) = write_payload(&mut out, &payload, cancel) {
                    error!("failed to write {:?}: {}", payload, e);
                    println!(
                        "{}",
                        style(format!("[HL] 💥 Failed to send to the device: {}", e)).red()
                    );
                }
            }
            // Queued payloads are always written before cancellation is
            // honoured.
            Ok(None) => {
                if cancel.is_cancelled() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    debug!("serial writer stopped");
}

/// Write one payload: text lines get a `\n` terminator, raw buffers are sent
/// as they are.
pub(crate) fn write_payload<W: Write>(
    out: &mut W,
    payload: &Payload,
    cancel: &CancelToken,
) -> Result<()> {
    match payload {
        Payload::Text(line) => {
            let mut data = Vec::with_capacity(line.len() + 1);
            data.extend_from_slice(line.as_bytes());
            data.push(b'\n');
            write_chunk(out, &data, cancel)?;
        }
        Payload::Bytes(buffer) => write_raw(out, buffer, cancel)?,
    }
    out.flush()?;
    Ok(())
}

fn write_raw<W: Write>(out: &mut W, buffer: &[u8], cancel: &CancelToken) -> Result<()> {
    let pb = ProgressBar::new(buffer.len() as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("[HL] ⏩ Pushing [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .progress_chars("=>-"));

    let mut written: u64 = 0;
    for chunk in buffer.chunks(CHUNK_SIZE) {
        if let Err(e) = write_chunk(out, chunk, cancel) {
            pb.abandon();
            return Err(e);
        }
        written += chunk.len() as u64;
        pb.set_position(written);
    }
    pb.finish_with_message("[HL] Image pushed");

    Ok(())
}

/// Write all of `chunk`, retrying writes that time out while the device is
/// not draining its input. Once the session is cancelled, only
/// `STALLED_RETRIES` more timeouts are tolerated.
fn write_chunk<W: Write>(out: &mut W, mut chunk: &[u8], cancel: &CancelToken) -> Result<()> {
    let mut stalled = 0;
    while !chunk.is_empty() {
        match out.write(chunk) {
            Ok(0) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "serial port accepted no data",
                )))
            }
            Ok(n) => {
                trace!("{} bytes written to serial port", n);
                chunk = &chunk[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                if cancel.is_cancelled() {
                    stalled += 1;
                    if stalled > STALLED_RETRIES {
                        debug!("giving up on a stalled write, {} bytes left", chunk.len());
                        return Err(e.into());
                    }
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
