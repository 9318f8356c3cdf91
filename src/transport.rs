//! `hexload` serial transport.
//!
//! A [`Session`] owns one open serial port and runs two independent tasks on
//! it:
//!
//! ```text
//!   send_text / send_bytes                          device
//!            |                                        ^  |
//!            v                                        |  |
//!   .-----------------.    .----------------.         |  |
//!   | Outbox (bounded)|--->| serial-writer  |---------'  |
//!   '-----------------'    '----------------'            |
//!                          .----------------.            |
//!        display  <--------| serial-receiver|<-----------'
//!                          '----------------'
//! ```
//!
//! The two tasks share nothing but the [`CancelToken`] of the session: the
//! receiver never waits for the writer and the writer never waits for the
//! receiver. Closing the session raises the token, lets the writer flush what
//! is already queued, joins both tasks and releases the port.
//!
//! **Example** - pushing data through an in-memory session:
//! ```
//! use std::io;
//! use hexload::{transport::{Session, Transmit}, SettingsBuilder};
//!
//! let settings = SettingsBuilder::new().finalize();
//! let mut session = Session::start("loopback", io::empty(), io::sink(), io::sink(), &settings).unwrap();
//! session.send_text("HELP").unwrap();
//! session.close();
//! ```

mod cancel;
mod outbox;
mod receiver;
mod writer;

use std::{
    fmt,
    io::{self, Read, Write},
    thread::{self, JoinHandle},
};

use log::{error, info};

pub use cancel::{CancelToken, Shutdown};
pub use outbox::{channel, Inbox, Outbox, Payload, Transmit};
pub use receiver::LineChunks;

use crate::{utils::open_port, Error, Result, Settings};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionState {
    Open,
    Closed,
}

/// An open serial connection with its writer and receiver tasks running.
pub struct Session {
    name: String,
    outbox: Outbox,
    cancel: CancelToken,
    tasks: Vec<JoinHandle<()>>,
    state: SessionState,
}

impl Session {
    /// Open the port named in `settings` with the fixed link parameters and
    /// start displaying what the device sends on stdout.
    pub fn open(settings: &Settings) -> Result<Self> {
        let name = settings
            .path
            .as_deref()
            .ok_or_else(|| Error::PortUnavailable(String::new()))?;
        let port = open_port(name, settings.poll_interval)?;
        let reader = port.try_clone()?;
        Self::start(name, reader, port, io::stdout(), settings)
    }

    /// Start a session over any byte streams.
    ///
    /// `reader` should return `TimedOut` (or `WouldBlock`) when no data is
    /// available within the poll interval, the way a serial port opened with
    /// a timeout does, so the receiver can notice when the session closes.
    pub fn start<R, W, D>(
        name: &str,
        reader: R,
        writer: W,
        display: D,
        settings: &Settings,
    ) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
        D: Write + Send + 'static,
    {
        let cancel = CancelToken::new();
        let (outbox, inbox) = outbox::channel(settings.queue_capacity);

        let poll = settings.poll_interval;
        let writer_cancel = cancel.clone();
        let writer_task = thread::Builder::new()
            .name("serial-writer".into())
            .spawn(move || writer::run(inbox, writer, &writer_cancel, poll))?;

        let chunks = LineChunks::new(reader, settings.line_capacity, cancel.clone());
        let receiver_cancel = cancel.clone();
        let receiver_task = match thread::Builder::new()
            .name("serial-receiver".into())
            .spawn(move || receiver::run(chunks, display, &receiver_cancel))
        {
            Ok(task) => task,
            Err(e) => {
                cancel.request();
                let _ = writer_task.join();
                return Err(e.into());
            }
        };

        info!("Session open on {}", name);
        Ok(Session {
            name: name.to_owned(),
            outbox,
            cancel,
            tasks: vec![writer_task, receiver_task],
            state: SessionState::Open,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A submitting handle for another task.
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// The token that closes this session when raised.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Block until something asks the session to shut down.
    pub fn wait(&self) -> Shutdown {
        self.cancel.wait()
    }

    /// Stop both tasks and release the port. Payloads already queued are
    /// written first. Closing twice is harmless.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.cancel.request();
        for task in self.tasks.drain(..) {
            if task.join().is_err() {
                error!("a serial task of {} panicked", self.name);
            }
        }
        self.state = SessionState::Closed;
        info!("Session on {} closed", self.name);
    }
}

impl Transmit for Session {
    fn send_text(&self, line: &str) -> Result<()> {
        self.outbox.send_text(line)
    }

    fn send_bytes(&self, buffer: Vec<u8>) -> Result<()> {
        self.outbox.send_bytes(buffer)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}
