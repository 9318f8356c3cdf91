//! Hexload prepares small firmware images and pushes them to a microcontroller
//! over a serial line, from an interactive console.
//!
//! There are two halves:
//!
//! * the [`encoder`] turns a textual hex dump into the binary image the
//!   device expects, optionally bit-reversing and/or nibble-swapping every
//!   byte, and reports a checksum diagnostic for it;
//! * the serial console ([`transport`] and [`shell`]) lets the operator talk to
//!   the device while its output is displayed, and recognizes the
//!   `LOAD <path>` command which pushes an image with the load sequence:
//!   the `LOAD` token, a settle delay, then exactly one flash sector of raw
//!   bytes.
//!
//! The console is built out of three independent tasks sharing an explicit
//! cancellation signal:
//!
//! * **console-reader**: reads operator lines and runs commands,
//! * **serial-writer**: consumes the bounded outbound queue,
//! * **serial-receiver**: copies device output to the display.
//!
//! **Example** - a console session:
//! ```no_run
//! use std::io;
//! use hexload::{shell, transport::Session, SettingsBuilder};
//!
//! let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
//! let mut session = Session::open(&settings).unwrap();
//! let lines = shell::ConsoleLines::new(io::stdin(), settings.console_line_capacity);
//! shell::run(lines, &session.outbox(), &session.cancel_token());
//! session.close();
//! ```

pub mod encoder;
mod error;
mod settings;
pub mod shell;
pub mod transport;
mod utils;

pub use error::{Error, Result};
pub use settings::{Settings, SettingsBuilder, BAUD_RATE, IMAGE_SIZE, SETTLE_DELAY};
pub use utils::{classify_open_error, describe_port, list_ports, select_port};
