//! The operator console.
//!
//! The console reads operator input one line at a time and interprets each
//! line as a [`Command`]. It runs on its own task: a `LOAD` blocks further
//! input for the duration of the settle delay, but the device output keeps
//! flowing to the display in the meantime.

mod command;
mod loader;
mod reader;

use std::io;

use console::style;
use log::{error, info};

pub use command::{check_image, Command, Flow};
pub use loader::{load, read_image, read_image_from, LOAD_TOKEN};
pub use reader::ConsoleLines;

use crate::{
    transport::{CancelToken, Transmit},
    Error,
};

/// Feed every line from `lines` to the command interpreter until `EXIT`, the
/// end of input, or cancellation from elsewhere.
///
/// Command errors are reported to the operator and do not stop the console.
/// Whatever ends the loop, `cancel` is raised when it returns, so the rest of
/// the session shuts down too.
pub fn run<I, T>(lines: I, tx: &T, cancel: &CancelToken)
where
    I: IntoIterator<Item = io::Result<String>>,
    T: Transmit + ?Sized,
{
    for line in lines {
        if cancel.is_cancelled() {
            break;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("console read error: {}", e);
                break;
            }
        };

        match Command::parse(&line).execute(tx) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => {
                info!("exit requested");
                break;
            }
            Err(Error::Disconnected) => {
                report(&Error::Disconnected);
                break;
            }
            Err(e) => report(&e),
        }
    }
    cancel.request();
}

fn report(e: &Error) {
    println!("{}", style(format!("[HL] 💥 Error: {}", e)).red());
}
