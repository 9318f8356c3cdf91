//! Helper functions to deal with serial ports.

mod ports;

pub use ports::{classify_open_error, describe_port, list_ports, select_port};
pub(crate) use ports::open_port;
