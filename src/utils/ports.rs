//! Serial port device discovery and opening.

use std::{io, path::Path, time::Duration};

use console::Term;
use log::{debug, info};
use serialport::{available_ports, ErrorKind, SerialPort, SerialPortInfo, SerialPortType};

use crate::{
    settings::{BAUD_RATE, DATA_BITS, FLOW_CONTROL, PARITY, STOP_BITS},
    Error, Result,
};

//==============================================================================
// Public Interface
//==============================================================================

/// Enumerates the serial ports available on the system.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    Ok(available_ports()?)
}

/// Port name, followed by manufacturer and product for USB serial controllers.
pub fn describe_port(port: &SerialPortInfo) -> String {
    match &port.port_type {
        // USB ports give us more info about the connected serial controller
        SerialPortType::UsbPort(info) => format!(
            "{}: ({} / {})",
            port.port_name,
            info.manufacturer.as_ref().map_or("", String::as_str),
            info.product.as_ref().map_or("", String::as_str)
        ),
        _ => port.port_name.clone(),
    }
}

/// Presents the available ports for the user to select one.
///
/// Returns `None` when there are no ports or the user cancels the selection.
pub fn select_port() -> Result<Option<String>> {
    use dialoguer::{theme::ColorfulTheme, Select};

    let ports = list_ports()?;
    if ports.is_empty() {
        return Ok(None);
    }

    let items: Vec<String> = ports.iter().map(describe_port).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a port to be used")
        .items(&items)
        .default(0)
        .interact_on_opt(&Term::stderr())?;

    Ok(selection.map(|index| ports[index].port_name.clone()))
}

/// Opens `name` with the fixed link parameters (57600 8N1, no flow control).
///
/// Reads and writes on the returned port time out after `poll_interval`, which
/// only serves to let the session tasks observe cancellation. A port that is
/// busy is retried a few times before giving up with [`Error::PortInUse`].
pub(crate) fn open_port(name: &str, poll_interval: Duration) -> Result<Box<dyn SerialPort>> {
    use retry::{delay, retry_with_index, OperationResult};

    check_serial_device(name)?;

    let result = retry_with_index(delay::Fixed::from_millis(500).take(3), |index| {
        debug!("Trying to open {} ({})", name, index);
        let opened = serialport::new(name, BAUD_RATE)
            .data_bits(DATA_BITS)
            .stop_bits(STOP_BITS)
            .parity(PARITY)
            .flow_control(FLOW_CONTROL)
            .timeout(poll_interval)
            .open();
        match opened {
            Ok(port) => OperationResult::Ok(port),
            Err(e) => match classify_open_error(name, e) {
                busy @ Error::PortInUse(_) => OperationResult::Retry(busy),
                other => OperationResult::Err(other),
            },
        }
    });

    match result {
        Ok(port) => {
            info!("Connected to {} at {} baud", name, BAUD_RATE);
            debug!("data_bits    : {:#?}", DATA_BITS);
            debug!("stop_bits    : {:#?}", STOP_BITS);
            debug!("parity       : {:#?}", PARITY);
            debug!("flow control : {:#?}", FLOW_CONTROL);
            Ok(port)
        }
        Err(retry::Error::Operation {
            error,
            total_delay,
            tries,
        }) => {
            info!(
                "Failed to open the port after {:?} and {} tries: {}",
                total_delay, tries, error,
            );
            Err(error)
        }
        Err(retry::Error::Internal(description)) => {
            info!("Internal retry error while opening port: {}", description);
            Err(Error::Io(io::Error::new(io::ErrorKind::Other, description)))
        }
    }
}

/// Maps a driver error raised while opening `name` to one of the open failure
/// kinds, when it is one.
pub fn classify_open_error(name: &str, err: serialport::Error) -> Error {
    let description = err.description.to_lowercase();
    match err.kind {
        ErrorKind::NoDevice | ErrorKind::Io(io::ErrorKind::NotFound) => {
            Error::PortUnavailable(name.to_owned())
        }
        ErrorKind::Io(io::ErrorKind::PermissionDenied)
        | ErrorKind::Io(io::ErrorKind::AddrInUse) => Error::PortInUse(name.to_owned()),
        _ if description.contains("busy")
            || description.contains("in use")
            || description.contains("access is denied") =>
        {
            Error::PortInUse(name.to_owned())
        }
        // ENOTTY: the device exists but does not speak termios.
        _ if description.contains("inappropriate ioctl") => {
            Error::NotASerialPort(name.to_owned())
        }
        _ => Error::Serial(err),
    }
}

//==============================================================================
// Private stuff
//==============================================================================

/// Rejects names that exist on the filesystem but cannot be serial devices.
#[cfg(unix)]
fn check_serial_device(name: &str) -> Result<()> {
    use std::os::unix::fs::FileTypeExt;

    match Path::new(name).metadata() {
        Ok(meta) if !meta.file_type().is_char_device() => {
            Err(Error::NotASerialPort(name.to_owned()))
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(Error::PortUnavailable(name.to_owned()))
        }
        // Let the driver report anything else.
        Err(_) => Ok(()),
    }
}

#[cfg(not(unix))]
fn check_serial_device(name: &str) -> Result<()> {
    if Path::new(name).is_file() {
        return Err(Error::NotASerialPort(name.to_owned()));
    }
    Ok(())
}
