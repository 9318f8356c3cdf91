//! Settings related to the `hexload` serial session and the load protocol.
//!
//! The serial link parameters and the load protocol timings are fixed by the
//! device firmware and are exposed as constants. What remains configurable is
//! grouped in [`Settings`]; use the
//! [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values.

use std::time::Duration;

pub use serialport::{DataBits, FlowControl, Parity, StopBits};

// =============================================================================
// Link and protocol constants
// =============================================================================

pub const BAUD_RATE: u32 = 57_600;
pub const DATA_BITS: DataBits = DataBits::Eight;
pub const STOP_BITS: StopBits = StopBits::One;
pub const PARITY: Parity = Parity::None;
pub const FLOW_CONTROL: FlowControl = FlowControl::None;

/// Size of a firmware image, which is the size of one device flash sector.
pub const IMAGE_SIZE: usize = 8192;

/// Pause between the `LOAD` token and the image, while the device firmware
/// switches into receive mode.
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);

// =============================================================================
// Public Interface
// =============================================================================

/// Groups the configurable settings of a `hexload` session and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// The port name, usually the device path. When not set, the port is
    /// selected interactively.
    pub path: Option<String>,
    /// How many payloads may wait for the serial writer before submitters
    /// block.
    pub queue_capacity: usize,
    /// How often blocked tasks wake up to check whether the session is being
    /// closed.
    pub poll_interval: Duration,
    /// Maximum number of bytes received from the device before they are
    /// displayed, even without a line terminator.
    pub line_capacity: usize,
    /// Maximum length of an operator command line.
    pub console_line_capacity: usize,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// use hexload::SettingsBuilder;
///
/// let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
/// assert_eq!(settings.path.as_deref(), Some("/dev/ttyUSB0"));
/// ```
pub struct SettingsBuilder {
    settings: Settings,
}
impl SettingsBuilder {
    /// Start building the settings using default values and no path for the
    /// port.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: Settings {
                path: None,
                queue_capacity: 8,
                poll_interval: Duration::from_millis(100),
                line_capacity: 1024,
                console_line_capacity: 1024,
                _private_use_builder: (),
            },
        }
    }

    /// Set the path to the serial port
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.path = Some(path.into().as_ref().to_owned());
        self
    }

    /// Set the outbound queue capacity, at least one payload
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.settings.queue_capacity = capacity.max(1);
        self
    }

    /// Set the cancellation poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    /// Set the receiver line buffer size, at least one byte
    pub fn line_capacity(mut self, capacity: usize) -> Self {
        self.settings.line_capacity = capacity.max(1);
        self
    }

    /// Set the maximum operator command line length, at least one byte
    pub fn console_line_capacity(mut self, capacity: usize) -> Self {
        self.settings.console_line_capacity = capacity.max(1);
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            path: None,
            queue_capacity: 8,
            poll_interval: Duration::from_millis(100),
            line_capacity: 1024,
            console_line_capacity: 1024,
            _private_use_builder: (),
        }
    )
}

#[test]
fn path() {
    let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
    assert_eq!(settings.path.unwrap(), "/dev/ttyUSB0");
}

#[test]
fn queue_capacity() {
    let settings = SettingsBuilder::new().queue_capacity(2).finalize();
    assert_eq!(settings.queue_capacity, 2);
}

#[test]
fn queue_capacity_never_zero() {
    let settings = SettingsBuilder::new().queue_capacity(0).finalize();
    assert_eq!(settings.queue_capacity, 1);
}

#[test]
fn poll_interval() {
    let interval = Duration::from_millis(5);
    let settings = SettingsBuilder::new().poll_interval(interval).finalize();
    assert_eq!(settings.poll_interval, interval);
}

#[test]
fn line_capacities() {
    let settings = SettingsBuilder::new()
        .line_capacity(16)
        .console_line_capacity(0)
        .finalize();
    assert_eq!(settings.line_capacity, 16);
    assert_eq!(settings.console_line_capacity, 1);
}

#[test]
fn fixed_link_parameters() {
    assert_eq!(BAUD_RATE, 57_600);
    assert_eq!(DATA_BITS, DataBits::Eight);
    assert_eq!(STOP_BITS, StopBits::One);
    assert_eq!(PARITY, Parity::None);
    assert_eq!(IMAGE_SIZE, 8192);
}
