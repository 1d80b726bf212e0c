//! Serial link abstraction and the `serialport` opener.

use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits, TTYPort};

use crate::infrastructure::serial_console::RelayError;

/// A bidirectional byte stream the relay can wait on.
///
/// Implemented for anything readable, writable and backed by a file
/// descriptor: a [`TTYPort`], a `UnixStream`, a `File`.
pub trait SerialLink: Read + Write + AsRawFd {}

impl<T: Read + Write + AsRawFd + ?Sized> SerialLink for T {}

/// Opens `path` as a raw 8N1 TTY with zero timeouts and no flow control.
///
/// Reads and writes never wait: the relay only touches the port after
/// `poll(2)` reports it ready.
///
/// # Errors
///
/// [`RelayError::NotFound`] and [`RelayError::PermissionDenied`] name the
/// path; anything else is [`RelayError::Open`].
pub fn open_serial(path: &str, baud: u32) -> Result<TTYPort, RelayError> {
    serialport::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(Duration::ZERO)
        .open_native()
        .map_err(|e| classify_open_error(path, e))
}

fn classify_open_error(path: &str, source: serialport::Error) -> RelayError {
    let path = path.to_string();
    match source.kind {
        serialport::ErrorKind::NoDevice
        | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => RelayError::NotFound { path },
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            RelayError::PermissionDenied { path }
        }
        _ => RelayError::Open { path, source },
    }
}

/// Reads whatever the link has ready.
///
/// Non-blocking "nothing yet" conditions count as zero bytes.
pub(crate) fn read_available<L: SerialLink + ?Sized>(
    link: &mut L,
    buf: &mut [u8],
) -> io::Result<usize> {
    match link.read(buf) {
        Ok(n) => Ok(n),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
            ) =>
        {
            Ok(0)
        }
        Err(e) => Err(e),
    }
}
