use embedded_hal::spi::ErrorKind;

/// Terminal status of a failed message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// The message carries no send data (no opcode), holds a full-duplex or
    /// delay operation, or does not fit in the FIFO.
    InvalidArgument,
    /// The controller's version tag is neither v1 nor v2.
    UnsupportedVersion,
    /// A busy-wait ran past its bound.
    Timeout,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidArgument => write!(f, "invalid SPI message"),
            Error::UnsupportedVersion => write!(f, "no such device: unsupported SPI controller version"),
            Error::Timeout => write!(f, "SPI controller busy timeout"),
        }
    }
}

impl core::error::Error for Error {}

impl embedded_hal::spi::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {
            Error::InvalidArgument => ErrorKind::Other,
            Error::UnsupportedVersion => ErrorKind::Other,
            Error::Timeout => ErrorKind::Other,
        }
    }
}
