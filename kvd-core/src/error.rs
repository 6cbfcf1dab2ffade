use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    io,
};

/// An error produced by the storage engine, the wire protocols, or
/// configuration loading.
#[derive(Debug)]
pub enum Error {
    /// An error reading or writing the underlying file/socket.
    Io(io::Error),
    /// The on-disk file format was truncated or otherwise malformed.
    CorruptFile(String),
    /// A (de-)serialization error from the binary RPC wire format.
    Bincode(bincode::Error),
    /// The configuration was missing a required field or had an invalid
    /// value.
    Config(String),
    /// A malformed request line on the line protocol.
    Protocol(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Bincode(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::Io(err) => write!(f, "IoError: {}", err),
            Error::CorruptFile(msg) => write!(f, "CorruptFile: {}", msg),
            Error::Bincode(err) => write!(f, "BincodeError: {}", err),
            Error::Config(msg) => write!(f, "ConfigError: {}", msg),
            Error::Protocol(msg) => write!(f, "ProtocolError: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Bincode(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
