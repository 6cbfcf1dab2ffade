use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    io,
};

/// An error communicating with a kvd server, from either client
/// variant.
#[derive(Debug)]
pub enum Error {
    /// An error communicating over the wire.
    Io(io::Error),
    /// The response could not be parsed, or the server reported a
    /// status the client does not understand.
    Protocol(String),
    /// A (de-)serialization error from the binary RPC wire format.
    Core(kvd_core::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<kvd_core::Error> for Error {
    fn from(err: kvd_core::Error) -> Self {
        Self::Core(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::Io(err) => write!(f, "IoError: {}", err),
            Error::Protocol(msg) => write!(f, "ProtocolError: {}", msg),
            Error::Core(err) => write!(f, "CoreError: {}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Core(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
