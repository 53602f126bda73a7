use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

use crate::protocol::{ProtocolViolation, ResultCode};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad command-line input. Raised before any socket is touched.
    #[error("invalid argument: {0}")]
    Config(String),

    #[error("program error: failed to allocate query buffer: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("program error: cannot encode {input:?}: {reason}")]
    Format { input: String, reason: &'static str },

    #[error("{op} encountered socket error: {source}")]
    Network {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    #[error("failed with Rcode = {0}")]
    ServerFailure(ResultCode),

    #[error("no reply: no response from server after {attempts} attempts")]
    NoReply { attempts: u32 },

    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

impl Error {
    pub(crate) fn format(input: &str, reason: &'static str) -> Error {
        Error::Format {
            input: input.to_owned(),
            reason,
        }
    }

    pub(crate) fn network(op: &'static str, source: io::Error) -> Error {
        Error::Network { op, source }
    }

    /// OS error code behind a socket failure, when there is one.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            Error::Network { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}
