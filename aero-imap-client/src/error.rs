use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tls(#[from] rustls::Error),
    #[error("invalid server name `{0}`")]
    InvalidDnsName(String),
    #[error("server did not greet us properly: {0}")]
    Greeting(String),
    #[error("server ended the session: {0}")]
    Bye(String),
    #[error("unable to encode command: {0}")]
    Encode(String),
    #[error("malformed server response: {0}")]
    Malformed(String),
    #[error("connection closed by server")]
    Closed,
    #[error("no answer from server after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
