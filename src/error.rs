//! Two error types at two different lifetimes, the way the teacher keeps a
//! per-request `ParseError` distinct from its process-level `CleanError`:
//! [`ServerError`] is process-fatal (startup, config, listener setup) and
//! terminates `origind` with a non-zero exit; [`RequestError`] is
//! per-connection and only ever becomes an HTTP status.

use core::fmt;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub struct ServerError(pub Box<dyn Error>);

impl Debug for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\r\x1b[K{self}")
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\x1b[31mERROR\x1b[0m: {}", self.0)
    }
}

impl Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(e: std::net::AddrParseError) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<nix::Error> for ServerError {
    fn from(e: nix::Error) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<config_yaml::YamlError> for ServerError {
    fn from(e: config_yaml::YamlError) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<origin_kv::KvError> for ServerError {
    fn from(e: origin_kv::KvError) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<libloading::Error> for ServerError {
    fn from(e: libloading::Error) -> Self {
        ServerError(Box::new(e))
    }
}

impl From<String> for ServerError {
    fn from(s: String) -> Self {
        ServerError(Box::new(config_yaml::YamlError::from(s)))
    }
}

impl From<&str> for ServerError {
    fn from(s: &str) -> Self {
        ServerError(Box::new(config_yaml::YamlError::from(s.to_string())))
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Per-connection error kinds: every variant here either becomes an
/// HTTP response or, for `Interrupted`/`Fatal`, is handled by the caller
/// before it would ever reach a response.
#[non_exhaustive]
#[derive(Debug)]
pub enum RequestError {
    InvalidRequest,
    NotFound,
    Forbidden,
    MethodNotAllowed,
    IOError(String),
    PluginError(String),
    StoreError(String),
    Interrupted,
    Fatal(String),
}

impl RequestError {
    /// The HTTP status this error kind maps to, or `None` for the two kinds
    /// that never reach the wire.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestError::InvalidRequest => Some(400),
            RequestError::Forbidden => Some(403),
            RequestError::NotFound => Some(404),
            RequestError::MethodNotAllowed => Some(405),
            RequestError::IOError(_) | RequestError::PluginError(_) | RequestError::StoreError(_) => Some(500),
            RequestError::Interrupted | RequestError::Fatal(_) => None,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidRequest => write!(f, "invalid request"),
            RequestError::NotFound => write!(f, "not found"),
            RequestError::Forbidden => write!(f, "forbidden"),
            RequestError::MethodNotAllowed => write!(f, "method not allowed"),
            RequestError::IOError(s) => write!(f, "I/O error: {s}"),
            RequestError::PluginError(s) => write!(f, "plugin error: {s}"),
            RequestError::StoreError(s) => write!(f, "store error: {s}"),
            RequestError::Interrupted => write!(f, "interrupted"),
            RequestError::Fatal(s) => write!(f, "fatal: {s}"),
        }
    }
}

impl std::error::Error for RequestError {}
