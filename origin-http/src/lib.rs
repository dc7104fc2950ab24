//! HTTP/1.x wire types: request parsing, response framing, URL-decoding, the
//! static-file MIME table and RFC 1123 date formatting. No sockets, no I/O —
//! every function here is a pure transform over bytes so the worker loop and
//! the handler plugin can both depend on it without pulling in networking.

pub mod date;
pub mod mime;
pub mod request;
pub mod response;
pub mod urlencode;

pub use request::{parse_request, Method, ParseError, Request};
pub use response::{reason_phrase, Response};
