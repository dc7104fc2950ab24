//! The handler plugin: static file responder and form responder,
//! implemented as plain Rust functions so they have ordinary
//! `#[cfg(test)]` coverage in the rlib, plus a thin `extern "C"` shim
//! (`ffi`) exposing them behind the `origin-proto` ABI for hot-reload by
//! the worker loop.

pub mod ffi;
pub mod form;
pub mod staticfile;

pub use form::handle_form;
pub use staticfile::serve_static;
