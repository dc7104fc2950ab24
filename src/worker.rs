//! Worker accept/dispatch loop. A single preforked child owns the
//! inherited listening socket exclusively for the span of this call: poll it
//! with a 1-second timeout so the cooperative exit flag gets checked even
//! with no traffic, accept one connection at a time, load the handler
//! plugin fresh for that connection and unload it before the next accept,
//! and hand the parsed request across the FFI boundary. Mirrors
//! `original_source/src/worker.c`'s `worker_signal_handler`/`worker_process`
//! pair, which `dlopen`/`dlsym`/`dlclose`s the plugin unconditionally on
//! every loop iteration; this replaces that triple with `libloading`.

use crate::prelude::*;
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use origin_proto::{FfiRequest, FfiResponse, HandleRequestFn, HandlerCleanupFn, HandlerInitFn};
use nix::poll::PollTimeout;
use std::ffi::CString;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::fd::{AsFd, BorrowedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

static EXIT_FLAG: AtomicBool = AtomicBool::new(false);

extern "C" fn on_terminate(_signum: i32) {
    EXIT_FLAG.store(true, Ordering::SeqCst);
}

/// Installs SIGTERM/SIGINT handlers that flip [`EXIT_FLAG`] instead of
/// terminating, so the loop below gets one last chance to notice between
/// `poll` calls (worker.c's `worker_signal_handler`, minus the pid-forwarding
/// the supervisor already does on our behalf).
fn install_signal_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_terminate),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe {
        signal::sigaction(Signal::SIGTERM, &action)?;
        signal::sigaction(Signal::SIGINT, &action)?;
    }
    Ok(())
}

struct LoadedPlugin {
    library: libloading::Library,
}

impl LoadedPlugin {
    /// Unconditional dlopen-equivalent: called once per accepted connection
    /// and dropped (unloaded) at the end of that connection, regardless of
    /// whether the dylib on disk has changed since the last load.
    fn load(path: &Path) -> Result<Self> {
        let library = unsafe { libloading::Library::new(path)? };
        Ok(Self { library })
    }
}

/// Runs the worker's accept/dispatch loop until the exit flag is observed.
/// `listener` is the pre-bound, pre-listening socket inherited from the
/// supervisor; every worker `poll`s the same fd, SO_REUSEADDR-bound, and the
/// kernel arbitrates which worker wakes on each connection.
pub fn run(listener: &TcpListener, config: &DaemonConfig) -> Result<()> {
    install_signal_handlers()?;

    let plugin_path = PathBuf::from(&config.plugin_path);
    let doc_root = CString::new(config.document_root.as_str())
        .map_err(|_| "document root path contains an interior NUL")?;
    let kv_path = CString::new(config.kv_store_path.as_str())
        .map_err(|_| "kv store path contains an interior NUL")?;

    let borrowed_fd: BorrowedFd<'_> = listener.as_fd();
    let timeout = PollTimeout::try_from(ACCEPT_POLL_TIMEOUT_MS).unwrap_or(PollTimeout::MAX);
    let mut last_known_mtime: Option<SystemTime> = None;

    while !EXIT_FLAG.load(Ordering::SeqCst) {
        let mut fds = [PollFd::new(borrowed_fd, PollFlags::POLLIN)];
        let ready = match poll(&mut fds, timeout) {
            Ok(n) => n,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        };
        if ready <= 0 {
            continue;
        }

        let (mut stream, _peer) = match listener.accept() {
            Ok(pair) => pair,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };

        log_reload_if_stale(&mut last_known_mtime, &plugin_path);

        let plugin = match LoadedPlugin::load(&plugin_path) {
            Ok(p) => p,
            Err(e) => {
                warn!("plugin load failed, dropping connection: {e}");
                continue;
            }
        };

        if let Err(e) = serve_one(&mut stream, &plugin, &doc_root, &kv_path) {
            warn!("connection failed: {e}");
        }
    }

    debug!("worker {} observed exit flag, returning", std::process::id());
    Ok(())
}

/// Pure logging signal: compares the dylib's mtime against the last
/// observed value and, if it advanced, logs that a reload happened. Never
/// gates whether the plugin gets loaded — `run` loads it unconditionally on
/// every accepted connection.
fn log_reload_if_stale(last_known: &mut Option<SystemTime>, path: &Path) {
    let current_mtime = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(m) => m,
        Err(e) => {
            warn!("could not stat plugin at {path:?}: {e}");
            return;
        }
    };
    if *last_known != Some(current_mtime) {
        if last_known.is_some() {
            info!("handler plugin at {path:?} changed, reloading");
        }
        *last_known = Some(current_mtime);
    }
}

/// Serves one accepted connection, writing a framed HTTP error response for
/// any failure that maps to an HTTP status before the connection closes.
fn serve_one(
    stream: &mut TcpStream,
    plugin: &LoadedPlugin,
    doc_root: &CString,
    kv_path: &CString,
) -> std::result::Result<(), RequestError> {
    let result = try_serve(stream, plugin, doc_root, kv_path);
    if let Err(ref e) = result {
        if let Some(status) = e.status_code() {
            let wire = error_response_bytes(status);
            let _ = write_all_retrying(stream, &wire);
        }
    }
    result
}

fn error_response_bytes(status: u16) -> Vec<u8> {
    let reason = origin_http::reason_phrase(status);
    format!("HTTP/1.1 {status} {reason}\r\nConnection: close\r\nContent-Length: 0\r\n\r\n").into_bytes()
}

fn try_serve(
    stream: &mut TcpStream,
    plugin: &LoadedPlugin,
    doc_root: &CString,
    kv_path: &CString,
) -> std::result::Result<(), RequestError> {
    let mut buf = vec![0u8; REQUEST_BUFFER_BOUND];
    let n = stream
        .read(&mut buf)
        .map_err(|e| RequestError::IOError(e.to_string()))?;
    buf.truncate(n);

    let request = origin_http::parse_request(&buf).map_err(|_| RequestError::InvalidRequest)?;

    let header_block = serialize_headers(&request.headers);
    let ffi_request = FfiRequest {
        method: origin_proto::CBytes::borrowed(request.method.as_str().as_bytes()),
        target: origin_proto::CBytes::borrowed(request.target.as_bytes()),
        version: origin_proto::CBytes::borrowed(request.version.as_bytes()),
        header_block: origin_proto::CBytes::borrowed(&header_block),
        body: origin_proto::CBytes::borrowed(&request.body),
        content_length: request.content_length,
    };

    let response_ptr = unsafe {
        let init: libloading::Symbol<HandlerInitFn> = plugin
            .library
            .get(origin_proto::SYM_INIT)
            .map_err(|e| RequestError::PluginError(e.to_string()))?;
        let handle: libloading::Symbol<HandleRequestFn> = plugin
            .library
            .get(origin_proto::SYM_HANDLE_REQUEST)
            .map_err(|e| RequestError::PluginError(e.to_string()))?;
        let cleanup: libloading::Symbol<HandlerCleanupFn> = plugin
            .library
            .get(origin_proto::SYM_CLEANUP)
            .map_err(|e| RequestError::PluginError(e.to_string()))?;

        init();
        let ptr = handle(&ffi_request, doc_root.as_ptr(), kv_path.as_ptr());
        cleanup();
        ptr
    };

    if response_ptr.is_null() {
        return Err(RequestError::PluginError("handler returned null response".into()));
    }

    let wire = unsafe { render_response(&*response_ptr) };

    write_all_retrying(stream, &wire).map_err(|e| RequestError::IOError(e.to_string()))?;

    unsafe {
        let free: libloading::Symbol<origin_proto::FreeResponseFn> = plugin
            .library
            .get(origin_proto::SYM_FREE_RESPONSE)
            .map_err(|e| RequestError::PluginError(e.to_string()))?;
        free(response_ptr);
    }

    Ok(())
}

fn serialize_headers(headers: &[(String, String)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out
}

/// Frames an `FfiResponse` onto the wire. The plugin already built the full
/// header set (including `Connection`/`Date`/`Server` where relevant), so
/// this only needs the status line and body.
unsafe fn render_response(resp: &FfiResponse) -> Vec<u8> {
    let reason = String::from_utf8_lossy(resp.reason.as_slice()).into_owned();
    let headers = resp.header_block.as_slice();
    let body = resp.body.as_slice();

    let mut out = Vec::with_capacity(headers.len() + body.len() + 32);
    out.extend_from_slice(format!("HTTP/1.1 {} {}\r\n", resp.status, reason).as_bytes());
    out.extend_from_slice(headers);
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

fn write_all_retrying(stream: &mut TcpStream, buf: &[u8]) -> std::io::Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match stream.write(&buf[written..]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "peer closed connection mid-write",
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
