//! The `extern "C"` ABI shim: the four symbols a worker resolves via
//! `libloading`, mirroring `original_source/include/handler.h`'s
//! `http_handler_init`/`_cleanup`/`_handle_request` quartet plus the ambient
//! `_free_response`. All method dispatch lives here, not in the worker — the
//! worker never hard-codes the responders, it only serializes whichever
//! tagged variant comes back.

use origin_proto::{FfiRequest, FfiResponse, ResponseKind};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;

/// No-op: the contract requires the plugin be stateless across calls, so
/// there is nothing to initialize.
#[no_mangle]
pub extern "C" fn origin_handler_init() {}

/// No-op, symmetric with `origin_handler_init`.
#[no_mangle]
pub extern "C" fn origin_handler_cleanup() {}

/// # Safety
/// `req` must point to a valid, fully-initialized `FfiRequest` whose
/// `CBytes` fields stay valid for the duration of this call. `doc_root` and
/// `kv_path` must be valid, NUL-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn origin_handle_request(
    req: *const FfiRequest,
    doc_root: *const c_char,
    kv_path: *const c_char,
) -> *mut FfiResponse {
    if req.is_null() || doc_root.is_null() || kv_path.is_null() {
        return error_response(500, "missing request context").into_raw();
    }

    let req = &*req;
    let method = String::from_utf8_lossy(req.method.as_slice()).into_owned();
    let target = String::from_utf8_lossy(req.target.as_slice()).into_owned();
    let body = req.body.as_slice().to_vec();

    let doc_root = match CStr::from_ptr(doc_root).to_str() {
        Ok(s) => Path::new(s).to_path_buf(),
        Err(_) => return error_response(500, "invalid document root path").into_raw(),
    };
    let kv_path = match CStr::from_ptr(kv_path).to_str() {
        Ok(s) => Path::new(s).to_path_buf(),
        Err(_) => return error_response(500, "invalid kv store path").into_raw(),
    };

    let resp = match method.as_str() {
        "GET" => to_ffi(ResponseKind::File, crate::serve_static(&target, &doc_root, false)),
        "HEAD" => to_ffi(ResponseKind::File, crate::serve_static(&target, &doc_root, true)),
        "POST" => to_ffi(ResponseKind::Form, crate::handle_form(&body, &kv_path)),
        _ => method_not_allowed(),
    };

    resp.into_raw()
}

/// # Safety
/// `resp` must have been returned by `origin_handle_request` from this same
/// dylib and not already freed.
#[no_mangle]
pub unsafe extern "C" fn origin_free_response(resp: *mut FfiResponse) {
    FfiResponse::reclaim(resp);
}

fn to_ffi(kind: ResponseKind, resp: origin_http::Response) -> FfiResponse {
    let mut header_block = Vec::new();
    for (name, value) in &resp.headers {
        header_block.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    let body = if resp.suppress_body { Vec::new() } else { resp.body };
    FfiResponse::new(kind, resp.status, &resp.reason, header_block, body)
}

fn method_not_allowed() -> FfiResponse {
    FfiResponse::new(
        ResponseKind::Error,
        405,
        "Method Not Allowed",
        b"Allow: GET, HEAD, POST\r\nConnection: close\r\n".to_vec(),
        Vec::new(),
    )
}

fn error_response(status: u16, reason: &str) -> FfiResponse {
    FfiResponse::new(
        ResponseKind::Error,
        status,
        reason,
        b"Connection: close\r\n".to_vec(),
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_not_allowed_carries_allow_header() {
        let resp = method_not_allowed();
        let headers = unsafe { resp.header_block.as_slice() };
        assert!(String::from_utf8_lossy(headers).contains("Allow: GET, HEAD, POST"));
    }
}
