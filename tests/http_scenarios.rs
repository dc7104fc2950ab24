//! Black-box coverage of the literal request/response scenarios:
//! drives the plugin's responders directly, the same way the worker loop
//! calls across the FFI boundary, without actually forking a daemon.

use origin_plugin::{handle_form, serve_static};
use origin_proto::{CBytes, FfiRequest};
use std::ffi::CString;
use std::fs;
use std::time::{Duration, UNIX_EPOCH};

fn docroot() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), b"<h1>home</h1>").unwrap();
    dir
}

#[test]
fn get_root_serves_index() {
    let dir = docroot();
    let resp = serve_static("/", dir.path(), false);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"<h1>home</h1>");
}

#[test]
fn get_with_path_traversal_is_rejected() {
    let dir = docroot();
    let resp = serve_static("/../etc/passwd", dir.path(), false);
    assert_eq!(resp.status, 400);
}

#[test]
fn get_missing_file_is_404() {
    let dir = docroot();
    let resp = serve_static("/nope.html", dir.path(), false);
    assert_eq!(resp.status, 404);
}

#[test]
fn head_on_1024_byte_file_reports_length_without_body() {
    let dir = docroot();
    fs::write(dir.path().join("blob.bin"), vec![7u8; 1024]).unwrap();
    let resp = serve_static("/blob.bin", dir.path(), true);
    assert_eq!(resp.status, 200);
    assert!(resp.suppress_body);
    let content_length = resp
        .headers
        .iter()
        .find(|(k, _)| k == "Content-Length")
        .map(|(_, v)| v.as_str());
    assert_eq!(content_length, Some("1024"));
}

#[test]
fn post_scenario_records_name_and_age() {
    let dir = tempfile::tempdir().unwrap();
    let kv_path = dir.path().join("origind.kv");
    let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

    let resp = origin_plugin::form::handle_form_at(b"name=alice&age=30", &kv_path, now);
    assert_eq!(resp.status, 200);
    assert!(String::from_utf8_lossy(&resp.body).contains("alice"));

    let store = origin_kv::KvStore::open(&kv_path).unwrap();
    let fields = origin_kv::read_submission(&store, "post_1700000000")
        .unwrap()
        .expect("submission should be committed");
    assert_eq!(
        fields,
        vec![
            ("name".to_string(), "alice".to_string()),
            ("age".to_string(), "30".to_string()),
        ]
    );
}

#[test]
fn unsupported_method_maps_to_405_with_allow_header() {
    let dir = docroot();
    let kv_path = dir.path().join("origind.kv");
    let doc_root_c = CString::new(dir.path().to_str().unwrap()).unwrap();
    let kv_path_c = CString::new(kv_path.to_str().unwrap()).unwrap();

    let req = FfiRequest {
        method: CBytes::borrowed(b"DELETE"),
        target: CBytes::borrowed(b"/x"),
        version: CBytes::borrowed(b"HTTP/1.1"),
        header_block: CBytes::empty(),
        body: CBytes::empty(),
        content_length: 0,
    };

    let resp_ptr = unsafe {
        origin_plugin::ffi::origin_handle_request(&req, doc_root_c.as_ptr(), kv_path_c.as_ptr())
    };
    assert!(!resp_ptr.is_null());

    unsafe {
        let resp = &*resp_ptr;
        assert_eq!(resp.status, 405);
        let headers = String::from_utf8_lossy(resp.header_block.as_slice()).into_owned();
        assert!(headers.contains("Allow: GET, HEAD, POST"));
        origin_plugin::ffi::origin_free_response(resp_ptr);
    }
}

#[test]
fn form_submission_is_empty_body_noop() {
    let dir = tempfile::tempdir().unwrap();
    let resp = handle_form(b"", &dir.path().join("origind.kv"));
    assert_eq!(resp.status, 200);
    assert!(resp.body.is_empty());
}
