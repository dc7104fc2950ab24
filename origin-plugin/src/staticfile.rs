//! Static file responder: resolve a decoded URI under the document
//! root, reject traversal, and stream file content for GET or headers-only
//! for HEAD.

use origin_http::{date, mime, urlencode, Response};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub fn serve_static(target: &str, doc_root: &Path, is_head: bool) -> Response {
    let decoded = urlencode::decode_str(target);

    if decoded.is_empty() || decoded.contains("..") {
        origin_log::trace!("static: rejecting traversal attempt in {target:?}");
        return bad_request();
    }

    let mut decoded = decoded;
    if decoded == "/" {
        decoded = "/index.html".to_string();
    }

    let mut file_path = doc_root.join(decoded.trim_start_matches('/'));

    let metadata = match fs::metadata(&file_path) {
        Ok(m) => m,
        Err(_) => {
            origin_log::trace!("static: {file_path:?} not found -> 404");
            return not_found();
        }
    };

    if metadata.is_dir() {
        file_path.push("index.html");
        match fs::metadata(&file_path) {
            Ok(m) if m.is_file() => {}
            _ => {
                origin_log::trace!("static: directory {file_path:?} has no index.html -> 404");
                return not_found();
            }
        }
    }

    let body = match fs::read(&file_path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            origin_log::trace!("static: {file_path:?} unreadable -> 403");
            return forbidden();
        }
        Err(_) => {
            origin_log::trace!("static: {file_path:?} open/read failed after stat -> 500");
            return internal_error();
        }
    };

    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let content_type = mime::mime_for_extension(ext);

    let mut resp = Response::new(200)
        .with_header("Content-Type", content_type)
        .with_header("Connection", "close")
        .with_header("Date", date::http_date_now())
        .with_header("Server", "origind")
        .with_body(body);

    if is_head {
        resp = resp.head_only();
    }

    origin_log::info!("GET/HEAD {target} -> 200");
    resp
}

fn bad_request() -> Response {
    Response::new(400)
        .with_header("Connection", "close")
        .with_body(Vec::new())
}

fn not_found() -> Response {
    Response::new(404)
        .with_header("Connection", "close")
        .with_body(Vec::new())
}

fn forbidden() -> Response {
    Response::new(403)
        .with_header("Connection", "close")
        .with_body(Vec::new())
}

fn internal_error() -> Response {
    Response::new(500)
        .with_header("Connection", "close")
        .with_body(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn docroot_with_index() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), b"<h1>hi</h1>").unwrap();
        dir
    }

    #[test]
    fn root_serves_index_html() {
        let dir = docroot_with_index();
        let resp = serve_static("/", dir.path(), false);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"<h1>hi</h1>");
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = docroot_with_index();
        let resp = serve_static("/../etc/passwd", dir.path(), false);
        assert_eq!(resp.status, 400);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn missing_file_is_404() {
        let dir = docroot_with_index();
        let resp = serve_static("/missing.txt", dir.path(), false);
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn head_suppresses_body_but_sets_content_length() {
        let dir = docroot_with_index();
        fs::write(dir.path().join("image.png"), vec![0u8; 1024]).unwrap();
        let resp = serve_static("/image.png", dir.path(), true);
        assert_eq!(resp.status, 200);
        assert!(resp.suppress_body);
        assert_eq!(
            resp.headers
                .iter()
                .find(|(k, _)| k == "Content-Length")
                .map(|(_, v)| v.as_str()),
            Some("1024")
        );
    }

    #[test]
    fn directory_falls_back_to_index_html() {
        let dir = tempfile::tempdir().unwrap();
        let subdir = dir.path().join("docs");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("index.html"), b"docs index").unwrap();
        let resp = serve_static("/docs", dir.path(), false);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"docs index");
    }
}
