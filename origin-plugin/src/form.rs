//! Form responder: URL-decode an `application/x-www-form-urlencoded`
//! POST body and append it to the KV store as one submission record set.

use origin_http::{urlencode, Response};
use origin_kv::{write_submission, KvStore};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn handle_form(body: &[u8], kv_path: &Path) -> Response {
    handle_form_at(body, kv_path, SystemTime::now())
}

/// Same as [`handle_form`] but with an explicit clock, so the
/// `post_<unix_seconds>` submission-id scheme is deterministically
/// testable against a fixed instant.
pub fn handle_form_at(body: &[u8], kv_path: &Path, now: SystemTime) -> Response {
    if body.is_empty() {
        return Response::new(200)
            .with_header("Connection", "close")
            .with_body(Vec::new());
    }

    let fields = parse_pairs(body);
    if fields.is_empty() {
        return bad_request();
    }

    let store = match KvStore::open(kv_path) {
        Ok(s) => s,
        Err(e) => {
            origin_log::error!("form: kv store open failed: {e}");
            return internal_error();
        }
    };

    let unix_seconds = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let submission_id = format!("post_{unix_seconds}");

    if let Err(e) = write_submission(&store, &submission_id, &fields) {
        origin_log::error!("form: write_submission failed for {submission_id}: {e}");
        let _ = store.close();
        return internal_error();
    }

    let _ = store.close();

    let summary = render_summary(&submission_id, &fields);
    origin_log::info!("POST -> 200, submission {submission_id}");
    Response::new(200)
        .with_header("Content-Type", "text/html")
        .with_header("Connection", "close")
        .with_body(summary.into_bytes())
}

/// Splits on `&`, then each pair once on `=`; a pair without `=` is skipped
/// rather than rejecting the whole body, preserved from the original
/// source rather than hardened.
fn parse_pairs(body: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(body);
    text.split('&')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((urlencode::decode_str(k), urlencode::decode_str(v)))
        })
        .collect()
}

fn render_summary(submission_id: &str, fields: &[(String, String)]) -> String {
    let mut html = format!("<html><body><h1>Submission {submission_id}</h1><ul>");
    for (k, v) in fields {
        html.push_str(&format!("<li>{k} = {v}</li>"));
    }
    html.push_str("</ul></body></html>");
    html
}

fn bad_request() -> Response {
    Response::new(400)
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
    use std::time::Duration;

    #[test]
    fn empty_body_is_noop_200() {
        let dir = tempfile::tempdir().unwrap();
        let resp = handle_form(b"", &dir.path().join("kv"));
        assert_eq!(resp.status, 200);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn scenario_5_stores_expected_records() {
        let dir = tempfile::tempdir().unwrap();
        let kv_path = dir.path().join("kv");
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        let resp = handle_form_at(b"name=alice&age=30", &kv_path, now);
        assert_eq!(resp.status, 200);

        let store = KvStore::open(&kv_path).unwrap();
        assert_eq!(
            store.get(b"post_1700000000.name").unwrap(),
            Some(b"alice".to_vec())
        );
        assert_eq!(
            store.get(b"post_1700000000.age").unwrap(),
            Some(b"30".to_vec())
        );
        assert_eq!(
            store.get(b"post_1700000000.keys").unwrap(),
            Some(b"name,age".to_vec())
        );
    }

    #[test]
    fn pair_without_equals_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let kv_path = dir.path().join("kv");
        let now = UNIX_EPOCH + Duration::from_secs(42);
        let resp = handle_form_at(b"valid=1&garbage", &kv_path, now);
        assert_eq!(resp.status, 200);

        let store = KvStore::open(&kv_path).unwrap();
        assert_eq!(
            store.get(b"post_42.keys").unwrap(),
            Some(b"valid".to_vec())
        );
    }

    #[test]
    fn body_with_only_malformed_pairs_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let resp = handle_form(b"no-equals-sign-here", &dir.path().join("kv"));
        assert_eq!(resp.status, 400);
    }
}
