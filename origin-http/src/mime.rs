//! Extension-to-`Content-Type` table for the static file responder.

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        assert_eq!(mime_for_extension("HTML"), "text/html");
        assert_eq!(mime_for_extension("PNG"), "image/png");
    }

    #[test]
    fn unknown_extension_falls_back() {
        assert_eq!(mime_for_extension("bin"), "application/octet-stream");
    }
}
