//! Request-line/header/body parsing. Operates on a single already-read byte
//! buffer rather than incrementally, matching the worker loop's one-shot
//! "read up to the request buffer bound, then parse" step.

use std::fmt;

pub const MAX_METHOD_LEN: usize = 16;
pub const MAX_TARGET_LEN: usize = 2048;
pub const MAX_HEADER_BLOCK_LEN: usize = 4096;
pub const MAX_BODY_LEN: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MalformedRequestLine,
    MethodTooLong,
    TargetTooLong,
    HeaderBlockTooLong,
    MissingHeaderTerminator,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedRequestLine => write!(f, "malformed request line"),
            ParseError::MethodTooLong => write!(f, "method token exceeds {MAX_METHOD_LEN} bytes"),
            ParseError::TargetTooLong => write!(f, "request-target exceeds {MAX_TARGET_LEN} bytes"),
            ParseError::HeaderBlockTooLong => {
                write!(f, "header block exceeds {MAX_HEADER_BLOCK_LEN} bytes")
            }
            ParseError::MissingHeaderTerminator => write!(f, "no blank line terminating headers"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub content_length: u64,
}

impl Request {
    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a single buffered read into a [`Request`]. Fails only on a missing
/// blank-line header terminator, a malformed request line, or a token
/// exceeding its bound. A short or absent body is not an error — the caller
/// adopts whatever fits.
pub fn parse_request(buf: &[u8]) -> Result<Request, ParseError> {
    let header_end = find_subslice(buf, b"\r\n\r\n").ok_or(ParseError::MissingHeaderTerminator)?;
    let header_block = &buf[..header_end];
    let body_start = header_end + 4;

    let mut lines = header_block.split(|&b| b == b'\n').map(strip_trailing_cr);
    let request_line = lines.next().ok_or(ParseError::MalformedRequestLine)?;

    let header_bytes_total: usize = header_block.len() - request_line.len();
    if header_bytes_total > MAX_HEADER_BLOCK_LEN {
        return Err(ParseError::HeaderBlockTooLong);
    }

    let (method, target, version) = parse_request_line(request_line)?;

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some(colon) = line.iter().position(|&b| b == b':') {
            let name = String::from_utf8_lossy(&line[..colon]).trim().to_string();
            let value = String::from_utf8_lossy(&line[colon + 1..]).trim().to_string();
            headers.push((name, value));
        }
    }

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<u64>().ok())
        .unwrap_or(0);

    let available = buf.len().saturating_sub(body_start);
    let adopt = (content_length as usize).min(available).min(MAX_BODY_LEN);
    let body = buf[body_start..body_start + adopt].to_vec();

    Ok(Request {
        method: Method::from(method.as_str()),
        target,
        version,
        headers,
        body,
        content_length,
    })
}

fn parse_request_line(line: &[u8]) -> Result<(String, String, String), ParseError> {
    let text = std::str::from_utf8(line).map_err(|_| ParseError::MalformedRequestLine)?;
    let mut parts = text.splitn(3, ' ');
    let method = parts.next().ok_or(ParseError::MalformedRequestLine)?;
    let target = parts.next().ok_or(ParseError::MalformedRequestLine)?;
    let version = parts.next().ok_or(ParseError::MalformedRequestLine)?;
    if parts.next().is_some() {
        return Err(ParseError::MalformedRequestLine);
    }

    if method.is_empty() || method.len() > MAX_METHOD_LEN {
        return Err(ParseError::MethodTooLong);
    }
    if target.is_empty() || target.len() > MAX_TARGET_LEN {
        return Err(ParseError::TargetTooLong);
    }
    if version.is_empty() {
        return Err(ParseError::MalformedRequestLine);
    }

    Ok((method.to_string(), target.to_string(), version.to_string()))
}

fn strip_trailing_cr(line: &[u8]) -> &[u8] {
    match line.split_last() {
        Some((&b'\r', rest)) => rest,
        _ => line,
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_get() {
        let req = parse_request(b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.target, "/index.html");
        assert_eq!(req.version, "HTTP/1.1");
        assert!(req.body.is_empty());
    }

    #[test]
    fn parses_post_with_body() {
        let raw = b"POST /submit HTTP/1.1\r\nContent-Length: 17\r\n\r\nname=alice&age=30";
        let req = parse_request(raw).unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.content_length, 17);
        assert_eq!(req.body, b"name=alice&age=30");
    }

    #[test]
    fn truncates_short_body_without_failing() {
        let raw = b"POST /submit HTTP/1.1\r\nContent-Length: 100\r\n\r\nonly-a-little";
        let req = parse_request(raw).unwrap();
        assert_eq!(req.content_length, 100);
        assert_eq!(req.body, b"only-a-little");
    }

    #[test]
    fn missing_blank_line_is_malformed() {
        let raw = b"GET / HTTP/1.1\r\nHost: x\r\n";
        assert_eq!(parse_request(raw), Err(ParseError::MissingHeaderTerminator));
    }

    #[test]
    fn method_over_bound_is_rejected() {
        let raw = b"XXXXXXXXXXXXXXXXXX / HTTP/1.1\r\n\r\n";
        assert_eq!(parse_request(raw), Err(ParseError::MethodTooLong));
    }

    #[test]
    fn unknown_method_is_preserved_for_dispatch() {
        let req = parse_request(b"DELETE /x HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.method, Method::Other("DELETE".to_string()));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = parse_request(b"GET / HTTP/1.1\r\nContent-Length: 0\r\n\r\n").unwrap();
        assert_eq!(req.header("content-LENGTH"), Some("0"));
    }
}
