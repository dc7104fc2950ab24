//! RFC 1123 GMT date formatting for the `Date` response header.

use time::{format_description::well_known::Rfc2822, OffsetDateTime};

/// Formats `now` as `Mon, 07 Nov 1994 08:49:37 GMT`. Built from `Rfc2822`
/// rather than a hand-rolled format string: RFC 1123 dates share its layout
/// apart from the GMT/offset suffix, which we swap in ourselves.
pub fn http_date(now: OffsetDateTime) -> String {
    let rfc2822 = now
        .to_offset(time::UtcOffset::UTC)
        .format(&Rfc2822)
        .unwrap_or_default();
    match rfc2822.rsplit_once(' ') {
        Some((prefix, _offset)) => format!("{prefix} GMT"),
        None => rfc2822,
    }
}

pub fn http_date_now() -> String {
    http_date(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_known_instant() {
        let dt = datetime!(1994-11-07 08:49:37 UTC);
        assert_eq!(http_date(dt), "Mon, 07 Nov 1994 08:49:37 GMT");
    }
}
