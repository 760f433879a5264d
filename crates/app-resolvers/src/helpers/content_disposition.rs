//! Just enough `Content-Disposition` parsing to recover a file name.
//!
//! Handles the plain `filename=` parameter (quoted or bare) and the
//! RFC 5987 `filename*=` extended form. Anything else in the header is
//! ignored.

use percent_encoding::percent_decode_str;

/// Extract the file name advertised by a `Content-Disposition` header.
///
/// The extended `filename*=` parameter wins over `filename=` when both
/// are present, per RFC 6266.
#[must_use]
pub fn parse_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in header.split(';').skip(1) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };

        let key = key.trim();
        let value = value.trim();

        if key.eq_ignore_ascii_case("filename*") {
            extended = extended.or_else(|| decode_extended_value(value));
        } else if key.eq_ignore_ascii_case("filename") {
            plain = plain.or_else(|| Some(unquote(value).to_string()));
        }
    }

    extended
        .or(plain)
        .filter(|name| !name.is_empty())
        .map(sanitize)
}

/// RFC 5987: `charset'language'percent-encoded-value`. Only UTF-8 (and
/// the ASCII subset thereof) is supported; other charsets are skipped.
fn decode_extended_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');

    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    if !charset.eq_ignore_ascii_case("utf-8") && !charset.eq_ignore_ascii_case("us-ascii") {
        return None;
    }

    Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Strip path separators so a hostile header cannot point the download
/// outside its directory.
fn sanitize(name: String) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect::<String>()
        .trim_end_matches(['.', ' '])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_filename() {
        assert_eq!(
            parse_filename(r#"attachment; filename="My File.zip""#).as_deref(),
            Some("My File.zip")
        );
    }

    #[test]
    fn bare_filename() {
        assert_eq!(
            parse_filename("attachment; filename=report.pdf").as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn extended_filename_wins() {
        let header = "attachment; filename=\"fallback.bin\"; filename*=UTF-8''%e2%82%ac%20rates.zip";
        assert_eq!(parse_filename(header).as_deref(), Some("€ rates.zip"));
    }

    #[test]
    fn unsupported_charset_falls_back() {
        let header = "attachment; filename=\"plain.zip\"; filename*=ISO-8859-1''a%e4b.zip";
        assert_eq!(parse_filename(header).as_deref(), Some("plain.zip"));
    }

    #[test]
    fn no_filename_at_all() {
        assert_eq!(parse_filename("inline"), None);
        assert_eq!(parse_filename("attachment; size=123"), None);
    }

    #[test]
    fn path_components_are_neutralized() {
        assert_eq!(
            parse_filename(r#"attachment; filename="../../etc/passwd""#).as_deref(),
            Some(".._.._etc_passwd")
        );
    }
}
