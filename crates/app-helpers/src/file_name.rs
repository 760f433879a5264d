use percent_encoding::percent_decode_str;
use url::Url;

/// Derive a usable file name from a URL, ignoring any query string.
#[must_use]
pub fn from_url(url: &Url) -> Option<String> {
    let name = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    let name = percent_decode_str(name).decode_utf8_lossy();

    if name.is_empty() {
        None
    } else {
        Some(name.into_owned())
    }
}

/// Same as [`from_url`] but for URL strings that may not parse as a [`Url`].
#[must_use]
pub fn from_url_str(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(url) => from_url(&url),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            let name = path.rsplit('/').next().filter(|x| !x.is_empty())?;

            Some(percent_decode_str(name).decode_utf8_lossy().into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_query_strings() {
        let url = Url::parse("https://example.com/files/archive.zip?key=1&dl=1").expect("url");
        assert_eq!(from_url(&url).as_deref(), Some("archive.zip"));
    }

    #[test]
    fn skips_trailing_slashes() {
        let url = Url::parse("https://example.com/files/archive.zip/").expect("url");
        assert_eq!(from_url(&url).as_deref(), Some("archive.zip"));
    }

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(
            from_url_str("https://example.com/My%20File.zip?download"),
            Some("My File.zip".to_string())
        );
    }

    #[test]
    fn empty_path_yields_nothing() {
        let url = Url::parse("https://example.com/").expect("url");
        assert_eq!(from_url(&url), None);
    }
}
