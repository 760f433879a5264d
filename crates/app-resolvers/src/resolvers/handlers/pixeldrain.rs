use url::Url;

use super::super::{Resolution, ResolveRequest, Resolver};
use crate::{error::ResolverError, report::ProgressReporter};

const API_BASE: &str = "https://pixeldrain.com/api/file";

/// Pixeldrain needs no scraping at all: every `/u/<id>` page maps to a
/// fixed-pattern API URL that serves the raw file.
#[derive(Debug, Default)]
pub struct PixeldrainResolver;

#[async_trait::async_trait]
impl Resolver for PixeldrainResolver {
    fn name(&self) -> &'static str {
        "pixeldrain"
    }

    fn description(&self) -> &'static str {
        "Maps pixeldrain.com file pages onto their download API"
    }

    fn can_resolve(&self, request: &ResolveRequest) -> bool {
        matches!(request.host(), "pixeldrain.com" | "www.pixeldrain.com")
            && request.url.path().starts_with("/u/")
    }

    async fn resolve(
        &self,
        request: &ResolveRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolution, ResolverError> {
        reporter.update("Resolving the Pixeldrain link...").await;

        let direct = direct_url(&request.url).ok_or_else(|| {
            ResolverError::page("Pixeldrain URL carries no file id")
        })?;

        // The fetcher probes Content-Disposition for the real name, so
        // nothing else to do here.
        Ok(Resolution::from_url(direct))
    }
}

fn direct_url(url: &Url) -> Option<String> {
    let id = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    if id == "u" {
        return None;
    }

    Some(format!("{API_BASE}/{id}?download"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_api_url() {
        let url = Url::parse("https://pixeldrain.com/u/abcd1234").expect("url");
        assert_eq!(
            direct_url(&url).as_deref(),
            Some("https://pixeldrain.com/api/file/abcd1234?download")
        );
    }

    #[test]
    fn tolerates_trailing_slash() {
        let url = Url::parse("https://pixeldrain.com/u/abcd1234/").expect("url");
        assert_eq!(
            direct_url(&url).as_deref(),
            Some("https://pixeldrain.com/api/file/abcd1234?download")
        );
    }

    #[test]
    fn rejects_idless_urls() {
        let url = Url::parse("https://pixeldrain.com/u/").expect("url");
        assert_eq!(direct_url(&url), None);
    }
}
