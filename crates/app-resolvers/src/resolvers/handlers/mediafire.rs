use std::time::Duration;

use app_helpers::file_name;
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventResponseReceived};
use futures::StreamExt;
use tracing::debug;

use super::super::{Resolution, ResolveRequest, Resolver};
use crate::{error::ResolverError, helpers::browser::BrowserSession, report::ProgressReporter};

const DOWNLOAD_BUTTON_SELECTOR: &str = "a[id*='downloadButton']";
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Extensions we accept as "this network request is the actual file".
/// MediaFire pages fire plenty of tracking and asset requests after the
/// button click, so the filter has to be an allow-list.
const FILE_EXTENSIONS: &[&str] = &[
    "7z", "apk", "avi", "bin", "bz2", "dmg", "epub", "exe", "flac", "gz", "img", "iso", "jar",
    "mkv", "mov", "mp3", "mp4", "pdf", "rar", "tar", "wav", "xz", "zip",
];

/// MediaFire serves the direct link in the download button's `href`,
/// except when it scrambles it behind JavaScript. In that case the
/// button gets clicked and the direct URL is picked out of the page's
/// network traffic instead.
#[derive(Debug, Default)]
pub struct MediaFireResolver;

#[async_trait::async_trait]
impl Resolver for MediaFireResolver {
    fn name(&self) -> &'static str {
        "mediafire"
    }

    fn description(&self) -> &'static str {
        "Scrapes mediafire.com file pages for their direct download URL"
    }

    fn can_resolve(&self, request: &ResolveRequest) -> bool {
        matches!(request.host(), "mediafire.com" | "www.mediafire.com")
            && (request.url.path().starts_with("/file") || request.url.path().starts_with("/download"))
    }

    async fn resolve(
        &self,
        request: &ResolveRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolution, ResolverError> {
        reporter.update("🌐 *Opening MediaFire page...*").await;

        let session = BrowserSession::launch(None).await?;
        let result = scrape_direct_url(&session, request).await;

        if result.is_err() {
            session
                .save_screenshot(&request.download_dir.join("mediafire-debug.png"))
                .await;
        }
        session.close().await;

        let direct_url = result?;
        let file_name = file_name::from_url_str(&direct_url);

        Ok(Resolution::Resolved {
            urls: vec![direct_url],
            file_name,
        })
    }
}

async fn scrape_direct_url(
    session: &BrowserSession,
    request: &ResolveRequest,
) -> Result<String, ResolverError> {
    session.goto(request.url.as_str()).await?;

    let button = session
        .wait_for_element(DOWNLOAD_BUTTON_SELECTOR, PAGE_TIMEOUT)
        .await?;

    let href = button
        .attribute("href")
        .await
        .map_err(ResolverError::browser)?;

    if let Some(href) = href.filter(|href| href.starts_with("http")) {
        debug!(href, "Download button carries a plain href");
        return Ok(href);
    }

    // Scrambled href. Click the button and fish the real URL out of
    // the requests the page makes.
    debug!("Download button href is scrambled, watching network traffic");

    session
        .page()
        .execute(EnableParams::default())
        .await
        .map_err(ResolverError::browser)?;

    let mut responses = session
        .page()
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(ResolverError::browser)?;

    button.click().await.map_err(ResolverError::browser)?;

    let direct_url = tokio::time::timeout(PAGE_TIMEOUT, async {
        while let Some(event) = responses.next().await {
            let url = event.response.url.clone();

            if url_has_file_extension(&url) {
                return Some(url);
            }
        }

        None
    })
    .await
    .ok()
    .flatten();

    direct_url.ok_or_else(|| {
        ResolverError::page("no file request observed after clicking the download button")
    })
}

fn url_has_file_extension(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };

    let Some(last_segment) = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
    else {
        return false;
    };

    let Some((_, extension)) = last_segment.rsplit_once('.') else {
        return false;
    };

    FILE_EXTENSIONS
        .iter()
        .any(|known| extension.eq_ignore_ascii_case(known))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_urls_are_recognized() {
        assert!(url_has_file_extension(
            "https://download2319.mediafire.com/abcdef/archive.zip"
        ));
        assert!(url_has_file_extension(
            "https://download.mediafire.com/x/Movie.MKV?dl=1"
        ));
    }

    #[test]
    fn page_assets_are_not() {
        assert!(!url_has_file_extension("https://www.mediafire.com/file/abc/thing"));
        assert!(!url_has_file_extension("https://static.mediafire.com/app.js.map"));
        assert!(!url_has_file_extension("https://www.mediafire.com/"));
        assert!(!url_has_file_extension("not a url"));
    }
}
