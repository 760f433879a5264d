use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use app_helpers::{file_size, fs::move_file, temp_dir::TempDir};
use tracing::debug;

use super::super::{Resolution, ResolveRequest, Resolver};
use crate::{
    error::ResolverError,
    helpers::{
        browser::BrowserSession,
        command,
        progress::{transfer_percent, ProgressThrottle},
    },
    report::ProgressReporter,
};

/// GoFile renders the file list client-side, so these come from the
/// live page markup.
const FILE_LINK_SELECTOR: &str = "#filemanager_itemslist > div.border-b.border-gray-600 > div > \
                                  div.flex.items-center.overflow-auto > div.truncate > a";
const FILE_SIZE_SELECTOR: &str = "#filemanager_itemslist > div.border-b.border-gray-600 > div > \
                                  div.flex.items-center.justify-end > div > span";

const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// GoFile gates its files behind a token-stamped session, so the
/// download has to happen inside the same browser that loaded the
/// page. Chromium drops the file into a scratch directory and we watch
/// for it to finish.
#[derive(Debug, Default)]
pub struct GoFileResolver;

#[async_trait::async_trait]
impl Resolver for GoFileResolver {
    fn name(&self) -> &'static str {
        "gofile"
    }

    fn description(&self) -> &'static str {
        "Downloads gofile.io links through a headless browser"
    }

    fn can_resolve(&self, request: &ResolveRequest) -> bool {
        matches!(request.host(), "gofile.io" | "www.gofile.io")
            && request.url.path().starts_with("/d/")
    }

    async fn resolve(
        &self,
        request: &ResolveRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolution, ResolverError> {
        // Page wait and download poll share this one budget.
        let deadline = Instant::now() + request.timeout;

        let scratch = TempDir::in_tmp_with_prefix("relay-dl.gofile.")?;

        reporter.update("🌐 *Opening GoFile page...*").await;

        let session = BrowserSession::launch(Some(scratch.path())).await?;
        let result = download_via_page(&session, request, reporter, scratch.path(), deadline).await;

        if result.is_err() {
            session
                .save_screenshot(&request.download_dir.join("gofile-debug.png"))
                .await;
        }
        session.close().await;

        let downloaded = result?;

        let file_name = downloaded
            .file_name()
            .ok_or_else(|| ResolverError::page("downloaded file has no name"))?;
        let target = request.download_dir.join(file_name);

        move_file(&downloaded, &target).await?;

        Ok(Resolution::Completed { path: target })
    }
}

async fn download_via_page(
    session: &BrowserSession,
    request: &ResolveRequest,
    reporter: &dyn ProgressReporter,
    scratch: &Path,
    deadline: Instant,
) -> Result<PathBuf, ResolverError> {
    session.goto(request.url.as_str()).await?;

    let link = session
        .wait_for_element(FILE_LINK_SELECTOR, PAGE_TIMEOUT.min(remaining(deadline)))
        .await?;

    let file_name = link
        .inner_text()
        .await
        .map_err(ResolverError::browser)?
        .map(|name| name.trim().to_string());

    let expected_size = match session.page().find_element(FILE_SIZE_SELECTOR).await {
        Ok(span) => span
            .inner_text()
            .await
            .ok()
            .flatten()
            .and_then(|text| file_size::parse_size(text.trim())),
        Err(_) => None,
    };

    debug!(?file_name, ?expected_size, "GoFile item found");

    reporter
        .update(&format!(
            "⬇️ *Starting download...*\nFile: `{}`\nSize: `{}`",
            file_name.as_deref().unwrap_or("?"),
            expected_size.map_or_else(|| "?".to_string(), file_size::format_size),
        ))
        .await;

    link.click().await.map_err(ResolverError::browser)?;

    wait_for_download(scratch, expected_size, deadline, request.timeout, reporter).await
}

/// Watch the scratch directory until Chromium finishes the download,
/// reporting throttled progress from the on-disk byte count.
///
/// Completion is "file matches the advertised size", or, when the page
/// did not advertise one, "file stopped growing between polls".
async fn wait_for_download(
    dir: &Path,
    expected_size: Option<u64>,
    deadline: Instant,
    budget: Duration,
    reporter: &dyn ProgressReporter,
) -> Result<PathBuf, ResolverError> {
    let mut last_size = 0_u64;
    let mut throttle = ProgressThrottle::default();

    loop {
        if let Some(path) = finished_download(dir, expected_size, &mut last_size)? {
            return Ok(path);
        }

        let observed = downloaded_bytes(dir)?;
        if let Some(text) = progress_update(observed, expected_size, &mut throttle) {
            reporter.update(&text).await;
        }

        if remaining(deadline).is_zero() {
            return Err(ResolverError::Timeout(budget));
        }

        tokio::time::sleep(DOWNLOAD_POLL_INTERVAL).await;
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

fn finished_download(
    dir: &Path,
    expected_size: Option<u64>,
    last_size: &mut u64,
) -> Result<Option<PathBuf>, ResolverError> {
    let in_progress = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .any(|entry| is_partial_download(&entry.path()));

    if in_progress {
        return Ok(None);
    }

    let Ok(path) = command::single_file_in(dir) else {
        // Nothing on disk yet.
        return Ok(None);
    };

    let size = std::fs::metadata(&path)?.len();

    let done = match expected_size {
        Some(expected) => size >= expected,
        None => size > 0 && size == *last_size,
    };
    *last_size = size;

    Ok(done.then_some(path))
}

/// Bytes on disk so far, partial files included. Chromium streams into
/// a `.crdownload`, so that is the file whose size actually moves.
fn downloaded_bytes(dir: &Path) -> Result<u64, ResolverError> {
    Ok(std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.metadata().ok())
        .filter(std::fs::Metadata::is_file)
        .map(|meta| meta.len())
        .sum())
}

fn progress_update(
    observed: u64,
    expected_size: Option<u64>,
    throttle: &mut ProgressThrottle,
) -> Option<String> {
    let expected = expected_size?;
    let percent = transfer_percent(observed, expected);

    if throttle.should_notify(percent) {
        Some(format!(
            "⬇️ *Downloading...*\nSize: `{}`\n\nProgress: `{percent}%`",
            file_size::format_size(expected),
        ))
    } else {
        None
    }
}

fn is_partial_download(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("crdownload") || ext.eq_ignore_ascii_case("tmp"))
}

#[cfg(test)]
mod tests {
    use app_helpers::temp_dir::TempDir;

    use super::*;

    #[test]
    fn chromium_partials_are_recognized() {
        assert!(is_partial_download(Path::new("/tmp/x/video.mp4.crdownload")));
        assert!(is_partial_download(Path::new("/tmp/x/blob.TMP")));
        assert!(!is_partial_download(Path::new("/tmp/x/video.mp4")));
        assert!(!is_partial_download(Path::new("/tmp/x/archive")));
    }

    #[test]
    fn partial_files_count_toward_progress() {
        let dir = TempDir::in_tmp_with_prefix("relay-dl.test.").expect("temp dir");
        std::fs::write(dir.path().join("video.mp4.crdownload"), [0_u8; 500]).expect("write");

        assert_eq!(downloaded_bytes(dir.path()).expect("size"), 500);
    }

    #[test]
    fn polled_milestones_produce_two_updates() {
        let mut throttle = ProgressThrottle::new(10, Duration::ZERO);

        let updates = [500, 1000]
            .into_iter()
            .filter_map(|observed| progress_update(observed, Some(1000), &mut throttle))
            .collect::<Vec<_>>();

        assert_eq!(updates.len(), 2);
        assert!(updates[0].contains("`50%`"));
        assert!(updates[1].contains("`100%`"));
    }

    #[test]
    fn unknown_total_means_no_progress_messages() {
        let mut throttle = ProgressThrottle::default();
        assert_eq!(progress_update(500, None, &mut throttle), None);
    }

    #[test]
    fn expired_deadline_leaves_no_time() {
        assert!(remaining(Instant::now()).is_zero());
        assert!(remaining(Instant::now() + Duration::from_secs(5)) <= Duration::from_secs(5));
    }
}
