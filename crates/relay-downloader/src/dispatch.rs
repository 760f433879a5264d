//! One-shot pipeline: parse the URL, resolve it, download it, leave
//! the marker file behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use app_config::Config;
use app_resolvers::{
    fetchers::{self, FetchRequest},
    resolve, ProgressReporter, Resolution, ResolveRequest,
};
use tracing::{debug, info};
use url::Url;

use crate::notifier::StatusNotifier;

/// How much of an error message the Telegram notification gets.
const ERROR_DETAIL_CHARS: usize = 150;

pub async fn run(raw_url: &str) -> Result<PathBuf> {
    let config = Config::global();

    let url = Url::parse(raw_url).with_context(|| format!("`{raw_url}' is not a valid URL"))?;

    // A marker left over from an earlier run must not fool the upload
    // step into picking up a stale file.
    clear_stale_marker(&config.run.marker_file).await?;

    let notifier = StatusNotifier::from_config();
    notifier
        .update(&format!("🔍 *Analyzing URL...*\n`{url}`"))
        .await;

    let request = ResolveRequest::new(url, config.run.download_dir.clone(), config.run.timeout());

    match download(&request, &notifier).await {
        Ok(path) => {
            write_marker(&config.run.marker_file, &path).await?;

            notifier
                .update(&format!(
                    "✅ *Done!*\nSaved as `{}`",
                    path.file_name()
                        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy()),
                ))
                .await;

            Ok(path)
        }
        Err(e) => {
            notifier
                .update(&format!(
                    "❌ *Download failed*\n`{}`",
                    truncated(&e.to_string(), ERROR_DETAIL_CHARS),
                ))
                .await;

            Err(e)
        }
    }
}

async fn download(request: &ResolveRequest, reporter: &dyn ProgressReporter) -> Result<PathBuf> {
    match resolve(request, reporter).await? {
        Resolution::Completed { path } => {
            debug!(?path, "Resolver performed the transfer itself");
            Ok(path)
        }
        Resolution::Resolved { urls, file_name } => {
            debug!(?urls, ?file_name, "Resolved to direct URLs");

            let fetched = fetchers::fetch(
                &FetchRequest {
                    urls,
                    file_name,
                    download_dir: request.download_dir.clone(),
                    timeout: request.timeout,
                },
                reporter,
            )
            .await?;

            Ok(fetched)
        }
    }
}

async fn clear_stale_marker(marker: &Path) -> Result<()> {
    match tokio::fs::remove_file(marker).await {
        Ok(()) => {
            debug!(?marker, "Removed stale marker file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove stale marker {marker:?}")),
    }
}

/// Record the downloaded file's name for the upload step that runs
/// after us.
async fn write_marker(marker: &Path, downloaded: &Path) -> Result<()> {
    let name = downloaded
        .file_name()
        .and_then(|name| name.to_str())
        .context("downloaded file has no representable name")?;

    tokio::fs::write(marker, format!("{name}\n"))
        .await
        .with_context(|| format!("failed to write marker {marker:?}"))?;

    info!(?marker, name, "Wrote marker file");

    Ok(())
}

fn truncated(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut out = text.chars().take(max_chars).collect::<String>();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use app_helpers::temp_dir::TempDir;

    use super::*;

    #[tokio::test]
    async fn marker_holds_only_the_file_name() {
        let dir = TempDir::in_tmp_with_prefix("relay-dl.test.").expect("temp dir");
        let marker = dir.path().join("downloaded_filename.txt");

        write_marker(&marker, Path::new("/downloads/archive.tar.gz"))
            .await
            .expect("write marker");

        let contents = tokio::fs::read_to_string(&marker).await.expect("read marker");
        assert_eq!(contents, "archive.tar.gz\n");
    }

    #[tokio::test]
    async fn stale_markers_are_removed() {
        let dir = TempDir::in_tmp_with_prefix("relay-dl.test.").expect("temp dir");
        let marker = dir.path().join("downloaded_filename.txt");

        tokio::fs::write(&marker, "old-name.zip\n").await.expect("seed marker");
        clear_stale_marker(&marker).await.expect("clear marker");

        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn clearing_a_missing_marker_is_fine() {
        let dir = TempDir::in_tmp_with_prefix("relay-dl.test.").expect("temp dir");

        clear_stale_marker(&dir.path().join("downloaded_filename.txt"))
            .await
            .expect("clear marker");
    }

    #[test]
    fn long_errors_are_cut_for_the_notification() {
        let long = "x".repeat(400);

        assert_eq!(truncated("short", 150), "short");
        assert_eq!(truncated(&long, 150).chars().count(), 151);
    }
}
