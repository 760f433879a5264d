//! The actual HTTP transfer, delegated to `aria2c`.
//!
//! Resolvers hand over a list of candidate URLs; aria2 gets all of
//! them on one input line and fails over between mirrors on its own.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use app_config::Config;
use app_helpers::{file_name, file_size, id};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::FetchRequest;
use crate::{
    common::Client,
    error::FetchError,
    helpers::{
        command, content_disposition,
        progress::{transfer_percent, ProgressThrottle},
    },
    report::ProgressReporter,
};

const PROGRESS_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Download the requested URLs into `download_dir` and return the
/// final file path.
pub async fn fetch(
    request: &FetchRequest,
    reporter: &dyn ProgressReporter,
) -> Result<PathBuf, FetchError> {
    let first_url = request.urls.first().ok_or(FetchError::NoUrls)?;

    let probe = probe(first_url).await;
    let output_name = choose_file_name(
        request.file_name.clone(),
        probe.file_name,
        first_url,
    );
    let target = request.download_dir.join(&output_name);

    info!(url = first_url, ?target, "Starting download");
    reporter
        .update(&format!(
            "⬇️ *Starting download...*\nFile: `{output_name}`\nSize: `{}`",
            probe
                .total_size
                .map_or_else(|| "?".to_string(), file_size::format_size),
        ))
        .await;

    run_aria2(request, &output_name, &target, probe.total_size, reporter).await?;

    Ok(target)
}

struct Probe {
    total_size: Option<u64>,
    file_name: Option<String>,
}

/// Ask the server about the file before handing it to aria2. HEAD
/// first; some hosts omit Content-Length there, in which case a GET is
/// made and dropped after the headers arrive.
async fn probe(url: &str) -> Probe {
    let empty = Probe {
        total_size: None,
        file_name: None,
    };

    let Ok(client) = Client::base() else {
        return empty;
    };

    match client.head(url).send().await {
        Ok(response) if response.content_length().is_some() => Probe {
            total_size: response.content_length(),
            file_name: probed_file_name(&response),
        },
        Ok(_) => {
            debug!("HEAD carried no Content-Length, probing with GET");

            match client.get(url).send().await {
                Ok(response) => Probe {
                    total_size: response.content_length(),
                    file_name: probed_file_name(&response),
                },
                Err(e) => {
                    debug!("Probe request failed: {e}");
                    empty
                }
            }
        }
        Err(e) => {
            debug!("Probe request failed: {e}");
            empty
        }
    }
}

fn probed_file_name(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(content_disposition::parse_filename)
}

fn choose_file_name(requested: Option<String>, probed: Option<String>, url: &str) -> String {
    requested
        .or(probed)
        .or_else(|| file_name::from_url_str(url))
        .unwrap_or_else(|| format!("download-{}", id::time_id()))
}

async fn run_aria2(
    request: &FetchRequest,
    output_name: &str,
    target: &Path,
    total_size: Option<u64>,
    reporter: &dyn ProgressReporter,
) -> Result<(), FetchError> {
    let config = Config::global();

    let mut cmd = command::piped(config.dependency_paths.aria2c_path());
    cmd.args([
        "--allow-overwrite=true",
        "--auto-file-renaming=false",
        "--file-allocation=none",
        "--console-log-level=warn",
        "--summary-interval=0",
        "-x16",
        "-s16",
        "-c",
        "--input-file=-",
    ])
    .arg("-d")
    .arg(&request.download_dir)
    .arg("-o")
    .arg(output_name)
    .stdin(Stdio::piped());

    if let Some(proxy) = &config.network.proxy {
        cmd.arg(format!("--all-proxy={proxy}"));
    }
    if let Some(cookies) = &config.network.cookies_file {
        cmd.arg("--load-cookies").arg(cookies);
    }

    let mut child = command::spawn(&mut cmd, "aria2c")?;

    {
        // One input line, tab-separated: aria2 treats the URLs as
        // mirrors of the same file.
        let mut stdin = child.stdin.take().ok_or(FetchError::StdinNotCaptured)?;
        stdin
            .write_all(format!("{}\n", request.urls.join("\t")).as_bytes())
            .await?;
        stdin.shutdown().await?;
    }

    let stdout_task = child.stdout.take().map(command::drain_to_string);
    let stderr_task = child.stderr.take().map(command::drain_to_string);

    let mut poll = tokio::time::interval(PROGRESS_POLL_INTERVAL);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let started = Instant::now();
    let mut throttle = ProgressThrottle::default();

    let status = loop {
        tokio::select! {
            status = child.wait() => break status?,

            _ = poll.tick() => {
                if started.elapsed() >= request.timeout {
                    warn!(?target, "Download timed out, killing aria2c");
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    remove_partials(target).await;

                    return Err(FetchError::Timeout(request.timeout));
                }

                if let Some(total) = total_size {
                    let current = tokio::fs::metadata(target)
                        .await
                        .map_or(0, |meta| meta.len());
                    let percent = transfer_percent(current, total);

                    if throttle.should_notify(percent) {
                        reporter
                            .update(&format!(
                                "⬇️ *Downloading...*\nFile: `{output_name}`\nSize: `{}`\n\n\
                                 Progress: `{percent}%`",
                                file_size::format_size(total),
                            ))
                            .await;
                    }
                }
            }
        }
    };

    if !status.success() {
        let mut detail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        if detail.trim().is_empty() {
            if let Some(task) = stdout_task {
                detail = task.await.unwrap_or_default();
            }
        }

        remove_partials(target).await;

        return Err(FetchError::CommandFailed {
            program: "aria2c",
            status: status.code().unwrap_or(-1),
            detail: detail.trim().chars().take(200).collect(),
        });
    }

    let size = tokio::fs::metadata(target).await.map(|meta| meta.len());

    match (size, total_size) {
        (Ok(size), Some(total)) if size >= total => Ok(()),
        (Ok(size), None) if size > 0 => Ok(()),
        (Ok(size), _) => {
            remove_partials(target).await;
            Err(FetchError::Incomplete { size })
        }
        (Err(_), _) => Err(FetchError::MissingFile),
    }
}

/// Drop the half-finished file and aria2's control file so a rerun
/// starts clean.
async fn remove_partials(target: &Path) {
    let _ = tokio::fs::remove_file(target).await;
    let _ = tokio::fs::remove_file(target.with_extension(format!(
        "{}aria2",
        target
            .extension()
            .map(|ext| format!("{}.", ext.to_string_lossy()))
            .unwrap_or_default(),
    )))
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_name_wins() {
        assert_eq!(
            choose_file_name(
                Some("wanted.zip".to_string()),
                Some("probed.zip".to_string()),
                "https://example.com/url.zip",
            ),
            "wanted.zip"
        );
    }

    #[test]
    fn probed_name_beats_the_url() {
        assert_eq!(
            choose_file_name(
                None,
                Some("probed.zip".to_string()),
                "https://example.com/url.zip",
            ),
            "probed.zip"
        );
    }

    #[test]
    fn url_segment_is_the_fallback() {
        assert_eq!(
            choose_file_name(None, None, "https://example.com/files/archive.tar.gz?x=1"),
            "archive.tar.gz"
        );
    }

    #[test]
    fn nameless_urls_still_get_a_name() {
        let name = choose_file_name(None, None, "https://example.com/");
        assert!(name.starts_with("download-"));
    }

    #[tokio::test]
    async fn empty_url_list_is_a_fetch_error() {
        let request = FetchRequest {
            urls: Vec::new(),
            file_name: None,
            download_dir: PathBuf::from("."),
            timeout: Duration::from_secs(1),
        };

        let result = fetch(&request, &crate::report::NoopReporter).await;

        assert!(matches!(result, Err(FetchError::NoUrls)));
    }
}
