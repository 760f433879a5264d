use std::path::PathBuf;

use app_config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::super::{Resolution, ResolveRequest, Resolver};
use crate::{
    error::ResolverError,
    helpers::{
        command,
        progress::{parse_percent_line, ProgressThrottle},
    },
    report::ProgressReporter,
};

const MAX_TITLE_LENGTH: usize = 120;

/// Last resolver in the chain: accepts any plain http(s) URL.
///
/// yt-dlp gets the first shot since it understands hundreds of media
/// hosts; when it rejects the URL the original link is handed to the
/// aria2 fetcher as-is. This internal two-step is the only fallback in
/// the pipeline; failures of host-specific resolvers are terminal.
#[derive(Debug, Default)]
pub struct FallthroughResolver;

#[async_trait::async_trait]
impl Resolver for FallthroughResolver {
    fn name(&self) -> &'static str {
        "fallthrough"
    }

    fn description(&self) -> &'static str {
        "Tries yt-dlp, then hands the URL straight to the downloader"
    }

    fn can_resolve(&self, request: &ResolveRequest) -> bool {
        matches!(request.url.scheme(), "http" | "https")
    }

    async fn resolve(
        &self,
        request: &ResolveRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolution, ResolverError> {
        reporter
            .update("⏳ *Trying the download with `yt-dlp`...*")
            .await;

        match self.download_with_yt_dlp(request, reporter).await {
            Ok(resolution) => Ok(resolution),
            Err(e) => {
                info!("yt-dlp could not handle the URL, falling back to a plain fetch: {e}");
                Ok(Resolution::from_url(request.url.as_str()))
            }
        }
    }
}

impl FallthroughResolver {
    async fn download_with_yt_dlp(
        &self,
        request: &ResolveRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolution, ResolverError> {
        let config = Config::global();
        let yt_dlp = config.dependency_paths.yt_dlp_path();

        let mut cmd = command::piped(yt_dlp);
        cmd.arg("--newline")
            .arg("--no-warnings")
            .arg("--progress")
            .args(["--progress-template", "%(progress._percent_str)s"])
            .arg("--no-mtime")
            .args(["--trim-filenames", &MAX_TITLE_LENGTH.to_string()])
            .arg("-P")
            .arg(&request.download_dir)
            .args(["--output", "%(title)s.%(ext)s"])
            .args(["--no-simulate", "--print", "after_move:filepath"]);

        if let Some(proxy) = &config.network.proxy {
            cmd.args(["--proxy", proxy]);
        }
        if let Some(cookies) = &config.network.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }

        cmd.arg(request.url.as_str());

        let mut child = command::spawn(&mut cmd, "yt-dlp")?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ResolverError::page("yt-dlp stdout was not captured"))?;
        let stderr_task = child.stderr.take().map(command::drain_to_string);

        let mut lines = BufReader::new(stdout).lines();
        let mut throttle = ProgressThrottle::default();
        let mut printed_path: Option<String> = None;

        while let Some(line) = lines.next_line().await? {
            match classify_output_line(&line) {
                Some(OutputLine::Progress(percent)) => {
                    if throttle.should_notify(percent) {
                        reporter
                            .update(&format!("⬇️ *Downloading...*\n\nProgress: `{percent}%`"))
                            .await;
                    }
                }
                Some(OutputLine::PrintedPath(path)) => printed_path = Some(path),
                None => {}
            }
        }

        let status = child.wait().await?;

        if !status.success() {
            let detail = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };

            return Err(ResolverError::CommandFailed {
                program: "yt-dlp",
                status: status.code().unwrap_or(-1),
                detail: detail.trim().chars().take(200).collect(),
            });
        }

        let path = printed_path
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .ok_or_else(|| ResolverError::page("yt-dlp finished but the file does not exist"))?;

        debug!(?path, "yt-dlp finished");

        Ok(Resolution::Completed { path })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum OutputLine {
    Progress(u8),
    PrintedPath(String),
}

/// yt-dlp's stdout carries two things under our flags: templated
/// progress lines and, last, the `--print after_move:filepath` path.
/// Anything non-progress is kept as the path candidate; the final one
/// wins.
fn classify_output_line(line: &str) -> Option<OutputLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match parse_percent_line(line) {
        Some(percent) => Some(OutputLine::Progress(percent)),
        None => Some(OutputLine::PrintedPath(line.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_progress_and_path_lines() {
        assert_eq!(
            classify_output_line("  4.5%"),
            Some(OutputLine::Progress(4))
        );
        assert_eq!(classify_output_line(""), None);
        assert_eq!(classify_output_line("   "), None);
        assert_eq!(
            classify_output_line("/downloads/Some Video.mp4"),
            Some(OutputLine::PrintedPath("/downloads/Some Video.mp4".to_string()))
        );
    }

    #[test]
    fn last_path_line_wins_over_progress_noise() {
        let transcript = [
            "  0.0%",
            "",
            " 45.2%",
            "/downloads/Some Video.f137.mp4",
            "100.0%",
            "/downloads/Some Video.mp4",
        ];

        let mut printed_path: Option<String> = None;
        for line in transcript {
            if let Some(OutputLine::PrintedPath(path)) = classify_output_line(line) {
                printed_path = Some(path);
            }
        }

        assert_eq!(printed_path.as_deref(), Some("/downloads/Some Video.mp4"));
    }
}
