use app_config::Config;
use app_helpers::{fs::move_file, temp_dir::TempDir};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::super::{Resolution, ResolveRequest, Resolver};
use crate::{
    error::ResolverError,
    helpers::{command, progress::ProgressThrottle},
    report::ProgressReporter,
};

/// `NN.N% of <name> (NN.N UNIT)` as printed by `megatools dl`.
static PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+\.\d+)%\s+of\s+.*\((\d+\.\d+)\s*(\w+B)\)").expect("invalid progress regex")
});

/// MEGA links are end-to-end encrypted, so there is no direct URL to
/// hand to a plain HTTP downloader. `megatools` does the whole
/// transfer into a scratch directory instead.
#[derive(Debug, Default)]
pub struct MegaResolver;

#[async_trait::async_trait]
impl Resolver for MegaResolver {
    fn name(&self) -> &'static str {
        "mega"
    }

    fn description(&self) -> &'static str {
        "Downloads mega.nz links through the megatools CLI"
    }

    fn can_resolve(&self, request: &ResolveRequest) -> bool {
        matches!(
            request.host(),
            "mega.nz" | "www.mega.nz" | "mega.co.nz" | "www.mega.co.nz"
        )
    }

    async fn resolve(
        &self,
        request: &ResolveRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolution, ResolverError> {
        let megatools = Config::global()
            .dependency_paths
            .megatools_path()
            .ok_or(ResolverError::MissingProgram("megatools"))?;

        let scratch = TempDir::in_tmp_with_prefix("relay-dl.mega.")?;

        reporter
            .update("⬇️ *Starting download...*\n`megatools` is fetching the file.")
            .await;

        let mut cmd = command::piped(megatools);
        cmd.arg("dl")
            .arg(request.url.as_str())
            .current_dir(scratch.path());

        let mut child = command::spawn(&mut cmd, "megatools")?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ResolverError::page("megatools stdout was not captured"))?;
        let stderr_task = child.stderr.take().map(command::drain_to_string);

        // megatools redraws its progress line with carriage returns,
        // so split on those rather than newlines.
        let mut segments = BufReader::new(stdout).split(b'\r');
        let mut throttle = ProgressThrottle::default();
        let mut total_size: Option<String> = None;

        while let Some(chunk) = segments.next_segment().await? {
            let text = String::from_utf8_lossy(&chunk);

            for line in text.lines() {
                let Some(captures) = PROGRESS.captures(line) else {
                    continue;
                };

                let percent = parse_percent(&captures[1]);

                if total_size.is_none() {
                    total_size = Some(format!("{} {}", &captures[2], &captures[3]));
                }

                if throttle.should_notify(percent) {
                    let size = total_size.as_deref().unwrap_or("?");
                    reporter
                        .update(&format!(
                            "⬇️ *Downloading from MEGA...*\nFile size: `{size}`\n\nProgress: \
                             `{percent}%`"
                        ))
                        .await;
                }
            }
        }

        let status = child.wait().await?;

        if !status.success() {
            let detail = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };

            return Err(ResolverError::CommandFailed {
                program: "megatools",
                status: status.code().unwrap_or(-1),
                detail: detail.trim().chars().take(200).collect(),
            });
        }

        let downloaded = command::single_file_in(scratch.path())?;
        debug!(?downloaded, "megatools finished");

        let file_name = downloaded
            .file_name()
            .ok_or_else(|| ResolverError::page("downloaded file has no name"))?;
        let target = request.download_dir.join(file_name);

        move_file(&downloaded, &target).await?;

        Ok(Resolution::Completed { path: target })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_percent(raw: &str) -> u8 {
    raw.parse::<f64>().unwrap_or_default().floor().min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_megatools_progress_lines() {
        let line = "archive.tar.gz: 23.4% of archive.tar.gz (47.3 MiB)";
        let captures = PROGRESS.captures(line).expect("no match");

        assert_eq!(&captures[1], "23.4");
        assert_eq!(&captures[2], "47.3");
        assert_eq!(&captures[3], "MiB");
    }

    #[test]
    fn ignores_chatter() {
        assert!(PROGRESS.captures("Logging in...").is_none());
        assert!(PROGRESS.captures("Downloaded archive.tar.gz").is_none());
    }
}
