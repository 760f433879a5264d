use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt, BufReader},
    process::{Child, Command},
};
use tracing::debug;

use crate::error::ResolverError;

/// Build a command with both output pipes attached and the child tied
/// to our lifetime.
pub fn piped(program: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd
}

pub fn spawn(cmd: &mut Command, program: &'static str) -> Result<Child, ResolverError> {
    debug!(?cmd, "Running command");

    cmd.spawn()
        .map_err(|source| ResolverError::Spawn { program, source })
}

/// Drain a pipe to a string in the background so the child never
/// blocks on a full buffer.
pub fn drain_to_string<R>(reader: R) -> tokio::task::JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = String::new();
        let _ = BufReader::new(reader).read_to_string(&mut buf).await;
        buf
    })
}

/// The file a scratch-directory downloader produced.
///
/// The CLI tools we shell out to pick their own output name, so the
/// only reliable way to find it is "the one file left in the directory".
pub fn single_file_in(dir: &Path) -> Result<PathBuf, ResolverError> {
    let files = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();

    match files.as_slice() {
        [file] => Ok(file.clone()),
        [] => Err(ResolverError::page(
            "downloader exited without producing a file",
        )),
        many => Err(ResolverError::page(format!(
            "expected exactly one downloaded file, found {}",
            many.len()
        ))),
    }
}

/// Keeps the last few lines of tool output around for error messages.
#[derive(Debug)]
pub struct TailBuf {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for TailBuf {
    fn default() -> Self {
        Self::new(8)
    }
}

impl TailBuf {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    #[must_use]
    pub fn into_detail(self) -> String {
        self.lines.into_iter().collect::<Vec<_>>().join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_buf_keeps_only_the_tail() {
        let mut tail = TailBuf::new(2);
        tail.push("one");
        tail.push("  ");
        tail.push("two");
        tail.push("three");

        assert_eq!(tail.into_detail(), "two | three");
    }
}
