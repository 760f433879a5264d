use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("no resolver can handle {0:?}")]
    NoResolver(String),

    #[error("`{0}' is not installed or not configured")]
    MissingProgram(&'static str),

    #[error("failed to run `{program}': {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}' exited with status {status}: {detail}")]
    CommandFailed {
        program: &'static str,
        status: i32,
        detail: String,
    },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Page(String),
}

impl ResolverError {
    pub(crate) fn browser<E: std::fmt::Display>(e: E) -> Self {
        Self::Browser(e.to_string())
    }

    pub(crate) fn page<T: Into<String>>(msg: T) -> Self {
        Self::Page(msg.into())
    }
}

/// Failures of the byte transfer itself, as opposed to resolution.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("nothing to download")]
    NoUrls,

    #[error("aria2c stdin was not captured")]
    StdinNotCaptured,

    #[error("`{program}' exited with status {status}: {detail}")]
    CommandFailed {
        program: &'static str,
        status: i32,
        detail: String,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("download finished but the file is incomplete ({size} bytes)")]
    Incomplete { size: u64 },

    #[error("download finished but produced no file")]
    MissingFile,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}
