use std::{path::PathBuf, time::Duration};

pub mod aria2;

pub use aria2::fetch;

/// Everything the downloader needs to turn resolved URLs into a file
/// on disk.
#[derive(Debug)]
pub struct FetchRequest {
    /// Candidate URLs for the same file, tried in order.
    pub urls: Vec<String>,
    /// Preferred output name. When absent the name is probed from the
    /// server or derived from the URL.
    pub file_name: Option<String>,
    pub download_dir: PathBuf,
    pub timeout: Duration,
}
