use std::{fmt::Debug, path::PathBuf, time::Duration};

use tracing::{debug, info};
use url::Url;

pub mod handlers;

pub use handlers::AVAILABLE_RESOLVERS;

use crate::{error::ResolverError, report::ProgressReporter};

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub url: Url,
    pub download_dir: PathBuf,
    pub timeout: Duration,
}

impl ResolveRequest {
    #[must_use]
    pub fn new(url: Url, download_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            url,
            download_dir,
            timeout,
        }
    }

    pub(crate) fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

/// What a resolver produced for a job.
#[derive(Debug)]
pub enum Resolution {
    /// One or more candidate direct URLs for the same file; the fetcher
    /// tries them in order.
    Resolved {
        urls: Vec<String>,
        file_name: Option<String>,
    },

    /// The resolver's tool performed the transfer itself.
    Completed { path: PathBuf },
}

impl Resolution {
    pub(crate) fn from_url<T: Into<String>>(url: T) -> Self {
        Self::Resolved {
            urls: vec![url.into()],
            file_name: None,
        }
    }
}

/// Turns a hosting-page URL into something downloadable.
#[async_trait::async_trait]
pub trait Resolver: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Whether this resolver wants the URL. Must be a pure function of
    /// the request so dispatch stays deterministic.
    fn can_resolve(&self, request: &ResolveRequest) -> bool;

    async fn resolve(
        &self,
        request: &ResolveRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolution, ResolverError>;
}

impl std::fmt::Display for dyn Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Resolver::{}", self.name())
    }
}

/// First matching resolver in priority order, if any.
#[must_use]
pub fn find_resolver(request: &ResolveRequest) -> Option<&'static dyn Resolver> {
    AVAILABLE_RESOLVERS
        .iter()
        .find(|resolver| resolver.can_resolve(request))
        .map(AsRef::as_ref)
}

pub async fn resolve(
    request: &ResolveRequest,
    reporter: &dyn ProgressReporter,
) -> Result<Resolution, ResolverError> {
    let resolver = find_resolver(request)
        .ok_or_else(|| ResolverError::NoResolver(request.url.to_string()))?;

    info!(resolver = resolver.name(), url = %request.url, "Selected resolver");

    let resolution = resolver.resolve(request, reporter).await?;

    debug!(?resolution, "Resolved");

    Ok(resolution)
}
