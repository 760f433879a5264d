use std::time::Duration;

use app_config::Config;
pub use reqwest::{Client as RequestClient, ClientBuilder as RequestClientBuilder};

use crate::error::ResolverError;

/// Some hosts (MediaFire in particular) refuse non-browser user agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like \
                              Gecko) Chrome/120.0.0.0 Safari/537.36";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct Client;

impl Client {
    pub fn base() -> Result<RequestClient, ResolverError> {
        let mut builder = Self::builder();

        if let Some(proxy) = &Config::global().network.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }

        Ok(builder.build()?)
    }

    pub fn builder() -> RequestClientBuilder {
        RequestClient::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}
