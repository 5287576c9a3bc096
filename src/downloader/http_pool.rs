use std::time::Duration;
use reqwest::{Client, ClientBuilder, Proxy};
use crate::config::AppConfig;
use crate::errors::Result;

/// Shared HTTP client for the lookup and scraping providers.
///
/// Built once at startup; the request timeout and optional proxy come from config.
pub struct HttpPool {
    client: Client,
}

impl HttpPool {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut builder = Self::builder(config.http_timeout_secs, &config.scrape_user_agent);
        if let Some(proxy_url) = &config.proxy {
            log::info!("Setting up proxy: {}", proxy_url);
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }
        Ok(Self { client: builder.build()? })
    }

    fn builder(timeout_seconds: u64, user_agent: &str) -> ClientBuilder {
        ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_seconds))
            .connect_timeout(Duration::from_secs(15))
            .user_agent(user_agent)
            .gzip(true)
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        assert!(HttpPool::from_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn accepts_http_proxy() {
        let config = AppConfig {
            proxy: Some("http://127.0.0.1:1080".to_string()),
            ..AppConfig::default()
        };
        assert!(HttpPool::from_config(&config).is_ok());
    }
}
