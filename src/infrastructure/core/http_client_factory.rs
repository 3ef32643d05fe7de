use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use url::Url;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates an HTTP client bounded by `timeout`.
    ///
    /// With `max_retries > 0`, transient failures are retried with
    /// exponential backoff. Rate lookups pass 0: they never retry.
    pub fn create_client(timeout: Duration, max_retries: u32) -> ClientWithMiddleware {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("tickwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        let builder = ClientBuilder::new(client);
        if max_retries == 0 {
            return builder.build();
        }

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        builder
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Join path `segments` onto `base_url` (each one percent-encoded) and append
/// query `params`. reqwest-middleware has no `.query()`, so the URL is built
/// up front.
pub fn build_url<K, V>(base_url: &str, segments: &[&str], params: &[(K, V)]) -> Result<Url>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;

    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| anyhow!("Base URL cannot carry a path: {}", base_url))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }

    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (k, v) in params {
            query.append_pair(k.as_ref(), v.as_ref());
        }
    }

    Ok(url)
}
