use crate::error::Result;

/// Blocking HTTP GET, swappable so the engine can run against in-memory payloads.
pub trait HttpClient: Send + Sync {
    /// Fetch `url`, failing with [`EngineError::Network`](crate::EngineError::Network)
    /// on transport errors, timeouts, and non-success statuses.
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn get(&self, url: &str) -> Result<Vec<u8>> { (**self).get(url) }
}

#[cfg(feature = "download")]
pub use reqwest_client::ReqwestClient;

#[cfg(feature = "download")]
mod reqwest_client {
    use std::time::Duration;

    use reqwest::{blocking::Client, redirect::Policy};
    use tracing::debug;

    use super::HttpClient;
    use crate::error::{EngineError, Result};

    /// `reqwest` blocking client with a request timeout.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
            let client = Client::builder()
                .user_agent(user_agent)
                .redirect(Policy::limited(10))
                .timeout(timeout)
                .build()?;
            Ok(Self { client })
        }

        /// The underlying client, for collaborators that need query parameters.
        pub(crate) fn inner(&self) -> &Client { &self.client }
    }

    impl HttpClient for ReqwestClient {
        fn get(&self, url: &str) -> Result<Vec<u8>> {
            debug!(%url, "GET");
            let resp = self.client.get(url).send()
                .map_err(|e| EngineError::network(url, e))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(EngineError::network(url, format!("HTTP {status}")));
            }

            let body = resp.bytes()
                .map_err(|e| EngineError::network(url, format!("failed to read response body: {e}")))?;
            Ok(body.to_vec())
        }
    }

}
