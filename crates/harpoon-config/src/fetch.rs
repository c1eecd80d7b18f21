//! Remote document retrieval over HTTP

use std::io::Read;
use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Source of remote configuration documents.
pub trait Fetch {
    /// Fetch the full body behind `url`.
    fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP fetcher built on `ureq`.
///
/// Redirects are followed here rather than by `ureq` so that every hop
/// sends the `Location` path exactly as encoded. Segments like `%2F` would
/// otherwise risk being decoded into a separator on the way.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_redirects: u32,
}

impl HttpFetcher {
    pub fn new(max_redirects: u32) -> Self {
        Self::with_timeout(max_redirects, Duration::from_secs(30))
    }

    pub fn with_timeout(max_redirects: u32, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .redirects(0)
            .timeout(timeout)
            .build();
        Self {
            agent,
            max_redirects,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let mut current = url.clone();
        let mut hops = 0;

        loop {
            let response = match self.agent.request_url("GET", &current).call() {
                Ok(response) => response,
                Err(ureq::Error::Status(code, _)) => {
                    return Err(Error::transport(&current, format!("HTTP {code}")));
                }
                Err(e) => return Err(Error::transport(&current, e.to_string())),
            };

            if !(300..400).contains(&response.status()) {
                let mut body = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut body)
                    .map_err(|e| Error::transport(&current, format!("reading body: {e}")))?;
                tracing::debug!(url = %current, bytes = body.len(), "Fetched remote document");
                return Ok(body);
            }

            if hops >= self.max_redirects {
                return Err(Error::transport(
                    url,
                    format!("stopped after {} redirects", self.max_redirects),
                ));
            }
            hops += 1;

            let location = response.header("location").ok_or_else(|| {
                Error::transport(
                    &current,
                    format!("HTTP {} redirect without Location", response.status()),
                )
            })?;
            let next = current.join(location).map_err(|e| {
                Error::transport(&current, format!("invalid redirect target {location}: {e}"))
            })?;

            tracing::debug!(from = %current, to = %next, "Following redirect");
            current = next;
        }
    }
}
