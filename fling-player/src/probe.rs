//! Content-type probing for image sources
//!
//! Image sources are validated before the viewer is asked to display them.
//! Remote sources are probed with an HTTP `HEAD` (falling back to `GET` when the
//! server refuses `HEAD`); `file://` sources are classified by extension.

use crate::error::{Error, Result};
use fling_common::media::uri_extension;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Determines the content type of a URI
pub trait ContentProbe: Send + Sync {
    /// MIME type of the resource, `None` when the resource does not declare one
    ///
    /// May block; only called from the session's command worker.
    fn content_type(&self, uri: &str) -> Result<Option<String>>;
}

/// Probe backed by reqwest
///
/// The command worker is a plain thread, so requests are driven on a captured
/// tokio runtime handle with `block_on`.
pub struct HttpContentProbe {
    client: reqwest::Client,
    rt_handle: tokio::runtime::Handle,
}

impl HttpContentProbe {
    pub fn new(rt_handle: tokio::runtime::Handle) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| Error::Probe(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, rt_handle })
    }

    async fn fetch_content_type(&self, url: Url) -> Result<Option<String>> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| Error::Probe(format!("HEAD {} failed: {}", url, e)))?;

        let response = if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            debug!("HEAD refused for {}, retrying with GET", url);
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| Error::Probe(format!("GET {} failed: {}", url, e)))?
        } else {
            response
        };

        if !response.status().is_success() {
            return Err(Error::Probe(format!(
                "{} answered {}",
                url,
                response.status()
            )));
        }

        Ok(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string()))
    }
}

impl ContentProbe for HttpContentProbe {
    fn content_type(&self, uri: &str) -> Result<Option<String>> {
        let url = Url::parse(uri).map_err(|e| Error::Probe(format!("{}: {}", uri, e)))?;
        match url.scheme() {
            "http" | "https" => self.rt_handle.block_on(self.fetch_content_type(url)),
            "file" => Ok(guess_image_mime(uri).map(str::to_string)),
            other => Err(Error::Probe(format!("cannot probe scheme '{}'", other))),
        }
    }
}

/// Image MIME type implied by a URI's extension
pub fn guess_image_mime(uri: &str) -> Option<&'static str> {
    match uri_extension(uri)?.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_image_mime() {
        assert_eq!(guess_image_mime("file:///tmp/a.JPG"), Some("image/jpeg"));
        assert_eq!(guess_image_mime("file:///tmp/a.png?x=1"), Some("image/png"));
        assert_eq!(guess_image_mime("file:///tmp/a.mp4"), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_uri_uses_extension() {
        let probe = HttpContentProbe::new(tokio::runtime::Handle::current()).unwrap();
        let mime = tokio::task::spawn_blocking(move || probe.content_type("file:///tmp/pic.bmp"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mime.as_deref(), Some("image/bmp"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_scheme_is_error() {
        let probe = HttpContentProbe::new(tokio::runtime::Handle::current()).unwrap();
        let result = tokio::task::spawn_blocking(move || probe.content_type("ftp://host/pic.png"))
            .await
            .unwrap();
        assert!(matches!(result, Err(Error::Probe(_))));
    }
}
