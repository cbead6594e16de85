use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};

static SNS_CERT_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^sns\.[a-z0-9-]+\.amazonaws\.com(\.cn)?$").unwrap()
});

/// Source of signing certificates, keyed by the `SigningCertURL` of a message.
#[async_trait]
pub trait CertificateSource: Clone + Send + Sync + 'static {
    /// Returns the PEM encoded certificate published at `url`.
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Fetches certificates over HTTPS.
#[derive(Clone, Debug)]
pub struct HttpCertificateSource {
    client: Client,
}

impl HttpCertificateSource {
    /// Creates a source whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl CertificateSource for HttpCertificateSource {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::CertificateFetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::CertificateFetch(e.to_string()))?;

        response
            .text()
            .await
            .map_err(|e| Error::CertificateFetch(e.to_string()))
    }
}

/// Serves certificates from a fixed map. Useful for tests and offline setups.
#[derive(Clone, Debug, Default)]
pub struct StaticCertificateSource {
    certificates: Arc<HashMap<String, String>>,
}

impl StaticCertificateSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a PEM certificate served at `url`.
    #[must_use]
    pub fn with_certificate(mut self, url: impl Into<String>, pem: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.certificates).insert(url.into(), pem.into());
        self
    }
}

#[async_trait]
impl CertificateSource for StaticCertificateSource {
    async fn fetch(&self, url: &Url) -> Result<String> {
        self.certificates
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::CertificateFetch(format!("no certificate for {url}")))
    }
}

/// Parses `raw` and checks it points at a certificate published by the
/// provider (or one of `extra_hosts`).
pub fn trusted_certificate_url(raw: &str, extra_hosts: &HashSet<String>) -> Result<Url> {
    let url = Url::parse(raw).map_err(|_| Error::UntrustedCertificateUrl(raw.to_string()))?;

    let host = url.host_str().unwrap_or_default();
    let trusted_host = SNS_CERT_HOST.is_match(host) || extra_hosts.contains(host);

    if url.scheme() != "https" || !trusted_host || !url.path().ends_with(".pem") {
        return Err(Error::UntrustedCertificateUrl(raw.to_string()));
    }

    Ok(url)
}
