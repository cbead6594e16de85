//! Verifies that inbound pub/sub messages were signed by the provider.
//! Signing certificates are fetched from the URL named in each message,
//! after checking that URL belongs to the provider.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod certificate;
mod error;
mod message;

pub use certificate::{
    CertificateSource, HttpCertificateSource, StaticCertificateSource, trusted_certificate_url,
};
pub use error::{Error, Result};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use aws_lc_rs::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use message::SignedMessage;
use parking_lot::RwLock;
use tracing::{debug, warn};
use x509_parser::prelude::*;

/// Decides whether an inbound message can be trusted.
#[async_trait]
pub trait Verifier: Clone + Send + Sync + 'static {
    /// Returns `true` only for authentically signed messages. Never fails.
    async fn verify(&self, raw_message: &[u8]) -> bool;
}

/// Verifies SNS message signatures.
#[derive(Clone, Debug)]
pub struct SnsVerifier<C>
where
    C: CertificateSource,
{
    /// DER encoded certificates by URL.
    cache: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    extra_hosts: Arc<HashSet<String>>,
    source: C,
}

impl<C> SnsVerifier<C>
where
    C: CertificateSource,
{
    /// Creates a verifier fetching certificates from `source`.
    pub fn new(source: C) -> Self {
        Self::with_extra_hosts(source, HashSet::new())
    }

    /// Creates a verifier that also trusts certificates hosted on
    /// `extra_hosts` (still over HTTPS).
    pub fn with_extra_hosts(source: C, extra_hosts: HashSet<String>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            extra_hosts: Arc::new(extra_hosts),
            source,
        }
    }

    /// Checks a message and explains why it was rejected.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The message is not JSON or lacks signature fields
    /// - The message type or signature version is unsupported
    /// - The certificate URL is not trusted, cannot be fetched or parsed
    /// - The certificate is outside its validity period
    /// - The signature does not match
    pub async fn check(&self, raw_message: &[u8]) -> Result<()> {
        let message: SignedMessage = serde_json::from_slice(raw_message)?;

        let algorithm: &'static dyn VerificationAlgorithm =
            match message.signature_version.as_str() {
                "1" => &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
                "2" => &signature::RSA_PKCS1_2048_8192_SHA256,
                other => return Err(Error::UnsupportedSignatureVersion(other.to_string())),
            };

        let string_to_sign = message.string_to_sign()?;
        let decoded_signature = STANDARD.decode(message.signature.replace('\n', ""))?;
        let der = self.certificate_der(&message.signing_cert_url).await?;

        let (_rem, x509) = X509Certificate::from_der(&der)?;
        if !x509.validity().is_valid() {
            return Err(Error::CertificateExpired);
        }

        let public_key =
            UnparsedPublicKey::new(algorithm, &x509.subject_pki.subject_public_key.data);

        public_key
            .verify(string_to_sign.as_bytes(), &decoded_signature)
            .map_err(|_| Error::SignatureMismatch)
    }

    async fn certificate_der(&self, raw_url: &str) -> Result<Vec<u8>> {
        let url = trusted_certificate_url(raw_url, &self.extra_hosts)?;

        if let Some(der) = self.cache.read().get(url.as_str()) {
            return Ok(der.clone());
        }

        let raw_pem = self.source.fetch(&url).await?;
        let der = ::pem::parse(raw_pem)?.into_contents();

        // Make sure it parses before caching it.
        X509Certificate::from_der(&der)?;

        self.cache.write().insert(url.to_string(), der.clone());
        debug!(%url, "cached signing certificate");

        Ok(der)
    }
}

#[async_trait]
impl<C> Verifier for SnsVerifier<C>
where
    C: CertificateSource,
{
    async fn verify(&self, raw_message: &[u8]) -> bool {
        match self.check(raw_message).await {
            Ok(()) => true,
            Err(e) => {
                debug!("message failed verification: {e}");
                false
            }
        }
    }
}

/// Accepts every message. Only for local development against emulators that
/// do not sign their deliveries.
#[derive(Clone, Debug)]
pub struct InsecureVerifier;

impl InsecureVerifier {
    /// Creates the verifier, logging loudly.
    #[must_use]
    pub fn new() -> Self {
        warn!("message signature verification is disabled");
        Self
    }
}

impl Default for InsecureVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Verifier for InsecureVerifier {
    async fn verify(&self, _raw_message: &[u8]) -> bool {
        true
    }
}
