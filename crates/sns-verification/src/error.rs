use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a message fails verification.
#[derive(Debug, Error)]
pub enum Error {
    /// The signature is not valid base64.
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    /// The signing certificate is outside its validity period.
    #[error("signing certificate is not currently valid")]
    CertificateExpired,

    /// The signing certificate could not be fetched.
    #[error("failed to fetch signing certificate: {0}")]
    CertificateFetch(String),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The message is not valid JSON or lacks required fields.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A field required for this message type is missing.
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// The certificate is not PEM.
    #[error(transparent)]
    Pem(#[from] ::pem::PemError),

    /// The signature does not match.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// The certificate URL does not point at the provider.
    #[error("untrusted signing certificate url: {0}")]
    UntrustedCertificateUrl(String),

    /// The message type carries no signature we know how to check.
    #[error("unsupported message type: {0}")]
    UnsupportedMessageType(String),

    /// The signature version is unknown.
    #[error("unsupported signature version: {0}")]
    UnsupportedSignatureVersion(String),

    /// The certificate is malformed.
    #[error(transparent)]
    X509(#[from] x509_parser::nom::Err<x509_parser::error::X509Error>),
}
