use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery protocol for a subscription.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Delivery via HTTP POST.
    Http,

    /// Delivery via HTTPS POST.
    Https,

    /// Delivery via SMTP.
    Email,

    /// Delivery via SMTP, JSON encoded.
    EmailJson,

    /// Delivery via SMS.
    Sms,

    /// Delivery to a queue.
    Sqs,

    /// Delivery to a mobile application endpoint.
    Application,

    /// Delivery to a function.
    Lambda,

    /// Delivery to a delivery stream.
    Firehose,
}

impl Protocol {
    /// Wire representation understood by the provider.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Email => "email",
            Self::EmailJson => "email-json",
            Self::Sms => "sms",
            Self::Sqs => "sqs",
            Self::Application => "application",
            Self::Lambda => "lambda",
            Self::Firehose => "firehose",
        }
    }

    /// Whether subscriptions over this protocol need an out-of-band
    /// confirmation before they become active.
    #[must_use]
    pub const fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            Self::Http | Self::Https | Self::Email | Self::EmailJson
        )
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known protocol.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown subscription protocol: {0}")]
pub struct ParseProtocolError(String);

impl FromStr for Protocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "email" => Ok(Self::Email),
            "email-json" => Ok(Self::EmailJson),
            "sms" => Ok(Self::Sms),
            "sqs" => Ok(Self::Sqs),
            "application" => Ok(Self::Application),
            "lambda" => Ok(Self::Lambda),
            "firehose" => Ok(Self::Firehose),
            other => Err(ParseProtocolError(other.to_string())),
        }
    }
}
