use serde::Deserialize;

use crate::error::{Error, Result};

/// The signed envelope SNS wraps around every HTTP/S delivery.
#[derive(Debug, Deserialize)]
pub struct SignedMessage {
    #[serde(rename = "Type")]
    pub r#type: String,

    #[serde(rename = "MessageId")]
    pub message_id: String,

    #[serde(rename = "TopicArn")]
    pub topic_arn: String,

    #[serde(rename = "Message")]
    pub message: String,

    #[serde(rename = "Timestamp")]
    pub timestamp: String,

    #[serde(rename = "Subject", default)]
    pub subject: Option<String>,

    #[serde(rename = "Token", default)]
    pub token: Option<String>,

    #[serde(rename = "SubscribeURL", default)]
    pub subscribe_url: Option<String>,

    #[serde(rename = "SignatureVersion")]
    pub signature_version: String,

    #[serde(rename = "Signature")]
    pub signature: String,

    #[serde(rename = "SigningCertURL")]
    pub signing_cert_url: String,
}

impl SignedMessage {
    /// Builds the newline-delimited key/value string the provider signed.
    pub fn string_to_sign(&self) -> Result<String> {
        let fields: Vec<(&str, Option<&str>)> = match self.r#type.as_str() {
            "Notification" => vec![
                ("Message", Some(self.message.as_str())),
                ("MessageId", Some(self.message_id.as_str())),
                ("Subject", self.subject.as_deref()),
                ("Timestamp", Some(self.timestamp.as_str())),
                ("TopicArn", Some(self.topic_arn.as_str())),
                ("Type", Some(self.r#type.as_str())),
            ],
            "SubscriptionConfirmation" | "UnsubscribeConfirmation" => vec![
                ("Message", Some(self.message.as_str())),
                ("MessageId", Some(self.message_id.as_str())),
                (
                    "SubscribeURL",
                    Some(
                        self.subscribe_url
                            .as_deref()
                            .ok_or(Error::MissingField("SubscribeURL"))?,
                    ),
                ),
                ("Timestamp", Some(self.timestamp.as_str())),
                (
                    "Token",
                    Some(self.token.as_deref().ok_or(Error::MissingField("Token"))?),
                ),
                ("TopicArn", Some(self.topic_arn.as_str())),
                ("Type", Some(self.r#type.as_str())),
            ],
            other => return Err(Error::UnsupportedMessageType(other.to_string())),
        };

        let mut canonical = String::new();
        for (key, value) in fields {
            // Absent optional fields are left out entirely.
            if let Some(value) = value {
                canonical.push_str(key);
                canonical.push('\n');
                canonical.push_str(value);
                canonical.push('\n');
            }
        }

        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(subject: Option<&str>) -> SignedMessage {
        SignedMessage {
            r#type: "Notification".to_string(),
            message_id: "m-1".to_string(),
            topic_arn: "arn:aws:sns:us-east-1:111:orders".to_string(),
            message: "hello".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            subject: subject.map(ToString::to_string),
            token: None,
            subscribe_url: None,
            signature_version: "1".to_string(),
            signature: String::new(),
            signing_cert_url: String::new(),
        }
    }

    #[test]
    fn test_notification_with_subject() {
        assert_eq!(
            notification(Some("greeting")).string_to_sign().unwrap(),
            "Message\nhello\nMessageId\nm-1\nSubject\ngreeting\nTimestamp\n2024-01-01T00:00:00.000Z\nTopicArn\narn:aws:sns:us-east-1:111:orders\nType\nNotification\n"
        );
    }

    #[test]
    fn test_notification_without_subject() {
        assert!(
            !notification(None)
                .string_to_sign()
                .unwrap()
                .contains("Subject")
        );
    }

    #[test]
    fn test_confirmation_requires_token() {
        let mut message = notification(None);
        message.r#type = "SubscriptionConfirmation".to_string();
        message.subscribe_url = Some("https://sns.us-east-1.amazonaws.com/confirm".to_string());

        assert!(matches!(
            message.string_to_sign(),
            Err(Error::MissingField("Token"))
        ));

        message.token = Some("abc123".to_string());
        let canonical = message.string_to_sign().unwrap();
        assert!(canonical.contains("\nToken\nabc123\n"));
        assert!(canonical.starts_with("Message\nhello\nMessageId\nm-1\nSubscribeURL\n"));
    }

    #[test]
    fn test_unknown_type_cannot_be_signed() {
        let mut message = notification(None);
        message.r#type = "Heartbeat".to_string();

        assert!(matches!(
            message.string_to_sign(),
            Err(Error::UnsupportedMessageType(t)) if t == "Heartbeat"
        ));
    }
}
