use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::services::{NotificationError, NotificationSender};

pub const DEFAULT_API_BASE: &str = "https://api.mailgun.net/v3";

/// Sends reminder e-mails through the Mailgun messages API
pub struct MailgunSender {
    client: reqwest::Client,
    api_base: String,
    domain: String,
    api_key: String,
    timeout_secs: u64,
}

impl MailgunSender {
    pub fn new(api_base: &str, domain: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            domain: domain.to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_base, self.domain)
    }

    fn from_address(&self) -> String {
        format!("MedBuddy HQ <medbuddy@{}>", self.domain)
    }
}

#[async_trait]
impl NotificationSender for MailgunSender {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> std::result::Result<(), NotificationError> {
        let from = self.from_address();
        let form = [("from", from.as_str()), ("to", recipient), ("subject", subject), ("html", body)];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Transport(format!("request timed out after {}s", self.timeout_secs))
                } else {
                    NotificationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Mailgun accepted message to {}", recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_go_to_the_domain_endpoint() {
        let sender = MailgunSender::new("https://api.mailgun.net/v3/", "mg.medbuddy.app", "key-123", 10).unwrap();

        assert_eq!(sender.messages_url(), "https://api.mailgun.net/v3/mg.medbuddy.app/messages");
        assert_eq!(sender.from_address(), "MedBuddy HQ <medbuddy@mg.medbuddy.app>");
    }

    #[tokio::test]
    async fn unreachable_api_is_a_transport_error() {
        // nothing listens on port 1
        let sender = MailgunSender::new("http://127.0.0.1:1", "mg.medbuddy.app", "key-123", 2).unwrap();

        let result = sender.send("ada@example.com", "Reminder", "<p>hi</p>").await;

        assert!(matches!(result, Err(NotificationError::Transport(_))));
    }
}
