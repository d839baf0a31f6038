use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    adapters::traits::{AlertField, AlertMessage, NotificationTransport},
    error::{AppError, AppResult},
};

/// Discord incoming-webhook client
pub struct DiscordWebhookTransport {
    webhook_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct DiscordWebhookRequest<'a> {
    content: &'a str,
    embeds: Vec<DiscordEmbed<'a>>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed<'a> {
    title: &'a str,
    color: u32,
    fields: &'a [AlertField],
    timestamp: String,
}

impl DiscordWebhookTransport {
    pub fn new(webhook_url: String, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { webhook_url, client })
    }

    fn request_body(message: &AlertMessage) -> DiscordWebhookRequest<'_> {
        DiscordWebhookRequest {
            content: &message.content,
            embeds: vec![DiscordEmbed {
                title: &message.title,
                color: message.color,
                fields: &message.fields,
                timestamp: message.timestamp.to_rfc3339(),
            }],
        }
    }
}

#[async_trait]
impl NotificationTransport for DiscordWebhookTransport {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn deliver(&self, message: &AlertMessage) -> AppResult<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::request_body(message))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Discord webhook returned {}: {}",
                status, error_text
            )));
        }

        debug!("Discord webhook accepted alert: {}", message.title);
        Ok(())
    }
}
