use std::sync::Arc;
use tracing::{error, info};

use crate::{
    adapters::traits::{AlertField, AlertMessage, NotificationTransport},
    error::MonitorError,
    ledger::models::{TransitionEvent, TransitionKind},
};

const NEW_TOKEN_COLOR: u32 = 0x00ff00;
const BALANCE_CHANGE_COLOR: u32 = 0xffa500;

/// Result of a single delivery attempt. Failures are already logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    Failed(String),
}

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered)
    }
}

/// Renders transition events into alerts and hands them to the transport
pub struct Notifier {
    transport: Arc<dyn NotificationTransport>,
    explorer_base_url: String,
}

impl Notifier {
    pub fn new(transport: Arc<dyn NotificationTransport>, explorer_base_url: String) -> Self {
        Self {
            transport,
            explorer_base_url,
        }
    }

    /// Deliver one alert, at most once. Never fails past this boundary.
    pub async fn notify(&self, event: &TransitionEvent, owner: &str) -> NotifyOutcome {
        let message = self.render(event, owner);

        match self.transport.deliver(&message).await {
            Ok(()) => {
                info!("📣 {} notification sent for {}", self.transport.name(), event.mint);
                NotifyOutcome::Delivered
            }
            Err(e) => {
                let failure = MonitorError::NotifyFailure(e.to_string());
                error!("❌ Error sending notification for {}: {}", event.mint, failure);
                NotifyOutcome::Failed(failure.to_string())
            }
        }
    }

    pub fn explorer_link(&self, event: &TransitionEvent) -> String {
        format!("{}/token/{}", self.explorer_base_url, event.mint)
    }

    pub fn render(&self, event: &TransitionEvent, owner: &str) -> AlertMessage {
        let field = |name: &str, value: String, inline: bool| AlertField {
            name: name.to_string(),
            value,
            inline,
        };

        let mut fields = vec![field("Token Mint", event.mint.to_string(), false)];

        let (content, title, color) = match event.kind() {
            TransitionKind::NewItem => {
                fields.push(field("Balance", event.new_quantity.normalize().to_string(), true));
                ("🚨 New Token Alert! 🚨", "New Token Detected", NEW_TOKEN_COLOR)
            }
            TransitionKind::BalanceChanged => {
                if let Some(previous) = event.previous_quantity {
                    fields.push(field("Previous Balance", previous.normalize().to_string(), true));
                }
                fields.push(field("Balance", event.new_quantity.normalize().to_string(), true));
                if let Some(delta) = event.delta() {
                    let sign = if delta.is_sign_positive() { "+" } else { "" };
                    fields.push(field("Change", format!("{}{}", sign, delta.normalize()), true));
                }
                ("🔄 Token Balance Alert 🔄", "Token Balance Changed", BALANCE_CHANGE_COLOR)
            }
        };

        fields.push(field("Wallet", owner.to_string(), true));
        fields.push(field("Explorer Link", self.explorer_link(event), false));

        AlertMessage {
            content: content.to_string(),
            title: title.to_string(),
            color,
            fields,
            timestamp: event.observed_at,
        }
    }
}
