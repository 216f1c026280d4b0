use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Notification rejected with status {status}")]
    Rejected { status: u16 },
}

impl From<reqwest::Error> for NotifyError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => NotifyError::Rejected {
                status: status.as_u16(),
            },
            None => NotifyError::Transport(error.to_string()),
        }
    }
}

/// Delivers a direct message to a platform user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: &str, message: &str) -> Result<(), NotifyError>;
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Writes notifications to the log. Used when no webhook is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: &str, message: &str) -> Result<(), NotifyError> {
        log::info!("Notify @{}: {}", user_id, message);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    channel: String,
    text: &'a str,
}

/// Posts notifications to an incoming-webhook URL as `{"channel": "@user", "text": ...}`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("chaos-engine/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, user_id: &str, message: &str) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            channel: format!("@{}", user_id),
            text: message,
        };

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Sends each `(user_id, message)` pair. Failures are logged and dropped; the
/// caller's state change is already durable.
pub async fn notify_all(notifier: &dyn Notifier, messages: &[(String, String)]) {
    for (user_id, message) in messages {
        if let Err(e) = notifier.notify(user_id, message).await {
            log::warn!("Failed to notify @{}: {}", user_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Flaky {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Flaky {
        async fn notify(&self, user_id: &str, _message: &str) -> Result<(), NotifyError> {
            if user_id == "down" {
                return Err(NotifyError::Transport("connection refused".to_string()));
            }
            self.delivered.lock().unwrap().push(user_id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn notify_all_keeps_going_after_a_failure() {
        let notifier = Flaky::default();
        let messages = vec![
            ("a".to_string(), "hi".to_string()),
            ("down".to_string(), "hi".to_string()),
            ("b".to_string(), "hi".to_string()),
        ];
        notify_all(&notifier, &messages).await;
        assert_eq!(*notifier.delivered.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn webhook_payload_addresses_the_user_channel() {
        let payload = WebhookPayload {
            channel: "@u1".to_string(),
            text: "Gameday **DRILL** just started",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["channel"], "@u1");
        assert_eq!(json["text"], "Gameday **DRILL** just started");
    }
}
