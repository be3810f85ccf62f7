//! NATS message consumer for incoming transactions

use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for receiving transactions from NATS.
///
/// When a queue group is configured, multiple service instances share the
/// subject and NATS delivers each transaction to exactly one of them.
pub struct TransactionConsumer {
    client: Client,
    subject: String,
    queue_group: Option<String>,
}

impl TransactionConsumer {
    /// Create a consumer that receives every transaction on the subject
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group: None,
        }
    }

    /// Create a consumer that shares the subject within a queue group
    pub fn with_queue_group(client: Client, subject: &str, queue_group: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group: Some(queue_group.to_string()),
        }
    }

    /// Subscribe to the transaction subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(self.subject.clone(), group.clone())
                    .await?
            }
            None => self.client.subscribe(self.subject.clone()).await?,
        };
        info!(
            subject = %self.subject,
            queue_group = ?self.queue_group,
            "Subscribed to transaction subject"
        );
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
