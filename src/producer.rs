//! NATS message producer for screening reports

use crate::types::report::ScreeningReport;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Producer for publishing screening reports to NATS
#[derive(Clone)]
pub struct ReportProducer {
    client: Client,
    subject: String,
}

impl ReportProducer {
    /// Create a new report producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a screening report
    pub async fn publish(&self, report: &ScreeningReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            report_id = %report.report_id,
            transaction_id = %report.transaction_id,
            risk_score = report.risk.score,
            "Published screening report"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
