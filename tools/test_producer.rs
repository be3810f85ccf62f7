//! Test Transaction Producer
//!
//! Generates and publishes sample transactions to NATS for service testing.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Transaction structure matching the service's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Transaction {
    transaction_id: String,
    #[serde(rename = "type")]
    tx_type: String,
    amount: f64,
    #[serde(rename = "oldbalanceOrg")]
    old_balance_orig: f64,
    #[serde(rename = "newbalanceOrig")]
    new_balance_orig: f64,
    #[serde(rename = "oldbalanceDest")]
    old_balance_dest: f64,
    #[serde(rename = "newbalanceDest")]
    new_balance_dest: f64,
}

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    /// Generate a random legitimate transaction: small amount, balances
    /// consistent on both sides.
    fn generate_legitimate(&mut self) -> Transaction {
        self.transaction_counter += 1;

        let amount = self.rng.gen_range(10.0..5_000.0_f64).round();
        let old_balance_orig = amount + self.rng.gen_range(5_000.0..50_000.0_f64).round();
        let old_balance_dest = self.rng.gen_range(0.0..20_000.0_f64).round();

        Transaction {
            transaction_id: format!("tx_{:012}", self.transaction_counter),
            tx_type: self.random_choice(&["PAYMENT", "DEPOSIT", "TRANSFER"]).to_string(),
            amount,
            old_balance_orig,
            new_balance_orig: old_balance_orig - amount,
            old_balance_dest,
            new_balance_dest: old_balance_dest + amount,
        }
    }

    /// Generate a suspicious transaction: TRANSFER/CASH_OUT, large amount,
    /// account emptied, sometimes with an inconsistent sender balance.
    fn generate_suspicious(&mut self) -> Transaction {
        self.transaction_counter += 1;

        let old_balance_orig = self.rng.gen_range(60_000.0..500_000.0_f64).round();
        let amount = old_balance_orig; // Drain the account
        let old_balance_dest = self.rng.gen_range(0.0..1_000.0_f64).round();

        // A third of the suspicious records keep the stale sender balance,
        // exercising the validation/correction path
        let new_balance_orig = if self.rng.gen_bool(0.33) {
            old_balance_orig
        } else {
            0.0
        };

        Transaction {
            transaction_id: format!("tx_{:012}", self.transaction_counter),
            tx_type: self.random_choice(&["TRANSFER", "CASH_OUT"]).to_string(),
            amount,
            old_balance_orig,
            new_balance_orig,
            old_balance_dest,
            new_balance_dest: old_balance_dest + amount,
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("transactions");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    // Generate and publish transactions
    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} transactions...", count);

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        let payload = serde_json::to_vec(&transaction)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} transactions ({} legitimate, {} suspicious)",
                i + 1,
                count,
                legitimate_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} transactions ({} legitimate, {} suspicious)",
        count, legitimate_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&transaction)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
