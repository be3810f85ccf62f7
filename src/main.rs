//! Fraud Screening Service - Main Entry Point
//!
//! Consumes transactions from NATS, evaluates each one (validation,
//! correction, rule scoring, classification), and publishes the full
//! screening report. Transactions are processed in parallel.

use anyhow::Result;
use fraud_screening::{
    config::AppConfig,
    consumer::TransactionConsumer,
    engine::evaluator::TransactionEvaluator,
    metrics::{MetricsReporter, ScreeningMetrics},
    models::onnx::OnnxClassifier,
    producer::ReportProducer,
    types::report::ScreeningReport,
    TransactionRecord,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_screening=info".parse()?),
        )
        .init();

    info!("Starting Fraud Screening Service");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Initialize metrics
    let metrics = Arc::new(ScreeningMetrics::new());

    // Load the trained classifier
    let classifier = Arc::new(OnnxClassifier::from_file(
        &config.classifier.model_path,
        config.classifier.onnx_threads,
    )?);
    info!(
        model_path = %config.classifier.model_path,
        "Classifier loaded"
    );

    // The evaluator is stateless; one instance serves all workers
    let evaluator = Arc::new(TransactionEvaluator::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = match &config.nats.queue_group {
        Some(group) => TransactionConsumer::with_queue_group(
            client.clone(),
            &config.nats.transaction_subject,
            group,
        ),
        None => TransactionConsumer::new(client.clone(), &config.nats.transaction_subject),
    };
    let producer = Arc::new(ReportProducer::new(client.clone(), &config.nats.report_subject));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting screening loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.transaction_subject);
    info!("Publishing reports to: {}", config.nats.report_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Process transactions in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await.unwrap();

        // Clone shared resources for the spawned task
        let evaluator = evaluator.clone();
        let classifier = classifier.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        // Spawn task to screen this transaction
        tokio::spawn(async move {
            let start_time = Instant::now();

            match serde_json::from_slice::<TransactionRecord>(&message.payload) {
                Ok(record) => {
                    let tx_id = record.transaction_id.clone();

                    match evaluator.evaluate(&record, classifier.as_ref()) {
                        Ok(evaluation) => {
                            let report = ScreeningReport::new(&record, evaluation);
                            let processing_time = start_time.elapsed();

                            metrics.record_screening(processing_time, &report);

                            if report.needs_attention() {
                                warn!(
                                    transaction_id = %tx_id,
                                    risk_score = report.risk.score,
                                    risk_tier = ?report.risk.tier,
                                    fraud_probability = ?report.fraud_probability(),
                                    "High-risk transaction screened"
                                );
                            } else {
                                debug!(
                                    transaction_id = %tx_id,
                                    risk_score = report.risk.score,
                                    processing_time_us = processing_time.as_micros(),
                                    "Transaction screened"
                                );
                            }

                            if let Err(e) = producer.publish(&report).await {
                                error!(
                                    transaction_id = %tx_id,
                                    error = %e,
                                    "Failed to publish screening report"
                                );
                            }

                            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                            // Log progress every 100 transactions
                            if count % 100 == 0 {
                                let throughput = metrics.get_throughput();
                                let processing_stats = metrics.get_processing_stats();
                                info!(
                                    processed = count,
                                    throughput = format!("{:.1} tx/s", throughput),
                                    avg_latency_us = processing_stats.mean_us,
                                    "Screening milestone"
                                );
                            }
                        }
                        Err(e) => {
                            metrics.record_invalid_input();
                            warn!(
                                transaction_id = %tx_id,
                                error = %e,
                                "Transaction rejected"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize transaction");
                }
            }

            // Release permit when done
            drop(permit);
        });
    }

    // Print final summary
    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
