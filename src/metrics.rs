//! Performance metrics and statistics tracking for the screening service.

use crate::types::report::ScreeningReport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for screening throughput and outcomes
pub struct ScreeningMetrics {
    /// Total transactions screened
    pub transactions_screened: AtomicU64,
    /// Transactions the classifier flagged as fraud
    pub frauds_flagged: AtomicU64,
    /// Records rejected before evaluation
    pub invalid_inputs: AtomicU64,
    /// Evaluations where a balance correction was applied
    pub corrections_applied: AtomicU64,
    /// Evaluations whose classification portion failed
    pub classifier_failures: AtomicU64,
    /// Reports by risk tier
    reports_by_tier: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Fraud probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ScreeningMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            transactions_screened: AtomicU64::new(0),
            frauds_flagged: AtomicU64::new(0),
            invalid_inputs: AtomicU64::new(0),
            corrections_applied: AtomicU64::new(0),
            classifier_failures: AtomicU64::new(0),
            reports_by_tier: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed screening
    pub fn record_screening(&self, processing_time: Duration, report: &ScreeningReport) {
        self.transactions_screened.fetch_add(1, Ordering::Relaxed);

        if report.is_fraud() {
            self.frauds_flagged.fetch_add(1, Ordering::Relaxed);
        }
        if report.corrected_record.is_some() {
            self.corrections_applied.fetch_add(1, Ordering::Relaxed);
        }
        if report.classification.is_failed() {
            self.classifier_failures.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut by_tier) = self.reports_by_tier.write() {
            let tier = format!("{:?}", report.risk.tier).to_lowercase();
            *by_tier.entry(tier).or_insert(0) += 1;
        }

        if let Some(probability) = report.fraud_probability() {
            let bucket = (probability * 10.0).min(9.0) as usize;
            if let Ok(mut buckets) = self.probability_buckets.write() {
                buckets[bucket] += 1;
            }
        }
    }

    /// Record a record rejected before evaluation
    pub fn record_invalid_input(&self) {
        self.invalid_inputs.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (transactions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_screened.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get fraud probability distribution
    pub fn get_probability_distribution(&self) -> [u64; 10] {
        *self.probability_buckets.read().unwrap()
    }

    /// Get reports by risk tier
    pub fn get_reports_by_tier(&self) -> HashMap<String, u64> {
        self.reports_by_tier.read().unwrap().clone()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let screened = self.transactions_screened.load(Ordering::Relaxed);
        let frauds = self.frauds_flagged.load(Ordering::Relaxed);
        let invalid = self.invalid_inputs.load(Ordering::Relaxed);
        let corrections = self.corrections_applied.load(Ordering::Relaxed);
        let failures = self.classifier_failures.load(Ordering::Relaxed);
        let fraud_rate = if screened > 0 {
            (frauds as f64 / screened as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let by_tier = self.get_reports_by_tier();
        let probability_dist = self.get_probability_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            FRAUD SCREENING SERVICE - METRICS SUMMARY         ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions Screened:  {:>8}  │  Throughput: {:>6.1} tx/s ║",
            screened, throughput
        );
        info!(
            "║ Frauds Flagged:         {:>8}  │  Fraud Rate: {:>6.1}%     ║",
            frauds, fraud_rate
        );
        info!(
            "║ Corrections: {:>6}  Invalid: {:>6}  Classifier Errors: {:>4} ║",
            corrections, invalid, failures
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Reports by Risk Tier:                                        ║");
        for (tier, count) in &by_tier {
            let pct = if screened > 0 {
                (*count as f64 / screened as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)                                ║", tier, count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fraud Probability Distribution:                              ║");
        let total: u64 = probability_dist.iter().sum();
        for (i, &count) in probability_dist.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ScreeningMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<ScreeningMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<ScreeningMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::{
        ClassificationOutcome, ClassificationResult, FraudLabel,
    };
    use crate::engine::evaluator::Evaluation;
    use crate::engine::features::DerivedFeatures;
    use crate::engine::risk::{RiskAssessment, RiskTier};
    use crate::engine::validation::ValidationResult;
    use crate::types::transaction::{TransactionRecord, TransactionType};

    fn report(fraud: bool) -> ScreeningReport {
        let record = TransactionRecord::new(
            "tx_1",
            TransactionType::Transfer,
            1000.0,
            5000.0,
            4000.0,
            0.0,
            1000.0,
        );
        let evaluation = Evaluation {
            validation: ValidationResult {
                expected_new_balance_orig: 4000.0,
                expected_new_balance_dest: 1000.0,
                orig_valid: true,
                dest_valid: true,
            },
            corrected: None,
            derived: DerivedFeatures {
                balance_diff_orig: 1000.0,
                balance_diff_dest: 1000.0,
                amount_to_balance_ratio: 0.2,
                account_emptied: false,
            },
            risk: RiskAssessment {
                score: 3,
                tier: RiskTier::Low,
                factors: vec![],
            },
            classification: ClassificationOutcome::Classified(ClassificationResult {
                label: if fraud { FraudLabel::Fraud } else { FraudLabel::Legitimate },
                fraud_probability: if fraud { 0.95 } else { 0.03 },
                legitimate_probability: if fraud { 0.05 } else { 0.97 },
            }),
        };
        ScreeningReport::new(&record, evaluation)
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = ScreeningMetrics::new();

        metrics.record_screening(Duration::from_micros(100), &report(false));
        metrics.record_screening(Duration::from_micros(200), &report(true));
        metrics.record_invalid_input();

        assert_eq!(metrics.transactions_screened.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.frauds_flagged.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.invalid_inputs.load(Ordering::Relaxed), 1);

        let by_tier = metrics.get_reports_by_tier();
        assert_eq!(by_tier.get("low"), Some(&2));

        let dist = metrics.get_probability_distribution();
        assert_eq!(dist[0], 1); // 0.03
        assert_eq!(dist[9], 1); // 0.95
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ScreeningMetrics::new();
        for us in [100, 200, 300] {
            metrics.record_screening(Duration::from_micros(us), &report(false));
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.p50_us, 200);
    }
}
