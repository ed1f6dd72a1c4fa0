//! In-process practice metrics.
//!
//! Tracks per-attempt timing (recording hand-off through gateway reply),
//! pass rates, and error history. Diagnostics only; nothing leaves the
//! process.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Maximum number of completed attempts to retain in history
const MAX_ATTEMPT_HISTORY: usize = 50;

/// Maximum number of errors to retain in history
const MAX_ERROR_HISTORY: usize = 20;

/// Metrics for one completed evaluation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptMetrics {
    pub attempt_id: String,
    /// Unix timestamp when the attempt started (seconds)
    pub started_at: u64,
    /// Practice mode label ("shadowing", "roleplay", ...)
    pub mode: String,
    /// Gateway round-trip in milliseconds
    pub evaluation_duration_ms: u64,
    pub score: Option<u32>,
    pub passed: bool,
    /// Whether the attempt resolved at all (false on gateway failure)
    pub resolved: bool,
    pub error_message: Option<String>,
}

/// Summary statistics across recorded attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_attempts: u64,
    pub passed_attempts: u64,
    pub failed_attempts: u64,
    /// Average gateway round-trip (ms) across resolved attempts
    pub avg_evaluation_ms: u64,
    pub last_error: Option<ErrorRecord>,
}

/// Record of an error that occurred during operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Unix timestamp when error occurred (seconds)
    pub timestamp: u64,
    /// Category of error (e.g., "gateway", "persistence")
    pub error_type: String,
    pub message: String,
    pub attempt_id: Option<String>,
}

struct AttemptInProgress {
    attempt_id: Uuid,
    mode: String,
    started_at: Instant,
    started_at_unix: u64,
}

impl AttemptInProgress {
    fn new(attempt_id: Uuid, mode: String) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            attempt_id,
            mode,
            started_at: Instant::now(),
            started_at_unix: now,
        }
    }

    fn to_metrics(
        &self,
        resolved: bool,
        score: Option<u32>,
        passed: bool,
        error_message: Option<String>,
    ) -> AttemptMetrics {
        AttemptMetrics {
            attempt_id: self.attempt_id.to_string(),
            started_at: self.started_at_unix,
            mode: self.mode.clone(),
            evaluation_duration_ms: self.started_at.elapsed().as_millis() as u64,
            score,
            passed,
            resolved,
            error_message,
        }
    }
}

/// Collects and stores metrics for evaluation attempts
pub struct MetricsCollector {
    /// History of completed attempts (newest first)
    history: VecDeque<AttemptMetrics>,
    /// History of errors (newest first)
    errors: VecDeque<ErrorRecord>,
    current: Option<AttemptInProgress>,
    total_attempts: u64,
    passed_attempts: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_ATTEMPT_HISTORY),
            errors: VecDeque::with_capacity(MAX_ERROR_HISTORY),
            current: None,
            total_attempts: 0,
            passed_attempts: 0,
        }
    }

    /// Start tracking a new attempt. An attempt already in progress is
    /// recorded as discarded (indicates a state machine bug).
    pub fn start_attempt(&mut self, attempt_id: Uuid, mode: &str) {
        if let Some(old) = self.current.take() {
            log::warn!(
                "Metrics: discarding in-progress attempt {} to start {}",
                old.attempt_id,
                attempt_id
            );
            let metrics = old.to_metrics(
                false,
                None,
                false,
                Some("Discarded: new attempt started".to_string()),
            );
            self.add_to_history(metrics);
        }

        log::debug!("Metrics: starting attempt {} ({})", attempt_id, mode);
        self.current = Some(AttemptInProgress::new(attempt_id, mode.to_string()));
        self.total_attempts += 1;
    }

    /// The gateway replied; record outcome and round-trip time.
    pub fn attempt_resolved(&mut self, score: Option<u32>, passed: bool) {
        if let Some(attempt) = self.current.take() {
            let metrics = attempt.to_metrics(true, score, passed, None);
            log::info!(
                "Metrics: attempt {} resolved in {}ms (score {:?}, passed {})",
                metrics.attempt_id,
                metrics.evaluation_duration_ms,
                score,
                passed
            );
            self.add_to_history(metrics);
            if passed {
                self.passed_attempts += 1;
            }
        }
    }

    /// The gateway call failed.
    pub fn attempt_failed(&mut self, error: String) {
        let attempt_id = self.current.as_ref().map(|a| a.attempt_id.to_string());
        if let Some(attempt) = self.current.take() {
            let metrics = attempt.to_metrics(false, None, false, Some(error.clone()));
            log::warn!(
                "Metrics: attempt {} failed after {}ms - {}",
                metrics.attempt_id,
                metrics.evaluation_duration_ms,
                error
            );
            self.add_to_history(metrics);
        }
        self.record_error("gateway".to_string(), error, attempt_id);
    }

    /// Record an error (not necessarily tied to an attempt)
    pub fn record_error(&mut self, error_type: String, message: String, attempt_id: Option<String>) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let error = ErrorRecord {
            timestamp: now,
            error_type,
            message,
            attempt_id,
        };
        log::debug!("Metrics: recording error - {:?}", error);

        self.errors.push_front(error);
        while self.errors.len() > MAX_ERROR_HISTORY {
            self.errors.pop_back();
        }
    }

    pub fn get_summary(&self) -> MetricsSummary {
        let resolved: Vec<_> = self.history.iter().filter(|a| a.resolved).collect();
        let count = resolved.len() as u64;
        let avg_evaluation_ms = if count > 0 {
            resolved
                .iter()
                .map(|a| a.evaluation_duration_ms)
                .sum::<u64>()
                / count
        } else {
            0
        };

        MetricsSummary {
            total_attempts: self.total_attempts,
            passed_attempts: self.passed_attempts,
            failed_attempts: self.total_attempts.saturating_sub(self.passed_attempts),
            avg_evaluation_ms,
            last_error: self.errors.front().cloned(),
        }
    }

    /// Attempt history, newest first
    pub fn get_history(&self) -> Vec<AttemptMetrics> {
        self.history.iter().cloned().collect()
    }

    /// Error history, newest first
    pub fn get_errors(&self) -> Vec<ErrorRecord> {
        self.errors.iter().cloned().collect()
    }

    fn add_to_history(&mut self, metrics: AttemptMetrics) {
        self.history.push_front(metrics);
        while self.history.len() > MAX_ATTEMPT_HISTORY {
            self.history.pop_back();
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_collector_is_empty() {
        let collector = MetricsCollector::new();
        let summary = collector.get_summary();
        assert_eq!(summary.total_attempts, 0);
        assert_eq!(summary.passed_attempts, 0);
        assert!(collector.get_history().is_empty());
        assert!(collector.get_errors().is_empty());
    }

    #[test]
    fn resolved_attempt_is_tracked() {
        let mut collector = MetricsCollector::new();
        collector.start_attempt(Uuid::new_v4(), "shadowing");
        std::thread::sleep(std::time::Duration::from_millis(5));
        collector.attempt_resolved(Some(82), true);

        let summary = collector.get_summary();
        assert_eq!(summary.total_attempts, 1);
        assert_eq!(summary.passed_attempts, 1);

        let history = collector.get_history();
        assert_eq!(history.len(), 1);
        assert!(history[0].resolved);
        assert_eq!(history[0].score, Some(82));
        assert!(history[0].evaluation_duration_ms >= 5);
    }

    #[test]
    fn failed_attempt_records_an_error() {
        let mut collector = MetricsCollector::new();
        collector.start_attempt(Uuid::new_v4(), "roleplay");
        collector.attempt_failed("Network error: reset".to_string());

        let summary = collector.get_summary();
        assert_eq!(summary.total_attempts, 1);
        assert_eq!(summary.passed_attempts, 0);
        assert_eq!(
            summary.last_error.unwrap().message,
            "Network error: reset"
        );
        assert!(!collector.get_history()[0].resolved);
    }

    #[test]
    fn history_is_bounded() {
        let mut collector = MetricsCollector::new();
        for i in 0..(MAX_ATTEMPT_HISTORY + 10) {
            collector.start_attempt(Uuid::new_v4(), "shadowing");
            collector.attempt_resolved(Some(i as u32), true);
        }
        assert_eq!(collector.get_history().len(), MAX_ATTEMPT_HISTORY);
    }

    #[test]
    fn starting_over_an_inflight_attempt_discards_it() {
        let mut collector = MetricsCollector::new();
        collector.start_attempt(Uuid::new_v4(), "shadowing");
        collector.start_attempt(Uuid::new_v4(), "shadowing");
        let history = collector.get_history();
        assert_eq!(history.len(), 1);
        assert!(!history[0].resolved);
        assert_eq!(collector.get_summary().total_attempts, 2);
    }
}
