//! Metrics collection for job runs

use std::collections::BTreeMap;
use std::fmt;

/// Kind of job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobKind {
    /// Pattern table parse
    Parse,
    /// AI extraction
    Extract,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Parse => write!(f, "parse"),
            JobKind::Extract => write!(f, "extract"),
        }
    }
}

/// Counters collected across job runs
#[derive(Debug, Clone, Default)]
pub struct JobMetrics {
    /// Jobs run per kind
    pub jobs: BTreeMap<JobKind, usize>,

    /// Attempts across all jobs
    pub attempts: u32,

    /// Attempts beyond the first
    pub retries: u32,

    /// Jobs that ended without success
    pub failures: usize,

    /// Records written
    pub records_saved: usize,

    /// Prior records removed before parsing
    pub records_deleted: usize,

    /// Wall-clock time spent in jobs, in milliseconds
    pub total_runtime_ms: u64,
}

impl JobMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished job
    pub fn record_job(&mut self, kind: JobKind, attempts: u32, success: bool) {
        *self.jobs.entry(kind).or_insert(0) += 1;
        self.attempts += attempts;
        self.retries += attempts.saturating_sub(1);
        if !success {
            self.failures += 1;
        }
    }

    /// Record records written and removed by a job
    pub fn record_records(&mut self, saved: usize, deleted: usize) {
        self.records_saved += saved;
        self.records_deleted += deleted;
    }

    /// Total jobs across kinds
    pub fn total_jobs(&self) -> usize {
        self.jobs.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Job Metrics Summary".to_string(),
            "===================".to_string(),
            format!("Jobs run: {}", self.total_jobs()),
        ];

        for (kind, count) in &self.jobs {
            lines.push(format!("  {}: {}", kind, count));
        }

        lines.push(format!("Attempts: {} ({} retries)", self.attempts, self.retries));
        lines.push(format!("Failures: {}", self.failures));
        lines.push(format!("Records saved: {}", self.records_saved));
        lines.push(format!("Records deleted: {}", self.records_deleted));
        lines.push(format!("Total runtime: {}ms", self.total_runtime_ms));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = JobMetrics::new();
        assert_eq!(metrics.total_jobs(), 0);
        assert_eq!(metrics.attempts, 0);
        assert_eq!(metrics.failures, 0);
    }

    #[test]
    fn test_record_job_counts_retries() {
        let mut metrics = JobMetrics::new();
        metrics.record_job(JobKind::Parse, 1, true);
        metrics.record_job(JobKind::Extract, 3, false);
        metrics.record_job(JobKind::Parse, 2, true);

        assert_eq!(metrics.jobs[&JobKind::Parse], 2);
        assert_eq!(metrics.jobs[&JobKind::Extract], 1);
        assert_eq!(metrics.total_jobs(), 3);
        assert_eq!(metrics.attempts, 6);
        assert_eq!(metrics.retries, 3);
        assert_eq!(metrics.failures, 1);
    }

    #[test]
    fn test_reset() {
        let mut metrics = JobMetrics::new();
        metrics.record_job(JobKind::Parse, 2, true);
        metrics.record_records(4, 1);

        metrics.reset();

        assert_eq!(metrics.total_jobs(), 0);
        assert_eq!(metrics.records_saved, 0);
        assert_eq!(metrics.retries, 0);
    }

    #[test]
    fn test_summary() {
        let mut metrics = JobMetrics::new();
        metrics.record_job(JobKind::Extract, 2, true);
        metrics.record_records(5, 3);
        metrics.total_runtime_ms = 1500;

        let summary = metrics.summary();
        assert!(summary.contains("Jobs run: 1"));
        assert!(summary.contains("  extract: 1"));
        assert!(summary.contains("Attempts: 2 (1 retries)"));
        assert!(summary.contains("Records saved: 5"));
        assert!(summary.contains("Records deleted: 3"));
        assert!(summary.contains("Total runtime: 1500ms"));
    }
}
