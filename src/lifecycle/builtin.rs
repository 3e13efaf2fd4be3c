//! Default listeners.
//!
//! - `LoggingListener`: logs every lifecycle event
//! - `MetricsListener`: counts setups and outcomes

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::types::declarations::{SuiteContext, TestMethod};
use crate::{TestfluxError, TestfluxResult};

use super::{LifecycleEvent, TestInvocation, TestListener};

// ═══════════════════════════════════════════════════════════════════════════
// LoggingListener
// ═══════════════════════════════════════════════════════════════════════════

/// Logs lifecycle events through `tracing`.
#[derive(Debug, Default)]
pub struct LoggingListener;

impl LoggingListener {
    pub fn new() -> Self {
        Self
    }
}

impl TestListener for LoggingListener {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_suite_start(&self, suite: &SuiteContext) {
        tracing::info!(
            event = %LifecycleEvent::SuiteStart,
            suite = %suite.name,
            run_root = %suite.run_root.display(),
            "Suite started"
        );
    }

    fn on_suite_finish(&self, suite: &SuiteContext) {
        tracing::info!(event = %LifecycleEvent::SuiteFinish, suite = %suite.name, "Suite finished");
    }

    fn on_test_start(&self, invocation: &mut TestInvocation<'_>) -> TestfluxResult<()> {
        tracing::debug!(
            event = %LifecycleEvent::TestStart,
            method = %invocation.method,
            "Test starting"
        );
        Ok(())
    }

    fn on_setup_failure(&self, method: &TestMethod, error: &TestfluxError) {
        tracing::error!(method = %method, error = %error, "Test setup failed");
    }

    fn on_test_success(&self, method: &TestMethod) {
        tracing::debug!(event = %LifecycleEvent::TestSuccess, method = %method, "Test passed");
    }

    fn on_test_failure(&self, method: &TestMethod, reason: &str) {
        tracing::warn!(
            event = %LifecycleEvent::TestFailure,
            method = %method,
            reason,
            "Test failed"
        );
    }

    fn on_test_skipped(&self, method: &TestMethod) {
        tracing::debug!(event = %LifecycleEvent::TestSkipped, method = %method, "Test skipped");
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MetricsListener
// ═══════════════════════════════════════════════════════════════════════════

/// Counts test setups and outcomes.
#[derive(Debug, Default)]
pub struct MetricsListener {
    /// Methods whose setup started.
    started: AtomicU64,

    /// Setups that failed.
    setup_failures: AtomicU64,

    successes: AtomicU64,

    failures: AtomicU64,

    skipped: AtomicU64,
}

impl MetricsListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    pub fn total_setup_failures(&self) -> u64 {
        self.setup_failures.load(Ordering::Relaxed)
    }

    pub fn total_successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Successes over started methods.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_started();
        if total == 0 {
            0.0
        } else {
            self.total_successes() as f64 / total as f64
        }
    }

    /// Snapshot of the counters.
    pub fn metrics(&self) -> ListenerMetrics {
        ListenerMetrics {
            started: self.total_started(),
            setup_failures: self.total_setup_failures(),
            successes: self.total_successes(),
            failures: self.total_failures(),
            skipped: self.total_skipped(),
            success_rate: self.success_rate(),
        }
    }
}

/// Counters collected by [`MetricsListener`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListenerMetrics {
    pub started: u64,
    pub setup_failures: u64,
    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,
    pub success_rate: f64,
}

impl TestListener for MetricsListener {
    fn name(&self) -> &str {
        "metrics"
    }

    fn on_test_start(&self, _invocation: &mut TestInvocation<'_>) -> TestfluxResult<()> {
        self.started.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_setup_failure(&self, _method: &TestMethod, _error: &TestfluxError) {
        self.setup_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn on_test_success(&self, _method: &TestMethod) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    fn on_test_failure(&self, _method: &TestMethod, _reason: &str) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    fn on_test_skipped(&self, _method: &TestMethod) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }
}
