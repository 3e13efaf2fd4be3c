//! Test lifecycle integration.
//!
//! The host test runner reports lifecycle events to a [`ListenerRegistry`],
//! which forwards them to every registered [`TestListener`]:
//!
//! - `suite_start` / `suite_finish`: around a whole suite
//! - `test_start`: before a test method runs; the only event that can fail
//! - `test_success` / `test_failure` / `test_skipped`: after the method
//!
//! A failing `test_start` is a setup failure. The runner must not execute
//! the test body and must report the returned reason instead of an
//! assertion failure.

mod adapter;
mod builtin;

pub use adapter::{RuleTestListener, SetupReport};
pub use builtin::{ListenerMetrics, LoggingListener, MetricsListener};

use crate::injection::Injectable;
use crate::types::declarations::{SuiteContext, TestMethod};
use crate::{TestfluxError, TestfluxResult};

// ═══════════════════════════════════════════════════════════════════════════
// Events
// ═══════════════════════════════════════════════════════════════════════════

/// Lifecycle event reported by the host runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    SuiteStart,
    SuiteFinish,
    TestStart,
    TestSuccess,
    TestFailure,
    TestSkipped,
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::SuiteStart => write!(f, "suite_start"),
            LifecycleEvent::SuiteFinish => write!(f, "suite_finish"),
            LifecycleEvent::TestStart => write!(f, "test_start"),
            LifecycleEvent::TestSuccess => write!(f, "test_success"),
            LifecycleEvent::TestFailure => write!(f, "test_failure"),
            LifecycleEvent::TestSkipped => write!(f, "test_skipped"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Invocation context
// ═══════════════════════════════════════════════════════════════════════════

/// One test method about to run, passed explicitly to every listener.
pub struct TestInvocation<'a> {
    /// Suite the method belongs to.
    pub suite: &'a SuiteContext,

    /// Method being set up.
    pub method: TestMethod,

    /// Test instance the method runs on.
    pub instance: &'a mut dyn Injectable,
}

impl<'a> TestInvocation<'a> {
    pub fn new(
        suite: &'a SuiteContext,
        method: TestMethod,
        instance: &'a mut dyn Injectable,
    ) -> Self {
        Self {
            suite,
            method,
            instance,
        }
    }
}

/// Result of the setup phase of a test method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Every listener prepared the instance; the test body may run.
    Ready,

    /// A listener failed; the test body must not run.
    SetupFailed {
        /// Listener that failed.
        listener: String,
        /// Failure reason reported to the runner.
        reason: String,
    },
}

impl SetupOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, SetupOutcome::Ready)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Listener trait
// ═══════════════════════════════════════════════════════════════════════════

/// Receives lifecycle events. Every method but `name` defaults to a no-op.
pub trait TestListener: Send + Sync {
    /// Listener name.
    fn name(&self) -> &str;

    fn on_suite_start(&self, _suite: &SuiteContext) {}

    fn on_suite_finish(&self, _suite: &SuiteContext) {}

    /// Prepares the instance before the method runs.
    fn on_test_start(&self, _invocation: &mut TestInvocation<'_>) -> TestfluxResult<()> {
        Ok(())
    }

    /// Called on every listener after some listener failed the setup.
    fn on_setup_failure(&self, _method: &TestMethod, _error: &TestfluxError) {}

    fn on_test_success(&self, _method: &TestMethod) {}

    fn on_test_failure(&self, _method: &TestMethod, _reason: &str) {}

    fn on_test_skipped(&self, _method: &TestMethod) {}
}

// ═══════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════

/// Ordered set of listeners the host runner reports to.
pub struct ListenerRegistry {
    listeners: Vec<Box<dyn TestListener>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Creates a registry with the default listeners (logging).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LoggingListener));
        registry
    }

    /// Registers a listener. Listeners are notified in registration order.
    pub fn register(&mut self, listener: Box<dyn TestListener>) {
        tracing::debug!(listener = listener.name(), "Registering listener");
        self.listeners.push(listener);
    }

    pub fn count(&self) -> usize {
        self.listeners.len()
    }

    pub fn fire_suite_start(&self, suite: &SuiteContext) {
        for listener in &self.listeners {
            listener.on_suite_start(suite);
        }
    }

    pub fn fire_suite_finish(&self, suite: &SuiteContext) {
        for listener in &self.listeners {
            listener.on_suite_finish(suite);
        }
    }

    /// Runs the setup phase. Stops at the first failing listener.
    pub fn fire_test_start(&self, invocation: &mut TestInvocation<'_>) -> SetupOutcome {
        for listener in &self.listeners {
            if let Err(err) = listener.on_test_start(invocation) {
                for other in &self.listeners {
                    other.on_setup_failure(&invocation.method, &err);
                }
                return SetupOutcome::SetupFailed {
                    listener: listener.name().to_string(),
                    reason: err.to_string(),
                };
            }
        }

        SetupOutcome::Ready
    }

    pub fn fire_test_success(&self, method: &TestMethod) {
        for listener in &self.listeners {
            listener.on_test_success(method);
        }
    }

    pub fn fire_test_failure(&self, method: &TestMethod, reason: &str) {
        for listener in &self.listeners {
            listener.on_test_failure(method, reason);
        }
    }

    pub fn fire_test_skipped(&self, method: &TestMethod) {
        for listener in &self.listeners {
            listener.on_test_skipped(method);
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
