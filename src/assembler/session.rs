//! Per-invocation build state machine.

use serde::Serialize;

use crate::types::declarations::TestMethod;
use crate::{TestfluxError, TestfluxResult};

/// Phase of a knowledge base build for one test method invocation.
///
/// ```text
/// NotStarted → Resolving → Compiling → Succeeded → Injected
///                  │            │
///                  └────────────┴────→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    NotStarted,
    Resolving,
    Compiling,
    Succeeded,
    Failed,
    Injected,
}

impl BuildPhase {
    /// Returns true if no further transition is allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildPhase::Failed | BuildPhase::Injected)
    }

    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition_to(&self, next: BuildPhase) -> bool {
        use BuildPhase::*;

        matches!(
            (self, next),
            (NotStarted, Resolving)
                | (NotStarted, Failed)
                | (Resolving, Compiling)
                | (Resolving, Failed)
                | (Compiling, Succeeded)
                | (Compiling, Failed)
                | (Succeeded, Injected)
                | (Succeeded, Failed)
        )
    }
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildPhase::NotStarted => write!(f, "not_started"),
            BuildPhase::Resolving => write!(f, "resolving"),
            BuildPhase::Compiling => write!(f, "compiling"),
            BuildPhase::Succeeded => write!(f, "succeeded"),
            BuildPhase::Failed => write!(f, "failed"),
            BuildPhase::Injected => write!(f, "injected"),
        }
    }
}

/// Tracks the phases one invocation went through.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSession {
    method: TestMethod,
    history: Vec<BuildPhase>,
}

impl BuildSession {
    pub fn new(method: TestMethod) -> Self {
        Self {
            method,
            history: vec![BuildPhase::NotStarted],
        }
    }

    pub fn method(&self) -> &TestMethod {
        &self.method
    }

    /// Current phase.
    pub fn phase(&self) -> BuildPhase {
        self.history
            .last()
            .copied()
            .unwrap_or(BuildPhase::NotStarted)
    }

    /// Every phase visited so far, starting with `NotStarted`.
    pub fn history(&self) -> &[BuildPhase] {
        &self.history
    }

    /// Moves to `next`, rejecting transitions the state machine forbids.
    pub fn advance(&mut self, next: BuildPhase) -> TestfluxResult<()> {
        let current = self.phase();
        if !current.can_transition_to(next) {
            return Err(TestfluxError::other(format!(
                "illegal build transition {} -> {} for {}",
                current, next, self.method
            )));
        }

        tracing::trace!(method = %self.method, from = %current, to = %next, "Build phase");
        self.history.push(next);
        Ok(())
    }

    /// Marks the session failed unless it already reached a terminal phase.
    pub fn fail(&mut self) {
        if !self.phase().is_terminal() {
            self.history.push(BuildPhase::Failed);
        }
    }
}
