//! Listener that builds and injects knowledge bases on test start.

use std::sync::Arc;

use serde::Serialize;
use tracing::Span;

use crate::assembler::{BuildPhase, BuildSession, KnowledgeBaseAssembler};
use crate::builder::KnowledgeBuilderFactory;
use crate::declarations::DeclarationSource;
use crate::injection::InjectionBinder;
use crate::types::config::Config;
use crate::types::declarations::TestMethod;
use crate::TestfluxResult;

use super::{TestInvocation, TestListener};

/// What one successful setup produced.
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub method: TestMethod,
    pub knowledge_base: String,
    pub packages: usize,
    pub slots_bound: usize,
    pub phases: Vec<BuildPhase>,
}

/// Builds a fresh knowledge base for every test method and binds it into
/// the test instance.
pub struct RuleTestListener {
    declarations: Arc<dyn DeclarationSource>,
    assembler: KnowledgeBaseAssembler,
    binder: InjectionBinder,
    span: Span,
}

impl RuleTestListener {
    /// Creates a listener from its collaborators.
    pub fn new(
        declarations: Arc<dyn DeclarationSource>,
        assembler: KnowledgeBaseAssembler,
        binder: InjectionBinder,
    ) -> Self {
        let span = tracing::info_span!("rule_listener");
        Self {
            declarations,
            assembler: assembler.with_span(tracing::debug_span!(parent: &span, "assembler")),
            binder: binder.with_span(tracing::debug_span!(parent: &span, "binder")),
            span,
        }
    }

    /// Creates a listener whose resolver and binder follow `config`.
    pub fn from_config(
        config: &Config,
        declarations: Arc<dyn DeclarationSource>,
        factory: impl KnowledgeBuilderFactory + 'static,
    ) -> Self {
        Self::new(
            declarations,
            KnowledgeBaseAssembler::from_config(config, factory),
            InjectionBinder::new(config.injection.policy),
        )
    }

    pub fn binder(&self) -> &InjectionBinder {
        &self.binder
    }

    pub fn assembler(&self) -> &KnowledgeBaseAssembler {
        &self.assembler
    }

    /// Builds the knowledge base for the invoked method and injects it.
    ///
    /// Nothing is injected when the build fails.
    pub fn prepare(&self, invocation: &mut TestInvocation<'_>) -> TestfluxResult<SetupReport> {
        let _guard = self.span.enter();
        let mut session = BuildSession::new(invocation.method.clone());

        let declaration = match self.declarations.declaration(&invocation.method.class) {
            Ok(declaration) => declaration,
            Err(err) => {
                session.fail();
                return Err(err);
            }
        };

        let knowledge = self.assembler.build_in_session(
            &declaration,
            invocation.suite.run_root(),
            &mut session,
        )?;

        let slots_bound = match self.binder.bind(&knowledge, &mut *invocation.instance) {
            Ok(bound) => bound,
            Err(err) => {
                session.fail();
                return Err(err);
            }
        };
        session.advance(BuildPhase::Injected)?;

        if slots_bound == 0 {
            tracing::warn!(
                method = %invocation.method,
                type_name = invocation.instance.type_name(),
                "Knowledge base built but no eligible slot found"
            );
        }

        tracing::info!(
            method = %invocation.method,
            knowledge_base = %knowledge.id,
            packages = knowledge.len(),
            slots_bound,
            "Knowledge base injected"
        );

        Ok(SetupReport {
            method: invocation.method.clone(),
            knowledge_base: knowledge.id.clone(),
            packages: knowledge.len(),
            slots_bound,
            phases: session.history().to_vec(),
        })
    }
}

impl TestListener for RuleTestListener {
    fn name(&self) -> &str {
        "rules"
    }

    fn on_test_start(&self, invocation: &mut TestInvocation<'_>) -> TestfluxResult<()> {
        self.prepare(invocation).map(|_| ())
    }
}
