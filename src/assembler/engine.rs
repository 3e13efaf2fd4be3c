//! Knowledge base assembly.
//!
//! Resolves every declared rule source of a test class, feeds the files to
//! a fresh compiler and turns the result into one knowledge base.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Span;

use crate::builder::KnowledgeBuilderFactory;
use crate::resolver::RuleSourceResolver;
use crate::types::config::Config;
use crate::types::declarations::{ClassDeclaration, TestMethod};
use crate::types::knowledge::{KnowledgeBase, SharedKnowledgeBase};
use crate::{TestfluxError, TestfluxResult};

use super::session::{BuildPhase, BuildSession};

/// Per-method refinement of a class-level knowledge base.
pub trait MethodOverlay: Send + Sync {
    /// Returns the knowledge base to inject for `method`.
    fn refine(
        &self,
        class_knowledge: KnowledgeBase,
        method: &TestMethod,
    ) -> TestfluxResult<KnowledgeBase>;
}

/// Builds knowledge bases from class declarations.
pub struct KnowledgeBaseAssembler {
    resolver: RuleSourceResolver,
    factory: Box<dyn KnowledgeBuilderFactory>,
    overlay: Option<Box<dyn MethodOverlay>>,
    span: Span,
}

impl KnowledgeBaseAssembler {
    /// Creates an assembler.
    pub fn new(resolver: RuleSourceResolver, factory: impl KnowledgeBuilderFactory + 'static) -> Self {
        Self {
            resolver,
            factory: Box::new(factory),
            overlay: None,
            span: tracing::debug_span!("assembler"),
        }
    }

    /// Creates an assembler using the rules section of `config`.
    pub fn from_config(config: &Config, factory: impl KnowledgeBuilderFactory + 'static) -> Self {
        Self::new(RuleSourceResolver::new(&config.rules), factory)
    }

    /// Installs a per-method overlay.
    pub fn with_overlay(mut self, overlay: Box<dyn MethodOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Logs inside `span`. The resolver logs inside a child of it.
    pub fn with_span(mut self, span: Span) -> Self {
        let resolver_span = tracing::debug_span!(parent: &span, "resolver");
        self.resolver = self.resolver.with_span(resolver_span);
        self.span = span;
        self
    }

    pub fn resolver(&self) -> &RuleSourceResolver {
        &self.resolver
    }

    /// Name of the compiler in use.
    pub fn compiler_name(&self) -> &str {
        self.factory.name()
    }

    /// Resolves every declared source, in declaration order.
    pub fn resolve_all(
        &self,
        declaration: &ClassDeclaration,
        run_root: &Path,
    ) -> TestfluxResult<Vec<PathBuf>> {
        let base = declaration.base_directory.as_deref();
        let mut files = Vec::new();
        for source in &declaration.sources {
            files.extend(self.resolver.resolve(source, base, run_root)?);
        }
        Ok(files)
    }

    /// Builds the class-level knowledge base.
    ///
    /// Every file is offered to the compiler before diagnostics are checked,
    /// so one failure lists the errors of all files.
    pub fn build_for_class(
        &self,
        declaration: &ClassDeclaration,
        run_root: &Path,
    ) -> TestfluxResult<KnowledgeBase> {
        let files = self.resolve_all(declaration, run_root)?;
        self.compile(&files)
    }

    /// Refinement hook applied after the class-level build.
    pub fn complete_for_method(
        &self,
        class_knowledge: KnowledgeBase,
        method: &TestMethod,
    ) -> TestfluxResult<KnowledgeBase> {
        match &self.overlay {
            Some(overlay) => overlay.refine(class_knowledge, method),
            None => Ok(class_knowledge),
        }
    }

    /// Builds the knowledge base for one method invocation.
    pub fn build(
        &self,
        declaration: &ClassDeclaration,
        method: &TestMethod,
        run_root: &Path,
    ) -> TestfluxResult<SharedKnowledgeBase> {
        let mut session = BuildSession::new(method.clone());
        self.build_in_session(declaration, run_root, &mut session)
    }

    /// Like [`build`](Self::build), recording every phase in `session`.
    pub fn build_in_session(
        &self,
        declaration: &ClassDeclaration,
        run_root: &Path,
        session: &mut BuildSession,
    ) -> TestfluxResult<SharedKnowledgeBase> {
        let result = self.run_phases(declaration, run_root, session);
        match &result {
            Ok(knowledge) => tracing::debug!(
                parent: &self.span,
                method = %session.method(),
                knowledge_base = %knowledge.id,
                packages = knowledge.len(),
                "Knowledge base built"
            ),
            Err(err) => {
                session.fail();
                tracing::warn!(
                    parent: &self.span,
                    method = %session.method(),
                    error = %err,
                    "Knowledge base build failed"
                );
            }
        }
        result
    }

    fn run_phases(
        &self,
        declaration: &ClassDeclaration,
        run_root: &Path,
        session: &mut BuildSession,
    ) -> TestfluxResult<SharedKnowledgeBase> {
        session.advance(BuildPhase::Resolving)?;
        let files = self.resolve_all(declaration, run_root)?;

        session.advance(BuildPhase::Compiling)?;
        let class_knowledge = self.compile(&files)?;
        let knowledge = self.complete_for_method(class_knowledge, session.method())?;

        session.advance(BuildPhase::Succeeded)?;
        Ok(Arc::new(knowledge))
    }

    fn compile(&self, files: &[PathBuf]) -> TestfluxResult<KnowledgeBase> {
        let _guard = self.span.enter();
        let mut builder = self.factory.create();

        for file in files {
            tracing::debug!(file = %file.display(), compiler = self.factory.name(), "Compiling rule source");
            builder.add(file).map_err(|err| match err {
                TestfluxError::Io(source) => TestfluxError::Compile {
                    path: file.clone(),
                    source,
                },
                other => other,
            })?;
        }

        if builder.has_diagnostics() {
            let diagnostics = builder.diagnostics().to_vec();
            tracing::debug!(errors = diagnostics.len(), "Rule compilation produced diagnostics");
            return Err(TestfluxError::Build(diagnostics));
        }

        let mut knowledge = KnowledgeBase::new();
        knowledge.add_packages(builder.into_packages());
        Ok(knowledge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{KnowledgeBuilder, SourceCollectorFactory};
    use crate::types::declarations::RuleSource;
    use crate::types::knowledge::{BuildDiagnostic, KnowledgePackage};
    use std::fs;
    use tempfile::TempDir;

    /// Reports one diagnostic per file whose body contains "error:".
    #[derive(Default)]
    struct LintingBuilder {
        packages: Vec<KnowledgePackage>,
        diagnostics: Vec<BuildDiagnostic>,
    }

    impl KnowledgeBuilder for LintingBuilder {
        fn add(&mut self, path: &Path) -> TestfluxResult<()> {
            let body = fs::read_to_string(path)?;
            for (index, line) in body.lines().enumerate() {
                if let Some(message) = line.strip_prefix("error:") {
                    self.diagnostics.push(BuildDiagnostic::new(
                        vec![index as u32 + 1],
                        message.trim(),
                    ));
                }
            }
            self.packages.push(KnowledgePackage::new("pkg", path, body));
            Ok(())
        }

        fn diagnostics(&self) -> &[BuildDiagnostic] {
            &self.diagnostics
        }

        fn into_packages(self: Box<Self>) -> Vec<KnowledgePackage> {
            self.packages
        }
    }

    fn linting_assembler() -> KnowledgeBaseAssembler {
        KnowledgeBaseAssembler::new(RuleSourceResolver::default(), || {
            Box::new(LintingBuilder::default()) as Box<dyn KnowledgeBuilder>
        })
    }

    fn write_rule(root: &Path, relative: &str, body: &str) -> PathBuf {
        let path = root.join("src/main/rules").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    struct AppendOverlay;

    impl MethodOverlay for AppendOverlay {
        fn refine(
            &self,
            mut class_knowledge: KnowledgeBase,
            method: &TestMethod,
        ) -> TestfluxResult<KnowledgeBase> {
            class_knowledge.add_packages(vec![KnowledgePackage::new(
                method.name.clone(),
                "/overlay",
                "",
            )]);
            Ok(class_knowledge)
        }
    }

    #[test]
    fn test_build_for_class_collects_all_sources() {
        let root = TempDir::new().unwrap();
        let a = write_rule(root.path(), "rules-a/one.drl", "rule one");
        let b = write_rule(root.path(), "b.drl", "rule b");

        let declaration =
            ClassDeclaration::new(vec![RuleSource::directory("rules-a"), RuleSource::file("b.drl")]);
        let assembler = KnowledgeBaseAssembler::new(RuleSourceResolver::default(), SourceCollectorFactory);

        let knowledge = assembler.build_for_class(&declaration, root.path()).unwrap();

        assert_eq!(knowledge.len(), 2);
        assert!(knowledge.contains_source(&a));
        assert!(knowledge.contains_source(&b));
    }

    #[test]
    fn test_diagnostics_aggregated_across_files() {
        let root = TempDir::new().unwrap();
        write_rule(root.path(), "first.drl", "rule a\nerror: unknown fact type 'Order'");
        write_rule(root.path(), "second.drl", "error: missing 'end'");

        let declaration =
            ClassDeclaration::new(vec![RuleSource::file("first.drl"), RuleSource::file("second.drl")]);

        let err = linting_assembler()
            .build_for_class(&declaration, root.path())
            .unwrap_err();

        match &err {
            TestfluxError::Build(diagnostics) => assert_eq!(diagnostics.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("[2]: unknown fact type 'Order'"));
        assert!(msg.contains("[1]: missing 'end'"));
    }

    #[test]
    fn test_resolution_failure_stops_before_compiling() {
        let root = TempDir::new().unwrap();
        write_rule(root.path(), "first.drl", "error: would be reported");

        let declaration = ClassDeclaration::new(vec![
            RuleSource::file("first.drl"),
            RuleSource::directory("missing"),
        ]);

        let mut session = BuildSession::new(TestMethod::new("PricingTest", "t"));
        let err = linting_assembler()
            .build_in_session(&declaration, root.path(), &mut session)
            .unwrap_err();

        assert!(matches!(err, TestfluxError::Resolution { .. }));
        assert_eq!(
            session.history(),
            &[BuildPhase::NotStarted, BuildPhase::Resolving, BuildPhase::Failed]
        );
    }

    #[test]
    fn test_base_directory_override() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("src/test/rules/b.drl");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "rule b").unwrap();

        let declaration =
            ClassDeclaration::new(vec![RuleSource::file("b.drl")]).with_base_directory("src/test/rules");
        let assembler = KnowledgeBaseAssembler::new(RuleSourceResolver::default(), SourceCollectorFactory);

        let files = assembler.resolve_all(&declaration, root.path()).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn test_complete_for_method_is_identity_by_default() {
        let assembler = linting_assembler();
        let knowledge = KnowledgeBase::new();
        let id = knowledge.id.clone();

        let refined = assembler
            .complete_for_method(knowledge, &TestMethod::new("PricingTest", "t"))
            .unwrap();

        assert_eq!(refined.id, id);
        assert!(refined.is_empty());
    }

    #[test]
    fn test_overlay_refines_per_method() {
        let root = TempDir::new().unwrap();
        write_rule(root.path(), "b.drl", "rule b");
        let declaration = ClassDeclaration::new(vec![RuleSource::file("b.drl")]);

        let assembler = KnowledgeBaseAssembler::new(RuleSourceResolver::default(), SourceCollectorFactory)
            .with_overlay(Box::new(AppendOverlay));

        let knowledge = assembler
            .build(&declaration, &TestMethod::new("PricingTest", "applies_discount"), root.path())
            .unwrap();

        assert_eq!(knowledge.len(), 2);
        assert!(knowledge.package("applies_discount").is_some());
    }

    #[test]
    fn test_session_records_success() {
        let root = TempDir::new().unwrap();
        write_rule(root.path(), "b.drl", "rule b");
        let declaration = ClassDeclaration::new(vec![RuleSource::file("b.drl")]);

        let mut session = BuildSession::new(TestMethod::new("PricingTest", "t"));
        linting_assembler()
            .build_in_session(&declaration, root.path(), &mut session)
            .unwrap();

        assert_eq!(session.phase(), BuildPhase::Succeeded);
    }

    #[test]
    fn test_every_build_is_fresh() {
        let root = TempDir::new().unwrap();
        write_rule(root.path(), "b.drl", "rule b");
        let declaration = ClassDeclaration::new(vec![RuleSource::file("b.drl")]);
        let assembler = linting_assembler();
        let method = TestMethod::new("PricingTest", "t");

        let first = assembler.build(&declaration, &method, root.path()).unwrap();
        let second = assembler.build(&declaration, &method, root.path()).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    /// Fails to read every file it is given.
    struct UnreadableBuilder;

    impl KnowledgeBuilder for UnreadableBuilder {
        fn add(&mut self, _path: &Path) -> TestfluxResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied").into())
        }

        fn diagnostics(&self) -> &[BuildDiagnostic] {
            &[]
        }

        fn into_packages(self: Box<Self>) -> Vec<KnowledgePackage> {
            Vec::new()
        }
    }

    #[test]
    fn test_compiler_io_failure_is_setup_failure() {
        let root = TempDir::new().unwrap();
        let a = write_rule(root.path(), "a.drl", "rule a");
        let assembler = KnowledgeBaseAssembler::new(RuleSourceResolver::default(), || {
            Box::new(UnreadableBuilder) as Box<dyn KnowledgeBuilder>
        });
        let declaration = ClassDeclaration::new(vec![RuleSource::file("a.drl")]);

        let err = assembler.build_for_class(&declaration, root.path()).unwrap_err();

        assert!(err.is_setup_failure());
        match &err {
            TestfluxError::Compile { path, source } => {
                assert_eq!(path, &a);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Failed to add"));
    }
}
