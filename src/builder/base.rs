//! Compiler capability consumed by the assembler.

use std::path::Path;

use crate::types::knowledge::{BuildDiagnostic, KnowledgePackage};
use crate::TestfluxResult;

/// A rule compiler scoped to one knowledge base build.
///
/// Files are added one at a time. Compile problems are accumulated as
/// diagnostics instead of being returned from [`add`](Self::add); an `Err`
/// is reserved for failures that prevent the file from being offered to the
/// compiler at all.
pub trait KnowledgeBuilder: Send {
    /// Compiles one rule source file.
    fn add(&mut self, path: &Path) -> TestfluxResult<()>;

    /// Diagnostics accumulated so far.
    fn diagnostics(&self) -> &[BuildDiagnostic];

    /// Returns true if any file failed to compile.
    fn has_diagnostics(&self) -> bool {
        !self.diagnostics().is_empty()
    }

    /// Hands over the compiled packages.
    fn into_packages(self: Box<Self>) -> Vec<KnowledgePackage>;
}

/// Creates a fresh [`KnowledgeBuilder`] for every build.
pub trait KnowledgeBuilderFactory: Send + Sync {
    /// Name of the compiler.
    fn name(&self) -> &str;

    /// Creates a new builder with no accumulated state.
    fn create(&self) -> Box<dyn KnowledgeBuilder>;
}

impl<F> KnowledgeBuilderFactory for F
where
    F: Fn() -> Box<dyn KnowledgeBuilder> + Send + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn create(&self) -> Box<dyn KnowledgeBuilder> {
        (self)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingBuilder {
        added: Vec<PathBuf>,
        diagnostics: Vec<BuildDiagnostic>,
    }

    impl KnowledgeBuilder for RecordingBuilder {
        fn add(&mut self, path: &Path) -> TestfluxResult<()> {
            self.added.push(path.to_path_buf());
            if path.ends_with("broken.drl") {
                self.diagnostics
                    .push(BuildDiagnostic::new(vec![1], "unexpected token"));
            }
            Ok(())
        }

        fn diagnostics(&self) -> &[BuildDiagnostic] {
            &self.diagnostics
        }

        fn into_packages(self: Box<Self>) -> Vec<KnowledgePackage> {
            self.added
                .into_iter()
                .map(|p| KnowledgePackage::new("pkg", p, ""))
                .collect()
        }
    }

    #[test]
    fn test_has_diagnostics_default() {
        let mut builder = RecordingBuilder::default();
        assert!(!builder.has_diagnostics());

        builder.add(Path::new("/rules/ok.drl")).unwrap();
        assert!(!builder.has_diagnostics());

        builder.add(Path::new("/rules/broken.drl")).unwrap();
        assert!(builder.has_diagnostics());
    }

    #[test]
    fn test_closure_factory_creates_fresh_builders() {
        let factory = || Box::new(RecordingBuilder::default()) as Box<dyn KnowledgeBuilder>;

        let mut first = factory.create();
        first.add(Path::new("/rules/broken.drl")).unwrap();
        let second = factory.create();

        assert_eq!(factory.name(), "custom");
        assert!(first.has_diagnostics());
        assert!(!second.has_diagnostics());
    }
}
