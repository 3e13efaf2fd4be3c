//! Pass-through builder that packages rule sources without compiling them.

use std::path::Path;

use crate::types::knowledge::{BuildDiagnostic, KnowledgePackage};
use crate::TestfluxResult;

use super::base::{KnowledgeBuilder, KnowledgeBuilderFactory};

/// Collects each rule source into a package named after its file stem.
///
/// The rule language is not interpreted. The only diagnostic produced is for
/// content that is not valid UTF-8, reported on the line of the first
/// offending byte.
#[derive(Debug, Default)]
pub struct SourceCollector {
    packages: Vec<KnowledgePackage>,
    diagnostics: Vec<BuildDiagnostic>,
}

impl SourceCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KnowledgeBuilder for SourceCollector {
    fn add(&mut self, path: &Path) -> TestfluxResult<()> {
        let bytes = std::fs::read(path)?;

        match String::from_utf8(bytes) {
            Ok(body) => {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::trace!(package = %name, bytes = body.len(), "Collected rule source");
                self.packages.push(KnowledgePackage::new(name, path, body));
            }
            Err(err) => {
                let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
                let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
                self.diagnostics.push(
                    BuildDiagnostic::new(
                        vec![u32::try_from(line).unwrap_or(u32::MAX)],
                        "rule source is not valid UTF-8",
                    )
                    .with_source(path),
                );
            }
        }

        Ok(())
    }

    fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    fn into_packages(self: Box<Self>) -> Vec<KnowledgePackage> {
        self.packages
    }
}

/// Factory for [`SourceCollector`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceCollectorFactory;

impl KnowledgeBuilderFactory for SourceCollectorFactory {
    fn name(&self) -> &str {
        "source-collector"
    }

    fn create(&self) -> Box<dyn KnowledgeBuilder> {
        Box::new(SourceCollector::new())
    }
}
