//! Where test classes declare their rule sources.
//!
//! The rule listener never inspects test types for metadata itself; it asks
//! a [`DeclarationSource`]. Two are provided:
//!
//! - [`DeclarationRegistry`]: declarations registered in code
//! - [`SuiteManifest`]: declarations and suite parameters read from TOML

mod manifest;

pub use manifest::{ClassEntry, SuiteManifest, RULES_ROOT_PARAMETER};

use std::collections::HashMap;

use crate::types::declarations::ClassDeclaration;
use crate::{TestfluxError, TestfluxResult};

/// Supplies the declared build instructions of test classes.
pub trait DeclarationSource: Send + Sync {
    /// Returns the declaration of `class`.
    fn declaration(&self, class: &str) -> TestfluxResult<ClassDeclaration>;
}

/// In-memory declarations keyed by class name.
#[derive(Debug, Clone, Default)]
pub struct DeclarationRegistry {
    classes: HashMap<String, ClassDeclaration>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `class`, replacing any previous declaration.
    pub fn declare(&mut self, class: impl Into<String>, declaration: ClassDeclaration) -> &mut Self {
        self.classes.insert(class.into(), declaration);
        self
    }

    /// Builder-style [`declare`](Self::declare).
    pub fn with_class(mut self, class: impl Into<String>, declaration: ClassDeclaration) -> Self {
        self.declare(class, declaration);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl DeclarationSource for DeclarationRegistry {
    fn declaration(&self, class: &str) -> TestfluxResult<ClassDeclaration> {
        self.classes.get(class).cloned().ok_or_else(|| {
            TestfluxError::config(format!("no rule sources declared for test class '{}'", class))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::declarations::RuleSource;

    #[test]
    fn test_registry_lookup() {
        let registry = DeclarationRegistry::new().with_class(
            "PricingTest",
            ClassDeclaration::new(vec![RuleSource::directory("pricing")]),
        );

        let declaration = registry.declaration("PricingTest").unwrap();
        assert_eq!(declaration.sources, vec![RuleSource::directory("pricing")]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_unknown_class() {
        let registry = DeclarationRegistry::new();

        let err = registry.declaration("Missing").unwrap_err();
        assert!(matches!(err, TestfluxError::Configuration(_)));
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_declare_replaces() {
        let mut registry = DeclarationRegistry::new();
        registry
            .declare("PricingTest", ClassDeclaration::default())
            .declare(
                "PricingTest",
                ClassDeclaration::new(vec![RuleSource::file("b.drl")]),
            );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.declaration("PricingTest").unwrap().sources.len(), 1);
    }
}
