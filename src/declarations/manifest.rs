//! TOML suite manifest.
//!
//! ```toml
//! name = "pricing-suite"
//!
//! [parameters]
//! rulesRootDirectory = "/repo"
//!
//! [[classes]]
//! name = "PricingTest"
//! base_directory = "src/test/rules"
//! sources = [{ directory = "pricing" }, { file = "shared/discounts.drl" }]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::declarations::{ClassDeclaration, RuleSource, SuiteContext};
use crate::{TestfluxError, TestfluxResult};

use super::DeclarationSource;

/// Suite parameter holding the run root.
pub const RULES_ROOT_PARAMETER: &str = "rulesRootDirectory";

/// A suite definition: parameters plus per-class rule declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteManifest {
    /// Suite name.
    #[serde(default = "default_suite_name")]
    pub name: String,

    /// Suite-level parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    /// Declared test classes.
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

fn default_suite_name() -> String {
    "default".to_string()
}

/// Rule declaration of one test class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Class name.
    pub name: String,

    /// Base directory override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<PathBuf>,

    /// Rule sources in declaration order.
    #[serde(default)]
    pub sources: Vec<RuleSource>,
}

impl ClassEntry {
    pub fn declaration(&self) -> ClassDeclaration {
        ClassDeclaration {
            sources: self.sources.clone(),
            base_directory: self.base_directory.clone(),
        }
    }
}

impl SuiteManifest {
    /// Loads a manifest from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> TestfluxResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses a manifest from TOML text.
    pub fn parse(content: &str) -> TestfluxResult<Self> {
        let manifest: SuiteManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Saves the manifest as TOML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> TestfluxResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Rejects duplicate class names.
    pub fn validate(&self) -> TestfluxResult<()> {
        let mut seen = std::collections::HashSet::new();
        for class in &self.classes {
            if !seen.insert(class.name.as_str()) {
                return Err(TestfluxError::config(format!(
                    "test class '{}' is declared more than once in suite '{}'",
                    class.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Returns a suite parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// The run root given by the `rulesRootDirectory` parameter.
    pub fn run_root(&self) -> TestfluxResult<PathBuf> {
        self.parameter(RULES_ROOT_PARAMETER)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                TestfluxError::config(format!(
                    "suite '{}' does not set the '{}' parameter",
                    self.name, RULES_ROOT_PARAMETER
                ))
            })
    }

    /// Builds the suite context handed to listeners.
    pub fn suite_context(&self) -> TestfluxResult<SuiteContext> {
        Ok(SuiteContext::new(self.name.clone(), self.run_root()?))
    }

    /// Finds a class entry.
    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Class names in manifest order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.name.as_str())
    }
}

impl DeclarationSource for SuiteManifest {
    fn declaration(&self, class: &str) -> TestfluxResult<ClassDeclaration> {
        self.class(class).map(ClassEntry::declaration).ok_or_else(|| {
            TestfluxError::config(format!(
                "test class '{}' is not declared in suite '{}'",
                class, self.name
            ))
        })
    }
}
