//! Declared build instructions of a test class.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A declared rule source: a directory or a single file, relative to the
/// base directory of the test class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSource {
    /// Directory whose rule files are all compiled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    /// Individual rule file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// What a [`RuleSource`] points at once its fields are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTarget<'a> {
    /// Compile every rule file in a directory.
    Directory(&'a str),
    /// Compile a single file.
    File(&'a str),
    /// Directory and file both given.
    Conflict {
        directory: &'a str,
        file: &'a str,
    },
    /// Nothing declared.
    Empty,
}

impl RuleSource {
    /// Declares a directory source.
    pub fn directory(directory: impl Into<String>) -> Self {
        Self {
            directory: Some(directory.into()),
            file: None,
        }
    }

    /// Declares a single-file source.
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            directory: None,
            file: Some(file.into()),
        }
    }

    /// Interprets the descriptor. Empty strings count as absent.
    pub fn target(&self) -> SourceTarget<'_> {
        let directory = present(&self.directory);
        let file = present(&self.file);

        match (directory, file) {
            (Some(directory), Some(file)) => SourceTarget::Conflict { directory, file },
            (Some(directory), None) => SourceTarget::Directory(directory),
            (None, Some(file)) => SourceTarget::File(file),
            (None, None) => SourceTarget::Empty,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.target() {
            SourceTarget::Directory(d) => write!(f, "directory '{}'", d),
            SourceTarget::File(file) => write!(f, "file '{}'", file),
            SourceTarget::Conflict { directory, file } => {
                write!(f, "directory '{}' and file '{}'", directory, file)
            }
            SourceTarget::Empty => write!(f, "empty rule source"),
        }
    }
}

/// Everything a test class declares about its rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    /// Rule sources in declaration order.
    #[serde(default)]
    pub sources: Vec<RuleSource>,

    /// Base directory override, relative to the run root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<PathBuf>,
}

impl ClassDeclaration {
    /// Creates a declaration from its sources.
    pub fn new(sources: impl IntoIterator<Item = RuleSource>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            base_directory: None,
        }
    }

    /// Sets the base directory override.
    pub fn with_base_directory(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_directory = Some(base.into());
        self
    }
}

/// Identity of the test method being set up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestMethod {
    /// Owning test class.
    pub class: String,

    /// Method name.
    pub name: String,
}

impl TestMethod {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.class, self.name)
    }
}

/// Run-wide parameters supplied by the suite configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteContext {
    /// Suite name.
    pub name: String,

    /// Root all base directories are resolved against.
    pub run_root: PathBuf,
}

impl SuiteContext {
    pub fn new(name: impl Into<String>, run_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            run_root: run_root.into(),
        }
    }

    pub fn run_root(&self) -> &Path {
        &self.run_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_directory_and_file() {
        assert_eq!(
            RuleSource::directory("rules-a").target(),
            SourceTarget::Directory("rules-a")
        );
        assert_eq!(RuleSource::file("b.drl").target(), SourceTarget::File("b.drl"));
    }

    #[test]
    fn test_target_conflict() {
        let source = RuleSource {
            directory: Some("rules-a".to_string()),
            file: Some("b.drl".to_string()),
        };

        assert_eq!(
            source.target(),
            SourceTarget::Conflict {
                directory: "rules-a",
                file: "b.drl"
            }
        );
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let source = RuleSource {
            directory: Some(String::new()),
            file: Some("b.drl".to_string()),
        };
        assert_eq!(source.target(), SourceTarget::File("b.drl"));

        assert_eq!(RuleSource::default().target(), SourceTarget::Empty);
    }

    #[test]
    fn test_display() {
        assert_eq!(RuleSource::directory("a").to_string(), "directory 'a'");
        assert_eq!(
            TestMethod::new("PricingTest", "applies_discount").to_string(),
            "PricingTest::applies_discount"
        );
    }

    #[test]
    fn test_rule_source_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            sources: Vec<RuleSource>,
        }

        let wrapper: Wrapper = toml::from_str(
            r#"
            sources = [{ directory = "rules-a" }, { file = "b.drl" }]
            "#,
        )
        .unwrap();

        assert_eq!(
            wrapper.sources,
            vec![RuleSource::directory("rules-a"), RuleSource::file("b.drl")]
        );
    }
}
