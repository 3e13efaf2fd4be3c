//! Compiled knowledge base types.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A knowledge base handed out to test instances. Every slot bound in one
/// invocation points at the same allocation.
pub type SharedKnowledgeBase = Arc<KnowledgeBase>;

/// One compiled unit produced from a single rule source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgePackage {
    /// Package name.
    pub name: String,

    /// File the package was compiled from.
    pub source: PathBuf,

    /// Compiled form, opaque to testflux.
    pub body: String,
}

impl KnowledgePackage {
    /// Creates a new package.
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            body: body.into(),
        }
    }
}

/// Executable knowledge assembled from every declared rule source of a test
/// class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    /// Unique id of this build.
    pub id: String,

    /// When the knowledge base was assembled.
    pub built_at: DateTime<Utc>,

    packages: Vec<KnowledgePackage>,
}

impl KnowledgeBase {
    /// Creates an empty knowledge base.
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            built_at: Utc::now(),
            packages: Vec::new(),
        }
    }

    /// Adds compiled packages, keeping their order.
    pub fn add_packages(&mut self, packages: impl IntoIterator<Item = KnowledgePackage>) {
        self.packages.extend(packages);
    }

    /// Returns the packages in insertion order.
    pub fn packages(&self) -> &[KnowledgePackage] {
        &self.packages
    }

    /// Looks up a package by name.
    pub fn package(&self, name: &str) -> Option<&KnowledgePackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Returns true if the package list contains one compiled from `source`.
    pub fn contains_source(&self, source: &Path) -> bool {
        self.packages.iter().any(|p| p.source == source)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// SHA256 over package names and bodies.
    ///
    /// Two knowledge bases built from the same sources share a fingerprint
    /// even though their ids differ.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for package in &self.packages {
            hasher.update(package.name.as_bytes());
            hasher.update([0u8]);
            hasher.update(package.body.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

/// A single compiler error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDiagnostic {
    /// Affected line numbers, in the order the compiler reported them.
    pub lines: Vec<u32>,

    /// Compiler message.
    pub message: String,

    /// File the diagnostic belongs to, when known.
    pub source: Option<PathBuf>,
}

impl BuildDiagnostic {
    /// Creates a diagnostic.
    pub fn new(lines: impl Into<Vec<u32>>, message: impl Into<String>) -> Self {
        Self {
            lines: lines.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the source file.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}
