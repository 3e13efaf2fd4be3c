//! Rule source resolution.
//!
//! Turns a declared [`RuleSource`] into the absolute paths of the rule files
//! it stands for:
//!
//! - a directory source expands to every regular file directly inside the
//!   directory carrying the rule extension (non-recursive, sorted by name)
//! - a file source expands to that one file
//!
//! Both forms are resolved as `run_root / base_directory / <declared path>`
//! and checked against the filesystem before anything is compiled. Declared
//! paths are always nested under their parent, even when written as
//! absolute paths.

use std::path::{Component, Path, PathBuf};

use tracing::Span;

use crate::types::config::{ConflictPolicy, RulesConfig};
use crate::types::declarations::{RuleSource, SourceTarget};
use crate::types::errors::ResolutionErrorKind;
use crate::{TestfluxError, TestfluxResult};

/// Resolves declared rule sources to validated file locations.
#[derive(Debug, Clone)]
pub struct RuleSourceResolver {
    default_base: PathBuf,
    extension: String,
    conflict_policy: ConflictPolicy,
    span: Span,
}

impl RuleSourceResolver {
    /// Creates a resolver from the rules configuration.
    pub fn new(config: &RulesConfig) -> Self {
        Self {
            default_base: config.base_directory.clone(),
            extension: config.extension.clone(),
            conflict_policy: config.conflict_policy,
            span: tracing::debug_span!("resolver"),
        }
    }

    /// Logs inside `span` instead of the resolver's own.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Extension of the files picked up from directories.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the absolute base directory for a class.
    ///
    /// The class override wins over the configured default; either one is
    /// nested under `run_root`.
    pub fn base_directory(
        &self,
        run_root: &Path,
        base_override: Option<&Path>,
    ) -> TestfluxResult<PathBuf> {
        let base = base_override.unwrap_or(&self.default_base);
        Ok(std::path::absolute(nest(run_root, base))?)
    }

    /// Resolves one descriptor.
    ///
    /// Returns the files in a stable order. An empty descriptor, or a
    /// conflicting one under [`ConflictPolicy::Skip`], yields no files.
    pub fn resolve(
        &self,
        source: &RuleSource,
        base_override: Option<&Path>,
        run_root: &Path,
    ) -> TestfluxResult<Vec<PathBuf>> {
        let _guard = self.span.enter();

        match source.target() {
            SourceTarget::Conflict { directory, file } => match self.conflict_policy {
                ConflictPolicy::Reject => Err(TestfluxError::config(format!(
                    "conflicting source specification: a rule source cannot name both directory '{}' and file '{}'",
                    directory, file
                ))),
                ConflictPolicy::Skip => {
                    tracing::warn!(
                        directory,
                        file,
                        "Rule source names both a directory and a file, skipping"
                    );
                    Ok(Vec::new())
                }
            },
            SourceTarget::Directory(directory) => {
                let base = self.base_directory(run_root, base_override)?;
                self.resolve_directory(&nest(&base, Path::new(directory)))
            }
            SourceTarget::File(file) => {
                let base = self.base_directory(run_root, base_override)?;
                let path = nest(&base, Path::new(file));
                ensure_regular_file(&path)?;
                tracing::debug!(path = %path.display(), "Resolved rule file");
                Ok(vec![path])
            }
            SourceTarget::Empty => {
                tracing::debug!("Empty rule source, nothing to resolve");
                Ok(Vec::new())
            }
        }
    }

    fn resolve_directory(&self, directory: &Path) -> TestfluxResult<Vec<PathBuf>> {
        if !directory.exists() {
            return Err(TestfluxError::resolution(
                ResolutionErrorKind::DirectoryMissing,
                directory,
            ));
        }
        if !directory.is_dir() {
            return Err(TestfluxError::resolution(
                ResolutionErrorKind::NotADirectory,
                directory,
            ));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_file() && self.has_rule_extension(&path) {
                files.push(path);
            }
        }
        files.sort();

        tracing::debug!(
            directory = %directory.display(),
            files = files.len(),
            "Resolved rule directory"
        );

        Ok(files)
    }

    fn has_rule_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}

impl Default for RuleSourceResolver {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

/// Appends `child` to `parent`, dropping any root or drive prefix of
/// `child` so the result never leaves `parent` through an absolute path.
fn nest(parent: &Path, child: &Path) -> PathBuf {
    let mut nested = parent.to_path_buf();
    for component in child.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Normal(_) => nested.push(component),
        }
    }
    nested
}

fn ensure_regular_file(path: &Path) -> TestfluxResult<()> {
    if !path.exists() {
        return Err(TestfluxError::resolution(
            ResolutionErrorKind::FileNotFound,
            path,
        ));
    }
    if !path.is_file() {
        return Err(TestfluxError::resolution(
            ResolutionErrorKind::NotARegularFile,
            path,
        ));
    }
    Ok(())
}
