//! testflux CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::assembler::KnowledgeBaseAssembler;
use crate::builder::SourceCollectorFactory;
use crate::declarations::{ClassEntry, SuiteManifest, RULES_ROOT_PARAMETER};
use crate::types::config::Config;
use crate::types::declarations::RuleSource;
use crate::{TestfluxError, TestfluxResult};

/// File name of the example manifest written by `init`.
const EXAMPLE_MANIFEST: &str = "testflux-suite.toml";

/// Writes a default configuration and an example suite manifest.
pub async fn init(path: Option<PathBuf>) -> TestfluxResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("testflux.toml");
    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
    } else {
        Config::default_config().save(&config_path)?;
        println!("Configuration created at: {}", config_path.display());
    }

    let manifest_path = target_dir.join(EXAMPLE_MANIFEST);
    if manifest_path.exists() {
        println!("Suite manifest already exists at: {}", manifest_path.display());
    } else {
        example_manifest().save(&manifest_path)?;
        println!("Suite manifest created at: {}", manifest_path.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Declare your test classes in {}", EXAMPLE_MANIFEST);
    println!("  2. Check what they resolve to: testflux resolve {}", EXAMPLE_MANIFEST);
    println!("  3. Build the knowledge bases: testflux build {}", EXAMPLE_MANIFEST);

    Ok(())
}

fn example_manifest() -> SuiteManifest {
    let mut manifest = SuiteManifest {
        name: "example".to_string(),
        ..SuiteManifest::default()
    };
    manifest
        .parameters
        .insert(RULES_ROOT_PARAMETER.to_string(), ".".to_string());
    manifest.classes.push(ClassEntry {
        name: "ExampleRulesTest".to_string(),
        base_directory: None,
        sources: vec![RuleSource::directory("example")],
    });
    manifest
}

/// Shows the version.
pub fn version() {
    println!("testflux {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Rule knowledge bases for test suites");
}

/// Per-class result printed by `resolve` and `build`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub class: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassReport {
    fn failed(class: &str, error: &TestfluxError) -> Self {
        Self {
            class: class.to_string(),
            ok: false,
            files: Vec::new(),
            packages: None,
            fingerprint: None,
            error: Some(error.to_string()),
        }
    }
}

/// Loaded manifest plus the absolute run root.
struct Suite {
    manifest: SuiteManifest,
    run_root: PathBuf,
}

/// Loads a manifest. A relative run root is taken relative to the
/// manifest's directory.
fn load_suite(manifest_path: &Path) -> TestfluxResult<Suite> {
    let manifest = SuiteManifest::load(manifest_path)?;
    let manifest_dir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let run_root = std::path::absolute(manifest_dir.join(manifest.run_root()?))?;

    tracing::debug!(
        suite = %manifest.name,
        run_root = %run_root.display(),
        classes = manifest.classes.len(),
        "Suite manifest loaded"
    );

    Ok(Suite { manifest, run_root })
}

fn selected_classes(manifest: &SuiteManifest, class: Option<&str>) -> TestfluxResult<Vec<ClassEntry>> {
    match class {
        Some(name) => manifest
            .class(name)
            .cloned()
            .map(|entry| vec![entry])
            .ok_or_else(|| {
                TestfluxError::config(format!(
                    "test class '{}' is not declared in suite '{}'",
                    name, manifest.name
                ))
            }),
        None => Ok(manifest.classes.clone()),
    }
}

/// Lists the rule files each class resolves to.
pub async fn resolve(
    manifest_path: &Path,
    class: Option<&str>,
    json: bool,
    config: &Config,
) -> TestfluxResult<()> {
    let suite = load_suite(manifest_path)?;
    let assembler = KnowledgeBaseAssembler::from_config(config, SourceCollectorFactory);

    let reports: Vec<ClassReport> = selected_classes(&suite.manifest, class)?
        .iter()
        .map(|entry| match assembler.resolve_all(&entry.declaration(), &suite.run_root) {
            Ok(files) => ClassReport {
                class: entry.name.clone(),
                ok: true,
                files,
                packages: None,
                fingerprint: None,
                error: None,
            },
            Err(err) => ClassReport::failed(&entry.name, &err),
        })
        .collect();

    print_reports(&reports, json, |report| {
        for file in &report.files {
            println!("    {}", file.display());
        }
    })?;

    ensure_all_ok(&reports, "resolve")
}

/// Builds the knowledge base of each class, in parallel.
pub async fn build(
    manifest_path: &Path,
    class: Option<&str>,
    json: bool,
    config: &Config,
) -> TestfluxResult<()> {
    let suite = load_suite(manifest_path)?;
    let entries = selected_classes(&suite.manifest, class)?;
    let assembler = Arc::new(KnowledgeBaseAssembler::from_config(
        config,
        SourceCollectorFactory,
    ));

    let reports = build_all(
        assembler,
        entries,
        Arc::new(suite.run_root),
        Duration::from_secs(config.general.timeout_secs),
    )
    .await;

    print_reports(&reports, json, |report| {
        if let (Some(packages), Some(fingerprint)) = (report.packages, &report.fingerprint) {
            println!("    {} package(s), fingerprint {}", packages, fingerprint);
        }
    })?;

    ensure_all_ok(&reports, "build")
}

/// Builds every entry on a blocking worker. Each build gets its own
/// `timeout`, counted from the moment it is spawned. Reports keep the order
/// of `entries`.
pub async fn build_all(
    assembler: Arc<KnowledgeBaseAssembler>,
    entries: Vec<ClassEntry>,
    run_root: Arc<PathBuf>,
    timeout: Duration,
) -> Vec<ClassReport> {
    let handles: Vec<_> = entries
        .into_iter()
        .map(|entry| {
            let assembler = Arc::clone(&assembler);
            let run_root = Arc::clone(&run_root);
            let name = entry.name.clone();
            let task_name = name.clone();
            let handle = tokio::spawn(async move {
                let build = tokio::task::spawn_blocking(move || {
                    assembler.build_for_class(&entry.declaration(), &run_root)
                });
                match tokio::time::timeout(timeout, build).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(join_error)) => Err(TestfluxError::other(format!(
                        "build task for '{}' failed: {}",
                        task_name, join_error
                    ))),
                    Err(_) => Err(TestfluxError::Timeout(task_name)),
                }
            });
            (name, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let outcome = handle.await.unwrap_or_else(|join_error| {
            Err(TestfluxError::other(format!(
                "build task for '{}' failed: {}",
                name, join_error
            )))
        });

        let report = match outcome {
            Ok(knowledge) => ClassReport {
                class: name,
                ok: true,
                files: knowledge.packages().iter().map(|p| p.source.clone()).collect(),
                packages: Some(knowledge.len()),
                fingerprint: Some(knowledge.fingerprint()),
                error: None,
            },
            Err(err) => {
                tracing::warn!(class = %name, error = %err, "Build failed");
                ClassReport::failed(&name, &err)
            }
        };
        reports.push(report);
    }

    reports
}

fn print_reports(
    reports: &[ClassReport],
    json: bool,
    details: impl Fn(&ClassReport),
) -> TestfluxResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    for report in reports {
        if report.ok {
            println!("✓ {}", report.class);
            details(report);
        } else {
            println!("✗ {}", report.class);
            if let Some(error) = &report.error {
                for line in error.lines() {
                    println!("    {}", line);
                }
            }
        }
    }

    Ok(())
}

fn ensure_all_ok(reports: &[ClassReport], action: &str) -> TestfluxResult<()> {
    let failed = reports.iter().filter(|r| !r.ok).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(TestfluxError::other(format!(
            "{} of {} test class(es) failed to {}",
            failed,
            reports.len(),
            action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::KnowledgeBuilder;
    use crate::resolver::RuleSourceResolver;
    use crate::types::knowledge::{BuildDiagnostic, KnowledgePackage};
    use std::fs;
    use tempfile::TempDir;

    fn entry(name: &str, sources: Vec<RuleSource>) -> ClassEntry {
        ClassEntry {
            name: name.to_string(),
            base_directory: None,
            sources,
        }
    }

    #[tokio::test]
    async fn test_build_all_keeps_order_and_reports_failures() {
        let root = TempDir::new().unwrap();
        let rules = root.path().join("src/main/rules");
        fs::create_dir_all(&rules).unwrap();
        fs::write(rules.join("a.drl"), "rule a").unwrap();

        let assembler = Arc::new(KnowledgeBaseAssembler::from_config(
            &Config::default(),
            SourceCollectorFactory,
        ));
        let reports = build_all(
            assembler,
            vec![
                entry("GoodTest", vec![RuleSource::file("a.drl")]),
                entry("BadTest", vec![RuleSource::directory("missing")]),
            ],
            Arc::new(root.path().to_path_buf()),
            Duration::from_secs(10),
        )
        .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].class, "GoodTest");
        assert!(reports[0].ok);
        assert_eq!(reports[0].packages, Some(1));
        assert!(!reports[1].ok);
        assert!(reports[1].error.as_deref().unwrap().contains("directory missing"));
        assert!(ensure_all_ok(&reports, "build").is_err());
    }

    /// Sleeps for the number of milliseconds written in each rule file.
    struct SleepingBuilder {
        packages: Vec<KnowledgePackage>,
    }

    impl KnowledgeBuilder for SleepingBuilder {
        fn add(&mut self, path: &Path) -> TestfluxResult<()> {
            let body = fs::read_to_string(path)?;
            let millis: u64 = body.trim().parse().unwrap_or(0);
            std::thread::sleep(Duration::from_millis(millis));
            self.packages.push(KnowledgePackage::new("sleep", path, body));
            Ok(())
        }

        fn diagnostics(&self) -> &[BuildDiagnostic] {
            &[]
        }

        fn into_packages(self: Box<Self>) -> Vec<KnowledgePackage> {
            self.packages
        }
    }

    #[tokio::test]
    async fn test_build_all_times_out_each_build_from_its_start() {
        let root = TempDir::new().unwrap();
        let rules = root.path().join("src/main/rules");
        fs::create_dir_all(&rules).unwrap();
        fs::write(rules.join("quick.drl"), "700").unwrap();
        fs::write(rules.join("slow.drl"), "1300").unwrap();

        let assembler = Arc::new(KnowledgeBaseAssembler::new(
            RuleSourceResolver::default(),
            || Box::new(SleepingBuilder { packages: Vec::new() }) as Box<dyn KnowledgeBuilder>,
        ));
        let reports = build_all(
            assembler,
            vec![
                entry("QuickTest", vec![RuleSource::file("quick.drl")]),
                entry("SlowTest", vec![RuleSource::file("slow.drl")]),
            ],
            Arc::new(root.path().to_path_buf()),
            Duration::from_millis(1000),
        )
        .await;

        assert!(reports[0].ok);
        assert!(!reports[1].ok);
        assert!(reports[1].error.as_deref().unwrap().contains("Timed out building 'SlowTest'"));
    }

    #[test]
    fn test_load_suite_resolves_relative_root() {
        let dir = TempDir::new().unwrap();
        let manifest_path = dir.path().join("suite.toml");
        fs::write(
            &manifest_path,
            "[parameters]\nrulesRootDirectory = \"project\"\n",
        )
        .unwrap();

        let suite = load_suite(&manifest_path).unwrap();
        assert_eq!(suite.run_root, dir.path().join("project"));
    }

    #[test]
    fn test_selected_class_unknown() {
        let manifest = example_manifest();
        assert!(selected_classes(&manifest, Some("Nope")).is_err());
        assert_eq!(selected_classes(&manifest, None).unwrap().len(), 1);
    }
}
