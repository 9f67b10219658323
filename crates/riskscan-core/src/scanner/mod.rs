pub mod lock;
pub mod report;

use crate::checks::{self, logging_config, CheckStep, Resolution, RiskCheck, ToolStep};
use crate::config::{FailurePolicy, ScannerConfig};
use crate::error::ScanError;
use crate::extract;
use crate::tools::invoker::{Invocation, ToolInvoker};
use chrono::Utc;
use lock::TargetLocks;
use report::{CategoryResult, Outcome, ScanReport};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Runs requested risk checks against a target directory, one after another.
///
/// Checks never run concurrently within a scan. Under the default
/// [`FailurePolicy::FailFast`] the first failing check aborts the batch and
/// every result gathered so far is dropped.
#[derive(Debug)]
pub struct ScanOrchestrator {
    config: ScannerConfig,
    invoker: ToolInvoker,
    locks: TargetLocks,
}

impl ScanOrchestrator {
    pub fn new(config: ScannerConfig) -> Self {
        let invoker = ToolInvoker::new(config.timeout());
        Self {
            config,
            invoker,
            locks: TargetLocks::default(),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan `target` for each category label, in the order given.
    ///
    /// Unknown labels get the [`checks::UNKNOWN_RISK`] placeholder and never
    /// stop the batch. Repeated labels are scanned once.
    pub async fn run_scan<S: AsRef<str>>(
        &self,
        target: &Path,
        categories: &[S],
    ) -> Result<ScanReport, ScanError> {
        let target = validate_target(target).await?;
        let _guard = self.locks.acquire(&target).await;

        let policy = self.config.failure_policy;
        let started_at = Utc::now();
        tracing::info!(
            target = %target.display(),
            categories = categories.len(),
            ?policy,
            "starting scan"
        );

        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for category in categories {
            let label: &str = category.as_ref();
            if !seen.insert(label) {
                tracing::debug!(category = label, "skipping repeated category");
                continue;
            }

            let outcome = match checks::resolve(label) {
                Resolution::Unknown => {
                    tracing::warn!(category = label, "unknown risk category");
                    Outcome::Completed(checks::UNKNOWN_RISK.to_string())
                }
                Resolution::Known(check) => match self.run_check(&target, check).await {
                    Ok(text) => Outcome::Completed(text),
                    Err(error) => match policy {
                        FailurePolicy::FailFast => {
                            tracing::error!(category = label, %error, "aborting scan");
                            return Err(error);
                        }
                        FailurePolicy::CollectAll => {
                            tracing::warn!(category = label, %error, "check failed, continuing");
                            Outcome::Failed(failure_detail(&error))
                        }
                    },
                },
            };

            results.push(CategoryResult {
                category: label.to_string(),
                outcome,
            });
        }

        let report = ScanReport {
            target,
            started_at,
            finished_at: Utc::now(),
            failure_policy: policy,
            results,
        };
        tracing::info!(
            categories = report.len(),
            failed = report.failures().count(),
            duration_secs = report.duration_secs(),
            "scan finished"
        );
        Ok(report)
    }

    /// Run every step of one category and join their results.
    async fn run_check(&self, target: &Path, check: &RiskCheck) -> Result<String, ScanError> {
        let mut parts = Vec::with_capacity(check.steps.len());

        for step in check.steps {
            let text = match step {
                CheckStep::Tool(step) => {
                    let invocation = self.prepare(target, check.label, step).await?;
                    let raw = self.invoker.invoke(&invocation).await.map_err(|source| {
                        ScanError::BatchAbort {
                            category: check.label.to_string(),
                            source,
                        }
                    })?;
                    extract::normalize(&raw, step.markers.as_ref())
                }
                CheckStep::LoggingConfig => detect_logging_config(target, check.label).await?,
            };
            parts.push(text);
        }

        Ok(parts.join(checks::RESULT_SEPARATOR))
    }

    async fn prepare(
        &self,
        target: &Path,
        category: &str,
        step: &ToolStep,
    ) -> Result<Invocation, ScanError> {
        let report_path = if step.writes_report() {
            let path = self.report_path(target, step);
            if let Some(parent) = path.parent() {
                create_private_dir(parent)
                    .await
                    .map_err(|source| ScanError::ReportDir {
                        category: category.to_string(),
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            Some(path)
        } else {
            None
        };

        Ok(Invocation {
            tool: step.tool,
            program: self.config.program(step.tool),
            args: step.render_args(target, report_path.as_deref()),
            working_dir: target.to_path_buf(),
            report_path,
            policy: step.tool.policy(),
        })
    }

    /// `<report_dir>/<target name>-<path hash>/<step id>.json`
    ///
    /// The hash keeps same-named repositories in different parents apart, so
    /// the per-target lock is enough to keep report files single-writer.
    pub fn report_path(&self, target: &Path, step: &ToolStep) -> PathBuf {
        let repo = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        let mut hasher = DefaultHasher::new();
        target.hash(&mut hasher);
        self.config
            .report_dir
            .join(format!("{repo}-{:016x}", hasher.finish()))
            .join(format!("{}.json", step.id))
    }
}

async fn validate_target(target: &Path) -> Result<PathBuf, ScanError> {
    let not_found = || ScanError::TargetNotFound {
        path: target.to_path_buf(),
    };

    let canonical = tokio::fs::canonicalize(target).await.map_err(|_| not_found())?;
    let metadata = tokio::fs::metadata(&canonical).await.map_err(|_| not_found())?;
    if !metadata.is_dir() {
        return Err(not_found());
    }
    let entries = tokio::fs::read_dir(&canonical).await.map_err(|_| not_found())?;
    drop(entries);
    Ok(canonical)
}

/// Report directories are owner-only: secret-detector reports carry raw secrets.
async fn create_private_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(path).await?;

    // An existing directory keeps whatever mode it was created with.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).await?;
    }
    Ok(())
}

async fn detect_logging_config(target: &Path, category: &str) -> Result<String, ScanError> {
    let root = target.to_path_buf();
    let search_error = |message: String| ScanError::LoggingConfig {
        category: category.to_string(),
        message,
    };

    tokio::task::spawn_blocking(move || logging_config::detect(&root))
        .await
        .map_err(|e| search_error(e.to_string()))?
        .map_err(|e| search_error(format!("{e:#}")))
}

/// Error text stored against a category in a collect-all report.
fn failure_detail(error: &ScanError) -> String {
    match error {
        ScanError::BatchAbort { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}
