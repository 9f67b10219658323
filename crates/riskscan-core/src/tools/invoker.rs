use super::{ExitPolicy, OutputLocation, ToolKind};
use crate::error::ToolError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// One fully resolved external command, ready to run against a target.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool: ToolKind,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Set for tools whose findings land in a report file.
    pub report_path: Option<PathBuf>,
    pub policy: ExitPolicy,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Everything a finished process left behind.
#[derive(Debug, Clone)]
pub struct RawToolResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

/// Runs external tools and applies their exit-code policy.
#[derive(Debug, Clone, Default)]
pub struct ToolInvoker {
    timeout: Option<Duration>,
}

impl ToolInvoker {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run the tool and return the text its findings live in: captured stdout
    /// for stream tools, the whole report file for file-based tools.
    pub async fn invoke(&self, invocation: &Invocation) -> Result<String, ToolError> {
        if let Some(path) = &invocation.report_path {
            // A stale report from an earlier run must never pass for this one.
            if let Err(source) = tokio::fs::remove_file(path).await {
                if source.kind() != std::io::ErrorKind::NotFound {
                    return Err(ToolError::ArtifactRead {
                        tool: invocation.tool.to_string(),
                        path: path.clone(),
                        source,
                    });
                }
            }
        }

        let raw = self.run(invocation).await?;
        let tool = invocation.tool.to_string();

        if !invocation.policy.is_success(raw.exit_code) {
            tracing::warn!(
                tool = %tool,
                exit_code = ?raw.exit_code,
                "tool exited outside its success codes"
            );
            let stderr = if raw.stderr.trim().is_empty() {
                raw.stdout.trim().to_string()
            } else {
                raw.stderr.trim().to_string()
            };
            return Err(ToolError::Exit {
                tool,
                code: raw.exit_code,
                stderr,
            });
        }

        match (invocation.policy.output, &invocation.report_path) {
            (OutputLocation::ReportFile, Some(path)) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|source| {
                    ToolError::ArtifactRead {
                        tool: tool.clone(),
                        path: path.clone(),
                        source,
                    }
                })?;
                // Reports hold raw secrets; nothing reads them twice.
                if let Err(error) = tokio::fs::remove_file(path).await {
                    tracing::warn!(
                        tool = %tool,
                        path = %path.display(),
                        %error,
                        "could not remove report"
                    );
                }
                Ok(text)
            }
            (OutputLocation::ReportFile, None) => Err(ToolError::ArtifactRead {
                tool,
                path: PathBuf::new(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "no report path was supplied",
                ),
            }),
            (OutputLocation::Stdout, _) => Ok(raw.stdout),
        }
    }

    /// First line a tool prints for `--version`.
    pub async fn version(&self, tool: ToolKind, program: &Path) -> Result<String, ToolError> {
        let invocation = Invocation {
            tool,
            program: program.to_path_buf(),
            args: vec!["--version".to_string()],
            working_dir: std::env::temp_dir(),
            report_path: None,
            policy: ExitPolicy {
                success_codes: &[0],
                output: OutputLocation::Stdout,
                ..tool.policy()
            },
        };
        let stdout = self.invoke(&invocation).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("unknown")
            .to_string())
    }

    /// Spawn, wait for exit and drain both streams in full.
    pub async fn run(&self, invocation: &Invocation) -> Result<RawToolResult, ToolError> {
        let tool = invocation.tool.to_string();
        tracing::debug!(
            tool = %tool,
            cwd = %invocation.working_dir.display(),
            command = %invocation.command_line(),
            "spawning tool"
        );

        let start = Instant::now();
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program.display().to_string(),
                source,
            })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                // The child went down with the dropped future.
                Err(_) => {
                    tracing::warn!(tool = %tool, timeout_secs = limit.as_secs(), "tool timed out");
                    return Err(ToolError::Timeout {
                        tool,
                        timeout_secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|source| ToolError::Wait {
            tool: tool.clone(),
            source,
        })?;

        let result = RawToolResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            duration: start.elapsed(),
        };

        tracing::info!(
            tool = %tool,
            exit_code = ?result.exit_code,
            elapsed_ms = result.duration.as_millis() as u64,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "tool finished"
        );

        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::tools::ToolKind;

    fn sh(tool: ToolKind, script: &str, dir: &Path, report: Option<PathBuf>) -> Invocation {
        Invocation {
            tool,
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            working_dir: dir.to_path_buf(),
            report_path: report,
            policy: tool.policy(),
        }
    }

    #[tokio::test]
    async fn test_stdout_returned_on_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh(ToolKind::Semgrep, "echo findings; echo noise >&2", dir.path(), None);
        let out = ToolInvoker::default().invoke(&inv).await.unwrap();
        assert_eq!(out.trim(), "findings");
    }

    #[tokio::test]
    async fn test_dependency_scanner_exit_64_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh(
            ToolKind::Snyk,
            "echo 'Issues to fix'; echo 'deprecated flag' >&2; exit 64",
            dir.path(),
            None,
        );
        let out = ToolInvoker::default().invoke(&inv).await.unwrap();
        assert!(out.contains("Issues to fix"));
    }

    #[tokio::test]
    async fn test_non_success_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh(ToolKind::Semgrep, "echo 'bad rules' >&2; exit 2", dir.path(), None);
        match ToolInvoker::default().invoke(&inv).await {
            Err(ToolError::Exit { code, stderr, .. }) => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "bad rules");
            }
            other => panic!("expected exit failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut inv = sh(ToolKind::Tfsec, "true", dir.path(), None);
        inv.program = PathBuf::from("/definitely/not/a/real/tfsec");
        assert!(matches!(
            ToolInvoker::default().invoke(&inv).await,
            Err(ToolError::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn test_report_file_read_after_leaks_found() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("gitleaks.json");
        let script = format!("echo '[{{\"RuleID\":\"aws\"}}]' > {}; exit 1", report.display());
        let inv = sh(ToolKind::Gitleaks, &script, dir.path(), Some(report.clone()));
        let out = ToolInvoker::default().invoke(&inv).await.unwrap();
        assert!(out.contains("\"RuleID\":\"aws\""));
        assert!(!report.exists());
    }

    #[tokio::test]
    async fn test_missing_report_is_artifact_failure() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("never-written.json");
        let inv = sh(ToolKind::Gitleaks, "exit 0", dir.path(), Some(report));
        assert!(matches!(
            ToolInvoker::default().invoke(&inv).await,
            Err(ToolError::ArtifactRead { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_report_is_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("gitleaks.json");
        std::fs::write(&report, "old run").unwrap();
        let inv = sh(ToolKind::Gitleaks, "exit 0", dir.path(), Some(report));
        assert!(ToolInvoker::default().invoke(&inv).await.is_err());
    }

    #[tokio::test]
    async fn test_uncleared_stale_report_is_artifact_failure() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("gitleaks.json");
        std::fs::create_dir(&report).unwrap();
        std::fs::write(report.join("leftover"), "old run").unwrap();
        let marker = dir.path().join("ran");
        let script = format!("touch {}; exit 0", marker.display());
        let inv = sh(ToolKind::Gitleaks, &script, dir.path(), Some(report));
        assert!(matches!(
            ToolInvoker::default().invoke(&inv).await,
            Err(ToolError::ArtifactRead { .. })
        ));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_version_reads_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("tfsec");
        std::fs::write(&fake, "#!/bin/sh\necho\necho 'v1.28.4'\necho extra\n").unwrap();
        std::fs::set_permissions(&fake, std::os::unix::fs::PermissionsExt::from_mode(0o755))
            .unwrap();
        let version = ToolInvoker::default()
            .version(ToolKind::Tfsec, &fake)
            .await
            .unwrap();
        assert_eq!(version, "v1.28.4");
    }

    #[tokio::test]
    async fn test_hung_tool_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh(ToolKind::Checkov, "sleep 5", dir.path(), None);
        let invoker = ToolInvoker::new(Some(Duration::from_millis(200)));
        assert!(matches!(
            invoker.invoke(&inv).await,
            Err(ToolError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_large_output_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh(
            ToolKind::Semgrep,
            "i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done",
            dir.path(),
            None,
        );
        let out = ToolInvoker::default().invoke(&inv).await.unwrap();
        assert_eq!(out.lines().count(), 20000);
        assert!(out.ends_with("line-19999\n"));
    }
}
