use std::path::PathBuf;

/// Failure of a single external tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The binary could not be started at all (missing, not executable, ...).
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited outside its success family.
    #[error("{tool} exited with {}: {stderr}", describe_code(.code))]
    Exit {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool reported success but its report file could not be read back.
    #[error("{tool} finished but its report '{}' could not be read: {source}", .path.display())]
    ArtifactRead {
        tool: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} did not finish within {timeout_secs}s and was killed")]
    Timeout { tool: String, timeout_secs: u64 },

    /// Waiting on the child or draining its output streams failed.
    #[error("lost contact with {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Failure of a whole scan request.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("target directory '{}' not found or not readable", .path.display())]
    TargetNotFound { path: PathBuf },

    /// One check failed, so the batch was abandoned and no report is returned.
    #[error("scan aborted on '{category}': {source}")]
    BatchAbort {
        category: String,
        #[source]
        source: ToolError,
    },

    #[error("could not prepare report directory '{}' for '{category}': {source}", .path.display())]
    ReportDir {
        category: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logging configuration search failed on '{category}': {message}")]
    LoggingConfig { category: String, message: String },
}

impl ScanError {
    /// Category the batch stopped on, when the failure belongs to one.
    pub fn category(&self) -> Option<&str> {
        match self {
            ScanError::BatchAbort { category, .. }
            | ScanError::ReportDir { category, .. }
            | ScanError::LoggingConfig { category, .. } => Some(category),
            ScanError::TargetNotFound { .. } => None,
        }
    }
}
