pub mod invoker;

use serde::{Deserialize, Serialize};
use std::fmt;

/// External analysis tools the scanner knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Semgrep,
    Checkov,
    Tfsec,
    Snyk,
    Gitleaks,
}

/// Convention families sharing exit-code and output-location semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolFamily {
    PatternScanner,
    InfraAsCode,
    DependencyScanner,
    SecretDetector,
}

/// Where a tool leaves the text we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputLocation {
    Stdout,
    /// A report file whose path the scanner passes in through `{report}`.
    ReportFile,
}

/// How to interpret a finished process of a given tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPolicy {
    pub family: ToolFamily,
    pub success_codes: &'static [i32],
    pub output: OutputLocation,
}

impl ExitPolicy {
    pub fn is_success(&self, code: Option<i32>) -> bool {
        code.is_some_and(|code| self.success_codes.contains(&code))
    }
}

pub const ALL_TOOLS: &[ToolKind] = &[
    ToolKind::Semgrep,
    ToolKind::Checkov,
    ToolKind::Tfsec,
    ToolKind::Snyk,
    ToolKind::Gitleaks,
];

impl ToolKind {
    /// Binary name looked up on `PATH` (or under the configured tool dir).
    pub fn binary(&self) -> &'static str {
        match self {
            ToolKind::Semgrep => "semgrep",
            ToolKind::Checkov => "checkov",
            ToolKind::Tfsec => "tfsec",
            ToolKind::Snyk => "snyk",
            ToolKind::Gitleaks => "gitleaks",
        }
    }

    /// Exit-code policy table.
    ///
    /// snyk signals "vulnerabilities found" with 64 and gitleaks signals
    /// "leaks found" with 1; neither is a tool error.
    pub fn policy(&self) -> ExitPolicy {
        match self {
            ToolKind::Semgrep => ExitPolicy {
                family: ToolFamily::PatternScanner,
                success_codes: &[0],
                output: OutputLocation::Stdout,
            },
            ToolKind::Checkov | ToolKind::Tfsec => ExitPolicy {
                family: ToolFamily::InfraAsCode,
                success_codes: &[0],
                output: OutputLocation::Stdout,
            },
            ToolKind::Snyk => ExitPolicy {
                family: ToolFamily::DependencyScanner,
                success_codes: &[0, 64],
                output: OutputLocation::Stdout,
            },
            ToolKind::Gitleaks => ExitPolicy {
                family: ToolFamily::SecretDetector,
                success_codes: &[0, 1],
                output: OutputLocation::ReportFile,
            },
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}
