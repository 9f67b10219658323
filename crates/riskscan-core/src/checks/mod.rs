pub mod logging_config;

use crate::extract::Markers;
use crate::tools::ToolKind;
use std::path::Path;

/// Stored for any label the registry does not know.
pub const UNKNOWN_RISK: &str = "Unknown risk type.";

/// Joins the results of multi-step categories.
pub const RESULT_SEPARATOR: &str = "; ";

/// One external tool run that contributes to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStep {
    /// Stable name, also used for report file names.
    pub id: &'static str,
    pub tool: ToolKind,
    /// Argument template; `{target}` and `{report}` are substituted at run time.
    pub args: &'static [&'static str],
    pub markers: Option<Markers>,
}

impl ToolStep {
    pub fn writes_report(&self) -> bool {
        self.args.iter().any(|arg| arg.contains("{report}"))
    }

    pub fn render_args(&self, target: &Path, report: Option<&Path>) -> Vec<String> {
        let target = target.display().to_string();
        let report = report.map(|p| p.display().to_string()).unwrap_or_default();
        self.args
            .iter()
            .map(|arg| arg.replace("{target}", &target).replace("{report}", &report))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStep {
    Tool(ToolStep),
    /// In-process search for logging configuration files.
    LoggingConfig,
}

/// A risk category and the ordered steps that produce its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskCheck {
    pub label: &'static str,
    pub steps: &'static [CheckStep],
}

impl RiskCheck {
    pub fn tools(&self) -> Vec<ToolKind> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                CheckStep::Tool(t) => Some(t.tool),
                CheckStep::LoggingConfig => None,
            })
            .collect()
    }
}

/// Outcome of looking a label up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Known(&'static RiskCheck),
    /// Resolved locally to [`UNKNOWN_RISK`]; never fails a batch.
    Unknown,
}

const SEMGREP_SECTION: Markers = Markers::between("Code Finding", "Scan Summary");
const SNYK_SECTION: Markers = Markers::between("Issues", "Organization:");
const CHECKOV_SECTION: Markers = Markers::open("Check:");
const TFSEC_SECTION: Markers = Markers::open("Result");

const GITLEAKS_WORKTREE: &[&str] = &[
    "detect",
    "--source",
    ".",
    "--no-git",
    "--no-banner",
    "--report-format",
    "json",
    "--report-path",
    "{report}",
    "--exit-code",
    "1",
];

const GITLEAKS_HISTORY: &[&str] = &[
    "detect",
    "--source",
    ".",
    "--no-banner",
    "--report-format",
    "json",
    "--report-path",
    "{report}",
    "--exit-code",
    "1",
];

static REGISTRY: &[RiskCheck] = &[
    RiskCheck {
        label: "Insufficient Flow Control Mechanisms",
        steps: &[CheckStep::Tool(ToolStep {
            id: "flow-control-checkov",
            tool: ToolKind::Checkov,
            args: &[
                "-d",
                ".",
                "--framework",
                "github_actions",
                "--compact",
                "--quiet",
                "--soft-fail",
            ],
            markers: Some(CHECKOV_SECTION),
        })],
    },
    RiskCheck {
        label: "Insufficient IAM",
        steps: &[CheckStep::Tool(ToolStep {
            id: "iam-semgrep",
            tool: ToolKind::Semgrep,
            args: &["--config", "p/secrets", "--metrics", "off"],
            markers: None,
        })],
    },
    RiskCheck {
        label: "Dependency Chain Abuse",
        steps: &[CheckStep::Tool(ToolStep {
            id: "dependency-chain-snyk",
            tool: ToolKind::Snyk,
            args: &["test"],
            markers: Some(SNYK_SECTION),
        })],
    },
    RiskCheck {
        label: "Insufficient Verification of Dependencies",
        steps: &[CheckStep::Tool(ToolStep {
            id: "dependency-verification-snyk",
            tool: ToolKind::Snyk,
            args: &["test", "--all-projects"],
            markers: Some(SNYK_SECTION),
        })],
    },
    RiskCheck {
        label: "Untrusted Artifact Downloads",
        steps: &[CheckStep::Tool(ToolStep {
            id: "artifact-downloads-semgrep",
            tool: ToolKind::Semgrep,
            args: &["--config", "p/dockerfile", "--metrics", "off"],
            markers: Some(SEMGREP_SECTION),
        })],
    },
    RiskCheck {
        label: "Insecure Pipeline Configuration",
        steps: &[CheckStep::Tool(ToolStep {
            id: "pipeline-config-semgrep",
            tool: ToolKind::Semgrep,
            args: &["--config", "p/github-actions", "--metrics", "off"],
            markers: Some(SEMGREP_SECTION),
        })],
    },
    RiskCheck {
        label: "Insecure System Configuration",
        steps: &[
            CheckStep::Tool(ToolStep {
                id: "system-config-checkov",
                tool: ToolKind::Checkov,
                args: &[
                    "-d",
                    ".",
                    "--framework",
                    "terraform,kubernetes,dockerfile",
                    "--compact",
                    "--quiet",
                    "--soft-fail",
                ],
                markers: Some(CHECKOV_SECTION),
            }),
            CheckStep::Tool(ToolStep {
                id: "system-config-tfsec",
                tool: ToolKind::Tfsec,
                args: &[".", "--no-color", "--soft-fail"],
                markers: Some(TFSEC_SECTION),
            }),
        ],
    },
    RiskCheck {
        label: "Insufficient Logging and Monitoring",
        steps: &[
            CheckStep::Tool(ToolStep {
                id: "logging-semgrep",
                tool: ToolKind::Semgrep,
                args: &["--config", "p/owasp-top-ten", "--metrics", "off"],
                markers: Some(SEMGREP_SECTION),
            }),
            CheckStep::LoggingConfig,
        ],
    },
    RiskCheck {
        label: "Insecure Secrets Management",
        steps: &[CheckStep::Tool(ToolStep {
            id: "secrets-management-gitleaks",
            tool: ToolKind::Gitleaks,
            args: GITLEAKS_WORKTREE,
            markers: None,
        })],
    },
    RiskCheck {
        label: "Insufficient Credential Hygiene",
        steps: &[CheckStep::Tool(ToolStep {
            id: "credential-hygiene-gitleaks",
            tool: ToolKind::Gitleaks,
            args: GITLEAKS_HISTORY,
            markers: None,
        })],
    },
    RiskCheck {
        label: "Vulnerable Code Execution",
        steps: &[CheckStep::Tool(ToolStep {
            id: "code-execution-semgrep",
            tool: ToolKind::Semgrep,
            args: &["--config", "p/owasp-top-ten", "--metrics", "off"],
            markers: None,
        })],
    },
];

/// Every registered category, in presentation order.
pub fn all() -> &'static [RiskCheck] {
    REGISTRY
}

/// Look up a category by its exact label.
pub fn resolve(label: &str) -> Resolution {
    match REGISTRY.iter().find(|check| check.label == label) {
        Some(check) => Resolution::Known(check),
        None => Resolution::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_resolve_known_label() {
        match resolve("Insufficient IAM") {
            Resolution::Known(check) => assert_eq!(check.tools(), vec![ToolKind::Semgrep]),
            Resolution::Unknown => panic!("IAM should be registered"),
        }
    }

    #[test]
    fn test_resolve_is_exact_match() {
        assert_eq!(resolve("insufficient iam"), Resolution::Unknown);
        assert_eq!(resolve("Insufficient IAM "), Resolution::Unknown);
        assert_eq!(resolve(""), Resolution::Unknown);
    }

    #[test]
    fn test_system_configuration_uses_two_scanners_in_order() {
        let Resolution::Known(check) = resolve("Insecure System Configuration") else {
            panic!("missing category");
        };
        assert_eq!(check.tools(), vec![ToolKind::Checkov, ToolKind::Tfsec]);
    }

    #[test]
    fn test_labels_and_step_ids_unique() {
        let labels: HashSet<_> = all().iter().map(|c| c.label).collect();
        assert_eq!(labels.len(), all().len());

        let mut ids = HashSet::new();
        for check in all() {
            for step in check.steps {
                if let CheckStep::Tool(step) = step {
                    assert!(ids.insert(step.id), "duplicate step id {}", step.id);
                }
            }
        }
    }

    #[test]
    fn test_report_placeholder_only_on_file_based_tools() {
        for check in all() {
            for step in check.steps {
                if let CheckStep::Tool(step) = step {
                    assert_eq!(
                        step.writes_report(),
                        step.tool == ToolKind::Gitleaks,
                        "{} report wiring",
                        step.id
                    );
                }
            }
        }
    }

    #[test]
    fn test_iac_scanners_never_fail_on_findings() {
        // checkov and tfsec exit 1 on any failed check unless told otherwise.
        let mut seen = 0;
        for check in all() {
            for step in check.steps {
                if let CheckStep::Tool(step) = step {
                    if matches!(step.tool, ToolKind::Checkov | ToolKind::Tfsec) {
                        assert!(
                            step.args.contains(&"--soft-fail"),
                            "{} lacks --soft-fail",
                            step.id
                        );
                        seen += 1;
                    }
                }
            }
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_render_args_substitutes_report_path() {
        let Resolution::Known(check) = resolve("Insecure Secrets Management") else {
            panic!("missing category");
        };
        let CheckStep::Tool(step) = check.steps[0] else {
            panic!("expected tool step");
        };
        let report = PathBuf::from("/reports/repo/secrets.json");
        let args = step.render_args(Path::new("/repos/repo"), Some(&report));
        assert!(args.contains(&"/reports/repo/secrets.json".to_string()));
        assert!(!args.iter().any(|a| a.contains('{')));
    }
}
