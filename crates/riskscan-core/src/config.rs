use crate::tools::ToolKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "RISKSCAN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "riskscan.toml";

/// What a batch does when one of its checks fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort on the first failing check and return no report at all.
    #[default]
    FailFast,
    /// Record the failure against its category and keep going.
    CollectAll,
}

/// Explicit binary locations, one per tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolPaths {
    pub semgrep: Option<PathBuf>,
    pub checkov: Option<PathBuf>,
    pub tfsec: Option<PathBuf>,
    pub snyk: Option<PathBuf>,
    pub gitleaks: Option<PathBuf>,
}

impl ToolPaths {
    pub fn get(&self, tool: ToolKind) -> Option<&PathBuf> {
        match tool {
            ToolKind::Semgrep => self.semgrep.as_ref(),
            ToolKind::Checkov => self.checkov.as_ref(),
            ToolKind::Tfsec => self.tfsec.as_ref(),
            ToolKind::Snyk => self.snyk.as_ref(),
            ToolKind::Gitleaks => self.gitleaks.as_ref(),
        }
    }

    pub fn set(&mut self, tool: ToolKind, path: PathBuf) {
        let slot = match tool {
            ToolKind::Semgrep => &mut self.semgrep,
            ToolKind::Checkov => &mut self.checkov,
            ToolKind::Tfsec => &mut self.tfsec,
            ToolKind::Snyk => &mut self.snyk,
            ToolKind::Gitleaks => &mut self.gitleaks,
        };
        *slot = Some(path);
    }
}

/// Scanner configuration, loaded from `riskscan.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Directory searched for every tool binary not listed in `tools`.
    pub tool_dir: Option<PathBuf>,

    pub tools: ToolPaths,

    /// Root under which file-based tools write their reports.
    pub report_dir: PathBuf,

    /// Per-tool wall clock limit; `0` waits forever.
    pub timeout_secs: u64,

    pub failure_policy: FailurePolicy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            tool_dir: None,
            tools: ToolPaths::default(),
            report_dir: std::env::temp_dir().join("riskscan-reports"),
            timeout_secs: 900,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl ScannerConfig {
    /// Resolve the binary for a tool: explicit path, then `tool_dir`, then `PATH`.
    pub fn program(&self, tool: ToolKind) -> PathBuf {
        if let Some(path) = self.tools.get(tool) {
            return path.clone();
        }
        match &self.tool_dir {
            Some(dir) => dir.join(tool.binary()),
            None => PathBuf::from(tool.binary()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Load from an explicit path, `RISKSCAN_CONFIG`, or `./riskscan.toml`,
    /// falling back to defaults when none of them is present.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return load_config(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return load_config(Path::new(&path));
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return load_config(local);
        }

        Ok(Self::default())
    }
}

/// Load scanner configuration from a TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<ScannerConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
    let config: ScannerConfig = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
    Ok(config)
}
