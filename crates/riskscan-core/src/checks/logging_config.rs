use anyhow::{Context, Result};
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::Path;

pub const NO_LOGGING_CONFIG: &str = "No logging configuration files found.";

/// File name patterns of common logging and log-shipping configurations.
const LOGGING_CONFIG_PATTERNS: &[&str] = &[
    "log4j*.xml",
    "log4j*.properties",
    "log4j2*.json",
    "log4j2*.yaml",
    "log4j2*.yml",
    "logback*.xml",
    "logging.conf",
    "logging.ini",
    "logging.json",
    "logging.yaml",
    "logging.yml",
    "winston*.js",
    "pino*.js",
    "bunyan*.js",
    "fluentd.conf",
    "fluent-bit.conf",
    "td-agent.conf",
    "filebeat.yml",
    "vector.toml",
];

const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "vendor", "target"];

/// Report which logging configuration files exist under `target`.
pub fn detect(target: &Path) -> Result<String> {
    let patterns = LOGGING_CONFIG_PATTERNS
        .iter()
        .map(|p| Pattern::new(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut found = BTreeSet::new();
    walk_dirs(target, target, &patterns, &mut found)?;

    if found.is_empty() {
        return Ok(NO_LOGGING_CONFIG.to_string());
    }

    let files: Vec<_> = found.into_iter().collect();
    Ok(format!("Logging configuration files found: {}", files.join(", ")))
}

fn walk_dirs(
    root: &Path,
    current: &Path,
    patterns: &[Pattern],
    found: &mut BTreeSet<String>,
) -> Result<()> {
    let entries = std::fs::read_dir(current)
        .with_context(|| format!("Failed to read directory '{}'", current.display()))?;

    for entry in entries {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();

        if file_type.is_dir() {
            if !SKIPPED_DIRS.contains(&&*name_str) {
                walk_dirs(root, &entry.path(), patterns, found)?;
            }
            continue;
        }

        if file_type.is_file() && patterns.iter().any(|p| p.matches(&name_str)) {
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(&path);
            found.insert(relative.display().to_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_logging_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.py"), "print('hi')").unwrap();
        assert_eq!(detect(dir.path()).unwrap(), NO_LOGGING_CONFIG);
    }

    #[test]
    fn test_finds_nested_configs_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let resources = dir.path().join("src/main/resources");
        std::fs::create_dir_all(&resources).unwrap();
        std::fs::write(resources.join("logback-spring.xml"), "<configuration/>").unwrap();
        std::fs::write(dir.path().join("logging.yaml"), "version: 1").unwrap();

        let result = detect(dir.path()).unwrap();
        assert_eq!(
            result,
            "Logging configuration files found: logging.yaml, src/main/resources/logback-spring.xml"
        );
    }

    #[test]
    fn test_ignores_dependency_directories() {
        let dir = tempfile::tempdir().unwrap();
        let vendored = dir.path().join("node_modules/pino");
        std::fs::create_dir_all(&vendored).unwrap();
        std::fs::write(vendored.join("pino-pretty.js"), "").unwrap();
        assert_eq!(detect(dir.path()).unwrap(), NO_LOGGING_CONFIG);
    }

    #[test]
    fn test_single_walk_matches_every_pattern_family() {
        let dir = tempfile::tempdir().unwrap();
        let deploy = dir.path().join("deploy");
        std::fs::create_dir_all(&deploy).unwrap();
        std::fs::write(deploy.join("filebeat.yml"), "filebeat.inputs: []").unwrap();
        std::fs::write(deploy.join("log4j2-test.yaml"), "Configuration: {}").unwrap();
        std::fs::write(dir.path().join("winston.config.js"), "").unwrap();
        std::fs::write(dir.path().join("logging.yml.bak"), "").unwrap();

        let hooks = dir.path().join(".git/hooks");
        std::fs::create_dir_all(&hooks).unwrap();
        std::fs::write(hooks.join("logging.conf"), "").unwrap();

        assert_eq!(
            detect(dir.path()).unwrap(),
            "Logging configuration files found: deploy/filebeat.yml, deploy/log4j2-test.yaml, \
             winston.config.js"
        );
    }

    #[test]
    fn test_directory_named_like_config_is_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("logging.conf")).unwrap();
        assert_eq!(detect(dir.path()).unwrap(), NO_LOGGING_CONFIG);
    }
}
