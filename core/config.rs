use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILENAME: &str = ".ctx.toml";
pub const DEFAULT_TOKEN_WARNING_THRESHOLD: usize = 100_000;

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Settings consumed by the discovery engine. Built once per invocation and
/// never mutated while a discovery run is in progress.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    #[serde(default = "default_false")]
    pub deep: bool,
    #[serde(default = "default_traceable_extensions")]
    pub traceable_extensions: Vec<String>,
    #[serde(default = "default_ignore_files")]
    pub ignore_files: Vec<String>,
    #[serde(default = "default_true")]
    pub builtin_ignore: bool,
    #[serde(default)]
    pub extra_ignores: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default = "default_token_warning_threshold")]
    pub token_warning_threshold: usize,
    #[serde(default = "default_false")]
    pub exact_tokens: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuiltinIgnores {
    #[serde(default)]
    pub vcs: Vec<String>,
    #[serde(default)]
    pub editor: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub build: Vec<String>,
    #[serde(default)]
    pub os: Vec<String>,
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default)]
    pub packaging: Vec<String>,
    #[serde(default)]
    pub lockfiles: Vec<String>,
}

impl BuiltinIgnores {
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.vcs
            .iter()
            .chain(&self.editor)
            .chain(&self.dependencies)
            .chain(&self.build)
            .chain(&self.os)
            .chain(&self.environments)
            .chain(&self.packaging)
            .chain(&self.lockfiles)
            .map(String::as_str)
    }
}

static BUILTIN_IGNORE_PATTERNS: Lazy<BuiltinIgnores> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/builtin_ignores.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/builtin_ignores.yaml")
});

pub fn get_builtin_ignore_patterns() -> &'static BuiltinIgnores {
    &BUILTIN_IGNORE_PATTERNS
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_traceable_extensions() -> Vec<String> {
    ["c", "cc", "cpp", "h", "hpp"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_ignore_files() -> Vec<String> {
    vec![".gitignore".to_string(), ".ctxignore".to_string()]
}
fn default_token_warning_threshold() -> usize {
    DEFAULT_TOKEN_WARNING_THRESHOLD
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            deep: false,
            traceable_extensions: default_traceable_extensions(),
            ignore_files: default_ignore_files(),
            builtin_ignore: true,
            extra_ignores: Vec::new(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            token_warning_threshold: DEFAULT_TOKEN_WARNING_THRESHOLD,
            exact_tokens: false,
        }
    }
}

impl Config {
    /// Picks the config file for this run. An explicitly named file must
    /// exist; the default `.ctx.toml` under the root is optional.
    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let expanded = shellexpand::tilde(p_str);
                let mut path = PathBuf::from(expanded.as_ref());
                if path.is_relative() && !path.exists() {
                    path = project_root.join(path);
                }
                if !path.is_file() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = project_root.join(DEFAULT_CONFIG_FILENAME);
                if default_path.is_file() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    pub fn load(
        project_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Self> {
        match Self::resolve_config_path(project_root, cli_config_file, cli_disable_config)? {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }
}

impl DiscoveryConfig {
    pub fn is_traceable_extension(&self, extension: &str) -> bool {
        self.traceable_extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.') == extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_ignores_cover_common_noise() {
        let patterns: Vec<&str> = get_builtin_ignore_patterns().patterns().collect();
        for expected in [".git/", "node_modules/", "target/", "Cargo.lock", ".venv"] {
            assert!(patterns.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn missing_default_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path(), None, false).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.metrics.token_warning_threshold,
            DEFAULT_TOKEN_WARNING_THRESHOLD
        );
    }

    #[test]
    fn default_config_file_is_picked_up() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILENAME),
            "[discovery]\ndeep = true\nextra_ignores = [\"*.log\"]\n\n[metrics]\ntoken_warning_threshold = 10\n",
        )
        .unwrap();

        let config = Config::load(dir.path(), None, false).unwrap();
        assert!(config.discovery.deep);
        assert_eq!(config.discovery.extra_ignores, vec!["*.log".to_string()]);
        assert_eq!(config.discovery.ignore_files, default_ignore_files());
        assert_eq!(config.metrics.token_warning_threshold, 10);
    }

    #[test]
    fn disabled_config_is_not_read() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILENAME), "not toml at all [").unwrap();
        let config = Config::load(dir.path(), None, true).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = "does-not-exist.toml".to_string();
        let err = Config::load(dir.path(), Some(&missing), false).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILENAME), "[discovery]\nfollow = true\n").unwrap();
        let err = Config::load(dir.path(), None, false).unwrap_err();
        assert!(matches!(err, AppError::TomlParse(_)));
    }

    #[test]
    fn traceable_extensions_accept_leading_dot() {
        let config = DiscoveryConfig {
            traceable_extensions: vec![".ino".to_string(), "h".to_string()],
            ..DiscoveryConfig::default()
        };
        assert!(config.is_traceable_extension("ino"));
        assert!(config.is_traceable_extension("h"));
        assert!(!config.is_traceable_extension("c"));
    }
}
