use crate::config::{DiscoveryConfig, get_builtin_ignore_patterns};
use crate::error::{AppError, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Compiled ignore rules for one resolution root.
///
/// Sources are merged in order: each configured ignore file under the root
/// (`.gitignore`, then `.ctxignore` by default), then the built-in defaults,
/// then any extra patterns from the config file. The last matching rule wins,
/// so `!pattern` can re-include something an earlier rule excluded.
#[derive(Debug, Clone)]
pub struct IgnoreSpec {
    matcher: Gitignore,
}

impl IgnoreSpec {
    /// Reads the ignore files under `root` and compiles them together with the
    /// built-in rules. Unreadable ignore files and invalid patterns are
    /// returned as warnings; only a failure to build the matcher is fatal.
    pub fn compile(root: &Path, config: &DiscoveryConfig) -> Result<(Self, Vec<AppError>)> {
        log::debug!("Compiling ignore rules for {}", root.display());
        let mut builder = GitignoreBuilder::new(root);
        let mut warnings = Vec::new();

        for file_name in &config.ignore_files {
            let ignore_path = root.join(file_name);
            if !ignore_path.exists() {
                log::trace!("No ignore file at {}", ignore_path.display());
                continue;
            }
            if let Some(err) = builder.add(&ignore_path) {
                log::debug!("Problem reading {}: {}", ignore_path.display(), err);
                warnings.push(AppError::Ignore(err));
            } else {
                log::trace!("Loaded ignore file {}", ignore_path.display());
            }
        }

        if config.builtin_ignore {
            for pattern in get_builtin_ignore_patterns().patterns() {
                if let Err(err) = builder.add_line(None, pattern) {
                    warnings.push(AppError::Ignore(err));
                }
            }
        }

        for pattern in &config.extra_ignores {
            if let Err(err) = builder.add_line(None, pattern) {
                warnings.push(AppError::Ignore(err));
            }
        }

        let matcher = builder.build()?;
        log::debug!(
            "Ignore rules compiled ({} ignore, {} whitelist).",
            matcher.num_ignores(),
            matcher.num_whitelists()
        );
        Ok((Self { matcher }, warnings))
    }

    /// Compiles a fixed list of rules with no file or built-in sources.
    #[cfg(test)]
    pub fn from_patterns<'a>(
        root: &Path,
        patterns: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            builder.add_line(None, pattern)?;
        }
        Ok(Self {
            matcher: builder.build()?,
        })
    }

    /// Whether a root-relative, slash-separated path is excluded, either by a
    /// rule matching it directly or by a rule matching one of its parent
    /// directories.
    ///
    /// Parent directories are checked first: once a directory is excluded,
    /// nothing beneath it can be re-included by a `!` rule.
    pub fn matches(&self, relative_path: &str, is_dir: bool) -> bool {
        let path = Path::new(relative_path);
        if relative_path.is_empty() || path.has_root() {
            return false;
        }
        let ignored_parent = path
            .ancestors()
            .skip(1)
            .take_while(|parent| !parent.as_os_str().is_empty())
            .find(|parent| self.matcher.matched(parent, true).is_ignore());
        if let Some(parent) = ignored_parent {
            log::trace!("{} is under ignored directory {}", relative_path, parent.display());
            return true;
        }
        self.matcher.matched(path, is_dir).is_ignore()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_builtins() -> DiscoveryConfig {
        DiscoveryConfig {
            builtin_ignore: false,
            ..DiscoveryConfig::default()
        }
    }

    #[test]
    fn gitignore_rules_apply() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "secret.txt\n").unwrap();

        let (spec, warnings) = IgnoreSpec::compile(dir.path(), &no_builtins()).unwrap();
        assert!(warnings.is_empty());
        assert!(spec.matches("secret.txt", false));
        assert!(spec.matches("nested/secret.txt", false));
        assert!(!spec.matches("visible.txt", false));
    }

    #[test]
    fn tool_ignore_file_is_read_after_gitignore() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        fs::write(dir.path().join(".ctxignore"), "!keep.log\ndocs/\n").unwrap();

        let (spec, _) = IgnoreSpec::compile(dir.path(), &no_builtins()).unwrap();
        assert!(spec.matches("debug.log", false));
        assert!(!spec.matches("keep.log", false));
        assert!(spec.matches("docs", true));
        assert!(spec.matches("docs/guide.md", false));
    }

    #[test]
    fn directory_only_rules_need_a_directory() {
        let dir = TempDir::new().unwrap();
        let spec = IgnoreSpec::from_patterns(dir.path(), ["build/"]).unwrap();
        assert!(spec.matches("build", true));
        assert!(!spec.matches("build", false));
        assert!(spec.matches("build/out.o", false));
        assert!(spec.matches("sub/build/out.o", false));
    }

    #[test]
    fn anchored_and_double_star_rules() {
        let dir = TempDir::new().unwrap();
        let spec = IgnoreSpec::from_patterns(dir.path(), ["/config.h", "gen/**/*.inc"]).unwrap();
        assert!(spec.matches("config.h", false));
        assert!(!spec.matches("src/config.h", false));
        assert!(spec.matches("gen/a/b/table.inc", false));
        assert!(spec.matches("gen/table.inc", false));
        assert!(!spec.matches("src/table.inc", false));
    }

    #[test]
    fn whitelist_cannot_reach_into_ignored_directory() {
        let dir = TempDir::new().unwrap();
        let spec = IgnoreSpec::from_patterns(dir.path(), ["vendor/", "!vendor/keep.h", "*.log", "!keep.log"]).unwrap();
        assert!(spec.matches("vendor", true));
        assert!(spec.matches("vendor/keep.h", false));
        assert!(spec.matches("vendor/deep/keep.h", false));
        assert!(!spec.matches("keep.log", false));
        assert!(!spec.matches("src/keep.log", false));
    }

    #[test]
    fn builtin_defaults_are_applied() {
        let dir = TempDir::new().unwrap();
        let (spec, _) = IgnoreSpec::compile(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert!(spec.matches(".git", true));
        assert!(spec.matches("node_modules/react/index.js", false));
        assert!(spec.matches("web/package-lock.json", false));
        assert!(spec.matches(".aider.chat.history.md", false));
        assert!(!spec.matches("src/main.rs", false));

        let (bare, _) = IgnoreSpec::compile(dir.path(), &no_builtins()).unwrap();
        assert!(bare.is_empty());
        assert!(!bare.matches("node_modules/react/index.js", false));
    }

    #[test]
    fn builtins_override_user_negation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "!Cargo.lock\n").unwrap();
        let (spec, _) = IgnoreSpec::compile(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert!(spec.matches("Cargo.lock", false));
    }

    #[test]
    fn extra_ignores_come_last() {
        let dir = TempDir::new().unwrap();
        let config = DiscoveryConfig {
            extra_ignores: vec!["*.tmp".to_string()],
            ..no_builtins()
        };
        let (spec, _) = IgnoreSpec::compile(dir.path(), &config).unwrap();
        assert!(spec.matches("scratch.tmp", false));
    }

    #[test]
    fn unreadable_ignore_file_is_a_warning() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".gitignore")).unwrap();
        fs::write(dir.path().join(".ctxignore"), "secret.txt\n").unwrap();

        let (spec, warnings) = IgnoreSpec::compile(dir.path(), &no_builtins()).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(spec.matches("secret.txt", false));
    }
}
