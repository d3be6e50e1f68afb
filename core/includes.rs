use crate::paths;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

// Only quoted includes. <system> headers live outside the project.
static INCLUDE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*#include\s+"([^"]+)""#).expect("include directive regex is valid")
});

/// Finds the file an include directive refers to: first relative to the
/// directory of the including file, then relative to the resolution root.
/// A target found in neither place is dropped.
pub fn resolve_include(directive: &str, source_file: &Path, root: &Path) -> Option<PathBuf> {
    let source_dir = source_file.parent().unwrap_or(root);

    let candidate = paths::normalize(&source_dir.join(directive));
    if candidate.exists() {
        log::trace!(
            "Resolved include \"{}\" relative to {}",
            directive,
            source_dir.display()
        );
        return Some(candidate);
    }

    let candidate = paths::normalize(&root.join(directive));
    if candidate.exists() {
        log::trace!("Resolved include \"{}\" relative to root", directive);
        return Some(candidate);
    }

    log::debug!(
        "Dropping unresolved include \"{}\" in {}",
        directive,
        source_file.display()
    );
    None
}

/// Scans `content` line by line for quoted include directives and resolves
/// each one. Results keep line order and may contain duplicates.
pub fn scan_for_includes(content: &str, source_file: &Path, root: &Path) -> Vec<PathBuf> {
    content
        .lines()
        .filter_map(|line| INCLUDE_DIRECTIVE.captures(line))
        .filter_map(|caps| resolve_include(&caps[1], source_file, root))
        .collect()
}
