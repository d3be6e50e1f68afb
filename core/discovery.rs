use crate::classify::is_text_file;
use crate::config::DiscoveryConfig;
use crate::error::{AppError, Result};
use crate::ignore_spec::IgnoreSpec;
use crate::includes::scan_for_includes;
use crate::paths;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file that survived filtering, keyed by its root-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    pub path: String,
    pub content: String,
}

/// Result of one discovery run: accepted files sorted by relative path plus
/// every non-fatal problem met along the way.
#[derive(Debug, Default)]
pub struct Discovery {
    pub project_name: String,
    pub files: Vec<ResolvedFile>,
    pub warnings: Vec<AppError>,
}

#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub files: Vec<ResolvedFile>,
    pub warnings: Vec<AppError>,
}

enum Candidate {
    Accepted {
        file: ResolvedFile,
        includes: Vec<PathBuf>,
    },
    Skipped,
    Failed(AppError),
}

/// Picks the resolution root from the first input: the input itself when it
/// is a directory, otherwise its parent directory.
pub fn resolve_root(inputs: &[PathBuf]) -> Result<PathBuf> {
    let first = inputs
        .first()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let absolute = paths::absolutize(&first)?;
    if absolute.is_dir() {
        return Ok(absolute);
    }
    match absolute.parent() {
        Some(parent) if parent.is_dir() => Ok(parent.to_path_buf()),
        _ => Err(AppError::Config(format!(
            "Cannot resolve a root directory from input '{}'",
            first.display()
        ))),
    }
}

pub fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned())
}

/// Compiles the ignore rules for `root` and runs discovery over `inputs`.
/// An empty input list means the current directory.
pub fn discover_project(
    root: &Path,
    inputs: &[PathBuf],
    config: &DiscoveryConfig,
) -> Result<Discovery> {
    let default_inputs = [PathBuf::from(".")];
    let inputs = if inputs.is_empty() {
        &default_inputs[..]
    } else {
        inputs
    };
    let root = paths::absolutize(root)?;
    let (ignore_spec, mut warnings) = IgnoreSpec::compile(&root, config)?;

    let engine = DiscoveryEngine::new(&root, &ignore_spec, config);
    let outcome = engine.discover(inputs);
    warnings.extend(outcome.warnings);

    Ok(Discovery {
        project_name: project_name(&root),
        files: outcome.files,
        warnings,
    })
}

type FileReader = fn(&Path) -> io::Result<Vec<u8>>;

fn read_bytes(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}

/// Drops invalid UTF-8 sequences instead of substituting U+FFFD, so a file
/// holding only undecodable bytes and whitespace reads as empty.
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

pub struct DiscoveryEngine<'a> {
    root: &'a Path,
    ignore_spec: &'a IgnoreSpec,
    config: &'a DiscoveryConfig,
    read_file: FileReader,
}

impl<'a> DiscoveryEngine<'a> {
    /// `root` must be absolute and normalized; relative paths, ignore rules
    /// and root-relative include fallbacks are all computed against it.
    pub fn new(
        root: &'a Path,
        ignore_spec: &'a IgnoreSpec,
        config: &'a DiscoveryConfig,
    ) -> Self {
        Self {
            root,
            ignore_spec,
            config,
            read_file: read_bytes,
        }
    }

    #[cfg(test)]
    fn with_reader(mut self, read_file: FileReader) -> Self {
        self.read_file = read_file;
        self
    }

    pub fn discover(&self, inputs: &[PathBuf]) -> DiscoveryOutcome {
        // 1. Expand the inputs into the first frontier
        let mut warnings = Vec::new();
        let mut frontier = self.seed_queue(inputs, &mut warnings);
        log::info!("Seeded work queue with {} paths.", frontier.len());

        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut files = Vec::new();
        let mut level = 0usize;

        // Breadth-first, one frontier at a time. Dedup is sequential so the
        // seen set behaves exactly like a single FIFO queue; only the reads
        // of an already-deduplicated frontier run in parallel.
        while !frontier.is_empty() {
            // 2. Drop paths already examined, in queue order
            let batch: Vec<PathBuf> = std::mem::take(&mut frontier)
                .into_iter()
                .filter(|path| seen.insert(path.clone()))
                .collect();
            log::debug!("Processing level {} ({} paths).", level, batch.len());

            // 3. Filter and read the whole frontier
            let results: Vec<Candidate> = batch
                .par_iter()
                .map(|path| self.process_candidate(path))
                .collect();

            // 4. Collect files, queue their includes, keep failures as warnings
            for result in results {
                match result {
                    Candidate::Accepted { file, includes } => {
                        frontier.extend(includes.into_iter().filter(|inc| !seen.contains(inc)));
                        files.push(file);
                    }
                    Candidate::Skipped => {}
                    Candidate::Failed(err) => warnings.push(err),
                }
            }
            level += 1;
        }

        // Sort results for deterministic output
        files.sort_by(|a: &ResolvedFile, b: &ResolvedFile| a.path.cmp(&b.path));
        log::info!(
            "Discovery complete: {} files accepted, {} paths examined.",
            files.len(),
            seen.len()
        );
        DiscoveryOutcome { files, warnings }
    }

    fn seed_queue(&self, inputs: &[PathBuf], warnings: &mut Vec<AppError>) -> Vec<PathBuf> {
        let mut queue = Vec::new();
        for input in inputs {
            let absolute = match paths::absolutize(input) {
                Ok(path) => path,
                Err(e) => {
                    warnings.push(e);
                    continue;
                }
            };
            if absolute.is_file() {
                log::trace!("Queueing input file {}", absolute.display());
                queue.push(absolute);
            } else if absolute.is_dir() {
                self.expand_directory(&absolute, &mut queue, warnings);
            } else {
                log::warn!(
                    "Skipping input that is not a file or directory: {}",
                    input.display()
                );
                warnings.push(AppError::InvalidArgument(format!(
                    "Input path does not exist or is not a regular file or directory: {}",
                    input.display()
                )));
            }
        }
        queue
    }

    fn expand_directory(
        &self,
        dir: &Path,
        queue: &mut Vec<PathBuf>,
        warnings: &mut Vec<AppError>,
    ) {
        log::debug!("Walking input directory: {}", dir.display());
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let relative = paths::relative_slash_path(entry.path(), self.root);
                let ignored = self.ignore_spec.matches(&relative, true);
                if ignored {
                    log::trace!("Pruning ignored directory: {}", relative);
                }
                !ignored
            });

        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_dir() {
                        queue.push(entry.into_path());
                    }
                }
                Err(e) => {
                    log::debug!("Error walking directory {}: {}", dir.display(), e);
                    warnings.push(AppError::from(e));
                }
            }
        }
    }

    fn process_candidate(&self, path: &Path) -> Candidate {
        let relative = paths::relative_slash_path(path, self.root);

        // 1. Ignore rules, including rules on any parent directory
        if self.ignore_spec.matches(&relative, false) {
            log::trace!("Ignored: {}", relative);
            return Candidate::Skipped;
        }
        // 2. Binary sniff
        if !is_text_file(path) {
            log::trace!("Not text: {}", relative);
            return Candidate::Skipped;
        }

        // 3. Read; a failure here is a warning, never fatal
        let bytes = match (self.read_file)(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("Skipping unreadable file {}: {}", relative, e);
                return Candidate::Failed(AppError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        // 4. Decode, then reject files with nothing but whitespace left
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                log::debug!("Dropping invalid UTF-8 in {}: {}", relative, e.utf8_error());
                decode_dropping_invalid(e.as_bytes())
            }
        };
        if content.trim().is_empty() {
            log::trace!("Empty: {}", relative);
            return Candidate::Skipped;
        }

        // 5. Deep mode: scan traceable files for quoted includes
        let includes = if self.config.deep && self.is_traceable(path) {
            scan_for_includes(&content, path, self.root)
        } else {
            Vec::new()
        };
        log::trace!("Accepted: {} ({} includes)", relative, includes.len());

        Candidate::Accepted {
            file: ResolvedFile {
                path: relative,
                content,
            },
            includes,
        }
    }

    fn is_traceable(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.is_traceable_extension(ext))
    }
}
