pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ignore_spec;
pub mod includes;
pub mod paths;

pub use classify::is_text_file;
pub use config::{
    BuiltinIgnores, Config, DiscoveryConfig, MetricsConfig, get_builtin_ignore_patterns,
};
pub use discovery::{
    Discovery, DiscoveryEngine, DiscoveryOutcome, ResolvedFile, discover_project, project_name,
    resolve_root,
};
pub use error::{AppError, Result};
pub use ignore_spec::IgnoreSpec;
pub use includes::{resolve_include, scan_for_includes};
