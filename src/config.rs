//! Run configuration, loaded from `xtrpc.config.json` with CLI overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "xtrpc.config.json";
const DEFAULT_TSCONFIG: &str = "tsconfig.json";
const DEFAULT_TARGET: &str = "AppRouter";
const DEFAULT_OUT_FILE: &str = "types/api.d.ts";

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project tsconfig; its directory is the source discovery root.
    pub tsconfig_path: PathBuf,
    /// Source unit containing the target type alias.
    pub entry_file: PathBuf,
    /// Name of the public router type alias.
    pub target_type_name: String,
    /// Explicit source set, overriding project-wide discovery.
    pub source_paths: Option<Vec<PathBuf>>,
    /// Where the emitted declaration is written.
    pub out_file: PathBuf,
    pub verbose: bool,
}

/// On-disk configuration file shape; every field optional so CLI flags can
/// fill the gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
struct ConfigFile {
    tsconfig_path: Option<PathBuf>,
    entry_file: Option<PathBuf>,
    target_type_name: Option<String>,
    source_paths: Option<Vec<PathBuf>>,
    out_file: Option<PathBuf>,
    verbose: Option<bool>,
}

/// CLI-provided values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub entry: Option<PathBuf>,
    pub target: Option<String>,
    pub tsconfig: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub verbose: bool,
}

/// Directory containing the project tsconfig; the root for source
/// discovery and backend staging.
pub fn project_root(tsconfig: &Path) -> &Path {
    match tsconfig.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Read the config file (if present) and merge CLI overrides on top.
///
/// A missing file is not an error; `entryFile` missing from both the file
/// and the overrides is.
pub fn load(path: &Path, overrides: Overrides) -> Result<Config> {
    let file = match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str::<ConfigFile>(&text)
            .map_err(|e| Error::config(format!("invalid config in {}: {e}", path.display())))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!(
                "No config file found at {}; using defaults and CLI flags.",
                path.display()
            );
            ConfigFile::default()
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    let entry_file = overrides.entry.or(file.entry_file).ok_or_else(|| {
        Error::config("`entryFile` is required (set it in the config file or pass --entry)")
    })?;

    Ok(Config {
        tsconfig_path: overrides
            .tsconfig
            .or(file.tsconfig_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TSCONFIG)),
        entry_file,
        target_type_name: overrides
            .target
            .or(file.target_type_name)
            .unwrap_or_else(|| DEFAULT_TARGET.to_string()),
        source_paths: file.source_paths,
        out_file: overrides
            .out
            .or(file.out_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_FILE)),
        verbose: overrides.verbose || file.verbose.unwrap_or(false),
    })
}
