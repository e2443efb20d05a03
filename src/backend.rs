//! Declaration emission backends.
//!
//! The rewrite pipeline does not type-check anything itself; it hands the
//! rewritten sources to an external emitter and passes its output through
//! unchanged. [`TscBackend`] shells out to the TypeScript compiler; tests
//! substitute their own [`DeclarationBackend`] impl.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::project_root;
use crate::error::{Error, Result};
use crate::syntax::SyntaxTree;

/// External type-checking/emission backend.
pub trait DeclarationBackend {
    /// Emit the type declaration for the entry tree, given the full
    /// rewritten source set. Returns the declaration text verbatim.
    fn emit(&self, trees: &[SyntaxTree], entry: usize, tsconfig: &Path) -> Result<String>;
}

/// Backend that invokes `tsc --declaration --emitDeclarationOnly` on a
/// temporary mirror of the rewritten sources.
#[derive(Debug, Clone)]
pub struct TscBackend {
    /// Compiler executable; `tsc` on PATH by default.
    pub compiler: PathBuf,
}

impl Default for TscBackend {
    fn default() -> Self {
        TscBackend {
            compiler: PathBuf::from("tsc"),
        }
    }
}

impl DeclarationBackend for TscBackend {
    fn emit(&self, trees: &[SyntaxTree], entry: usize, tsconfig: &Path) -> Result<String> {
        let root = project_root(tsconfig);
        let staging = tempfile::tempdir().map_err(|e| Error::io(Path::new("tempdir"), e))?;

        stage_sources(trees, root, staging.path())?;
        write_emit_tsconfig(tsconfig, staging.path())?;

        let output = Command::new(&self.compiler)
            .arg("--project")
            .arg("tsconfig.json")
            .current_dir(staging.path())
            .output()
            .map_err(|e| {
                Error::backend(format!(
                    "failed to launch `{}`: {e} (is TypeScript installed?)",
                    self.compiler.display()
                ))
            })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::backend(format!(
                "tsc exited with {}:\n{stdout}{stderr}",
                output.status
            )));
        }

        let entry_path = trees[entry].path();
        let stem = entry_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::backend(format!("unusable entry path {}", entry_path.display())))?;
        let declaration_name = format!("{stem}.d.ts");

        let out_dir = staging.path().join(EMIT_OUT_DIR);
        let declaration = find_file(&out_dir, &declaration_name)
            .ok_or_else(|| Error::backend(format!("tsc produced no {declaration_name}")))?;
        std::fs::read_to_string(&declaration).map_err(|e| Error::io(&declaration, e))
    }
}

const EMIT_OUT_DIR: &str = "dist";

/// Mirror the rewritten sources under `staging`, preserving their layout
/// relative to the project root.
///
/// Two sources may not land on the same staging path; that happens when
/// out-of-root files share a file name, and silently letting the second
/// overwrite the first would hand `tsc` the wrong source.
fn stage_sources(trees: &[SyntaxTree], root: &Path, staging: &Path) -> Result<()> {
    let mut staged: HashSet<PathBuf> = HashSet::new();
    for tree in trees {
        let rel = relative_to(tree.path(), root);
        if !staged.insert(rel.to_path_buf()) {
            return Err(Error::config(format!(
                "`{}` collides with another source at staging path `{}`; move it under the project root {}",
                tree.path().display(),
                rel.display(),
                root.display()
            )));
        }
        let dest = staging.join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(&dest, tree.text()).map_err(|e| Error::io(&dest, e))?;
    }
    Ok(())
}

fn relative_to<'p>(path: &'p Path, root: &Path) -> &'p Path {
    path.strip_prefix(root).unwrap_or_else(|_| {
        // Outside the project root; mirror by file name only.
        path.file_name().map(Path::new).unwrap_or(path)
    })
}

/// Copy the project tsconfig into the staging directory, forcing the
/// compiler options declaration emission needs.
fn write_emit_tsconfig(tsconfig: &Path, staging: &Path) -> Result<()> {
    let text = std::fs::read_to_string(tsconfig).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::not_found(format!("tsconfig at {}", tsconfig.display()))
        }
        _ => Error::io(tsconfig, e),
    })?;
    let mut json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| Error::config(format!("invalid tsconfig {}: {e}", tsconfig.display())))?;

    let options = json
        .as_object_mut()
        .ok_or_else(|| Error::config(format!("tsconfig {} is not an object", tsconfig.display())))?
        .entry("compilerOptions")
        .or_insert_with(|| serde_json::json!({}));
    let options = options
        .as_object_mut()
        .ok_or_else(|| Error::config("tsconfig compilerOptions is not an object"))?;
    options.insert("declaration".to_string(), serde_json::json!(true));
    options.insert("emitDeclarationOnly".to_string(), serde_json::json!(true));
    options.insert("noEmit".to_string(), serde_json::json!(false));
    options.insert("outDir".to_string(), serde_json::json!(EMIT_OUT_DIR));

    let dest = staging.join("tsconfig.json");
    let rendered = serde_json::to_string_pretty(&json)?;
    std::fs::write(&dest, rendered).map_err(|e| Error::io(&dest, e))
}

fn find_file(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().and_then(|n| n.to_str()) == Some(name) {
            return Some(path);
        }
    }
    subdirs.into_iter().find_map(|sub| find_file(&sub, name))
}
