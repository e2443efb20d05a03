//! Pipeline orchestration: load trees, rewrite, normalize, emit.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::ast::locate_target;
use crate::backend::{DeclarationBackend, TscBackend};
use crate::config::{Config, project_root};
use crate::error::{Error, Result};
use crate::predicates::Vocabulary;
use crate::syntax::SyntaxTree;
use crate::transform::{
    CONTEXT_STUB, MIDDLEWARE_STUB, RewriteRole, Rule, collect_transformations,
    prune_procedure_implementations, redefine,
};

/// Run the full pipeline with the default `tsc` backend.
pub fn generate(config: &Config) -> Result<String> {
    generate_with_backend(config, &TscBackend::default())
}

/// Run the full pipeline against a caller-supplied emission backend.
///
/// Any stage failure aborts the run; there is no partial-success mode.
pub fn generate_with_backend(
    config: &Config,
    backend: &dyn DeclarationBackend,
) -> Result<String> {
    timed("total", || {
        let vocab = Vocabulary::default();

        let mut trees = timed("load sources", || load_sources(config))?;
        timed("rewrite sources", || rewrite_sources(&mut trees, &vocab))?;

        let entry = entry_index(&trees, &config.entry_file)?;
        timed("normalize target alias", || {
            let span = locate_target(&trees[entry], &config.target_type_name)?.byte_range();
            trees[entry].apply_edits(&[(span, config.target_type_name.clone())])
        })?;

        timed("emit declaration", || {
            backend.emit(&trees, entry, &config.tsconfig_path)
        })
    })
}

/// Collect and apply the rewrite plan over `trees`. Returns the number of
/// transformations applied.
pub fn rewrite_sources(trees: &mut [SyntaxTree], vocab: &Vocabulary) -> Result<usize> {
    let access_rules = vec![
        Rule {
            matches: Box::new(move |node| vocab.is_context(node)),
            rewrite: redefine(CONTEXT_STUB, RewriteRole::Context),
        },
        Rule {
            matches: Box::new(move |node| vocab.is_middleware(node)),
            rewrite: redefine(MIDDLEWARE_STUB, RewriteRole::Middleware),
        },
    ];
    let identifier_rules = vec![Rule {
        matches: Box::new(move |node| vocab.is_router(node)),
        rewrite: prune_procedure_implementations(vocab),
    }];

    let plan = collect_transformations(trees, vocab, &access_rules, &identifier_rules)?;
    let count = plan.len();
    plan.apply(trees)?;
    Ok(count)
}

fn load_sources(config: &Config) -> Result<Vec<SyntaxTree>> {
    let paths = match &config.source_paths {
        Some(paths) => paths.clone(),
        None => discover_sources(project_root(&config.tsconfig_path))?,
    };

    let mut trees = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        trees.push(SyntaxTree::parse(path, text)?);
    }
    tracing::debug!(trees = trees.len(), "loaded source files");
    Ok(trees)
}

/// Walk the project root for TypeScript sources, skipping build output and
/// dependency directories.
fn discover_sources(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root, &mut found)?;
    found.sort();
    if found.is_empty() {
        return Err(Error::not_found(format!(
            "TypeScript sources under {}",
            root.display()
        )));
    }
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if path.is_dir() {
            if name == "node_modules" || name == "dist" || name.starts_with('.') {
                continue;
            }
            walk(&path, found)?;
        } else if is_source_file(&path) {
            found.push(path);
        }
    }
    Ok(())
}

fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    (name.ends_with(".ts") || name.ends_with(".tsx")) && !name.ends_with(".d.ts")
}

fn entry_index(trees: &[SyntaxTree], entry: &Path) -> Result<usize> {
    trees
        .iter()
        .position(|tree| tree.path() == entry || tree.path().ends_with(entry))
        .ok_or_else(|| {
            Error::not_found(format!(
                "entry file `{}` among loaded sources",
                entry.display()
            ))
        })
}

/// Labeled timing hook around each stage.
fn timed<T>(stage: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    tracing::debug!(stage, elapsed = ?start.elapsed(), "stage finished");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(path: &str, src: &str) -> SyntaxTree {
        SyntaxTree::parse(PathBuf::from(path), src.to_string()).expect("parse")
    }

    #[test]
    fn test_entry_index_matches_suffix() {
        let trees = vec![
            tree("project/src/trpc.ts", "export const x = 1;"),
            tree("project/src/router.ts", "export const y = 2;"),
        ];
        let index = entry_index(&trees, Path::new("src/router.ts")).expect("entry");
        assert_eq!(index, 1);
    }

    #[test]
    fn test_entry_index_missing() {
        let trees = vec![tree("a.ts", "const a = 1;")];
        let err = entry_index(&trees, Path::new("missing.ts")).expect_err("missing");
        assert!(matches!(err.kind(), crate::ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("src/router.ts")));
        assert!(is_source_file(Path::new("src/App.tsx")));
        assert!(!is_source_file(Path::new("types/api.d.ts")));
        assert!(!is_source_file(Path::new("src/main.rs")));
    }

    #[test]
    fn test_discover_sources_skips_dependencies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).expect("dirs");
        std::fs::create_dir_all(root.join("node_modules/pkg")).expect("dirs");
        std::fs::write(root.join("src/router.ts"), "const a = 1;").expect("write");
        std::fs::write(root.join("src/api.d.ts"), "export {};").expect("write");
        std::fs::write(root.join("node_modules/pkg/index.ts"), "const b = 2;").expect("write");

        let sources = discover_sources(root).expect("discover");
        assert_eq!(sources.len(), 1);
        assert!(sources[0].ends_with("src/router.ts"));
    }

    #[test]
    fn test_rewrite_sources_counts_transformations() {
        let vocab = Vocabulary::default();
        let mut trees = vec![tree(
            "router.ts",
            "const t = initTRPC.context<Ctx>().create();\n\
             const appRouter = router({ ping: procedure.query(() => 'pong') });\n",
        )];
        let count = rewrite_sources(&mut trees, &vocab).expect("rewrite");
        assert_eq!(count, 2);
        assert!(trees[0].text().contains("context<any>()"));
        assert!(trees[0].text().contains("(() => undefined as any)"));
    }
}
