//! End-to-end rewrite tests over a realistic router fixture.
//!
//! The fixture mirrors a common tRPC layout: a root `health` procedure and
//! two nested sub-routers (`users`, `misc`), with arktype contracts. The
//! declaration emitter itself is replaced by a backend that echoes the
//! rewritten entry source, so these tests pin down exactly what the
//! external checker would see.

use std::path::{Path, PathBuf};

use xtrpc::ast::locate_target;
use xtrpc::backend::DeclarationBackend;
use xtrpc::predicates::Vocabulary;
use xtrpc::syntax::SyntaxTree;
use xtrpc::xtrpc::rewrite_sources;
use xtrpc::{Config, Result};

const TRPC_TS: &str = include_str!("fixtures/trpc.ts");
const ROUTER_TS: &str = include_str!("fixtures/router.ts");
const ROUTER_ZOD_TS: &str = include_str!("fixtures/router_zod.ts");

fn fixture_trees() -> Vec<SyntaxTree> {
    vec![
        SyntaxTree::parse(PathBuf::from("src/trpc.ts"), TRPC_TS.to_string()).expect("parse trpc"),
        SyntaxTree::parse(PathBuf::from("src/router.ts"), ROUTER_TS.to_string())
            .expect("parse router"),
    ]
}

fn rewritten() -> (Vec<SyntaxTree>, usize) {
    let vocab = Vocabulary::default();
    let mut trees = fixture_trees();
    let count = rewrite_sources(&mut trees, &vocab).expect("rewrite");
    (trees, count)
}

#[test]
fn test_every_procedure_chain_gets_exactly_one_stub() {
    let (trees, _) = rewritten();
    let router = trees[1].text();

    // health, users.list, users.get, users.create, misc.create
    assert_eq!(router.matches("(() => undefined as any)").count(), 5);
    assert_eq!(router.matches(".query").count(), 3);
    assert_eq!(router.matches(".mutation").count(), 2);
}

#[test]
fn test_transformation_count_is_stable() {
    let (_, count) = rewritten();
    // 5 procedure stubs + 1 context stub + 1 middleware stub.
    assert_eq!(count, 7);
}

#[test]
fn test_contracts_survive_rewriting() {
    let (trees, _) = rewritten();
    let router = trees[1].text();

    assert!(router.contains("'limit?': 'number'"));
    assert!(router.contains("email: 'string'"));
    assert!(router.contains("status: 'string'"));
    assert!(router.contains(".array()"));
    assert!(router.contains("title: 'string'"));
}

#[test]
fn test_zod_contracts_survive_rewriting() {
    let vocab = Vocabulary::default();
    let mut trees = vec![
        SyntaxTree::parse(PathBuf::from("src/trpc.ts"), TRPC_TS.to_string()).expect("parse trpc"),
        SyntaxTree::parse(PathBuf::from("src/router.ts"), ROUTER_ZOD_TS.to_string())
            .expect("parse router"),
    ];
    let count = rewrite_sources(&mut trees, &vocab).expect("rewrite");
    let router = trees[1].text();

    // health, posts.list, posts.create stubs plus the context and
    // middleware stubs from trpc.ts.
    assert_eq!(count, 5);
    assert_eq!(router.matches("(() => undefined as any)").count(), 3);
    assert!(router.contains("'limit': z.number().optional()"));
    assert!(router.contains("tags: z.array(z.string()).optional()"));
    assert!(router.contains("body: z.string().nullable()"));
    assert!(router.contains("createdAt: z.date()"));
}

#[test]
fn test_zod_handler_database_call_is_removed_with_the_body() {
    let vocab = Vocabulary::default();
    let mut trees = vec![SyntaxTree::parse(
        PathBuf::from("src/router.ts"),
        ROUTER_ZOD_TS.to_string(),
    )
    .expect("parse router")];
    rewrite_sources(&mut trees, &vocab).expect("rewrite");
    let router = trees[0].text();

    // `ctx.db.query(...)` inside the list handler shares the procedure
    // suffix but is part of the discarded body, not a registration.
    assert!(!router.contains("ctx.db.query"));
    assert!(!router.contains("'post-629'"));
    assert!(router.contains("list: procedure"));
}

#[test]
fn test_runtime_tokens_are_gone() {
    let (trees, _) = rewritten();
    let router = trees[1].text();

    assert!(!router.contains("'healthy'"));
    assert!(!router.contains("Date.now()"));
    assert!(!router.contains("'Test User'"));
    assert!(!router.contains("user@example.com"));
    assert!(!router.contains("'user-313'"));
    assert!(!router.contains("'misc-456'"));
    assert!(!router.contains("input.title"));
}

#[test]
fn test_context_and_middleware_are_stubbed() {
    let (trees, _) = rewritten();
    let trpc = trees[0].text();

    assert!(trpc.contains("initTRPC.context<any>().create()"));
    assert!(trpc.contains(".use(t.middleware(({ ctx, next }) => next({ ctx })))"));
    assert!(!trpc.contains("console.log"));
    // The interface declaration itself is untouched.
    assert!(trpc.contains("export interface AppContext"));
}

#[test]
fn test_rewrite_is_idempotent_on_output() {
    let vocab = Vocabulary::default();
    let (mut trees, _) = rewritten();
    let first: Vec<String> = trees.iter().map(|t| t.text().to_string()).collect();

    rewrite_sources(&mut trees, &vocab).expect("second rewrite");
    let second: Vec<String> = trees.iter().map(|t| t.text().to_string()).collect();

    assert_eq!(first, second);
}

#[test]
fn test_target_alias_located_and_normalized() {
    let (mut trees, _) = rewritten();
    let span = locate_target(&trees[1], "AppRouter").expect("target").byte_range();
    trees[1]
        .apply_edits(&[(span, "AppRouter".to_string())])
        .expect("normalize");
    assert!(trees[1].text().contains("export type AppRouter = typeof appRouter;"));
}

/// Backend that returns the rewritten entry source instead of invoking the
/// TypeScript compiler.
struct EchoBackend;

impl DeclarationBackend for EchoBackend {
    fn emit(&self, trees: &[SyntaxTree], entry: usize, _tsconfig: &Path) -> Result<String> {
        Ok(trees[entry].text().to_string())
    }
}

#[test]
fn test_generate_with_backend_full_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).expect("dirs");
    std::fs::write(src.join("trpc.ts"), TRPC_TS).expect("write trpc");
    std::fs::write(src.join("router.ts"), ROUTER_TS).expect("write router");

    let config = Config {
        tsconfig_path: dir.path().join("tsconfig.json"),
        entry_file: src.join("router.ts"),
        target_type_name: "AppRouter".to_string(),
        source_paths: Some(vec![src.join("trpc.ts"), src.join("router.ts")]),
        out_file: dir.path().join("types/api.d.ts"),
        verbose: false,
    };

    let declaration = xtrpc::generate_with_backend(&config, &EchoBackend).expect("generate");

    assert_eq!(declaration.matches("(() => undefined as any)").count(), 5);
    assert!(declaration.contains("export type AppRouter = typeof appRouter;"));
    assert!(!declaration.contains("'healthy'"));
}

#[test]
fn test_generate_fails_without_target_alias() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = dir.path().join("router.ts");
    std::fs::write(&entry, "export const appRouter = router({});\n").expect("write");

    let config = Config {
        tsconfig_path: dir.path().join("tsconfig.json"),
        entry_file: entry.clone(),
        target_type_name: "AppRouter".to_string(),
        source_paths: Some(vec![entry]),
        out_file: dir.path().join("types/api.d.ts"),
        verbose: false,
    };

    let err = xtrpc::generate_with_backend(&config, &EchoBackend).expect_err("no alias");
    assert!(matches!(err.kind(), xtrpc::ErrorKind::NotFound(_)));
}
