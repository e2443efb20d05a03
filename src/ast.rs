//! Node lookup helpers shared by the rewrite engine and the orchestrator.

use crate::error::{Error, Result};
use crate::predicates::is_target_alias;
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};

/// First following sibling of the given kind.
///
/// Used to reach the argument or type-argument list that trails a matched
/// property access; its absence means the access is not the call shape the
/// rewrite expects.
pub fn next_sibling_of_kind<'t>(
    node: SyntaxNode<'t>,
    kind: NodeKind,
) -> Result<SyntaxNode<'t>> {
    node.next_siblings()
        .find(|sibling| sibling.kind() == kind)
        .ok_or_else(|| {
            Error::not_found(format!(
                "no following sibling of kind {kind:?} after `{}`",
                node.text()
            ))
        })
}

/// Locate the unique type-alias declaration named `target` in the entry
/// tree.
///
/// A single linear scan over identifier nodes in source order. Zero matches
/// is a hard failure, and so is more than one: silently picking an alias
/// would hand the backend an arbitrary public type.
pub fn locate_target<'t>(tree: &'t SyntaxTree, target: &str) -> Result<SyntaxNode<'t>> {
    let mut found: Option<SyntaxNode<'t>> = None;
    let mut visited = 0usize;

    for node in tree.root().descendants_of_kind(NodeKind::Identifier) {
        visited += 1;
        if is_target_alias(&node, target) {
            if found.is_some() {
                return Err(Error::ambiguous_target(target));
            }
            found = Some(node);
        }
    }

    tracing::debug!(
        visited,
        file = %tree.path().display(),
        "scanned entry tree for target alias"
    );

    found.ok_or_else(|| {
        Error::not_found(format!(
            "type alias `{target}` in {}",
            tree.path().display()
        ))
    })
}
