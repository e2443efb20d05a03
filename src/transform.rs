//! The rewrite engine: collect-then-apply tree transformations.
//!
//! Traversal and mutation are strictly separated. A traversal pass walks
//! every tree, classifies candidate nodes, and records [`Transformation`]s
//! in a [`TransformationPlan`]; nothing touches the trees until
//! [`TransformationPlan::apply`] runs. Spans recorded during traversal are
//! resolved against the pristine text, so earlier edits can never
//! invalidate later ones.

use std::collections::HashSet;
use std::ops::Range;

use crate::ast::next_sibling_of_kind;
use crate::error::{Error, Result};
use crate::predicates::Vocabulary;
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};

/// Replacement for a procedure implementation argument list. The builder
/// chain before it (`.input(...)`, `.output(...)`) is untouched, so the
/// declared contracts stay inferable while the body disappears.
pub const PROCEDURE_STUB: &str = "(() => undefined as any)";

/// Replacement for the type-argument list of a context accessor:
/// `initTRPC.context<Ctx>()` becomes `initTRPC.context<any>()`.
pub const CONTEXT_STUB: &str = "<any>";

/// Replacement for a middleware registration argument list; a pass-through
/// middleware that keeps the chain type-valid without the original logic.
pub const MIDDLEWARE_STUB: &str = "(t.middleware(({ ctx, next }) => next({ ctx })))";

/// Which rule produced a transformation. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteRole {
    Context,
    Middleware,
    Procedure,
}

/// One deferred mutation: a span in one tree and its replacement text.
#[derive(Debug)]
pub struct Transformation {
    pub tree: usize,
    pub span: Range<usize>,
    pub replacement: String,
    pub role: RewriteRole,
}

/// The ordered transformation set collected by one traversal.
///
/// Deduplicates by target span: a procedure chain inside a nested router is
/// reachable both transitively from the outer router and from the nested
/// router's own registration match, and must receive exactly one stub.
/// [`TransformationPlan::normalize`] then drops transformations nested
/// inside another planned span, so a vocabulary-suffix call inside a
/// handler body (`db.query(...)` being the usual one) never fights the stub
/// that deletes the body around it.
#[derive(Debug, Default)]
pub struct TransformationPlan {
    edits: Vec<Transformation>,
    planned: HashSet<(usize, usize)>,
}

impl TransformationPlan {
    /// Record a transformation unless its span is already claimed.
    pub fn push(&mut self, transformation: Transformation) -> bool {
        if !self
            .planned
            .insert((transformation.tree, transformation.span.start))
        {
            tracing::trace!(?transformation, "span already planned, skipping");
            return false;
        }
        self.edits.push(transformation);
        true
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transformation> {
        self.edits.iter()
    }

    /// Drop every transformation whose span lies inside another planned
    /// span on the same tree.
    ///
    /// Only the outermost rewrite of a region is a real registration; an
    /// access matched inside an implementation body is part of the text the
    /// outer stub deletes. Keeping both would hand overlapping spans to the
    /// applier. Partial overlaps are left in place for the applier's
    /// disjointness check to reject.
    pub fn normalize(&mut self) {
        self.edits.sort_by(|a, b| {
            (a.tree, a.span.start, std::cmp::Reverse(a.span.end))
                .cmp(&(b.tree, b.span.start, std::cmp::Reverse(b.span.end)))
        });
        let mut kept: Option<(usize, usize)> = None;
        self.edits.retain(|edit| {
            if let Some((tree, end)) = kept {
                if edit.tree == tree && edit.span.end <= end {
                    tracing::trace!(?edit, "nested inside a planned rewrite, dropping");
                    return false;
                }
            }
            kept = Some((edit.tree, edit.span.end));
            true
        });
    }

    /// Apply every transformation exactly once. Each tree is spliced and
    /// reparsed in a single step; a failure aborts the run.
    pub fn apply(self, trees: &mut [SyntaxTree]) -> Result<()> {
        let mut per_tree: Vec<Vec<(Range<usize>, String)>> = vec![Vec::new(); trees.len()];
        for edit in self.edits {
            per_tree[edit.tree].push((edit.span, edit.replacement));
        }
        for (index, edits) in per_tree.into_iter().enumerate() {
            if !edits.is_empty() {
                trees[index].apply_edits(&edits)?;
            }
        }
        Ok(())
    }
}

/// A classification predicate paired with the rewrite it triggers.
pub struct Rule<'v> {
    pub matches: Box<dyn Fn(&SyntaxNode<'_>) -> bool + 'v>,
    pub rewrite: Box<dyn Fn(SyntaxNode<'_>, usize, &mut TransformationPlan) -> Result<()> + 'v>,
}

/// Traverse every tree and collect the full transformation plan.
///
/// Two passes per tree, both depth-first in source order. The first visits
/// property-access nodes (the only kind the dynamic suffix predicates can
/// match) and evaluates `access_rules` in declared order, applying the
/// first match only. The second visits identifiers and evaluates
/// `identifier_rules` the same way; router registration is a call-callee
/// identifier, a structurally different kind, which is why it cannot share
/// the first pass.
pub fn collect_transformations(
    trees: &[SyntaxTree],
    vocab: &Vocabulary,
    access_rules: &[Rule<'_>],
    identifier_rules: &[Rule<'_>],
) -> Result<TransformationPlan> {
    let mut plan = TransformationPlan::default();
    let mut visited = 0usize;

    for (index, tree) in trees.iter().enumerate() {
        for node in tree.root().descendants_of_kind(NodeKind::PropertyAccess) {
            visited += 1;
            if !vocab.matches_dynamic_suffix(node.text()) {
                continue;
            }
            for rule in access_rules {
                if (rule.matches)(&node) {
                    (rule.rewrite)(node, index, &mut plan)?;
                    break;
                }
            }
        }

        for node in tree.root().descendants_of_kind(NodeKind::Identifier) {
            visited += 1;
            for rule in identifier_rules {
                if (rule.matches)(&node) {
                    (rule.rewrite)(node, index, &mut plan)?;
                    break;
                }
            }
        }
    }

    plan.normalize();
    tracing::debug!(
        visited,
        transformations = plan.len(),
        "collected transformation plan"
    );
    Ok(plan)
}

/// Rewrite that replaces the syntax-list sibling of the matched access with
/// a fixed stub.
pub fn redefine(
    text: &'static str,
    role: RewriteRole,
) -> Box<dyn Fn(SyntaxNode<'_>, usize, &mut TransformationPlan) -> Result<()>> {
    Box::new(move |node, tree, plan| {
        let sibling = next_sibling_of_kind(node, NodeKind::SyntaxList)?;
        plan.push(Transformation {
            tree,
            span: sibling.byte_range(),
            replacement: text.to_string(),
            role,
        });
        Ok(())
    })
}

/// Rewrite triggered by a router registration: stub every procedure
/// implementation reachable from the router's entry map.
///
/// Descends into each property assignment whose value is a call expression
/// and plans one procedure stub per procedure-registration access in its
/// subtree. Nested `router(...)` values are covered by the same descendant
/// scan, so arbitrarily deep compositions flatten into this plan. Values
/// that are not calls produce no transformations. Matches found inside an
/// implementation body also land in the plan here; plan normalization
/// discards them along with the body they sit in.
pub fn prune_procedure_implementations<'v>(
    vocab: &'v Vocabulary,
) -> Box<dyn Fn(SyntaxNode<'_>, usize, &mut TransformationPlan) -> Result<()> + 'v> {
    Box::new(move |node, tree, plan| {
        let call = node.parent().ok_or_else(|| {
            Error::malformed(format!("router identifier `{}` has no parent call", node.text()))
        })?;
        let entries = call
            .first_descendant_of_kind(NodeKind::ObjectLiteral)
            .ok_or_else(|| Error::not_found("router entry map (object literal argument)"))?;

        for pair in entries.children_of_kind(NodeKind::PropertyAssignment) {
            // Grammar recovery keeps truncated entries (`a: ,`) out of the
            // property-assignment shape entirely, so this guard fires only
            // if the grammar's pair fields ever change underneath us.
            let key = pair.child_by_field("key");
            let value = pair.child_by_field("value");
            let (Some(_key), Some(value)) = (key, value) else {
                return Err(Error::malformed(format!(
                    "router entry `{}` is missing its key or value",
                    pair.text()
                )));
            };

            if value.kind() != NodeKind::CallExpression {
                continue;
            }

            for access in pair.descendants_of_kind(NodeKind::PropertyAccess) {
                if vocab.is_procedure(&access) {
                    let args = next_sibling_of_kind(access, NodeKind::SyntaxList)?;
                    plan.push(Transformation {
                        tree,
                        span: args.byte_range(),
                        replacement: PROCEDURE_STUB.to_string(),
                        role: RewriteRole::Procedure,
                    });
                }
            }
        }
        Ok(())
    })
}
