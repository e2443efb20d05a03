//! Structural role classification for syntax nodes.
//!
//! Classification is textual and structural (node kind + parent kind + text
//! suffix); there is no semantic model behind it. A user member that happens
//! to share a reserved suffix (a property literally named `.use`, say) is a
//! known false positive. The matched names live in [`Vocabulary`] so callers
//! can adapt them instead of patching string literals.

use crate::syntax::{NodeKind, SyntaxNode};

/// The names that mark each structural role.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Suffix marking retrieval of per-call request context.
    pub context_suffix: String,
    /// Suffix marking middleware registration.
    pub middleware_suffix: String,
    /// Suffixes marking leaf endpoint registration.
    pub procedure_suffixes: Vec<String>,
    /// Callee identifier of the router factory.
    pub router_name: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary {
            context_suffix: ".context".to_string(),
            middleware_suffix: ".use".to_string(),
            procedure_suffixes: vec![
                ".query".to_string(),
                ".mutation".to_string(),
                ".subscription".to_string(),
            ],
            router_name: "router".to_string(),
        }
    }
}

impl Vocabulary {
    /// Property access whose textual suffix is the context accessor.
    pub fn is_context(&self, node: &SyntaxNode<'_>) -> bool {
        node.kind() == NodeKind::PropertyAccess && node.text().ends_with(&self.context_suffix)
    }

    /// Property access whose textual suffix is the middleware registrar.
    pub fn is_middleware(&self, node: &SyntaxNode<'_>) -> bool {
        node.kind() == NodeKind::PropertyAccess && node.text().ends_with(&self.middleware_suffix)
    }

    /// Property access whose textual suffix is one of the procedure
    /// registrars (query, mutation, subscription).
    pub fn is_procedure(&self, node: &SyntaxNode<'_>) -> bool {
        node.kind() == NodeKind::PropertyAccess
            && self
                .procedure_suffixes
                .iter()
                .any(|suffix| node.text().ends_with(suffix))
    }

    /// Identifier naming the router factory, directly under a call
    /// expression.
    pub fn is_router(&self, node: &SyntaxNode<'_>) -> bool {
        node.kind() == NodeKind::Identifier
            && node.parent().map(|p| p.kind()) == Some(NodeKind::CallExpression)
            && node.text() == self.router_name
    }

    /// Cheap prefilter for the property-access pass: does the text end with
    /// any suffix a dynamic predicate could match?
    pub fn matches_dynamic_suffix(&self, text: &str) -> bool {
        text.ends_with(&self.context_suffix)
            || text.ends_with(&self.middleware_suffix)
            || self
                .procedure_suffixes
                .iter()
                .any(|suffix| text.ends_with(suffix))
    }
}

/// Identifier that declares the type alias named `target`.
///
/// The node must be the alias declaration's *name*, not a type reference in
/// its value (`type X = AppRouter` does not declare `AppRouter`).
pub fn is_target_alias(node: &SyntaxNode<'_>, target: &str) -> bool {
    if node.kind() != NodeKind::Identifier || node.text() != target {
        return false;
    }
    let Some(parent) = node.parent() else {
        return false;
    };
    parent.kind() == NodeKind::TypeAliasDeclaration
        && parent
            .child_by_field("name")
            .is_some_and(|name| name.id() == node.id())
}
