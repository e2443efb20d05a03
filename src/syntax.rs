//! TypeScript syntax trees and the structural node vocabulary.
//!
//! The rewrite engine never works against raw grammar kinds. Every
//! tree-sitter node is viewed through [`NodeKind`], a closed enumeration of
//! the structural roles the pipeline cares about; everything else collapses
//! to [`NodeKind::Other`].

use std::ops::Range;
use std::path::{Path, PathBuf};

use ropey::Rope;
use tree_sitter::{Language, Parser, Tree};

use crate::error::{Error, Result};

/// Structural kind of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Identifier,
    PropertyAccess,
    CallExpression,
    ObjectLiteral,
    PropertyAssignment,
    TypeAliasDeclaration,
    /// A bracketed argument or type-argument list following a callee.
    SyntaxList,
    Other,
}

impl NodeKind {
    fn from_grammar(kind: &str) -> Self {
        match kind {
            "identifier" | "type_identifier" | "property_identifier" => NodeKind::Identifier,
            "member_expression" => NodeKind::PropertyAccess,
            "call_expression" => NodeKind::CallExpression,
            "object" => NodeKind::ObjectLiteral,
            "pair" => NodeKind::PropertyAssignment,
            "type_alias_declaration" => NodeKind::TypeAliasDeclaration,
            "arguments" | "type_arguments" => NodeKind::SyntaxList,
            _ => NodeKind::Other,
        }
    }
}

fn language_for(path: &Path) -> Language {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsx") => tree_sitter_typescript::LANGUAGE_TSX.into(),
        _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    }
}

/// One parsed source unit: the source text plus its tree-sitter tree.
///
/// The tree is read-only during traversal; all mutation goes through
/// [`SyntaxTree::apply_edits`], which splices the text and reparses.
pub struct SyntaxTree {
    path: PathBuf,
    text: String,
    tree: Tree,
}

impl SyntaxTree {
    pub fn parse(path: PathBuf, text: String) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&language_for(&path))
            .map_err(|e| Error::parse(&path, e))?;
        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| Error::parse(&path, "parser produced no tree"))?;
        Ok(SyntaxTree { path, text, tree })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            node: self.tree.root_node(),
            tree: self,
        }
    }

    /// Splice replacement text over the given byte ranges and reparse.
    ///
    /// Ranges are resolved against the pre-edit text and must be disjoint;
    /// overlapping ranges mean two rewrites claimed the same source region,
    /// which the role-separated rule set never produces on recognized input.
    pub fn apply_edits(&mut self, edits: &[(Range<usize>, String)]) -> Result<()> {
        let mut ordered: Vec<&(Range<usize>, String)> = edits.iter().collect();
        ordered.sort_by_key(|(range, _)| range.start);
        for pair in ordered.windows(2) {
            let (first, _) = pair[0];
            let (second, _) = pair[1];
            if second.start < first.end {
                return Err(Error::malformed(format!(
                    "overlapping rewrites at bytes {}..{} and {}..{} in {}",
                    first.start,
                    first.end,
                    second.start,
                    second.end,
                    self.path.display(),
                )));
            }
        }

        // Back-to-front, so earlier ranges stay valid while later ones are
        // spliced.
        let mut rope = Rope::from_str(&self.text);
        for (range, replacement) in ordered.into_iter().rev() {
            let start = rope.byte_to_char(range.start);
            let end = rope.byte_to_char(range.end);
            rope.remove(start..end);
            rope.insert(start, replacement);
        }

        let path = std::mem::take(&mut self.path);
        *self = SyntaxTree::parse(path, rope.to_string())?;
        Ok(())
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("path", &self.path)
            .field("bytes", &self.text.len())
            .finish()
    }
}

/// A non-owning structural locator into a [`SyntaxTree`].
///
/// Valid only until the next mutation of the owning tree.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: tree_sitter::Node<'t>,
    tree: &'t SyntaxTree,
}

impl<'t> SyntaxNode<'t> {
    pub fn kind(self) -> NodeKind {
        NodeKind::from_grammar(self.node.kind())
    }

    pub fn grammar_kind(self) -> &'static str {
        self.node.kind()
    }

    pub fn text(self) -> &'t str {
        &self.tree.text[self.node.byte_range()]
    }

    pub fn byte_range(self) -> Range<usize> {
        self.node.byte_range()
    }

    /// Stable identity within the current tree revision.
    pub fn id(self) -> usize {
        self.node.id()
    }

    pub fn parent(self) -> Option<SyntaxNode<'t>> {
        let tree = self.tree;
        self.node.parent().map(|node| SyntaxNode { node, tree })
    }

    pub fn child_by_field(self, field: &str) -> Option<SyntaxNode<'t>> {
        let tree = self.tree;
        self.node
            .child_by_field_name(field)
            .map(|node| SyntaxNode { node, tree })
    }

    /// Following siblings in source order, including unnamed nodes.
    pub fn next_siblings(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        let tree = self.tree;
        std::iter::successors(self.node.next_sibling(), |n| n.next_sibling())
            .map(move |node| SyntaxNode { node, tree })
    }

    pub fn children(self) -> Vec<SyntaxNode<'t>> {
        let tree = self.tree;
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|node| SyntaxNode { node, tree })
            .collect()
    }

    pub fn children_of_kind(self, kind: NodeKind) -> Vec<SyntaxNode<'t>> {
        self.children()
            .into_iter()
            .filter(|child| child.kind() == kind)
            .collect()
    }

    /// All descendants in depth-first source order, excluding `self`.
    pub fn descendants(self) -> Vec<SyntaxNode<'t>> {
        let mut out = Vec::new();
        collect_descendants(self.node, self.tree, &mut out);
        out
    }

    pub fn descendants_of_kind(self, kind: NodeKind) -> Vec<SyntaxNode<'t>> {
        self.descendants()
            .into_iter()
            .filter(|node| node.kind() == kind)
            .collect()
    }

    pub fn first_descendant_of_kind(self, kind: NodeKind) -> Option<SyntaxNode<'t>> {
        self.descendants().into_iter().find(|node| node.kind() == kind)
    }
}

fn collect_descendants<'t>(
    node: tree_sitter::Node<'t>,
    tree: &'t SyntaxTree,
    out: &mut Vec<SyntaxNode<'t>>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        out.push(SyntaxNode { node: child, tree });
        collect_descendants(child, tree, out);
    }
}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}({}) @ {:?}",
            self.kind(),
            self.grammar_kind(),
            self.byte_range()
        )
    }
}
