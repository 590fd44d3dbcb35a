//! Debug dump of a tree.

use std::fmt::Write;
use std::sync::Arc;

use crate::kind::NodeSet;
use crate::tree::{Navigate, SyntaxNode, Tree};

/// Renders `tree` one node per line, indented by depth, as
/// `Name [from..to]`. Leaves also show their text from `text`.
#[must_use]
pub fn print_tree(tree: &Arc<Tree>, text: &str, names: &NodeSet) -> String {
    let mut out = String::new();
    print_node(&tree.top_node(), text, names, 0, &mut out);
    out
}

fn print_node(node: &SyntaxNode, text: &str, names: &NodeSet, depth: usize, out: &mut String) {
    let (from, to) = (node.from(), node.to());
    let _ = write!(out, "{:indent$}{} [{from}..{to}]", "", names.name(node.kind()), indent = depth * 2);

    let mut children = node.children().peekable();
    if children.peek().is_none() {
        let slice = text.get(from as usize..to as usize).unwrap_or_default();
        let _ = write!(out, " {slice:?}");
    }
    out.push('\n');

    for child in children {
        print_node(&child, text, names, depth + 1, out);
    }
}
