use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

use crate::lang::{language_config, LanguageDriver};
use crate::types::Position;

/// A parsed file (or re-parsed fragment) plus the driver that parsed it.
pub struct ParsedSource {
    pub driver: &'static dyn LanguageDriver,
    pub tree: Tree,
}

impl ParsedSource {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// Parse `contents` with the grammar implied by `path`'s extension.
///
/// Returns `None` for unsupported languages or outright parse failures; both
/// are expected, non-fatal conditions for the crawler.
pub fn parse_source(path: &Path, contents: &str) -> Option<ParsedSource> {
    let driver = language_config().driver_for_path(path)?;
    let language = driver.language_for_path(path);

    let mut parser = Parser::new();
    parser.set_language(&language).ok()?;
    let tree = parser.parse(contents, None)?;

    Some(ParsedSource { driver, tree })
}

/// Chain of nodes from the tree root down to the smallest node whose span
/// contains `offset` (byte offset into the parsed text), outermost first.
///
/// Pure structure walk; empty only when `offset` falls outside the root span.
pub fn locate_path(root: Node<'_>, offset: usize) -> Vec<Node<'_>> {
    let mut path = Vec::new();
    if offset < root.start_byte() || offset > root.end_byte() {
        return path;
    }

    let mut node = root;
    loop {
        path.push(node);

        let mut next = None;
        for i in 0..node.child_count() {
            let Some(child) = node.child(i as u32) else { continue };
            if child.start_byte() <= offset && offset <= child.end_byte() {
                next = Some(child);
                break;
            }
        }

        match next {
            Some(n) => node = n,
            None => break,
        }
    }

    path
}

/// First node (preorder, self included) whose kind is in `kinds`.
pub fn first_descendant_of_kinds<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.contains(&node.kind()) {
        return Some(node);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_descendant_of_kinds(child, kinds) {
            return Some(found);
        }
    }
    None
}

/// All nodes (preorder, self included) whose kind is in `kinds`.
///
/// Does not recurse into a matching node; the match itself is the unit the
/// callers care about.
pub fn collect_descendants_of_kinds<'t>(node: Node<'t>, kinds: &[&str], out: &mut Vec<Node<'t>>) {
    if kinds.contains(&node.kind()) {
        out.push(node);
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_descendants_of_kinds(child, kinds, out);
    }
}

/// First leaf descendant (self included) whose kind is identifier-like.
pub fn first_identifier_leaf(node: Node<'_>) -> Option<Node<'_>> {
    if node.child_count() == 0 {
        if matches!(node.kind(), "identifier" | "type_identifier") {
            return Some(node);
        }
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_identifier_leaf(child) {
            return Some(found);
        }
    }
    None
}

pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

pub fn start_position(node: Node<'_>) -> Position {
    let p = node.start_position();
    Position::new(p.row as u32, p.column as u32)
}

pub fn end_position(node: Node<'_>) -> Position {
    let p = node.end_position();
    Position::new(p.row as u32, p.column as u32)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unsupported_extension_returns_none() {
        assert!(parse_source(&PathBuf::from("notes.md"), "# hello").is_none());
    }

    #[test]
    fn locate_path_reaches_call_expression() {
        let src = "fn main() {\n    foo(1, 2);\n}\n";
        let parsed = parse_source(&PathBuf::from("main.rs"), src).unwrap();

        // Offset inside `foo(1, 2)`.
        let offset = src.find("foo").unwrap() + 1;
        let path = locate_path(parsed.root(), offset);

        assert_eq!(path.first().unwrap().kind(), "source_file");
        assert!(
            path.iter().any(|n| n.kind() == "call_expression"),
            "path kinds: {:?}",
            path.iter().map(|n| n.kind()).collect::<Vec<_>>()
        );
        // Innermost node is the `foo` identifier token.
        assert_eq!(node_text(*path.last().unwrap(), src), "foo");
    }

    #[test]
    fn locate_path_outside_root_is_empty() {
        let src = "fn main() {}\n";
        let parsed = parse_source(&PathBuf::from("main.rs"), src).unwrap();
        assert!(locate_path(parsed.root(), src.len() + 10).is_empty());
    }

    #[test]
    fn finds_function_then_body_descendants() {
        let src = "fn add(a: u32, b: u32) -> u32 {\n    a + b\n}\n";
        let parsed = parse_source(&PathBuf::from("lib.rs"), src).unwrap();

        let func = first_descendant_of_kinds(parsed.root(), &["function_item"]).unwrap();
        let body = first_descendant_of_kinds(func, &["block"]).unwrap();
        assert!(body.start_byte() > func.start_byte());
        assert_eq!(src[..body.start_byte()].trim_end(), "fn add(a: u32, b: u32) -> u32");
    }

    #[test]
    fn collects_type_identifiers() {
        let src = "fn render(w: Widget, count: u32) -> Frame {\n    draw(w, count)\n}\n";
        let parsed = parse_source(&PathBuf::from("lib.rs"), src).unwrap();

        let mut nodes = Vec::new();
        collect_descendants_of_kinds(parsed.root(), &["type_identifier"], &mut nodes);
        let names: Vec<&str> = nodes.iter().map(|n| node_text(*n, src)).collect();
        assert_eq!(names, vec!["Widget", "Frame"], "primitives are not type_identifier nodes");
    }
}
