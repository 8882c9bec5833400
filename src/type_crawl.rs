use std::path::Path;
use tree_sitter::Node;

use crate::providers::FileContentProvider;
use crate::resolver::CachedResolver;
use crate::syntax::{collect_descendants_of_kinds, first_identifier_leaf, parse_source, start_position};
use crate::types::{Position, RangeInFileWithContents, ResolutionKind, ResolutionQuery};

/// Resolve the definitions of type references nested inside `definition`.
///
/// The definition's text is re-parsed as an independent fragment and scanned
/// for type-reference identifiers; each one gets a single type-definition
/// query back in the definition's own file. Resolved ranges are read verbatim
/// — no truncation and no recursion into the resolved types' own nested
/// types, which bounds the crawl at one level beyond the triggering node.
///
/// Never errors: no references, no resolutions, and read failures all
/// degrade to fewer (possibly zero) results.
pub async fn crawl_types(
    definition: &RangeInFileWithContents,
    resolver: &CachedResolver,
    files: &dyn FileContentProvider,
) -> Vec<RangeInFileWithContents> {
    let Some(parsed) = parse_source(Path::new(&definition.filepath), &definition.contents) else {
        return Vec::new();
    };

    let mut refs: Vec<Node> = Vec::new();
    collect_descendants_of_kinds(parsed.root(), parsed.driver.type_ref_kinds(), &mut refs);

    let mut out = Vec::new();
    for node in refs {
        // A `type` wrapper node (Python annotations) is reduced to the
        // identifier it wraps; identifier kinds pass through unchanged.
        let Some(token) = first_identifier_leaf(node) else { continue };

        // The declaration's own name token would resolve straight back to
        // this definition; skip it.
        if is_declaration_name(token) {
            continue;
        }

        let position = fragment_to_file_position(definition.range.start, start_position(token));
        let query = ResolutionQuery::new(ResolutionKind::TypeDefinition, definition.filepath.clone(), position);

        let Some(location) = resolver.resolve_first(&query).await else { continue };

        match files.read_range(&location.filepath, location.range).await {
            Ok(contents) => out.push(RangeInFileWithContents {
                filepath: location.filepath,
                range: location.range,
                contents,
            }),
            Err(e) => {
                log::debug!("dropping type snippet {}: {e:#}", location.filepath);
            }
        }
    }

    out
}

/// True when `token` is the `name` field of its enclosing declaration.
fn is_declaration_name(token: Node<'_>) -> bool {
    let mut node = token;
    loop {
        let Some(parent) = node.parent() else { return false };
        match parent.child_by_field_name("name") {
            Some(name) if name.id() == node.id() => return true,
            _ => {}
        }
        // `type` wrappers and generic-type nodes sit between the identifier
        // and the declaration; look one level up through them only.
        if parent.child_count() > 1 {
            return false;
        }
        node = parent;
    }
}

/// Map a position inside the re-parsed fragment back into the definition's
/// file. Rows shift by the definition's start row; columns only shift on the
/// fragment's first row.
fn fragment_to_file_position(base: Position, fragment: Position) -> Position {
    if fragment.line == 0 {
        Position::new(base.line, base.column + fragment.column)
    } else {
        Position::new(base.line + fragment.line, fragment.column)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{DefinitionProvider, StaticFileProvider};
    use crate::types::{Range, RangeInFile};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapProvider {
        map: HashMap<(ResolutionKind, String, Position), RangeInFile>,
    }

    #[async_trait]
    impl DefinitionProvider for MapProvider {
        async fn resolve(
            &self,
            kind: ResolutionKind,
            filepath: &str,
            position: Position,
        ) -> Result<Vec<RangeInFile>> {
            Ok(self
                .map
                .get(&(kind, filepath.to_string(), position))
                .cloned()
                .into_iter()
                .collect())
        }
    }

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn fragment_rows_shift_and_columns_shift_only_on_first_row() {
        let base = Position::new(10, 4);
        assert_eq!(fragment_to_file_position(base, Position::new(0, 3)), Position::new(10, 7));
        assert_eq!(fragment_to_file_position(base, Position::new(2, 3)), Position::new(12, 3));
    }

    #[tokio::test]
    async fn resolves_annotation_types_one_level_deep() {
        // Definition fragment lives at line 10 of src/view.rs.
        let fragment = "fn render(w: Widget) -> Frame {\n    w.draw()\n}";
        let definition = RangeInFileWithContents {
            filepath: "src/view.rs".to_string(),
            range: range(10, 0, 12, 1),
            contents: fragment.to_string(),
        };

        // `Widget` at fragment (0, 13), `Frame` at fragment (0, 24).
        let mut map = HashMap::new();
        map.insert(
            (ResolutionKind::TypeDefinition, "src/view.rs".to_string(), Position::new(10, 13)),
            RangeInFile { filepath: "src/widget.rs".to_string(), range: range(0, 0, 2, 1) },
        );
        map.insert(
            (ResolutionKind::TypeDefinition, "src/view.rs".to_string(), Position::new(10, 24)),
            RangeInFile { filepath: "src/frame.rs".to_string(), range: range(5, 0, 5, 13) },
        );
        let resolver = CachedResolver::new(Arc::new(MapProvider { map }));

        let mut files = StaticFileProvider::new();
        files.insert("src/widget.rs", "struct Widget {\n    id: u32,\n}\n");
        files.insert("src/frame.rs", "x\nx\nx\nx\nx\nstruct Frame;\nx\n");

        let got = crawl_types(&definition, &resolver, &files).await;
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].filepath, "src/widget.rs");
        assert_eq!(got[0].contents, "struct Widget {\n    id: u32,\n}");
        assert_eq!(got[1].contents, "struct Frame;");
    }

    #[tokio::test]
    async fn declaration_name_token_is_excluded() {
        // `Widget` is the struct's own name; only `Color` may be queried.
        let fragment = "struct Widget {\n    color: Color,\n}";
        let definition = RangeInFileWithContents {
            filepath: "src/widget.rs".to_string(),
            range: range(0, 0, 2, 1),
            contents: fragment.to_string(),
        };

        let mut map = HashMap::new();
        map.insert(
            (ResolutionKind::TypeDefinition, "src/widget.rs".to_string(), Position::new(1, 11)),
            RangeInFile { filepath: "src/color.rs".to_string(), range: range(0, 0, 0, 18) },
        );
        // A (wrong) entry at Widget's own position: must never be queried.
        map.insert(
            (ResolutionKind::TypeDefinition, "src/widget.rs".to_string(), Position::new(0, 7)),
            RangeInFile { filepath: "src/widget.rs".to_string(), range: range(0, 0, 2, 1) },
        );
        let resolver = CachedResolver::new(Arc::new(MapProvider { map }));

        let mut files = StaticFileProvider::new();
        files.insert("src/color.rs", "enum Color { Red }");

        let got = crawl_types(&definition, &resolver, &files).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].filepath, "src/color.rs");
    }

    #[tokio::test]
    async fn unresolvable_references_yield_empty_not_error() {
        let definition = RangeInFileWithContents {
            filepath: "src/view.rs".to_string(),
            range: range(0, 0, 2, 1),
            contents: "fn render(w: Widget) -> Frame {\n    w.draw()\n}".to_string(),
        };
        let resolver = CachedResolver::new(Arc::new(MapProvider { map: HashMap::new() }));
        let files = StaticFileProvider::new();

        let got = crawl_types(&definition, &resolver, &files).await;
        assert!(got.is_empty());
    }
}
