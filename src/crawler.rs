use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tree_sitter::Node;

use crate::config::CrawlConfig;
use crate::lang::{language_config, LanguageDriver};
use crate::providers::{DefinitionProvider, FileContentProvider};
use crate::resolver::CachedResolver;
use crate::syntax::{end_position, locate_path, node_text, parse_source, start_position};
use crate::truncate::truncate_definition;
use crate::type_crawl::crawl_types;
use crate::types::{
    AutocompleteSnippet, Position, RangeInFileWithContents, ResolutionKind, ResolutionQuery,
};

/// How a syntax node at the cursor path should be crawled.
///
/// Flat dispatch over grammar-kind names supplied by the language driver; the
/// default arm keeps it total. `VariableDeclarator` and `ImplBlock` are
/// recognized but currently produce no snippets — explicit no-op branches
/// reserved for future strategies, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStrategy {
    Call,
    Instantiation,
    VariableDeclarator,
    ImplBlock,
    Unhandled,
}

pub fn classify(driver: &dyn LanguageDriver, kind: &str) -> NodeStrategy {
    if driver.call_kinds().contains(&kind) {
        NodeStrategy::Call
    } else if driver.instantiation_kinds().contains(&kind) {
        NodeStrategy::Instantiation
    } else if driver.variable_declarator_kinds().contains(&kind) {
        NodeStrategy::VariableDeclarator
    } else if driver.impl_kinds().contains(&kind) {
        NodeStrategy::ImplBlock
    } else {
        NodeStrategy::Unhandled
    }
}

/// Work extracted from one cursor-path node before any I/O happens.
///
/// Syntax nodes borrow their tree, so everything the async stages need is
/// copied out up front; the tree is gone by the time the first provider call
/// is awaited.
#[derive(Debug)]
enum CrawlPlan {
    /// Resolve the called function's definition at the call's start.
    Call { query_position: Position },
    /// Resolve the constructed type's definition at its name token's end.
    Instantiation {
        query_position: Position,
        type_name: String,
    },
}

/// Cross-file definition crawler.
///
/// One instance owns one resolution cache (see `CachedResolver`); hosts
/// typically keep an instance per process and drop it when staleness matters.
pub struct ContextCrawler {
    resolver: CachedResolver,
    files: Arc<dyn FileContentProvider>,
    config: CrawlConfig,
}

impl ContextCrawler {
    pub fn new(
        definitions: Arc<dyn DefinitionProvider>,
        files: Arc<dyn FileContentProvider>,
        config: CrawlConfig,
    ) -> Self {
        Self {
            resolver: CachedResolver::new(definitions),
            files,
            config,
        }
    }

    /// Gather ranked context snippets for the cursor at `cursor_offset`
    /// (byte offset into `contents`).
    ///
    /// Never fails: unsupported languages, resolution misses, and read errors
    /// all degrade to fewer (possibly zero) snippets, and anything unexpected
    /// is caught here and logged — autocomplete must never take down the
    /// editing session.
    pub async fn get_context_snippets(
        &self,
        filepath: &str,
        contents: &str,
        cursor_offset: usize,
    ) -> Vec<AutocompleteSnippet> {
        match self.crawl(filepath, contents, cursor_offset).await {
            Ok(snippets) => snippets,
            Err(e) => {
                log::warn!("context crawl failed for {filepath}: {e:#}");
                Vec::new()
            }
        }
    }

    async fn crawl(
        &self,
        filepath: &str,
        contents: &str,
        cursor_offset: usize,
    ) -> Result<Vec<AutocompleteSnippet>> {
        let plans = build_plans(filepath, contents, cursor_offset);
        if plans.is_empty() {
            return Ok(Vec::new());
        }
        debug_log!("[crawler] {} plan(s) for {filepath}@{cursor_offset}", plans.len());

        let mut collected: Vec<RangeInFileWithContents> = Vec::new();
        for plan in plans {
            match plan {
                CrawlPlan::Call { query_position } => {
                    self.crawl_call(filepath, query_position, &mut collected).await;
                }
                CrawlPlan::Instantiation {
                    query_position,
                    type_name,
                } => {
                    self.crawl_instantiation(filepath, query_position, &type_name, &mut collected)
                        .await;
                }
            }
        }

        // Merge duplicates by (filepath, range): first occurrence wins, which
        // is the most cursor-proximate discovery given innermost-first order.
        let mut seen = HashSet::new();
        let mut snippets = Vec::new();
        for r in collected {
            if snippets.len() >= self.config.max_snippets {
                break;
            }
            if r.contents.is_empty() {
                continue;
            }
            if !seen.insert(r.location()) {
                continue;
            }
            snippets.push(AutocompleteSnippet::from_contents(r, self.config.snippet_score));
        }
        Ok(snippets)
    }

    /// Call-expression strategy: definition body (truncated past the line
    /// budget), then the body's nested type definitions.
    async fn crawl_call(
        &self,
        filepath: &str,
        query_position: Position,
        out: &mut Vec<RangeInFileWithContents>,
    ) {
        let query = ResolutionQuery::new(ResolutionKind::Definition, filepath, query_position);
        let Some(location) = self.resolver.resolve_first(&query).await else {
            return;
        };

        let body = match self.files.read_range(&location.filepath, location.range).await {
            Ok(text) => text,
            Err(e) => {
                log::debug!("dropping call snippet {}: {e:#}", location.filepath);
                return;
            }
        };

        let (kept, _was_truncated) =
            truncate_definition(&location.filepath, &body, self.config.max_body_lines);

        // Range stays the full definition span even when the contents were
        // truncated to the signature.
        let definition = RangeInFileWithContents {
            filepath: location.filepath,
            range: location.range,
            contents: kept,
        };

        let nested = crawl_types(&definition, &self.resolver, self.files.as_ref()).await;
        out.push(definition);
        out.extend(nested);
    }

    /// Instantiation strategy: defining range prefixed with a comment naming
    /// the constructed type, then the definition's nested type definitions.
    async fn crawl_instantiation(
        &self,
        filepath: &str,
        query_position: Position,
        type_name: &str,
        out: &mut Vec<RangeInFileWithContents>,
    ) {
        let query = ResolutionQuery::new(ResolutionKind::Definition, filepath, query_position);
        let Some(location) = self.resolver.resolve_first(&query).await else {
            return;
        };

        let body = match self.files.read_range(&location.filepath, location.range).await {
            Ok(text) => text,
            Err(e) => {
                log::debug!("dropping instantiation snippet {}: {e:#}", location.filepath);
                return;
            }
        };

        // Nested types are crawled over the unprefixed text so fragment
        // coordinates still line up with the defining file.
        let definition = RangeInFileWithContents {
            filepath: location.filepath.clone(),
            range: location.range,
            contents: body.clone(),
        };
        let nested = crawl_types(&definition, &self.resolver, self.files.as_ref()).await;

        let comment = language_config()
            .driver_for_path(Path::new(&location.filepath))
            .map(|d| d.line_comment())
            .unwrap_or("//");

        out.push(RangeInFileWithContents {
            filepath: location.filepath,
            range: location.range,
            contents: format!("{comment} {type_name}:\n{body}"),
        });
        out.extend(nested);
    }
}

/// Locate the cursor's syntax path and classify every node on it, innermost
/// first. Pure; all tree access ends here.
fn build_plans(filepath: &str, contents: &str, cursor_offset: usize) -> Vec<CrawlPlan> {
    let Some(parsed) = parse_source(Path::new(filepath), contents) else {
        return Vec::new();
    };
    let driver = parsed.driver;

    let path = locate_path(parsed.root(), cursor_offset);

    let mut plans = Vec::new();
    for node in path.iter().rev() {
        match classify(driver, node.kind()) {
            NodeStrategy::Call => {
                plans.push(CrawlPlan::Call {
                    query_position: start_position(*node),
                });
            }
            NodeStrategy::Instantiation => {
                let target = identifier_child(*node).unwrap_or(*node);
                plans.push(CrawlPlan::Instantiation {
                    query_position: end_position(target),
                    type_name: node_text(target, contents).to_string(),
                });
            }
            NodeStrategy::VariableDeclarator | NodeStrategy::ImplBlock | NodeStrategy::Unhandled => {}
        }
    }
    plans
}

/// First direct child that is an identifier-like name token.
fn identifier_child<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), "identifier" | "type_identifier"));
    found
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
