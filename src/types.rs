use serde::{Deserialize, Serialize};

/// Zero-based (line, column) location. Half-open semantics: a `Range` covers
/// `[start, end)` in the file's own line/column addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// A span within one file, without materialized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeInFile {
    pub filepath: String,
    pub range: Range,
}

/// A span plus a snapshot of its text, taken at crawl time.
///
/// `contents` matches the bytes addressed by `range` as of the read, except
/// where the body truncator has shortened it — in that case `range` still
/// covers the full definition and `contents` is only its signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeInFileWithContents {
    pub filepath: String,
    pub range: Range,
    pub contents: String,
}

impl RangeInFileWithContents {
    pub fn location(&self) -> RangeInFile {
        RangeInFile {
            filepath: self.filepath.clone(),
            range: self.range,
        }
    }
}

/// The resolution operations understood by a definition-resolution provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionKind {
    Definition,
    TypeDefinition,
    Declaration,
    Implementation,
    References,
}

/// Cache key for one provider call. Two queries are the same query iff every
/// field matches exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionQuery {
    pub kind: ResolutionKind,
    pub filepath: String,
    pub position: Position,
}

impl ResolutionQuery {
    pub fn new(kind: ResolutionKind, filepath: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            filepath: filepath.into(),
            position,
        }
    }
}

/// One piece of context destined for a completion model's prompt.
///
/// Snippets with equal `filepath` + `range` are duplicates regardless of
/// score; the aggregator keeps the first occurrence. When the snippet was
/// truncated, `range` keeps the full definition span, so `contents` may be
/// shorter than the span implies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocompleteSnippet {
    pub filepath: String,
    pub range: Range,
    pub contents: String,
    /// Heuristic relevance in [0, 1]. Fixed per crawl (see `CrawlConfig`).
    pub score: f32,
}

impl AutocompleteSnippet {
    pub fn from_contents(r: RangeInFileWithContents, score: f32) -> Self {
        Self {
            filepath: r.filepath,
            range: r.range,
            contents: r.contents,
            score,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
