use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for one crawl pipeline.
///
/// Loaded from `.defsiphon.json` at the repo root when present; every field
/// falls back to its default, so a partial (or absent, or invalid) file is
/// never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Definition bodies longer than this many lines are truncated to their
    /// declaration signature.
    pub max_body_lines: usize,

    /// Fixed relevance score stamped on every snippet. Ranking refinement is
    /// a downstream concern; this core does not differentiate per result.
    pub snippet_score: f32,

    /// Hard cap on snippets returned from one crawl. Bounds prompt cost even
    /// for cursor positions deep inside call-heavy code.
    pub max_snippets: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_body_lines: 15,
            snippet_score: 0.8,
            // A typical crawl yields 1-5 snippets; 20 is already generous.
            max_snippets: 20,
        }
    }
}

pub fn load_config(repo_root: &Path) -> CrawlConfig {
    let primary = repo_root.join(".defsiphon.json");

    let text = std::fs::read_to_string(&primary);
    let Ok(text) = text else { return CrawlConfig::default() };

    serde_json::from_str::<CrawlConfig>(&text).unwrap_or_else(|_| CrawlConfig::default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
