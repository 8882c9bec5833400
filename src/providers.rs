use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::{Position, Range, RangeInFile, ResolutionKind};

/// External definition-resolution capability (language server, index, ...).
///
/// One operation per resolution kind on the wire; a single method here since
/// the signatures are identical. Implementations may return multiple
/// locations — the crawler consumes only the first. Expensive calls are
/// expected; callers must go through `CachedResolver`, never call this
/// directly from strategy code.
#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    async fn resolve(
        &self,
        kind: ResolutionKind,
        filepath: &str,
        position: Position,
    ) -> Result<Vec<RangeInFile>>;
}

/// External file-content capability.
#[async_trait]
pub trait FileContentProvider: Send + Sync {
    /// Exact text addressed by `range`. Fails loudly only on
    /// filesystem-level errors; the crawler catches those and drops the
    /// affected snippet.
    async fn read_range(&self, filepath: &str, range: Range) -> Result<String>;
}

/// Filesystem-backed content provider. Relative paths are resolved against
/// `root`.
pub struct FsFileContentProvider {
    root: PathBuf,
}

impl FsFileContentProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, filepath: &str) -> PathBuf {
        let p = PathBuf::from(filepath);
        if p.is_absolute() {
            p
        } else {
            self.root.join(p)
        }
    }
}

#[async_trait]
impl FileContentProvider for FsFileContentProvider {
    async fn read_range(&self, filepath: &str, range: Range) -> Result<String> {
        let abs = self.abs(filepath);

        let raw = tokio::fs::read(&abs)
            .await
            .with_context(|| format!("Failed to read {}", abs.display()))?;
        if raw.contains(&0u8) {
            return Err(anyhow!("Binary file: {}", abs.display()));
        }
        let text = String::from_utf8_lossy(&raw).into_owned();

        slice_range(&text, range)
    }
}

/// In-memory content provider over preloaded buffers. Used by hosts that
/// serve unsaved editor contents, and by the test suite.
#[derive(Default)]
pub struct StaticFileProvider {
    files: HashMap<String, String>,
}

impl StaticFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, filepath: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(filepath.into(), contents.into());
    }
}

#[async_trait]
impl FileContentProvider for StaticFileProvider {
    async fn read_range(&self, filepath: &str, range: Range) -> Result<String> {
        let text = self
            .files
            .get(filepath)
            .ok_or_else(|| anyhow!("No buffer loaded for {filepath}"))?;
        slice_range(text, range)
    }
}

/// Compute byte offset of the start of each line (0-indexed).
fn line_byte_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0usize];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            offsets.push(i + 1);
        }
    }
    offsets
}

/// Slice the half-open `[range.start, range.end)` span out of `text`.
///
/// Columns count bytes within the line, matching tree-sitter points. Offsets
/// are clamped to the line/file end, so a range that overshoots the final
/// line degrades to "through end of file" rather than erroring.
pub fn slice_range(text: &str, range: Range) -> Result<String> {
    let offsets = line_byte_offsets(text);

    let byte_at = |pos: Position| -> usize {
        let line = pos.line as usize;
        let Some(&line_start) = offsets.get(line) else {
            return text.len();
        };
        // Clamp the column inside this line (newline excluded).
        let line_cap = offsets
            .get(line + 1)
            .map(|&next| next.saturating_sub(1))
            .unwrap_or(text.len());
        (line_start + pos.column as usize).min(line_cap)
    };

    let start = byte_at(range.start);
    let end = byte_at(range.end).max(start);

    text.get(start..end)
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("Range {:?} does not fall on character boundaries", range))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn slices_single_line_span() {
        let text = "alpha beta\ngamma\n";
        assert_eq!(slice_range(text, range(0, 6, 0, 10)).unwrap(), "beta");
    }

    #[test]
    fn slices_multi_line_span() {
        let text = "fn one() {\n    1\n}\nfn two() {}\n";
        assert_eq!(slice_range(text, range(0, 0, 2, 1)).unwrap(), "fn one() {\n    1\n}");
    }

    #[test]
    fn overshooting_range_clamps_to_eof() {
        let text = "one\ntwo";
        assert_eq!(slice_range(text, range(0, 0, 99, 0)).unwrap(), "one\ntwo");
    }

    #[test]
    fn column_clamps_before_newline() {
        let text = "ab\ncd\n";
        // Column 50 on line 0 must not swallow the newline.
        assert_eq!(slice_range(text, range(0, 0, 0, 50)).unwrap(), "ab");
    }

    #[tokio::test]
    async fn fs_provider_reads_relative_paths() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("lib.rs"), "fn a() {}\nfn b() {}\n").unwrap();

        let provider = FsFileContentProvider::new(tmp.path());
        let got = provider.read_range("lib.rs", range(1, 0, 1, 9)).await.unwrap();
        assert_eq!(got, "fn b() {}");
    }

    #[tokio::test]
    async fn fs_provider_fails_loudly_on_missing_file() {
        let tmp = TempDir::new().unwrap();
        let provider = FsFileContentProvider::new(tmp.path());
        assert!(provider.read_range("gone.rs", range(0, 0, 0, 1)).await.is_err());
    }
}
