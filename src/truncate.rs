use std::path::Path;

use crate::syntax::{first_descendant_of_kinds, parse_source};

/// Shorten an over-long definition body to its declaration signature.
///
/// Policy, in order:
/// 1. `full_text` within `max_lines` → returned unchanged.
/// 2. Re-parse `full_text` as a standalone fragment; cut at the start of the
///    first function body found via grammar boundaries. This keeps the whole
///    signature (name, parameters, return annotation) and drops the body.
/// 3. No structural boundary found (unsupported grammar, malformed text) →
///    first line only.
///
/// The boolean reports whether anything was cut.
pub fn truncate_definition(filepath: &str, full_text: &str, max_lines: usize) -> (String, bool) {
    if full_text.lines().count() <= max_lines {
        return (full_text.to_string(), false);
    }

    if let Some(sig) = signature_prefix(filepath, full_text) {
        return (sig, true);
    }

    let first = full_text.lines().next().unwrap_or("").to_string();
    (first, true)
}

/// Text from the fragment start up to (not including) the first function
/// body's opening byte, trailing whitespace trimmed.
///
/// The fragment is parsed in its own coordinate space; offsets from the tree
/// the definition came out of do not apply here.
fn signature_prefix(filepath: &str, full_text: &str) -> Option<String> {
    let parsed = parse_source(Path::new(filepath), full_text)?;
    let driver = parsed.driver;

    let func = first_descendant_of_kinds(parsed.root(), driver.function_kinds())?;
    let body = first_descendant_of_kinds(func, driver.body_kinds())?;

    let prefix = full_text.get(..body.start_byte())?;
    let trimmed = prefix.trim_end();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn long_rust_fn(header: &str, body_lines: usize) -> String {
        let mut s = String::new();
        s.push_str(header);
        s.push('\n');
        for i in 0..body_lines {
            s.push_str(&format!("    let x{i} = {i};\n"));
        }
        s.push_str("}\n");
        s
    }

    #[test]
    fn short_body_passes_through_verbatim() {
        let text = "fn add(a: u32, b: u32) -> u32 {\n    a + b\n}\n";
        let (out, cut) = truncate_definition("lib.rs", text, 15);
        assert_eq!(out, text);
        assert!(!cut);
    }

    #[test]
    fn boundary_line_count_is_not_truncated() {
        // Exactly max_lines of content stays verbatim.
        let text = (0..15).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let (out, cut) = truncate_definition("notes.rs", &text, 15);
        assert_eq!(out, text);
        assert!(!cut);
    }

    #[test]
    fn long_body_cuts_at_signature_boundary() {
        let text = long_rust_fn("fn process(input: &str, limit: usize) -> Vec<String> {", 38);
        let (out, cut) = truncate_definition("lib.rs", text.as_str(), 15);
        assert!(cut);
        assert_eq!(out, "fn process(input: &str, limit: usize) -> Vec<String>");
        assert!(!out.contains("let x0"), "no statement-body tokens in the signature cut");
    }

    #[test]
    fn two_line_header_survives_whole() {
        let header = "fn configure(settings: &str,\n             verbose: bool) -> bool {";
        let text = long_rust_fn(header, 38);
        let (out, cut) = truncate_definition("lib.rs", text.as_str(), 15);
        assert!(cut);
        assert_eq!(out, "fn configure(settings: &str,\n             verbose: bool) -> bool");
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn unparseable_text_falls_back_to_first_line() {
        let mut text = String::from("%%% not a declaration %%%\n");
        for _ in 0..30 {
            text.push_str("@@@ ###\n");
        }
        let (out, cut) = truncate_definition("blob.rs", &text, 15);
        assert!(cut);
        assert_eq!(out, "%%% not a declaration %%%");
    }

    #[test]
    fn unsupported_language_falls_back_to_first_line() {
        let text = (0..30).map(|i| format!("row {i}")).collect::<Vec<_>>().join("\n");
        let (out, cut) = truncate_definition("data.csv", &text, 15);
        assert!(cut);
        assert_eq!(out, "row 0");
    }

    #[test]
    fn typescript_method_cuts_before_statement_block() {
        let mut text = String::from("function render(widget: Widget, depth: number): Frame {\n");
        for i in 0..30 {
            text.push_str(&format!("  const v{i} = {i};\n"));
        }
        text.push_str("}\n");
        let (out, cut) = truncate_definition("view.ts", &text, 15);
        assert!(cut);
        assert_eq!(out, "function render(widget: Widget, depth: number): Frame");
    }
}
