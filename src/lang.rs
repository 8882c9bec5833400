use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use tree_sitter::Language;

/// Grammar knowledge for one language family.
///
/// The crawler itself is language-agnostic; everything grammar-specific —
/// which node kinds declare a function, which kinds are bodies, which
/// identifier kinds denote type references — lives behind this trait.
pub trait LanguageDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Primary file extensions handled by this driver (lowercase, without dot).
    fn extensions(&self) -> &'static [&'static str];

    fn handles_path(&self, path: &Path) -> bool;

    fn language_for_path(&self, path: &Path) -> Language;

    /// Node kinds that declare a function or method.
    fn function_kinds(&self) -> &'static [&'static str];

    /// Node kinds of a function/method body block.
    fn body_kinds(&self) -> &'static [&'static str];

    /// Node kinds of a call site (the "function being called" strategy).
    fn call_kinds(&self) -> &'static [&'static str];

    /// Node kinds of an object instantiation (`new X(...)` and equivalents).
    fn instantiation_kinds(&self) -> &'static [&'static str];

    /// Node kinds of a variable declarator. Reserved: classified but no
    /// crawl strategy is attached yet.
    fn variable_declarator_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    /// Node kinds of a trait/interface implementation block. Reserved, like
    /// variable declarators.
    fn impl_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    /// Identifier-like node kinds that denote a type reference (annotation
    /// positions, generic arguments).
    fn type_ref_kinds(&self) -> &'static [&'static str];

    /// The language's line-comment token, used to prefix instantiation
    /// snippets with the resolved type's name.
    fn line_comment(&self) -> &'static str {
        "//"
    }
}

pub struct LanguageConfig {
    drivers: Vec<Box<dyn LanguageDriver>>,
    by_ext: HashMap<String, usize>,
}

impl LanguageConfig {
    pub fn driver_for_path(&self, path: &Path) -> Option<&dyn LanguageDriver> {
        let ext = path_ext_lower(path);
        if let Some(&idx) = self.by_ext.get(&ext) {
            let d = self.drivers.get(idx).map(|x| x.as_ref());
            if let Some(d) = d {
                if d.handles_path(path) {
                    return Some(d);
                }
            }
        }

        // Fallback for special filename-based handling (e.g. `.d.ts`).
        self.drivers.iter().find(|d| d.handles_path(path)).map(|d| d.as_ref())
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        let mut drivers: Vec<Box<dyn LanguageDriver>> = vec![
            Box::new(RustDriver),
            Box::new(TypeScriptDriver),
            Box::new(PythonDriver),
        ];

        #[cfg(feature = "lang-go")]
        drivers.push(Box::new(GoDriver));

        #[cfg(feature = "lang-java")]
        drivers.push(Box::new(JavaDriver));

        let mut cfg = Self {
            drivers,
            by_ext: HashMap::new(),
        };

        for (idx, d) in cfg.drivers.iter().enumerate() {
            for ext in d.extensions() {
                cfg.by_ext.insert(ext.to_string(), idx);
            }
        }

        cfg
    }
}

pub fn language_config() -> &'static LanguageConfig {
    static CFG: OnceLock<LanguageConfig> = OnceLock::new();
    CFG.get_or_init(LanguageConfig::default)
}

pub fn path_ext_lower(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase()
}

struct RustDriver;
impl LanguageDriver for RustDriver {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn handles_path(&self, path: &Path) -> bool {
        path_ext_lower(path) == "rs"
    }

    fn language_for_path(&self, _path: &Path) -> Language {
        tree_sitter_rust::language()
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_item", "function_signature_item"]
    }

    fn body_kinds(&self) -> &'static [&'static str] {
        &["block"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn instantiation_kinds(&self) -> &'static [&'static str] {
        &["struct_expression"]
    }

    fn variable_declarator_kinds(&self) -> &'static [&'static str] {
        &["let_declaration"]
    }

    fn impl_kinds(&self) -> &'static [&'static str] {
        &["impl_item"]
    }

    fn type_ref_kinds(&self) -> &'static [&'static str] {
        &["type_identifier"]
    }
}

struct TypeScriptDriver;
impl LanguageDriver for TypeScriptDriver {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"]
    }

    fn handles_path(&self, path: &Path) -> bool {
        let ext = path_ext_lower(path);
        if matches!(ext.as_str(), "ts" | "tsx" | "mts" | "cts" | "js" | "jsx" | "mjs" | "cjs") {
            return true;
        }
        file_name_lower(path).ends_with(".d.ts")
    }

    fn language_for_path(&self, path: &Path) -> Language {
        let ext = path_ext_lower(path);
        if ext == "tsx" || ext == "jsx" {
            tree_sitter_typescript::language_tsx()
        } else {
            // JS/TS share the TypeScript grammar for our purposes.
            tree_sitter_typescript::language_typescript()
        }
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        &[
            "function_declaration",
            "generator_function_declaration",
            "method_definition",
            "function_expression",
            "arrow_function",
        ]
    }

    fn body_kinds(&self) -> &'static [&'static str] {
        &["statement_block"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn instantiation_kinds(&self) -> &'static [&'static str] {
        &["new_expression"]
    }

    fn variable_declarator_kinds(&self) -> &'static [&'static str] {
        &["variable_declarator"]
    }

    fn type_ref_kinds(&self) -> &'static [&'static str] {
        &["type_identifier"]
    }
}

struct PythonDriver;
impl LanguageDriver for PythonDriver {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn handles_path(&self, path: &Path) -> bool {
        matches!(path_ext_lower(path).as_str(), "py" | "pyi")
    }

    fn language_for_path(&self, _path: &Path) -> Language {
        tree_sitter_python::language()
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_definition"]
    }

    fn body_kinds(&self) -> &'static [&'static str] {
        &["block"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        // Python spells instantiation as a plain call; resolution decides
        // whether the callee is a function or a class.
        &["call"]
    }

    fn instantiation_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    fn type_ref_kinds(&self) -> &'static [&'static str] {
        // Annotation positions wrap the identifier in a `type` node.
        &["type"]
    }

    fn line_comment(&self) -> &'static str {
        "#"
    }
}

#[cfg(feature = "lang-go")]
struct GoDriver;
#[cfg(feature = "lang-go")]
impl LanguageDriver for GoDriver {
    fn name(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn handles_path(&self, path: &Path) -> bool {
        path_ext_lower(path) == "go"
    }

    fn language_for_path(&self, _path: &Path) -> Language {
        tree_sitter_go::language()
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_declaration", "method_declaration"]
    }

    fn body_kinds(&self) -> &'static [&'static str] {
        &["block"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn instantiation_kinds(&self) -> &'static [&'static str] {
        &["composite_literal"]
    }

    fn variable_declarator_kinds(&self) -> &'static [&'static str] {
        &["short_var_declaration", "var_declaration"]
    }

    fn type_ref_kinds(&self) -> &'static [&'static str] {
        &["type_identifier"]
    }
}

#[cfg(feature = "lang-java")]
struct JavaDriver;
#[cfg(feature = "lang-java")]
impl LanguageDriver for JavaDriver {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn handles_path(&self, path: &Path) -> bool {
        path_ext_lower(path) == "java"
    }

    fn language_for_path(&self, _path: &Path) -> Language {
        tree_sitter_java::language()
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        &["method_declaration", "constructor_declaration"]
    }

    fn body_kinds(&self) -> &'static [&'static str] {
        &["block", "constructor_body"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["method_invocation"]
    }

    fn instantiation_kinds(&self) -> &'static [&'static str] {
        &["object_creation_expression"]
    }

    fn variable_declarator_kinds(&self) -> &'static [&'static str] {
        &["variable_declarator"]
    }

    fn impl_kinds(&self) -> &'static [&'static str] {
        &["interface_declaration"]
    }

    fn type_ref_kinds(&self) -> &'static [&'static str] {
        &["type_identifier"]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
