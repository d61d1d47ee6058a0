pub mod imports;
pub mod languages;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tree_sitter::Parser;

use imports::ImportStatement;
use languages::Grammar;

/// A freshly parsed source file, reduced to what move processing needs: the
/// original text (for span-exact diffing) and the top-level import statements.
///
/// The tree-sitter `Tree` is NOT retained — extraction happens at parse time
/// and the AST is dropped immediately.
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: String,
    pub imports: Vec<ImportStatement>,
}

/// Parse source text and extract its import section.
///
/// Allocates a fresh `Parser` on every call — parses are never cached across
/// rewrite passes, since on-disk text may have changed between moves.
///
/// # Errors
/// Returns an error if:
/// - The file extension is unsupported (not `.ts`/`.tsx`/`.js`/`.jsx`/`.mts`/`.mjs`)
/// - `tree-sitter` returns `None` (malformed / truncated source)
pub fn parse_source(path: &Path, source: String) -> Result<ParsedFile> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let grammar = Grammar::for_extension(ext)
        .ok_or_else(|| anyhow!("unsupported file extension: {:?}", ext))?;

    let mut parser = Parser::new();
    parser
        .set_language(&grammar.language())
        .with_context(|| format!("failed to set tree-sitter language for extension {ext:?}"))?;
    let tree = parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| anyhow!("tree-sitter returned None for {:?}", path))?;

    let imports = imports::extract_imports(&tree, source.as_bytes(), grammar);

    Ok(ParsedFile {
        path: path.to_path_buf(),
        source,
        imports,
    })
}

/// Read a file from disk and parse it. Always a fresh read — see [`parse_source`].
pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_source(path, source)
}
