use std::ops::Range;
use std::sync::OnceLock;

use serde::Serialize;
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator, Tree};

use super::languages::Grammar;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A 1-based line/column position, matching conventional editor addressing.
/// Columns count bytes within the line (tree-sitter convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextPosition {
    pub line: u32,
    pub column: u32,
}

/// The exact region of a specifier token in the original text: the characters
/// between the quotes of an import statement's source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierSpan {
    pub start: TextPosition,
    pub end: TextPosition,
    pub byte_range: Range<usize>,
}

/// A single name bound by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// The local name used in this file.
    pub name: String,
    /// The original exported name when using `import { original as alias }`.
    pub alias: Option<String>,
    /// True for `import React from 'react'` (default import).
    pub is_default: bool,
    /// True for `import * as ns from 'module'` (namespace import).
    pub is_namespace: bool,
}

/// One top-level static import statement, as written in the source.
///
/// Side-effect imports (`import './setup'`) carry an empty binding list.
#[derive(Debug, Clone)]
pub struct ImportStatement {
    /// The raw module specifier text between the quotes, e.g. `"./utils"`.
    pub specifier: String,
    /// The names bound by the statement.
    pub bindings: Vec<ImportBinding>,
    /// Span of the specifier token (not the whole statement).
    pub span: SpecifierSpan,
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Tree-sitter query for ESM static imports. Captures the whole statement (for
/// binding extraction) and the source string node (for the specifier span).
const IMPORT_QUERY: &str = r#"
    (import_statement
      source: (string) @source) @import
"#;

// One compiled query per grammar. A query compiled for one grammar cannot be
// used with another grammar's tree.
static TS_IMPORT_QUERY: OnceLock<Query> = OnceLock::new();
static TSX_IMPORT_QUERY: OnceLock<Query> = OnceLock::new();
static JS_IMPORT_QUERY: OnceLock<Query> = OnceLock::new();

fn import_query(grammar: Grammar) -> &'static Query {
    let cache = match grammar {
        Grammar::TypeScript => &TS_IMPORT_QUERY,
        Grammar::Tsx => &TSX_IMPORT_QUERY,
        Grammar::JavaScript => &JS_IMPORT_QUERY,
    };
    cache.get_or_init(|| {
        Query::new(&grammar.language(), IMPORT_QUERY).expect("invalid import query")
    })
}

// ---------------------------------------------------------------------------
// Helper utilities
// ---------------------------------------------------------------------------

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Compute the specifier text and span from a `string` node, excluding the
/// surrounding quote tokens. Returns `None` for degenerate strings.
fn specifier_span(string_node: Node, source: &[u8]) -> Option<(String, SpecifierSpan)> {
    let open = string_node.child(0)?;
    let close = string_node.child(string_node.child_count().saturating_sub(1) as u32)?;
    let byte_range = open.end_byte()..close.start_byte();
    if byte_range.start > byte_range.end || byte_range.end > source.len() {
        return None;
    }
    let raw = std::str::from_utf8(&source[byte_range.clone()]).ok()?.to_owned();
    if raw.is_empty() {
        return None;
    }
    let span = SpecifierSpan {
        start: TextPosition {
            line: open.end_position().row as u32 + 1,
            column: open.end_position().column as u32 + 1,
        },
        end: TextPosition {
            line: close.start_position().row as u32 + 1,
            column: close.start_position().column as u32 + 1,
        },
        byte_range,
    };
    Some((raw, span))
}

// ---------------------------------------------------------------------------
// Import extraction
// ---------------------------------------------------------------------------

/// Extract all top-level static import statements from a parsed syntax tree,
/// in document order. Dynamic `import()` calls and `require()` are out of
/// scope — only statements whose specifier token can be rewritten in place
/// participate in move processing.
pub fn extract_imports(tree: &Tree, source: &[u8], grammar: Grammar) -> Vec<ImportStatement> {
    let query = import_query(grammar);
    let source_idx = query
        .capture_index_for_name("source")
        .expect("import query must have @source");
    let import_idx = query
        .capture_index_for_name("import")
        .expect("import query must have @import");

    let mut imports = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        let mut import_node: Option<Node> = None;
        let mut string_node: Option<Node> = None;

        for capture in m.captures {
            if capture.index == import_idx {
                import_node = Some(capture.node);
            } else if capture.index == source_idx {
                string_node = Some(capture.node);
            }
        }

        let (Some(imp_node), Some(str_node)) = (import_node, string_node) else {
            continue;
        };
        // Only top-level statements form the import section.
        if imp_node.parent().map(|p| p.kind() != "program").unwrap_or(true) {
            continue;
        }
        if let Some((specifier, span)) = specifier_span(str_node, source) {
            imports.push(ImportStatement {
                specifier,
                bindings: extract_bindings(imp_node, source),
                span,
            });
        }
    }

    imports.sort_by_key(|i| i.span.byte_range.start);
    imports
}

/// Extract all bindings from an import_statement node.
///
/// Handles:
/// - Named: `import { useState, useEffect } from 'react'`
/// - Default: `import React from 'react'`
/// - Namespace: `import * as path from 'path'`
/// - Combined: `import React, { useState } from 'react'`
/// - Side-effect: `import './setup'` (no bindings)
fn extract_bindings(import_node: Node, source: &[u8]) -> Vec<ImportBinding> {
    let mut bindings = Vec::new();

    let mut cursor = import_node.walk();
    for child in import_node.children(&mut cursor) {
        match child.kind() {
            "import_clause" => {
                extract_import_clause(child, source, &mut bindings);
            }
            "namespace_import" => {
                if let Some(name) = namespace_import_name(child, source) {
                    bindings.push(ImportBinding {
                        name,
                        alias: None,
                        is_default: false,
                        is_namespace: true,
                    });
                }
            }
            _ => {}
        }
    }

    bindings
}

fn extract_import_clause(clause_node: Node, source: &[u8], bindings: &mut Vec<ImportBinding>) {
    let mut cursor = clause_node.walk();
    for child in clause_node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                // Default import: `import React from ...`
                bindings.push(ImportBinding {
                    name: node_text(child, source).to_owned(),
                    alias: None,
                    is_default: true,
                    is_namespace: false,
                });
            }
            "named_imports" => {
                extract_named_imports(child, source, bindings);
            }
            "namespace_import" => {
                if let Some(name) = namespace_import_name(child, source) {
                    bindings.push(ImportBinding {
                        name,
                        alias: None,
                        is_default: false,
                        is_namespace: true,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Extract the identifier name from a `namespace_import` node (`* as identifier`).
/// The identifier is not assigned a field name in the grammar — find it by kind.
fn namespace_import_name(ns_node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = ns_node.walk();
    for child in ns_node.children(&mut cursor) {
        if child.kind() == "identifier" {
            return Some(node_text(child, source).to_owned());
        }
    }
    None
}

fn extract_named_imports(named_node: Node, source: &[u8], bindings: &mut Vec<ImportBinding>) {
    let mut cursor = named_node.walk();
    for child in named_node.children(&mut cursor) {
        if child.kind() == "import_specifier" {
            // In `import { foo as bar }`: tree-sitter field name -> "foo",
            // field alias -> "bar" (the local binding).
            let name_node = child.child_by_field_name("name");
            let alias_node = child.child_by_field_name("alias");

            match (name_node, alias_node) {
                (Some(n), Some(a)) => {
                    bindings.push(ImportBinding {
                        name: node_text(a, source).to_owned(),
                        alias: Some(node_text(n, source).to_owned()),
                        is_default: false,
                        is_namespace: false,
                    });
                }
                (Some(n), None) => {
                    bindings.push(ImportBinding {
                        name: node_text(n, source).to_owned(),
                        alias: None,
                        is_default: false,
                        is_namespace: false,
                    });
                }
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn imports_for(src: &str, grammar: Grammar) -> Vec<ImportStatement> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&grammar.language()).unwrap();
        let tree = parser.parse(src.as_bytes(), None).unwrap();
        extract_imports(&tree, src.as_bytes(), grammar)
    }

    fn imports_of(src: &str) -> Vec<ImportStatement> {
        imports_for(src, Grammar::TypeScript)
    }

    #[test]
    fn test_named_imports_with_span() {
        let src = "import { useState, useEffect } from './hooks';\n";
        let imports = imports_of(src);
        assert_eq!(imports.len(), 1);
        let imp = &imports[0];
        assert_eq!(imp.specifier, "./hooks");
        assert_eq!(imp.bindings.len(), 2);
        // The span covers exactly the text between the quotes.
        assert_eq!(&src[imp.span.byte_range.clone()], "./hooks");
        assert_eq!(imp.span.start.line, 1);
        assert_eq!(imp.span.start.column, 38);
        assert_eq!(imp.span.end.column, 45);
    }

    #[test]
    fn test_default_and_namespace_imports() {
        let imports = imports_of("import React from 'react';\nimport * as path from 'path';\n");
        assert_eq!(imports.len(), 2);
        assert!(imports[0].bindings[0].is_default);
        assert_eq!(imports[0].bindings[0].name, "React");
        assert!(imports[1].bindings[0].is_namespace);
        assert_eq!(imports[1].bindings[0].name, "path");
    }

    #[test]
    fn test_aliased_named_import() {
        let imports = imports_of("import { original as local } from './m';\n");
        let binding = &imports[0].bindings[0];
        assert_eq!(binding.name, "local");
        assert_eq!(binding.alias.as_deref(), Some("original"));
    }

    #[test]
    fn test_side_effect_import_has_no_bindings() {
        let imports = imports_of("import './setup';\n");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].specifier, "./setup");
        assert!(imports[0].bindings.is_empty());
    }

    #[test]
    fn test_document_order_and_multiline_positions() {
        let src = "// header\nimport { a } from './a';\nimport { b } from './b';\n";
        let imports = imports_of(src);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].specifier, "./a");
        assert_eq!(imports[1].specifier, "./b");
        assert_eq!(imports[0].span.start.line, 2);
        assert_eq!(imports[1].span.start.line, 3);
    }

    #[test]
    fn test_dynamic_import_and_require_are_ignored() {
        let imports = imports_of(
            "const m = await import('./lazy');\nconst fs = require('fs');\nimport { x } from './x';\n",
        );
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].specifier, "./x");
    }

    #[test]
    fn test_double_quoted_specifier() {
        let src = "import { x } from \"./x\";\n";
        let imports = imports_of(src);
        assert_eq!(imports[0].specifier, "./x");
        assert_eq!(&src[imports[0].span.byte_range.clone()], "./x");
    }

    #[test]
    fn test_each_grammar_extracts_imports() {
        let tsx = imports_for(
            "import { App } from './app';\nexport const x = <App />;\n",
            Grammar::Tsx,
        );
        assert_eq!(tsx[0].specifier, "./app");

        let js = imports_for("import { y } from './y';\n", Grammar::JavaScript);
        assert_eq!(js[0].specifier, "./y");
    }
}
