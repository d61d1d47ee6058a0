use tree_sitter::Language;

/// Grammar families, each with its own compiled query set.
///
/// # Grammar selection rules
/// - `.ts`/`.mts`  -> TypeScript grammar  (`LANGUAGE_TYPESCRIPT`)
/// - `.tsx`        -> TSX grammar         (`LANGUAGE_TSX`)
///   These MUST be different: the TypeScript grammar cannot parse JSX, and the TSX grammar
///   breaks angle-bracket type assertions (`<T>expr`). Mixing them causes parse errors.
/// - `.js`/`.jsx`/`.mjs` -> JavaScript grammar (`LANGUAGE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Grammar {
    /// Pick the grammar for a file extension, or `None` if the extension is
    /// not supported.
    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "jsx" | "mjs" => Some(Self::JavaScript),
            _ => None,
        }
    }

    pub fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}
