use crate::parser::ParsedFile;
use crate::parser::imports::{ImportBinding, SpecifierSpan};
use crate::specifier::ModuleSpecifier;

/// One import target of a file, keyed by canonical specifier.
///
/// A file may legally import the same module from several statements (or with
/// several spellings); those merge into one record whose `spans` lists every
/// specifier-token occurrence, so a rename rewrites all of them.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    /// Canonical, referrer-independent specifier — the record's identity.
    pub specifier: ModuleSpecifier,
    /// The specifier text the statement(s) should carry. Starts as the first
    /// occurrence's original spelling; a rename replaces it.
    pub raw: String,
    /// All names bound from this module across its statements.
    pub bindings: Vec<ImportBinding>,
    /// Original source spans of every specifier token, in document order.
    pub spans: Vec<SpecifierSpan>,
    /// Set by the builder when a rename retargeted this record. Only dirty
    /// records produce edits — untouched statements keep their spelling even
    /// when it differs from the canonical form.
    pub(crate) dirty: bool,
}

/// The structured, order-preserving model of a file's import section.
///
/// Invariants: no two records share a canonical specifier; iteration order is
/// the original textual order of each specifier's first occurrence.
#[derive(Debug, Clone, Default)]
pub struct ImportBlock {
    pub(crate) records: Vec<ImportRecord>,
}

impl ImportBlock {
    /// Build the import block from a freshly parsed file, classifying and
    /// canonicalizing each statement's specifier against the file's path.
    pub fn from_parsed(file: &ParsedFile) -> Self {
        let mut records: Vec<ImportRecord> = Vec::new();

        for stmt in &file.imports {
            let specifier = ModuleSpecifier::parse(&file.path, &stmt.specifier);
            if let Some(existing) = records.iter_mut().find(|r| r.specifier == specifier) {
                existing.spans.push(stmt.span.clone());
                for binding in &stmt.bindings {
                    if !existing.bindings.contains(binding) {
                        existing.bindings.push(binding.clone());
                    }
                }
            } else {
                records.push(ImportRecord {
                    specifier,
                    raw: stmt.specifier.clone(),
                    bindings: stmt.bindings.clone(),
                    spans: vec![stmt.span.clone()],
                    dirty: false,
                });
            }
        }

        ImportBlock { records }
    }

    pub fn records(&self) -> &[ImportRecord] {
        &self.records
    }

    pub fn get(&self, specifier: &ModuleSpecifier) -> Option<&ImportRecord> {
        self.records.iter().find(|r| &r.specifier == specifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
