use thiserror::Error;

use super::block::{ImportBlock, ImportRecord};
use crate::specifier::ModuleSpecifier;

/// A rename would collide two distinct import records with different bindings
/// onto one specifier. The ambiguous merge is refused rather than silently
/// dropping either side's bindings.
#[derive(Debug, Error)]
#[error("rename of `{from}` collides with existing import of `{to}` with different bindings")]
pub struct SpecifierConflict {
    pub from: String,
    pub to: String,
}

/// Copy-on-write staging object for producing a new [`ImportBlock`] from an
/// old one plus a sequence of renames, without touching unrelated records.
#[derive(Debug)]
pub struct ImportBlockBuilder {
    records: Vec<ImportRecord>,
}

impl ImportBlockBuilder {
    pub fn from_block(block: &ImportBlock) -> Self {
        Self {
            records: block.records().to_vec(),
        }
    }

    /// Retarget the record at `from` to the canonical specifier `to`, spelled
    /// `new_raw`. Bindings, spans, and iteration position are preserved.
    ///
    /// Returns `Ok(false)` without changes when `from` is absent, or when a
    /// record with identical bindings already sits at `to` (the import is
    /// already present — nothing to do). Returns [`SpecifierConflict`] when
    /// the record at `to` has different bindings.
    pub fn rename_module(
        &mut self,
        from: &ModuleSpecifier,
        to: ModuleSpecifier,
        new_raw: String,
    ) -> Result<bool, SpecifierConflict> {
        let Some(idx) = self.records.iter().position(|r| &r.specifier == from) else {
            return Ok(false);
        };

        if let Some(other) = self.records.iter().position(|r| r.specifier == to)
            && other != idx
        {
            if self.records[other].bindings == self.records[idx].bindings {
                return Ok(false);
            }
            return Err(SpecifierConflict {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let record = &mut self.records[idx];
        record.specifier = to;
        record.raw = new_raw;
        record.dirty = true;
        Ok(true)
    }

    /// Finalize the staged records into a new immutable block.
    pub fn build(self) -> ImportBlock {
        ImportBlock {
            records: self.records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use std::path::{Path, PathBuf};

    fn block_for(src: &str) -> ImportBlock {
        let parsed = parse_source(Path::new("/proj/src/a.ts"), src.to_owned()).unwrap();
        ImportBlock::from_parsed(&parsed)
    }

    fn rel(path: &str) -> ModuleSpecifier {
        ModuleSpecifier::ProjectRelative(PathBuf::from(path))
    }

    #[test]
    fn test_rename_preserves_position_and_bindings() {
        let block = block_for("import { a } from './a';\nimport { b } from './b';\n");
        let mut builder = ImportBlockBuilder::from_block(&block);
        let renamed = builder
            .rename_module(&rel("/proj/src/a"), rel("/proj/src/lib/a"), "./lib/a".to_owned())
            .unwrap();
        assert!(renamed);

        let new_block = builder.build();
        let raws: Vec<&str> = new_block.records().iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raws, vec!["./lib/a", "./b"]);
        let record = new_block.get(&rel("/proj/src/lib/a")).unwrap();
        assert_eq!(record.bindings.len(), 1);
        assert_eq!(record.bindings[0].name, "a");
    }

    #[test]
    fn test_rename_absent_specifier_is_noop() {
        let block = block_for("import { a } from './a';\n");
        let mut builder = ImportBlockBuilder::from_block(&block);
        let renamed = builder
            .rename_module(&rel("/proj/src/missing"), rel("/proj/src/x"), "./x".to_owned())
            .unwrap();
        assert!(!renamed);
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn test_rename_onto_distinct_bindings_conflicts() {
        let block = block_for("import { a } from './a';\nimport { b } from './b';\n");
        let mut builder = ImportBlockBuilder::from_block(&block);
        let err = builder
            .rename_module(&rel("/proj/src/a"), rel("/proj/src/b"), "./b".to_owned())
            .unwrap_err();
        assert!(err.to_string().contains("different bindings"));
    }

    #[test]
    fn test_rename_onto_identical_bindings_is_noop_merge() {
        let block = block_for("import { a } from './a';\nimport { a } from './b';\n");
        let mut builder = ImportBlockBuilder::from_block(&block);
        let renamed = builder
            .rename_module(&rel("/proj/src/a"), rel("/proj/src/b"), "./b".to_owned())
            .unwrap();
        assert!(!renamed);
    }

    #[test]
    fn test_rename_to_same_key_updates_spelling() {
        // Renaming a record onto its own key (raw respelling) is allowed.
        let block = block_for("import { a } from './lib/../a';\n");
        let mut builder = ImportBlockBuilder::from_block(&block);
        let renamed = builder
            .rename_module(&rel("/proj/src/a"), rel("/proj/src/a"), "./a".to_owned())
            .unwrap();
        assert!(renamed);
        assert_eq!(builder.build().records()[0].raw, "./a");
    }
}
