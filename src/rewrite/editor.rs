use std::path::PathBuf;

use serde::Serialize;

use super::block::ImportBlock;
use crate::parser::ParsedFile;
use crate::parser::imports::TextPosition;

/// A single replacement of a region of original text. Positions are 1-based
/// line/column; spans within one file's edit set never overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextEdit {
    pub start: TextPosition,
    pub end: TextPosition,
    pub new_text: String,
}

/// The ordered set of text edits to apply to one file.
#[derive(Debug, Serialize)]
pub struct EditGroup {
    pub path: PathBuf,
    pub edits: Vec<TextEdit>,
}

/// Diff a new import block against the file's original text and produce the
/// minimal ordered edits to realize it.
///
/// Only records the builder actually retargeted are considered, and each of
/// their specifier-token spans produces one edit replacing exactly the token —
/// unrelated statements, formatting, and comments are never touched. Edits
/// come out in ascending document order.
pub fn edits_for_block(file: &ParsedFile, block: &ImportBlock) -> Vec<TextEdit> {
    let mut edits = Vec::new();

    for record in block.records() {
        if !record.dirty {
            continue;
        }
        for span in &record.spans {
            let original = &file.source[span.byte_range.clone()];
            if original != record.raw {
                edits.push(TextEdit {
                    start: span.start,
                    end: span.end,
                    new_text: record.raw.clone(),
                });
            }
        }
    }

    edits.sort_by_key(|e| (e.start.line, e.start.column));
    edits
}
