use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::parser::imports::TextPosition;
use crate::rewrite::editor::TextEdit;

/// The edit-application boundary: turns an edit group into an actual file
/// mutation. Assumed atomic per file from the pipeline's perspective; a
/// failure is isolated to that one file.
pub trait EditSink: Send + Sync {
    fn apply(&self, path: &Path, edits: &[TextEdit]) -> Result<()>;
}

/// Default sink: rewrites the file in place on the local filesystem.
pub struct FsEditSink;

impl EditSink for FsEditSink {
    fn apply(&self, path: &Path, edits: &[TextEdit]) -> Result<()> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let rewritten = apply_edits(&source, edits)?;
        std::fs::write(path, rewritten)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Apply a set of non-overlapping edits to `source`.
///
/// All spans are resolved against the original text first, then replaced
/// last-to-first so earlier byte offsets stay valid throughout.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String> {
    let line_starts = line_start_offsets(source);

    let mut resolved: Vec<(usize, usize, &str)> = Vec::with_capacity(edits.len());
    for edit in edits {
        let start = byte_offset(source, &line_starts, edit.start)?;
        let end = byte_offset(source, &line_starts, edit.end)?;
        if start > end {
            bail!("inverted edit span {}..{}", start, end);
        }
        resolved.push((start, end, edit.new_text.as_str()));
    }
    resolved.sort_by_key(|(start, _, _)| *start);
    for pair in resolved.windows(2) {
        if pair[0].1 > pair[1].0 {
            bail!("overlapping edit spans");
        }
    }

    let mut out = source.to_owned();
    for (start, end, new_text) in resolved.into_iter().rev() {
        out.replace_range(start..end, new_text);
    }
    Ok(out)
}

fn line_start_offsets(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, byte) in source.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

fn byte_offset(source: &str, line_starts: &[usize], pos: TextPosition) -> Result<usize> {
    let line_idx = (pos.line as usize)
        .checked_sub(1)
        .filter(|i| *i < line_starts.len())
        .with_context(|| format!("line {} out of range", pos.line))?;
    let offset = line_starts[line_idx] + pos.column as usize - 1;
    if offset > source.len() {
        bail!("position {}:{} out of range", pos.line, pos.column);
    }
    Ok(offset)
}
