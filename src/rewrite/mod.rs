pub mod block;
pub mod builder;
pub mod editor;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::parser;
use crate::specifier::{self, ModuleSpecifier};
use crate::watcher::extract::{MoveKind, MoveOperation};
use block::ImportBlock;
use builder::ImportBlockBuilder;
use editor::EditGroup;

/// One file-level sub-move: the pre-move and post-move path of a single
/// source file. A FILE move yields exactly one; a FOLDER move yields one per
/// project file under the destination folder.
#[derive(Debug, Clone)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A self-move repair that could not be completed: no source file exists at
/// the path the specifier would have pointed to from the old location. The
/// import is left untouched.
#[derive(Debug)]
pub struct UnresolvedRepair {
    pub file: PathBuf,
    pub specifier: String,
}

/// The outcome of one project-wide rewrite pass.
#[derive(Debug, Default)]
pub struct RewriteReport {
    /// Non-empty edit groups, one per file whose import block changed.
    pub edit_groups: Vec<EditGroup>,
    /// Imports skipped during self-move repair (non-fatal).
    pub unresolved: Vec<UnresolvedRepair>,
    /// Renames skipped because they would merge records with different bindings.
    pub conflicts: usize,
}

/// Expand a move operation into file-level sub-moves.
///
/// For a FOLDER move, every current project file under the destination folder
/// is mapped back to its pre-move path via its relative offset from the
/// destination — the project file list is enumerated after the move, so the
/// destination paths are the ones that exist.
pub fn moved_files_for(op: &MoveOperation, project_files: &[PathBuf]) -> Vec<MovedFile> {
    match op.kind {
        MoveKind::File => vec![MovedFile {
            from: op.from.clone(),
            to: op.to.clone(),
        }],
        MoveKind::Folder => project_files
            .iter()
            .filter_map(|to_file| {
                let rel = to_file.strip_prefix(&op.to).ok()?;
                Some(MovedFile {
                    from: op.from.join(rel),
                    to: to_file.clone(),
                })
            })
            .collect(),
    }
}

/// Compute, for every project file, the edit group required to keep its
/// imports correct after the given sub-moves.
///
/// Each file is parsed fresh from disk (on-disk text may have changed since
/// any previous pass). A file that fails to read or parse is skipped with a
/// warning — a broken file must not block the rest of the project.
pub fn rewrite_project(project_files: &[PathBuf], moves: &[MovedFile]) -> RewriteReport {
    // Module-path indexes in both directions: `from_to` retargets importers,
    // `to_from` detects files that were themselves moved.
    let from_to: HashMap<PathBuf, PathBuf> = moves
        .iter()
        .map(|m| (specifier::module_path(&m.from), specifier::module_path(&m.to)))
        .collect();
    let to_from: HashMap<PathBuf, PathBuf> = from_to
        .iter()
        .map(|(from, to)| (to.clone(), from.clone()))
        .collect();

    let mut report = RewriteReport::default();

    for file in project_files {
        match rewrite_file(file, &from_to, &to_from, &mut report) {
            Ok(Some(group)) => report.edit_groups.push(group),
            Ok(None) => {}
            Err(err) => {
                warn!(file = %file.display(), error = %err, "skipping file during rewrite");
            }
        }
    }

    report
}

fn rewrite_file(
    path: &Path,
    from_to: &HashMap<PathBuf, PathBuf>,
    to_from: &HashMap<PathBuf, PathBuf>,
    report: &mut RewriteReport,
) -> anyhow::Result<Option<EditGroup>> {
    let parsed = parser::parse_file(path)?;
    let block = ImportBlock::from_parsed(&parsed);
    if block.is_empty() {
        return Ok(None);
    }

    let mut builder = ImportBlockBuilder::from_block(&block);
    let mut changed = false;

    // Retarget imports that point at a moved module.
    for record in block.records() {
        let ModuleSpecifier::ProjectRelative(canonical) = &record.specifier else {
            continue;
        };
        let Some(to_module) = from_to.get(canonical) else {
            continue;
        };
        let new_raw = specifier::relativize(path, to_module);
        let to_spec = ModuleSpecifier::ProjectRelative(to_module.clone());
        match builder.rename_module(&record.specifier, to_spec, new_raw) {
            Ok(renamed) => changed |= renamed,
            Err(conflict) => {
                warn!(file = %path.display(), %conflict, "skipping rename");
                report.conflicts += 1;
            }
        }
    }

    // Self-move repair: if this file is a move destination, its own relative
    // imports were written for the old location and may now point elsewhere.
    let self_module = specifier::module_path(path);
    if let Some(old_module) = to_from.get(&self_module) {
        let old_dir = old_module.parent().unwrap_or_else(|| Path::new(""));
        let new_dir = self_module.parent().unwrap_or_else(|| Path::new(""));

        for record in block.records() {
            let ModuleSpecifier::ProjectRelative(canonical) = &record.specifier else {
                continue;
            };
            // Already retargeted above.
            if from_to.contains_key(canonical) {
                continue;
            }
            // Where would this specifier have pointed from the old location?
            let intended = specifier::rebase(canonical, new_dir, old_dir);
            if intended == *canonical {
                continue;
            }
            // A co-moved sibling: the specifier already resolves to the
            // sibling's post-move path, so it is correct as written.
            if from_to.get(&intended) == Some(canonical) {
                continue;
            }
            if !specifier::source_file_exists(&intended) {
                debug!(
                    file = %path.display(),
                    specifier = %record.raw,
                    intended = %intended.display(),
                    "no source file at repair target, leaving import untouched"
                );
                report.unresolved.push(UnresolvedRepair {
                    file: path.to_path_buf(),
                    specifier: record.raw.clone(),
                });
                continue;
            }
            let new_raw = specifier::relativize(path, &intended);
            let to_spec = ModuleSpecifier::ProjectRelative(intended);
            match builder.rename_module(&record.specifier, to_spec, new_raw) {
                Ok(renamed) => changed |= renamed,
                Err(conflict) => {
                    warn!(file = %path.display(), %conflict, "skipping repair rename");
                    report.conflicts += 1;
                }
            }
        }
    }

    if !changed {
        return Ok(None);
    }

    let edits = editor::edits_for_block(&parsed, &builder.build());
    if edits.is_empty() {
        return Ok(None);
    }
    Ok(Some(EditGroup {
        path: path.to_path_buf(),
        edits,
    }))
}
