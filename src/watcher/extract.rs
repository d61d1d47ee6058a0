use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::event::{FsEvent, FsEventKind};

/// What kind of filesystem item a move operation relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoveKind {
    File,
    Folder,
}

/// A confirmed correlation of one deletion and one creation: a single file or
/// folder relocation. Consumed once by the rewrite pipeline, then discarded.
#[derive(Debug, Clone)]
pub struct MoveOperation {
    pub kind: MoveKind,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Why a batch could not be resolved to exactly one move. Declined batches
/// are dropped — the next batch may carry corrective events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclineReason {
    #[error("batch contained no usable creation/deletion pair")]
    EmptyBatch,
    #[error("cannot disambiguate a simultaneous file and folder move")]
    MixedFileAndFolderCreation,
    #[error("creation/deletion count mismatch ({creations} created, {deletions} deleted)")]
    CountMismatch { creations: usize, deletions: usize },
    #[error("cannot correlate moving {0} items at a time")]
    MultipleCandidates(usize),
}

/// The extractor's verdict on a batch: a tagged result rather than a
/// side-effecting log call, so callers and tests can assert on the reason.
#[derive(Debug)]
pub enum MoveOutcome {
    Resolved(MoveOperation),
    Declined(DeclineReason),
}

/// Try to correlate a batch of creation and deletion events into exactly one
/// coherent move. When the batch is ambiguous, decline — never guess.
///
/// Classification consults the filesystem: a created path must currently be a
/// directory (folder move) or a plain file (file move). A path that no longer
/// exists by the time of the check falls through both filters, which can
/// itself cause a decline — inaction is preferred over a wrong guess.
pub fn extract_move(events: &[FsEvent]) -> MoveOutcome {
    let mut events: Vec<&FsEvent> = events.iter().collect();
    events.sort_by(|a, b| a.path.cmp(&b.path));

    // Outermost created directories only: sorting guarantees ancestors are
    // classified before their descendants.
    let mut folder_creations: Vec<&FsEvent> = Vec::new();
    for &event in &events {
        if event.kind == FsEventKind::Create
            && event.path.is_dir()
            && !is_contained_in_some_folder(&event.path, &folder_creations)
        {
            folder_creations.push(event);
        }
    }

    // File creations nested under a created folder are swallowed: they are
    // effects of the folder creation, not separate moves.
    let file_creations: Vec<&FsEvent> = events
        .iter()
        .filter(|e| e.kind == FsEventKind::Create && e.path.is_file())
        .filter(|e| !is_contained_in_some_folder(&e.path, &folder_creations))
        .copied()
        .collect();

    let deletions: Vec<&FsEvent> = events
        .iter()
        .filter(|e| e.kind == FsEventKind::Delete)
        .copied()
        .collect();

    if !folder_creations.is_empty() && !file_creations.is_empty() {
        return MoveOutcome::Declined(DeclineReason::MixedFileAndFolderCreation);
    }

    let kind = if folder_creations.is_empty() {
        MoveKind::File
    } else {
        MoveKind::Folder
    };
    let creations = if folder_creations.is_empty() {
        file_creations
    } else {
        folder_creations
    };

    if creations.len() != deletions.len() {
        return MoveOutcome::Declined(DeclineReason::CountMismatch {
            creations: creations.len(),
            deletions: deletions.len(),
        });
    }
    match creations.len() {
        0 => return MoveOutcome::Declined(DeclineReason::EmptyBatch),
        1 => {}
        n => return MoveOutcome::Declined(DeclineReason::MultipleCandidates(n)),
    }

    MoveOutcome::Resolved(MoveOperation {
        kind,
        from: deletions[0].path.clone(),
        to: creations[0].path.clone(),
    })
}

fn is_contained_in_some_folder(path: &Path, folders: &[&FsEvent]) -> bool {
    folders.iter().any(|f| path.starts_with(&f.path))
}
