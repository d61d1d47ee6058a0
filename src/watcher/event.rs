use std::path::PathBuf;

/// Raw filesystem notification kinds this core observes. Content
/// modifications are filtered out at the watcher boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Delete,
}

/// A single raw create/delete notification, consumed and discarded by the
/// batcher once a batch fires.
#[derive(Debug, Clone)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Create,
            path: path.into(),
        }
    }

    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Delete,
            path: path.into(),
        }
    }
}
