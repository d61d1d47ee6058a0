pub mod batcher;
pub mod event;
pub mod extract;

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::MendConfig;
use crate::specifier::SOURCE_EXTENSIONS;
use event::FsEvent;

/// Handle to a running watcher. Dropping it stops the OS watcher.
pub struct WatcherHandle {
    _watcher: notify::RecommendedWatcher,
}

/// Build a Gitignore matcher from the project root's .gitignore file.
/// This is the same source of truth used by `walker::walk_project` via
/// `ignore::WalkBuilder`. If no .gitignore exists, returns an empty matcher
/// that matches nothing.
fn build_gitignore_matcher(project_root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(project_root);
    let gitignore_path = project_root.join(".gitignore");
    if gitignore_path.exists() {
        let _ = builder.add(&gitignore_path);
    }
    builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Start a raw filesystem watcher on `watch_root`.
///
/// Returns a handle (must be kept alive) and a receiver of classified
/// create/delete [`FsEvent`]s, ready to feed the
/// [`EventBatcher`](batcher::EventBatcher). Content modifications are not
/// observed; rename notifications are mapped to their delete/create legs.
///
/// Filtering mirrors `walker::walk_project`: node_modules always excluded,
/// .gitignore rules applied, config exclusions applied. Paths with an
/// extension outside the known source set are dropped; extensionless paths
/// pass through, since folders (and deletions that can no longer be stat'ed)
/// carry none.
pub fn start_watcher(
    watch_root: &Path,
    config: &MendConfig,
) -> anyhow::Result<(WatcherHandle, mpsc::UnboundedReceiver<FsEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel::<FsEvent>();
    let gitignore = build_gitignore_matcher(watch_root);
    let config = config.clone();

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        match result {
            Ok(event) => {
                for fs_event in classify_notification(&event) {
                    if should_observe(&fs_event.path, &gitignore, &config) {
                        let _ = tx.send(fs_event);
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "filesystem watch error");
            }
        }
    })?;
    watcher.watch(watch_root, RecursiveMode::Recursive)?;

    Ok((WatcherHandle { _watcher: watcher }, rx))
}

/// Map one notify event to zero or more create/delete [`FsEvent`]s.
///
/// Rename notifications arrive platform-dependently: as separate From/To
/// legs, as a single Both event carrying two paths, or as an untyped Name
/// change whose direction must be inferred from current existence.
fn classify_notification(event: &notify::Event) -> Vec<FsEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.iter().map(FsEvent::create).collect(),
        EventKind::Remove(_) => event.paths.iter().map(FsEvent::delete).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().map(FsEvent::delete).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().map(FsEvent::create).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut out = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                out.push(FsEvent::delete(from));
            }
            if let Some(to) = event.paths.get(1) {
                out.push(FsEvent::create(to));
            }
            out
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                if p.exists() {
                    FsEvent::create(p)
                } else {
                    FsEvent::delete(p)
                }
            })
            .collect(),
        // Content modifications and metadata changes are not observed.
        _ => Vec::new(),
    }
}

fn should_observe(path: &Path, gitignore: &Gitignore, config: &MendConfig) -> bool {
    // node_modules is always excluded, regardless of .gitignore.
    if path.components().any(|c| c.as_os_str() == "node_modules") {
        return false;
    }

    if gitignore.matched(path, path.is_dir()).is_ignore() {
        return false;
    }

    if crate::walker::is_excluded_by_config(path, config) {
        return false;
    }

    // Extensionless paths may be folders (or deletions we can no longer
    // stat), so they pass; anything with a non-source extension is noise.
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => SOURCE_EXTENSIONS.contains(&ext),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::event::FsEventKind;
    use notify::event::{CreateKind, Event, RemoveKind};
    use std::path::PathBuf;

    #[test]
    fn test_classify_create_and_remove() {
        let create = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/p/a.ts"));
        let events = classify_notification(&create);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FsEventKind::Create);

        let remove = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/p/a.ts"));
        assert_eq!(classify_notification(&remove)[0].kind, FsEventKind::Delete);
    }

    #[test]
    fn test_classify_rename_both_maps_to_delete_then_create() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/p/old.ts"))
            .add_path(PathBuf::from("/p/new.ts"));
        let events = classify_notification(&event);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, FsEventKind::Delete);
        assert_eq!(events[0].path, PathBuf::from("/p/old.ts"));
        assert_eq!(events[1].kind, FsEventKind::Create);
        assert_eq!(events[1].path, PathBuf::from("/p/new.ts"));
    }

    #[test]
    fn test_content_modifications_not_observed() {
        let event = Event::new(EventKind::Modify(ModifyKind::Data(
            notify::event::DataChange::Content,
        )))
        .add_path(PathBuf::from("/p/a.ts"));
        assert!(classify_notification(&event).is_empty());
    }

    #[test]
    fn test_should_observe_filters() {
        let gitignore = Gitignore::empty();
        let config = MendConfig::default();
        assert!(should_observe(Path::new("/p/src/a.ts"), &gitignore, &config));
        assert!(should_observe(Path::new("/p/src/utils"), &gitignore, &config));
        assert!(!should_observe(Path::new("/p/README.md"), &gitignore, &config));
        assert!(!should_observe(
            Path::new("/p/node_modules/react/index.js"),
            &gitignore,
            &config
        ));
    }

    #[test]
    fn test_should_observe_respects_config_excludes() {
        let gitignore = Gitignore::empty();
        let config = MendConfig {
            exclude: Some(vec!["*.generated.ts".to_owned()]),
            ..Default::default()
        };
        assert!(!should_observe(
            Path::new("/p/src/api.generated.ts"),
            &gitignore,
            &config
        ));
    }
}
