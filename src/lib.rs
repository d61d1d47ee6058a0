//! import-mend keeps a TypeScript/JavaScript project's relative imports
//! consistent when files or folders are moved on disk.
//!
//! Pipeline: raw filesystem notifications are coalesced into batches
//! ([`watcher::batcher`]), each batch is correlated into at most one move
//! operation ([`watcher::extract`]), and confirmed moves are processed one at
//! a time by the [`queue::MoveQueue`], which rewrites every affected relative
//! import project-wide ([`rewrite`]) and applies the resulting text edits
//! through an [`apply::EditSink`].

pub mod apply;
pub mod config;
pub mod parser;
pub mod queue;
pub mod rewrite;
pub mod specifier;
pub mod walker;
pub mod watcher;
