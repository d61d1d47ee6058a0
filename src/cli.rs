use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Keeps relative imports correct when files and folders move.
///
/// import-mend watches (or is told about) file moves in a TypeScript/JavaScript
/// project and rewrites every affected relative import across the project,
/// including the imports inside the moved files themselves.
#[derive(Parser, Debug)]
#[command(
    name = "import-mend",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch a project directory and rewrite imports as moves happen.
    ///
    /// Filesystem events are batched over a quiet period; a batch that
    /// unambiguously describes a single file or folder move triggers a
    /// project-wide rewrite. Ambiguous batches are ignored.
    Watch {
        /// Path to the project root to watch.
        path: PathBuf,

        /// Quiet period in milliseconds (overrides import-mend.toml).
        #[arg(long)]
        quiet_ms: Option<u64>,
    },

    /// Rewrite imports for a move that has already happened on disk.
    ///
    /// `FROM` is the pre-move path (no longer exists), `TO` the post-move
    /// path. Whether the move was a file or a folder is inferred from `TO`.
    Apply {
        /// Path to the project root.
        path: PathBuf,

        /// Pre-move path of the file or folder.
        #[arg(long)]
        from: PathBuf,

        /// Post-move path of the file or folder.
        #[arg(long)]
        to: PathBuf,

        /// Compute and print the edits without modifying any file.
        #[arg(long)]
        dry_run: bool,

        /// Output results as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}
