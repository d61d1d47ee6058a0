use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Source file extensions that participate in module resolution.
/// Specifiers never carry these extensions, so they are stripped during
/// canonicalization and when converting a file path to its module path.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "mjs"];

/// A classified import target.
///
/// `External` specifiers resolve through a package-resolution mechanism
/// outside the project (node_modules, builtins) and are never rewritten.
/// `ProjectRelative` specifiers carry their canonical, referrer-independent
/// form: resolved against the referrer's directory, lexically normalized,
/// source extension stripped. Two differently-spelled relative specifiers
/// pointing at the same file compare equal in this form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleSpecifier {
    External(String),
    ProjectRelative(PathBuf),
}

impl ModuleSpecifier {
    /// Classify and canonicalize a raw specifier string as written in
    /// `referrer`'s import section. Pure path algebra — no filesystem access.
    pub fn parse(referrer: &Path, raw: &str) -> Self {
        if is_relative_marker(raw) || raw.starts_with('/') {
            ModuleSpecifier::ProjectRelative(canonicalize(referrer, raw))
        } else {
            ModuleSpecifier::External(raw.to_owned())
        }
    }

    pub fn is_project_relative(&self) -> bool {
        matches!(self, ModuleSpecifier::ProjectRelative(_))
    }
}

impl fmt::Display for ModuleSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSpecifier::External(name) => write!(f, "{name}"),
            ModuleSpecifier::ProjectRelative(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_relative_marker(raw: &str) -> bool {
    raw == "." || raw == ".." || raw.starts_with("./") || raw.starts_with("../")
}

/// Resolve `raw` against the directory containing `referrer` and reduce it to
/// canonical module-path form (normalized, source extension stripped).
pub fn canonicalize(referrer: &Path, raw: &str) -> PathBuf {
    let dir = referrer.parent().unwrap_or_else(|| Path::new(""));
    let joined = if raw.starts_with('/') {
        PathBuf::from(raw)
    } else {
        dir.join(raw)
    };
    strip_source_extension(&normalize(&joined))
}

/// Compute the specifier text that makes `referrer` import `target`.
///
/// The inverse of [`canonicalize`]: a relative path from the referrer's
/// directory to the target, forward slashes, target extension stripped,
/// prefixed with `./` when it does not already start with a relative marker.
pub fn relativize(referrer: &Path, target: &Path) -> String {
    let target = strip_source_extension(target);
    let dir = referrer.parent().unwrap_or_else(|| Path::new(""));
    let rel = relative_to(dir, &target);
    let text = rel.to_string_lossy().replace('\\', "/");
    if text.is_empty() || text == "." {
        ".".to_owned()
    } else if text.starts_with("./") || text.starts_with("../") || text == ".." {
        text
    } else {
        format!("./{text}")
    }
}

/// Map a source file path to its module path (source extension stripped).
/// Paths without a known source extension are returned unchanged.
pub fn module_path(file: &Path) -> PathBuf {
    strip_source_extension(file)
}

/// Lexically normalize a path: fold `.` components and resolve `..` against
/// preceding normal components. Never touches the filesystem, so a `..` at
/// the front (or above the root) is preserved rather than guessed at.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

fn strip_source_extension(path: &Path) -> PathBuf {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if SOURCE_EXTENSIONS.contains(&ext) {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

/// Compute a lexical relative path from directory `from` to `to`.
/// Both paths must be in the same form (both absolute or both rooted at the
/// same base); no filesystem access is performed.
fn relative_to(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for comp in &to[common..] {
        out.push(comp);
    }
    out
}

/// Re-root `path` from `base` onto `new_base`: the location the same relative
/// offset reaches when resolved from `new_base` instead of `base`. Used by
/// self-move repair to ask where a specifier would have pointed from a file's
/// pre-move directory.
pub fn rebase(path: &Path, base: &Path, new_base: &Path) -> PathBuf {
    normalize(&new_base.join(relative_to(base, path)))
}

/// Best-effort lookup of a source file at the given module path, used only by
/// self-move repair. Checks `{module}.{ext}` for every known extension, then
/// directory-style `{module}/index.{ext}`. Racy by nature — a miss is
/// reported as an unresolved repair, never retried.
pub fn source_file_exists(module: &Path) -> bool {
    let base = module.to_string_lossy();
    for ext in SOURCE_EXTENSIONS {
        if PathBuf::from(format!("{base}.{ext}")).is_file() {
            return true;
        }
        if module.join(format!("index.{ext}")).is_file() {
            return true;
        }
    }
    false
}
