//! Path validation
//!
//! Resolves untrusted client paths against the storage root and vets upload
//! names and content before anything is written.

use crate::error::ShelfError;
use log::warn;
use path_absolutize::Absolutize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Leading bytes of every PDF document.
pub const PDF_SIGNATURE: &[u8; 4] = b"%PDF";

/// Names Windows treats as devices regardless of extension.
const RESERVED_NAMES: [&str; 4] = ["CON", "PRN", "AUX", "NUL"];

/// Confines client paths to a single canonical root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Creates the root if needed and pins its canonical form.
    pub fn new(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ShelfError> {
        resolve(&self.root, relative)
    }

    /// `relative` joined and normalized, without following any symlink.
    ///
    /// Only meaningful for a path that already passed [`PathResolver::resolve`].
    pub fn unresolved(&self, relative: &str) -> io::Result<PathBuf> {
        Ok(self.root.join(relative).absolutize()?.into_owned())
    }

    /// Client-facing form of a resolved path, `/`-separated and relative to root.
    pub fn to_relative(&self, resolved: &Path) -> String {
        resolved
            .strip_prefix(&self.root)
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default()
    }
}

/// Resolves `relative` below the canonical `root`.
///
/// The joined path is normalized lexically, then its deepest existing ancestor
/// is canonicalized so symlinks are followed while paths that do not exist yet
/// still resolve. The result must be `root` itself or lie below it, compared
/// component-wise so `/data` never admits `/data-other`.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf, ShelfError> {
    let joined = root.join(relative);

    let resolved = joined
        .absolutize()
        .and_then(|normalized| canonicalize_existing(&normalized))
        .map_err(|e| {
            warn!("Unresolvable path {:?}: {}", relative, e);
            ShelfError::Forbidden
        })?;

    if resolved.starts_with(root) {
        Ok(resolved)
    } else {
        warn!("Path traversal attempt: {:?}", relative);
        Err(ShelfError::Forbidden)
    }
}

/// Canonicalizes the longest existing prefix of `path` and re-appends the rest.
fn canonicalize_existing(path: &Path) -> io::Result<PathBuf> {
    let mut existing = path;
    let mut missing: Vec<OsString> = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut base) => {
                base.extend(missing.iter().rev());
                return Ok(base);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Reduces a client-supplied file name to a safe single path component.
///
/// Path separators become word breaks, whitespace runs collapse to `_`, and
/// only ASCII letters, digits, `_`, `.` and `-` survive. Leading and trailing
/// dots and underscores are stripped. Returns `None` if nothing is left.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let kept: String = spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c: char| c == '.' || c == '_');
    if trimmed.is_empty() {
        return None;
    }

    let stem = trimmed.split('.').next().unwrap_or(trimmed).to_ascii_uppercase();
    if RESERVED_NAMES.contains(&stem.as_str()) {
        return Some(format!("_{}", trimmed));
    }

    Some(trimmed.to_string())
}

/// Case-insensitive check of the text after the last dot.
pub fn has_allowed_extension(filename: &str, allowed: &HashSet<String>) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| allowed.contains(&ext.to_ascii_lowercase()))
}

/// Content sniff, independent of the file name.
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pdf_only() -> HashSet<String> {
        HashSet::from(["pdf".to_string()])
    }

    #[test]
    fn empty_relative_resolves_to_root() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        assert_eq!(resolver.resolve("").unwrap(), resolver.root());
    }

    #[test]
    fn parent_segments_never_escape_root() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(&dir.path().join("root")).unwrap();
        std::fs::create_dir_all(resolver.root().join("a/b")).unwrap();

        for depth in 0..8 {
            for base in ["", "a", "a/b", "missing/deeper"] {
                let relative = format!("{}/{}", base, "../".repeat(depth));
                if let Ok(resolved) = resolver.resolve(&relative) {
                    assert!(
                        resolved.starts_with(resolver.root()),
                        "{relative} resolved to {}",
                        resolved.display()
                    );
                }
            }
        }
    }

    #[test]
    fn inner_parent_segments_stay_accepted() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        std::fs::create_dir_all(resolver.root().join("class/cs101")).unwrap();

        let resolved = resolver.resolve("class/cs101/../cs101/./").unwrap();
        assert_eq!(resolved, resolver.root().join("class/cs101"));
    }

    #[test]
    fn etc_passwd_traversal_is_forbidden() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(&dir.path().join("srv/pdfs")).unwrap();

        let err = resolver.resolve("../../etc/passwd").unwrap_err();
        assert!(matches!(err, ShelfError::Forbidden));
    }

    #[test]
    fn prefix_collision_sibling_is_rejected() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(&dir.path().join("data")).unwrap();
        std::fs::create_dir_all(dir.path().join("data-evil")).unwrap();

        assert!(resolver.resolve("../data-evil").is_err());
        assert!(resolver.resolve("../data-evil/x.pdf").is_err());
    }

    #[test]
    fn absolute_relative_is_rejected() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(&dir.path().join("root")).unwrap();
        assert!(resolver.resolve("/etc/passwd").is_err());
    }

    #[test]
    fn missing_destinations_still_resolve_inside_root() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();

        let resolved = resolver.resolve("new/folder/notes.pdf").unwrap();
        assert_eq!(resolved, resolver.root().join("new/folder/notes.pdf"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_root_is_rejected() {
        let dir = tempdir().unwrap();
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        let resolver = PathResolver::new(&dir.path().join("root")).unwrap();
        std::os::unix::fs::symlink(&outside, resolver.root().join("escape")).unwrap();

        assert!(resolver.resolve("escape").is_err());
        assert!(resolver.resolve("escape/secret.pdf").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn unresolved_keeps_the_link_itself() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        std::fs::create_dir_all(resolver.root().join("real")).unwrap();
        std::os::unix::fs::symlink(resolver.root().join("real"), resolver.root().join("alias"))
            .unwrap();

        assert_eq!(resolver.resolve("alias").unwrap(), resolver.root().join("real"));
        assert_eq!(
            resolver.unresolved("./alias").unwrap(),
            resolver.root().join("alias")
        );
    }

    #[test]
    fn relative_display_uses_forward_slashes() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        let resolved = resolver.resolve("class/cs101/notes.pdf").unwrap();
        assert_eq!(resolver.to_relative(&resolved), "class/cs101/notes.pdf");
        assert_eq!(resolver.to_relative(resolver.root()), "");
    }

    #[test]
    fn sanitize_strips_separators_and_unsafe_characters() {
        assert_eq!(sanitize_filename("notes.pdf").as_deref(), Some("notes.pdf"));
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(
            sanitize_filename("my cool  notes!.pdf").as_deref(),
            Some("my_cool_notes.pdf")
        );
        assert_eq!(sanitize_filename("..\\win\\x.pdf").as_deref(), Some("win_x.pdf"));
        assert_eq!(sanitize_filename("con.pdf").as_deref(), Some("_con.pdf"));
        assert_eq!(sanitize_filename("../.."), None);
        assert_eq!(sanitize_filename("   "), None);
    }

    #[test]
    fn sanitized_names_never_contain_separators() {
        for raw in ["a/b/c.pdf", "/abs.pdf", "x\\y.pdf", "..//..//z.pdf"] {
            let name = sanitize_filename(raw).unwrap();
            assert!(!name.contains('/') && !name.contains('\\'), "{raw} -> {name}");
            assert!(!name.is_empty());
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_allowed_extension("NOTES.PDF", &pdf_only()));
        assert!(has_allowed_extension("a.b.pdf", &pdf_only()));
        assert!(!has_allowed_extension("virus.exe", &pdf_only()));
        assert!(!has_allowed_extension("pdf", &pdf_only()));
        assert!(!has_allowed_extension("notes.pdf.exe", &pdf_only()));
    }

    #[test]
    fn signature_requires_leading_marker() {
        assert!(has_pdf_signature(b"%PDF-1.4\n"));
        assert!(!has_pdf_signature(b"MZ\x90\x00"));
        assert!(!has_pdf_signature(b"%PD"));
        assert!(!has_pdf_signature(b" %PDF"));
    }
}
