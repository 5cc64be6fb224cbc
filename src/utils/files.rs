//! Manual page file resolution.
//!
//! The engine never touches the filesystem directly. A [`FileResolver`]
//! maps a page name and optional section to candidate files, and loads the
//! text of a path named by a `.so` request.

use indexmap::IndexMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

use super::charset::decode_source;

/// Error type for resolver operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResolveError {
    /// File not found.
    NotFound(String),
    /// Read error.
    ReadError(String),
}

impl std::fmt::Display for FileResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileResolveError::NotFound(path) => write!(f, "file not found: {}", path),
            FileResolveError::ReadError(msg) => write!(f, "read error: {}", msg),
        }
    }
}

impl std::error::Error for FileResolveError {}

/// Source of manual page files.
pub trait FileResolver {
    /// Candidate paths for `name` in `section` (any section when `None`).
    /// An empty list means the page does not exist.
    fn resolve(&self, name: &str, section: Option<&str>) -> Result<Vec<String>, FileResolveError>;

    /// Read the text behind a path, as produced by [`FileResolver::resolve`]
    /// or written in a `.so` request.
    fn load(&self, path: &str) -> Result<String, FileResolveError>;
}

/// Whether `file_name` is a page file for `name` in `section`,
/// e.g. `ls.1`, `ssl.3ssl` or `ls.1.txt`.
pub fn matches_page(file_name: &str, name: &str, section: Option<&str>) -> bool {
    let Some(rest) = file_name
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('.'))
    else {
        return false;
    };
    match section {
        Some(sec) => rest.starts_with(sec),
        None => rest.starts_with(|c: char| c.is_ascii_alphanumeric()),
    }
}

/// A resolver that knows no files.
///
/// Useful for sandboxed environments and for rendering standalone text.
pub struct NoopFileResolver;

impl FileResolver for NoopFileResolver {
    fn resolve(&self, _name: &str, _section: Option<&str>) -> Result<Vec<String>, FileResolveError> {
        Ok(Vec::new())
    }

    fn load(&self, path: &str) -> Result<String, FileResolveError> {
        Err(FileResolveError::NotFound(path.to_string()))
    }
}

/// An in-memory resolver for tests and bundled pages.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileResolver {
    files: IndexMap<String, String>,
}

impl MemoryFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, keyed by its path.
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder form of [`MemoryFileResolver::add_file`].
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }
}

impl FileResolver for MemoryFileResolver {
    fn resolve(&self, name: &str, section: Option<&str>) -> Result<Vec<String>, FileResolveError> {
        Ok(self
            .files
            .keys()
            .filter(|path| {
                let file_name = path.rsplit('/').next().unwrap_or(path);
                matches_page(file_name, name, section)
            })
            .cloned()
            .collect())
    }

    fn load(&self, path: &str) -> Result<String, FileResolveError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FileResolveError::NotFound(path.to_string()))
    }
}

/// Resolver over `man*` section directories below a list of roots.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Default)]
pub struct StdFileResolver {
    roots: Vec<PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
impl StdFileResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Roots taken from a colon separated search path such as `MANPATH`.
    pub fn from_search_path(search_path: &str) -> Self {
        let roots = search_path
            .split(':')
            .filter(|part| !part.is_empty())
            .map(PathBuf::from)
            .collect();
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn section_dirs(&self, root: &Path, section: Option<&str>) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(root) else {
            return Vec::new();
        };
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                let Some(dir_section) = dir_name.strip_prefix("man") else {
                    return false;
                };
                match section {
                    Some(sec) => sec.starts_with(dir_section) && !dir_section.is_empty(),
                    None => !dir_section.is_empty(),
                }
            })
            .collect();
        dirs.sort();
        dirs
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FileResolver for StdFileResolver {
    fn resolve(&self, name: &str, section: Option<&str>) -> Result<Vec<String>, FileResolveError> {
        let mut found = Vec::new();
        for root in &self.roots {
            for dir in self.section_dirs(root, section) {
                let Ok(entries) = std::fs::read_dir(&dir) else {
                    continue;
                };
                let mut pages: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .map(|file_name| matches_page(file_name, name, section))
                            .unwrap_or(false)
                    })
                    .collect();
                pages.sort();
                found.extend(pages.into_iter().map(|p| p.to_string_lossy().into_owned()));
            }
        }
        Ok(found)
    }

    fn load(&self, path: &str) -> Result<String, FileResolveError> {
        let direct = Path::new(path);
        let candidate = if direct.is_absolute() || direct.exists() {
            Some(direct.to_path_buf())
        } else {
            self.roots
                .iter()
                .map(|root| root.join(path))
                .find(|joined| joined.exists())
        };
        let candidate = candidate.ok_or_else(|| FileResolveError::NotFound(path.to_string()))?;
        let bytes =
            std::fs::read(&candidate).map_err(|e| FileResolveError::ReadError(e.to_string()))?;
        Ok(decode_source(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_page() {
        assert!(matches_page("ls.1", "ls", Some("1")));
        assert!(matches_page("ssl.3ssl", "ssl", Some("3")));
        assert!(matches_page("ls.1", "ls", None));
        assert!(!matches_page("lsof.8", "ls", None));
        assert!(!matches_page("ls.1", "ls", Some("8")));
        assert!(!matches_page("ls", "ls", None));
    }

    #[test]
    fn test_memory_resolver() {
        let resolver = MemoryFileResolver::new()
            .with_file("man1/ls.1", ".Dd x")
            .with_file("man8/ls.8", ".Dd y")
            .with_file("man1/cat.1", ".Dd z");

        assert_eq!(
            resolver.resolve("ls", None).unwrap(),
            vec!["man1/ls.1".to_string(), "man8/ls.8".to_string()]
        );
        assert_eq!(
            resolver.resolve("ls", Some("8")).unwrap(),
            vec!["man8/ls.8".to_string()]
        );
        assert!(resolver.resolve("grep", None).unwrap().is_empty());
        assert_eq!(resolver.load("man1/cat.1").unwrap(), ".Dd z");
        assert!(matches!(
            resolver.load("missing"),
            Err(FileResolveError::NotFound(_))
        ));
    }

    #[test]
    fn test_noop_resolver() {
        assert!(NoopFileResolver.resolve("ls", None).unwrap().is_empty());
        assert!(NoopFileResolver.load("ls.1").is_err());
    }

    #[test]
    fn test_std_resolver_search_path() {
        let resolver = StdFileResolver::from_search_path("/usr/share/man::/opt/man");
        assert_eq!(resolver.roots().len(), 2);
    }
}
