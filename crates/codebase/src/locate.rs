use std::fmt;
use std::io;
use std::ops::BitOr;
use std::path::{Path, PathBuf};

use url::Url;

use crate::config::WorkspaceConfig;
use crate::error::{CodebaseError, Result};

const REMOTE_SCHEMES: &[&str] = &["http", "https", "ssh", "git", "git+ssh", "ssh+git"];

/// Where a codebase document was found; values combine as bit flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locality(u8);

impl Locality {
    /// Reachable through the local filesystem
    pub const LOCAL: Self = Self(1 << 0);
    /// Reachable through a network URL
    pub const REMOTE: Self = Self(1 << 1);
    /// Not found anywhere
    pub const ABSENT: Self = Self(1 << 2);
    /// Exists, local or remote
    pub const ANYWHERE: Self = Self(Self::LOCAL.0 | Self::REMOTE.0);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// All flags of `other` are set in `self`
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any flag of `other` is set in `self`
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_absent(self) -> bool {
        !self.intersects(Self::ANYWHERE)
    }
}

impl BitOr for Locality {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self {
            Self::LOCAL => "local",
            Self::REMOTE => "remote",
            Self::ABSENT => "absent",
            Self::ANYWHERE => "anywhere",
            _ => return write!(f, "locality({:#b})", self.0),
        };
        f.write_str(label)
    }
}

/// Outcome of a lookup: the resolvable reference and where it lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Filesystem path or URL; empty when absent
    pub reference: String,
    pub locality: Locality,
}

impl Located {
    pub fn absent() -> Self {
        Self {
            reference: String::new(),
            locality: Locality::ABSENT,
        }
    }

    fn local(path: &Path) -> Self {
        Self {
            reference: path.to_string_lossy().into_owned(),
            locality: Locality::LOCAL,
        }
    }
}

/// Classifies a selector as local, remote or absent
#[derive(Debug, Clone)]
pub struct Locator<'a> {
    config: &'a WorkspaceConfig,
}

impl<'a> Locator<'a> {
    pub fn new(config: &'a WorkspaceConfig) -> Self {
        Self { config }
    }

    /// Resolve `selector`, checking the local filesystem first.
    ///
    /// "Not found" is `Ok` with [`Locality::ABSENT`]; only an existence probe
    /// that itself fails produces an error.
    pub fn locate(&self, selector: &str) -> Result<Located> {
        match self.probe(selector) {
            (_, Some(err)) => Err(err),
            (located, None) => Ok(located),
        }
    }

    /// Like [`Locator::locate`] but keeps the locality alongside any error
    pub fn probe(&self, selector: &str) -> (Located, Option<CodebaseError>) {
        if selector.is_empty() {
            log::debug!("No codebase file to read, skipping (considered normal)");
            return (Located::absent(), None);
        }

        for path in self.local_candidates(selector) {
            match exists(&path) {
                Ok(true) => {
                    log::debug!("codebase {selector:?} found locally at {}", path.display());
                    return (Located::local(&path), None);
                }
                Ok(false) => {}
                Err(source) => {
                    log::warn!(
                        "No codebase file to read, skipping (abnormal, unexpected err: {source})"
                    );
                    return (
                        Located::absent(),
                        Some(CodebaseError::ExistenceCheck { path, source }),
                    );
                }
            }
        }

        if is_remote(selector) {
            log::debug!("codebase {selector:?} classified as remote");
            return (
                Located {
                    reference: selector.to_string(),
                    locality: Locality::REMOTE,
                },
                None,
            );
        }

        log::debug!("No codebase file to read, skipping (considered normal)");
        (Located::absent(), None)
    }

    fn local_candidates(&self, selector: &str) -> Vec<PathBuf> {
        let direct = PathBuf::from(selector);
        let mut candidates = vec![direct.clone()];
        if direct.is_relative() {
            if let Some(root) = &self.config.workspace_root {
                candidates.push(root.join(&direct));
            }
        }
        candidates
    }
}

/// Convenience for `Locator::new(config).locate(selector)`
pub fn locate(selector: &str, config: &WorkspaceConfig) -> Result<Located> {
    Locator::new(config).locate(selector)
}

/// `NotFound` is a plain `false`; any other stat failure is an error
pub(crate) fn exists(path: &Path) -> io::Result<bool> {
    Ok(metadata(path)?.is_some())
}

pub(crate) fn is_file(path: &Path) -> io::Result<bool> {
    Ok(metadata(path)?.is_some_and(|meta| meta.is_file()))
}

fn metadata(path: &Path) -> io::Result<Option<std::fs::Metadata>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// True for URLs with a network scheme (`http`, `ssh`, `git+ssh`, ...)
pub fn is_remote(selector: &str) -> bool {
    Url::parse(selector)
        .map(|url| REMOTE_SCHEMES.contains(&url.scheme()) && url.has_host())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn anywhere_combines_local_and_remote() {
        assert!(Locality::ANYWHERE.contains(Locality::LOCAL));
        assert!(Locality::ANYWHERE.contains(Locality::REMOTE));
        assert!(!Locality::ANYWHERE.contains(Locality::ABSENT));
        assert_eq!(Locality::LOCAL | Locality::REMOTE, Locality::ANYWHERE);
        assert!(Locality::ABSENT.is_absent());
        assert!(!Locality::LOCAL.is_absent());
        assert_eq!(Locality::ANYWHERE.to_string(), "anywhere");
    }

    #[test]
    fn empty_selector_is_absent() {
        let cfg = WorkspaceConfig::default();
        let located = locate("", &cfg).unwrap();
        assert_eq!(located, Located::absent());
    }

    #[test]
    fn existing_file_is_local() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("dvln.codebase");
        std::fs::write(&path, "{}").expect("write");

        let cfg = WorkspaceConfig::default();
        let located = locate(path.to_str().unwrap(), &cfg).unwrap();
        assert_eq!(located.locality, Locality::LOCAL);
        assert_eq!(located.reference, path.to_string_lossy());
    }

    #[test]
    fn relative_selector_resolves_under_workspace_root() {
        let temp = TempDir::new().expect("tempdir");
        std::fs::write(temp.path().join("ws.codebase"), "{}").expect("write");

        let cfg = WorkspaceConfig::default().with_workspace_root(temp.path());
        let located = locate("ws.codebase", &cfg).unwrap();
        assert_eq!(located.locality, Locality::LOCAL);
    }

    #[test]
    fn missing_file_is_absent_without_error() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("nope.codebase");
        let cfg = WorkspaceConfig::default();
        let (located, err) = Locator::new(&cfg).probe(path.to_str().unwrap());
        assert_eq!(located, Located::absent());
        assert!(err.is_none());
    }

    #[test]
    fn failed_existence_check_is_not_absence() {
        let temp = TempDir::new().expect("tempdir");
        let file = temp.path().join("f");
        std::fs::write(&file, "").expect("write");
        // a regular file used as a directory fails with "not a directory"
        let selector = file.join("x.codebase");
        let selector = selector.to_str().unwrap();

        let cfg = WorkspaceConfig::default();
        let err = locate(selector, &cfg).expect_err("stat must fail");
        assert_eq!(err.kind(), crate::ErrorKind::ExistenceCheckFailed);
        assert_eq!(err.code(), 3006);

        let (located, err) = Locator::new(&cfg).probe(selector);
        assert_eq!(located, Located::absent());
        assert!(matches!(err, Some(CodebaseError::ExistenceCheck { .. })));
    }

    #[test]
    fn urls_are_remote() {
        assert!(is_remote("http://github.com/dvln/dvln"));
        assert!(is_remote("git+ssh://host.com/path/to/clones/dvln"));
        assert!(!is_remote("file:///tmp/dvln.codebase"));
        assert!(!is_remote("dvln"));
        assert!(!is_remote("github.com/dvln/dvln"));

        let cfg = WorkspaceConfig::default();
        let located = locate("https://github.com/dvln/dvln", &cfg).unwrap();
        assert_eq!(located.locality, Locality::REMOTE);
        assert_eq!(located.reference, "https://github.com/dvln/dvln");
    }
}
