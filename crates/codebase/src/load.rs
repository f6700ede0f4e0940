use std::path::{Path, PathBuf};

use crate::config::{WorkspaceConfig, CODEBASE_FILE_EXT};
use crate::decode::decode;
use crate::error::{CodebaseError, Result};
use crate::locate::{self, is_remote, Locality, Located, Locator};
use crate::model::Definition;

/// Retrieves codebase documents that live behind a URL
pub trait RemoteFetcher {
    /// Raw document bytes for `url`
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// A loaded definition plus where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub definition: Definition,
    pub located: Located,
}

impl Loaded {
    /// True when no document existed and the generated default was used
    pub fn is_generated(&self) -> bool {
        self.located.locality.is_absent()
    }
}

/// Finds, reads, decodes and expands codebase definitions
pub struct Loader {
    config: WorkspaceConfig,
    fetcher: Option<Box<dyn RemoteFetcher>>,
}

impl Loader {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            config,
            fetcher: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl RemoteFetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Turn a selector into what the locator should probe.
    ///
    /// URLs, existing files and path-like selectors pass through; a bare
    /// name becomes the first existing `<dir>/<name>.codebase` along the
    /// search path, falling back to the file under `config_dir`.
    ///
    /// A stat failure other than "not found" on any probed path is returned
    /// as [`CodebaseError::ExistenceCheck`] instead of skipping that path.
    pub fn resolve_selector(&self, selector: &str) -> Result<String> {
        if selector.is_empty() || is_remote(selector) || looks_like_path(selector) {
            return Ok(selector.to_string());
        }
        if checked(Path::new(selector), locate::is_file)? {
            return Ok(selector.to_string());
        }
        let mut chosen = None;
        for candidate in self.config.candidates(selector) {
            if checked(&candidate, locate::exists)? {
                chosen = Some(candidate);
                break;
            }
        }
        let chosen = chosen.unwrap_or_else(|| self.config.codebase_file(selector));
        log::debug!("selector {selector:?} resolved to {}", chosen.display());
        Ok(chosen.to_string_lossy().into_owned())
    }

    /// Locate `selector` and produce a ready-to-use definition.
    ///
    /// A missing document is not an error: the generated default comes back
    /// with [`Locality::ABSENT`]. Every other failure returns no definition.
    pub fn find_and_load(&self, selector: &str) -> Result<Loaded> {
        self.config.validate()?;
        let resolved = self.resolve_selector(selector)?;
        let located = Locator::new(&self.config).locate(&resolved)?;

        let definition = match located.locality {
            Locality::LOCAL => self.load_local(Path::new(&located.reference))?,
            Locality::REMOTE => self.load_remote(&located.reference)?,
            _ => {
                log::info!("No codebase document for {selector:?}, proceeding with defaults");
                Definition::generated()
            }
        };
        Ok(Loaded {
            definition,
            located,
        })
    }

    fn load_local(&self, path: &Path) -> Result<Definition> {
        let bytes = std::fs::read(path).map_err(|source| CodebaseError::ReadFailed {
            path: PathBuf::from(path),
            source,
        })?;
        decode(&bytes)
    }

    fn load_remote(&self, url: &str) -> Result<Definition> {
        let Some(fetcher) = &self.fetcher else {
            return Err(CodebaseError::RemoteUnsupported {
                url: url.to_string(),
            });
        };
        log::debug!("fetching remote codebase {url}");
        decode(&fetcher.fetch(url)?)
    }
}

fn checked(path: &Path, check: fn(&Path) -> std::io::Result<bool>) -> Result<bool> {
    check(path).map_err(|source| {
        log::warn!(
            "existence check for {} failed (abnormal, unexpected err: {source})",
            path.display()
        );
        CodebaseError::ExistenceCheck {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn looks_like_path(selector: &str) -> bool {
    selector.contains('/')
        || selector.contains(std::path::MAIN_SEPARATOR)
        || Path::new(selector)
            .extension()
            .is_some_and(|ext| ext == CODEBASE_FILE_EXT)
}

/// Convenience for `Loader::new(config.clone()).find_and_load(selector)`
pub fn find_and_load(selector: &str, config: &WorkspaceConfig) -> Result<Definition> {
    Loader::new(config.clone())
        .find_and_load(selector)
        .map(|loaded| loaded.definition)
}
