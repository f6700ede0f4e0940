use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CodebaseError, Result};

pub const CODEBASE_FILE_EXT: &str = "codebase";
pub const DEFAULT_CFG_DIR_NAME: &str = ".dvlncfg";

pub const ENV_CFG_DIR: &str = "DVLN_CFG_DIR";
pub const ENV_WKSPC_ROOT: &str = "DVLN_WKSPC_ROOT";
pub const ENV_CODEBASE_PATH: &str = "DVLN_CODEBASE_PATH";

/// Read-only settings the locator and loader consult
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Directory holding `<name>.codebase` files
    pub config_dir: PathBuf,

    /// Root of the current workspace, when there is one
    pub workspace_root: Option<PathBuf>,

    /// Extra directories searched, in order, before `config_dir`
    pub codebase_path: Vec<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            workspace_root: None,
            codebase_path: Vec::new(),
        }
    }
}

impl WorkspaceConfig {
    /// Settings from `DVLN_CFG_DIR`, `DVLN_WKSPC_ROOT` and `DVLN_CODEBASE_PATH`
    pub fn from_env() -> Self {
        let config_dir = non_empty_env(ENV_CFG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_config_dir);
        let workspace_root = non_empty_env(ENV_WKSPC_ROOT).map(PathBuf::from);
        let codebase_path = non_empty_env(ENV_CODEBASE_PATH)
            .map(|raw| parse_search_path(&raw))
            .unwrap_or_default();
        Self {
            config_dir,
            workspace_root,
            codebase_path,
        }
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn with_codebase_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.codebase_path = dirs;
        self
    }

    /// `<config_dir>/<selector>.codebase`
    pub fn codebase_file(&self, selector: &str) -> PathBuf {
        codebase_file_in(&self.config_dir, selector)
    }

    /// Every candidate file for a bare selector, in search order
    pub fn candidates(&self, selector: &str) -> Vec<PathBuf> {
        self.codebase_path
            .iter()
            .map(|dir| codebase_file_in(dir, selector))
            .chain(std::iter::once(self.codebase_file(selector)))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.config_dir.as_os_str().is_empty() {
            return Err(CodebaseError::InvalidConfig(
                "config_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn codebase_file_in(dir: &Path, selector: &str) -> PathBuf {
    dir.join(format!("{selector}.{CODEBASE_FILE_EXT}"))
}

fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CFG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CFG_DIR_NAME))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Space separated directories; URL entries belong to remote lookup and are skipped
fn parse_search_path(raw: &str) -> Vec<PathBuf> {
    raw.split_whitespace()
        .filter(|entry| !entry.contains("://"))
        .map(PathBuf::from)
        .collect()
}
