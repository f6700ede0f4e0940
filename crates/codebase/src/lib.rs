//! # dvln codebase
//!
//! Codebase definitions: which packages a `dvln` workspace knows about,
//! where their repositories live, and who may access them.
//!
//! ## Pipeline
//!
//! ```text
//! selector ("dvln", "./x.codebase", "https://...")
//!     │
//!     ├──> Loader: bare name → <dir>/<name>.codebase along the search path
//!     │
//!     ├──> Locator: local | remote | absent
//!     │      └─> absent → generated default definition
//!     │
//!     ├──> Decoder: JSON → generic tree → typed Definition (weak typing)
//!     │
//!     └──> Expander: {{.var}} in access keys, repo and remote URIs
//!            └─> Definition (immutable from here on)
//! ```
//!
//! The Compactor runs the other way, folding variable values back into
//! `{{.var}}` placeholders before a definition is written out.
//!
//! ## Example
//!
//! ```rust
//! use dvln_codebase::decode;
//!
//! let doc = br#"{
//!   "name": "dvln",
//!   "vars": { "dvln": "http://github.com/dvln" },
//!   "pkgs": [ { "name": "viper", "vcs": [ { "type": "git", "repo": { "rw": "{{.dvln}}/viper" } } ] } ]
//! }"#;
//!
//! let def = decode(doc).unwrap();
//! assert_eq!(def.pkgs[0].vcs[0].repo["rw"], "http://github.com/dvln/viper");
//! ```

mod coerce;
mod compact;
mod config;
mod decode;
mod error;
mod expand;
mod load;
mod locate;
mod model;

pub use compact::{compact, compacted};
pub use config::{
    WorkspaceConfig, CODEBASE_FILE_EXT, ENV_CFG_DIR, ENV_CODEBASE_PATH, ENV_WKSPC_ROOT,
};
pub use decode::{decode, decode_raw, decode_reader};
pub use error::{CodebaseError, ErrorKind, Result};
pub use expand::{expand, is_expanded};
pub use load::{find_and_load, Loaded, Loader, RemoteFetcher};
pub use locate::{is_remote, locate, Locality, Located, Locator};
pub use model::{
    Definition, PackageRef, StringMap, UriMap, VcsBinding, GENERATED_DESC, GENERATED_NAME,
};
