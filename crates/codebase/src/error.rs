use std::path::PathBuf;

use dvln_template::TemplateError;
use thiserror::Error;

/// Result type for codebase operations
pub type Result<T> = std::result::Result<T, CodebaseError>;

/// Stable classification of every failure a load can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ReadFailed,
    MalformedInput,
    SchemaMapping,
    TemplateParse,
    TemplateExecution,
    ExistenceCheckFailed,
    DuplicateAccessKey,
    RemoteUnsupported,
    RemoteFetchFailed,
    InvalidConfig,
    Serialize,
}

impl ErrorKind {
    /// Numeric code reported to users and scripts
    pub fn code(self) -> u32 {
        match self {
            Self::ReadFailed => 3000,
            Self::MalformedInput => 3001,
            Self::SchemaMapping => 3003,
            Self::TemplateParse => 3004,
            Self::TemplateExecution => 3005,
            Self::ExistenceCheckFailed => 3006,
            Self::DuplicateAccessKey => 3007,
            Self::RemoteUnsupported => 3008,
            Self::RemoteFetchFailed => 3009,
            Self::InvalidConfig => 3010,
            Self::Serialize => 3011,
        }
    }
}

/// Errors that can occur while locating, decoding, expanding or compacting
#[derive(Error, Debug)]
pub enum CodebaseError {
    /// Codebase file located but unreadable
    #[error("codebase file \"{}\" read failed: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not valid JSON
    #[error("failed to decode codebase JSON{}: {source}", fmt_offset(.offset))]
    MalformedInput {
        offset: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    /// JSON is valid but a value cannot be coerced into the model
    #[error("failed to decode codebase contents at {path}: expected {expected}, found {found}")]
    SchemaMapping {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An expansion-eligible field is not a valid template
    #[error("parsing problem applying templates to:\n{field}\n  Template: {template}\n  Cause: {source}")]
    TemplateParse {
        field: String,
        template: String,
        #[source]
        source: TemplateError,
    },

    /// A template referenced an undefined variable or otherwise failed to run
    #[error("template execute problem with codebase definition\n{field}\n  Template: {template}\n  Cause: {source}")]
    TemplateExecution {
        field: String,
        template: String,
        #[source]
        source: TemplateError,
    },

    /// The existence probe itself failed (not the same as "not found")
    #[error("existence check for \"{}\" failed: {source}", .path.display())]
    ExistenceCheck {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two access conditionals expanded to the same key
    #[error("access conditionals {first:?} and {second:?} both expand to {key:?}")]
    DuplicateAccessKey {
        key: String,
        first: String,
        second: String,
    },

    /// Codebase lives at a remote location and no fetcher is configured
    #[error("codebase {url} is remote and no remote fetcher is configured")]
    RemoteUnsupported { url: String },

    /// The configured fetcher could not retrieve a remote codebase
    #[error("fetching remote codebase {url} failed: {message}")]
    RemoteFetch { url: String, message: String },

    /// Workspace configuration is unusable
    #[error("invalid workspace configuration: {0}")]
    InvalidConfig(String),

    /// Serializing a definition failed
    #[error("failed to serialize codebase: {0}")]
    Serialize(#[source] serde_json::Error),
}

fn fmt_offset(offset: &Option<usize>) -> String {
    offset
        .map(|at| format!(" (bad char offset: {at})"))
        .unwrap_or_default()
}

impl CodebaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReadFailed { .. } => ErrorKind::ReadFailed,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::SchemaMapping { .. } => ErrorKind::SchemaMapping,
            Self::TemplateParse { .. } => ErrorKind::TemplateParse,
            Self::TemplateExecution { .. } => ErrorKind::TemplateExecution,
            Self::ExistenceCheck { .. } => ErrorKind::ExistenceCheckFailed,
            Self::DuplicateAccessKey { .. } => ErrorKind::DuplicateAccessKey,
            Self::RemoteUnsupported { .. } => ErrorKind::RemoteUnsupported,
            Self::RemoteFetch { .. } => ErrorKind::RemoteFetchFailed,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Serialize(_) => ErrorKind::Serialize,
        }
    }

    pub fn code(&self) -> u32 {
        self.kind().code()
    }

    /// Wrap a template failure for `field`, keeping parse and execution apart
    pub(crate) fn template(field: String, template: &str, source: TemplateError) -> Self {
        let template = template.to_string();
        if source.is_parse() {
            Self::TemplateParse {
                field,
                template,
                source,
            }
        } else {
            Self::TemplateExecution {
                field,
                template,
                source,
            }
        }
    }

    pub(crate) fn schema(path: &str, expected: &'static str, found: &'static str) -> Self {
        Self::SchemaMapping {
            path: path.to_string(),
            expected,
            found,
        }
    }
}
