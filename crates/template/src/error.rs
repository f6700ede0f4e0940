use thiserror::Error;

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors raised while parsing or executing a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template text is not syntactically valid
    #[error("template: {name}:{offset}: {message}")]
    Parse {
        name: String,
        offset: usize,
        message: String,
    },

    /// A field reference names a key the context does not define
    #[error("template: {name}: map has no entry for key \"{key}\"")]
    UndefinedKey { name: String, key: String },

    /// Any other execution-time failure
    #[error("template: {name}: {message}")]
    Exec { name: String, message: String },
}

impl TemplateError {
    pub(crate) fn parse(name: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            name: name.to_string(),
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn exec(name: &str, message: impl Into<String>) -> Self {
        Self::Exec {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// True for errors found while parsing, false for execution failures
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
