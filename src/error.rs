//! error types
//!
//! structured errors for config, schema and document loading, and the
//! fatal generation failures (unsupported types, field conflicts, unknown
//! operations and fragments).

use std::path::PathBuf;

/// library result type
pub type Result<T> = std::result::Result<T, Error>;

/// error type for the frontend, generator, and loaders
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("document error: {0}")]
    Document(String),

    #[error("unsupported graphql type `{type_name}` in {context}")]
    UnsupportedType {
        /// named type that could not be classified
        type_name: String,
        /// where the type was encountered
        context: String,
    },

    #[error("unknown operation type `{operation_type}` for operation `{operation}`")]
    UnknownOperationType {
        /// operation name
        operation: String,
        /// raw operation type keyword
        operation_type: String,
    },

    #[error("conflicting fields for response key `{response_key}` on {parent}: {reason}")]
    FieldConflict {
        /// response key shared by both fields
        response_key: String,
        /// possible types of the enclosing selection set
        parent: String,
        /// what differs between the two declarations
        reason: String,
    },

    #[error("unknown fragment `{0}`")]
    UnknownFragment(String),

    #[error("io error at {}: {source}", path.display())]
    Io {
        /// file or directory being accessed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// true if the error aborts the whole run rather than a single document
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedType { .. }
                | Error::UnknownOperationType { .. }
                | Error::FieldConflict { .. }
                | Error::UnknownFragment(_)
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
