/// Catalogue file formats
/// Every handler reads into and writes from the same `Catalogue` model
pub mod escape;
pub mod json;
pub mod ts;

use crate::catalog::{Catalogue, MessageKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("XML error at line {line}: {message}")]
    Xml { line: usize, message: String },

    #[error("document ends inside <{element}>")]
    UnexpectedEof { element: String },

    #[error("line {line}: unexpected <{element}> inside <{parent}>")]
    UnexpectedElement {
        line: usize,
        element: String,
        parent: String,
    },

    #[error("line {line}: unexpected text inside <{parent}>")]
    UnexpectedText { line: usize, parent: String },

    #[error("line {line}: <{element}> has no <{child}>")]
    MissingElement {
        line: usize,
        element: String,
        child: String,
    },

    #[error("line {line}: invalid value \"{value}\" for attribute `{attribute}`")]
    InvalidAttribute {
        line: usize,
        attribute: String,
        value: String,
    },

    #[error("line {line}: {construct} is not supported")]
    Unsupported { line: usize, construct: String },

    #[error("context \"{context}\" contains message {key} more than once")]
    DuplicateMessage { context: String, key: MessageKey },

    #[error("context \"{context}\" message {key}: translation shape does not match numerus=\"{numerus}\"")]
    NumerusMismatch {
        context: String,
        key: MessageKey,
        numerus: &'static str,
    },

    #[error("document has no <TS> root element")]
    MissingRoot,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Qt Linguist XML
    Ts,
    Json,
    Unknown,
}

impl FileFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "ts" => Self::Ts,
            "json" => Self::Json,
            _ => Self::Unknown,
        }
    }

    /// Detect format from path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

/// Trait for format-specific handlers
pub trait FormatHandler: Send + Sync {
    /// Parse a whole document; never returns a partial catalogue
    fn parse(&self, content: &str) -> Result<Catalogue, FormatError>;

    fn serialize(&self, catalogue: &Catalogue) -> Result<String, FormatError>;

    /// Get the format this handler supports
    fn format(&self) -> FileFormat;
}

/// Get appropriate handler for a file
pub fn get_handler(format: FileFormat) -> Option<Box<dyn FormatHandler>> {
    match format {
        FileFormat::Ts => Some(Box::new(ts::TsHandler::new())),
        FileFormat::Json => Some(Box::new(json::JsonHandler::new())),
        FileFormat::Unknown => None,
    }
}

/// Reject catalogues where a context repeats a `(source, comment)` key
pub(crate) fn ensure_unique_keys(catalogue: &Catalogue) -> Result<(), FormatError> {
    match catalogue.duplicate_keys().into_iter().next() {
        Some((context, key)) => Err(FormatError::DuplicateMessage { context, key }),
        None => Ok(()),
    }
}

/// Reject numerus messages without plural forms and plain messages with them
pub(crate) fn ensure_consistent_shapes(catalogue: &Catalogue) -> Result<(), FormatError> {
    match catalogue.messages().find(|(_, m)| !m.has_consistent_shape()) {
        Some((context, message)) => Err(FormatError::NumerusMismatch {
            context: context.to_string(),
            key: message.key(),
            numerus: if message.numerus { "yes" } else { "no" },
        }),
        None => Ok(()),
    }
}
