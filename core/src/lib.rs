pub mod backup;
pub mod catalog;
pub mod config;
pub mod encoding;
pub mod formats;
pub mod lookup;
pub mod merge;
pub mod placeholder;
pub mod plural;
pub mod stats;
pub mod store;
pub mod validator;

#[cfg(test)]
mod integration_tests;

pub use backup::{backup_and_swap, BackupError, BackupOutcome};
pub use catalog::{
    Catalogue, Context, DocumentLayout, LineRef, Location, Message, MessageKey, Translation,
    TranslationStatus, XmlText,
};
pub use config::{CatalogConfig, ConfigError, OutputOptions};
pub use encoding::{Encoding, FileMetadata, Newline};
pub use formats::{get_handler, FileFormat, FormatError, FormatHandler};
pub use lookup::{LookupOptions, Translator};
pub use merge::{extraction_of, merge, MergeOptions, MergeReport};
pub use placeholder::PlaceholderSet;
pub use plural::PluralRule;
pub use stats::{CatalogueStats, ContextStats, Counts};
pub use store::{load_catalogue, save_catalogue, LoadedCatalogue, StoreError};
pub use validator::{
    validate_catalogue, IssueCode, Severity, ValidationIssue, ValidationReport, ValidatorOptions,
};
