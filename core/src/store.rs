/// Reading and writing catalogue files on disk
use crate::backup::{backup_and_swap, BackupError, BackupOutcome};
use crate::catalog::Catalogue;
use crate::encoding::{FileMetadata, Newline};
use crate::formats::{get_handler, FileFormat, FormatError, FormatHandler};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("{path}: {source}")]
    Format { path: PathBuf, source: FormatError },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: BackupError },

    #[error("unsupported catalogue file: {0}")]
    UnsupportedFormat(PathBuf),
}

/// A catalogue together with how its file was stored
#[derive(Debug, Clone)]
pub struct LoadedCatalogue {
    pub catalogue: Catalogue,
    pub metadata: FileMetadata,
    pub format: FileFormat,
}

fn handler_for(path: &Path) -> Result<(FileFormat, Box<dyn FormatHandler>), StoreError> {
    let format = FileFormat::from_path(path);
    get_handler(format)
        .map(|handler| (format, handler))
        .ok_or_else(|| StoreError::UnsupportedFormat(path.to_path_buf()))
}

/// Load a `.ts` or `.json` catalogue, detecting its encoding
pub fn load_catalogue<P: AsRef<Path>>(path: P) -> Result<LoadedCatalogue, StoreError> {
    let path = path.as_ref();
    let (format, handler) = handler_for(path)?;
    let (text, metadata) = FileMetadata::read_file(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let catalogue = handler.parse(&text).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!(
        "loaded {} ({:?}, {} contexts, {} messages)",
        path.display(),
        metadata.encoding,
        catalogue.contexts.len(),
        catalogue.message_count()
    );
    Ok(LoadedCatalogue {
        catalogue,
        metadata,
        format,
    })
}

/// Serialize for `path`'s format and re-encode like `metadata`
pub fn render_catalogue(
    path: &Path,
    catalogue: &Catalogue,
    metadata: &FileMetadata,
) -> Result<Vec<u8>, StoreError> {
    let (format, handler) = handler_for(path)?;
    let mut text = handler.serialize(catalogue).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    // TS output follows the catalogue layout; JSON follows the file
    if format == FileFormat::Json && metadata.newline == Newline::Crlf {
        text = text.replace('\n', "\r\n");
    }
    Ok(FileMetadata::encode(&text, metadata.encoding))
}

/// Write a catalogue atomically, optionally keeping a backup
pub fn save_catalogue<P: AsRef<Path>>(
    path: P,
    catalogue: &Catalogue,
    metadata: &FileMetadata,
    keep_backup: bool,
) -> Result<BackupOutcome, StoreError> {
    let path = path.as_ref();
    let bytes = render_catalogue(path, catalogue, metadata)?;
    let outcome = backup_and_swap(path, &bytes, keep_backup).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "saved {} ({} messages, {} bytes)",
        path.display(),
        catalogue.message_count(),
        bytes.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Message;
    use crate::encoding::Encoding;
    use std::fs;
    use tempfile::tempdir;

    const DOC: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n<!DOCTYPE TS>\r\n<TS version=\"2.1\" language=\"nl\">\r\n<context>\r\n    <name>AboutDialog</name>\r\n    <message>\r\n        <source>About yuzu</source>\r\n        <translation>Over yuzu</translation>\r\n    </message>\r\n</context>\r\n</TS>\r\n";

    #[test]
    fn load_and_save_preserve_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nl.ts");
        fs::write(&path, FileMetadata::encode(DOC, Encoding::Utf8Bom)).unwrap();

        let loaded = load_catalogue(&path).unwrap();
        assert_eq!(loaded.format, FileFormat::Ts);
        assert_eq!(loaded.metadata.encoding, Encoding::Utf8Bom);
        assert_eq!(loaded.metadata.newline, Newline::Crlf);

        let before = fs::read(&path).unwrap();
        save_catalogue(&path, &loaded.catalogue, &loaded.metadata, false).unwrap();
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn save_keeps_backup_of_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nl.ts");
        fs::write(&path, DOC).unwrap();

        let mut loaded = load_catalogue(&path).unwrap();
        loaded
            .catalogue
            .context_or_insert("AboutDialog")
            .push(Message::new("OK"));
        let outcome = save_catalogue(&path, &loaded.catalogue, &loaded.metadata, true).unwrap();

        assert_eq!(fs::read_to_string(outcome.backup_path.unwrap()).unwrap(), DOC);
        let reloaded = load_catalogue(&path).unwrap();
        assert_eq!(reloaded.catalogue.message_count(), 2);
    }

    #[test]
    fn converts_between_formats() {
        let dir = tempdir().unwrap();
        let ts = dir.path().join("nl.ts");
        fs::write(&ts, DOC).unwrap();
        let loaded = load_catalogue(&ts).unwrap();

        let json = dir.path().join("nl.json");
        save_catalogue(&json, &loaded.catalogue, &FileMetadata::default(), false).unwrap();
        let back = load_catalogue(&json).unwrap();
        assert_eq!(back.format, FileFormat::Json);
        assert_eq!(back.catalogue.contexts, loaded.catalogue.contexts);
        assert_eq!(back.catalogue.language.as_deref(), Some("nl"));
    }

    #[test]
    fn reports_unknown_extension_and_bad_content() {
        let dir = tempdir().unwrap();
        let qm = dir.path().join("nl.qm");
        fs::write(&qm, b"\x3c\xb8\x64\x18").unwrap();
        assert!(matches!(load_catalogue(&qm).unwrap_err(), StoreError::UnsupportedFormat(_)));

        let broken = dir.path().join("broken.ts");
        fs::write(&broken, &DOC[..120]).unwrap();
        let err = load_catalogue(&broken).unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
        assert!(err.to_string().contains("broken.ts"));

        let missing = dir.path().join("missing.ts");
        assert!(matches!(load_catalogue(&missing).unwrap_err(), StoreError::Read { .. }));
    }
}
