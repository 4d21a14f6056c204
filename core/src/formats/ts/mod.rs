/// Qt Linguist TS handler
///
/// Reading keeps enough layout information that an unedited catalogue is
/// written back byte-for-byte; edited text is escaped the way lupdate does.
mod reader;
mod writer;

use super::{ensure_consistent_shapes, FileFormat, FormatError, FormatHandler};
use crate::catalog::Catalogue;

pub struct TsHandler;

impl TsHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TsHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHandler for TsHandler {
    fn parse(&self, content: &str) -> Result<Catalogue, FormatError> {
        reader::read(content)
    }

    fn serialize(&self, catalogue: &Catalogue) -> Result<String, FormatError> {
        ensure_consistent_shapes(catalogue)?;
        let output = writer::write(catalogue);
        log::debug!(
            "wrote TS catalogue: {} messages, {} bytes",
            catalogue.message_count(),
            output.len()
        );
        Ok(output)
    }

    fn format(&self) -> FileFormat {
        FileFormat::Ts
    }
}

/// Parse TS text
pub fn parse(content: &str) -> Result<Catalogue, FormatError> {
    reader::read(content)
}

/// Serialize to TS text
pub fn to_string(catalogue: &Catalogue) -> String {
    writer::write(catalogue)
}
