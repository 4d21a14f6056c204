/// Encoding and newline preservation for catalogue files
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Newline {
    #[default]
    Lf,
    Crlf,
}

impl Newline {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    /// First line break decides; LF when there is none
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(idx) if idx > 0 && text.as_bytes()[idx - 1] == b'\r' => Self::Crlf,
            _ => Self::Lf,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub encoding: Encoding,
    pub newline: Newline,
    pub has_bom: bool,
}

impl Default for FileMetadata {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            newline: Newline::Lf,
            has_bom: false,
        }
    }
}

impl FileMetadata {
    /// Detect encoding and newline from file content
    pub fn detect(content: &[u8]) -> Self {
        let (encoding, has_bom) = Self::detect_encoding(content);
        let newline = Self::detect_newline(content, encoding);

        Self {
            encoding,
            newline,
            has_bom,
        }
    }

    fn detect_encoding(content: &[u8]) -> (Encoding, bool) {
        if content.starts_with(&[0xEF, 0xBB, 0xBF]) {
            return (Encoding::Utf8Bom, true);
        }

        if content.starts_with(&[0xFF, 0xFE]) {
            return (Encoding::Utf16Le, true);
        }

        if content.starts_with(&[0xFE, 0xFF]) {
            return (Encoding::Utf16Be, true);
        }

        (Encoding::Utf8, false)
    }

    fn detect_newline(content: &[u8], encoding: Encoding) -> Newline {
        let crlf: &[u8] = match encoding {
            Encoding::Utf8 | Encoding::Utf8Bom => b"\r\n",
            Encoding::Utf16Le => &[b'\r', 0, b'\n', 0],
            Encoding::Utf16Be => &[0, b'\r', 0, b'\n'],
        };
        let lf: &[u8] = match encoding {
            Encoding::Utf8 | Encoding::Utf8Bom => b"\n",
            Encoding::Utf16Le => &[b'\n', 0],
            Encoding::Utf16Be => &[0, b'\n'],
        };

        let first_lf = content.windows(lf.len()).position(|w| w == lf);
        let first_crlf = content.windows(crlf.len()).position(|w| w == crlf);
        match (first_crlf, first_lf) {
            (Some(crlf_at), Some(lf_at)) if crlf_at + crlf.len() - lf.len() == lf_at => {
                Newline::Crlf
            }
            _ => Newline::Lf,
        }
    }

    /// Read file with encoding detection
    pub fn read_file(path: &Path) -> Result<(String, FileMetadata), io::Error> {
        let mut file = std::fs::File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let metadata = Self::detect(&bytes);
        let text = Self::decode(&bytes, metadata.encoding)?;

        Ok((text, metadata))
    }

    pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<String, io::Error> {
        let bom: &[u8] = match encoding {
            Encoding::Utf8 => &[],
            Encoding::Utf8Bom => &[0xEF, 0xBB, 0xBF],
            Encoding::Utf16Le => &[0xFF, 0xFE],
            Encoding::Utf16Be => &[0xFE, 0xFF],
        };
        let content = bytes.strip_prefix(bom).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("content does not start with the {encoding:?} byte order mark"),
            )
        })?;

        match encoding {
            Encoding::Utf8 | Encoding::Utf8Bom => String::from_utf8(content.to_vec())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Encoding::Utf16Le | Encoding::Utf16Be => {
                if content.len() % 2 != 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "odd number of bytes in UTF-16 content",
                    ));
                }
                let units: Vec<u16> = content
                    .chunks_exact(2)
                    .map(|chunk| match encoding {
                        Encoding::Utf16Le => u16::from_le_bytes([chunk[0], chunk[1]]),
                        _ => u16::from_be_bytes([chunk[0], chunk[1]]),
                    })
                    .collect();
                String::from_utf16(&units).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }
        }
    }

    pub fn encode(text: &str, encoding: Encoding) -> Vec<u8> {
        match encoding {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Utf8Bom => {
                let mut bytes = vec![0xEF, 0xBB, 0xBF];
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
            Encoding::Utf16Le => {
                let mut bytes = vec![0xFF, 0xFE];
                for unit in text.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_le_bytes());
                }
                bytes
            }
            Encoding::Utf16Be => {
                let mut bytes = vec![0xFE, 0xFF];
                for unit in text.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_be_bytes());
                }
                bytes
            }
        }
    }
}
