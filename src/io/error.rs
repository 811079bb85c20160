use super::Format;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("missing atom information: {0}")]
    MissingAtomInformation(String),

    #[error("archive format error: {details} (at line ~{line})")]
    ArchiveFormat { line: usize, details: String },

    #[error("archive was written by an incompatible version: {0}")]
    ArchiveVersion(String),
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn archive(line: usize, details: impl Into<String>) -> Self {
        Self::ArchiveFormat {
            line,
            details: details.into(),
        }
    }
}
