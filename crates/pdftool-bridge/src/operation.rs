//! Operations understood by the processing tool

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::BridgeError;

/// Longest operation token accepted for pass-through.
const MAX_TOKEN_LEN: usize = 32;

/// Capability selected by the `function` form field.
///
/// `Other` carries a token the tool may know about but this crate does not;
/// it follows the PDF artifact convention like `Blend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Ocr,
    Blend,
    Convert,
    Other(String),
}

/// Kind of file the tool writes for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Text,
    Pdf,
}

impl ArtifactKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Text => "txt",
            ArtifactKind::Pdf => "pdf",
        }
    }
}

impl Operation {
    /// Operations the bundled tool is known to implement
    pub const KNOWN: [Operation; 3] = [Operation::Ocr, Operation::Blend, Operation::Convert];

    /// Token passed after `-f` and used as the output file name prefix
    pub fn as_str(&self) -> &str {
        match self {
            Operation::Ocr => "ocr",
            Operation::Blend => "blend",
            Operation::Convert => "convert",
            Operation::Other(token) => token,
        }
    }

    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            Operation::Ocr => ArtifactKind::Text,
            _ => ArtifactKind::Pdf,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::Ocr => "Extract text from scanned PDF/JPG/PNG into a .txt file",
            Operation::Blend => "Merge several PDFs into one document",
            Operation::Convert => "Convert JPG/PNG images into a PDF",
            Operation::Other(_) => "Passed through to the tool unchanged",
        }
    }
}

impl FromStr for Operation {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ocr" => Ok(Operation::Ocr),
            "blend" => Ok(Operation::Blend),
            "convert" => Ok(Operation::Convert),
            other if is_safe_token(other) => Ok(Operation::Other(other.to_string())),
            other => Err(BridgeError::InvalidOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The token ends up in a file name and in argv, so it must not look like a
// path or a flag.
fn is_safe_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && !token.starts_with('-')
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
