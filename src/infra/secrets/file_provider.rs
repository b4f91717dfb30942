//! Filesystem-indirected secret provider.
//!
//! The configured environment value is a path; the secret is the text of
//! that file, decoded with the configured encoding.

use super::types::{SecretError, SecretProvider, SecretResolution, SecretSourceMode};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Text encodings accepted for secret files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    /// Parse an encoding label. Returns `None` for unsupported labels.
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "" | "utf-8" | "utf8" => Some(Self::Utf8),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Some(Self::Latin1),
            _ => None,
        }
    }

    pub fn decode(&self, bytes: Vec<u8>) -> Result<String, SecretError> {
        match self {
            Self::Utf8 => String::from_utf8(bytes)
                .map_err(|e| SecretError::Decode(format!("invalid UTF-8: {e}"))),
            Self::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(SecretError::Decode(format!(
                        "non-ASCII byte at offset {pos}"
                    )));
                }
                Ok(bytes.into_iter().map(char::from).collect())
            }
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::Utf8
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Utf8 => "UTF-8",
            Self::Ascii => "ASCII",
            Self::Latin1 => "ISO-8859-1",
        })
    }
}

/// Reads secrets from the files the configured values point at.
pub struct FileSecretProvider {
    encoding: TextEncoding,
}

impl FileSecretProvider {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    async fn read_secret(&self, name: &str, path: &Path) -> Result<String, SecretError> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(SecretError::Configuration(format!(
                "value for {name} is not a file"
            )));
        }

        debug!("Reading {name} from '{}' as {}", path.display(), self.encoding);
        let bytes = tokio::fs::read(path).await?;
        self.encoding.decode(bytes)
    }
}

#[async_trait]
impl SecretProvider for FileSecretProvider {
    fn mode(&self) -> SecretSourceMode {
        SecretSourceMode::FileIndirect
    }

    fn name(&self) -> &str {
        "fs"
    }

    async fn fetch(&self, name: &str, raw: &str) -> SecretResolution {
        self.read_secret(name, Path::new(raw)).await.into()
    }
}
