//! Key and certificate files for the security engine.
//!
//! The engine only reads key material from the filesystem. Inline PEM content
//! is written to a temporary file that lives as long as the returned
//! [`KeyFile`].

use std::io::Write as _;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::NamedTempFile;

use crate::error::{SamlError, SamlResult};

/// PEM label of X.509 certificates.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Where key material comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// A file on disk.
    Path(PathBuf),
    /// Inline PEM content.
    Pem(String),
}

impl KeySource {
    /// Picks the configured path, falling back to inline content.
    #[must_use]
    pub fn from_parts(path: Option<&Path>, pem: Option<&str>) -> Option<Self> {
        match (path, pem) {
            (Some(path), _) => Some(Self::Path(path.to_path_buf())),
            (None, Some(pem)) if !pem.trim().is_empty() => Some(Self::Pem(pem.to_string())),
            _ => None,
        }
    }

    /// Returns a file the engine can read.
    pub fn materialize(&self, temp_dir: Option<&Path>) -> SamlResult<KeyFile> {
        match self {
            Self::Path(path) => Ok(KeyFile::existing(path.clone())),
            Self::Pem(pem) => KeyFile::temporary(pem.as_bytes(), temp_dir),
        }
    }
}

/// A readable key or certificate file.
///
/// Temporary files are removed when the handle drops.
#[derive(Debug)]
pub struct KeyFile {
    path: PathBuf,
    temp: Option<NamedTempFile>,
}

impl KeyFile {
    /// Wraps an existing file.
    #[must_use]
    pub fn existing(path: PathBuf) -> Self {
        Self { path, temp: None }
    }

    /// Writes `contents` to a new temporary file.
    pub fn temporary(contents: &[u8], temp_dir: Option<&Path>) -> SamlResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("idp-key").suffix(".pem");
        let mut file = match temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(contents)?;
        file.flush()?;
        Ok(Self {
            path: file.path().to_path_buf(),
            temp: Some(file),
        })
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether the file is removed on drop.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Reads the file and decodes its first certificate block.
    pub async fn read_certificate(&self) -> SamlResult<Vec<u8>> {
        let pem = tokio::fs::read_to_string(&self.path).await?;
        pem_to_der(&pem, CERTIFICATE_LABEL)
            .ok_or_else(|| SamlError::MissingCertificate(format!("failed to decode certificate in {}", self.path.display())))
    }
}

/// Decodes the first PEM block with the given label.
#[must_use]
pub fn pem_to_der(pem: &str, label: &str) -> Option<Vec<u8>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");
    let start = pem.find(&begin)? + begin.len();
    let stop = start + pem[start..].find(&end)?;
    let body: String = pem[start..stop].chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(body).ok()
}

/// Encodes DER bytes as a PEM block with 64-column lines.
#[must_use]
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = format!("-----BEGIN {label}-----\n");
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % 64 == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    pem.push_str(&format!("\n-----END {label}-----\n"));
    pem
}

/// Decodes a base64 certificate as found in metadata, ignoring whitespace.
pub fn decode_certificate(base64: &str) -> SamlResult<Vec<u8>> {
    let compact: String = base64.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}
