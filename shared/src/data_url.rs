//! Inline image payloads in `data:<mime>;base64,<data>` form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

use crate::{Error, Result};

/// Mime type assumed for payloads that arrive as bare base64.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// A base64 image payload together with its mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: String,
    data: String,
}

impl DataUrl {
    /// Build from an already base64-encoded payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Normalize either a full data URL or a bare base64 string.
    ///
    /// Both `data:image/png;base64,AAAA` and `AAAA` (taken as
    /// [`DEFAULT_MIME_TYPE`]) are accepted; the result renders identically
    /// for the same bytes and mime type.
    pub fn normalize(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::Validation("Image payload is empty".to_string()));
        }

        let Some(rest) = input.strip_prefix("data:") else {
            return Ok(Self::new(DEFAULT_MIME_TYPE, input));
        };

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::Validation("Malformed data URL: missing ','".to_string()))?;

        let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
            Error::Validation("Malformed data URL: only base64 payloads are supported".to_string())
        })?;

        if data.trim().is_empty() {
            return Err(Error::Validation("Image payload is empty".to_string()));
        }

        let mime_type = if mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            mime_type
        };

        Ok(Self::new(mime_type, data.trim()))
    }

    /// True when there is no payload to send.
    pub fn is_empty(&self) -> bool {
        self.data.trim().is_empty()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The payload without any `data:` prefix.
    pub fn base64(&self) -> &str {
        &self.data
    }

    /// Decode the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| Error::Validation(format!("Invalid base64 payload: {}", e)))
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}
