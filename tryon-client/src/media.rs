//! Reading user photos from disk.

use std::path::Path;

use image::ImageFormat;
use shared::DataUrl;
use tracing::debug;

use crate::error::CaptureError;

/// Mime type used when neither the content nor the extension is recognised.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Read a whole image file into a data URL. No size limit is applied.
pub async fn read_image_file(path: impl AsRef<Path>) -> Result<DataUrl, CaptureError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let mime_type = detect_mime_type(path, &bytes);

    debug!("Read {} ({} bytes, {})", path.display(), bytes.len(), mime_type);
    Ok(DataUrl::from_bytes(mime_type, &bytes))
}

/// Mime type from magic bytes, then the file extension.
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .or_else(|| path.extension().and_then(ImageFormat::from_extension))
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
}
