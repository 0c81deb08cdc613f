//! What the result panel shows, driven only by generation outcomes.

use std::path::{Path, PathBuf};

use shared::{DataUrl, GenerationOutcome, TEXT_ONLY_PLACEHOLDER_URL};
use tracing::info;

use crate::error::ClientError;

pub const DEFAULT_DOWNLOAD_NAME: &str = "tryon-result.png";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultView {
    #[default]
    Empty,
    Generating,
    Image {
        url: String,
        download_enabled: bool,
    },
    /// The model answered in words; its message is surfaced next to a placeholder.
    TextOnly {
        placeholder: String,
        message: String,
    },
    Error {
        toast: String,
    },
}

impl ResultView {
    pub fn begin(&mut self) {
        *self = Self::Generating;
    }

    pub fn show(&mut self, outcome: &GenerationOutcome) {
        *self = match outcome {
            GenerationOutcome::Image { url } => Self::Image {
                url: url.clone(),
                download_enabled: true,
            },
            GenerationOutcome::TextOnly { message } => Self::TextOnly {
                placeholder: TEXT_ONLY_PLACEHOLDER_URL.to_string(),
                message: message.clone(),
            },
            GenerationOutcome::Failure(failure) => Self::Error {
                toast: failure.to_string(),
            },
        };
    }

    pub fn reset(&mut self) {
        *self = Self::Empty;
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, Self::Generating)
    }

    /// Save the shown image. A directory target gets [`DEFAULT_DOWNLOAD_NAME`].
    pub async fn download(&self, target: impl AsRef<Path>) -> Result<PathBuf, ClientError> {
        let Self::Image {
            url,
            download_enabled: true,
        } = self
        else {
            return Err(ClientError::NothingToDownload);
        };

        let mut path = target.as_ref().to_path_buf();
        if tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false) {
            path.push(DEFAULT_DOWNLOAD_NAME);
        }

        let bytes = if url.starts_with("data:") {
            DataUrl::normalize(url)?.decode()?
        } else {
            reqwest::get(url.as_str()).await?.error_for_status()?.bytes().await?.to_vec()
        };

        tokio::fs::write(&path, &bytes).await?;
        info!("Saved result to {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::GenerationFailure;

    #[test]
    fn test_outcomes_drive_the_view() {
        let mut view = ResultView::default();
        view.begin();
        assert!(view.is_generating());

        view.show(&GenerationOutcome::Image {
            url: "data:image/png;base64,AAA".to_string(),
        });
        assert!(matches!(view, ResultView::Image { download_enabled: true, .. }));

        view.show(&GenerationOutcome::TextOnly {
            message: "Too dark".to_string(),
        });
        assert_eq!(
            view,
            ResultView::TextOnly {
                placeholder: TEXT_ONLY_PLACEHOLDER_URL.to_string(),
                message: "Too dark".to_string(),
            }
        );

        view.show(&GenerationOutcome::Failure(GenerationFailure::RateLimited));
        assert_eq!(
            view,
            ResultView::Error {
                toast: "Rate limit exceeded. Please try again later.".to_string()
            }
        );

        view.reset();
        assert_eq!(view, ResultView::Empty);
    }

    #[tokio::test]
    async fn test_download_into_directory_uses_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = ResultView::default();
        view.show(&GenerationOutcome::Image {
            url: DataUrl::from_bytes("image/png", b"pixels").to_string(),
        });

        let saved = view.download(dir.path()).await.unwrap();
        assert_eq!(saved, dir.path().join(DEFAULT_DOWNLOAD_NAME));
        assert_eq!(std::fs::read(saved).unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn test_download_requires_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let view = ResultView::TextOnly {
            placeholder: TEXT_ONLY_PLACEHOLDER_URL.to_string(),
            message: "no".to_string(),
        };
        assert!(matches!(
            view.download(dir.path()).await,
            Err(ClientError::NothingToDownload)
        ));
    }
}
