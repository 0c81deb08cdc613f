//! Validated generation requests.

use crate::category::Category;
use crate::data_url::DataUrl;
use crate::models::GenerateTryOnRequest;
use crate::{Error, Result};

/// A single try-on submission.
///
/// Only constructible with an image and a non-blank prompt; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    image: DataUrl,
    prompt: String,
    category: Category,
}

impl GenerationRequest {
    pub fn new(image: DataUrl, prompt: impl Into<String>, category: Category) -> Result<Self> {
        if image.is_empty() {
            return Err(Error::Validation("Image is required".to_string()));
        }

        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(Error::Validation("Prompt is required".to_string()));
        }

        Ok(Self {
            image,
            prompt,
            category,
        })
    }

    /// Validate a wire payload.
    pub fn from_wire(payload: &GenerateTryOnRequest) -> Result<Self> {
        let image = payload.image_base64.as_deref().unwrap_or_default();
        let prompt = payload.prompt.as_deref().unwrap_or_default();

        if image.trim().is_empty() || prompt.trim().is_empty() {
            return Err(Error::Validation(
                "Missing required fields: imageBase64 and prompt are required".to_string(),
            ));
        }

        Self::new(
            DataUrl::normalize(image)?,
            prompt,
            Category::from_tag(payload.category.as_deref()),
        )
    }

    pub fn image(&self) -> &DataUrl {
        &self.image
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Instruction text for the model.
    pub fn instructions(&self) -> String {
        self.category.instructions(&self.prompt)
    }

    /// Wire payload for sending this request to a relay.
    pub fn to_wire(&self) -> GenerateTryOnRequest {
        GenerateTryOnRequest {
            image_base64: Some(self.image.to_string()),
            prompt: Some(self.prompt.clone()),
            category: Some(self.category.as_str().to_string()),
        }
    }
}
