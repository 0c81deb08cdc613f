//! Try-on categories and the instruction templates sent to the model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user wants changed in their photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Makeup,
    Clothes,
    StyleAdvice,
    /// Anything else; gets the generic edit instructions.
    Other,
}

impl Category {
    /// Parse a wire tag. Unknown or missing tags map to [`Category::Other`].
    ///
    /// `style-advise` is the tag older web clients send.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("makeup") => Self::Makeup,
            Some("clothes") => Self::Clothes,
            Some("style-advice") | Some("style-advise") => Self::StyleAdvice,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Makeup => "makeup",
            Self::Clothes => "clothes",
            Self::StyleAdvice => "style-advice",
            Self::Other => "other",
        }
    }

    /// Instruction text for this category with the user's prompt filled in.
    pub fn instructions(&self, prompt: &str) -> String {
        let template = INSTRUCTION_TEMPLATES
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, template)| *template)
            .unwrap_or(generic_edit);

        template(prompt.trim())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Template = fn(&str) -> String;

/// Category specific templates. Categories without an entry use [`generic_edit`].
const INSTRUCTION_TEMPLATES: &[(Category, Template)] = &[
    (Category::Makeup, makeup),
    (Category::Clothes, clothes),
    (Category::StyleAdvice, style_advice),
];

fn makeup(prompt: &str) -> String {
    format!(
        "Apply makeup to the person in this image: {}. Keep the same pose, gender, clothes, and age. \
         Do not modify face shape, iris, or make them look older. Generate the edited image.",
        prompt
    )
}

fn clothes(prompt: &str) -> String {
    format!(
        "Dress the person in this image with: {}. Keep the same pose, gender, face, and age. \
         Generate the edited image.",
        prompt
    )
}

fn style_advice(prompt: &str) -> String {
    format!(
        "Style the person in this image according to: {}. Keep the same person and adjust their \
         overall appearance accordingly. Generate the edited image.",
        prompt
    )
}

fn generic_edit(prompt: &str) -> String {
    format!("Edit this image: {}. Generate the edited image.", prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Category::from_tag(Some("makeup")), Category::Makeup);
        assert_eq!(Category::from_tag(Some("Clothes")), Category::Clothes);
        assert_eq!(Category::from_tag(Some("style-advice")), Category::StyleAdvice);
        assert_eq!(Category::from_tag(Some("style-advise")), Category::StyleAdvice);
        assert_eq!(Category::from_tag(Some("hair")), Category::Other);
        assert_eq!(Category::from_tag(None), Category::Other);
    }

    #[test]
    fn test_each_category_selects_its_template() {
        let prompt = "red lipstick";
        assert!(Category::Makeup
            .instructions(prompt)
            .starts_with("Apply makeup to the person in this image: red lipstick."));
        assert!(Category::Clothes
            .instructions(prompt)
            .starts_with("Dress the person in this image with: red lipstick."));
        assert!(Category::StyleAdvice
            .instructions(prompt)
            .starts_with("Style the person in this image according to: red lipstick."));
        assert_eq!(
            Category::Other.instructions(prompt),
            "Edit this image: red lipstick. Generate the edited image."
        );
    }

    #[test]
    fn test_unknown_tag_uses_generic_template() {
        let category = Category::from_tag(Some("accessories"));
        assert_eq!(
            category.instructions("a straw hat"),
            "Edit this image: a straw hat. Generate the edited image."
        );
    }

    #[test]
    fn test_makeup_preserves_identity_constraints() {
        let text = Category::Makeup.instructions("smoky eyes");
        assert!(text.contains("Keep the same pose, gender, clothes, and age."));
        assert!(text.contains("Do not modify face shape"));
    }
}
