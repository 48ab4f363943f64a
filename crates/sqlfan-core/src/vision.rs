//! Vision-language model boundary

use async_trait::async_trait;

use crate::{Result, SqlfanError};

/// Raw image bytes tagged with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageInput {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build an input from a file name, accepting jpg, jpeg and png
    pub fn from_file_name(file_name: &str, data: Vec<u8>) -> Result<Self> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let mime_type = match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            _ => {
                return Err(SqlfanError::NotSupported(format!(
                    "unsupported image type for '{}' (expected jpg, jpeg or png)",
                    file_name
                )));
            }
        };
        Ok(Self::new(mime_type, data))
    }
}

/// A generative model that answers questions about an image
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Answer `question` about `image`, primed with `prompt`
    async fn ask(&self, prompt: &str, image: &ImageInput, question: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_from_extension() {
        let jpg = ImageInput::from_file_name("invoice.JPG", vec![0xFF, 0xD8]).unwrap();
        assert_eq!(jpg.mime_type, "image/jpeg");

        let png = ImageInput::from_file_name("scan.v2.png", vec![]).unwrap();
        assert_eq!(png.mime_type, "image/png");
    }

    #[test]
    fn test_rejects_other_extensions() {
        assert!(ImageInput::from_file_name("invoice.pdf", vec![]).is_err());
        assert!(ImageInput::from_file_name("invoice", vec![]).is_err());
    }
}
