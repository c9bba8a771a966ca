//! Request and response bodies of the `images:annotate` endpoint.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Feature type requesting dense document OCR
pub const DOCUMENT_TEXT_DETECTION: &str = "DOCUMENT_TEXT_DETECTION";

#[derive(Debug, Clone, Serialize)]
pub struct BatchAnnotateImagesRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotateImageRequest {
    pub image: Image,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Image {
    /// Base64-encoded image bytes
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: String,
}

impl BatchAnnotateImagesRequest {
    /// A batch holding one image with full document text detection
    pub fn document_text(image: &[u8]) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: Image {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: vec![Feature {
                    feature_type: DOCUMENT_TEXT_DETECTION.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchAnnotateImagesResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub full_text_annotation: Option<TextAnnotation>,
    #[serde(default)]
    pub error: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub text: String,
}

/// Per-image error status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = BatchAnnotateImagesRequest::document_text(b"png");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "requests": [{
                    "image": { "content": "cG5n" },
                    "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
                }]
            })
        );
    }

    #[test]
    fn test_response_with_text() {
        let body = r#"{
            "responses": [{
                "textAnnotations": [{ "description": "Score: 42" }],
                "fullTextAnnotation": { "pages": [], "text": "Score: 42\n" }
            }]
        }"#;
        let response: BatchAnnotateImagesResponse = serde_json::from_str(body).unwrap();
        let first = &response.responses[0];
        assert!(first.error.is_none());
        assert_eq!(
            first.full_text_annotation.as_ref().unwrap().text,
            "Score: 42\n"
        );
    }

    #[test]
    fn test_response_with_error() {
        let body = r#"{
            "responses": [{
                "error": { "code": 3, "message": "Bad image data." }
            }]
        }"#;
        let response: BatchAnnotateImagesResponse = serde_json::from_str(body).unwrap();
        let error = response.responses[0].error.as_ref().unwrap();
        assert_eq!(error.code, 3);
        assert_eq!(error.message, "Bad image data.");
    }

    #[test]
    fn test_blank_image_response() {
        let response: BatchAnnotateImagesResponse =
            serde_json::from_str(r#"{"responses": [{}]}"#).unwrap();
        assert!(response.responses[0].full_text_annotation.is_none());
    }
}
