//! Text extraction from image bytes.

use tracing::{error, info};

use crate::error::VisionError;
use crate::vision::{BatchAnnotateImagesRequest, ImageAnnotator};

/// Outcome of a recognition attempt that reached the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Recognized document text
    Text(String),
    /// The image was processed but contained no text
    NoText,
    /// The service reported an error for this image
    Rejected { code: i32, message: String },
}

/// Run full document text detection on one image.
///
/// Takes ownership of the annotator so the client is released on every
/// return path. Only the first response of the batch is consulted; an empty
/// batch counts as no text.
pub async fn extract_text<A: ImageAnnotator>(
    annotator: A,
    image: &[u8],
) -> Result<Extraction, VisionError> {
    let request = BatchAnnotateImagesRequest::document_text(image);
    let response = annotator.batch_annotate(&request).await?;

    let Some(first) = response.responses.into_iter().next() else {
        info!("Vision returned no responses");
        return Ok(Extraction::NoText);
    };

    if let Some(status) = first.error {
        error!(code = status.code, "Error: {}", status.message);
        return Ok(Extraction::Rejected {
            code: status.code,
            message: status.message,
        });
    }

    match first.full_text_annotation {
        Some(annotation) if !annotation.text.is_empty() => {
            info!(chars = annotation.text.chars().count(), "Text extracted");
            Ok(Extraction::Text(annotation.text))
        }
        _ => Ok(Extraction::NoText),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::BatchAnnotateImagesResponse;
    use crate::vision::types::{AnnotateImageResponse, Status, TextAnnotation};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Annotator returning a canned response and recording its release
    struct FakeAnnotator {
        response: Result<BatchAnnotateImagesResponse, u16>,
        released: Rc<Cell<bool>>,
    }

    impl FakeAnnotator {
        fn new(responses: Vec<AnnotateImageResponse>) -> (Self, Rc<Cell<bool>>) {
            let released = Rc::new(Cell::new(false));
            let annotator = Self {
                response: Ok(BatchAnnotateImagesResponse { responses }),
                released: released.clone(),
            };
            (annotator, released)
        }
    }

    impl ImageAnnotator for FakeAnnotator {
        async fn batch_annotate(
            &self,
            request: &BatchAnnotateImagesRequest,
        ) -> Result<BatchAnnotateImagesResponse, VisionError> {
            assert_eq!(request.requests.len(), 1);
            assert_eq!(
                request.requests[0].features[0].feature_type,
                "DOCUMENT_TEXT_DETECTION"
            );
            match &self.response {
                Ok(response) => Ok(response.clone()),
                Err(status) => Err(VisionError::Api {
                    status: *status,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    impl Drop for FakeAnnotator {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    fn text_response(text: &str) -> AnnotateImageResponse {
        AnnotateImageResponse {
            full_text_annotation: Some(TextAnnotation {
                text: text.to_string(),
            }),
            error: None,
        }
    }

    fn error_response(message: &str) -> AnnotateImageResponse {
        AnnotateImageResponse {
            full_text_annotation: None,
            error: Some(Status {
                code: 3,
                message: message.to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_extracts_text() {
        let (annotator, released) = FakeAnnotator::new(vec![text_response("Score: 42")]);
        let extraction = extract_text(annotator, b"image").await.unwrap();

        assert_eq!(extraction, Extraction::Text("Score: 42".to_string()));
        assert!(released.get());
    }

    #[tokio::test]
    async fn test_per_image_error_is_soft() {
        let (annotator, released) = FakeAnnotator::new(vec![error_response("Bad image data.")]);
        let extraction = extract_text(annotator, b"image").await.unwrap();

        assert_eq!(
            extraction,
            Extraction::Rejected {
                code: 3,
                message: "Bad image data.".to_string()
            }
        );
        assert!(released.get());
    }

    #[tokio::test]
    async fn test_missing_annotation_is_no_text() {
        let (annotator, _) = FakeAnnotator::new(vec![AnnotateImageResponse::default()]);
        let extraction = extract_text(annotator, b"image").await.unwrap();
        assert_eq!(extraction, Extraction::NoText);
    }

    #[tokio::test]
    async fn test_empty_batch_is_no_text() {
        let (annotator, released) = FakeAnnotator::new(vec![]);
        let extraction = extract_text(annotator, b"image").await.unwrap();

        assert_eq!(extraction, Extraction::NoText);
        assert!(released.get());
    }

    #[tokio::test]
    async fn test_only_first_response_is_used() {
        let (annotator, _) = FakeAnnotator::new(vec![
            AnnotateImageResponse::default(),
            text_response("ignored"),
        ]);
        let extraction = extract_text(annotator, b"image").await.unwrap();
        assert_eq!(extraction, Extraction::NoText);
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal_and_releases_client() {
        let released = Rc::new(Cell::new(false));
        let annotator = FakeAnnotator {
            response: Err(503),
            released: released.clone(),
        };

        let result = extract_text(annotator, b"image").await;
        assert!(matches!(result, Err(VisionError::Api { status: 503, .. })));
        assert!(released.get());
    }
}
