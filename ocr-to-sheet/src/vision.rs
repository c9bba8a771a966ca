//! Cloud Vision text detection.
//!
//! The annotator is a scoped resource: a connector opens a client right
//! before extraction and the client is dropped as soon as extraction ends.

mod client;
pub mod types;

pub use client::VisionConnector;
pub use types::{BatchAnnotateImagesRequest, BatchAnnotateImagesResponse};

use crate::error::VisionError;

/// Batch image annotation
pub trait ImageAnnotator {
    async fn batch_annotate(
        &self,
        request: &BatchAnnotateImagesRequest,
    ) -> Result<BatchAnnotateImagesResponse, VisionError>;
}

/// Opens an [`ImageAnnotator`] for the duration of one extraction
pub trait AnnotatorConnector {
    type Annotator: ImageAnnotator;

    fn connect(&self) -> Result<Self::Annotator, VisionError>;
}
