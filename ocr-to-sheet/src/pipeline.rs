//! Fetch → extract → publish orchestration.

use std::fmt;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::PipelineResult;
use crate::extractor::{Extraction, extract_text};
use crate::sheets::{SpreadsheetRecord, SpreadsheetService, publish};
use crate::source::ImageReference;
use crate::storage::{ObjectStore, fetch_image};
use crate::vision::AnnotatorConnector;

/// Run progress. A failed run stays in the state it failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, not yet run
    Idle,
    Fetching,
    Extracting,
    Publishing,
    DoneEmpty,
    Done,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was published. `rejection` holds the service's per-image error, if any.
    NoText { rejection: Option<String> },
    Published(SpreadsheetRecord),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NoText { .. } => write!(f, "No Text Detected."),
            Outcome::Published(record) => {
                write!(f, "Extracted text is stored in the Google Sheet: {}", record.url)
            }
        }
    }
}

/// Single-image pipeline over the three collaborators
pub struct Pipeline<S, C, P> {
    config: AppConfig,
    store: S,
    connector: C,
    sheets: P,
    state: PipelineState,
}

impl<S, C, P> Pipeline<S, C, P>
where
    S: ObjectStore,
    C: AnnotatorConnector,
    P: SpreadsheetService,
{
    pub fn new(config: AppConfig, store: S, connector: C, sheets: P) -> Self {
        Self {
            config,
            store,
            connector,
            sheets,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub async fn run(&mut self, image: &ImageReference) -> PipelineResult<Outcome> {
        self.transition(PipelineState::Fetching);
        let bytes = fetch_image(&self.store, image).await?;

        self.transition(PipelineState::Extracting);
        let annotator = self.connector.connect()?;
        let extraction = extract_text(annotator, &bytes).await?;
        drop(bytes);

        let text = match extraction {
            Extraction::Text(text) => text,
            Extraction::NoText => {
                self.transition(PipelineState::DoneEmpty);
                return Ok(Outcome::NoText { rejection: None });
            }
            Extraction::Rejected { code, message } => {
                warn!(key = image.key(), code, "Recognition failed, nothing to publish");
                self.transition(PipelineState::DoneEmpty);
                return Ok(Outcome::NoText {
                    rejection: Some(message),
                });
            }
        };

        self.transition(PipelineState::Publishing);
        let record = publish(&self.sheets, &self.config.sheets, &image.title(), &text).await?;

        self.transition(PipelineState::Done);
        Ok(Outcome::Published(record))
    }

    fn transition(&mut self, next: PipelineState) {
        info!(from = ?self.state, to = ?next, "Pipeline state");
        self.state = next;
    }
}
