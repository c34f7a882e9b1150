//! Fixture-backed implementations of the two boundary traits `corpus-core`
//! is driven through, reading a saved JSON response from disk instead of a
//! live browser — the dev/verification harness this binary exists for
//! (`corpus-core` itself never touches the network or the DOM).

use std::path::Path;

use async_trait::async_trait;
use corpus_core::dom::{DomReader, DomResponse, ExtractActOptions, IndexType};
use corpus_core::error::ReadinessError;
use corpus_core::host::{DocumentState, Host, PageSignal};

/// A `DomReader` that always answers with the one `DomResponse` loaded from
/// a fixture file, regardless of which of the three request messages is
/// sent — adequate for exercising one page at a time, not for crawling.
pub struct FixtureDomReader {
    response: DomResponse,
}

impl FixtureDomReader {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let response: DomResponse = serde_json::from_str(&raw)?;
        Ok(Self { response })
    }

    /// The fixture's visible body text, used to seed `FixtureHost` so the
    /// readiness gate sees the same content the extractor will later read.
    pub fn current_body_text(&self) -> String {
        self.response.content.clone().unwrap_or_default()
    }
}

#[async_trait]
impl DomReader for FixtureDomReader {
    async fn extract_volume(&self) -> DomResponse {
        self.response.clone()
    }

    async fn extract_index(&self, _index_type: IndexType) -> DomResponse {
        self.response.clone()
    }

    async fn extract_act(&self, _options: ExtractActOptions) -> DomResponse {
        self.response.clone()
    }
}

/// A `Host` that never actually navigates (navigation stays user-triggered
/// through a real browser per the Non-goals) but reports the fixture's
/// content as already interactive, so the readiness gate and queue
/// processor can run end to end against a saved page.
pub struct FixtureHost {
    body_text: String,
}

impl FixtureHost {
    pub fn new(body_text: impl Into<String>) -> Self {
        Self {
            body_text: body_text.into(),
        }
    }
}

#[async_trait]
impl Host for FixtureHost {
    async fn navigate(&self, _url: &str) -> Result<(), ReadinessError> {
        Ok(())
    }

    async fn page_signal(&self) -> Result<PageSignal, ReadinessError> {
        Ok(PageSignal {
            state: DocumentState::Complete,
            is_error_page: false,
            act_title_element_found: !self.body_text.is_empty(),
            body_text: self.body_text.clone(),
        })
    }
}
