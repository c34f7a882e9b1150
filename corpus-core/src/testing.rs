//! Shared test doubles, in the style of the teacher's `extraction::testing`
//! module (`MockAI`, `MockCrawler`, `TestScenario`): fixed, deterministic
//! implementations of the two boundary traits plus an in-memory storage
//! re-export, so unit and scenario tests across the crate don't each hand-roll
//! their own.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::dom::{DomReader, DomResponse, ExtractActOptions, IndexType};
use crate::error::ReadinessError;
use crate::host::{DocumentState, Host, PageSignal};

pub use crate::storage::memory::MemoryStorage as InMemoryStorage;

/// A `Host` that returns a fixed sequence of `PageSignal`s, one per call to
/// `page_signal`, holding on the last entry once the sequence is exhausted.
/// Lets a readiness test model "page takes N polls to become ready" (§8
/// scenario S2) without real timing.
pub struct MockHost {
    signals: Mutex<Vec<PageSignal>>,
    navigate_result: std::result::Result<(), &'static str>,
}

impl MockHost {
    /// Always reports `signal` from the first poll onward.
    pub fn always(signal: PageSignal) -> Self {
        Self {
            signals: Mutex::new(vec![signal]),
            navigate_result: Ok(()),
        }
    }

    /// Reports each signal in `sequence` in order, then repeats the last one.
    pub fn sequence(sequence: Vec<PageSignal>) -> Self {
        Self {
            signals: Mutex::new(sequence),
            navigate_result: Ok(()),
        }
    }

    /// A host whose `navigate` call always fails, modeling scenario S4
    /// (`chrome-error://` navigation).
    pub fn navigation_fails() -> Self {
        Self {
            signals: Mutex::new(vec![PageSignal {
                state: DocumentState::Loading,
                is_error_page: true,
                act_title_element_found: false,
                body_text: String::new(),
            }]),
            navigate_result: Err("navigation_error"),
        }
    }

    pub fn ready_with_body(body_text: impl Into<String>) -> Self {
        Self::always(PageSignal {
            state: DocumentState::Interactive,
            is_error_page: false,
            act_title_element_found: true,
            body_text: body_text.into(),
        })
    }
}

#[async_trait]
impl Host for MockHost {
    async fn navigate(&self, _url: &str) -> std::result::Result<(), ReadinessError> {
        self.navigate_result
            .map_err(|reason| ReadinessError::Host(reason.to_string()))
    }

    async fn page_signal(&self) -> std::result::Result<PageSignal, ReadinessError> {
        let mut signals = self.signals.lock().unwrap();
        if signals.len() > 1 {
            Ok(signals.remove(0))
        } else {
            Ok(signals
                .last()
                .cloned()
                .unwrap_or(PageSignal {
                    state: DocumentState::Loading,
                    is_error_page: false,
                    act_title_element_found: false,
                    body_text: String::new(),
                }))
        }
    }
}

/// A `DomReader` that returns one fixed `DomResponse` regardless of which
/// extraction method is called or what options it's given.
pub struct MockDomReader {
    pub response: DomResponse,
}

impl MockDomReader {
    pub fn new(response: DomResponse) -> Self {
        Self { response }
    }
}

#[async_trait]
impl DomReader for MockDomReader {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_host_sequence_advances_then_holds_last() {
        let host = MockHost::sequence(vec![
            PageSignal {
                state: DocumentState::Loading,
                is_error_page: false,
                act_title_element_found: false,
                body_text: String::new(),
            },
            PageSignal {
                state: DocumentState::Interactive,
                is_error_page: false,
                act_title_element_found: true,
                body_text: "An Act to provide for testing.".to_string(),
            },
        ]);

        let first = host.page_signal().await.unwrap();
        assert_eq!(first.state, DocumentState::Loading);
        let second = host.page_signal().await.unwrap();
        assert_eq!(second.state, DocumentState::Interactive);
        let third = host.page_signal().await.unwrap();
        assert_eq!(third.state, DocumentState::Interactive);
    }

    #[tokio::test]
    async fn mock_host_navigation_fails_reports_error_without_signalling_ready() {
        let host = MockHost::navigation_fails();
        assert!(host.navigate("chrome-error://failed").await.is_err());
    }

    #[tokio::test]
    async fn mock_dom_reader_returns_fixed_response_for_every_call() {
        let reader = MockDomReader::new(DomResponse {
            success: true,
            ..Default::default()
        });
        assert!(reader.extract_volume().await.success);
        assert!(reader.extract_act(ExtractActOptions::default()).await.success);
    }
}
