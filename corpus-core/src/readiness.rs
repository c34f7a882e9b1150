//! Readiness Gate (C5, §4.5): waits for the active page to become
//! extractable and classifies non-readiness precisely, since that
//! classification is the key input to failure classification (§4.7).

use tokio_util::sync::CancellationToken;

use crate::error::ReadinessError;
use crate::host::{DocumentState, Host, PageSignal};
use crate::types::FailureReason;

const POLL_INTERVAL_MS: u64 = 500;

/// Legal-content signal patterns (§4.5 step 3 / GLOSSARY "Legal-content
/// signal"). Matched case-sensitively against the visible body text the
/// host reports — these are plain substring checks, not a DOM parse, since
/// the readiness gate itself must not perform script injection.
const ENACTMENT_CLAUSE_MARKERS: &[&str] = &[
    "An Act to",
    "WHEREAS it is expedient",
    "Be it enacted",
    "যেহেতু",
    "এতদ্দ্বারা",
];

const LEGAL_MARKERS: &[&str] = &["Section", "Chapter", "Schedule", "ধারা", "অধ্যায়", "তফসিল"];

fn has_numbered_section_pattern(body_text: &str) -> bool {
    body_text.lines().any(|line| {
        let line = line.trim_start();
        let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
        !digits.is_empty() && line[digits.len()..].starts_with('.')
    })
}

fn has_legal_content_signal(signal: &PageSignal, minimum_content_threshold: usize) -> bool {
    if signal.act_title_element_found {
        return true;
    }
    if ENACTMENT_CLAUSE_MARKERS
        .iter()
        .any(|m| signal.body_text.contains(m))
    {
        return true;
    }
    if has_numbered_section_pattern(&signal.body_text) {
        return true;
    }
    if signal.body_text.len() >= minimum_content_threshold
        && LEGAL_MARKERS.iter().any(|m| signal.body_text.contains(m))
    {
        return true;
    }
    false
}

/// Poll `host` until the page is extractable or `dom_readiness_timeout_ms`
/// elapses. Returns `Ok(())` when ready, or `Err(reason)` classifying why
/// not — one of `dom_not_ready`, `content_selector_mismatch`, or
/// `network_error` (§4.5 step 4).
pub async fn wait_for_readiness(
    host: &dyn Host,
    dom_readiness_timeout_ms: u64,
    minimum_content_threshold: usize,
    cancellation: &CancellationToken,
) -> Result<(), FailureReason> {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_millis(dom_readiness_timeout_ms);
    let mut reached_ready_state = false;

    loop {
        if cancellation.is_cancelled() {
            return Err(FailureReason::DomNotReady);
        }

        let signal = host.page_signal().await;
        match signal {
            Ok(signal) => {
                if signal.is_error_page {
                    return Err(FailureReason::NetworkError);
                }

                let state_ready = matches!(
                    signal.state,
                    DocumentState::Interactive | DocumentState::Complete
                );

                if state_ready {
                    reached_ready_state = true;
                    if has_legal_content_signal(&signal, minimum_content_threshold) {
                        return Ok(());
                    }
                }
            }
            Err(ReadinessError::Host(_)) => return Err(FailureReason::NetworkError),
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(if reached_ready_state {
                FailureReason::ContentSelectorMismatch
            } else {
                FailureReason::DomNotReady
            });
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let sleep_for = remaining.min(tokio::time::Duration::from_millis(POLL_INTERVAL_MS));
        tokio::time::sleep(sleep_for).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedHost {
        responses: Mutex<Vec<PageSignal>>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Host for ScriptedHost {
        async fn navigate(&self, _url: &str) -> Result<(), ReadinessError> {
            Ok(())
        }

        async fn page_signal(&self) -> Result<PageSignal, ReadinessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                Ok(responses.remove(0))
            } else {
                Ok(responses[0].clone())
            }
        }
    }

    fn signal(state: DocumentState, body_text: &str) -> PageSignal {
        PageSignal {
            state,
            is_error_page: false,
            act_title_element_found: false,
            body_text: body_text.to_string(),
        }
    }

    #[tokio::test]
    async fn s2_interactive_with_enactment_clause_is_ready_immediately() {
        let host = ScriptedHost {
            responses: Mutex::new(vec![signal(
                DocumentState::Interactive,
                "WHEREAS it is expedient to provide for...",
            )]),
            calls: AtomicUsize::new(0),
        };
        let cancel = CancellationToken::new();
        let result = wait_for_readiness(&host, 5_000, 100, &cancel).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn s3_complete_with_only_navigation_menu_is_content_selector_mismatch() {
        let host = ScriptedHost {
            responses: Mutex::new(vec![signal(DocumentState::Complete, "Home | Contact | About")]),
            calls: AtomicUsize::new(0),
        };
        let cancel = CancellationToken::new();
        let result = wait_for_readiness(&host, 600, 100, &cancel).await;
        assert_eq!(result, Err(FailureReason::ContentSelectorMismatch));
    }

    #[tokio::test]
    async fn never_reaching_interactive_is_dom_not_ready() {
        let host = ScriptedHost {
            responses: Mutex::new(vec![signal(DocumentState::Loading, "")]),
            calls: AtomicUsize::new(0),
        };
        let cancel = CancellationToken::new();
        let result = wait_for_readiness(&host, 600, 100, &cancel).await;
        assert_eq!(result, Err(FailureReason::DomNotReady));
    }

    #[tokio::test]
    async fn s4_error_page_is_network_error_without_waiting_out_the_timeout() {
        let mut error_signal = signal(DocumentState::Loading, "");
        error_signal.is_error_page = true;
        let host = ScriptedHost {
            responses: Mutex::new(vec![error_signal]),
            calls: AtomicUsize::new(0),
        };
        let cancel = CancellationToken::new();
        let result = wait_for_readiness(&host, 30_000, 100, &cancel).await;
        assert_eq!(result, Err(FailureReason::NetworkError));
    }

    #[tokio::test]
    async fn cancellation_is_observed_before_polling() {
        let host = ScriptedHost {
            responses: Mutex::new(vec![signal(DocumentState::Loading, "")]),
            calls: AtomicUsize::new(0),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = wait_for_readiness(&host, 30_000, 100, &cancel).await;
        assert_eq!(result, Err(FailureReason::DomNotReady));
        assert_eq!(host.calls.load(Ordering::SeqCst), 0);
    }
}
