//! Host navigation and page-state signalling boundary (§4.5, §4.6, §5).
//!
//! The host browser's HTTP navigation is out of scope for this crate — the
//! Queue Processor only ever asks a `Host` implementation to navigate and to
//! report page state. Script injection (used to read DOM content) is a
//! separate concern gated behind the Readiness Gate: §4.6 step 2 requires
//! error pages to be detected *before* any injection is attempted.

use async_trait::async_trait;

use crate::error::ReadinessError;

/// Document readiness as reported by the host, mirroring the standard
/// `document.readyState` values relevant to §4.5. `Complete` is accepted but
/// never required — source pages often never complete due to hanging
/// resources (§4.5 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Loading,
    Interactive,
    Complete,
}

/// A snapshot of page state used by the Readiness Gate to decide whether an
/// extraction can proceed, without itself performing script injection.
#[derive(Debug, Clone)]
pub struct PageSignal {
    pub state: DocumentState,
    /// True if the host's tab URL or response indicates an error page
    /// (e.g. `chrome-error://…`, unreachable host) — checked before any
    /// script injection is attempted (§4.6 step 2).
    pub is_error_page: bool,
    /// True if a legal-content structural marker (act-title element) was
    /// found by the host's lightweight, injection-free page inspection.
    pub act_title_element_found: bool,
    /// Visible body text, used by the Readiness Gate to test the enactment
    /// clause, numbered-section, and marker-threshold signals (§4.5 step 3).
    pub body_text: String,
}

/// Boundary to the host browser's navigation and page-state reporting.
/// The Queue Processor depends only on this trait, never on a concrete
/// browser integration.
#[async_trait]
pub trait Host: Send + Sync {
    /// Navigate to `url` and wait for the host's page-load event, bounded by
    /// a 30 s hard timeout that resolves the wait even if the event never
    /// fires (§5 Timeouts).
    async fn navigate(&self, url: &str) -> Result<(), ReadinessError>;

    /// Poll current page state without script injection.
    async fn page_signal(&self) -> Result<PageSignal, ReadinessError>;
}
