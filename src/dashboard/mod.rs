//! Dashboard state and the search flow that drives it.
//!
//! ## Screens
//!
//! The visible screen is derived from state, never stored:
//!   - `Welcome`   no result yet and nothing in flight
//!   - `Loading`   a request is in flight (a previous result stays visible)
//!   - `Populated` a result is present
//!
//! There is no error screen. A failed search logs a warning and leaves the
//! previous result (or the welcome screen) in place.
//!
//! Searches are not cancelled or de-duplicated. Two overlapping searches both
//! write their outcome when they resolve, so the last one to finish wins, and
//! the first one to finish clears the loading flag.

use crate::client::{AnalysisApi, ApiError};
use crate::models::{AnalysisRequest, AnalysisResult, AssetSnapshot};
use crate::utils::Timer;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    query: String,
    loading: bool,
    result: Option<AnalysisResult>,
    selected_asset: Option<AssetSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Loading,
    Populated,
}

impl DashboardState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn selected_asset(&self) -> Option<&AssetSnapshot> {
        self.selected_asset.as_ref()
    }

    pub fn screen(&self) -> Screen {
        if self.is_loading() {
            Screen::Loading
        } else if self.result.is_some() {
            Screen::Populated
        } else {
            Screen::Welcome
        }
    }

    /// Record the query text and, when it is usable, enter the loading state.
    fn begin(&mut self, raw: &str) -> Option<AnalysisRequest> {
        self.query = raw.to_string();
        let request = AnalysisRequest::parse(raw)?;
        self.loading = true;
        Some(request)
    }

    /// Replace the previous result wholesale; nothing is merged.
    fn apply(&mut self, result: AnalysisResult) {
        self.selected_asset = Some(result.basic_data.clone());
        self.result = Some(result);
    }
}

#[cfg(test)]
impl DashboardState {
    pub(crate) fn populated(query: &str, result: AnalysisResult) -> Self {
        let mut state = Self {
            query: query.to_string(),
            ..Self::default()
        };
        state.apply(result);
        state
    }

    pub(crate) fn set_loading(&mut self, query: &str) {
        self.begin(query);
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// What a single `search` call did. Dashboard state already reflects it; this
/// is for callers that need an exit status.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Blank input, no request issued.
    Ignored,
    Updated { ticker: String },
    Failed { ticker: String, error: ApiError },
}

#[cfg(test)]
impl SearchOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, SearchOutcome::Updated { .. })
    }
}

/// Owns the dashboard state and the backend it is filled from.
pub struct AnalysisClient<A> {
    api: A,
    state: Mutex<DashboardState>,
}

impl<A: AnalysisApi> AnalysisClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run one analysis for `raw`. The state lock is never held across the
    /// network call.
    pub async fn search(&self, raw: &str) -> SearchOutcome {
        let Some(request) = self.state.lock().await.begin(raw) else {
            debug!("Ignoring blank search");
            return SearchOutcome::Ignored;
        };

        let fetched = {
            let _t = Timer::start(format!("analyze {}", request.ticker));
            self.api.analyze(&request).await
        };

        let mut state = self.state.lock().await;
        state.loading = false;

        match fetched {
            Ok(result) => {
                info!(
                    "{}: score {} ({} criteria passed)",
                    request.ticker,
                    result.score,
                    result.passed_count()
                );
                state.apply(result);
                SearchOutcome::Updated {
                    ticker: request.ticker,
                }
            }
            Err(error) => {
                warn!("Analysis of {} failed: {}", request.ticker, error);
                SearchOutcome::Failed {
                    ticker: request.ticker,
                    error,
                }
            }
        }
    }

    /// Copy of the current state, for rendering.
    pub async fn snapshot(&self) -> DashboardState {
        self.state.lock().await.clone()
    }
}
