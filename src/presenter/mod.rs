//! Analysis presenter
//!
//! Owns the single "current selection" slot:
//! IDLE → LOADING → SUCCESS | FAILURE, and any state → LOADING on a new selection.
//!
//! Each selection bumps a generation counter. A completed request is applied
//! only if its generation is still current, so a slow superseded response can
//! never overwrite a newer one.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::analysis::AnalysisProvider;
use crate::catalog::Stock;
use crate::credential::Credential;
use crate::error::AnalysisError;
use crate::models::{AnalysisRequest, AnalysisResult};

pub mod progress;
pub use progress::ProgressClock;

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterState {
    Idle,
    Loading { stock: Stock },
    Success { stock: Stock, result: AnalysisResult },
    Failure { stock: Stock, error: AnalysisError },
}

impl PresenterState {
    pub fn stock(&self) -> Option<&Stock> {
        match self {
            PresenterState::Idle => None,
            PresenterState::Loading { stock }
            | PresenterState::Success { stock, .. }
            | PresenterState::Failure { stock, .. } => Some(stock),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            PresenterState::Idle => Status::Idle,
            PresenterState::Loading { .. } => Status::Loading,
            PresenterState::Success { .. } => Status::Success,
            PresenterState::Failure { .. } => Status::Failure,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Loading,
    Success,
    Failure,
}

/// Read-only snapshot handed to renderers
#[derive(Debug, Clone, Serialize)]
pub struct PresenterView {
    pub status: Status,
    pub generation: u64,
    pub stock: Option<Stock>,
    pub content: Option<String>,
    pub references: Vec<String>,
    pub error: Option<String>,
    pub error_kind: Option<&'static str>,
    pub progress: u8,
}

/// Handle for one selection; completing it applies only while it is current
#[derive(Debug, Clone)]
pub struct SelectionTicket {
    pub generation: u64,
    pub stock: Stock,
}

struct Slot {
    generation: u64,
    state: PresenterState,
    started_at: Option<Instant>,
}

pub struct Presenter {
    provider: Arc<dyn AnalysisProvider>,
    progress: ProgressClock,
    slot: Mutex<Slot>,
}

impl Presenter {
    pub fn new(provider: Arc<dyn AnalysisProvider>, progress_duration: Duration) -> Self {
        Self::with_progress(provider, ProgressClock::new(progress_duration))
    }

    pub fn with_progress(provider: Arc<dyn AnalysisProvider>, progress: ProgressClock) -> Self {
        Self {
            provider,
            progress,
            slot: Mutex::new(Slot {
                generation: 0,
                state: PresenterState::Idle,
                started_at: None,
            }),
        }
    }

    pub fn progress_clock(&self) -> ProgressClock {
        self.progress
    }

    // Never held across an await; a poisoned slot still holds a valid state
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new selection. Any previous result, error or in-flight request
    /// is invalidated immediately.
    pub fn begin(&self, stock: Stock) -> SelectionTicket {
        let mut slot = self.slot();
        slot.generation += 1;
        slot.state = PresenterState::Loading { stock: stock.clone() };
        slot.started_at = Some(Instant::now());

        info!(generation = slot.generation, symbol = %stock.symbol, "Selection started");

        SelectionTicket {
            generation: slot.generation,
            stock,
        }
    }

    /// Fetch the analysis for a ticket and apply it if still current.
    /// Without a credential no request is made.
    pub async fn resolve(&self, ticket: SelectionTicket, credential: Option<Credential>) -> bool {
        let outcome = match credential {
            None => Err(AnalysisError::MissingCredential),
            Some(credential) => {
                let request = AnalysisRequest::new(ticket.stock.symbol.clone(), Some(credential));
                self.provider.analyze(&request).await
            }
        };

        self.finish(ticket.generation, outcome)
    }

    /// Apply a completed request. Returns false when it was superseded.
    pub fn finish(
        &self,
        generation: u64,
        outcome: std::result::Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        let mut slot = self.slot();

        if generation != slot.generation {
            debug!(
                generation,
                current = slot.generation,
                "Discarding superseded analysis"
            );
            return false;
        }

        let PresenterState::Loading { stock } = &slot.state else {
            debug!(generation, "Selection already settled");
            return false;
        };
        let stock = stock.clone();

        slot.state = match outcome {
            Ok(result) => {
                info!(generation, symbol = %stock.symbol, "Analysis ready");
                PresenterState::Success { stock, result }
            }
            Err(error) => {
                warn!(generation, symbol = %stock.symbol, kind = error.kind(), "Analysis failed: {}", error);
                PresenterState::Failure { stock, error }
            }
        };

        true
    }

    /// `begin` followed by `resolve`
    pub async fn run_selection(&self, stock: Stock, credential: Option<Credential>) -> bool {
        let ticket = self.begin(stock);
        self.resolve(ticket, credential).await
    }

    pub fn state(&self) -> PresenterState {
        self.slot().state.clone()
    }

    /// Generation of the latest selection
    pub fn generation(&self) -> u64 {
        self.slot().generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.slot().state, PresenterState::Loading { .. })
    }

    pub fn snapshot(&self) -> PresenterView {
        let slot = self.slot();

        let progress = match (&slot.state, slot.started_at) {
            (PresenterState::Idle, _) => 0,
            (PresenterState::Loading { .. }, Some(started)) => {
                self.progress.percent_after(started.elapsed())
            }
            (PresenterState::Loading { .. }, None) => 0,
            _ => 100,
        };

        let (content, references, error, error_kind) = match &slot.state {
            PresenterState::Success { result, .. } => (
                Some(result.content.clone()),
                result.references.clone(),
                None,
                None,
            ),
            PresenterState::Failure { error, .. } => {
                (None, vec![], Some(error.user_message()), Some(error.kind()))
            }
            _ => (None, vec![], None, None),
        };

        PresenterView {
            status: slot.state.status(),
            generation: slot.generation,
            stock: slot.state.stock().cloned(),
            content,
            references,
            error,
            error_kind,
            progress,
        }
    }
}
