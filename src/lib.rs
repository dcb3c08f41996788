//! Stock Sage
//!
//! Pick a stock from a fixed catalog and read an AI-generated summary of its
//! recent price action, news and analyst sentiment.
//!
//! FLOW:
//! PICK → LOADING → SUCCESS | FAILURE (latest selection wins)

pub mod analysis;
pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod credential;
pub mod error;
pub mod models;
pub mod picker;
pub mod presenter;
pub mod render;
pub mod session;

pub use error::Result;

// Re-export common types
pub use catalog::{Stock, StockCatalog};
pub use credential::Credential;
pub use error::{AnalysisError, SageError};
pub use models::{AnalysisRequest, AnalysisResult};
pub use presenter::{Presenter, PresenterState, PresenterView};
