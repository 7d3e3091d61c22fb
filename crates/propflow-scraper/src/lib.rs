//! Extraction orchestration for saved-search property scraping.
//!
//! This crate is the core state machine: it establishes one authenticated
//! session, walks the configured saved searches, scrapes each result row's
//! detail panel plus its linked records behind secondary tabs, and
//! aggregates everything into a single ordered result document.
//!
//! Error handling is layered (see [`error::ScrapeError`]): transient UI
//! failures are absorbed by the retry executor, linked-entry failures stay
//! inside the linked loop, record failures become the record's `error`
//! field, and only session establishment or a whole-search failure is
//! fatal — and even then the partial aggregate is persisted first.
//!
//! Everything runs on a strict sequential call chain over the one shared
//! browser session. That serial discipline is a correctness invariant:
//! rows mutate the live listing DOM, so there is never more than one
//! scraper active.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod fields;
pub mod orchestrator;
pub mod record;
pub mod retry;
pub mod search;
pub mod tabs;

pub use error::{Result, ScrapeError};
pub use fields::{extract, match_fields};
pub use orchestrator::SessionOrchestrator;
pub use record::RecordScraper;
pub use retry::retry;
pub use search::SearchRunController;
pub use tabs::click_and_await_new_surface;
