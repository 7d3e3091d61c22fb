//! Browser automation capability surface for JavaScript-heavy listing
//! applications.
//!
//! Defines the [`Session`]/[`Surface`] trait pair the extraction pipeline
//! is written against, plus the chromiumoxide-backed implementation. The
//! traits exist so the orchestration state machine can be exercised against
//! an in-memory fake without a running Chrome.

pub mod chromium;
pub mod error;
pub mod session;

pub use chromium::{ChromiumSession, ChromiumSurface, LaunchOptions};
pub use error::{BrowserError, Result};
pub use session::{LabeledValue, LinkRef, PairSelectors, Session, Surface, SurfaceId};
