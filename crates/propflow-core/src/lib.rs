//! Shared types, configuration and errors for the propflow pipeline.
//!
//! This crate defines the domain model (records, field sets, aggregates),
//! the TOML-backed application configuration, and the configuration error
//! type used by the rest of the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, BrowserConfig, FieldsConfig, OutputConfig, RunConfig, Selectors, SessionConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use types::{
    AggregateResult, Credentials, ExtractionOutcome, FieldMap, FieldSet, LinkedPropertyRecord,
    MlsDetails, PropertyRecord, SearchQuery, NOT_AVAILABLE,
};
