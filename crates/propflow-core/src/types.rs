//! Domain model for the extraction pipeline.
//!
//! The serde shapes here are a published contract: the JSON document written
//! at the end of a run is consumed by downstream exporters and responders,
//! so field names (`searchName`, `linkedProperties`, `blueprint`) and the
//! flattened field map must stay stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder recorded when a requested field has no value on the surface.
pub const NOT_AVAILABLE: &str = "N/A";

/// Map of canonical field name to extracted value.
pub type FieldMap = BTreeMap<String, String>;

/// Opaque login credentials, supplied via environment configuration.
///
/// The Debug impl redacts both values so credentials never leak into logs.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Login user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One saved, server-side-stored search, identified by display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Display name of the saved search
    pub name: String,
    /// Ordinal position in the configured run list
    pub position: usize,
}

impl SearchQuery {
    /// Create a query for the saved search at the given list position.
    #[must_use]
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Ordered set of canonical field names to extract from detail surfaces.
///
/// Shared by primary and linked-record extraction. Extraction never emits a
/// key outside this set, and a field absent on the page maps to
/// [`NOT_AVAILABLE`] rather than being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(Vec<String>);

impl FieldSet {
    /// Create a field set from an ordered list of names.
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// Whether the set contains the given field name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Iterate the field names in order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Number of field names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self(
            [
                "Year Built",
                "SqFt",
                "Lot Size",
                "Property Type",
                "Status",
                "Distressed",
                "Short Sale",
                "HOA/COA",
                "Owner Type",
                "Owner Status",
                "Occupancy",
                "Length of Ownership",
                "Purchase Method",
                "County",
                "Estimated Value",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// MLS listing details read from the "MLS Details" tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlsDetails {
    /// Listing status date
    pub status_date: String,
    /// Listing price
    pub price: String,
    /// Listing agent name
    pub agent_name: String,
    /// Listing agent phone
    pub agent_phone: String,
    /// Listing agent email
    pub agent_email: String,
}

/// A record nested under exactly one [`PropertyRecord`], extracted from a
/// secondary tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedPropertyRecord {
    /// Ordinal label, e.g. "Blueprint 2"
    pub blueprint: String,
    /// Source address text of the link that opened the tab
    pub address: String,
    /// Extracted field values, flattened into the JSON object
    #[serde(flatten)]
    pub fields: FieldMap,
}

/// The unit of output for one primary listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Sequential id, 1-based and unique within a run
    pub id: u32,
    /// Detail panel title, or the configured fallback
    pub title: String,
    /// Display name of the saved search this record came from
    #[serde(rename = "searchName")]
    pub search_name: String,
    /// Absolute link to the detail view, when the row exposed one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Extracted field values, flattened into the JSON object
    #[serde(flatten)]
    pub fields: FieldMap,
    /// Linked records in their DOM-listed order
    #[serde(rename = "linkedProperties", default)]
    pub linked_properties: Vec<LinkedPropertyRecord>,
    /// MLS details, when that pass is enabled and the tab was reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mls: Option<MlsDetails>,
    /// Error description when the scrape failed partway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PropertyRecord {
    /// Create an empty record for the given id and originating search.
    #[must_use]
    pub fn new(id: u32, search_name: impl Into<String>) -> Self {
        Self {
            id,
            title: String::new(),
            search_name: search_name.into(),
            link: None,
            fields: FieldMap::new(),
            linked_properties: Vec::new(),
            mls: None,
            error: None,
        }
    }

    /// Classify this record's extraction outcome.
    #[must_use]
    pub fn outcome(&self) -> ExtractionOutcome<'_> {
        match (&self.error, self.fields.is_empty()) {
            (None, _) => ExtractionOutcome::Success(&self.fields),
            (Some(err), false) => ExtractionOutcome::Partial(&self.fields, err),
            (Some(err), true) => ExtractionOutcome::Failure(err),
        }
    }

    /// Whether the record completed without an error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// How a single record's extraction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome<'a> {
    /// All steps completed
    Success(&'a FieldMap),
    /// Some fields were extracted before a failure
    Partial(&'a FieldMap, &'a str),
    /// Nothing was extracted
    Failure(&'a str),
}

/// Ordered sequence of records across all configured searches.
///
/// Serializes transparently as a JSON array; this array is the persisted
/// output document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    records: Vec<PropertyRecord>,
}

impl AggregateResult {
    /// Create an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished record. Records are immutable once appended.
    pub fn push(&mut self, record: PropertyRecord) {
        self.records.push(record);
    }

    /// All records in combined run order.
    #[must_use]
    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    /// Total records attempted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Count of records without an error.
    #[must_use]
    pub fn successes(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    /// Count of records carrying an error.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.records.len() - self.successes()
    }
}
