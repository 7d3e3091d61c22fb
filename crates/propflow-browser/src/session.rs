//! The capability surface consumed by the extraction pipeline.
//!
//! A [`Session`] is one authenticated browser context tracking independent
//! page [`Surface`]s. Every interaction the pipeline needs — navigation,
//! form fill, clicks, bounded visibility waits, label/value reads — goes
//! through these traits so the orchestration logic never touches the
//! automation engine directly.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Opaque identity of one open page surface within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceId(String);

impl SurfaceId {
    /// Wrap an engine-assigned surface identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One anchor on a surface: href attribute plus visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub href: String,
    pub text: String,
}

/// One label/value pair read from a detail surface.
///
/// `value` is `None` when the label has no paired value node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: Option<String>,
}

/// Selectors describing how label/value pairs are structured on a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSelectors {
    /// Container of one pair
    pub item: String,
    /// Label node within the container
    pub label: String,
    /// Value node within the container
    pub value: String,
}

/// One rendered page (primary listing view or a secondary detail tab).
#[async_trait::async_trait]
pub trait Surface: Send + Sync {
    /// Engine-assigned identity of this surface.
    fn id(&self) -> SurfaceId;

    /// Navigate to a URL and wait for the load to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Fill a form field by selector.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Click the first element matching a selector.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Click the element at `index` among those matching `selector`.
    ///
    /// Callers re-resolve by index on every call; element handles are never
    /// reused across a navigation boundary.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<()>;

    /// Scroll an element into view and click it, bypassing visibility
    /// checks.
    async fn force_click(&self, selector: &str) -> Result<()>;

    /// Click the first element matching `selector` whose trimmed text
    /// contains `text`.
    async fn click_containing(&self, selector: &str, text: &str) -> Result<()>;

    /// Wait until an element matching `selector` is rendered and visible.
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Wait until the surface URL contains `fragment`.
    async fn wait_url_contains(&self, fragment: &str, timeout: Duration) -> Result<()>;

    /// Trimmed text content of the first element matching `selector`.
    async fn text(&self, selector: &str) -> Result<String>;

    /// Number of elements matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Attribute of the element at `index` among those matching `selector`.
    async fn nth_attr(&self, selector: &str, index: usize, attr: &str) -> Result<Option<String>>;

    /// Read every label/value pair structured per `selectors`.
    async fn labeled_values(&self, selectors: &PairSelectors) -> Result<Vec<LabeledValue>>;

    /// Find a label whose text contains `label_text` among elements
    /// matching `label_selector`, and return the trimmed text of its
    /// structurally adjacent sibling.
    async fn adjacent_value(
        &self,
        label_selector: &str,
        label_text: &str,
    ) -> Result<Option<String>>;

    /// All anchors matching `selector`, as href plus visible text.
    async fn links(&self, selector: &str) -> Result<Vec<LinkRef>>;

    /// Send a key press (e.g. "Escape") to the surface.
    async fn press_key(&self, key: &str) -> Result<()>;

    /// Capture a full-page screenshot to the given file. Best-effort
    /// diagnostics only.
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Close this surface.
    async fn close(&self) -> Result<()>;
}

impl fmt::Debug for dyn Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Surface").field(&self.id()).finish()
    }
}

/// An authenticated browser context owning a set of open surfaces.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    /// Open a fresh blank surface.
    async fn new_surface(&self) -> Result<Arc<dyn Surface>>;

    /// Identities of all currently open surfaces.
    async fn surface_ids(&self) -> Result<Vec<SurfaceId>>;

    /// Resolve an open surface by identity.
    async fn surface(&self, id: &SurfaceId) -> Result<Arc<dyn Surface>>;

    /// Tear the whole session down.
    async fn close(&self) -> Result<()>;
}
