//! Label/value field extraction from detail surfaces.

use crate::error::Result;
use propflow_core::{FieldMap, FieldSet, NOT_AVAILABLE};
use propflow_browser::{LabeledValue, PairSelectors, Surface};

/// Extract the wanted fields from a detail surface.
///
/// Walks the surface's label/value pairs, exact-matching each trimmed label
/// against `fields`. The returned map always contains every name in
/// `fields`: a label with no paired value node, or a field absent from the
/// surface entirely, maps to [`NOT_AVAILABLE`].
pub async fn extract(
    surface: &dyn Surface,
    selectors: &PairSelectors,
    fields: &FieldSet,
) -> Result<FieldMap> {
    let pairs = surface.labeled_values(selectors).await?;
    Ok(match_fields(&pairs, fields))
}

/// Merge raw label/value pairs into the requested field set.
///
/// Exact match on trimmed label text; the last occurrence of a label wins,
/// matching how the listing application stacks repeated sections. Keys
/// outside `fields` are never emitted, and every requested field is present
/// in the result.
#[must_use]
pub fn match_fields(pairs: &[LabeledValue], fields: &FieldSet) -> FieldMap {
    let mut out = FieldMap::new();

    for pair in pairs {
        let label = pair.label.trim();
        if !fields.contains(label) {
            continue;
        }
        let value = pair
            .value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(NOT_AVAILABLE);
        out.insert(label.to_string(), value.to_string());
    }

    for name in fields {
        out.entry(name.clone())
            .or_insert_with(|| NOT_AVAILABLE.to_string());
    }

    out
}

/// Read a single value sitting structurally adjacent to a label matched by
/// contained text, degrading to [`NOT_AVAILABLE`] on any failure.
pub async fn adjacent_field(surface: &dyn Surface, label_selector: &str, label_text: &str) -> String {
    match surface.adjacent_value(label_selector, label_text).await {
        Ok(Some(value)) if !value.trim().is_empty() => value.trim().to_string(),
        Ok(_) => NOT_AVAILABLE.to_string(),
        Err(err) => {
            tracing::debug!(label = label_text, error = %err, "adjacent value read failed");
            NOT_AVAILABLE.to_string()
        }
    }
}
