//! Per-search run control: select a saved search, enumerate its rows, and
//! drive the record scraper over each row in order.
//!
//! Rows are scraped strictly sequentially; the shared browser session and
//! live listing DOM make concurrent per-record mutation unsafe. A failing
//! record never aborts the run — it comes back with its `error` set and
//! the loop moves on.

use crate::error::{Result, ScrapeError};
use crate::record::RecordScraper;
use propflow_browser::{Session, Surface};
use propflow_core::{AppConfig, FieldSet, PropertyRecord, SearchQuery};
use std::sync::Arc;
use std::time::Duration;

/// Bound on the result listing rendering after search selection.
const LISTING_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs one saved search end to end.
pub struct SearchRunController<'a> {
    session: Arc<dyn Session>,
    surface: Arc<dyn Surface>,
    config: &'a AppConfig,
}

impl<'a> SearchRunController<'a> {
    /// Create a controller over an established session's listing surface.
    #[must_use]
    pub fn new(
        session: Arc<dyn Session>,
        surface: Arc<dyn Surface>,
        config: &'a AppConfig,
    ) -> Self {
        Self {
            session,
            surface,
            config,
        }
    }

    /// Run the saved search, scraping every row (capped at the configured
    /// maximum) in ascending index order. Records are assigned sequential
    /// ids starting at `start_id` and tagged with the search name.
    ///
    /// Returns all records in row order, failed ones included. An error
    /// here means the search itself could not be driven and is fatal for
    /// the caller.
    pub async fn run(
        &self,
        query: &SearchQuery,
        start_id: u32,
        fields: &FieldSet,
    ) -> Result<Vec<PropertyRecord>> {
        tracing::info!(search = %query.name, position = query.position, "starting search run");

        self.open_saved_search(&query.name).await?;

        let sel = &self.config.selectors;
        self.surface
            .wait_visible(&sel.row_name, LISTING_TIMEOUT)
            .await?;

        let available = self.surface.count(&sel.row_name).await?;
        let total = self
            .config
            .run
            .max_rows
            .map_or(available, |cap| available.min(cap));
        tracing::info!(search = %query.name, available, total, "listing enumerated");

        let scraper = RecordScraper::new(
            Arc::clone(&self.session),
            Arc::clone(&self.surface),
            self.config,
        );

        let mut records = Vec::with_capacity(total);
        for row_index in 0..total {
            let record_id = start_id + u32::try_from(row_index).unwrap_or(u32::MAX);
            tracing::info!(
                search = %query.name,
                row = row_index + 1,
                of = total,
                id = record_id,
                "processing row"
            );

            let record = scraper
                .scrape(row_index, record_id, &query.name, fields)
                .await;
            records.push(record);

            // Let transient UI state settle before touching the next row.
            tokio::time::sleep(Duration::from_millis(self.config.run.record_settle_ms)).await;
        }

        Ok(records)
    }

    /// Drive the saved-search UI path: filter toggle, saved-searches menu,
    /// the named entry, then the view-results button.
    async fn open_saved_search(&self, name: &str) -> Result<()> {
        let sel = &self.config.selectors;

        self.surface
            .click_containing(&sel.filter_toggle, &sel.filter_toggle_text)
            .await
            .map_err(|e| selection_failed(name, "filter toggle", &e))?;
        self.surface
            .click(&sel.saved_search_menu)
            .await
            .map_err(|e| selection_failed(name, "saved searches menu", &e))?;
        self.surface
            .click_containing(&sel.saved_search_entry, name)
            .await
            .map_err(|e| selection_failed(name, "saved search entry", &e))?;
        self.surface
            .click_containing(&sel.view_results_button, &sel.view_results_text)
            .await
            .map_err(|e| selection_failed(name, "view results button", &e))?;

        Ok(())
    }
}

fn selection_failed(
    name: &str,
    step: &str,
    err: &propflow_browser::BrowserError,
) -> ScrapeError {
    ScrapeError::SearchRun {
        name: name.to_string(),
        reason: format!("{step}: {err}"),
    }
}
