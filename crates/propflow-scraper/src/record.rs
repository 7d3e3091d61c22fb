//! Per-record scraping: one listing row's detail panel plus its linked
//! records.
//!
//! The listing re-renders after every navigation, invalidating previously
//! resolved element handles, so rows are always re-resolved by index and
//! linked entries by an href-derived selector. Any failure in the main
//! steps becomes the record's `error` field; the record itself is always
//! returned, and the listing is returned to a known state before the next
//! row.

use crate::error::Result;
use crate::fields;
use crate::retry::retry;
use crate::tabs::{self, click_and_await_new_surface};
use propflow_browser::{BrowserError, LinkRef, PairSelectors, Session, Surface};
use propflow_core::{
    AppConfig, FieldSet, LinkedPropertyRecord, MlsDetails, PropertyRecord,
};
use std::sync::Arc;
use std::time::Duration;

/// Attempts for the initial row click.
const ROW_CLICK_ATTEMPTS: u32 = 3;

/// Bound on the primary detail panel becoming visible.
const DETAIL_PANEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on the best-effort title read.
const TITLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Bound on the linked-properties grid rendering.
const LINKED_CONTAINER_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on a secondary tab's detail panel rendering.
const SECONDARY_PANEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on the listing recovering after overlay dismissal.
const LISTING_RECOVER_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on the MLS tab's labels populating.
const MLS_LOAD_TIMEOUT: Duration = Duration::from_secs(8);

/// Fallback when the title read times out. Titles never abort a record.
const TITLE_FALLBACK: &str = "Title Not Found";

/// Scrapes one primary record and its linked records.
pub struct RecordScraper<'a> {
    session: Arc<dyn Session>,
    surface: Arc<dyn Surface>,
    config: &'a AppConfig,
}

impl<'a> RecordScraper<'a> {
    /// Create a scraper bound to the listing surface of an established
    /// session.
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

    fn pair_selectors(&self) -> PairSelectors {
        let sel = &self.config.selectors;
        PairSelectors {
            item: sel.field_item.clone(),
            label: sel.field_label.clone(),
            value: sel.field_value.clone(),
        }
    }

    /// Scrape the row at `row_index` into a [`PropertyRecord`].
    ///
    /// Never fails: a failure at any step is recorded on the returned
    /// record, and the listing view is restored regardless of outcome.
    pub async fn scrape(
        &self,
        row_index: usize,
        record_id: u32,
        search_name: &str,
        fields: &FieldSet,
    ) -> PropertyRecord {
        let mut record = PropertyRecord::new(record_id, search_name);

        if let Err(err) = self.scrape_into(&mut record, row_index, fields).await {
            tracing::error!(row = row_index, id = record_id, error = %err, "record scrape failed");
            record.error = Some(err.to_string());
            self.capture_diagnostic(record_id).await;
        }

        self.dismiss_overlay().await;
        record
    }

    async fn scrape_into(
        &self,
        record: &mut PropertyRecord,
        row_index: usize,
        fields: &FieldSet,
    ) -> Result<()> {
        let sel = &self.config.selectors;
        let surface = &self.surface;
        let row_selector = sel.row_name.as_str();

        // Re-resolve the row by index on every attempt; handles captured
        // before a page state change are stale.
        let href = retry(
            || async move {
                let href = surface.nth_attr(row_selector, row_index, "href").await?;
                surface.click_nth(row_selector, row_index).await?;
                Ok::<_, BrowserError>(href)
            },
            ROW_CLICK_ATTEMPTS,
        )
        .await?;
        record.link = href.map(|h| absolutize(&self.config.session.base_url, &h));

        self.surface
            .wait_visible(&sel.detail_panel, DETAIL_PANEL_TIMEOUT)
            .await?;

        record.title = self.read_title().await.unwrap_or_else(|| {
            tracing::debug!(row = row_index, "title read timed out, using fallback");
            TITLE_FALLBACK.to_string()
        });

        record.fields = fields::extract(self.surface.as_ref(), &self.pair_selectors(), fields).await?;

        match self
            .surface
            .click_containing(&sel.linked_tab, &sel.linked_tab_text)
            .await
        {
            Ok(()) => self.scrape_linked(record, fields).await?,
            Err(BrowserError::SelectorNotFound(_)) => {
                tracing::debug!(row = row_index, "no linked properties tab");
            }
            Err(err) => return Err(err.into()),
        }

        if self.config.run.extract_mls_details {
            record.mls = self.mls_details().await;
        }

        Ok(())
    }

    async fn read_title(&self) -> Option<String> {
        let sel = &self.config.selectors;
        self.surface
            .wait_visible(&sel.title, TITLE_TIMEOUT)
            .await
            .ok()?;
        let title = self.surface.text(&sel.title).await.ok()?;
        Some(title)
    }

    /// Open each linked entry in a secondary tab, extract it, close the
    /// tab. A failure on one entry is logged against that entry only and
    /// never stops the remaining entries or the primary record.
    async fn scrape_linked(&self, record: &mut PropertyRecord, fields: &FieldSet) -> Result<()> {
        let sel = &self.config.selectors;

        self.surface
            .wait_visible(&sel.linked_container, LINKED_CONTAINER_TIMEOUT)
            .await?;
        let links = self.surface.links(&sel.linked_links).await?;
        tracing::info!(count = links.len(), "linked properties found");

        for (i, link) in links.iter().enumerate() {
            let ordinal = i + 1;
            match self.scrape_linked_entry(link, ordinal, fields).await {
                Ok(entry) => record.linked_properties.push(entry),
                Err(err) => {
                    tracing::warn!(
                        ordinal,
                        address = %link.text,
                        error = %err,
                        "linked entry failed, skipping"
                    );
                }
            }
        }

        Ok(())
    }

    async fn scrape_linked_entry(
        &self,
        link: &LinkRef,
        ordinal: usize,
        fields: &FieldSet,
    ) -> Result<LinkedPropertyRecord> {
        // Scrolling can detach and re-attach grid nodes; a selector derived
        // from the current href stays valid where a captured handle would
        // not.
        let selector = format!("a[href={}]", quote_attr(&link.href));

        let tab = click_and_await_new_surface(
            self.session.as_ref(),
            || self.surface.force_click(&selector),
            tabs::NEW_SURFACE_ATTEMPTS,
            tabs::NEW_SURFACE_INTERVAL,
        )
        .await?;

        let extracted = async {
            tab.wait_visible(&self.config.selectors.detail_panel, SECONDARY_PANEL_TIMEOUT)
                .await?;
            fields::extract(tab.as_ref(), &self.pair_selectors(), fields).await
        }
        .await;

        if let Err(err) = tab.close().await {
            tracing::warn!(ordinal, error = %err, "failed to close secondary tab");
        }

        Ok(LinkedPropertyRecord {
            blueprint: format!("Blueprint {ordinal}"),
            address: link.text.clone(),
            fields: extracted?,
        })
    }

    /// Read the MLS Details tab. Degrades to sentinels, never fails the
    /// record.
    async fn mls_details(&self) -> Option<MlsDetails> {
        let sel = &self.config.selectors;

        if let Err(err) = self
            .surface
            .click_containing(&sel.mls_tab, &sel.mls_tab_text)
            .await
        {
            tracing::warn!(error = %err, "MLS details tab not reachable");
            return None;
        }

        self.wait_mls_loaded().await;

        let surface = self.surface.as_ref();
        Some(MlsDetails {
            status_date: fields::adjacent_field(surface, &sel.mls_label, "Status Date").await,
            price: fields::adjacent_field(surface, &sel.mls_label, "Price").await,
            agent_name: fields::adjacent_field(surface, &sel.mls_label, "Agent Name").await,
            agent_phone: fields::adjacent_field(surface, &sel.mls_label, "Agent Phone").await,
            agent_email: fields::adjacent_field(surface, &sel.mls_label, "Agent Email").await,
        })
    }

    async fn wait_mls_loaded(&self) {
        let deadline = tokio::time::Instant::now() + MLS_LOAD_TIMEOUT;
        loop {
            if let Ok(Some(value)) = self
                .surface
                .adjacent_value(&self.config.selectors.mls_label, "Price")
                .await
            {
                if !value.trim().is_empty() {
                    return;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::debug!("MLS labels did not populate within bound");
                return;
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    }

    /// Return the listing to a known state: press Escape, re-confirm the
    /// listing rows are visible. Failures here are swallowed; the next row
    /// click retries anyway.
    async fn dismiss_overlay(&self) {
        if let Err(err) = self.surface.press_key("Escape").await {
            tracing::debug!(error = %err, "escape press failed");
        }
        if let Err(err) = self
            .surface
            .wait_visible(&self.config.selectors.row_name, LISTING_RECOVER_TIMEOUT)
            .await
        {
            tracing::debug!(error = %err, "listing did not recover after overlay dismissal");
        }
    }

    async fn capture_diagnostic(&self, record_id: u32) {
        let dir = &self.config.output.diagnostics_dir;
        if let Err(err) = std::fs::create_dir_all(dir) {
            tracing::debug!(error = %err, "could not create diagnostics dir");
            return;
        }
        let path = dir.join(format!("error_{record_id}.png"));
        match self.surface.screenshot(&path).await {
            Ok(()) => tracing::info!(path = %path.display(), "diagnostic screenshot captured"),
            Err(err) => tracing::debug!(error = %err, "diagnostic screenshot failed"),
        }
    }
}

/// Absolutise a row href against the application base URL.
fn absolutize(base_url: &str, href: &str) -> String {
    match url::Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(absolute) => absolute.to_string(),
        Err(err) => {
            tracing::debug!(base = base_url, href, error = %err, "could not absolutise link");
            href.to_string()
        }
    }
}

/// Quote an attribute value for use inside a CSS attribute selector.
fn quote_attr(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
