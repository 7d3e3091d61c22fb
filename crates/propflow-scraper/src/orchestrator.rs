//! Top-level run orchestration: one authenticated session, all configured
//! saved searches, one terminal persistence write.
//!
//! The orchestrator owns the session exclusively. It is created once at
//! run start and torn down unconditionally at run end. A fatal condition
//! (login failure, or an error escaping a whole search run) aborts the
//! remaining searches, but whatever has been aggregated so far is
//! persisted before the fatal error propagates.

use crate::error::{Result, ScrapeError};
use crate::search::SearchRunController;
use propflow_browser::{BrowserError, Session, Surface};
use propflow_core::{AggregateResult, AppConfig, Credentials, SearchQuery};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

/// Establishes the session, iterates the configured saved searches, and
/// persists the merged result exactly once.
pub struct SessionOrchestrator {
    session: Arc<dyn Session>,
    config: AppConfig,
    credentials: Credentials,
}

impl SessionOrchestrator {
    /// Create an orchestrator over a freshly launched session.
    #[must_use]
    pub fn new(session: Arc<dyn Session>, config: AppConfig, credentials: Credentials) -> Self {
        Self {
            session,
            config,
            credentials,
        }
    }

    /// Run every configured search and persist the aggregate.
    ///
    /// The session is closed regardless of outcome.
    pub async fn run(&self) -> Result<AggregateResult> {
        let result = self.run_inner().await;

        if let Err(err) = self.session.close().await {
            tracing::warn!(error = %err, "session teardown failed");
        }

        result
    }

    async fn run_inner(&self) -> Result<AggregateResult> {
        let surface = self.establish_session().await?;

        let fields = self.config.field_set();
        let controller = SearchRunController::new(
            Arc::clone(&self.session),
            Arc::clone(&surface),
            &self.config,
        );

        let mut aggregate = AggregateResult::new();
        for (position, name) in self.config.run.saved_searches.iter().enumerate() {
            let query = SearchQuery::new(name.clone(), position);
            let start_id = u32::try_from(aggregate.len()).unwrap_or(u32::MAX - 1) + 1;

            match controller.run(&query, start_id, &fields).await {
                Ok(records) => {
                    for record in records {
                        aggregate.push(record);
                    }
                }
                Err(err) => {
                    tracing::error!(search = %name, error = %err, "search run failed, aborting");
                    self.capture_fatal(&surface).await;
                    self.persist_partial(&aggregate);
                    return Err(err);
                }
            }
        }

        self.persist(&aggregate)?;
        tracing::info!(
            successes = aggregate.successes(),
            attempted = aggregate.len(),
            "run complete"
        );

        Ok(aggregate)
    }

    /// Navigate to the login page, submit credentials, and wait for the
    /// post-login landing state. Failure here is fatal for the whole run.
    async fn establish_session(&self) -> Result<Arc<dyn Surface>> {
        let sel = &self.config.selectors;
        let cfg = &self.config.session;

        let surface = self
            .session
            .new_surface()
            .await
            .map_err(|e| ScrapeError::SessionEstablishment(e.to_string()))?;

        let login = async {
            surface.navigate(&cfg.login_url).await?;
            surface
                .fill(&sel.username_input, self.credentials.username())
                .await?;
            surface
                .fill(&sel.password_input, self.credentials.password())
                .await?;
            surface.click(&sel.submit_button).await?;
            surface
                .wait_url_contains(
                    &cfg.landing_fragment,
                    Duration::from_secs(cfg.login_timeout_secs),
                )
                .await?;
            Ok::<(), BrowserError>(())
        }
        .await;

        if let Err(err) = login {
            self.capture_fatal(&surface).await;
            return Err(ScrapeError::SessionEstablishment(err.to_string()));
        }

        tracing::info!("session established");
        Ok(surface)
    }

    /// Write the aggregate result document. This is the single terminal
    /// persistence write; downstream consumers read exactly this file.
    fn persist(&self, aggregate: &AggregateResult) -> Result<()> {
        let path = &self.config.output.results_path;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| ScrapeError::Persistence {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(aggregate)?;
        fs::write(path, json).map_err(|source| ScrapeError::Persistence {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            records = aggregate.len(),
            "results persisted"
        );
        Ok(())
    }

    /// Best-effort persistence of a partial aggregate ahead of a fatal
    /// error. An empty aggregate is skipped so a previous run's document
    /// is not clobbered with an empty array.
    fn persist_partial(&self, aggregate: &AggregateResult) {
        if aggregate.is_empty() {
            tracing::warn!("nothing aggregated yet, skipping partial persistence");
            return;
        }
        match self.persist(aggregate) {
            Ok(()) => tracing::warn!(
                records = aggregate.len(),
                "partial results persisted ahead of fatal error"
            ),
            Err(err) => tracing::error!(error = %err, "partial persistence failed"),
        }
    }

    async fn capture_fatal(&self, surface: &Arc<dyn Surface>) {
        let dir = &self.config.output.diagnostics_dir;
        if let Err(err) = fs::create_dir_all(dir) {
            tracing::debug!(error = %err, "could not create diagnostics dir");
            return;
        }
        let path = dir.join("fatal_error.png");
        match surface.screenshot(&path).await {
            Ok(()) => tracing::info!(path = %path.display(), "fatal diagnostic captured"),
            Err(err) => tracing::debug!(error = %err, "fatal diagnostic failed"),
        }
    }
}
