//! Secondary-tab discovery and lifecycle.
//!
//! The listing application opens linked-record detail views via an
//! application-level "open in new tab" behaviour with no synchronous
//! return value or event to await, so the only way to find the new tab is
//! a before/after diff over the session's open surface set, polled with a
//! bounded attempt count.
//!
//! This module never closes surfaces; the caller drains the new surface
//! and closes it, avoiding races with in-flight extraction.

use crate::error::{Result, ScrapeError};
use propflow_browser::{Session, Surface, SurfaceId};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default polling attempts before giving up on a new tab.
pub const NEW_SURFACE_ATTEMPTS: u32 = 20;

/// Default interval between polling attempts.
pub const NEW_SURFACE_INTERVAL: Duration = Duration::from_millis(300);

/// Snapshot the open surface set, run `click`, then poll up to `attempts`
/// times at `interval` apart for a surface present afterwards but absent
/// before. Returns the new surface, or [`ScrapeError::NoNewSurface`] once
/// the attempts are exhausted.
pub async fn click_and_await_new_surface<F, Fut>(
    session: &dyn Session,
    click: F,
    attempts: u32,
    interval: Duration,
) -> Result<Arc<dyn Surface>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = propflow_browser::Result<()>>,
{
    let before: HashSet<SurfaceId> = session.surface_ids().await?.into_iter().collect();

    click().await?;

    for attempt in 0..attempts {
        let after = session.surface_ids().await?;
        if let Some(new_id) = after.iter().find(|id| !before.contains(id)) {
            tracing::debug!(surface = %new_id, attempt, "new surface detected");
            return Ok(session.surface(new_id).await?);
        }
        tokio::time::sleep(interval).await;
    }

    Err(ScrapeError::NoNewSurface { attempts })
}
