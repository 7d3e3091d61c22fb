//! chromiumoxide-backed implementation of the capability surface.
//!
//! DOM reads and forced clicks go through `page.evaluate` with
//! JSON-encoded arguments; waits are polling loops bounded by a deadline.
//! The listing application is a single-page app, so most selectors resolve
//! against a live, re-rendering DOM and nothing here caches element
//! handles.

use crate::error::{BrowserError, Result};
use crate::session::{LabeledValue, LinkRef, PairSelectors, Session, Surface, SurfaceId};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Poll interval for bounded visibility/URL waits.
const WAIT_POLL_MS: u64 = 100;

/// Browser launch options.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

/// A launched browser acting as one isolated, authenticated context.
pub struct ChromiumSession {
    browser: Mutex<Browser>,
}

impl ChromiumSession {
    /// Launch a browser process and spawn its event handler.
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(options.window_width, options.window_height);
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drive the CDP event loop for the lifetime of the browser.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
        })
    }
}

#[async_trait::async_trait]
impl Session for ChromiumSession {
    async fn new_surface(&self) -> Result<Arc<dyn Surface>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(Arc::new(ChromiumSurface::new(page)))
    }

    async fn surface_ids(&self) -> Result<Vec<SurfaceId>> {
        let pages = self
            .browser
            .lock()
            .await
            .pages()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(pages
            .iter()
            .map(|p| SurfaceId::new(p.target_id().inner().clone()))
            .collect())
    }

    async fn surface(&self, id: &SurfaceId) -> Result<Arc<dyn Surface>> {
        let pages = self
            .browser
            .lock()
            .await
            .pages()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        pages
            .into_iter()
            .find(|p| p.target_id().inner() == id.as_str())
            .map(|page| Arc::new(ChromiumSurface::new(page)) as Arc<dyn Surface>)
            .ok_or_else(|| BrowserError::SurfaceNotFound(id.to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.browser
            .lock()
            .await
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }
}

/// One chromium page.
pub struct ChromiumSurface {
    page: Page,
}

impl ChromiumSurface {
    /// Wrap an existing page.
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }
}

/// Encode a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[async_trait::async_trait]
impl Surface for ChromiumSurface {
    fn id(&self) -> SurfaceId {
        SurfaceId::new(self.page.target_id().inner().clone())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        element
            .type_str(value)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        let clicked: bool = self
            .eval(format!(
                "(() => {{ const els = document.querySelectorAll({sel}); \
                 const el = els[{index}]; if (!el) return false; \
                 el.scrollIntoView({{block: 'center'}}); el.click(); return true; }})()",
                sel = js_str(selector),
            ))
            .await?;
        if clicked {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(format!(
                "{selector} at index {index}"
            )))
        }
    }

    async fn force_click(&self, selector: &str) -> Result<()> {
        let clicked: bool = self
            .eval(format!(
                "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
                 el.scrollIntoView({{block: 'center'}}); el.click(); return true; }})()",
                sel = js_str(selector),
            ))
            .await?;
        if clicked {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn click_containing(&self, selector: &str, text: &str) -> Result<()> {
        let clicked: bool = self
            .eval(format!(
                "(() => {{ const els = Array.from(document.querySelectorAll({sel})); \
                 const el = els.find(e => (e.textContent || '').trim().includes({text})); \
                 if (!el) return false; el.scrollIntoView({{block: 'center'}}); el.click(); \
                 return true; }})()",
                sel = js_str(selector),
                text = js_str(text),
            ))
            .await?;
        if clicked {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(format!(
                "{selector} containing '{text}'"
            )))
        }
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return !!(el && el.offsetParent !== null); }})()",
            sel = js_str(selector),
        );
        loop {
            if self.eval::<bool>(script.clone()).await.unwrap_or(false) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "{selector} not visible within {timeout:?}"
                )));
            }
            tokio::time::sleep(Duration::from_millis(WAIT_POLL_MS)).await;
        }
    }

    async fn wait_url_contains(&self, fragment: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let url = self
                .page
                .url()
                .await
                .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
            if url.is_some_and(|u| u.contains(fragment)) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "URL did not contain '{fragment}' within {timeout:?}"
                )));
            }
            tokio::time::sleep(Duration::from_millis(WAIT_POLL_MS)).await;
        }
    }

    async fn text(&self, selector: &str) -> Result<String> {
        let text: Option<String> = self
            .eval(format!(
                "(() => {{ const el = document.querySelector({sel}); \
                 return el ? (el.textContent || '').trim() : null; }})()",
                sel = js_str(selector),
            ))
            .await?;
        text.ok_or_else(|| BrowserError::SelectorNotFound(selector.to_string()))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let count: u64 = self
            .eval(format!(
                "document.querySelectorAll({sel}).length",
                sel = js_str(selector),
            ))
            .await?;
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }

    async fn nth_attr(&self, selector: &str, index: usize, attr: &str) -> Result<Option<String>> {
        self.eval(format!(
            "(() => {{ const el = document.querySelectorAll({sel})[{index}]; \
             return el ? el.getAttribute({attr}) : null; }})()",
            sel = js_str(selector),
            attr = js_str(attr),
        ))
        .await
    }

    async fn labeled_values(&self, selectors: &PairSelectors) -> Result<Vec<LabeledValue>> {
        self.eval(format!(
            "Array.from(document.querySelectorAll({item})).map(item => {{ \
             const l = item.querySelector({label}); \
             const v = item.querySelector({value}); \
             return {{ label: l ? (l.textContent || '').trim() : '', \
                       value: v ? (v.textContent || '').trim() : null }}; }})",
            item = js_str(&selectors.item),
            label = js_str(&selectors.label),
            value = js_str(&selectors.value),
        ))
        .await
    }

    async fn adjacent_value(
        &self,
        label_selector: &str,
        label_text: &str,
    ) -> Result<Option<String>> {
        self.eval(format!(
            "(() => {{ const labels = Array.from(document.querySelectorAll({sel})); \
             const el = labels.find(e => (e.textContent || '').includes({text})); \
             const next = el && el.nextElementSibling; \
             return next ? (next.textContent || '').trim() : null; }})()",
            sel = js_str(label_selector),
            text = js_str(label_text),
        ))
        .await
    }

    async fn links(&self, selector: &str) -> Result<Vec<LinkRef>> {
        self.eval(format!(
            "Array.from(document.querySelectorAll({sel})).map(a => \
             ({{ href: a.getAttribute('href') || '', text: (a.textContent || '').trim() }}))",
            sel = js_str(selector),
        ))
        .await
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        let body = self
            .page
            .find_element("body")
            .await
            .map_err(|_| BrowserError::SelectorNotFound("body".to_string()))?;
        body.press_key(key)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }
}
