//! Scripted in-memory implementations of the browser capability traits.
//!
//! `FakeSurface` answers each trait call from a per-surface script;
//! `FakeSession` tracks the open surface set so tab discovery can be
//! exercised without a browser. Nothing here sleeps, so tests run under a
//! paused tokio clock.

#![allow(dead_code)]

use propflow_browser::{
    BrowserError, LabeledValue, LinkRef, PairSelectors, Result, Session, Surface, SurfaceId,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct SurfaceScript {
    visible: HashSet<String>,
    texts: HashMap<String, String>,
    hrefs: HashMap<String, Vec<String>>,
    counts: HashMap<String, VecDeque<usize>>,
    pairs: Vec<LabeledValue>,
    adjacent: HashMap<String, String>,
    links: HashMap<String, Vec<LinkRef>>,
    url_fragments: HashSet<String>,
    fail_click_nth: HashMap<(String, usize), u32>,
    fail_force_click: HashSet<String>,
    missing_containing: HashSet<String>,
    fail_navigate: bool,
}

struct SessionState {
    open: Vec<Arc<FakeSurface>>,
    pending: Vec<(u32, Arc<FakeSurface>)>,
    ids_calls: u32,
    closed: bool,
}

/// One scripted page surface.
pub struct FakeSurface {
    id: SurfaceId,
    script: Mutex<SurfaceScript>,
    session_state: Mutex<Option<Arc<Mutex<SessionState>>>>,
    spawn_on_click: Mutex<HashMap<String, VecDeque<Arc<FakeSurface>>>>,
    log: Mutex<Vec<String>>,
    closed: Mutex<bool>,
}

impl FakeSurface {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: SurfaceId::new(id),
            script: Mutex::new(SurfaceScript::default()),
            session_state: Mutex::new(None),
            spawn_on_click: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        })
    }

    pub fn set_visible(&self, selector: &str) {
        self.script
            .lock()
            .unwrap()
            .visible
            .insert(selector.to_string());
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.script
            .lock()
            .unwrap()
            .texts
            .insert(selector.to_string(), text.to_string());
    }

    /// Script `count` results for a selector; the queue is drained per
    /// call and the last entry repeats.
    pub fn set_counts(&self, selector: &str, counts: &[usize]) {
        self.script
            .lock()
            .unwrap()
            .counts
            .insert(selector.to_string(), counts.iter().copied().collect());
    }

    pub fn set_hrefs(&self, selector: &str, hrefs: &[&str]) {
        self.script.lock().unwrap().hrefs.insert(
            selector.to_string(),
            hrefs.iter().map(|s| (*s).to_string()).collect(),
        );
    }

    pub fn set_pairs(&self, pairs: Vec<LabeledValue>) {
        self.script.lock().unwrap().pairs = pairs;
    }

    pub fn set_adjacent(&self, label_text: &str, value: &str) {
        self.script
            .lock()
            .unwrap()
            .adjacent
            .insert(label_text.to_string(), value.to_string());
    }

    pub fn set_links(&self, selector: &str, links: Vec<LinkRef>) {
        self.script
            .lock()
            .unwrap()
            .links
            .insert(selector.to_string(), links);
    }

    pub fn set_url_fragment(&self, fragment: &str) {
        self.script
            .lock()
            .unwrap()
            .url_fragments
            .insert(fragment.to_string());
    }

    /// Make `click_nth` fail for this selector/index, `times` times
    /// (`u32::MAX` for always).
    pub fn fail_click_nth(&self, selector: &str, index: usize, times: u32) {
        self.script
            .lock()
            .unwrap()
            .fail_click_nth
            .insert((selector.to_string(), index), times);
    }

    pub fn fail_force_click(&self, selector: &str) {
        self.script
            .lock()
            .unwrap()
            .fail_force_click
            .insert(selector.to_string());
    }

    /// Make `click_containing` report the given text as not found.
    pub fn hide_containing(&self, text: &str) {
        self.script
            .lock()
            .unwrap()
            .missing_containing
            .insert(text.to_string());
    }

    pub fn fail_navigate(&self) {
        self.script.lock().unwrap().fail_navigate = true;
    }

    /// Register a surface that opens when `force_click` hits `selector`.
    pub fn spawn_on_force_click(&self, selector: &str, surface: Arc<FakeSurface>) {
        self.spawn_on_click
            .lock()
            .unwrap()
            .entry(selector.to_string())
            .or_default()
            .push_back(surface);
    }

    pub fn actions(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn was_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    fn record(&self, action: String) {
        self.log.lock().unwrap().push(action);
    }
}

#[async_trait::async_trait]
impl Surface for FakeSurface {
    fn id(&self) -> SurfaceId {
        self.id.clone()
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate:{url}"));
        if self.script.lock().unwrap().fail_navigate {
            return Err(BrowserError::NavigationError(url.to_string()));
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.record(format!("fill:{selector}:{value}"));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click:{selector}"));
        Ok(())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        let key = (selector.to_string(), index);
        if let Some(remaining) = script.fail_click_nth.get_mut(&key) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(BrowserError::Timeout(format!(
                    "{selector} at index {index} not clickable"
                )));
            }
        }
        drop(script);
        self.record(format!("click_nth:{selector}:{index}"));
        Ok(())
    }

    async fn force_click(&self, selector: &str) -> Result<()> {
        if self
            .script
            .lock()
            .unwrap()
            .fail_force_click
            .contains(selector)
        {
            return Err(BrowserError::SelectorNotFound(selector.to_string()));
        }
        self.record(format!("force_click:{selector}"));

        let spawned = self
            .spawn_on_click
            .lock()
            .unwrap()
            .get_mut(selector)
            .and_then(VecDeque::pop_front);
        if let Some(surface) = spawned {
            if let Some(state) = self.session_state.lock().unwrap().as_ref() {
                state.lock().unwrap().open.push(surface);
            }
        }
        Ok(())
    }

    async fn click_containing(&self, selector: &str, text: &str) -> Result<()> {
        if self
            .script
            .lock()
            .unwrap()
            .missing_containing
            .contains(text)
        {
            return Err(BrowserError::SelectorNotFound(format!(
                "{selector} containing '{text}'"
            )));
        }
        self.record(format!("click_containing:{selector}:{text}"));
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, _timeout: Duration) -> Result<()> {
        if self.script.lock().unwrap().visible.contains(selector) {
            Ok(())
        } else {
            Err(BrowserError::Timeout(format!("{selector} not visible")))
        }
    }

    async fn wait_url_contains(&self, fragment: &str, _timeout: Duration) -> Result<()> {
        if self
            .script
            .lock()
            .unwrap()
            .url_fragments
            .contains(fragment)
        {
            Ok(())
        } else {
            Err(BrowserError::Timeout(format!(
                "URL did not contain '{fragment}'"
            )))
        }
    }

    async fn text(&self, selector: &str) -> Result<String> {
        self.script
            .lock()
            .unwrap()
            .texts
            .get(selector)
            .cloned()
            .ok_or_else(|| BrowserError::SelectorNotFound(selector.to_string()))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let mut script = self.script.lock().unwrap();
        let Some(queue) = script.counts.get_mut(selector) else {
            return Ok(0);
        };
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap_or(0))
        } else {
            Ok(queue.front().copied().unwrap_or(0))
        }
    }

    async fn nth_attr(&self, selector: &str, index: usize, _attr: &str) -> Result<Option<String>> {
        Ok(self
            .script
            .lock()
            .unwrap()
            .hrefs
            .get(selector)
            .and_then(|hrefs| hrefs.get(index))
            .cloned())
    }

    async fn labeled_values(&self, _selectors: &PairSelectors) -> Result<Vec<LabeledValue>> {
        Ok(self.script.lock().unwrap().pairs.clone())
    }

    async fn adjacent_value(
        &self,
        _label_selector: &str,
        label_text: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .script
            .lock()
            .unwrap()
            .adjacent
            .get(label_text)
            .cloned())
    }

    async fn links(&self, selector: &str) -> Result<Vec<LinkRef>> {
        Ok(self
            .script
            .lock()
            .unwrap()
            .links
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.record(format!("press_key:{key}"));
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(format!("screenshot:{}", path.display()));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// A scripted session over a primary listing surface.
pub struct FakeSession {
    state: Arc<Mutex<SessionState>>,
    primary: Arc<FakeSurface>,
}

impl FakeSession {
    pub fn new(primary: Arc<FakeSurface>) -> Self {
        let state = Arc::new(Mutex::new(SessionState {
            open: vec![Arc::clone(&primary)],
            pending: Vec::new(),
            ids_calls: 0,
            closed: false,
        }));
        *primary.session_state.lock().unwrap() = Some(Arc::clone(&state));
        Self { state, primary }
    }

    /// Reveal `surface` once `surface_ids` has been called
    /// `reveal_at_call` times in total.
    pub fn add_pending(&self, reveal_at_call: u32, surface: Arc<FakeSurface>) {
        self.state
            .lock()
            .unwrap()
            .pending
            .push((reveal_at_call, surface));
    }

    pub fn ids_calls(&self) -> u32 {
        self.state.lock().unwrap().ids_calls
    }

    pub fn was_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait::async_trait]
impl Session for FakeSession {
    async fn new_surface(&self) -> Result<Arc<dyn Surface>> {
        Ok(Arc::clone(&self.primary) as Arc<dyn Surface>)
    }

    async fn surface_ids(&self) -> Result<Vec<SurfaceId>> {
        let mut state = self.state.lock().unwrap();
        state.ids_calls += 1;
        let calls = state.ids_calls;

        let due: Vec<_> = {
            let (due, rest): (Vec<_>, Vec<_>) = state
                .pending
                .drain(..)
                .partition(|(at, _)| *at <= calls);
            state.pending = rest;
            due
        };
        for (_, surface) in due {
            state.open.push(surface);
        }

        Ok(state.open.iter().map(|s| s.id()).collect())
    }

    async fn surface(&self, id: &SurfaceId) -> Result<Arc<dyn Surface>> {
        self.state
            .lock()
            .unwrap()
            .open
            .iter()
            .find(|s| &s.id() == id)
            .map(|s| Arc::clone(s) as Arc<dyn Surface>)
            .ok_or_else(|| BrowserError::SurfaceNotFound(id.to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
