//! State of one browsable list: search box, pages, selection and details
//!
//! `CollectionView` is owned by a single thread. It hands requests to the
//! workers in `worker` and applies their responses only when `poll` (or
//! `wait_until_idle`) is called, so every state transition happens on the
//! owner's thread, in the order responses arrive.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client::MistApi;
use crate::config::ClientConfig;
use crate::debounce::{Debouncer, SEARCH_DEBOUNCE};
use crate::error::{MistError, Result};
use crate::model::{Collection, Item, Page, QueryKey, Record};
use crate::pager::ViewportPager;
use crate::paging::{Fetcher, PageTicket, PagedCollection, DEFAULT_PAGE_SIZE};
use crate::ranking::{self, MetaInfo};
use crate::selection::{DetailSelector, DetailTicket, Selection, META_INFO_TTL};
use crate::worker::{
    spawn_detail_worker, spawn_meta_worker, spawn_page_worker, MetaRequest, Response,
};

#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Filter term of the first query
    pub filter: String,
    pub page_size: u32,
    pub debounce: Duration,
    /// Labels for meta-info scoring; empty disables the meta-info fetch
    pub labels: Vec<String>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            filter: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            debounce: SEARCH_DEBOUNCE,
            labels: Vec::new(),
        }
    }
}

impl From<&ClientConfig> for ViewOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size,
            labels: config.labels.clone(),
            ..Self::default()
        }
    }
}

pub struct CollectionView {
    labels: Vec<String>,
    search_text: String,
    search: Debouncer<String>,
    pages: PagedCollection,
    pager: ViewportPager,
    details: DetailSelector<Record>,
    meta: DetailSelector<Vec<MetaInfo>>,
    page_tx: Sender<PageTicket>,
    detail_tx: Sender<DetailTicket>,
    meta_tx: Sender<MetaRequest>,
    resp_rx: Receiver<Response>,
}

impl CollectionView {
    /// Create the view, start its workers and request the first page.
    pub fn new(api: Arc<dyn MistApi>, collection: Collection, options: ViewOptions) -> Self {
        let (page_tx, page_rx) = mpsc::channel::<PageTicket>();
        let (detail_tx, detail_rx) = mpsc::channel::<DetailTicket>();
        let (meta_tx, meta_rx) = mpsc::channel::<MetaRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<Response>();

        let key = collection.query(options.filter.clone());
        let fetcher = Fetcher::new(api.clone(), collection.clone(), options.page_size);
        spawn_page_worker(fetcher, page_rx, resp_tx.clone());
        spawn_detail_worker(api.clone(), collection, detail_rx, resp_tx.clone());
        spawn_meta_worker(api, meta_rx, resp_tx);

        let mut view = Self {
            labels: options.labels,
            search_text: options.filter,
            search: Debouncer::new(options.debounce),
            pages: PagedCollection::new(key),
            pager: ViewportPager::new(),
            details: DetailSelector::new(),
            meta: DetailSelector::with_ttl(META_INFO_TTL),
            page_tx,
            detail_tx,
            meta_tx,
            resp_rx,
        };
        view.load_next();
        view
    }

    /// Raw search box change; becomes the filter after the debounce period.
    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.search_text = text.clone();
        self.search.input(text, now);
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Advance time: apply a debounced search term and any finished responses.
    pub fn tick(&mut self, now: Instant) -> usize {
        if let Some(term) = self.search.poll(now) {
            self.set_filter(term);
        }
        self.poll(now)
    }

    /// Switch the filter immediately. Returns false if it did not change.
    pub fn set_filter(&mut self, filter: impl Into<String>) -> bool {
        if !self.pages.set_filter(filter) {
            return false;
        }
        log::debug!("Query changed to {}", self.pages.key());
        self.reset_selection();
        self.load_next();
        true
    }

    /// Drop every cached page and start over from page 1.
    pub fn refresh(&mut self) {
        self.pages.clear();
        self.reset_selection();
        self.load_next();
    }

    fn reset_selection(&mut self) {
        self.pager.reset();
        self.details.reset();
        self.meta.reset();
    }

    /// Request the next page; no-op while one is in flight or none remain.
    pub fn load_next(&mut self) -> bool {
        let Some(ticket) = self.pages.begin_next() else {
            return false;
        };
        log::debug!("Requesting {} page {}", ticket.key, ticket.page_number);
        if self.page_tx.send(ticket).is_err() {
            log::warn!("Page worker is gone");
        }
        true
    }

    /// Sentinel visibility changed (or was re-observed).
    ///
    /// A failed page is not retried from here; use `load_next` or `refresh`.
    pub fn sentinel_visible(&mut self, visible: bool) -> bool {
        let has_more = self.pages.has_more() && self.pages.error().is_none();
        let should_load = self
            .pager
            .observe(visible, has_more, self.pages.is_fetching());
        should_load && self.load_next()
    }

    /// Select an item, fetching its detail (and meta info, if labels are
    /// configured) unless already cached.
    pub fn select(&mut self, id: impl Into<String>, now: Instant) {
        let id = id.into();
        if let Some(ticket) = self.details.select(id.clone(), now) {
            if self.detail_tx.send(ticket).is_err() {
                log::warn!("Detail worker is gone");
            }
        }

        if self.labels.is_empty() {
            return;
        }
        if let Some(ticket) = self.meta.select(id, now) {
            let req = MetaRequest {
                ticket,
                labels: self.labels.clone(),
            };
            if self.meta_tx.send(req).is_err() {
                log::warn!("Meta-info worker is gone");
            }
        }
    }

    /// Fetch the selected item's detail again, bypassing the cache.
    pub fn refresh_detail(&mut self) -> Result<()> {
        let ticket = self.details.refresh()?;
        self.detail_tx
            .send(ticket)
            .map_err(|_| MistError::Network("detail worker is gone".into()))
    }

    /// Apply every response that has arrived; returns how many were applied.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(response) = self.resp_rx.try_recv() {
            self.apply(response, now);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, response: Response, now: Instant) {
        match response {
            Response::Page { ticket, result } => {
                self.pages.complete(&ticket, result);
            }
            Response::Detail { ticket, result } => {
                self.details.complete(&ticket, result, now);
            }
            Response::MetaInfo { ticket, result } => {
                self.meta.complete(&ticket, result, now);
            }
        }
    }

    /// True while any request of this view is outstanding
    pub fn is_busy(&self) -> bool {
        self.pages.is_fetching() || self.details.is_pending() || self.meta.is_pending()
    }

    /// Block until nothing is outstanding or `timeout` passes.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.resp_rx.recv_timeout(remaining) {
                Ok(response) => self.apply(response, Instant::now()),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    pub fn key(&self) -> &QueryKey {
        self.pages.key()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.pages.flatten()
    }

    pub fn pages(&self) -> &[Page] {
        self.pages.pages()
    }

    pub fn has_more(&self) -> bool {
        self.pages.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.pages.is_loading()
    }

    pub fn is_fetching_next(&self) -> bool {
        self.pages.is_fetching_next()
    }

    pub fn error(&self) -> Option<&MistError> {
        self.pages.error()
    }

    pub fn selection(&self) -> &Selection {
        self.details.selection()
    }

    pub fn detail(&self) -> Option<&Record> {
        self.details.current()
    }

    pub fn detail_error(&self) -> Option<&MistError> {
        self.details.error()
    }

    /// Ranked meta info for the selected item
    pub fn meta_info(&self) -> Option<&[MetaInfo]> {
        self.meta.current().map(Vec::as_slice)
    }

    pub fn meta_error(&self) -> Option<&MistError> {
        self.meta.error()
    }

    pub fn top_match(&self) -> Option<&MetaInfo> {
        ranking::top(self.meta_info()?)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
