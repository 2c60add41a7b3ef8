use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use mist_api::{
    require_labels, Collection, CollectionView, Completion, CompletionRequest, InsertedDocument,
    InstructionPage, Item, MetaInfo, MistApi, MistError, Page, PageQuery, Record, Selection,
    ViewOptions,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Backend with `doc-0` .. `doc-{n-1}` where the filter matches by substring
struct Backend {
    ids: Vec<String>,
    delay: Duration,
    fail_lists: bool,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    meta_calls: AtomicUsize,
}

impl Backend {
    fn new(n: usize) -> Self {
        Self {
            ids: (0..n).map(|i| format!("doc-{i}")).collect(),
            delay: Duration::ZERO,
            fail_lists: false,
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            meta_calls: AtomicUsize::new(0),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn broken_lists(mut self) -> Self {
        self.fail_lists = true;
        self
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

impl MistApi for Backend {
    fn list_page(&self, _collection: &Collection, query: &PageQuery) -> mist_api::Result<Page> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        if self.fail_lists {
            return Err(MistError::Server {
                status: 500,
                body: "list failed".into(),
            });
        }
        let matching: Vec<&String> = self.ids.iter().filter(|id| id.contains(&query.name)).collect();
        let size = query.page_size as usize;
        let items = matching
            .iter()
            .skip((query.page as usize - 1) * size)
            .take(size)
            .map(|id| Item::new(id.as_str(), id.to_uppercase()))
            .collect();
        Ok(Page::new(items, query.page, matching.len().div_ceil(size) as u32))
    }

    fn get_detail(&self, _collection: &Collection, id: &str) -> mist_api::Result<Record> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        let mut fields = serde_json::Map::new();
        fields.insert("id".into(), id.into());
        fields.insert("name".into(), format!("Detail of {id}").into());
        Ok(Record(fields))
    }

    fn get_meta_info(&self, _id: &str, labels: &[String]) -> mist_api::Result<Vec<MetaInfo>> {
        require_labels(labels)?;
        self.meta_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        Ok(vec![
            MetaInfo::new("dog", 15.0, 0.85),
            MetaInfo::new("cat", 42.0, 0.58),
            MetaInfo::new("car", 99.0, 0.01),
            MetaInfo::new("tree", 30.0, 0.70),
        ])
    }

    fn search_by_text(&self, _text: &str, _limit: u32) -> mist_api::Result<Vec<Item>> {
        unimplemented!("read-only backend")
    }

    fn insert_document(&self, _name: &str, _image_url: &str) -> mist_api::Result<InsertedDocument> {
        unimplemented!("read-only backend")
    }

    fn list_instructions(&self, _page: u32, _page_size: u32) -> mist_api::Result<InstructionPage> {
        unimplemented!("read-only backend")
    }

    fn complete(&self, _request: &CompletionRequest) -> mist_api::Result<Completion> {
        unimplemented!("read-only backend")
    }
}

fn open(backend: Arc<Backend>, labels: &[&str]) -> CollectionView {
    let options = ViewOptions {
        labels: labels.iter().map(|l| l.to_string()).collect(),
        ..ViewOptions::default()
    };
    CollectionView::new(backend, Collection::documents(), options)
}

fn ids(view: &CollectionView) -> Vec<String> {
    view.items().map(|item| item.id.clone()).collect()
}

#[test]
fn loads_pages_in_order_until_exhausted() {
    let backend = Arc::new(Backend::new(25));
    let mut view = open(backend.clone(), &[]);
    assert!(view.wait_until_idle(TIMEOUT));

    let mut expected_len = 10;
    assert_eq!(view.items().count(), expected_len);

    for page_len in [10, 5] {
        assert!(view.load_next());
        assert!(view.wait_until_idle(TIMEOUT));
        expected_len += page_len;
        assert_eq!(view.items().count(), expected_len);
    }

    let numbers: Vec<u32> = view.pages().iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(!view.has_more());
    assert!(!view.load_next());
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 3);

    let all = ids(&view);
    assert_eq!(all.first().map(String::as_str), Some("doc-0"));
    assert_eq!(all.last().map(String::as_str), Some("doc-24"));
}

#[test]
fn load_next_while_in_flight_is_a_noop() {
    let backend = Arc::new(Backend::new(50).slow(Duration::from_millis(50)));
    let mut view = open(backend.clone(), &[]);

    // First page is still in flight
    assert!(view.is_loading());
    assert!(!view.load_next());
    assert!(!view.load_next());
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

    assert!(view.load_next());
    assert!(view.is_fetching_next());
    assert!(!view.load_next());
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn debounced_filter_resets_pagination() {
    let backend = Arc::new(Backend::new(25));
    let mut view = open(backend.clone(), &[]);
    assert!(view.wait_until_idle(TIMEOUT));
    view.load_next();
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(view.items().count(), 20);

    let t0 = Instant::now();
    view.input("d", t0);
    view.input("doc-1", t0 + Duration::from_millis(100));
    view.tick(t0 + Duration::from_millis(399));
    assert_eq!(view.key().filter, "");
    assert_eq!(view.search_text(), "doc-1");

    view.tick(t0 + Duration::from_millis(400));
    assert_eq!(view.key().filter, "doc-1");
    assert_eq!(view.items().count(), 0);
    assert!(view.is_loading());

    assert!(view.wait_until_idle(TIMEOUT));
    let numbers: Vec<u32> = view.pages().iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1]);
    assert_eq!(view.items().count(), 10);
    assert!(ids(&view).iter().all(|id| id.contains("doc-1")));
    assert!(view.has_more());
}

#[test]
fn stale_page_for_old_filter_is_discarded() {
    let backend = Arc::new(Backend::new(25).slow(Duration::from_millis(30)));
    let mut view = open(backend.clone(), &[]);

    // Change the filter while the unfiltered first page is in flight
    assert!(view.set_filter("doc-2"));
    assert!(view.wait_until_idle(TIMEOUT));
    // Let the superseded response arrive too, then drain it
    thread::sleep(Duration::from_millis(100));
    view.poll(Instant::now());

    let all = ids(&view);
    assert_eq!(all.len(), 6);
    assert!(all.iter().all(|id| id.contains("doc-2")));
}

#[test]
fn filter_change_clears_selection() {
    let backend = Arc::new(Backend::new(25));
    let mut view = open(backend, &[]);
    assert!(view.wait_until_idle(TIMEOUT));

    view.select("doc-3", Instant::now());
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(view.selection(), &Selection::Selected("doc-3".into()));
    assert!(view.detail().is_some());

    view.set_filter("doc-1");
    assert_eq!(view.selection(), &Selection::NoSelection);
    assert!(view.detail().is_none());
}

#[test]
fn sentinel_triggers_one_load_per_settled_fetch() {
    let backend = Arc::new(Backend::new(35).slow(Duration::from_millis(20)));
    let mut view = open(backend.clone(), &[]);
    assert!(view.wait_until_idle(TIMEOUT));

    assert!(view.sentinel_visible(true));
    // Persistent intersection while the fetch is pending
    for _ in 0..5 {
        assert!(!view.sentinel_visible(true));
    }
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(view.items().count(), 20);

    // Still on screen after page 2 landed: keep filling
    assert!(view.sentinel_visible(true));
    assert!(!view.sentinel_visible(true));
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(view.items().count(), 30);

    assert!(!view.sentinel_visible(false));
    assert!(view.sentinel_visible(true));
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(view.items().count(), 35);
    assert!(!view.has_more());

    assert!(!view.sentinel_visible(true));
    assert!(!view.sentinel_visible(false));
    assert!(!view.sentinel_visible(true));
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 4);
}

#[test]
fn sentinel_visible_while_first_page_loads() {
    let backend = Arc::new(Backend::new(50).slow(Duration::from_millis(30)));
    let mut view = open(backend.clone(), &[]);

    // Empty list, so the sentinel is on screen from the start
    assert!(!view.sentinel_visible(true));
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(view.items().count(), 10);

    let mut loaded = 1;
    while view.has_more() {
        assert!(view.sentinel_visible(true), "stalled after {loaded} pages");
        assert!(view.wait_until_idle(TIMEOUT));
        loaded += 1;
    }
    assert_eq!(loaded, 5);
    assert_eq!(view.items().count(), 50);
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 5);
}

#[test]
fn repeated_selection_fetches_detail_once() {
    let backend = Arc::new(Backend::new(5));
    let mut view = open(backend.clone(), &[]);
    assert!(view.wait_until_idle(TIMEOUT));

    view.select("42", Instant::now());
    assert!(view.wait_until_idle(TIMEOUT));
    view.select("42", Instant::now());
    assert!(view.wait_until_idle(TIMEOUT));

    assert_eq!(backend.detail_calls.load(Ordering::SeqCst), 1);
    assert_eq!(view.detail().and_then(Record::id), Some("42"));
}

#[test]
fn last_selection_wins() {
    let backend = Arc::new(Backend::new(5).slow(Duration::from_millis(30)));
    let mut view = open(backend, &[]);
    assert!(view.wait_until_idle(TIMEOUT));

    let now = Instant::now();
    view.select("42", now);
    view.select("7", now);
    assert!(view.wait_until_idle(TIMEOUT));
    thread::sleep(Duration::from_millis(100));
    view.poll(Instant::now());

    assert_eq!(view.detail().and_then(Record::id), Some("7"));
    assert_eq!(view.detail().and_then(Record::name), Some("Detail of 7"));
}

#[test]
fn meta_info_is_ranked_and_filtered() {
    let backend = Arc::new(Backend::new(5));
    let mut view = open(backend.clone(), &["car", "cat"]);
    assert!(view.wait_until_idle(TIMEOUT));

    view.select("doc-1", Instant::now());
    assert!(view.wait_until_idle(TIMEOUT));

    let top = view.top_match().unwrap();
    assert_eq!(top.label, "car");
    assert_eq!(top.similarity_score, 99.0);

    let scores: Vec<f64> = view
        .meta_info()
        .unwrap()
        .iter()
        .map(|m| m.similarity_score)
        .collect();
    assert_eq!(scores, vec![99.0, 42.0, 30.0]);

    // Cached for the same id
    view.select("doc-1", Instant::now());
    assert!(view.wait_until_idle(TIMEOUT));
    assert_eq!(backend.meta_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn meta_info_not_requested_without_labels() {
    let backend = Arc::new(Backend::new(5));
    let mut view = open(backend.clone(), &[]);
    assert!(view.wait_until_idle(TIMEOUT));

    view.select("doc-1", Instant::now());
    assert!(view.wait_until_idle(TIMEOUT));
    assert!(view.meta_info().is_none());
    assert!(view.top_match().is_none());
    assert_eq!(backend.meta_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn list_errors_do_not_affect_details() {
    let backend = Arc::new(Backend::new(5).broken_lists());
    let mut view = open(backend.clone(), &[]);
    assert!(view.wait_until_idle(TIMEOUT));

    assert_eq!(view.error().and_then(MistError::status), Some(500));
    assert_eq!(view.items().count(), 0);
    // Not retried on its own
    thread::sleep(Duration::from_millis(20));
    view.poll(Instant::now());
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

    view.select("doc-1", Instant::now());
    assert!(view.wait_until_idle(TIMEOUT));
    assert!(view.detail().is_some());
    assert!(view.detail_error().is_none());
}
