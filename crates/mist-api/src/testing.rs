//! In-memory backend for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::assist::{Completion, CompletionRequest, InstructionPage};
use crate::client::{require_labels, MistApi, PageQuery};
use crate::error::{MistError, Result};
use crate::model::{Collection, InsertedDocument, Item, Page, Record};
use crate::ranking::MetaInfo;

pub fn page_of(page_number: u32, total_pages: u32, size: usize) -> Page {
    let items = (0..size)
        .map(|i| Item::new(format!("p{page_number}-{i}"), format!("Item {i}")))
        .collect();
    Page::new(items, page_number, total_pages)
}

#[derive(Default)]
pub struct FakeApi {
    items: Mutex<Vec<Item>>,
    list_error: Mutex<Option<MistError>>,
    meta: Mutex<Vec<MetaInfo>>,
    delay: Mutex<Duration>,
    last_query: Mutex<Option<PageQuery>>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    meta_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Backend holding `doc-0` .. `doc-{n-1}`
    pub fn with_items(self: Arc<Self>, n: usize) -> Arc<Self> {
        *self.items.lock().unwrap() = (0..n)
            .map(|i| Item::new(format!("doc-{i}"), format!("Document {i}")))
            .collect();
        self
    }

    pub fn failing_lists(self: Arc<Self>, err: MistError) -> Arc<Self> {
        *self.list_error.lock().unwrap() = Some(err);
        self
    }

    pub fn with_meta(self: Arc<Self>, meta: Vec<MetaInfo>) -> Arc<Self> {
        *self.meta.lock().unwrap() = meta;
        self
    }

    /// Make every call take at least `delay`
    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn meta_calls(&self) -> usize {
        self.meta_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<PageQuery> {
        self.last_query.lock().unwrap().clone()
    }

    fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    fn matching(&self, term: &str) -> Vec<Item> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.id.contains(term))
            .cloned()
            .collect()
    }
}

impl MistApi for FakeApi {
    fn list_page(&self, _collection: &Collection, query: &PageQuery) -> Result<Page> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        self.pause();

        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }

        let matching = self.matching(&query.name);
        let size = query.page_size as usize;
        let total_pages = matching.len().div_ceil(size) as u32;
        let items = matching
            .into_iter()
            .skip((query.page as usize - 1) * size)
            .take(size)
            .collect();
        Ok(Page::new(items, query.page, total_pages))
    }

    fn get_detail(&self, _collection: &Collection, id: &str) -> Result<Record> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();

        if id == "missing" {
            return Err(MistError::Server {
                status: 404,
                body: "Document not found".to_string(),
            });
        }
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(id));
        fields.insert("name".to_string(), Value::from(format!("Document {id}")));
        Ok(Record(fields))
    }

    fn get_meta_info(&self, _id: &str, labels: &[String]) -> Result<Vec<MetaInfo>> {
        require_labels(labels)?;
        self.meta_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        Ok(self.meta.lock().unwrap().clone())
    }

    fn search_by_text(&self, _text: &str, _limit: u32) -> Result<Vec<Item>> {
        unimplemented!("no text search in the in-memory backend")
    }

    fn insert_document(&self, name: &str, _image_url: &str) -> Result<InsertedDocument> {
        let id = format!("doc-{}", self.items.lock().unwrap().len());
        self.items.lock().unwrap().push(Item::new(id.clone(), name));
        Ok(InsertedDocument {
            status: "success".to_string(),
            id: Some(id),
            message: None,
        })
    }

    fn list_instructions(&self, _page: u32, _page_size: u32) -> Result<InstructionPage> {
        unimplemented!("no instructions in the in-memory backend")
    }

    fn complete(&self, _request: &CompletionRequest) -> Result<Completion> {
        unimplemented!("no completions in the in-memory backend")
    }
}
