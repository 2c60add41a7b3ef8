//! Wire types for list, detail and search responses

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{MistError, Result};

/// A list endpoint on the backend, e.g. `list-documents` / `get-document`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Collection {
    pub name: String,
    pub list_endpoint: String,
    pub detail_endpoint: String,
    /// Field of the list response that holds the page's items
    pub items_field: String,
}

impl Collection {
    /// Derive endpoints from a plural collection name (`documents` ->
    /// `list-documents`, `get-document/<id>`, items under `documents`).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let singular = name.strip_suffix('s').unwrap_or(&name);
        Self {
            list_endpoint: format!("list-{}", name),
            detail_endpoint: format!("get-{}", singular),
            items_field: name.clone(),
            name,
        }
    }

    pub fn documents() -> Self {
        Self::new("documents")
    }

    pub fn profiles() -> Self {
        Self::new("profiles")
    }

    /// Query key for this collection with the given filter term
    pub fn query(&self, filter: impl Into<String>) -> QueryKey {
        QueryKey {
            collection: self.name.clone(),
            filter: filter.into(),
        }
    }
}

/// Identifies one logical paged collection/filter combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryKey {
    pub collection: String,
    pub filter: String,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filter.is_empty() {
            write!(f, "{}", self.collection)
        } else {
            write!(f, "{}?name={}", self.collection, self.filter)
        }
    }
}

/// One entry of a list or search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItem")]
pub struct Item {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            similarity_score: None,
            distance: None,
            extra: Map::new(),
        }
    }
}

// The backend is inconsistent about `id` vs `_id` and sends numeric ids from
// some collections, so items go through a lenient intermediate form.
#[derive(Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "_id", default)]
    object_id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "displayName")]
    display_name: Option<String>,
    #[serde(default, alias = "similarity")]
    similarity_score: Option<f64>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn id_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl TryFrom<RawItem> for Item {
    type Error = String;

    fn try_from(raw: RawItem) -> std::result::Result<Self, Self::Error> {
        let id = raw
            .id
            .and_then(id_string)
            .or_else(|| raw.object_id.and_then(id_string))
            .ok_or_else(|| "item has neither `id` nor `_id`".to_string())?;

        Ok(Item {
            id,
            display_name: raw.name.or(raw.display_name).unwrap_or_default(),
            similarity_score: raw.similarity_score,
            distance: raw.distance,
            extra: raw.extra,
        })
    }
}

/// One server response unit of a paginated list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub page_number: u32,
    pub total_pages: u32,
}

impl Page {
    /// Build a page, keeping `1 <= page_number <= total_pages`.
    ///
    /// An empty result set is reported by the backend as `total_pages = 0`.
    pub fn new(items: Vec<Item>, page_number: u32, total_pages: u32) -> Self {
        let page_number = page_number.max(1);
        Self {
            items,
            page_number,
            total_pages: total_pages.max(page_number),
        }
    }

    pub fn has_more(&self) -> bool {
        has_more(self)
    }
}

/// True iff another page follows `last_page`.
pub fn has_more(last_page: &Page) -> bool {
    last_page.page_number < last_page.total_pages
}

#[derive(Deserialize)]
struct ListResponse {
    page: u32,
    total_pages: u32,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Parse a list endpoint body, taking items from `items_field` (or `items`).
pub fn parse_page(body: &str, items_field: &str) -> Result<Page> {
    let mut response: ListResponse = serde_json::from_str(body)?;
    let items = response
        .rest
        .remove(items_field)
        .or_else(|| response.rest.remove("items"))
        .ok_or_else(|| MistError::Decode(format!("missing `{}` array", items_field)))?;
    let items: Vec<Item> = serde_json::from_value(items)?;
    Ok(Page::new(items, response.page, response.total_pages))
}

/// Full record returned by a detail endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn id(&self) -> Option<&str> {
        self.str_field("id").or_else(|| self.str_field("_id"))
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn updated_date(&self) -> Option<&str> {
        self.str_field("updatedDate")
    }

    pub fn image_url(&self) -> Option<&str> {
        self.0
            .get("mediaDetails")
            .and_then(|m| m.get("imageUrl"))
            .and_then(Value::as_str)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// Reply of `POST /insert-document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertedDocument {
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl InsertedDocument {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Item>,
}
