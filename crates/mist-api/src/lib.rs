//! Client for the MIST document browsing, semantic-search and assistant API.
//!
//! The building blocks ([`PagedCollection`], [`Debouncer`], [`ViewportPager`],
//! [`DetailSelector`]) are plain state machines with no I/O. [`CollectionView`]
//! wires them to a [`MistApi`] implementation through background workers.

pub mod assist;
pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod model;
pub mod pager;
pub mod paging;
pub mod ranking;
pub mod selection;
pub mod view;
pub mod worker;

#[cfg(test)]
mod testing;

pub use assist::{Completion, CompletionRequest, Instruction, InstructionPage};
pub use client::{require_labels, HttpClient, MistApi, PageQuery, DEFAULT_SEARCH_LIMIT};
pub use config::{ClientConfig, Settings};
pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use error::{MistError, Result};
pub use model::{has_more, Collection, InsertedDocument, Item, Page, QueryKey, Record};
pub use pager::ViewportPager;
pub use paging::{Applied, Fetcher, PageTicket, PagedCollection, DEFAULT_PAGE_SIZE};
pub use ranking::{rank, MetaInfo, SIMILARITY_THRESHOLD};
pub use selection::{DetailSelector, DetailTicket, Selection};
pub use view::{CollectionView, ViewOptions};
