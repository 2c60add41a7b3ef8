//! Background workers executing page, detail and meta-info requests

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::client::MistApi;
use crate::error::Result;
use crate::model::{Collection, Page, Record};
use crate::paging::{Fetcher, PageTicket};
use crate::ranking::{rank, MetaInfo};
use crate::selection::DetailTicket;

/// Request for the meta-info worker
#[derive(Debug, Clone, PartialEq)]
pub struct MetaRequest {
    pub ticket: DetailTicket,
    pub labels: Vec<String>,
}

/// A finished request, sent back to the owning view
#[derive(Debug)]
pub enum Response {
    Page {
        ticket: PageTicket,
        result: Result<Page>,
    },
    Detail {
        ticket: DetailTicket,
        result: Result<Record>,
    },
    /// Meta info arrives already ranked
    MetaInfo {
        ticket: DetailTicket,
        result: Result<Vec<MetaInfo>>,
    },
}

/// Drain queued requests, keeping only the latest.
///
/// Anything superseded this way would be discarded as stale on arrival anyway.
fn latest<T>(rx: &Receiver<T>, mut req: T) -> T {
    while let Ok(next) = rx.try_recv() {
        req = next;
    }
    req
}

/// Answer the latest queued request until the channel closes.
///
/// Requests that queue up during a fetch are drained before its response is
/// sent; if the newest of them repeats the request just served, it is
/// dropped, since that response is accepted for it.
fn serve<T: PartialEq, R>(
    req_rx: &Receiver<T>,
    mut fetch: impl FnMut(&T) -> R,
    mut respond: impl FnMut(T, R) -> bool,
) {
    let mut next = req_rx.recv().ok();
    while let Some(req) = next.take() {
        let req = latest(req_rx, req);
        let result = fetch(&req);
        next = req_rx
            .try_recv()
            .ok()
            .map(|queued| latest(req_rx, queued))
            .filter(|queued| *queued != req);
        if !respond(req, result) {
            return;
        }
        if next.is_none() {
            next = req_rx.recv().ok();
        }
    }
}

/// Spawn the page worker (one list request at a time)
pub fn spawn_page_worker(
    fetcher: Fetcher,
    req_rx: Receiver<PageTicket>,
    resp_tx: Sender<Response>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(ticket) = req_rx.recv() {
            let ticket = latest(&req_rx, ticket);
            let start = Instant::now();
            let result = fetcher.fetch_page(&ticket.key, ticket.page_number);
            log::debug!(
                "Fetched {} page {} in {:?}",
                ticket.key,
                ticket.page_number,
                start.elapsed()
            );
            if resp_tx.send(Response::Page { ticket, result }).is_err() {
                break;
            }
        }
    })
}

/// Spawn the detail worker (fetches a record when an item is selected)
pub fn spawn_detail_worker(
    api: Arc<dyn MistApi>,
    collection: Collection,
    req_rx: Receiver<DetailTicket>,
    resp_tx: Sender<Response>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        serve(
            &req_rx,
            |ticket: &DetailTicket| api.get_detail(&collection, &ticket.id),
            |ticket, result| resp_tx.send(Response::Detail { ticket, result }).is_ok(),
        )
    })
}

/// Spawn the meta-info worker (label similarities for the selected item)
pub fn spawn_meta_worker(
    api: Arc<dyn MistApi>,
    req_rx: Receiver<MetaRequest>,
    resp_tx: Sender<Response>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        serve(
            &req_rx,
            |req: &MetaRequest| api.get_meta_info(&req.ticket.id, &req.labels).map(rank),
            |MetaRequest { ticket, .. }, result| {
                resp_tx.send(Response::MetaInfo { ticket, result }).is_ok()
            },
        )
    })
}
