//! Selection state and per-id caching of details fetched on selection

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::MistError;

/// How long ranked meta info for a document stays fresh
pub const META_INFO_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    NoSelection,
    Selected(String),
}

impl Selection {
    pub fn id(&self) -> Option<&str> {
        match self {
            Selection::NoSelection => None,
            Selection::Selected(id) => Some(id),
        }
    }
}

/// Request to fetch the value for one selected id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub id: String,
    generation: u64,
}

#[derive(Debug)]
struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

/// Tracks the selected id of a list and the value fetched for it.
///
/// Values are cached per id, either for the lifetime of the owning list's
/// query key (`ttl = None`) or until they are older than `ttl`. Only the most
/// recently requested id is waited for: a response for any other id is
/// dropped on arrival.
#[derive(Debug)]
pub struct DetailSelector<T> {
    selection: Selection,
    cache: HashMap<String, Cached<T>>,
    pending: Option<String>,
    error: Option<(String, MistError)>,
    generation: u64,
    ttl: Option<Duration>,
}

impl<T> Default for DetailSelector<T> {
    fn default() -> Self {
        Self {
            selection: Selection::NoSelection,
            cache: HashMap::new(),
            pending: None,
            error: None,
            generation: 0,
            ttl: None,
        }
    }
}

impl<T> DetailSelector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.id()
    }

    /// Select `id`, returning a ticket if its value has to be fetched.
    ///
    /// No ticket is issued when a fresh cached value exists or a request for
    /// the same id is already pending.
    pub fn select(&mut self, id: impl Into<String>, now: Instant) -> Option<DetailTicket> {
        let id = id.into();
        self.selection = Selection::Selected(id.clone());

        if self.fresh(&id, now) || self.pending.as_deref() == Some(id.as_str()) {
            return None;
        }

        self.cache.remove(&id);
        self.pending = Some(id.clone());
        Some(DetailTicket {
            id,
            generation: self.generation,
        })
    }

    /// Ticket to fetch the selected id again, ignoring the cache.
    pub fn refresh(&mut self) -> Result<DetailTicket, MistError> {
        let id = self
            .selected_id()
            .ok_or(MistError::PreconditionNotMet("no item selected"))?
            .to_string();
        self.cache.remove(&id);
        self.pending = Some(id.clone());
        Ok(DetailTicket {
            id,
            generation: self.generation,
        })
    }

    fn fresh(&self, id: &str, now: Instant) -> bool {
        match (self.cache.get(id), self.ttl) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(cached), Some(ttl)) => now.saturating_duration_since(cached.fetched_at) < ttl,
        }
    }

    /// Apply a response. Returns false if it was for a superseded request.
    pub fn complete(
        &mut self,
        ticket: &DetailTicket,
        result: Result<T, MistError>,
        now: Instant,
    ) -> bool {
        if ticket.generation != self.generation
            || self.pending.as_deref() != Some(ticket.id.as_str())
        {
            log::debug!("Discarding superseded response for {}", ticket.id);
            return false;
        }
        self.pending = None;

        match result {
            Ok(value) => {
                self.cache.insert(
                    ticket.id.clone(),
                    Cached {
                        value,
                        fetched_at: now,
                    },
                );
                self.error = None;
            }
            Err(err) => {
                log::warn!("Failed to fetch {}: {}", ticket.id, err);
                self.error = Some((ticket.id.clone(), err));
            }
        }
        true
    }

    /// Value for the selected id, if it has arrived
    pub fn current(&self) -> Option<&T> {
        let id = self.selected_id()?;
        self.cache.get(id).map(|cached| &cached.value)
    }

    /// Error of the last fetch for the selected id
    pub fn error(&self) -> Option<&MistError> {
        match (&self.error, self.selected_id()) {
            (Some((id, err)), Some(selected)) if id == selected => Some(err),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Clear the selection and the cache; outstanding responses become stale.
    pub fn reset(&mut self) {
        self.selection = Selection::NoSelection;
        self.cache.clear();
        self.pending = None;
        self.error = None;
        self.generation += 1;
    }
}
